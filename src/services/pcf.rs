use crate::services::oauth2_client::OAuth2TokenClient;
use crate::types::error::{PolicyOperation, SessionError};
use crate::types::pcf::{
    SmPolicyContextData, SmPolicyDecision, SmPolicyDeleteData, SmPolicyUpdateContextData,
};
use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;

const SM_POLICIES_PATH: &str = "/npcf-smpolicycontrol/v1/sm-policies";
const SM_POLICY_SCOPE: &str = "npcf-smpolicycontrol";

/// What the PCF answered. Status interpretation is left to the caller; `body`
/// is only decoded for 2xx answers that carry one.
#[derive(Debug, Clone, PartialEq)]
pub struct PcfResponse<T> {
    pub status: u16,
    pub location: Option<String>,
    pub body: Option<T>,
}

impl<T> PcfResponse<T> {
    pub fn new(status: u16, body: Option<T>) -> Self {
        Self {
            status,
            location: None,
            body,
        }
    }

    #[cfg(test)]
    pub fn with_location(mut self, location: &str) -> Self {
        self.location = Some(location.to_string());
        self
    }
}

/// N7 SM policy control operations towards the PCF.
#[async_trait]
pub trait PolicyClient: Send + Sync {
    async fn create_sm_policy(
        &self,
        context: &SmPolicyContextData,
    ) -> Result<PcfResponse<SmPolicyDecision>, SessionError>;

    async fn update_sm_policy(
        &self,
        sm_policy_id: &str,
        update: &SmPolicyUpdateContextData,
    ) -> Result<PcfResponse<SmPolicyDecision>, SessionError>;

    async fn delete_sm_policy(
        &self,
        sm_policy_id: &str,
        delete: &SmPolicyDeleteData,
    ) -> Result<PcfResponse<()>, SessionError>;
}

pub struct PcfClient {
    client: Client,
    base_url: String,
    oauth2_client: Option<Arc<OAuth2TokenClient>>,
}

impl PcfClient {
    pub fn new(base_url: &str, request_timeout: Duration) -> anyhow::Result<Self> {
        Ok(Self {
            client: Client::builder()
                .timeout(request_timeout)
                .build()
                .context("Failed to build PCF HTTP client")?,
            base_url: base_url.trim_end_matches('/').to_string(),
            oauth2_client: None,
        })
    }

    pub fn with_oauth2(mut self, oauth2_client: Arc<OAuth2TokenClient>) -> Self {
        self.oauth2_client = Some(oauth2_client);
        self
    }

    fn policy_url(&self, sm_policy_id: &str) -> String {
        format!("{}{}/{}", self.base_url, SM_POLICIES_PATH, sm_policy_id)
    }

    async fn send(
        &self,
        request: RequestBuilder,
        operation: PolicyOperation,
    ) -> Result<Response, SessionError> {
        let request = match &self.oauth2_client {
            Some(oauth2) => oauth2
                .authorize(request, SM_POLICY_SCOPE)
                .await
                .map_err(|e| SessionError::Transport(format!("{:#}", e)))?,
            None => request,
        };

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                SessionError::Timeout(operation)
            } else {
                SessionError::Transport(e.to_string())
            }
        })?;

        // a rejected token is dropped so the next call fetches a fresh one
        if response.status() == StatusCode::UNAUTHORIZED {
            if let Some(oauth2) = &self.oauth2_client {
                oauth2.invalidate_token(SM_POLICY_SCOPE).await;
            }
        }
        Ok(response)
    }

    async fn decode<T: DeserializeOwned>(
        response: Response,
        operation: PolicyOperation,
    ) -> Result<PcfResponse<T>, SessionError> {
        let status = response.status();
        let location = response
            .headers()
            .get(reqwest::header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string());

        if !status.is_success() || status == StatusCode::NO_CONTENT {
            let error_body = response.text().await.unwrap_or_default();
            if !status.is_success() {
                tracing::warn!(
                    "PCF answered SM policy {} with status {}: {}",
                    operation,
                    status,
                    error_body
                );
            }
            return Ok(PcfResponse {
                status: status.as_u16(),
                location,
                body: None,
            });
        }

        let body: T = response.json().await.map_err(|e| {
            if e.is_timeout() {
                SessionError::Timeout(operation)
            } else {
                SessionError::Transport(format!(
                    "Failed to parse SM policy {} response from PCF: {}",
                    operation, e
                ))
            }
        })?;

        Ok(PcfResponse {
            status: status.as_u16(),
            location,
            body: Some(body),
        })
    }
}

#[async_trait]
impl PolicyClient for PcfClient {
    async fn create_sm_policy(
        &self,
        context: &SmPolicyContextData,
    ) -> Result<PcfResponse<SmPolicyDecision>, SessionError> {
        let url = format!("{}{}", self.base_url, SM_POLICIES_PATH);
        tracing::debug!("Creating SM policy for SUPI {} at {}", context.supi, url);

        let response = self
            .send(self.client.post(&url).json(context), PolicyOperation::Create)
            .await?;
        Self::decode(response, PolicyOperation::Create).await
    }

    async fn update_sm_policy(
        &self,
        sm_policy_id: &str,
        update: &SmPolicyUpdateContextData,
    ) -> Result<PcfResponse<SmPolicyDecision>, SessionError> {
        let url = format!("{}/update", self.policy_url(sm_policy_id));
        tracing::debug!("Updating SM policy {}", sm_policy_id);

        let response = self
            .send(self.client.post(&url).json(update), PolicyOperation::Update)
            .await?;
        Self::decode(response, PolicyOperation::Update).await
    }

    async fn delete_sm_policy(
        &self,
        sm_policy_id: &str,
        delete: &SmPolicyDeleteData,
    ) -> Result<PcfResponse<()>, SessionError> {
        let url = format!("{}/delete", self.policy_url(sm_policy_id));
        tracing::debug!("Deleting SM policy {}", sm_policy_id);

        let response = self
            .send(self.client.post(&url).json(delete), PolicyOperation::Delete)
            .await?;
        let status = response.status().as_u16();
        let _ = response.bytes().await;
        Ok(PcfResponse::new(status, None))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::pcf::PduSessionType;
    use crate::types::Snssai;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn context() -> SmPolicyContextData {
        SmPolicyContextData {
            supi: "001010000000001".to_string(),
            pdu_session_id: 5,
            dnn: "internet".to_string(),
            slice_info: Snssai::default(),
            notification_uri: "http://proxy/notify/abc".to_string(),
            pdu_session_type: PduSessionType::Ipv4,
            gpsi: None,
            ipv4_address: None,
            ipv6_address_prefix: None,
            access_type: None,
            rat_type: None,
            ue_time_zone: None,
            online: None,
            offline: None,
        }
    }

    #[tokio::test]
    async fn test_create_returns_status_location_and_decision() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/npcf-smpolicycontrol/v1/sm-policies"))
            .and(body_partial_json(serde_json::json!({"supi": "001010000000001"})))
            .respond_with(
                ResponseTemplate::new(201)
                    .insert_header("Location", "http://pcf/npcf-smpolicycontrol/v1/sm-policies/42")
                    .set_body_json(serde_json::json!({"online": true})),
            )
            .mount(&server)
            .await;

        let client = PcfClient::new(&server.uri(), Duration::from_secs(2)).unwrap();
        let response = client.create_sm_policy(&context()).await.unwrap();

        assert_eq!(response.status, 201);
        assert_eq!(
            response.location.as_deref(),
            Some("http://pcf/npcf-smpolicycontrol/v1/sm-policies/42")
        );
        assert_eq!(response.body.unwrap().online, Some(true));
    }

    #[tokio::test]
    async fn test_update_posts_to_update_resource() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/npcf-smpolicycontrol/v1/sm-policies/42/update"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .expect(1)
            .mount(&server)
            .await;

        let client = PcfClient::new(&server.uri(), Duration::from_secs(2)).unwrap();
        let response = client
            .update_sm_policy("42", &SmPolicyUpdateContextData::default())
            .await
            .unwrap();
        assert_eq!(response.status, 200);
        assert!(response.body.is_some());
    }

    #[tokio::test]
    async fn test_error_status_is_passed_through() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/npcf-smpolicycontrol/v1/sm-policies/missing/delete"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = PcfClient::new(&server.uri(), Duration::from_secs(2)).unwrap();
        let response = client
            .delete_sm_policy("missing", &SmPolicyDeleteData::default())
            .await
            .unwrap();
        assert_eq!(response.status, 404);
    }

    #[tokio::test]
    async fn test_slow_pcf_is_a_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({}))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let client = PcfClient::new(&server.uri(), Duration::from_millis(50)).unwrap();
        let err = client
            .update_sm_policy("42", &SmPolicyUpdateContextData::default())
            .await
            .unwrap_err();
        assert_eq!(err, SessionError::Timeout(PolicyOperation::Update));
    }

    #[tokio::test]
    async fn test_unreachable_pcf_is_a_transport_error() {
        let client = PcfClient::new("http://127.0.0.1:1", Duration::from_secs(1)).unwrap();
        let err = client
            .delete_sm_policy("42", &SmPolicyDeleteData::default())
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::Transport(_)));
    }

    #[tokio::test]
    async fn test_bearer_token_attached() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth2/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "tok",
                "token_type": "Bearer",
                "expires_in": 3600
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/npcf-smpolicycontrol/v1/sm-policies/7/update"))
            .and(header("authorization", "Bearer tok"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .expect(1)
            .mount(&server)
            .await;

        let oauth2 = Arc::new(OAuth2TokenClient::new(
            format!("{}/oauth2/token", server.uri()),
            "proxy".to_string(),
            "secret".to_string(),
        )
        .unwrap());
        let client = PcfClient::new(&server.uri(), Duration::from_secs(2))
            .unwrap()
            .with_oauth2(oauth2);
        let response = client
            .update_sm_policy("7", &SmPolicyUpdateContextData::default())
            .await
            .unwrap();
        assert_eq!(response.status, 200);
    }

    #[tokio::test]
    async fn test_rejected_token_is_refetched() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth2/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "stale",
                "token_type": "Bearer",
                "expires_in": 3600
            })))
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/npcf-smpolicycontrol/v1/sm-policies/7/delete"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let oauth2 = Arc::new(OAuth2TokenClient::new(
            format!("{}/oauth2/token", server.uri()),
            "proxy".to_string(),
            "secret".to_string(),
        )
        .unwrap());
        let client = PcfClient::new(&server.uri(), Duration::from_secs(2))
            .unwrap()
            .with_oauth2(oauth2);
        let delete = SmPolicyDeleteData::default();
        assert_eq!(client.delete_sm_policy("7", &delete).await.unwrap().status, 401);
        assert_eq!(client.delete_sm_policy("7", &delete).await.unwrap().status, 401);
    }
}
