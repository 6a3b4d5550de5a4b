use crate::types::oauth2::{AccessToken, CachedToken, ClientCredentialsRequest};
use anyhow::{Context, Result};
use reqwest::{Client, RequestBuilder, StatusCode};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Client-credentials token source for the PCF. Tokens are cached per scope
/// and refreshed shortly before they expire.
pub struct OAuth2TokenClient {
    client: Client,
    token_endpoint: String,
    client_id: String,
    client_secret: String,
    token_cache: Arc<RwLock<HashMap<String, CachedToken>>>,
    refresh_buffer_seconds: i64,
}

impl OAuth2TokenClient {
    pub fn new(token_endpoint: String, client_id: String, client_secret: String) -> Result<Self> {
        Ok(Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .context("Failed to build OAuth2 HTTP client")?,
            token_endpoint,
            client_id,
            client_secret,
            token_cache: Arc::new(RwLock::new(HashMap::new())),
            refresh_buffer_seconds: 60,
        })
    }

    pub async fn get_token(&self, scope: &str) -> Result<String> {
        {
            let cache = self.token_cache.read().await;
            if let Some(cached) = cache.get(scope) {
                if !cached.is_expired() && !cached.expires_soon(self.refresh_buffer_seconds) {
                    tracing::debug!("Using cached OAuth2 token for scope: {}", scope);
                    return Ok(cached.access_token.clone());
                }
            }
        }

        tracing::info!("Requesting new OAuth2 token for scope: {}", scope);
        let cached = CachedToken::from_access_token(self.request_token(scope).await?);
        let access_token = cached.access_token.clone();
        self.token_cache
            .write()
            .await
            .insert(scope.to_string(), cached);

        Ok(access_token)
    }

    async fn request_token(&self, scope: &str) -> Result<AccessToken> {
        let form = ClientCredentialsRequest {
            grant_type: "client_credentials".to_string(),
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
            scope: scope.to_string(),
        };

        let response = self
            .client
            .post(&self.token_endpoint)
            .form(&form)
            .send()
            .await
            .context("Failed to send OAuth2 token request")?;

        match response.status() {
            StatusCode::OK => {
                let token: AccessToken = response
                    .json()
                    .await
                    .context("Failed to parse OAuth2 token response")?;
                tracing::info!(
                    "Obtained OAuth2 token (expires in {} seconds)",
                    token.expires_in
                );
                Ok(token)
            }
            status => {
                let error_body = response.text().await.unwrap_or_default();
                Err(anyhow::anyhow!(
                    "OAuth2 token request failed with status {}: {}",
                    status,
                    error_body
                ))
            }
        }
    }

    pub async fn invalidate_token(&self, scope: &str) {
        self.token_cache.write().await.remove(scope);
        tracing::debug!("Invalidated cached token for scope: {}", scope);
    }

    /// Attaches a bearer token for `scope` to an outgoing request.
    pub async fn authorize(&self, request: RequestBuilder, scope: &str) -> Result<RequestBuilder> {
        let token = self.get_token(scope).await?;
        Ok(request.bearer_auth(token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn token_body() -> serde_json::Value {
        serde_json::json!({
            "access_token": "token-1",
            "token_type": "Bearer",
            "expires_in": 3600
        })
    }

    #[tokio::test]
    async fn test_token_is_cached_per_scope() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth2/token"))
            .and(body_string_contains("grant_type=client_credentials"))
            .and(body_string_contains("client_id=proxy"))
            .respond_with(ResponseTemplate::new(200).set_body_json(token_body()))
            .expect(1)
            .mount(&server)
            .await;

        let client = OAuth2TokenClient::new(
            format!("{}/oauth2/token", server.uri()),
            "proxy".to_string(),
            "secret".to_string(),
        )
        .unwrap();

        assert_eq!(client.get_token("npcf-smpolicycontrol").await.unwrap(), "token-1");
        assert_eq!(client.get_token("npcf-smpolicycontrol").await.unwrap(), "token-1");
    }

    #[tokio::test]
    async fn test_token_endpoint_rejection() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad client"))
            .mount(&server)
            .await;

        let client = OAuth2TokenClient::new(
            format!("{}/oauth2/token", server.uri()),
            "proxy".to_string(),
            "wrong".to_string(),
        )
        .unwrap();
        let err = client.get_token("npcf-smpolicycontrol").await.unwrap_err();
        assert!(err.to_string().contains("401"));
    }
}
