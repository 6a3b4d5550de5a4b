use crate::types::session::{
    AbortSessionRequest, AbortSessionResult, PolicyReAuthAnswer, PolicyReAuthRequest,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;

/// Gateway-side RPCs the PCF notifications are relayed to.
#[async_trait]
pub trait SessionRelay: Send + Sync {
    async fn policy_reauth(&self, request: &PolicyReAuthRequest) -> Result<PolicyReAuthAnswer>;

    async fn abort_session(&self, request: &AbortSessionRequest) -> Result<AbortSessionResult>;
}

pub struct HttpSessionRelay {
    client: Client,
    base_url: String,
}

impl HttpSessionRelay {
    pub fn new(base_url: &str, request_timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: Client::builder()
                .timeout(request_timeout)
                .build()
                .context("Failed to build gateway relay HTTP client")?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn call<Req, Resp>(&self, rpc: &str, request: &Req) -> Result<Resp>
    where
        Req: Serialize + Sync,
        Resp: DeserializeOwned,
    {
        let url = format!("{}/{}", self.base_url, rpc);
        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .with_context(|| format!("Failed to send {} to gateway", rpc))?;

        match response.status() {
            StatusCode::OK => response
                .json()
                .await
                .with_context(|| format!("Failed to parse {} answer from gateway", rpc)),
            status => {
                let error_body = response.text().await.unwrap_or_default();
                Err(anyhow::anyhow!(
                    "Gateway {} failed with status {}: {}",
                    rpc,
                    status,
                    error_body
                ))
            }
        }
    }
}

#[async_trait]
impl SessionRelay for HttpSessionRelay {
    async fn policy_reauth(&self, request: &PolicyReAuthRequest) -> Result<PolicyReAuthAnswer> {
        tracing::debug!("Relaying policy re-auth for session {}", request.session_id);
        self.call("policy-reauth", request).await
    }

    async fn abort_session(&self, request: &AbortSessionRequest) -> Result<AbortSessionResult> {
        tracing::debug!("Relaying abort for session {}", request.session_id);
        self.call("abort-session", request).await
    }
}
