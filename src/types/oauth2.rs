use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub scope: Option<String>,
}

/// Form body of an RFC 6749 client-credentials grant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientCredentialsRequest {
    pub grant_type: String,
    pub client_id: String,
    pub client_secret: String,
    pub scope: String,
}

#[derive(Debug, Clone)]
pub struct CachedToken {
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
}

impl CachedToken {
    pub fn from_access_token(token: AccessToken) -> Self {
        Self {
            expires_at: Utc::now() + Duration::seconds(token.expires_in),
            access_token: token.access_token,
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }

    pub fn expires_soon(&self, buffer_seconds: i64) -> bool {
        Utc::now() + Duration::seconds(buffer_seconds) >= self.expires_at
    }
}
