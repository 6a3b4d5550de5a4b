use mongodb::{Client, Database};
use std::sync::Arc;

use crate::config::Config;
use crate::services::gateway_relay::HttpSessionRelay;
use crate::services::health::{HealthConfig, HealthTracker};
use crate::services::notification_relay::NotificationRelay;
use crate::services::oauth2_client::OAuth2TokenClient;
use crate::services::pcf::PcfClient;
use crate::services::policy_db::MongoPolicyDb;
use crate::services::session_controller::{SessionController, SessionControllerConfig};

#[derive(Clone)]
pub struct AppState {
    pub controller: Arc<SessionController>,
    pub notification_relay: Arc<NotificationRelay>,
}

pub async fn connect(uri: &str, database: &str) -> anyhow::Result<Database> {
    let client = Client::with_uri_str(uri).await?;
    let db = client.database(database);

    tracing::info!("Connected to MongoDB");

    Ok(db)
}

pub async fn init(config: &Config) -> anyhow::Result<AppState> {
    let db = connect(&config.mongodb_uri, &config.mongodb_database).await?;

    let mut pcf_client = PcfClient::new(&config.pcf_base_url, config.request_timeout)?;
    if let Some(oauth2) = &config.oauth2 {
        tracing::info!("Using OAuth2 tokens from {}", oauth2.token_url);
        pcf_client = pcf_client.with_oauth2(Arc::new(OAuth2TokenClient::new(
            oauth2.token_url.clone(),
            oauth2.client_id.clone(),
            oauth2.client_secret.clone(),
        )?));
    }

    let health = Arc::new(HealthTracker::new(HealthConfig {
        failure_ratio_threshold: config.failure_ratio_threshold,
        minimum_request_threshold: config.minimum_request_threshold,
        n7_disabled: config.n7_disabled,
    }));

    let controller = SessionController::new(
        SessionControllerConfig {
            n7_disabled: config.n7_disabled,
            notify_api_root: config.notify_api_root.trim_end_matches('/').to_string(),
            request_timeout: config.request_timeout,
        },
        Arc::new(pcf_client),
        Arc::new(MongoPolicyDb::new(db)),
        health,
    );

    let relay = HttpSessionRelay::new(&config.gateway_relay_uri, config.request_timeout)?;

    Ok(AppState {
        controller: Arc::new(controller),
        notification_relay: Arc::new(NotificationRelay::new(Arc::new(relay))),
    })
}
