use anyhow::{bail, Context};
use reqwest::Url;
use std::env;
use std::net::{SocketAddr, ToSocketAddrs};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct OAuth2ClientConfig {
    pub token_url: String,
    pub client_id: String,
    pub client_secret: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub mongodb_uri: String,
    pub mongodb_database: String,
    pub pcf_base_url: String,
    pub oauth2: Option<OAuth2ClientConfig>,
    pub n7_disabled: bool,
    pub notify_listen_addr: String,
    pub notify_api_root: String,
    pub request_timeout: Duration,
    pub failure_ratio_threshold: f64,
    pub minimum_request_threshold: u64,
    pub gateway_relay_uri: String,
    pub nf_instance_id: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let port = env::var("PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()?;

        let mongodb_uri = env::var("MONGODB_URI")
            .unwrap_or_else(|_| "mongodb://localhost:27017".to_string());

        let mongodb_database = env::var("MONGODB_DATABASE")
            .unwrap_or_else(|_| "policydb".to_string());

        let pcf_base_url = env::var("PCF_BASE_URL")
            .unwrap_or_else(|_| "http://127.0.0.1:9090".to_string());

        let oauth2 = env::var("PCF_TOKEN_URL")
            .ok()
            .filter(|url| !url.is_empty())
            .map(|token_url| OAuth2ClientConfig {
                token_url,
                client_id: env::var("PCF_CLIENT_ID").unwrap_or_default(),
                client_secret: env::var("PCF_CLIENT_SECRET").unwrap_or_default(),
            });

        let n7_disabled = parse_flag(
            "N7_DISABLED",
            &env::var("N7_DISABLED").unwrap_or_else(|_| "false".to_string()),
        )?;

        let notify_listen_addr = env::var("NOTIFY_LISTEN_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:8081".to_string());

        let notify_api_root = env::var("NOTIFY_API_ROOT").unwrap_or_else(|_| {
            "http://127.0.0.1:8081/npcf-smpolicycontrol/v1/notify".to_string()
        });

        let request_timeout_ms: u64 = env::var("PCF_REQUEST_TIMEOUT_MS")
            .unwrap_or_else(|_| "5000".to_string())
            .parse()?;

        let failure_ratio_threshold = env::var("HEALTH_FAILURE_RATIO_THRESHOLD")
            .unwrap_or_else(|_| "0.5".to_string())
            .parse()?;

        let minimum_request_threshold = env::var("HEALTH_MINIMUM_REQUEST_THRESHOLD")
            .unwrap_or_else(|_| "1".to_string())
            .parse()?;

        let gateway_relay_uri = env::var("GATEWAY_RELAY_URI")
            .unwrap_or_else(|_| "http://127.0.0.1:50065".to_string());

        let nf_instance_id = env::var("NF_INSTANCE_ID")
            .unwrap_or_else(|_| uuid::Uuid::new_v4().to_string());

        Ok(Self {
            port,
            mongodb_uri,
            mongodb_database,
            pcf_base_url,
            oauth2,
            n7_disabled,
            notify_listen_addr,
            notify_api_root,
            request_timeout: Duration::from_millis(request_timeout_ms),
            failure_ratio_threshold,
            minimum_request_threshold,
            gateway_relay_uri,
            nf_instance_id,
        })
    }

    /// Rejects malformed URLs and listen addresses before anything is started.
    pub fn validate(&self) -> anyhow::Result<()> {
        parse_http_url("PCF_BASE_URL", &self.pcf_base_url)?;
        parse_http_url("NOTIFY_API_ROOT", &self.notify_api_root)?;
        parse_http_url("GATEWAY_RELAY_URI", &self.gateway_relay_uri)?;
        if let Some(oauth2) = &self.oauth2 {
            parse_http_url("PCF_TOKEN_URL", &oauth2.token_url)?;
            if oauth2.client_id.is_empty() {
                bail!("PCF_CLIENT_ID is required when PCF_TOKEN_URL is set");
            }
        }

        self.notify_socket_addr()?;

        if self.request_timeout.is_zero() {
            bail!("PCF_REQUEST_TIMEOUT_MS must be positive");
        }
        if !(0.0..=1.0).contains(&self.failure_ratio_threshold) {
            bail!(
                "HEALTH_FAILURE_RATIO_THRESHOLD must be within [0, 1], got {}",
                self.failure_ratio_threshold
            );
        }
        Ok(())
    }

    pub fn notify_socket_addr(&self) -> anyhow::Result<SocketAddr> {
        self.notify_listen_addr
            .to_socket_addrs()
            .with_context(|| format!("Invalid NOTIFY_LISTEN_ADDR {}", self.notify_listen_addr))?
            .next()
            .with_context(|| format!("NOTIFY_LISTEN_ADDR {} did not resolve", self.notify_listen_addr))
    }

    /// Path component of the notification API root, where the callback
    /// routes are mounted.
    pub fn notify_path(&self) -> anyhow::Result<String> {
        let url = parse_http_url("NOTIFY_API_ROOT", &self.notify_api_root)?;
        Ok(url.path().trim_end_matches('/').to_string())
    }
}

fn parse_flag(name: &str, value: &str) -> anyhow::Result<bool> {
    value
        .trim()
        .parse()
        .with_context(|| format!("{} must be true or false, got {}", name, value))
}

fn parse_http_url(name: &str, value: &str) -> anyhow::Result<Url> {
    let url = Url::parse(value).with_context(|| format!("Invalid {} {}", name, value))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        bail!("{} must be an http(s) URL, got {}", name, value);
    }
    Ok(url)
}
