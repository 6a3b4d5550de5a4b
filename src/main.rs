mod config;
mod db;
mod handlers;
mod services;
mod types;
mod utils;

use std::future::IntoFuture;
use std::net::SocketAddr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sm_policy_proxy=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = config::Config::from_env()?;
    config.validate()?;

    tracing::info!(
        "SM policy proxy {} (N7 {})",
        config.nf_instance_id,
        if config.n7_disabled { "disabled" } else { "enabled" }
    );

    let state = db::init(&config).await?;

    let session_app = handlers::session_router(state.clone());
    let notify_app = handlers::notify_router(state, &config.notify_path()?);

    let session_addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let notify_addr = config.notify_socket_addr()?;

    tracing::info!("Starting session API on {}", session_addr);
    tracing::info!(
        "Starting PCF notification listener on {} for {}",
        notify_addr,
        config.notify_api_root
    );

    let session_listener = tokio::net::TcpListener::bind(session_addr).await?;
    let notify_listener = tokio::net::TcpListener::bind(notify_addr).await?;

    tokio::try_join!(
        axum::serve(session_listener, session_app).into_future(),
        axum::serve(notify_listener, notify_app).into_future(),
    )?;

    Ok(())
}
