use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use assist_bridge::config::Config;
use assist_bridge::routes;
use assist_bridge::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::from_env();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if config.debug {
            "assist_bridge=debug,tower_http=debug"
        } else {
            "assist_bridge=info"
        })
    });
    tracing_subscriber::fmt().with_env_filter(filter).init();
    debug!(?config, "loaded configuration");

    let state = Arc::new(AppState::new(config).context("failed to build the HTTP client")?);

    // Sweep idle sessions in the background.
    let sweeper = state.clone();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(300));
        loop {
            ticker.tick().await;
            let purged = sweeper.sessions.purge_expired().await;
            if purged > 0 {
                debug!("purged {purged} idle sessions");
            }
        }
    });

    let bind_addr = state.config.bind_addr.clone();
    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;

    info!("assist bridge listening on {bind_addr}");
    axum::serve(listener, app).await?;
    Ok(())
}
