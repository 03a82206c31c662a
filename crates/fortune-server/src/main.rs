use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use fortune_core::FortuneConfig;
use fortune_server::{router, AppState, FORTUNE_PATH};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // A missing .env file is normal in deployed environments.
    dotenv::dotenv().ok();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = FortuneConfig::from_env().inspect_err(|e| tracing::error!("config error: {e}"))?;
    if config.verifier.is_bypassed() {
        warn!("proxy signature verification is DISABLED (DEV_SKIP_PROXY_VERIFY=true)");
    }
    if !config.llm.is_configured() {
        warn!(
            provider = %config.llm.provider,
            "generation credential missing; unlocked readings will use local synthesis"
        );
    }
    info!(
        unlock_codes = config.unlock_code_count(),
        model = %config.llm.model,
        "configuration loaded"
    );

    let addr = config.bind_addr();
    let app = router(Arc::new(AppState::from_config(config)));

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("fortune-server listening on http://{addr}{FORTUNE_PATH}");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}
