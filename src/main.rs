use std::sync::Arc;

use mimalloc::MiMalloc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use zapscan::config::AppConfig;
use zapscan::scanner::zap::ZapClient;
use zapscan::services::orchestrator::ScanOrchestrator;
use zapscan::AppState;

// M-MIMALLOC-APP: Use mimalloc as global allocator for improved performance.
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "zapscan=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    let config = AppConfig::from_env().expect("Failed to load configuration");

    let client = ZapClient::new(&config.zap)?;
    tracing::info!(zap = %client.base_url(), "Using ZAP daemon");

    let orchestrator = Arc::new(ScanOrchestrator::new(
        Arc::new(client),
        config.scan.clone(),
    ));

    let addr = format!("{}:{}", config.host, config.port);
    tracing::info!(host = %addr, "Starting zapscan API server");

    let app = zapscan::routes::app(AppState { orchestrator });

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
