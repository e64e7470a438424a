use std::net::SocketAddr;

use anyhow::Context;
use axum::Router;

use mpesa_express::build_router;
use mpesa_express::config::AppConfig;
use mpesa_express::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("❌ Refusing to start: {}", e);
            std::process::exit(1);
        }
    };
    tracing::info!("✅ App config loaded successfully");
    tracing::info!("📱 Short code: {}", config.mpesa_short_code);
    tracing::info!("🌐 Environment: {}", config.mpesa_environment);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| format!("invalid HOST/PORT: {}:{}", config.host, config.port))?;

    let app_state = AppState::new(config).context("failed to initialize M-Pesa service")?;
    let app = build_router(app_state);

    start_server(app, addr).await
}

async fn start_server(app: Router, addr: SocketAddr) -> anyhow::Result<()> {
    tracing::info!("🚀 Server starting on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {}", addr))?;
    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
