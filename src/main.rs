use std::net::SocketAddr;

use anyhow::Context;
use product_catalog::{app, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "product_catalog=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let app_state = AppState::init().await?;

    if let Err(e) = app_state.store.initialize().await {
        tracing::error!(error = %e, "failed to initialize database schema");
        return Err(e).context("database initialization failed");
    }

    let addr: SocketAddr = format!("{}:{}", app_state.config.host, app_state.config.port)
        .parse()
        .context("APP_HOST/APP_PORT do not form a socket address")?;
    tracing::info!(
        environment = ?app_state.config.environment,
        backend = app_state.store.backend(),
        "starting product catalog"
    );

    app::serve(app::build_app(app_state), addr).await
}
