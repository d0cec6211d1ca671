use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use quarry_server::api::server::{ApiServer, ApiServerConfig, AppState};
use quarry_server::config::EngineConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "quarry_server=debug,ytdlp_bridge=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment variables
    dotenvy::dotenv().ok();

    let engine_config = EngineConfig::from_env_or_default();
    tracing::info!(
        engine_path = %engine_config.binary_path.display(),
        budget_secs = engine_config.budget.as_secs(),
        "engine configured"
    );

    let server = ApiServer::with_state(
        ApiServerConfig::from_env_or_default(),
        AppState::new(&engine_config),
    );

    let cancel_token = server.cancel_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel_token.cancel();
        }
    });

    server.run().await?;

    Ok(())
}
