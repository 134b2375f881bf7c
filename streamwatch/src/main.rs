use streamwatch::api::{ApiServer, ApiServerConfig, AppState};
use streamwatch::config::AppConfig;
use streamwatch::database;
use streamwatch::logging::{LogFormat, init_logging};
use streamwatch::services::ServiceContainer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    init_logging(LogFormat::from_env())?;

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {}", e);
            return Err(e.into());
        }
    };

    let pool = database::init_pool(&config.database_url).await?;
    database::run_migrations(&pool).await?;

    let container = ServiceContainer::new(&config, pool)?;

    let server = ApiServer::new(
        ApiServerConfig::from_env_or_default(),
        AppState::with_sync(container.sync.clone()),
    );

    let cancel_token = server.cancel_token();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for shutdown signal: {}", e);
            return;
        }
        tracing::info!("Shutdown signal received");
        cancel_token.cancel();
    });

    tracing::info!("streamwatch initialized successfully");
    server.run().await?;

    container.pool.close().await;
    Ok(())
}
