use std::sync::Arc;

use lingualearn_api::services::store::MongoProgressStore;
use lingualearn_api::{config::Config, create_router, services::AppState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lingualearn_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting LinguaLearn API");

    let config = Config::load()?;
    tracing::info!(
        "Configuration loaded for environment: {:?}",
        std::env::var("APP_ENV").unwrap_or_else(|_| "dev".to_string())
    );

    let mongo_client = mongodb::Client::with_uri_str(&config.mongo_uri).await?;
    let mongo = mongo_client.database(&config.mongo_database);
    tracing::info!("MongoDB connected");

    let store = Arc::new(MongoProgressStore::new(mongo));
    let listen_addr = config.listen_addr.clone();
    let app_state = Arc::new(AppState::new(config, store)?);

    let app = create_router(app_state);

    let listener = tokio::net::TcpListener::bind(&listen_addr).await?;
    tracing::info!("Server listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
