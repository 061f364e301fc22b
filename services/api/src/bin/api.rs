//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{
        CloudinaryStorage, DbAdapter, OpenAiTextAdapter, UnconfiguredStorage,
        UnconfiguredTextGenerator,
    },
    config::Config,
    error::ApiError,
    web::{self, rest::ApiDoc, state::AppState, token::TokenIssuer},
};
use async_openai::{config::OpenAIConfig, Client};
use job_tracker_core::{AiGateway, ApplicationService, ObjectStorage, TextGenerationService};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Config::from_env()?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Connect to Database & Run Migrations ---
    info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;
    let db_adapter = Arc::new(DbAdapter::new(db_pool));
    info!("Running database migrations...");
    db_adapter.run_migrations().await?;
    info!("Database migrations complete.");

    // --- 3. Initialize Service Adapters ---
    let generator: Arc<dyn TextGenerationService> = match &config.openai_api_key {
        Some(api_key) => {
            let openai_client = Client::with_config(OpenAIConfig::new().with_api_key(api_key));
            Arc::new(OpenAiTextAdapter::new(openai_client, config.ai_model.clone()))
        }
        None => {
            warn!("OPENAI_API_KEY is not set; AI endpoints will be unavailable");
            Arc::new(UnconfiguredTextGenerator)
        }
    };

    let storage: Arc<dyn ObjectStorage> = match &config.cloudinary {
        Some(cloudinary) => Arc::new(CloudinaryStorage::new(
            reqwest::Client::new(),
            cloudinary.clone(),
        )),
        None => {
            warn!("Cloudinary credentials are not set; document uploads will be unavailable");
            Arc::new(UnconfiguredStorage)
        }
    };

    // --- 4. Build the Shared AppState ---
    let app_state = Arc::new(AppState {
        credentials: db_adapter.clone(),
        applications: Arc::new(ApplicationService::new(
            db_adapter,
            storage,
            config.upload_folder.clone(),
        )),
        ai: Arc::new(AiGateway::new(generator)),
        tokens: TokenIssuer::new(config.jwt_secret.as_bytes(), config.jwt_expires_in),
    });

    // --- 5. Create the Web Router ---
    // Merge the API router with the Swagger UI router for a complete application.
    let app = web::router(app_state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(web::cors_layer(&config.client_url)?);

    // --- 6. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
