//! mosKITA Dengue Forecast - API Server
//!
//! Serves four-week dengue outbreak risk forecasts per barangay, plus data
//! uploads and community case reports.

use std::net::SocketAddr;

use dengue_forecast_backend::{create_app, AppState, Config};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "moskita_server=debug,dengue_forecast_backend=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::load()?;

    tracing::info!("Starting mosKITA Dengue Forecast Server");
    tracing::info!("Environment: {}", config.environment);

    // Load model artifacts
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let state = tokio::task::spawn_blocking(move || AppState::new(config)).await?;
    if !state.models.snapshot().is_model_loaded() {
        tracing::warn!("No model loaded; forecast endpoints will return 503 until one is trained");
    }

    // Build application
    let app = create_app(state);

    // Start server
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
