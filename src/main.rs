use std::net::SocketAddr;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use oxiwardrobe::{create_api_routes, AppConfig, AppState};

/// OxiWardrobe - Wardrobe item lifecycle service
///
/// Keeps a user's clothing items in one of two stores (the device's durable key/value store
/// when anonymous, the remote wardrobe API when signed in), moves them through a per-owner
/// trash ledger and runs uploads through an optional style-transform step.
///
/// The architecture follows the Clean/Hexagonal Architecture pattern:
///
/// - Domain Layer: entities, repository ports and pure rules (domain/*)
/// - Application Layer: the lifecycle manager, upload pipeline and DTOs (application/*)
/// - Infrastructure Layer: key/value, remote API and transform adapters (infrastructure/*)
/// - Interface Layer: the local HTTP API consumed by the UI (interfaces/*)
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration from environment variables
    let config = AppConfig::from_env();
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid OXIWARDROBE_HOST/OXIWARDROBE_PORT")?;

    let state = AppState::from_config(config)
        .await
        .context("Failed to initialize application services")?;
    let app = create_api_routes(state);

    tracing::info!("Starting OxiWardrobe API on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
