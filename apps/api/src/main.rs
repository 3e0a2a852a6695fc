mod cases;
mod config;
mod errors;
mod evaluation;
mod llm_client;
mod notices;
mod routes;
mod session;
mod state;
mod transcript;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::cases::CaseCatalog;
use crate::config::Config;
use crate::evaluation::expert::build_provider;
use crate::llm_client::{LlmClient, ModelGateway, RetryPolicy};
use crate::routes::build_router;
use crate::session::SessionStore;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Interview Analyzer v{}", env!("CARGO_PKG_VERSION"));

    // Initialize model gateway
    let client = LlmClient::new(
        config.openai_api_key.clone(),
        &config.openai_base_url,
        config.openai_model.clone(),
    )?;
    info!("LLM client initialized (model: {})", client.model());
    let gateway = ModelGateway::new(Arc::new(client), RetryPolicy::default());

    // Load case studies (empty catalog on failure)
    let catalog = Arc::new(CaseCatalog::load(&config.case_studies_path));
    if catalog.is_empty() {
        warn!("Case catalog is empty; case selection and static expert solutions are unavailable");
    }

    // Expert solution provider: static by default, swap via ENABLE_GENERATIVE_EXPERT_SOLUTION
    let expert_provider = build_provider(config.flags.generative_expert_solution, gateway.clone());
    info!(
        "Expert solution provider: {}, wizard: {}, notices: {:?}",
        expert_provider.backend_name(),
        config.flags.wizard_variant,
        config.flags.log_level
    );

    let state = AppState {
        config: config.clone(),
        gateway,
        catalog,
        expert_provider,
        sessions: SessionStore::default(),
        started_at: Instant::now(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
