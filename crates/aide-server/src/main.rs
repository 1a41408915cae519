mod activity;
mod configuration;
mod credential;
mod error;
mod routes;
mod state;

use aide::providers::openai::OpenAiProvider;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::credential::OnBehalfOf;
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging, RUST_LOG overrides the default level
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let settings = configuration::Settings::new()?;

    let provider_config = settings.provider.into_config();
    info!(model = %provider_config.model, "using openai model");
    let provider = OpenAiProvider::new(provider_config)?;

    let state = AppState {
        provider: Arc::new(provider),
        credentials: Arc::new(OnBehalfOf::new(settings.auth)?),
        graph: settings.graph,
        max_function_calls: settings.agent.max_function_calls,
    };

    let app = routes::configure(state).layer(TraceLayer::new_for_http());

    let addr = settings.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
