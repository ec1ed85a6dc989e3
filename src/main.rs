use anyhow::Result;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

use pptx_translator::config::Config;
use pptx_translator::routes;
use pptx_translator::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("pptx_translator=debug,tower_http=debug")),
        )
        .init();

    let config = Config::load()?;
    info!("Loaded configuration, translation service at {}", config.api.api_url);

    let addr = config.socket_addr()?;
    let sweep_every = Duration::from_secs(config.session.sweep_interval_secs.max(1));

    let app_state = AppState::new(config)?;
    app_state.sessions.spawn_sweeper(sweep_every);

    let app = routes::app(app_state);

    info!("Starting server on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
