pub mod api;
pub mod config;
pub mod db;
pub mod entities;
pub mod scheduler;
pub mod services;

use tokio::signal;

pub use config::Config;
use scheduler::TokenSweeper;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let (config, config_path) = Config::load_with_source()?;
    config.validate()?;

    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));

    let fmt_layer = tracing_subscriber::fmt::layer();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    info!("Dapur v{} starting...", env!("CARGO_PKG_VERSION"));
    match &config_path {
        Some(path) => info!("Loaded config from: {}", path.display()),
        None => info!("No config file found, using defaults"),
    }

    let state = api::create_app_state_from_config(config.clone()).await?;

    let sweeper = TokenSweeper::new(state.store.clone(), config.scheduler.clone());
    let sweeper_handle = tokio::spawn(async move {
        if let Err(e) = sweeper.start().await {
            error!("Token sweeper error: {}", e);
        }
    });

    let port = config.server.port;
    let app = api::router(state);
    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    let server_handle = tokio::spawn(async move {
        info!("API server running at http://0.0.0.0:{}", port);
        if let Err(e) = axum::serve(listener, app).await {
            error!("Server error: {}", e);
        }
    });

    match signal::ctrl_c().await {
        Ok(()) => {
            info!("Shutdown signal received");
        }
        Err(e) => {
            error!("Error listening for shutdown: {}", e);
        }
    }

    sweeper_handle.abort();
    server_handle.abort();
    info!("Stopped");

    Ok(())
}
