use domain::CredentialResolver;
use log::*;
use service::{config::Config, logging::Logger};
use std::sync::Arc;
use web::AppState;

#[tokio::main]
async fn main() {
    let config = Config::new();
    Logger::init_logger(&config as &Config);

    info!("Starting up...");

    let resolver = Arc::new(CredentialResolver::new());
    let sse_manager = Arc::new(sse::Manager::new());

    let app_state = match AppState::new(config.clone(), resolver.clone(), sse_manager.clone()) {
        Ok(app_state) => app_state,
        Err(e) => {
            error!("Failed to build application state: {e}");
            std::process::exit(1);
        }
    };

    // Background sweeps run for the lifetime of the process.
    sse::sweeper::spawn_heartbeat_sweeper(
        sse_manager.clone(),
        config.heartbeat_interval(),
        config.heartbeats_active(),
    );
    sse::sweeper::spawn_idle_sweeper(
        sse_manager,
        config.health_check_interval(),
        config.sse_timeout(),
    );
    domain::spawn_affinity_sweeper(
        resolver,
        config.affinity_cleanup_interval(),
        config.affinity_max_age(),
    );

    if let Err(e) = web::init_server(app_state).await {
        error!("Server error: {e}");
        std::process::exit(1);
    }
}
