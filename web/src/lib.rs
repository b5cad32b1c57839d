//! HTTP surface of the MCP calendar server: router, controllers, extractors
//! and server bootstrap. Credential resolution lives in `domain`; session
//! management lives in `sse`; this crate wires both to axum.

use axum::http::header::{HeaderName, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use axum::http::Method;
use domain::gateway::appointment::AppointmentApiClient;
use domain::CredentialResolver;
use log::*;
use service::config::Config;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

mod controller;
mod error;
mod extractors;
pub mod router;

/// Application state shared by every handler. Needs to implement Clone to be
/// able to be passed into Router as State.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub resolver: Arc<CredentialResolver>,
    pub sse_manager: Arc<sse::Manager>,
    pub appointment_api: Arc<AppointmentApiClient>,
}

impl AppState {
    pub fn new(
        config: Config,
        resolver: Arc<CredentialResolver>,
        sse_manager: Arc<sse::Manager>,
    ) -> Result<Self, domain::error::Error> {
        let appointment_api = Arc::new(AppointmentApiClient::new(&config)?);
        Ok(Self {
            config,
            resolver,
            sse_manager,
            appointment_api,
        })
    }
}

pub async fn init_server(app_state: AppState) -> Result<(), std::io::Error> {
    let host = app_state
        .config
        .interface
        .clone()
        .unwrap_or_else(|| "0.0.0.0".to_string());
    let port = app_state.config.port;
    let listen_address = format!("{host}:{port}");

    let origins: Vec<HeaderValue> = app_state
        .config
        .allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            ACCEPT,
            AUTHORIZATION,
            CONTENT_TYPE,
            HeaderName::from_static("token"),
        ])
        .allow_origin(origins)
        .allow_credentials(true);

    log_startup_info(&listen_address);

    let router = router::define_routes(app_state)
        .layer(cors)
        // Peer addresses feed the client-IP extraction chain as its lowest
        // priority source.
        .into_make_service_with_connect_info::<SocketAddr>();

    let listener = tokio::net::TcpListener::bind(&listen_address).await?;
    axum::serve(listener, router).await
}

fn log_startup_info(listen_address: &str) {
    info!("MCP Calendar Server started");
    info!("Listening on http://{listen_address}");
    info!("SSE endpoint available at /sse");
    info!("SSE authentication options:");
    info!("  - header: token: <your-token>");
    info!("  - header: Authorization: <your-token>");
    info!("  - URL parameter: /sse?token=<your-token>");
    info!("Available tools:");
    for name in domain::tools::catalog().keys() {
        info!("  - {name}");
    }
}
