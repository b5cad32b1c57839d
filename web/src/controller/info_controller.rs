use crate::AppState;
use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

/// GET server and session-subsystem status
#[utoipa::path(
    get,
    path = "/info",
    responses(
        (status = 200, description = "Server name, version, SSE configuration and endpoint map")
    )
)]
pub async fn app_info(State(app_state): State<AppState>) -> Json<Value> {
    Json(json!({
        "name": "mcp_calendar_server",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "MCP calendar server relaying appointment tools over SSE",
        "sse": {
            "activeConnections": app_state.sse_manager.connected_clients(),
            "timeoutMillis": app_state.config.sse_timeout_millis,
            "heartbeatEnabled": app_state.config.heartbeat_enabled,
            "heartbeatIntervalMillis": app_state.config.heartbeat_interval_millis,
        },
        "endpoints": {
            "sse": "/sse",
            "tools": "/tools",
            "health": "/health",
            "ping": "/ping",
        },
    }))
}
