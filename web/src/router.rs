use crate::controller::{
    appointment_controller, health_check_controller, info_controller, sse_controller,
};
use crate::AppState;
use axum::{
    routing::{delete, get, post, put},
    Router,
};

use utoipa::OpenApi;
use utoipa_rapidoc::RapiDoc;

// This is the global definition of our OpenAPI spec. To be a part
// of the rendered spec, a path must be listed here.
#[derive(OpenApi)]
#[openapi(
        info(
            title = "MCP Calendar Server API"
        ),
        paths(
            appointment_controller::check_availability,
            appointment_controller::check_availability_range,
            appointment_controller::create,
            appointment_controller::read,
            appointment_controller::update,
            appointment_controller::delete,
            health_check_controller::health_check,
            health_check_controller::ping,
            info_controller::app_info,
        ),
        tags(
            (name = "mcp_calendar_server", description = "MCP Calendar Appointment API")
        )
    )]
struct ApiDoc;

pub fn define_routes(app_state: AppState) -> Router {
    Router::new()
        .merge(sse_routes(app_state.clone()))
        .merge(tool_routes(app_state.clone()))
        .merge(info_routes(app_state))
        .merge(health_routes())
        .merge(RapiDoc::with_openapi("/api-docs/openapi2.json", ApiDoc::openapi()).path("/rapidoc"))
}

fn sse_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/sse", get(sse_controller::connect))
        .with_state(app_state)
}

fn tool_routes(app_state: AppState) -> Router {
    Router::new()
        .route(
            "/tools/check_availability",
            post(appointment_controller::check_availability),
        )
        .route(
            "/tools/check_availability_range",
            post(appointment_controller::check_availability_range),
        )
        .route(
            "/tools/create_appointment",
            post(appointment_controller::create),
        )
        .route("/tools/appointments/:id", get(appointment_controller::read))
        .route(
            "/tools/appointments/:id",
            put(appointment_controller::update),
        )
        .route(
            "/tools/appointments/:id",
            delete(appointment_controller::delete),
        )
        .with_state(app_state)
}

fn info_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/info", get(info_controller::app_info))
        .with_state(app_state)
}

pub fn health_routes() -> Router {
    Router::new()
        .route("/health", get(health_check_controller::health_check))
        .route("/ping", get(health_check_controller::ping))
}
