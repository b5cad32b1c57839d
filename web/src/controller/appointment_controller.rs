//! Tool-invocation endpoints that relay appointment operations to the
//! downstream API. Each handler re-derives the caller's credential through
//! the full resolution chain, so tool calls arriving on separate HTTP
//! requests with no attached session still map back to the right client.

use crate::error::Result;
use crate::extractors::resolved_credential::ResolvedCredential;
use crate::AppState;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use domain::gateway::appointment::{
    Appointment, AppointmentRequest, AvailabilityRangeRequest, AvailabilityRangeResponse,
    AvailabilityRequest, AvailabilityResponse,
};
use log::*;

/// POST check availability for a specific date and time
#[utoipa::path(
    post,
    path = "/tools/check_availability",
    responses(
        (status = 200, description = "Availability result from the downstream API"),
        (status = 401, description = "No credential could be resolved for the request"),
        (status = 502, description = "Downstream appointment API failure")
    )
)]
pub async fn check_availability(
    ResolvedCredential(token): ResolvedCredential,
    State(app_state): State<AppState>,
    Json(request): Json<AvailabilityRequest>,
) -> Result<Json<AvailabilityResponse>> {
    debug!("check_availability tool invoked");
    let response = app_state
        .appointment_api
        .check_availability(&token, &request)
        .await?;
    Ok(Json(response))
}

/// POST list available slots within a time range
#[utoipa::path(
    post,
    path = "/tools/check_availability_range",
    responses(
        (status = 200, description = "Open slots within the requested range"),
        (status = 401, description = "No credential could be resolved for the request"),
        (status = 502, description = "Downstream appointment API failure")
    )
)]
pub async fn check_availability_range(
    ResolvedCredential(token): ResolvedCredential,
    State(app_state): State<AppState>,
    Json(request): Json<AvailabilityRangeRequest>,
) -> Result<Json<AvailabilityRangeResponse>> {
    debug!("check_availability_range tool invoked");
    let response = app_state
        .appointment_api
        .check_availability_range(&token, &request)
        .await?;
    Ok(Json(response))
}

/// POST create a new appointment
#[utoipa::path(
    post,
    path = "/tools/create_appointment",
    responses(
        (status = 200, description = "The created appointment"),
        (status = 401, description = "No credential could be resolved for the request"),
        (status = 502, description = "Downstream appointment API failure")
    )
)]
pub async fn create(
    ResolvedCredential(token): ResolvedCredential,
    State(app_state): State<AppState>,
    Json(request): Json<AppointmentRequest>,
) -> Result<Json<Appointment>> {
    debug!("create_appointment tool invoked");
    let appointment = app_state
        .appointment_api
        .create_appointment(&token, &request)
        .await?;
    Ok(Json(appointment))
}

/// GET the details of one appointment
#[utoipa::path(
    get,
    path = "/tools/appointments/{id}",
    params(("id" = String, Path, description = "Appointment id")),
    responses(
        (status = 200, description = "The appointment details"),
        (status = 401, description = "No credential could be resolved for the request"),
        (status = 502, description = "Downstream appointment API failure")
    )
)]
pub async fn read(
    ResolvedCredential(token): ResolvedCredential,
    State(app_state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Appointment>> {
    debug!("get_appointment_details tool invoked for {id}");
    let appointment = app_state.appointment_api.get_appointment(&token, &id).await?;
    Ok(Json(appointment))
}

/// PUT reschedule an existing appointment
#[utoipa::path(
    put,
    path = "/tools/appointments/{id}",
    params(("id" = String, Path, description = "Appointment id")),
    responses(
        (status = 200, description = "The rescheduled appointment"),
        (status = 401, description = "No credential could be resolved for the request"),
        (status = 502, description = "Downstream appointment API failure")
    )
)]
pub async fn update(
    ResolvedCredential(token): ResolvedCredential,
    State(app_state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<AppointmentRequest>,
) -> Result<Json<Appointment>> {
    debug!("reschedule_appointment tool invoked for {id}");
    let appointment = app_state
        .appointment_api
        .reschedule_appointment(&token, &id, &request)
        .await?;
    Ok(Json(appointment))
}

/// DELETE cancel an existing appointment
#[utoipa::path(
    delete,
    path = "/tools/appointments/{id}",
    params(("id" = String, Path, description = "Appointment id")),
    responses(
        (status = 204, description = "Appointment cancelled"),
        (status = 401, description = "No credential could be resolved for the request"),
        (status = 502, description = "Downstream appointment API failure")
    )
)]
pub async fn delete(
    ResolvedCredential(token): ResolvedCredential,
    State(app_state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    debug!("cancel_appointment tool invoked for {id}");
    app_state
        .appointment_api
        .cancel_appointment(&token, &id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
