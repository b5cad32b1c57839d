//! HTTP client for the downstream appointment API.
//!
//! Every call is authenticated by forwarding the resolved credential as a
//! `token` query parameter; the downstream API is the sole authority on
//! credential validity and rejects bad tokens on the next call. Response
//! shapes are explicit typed structs rather than loose JSON maps.

use crate::error::{DomainErrorKind, Error, ExternalErrorKind};
use chrono::NaiveDateTime;
use log::*;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use service::config::Config;
use tokio::time::Duration;
use utoipa::ToSchema;

/// Request payload for a point-in-time availability check.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityRequest {
    /// Date in `yyyy-MM-dd` format.
    pub appointment_date: String,
    /// Time in `HH:mm` format.
    pub appointment_time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<u32>,
}

/// Downstream answer to an availability check.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_time: Option<NaiveDateTime>,
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Request payload for an availability scan across a time range.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityRangeRequest {
    pub appointment_date: String,
    /// Range start in `HH:mm` format.
    pub start_time: String,
    /// Range end in `HH:mm` format.
    pub end_time: String,
    pub duration_minutes: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval_minutes: Option<u32>,
}

/// Open slots found within the requested range.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityRangeResponse {
    #[serde(default)]
    pub available_slots: Vec<TimeSlot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSlot {
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
}

/// Request payload for creating or rescheduling an appointment.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub appointment_date: String,
    pub appointment_time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

/// One appointment as represented by the downstream API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub appointment_date: Option<NaiveDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<NaiveDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<NaiveDateTime>,
}

/// Appointment API client. One instance is shared process-wide; reqwest
/// pools connections internally.
pub struct AppointmentApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl AppointmentApiClient {
    pub fn new(config: &Config) -> Result<Self, Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        let base_url = config
            .appointment_api_base_url()
            .trim_end_matches('/')
            .to_string();

        Ok(Self { client, base_url })
    }

    /// Check whether a specific date and time is free.
    pub async fn check_availability(
        &self,
        token: &str,
        request: &AvailabilityRequest,
    ) -> Result<AvailabilityResponse, Error> {
        info!(
            "Checking availability for {} {}",
            request.appointment_date, request.appointment_time
        );

        let url = format!("{}/appointments/availability", self.base_url);
        let response = self
            .client
            .post(&url)
            .query(&[("token", token)])
            .json(request)
            .send()
            .await?;

        read_json(response).await
    }

    /// List open slots within a time range on one date.
    pub async fn check_availability_range(
        &self,
        token: &str,
        request: &AvailabilityRangeRequest,
    ) -> Result<AvailabilityRangeResponse, Error> {
        info!(
            "Checking availability range for {} between {} and {}",
            request.appointment_date, request.start_time, request.end_time
        );

        let url = format!("{}/appointments/availability/range", self.base_url);
        let response = self
            .client
            .post(&url)
            .query(&[("token", token)])
            .json(request)
            .send()
            .await?;

        read_json(response).await
    }

    /// Create a new appointment.
    pub async fn create_appointment(
        &self,
        token: &str,
        request: &AppointmentRequest,
    ) -> Result<Appointment, Error> {
        info!("Creating appointment for {}", request.appointment_date);

        let url = format!("{}/appointments", self.base_url);
        let response = self
            .client
            .post(&url)
            .query(&[("token", token)])
            .json(request)
            .send()
            .await?;

        read_json(response).await
    }

    /// Fetch the details of one appointment.
    pub async fn get_appointment(&self, token: &str, id: &str) -> Result<Appointment, Error> {
        info!("Fetching appointment {id}");

        let url = format!("{}/appointments/{}", self.base_url, urlencoding::encode(id));
        let response = self
            .client
            .get(&url)
            .query(&[("token", token)])
            .send()
            .await?;

        read_json(response).await
    }

    /// Reschedule an existing appointment.
    pub async fn reschedule_appointment(
        &self,
        token: &str,
        id: &str,
        request: &AppointmentRequest,
    ) -> Result<Appointment, Error> {
        info!(
            "Rescheduling appointment {id} to {} {}",
            request.appointment_date, request.appointment_time
        );

        let url = format!("{}/appointments/{}", self.base_url, urlencoding::encode(id));
        let response = self
            .client
            .put(&url)
            .query(&[("token", token)])
            .json(request)
            .send()
            .await?;

        read_json(response).await
    }

    /// Cancel an existing appointment.
    pub async fn cancel_appointment(&self, token: &str, id: &str) -> Result<(), Error> {
        info!("Cancelling appointment {id}");

        let url = format!("{}/appointments/{}", self.base_url, urlencoding::encode(id));
        let response = self
            .client
            .delete(&url)
            .query(&[("token", token)])
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            warn!("Failed to cancel appointment {id}: {status} - {body}");
            Err(Error::api(status.as_u16(), body))
        }
    }
}

/// Translate a downstream response into a typed value, preserving error
/// bodies for diagnostics.
async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, Error> {
    let status = response.status();
    let body = response.text().await.map_err(|e| {
        warn!("Failed to read downstream response body: {e:?}");
        Error {
            source: Some(Box::new(e)),
            error_kind: DomainErrorKind::External(ExternalErrorKind::Network),
        }
    })?;

    if !status.is_success() {
        warn!("Downstream API error: {status} - {body}");
        return Err(Error::api(status.as_u16(), body));
    }

    debug!("Downstream response body: {body}");
    Ok(serde_json::from_str(&body)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn client_for(server: &mockito::ServerGuard) -> AppointmentApiClient {
        let config = Config::default().set_appointment_api_base_url(server.url());
        AppointmentApiClient::new(&config).unwrap()
    }

    #[tokio::test]
    async fn test_check_availability_forwards_token_as_query_param() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/appointments/availability")
            .match_query(Matcher::UrlEncoded("token".into(), "tok1".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"dateTime":"2025-04-05T14:30:00","available":true,"message":"free"}"#)
            .create_async()
            .await;

        let client = client_for(&server);
        let request = AvailabilityRequest {
            appointment_date: "2025-04-05".to_string(),
            appointment_time: "14:30".to_string(),
            duration_minutes: Some(60),
        };

        let response = client.check_availability("tok1", &request).await.unwrap();
        assert!(response.available);
        assert_eq!(response.message.as_deref(), Some("free"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_create_appointment_deserializes_appointment() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/appointments")
            .match_query(Matcher::UrlEncoded("token".into(), "tok1".into()))
            .with_status(201)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"id":"apt-1","appointmentDate":"2025-04-05T14:30:00","name":"Consult","status":"confirmed"}"#,
            )
            .create_async()
            .await;

        let client = client_for(&server);
        let request = AppointmentRequest {
            id: None,
            appointment_date: "2025-04-05".to_string(),
            appointment_time: "14:30".to_string(),
            duration_minutes: Some(60),
            name: Some("Consult".to_string()),
            summary: None,
        };

        let appointment = client.create_appointment("tok1", &request).await.unwrap();
        assert_eq!(appointment.id.as_deref(), Some("apt-1"));
        assert_eq!(appointment.status.as_deref(), Some("confirmed"));
    }

    #[tokio::test]
    async fn test_downstream_error_maps_to_api_error_kind() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/appointments/apt-404")
            .match_query(Matcher::Any)
            .with_status(404)
            .with_body("appointment not found")
            .create_async()
            .await;

        let client = client_for(&server);
        let err = client.get_appointment("tok1", "apt-404").await.unwrap_err();
        assert_eq!(
            err.error_kind,
            DomainErrorKind::External(ExternalErrorKind::Api(
                404,
                "appointment not found".to_string()
            ))
        );
    }

    #[tokio::test]
    async fn test_cancel_appointment_succeeds_on_2xx() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("DELETE", "/appointments/apt-1")
            .match_query(Matcher::UrlEncoded("token".into(), "tok1".into()))
            .with_status(204)
            .create_async()
            .await;

        let client = client_for(&server);
        assert!(client.cancel_appointment("tok1", "apt-1").await.is_ok());
    }

    #[tokio::test]
    async fn test_range_response_defaults_missing_slot_list() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/appointments/availability/range")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"message":"no slots"}"#)
            .create_async()
            .await;

        let client = client_for(&server);
        let request = AvailabilityRangeRequest {
            appointment_date: "2025-04-05".to_string(),
            start_time: "09:00".to_string(),
            end_time: "12:00".to_string(),
            duration_minutes: 60,
            interval_minutes: None,
        };

        let response = client
            .check_availability_range("tok1", &request)
            .await
            .unwrap();
        assert!(response.available_slots.is_empty());
        assert_eq!(response.message.as_deref(), Some("no slots"));
    }
}
