pub(crate) mod client_ip;
pub(crate) mod resolved_credential;

use axum::http::StatusCode;

type RejectionType = (StatusCode, String);
