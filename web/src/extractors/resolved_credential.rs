use crate::extractors::client_ip::client_ip;
use crate::extractors::RejectionType;
use crate::AppState;
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
};
use domain::CredentialSources;
use log::*;

const MISSING_CREDENTIAL_MESSAGE: &str =
    "No token provided. Use the token header, the Authorization header or the token URL parameter";

/// Credential resolved through the full fallback chain (headers, query
/// parameter, IP affinity, last-active). Tool-invocation handlers take this
/// extractor so sessionless calls re-derive the caller's identity.
pub(crate) struct ResolvedCredential(pub String);

#[async_trait]
impl FromRequestParts<AppState> for ResolvedCredential {
    type Rejection = RejectionType;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let sources = credential_sources(parts);
        match state.resolver.resolve(&sources) {
            Some(credential) => Ok(ResolvedCredential(credential)),
            None => {
                warn!(
                    "Unable to resolve a credential for request to {} from IP {:?}",
                    parts.uri.path(),
                    sources.client_ip
                );
                Err((
                    StatusCode::UNAUTHORIZED,
                    MISSING_CREDENTIAL_MESSAGE.to_string(),
                ))
            }
        }
    }
}

/// Credential resolved from explicit request-attached sources only. The
/// channel-open endpoint uses this so a stale affinity entry or the global
/// fallback can never open a push channel on someone else's behalf.
pub(crate) struct ExplicitCredential(pub String);

#[async_trait]
impl FromRequestParts<AppState> for ExplicitCredential {
    type Rejection = RejectionType;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let sources = credential_sources(parts);
        match state.resolver.resolve_explicit(&sources) {
            Some(credential) => Ok(ExplicitCredential(credential)),
            None => {
                error!(
                    "Connection attempt without token from IP {:?}",
                    sources.client_ip
                );
                Err((
                    StatusCode::UNAUTHORIZED,
                    MISSING_CREDENTIAL_MESSAGE.to_string(),
                ))
            }
        }
    }
}

/// Gather every credential signal the request carries; the resolver applies
/// the priority rules.
fn credential_sources(parts: &Parts) -> CredentialSources {
    CredentialSources {
        token_header: header_string(parts, "token"),
        authorization_header: header_string(parts, "authorization"),
        token_param: query_param(parts.uri.query().unwrap_or_default(), "token"),
        client_ip: client_ip(parts),
    }
}

fn header_string(parts: &Parts, name: &str) -> Option<String> {
    parts
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(String::from)
}

fn query_param(query: &str, name: &str) -> Option<String> {
    query.split('&').find_map(|pair| {
        let (key, value) = pair.split_once('=')?;
        if key != name {
            return None;
        }
        Some(
            urlencoding::decode(value)
                .map(|decoded| decoded.into_owned())
                .unwrap_or_else(|_| value.to_string()),
        )
    })
}
