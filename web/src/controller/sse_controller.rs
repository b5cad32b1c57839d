use crate::extractors::resolved_credential::ExplicitCredential;
use crate::AppState;
use async_stream::stream;
use axum::extract::State;
use axum::response::sse::{Event, Sse};
use futures::Stream;
use log::*;
use sse::message::Event as SseEvent;
use std::convert::Infallible;
use tokio::sync::mpsc;

/// SSE handler that establishes the long-lived push channel for one client.
///
/// Channel-open requires an explicit credential (reserved `token` header,
/// `Authorization` header or `token` query parameter, in that priority); a
/// request without one is rejected with 401 before any session is created.
/// A reconnect under the same credential replaces and closes the previous
/// channel. The handshake emits a `connect` event followed by the `tools`
/// catalog, then the stream relays whatever the registry pushes (heartbeats
/// included) until the channel ends.
pub(crate) async fn connect(
    ExplicitCredential(token): ExplicitCredential,
    State(app_state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    debug!("Establishing SSE connection");

    let (tx, mut rx) = mpsc::unbounded_channel();

    let connection_id = app_state.sse_manager.register_connection(token.clone(), tx);

    // Handshake: confirm the connection, then advertise the tool catalog.
    app_state
        .sse_manager
        .send_to_client(&token, SseEvent::connect(&token, connection_id.as_str()));
    app_state
        .sse_manager
        .send_to_client(&token, SseEvent::tools(domain::tools::catalog_value()));

    let manager = app_state.sse_manager.clone();

    // Events arrive from the registry through the channel; the stream ends
    // when the sender side is dropped (removal, replacement or eviction).
    let stream = stream! {
        while let Some(event) = rx.recv().await {
            yield event;
        }

        debug!(
            "SSE connection {} closed, cleaning up",
            connection_id.as_str()
        );
        // Guarded removal: a reconnect may already own this credential.
        manager.unregister_connection(&token, &connection_id);
    };

    Sse::new(stream)
}
