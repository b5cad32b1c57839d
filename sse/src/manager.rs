use crate::connection::{ConnectionId, ConnectionRegistry, Credential, EventSender};
use crate::message::{Event as SseEvent, EventType};
use axum::response::sse::Event;
use log::*;
use std::sync::Arc;
use tokio::time::Duration;

/// High-level session lifecycle and event routing over the
/// [`ConnectionRegistry`]. One instance is shared process-wide.
pub struct Manager {
    registry: Arc<ConnectionRegistry>,
}

impl Manager {
    pub fn new() -> Self {
        Self {
            registry: Arc::new(ConnectionRegistry::new()),
        }
    }

    /// Register a new connection for `credential` and return its unique ID.
    /// Any previous connection for the same credential is replaced and closed.
    pub fn register_connection(&self, credential: Credential, sender: EventSender) -> ConnectionId {
        let connection_id = self.registry.open(credential, sender);
        info!(
            "Registered new SSE connection {} ({} active)",
            connection_id.as_str(),
            self.registry.len()
        );
        connection_id
    }

    /// Unregister the connection identified by `connection_id`, tolerating the
    /// case where the credential has already been re-registered or removed.
    pub fn unregister_connection(&self, credential: &str, connection_id: &ConnectionId) {
        if self.registry.remove_if_current(credential, connection_id) {
            info!("Unregistered SSE connection {}", connection_id.as_str());
        }
    }

    /// Send an application event to one client. A failed send means the
    /// channel is gone, so the session is removed immediately.
    pub fn send_to_client(&self, credential: &str, message: SseEvent) -> bool {
        let Some(event) = to_wire_event(&message) else {
            return false;
        };

        if self.registry.send_to(credential, event) {
            self.registry.touch(credential);
            true
        } else {
            // Unlike heartbeats, application sends are expected to succeed;
            // a closed channel here means the client is gone for good.
            self.registry.remove(credential);
            false
        }
    }

    pub fn connected_clients(&self) -> usize {
        self.registry.len()
    }

    pub fn has_client(&self, credential: &str) -> bool {
        self.registry.contains(credential)
    }

    pub fn touch(&self, credential: &str) {
        self.registry.touch(credential);
    }

    /// Push a heartbeat event to every registered session.
    ///
    /// Sessions that accept the heartbeat have their activity refreshed. A
    /// failed send is logged and the session left in place: one failure is not
    /// proof the channel is dead, and reclamation belongs to the idle sweep.
    pub fn send_heartbeats(&self) {
        if self.registry.is_empty() {
            return;
        }

        debug!(
            "Sending heartbeat to {} connected clients",
            self.registry.len()
        );

        let mut delivered = Vec::new();
        self.registry.for_each(|credential, info| {
            let heartbeat = SseEvent::heartbeat();
            let Some(event) = to_wire_event(&heartbeat) else {
                return;
            };
            if info.sender.send(Ok(event)).is_ok() {
                delivered.push(credential.to_string());
            } else {
                warn!(
                    "Failed to send heartbeat to connection {}; leaving it for the idle sweep",
                    info.connection_id.as_str()
                );
            }
        });

        for credential in delivered {
            self.registry.touch(&credential);
        }
    }

    /// Close and remove every session idle for longer than `timeout`.
    /// Returns the number of sessions evicted.
    pub fn close_idle_connections(&self, timeout: Duration) -> usize {
        let stale = self.registry.idle_credentials(timeout);
        let mut evicted = 0;

        for credential in stale {
            // Between the snapshot and this call the session may have been
            // removed, replaced by a reconnect, or touched by a delivered
            // heartbeat; the guarded removal re-checks staleness.
            if self.registry.remove_if_idle(&credential, timeout) {
                info!("Closing inactive SSE connection");
                evicted += 1;
            }
        }

        evicted
    }
}

impl Default for Manager {
    fn default() -> Self {
        Self::new()
    }
}

/// Serialize a typed event into the axum wire representation, with a fresh
/// event id and the event name in the SSE `event:` field.
fn to_wire_event(message: &SseEvent) -> Option<Event> {
    match serde_json::to_string(message) {
        Ok(json) => Some(
            Event::default()
                .id(uuid::Uuid::new_v4().to_string())
                .event(message.event_type())
                .data(json),
        ),
        Err(e) => {
            error!("Failed to serialize SSE event: {e}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;
    use tokio::sync::mpsc;

    fn channel() -> (
        EventSender,
        mpsc::UnboundedReceiver<Result<Event, Infallible>>,
    ) {
        mpsc::unbounded_channel()
    }

    #[tokio::test]
    async fn test_send_heartbeats_delivers_to_every_client() {
        let manager = Manager::new();
        let (tx1, mut rx1) = channel();
        let (tx2, mut rx2) = channel();
        manager.register_connection("tok1".to_string(), tx1);
        manager.register_connection("tok2".to_string(), tx2);

        manager.send_heartbeats();

        assert!(rx1.recv().await.is_some());
        assert!(rx2.recv().await.is_some());
    }

    #[tokio::test]
    async fn test_heartbeat_failure_retains_session() {
        let manager = Manager::new();
        let (tx, rx) = channel();
        manager.register_connection("tok1".to_string(), tx);
        drop(rx);

        manager.send_heartbeats();

        // Eviction of a failing channel is deferred to the idle sweep.
        assert!(manager.has_client("tok1"));
    }

    #[tokio::test]
    async fn test_heartbeat_failure_does_not_block_other_sessions() {
        let manager = Manager::new();
        let (dead_tx, dead_rx) = channel();
        let (live_tx, mut live_rx) = channel();
        manager.register_connection("dead".to_string(), dead_tx);
        manager.register_connection("live".to_string(), live_tx);
        drop(dead_rx);

        manager.send_heartbeats();

        assert!(live_rx.recv().await.is_some());
    }

    #[tokio::test]
    async fn test_send_to_client_removes_session_on_closed_channel() {
        let manager = Manager::new();
        let (tx, rx) = channel();
        manager.register_connection("tok1".to_string(), tx);
        drop(rx);

        assert!(!manager.send_to_client("tok1", SseEvent::heartbeat()));
        assert!(!manager.has_client("tok1"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_idle_connections_evicts_only_stale_sessions() {
        let manager = Manager::new();
        let (tx1, _rx1) = channel();
        let (tx2, _rx2) = channel();
        manager.register_connection("stale".to_string(), tx1);

        tokio::time::advance(Duration::from_secs(400)).await;
        manager.register_connection("fresh".to_string(), tx2);

        let evicted = manager.close_idle_connections(Duration::from_secs(300));

        assert_eq!(evicted, 1);
        assert!(!manager.has_client("stale"));
        assert!(manager.has_client("fresh"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_sweep_spares_session_replaced_by_reconnect() {
        let manager = Manager::new();
        let (tx1, _rx1) = channel();
        let (tx2, _rx2) = channel();
        manager.register_connection("tok1".to_string(), tx1);

        // The session goes stale, then the client reconnects just before the
        // sweep fires. The replacement carries fresh activity and must
        // survive the sweep.
        tokio::time::advance(Duration::from_secs(400)).await;
        manager.register_connection("tok1".to_string(), tx2);

        assert_eq!(manager.close_idle_connections(Duration::from_secs(300)), 0);
        assert!(manager.has_client("tok1"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_heartbeat_touch_keeps_session_out_of_idle_window() {
        let manager = Manager::new();
        let (tx, mut _rx) = channel();
        manager.register_connection("tok1".to_string(), tx);

        tokio::time::advance(Duration::from_secs(200)).await;
        manager.send_heartbeats();
        tokio::time::advance(Duration::from_secs(200)).await;

        // Activity was refreshed 200s ago, inside the 300s window.
        assert_eq!(manager.close_idle_connections(Duration::from_secs(300)), 0);
        assert!(manager.has_client("tok1"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_sweep_boundary_with_many_sessions() {
        let manager = Manager::new();
        let mut receivers = Vec::new();
        for i in 0..100 {
            let (tx, rx) = channel();
            manager.register_connection(format!("tok{i}"), tx);
            receivers.push(rx);
        }
        assert_eq!(manager.connected_clients(), 100);

        // Threshold before any session's activity: everything stays.
        assert_eq!(
            manager.close_idle_connections(Duration::from_secs(3600)),
            0
        );
        assert_eq!(manager.connected_clients(), 100);

        // Threshold after all of them: registry drains completely.
        tokio::time::advance(Duration::from_secs(3601)).await;
        assert_eq!(
            manager.close_idle_connections(Duration::from_secs(3600)),
            100
        );
        assert_eq!(manager.connected_clients(), 0);
    }
}
