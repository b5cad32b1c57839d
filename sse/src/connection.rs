use axum::response::sse::Event;
use dashmap::DashMap;
use log::*;
use std::convert::Infallible;
use tokio::sync::mpsc::UnboundedSender;
use tokio::time::{Duration, Instant};

// Type alias for the opaque credential string that keys a session. The web
// layer hands it over already trimmed; the registry never inspects it.
pub type Credential = String;

/// Sending half of a session's push channel.
pub type EventSender = UnboundedSender<Result<Event, Infallible>>;

/// Unique identifier for a connection (server-generated)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConnectionId(String);

impl ConnectionId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

/// Bookkeeping state for one open push channel.
#[derive(Debug)]
pub struct ConnectionInfo {
    pub connection_id: ConnectionId,
    pub sender: EventSender,
    pub created_at: Instant,
    pub last_activity: Instant,
}

/// Connection registry keyed by credential.
///
/// At most one open session exists per credential: opening a session for a
/// credential that already has one replaces the entry and drops the old
/// sender, which closes the old channel. The orphaned stream's cleanup
/// callback must use [`ConnectionRegistry::remove_if_current`] so it cannot
/// evict the replacement session.
pub struct ConnectionRegistry {
    connections: DashMap<Credential, ConnectionInfo>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            connections: DashMap::new(),
        }
    }

    /// Register a new connection under `credential`, replacing (and thereby
    /// closing) any existing one - O(1)
    pub fn open(&self, credential: Credential, sender: EventSender) -> ConnectionId {
        let connection_id = ConnectionId::new();
        let now = Instant::now();

        let replaced = self.connections.insert(
            credential.clone(),
            ConnectionInfo {
                connection_id: connection_id.clone(),
                sender,
                created_at: now,
                last_activity: now,
            },
        );

        if let Some(old) = replaced {
            // Dropping `old` closes the previous channel; its stream ends and
            // runs a guarded removal that no-ops against this new entry.
            info!(
                "Replacing existing SSE connection {} for reconnecting client",
                old.connection_id.as_str()
            );
        }

        connection_id
    }

    /// Refresh the last-activity timestamp for a session; no-op when absent.
    pub fn touch(&self, credential: &str) {
        if let Some(mut info) = self.connections.get_mut(credential) {
            info.last_activity = Instant::now();
        }
    }

    /// Idempotently delete the session entry for `credential`. Returns whether
    /// an entry was present. Dropping the entry closes its channel.
    pub fn remove(&self, credential: &str) -> bool {
        self.connections.remove(credential).is_some()
    }

    /// Delete the session entry only if it still belongs to `connection_id`.
    ///
    /// Transport-level completion callbacks race with reconnects: by the time
    /// an orphaned stream winds down, the credential may already map to a
    /// fresh connection that must stay registered.
    pub fn remove_if_current(&self, credential: &str, connection_id: &ConnectionId) -> bool {
        self.connections
            .remove_if(credential, |_, info| {
                info.connection_id == *connection_id
            })
            .is_some()
    }

    /// Delete the session entry only if it is still idle past `timeout`.
    ///
    /// The idle sweep works from a snapshot; a reconnect or a delivered
    /// heartbeat may have refreshed the entry between the snapshot and the
    /// removal, and such a session must stay registered.
    pub fn remove_if_idle(&self, credential: &str, timeout: Duration) -> bool {
        let now = Instant::now();
        self.connections
            .remove_if(credential, |_, info| {
                now.duration_since(info.last_activity) > timeout
            })
            .is_some()
    }

    pub fn contains(&self, credential: &str) -> bool {
        self.connections.contains_key(credential)
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Apply `f` to every registered `(credential, connection)` pair.
    ///
    /// Iteration is safe under concurrent registration/removal; `f` must not
    /// call back into mutating registry methods for the same keys.
    pub fn for_each<F>(&self, mut f: F)
    where
        F: FnMut(&str, &ConnectionInfo),
    {
        for entry in self.connections.iter() {
            f(entry.key(), entry.value());
        }
    }

    /// Send an event to the session registered under `credential` - O(1).
    /// Returns false when no session exists or the channel is already closed.
    pub fn send_to(&self, credential: &str, event: Event) -> bool {
        if let Some(info) = self.connections.get(credential) {
            if let Err(e) = info.sender.send(Ok(event)) {
                warn!(
                    "Failed to send event to connection {}: {}",
                    info.connection_id.as_str(),
                    e
                );
                return false;
            }
            return true;
        }
        false
    }

    /// Credentials whose last activity predates `now - timeout`.
    pub fn idle_credentials(&self, timeout: Duration) -> Vec<Credential> {
        let now = Instant::now();
        self.connections
            .iter()
            .filter(|entry| now.duration_since(entry.value().last_activity) > timeout)
            .map(|entry| entry.key().clone())
            .collect()
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn channel() -> (
        EventSender,
        mpsc::UnboundedReceiver<Result<Event, Infallible>>,
    ) {
        mpsc::unbounded_channel()
    }

    #[tokio::test]
    async fn test_open_registers_single_entry_per_credential() {
        let registry = ConnectionRegistry::new();
        let (tx1, _rx1) = channel();
        let (tx2, _rx2) = channel();

        registry.open("tok1".to_string(), tx1);
        registry.open("tok1".to_string(), tx2);

        assert_eq!(registry.len(), 1);
        assert!(registry.contains("tok1"));
    }

    #[tokio::test]
    async fn test_open_replacement_closes_previous_channel() {
        let registry = ConnectionRegistry::new();
        let (tx1, mut rx1) = channel();
        let (tx2, _rx2) = channel();

        registry.open("tok1".to_string(), tx1);
        registry.open("tok1".to_string(), tx2);

        // The replaced sender was dropped, so the old receiver observes closure.
        assert!(rx1.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let registry = ConnectionRegistry::new();
        let (tx, _rx) = channel();
        registry.open("tok1".to_string(), tx);

        assert!(registry.remove("tok1"));
        assert!(!registry.remove("tok1"));
        assert!(!registry.remove("never-registered"));
        assert!(!registry.contains("tok1"));
    }

    #[tokio::test]
    async fn test_remove_if_current_ignores_stale_connection_id() {
        let registry = ConnectionRegistry::new();
        let (tx1, _rx1) = channel();
        let (tx2, _rx2) = channel();

        let stale_id = registry.open("tok1".to_string(), tx1);
        let current_id = registry.open("tok1".to_string(), tx2);

        // A cleanup callback from the replaced connection must not evict the
        // replacement session.
        assert!(!registry.remove_if_current("tok1", &stale_id));
        assert!(registry.contains("tok1"));

        assert!(registry.remove_if_current("tok1", &current_id));
        assert!(!registry.contains("tok1"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_remove_if_idle_spares_refreshed_session() {
        let registry = ConnectionRegistry::new();
        let (tx1, _rx1) = channel();
        let (tx2, _rx2) = channel();
        let timeout = Duration::from_secs(300);

        registry.open("tok1".to_string(), tx1);
        tokio::time::advance(Duration::from_secs(301)).await;

        // The sweep snapshots the stale credential, then the client
        // reconnects before the removal runs.
        let stale = registry.idle_credentials(timeout);
        assert_eq!(stale, vec!["tok1".to_string()]);
        registry.open("tok1".to_string(), tx2);

        assert!(!registry.remove_if_idle("tok1", timeout));
        assert!(registry.contains("tok1"));

        // Once the replacement itself goes idle, the guard lets it through.
        tokio::time::advance(Duration::from_secs(301)).await;
        assert!(registry.remove_if_idle("tok1", timeout));
        assert!(!registry.contains("tok1"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_remove_if_idle_spares_touched_session() {
        let registry = ConnectionRegistry::new();
        let (tx, _rx) = channel();
        let timeout = Duration::from_secs(300);

        registry.open("tok1".to_string(), tx);
        tokio::time::advance(Duration::from_secs(301)).await;

        let stale = registry.idle_credentials(timeout);
        assert_eq!(stale, vec!["tok1".to_string()]);
        registry.touch("tok1");

        assert!(!registry.remove_if_idle("tok1", timeout));
        assert!(registry.contains("tok1"));
    }

    #[tokio::test]
    async fn test_touch_on_absent_credential_is_noop() {
        let registry = ConnectionRegistry::new();
        registry.touch("missing");
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_send_to_returns_false_without_session() {
        let registry = ConnectionRegistry::new();
        assert!(!registry.send_to("tok1", Event::default().data("x")));
    }

    #[tokio::test]
    async fn test_send_to_delivers_to_registered_session() {
        let registry = ConnectionRegistry::new();
        let (tx, mut rx) = channel();
        registry.open("tok1".to_string(), tx);

        assert!(registry.send_to("tok1", Event::default().data("x")));
        assert!(rx.recv().await.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_credentials_honors_timeout_window() {
        let registry = ConnectionRegistry::new();
        let (tx, _rx) = channel();
        registry.open("tok1".to_string(), tx);

        assert!(registry
            .idle_credentials(Duration::from_secs(300))
            .is_empty());

        tokio::time::advance(Duration::from_secs(301)).await;
        assert_eq!(
            registry.idle_credentials(Duration::from_secs(300)),
            vec!["tok1".to_string()]
        );

        // Touching moves the session back inside the window.
        registry.touch("tok1");
        assert!(registry
            .idle_credentials(Duration::from_secs(300))
            .is_empty());
    }
}
