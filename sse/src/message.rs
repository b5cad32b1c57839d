use serde::Serialize;
use serde_json::Value;
use std::time::{SystemTime, UNIX_EPOCH};

/// Trait for getting the SSE event type name
pub trait EventType {
    fn event_type(&self) -> &'static str;
}

/// Events pushed over a session's channel. Payloads serialize as bare JSON
/// objects; the event name travels in the SSE `event:` field, not the body.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Event {
    /// First event after a successful channel open.
    #[serde(rename_all = "camelCase")]
    Connect {
        message: String,
        token: String,
        connection_id: String,
        timestamp: u64,
    },
    /// Catalog of the tools this server exposes, sent right after `Connect`.
    /// Carried as a pre-serialized value so this crate stays free of
    /// business-layer dependencies.
    Tools { message: String, tools: Value },
    /// Periodic keep-alive pushed by the heartbeat sweep.
    Heartbeat { timestamp: u64, message: String },
}

impl EventType for Event {
    fn event_type(&self) -> &'static str {
        match self {
            Event::Connect { .. } => "connect",
            Event::Tools { .. } => "tools",
            Event::Heartbeat { .. } => "heartbeat",
        }
    }
}

impl Event {
    pub fn connect(token: &str, connection_id: &str) -> Self {
        Event::Connect {
            message: "SSE connection established successfully".to_string(),
            token: token.to_string(),
            connection_id: connection_id.to_string(),
            timestamp: epoch_millis(),
        }
    }

    pub fn tools(catalog: Value) -> Self {
        Event::Tools {
            message: "Available tools".to_string(),
            tools: catalog,
        }
    }

    pub fn heartbeat() -> Self {
        Event::Heartbeat {
            timestamp: epoch_millis(),
            message: "heartbeat".to_string(),
        }
    }
}

/// Milliseconds since the Unix epoch, for event payload timestamps.
pub fn epoch_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
