//! Server-Sent Events (SSE) infrastructure for the MCP calendar server.
//!
//! This crate owns the session subsystem: the connection registry, the typed
//! event definitions, and the two periodic sweeps that keep long-lived push
//! channels healthy.
//!
//! # Architecture
//!
//! - **Single connection per credential**: each authenticated client holds at
//!   most one SSE connection, keyed by its opaque credential string. A
//!   reconnect replaces (and explicitly closes) the previous channel.
//! - **DashMap registry**: registration, removal and touch are O(1) map
//!   operations; iteration is safe while other workers mutate the map.
//! - **Heartbeat sweep**: pushes a `heartbeat` event to every open channel at
//!   a fixed interval and refreshes the session's activity timestamp on each
//!   successful send. Send failures are logged, never evicted here.
//! - **Idle sweep**: the single reclamation path. Sessions whose last
//!   activity predates the configured timeout are closed and removed, which
//!   also catches channels whose heartbeats fail silently.
//! - **Ephemeral events**: nothing is buffered for offline clients; a client
//!   that reconnects simply gets a fresh `connect`/`tools` handshake.
//!
//! # Modules
//!
//! - `connection`: ConnectionRegistry keyed by credential, with guarded
//!   removal for replace-then-cleanup races
//! - `manager`: heartbeat fan-out, idle eviction and per-client sends
//! - `message`: typed events (`connect`, `tools`, `heartbeat`) and their
//!   wire shapes
//! - `sweeper`: tokio interval tasks driving the two sweeps

pub mod connection;
pub mod manager;
pub mod message;
pub mod sweeper;

pub use manager::Manager;
