//! Periodic background tasks over the connection registry.
//!
//! Two independent sweeps run for the lifetime of the process: the heartbeat
//! sweep keeps live channels warm (and their activity fresh), and the idle
//! sweep reclaims sessions whose activity stopped, including those whose
//! heartbeats have been silently failing.

use crate::manager::Manager;
use log::*;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};

/// Spawn the heartbeat sweep. When `enabled` is false or `period` is zero the
/// task exits immediately and heartbeats are off for the process lifetime.
pub fn spawn_heartbeat_sweeper(
    manager: Arc<Manager>,
    period: Duration,
    enabled: bool,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        if !enabled || period.is_zero() {
            info!("SSE heartbeats disabled");
            return;
        }

        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick of a tokio interval fires immediately; consume it so
        // the first heartbeat goes out one full period after startup.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            manager.send_heartbeats();
        }
    })
}

/// Spawn the idle-eviction sweep: every `period`, close and remove sessions
/// whose last activity predates `timeout`.
pub fn spawn_idle_sweeper(
    manager: Arc<Manager>,
    period: Duration,
    timeout: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let evicted = manager.close_idle_connections(timeout);
            if evicted > 0 {
                info!("Idle sweep closed {evicted} inactive SSE connections");
            }
            debug!(
                "SSE status: {} active connections",
                manager.connected_clients()
            );
        }
    })
}
