use dashmap::DashMap;
use log::*;
use tokio::time::{Duration, Instant};

/// One cached IP-to-credential association.
#[derive(Debug, Clone)]
struct AffinityEntry {
    credential: String,
    last_access: Instant,
}

/// Time-bounded mapping from client IP to the last credential resolved from
/// an explicit source at that address.
///
/// The cache exists to re-associate a future, sessionless tool call with the
/// last credential seen from its address, so entries deliberately outlive the
/// sessions themselves. Eviction is purely age-based and runs on its own
/// sweep, independent of session lifecycle.
pub struct AffinityCache {
    entries: DashMap<String, AffinityEntry>,
}

impl AffinityCache {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Upsert the association for `ip`. Blank inputs are ignored; at most one
    /// entry exists per IP (last write wins).
    pub fn put(&self, ip: &str, credential: &str) {
        let ip = ip.trim();
        let credential = credential.trim();
        if ip.is_empty() || credential.is_empty() {
            return;
        }

        self.entries.insert(
            ip.to_string(),
            AffinityEntry {
                credential: credential.to_string(),
                last_access: Instant::now(),
            },
        );
        debug!("Registered affinity: IP {ip} -> credential");
    }

    /// Look up the credential cached for `ip`, refreshing its last access so
    /// actively used associations survive the age-based sweep.
    pub fn get(&self, ip: &str) -> Option<String> {
        let ip = ip.trim();
        if ip.is_empty() {
            return None;
        }

        self.entries.get_mut(ip).map(|mut entry| {
            entry.last_access = Instant::now();
            entry.credential.clone()
        })
    }

    /// Purge entries whose last access is older than `max_age`. Returns the
    /// number of entries removed.
    pub fn evict_older_than(&self, max_age: Duration) -> usize {
        let now = Instant::now();
        let before = self.entries.len();

        self.entries
            .retain(|_, entry| now.duration_since(entry.last_access) <= max_age);

        let removed = before.saturating_sub(self.entries.len());
        if removed > 0 {
            info!("Affinity cleanup: {removed} stale associations removed");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for AffinityCache {
    fn default() -> Self {
        Self::new()
    }
}
