use crate::affinity::AffinityCache;
use log::*;
use std::sync::{Arc, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};

/// The credential signals available on one inbound request, in no particular
/// order. The web layer fills this in from headers, query string and the
/// resolved client IP; the resolver applies the priority rules.
#[derive(Debug, Default, Clone)]
pub struct CredentialSources {
    /// Reserved `token` header (protocol-specific, highest priority).
    pub token_header: Option<String>,
    /// Generic `Authorization` header.
    pub authorization_header: Option<String>,
    /// `token` URL query parameter.
    pub token_param: Option<String>,
    /// Client IP derived from forwarding headers or the peer address, used
    /// for the affinity lookup and for recording affinity on explicit hits.
    pub client_ip: Option<String>,
}

/// Multi-source credential resolver with IP affinity and a process-wide
/// last-active fallback.
///
/// Resolution order is a correctness contract, not a tunable:
/// 1. reserved `token` header
/// 2. `Authorization` header
/// 3. `token` query parameter
/// 4. affinity cache keyed by client IP
/// 5. last credential resolved anywhere in the process
///
/// The first non-blank value wins. Explicit hits (1-3) overwrite the
/// last-active slot and record IP affinity; implicit hits (4-5) do not, so
/// fallback reads never feed back into the caches.
///
/// The last-active slot is owned here rather than living in a static so the
/// fallback behavior is visible in the dependency graph and resettable in
/// tests; one resolver instance is shared process-wide behind an `Arc`.
pub struct CredentialResolver {
    affinity: AffinityCache,
    last_active: RwLock<Option<String>>,
}

impl CredentialResolver {
    pub fn new() -> Self {
        Self {
            affinity: AffinityCache::new(),
            last_active: RwLock::new(None),
        }
    }

    /// Resolve a credential from all five sources.
    pub fn resolve(&self, sources: &CredentialSources) -> Option<String> {
        if let Some(credential) = self.resolve_explicit(sources) {
            return Some(credential);
        }

        // Implicit sources: history only, no side effects.
        if let Some(ip) = non_blank(sources.client_ip.as_deref()) {
            if let Some(credential) = self.affinity.get(&ip) {
                debug!("Credential resolved from IP affinity [{ip}]");
                return Some(credential);
            }
        }

        let last = self.last_active();
        if last.is_some() {
            debug!("Credential resolved from last-active fallback");
        } else {
            warn!("No credential could be resolved from any source");
        }
        last
    }

    /// Resolve from the explicit request-attached sources only (headers and
    /// query parameter). Used by the channel-open endpoint, which must not
    /// fall back to historical associations.
    pub fn resolve_explicit(&self, sources: &CredentialSources) -> Option<String> {
        if let Some(credential) = non_blank(sources.token_header.as_deref()) {
            debug!("Credential resolved from 'token' header");
            self.record_explicit(&credential, sources.client_ip.as_deref());
            return Some(credential);
        }

        if let Some(credential) = non_blank(sources.authorization_header.as_deref()) {
            debug!("Credential resolved from 'Authorization' header");
            self.record_explicit(&credential, sources.client_ip.as_deref());
            return Some(credential);
        }

        if let Some(credential) = non_blank(sources.token_param.as_deref()) {
            debug!("Credential resolved from 'token' query parameter");
            self.record_explicit(&credential, sources.client_ip.as_deref());
            return Some(credential);
        }

        None
    }

    /// Most recently resolved explicit credential, process-wide.
    pub fn last_active(&self) -> Option<String> {
        self.last_active
            .read()
            .ok()
            .and_then(|guard| guard.clone())
    }

    pub fn affinity(&self) -> &AffinityCache {
        &self.affinity
    }

    // Side effects of an explicit resolution: the global fallback slot is
    // overwritten and, when the caller's IP is known, affinity is recorded.
    fn record_explicit(&self, credential: &str, client_ip: Option<&str>) {
        if let Ok(mut guard) = self.last_active.write() {
            *guard = Some(credential.to_string());
        }

        if let Some(ip) = non_blank(client_ip) {
            self.affinity.put(&ip, credential);
        }
    }
}

impl Default for CredentialResolver {
    fn default() -> Self {
        Self::new()
    }
}

/// Spawn the affinity cleanup sweep: every `period`, purge affinity entries
/// whose last access is older than `max_age`. Runs independently of the
/// session sweeps; an affinity entry may outlive the session that created it.
pub fn spawn_affinity_sweeper(
    resolver: Arc<CredentialResolver>,
    period: Duration,
    max_age: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await;

        loop {
            ticker.tick().await;
            resolver.affinity().evict_older_than(max_age);
        }
    })
}

/// Trimmed, non-empty values only; all-whitespace counts as absent.
fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}
