//! Credential Cache Store
//!
//! TTL-bounded map from token hash to sanitized credential, with hit/miss
//! accounting, lazy expiry on lookup and an owned background sweep.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::auth::CachedCredential;
use crate::cache::{CacheEntry, CacheStats, DEFAULT_CREDENTIAL_TTL};
use crate::clock::{system_clock, SharedClock};
use crate::tasks::{spawn_sweep_task, Sweep};

// == Cache State ==
/// Entries and counters, always mutated together under one lock.
#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<String, CacheEntry<CachedCredential>>,
    stats: CacheStats,
    /// Bumped by every explicit removal
    generation: u64,
}

impl CacheState {
    /// Removes every entry whose credential matches and counts the removals.
    fn remove_where(&mut self, matches: impl Fn(&CachedCredential) -> bool) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !matches(&entry.data));
        let removed = before - self.entries.len();
        self.stats.record_deletes(removed);
        self.generation += 1;
        removed
    }
}

impl Sweep for CacheState {
    fn sweep_expired(&mut self, now_ms: u64) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.is_live(now_ms));
        before - self.entries.len()
    }
}

// == Credential Cache ==
/// Process-local cache of validated API keys, keyed by token hash.
///
/// Never fails: a miss only means the caller falls through to the
/// authoritative source.
#[derive(Debug)]
pub struct CredentialCache {
    state: Arc<Mutex<CacheState>>,
    default_ttl: Duration,
    clock: SharedClock,
    sweeper: Mutex<Option<JoinHandle<()>>>,
}

impl CredentialCache {
    // == Constructors ==
    /// Creates a cache without a background sweep.
    pub fn new(default_ttl: Duration) -> Self {
        Self::with_clock(default_ttl, system_clock())
    }

    /// Creates a cache reading time from `clock`.
    pub fn with_clock(default_ttl: Duration, clock: SharedClock) -> Self {
        Self {
            state: Arc::new(Mutex::new(CacheState::default())),
            default_ttl,
            clock,
            sweeper: Mutex::new(None),
        }
    }

    /// Creates a cache and starts its sweep task. Must run inside a tokio runtime.
    pub fn spawn(default_ttl: Duration, cleanup_interval: Duration) -> Self {
        let cache = Self::new(default_ttl);
        cache.start_sweeper(cleanup_interval);
        cache
    }

    /// Starts (or restarts) the background sweep on `interval`.
    pub fn start_sweeper(&self, interval: Duration) {
        let handle = spawn_sweep_task(
            self.state.clone(),
            self.clock.clone(),
            interval,
            "credential cache",
        );
        if let Some(previous) = self.sweeper.lock().replace(handle) {
            previous.abort();
        }
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    // == Get ==
    /// Returns the cached credential for `token_hash` if it is still live.
    ///
    /// Counts a hit or a miss. An expired entry is removed and counted as a miss.
    pub fn get(&self, token_hash: &str) -> Option<CachedCredential> {
        let now = self.clock.now_ms();
        let mut guard = self.state.lock();
        let CacheState { entries, stats, .. } = &mut *guard;

        match entries.get(token_hash) {
            Some(entry) if entry.is_live(now) => {
                stats.record_hit();
                Some(entry.data.clone())
            }
            Some(_) => {
                entries.remove(token_hash);
                stats.record_miss();
                None
            }
            None => {
                stats.record_miss();
                None
            }
        }
    }

    // == Set ==
    /// Caches a credential under `token_hash` for the default TTL.
    pub fn set(&self, token_hash: impl Into<String>, credential: impl Into<CachedCredential>) {
        self.set_with_ttl(token_hash, credential, self.default_ttl);
    }

    /// Current invalidation generation. Read it before a slow source lookup
    /// and pass it to [`CredentialCache::set_if_generation`].
    pub fn generation(&self) -> u64 {
        self.state.lock().generation
    }

    /// Caches a credential only if no explicit removal happened since
    /// `generation` was read. Returns whether the entry was stored.
    pub fn set_if_generation(
        &self,
        token_hash: impl Into<String>,
        credential: impl Into<CachedCredential>,
        generation: u64,
    ) -> bool {
        let entry = CacheEntry::new(
            credential.into(),
            self.clock.now_ms(),
            self.default_ttl.as_millis() as u64,
        );

        let mut state = self.state.lock();
        if state.generation != generation {
            debug!(credential_id = %entry.data.id, "Skipping cache write after invalidation");
            return false;
        }
        state.entries.insert(token_hash.into(), entry);
        state.stats.record_set();
        true
    }

    /// Caches a credential for `ttl`. A zero TTL falls back to the default.
    ///
    /// Only the [`CachedCredential`] projection is stored, so plaintext and
    /// hashed token fields never enter the cache. Overwrites any prior entry.
    pub fn set_with_ttl(
        &self,
        token_hash: impl Into<String>,
        credential: impl Into<CachedCredential>,
        ttl: Duration,
    ) {
        let ttl = if ttl.is_zero() { self.default_ttl } else { ttl };
        let entry = CacheEntry::new(credential.into(), self.clock.now_ms(), ttl.as_millis() as u64);
        let token_hash = token_hash.into();

        debug!(credential_id = %entry.data.id, ttl_ms = entry.ttl, "Caching credential");

        let mut state = self.state.lock();
        state.entries.insert(token_hash, entry);
        state.stats.record_set();
    }

    // == Delete ==
    /// Removes the entry for `token_hash`. Returns whether one was present.
    pub fn delete(&self, token_hash: &str) -> bool {
        let mut state = self.state.lock();
        let removed = state.entries.remove(token_hash).is_some();
        if removed {
            state.stats.record_deletes(1);
        }
        state.generation += 1;
        removed
    }

    /// Removes every entry for credential `id`, returning the count.
    pub fn delete_by_credential_id(&self, id: &str) -> usize {
        let removed = self.state.lock().remove_where(|c| c.id == id);
        if removed > 0 {
            info!(credential_id = %id, removed, "Invalidated cached credential");
        }
        removed
    }

    /// Removes every entry belonging to `team_id`, returning the count.
    pub fn delete_by_team_id(&self, team_id: &str) -> usize {
        let removed = self.state.lock().remove_where(|c| c.team_id == team_id);
        if removed > 0 {
            info!(team_id = %team_id, removed, "Invalidated cached team credentials");
        }
        removed
    }

    // == Exists ==
    /// Whether a live entry exists. Evicts an expired one, leaves hit/miss
    /// counters untouched.
    pub fn exists(&self, token_hash: &str) -> bool {
        let now = self.clock.now_ms();
        let mut state = self.state.lock();

        match state.entries.get(token_hash).map(|entry| entry.is_live(now)) {
            Some(true) => true,
            Some(false) => {
                state.entries.remove(token_hash);
                false
            }
            None => false,
        }
    }

    // == Clear ==
    /// Drops all entries, counting each one as a delete.
    pub fn clear(&self) {
        let mut state = self.state.lock();
        let size = state.entries.len();
        state.entries.clear();
        state.stats.record_deletes(size);
        state.generation += 1;
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let state = self.state.lock();
        state.stats.snapshot(state.entries.len())
    }

    // == Cleanup Expired ==
    /// Runs one sweep immediately. Returns the number of entries removed.
    pub fn cleanup_expired(&self) -> usize {
        let now = self.clock.now_ms();
        self.state.lock().sweep_expired(now)
    }

    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().entries.is_empty()
    }

    // == Destroy ==
    /// Stops the sweep task and releases every entry.
    pub fn destroy(&self) {
        if let Some(handle) = self.sweeper.lock().take() {
            handle.abort();
        }
        self.state.lock().entries.clear();
        info!("Credential cache destroyed");
    }
}

impl Default for CredentialCache {
    fn default() -> Self {
        Self::new(DEFAULT_CREDENTIAL_TTL)
    }
}

impl Drop for CredentialCache {
    fn drop(&mut self) {
        if let Some(handle) = self.sweeper.get_mut().take() {
            handle.abort();
        }
    }
}
