use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use super::types::MessageEntry;
use crate::api::{ApiError, MessageApi};
use crate::mode::{Mode, ModeFlag};
use crate::storage::{Storage, StorageError, CATALOG_KEY, FETCHED_AT_KEY};

pub const DEFAULT_TTL: Duration = Duration::from_secs(60 * 60);
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

pub type CatalogSnapshot = Arc<HashMap<String, MessageEntry>>;

/// What a refresh operation ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LoadOutcome {
    /// MOCK mode, the cache is inert.
    Skipped,
    /// Persisted copy was within TTL, no network call.
    FromStorage { count: usize },
    /// Full remote fetch replaced the catalog.
    Fetched { count: usize },
    /// Fetch failed; the persisted copy was installed regardless of age.
    StaleFallback { count: usize },
    /// Fetch failed and nothing usable was persisted; in-memory state left as is.
    Unavailable,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum CatalogEvent {
    Replaced { count: usize },
    Cleared,
    Upserted { code: String },
    Removed { code: String },
}

#[derive(Debug, Clone)]
enum Patch {
    Upsert(MessageEntry),
    Remove(String),
}

impl Patch {
    fn code(&self) -> &str {
        match self {
            Patch::Upsert(entry) => &entry.code,
            Patch::Remove(code) => code,
        }
    }

    fn apply(&self, entries: &mut HashMap<String, MessageEntry>) {
        match self {
            Patch::Upsert(entry) => {
                entries.insert(entry.code.clone(), entry.clone());
            }
            Patch::Remove(code) => {
                entries.remove(code);
            }
        }
    }
}

#[derive(Default)]
struct CatalogState {
    entries: CatalogSnapshot,
    fetched_at: Option<i64>,
    /// Whether `entries` reflects the persisted copy. False until the first
    /// load and again after MOCK mode clears memory.
    loaded: bool,
    /// Patches made while a fetch is in flight, replayed on top of its result.
    journal: Vec<(u64, Patch)>,
    next_seq: u64,
    in_flight: usize,
}

struct PersistedCatalog {
    entries: Vec<MessageEntry>,
    fetched_at: Option<i64>,
}

/// Client-side, time-bounded copy of the backend message catalog.
///
/// The in-memory map is swapped atomically on every full refresh, so readers
/// always see a complete snapshot. Every mutation writes through to storage
/// while holding the state lock; memory and the persisted copy never drift.
pub struct MessageCatalogCache {
    mode: Arc<ModeFlag>,
    api: Arc<dyn MessageApi>,
    storage: Arc<dyn Storage>,
    ttl: Duration,
    fetch_timeout: Duration,
    state: Mutex<CatalogState>,
    change_tx: broadcast::Sender<CatalogEvent>,
}

impl MessageCatalogCache {
    pub fn new(mode: Arc<ModeFlag>, api: Arc<dyn MessageApi>, storage: Arc<dyn Storage>) -> Self {
        let (change_tx, _) = broadcast::channel(64);
        Self {
            mode,
            api,
            storage,
            ttl: DEFAULT_TTL,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            state: Mutex::new(CatalogState::default()),
            change_tx,
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn lock(&self) -> MutexGuard<'_, CatalogState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    // === Reads ===

    /// Current in-memory catalog. Cheap; shares the map with the cache.
    pub fn snapshot(&self) -> CatalogSnapshot {
        Arc::clone(&self.lock().entries)
    }

    pub fn get(&self, code: &str) -> Option<MessageEntry> {
        self.lock().entries.get(code).cloned()
    }

    /// All entries ordered by code.
    pub fn entries(&self) -> Vec<MessageEntry> {
        let snapshot = self.snapshot();
        let mut entries: Vec<MessageEntry> = snapshot.values().cloned().collect();
        entries.sort_by(|a, b| a.code.cmp(&b.code));
        entries
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Time of the last full fetch backing the in-memory catalog.
    pub fn fetched_at(&self) -> Option<DateTime<Utc>> {
        self.lock()
            .fetched_at
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CatalogEvent> {
        self.change_tx.subscribe()
    }

    // === Refresh ===

    /// Serves the persisted copy while it is within TTL, otherwise fetches.
    ///
    /// In MOCK mode the in-memory catalog is cleared and nothing else happens.
    pub async fn load(&self) -> LoadOutcome {
        if self.mode.get_mode() == Mode::Mock {
            self.clear_memory();
            return LoadOutcome::Skipped;
        }

        if let Some(persisted) = self.read_persisted() {
            if let Some(fetched_at) = persisted.fetched_at {
                if self.is_fresh(fetched_at) {
                    let count = self.install(persisted.entries, Some(fetched_at));
                    debug!("Message catalog served from storage ({} entries)", count);
                    return LoadOutcome::FromStorage { count };
                }
            }
        }

        self.fetch_and_store(true).await
    }

    /// Fetches unconditionally, ignoring TTL. No-op in MOCK mode.
    pub async fn force_refresh(&self) -> LoadOutcome {
        if self.mode.get_mode() == Mode::Mock {
            return LoadOutcome::Skipped;
        }
        self.fetch_and_store(false).await
    }

    /// Drops the persisted copy, then behaves like [`load`](Self::load).
    pub async fn reload(&self) -> LoadOutcome {
        self.remove_persisted();
        self.load().await
    }

    // === Local patches ===

    /// Applies a single edited entry without a full refetch. `fetched_at` is untouched.
    pub fn upsert(&self, entry: MessageEntry) {
        let code = entry.code.clone();
        self.patch(Patch::Upsert(entry));
        debug!("Message catalog patched: upserted {}", code);
        let _ = self.change_tx.send(CatalogEvent::Upserted { code });
    }

    /// Drops a single entry. Returns whether it was present. `fetched_at` is untouched.
    pub fn remove(&self, code: &str) -> bool {
        let existed = self.patch(Patch::Remove(code.to_string()));
        debug!("Message catalog patched: removed {} (present: {})", code, existed);
        let _ = self.change_tx.send(CatalogEvent::Removed { code: code.to_string() });
        existed
    }

    fn patch(&self, patch: Patch) -> bool {
        let mut state = self.lock();

        if !state.loaded && self.mode.is_api() {
            if let Some(persisted) = self.read_persisted() {
                debug!("Hydrating message catalog from storage before patching");
                state.entries = Arc::new(index(persisted.entries));
                state.fetched_at = persisted.fetched_at;
            }
            state.loaded = true;
        }

        let existed = if state.loaded {
            let existed = state.entries.contains_key(patch.code());
            patch.apply(Arc::make_mut(&mut state.entries));
            self.write_catalog(&state.entries);
            existed
        } else {
            // memory stays cleared in MOCK mode; patch the persisted copy in place
            let mut persisted = self
                .read_persisted()
                .map(|persisted| index(persisted.entries))
                .unwrap_or_default();
            let existed = persisted.contains_key(patch.code());
            patch.apply(&mut persisted);
            self.write_catalog(&persisted);
            existed
        };

        if state.in_flight > 0 {
            let seq = state.next_seq;
            state.next_seq += 1;
            state.journal.push((seq, patch));
        }
        existed
    }

    // === Internals ===

    fn is_fresh(&self, fetched_at: i64) -> bool {
        let age_ms = Utc::now().timestamp_millis() - fetched_at;
        age_ms <= self.ttl.as_millis() as i64
    }

    async fn fetch_and_store(&self, fall_back_to_storage: bool) -> LoadOutcome {
        let start_seq = {
            let mut state = self.lock();
            state.in_flight += 1;
            state.next_seq
        };

        let result = match tokio::time::timeout(self.fetch_timeout, self.api.fetch_messages()).await {
            Ok(result) => result,
            Err(_) => Err(ApiError::Timeout),
        };

        match result {
            Ok(entries) => {
                let count = self.commit_fetch(start_seq, entries);
                info!("Message catalog fetched ({} entries)", count);
                LoadOutcome::Fetched { count }
            }
            Err(e) => {
                self.end_fetch();
                error!("Failed to fetch message catalog: {}", e);

                if !fall_back_to_storage {
                    return LoadOutcome::Unavailable;
                }
                // re-read so patches made during the failed fetch are included
                match self.read_persisted() {
                    Some(persisted) => {
                        let count = self.install(persisted.entries, persisted.fetched_at);
                        warn!("Using persisted message catalog regardless of age ({} entries)", count);
                        LoadOutcome::StaleFallback { count }
                    }
                    None => LoadOutcome::Unavailable,
                }
            }
        }
    }

    fn commit_fetch(&self, start_seq: u64, entries: Vec<MessageEntry>) -> usize {
        let mut state = self.lock();

        let mut map = index(entries);
        for (seq, patch) in &state.journal {
            if *seq >= start_seq {
                patch.apply(&mut map);
            }
        }

        let now = Utc::now().timestamp_millis();
        let fetched_at = match state.fetched_at {
            Some(previous) if previous >= now => previous + 1,
            _ => now,
        };

        let count = map.len();
        state.entries = Arc::new(map);
        state.fetched_at = Some(fetched_at);
        state.loaded = true;
        Self::finish_fetch(&mut state);

        self.write_catalog(&state.entries);
        self.write_fetched_at(fetched_at);
        drop(state);

        let _ = self.change_tx.send(CatalogEvent::Replaced { count });
        count
    }

    fn end_fetch(&self) {
        Self::finish_fetch(&mut self.lock());
    }

    fn finish_fetch(state: &mut CatalogState) {
        state.in_flight = state.in_flight.saturating_sub(1);
        if state.in_flight == 0 {
            state.journal.clear();
        }
    }

    /// Replaces in-memory state from a persisted copy (no write-back needed).
    fn install(&self, entries: Vec<MessageEntry>, fetched_at: Option<i64>) -> usize {
        let map = index(entries);
        let count = map.len();
        {
            let mut state = self.lock();
            state.entries = Arc::new(map);
            state.fetched_at = fetched_at;
            state.loaded = true;
        }
        let _ = self.change_tx.send(CatalogEvent::Replaced { count });
        count
    }

    fn clear_memory(&self) {
        let was_empty = {
            let mut state = self.lock();
            let was_empty = state.entries.is_empty();
            state.entries = CatalogSnapshot::default();
            state.fetched_at = None;
            state.loaded = false;
            was_empty
        };
        if !was_empty {
            debug!("MOCK mode: in-memory message catalog cleared");
            let _ = self.change_tx.send(CatalogEvent::Cleared);
        }
    }

    fn read_persisted(&self) -> Option<PersistedCatalog> {
        let raw = match self.storage.get(CATALOG_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!("Failed to read persisted message catalog: {}", e);
                return None;
            }
        };

        let entries: Vec<MessageEntry> = match serde_json::from_str(&raw) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Persisted message catalog is corrupt, ignoring: {}", e);
                return None;
            }
        };

        let fetched_at = match self.storage.get(FETCHED_AT_KEY) {
            Ok(Some(raw)) => raw.trim().parse::<i64>().ok(),
            Ok(None) => None,
            Err(e) => {
                warn!("Failed to read message catalog timestamp: {}", e);
                None
            }
        };

        Some(PersistedCatalog { entries, fetched_at })
    }

    fn write_catalog(&self, entries: &HashMap<String, MessageEntry>) {
        let mut sorted: Vec<&MessageEntry> = entries.values().collect();
        sorted.sort_by(|a, b| a.code.cmp(&b.code));

        let result = serde_json::to_string(&sorted)
            .map_err(StorageError::from)
            .and_then(|json| self.storage.set(CATALOG_KEY, &json));
        if let Err(e) = result {
            error!("Failed to persist message catalog: {}", e);
        }
    }

    fn write_fetched_at(&self, fetched_at: i64) {
        if let Err(e) = self.storage.set(FETCHED_AT_KEY, &fetched_at.to_string()) {
            error!("Failed to persist message catalog timestamp: {}", e);
        }
    }

    fn remove_persisted(&self) {
        for key in [CATALOG_KEY, FETCHED_AT_KEY] {
            if let Err(e) = self.storage.remove(key) {
                warn!("Failed to invalidate persisted {}: {}", key, e);
            }
        }
        info!("Persisted message catalog invalidated");
    }
}

fn index(entries: Vec<MessageEntry>) -> HashMap<String, MessageEntry> {
    entries
        .into_iter()
        .map(|entry| (entry.code.clone(), entry))
        .collect()
}
