//! Time-bounded memoization of Redfish GETs.
//!
//! Entries are keyed by absolute URI; a fragment suffix (`<uri>#/ptr`) is
//! resolved against the shared entry for `<uri>`, so sibling fragments cost
//! one backend fetch between them. The cache is shared by every interface
//! built over it and is safe under concurrent callers: at most one fetch is
//! in flight per URI, and entries publish atomically.

use crate::clock::Clock;
use crate::transport::{RedfishTransport, TransportError};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use thiserror::Error;
use tokio::sync::Mutex;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The service answered with a non-success status.
    #[error("GET {uri} returned status {code}")]
    Status { uri: String, code: u16 },

    /// The fragment pointer does not resolve inside the fetched document.
    #[error("fragment does not resolve: {0}")]
    BadFragment(String),
}

pub type CacheResult<T> = Result<T, CacheError>;

/// Body of a GET plus whether it came from a live transport fetch.
#[derive(Debug, Clone)]
pub struct Fetched {
    pub body: Value,
    pub fresh: bool,
}

struct CacheEntry {
    body: Value,
    inserted_at: SystemTime,
}

type Slot = Arc<Mutex<Option<CacheEntry>>>;

/// GET memoization with a fixed maximum entry age.
pub struct TimeBasedCache {
    transport: Arc<dyn RedfishTransport>,
    clock: Arc<dyn Clock>,
    max_age: Duration,
    entries: Mutex<HashMap<String, Slot>>,
}

impl TimeBasedCache {
    pub fn new(transport: Arc<dyn RedfishTransport>, clock: Arc<dyn Clock>, max_age: Duration) -> Self {
        Self {
            transport,
            clock,
            max_age,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn root_uri(&self) -> &str {
        self.transport.root_uri()
    }

    pub fn max_age(&self) -> Duration {
        self.max_age
    }

    /// Serve `uri` from the cache when the entry is younger than `max_age`,
    /// fetching and (re)populating otherwise.
    pub async fn cached_get(&self, uri: &str) -> CacheResult<Fetched> {
        let (base, fragment) = split_fragment(uri);
        let slot = self.slot_for(base).await;
        // Per-URI lock: concurrent callers missing on the same URI coalesce
        // onto the first fetch.
        let mut entry = slot.lock().await;
        let now = self.clock.now();
        if let Some(cached) = entry.as_ref() {
            let is_fresh = now
                .duration_since(cached.inserted_at)
                .map(|age| age <= self.max_age)
                .unwrap_or(true);
            if is_fresh {
                return project(cached.body.clone(), fragment, false, uri);
            }
        }
        let body = self.fetch(base).await?;
        *entry = Some(CacheEntry {
            body: body.clone(),
            inserted_at: now,
        });
        project(body, fragment, true, uri)
    }

    /// Unconditional transport fetch. Never populates the cache.
    pub async fn uncached_get(&self, uri: &str) -> CacheResult<Fetched> {
        let (base, fragment) = split_fragment(uri);
        let body = self.fetch(base).await?;
        project(body, fragment, true, uri)
    }

    /// Evict every entry.
    pub async fn clear_all(&self) {
        let mut entries = self.entries.lock().await;
        entries.clear();
    }

    async fn slot_for(&self, base: &str) -> Slot {
        let mut entries = self.entries.lock().await;
        entries
            .entry(base.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(None)))
            .clone()
    }

    async fn fetch(&self, base: &str) -> CacheResult<Value> {
        let response = self.transport.get(base).await?;
        if !response.is_success() {
            return Err(CacheError::Status {
                uri: base.to_string(),
                code: response.code,
            });
        }
        Ok(response.body)
    }
}

/// Split `<uri>#/json/pointer` into the cache key and the pointer.
fn split_fragment(uri: &str) -> (&str, Option<&str>) {
    match uri.split_once('#') {
        Some((base, pointer)) => (base, Some(pointer)),
        None => (uri, None),
    }
}

fn project(body: Value, fragment: Option<&str>, fresh: bool, uri: &str) -> CacheResult<Fetched> {
    match fragment {
        None => Ok(Fetched { body, fresh }),
        Some(pointer) => body
            .pointer(pointer)
            .cloned()
            .map(|body| Fetched { body, fresh })
            .ok_or_else(|| CacheError::BadFragment(uri.to_string())),
    }
}
