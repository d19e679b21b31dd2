//! Tree view over Redfish JSON resources.
//!
//! A [`RedfishVariant`] is a runtime view over one JSON value fetched from
//! the service. Property and member navigation go back through the shared
//! [`TimeBasedCache`](crate::cache::TimeBasedCache), so `@odata.id`
//! references are followed lazily and repeated walks of the same subtree do
//! not re-hit the backend.

pub mod variant;

pub use variant::{RedfishCollection, RedfishObject, RedfishVariant};

use crate::cache::{CacheError, TimeBasedCache};
use crate::clock::Clock;
use crate::transport::RedfishTransport;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Canonical URI property of a Redfish resource.
pub const ODATA_ID: &str = "@odata.id";
/// Member references of a Redfish collection resource.
pub const MEMBERS: &str = "Members";
/// Reported member count of a Redfish collection resource.
pub const MEMBERS_COUNT: &str = "Members@odata.count";

#[derive(Debug, Error)]
pub enum RedfishError {
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// The resource carries no `@odata.id` to re-fetch from.
    #[error("resource has no @odata.id to re-fetch from")]
    NoOdataId,

    /// A re-fetch did not yield a resource object.
    #[error("GET {0} did not return a resource object")]
    NotAnObject(String),
}

pub type RedfishResult<T> = Result<T, RedfishError>;

/// Continue or stop a property iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IterControl {
    Continue,
    Stop,
}

/// Entry point to a Redfish service as a navigable tree.
pub struct RedfishInterface {
    cache: Arc<TimeBasedCache>,
}

impl RedfishInterface {
    pub fn new(
        transport: Arc<dyn RedfishTransport>,
        clock: Arc<dyn Clock>,
        max_age: Duration,
    ) -> Self {
        Self {
            cache: Arc::new(TimeBasedCache::new(transport, clock, max_age)),
        }
    }

    /// Build an interface over an existing (possibly shared) cache.
    pub fn with_cache(cache: Arc<TimeBasedCache>) -> Self {
        Self { cache }
    }

    pub fn cache(&self) -> &Arc<TimeBasedCache> {
        &self.cache
    }

    /// Fetch the service root resource.
    pub async fn get_root(&self) -> RedfishResult<RedfishVariant> {
        let root_uri = self.cache.root_uri().to_string();
        self.cached_get_uri(&root_uri).await
    }

    pub async fn cached_get_uri(&self, uri: &str) -> RedfishResult<RedfishVariant> {
        let fetched = self.cache.cached_get(uri).await?;
        Ok(variant::variant_from_value(
            fetched.body,
            Some(uri.to_string()),
            fetched.fresh,
            &self.cache,
        ))
    }

    pub async fn uncached_get_uri(&self, uri: &str) -> RedfishResult<RedfishVariant> {
        let fetched = self.cache.uncached_get(uri).await?;
        Ok(variant::variant_from_value(
            fetched.body,
            Some(uri.to_string()),
            fetched.fresh,
            &self.cache,
        ))
    }
}
