//! Redquery
//!
//! A declarative RedPath query engine for Redfish management services.
//!
//! A query bundles subqueries, each a slash-delimited RedPath with a
//! per-step predicate (`/Chassis[*]/Thermal[*]/Fans[*]`) and a property
//! projection. The engine compiles every subquery once, then walks the
//! Redfish tree a single time for the whole bundle: at each level the
//! active subqueries are grouped by the node they need next, so shared
//! path prefixes cost one fetch, and a URI-keyed time-based cache below
//! the traversal absorbs repeated and overlapping GETs.
//!
//! # Architecture
//!
//! - [`transport`]: raw REST verbs over an abstract channel (HTTP via
//!   reqwest, plus null and in-memory implementations)
//! - [`cache`]: time-bounded GET memoization with per-URI in-flight
//!   deduplication and fragment keying
//! - [`redfish`]: a lazy tree view over the service's JSON resources
//! - [`query`]: RedPath compilation, the deduplicating traversal
//!   planner, normalization and result assembly
//! - [`engine`]: compiled plans keyed by query id
//! - [`clock`]: injectable time source (fake clock for tests)
//!
//! # Example
//!
//! ```rust
//! use redquery::query::{parse_redpath, Predicate};
//!
//! let steps = parse_redpath("/Chassis[*]/Thermal[*]").unwrap();
//! assert_eq!(steps.len(), 2);
//! assert_eq!(steps[0].node_name, "Chassis");
//! assert_eq!(steps[1].predicate, Predicate::SelectAll);
//! ```

#![warn(clippy::all)]

pub mod cache;
pub mod clock;
pub mod engine;
pub mod query;
pub mod redfish;
pub mod transport;

// Re-export main types for convenience
pub use cache::{CacheError, CacheResult, Fetched, TimeBasedCache};
pub use clock::{Clock, FakeClock, SystemClock};
pub use engine::{EngineConfig, QueryEngine};
pub use query::{
    parse_redpath, DataSet, DataSetRow, FilterOutcome, Normalize, NormalizeError,
    PathError, Predicate, PropertyDescriptor, PropertyNormalizer, PropertyType, Query,
    QueryPlanner, QueryResult, RowValue, Step, Subquery, SubqueryHandle, Timestamp,
};
pub use redfish::{
    IterControl, RedfishCollection, RedfishError, RedfishInterface, RedfishObject,
    RedfishResult, RedfishVariant,
};
pub use transport::{
    HttpTransport, HttpTransportConfig, MockTransport, NullTransport, RedfishTransport,
    Response, TransportError, TransportResult,
};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get version string
pub fn version() -> &'static str {
    VERSION
}
