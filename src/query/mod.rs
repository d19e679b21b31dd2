//! Declarative RedPath query processing.
//!
//! A [`Query`] bundles subqueries that are compiled once and evaluated in a
//! single traversal of the Redfish tree:
//! - [`path`] compiles each subquery's RedPath into location steps,
//! - [`planner`] walks the tree, deduplicating overlapping traversals,
//! - [`normalize`] projects matched resources into flat rows,
//! - [`result`] assembles the timestamped output keyed by subquery id.

pub mod normalize;
pub mod path;
pub mod planner;
pub mod result;

pub use normalize::{Normalize, NormalizeError, NormalizeResult, PropertyNormalizer};
pub use path::{parse_redpath, PathError, PathResult, Predicate, Step};
pub use planner::{FilterOutcome, QueryPlanner, SubqueryHandle};
pub use result::{DataSet, DataSetRow, QueryResult, RowValue, Timestamp};

use serde::{Deserialize, Serialize};

/// A bundle of subqueries evaluated in one traversal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Query {
    pub query_id: String,
    #[serde(default)]
    pub subquery: Vec<Subquery>,
}

impl Query {
    /// Deserialize a query descriptor from its JSON form.
    pub fn from_json(descriptor: &str) -> serde_json::Result<Self> {
        serde_json::from_str(descriptor)
    }
}

/// One element of a compound query: a RedPath plus the property
/// projection applied to its matches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subquery {
    /// Unique within the enclosing query.
    pub subquery_id: String,
    /// Slash-delimited path expression, e.g. `/Chassis[*]/Thermal[*]`.
    pub redpath: String,
    #[serde(default)]
    pub properties: Vec<PropertyDescriptor>,
}

/// Requests one property of a matched resource in the output row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyDescriptor {
    /// Dotted path into the resource payload, e.g. `Status.State`.
    pub property: String,
    /// Output name; the property path is used when absent.
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "type")]
    pub property_type: PropertyType,
}

impl PropertyDescriptor {
    pub fn output_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.property)
    }
}

/// Declared type of a requested property. Values that do not coerce to
/// the declared type are omitted from the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyType {
    /// Pass the JSON value through unchanged.
    #[default]
    Auto,
    String,
    Integer,
    Double,
    Boolean,
}
