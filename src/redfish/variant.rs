//! Runtime views over fetched JSON: objects, collections and scalars.

use super::{IterControl, RedfishError, RedfishResult, MEMBERS, MEMBERS_COUNT, ODATA_ID};
use crate::cache::TimeBasedCache;
use serde_json::{Map, Value};
use std::sync::Arc;

/// A runtime view over one Redfish JSON value.
#[derive(Clone)]
pub enum RedfishVariant {
    Null,
    /// A non-object, non-array JSON value.
    Scalar(Value),
    /// A singleton resource or nested object.
    Object(RedfishObject),
    /// A collection resource (`Members`) or an inline JSON array.
    Collection(RedfishCollection),
}

impl RedfishVariant {
    /// The underlying resource object; a collection answers with its
    /// backing resource when it has one.
    pub fn as_object(&self) -> Option<&RedfishObject> {
        match self {
            RedfishVariant::Object(object) => Some(object),
            RedfishVariant::Collection(collection) => collection.object(),
            _ => None,
        }
    }

    pub fn as_collection(&self) -> Option<&RedfishCollection> {
        match self {
            RedfishVariant::Collection(collection) => Some(collection),
            _ => None,
        }
    }

    pub fn as_scalar(&self) -> Option<&Value> {
        match self {
            RedfishVariant::Scalar(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, RedfishVariant::Null)
    }

    /// Navigate to a property. Non-objects have no properties and resolve
    /// to [`RedfishVariant::Null`].
    pub async fn get(&self, name: &str) -> RedfishResult<RedfishVariant> {
        match self.as_object() {
            Some(object) => object.get(name).await,
            None => Ok(RedfishVariant::Null),
        }
    }
}

/// A resource object with a backpointer to the cache it was fetched
/// through, so navigation can issue further lookups.
#[derive(Clone)]
pub struct RedfishObject {
    payload: Map<String, Value>,
    uri: Option<String>,
    fresh: bool,
    cache: Arc<TimeBasedCache>,
}

impl RedfishObject {
    /// URI this object was resolved from; nested objects carry a
    /// `#/`-pointer suffix.
    pub fn uri(&self) -> Option<&str> {
        self.uri.as_deref()
    }

    /// The resource's canonical `@odata.id`, when present.
    pub fn odata_id(&self) -> Option<&str> {
        self.payload.get(ODATA_ID).and_then(Value::as_str)
    }

    pub fn payload(&self) -> &Map<String, Value> {
        &self.payload
    }

    /// Whether this payload came from a live fetch rather than the cache.
    pub fn is_fresh(&self) -> bool {
        self.fresh
    }

    /// Navigate to a property.
    ///
    /// A bare `{"@odata.id": ...}` value is a reference and is followed
    /// through with a cached GET. Inline values resolve in place under a
    /// fragment URI.
    pub async fn get(&self, name: &str) -> RedfishResult<RedfishVariant> {
        let Some(value) = self.payload.get(name) else {
            return Ok(RedfishVariant::Null);
        };
        resolve_child(
            value,
            fragment_child(self.uri.as_deref(), name),
            self.fresh,
            &self.cache,
        )
        .await
    }

    /// Enumerate `(name, value)` pairs of the inline payload in document
    /// order, honoring the callback's [`IterControl`].
    pub fn for_each_property<F>(&self, mut f: F)
    where
        F: FnMut(&str, &Value) -> IterControl,
    {
        for (name, value) in &self.payload {
            if f(name, value) == IterControl::Stop {
                break;
            }
        }
    }

    /// Return a payload known to reflect the backend within the cache age.
    ///
    /// A payload that came from a live fetch is returned as-is with no
    /// I/O; a cache-served payload is re-fetched through its `@odata.id`
    /// without touching the cache.
    pub async fn ensure_fresh(&self) -> RedfishResult<RedfishObject> {
        if self.fresh {
            return Ok(self.clone());
        }
        let target = self.odata_id().ok_or(RedfishError::NoOdataId)?;
        let fetched = self.cache.uncached_get(target).await?;
        let variant =
            variant_from_value(fetched.body, Some(target.to_string()), true, &self.cache);
        match variant.as_object() {
            Some(object) => Ok(object.clone()),
            None => Err(RedfishError::NotAnObject(target.to_string())),
        }
    }
}

/// An ordered, finite sequence of members.
///
/// Backed either by a collection resource (`Members` references resolved
/// lazily by index) or by an inline JSON array.
#[derive(Clone)]
pub struct RedfishCollection {
    object: Option<RedfishObject>,
    members: Vec<Value>,
    count: usize,
    uri: Option<String>,
    fresh: bool,
    cache: Arc<TimeBasedCache>,
}

impl RedfishCollection {
    /// Member count as reported by `Members@odata.count`, falling back to
    /// the member array length.
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Backing resource object for collection resources; `None` for
    /// inline arrays.
    pub fn object(&self) -> Option<&RedfishObject> {
        self.object.as_ref()
    }

    /// Resolve the member at `index`; out-of-range indices resolve to
    /// [`RedfishVariant::Null`].
    pub async fn member(&self, index: usize) -> RedfishResult<RedfishVariant> {
        let Some(value) = self.members.get(index) else {
            return Ok(RedfishVariant::Null);
        };
        resolve_child(
            value,
            fragment_child(self.uri.as_deref(), &index.to_string()),
            self.fresh,
            &self.cache,
        )
        .await
    }
}

/// Wrap a JSON value into the variant sum.
pub(crate) fn variant_from_value(
    value: Value,
    uri: Option<String>,
    fresh: bool,
    cache: &Arc<TimeBasedCache>,
) -> RedfishVariant {
    match value {
        Value::Null => RedfishVariant::Null,
        Value::Object(payload) => {
            let members = payload.get(MEMBERS).and_then(Value::as_array).cloned();
            let object = RedfishObject {
                payload,
                uri: uri.clone(),
                fresh,
                cache: cache.clone(),
            };
            match members {
                Some(members) => {
                    let count = object
                        .payload
                        .get(MEMBERS_COUNT)
                        .and_then(Value::as_u64)
                        .map(|count| count as usize)
                        .unwrap_or(members.len());
                    RedfishVariant::Collection(RedfishCollection {
                        members,
                        count,
                        uri,
                        fresh,
                        cache: cache.clone(),
                        object: Some(object),
                    })
                }
                None => RedfishVariant::Object(object),
            }
        }
        Value::Array(members) => {
            let count = members.len();
            RedfishVariant::Collection(RedfishCollection {
                object: None,
                members,
                count,
                uri,
                fresh,
                cache: cache.clone(),
            })
        }
        scalar => RedfishVariant::Scalar(scalar),
    }
}

/// Resolve one child value: follow a bare reference through the cache,
/// wrap anything else in place.
async fn resolve_child(
    value: &Value,
    inline_uri: Option<String>,
    fresh: bool,
    cache: &Arc<TimeBasedCache>,
) -> RedfishResult<RedfishVariant> {
    if let Some(reference) = value.as_object() {
        if reference.len() == 1 {
            if let Some(target) = reference.get(ODATA_ID).and_then(Value::as_str) {
                let fetched = cache.cached_get(target).await?;
                return Ok(variant_from_value(
                    fetched.body,
                    Some(target.to_string()),
                    fetched.fresh,
                    cache,
                ));
            }
        }
    }
    Ok(variant_from_value(value.clone(), inline_uri, fresh, cache))
}

/// Fragment URI for an inline child: `/u#/A`, `/u#/A/0`, ...
fn fragment_child(parent: Option<&str>, key: &str) -> Option<String> {
    parent.map(|uri| {
        if uri.contains('#') {
            format!("{uri}/{key}")
        } else {
            format!("{uri}#/{key}")
        }
    })
}
