//! Projection of matched resources into flat rows.

use crate::query::result::{DataSetRow, RowValue};
use crate::query::{PropertyType, Subquery};
use crate::redfish::RedfishVariant;
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("variant is not a resource object")]
    NotAnObject,

    /// Properties were requested but none resolved on the payload.
    #[error("no requested properties resolved")]
    NoProperties,
}

pub type NormalizeResult<T> = Result<T, NormalizeError>;

/// Projects a Redfish resource through a subquery's property descriptors
/// into one row. Implementations must be pure and reentrant; the planner
/// treats them as opaque.
pub trait Normalize: Send + Sync {
    fn normalize(&self, variant: &RedfishVariant, subquery: &Subquery)
        -> NormalizeResult<DataSetRow>;
}

/// Default normalizer: dotted-path lookup over the inline payload with
/// per-descriptor type coercion.
#[derive(Debug, Default)]
pub struct PropertyNormalizer;

impl Normalize for PropertyNormalizer {
    fn normalize(
        &self,
        variant: &RedfishVariant,
        subquery: &Subquery,
    ) -> NormalizeResult<DataSetRow> {
        let object = variant.as_object().ok_or(NormalizeError::NotAnObject)?;
        let mut row = DataSetRow::default();
        for descriptor in &subquery.properties {
            let Some(value) = resolve_property(object.payload(), &descriptor.property) else {
                continue;
            };
            if let Some(value) = coerce(value, descriptor.property_type) {
                row.values.push(RowValue {
                    name: descriptor.output_name().to_string(),
                    value,
                });
            }
        }
        if !subquery.properties.is_empty() && row.values.is_empty() {
            return Err(NormalizeError::NoProperties);
        }
        Ok(row)
    }
}

/// Walk a dotted property path through nested inline objects.
/// `Status.State` resolves `payload["Status"]["State"]`.
fn resolve_property<'a>(payload: &'a Map<String, Value>, path: &str) -> Option<&'a Value> {
    let mut node_names = path.split('.');
    let mut current = payload.get(node_names.next()?)?;
    for name in node_names {
        current = current.as_object()?.get(name)?;
    }
    Some(current)
}

fn coerce(value: &Value, property_type: PropertyType) -> Option<Value> {
    match property_type {
        PropertyType::Auto => Some(value.clone()),
        PropertyType::String => value.as_str().map(Value::from),
        PropertyType::Integer => value.as_i64().map(Value::from),
        PropertyType::Double => value.as_f64().map(Value::from),
        PropertyType::Boolean => value.as_bool().map(Value::from),
    }
}
