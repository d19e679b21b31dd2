//! Assembly of normalized query output.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

/// Seconds and nanoseconds relative to the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp {
    pub secs: i64,
    pub nanos: u32,
}

impl From<SystemTime> for Timestamp {
    fn from(time: SystemTime) -> Self {
        match time.duration_since(UNIX_EPOCH) {
            Ok(since) => Timestamp {
                secs: since.as_secs() as i64,
                nanos: since.subsec_nanos(),
            },
            Err(before) => Timestamp {
                secs: -(before.duration().as_secs() as i64),
                nanos: before.duration().subsec_nanos(),
            },
        }
    }
}

/// One named value of a normalized row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowValue {
    pub name: String,
    pub value: Value,
}

/// One normalized match.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataSetRow {
    pub values: Vec<RowValue>,
}

/// All rows produced by one subquery, in traversal order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataSet {
    pub data_set: Vec<DataSetRow>,
}

/// Timestamped output of one query run, keyed by subquery id.
///
/// A subquery id that is absent from the map produced no rows; whether it
/// matched nothing or was discarded at compile time is not distinguished
/// here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryResult {
    pub query_ids: Vec<String>,
    pub start_timestamp: Option<Timestamp>,
    pub end_timestamp: Option<Timestamp>,
    pub subquery_output_by_id: HashMap<String, DataSet>,
}

impl QueryResult {
    pub fn add_row(&mut self, subquery_id: &str, row: DataSetRow) {
        self.subquery_output_by_id
            .entry(subquery_id.to_string())
            .or_default()
            .data_set
            .push(row);
    }

    /// Rows for a subquery, `None` when it produced no output.
    pub fn rows(&self, subquery_id: &str) -> Option<&[DataSetRow]> {
        self.subquery_output_by_id
            .get(subquery_id)
            .map(|set| set.data_set.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;

    #[test]
    fn test_timestamp_from_system_time() {
        let time = UNIX_EPOCH + Duration::new(1700000000, 42);
        let timestamp = Timestamp::from(time);
        assert_eq!(timestamp.secs, 1700000000);
        assert_eq!(timestamp.nanos, 42);
    }

    #[test]
    fn test_timestamp_ordering() {
        let earlier = Timestamp::from(UNIX_EPOCH + Duration::from_secs(1));
        let later = Timestamp::from(UNIX_EPOCH + Duration::from_secs(2));
        assert!(earlier <= later);
        assert!(earlier <= earlier);
    }

    #[test]
    fn test_rows_accumulate_per_subquery() {
        let mut result = QueryResult::default();
        assert!(result.rows("sq1").is_none());

        result.add_row(
            "sq1",
            DataSetRow {
                values: vec![RowValue {
                    name: "Name".to_string(),
                    value: json!("chassis"),
                }],
            },
        );
        result.add_row("sq1", DataSetRow::default());

        assert_eq!(result.rows("sq1").unwrap().len(), 2);
        assert!(result.rows("sq2").is_none());
    }
}
