//! Query engine façade: one compiled plan per query id.

use crate::clock::Clock;
use crate::query::normalize::Normalize;
use crate::query::planner::QueryPlanner;
use crate::query::result::QueryResult;
use crate::query::Query;
use crate::redfish::RedfishInterface;
use crate::transport::RedfishTransport;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::error;

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Maximum age a cached GET may be served at.
    pub cache_max_age: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cache_max_age: Duration::from_secs(60),
        }
    }
}

/// Compiles a set of queries up front and executes them on demand over a
/// shared interface and cache.
pub struct QueryEngine {
    interface: RedfishInterface,
    clock: Arc<dyn Clock>,
    planners: HashMap<String, QueryPlanner>,
}

impl QueryEngine {
    /// Build plans for every query. On duplicate query ids the first
    /// query wins; a query whose subqueries all fail to compile still
    /// gets a plan that yields an empty result.
    pub fn new(
        config: EngineConfig,
        queries: impl IntoIterator<Item = Query>,
        transport: Arc<dyn RedfishTransport>,
        normalizer: Arc<dyn Normalize>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let interface = RedfishInterface::new(transport, clock.clone(), config.cache_max_age);
        let mut planners = HashMap::new();
        for query in queries {
            if planners.contains_key(&query.query_id) {
                continue;
            }
            let planner = QueryPlanner::new(&query, normalizer.clone());
            planners.insert(query.query_id.clone(), planner);
        }
        Self {
            interface,
            clock,
            planners,
        }
    }

    pub fn interface(&self) -> &RedfishInterface {
        &self.interface
    }

    /// Run the plans for the given ids in order. Ids without a plan are
    /// logged and skipped; a query that cannot resolve the service root
    /// yields an empty result rather than an error.
    pub async fn execute(&self, query_ids: &[&str]) -> Vec<QueryResult> {
        let mut results = Vec::new();
        for query_id in query_ids {
            let Some(planner) = self.planners.get(*query_id) else {
                error!(query_id = %query_id, "no query plan for id");
                continue;
            };
            let root = match self.interface.get_root().await {
                Ok(root) => root,
                Err(err) => {
                    error!(query_id = %query_id, %err, "cannot resolve service root");
                    results.push(QueryResult {
                        query_ids: vec![query_id.to_string()],
                        ..Default::default()
                    });
                    continue;
                }
            };
            results.push(planner.run(&root, self.clock.as_ref()).await);
        }
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FakeClock;
    use crate::query::normalize::PropertyNormalizer;
    use crate::query::Subquery;
    use crate::transport::{MockTransport, NullTransport};
    use std::time::UNIX_EPOCH;

    fn query(query_id: &str, redpath: &str) -> Query {
        Query {
            query_id: query_id.to_string(),
            subquery: vec![Subquery {
                subquery_id: "sq".to_string(),
                redpath: redpath.to_string(),
                properties: Vec::new(),
            }],
        }
    }

    fn engine_over(transport: Arc<dyn RedfishTransport>, queries: Vec<Query>) -> QueryEngine {
        QueryEngine::new(
            EngineConfig::default(),
            queries,
            transport,
            Arc::new(PropertyNormalizer),
            Arc::new(FakeClock::new(UNIX_EPOCH)),
        )
    }

    #[tokio::test]
    async fn test_unknown_query_id_is_skipped() {
        let engine = engine_over(Arc::new(MockTransport::new()), vec![query("Q", "/A[*]")]);
        let results = engine.execute(&["Nope"]).await;
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_query_ids_first_wins() {
        let engine = engine_over(
            Arc::new(MockTransport::new()),
            vec![query("Q", "/A[*]"), query("Q", "/B[*]")],
        );
        assert_eq!(engine.planners.len(), 1);
    }

    #[tokio::test]
    async fn test_all_subqueries_discarded_still_yields_a_result() {
        let transport = Arc::new(MockTransport::new());
        transport.add_resource("/redfish/v1", serde_json::json!({"Id": "RootService"}));
        let engine = engine_over(transport, vec![query("Q", "/NoBrackets")]);

        let results = engine.execute(&["Q"]).await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].query_ids, vec!["Q".to_string()]);
        assert!(results[0].subquery_output_by_id.is_empty());
        assert!(results[0].start_timestamp.is_some());
        assert!(results[0].end_timestamp.is_some());
    }

    #[tokio::test]
    async fn test_unreachable_root_yields_empty_result() {
        let engine = engine_over(Arc::new(NullTransport), vec![query("Q", "/A[*]")]);
        let results = engine.execute(&["Q"]).await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].query_ids, vec!["Q".to_string()]);
        assert!(results[0].subquery_output_by_id.is_empty());
    }
}
