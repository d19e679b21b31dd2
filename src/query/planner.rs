//! Multi-subquery traversal with per-node deduplication.
//!
//! Each subquery compiles into a [`SubqueryHandle`], a cheap cursor over
//! its location steps. One recursive walk serves every handle at once:
//! at each level the handles are grouped by the node they need next, so
//! subqueries sharing a path prefix share a single fetch. Together with
//! the URI-keyed cache below, a bundled query costs the union of its
//! paths, not the sum.

use crate::clock::Clock;
use crate::query::normalize::Normalize;
use crate::query::path::{parse_redpath, Step};
use crate::query::result::QueryResult;
use crate::query::{Query, Subquery};
use crate::redfish::RedfishVariant;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error};

/// Outcome of applying a handle's current predicate to a variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOutcome {
    /// Predicate matched an intermediate step; the cursor advanced.
    Continue,
    /// Predicate rejected the variant; the branch is dead.
    EndByPredicate,
    /// Predicate matched the final step; the variant is a match.
    EndOfRedpath,
}

/// Cursor pairing one subquery with its position in the compiled path.
///
/// Cloning is cheap (the step sequence is shared and immutable) and gives
/// each fan-out branch over collection members an independent cursor.
#[derive(Clone)]
pub struct SubqueryHandle {
    subquery: Arc<Subquery>,
    steps: Arc<[Step]>,
    cursor: usize,
}

impl SubqueryHandle {
    /// Compile a subquery's RedPath. A subquery that fails to compile, or
    /// compiles to zero steps, is discarded with a diagnostic.
    fn compile(subquery: &Subquery) -> Option<Self> {
        match parse_redpath(&subquery.redpath) {
            Ok(steps) => Some(Self {
                subquery: Arc::new(subquery.clone()),
                steps: steps.into(),
                cursor: 0,
            }),
            Err(err) => {
                error!(
                    subquery_id = %subquery.subquery_id,
                    redpath = %subquery.redpath,
                    %err,
                    "discarding subquery"
                );
                None
            }
        }
    }

    pub fn subquery(&self) -> &Subquery {
        &self.subquery
    }

    /// Node name the cursor points at. Repeatable; never advances.
    pub fn next_node(&self) -> Option<&str> {
        self.steps.get(self.cursor).map(|step| step.node_name.as_str())
    }

    /// Apply the current step's predicate and advance on an intermediate
    /// match.
    pub fn filter(&mut self, variant: &RedfishVariant) -> FilterOutcome {
        let Some(step) = self.steps.get(self.cursor) else {
            return FilterOutcome::EndByPredicate;
        };
        if !step.predicate.matches(variant) {
            return FilterOutcome::EndByPredicate;
        }
        if self.cursor + 1 == self.steps.len() {
            return FilterOutcome::EndOfRedpath;
        }
        self.cursor += 1;
        FilterOutcome::Continue
    }
}

/// Compiled traversal plan for one query.
pub struct QueryPlanner {
    query_id: String,
    handles: Vec<SubqueryHandle>,
    normalizer: Arc<dyn Normalize>,
}

impl QueryPlanner {
    pub fn new(query: &Query, normalizer: Arc<dyn Normalize>) -> Self {
        let handles = query
            .subquery
            .iter()
            .filter_map(SubqueryHandle::compile)
            .collect();
        Self {
            query_id: query.query_id.clone(),
            handles,
            normalizer,
        }
    }

    pub fn query_id(&self) -> &str {
        &self.query_id
    }

    /// Walk the tree from the service root and assemble the result.
    ///
    /// The root itself is never qualified; traversal starts by seeking
    /// each handle's first node off the root. Branch-local failures are
    /// logged and dropped, so `run` always returns a populated result.
    pub async fn run(&self, root: &RedfishVariant, clock: &dyn Clock) -> QueryResult {
        let mut result = QueryResult {
            query_ids: vec![self.query_id.clone()],
            start_timestamp: Some(clock.now().into()),
            ..Default::default()
        };
        self.run_recursive(root, self.handles.clone(), &mut result)
            .await;
        result.end_timestamp = Some(clock.now().into());
        result
    }

    fn run_recursive<'a>(
        &'a self,
        variant: &'a RedfishVariant,
        handles: Vec<SubqueryHandle>,
        result: &'a mut QueryResult,
    ) -> BoxFuture<'a, ()> {
        async move {
            let node_to_handles = deduplicate_by_next_node(handles);
            if node_to_handles.is_empty() {
                return;
            }
            self.dispatch(variant, node_to_handles, result).await;
        }
        .boxed()
    }

    /// Fetch each unique next node once and qualify the handles that
    /// asked for it.
    async fn dispatch(
        &self,
        variant: &RedfishVariant,
        node_to_handles: HashMap<String, Vec<SubqueryHandle>>,
        result: &mut QueryResult,
    ) {
        for (node_name, handles) in node_to_handles {
            let child = match variant.get(&node_name).await {
                Ok(child) => child,
                Err(err) => {
                    debug!(node = %node_name, %err, "fetch failed, dropping branch");
                    continue;
                }
            };
            match child {
                RedfishVariant::Collection(collection) => {
                    for index in 0..collection.len() {
                        match collection.member(index).await {
                            Ok(member) => {
                                self.qualify_each_subquery(&member, handles.clone(), result)
                                    .await;
                            }
                            Err(err) => {
                                debug!(node = %node_name, index, %err, "member fetch failed, dropping branch");
                            }
                        }
                    }
                }
                RedfishVariant::Object(_) => {
                    self.qualify_each_subquery(&child, handles, result).await;
                }
                RedfishVariant::Scalar(_) => {
                    debug!(node = %node_name, "step resolves to a scalar, skipping");
                }
                RedfishVariant::Null => {}
            }
        }
    }

    /// Partition handles by filter outcome: matches are normalized into
    /// rows, survivors recurse, rejections die.
    async fn qualify_each_subquery(
        &self,
        variant: &RedfishVariant,
        handles: Vec<SubqueryHandle>,
        result: &mut QueryResult,
    ) {
        let mut qualified = Vec::new();
        for mut handle in handles {
            match handle.filter(variant) {
                FilterOutcome::EndOfRedpath => {
                    match self.normalizer.normalize(variant, handle.subquery()) {
                        Ok(row) => result.add_row(&handle.subquery().subquery_id, row),
                        Err(err) => {
                            debug!(
                                subquery_id = %handle.subquery().subquery_id,
                                %err,
                                "normalization failed, row omitted"
                            );
                        }
                    }
                }
                FilterOutcome::Continue => qualified.push(handle),
                FilterOutcome::EndByPredicate => {}
            }
        }
        if qualified.is_empty() {
            return;
        }
        self.run_recursive(variant, qualified, result).await;
    }
}

/// Group live handles by the node each one needs next. Handles with no
/// next node are dropped.
fn deduplicate_by_next_node(
    handles: Vec<SubqueryHandle>,
) -> HashMap<String, Vec<SubqueryHandle>> {
    let mut node_to_handles: HashMap<String, Vec<SubqueryHandle>> = HashMap::new();
    for handle in handles {
        let Some(node_name) = handle.next_node().map(str::to_string) else {
            continue;
        };
        node_to_handles.entry(node_name).or_default().push(handle);
    }
    node_to_handles
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FakeClock;
    use crate::query::normalize::PropertyNormalizer;
    use crate::query::{PropertyDescriptor, PropertyType};
    use crate::redfish::RedfishInterface;
    use crate::transport::MockTransport;
    use serde_json::json;
    use std::time::{Duration, UNIX_EPOCH};

    fn subquery(id: &str, redpath: &str) -> Subquery {
        Subquery {
            subquery_id: id.to_string(),
            redpath: redpath.to_string(),
            properties: vec![PropertyDescriptor {
                property: "Name".to_string(),
                name: None,
                property_type: PropertyType::String,
            }],
        }
    }

    fn planner_for(subqueries: Vec<Subquery>) -> QueryPlanner {
        QueryPlanner::new(
            &Query {
                query_id: "Q".to_string(),
                subquery: subqueries,
            },
            Arc::new(PropertyNormalizer),
        )
    }

    async fn null_variant() -> RedfishVariant {
        let transport = Arc::new(MockTransport::new());
        transport.add_resource("/null", json!(null));
        let interface = RedfishInterface::new(
            transport,
            Arc::new(FakeClock::new(UNIX_EPOCH)),
            Duration::from_secs(60),
        );
        interface.cached_get_uri("/null").await.unwrap()
    }

    #[test]
    fn test_compile_discards_malformed_subqueries() {
        let planner = planner_for(vec![
            subquery("good", "/Chassis[*]"),
            subquery("bad", "/Chassis"),
            subquery("unknown", "/Chassis[Id=1]"),
            subquery("empty", "/"),
        ]);
        assert_eq!(planner.handles.len(), 1);
        assert_eq!(planner.handles[0].subquery().subquery_id, "good");
    }

    #[tokio::test]
    async fn test_handle_cursor_walks_the_path() {
        let variant = null_variant().await;
        let planner = planner_for(vec![subquery("sq", "/A[*]/B[*]")]);
        let mut handle = planner.handles[0].clone();

        assert_eq!(handle.next_node(), Some("A"));
        // next_node is repeatable and never advances.
        assert_eq!(handle.next_node(), Some("A"));

        assert_eq!(handle.filter(&variant), FilterOutcome::Continue);
        assert_eq!(handle.next_node(), Some("B"));
        assert_eq!(handle.filter(&variant), FilterOutcome::EndOfRedpath);
        // A terminal match leaves the cursor in place.
        assert_eq!(handle.next_node(), Some("B"));
    }

    #[tokio::test]
    async fn test_cloned_handles_advance_independently() {
        let variant = null_variant().await;
        let planner = planner_for(vec![subquery("sq", "/A[*]/B[*]")]);
        let mut original = planner.handles[0].clone();
        let branch = original.clone();

        original.filter(&variant);
        assert_eq!(original.next_node(), Some("B"));
        assert_eq!(branch.next_node(), Some("A"));
    }

    #[test]
    fn test_deduplicate_groups_by_next_node() {
        let planner = planner_for(vec![
            subquery("t", "/Chassis[*]/Thermal[*]/Temperatures[*]"),
            subquery("f", "/Chassis[*]/Thermal[*]/Fans[*]"),
            subquery("s", "/Systems[*]"),
        ]);
        let groups = deduplicate_by_next_node(planner.handles.clone());
        assert_eq!(groups.len(), 2);
        assert_eq!(groups["Chassis"].len(), 2);
        assert_eq!(groups["Systems"].len(), 1);
    }
}
