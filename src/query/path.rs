//! RedPath compilation.
//!
//! A RedPath is a slash-delimited sequence of location steps, each of the
//! form `NodeName[predicate]`. Compilation turns the expression into an
//! ordered step sequence; any malformed step fails the whole path.

use crate::redfish::RedfishVariant;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PathError {
    /// The step is not of the form `Node[predicate]`.
    #[error("malformed location step `{0}`")]
    MalformedStep(String),

    #[error("unknown predicate `{0}`")]
    UnknownPredicate(String),

    /// The expression contains no location steps.
    #[error("redpath has no location steps")]
    EmptyPath,
}

pub type PathResult<T> = Result<T, PathError>;

const PREDICATE_SELECT_ALL: &str = "*";

/// A filter applied to each candidate resource of a step.
///
/// Dispatch is a closed enum so richer predicates can be added without
/// touching the planner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// `[*]`: every candidate matches.
    SelectAll,
}

impl Predicate {
    pub fn matches(&self, _variant: &RedfishVariant) -> bool {
        match self {
            Predicate::SelectAll => true,
        }
    }
}

/// One compiled location step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub node_name: String,
    pub predicate: Predicate,
}

/// Compile a RedPath into its ordered location steps.
///
/// Empty segments are skipped, so `/A[*]/B[*]` and `A[*]/B[*]` compile
/// identically.
pub fn parse_redpath(redpath: &str) -> PathResult<Vec<Step>> {
    let mut steps = Vec::new();
    for segment in redpath.split('/').filter(|segment| !segment.is_empty()) {
        let (node_name, predicate_expr) = split_step(segment)?;
        let predicate = match predicate_expr {
            PREDICATE_SELECT_ALL => Predicate::SelectAll,
            unknown => return Err(PathError::UnknownPredicate(unknown.to_string())),
        };
        steps.push(Step {
            node_name: node_name.to_string(),
            predicate,
        });
    }
    if steps.is_empty() {
        return Err(PathError::EmptyPath);
    }
    Ok(steps)
}

/// Split a location step into node name and predicate expression.
fn split_step(step: &str) -> PathResult<(&str, &str)> {
    match (step.find('['), step.find(']')) {
        (Some(open), Some(close)) if open < close => {
            Ok((&step[..open], &step[open + 1..close]))
        }
        _ => Err(PathError::MalformedStep(step.to_string())),
    }
}
