//! Domain-level errors (no external dependencies)

use thiserror::Error;

use crate::domain::stats::Level;

/// Domain errors represent invalid navigation through the hierarchy.
///
/// Aggregation itself never fails: malformed numbers and collections are
/// coalesced before arithmetic.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("unknown level: {0}")]
    UnknownLevel(String),

    #[error("no {level} with id '{id}' under the current selection")]
    UnknownNode { level: Level, id: String },

    #[error("{0} nodes carry no roll-up")]
    NotAggregated(Level),

    #[error("cannot select a {level} before selecting its {parent}")]
    MissingParent { level: Level, parent: Level },
}
