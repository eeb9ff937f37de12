use thiserror::Error;

/// Failure taxonomy for route/chain operations.
///
/// Mutations surface these after the enclosing store transaction has been
/// rolled back; no partial splice or cleanup is ever persisted.
#[derive(Debug, Error)]
pub enum ChainError {
    #[error("route {0} not found")]
    RouteNotFound(i64),

    #[error("schedule day {0} not found")]
    DayNotFound(i64),

    #[error("stop node {0} not found")]
    NodeNotFound(i64),

    #[error("invalid route payload: {0}")]
    Validation(String),

    /// Payload referenced stop ids absent from the stop catalog.
    #[error("unknown stop ids {0:?}")]
    UnknownStops(Vec<i64>),

    /// Graph corruption (cycle, dangling forward pointer) discovered while
    /// planning a mutation. Never auto-repaired: the operation aborts so the
    /// corruption cannot be silently papered over.
    #[error("chain invariant violated: {0}")]
    InvariantViolation(String),

    #[error("storage backend failure")]
    Storage(#[from] anyhow::Error),
}
