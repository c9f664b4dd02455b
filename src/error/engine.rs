use thiserror::Error;

pub type EngineResult<T> = Result<T, EngineError>;

/// Errors surfaced by a [`MigrationEngine`][crate::engine::MigrationEngine].
///
/// Only [`EngineError::Command`] and [`EngineError::Runtime`] are treated as expected failures by
/// the command boundary; they are logged and turned into a non-zero exit code. Anything wrapped
/// in [`EngineError::Other`] propagates to the caller unchanged.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EngineError {
    /// The engine rejected the command, e.g. an ambiguous revision or a missing script directory.
    #[error("{0}")]
    Command(String),

    /// The engine failed while running the command, e.g. a DDL statement failed.
    #[error("{0}")]
    Runtime(String),

    #[error(transparent)]
    Other(#[from] Box<dyn Send + Sync + std::error::Error>),
}
