pub mod engine;
pub mod migrate;
pub mod mutex;
pub mod other;
pub mod tracing;

use crate::app::extension::ExtensionRegistryError;
use crate::error::engine::EngineError;
use crate::error::migrate::MigrateError;
use crate::error::mutex::MutexError;
use crate::error::other::OtherError;
use crate::error::tracing::TracingError;
use std::convert::Infallible;
use thiserror::Error;

pub type MigrateResult<T> = Result<T, Error>;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Migrate(#[from] MigrateError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[cfg(feature = "cli")]
    #[error(transparent)]
    Clap(#[from] clap::error::Error),

    #[error(transparent)]
    Config(#[from] config::ConfigError),

    #[error(transparent)]
    Validation(#[from] validator::ValidationErrors),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Tracing(#[from] TracingError),

    #[error(transparent)]
    ExtensionRegistry(#[from] ExtensionRegistryError),

    #[error(transparent)]
    Mutex(#[from] MutexError),

    #[error(transparent)]
    Infallible(#[from] Infallible),

    #[error(transparent)]
    Other(#[from] OtherError),
}

impl Error {
    /// Whether the error is one of the known conditions that the command boundary reports and
    /// turns into a non-zero exit code, rather than propagating.
    pub fn is_reportable(&self) -> bool {
        match self {
            Error::Migrate(err) => matches!(
                err,
                MigrateError::NotConfigured | MigrateError::VersionTooOld { .. }
            ),
            Error::Engine(err) => matches!(err, EngineError::Command(_) | EngineError::Runtime(_)),
            _ => false,
        }
    }
}
