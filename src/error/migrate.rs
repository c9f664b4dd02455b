use crate::engine::version::{Capability, EngineVersion};
use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum MigrateError {
    /// No complete migration record is attached to the app. A record is complete once both the
    /// schema metadata and the database URI were provided.
    #[error(
        "No migration configuration is attached to the app. Check that `Migrate::init_app` was called with the schema metadata and a database URI."
    )]
    NotConfigured,

    /// The installed engine does not support the requested command or option.
    #[error(
        "Migration engine {required} or greater is required for `{capability}` (installed: {installed})"
    )]
    VersionTooOld {
        capability: Capability,
        required: EngineVersion,
        installed: EngineVersion,
    },

    #[error(transparent)]
    Other(#[from] Box<dyn Send + Sync + std::error::Error>),
}
