//! The seam between this crate and the wrapped schema-migration engine.
//!
//! Schema diffing, revision script generation, revision graph resolution and DDL execution are
//! all owned by the engine. This crate only builds an [`EngineConfig`] for each command and
//! forwards the command arguments to a [`MigrationEngine`] implementation.

use crate::engine::args::{
    BranchesArgs, CurrentArgs, DowngradeArgs, HeadsArgs, HistoryArgs, MergeArgs, RevisionArgs,
    StampArgs, UpgradeArgs,
};
use crate::engine::version::EngineVersion;
use crate::error::engine::EngineResult;
use serde_derive::Serialize;
use serde_json::Value;
use std::any::Any;
use std::collections::BTreeMap;
use std::fmt::Debug;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use url::Url;

pub mod args;
pub mod version;

pub use crate::error::engine::EngineError;

/// Name of the main option that points the engine at the script directory.
pub const SCRIPT_LOCATION: &str = "script_location";

/// Name of the command option that asks the engine to autogenerate revision contents.
pub const AUTOGENERATE: &str = "autogenerate";

/// The declarative schema metadata produced by the app's ORM layer. The engine compares it with
/// the live database schema when autogenerating revisions.
///
/// The metadata is shared with the engine, not copied. Engines that need the concrete type can
/// downcast via [`SchemaMetadata::as_any`].
pub trait SchemaMetadata: Debug + Send + Sync + 'static {
    /// Names of the tables declared by the model.
    fn table_names(&self) -> Vec<String>;

    fn as_any(&self) -> &dyn Any;
}

/// Command-level options handed to the engine alongside the main options. Mirrors the generic
/// pass-through mechanism of the engine's own CLI: boolean flags toggled by name plus the
/// `x` list of free-form arguments consumed by custom environment scripts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[non_exhaustive]
pub struct CommandOptions {
    flags: BTreeMap<String, bool>,
    pub x: Option<Vec<String>>,
}

impl CommandOptions {
    pub fn set_flag(&mut self, name: impl Into<String>) {
        self.flags.insert(name.into(), true);
    }

    /// Whether the flag was set. Unknown flags are `false`.
    pub fn flag(&self, name: &str) -> bool {
        self.flags.get(name).copied().unwrap_or_default()
    }

    pub fn flags(&self) -> impl Iterator<Item = &str> {
        self.flags
            .iter()
            .filter(|(_, enabled)| **enabled)
            .map(|(name, _)| name.as_str())
    }
}

/// The engine-native configuration object. A fresh instance is built for every command by the
/// [`ConfigBuilder`][crate::migrate::builder::ConfigBuilder] and then run through the app's
/// [`ConfigPipeline`][crate::migrate::pipeline::ConfigPipeline].
#[derive(Debug, Clone, Default)]
#[non_exhaustive]
pub struct EngineConfig {
    /// Path of the engine's settings file, `<directory>/alembic.ini` by default.
    pub config_file_name: Option<PathBuf>,
    main_options: BTreeMap<String, String>,
    /// `None` for `init`, which runs before any command options exist.
    pub cmd_opts: Option<CommandOptions>,
    /// Directory holding the script templates used by `init`.
    pub template_directory: Option<PathBuf>,
    pub database_uri: Option<Url>,
    pub binds: BTreeMap<String, Url>,
    pub metadata: Option<Arc<dyn SchemaMetadata>>,
    /// Free-form options forwarded to the engine's environment, e.g. `compare_type = true`.
    pub options: BTreeMap<String, Value>,
}

impl EngineConfig {
    pub fn new(config_file_name: Option<PathBuf>) -> Self {
        Self {
            config_file_name,
            ..Default::default()
        }
    }

    pub fn set_main_option(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.main_options.insert(name.into(), value.into());
    }

    pub fn main_option(&self, name: &str) -> Option<&str> {
        self.main_options.get(name).map(String::as_str)
    }

    pub fn script_location(&self) -> Option<&str> {
        self.main_option(SCRIPT_LOCATION)
    }

    /// Get the command options, creating them if they don't exist yet.
    pub fn cmd_opts_mut(&mut self) -> &mut CommandOptions {
        self.cmd_opts.get_or_insert_with(Default::default)
    }
}

/// Metadata is compared by identity; everything else by value.
impl PartialEq for EngineConfig {
    fn eq(&self, other: &Self) -> bool {
        let metadata_eq = match (&self.metadata, &other.metadata) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        };
        metadata_eq
            && self.config_file_name == other.config_file_name
            && self.main_options == other.main_options
            && self.cmd_opts == other.cmd_opts
            && self.template_directory == other.template_directory
            && self.database_uri == other.database_uri
            && self.binds == other.binds
            && self.options == other.options
    }
}

/// The migration commands of the wrapped engine.
///
/// Implementations are expected to be thin adapters over an existing engine; every method
/// receives the fully built [`EngineConfig`] and the command arguments as given by the user.
/// Return [`EngineError::Command`] or [`EngineError::Runtime`] for expected failures so they are
/// reported as a non-zero exit code instead of propagating.
#[cfg_attr(any(test, feature = "testing-mocks"), mockall::automock)]
pub trait MigrationEngine: Send + Sync {
    /// The installed engine version. Queried once per
    /// [`Dispatcher`][crate::command::Dispatcher] to negotiate capabilities.
    fn version(&self) -> EngineVersion;

    /// Create a new script directory from the given template.
    fn init(&self, config: &EngineConfig, directory: &Path, template: &str) -> EngineResult<()>;

    /// Create a new revision file.
    fn revision(&self, config: &EngineConfig, args: &RevisionArgs) -> EngineResult<()>;

    /// Edit a revision file.
    fn edit(&self, config: &EngineConfig, revision: &str) -> EngineResult<()>;

    /// Merge two or more revisions together, creating a new revision file.
    fn merge(&self, config: &EngineConfig, args: &MergeArgs) -> EngineResult<()>;

    /// Upgrade to a later version.
    fn upgrade(&self, config: &EngineConfig, args: &UpgradeArgs) -> EngineResult<()>;

    /// Revert to a previous version.
    fn downgrade(&self, config: &EngineConfig, args: &DowngradeArgs) -> EngineResult<()>;

    /// Show the revision denoted by the given symbol.
    fn show(&self, config: &EngineConfig, revision: &str) -> EngineResult<()>;

    /// List changeset scripts in chronological order.
    fn history(&self, config: &EngineConfig, args: &HistoryArgs) -> EngineResult<()>;

    /// Show current available heads in the script directory.
    fn heads(&self, config: &EngineConfig, args: &HeadsArgs) -> EngineResult<()>;

    /// Show current branch points.
    fn branches(&self, config: &EngineConfig, args: &BranchesArgs) -> EngineResult<()>;

    /// Display the current revision for each database.
    fn current(&self, config: &EngineConfig, args: &CurrentArgs) -> EngineResult<()>;

    /// Stamp the revision table with the given revision without running any migrations.
    fn stamp(&self, config: &EngineConfig, args: &StampArgs) -> EngineResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg_attr(coverage_nightly, coverage(off))]
    fn command_options_flags() {
        let mut opts = CommandOptions::default();
        assert!(!opts.flag(AUTOGENERATE));

        opts.set_flag(AUTOGENERATE);

        assert!(opts.flag(AUTOGENERATE));
        assert!(!opts.flag("sql"));
        assert_eq!(opts.flags().collect::<Vec<_>>(), vec![AUTOGENERATE]);
    }

    #[test]
    #[cfg_attr(coverage_nightly, coverage(off))]
    fn main_options() {
        let mut config = EngineConfig::new(Some(PathBuf::from("migrations/alembic.ini")));
        assert_eq!(config.script_location(), None);

        config.set_main_option(SCRIPT_LOCATION, "migrations");

        assert_eq!(config.script_location(), Some("migrations"));
        assert_eq!(config.main_option("sqlalchemy.url"), None);
    }

    #[test]
    #[cfg_attr(coverage_nightly, coverage(off))]
    fn cmd_opts_mut_creates_options() {
        let mut config = EngineConfig::default();
        assert!(config.cmd_opts.is_none());

        config.cmd_opts_mut().x = Some(vec!["a".to_owned()]);

        assert_eq!(
            config.cmd_opts,
            Some(CommandOptions {
                flags: Default::default(),
                x: Some(vec!["a".to_owned()]),
            })
        );
    }
}
