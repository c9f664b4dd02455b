//! Dispatch of the migration commands to the [`MigrationEngine`].
//!
//! Every command follows the same steps: recover the app's [`MigrationState`], check that the
//! installed engine supports the command, check that the script directory exists (except for
//! `init`), build a fresh [`EngineConfig`][crate::engine::EngineConfig] and call the engine.

use crate::app::ExtensionHost;
use crate::engine::args::{
    BranchesArgs, CurrentArgs, DowngradeArgs, HeadsArgs, HistoryArgs, MergeArgs, ONE_STEP_BACK,
    RevisionArgs, StampArgs, UpgradeArgs,
};
use crate::engine::version::{Capabilities, Capability};
use crate::engine::{AUTOGENERATE, EngineError, MigrationEngine};
use crate::error::MigrateResult;
use crate::error::migrate::MigrateError;
use crate::migrate::MigrationState;
use crate::migrate::builder::{ConfigBuilder, ExtraArgs};
use std::path::Path;
use std::process::ExitCode;
use tracing::{error, instrument, warn};

/// Revision targeted by `downgrade --sql` when no revision is given. Offline SQL generation
/// needs an explicit starting point.
pub const OFFLINE_ONE_STEP_BACK: &str = "head:-1";

/// Result of running a command at the command boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    Success,
    /// The command failed with a known error that was already reported.
    Failed,
}

impl From<CommandOutcome> for ExitCode {
    fn from(value: CommandOutcome) -> Self {
        match value {
            CommandOutcome::Success => ExitCode::SUCCESS,
            CommandOutcome::Failed => ExitCode::FAILURE,
        }
    }
}

/// Run a command, reporting the known command errors instead of returning them.
///
/// Engine command and runtime errors, [`MigrateError::VersionTooOld`] and
/// [`MigrateError::NotConfigured`] are logged as `Error: <message>` and result in
/// [`CommandOutcome::Failed`]. Any other error is returned unchanged.
pub fn catch_errors<F>(command: F) -> MigrateResult<CommandOutcome>
where
    F: FnOnce() -> MigrateResult<()>,
{
    match command() {
        Ok(()) => Ok(CommandOutcome::Success),
        Err(err) if err.is_reportable() => {
            error!("Error: {err}");
            Ok(CommandOutcome::Failed)
        }
        Err(err) => Err(err),
    }
}

/// Runs the migration commands for a single app against an engine.
pub struct Dispatcher<'a> {
    state: Option<&'a MigrationState>,
    engine: &'a dyn MigrationEngine,
    capabilities: Capabilities,
}

impl<'a> Dispatcher<'a> {
    pub fn new<H>(app: &'a H, engine: &'a dyn MigrationEngine) -> Self
    where
        H: ExtensionHost + ?Sized,
    {
        Self {
            state: MigrationState::from_app(app).ok(),
            engine,
            capabilities: Capabilities::negotiate(engine.version()),
        }
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    fn state(&self) -> MigrateResult<&'a MigrationState> {
        self.state
            .ok_or_else(|| MigrateError::NotConfigured.into())
    }

    fn builder(&self) -> MigrateResult<ConfigBuilder<'a>> {
        Ok(ConfigBuilder::new(self.state()?))
    }

    /// Fail the same way the engine does when the script directory is missing.
    fn check_directory(&self, builder: &ConfigBuilder, directory: Option<&Path>) -> MigrateResult<()> {
        let directory = builder.resolve_directory(directory);
        if directory.is_dir() {
            return Ok(());
        }
        Err(EngineError::Command(format!(
            "Path doesn't exist: '{}'.  Please use the 'init' command to create a new scripts folder.",
            directory.display()
        ))
        .into())
    }

    /// Create a new script directory.
    #[instrument(skip(self))]
    pub fn init(&self, directory: Option<&Path>, template: Option<&str>) -> MigrateResult<()> {
        let builder = self.builder()?;
        let state = self.state()?;
        let config = builder.build_for_init(directory)?;
        let directory = builder.resolve_directory(directory);
        let template = template.unwrap_or_else(|| state.template());
        self.engine.init(&config, &directory, template)?;
        Ok(())
    }

    /// Create a new revision file.
    #[instrument(skip(self))]
    pub fn revision(&self, directory: Option<&Path>, args: &RevisionArgs) -> MigrateResult<()> {
        let builder = self.builder()?;
        if args.uses_branching() {
            self.capabilities.require(Capability::BranchedRevisions)?;
        }
        self.check_directory(&builder, directory)?;
        let config = builder.build(directory, None, &[])?;
        self.engine.revision(&config, args)?;
        Ok(())
    }

    /// `revision` with autogenerate forced on.
    #[instrument(skip(self))]
    pub fn migrate(
        &self,
        directory: Option<&Path>,
        args: &RevisionArgs,
        x_args: Option<ExtraArgs>,
    ) -> MigrateResult<()> {
        let builder = self.builder()?;
        if args.uses_branching() {
            self.capabilities.require(Capability::BranchedRevisions)?;
        }
        self.check_directory(&builder, directory)?;
        let config = builder.build(directory, x_args, &[AUTOGENERATE])?;
        let args = RevisionArgs {
            autogenerate: true,
            ..args.clone()
        };
        self.engine.revision(&config, &args)?;
        Ok(())
    }

    /// Edit a revision file.
    #[instrument(skip(self))]
    pub fn edit(&self, directory: Option<&Path>, revision: &str) -> MigrateResult<()> {
        let builder = self.builder()?;
        self.capabilities.require(Capability::Edit)?;
        self.check_directory(&builder, directory)?;
        let config = builder.build(directory, None, &[])?;
        self.engine.edit(&config, revision)?;
        Ok(())
    }

    /// Merge two or more revisions together.
    #[instrument(skip(self))]
    pub fn merge(&self, directory: Option<&Path>, args: &MergeArgs) -> MigrateResult<()> {
        let builder = self.builder()?;
        self.capabilities.require(Capability::Merge)?;
        self.check_directory(&builder, directory)?;
        let config = builder.build(directory, None, &[])?;
        self.engine.merge(&config, args)?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub fn upgrade(
        &self,
        directory: Option<&Path>,
        args: &UpgradeArgs,
        x_args: Option<ExtraArgs>,
    ) -> MigrateResult<()> {
        let builder = self.builder()?;
        self.check_directory(&builder, directory)?;
        let config = builder.build(directory, x_args, &[])?;
        self.engine.upgrade(&config, args)?;
        Ok(())
    }

    /// Revert to a previous version. In offline (`sql`) mode, the default `-1` revision is
    /// rewritten to `head:-1`.
    #[instrument(skip(self))]
    pub fn downgrade(
        &self,
        directory: Option<&Path>,
        args: &DowngradeArgs,
        x_args: Option<ExtraArgs>,
    ) -> MigrateResult<()> {
        let builder = self.builder()?;
        self.check_directory(&builder, directory)?;
        let config = builder.build(directory, x_args, &[])?;
        if args.sql && args.revision == ONE_STEP_BACK {
            let args = DowngradeArgs {
                revision: OFFLINE_ONE_STEP_BACK.to_owned(),
                ..args.clone()
            };
            self.engine.downgrade(&config, &args)?;
        } else {
            self.engine.downgrade(&config, args)?;
        }
        Ok(())
    }

    #[instrument(skip(self))]
    pub fn show(&self, directory: Option<&Path>, revision: &str) -> MigrateResult<()> {
        let builder = self.builder()?;
        self.capabilities.require(Capability::Show)?;
        self.check_directory(&builder, directory)?;
        let config = builder.build(directory, None, &[])?;
        self.engine.show(&config, revision)?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub fn history(&self, directory: Option<&Path>, args: &HistoryArgs) -> MigrateResult<()> {
        let builder = self.builder()?;
        if args.verbose {
            self.capabilities.require(Capability::VerboseListing)?;
        }
        if args.indicate_current {
            self.capabilities.require(Capability::IndicateCurrent)?;
        }
        self.check_directory(&builder, directory)?;
        let config = builder.build(directory, None, &[])?;
        self.engine.history(&config, args)?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub fn heads(&self, directory: Option<&Path>, args: &HeadsArgs) -> MigrateResult<()> {
        let builder = self.builder()?;
        self.capabilities.require(Capability::Heads)?;
        self.check_directory(&builder, directory)?;
        let config = builder.build(directory, None, &[])?;
        self.engine.heads(&config, args)?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub fn branches(&self, directory: Option<&Path>, args: &BranchesArgs) -> MigrateResult<()> {
        let builder = self.builder()?;
        if args.verbose {
            self.capabilities.require(Capability::VerboseListing)?;
        }
        self.check_directory(&builder, directory)?;
        let config = builder.build(directory, None, &[])?;
        self.engine.branches(&config, args)?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub fn current(&self, directory: Option<&Path>, args: &CurrentArgs) -> MigrateResult<()> {
        let builder = self.builder()?;
        if args.verbose || args.head_only {
            self.capabilities.require(Capability::VerboseListing)?;
        }
        if args.head_only {
            warn!("`head_only` is deprecated, use `verbose` for additional output");
        }
        self.check_directory(&builder, directory)?;
        let config = builder.build(directory, None, &[])?;
        self.engine.current(&config, args)?;
        Ok(())
    }

    /// Set the revision table to the given revision without running any migrations.
    #[instrument(skip(self))]
    pub fn stamp(&self, directory: Option<&Path>, args: &StampArgs) -> MigrateResult<()> {
        let builder = self.builder()?;
        self.check_directory(&builder, directory)?;
        let config = builder.build(directory, None, &[])?;
        self.engine.stamp(&config, args)?;
        Ok(())
    }
}
