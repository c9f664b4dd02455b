use crate::api::cli::db::DbArgs;
use crate::app::ExtensionHost;
use crate::command::{CommandOutcome, Dispatcher};
use crate::config::environment::Environment;
use crate::engine::MigrationEngine;
use crate::error::MigrateResult;
use clap::{Args, Command, FromArgMatches, Parser, Subcommand};
use serde_derive::Serialize;
use std::ffi::OsString;
use std::path::PathBuf;

pub mod db;

/// Everything a command needs to run.
#[non_exhaustive]
pub struct CliState<'a, H>
where
    H: ExtensionHost + ?Sized,
{
    pub migrate_cli: &'a MigrateCli,
    pub app: &'a H,
    pub engine: &'a dyn MigrationEngine,
}

impl<'a, H> CliState<'a, H>
where
    H: ExtensionHost + ?Sized,
{
    pub fn new(migrate_cli: &'a MigrateCli, app: &'a H, engine: &'a dyn MigrationEngine) -> Self {
        Self {
            migrate_cli,
            app,
            engine,
        }
    }
}

/// Implement to run your own CLI commands alongside the `db` commands.
pub trait RunCommand<H>
where
    H: ExtensionHost + ?Sized,
{
    /// Run the command.
    ///
    /// # Returns
    /// * `Ok(Some(outcome))` - If the implementation handled the command.
    /// * `Ok(None)` - If the implementation did not handle the command.
    /// * `Err(...)` - If the implementation experienced an error while handling the command.
    fn run(&self, cli: &CliState<H>) -> MigrateResult<Option<CommandOutcome>>;
}

/// Manage the database schema of the app with the migration engine.
#[serde_with::skip_serializing_none]
#[derive(Debug, Parser, Serialize)]
#[command(version, about)]
#[non_exhaustive]
pub struct MigrateCli {
    /// Specify the environment to use to load the config. This overrides the corresponding
    /// environment variable if it's set.
    #[clap(short, long)]
    pub environment: Option<Environment>,

    /// The location of the config directory (where the app's config files are located). If
    /// not provided, will default to `./config/`.
    #[clap(long, value_name = "CONFIG_DIRECTORY", value_hint = clap::ValueHint::DirPath)]
    pub config_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<MigrateCommand>,
}

impl<H> RunCommand<H> for MigrateCli
where
    H: ExtensionHost + ?Sized,
{
    fn run(&self, cli: &CliState<H>) -> MigrateResult<Option<CommandOutcome>> {
        let Some(command) = self.command.as_ref() else {
            return Ok(None);
        };
        match command {
            MigrateCommand::Db(args) => {
                let dispatcher = Dispatcher::new(cli.app, cli.engine);
                Ok(Some(args.command.run(&dispatcher)?))
            }
        }
    }
}

#[derive(Debug, Subcommand, Serialize)]
#[serde(tag = "type")]
#[non_exhaustive]
pub enum MigrateCommand {
    /// Perform database migrations.
    Db(DbArgs),
}

/// A host CLI without any commands of its own.
#[derive(Debug, Default, Args, Serialize)]
#[non_exhaustive]
pub struct EmptyCli {}

impl<H> RunCommand<H> for EmptyCli
where
    H: ExtensionHost + ?Sized,
{
    fn run(&self, _cli: &CliState<H>) -> MigrateResult<Option<CommandOutcome>> {
        Ok(None)
    }
}

/// Build the CLI by combining the [`MigrateCli`] with the host app's CLI, then parse the args
/// into both. The first arg is the binary name.
pub fn parse_cli<C, I, T>(args: I) -> MigrateResult<(MigrateCli, C)>
where
    C: Args + FromArgMatches,
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = Command::default();
    // Add the migrate CLI. Save the shared attributes to use after adding the app-specific CLI
    let cli = MigrateCli::augment_args(cli);
    let about = cli.get_about().cloned();
    let version = cli.get_version().map(|x| x.to_string());
    // Adding the app-specific CLI overrides the shared attributes, so combine them.
    let cli = C::augment_args(cli);
    let cli = if let Some((a, b)) = about.zip(cli.get_about().cloned()) {
        cli.about(format!("{a}\n\n{b}"))
    } else {
        cli
    };
    let cli = if let Some((a, b)) = version.zip(cli.get_version().map(|x| x.to_string())) {
        cli.version(format!("app-migrate: {a}, app: {b}"))
    } else {
        cli
    };
    let matches = cli.try_get_matches_from(args)?;
    let migrate_cli = MigrateCli::from_arg_matches(&matches)?;
    let app_cli = C::from_arg_matches(&matches)?;
    Ok((migrate_cli, app_cli))
}

/// Run the `db` command if one was given, otherwise let the host CLI handle the args.
pub fn handle_cli<C, H>(cli: &CliState<H>, app_cli: &C) -> MigrateResult<Option<CommandOutcome>>
where
    C: RunCommand<H>,
    H: ExtensionHost + ?Sized,
{
    if let Some(outcome) = cli.migrate_cli.run(cli)? {
        return Ok(Some(outcome));
    }
    app_cli.run(cli)
}
