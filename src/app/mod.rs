//! The host application side: an app object with an extensible-state bag, and the `run` entry
//! point that drives the `db` commands from the command line.

pub mod extension;

#[cfg(feature = "cli")]
use crate::api::cli::{CliState, RunCommand, handle_cli, parse_cli};
#[cfg(feature = "cli")]
use crate::command::CommandOutcome;
#[cfg(feature = "cli")]
use crate::config::AppConfig;
#[cfg(feature = "cli")]
use crate::engine::MigrationEngine;
#[cfg(feature = "cli")]
use crate::error::{Error, MigrateResult};
#[cfg(feature = "cli")]
use crate::tracing::init_tracing;
use extension::ExtensionRegistry;
#[cfg(feature = "cli")]
use std::ffi::OsString;
#[cfg(feature = "cli")]
use std::process::ExitCode;
#[cfg(feature = "cli")]
use tracing::{error, info};

/// An app that can hold extension state, such as the
/// [`MigrationState`][crate::migrate::MigrationState] record.
///
/// Implement this for your own app type to attach the migration record to it directly.
pub trait ExtensionHost {
    fn extensions(&self) -> &ExtensionRegistry;

    fn extensions_mut(&mut self) -> &mut ExtensionRegistry;
}

/// A minimal app object for hosts that don't have their own.
#[derive(Default)]
#[non_exhaustive]
pub struct App {
    pub name: String,
    extensions: ExtensionRegistry,
}

impl App {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            extensions: Default::default(),
        }
    }
}

impl ExtensionHost for App {
    fn extensions(&self) -> &ExtensionRegistry {
        &self.extensions
    }

    fn extensions_mut(&mut self) -> &mut ExtensionRegistry {
        &mut self.extensions
    }
}

/// Parse the CLI args, load the config, initialize tracing, build the app and run the requested
/// command.
///
/// `build_app` receives the loaded config and is expected to attach the migration record, e.g.
/// with [`Migrate::from_config`][crate::migrate::Migrate::from_config] and
/// [`Migrate::init_app`][crate::migrate::Migrate::init_app].
///
/// Returns [`ExitCode::FAILURE`] if the command failed or any step before it returned an error.
#[cfg(feature = "cli")]
pub fn run<C, H, I, T, F>(args: I, engine: &dyn MigrationEngine, build_app: F) -> ExitCode
where
    C: RunCommand<H> + clap::Args + clap::FromArgMatches,
    H: ExtensionHost,
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
    F: FnOnce(&AppConfig) -> MigrateResult<H>,
{
    match try_run::<C, H, I, T, F>(args, engine, build_app) {
        Ok(outcome) => outcome.into(),
        Err(Error::Clap(err)) => {
            // Help and version requests are reported as errors by clap
            let _ = err.print();
            ExitCode::from(u8::try_from(err.exit_code()).unwrap_or(1))
        }
        Err(err) => {
            if tracing::dispatcher::has_been_set() {
                error!("An error occurred while running the command: {err}");
            } else {
                report_untraced(&err);
            }
            ExitCode::FAILURE
        }
    }
}

// Config loading and tracing setup fail before a subscriber exists, so `error!` would be dropped.
#[cfg(feature = "cli")]
#[allow(clippy::disallowed_macros)]
fn report_untraced(err: &Error) {
    eprintln!("An error occurred while running the command: {err}");
}

#[cfg(feature = "cli")]
fn try_run<C, H, I, T, F>(
    args: I,
    engine: &dyn MigrationEngine,
    build_app: F,
) -> MigrateResult<CommandOutcome>
where
    C: RunCommand<H> + clap::Args + clap::FromArgMatches,
    H: ExtensionHost,
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
    F: FnOnce(&AppConfig) -> MigrateResult<H>,
{
    let (migrate_cli, app_cli) = parse_cli::<C, I, T>(args)?;

    let config =
        AppConfig::new_with_config_dir(migrate_cli.environment.clone(), migrate_cli.config_dir.clone())?;
    init_tracing(&config.tracing)?;
    config.validate(true)?;

    let app = build_app(&config)?;

    let cli = CliState::new(&migrate_cli, &app, engine);
    if let Some(outcome) = handle_cli(&cli, &app_cli)? {
        return Ok(outcome);
    }

    info!("No command given");
    Ok(CommandOutcome::Success)
}

#[cfg(test)]
mod tests {
    use super::*;
    #[cfg(feature = "cli")]
    use crate::api::cli::EmptyCli;
    #[cfg(feature = "cli")]
    use crate::engine::MockMigrationEngine;
    #[cfg(feature = "cli")]
    use crate::engine::version::EngineVersion;
    #[cfg(feature = "cli")]
    use crate::migrate::tests::TestMetadata;
    #[cfg(feature = "cli")]
    use crate::migrate::{AttachArgs, Migrate};
    #[cfg(feature = "cli")]
    use std::fs::write;
    #[cfg(feature = "cli")]
    use std::sync::Arc;

    #[test]
    #[cfg_attr(coverage_nightly, coverage(off))]
    fn app_extensions() {
        let mut app = App::new("test");
        assert_eq!(app.name, "test");

        app.extensions_mut().insert(1_u32);

        assert_eq!(app.extensions().find::<u32>(), Some(&1));
    }

    #[cfg(feature = "cli")]
    fn build_app(config: &AppConfig) -> MigrateResult<App> {
        let mut app = App::new(config.app.name.clone());
        Migrate::from_config(config).init_app(
            &mut app,
            AttachArgs::builder().metadata(Arc::new(TestMetadata)).build(),
        )?;
        Ok(app)
    }

    #[test]
    #[cfg(feature = "cli")]
    #[cfg_attr(coverage_nightly, coverage(off))]
    fn try_run_loads_config_and_runs_command() {
        let config_dir = tempfile::tempdir().unwrap();
        let scripts = tempfile::tempdir().unwrap();
        write(
            config_dir.path().join("test.toml"),
            format!(
                r#"
                [app]
                name = "notes"

                [migrate]
                directory = {:?}

                [database]
                uri = "sqlite://notes.db"

                [tracing]
                format = "none"
                "#,
                scripts.path().to_string_lossy()
            ),
        )
        .unwrap();
        let mut engine = MockMigrationEngine::new();
        engine
            .expect_version()
            .return_const(EngineVersion::new(1, 13, 2));
        engine
            .expect_upgrade()
            .withf(|_, args| args.revision == "head")
            .times(1)
            .returning(|_, _| Ok(()));
        let config_dir = config_dir.path().to_string_lossy().into_owned();
        let args = [
            "app",
            "-e",
            "test",
            "--config-dir",
            config_dir.as_str(),
            "db",
            "upgrade",
        ];

        let outcome = try_run::<EmptyCli, _, _, _, _>(args, &engine, build_app).unwrap();

        assert_eq!(outcome, CommandOutcome::Success);
    }

    #[test]
    #[cfg(feature = "cli")]
    #[cfg_attr(coverage_nightly, coverage(off))]
    fn try_run_invalid_config() {
        let config_dir = tempfile::tempdir().unwrap();
        write(config_dir.path().join("default.toml"), "[app\nname = ").unwrap();
        let engine = MockMigrationEngine::new();
        let config_dir = config_dir.path().to_string_lossy().into_owned();
        let args = ["app", "-e", "test", "--config-dir", config_dir.as_str(), "db", "current"];

        let result = try_run::<EmptyCli, _, _, _, _>(args, &engine, build_app);

        assert!(matches!(result, Err(Error::Config(_))));
    }
}
