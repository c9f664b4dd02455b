use crate::engine::{EngineConfig, SCRIPT_LOCATION};
use crate::error::MigrateResult;
use crate::migrate::MigrationState;
use std::path::{Path, PathBuf};

/// Free-form arguments for custom environment scripts (the engine's `-x` arguments). A single
/// value and a list of values are both accepted; either way the engine receives a list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtraArgs {
    One(String),
    Many(Vec<String>),
}

impl ExtraArgs {
    pub fn into_vec(self) -> Vec<String> {
        match self {
            ExtraArgs::One(arg) => vec![arg],
            ExtraArgs::Many(args) => args,
        }
    }
}

impl From<&str> for ExtraArgs {
    fn from(value: &str) -> Self {
        ExtraArgs::One(value.to_owned())
    }
}

impl From<String> for ExtraArgs {
    fn from(value: String) -> Self {
        ExtraArgs::One(value)
    }
}

impl From<Vec<String>> for ExtraArgs {
    fn from(value: Vec<String>) -> Self {
        ExtraArgs::Many(value)
    }
}

impl From<Vec<&str>> for ExtraArgs {
    fn from(value: Vec<&str>) -> Self {
        ExtraArgs::Many(value.into_iter().map(ToOwned::to_owned).collect())
    }
}

impl From<&[&str]> for ExtraArgs {
    fn from(value: &[&str]) -> Self {
        ExtraArgs::Many(value.iter().map(|arg| (*arg).to_owned()).collect())
    }
}

/// Builds a fresh [`EngineConfig`] from a [`MigrationState`] for every command. The state is
/// never modified.
#[derive(Debug, Clone, Copy)]
pub struct ConfigBuilder<'a> {
    state: &'a MigrationState,
}

impl<'a> ConfigBuilder<'a> {
    pub fn new(state: &'a MigrationState) -> Self {
        Self { state }
    }

    /// The directory to use for a command; the record's directory unless overridden.
    pub fn resolve_directory(&self, directory: Option<&Path>) -> PathBuf {
        directory
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.state.directory().to_path_buf())
    }

    /// Build the config for any command other than `init`.
    ///
    /// Each name in `flags` is set on the command options, e.g. `autogenerate`. `extra_args`
    /// becomes the command options' `x` list; `x` stays `None` when no extra args are given.
    pub fn build(
        &self,
        directory: Option<&Path>,
        extra_args: Option<ExtraArgs>,
        flags: &[&str],
    ) -> MigrateResult<EngineConfig> {
        let directory = self.resolve_directory(directory);
        let mut config = self.base(&directory);

        let cmd_opts = config.cmd_opts_mut();
        for flag in flags {
            cmd_opts.set_flag(*flag);
        }
        if cmd_opts.x.is_none() {
            cmd_opts.x = extra_args.map(ExtraArgs::into_vec);
        }

        self.state.pipeline().apply(config)
    }

    /// Build the config for `init`, which has no command options.
    pub fn build_for_init(&self, directory: Option<&Path>) -> MigrateResult<EngineConfig> {
        let directory = self.resolve_directory(directory);
        let config = self.base(&directory);
        self.state.pipeline().apply(config)
    }

    fn base(&self, directory: &Path) -> EngineConfig {
        let mut config =
            EngineConfig::new(Some(directory.join(self.state.settings_file())));
        config.set_main_option(SCRIPT_LOCATION, directory.to_string_lossy());
        config.template_directory = self.state.template_directory().map(Path::to_path_buf);
        config.database_uri = self.state.database_uri().cloned();
        config.binds = self.state.binds().clone();
        config.metadata = self.state.metadata().cloned();
        config.options = self.state.options().clone();
        config
    }
}
