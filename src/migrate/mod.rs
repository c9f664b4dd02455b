//! The `Migrate` extension and the per-app [`MigrationState`] record it attaches.

use crate::app::ExtensionHost;
use crate::config::AppConfig;
use crate::engine::{EngineConfig, SchemaMetadata};
use crate::error::MigrateResult;
use crate::error::migrate::MigrateError;
use crate::migrate::pipeline::ConfigPipeline;
use anyhow::anyhow;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};
use url::Url;

pub mod builder;
pub mod pipeline;

pub const DEFAULT_DIRECTORY: &str = "migrations";
pub const DEFAULT_SETTINGS_FILE: &str = "alembic.ini";
pub const DEFAULT_TEMPLATE: &str = "app";

/// Option key that carries the bind URIs when they are passed through the free-form options.
pub const BINDS_OPTION: &str = "binds";

/// Connects an app to the migration engine.
///
/// Holds the defaults used when attaching to an app and the [`ConfigPipeline`] that is applied
/// to every [`EngineConfig`] built for a command.
///
/// # Examples
///
/// ```rust,ignore
/// let mut migrate = Migrate::builder().directory("db/migrations").build();
/// migrate.configure(|mut config| {
///     config.set_main_option("compare_type", "true");
///     config
/// })?;
/// migrate.init_app(
///     &mut app,
///     AttachArgs::builder()
///         .metadata(Arc::new(metadata))
///         .database_uri(uri)
///         .build(),
/// )?;
/// ```
#[derive(Debug, Clone, bon::Builder)]
#[non_exhaustive]
pub struct Migrate {
    #[builder(into, default = PathBuf::from(DEFAULT_DIRECTORY))]
    directory: PathBuf,

    /// File name of the engine's settings file inside the script directory.
    #[builder(into, default = DEFAULT_SETTINGS_FILE.to_owned())]
    settings_file: String,

    /// Template used by `init` when none is given on the command line.
    #[builder(into, default = DEFAULT_TEMPLATE.to_owned())]
    template: String,

    #[builder(into)]
    template_directory: Option<PathBuf>,

    metadata: Option<Arc<dyn SchemaMetadata>>,

    database_uri: Option<Url>,

    #[builder(default)]
    binds: BTreeMap<String, Url>,

    /// Options forwarded to the engine's environment.
    #[builder(default)]
    options: BTreeMap<String, Value>,

    #[builder(skip)]
    pipeline: ConfigPipeline,
}

impl Default for Migrate {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Per-attach overrides for [`Migrate::init_app`]. Anything left unset falls back to the value
/// held by the [`Migrate`] object.
#[derive(Debug, Clone, Default, bon::Builder)]
#[non_exhaustive]
pub struct AttachArgs {
    pub metadata: Option<Arc<dyn SchemaMetadata>>,

    #[builder(into)]
    pub directory: Option<PathBuf>,

    pub database_uri: Option<Url>,

    pub binds: Option<BTreeMap<String, Url>>,

    /// Merged over the [`Migrate`] object's options. A `binds` entry is taken out and used as
    /// the bind URIs when [`AttachArgs::binds`] is not set.
    #[builder(default)]
    pub options: BTreeMap<String, Value>,
}

impl Migrate {
    pub fn new() -> Self {
        Default::default()
    }

    /// Create the extension from the `migrate` and `database` sections of the app config.
    pub fn from_config(config: &AppConfig) -> Self {
        let migrate = &config.migrate;
        let database = &config.database;
        Self::builder()
            .directory(migrate.directory.clone())
            .settings_file(migrate.settings_file.clone())
            .template(migrate.template.clone())
            .maybe_template_directory(migrate.template_directory.clone())
            .maybe_database_uri(database.uri.clone())
            .binds(database.binds.clone())
            .options(migrate.options.clone())
            .build()
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn settings_file(&self) -> &str {
        &self.settings_file
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn metadata(&self) -> Option<&Arc<dyn SchemaMetadata>> {
        self.metadata.as_ref()
    }

    pub fn options(&self) -> &BTreeMap<String, Value> {
        &self.options
    }

    pub fn pipeline(&self) -> &ConfigPipeline {
        &self.pipeline
    }

    /// Register a step that transforms every [`EngineConfig`] built for a command. Steps run
    /// in registration order, including for apps that were attached before the step was added.
    pub fn configure<F>(&self, step: F) -> MigrateResult<&Self>
    where
        F: 'static + Send + Sync + Fn(EngineConfig) -> EngineConfig,
    {
        self.pipeline.push(step)?;
        Ok(self)
    }

    /// Attach a [`MigrationState`] record to the app, replacing any previously attached record.
    ///
    /// The metadata and directory given in `args` also become the new defaults of this object,
    /// and `args.options` are merged into this object's options.
    ///
    /// An incomplete record (missing metadata or database URI) is stored anyway; commands run
    /// against it fail with [`MigrateError::NotConfigured`].
    pub fn init_app<H>(&mut self, app: &mut H, args: AttachArgs) -> MigrateResult<()>
    where
        H: ExtensionHost + ?Sized,
    {
        let AttachArgs {
            metadata,
            directory,
            database_uri,
            binds,
            mut options,
        } = args;

        // Nothing on `self` changes until the binds have parsed.
        let binds_option = options.remove(BINDS_OPTION);
        let binds = match (binds, binds_option) {
            (Some(binds), _) => binds,
            (None, Some(value)) => serde_json::from_value(value).map_err(|err| {
                anyhow!("Unable to parse the `{BINDS_OPTION}` option as bind URIs: {err}")
            })?,
            (None, None) => self.binds.clone(),
        };

        if let Some(metadata) = metadata {
            self.metadata = Some(metadata);
        }
        if let Some(directory) = directory {
            self.directory = directory;
        }
        self.options.extend(options);

        let state = MigrationState {
            metadata: self.metadata.clone(),
            database_uri: database_uri.or_else(|| self.database_uri.clone()),
            binds,
            directory: self.directory.clone(),
            settings_file: self.settings_file.clone(),
            template: self.template.clone(),
            template_directory: self.template_directory.clone(),
            options: self.options.clone(),
            pipeline: self.pipeline.clone(),
        };

        if !state.is_complete() {
            debug!(
                has_metadata = state.metadata.is_some(),
                has_database_uri = state.database_uri.is_some(),
                "Attaching incomplete migration record"
            );
        }
        if app.extensions_mut().insert(state) {
            info!(directory = ?self.directory, "Replaced migration record");
        }
        Ok(())
    }

    /// Attach to the app only if both the metadata and the database URI are available, either
    /// from the arguments or from this object. Returns whether a record was attached.
    pub fn attach<H>(
        &mut self,
        app: &mut H,
        metadata: Option<Arc<dyn SchemaMetadata>>,
        database_uri: Option<Url>,
    ) -> MigrateResult<bool>
    where
        H: ExtensionHost + ?Sized,
    {
        let metadata = metadata.or_else(|| self.metadata.clone());
        let database_uri = database_uri.or_else(|| self.database_uri.clone());
        if metadata.is_none() || database_uri.is_none() {
            return Ok(false);
        }

        self.init_app(
            app,
            AttachArgs::builder()
                .maybe_metadata(metadata)
                .maybe_database_uri(database_uri)
                .build(),
        )?;
        Ok(true)
    }
}

/// The migration configuration of a single app, stored in the app's extension registry.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct MigrationState {
    metadata: Option<Arc<dyn SchemaMetadata>>,
    database_uri: Option<Url>,
    binds: BTreeMap<String, Url>,
    directory: PathBuf,
    settings_file: String,
    template: String,
    template_directory: Option<PathBuf>,
    options: BTreeMap<String, Value>,
    pipeline: ConfigPipeline,
}

impl MigrationState {
    /// Get the app's record, failing with [`MigrateError::NotConfigured`] if the app has no
    /// record or the record is missing the metadata or the database URI.
    pub fn from_app<H>(app: &H) -> MigrateResult<&Self>
    where
        H: ExtensionHost + ?Sized,
    {
        app.extensions()
            .find::<Self>()
            .filter(|state| state.is_complete())
            .ok_or_else(|| MigrateError::NotConfigured.into())
    }

    pub fn is_complete(&self) -> bool {
        self.metadata.is_some() && self.database_uri.is_some()
    }

    pub fn metadata(&self) -> Option<&Arc<dyn SchemaMetadata>> {
        self.metadata.as_ref()
    }

    pub fn database_uri(&self) -> Option<&Url> {
        self.database_uri.as_ref()
    }

    pub fn binds(&self) -> &BTreeMap<String, Url> {
        &self.binds
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn settings_file(&self) -> &str {
        &self.settings_file
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn template_directory(&self) -> Option<&Path> {
        self.template_directory.as_deref()
    }

    pub fn options(&self) -> &BTreeMap<String, Value> {
        &self.options
    }

    pub fn pipeline(&self) -> &ConfigPipeline {
        &self.pipeline
    }
}
