use config::{FileFormat, FileSourceString};
use serde_derive::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;
use validator::Validate;

pub fn default_config() -> config::File<FileSourceString, FileFormat> {
    config::File::from_str(include_str!("default.toml"), FileFormat::Toml)
}

#[derive(Debug, Clone, Validate, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[non_exhaustive]
pub struct MigrateConfig {
    /// The migration-script directory.
    pub directory: PathBuf,

    /// File name of the engine's settings file inside the script directory.
    #[validate(length(min = 1))]
    pub settings_file: String,

    /// Template used by `init` when no template is given on the command line.
    #[validate(length(min = 1))]
    pub template: String,

    /// Directory holding custom script templates.
    #[serde(default)]
    pub template_directory: Option<PathBuf>,

    /// Options forwarded to the engine's environment, e.g. `compare-type = true`.
    #[serde(default)]
    pub options: BTreeMap<String, Value>,
}
