use serde_derive::{Deserialize, Serialize};
use std::collections::BTreeMap;
use url::Url;
use validator::Validate;

/// The databases the engine migrates.
#[derive(Debug, Clone, Default, Validate, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
#[non_exhaustive]
pub struct Database {
    /// URI of the primary database.
    pub uri: Option<Url>,

    /// URIs of secondary databases, keyed by bind name.
    ///
    /// # Examples
    ///
    /// ```toml
    /// [database.binds]
    /// users = "postgres://localhost:5432/users"
    /// ```
    pub binds: BTreeMap<String, Url>,
}
