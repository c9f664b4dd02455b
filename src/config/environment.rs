use crate::config::{ENV_VAR_PREFIX, ENV_VAR_SEPARATOR};
use crate::error::MigrateResult;
use anyhow::anyhow;
#[cfg(feature = "cli")]
use clap::ValueEnum;
#[cfg(feature = "cli")]
use clap::builder::PossibleValue;
use const_format::concatcp;
use serde_derive::{Deserialize, Serialize};
use std::env;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
#[cfg(feature = "cli")]
use std::sync::OnceLock;

#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[non_exhaustive]
pub enum Environment {
    #[default]
    Development,
    Test,
    Production,
    #[serde(untagged)]
    Custom(String),
}

#[cfg(feature = "cli")]
static ENV_VARIANTS: OnceLock<Vec<Environment>> = OnceLock::new();

const DEVELOPMENT: &str = "development";
const TEST: &str = "test";
const PRODUCTION: &str = "production";

// Implemented manually in order to support the `Environment::Custom` variant.
#[cfg(feature = "cli")]
impl ValueEnum for Environment {
    fn value_variants<'a>() -> &'a [Self] {
        ENV_VARIANTS.get_or_init(|| {
            vec![
                Environment::Development,
                Environment::Test,
                Environment::Production,
                Environment::Custom("<custom>".to_string()),
            ]
        })
    }

    fn from_str(input: &str, ignore_case: bool) -> Result<Self, String> {
        let env = Self::value_variants()
            .iter()
            .filter(|v| !matches!(v, Environment::Custom(_)))
            .find(|v| {
                v.to_possible_value()
                    .map(|v| v.matches(input, ignore_case))
                    .unwrap_or_default()
            })
            .cloned()
            .unwrap_or_else(|| Environment::Custom(input.to_string()));

        Ok(env)
    }

    fn to_possible_value(&self) -> Option<PossibleValue> {
        match self {
            Environment::Development => Some(PossibleValue::new(DEVELOPMENT).alias("dev")),
            Environment::Test => Some(PossibleValue::new(TEST)),
            Environment::Production => Some(PossibleValue::new(PRODUCTION).alias("prod")),
            Environment::Custom(custom) => Some(
                PossibleValue::new(custom).help("Any other value will be captured as a String."),
            ),
        }
    }
}

impl Display for Environment {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "{DEVELOPMENT}"),
            Environment::Test => write!(f, "{TEST}"),
            Environment::Production => write!(f, "{PRODUCTION}"),
            Environment::Custom(custom) => write!(f, "{custom}"),
        }
    }
}

/// Case-insensitive. Unknown values are captured as [`Environment::Custom`].
impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let env = match s.to_lowercase().as_str() {
            DEVELOPMENT | "dev" => Environment::Development,
            TEST => Environment::Test,
            PRODUCTION | "prod" => Environment::Production,
            _ => Environment::Custom(s.to_string()),
        };
        Ok(env)
    }
}

pub(crate) const ENVIRONMENT_ENV_VAR_NAME: &str = "ENVIRONMENT";

const ENV_VAR_WITH_PREFIX: &str =
    concatcp!(ENV_VAR_PREFIX, ENV_VAR_SEPARATOR, ENVIRONMENT_ENV_VAR_NAME);

impl Environment {
    /// Read the environment from the `APP_MIGRATE__ENVIRONMENT` env var, defaulting to
    /// [`Environment::Development`] if the var is not set.
    // This runs before tracing is initialized, so we need to use `eprintln` in order to
    // log from this method.
    #[allow(clippy::disallowed_macros)]
    pub fn new() -> MigrateResult<Self> {
        let environment = match env::var(ENV_VAR_WITH_PREFIX) {
            Ok(environment) => environment,
            Err(env::VarError::NotPresent) => {
                eprintln!(
                    "Env var `{ENV_VAR_WITH_PREFIX}` not defined, using environment: {:?}",
                    Environment::default()
                );
                return Ok(Environment::default());
            }
            Err(err) => {
                return Err(anyhow!("Unable to read `{ENV_VAR_WITH_PREFIX}` env var: {err}").into());
            }
        };
        let environment = <Environment as FromStr>::from_str(&environment).map_err(|err| {
            anyhow!(
                "Unable to parse `{ENV_VAR_WITH_PREFIX}` env var with value `{environment}`: {err}"
            )
        })?;
        eprintln!("Using environment from `{ENV_VAR_WITH_PREFIX}` env var: {environment:?}");
        Ok(environment)
    }
}
