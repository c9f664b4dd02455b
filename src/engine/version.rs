//! Version handling for the wrapped migration engine.
//!
//! Older engines lack some commands and options. Rather than comparing version tuples in every
//! command, the installed version is negotiated once into a set of [`Capability`] flags
//! ([`Capabilities`]) which the dispatcher checks before calling into the engine.

use crate::error::migrate::MigrateError;
use serde_derive::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, IntoStaticStr};
use thiserror::Error;

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[non_exhaustive]
pub struct EngineVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl EngineVersion {
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }
}

impl Display for EngineVersion {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

#[derive(Debug, Error)]
#[error("Unable to parse migration engine version `{0}`")]
pub struct ParseVersionError(String);

/// Parses the first three dot-separated components of a version string. Only the leading digits
/// of each component are used, so pre-release suffixes such as `0.9.10b1` are accepted. Missing
/// minor/patch components default to `0`.
impl FromStr for EngineVersion {
    type Err = ParseVersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.trim().split('.').map(leading_number);

        let major = parts
            .next()
            .flatten()
            .ok_or_else(|| ParseVersionError(s.to_owned()))?
            .map_err(|_| ParseVersionError(s.to_owned()))?;
        let mut next = || -> Result<u32, ParseVersionError> {
            match parts.next().flatten() {
                Some(part) => part.map_err(|_| ParseVersionError(s.to_owned())),
                None => Ok(0),
            }
        };
        let minor = next()?;
        let patch = next()?;

        Ok(Self::new(major, minor, patch))
    }
}

fn leading_number(part: &str) -> Option<Result<u32, std::num::ParseIntError>> {
    let digits = part
        .find(|c: char| !c.is_ascii_digit())
        .map_or(part, |end| &part[..end]);
    if digits.is_empty() {
        None
    } else {
        Some(digits.parse())
    }
}

/// Commands or options that are only available starting at some engine version.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    IntoStaticStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
#[non_exhaustive]
pub enum Capability {
    /// `revision` accepts `head`, `splice`, `branch_label`, `version_path` and `rev_id`.
    BranchedRevisions,
    Merge,
    Show,
    Heads,
    /// The `verbose` option of `history`, `branches` and `current`.
    VerboseListing,
    Edit,
    /// The `indicate_current` option of `history`.
    IndicateCurrent,
}

impl Capability {
    /// The first engine version that supports the capability.
    pub const fn min_version(self) -> EngineVersion {
        match self {
            Capability::BranchedRevisions
            | Capability::Merge
            | Capability::Show
            | Capability::Heads
            | Capability::VerboseListing => EngineVersion::new(0, 7, 0),
            Capability::Edit => EngineVersion::new(0, 8, 0),
            Capability::IndicateCurrent => EngineVersion::new(0, 9, 9),
        }
    }
}

/// The set of [`Capability`]s supported by an installed engine version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[non_exhaustive]
pub struct Capabilities {
    installed: EngineVersion,
    supported: BTreeSet<Capability>,
}

impl Capabilities {
    pub fn negotiate(installed: EngineVersion) -> Self {
        let supported = Capability::iter()
            .filter(|capability| installed >= capability.min_version())
            .collect();
        Self {
            installed,
            supported,
        }
    }

    pub fn installed(&self) -> EngineVersion {
        self.installed
    }

    pub fn supports(&self, capability: Capability) -> bool {
        self.supported.contains(&capability)
    }

    /// Fail with [`MigrateError::VersionTooOld`] if the capability is not supported.
    pub fn require(&self, capability: Capability) -> Result<(), MigrateError> {
        if self.supports(capability) {
            Ok(())
        } else {
            Err(MigrateError::VersionTooOld {
                capability,
                required: capability.min_version(),
                installed: self.installed,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("1.13.2", EngineVersion::new(1, 13, 2))]
    #[case("0.9.10b1", EngineVersion::new(0, 9, 10))]
    #[case("0.7", EngineVersion::new(0, 7, 0))]
    #[case("2", EngineVersion::new(2, 0, 0))]
    #[case(" 1.0.0rc1 ", EngineVersion::new(1, 0, 0))]
    #[case("1.4.3.post1", EngineVersion::new(1, 4, 3))]
    #[cfg_attr(coverage_nightly, coverage(off))]
    fn parse(#[case] version: &str, #[case] expected: EngineVersion) {
        assert_eq!(version.parse::<EngineVersion>().unwrap(), expected);
    }

    #[rstest]
    #[case("")]
    #[case("dev")]
    #[case("99999999999.0.0")]
    #[cfg_attr(coverage_nightly, coverage(off))]
    fn parse_invalid(#[case] version: &str) {
        assert!(version.parse::<EngineVersion>().is_err());
    }

    #[test]
    #[cfg_attr(coverage_nightly, coverage(off))]
    fn ordering() {
        assert!(EngineVersion::new(0, 9, 10) > EngineVersion::new(0, 9, 9));
        assert!(EngineVersion::new(1, 0, 0) > EngineVersion::new(0, 99, 99));
        assert_eq!(EngineVersion::new(0, 7, 0).to_string(), "0.7.0");
    }

    #[rstest]
    #[case(EngineVersion::new(0, 6, 9), Capability::Merge, false)]
    #[case(EngineVersion::new(0, 7, 0), Capability::Merge, true)]
    #[case(EngineVersion::new(0, 7, 0), Capability::Show, true)]
    #[case(EngineVersion::new(0, 6, 0), Capability::Heads, false)]
    #[case(EngineVersion::new(0, 7, 9), Capability::Edit, false)]
    #[case(EngineVersion::new(0, 8, 0), Capability::Edit, true)]
    #[case(EngineVersion::new(0, 9, 8), Capability::IndicateCurrent, false)]
    #[case(EngineVersion::new(0, 9, 9), Capability::IndicateCurrent, true)]
    #[case(EngineVersion::new(1, 13, 0), Capability::IndicateCurrent, true)]
    #[cfg_attr(coverage_nightly, coverage(off))]
    fn negotiate(
        #[case] installed: EngineVersion,
        #[case] capability: Capability,
        #[case] supported: bool,
    ) {
        let capabilities = Capabilities::negotiate(installed);

        assert_eq!(capabilities.supports(capability), supported);
        assert_eq!(capabilities.require(capability).is_ok(), supported);
    }

    #[test]
    #[cfg_attr(coverage_nightly, coverage(off))]
    fn require_reports_floor_and_installed() {
        let capabilities = Capabilities::negotiate(EngineVersion::new(0, 6, 5));

        let err = capabilities.require(Capability::Heads).unwrap_err();

        assert!(matches!(
            err,
            MigrateError::VersionTooOld {
                capability: Capability::Heads,
                required,
                installed,
            } if required == EngineVersion::new(0, 7, 0) && installed == EngineVersion::new(0, 6, 5)
        ));
    }
}
