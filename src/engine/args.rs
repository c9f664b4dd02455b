//! Arguments for the individual engine commands. They are passed to the [`MigrationEngine`]
//! unmodified apart from the documented policy rewrites in the
//! [`Dispatcher`][crate::command::Dispatcher].
//!
//! [`MigrationEngine`]: crate::engine::MigrationEngine

use serde_derive::Serialize;

pub const HEAD: &str = "head";
pub const ONE_STEP_BACK: &str = "-1";

#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, bon::Builder)]
#[cfg_attr(feature = "cli", derive(clap::Args))]
#[non_exhaustive]
pub struct RevisionArgs {
    /// Revision message
    #[cfg_attr(feature = "cli", arg(short, long))]
    #[builder(into)]
    pub message: Option<String>,

    /// Populate revision script with candidate migration operations, based on comparison of
    /// database to model
    #[cfg_attr(feature = "cli", arg(long))]
    #[builder(default)]
    pub autogenerate: bool,

    /// Don't emit SQL to database - dump to standard output instead
    #[cfg_attr(feature = "cli", arg(long))]
    #[builder(default)]
    pub sql: bool,

    /// Specify head revision or <branchname>@head to base new revision on
    #[cfg_attr(feature = "cli", arg(long, default_value = HEAD))]
    #[builder(into, default = HEAD.to_owned())]
    pub head: String,

    /// Allow a non-head revision as the "head" to splice onto
    #[cfg_attr(feature = "cli", arg(long))]
    #[builder(default)]
    pub splice: bool,

    /// Specify a branch label to apply to the new revision
    #[cfg_attr(feature = "cli", arg(long))]
    #[builder(into)]
    pub branch_label: Option<String>,

    /// Specify specific path from config for version file
    #[cfg_attr(feature = "cli", arg(long))]
    #[builder(into)]
    pub version_path: Option<String>,

    /// Specify a hardcoded revision id instead of generating one
    #[cfg_attr(feature = "cli", arg(long))]
    #[builder(into)]
    pub rev_id: Option<String>,
}

impl RevisionArgs {
    /// Whether any option that requires branched-revision support was changed from its default.
    pub(crate) fn uses_branching(&self) -> bool {
        self.head != HEAD
            || self.splice
            || self.branch_label.is_some()
            || self.version_path.is_some()
            || self.rev_id.is_some()
    }
}

impl Default for RevisionArgs {
    fn default() -> Self {
        Self::builder().build()
    }
}

#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, bon::Builder)]
#[cfg_attr(feature = "cli", derive(clap::Args))]
#[non_exhaustive]
pub struct MergeArgs {
    /// The revisions to merge
    #[builder(default)]
    pub revisions: Vec<String>,

    /// Merge revision message
    #[cfg_attr(feature = "cli", arg(short, long))]
    #[builder(into)]
    pub message: Option<String>,

    /// Specify a branch label to apply to the new revision
    #[cfg_attr(feature = "cli", arg(long))]
    #[builder(into)]
    pub branch_label: Option<String>,

    /// Specify a hardcoded revision id instead of generating one
    #[cfg_attr(feature = "cli", arg(long))]
    #[builder(into)]
    pub rev_id: Option<String>,
}

#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, bon::Builder)]
#[cfg_attr(feature = "cli", derive(clap::Args))]
#[non_exhaustive]
pub struct UpgradeArgs {
    /// The revision to upgrade to
    #[cfg_attr(feature = "cli", arg(default_value = HEAD))]
    #[builder(into, default = HEAD.to_owned())]
    pub revision: String,

    /// Don't emit SQL to database - dump to standard output instead
    #[cfg_attr(feature = "cli", arg(long))]
    #[builder(default)]
    pub sql: bool,

    /// Arbitrary "tag" name - can be used by custom environment scripts
    #[cfg_attr(feature = "cli", arg(long))]
    #[builder(into)]
    pub tag: Option<String>,
}

impl Default for UpgradeArgs {
    fn default() -> Self {
        Self::builder().build()
    }
}

#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, bon::Builder)]
#[cfg_attr(feature = "cli", derive(clap::Args))]
#[non_exhaustive]
pub struct DowngradeArgs {
    /// The revision to downgrade to
    #[cfg_attr(feature = "cli", arg(default_value = ONE_STEP_BACK, allow_negative_numbers = true))]
    #[builder(into, default = ONE_STEP_BACK.to_owned())]
    pub revision: String,

    /// Don't emit SQL to database - dump to standard output instead
    #[cfg_attr(feature = "cli", arg(long))]
    #[builder(default)]
    pub sql: bool,

    /// Arbitrary "tag" name - can be used by custom environment scripts
    #[cfg_attr(feature = "cli", arg(long))]
    #[builder(into)]
    pub tag: Option<String>,
}

impl Default for DowngradeArgs {
    fn default() -> Self {
        Self::builder().build()
    }
}

#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, bon::Builder)]
#[cfg_attr(feature = "cli", derive(clap::Args))]
#[non_exhaustive]
pub struct HistoryArgs {
    /// Specify a revision range; format is [start]:[end]
    #[cfg_attr(feature = "cli", arg(short, long))]
    #[builder(into)]
    pub rev_range: Option<String>,

    /// Use more verbose output
    #[cfg_attr(feature = "cli", arg(short, long))]
    #[builder(default)]
    pub verbose: bool,

    /// Indicate current version
    #[cfg_attr(feature = "cli", arg(short, long))]
    #[builder(default)]
    pub indicate_current: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, bon::Builder)]
#[cfg_attr(feature = "cli", derive(clap::Args))]
#[non_exhaustive]
pub struct HeadsArgs {
    /// Use more verbose output
    #[cfg_attr(feature = "cli", arg(short, long))]
    #[builder(default)]
    pub verbose: bool,

    /// Treat dependency versions as down revisions
    #[cfg_attr(feature = "cli", arg(long))]
    #[builder(default)]
    pub resolve_dependencies: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, bon::Builder)]
#[cfg_attr(feature = "cli", derive(clap::Args))]
#[non_exhaustive]
pub struct BranchesArgs {
    /// Use more verbose output
    #[cfg_attr(feature = "cli", arg(short, long))]
    #[builder(default)]
    pub verbose: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, bon::Builder)]
#[cfg_attr(feature = "cli", derive(clap::Args))]
#[non_exhaustive]
pub struct CurrentArgs {
    /// Use more verbose output
    #[cfg_attr(feature = "cli", arg(short, long))]
    #[builder(default)]
    pub verbose: bool,

    /// Deprecated. Use --verbose for additional output
    #[cfg_attr(feature = "cli", arg(long))]
    #[builder(default)]
    pub head_only: bool,
}

#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, bon::Builder)]
#[cfg_attr(feature = "cli", derive(clap::Args))]
#[non_exhaustive]
pub struct StampArgs {
    /// The revision to stamp the version table with
    #[cfg_attr(feature = "cli", arg(default_value = HEAD))]
    #[builder(into, default = HEAD.to_owned())]
    pub revision: String,

    /// Don't emit SQL to database - dump to standard output instead
    #[cfg_attr(feature = "cli", arg(long))]
    #[builder(default)]
    pub sql: bool,

    /// Arbitrary "tag" name - can be used by custom environment scripts
    #[cfg_attr(feature = "cli", arg(long))]
    #[builder(into)]
    pub tag: Option<String>,
}

impl Default for StampArgs {
    fn default() -> Self {
        Self::builder().build()
    }
}
