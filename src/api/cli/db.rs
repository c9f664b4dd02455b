use crate::command::{CommandOutcome, Dispatcher, catch_errors};
use crate::engine::args::{
    BranchesArgs, CurrentArgs, DowngradeArgs, HEAD, HeadsArgs, HistoryArgs, MergeArgs,
    RevisionArgs, StampArgs, UpgradeArgs,
};
use crate::error::MigrateResult;
use crate::migrate::builder::ExtraArgs;
use clap::{Args, Parser, Subcommand};
use serde_derive::Serialize;
use std::path::{Path, PathBuf};

/// Perform database migrations.
#[derive(Debug, Parser, Serialize)]
#[non_exhaustive]
pub struct DbArgs {
    #[command(subcommand)]
    pub command: DbCommand,
}

#[derive(Debug, Subcommand, Serialize)]
#[serde(tag = "type")]
#[non_exhaustive]
pub enum DbCommand {
    /// Creates a new migration repository
    Init(DbInitArgs),

    /// Create a new revision file
    Revision(DbRevisionArgs),

    /// Autogenerate a new revision file (Alias for 'revision --autogenerate')
    Migrate(DbMigrateArgs),

    /// Edit a revision file
    Edit(DbEditArgs),

    /// Merge two revisions together, creating a new revision file
    Merge(DbMergeArgs),

    /// Upgrade to a later version
    Upgrade(DbUpgradeArgs),

    /// Revert to a previous version
    Downgrade(DbDowngradeArgs),

    /// Show the revision denoted by the given symbol
    Show(DbShowArgs),

    /// List changeset scripts in chronological order
    History(DbHistoryArgs),

    /// Show current available heads in the script directory
    Heads(DbHeadsArgs),

    /// Show current branch points
    Branches(DbBranchesArgs),

    /// Display the current revision for each database
    Current(DbCurrentArgs),

    /// 'stamp' the revision table with the given revision; don't run any migrations
    Stamp(DbStampArgs),
}

impl DbCommand {
    /// Run the command at the command boundary; known command errors result in
    /// [`CommandOutcome::Failed`].
    pub fn run(&self, dispatcher: &Dispatcher) -> MigrateResult<CommandOutcome> {
        catch_errors(|| match self {
            DbCommand::Init(args) => dispatcher.init(args.directory.get(), args.template.as_deref()),
            DbCommand::Revision(args) => dispatcher.revision(args.directory.get(), &args.args),
            DbCommand::Migrate(args) => dispatcher.migrate(
                args.directory.get(),
                &args.revision_args(),
                extra_args(&args.x_arg),
            ),
            DbCommand::Edit(args) => dispatcher.edit(args.directory.get(), &args.revision),
            DbCommand::Merge(args) => dispatcher.merge(args.directory.get(), &args.args),
            DbCommand::Upgrade(args) => dispatcher.upgrade(
                args.directory.get(),
                &args.args,
                extra_args(&args.x_arg),
            ),
            DbCommand::Downgrade(args) => dispatcher.downgrade(
                args.directory.get(),
                &args.args,
                extra_args(&args.x_arg),
            ),
            DbCommand::Show(args) => dispatcher.show(args.directory.get(), &args.revision),
            DbCommand::History(args) => dispatcher.history(args.directory.get(), &args.args),
            DbCommand::Heads(args) => dispatcher.heads(args.directory.get(), &args.args),
            DbCommand::Branches(args) => dispatcher.branches(args.directory.get(), &args.args),
            DbCommand::Current(args) => dispatcher.current(args.directory.get(), &args.args),
            DbCommand::Stamp(args) => dispatcher.stamp(args.directory.get(), &args.args),
        })
    }
}

fn extra_args(x_arg: &[String]) -> Option<ExtraArgs> {
    if x_arg.is_empty() {
        None
    } else {
        Some(ExtraArgs::Many(x_arg.to_vec()))
    }
}

#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Eq, Args, Serialize)]
#[non_exhaustive]
pub struct DirectoryArg {
    /// Migration script directory (default is "migrations")
    #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
    pub directory: Option<PathBuf>,
}

impl DirectoryArg {
    pub fn get(&self) -> Option<&Path> {
        self.directory.as_deref()
    }
}

#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Args, Serialize)]
#[non_exhaustive]
pub struct DbInitArgs {
    #[command(flatten)]
    #[serde(flatten)]
    pub directory: DirectoryArg,

    /// Repository template to use (default is the configured template)
    #[arg(short, long)]
    pub template: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Args, Serialize)]
#[non_exhaustive]
pub struct DbRevisionArgs {
    #[command(flatten)]
    #[serde(flatten)]
    pub directory: DirectoryArg,

    #[command(flatten)]
    #[serde(flatten)]
    pub args: RevisionArgs,
}

/// The `revision` options, without `--autogenerate` which is always on.
///
/// Mirrors the fields of [`RevisionArgs`]; keep the two in sync.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Args, Serialize)]
#[non_exhaustive]
pub struct DbMigrateArgs {
    #[command(flatten)]
    #[serde(flatten)]
    pub directory: DirectoryArg,

    /// Revision message
    #[arg(short, long)]
    pub message: Option<String>,

    /// Don't emit SQL to database - dump to standard output instead
    #[arg(long)]
    pub sql: bool,

    /// Specify head revision or <branchname>@head to base new revision on
    #[arg(long, default_value = HEAD)]
    pub head: String,

    /// Allow a non-head revision as the "head" to splice onto
    #[arg(long)]
    pub splice: bool,

    /// Specify a branch label to apply to the new revision
    #[arg(long)]
    pub branch_label: Option<String>,

    /// Specify specific path from config for version file
    #[arg(long)]
    pub version_path: Option<String>,

    /// Specify a hardcoded revision id instead of generating one
    #[arg(long)]
    pub rev_id: Option<String>,

    /// Additional arguments consumed by custom env.py scripts
    #[arg(short = 'x', long = "x-arg")]
    pub x_arg: Vec<String>,
}

impl DbMigrateArgs {
    fn revision_args(&self) -> RevisionArgs {
        RevisionArgs::builder()
            .maybe_message(self.message.clone())
            .sql(self.sql)
            .head(self.head.clone())
            .splice(self.splice)
            .maybe_branch_label(self.branch_label.clone())
            .maybe_version_path(self.version_path.clone())
            .maybe_rev_id(self.rev_id.clone())
            .build()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Args, Serialize)]
#[non_exhaustive]
pub struct DbEditArgs {
    #[command(flatten)]
    #[serde(flatten)]
    pub directory: DirectoryArg,

    /// Revision identifier
    #[arg(default_value = HEAD)]
    pub revision: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Args, Serialize)]
#[non_exhaustive]
pub struct DbMergeArgs {
    #[command(flatten)]
    #[serde(flatten)]
    pub directory: DirectoryArg,

    #[command(flatten)]
    #[serde(flatten)]
    pub args: MergeArgs,
}

#[derive(Debug, Clone, PartialEq, Eq, Args, Serialize)]
#[non_exhaustive]
pub struct DbUpgradeArgs {
    #[command(flatten)]
    #[serde(flatten)]
    pub directory: DirectoryArg,

    #[command(flatten)]
    #[serde(flatten)]
    pub args: UpgradeArgs,

    /// Additional arguments consumed by custom env.py scripts
    #[arg(short = 'x', long = "x-arg")]
    pub x_arg: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Args, Serialize)]
#[non_exhaustive]
pub struct DbDowngradeArgs {
    #[command(flatten)]
    #[serde(flatten)]
    pub directory: DirectoryArg,

    #[command(flatten)]
    #[serde(flatten)]
    pub args: DowngradeArgs,

    /// Additional arguments consumed by custom env.py scripts
    #[arg(short = 'x', long = "x-arg")]
    pub x_arg: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Args, Serialize)]
#[non_exhaustive]
pub struct DbShowArgs {
    #[command(flatten)]
    #[serde(flatten)]
    pub directory: DirectoryArg,

    /// The revision to show
    #[arg(default_value = HEAD)]
    pub revision: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Args, Serialize)]
#[non_exhaustive]
pub struct DbHistoryArgs {
    #[command(flatten)]
    #[serde(flatten)]
    pub directory: DirectoryArg,

    #[command(flatten)]
    #[serde(flatten)]
    pub args: HistoryArgs,
}

#[derive(Debug, Clone, PartialEq, Eq, Args, Serialize)]
#[non_exhaustive]
pub struct DbHeadsArgs {
    #[command(flatten)]
    #[serde(flatten)]
    pub directory: DirectoryArg,

    #[command(flatten)]
    #[serde(flatten)]
    pub args: HeadsArgs,
}

#[derive(Debug, Clone, PartialEq, Eq, Args, Serialize)]
#[non_exhaustive]
pub struct DbBranchesArgs {
    #[command(flatten)]
    #[serde(flatten)]
    pub directory: DirectoryArg,

    #[command(flatten)]
    #[serde(flatten)]
    pub args: BranchesArgs,
}

#[derive(Debug, Clone, PartialEq, Eq, Args, Serialize)]
#[non_exhaustive]
pub struct DbCurrentArgs {
    #[command(flatten)]
    #[serde(flatten)]
    pub directory: DirectoryArg,

    #[command(flatten)]
    #[serde(flatten)]
    pub args: CurrentArgs,
}

#[derive(Debug, Clone, PartialEq, Eq, Args, Serialize)]
#[non_exhaustive]
pub struct DbStampArgs {
    #[command(flatten)]
    #[serde(flatten)]
    pub directory: DirectoryArg,

    #[command(flatten)]
    #[serde(flatten)]
    pub args: StampArgs,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::args::ONE_STEP_BACK;
    use itertools::Itertools;
    use rstest::rstest;

    fn parse(args: &str) -> DbCommand {
        let args = ["db"].into_iter().chain(args.split(' ')).collect_vec();
        DbArgs::try_parse_from(args).unwrap().command
    }

    #[test]
    #[cfg_attr(coverage_nightly, coverage(off))]
    fn init() {
        let DbCommand::Init(args) = parse("init -d db/migrations -t multidb") else {
            panic!("Expected `init`");
        };

        assert_eq!(args.directory.get(), Some(Path::new("db/migrations")));
        assert_eq!(args.template.as_deref(), Some("multidb"));
    }

    #[test]
    #[cfg_attr(coverage_nightly, coverage(off))]
    fn revision() {
        let DbCommand::Revision(args) = parse(
            "revision -m message --autogenerate --head feature@head --splice --branch-label feature --version-path versions --rev-id abc",
        ) else {
            panic!("Expected `revision`");
        };

        assert_eq!(
            args.args,
            RevisionArgs::builder()
                .message("message")
                .autogenerate(true)
                .head("feature@head")
                .splice(true)
                .branch_label("feature")
                .version_path("versions")
                .rev_id("abc")
                .build()
        );
        assert_eq!(args.directory.get(), None);
    }

    #[test]
    #[cfg_attr(coverage_nightly, coverage(off))]
    fn migrate() {
        let DbCommand::Migrate(args) = parse("migrate -m message --sql -x a --x-arg b") else {
            panic!("Expected `migrate`");
        };

        assert_eq!(
            args.revision_args(),
            RevisionArgs::builder().message("message").sql(true).build()
        );
        assert_eq!(
            extra_args(&args.x_arg),
            Some(ExtraArgs::Many(vec!["a".to_owned(), "b".to_owned()]))
        );
    }

    #[rstest]
    #[case("edit", HEAD)]
    #[case("edit ae1027a6acf", "ae1027a6acf")]
    #[cfg_attr(coverage_nightly, coverage(off))]
    fn edit(#[case] args: &str, #[case] revision: &str) {
        let DbCommand::Edit(args) = parse(args) else {
            panic!("Expected `edit`");
        };

        assert_eq!(args.revision, revision);
    }

    #[test]
    #[cfg_attr(coverage_nightly, coverage(off))]
    fn merge() {
        let DbCommand::Merge(args) = parse("merge a b -m merged --rev-id abc") else {
            panic!("Expected `merge`");
        };

        assert_eq!(
            args.args,
            MergeArgs::builder()
                .revisions(vec!["a".to_owned(), "b".to_owned()])
                .message("merged")
                .rev_id("abc")
                .build()
        );
    }

    #[rstest]
    #[case("upgrade", HEAD, false, None)]
    #[case("upgrade ae1027a6acf --sql --tag t", "ae1027a6acf", true, Some("t"))]
    #[cfg_attr(coverage_nightly, coverage(off))]
    fn upgrade(
        #[case] args: &str,
        #[case] revision: &str,
        #[case] sql: bool,
        #[case] tag: Option<&str>,
    ) {
        let DbCommand::Upgrade(args) = parse(args) else {
            panic!("Expected `upgrade`");
        };

        assert_eq!(args.args.revision, revision);
        assert_eq!(args.args.sql, sql);
        assert_eq!(args.args.tag.as_deref(), tag);
        assert!(args.x_arg.is_empty());
    }

    #[rstest]
    #[case("downgrade", ONE_STEP_BACK)]
    #[case("downgrade -2", "-2")]
    #[case("downgrade base", "base")]
    #[cfg_attr(coverage_nightly, coverage(off))]
    fn downgrade(#[case] args: &str, #[case] revision: &str) {
        let DbCommand::Downgrade(args) = parse(args) else {
            panic!("Expected `downgrade`");
        };

        assert_eq!(args.args.revision, revision);
    }

    #[test]
    #[cfg_attr(coverage_nightly, coverage(off))]
    fn show() {
        let DbCommand::Show(args) = parse("show") else {
            panic!("Expected `show`");
        };

        assert_eq!(args.revision, HEAD);
    }

    #[test]
    #[cfg_attr(coverage_nightly, coverage(off))]
    fn history() {
        let DbCommand::History(args) = parse("history -r base:head -v -i") else {
            panic!("Expected `history`");
        };

        assert_eq!(
            args.args,
            HistoryArgs::builder()
                .rev_range("base:head")
                .verbose(true)
                .indicate_current(true)
                .build()
        );
    }

    #[test]
    #[cfg_attr(coverage_nightly, coverage(off))]
    fn heads_branches_current() {
        let DbCommand::Heads(heads) = parse("heads -v --resolve-dependencies") else {
            panic!("Expected `heads`");
        };
        let DbCommand::Branches(branches) = parse("branches --verbose") else {
            panic!("Expected `branches`");
        };
        let DbCommand::Current(current) = parse("current --head-only") else {
            panic!("Expected `current`");
        };

        assert_eq!(
            heads.args,
            HeadsArgs::builder()
                .verbose(true)
                .resolve_dependencies(true)
                .build()
        );
        assert!(branches.args.verbose);
        assert!(current.args.head_only);
        assert!(!current.args.verbose);
    }

    #[test]
    #[cfg_attr(coverage_nightly, coverage(off))]
    fn stamp() {
        let DbCommand::Stamp(args) = parse("stamp base --sql") else {
            panic!("Expected `stamp`");
        };

        assert_eq!(args.args.revision, "base");
        assert!(args.args.sql);
    }

    #[test]
    #[cfg_attr(coverage_nightly, coverage(off))]
    fn serialize() {
        let command = parse("downgrade --sql -x a -x b");

        insta::assert_json_snapshot!(command, @r#"
        {
          "type": "Downgrade",
          "revision": "-1",
          "sql": true,
          "x_arg": [
            "a",
            "b"
          ]
        }
        "#);
    }
}
