//! Command-line interface definition.
//!
//! All argument parsing lives here so the rest of the codebase can stay
//! agnostic to `clap`.  The `Cli` struct is parsed once in `main`; the
//! course-selector flags are then folded into a typed [`Selection`] by
//! [`Cli::selection`], which is the only place their combinations are
//! checked.

use std::path::PathBuf;

use clap::Parser;
use thiserror::Error;

const EXAMPLES: &str = "\
Examples:
  course-backup --courseid=2 --destination=/srv/backup/course_2.mbz
  course-backup --categoryid=2 -r --destination=/srv/backup/";

/// Top-level CLI arguments.
#[derive(Parser, Debug)]
#[command(
    name    = "course-backup",
    about   = "Perform backup of the given course or category",
    version,
    after_help = EXAMPLES,
    help_template = "\
{before-help}{name} {version}
{about}

{usage-heading} {usage}

{all-args}{after-help}"
)]
pub struct Cli {
    /// Course ID to backup.
    #[arg(long, value_name = "INTEGER", value_parser = clap::value_parser!(i64).range(1..))]
    pub courseid: Option<i64>,

    /// Course shortname for backup.
    #[arg(long, value_name = "STRING")]
    pub courseshortname: Option<String>,

    /// Category ID to backup.
    #[arg(long, value_name = "INTEGER", value_parser = clap::value_parser!(i64).range(1..))]
    pub categoryid: Option<i64>,

    /// Recursively backup all subcategories (with --categoryid).
    #[arg(short = 'r', long = "r")]
    pub recursive: bool,

    /// Directory or filename to store backup(s).
    ///
    /// A directory receives one file per course, named after the generated
    /// backup filename.  A file path is only accepted for single-course
    /// backups.
    #[arg(long, value_name = "STRING")]
    pub destination: Option<String>,

    /// Path to the configuration file.
    #[arg(short, long, default_value = "course-backup.toml")]
    pub config: PathBuf,

    /// Print the parsed configuration and exit without running anything.
    #[arg(long)]
    pub print_config: bool,

    /// Increase diagnostic logging on stderr (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Which courses to back up, as chosen on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    CourseId(i64),
    CourseShortname(String),
    Category { id: i64, recursive: bool },
}

impl Selection {
    /// Category backups may fan out to many courses, so they can only target
    /// a directory.
    pub const fn is_category(&self) -> bool {
        matches!(self, Self::Category { .. })
    }
}

/// Flag combinations that cannot be run.  `main` answers all of these by
/// printing the help text.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum UsageError {
    #[error("exactly one of --courseid, --courseshortname or --categoryid is required")]
    Selector,
    #[error("--destination is required")]
    MissingDestination,
}

impl Cli {
    /// Fold the selector flags into a [`Selection`].
    ///
    /// Exactly one selector must be present and `--destination` must be a
    /// non-empty string.  `--r` only matters together with `--categoryid`.
    pub fn selection(&self) -> Result<Selection, UsageError> {
        let selection = match (
            self.courseid,
            self.courseshortname.as_deref().filter(|s| !s.is_empty()),
            self.categoryid,
        ) {
            (Some(id), None, None) => Selection::CourseId(id),
            (None, Some(name), None) => Selection::CourseShortname(name.to_string()),
            (None, None, Some(id)) => Selection::Category {
                id,
                recursive: self.recursive,
            },
            _ => return Err(UsageError::Selector),
        };

        if self.destination.as_deref().is_none_or(str::is_empty) {
            return Err(UsageError::MissingDestination);
        }

        Ok(selection)
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
