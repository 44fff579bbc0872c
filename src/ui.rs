//! Terminal output — headings, trace lines, the engine spinner and the
//! per-course summary.
//!
//! Headings and trace lines are written to a caller-supplied writer so a run
//! can be captured; the summary goes to stdout and failures to stderr.
//! Diagnostic logging is separate and handled by `tracing`.
//!
//! [`CourseOutcome`] is plain data: [`crate::commands::run`] builds one per
//! course and tests assert on it without capturing the terminal.

use std::{
    io::{self, Write},
    path::PathBuf,
    time::Duration,
};

use console::style;
use indicatif::{ProgressBar, ProgressStyle};

// ─── Messages ─────────────────────────────────────────────────────────────────

pub const MSG_COMPLETED: &str = "Backup completed.";
pub const MSG_IN_COURSE_AREA: &str =
    "Backup completed, the new file is listed in the backup area of the given course";
pub const MSG_COPY_FAILED: &str = "Destination directory does not exist or is not writable. \
                                   Leaving the backup in the course backup file area.";

// ─── Icons ───────────────────────────────────────────────────────────────────

/// Braille spinner frames — same style as indicatif's default.
static SPINNER_CHARS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";

fn icon_ok() -> console::StyledObject<&'static str> {
    style("✓").green().bold()
}
fn icon_warn() -> console::StyledObject<&'static str> {
    style("!").yellow().bold()
}
fn icon_err() -> console::StyledObject<&'static str> {
    style("✗").red().bold()
}
fn icon_done() -> console::StyledObject<&'static str> {
    style("✓").cyan().bold()
}

// ─── Course outcome ───────────────────────────────────────────────────────────

/// Where a course's backup ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    /// Copied to the destination; the file area copy was removed.
    Relocated(PathBuf),
    /// Left in the course backup file area, as requested.
    InCourseArea(Option<PathBuf>),
    /// The copy failed; the backup is still in the course file area.
    CopyFailed { stored: PathBuf, target: PathBuf },
    /// The engine produced no archive to relocate.
    NoArtifact,
    /// The engine failed; `main` prints the error.
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseOutcome {
    pub course_id: i64,
    /// `"<fullname> (<shortname>)"`.
    pub label: String,
    pub filename: String,
    pub status: Status,
}

impl CourseOutcome {
    /// Soft failures count too: the run goes on, but the summary lists them.
    pub const fn failed(&self) -> bool {
        matches!(self.status, Status::CopyFailed { .. } | Status::Failed)
    }

    pub fn print(&self) {
        let id = style(format!("#{}", self.course_id)).dim();
        match &self.status {
            Status::Relocated(path) => {
                println!("  {}  {} {id}", icon_ok(), style(&self.label).bold());
                println!("     {}", style(path.display()).dim());
            },
            Status::InCourseArea(_) => {
                println!("  {}  {} {id}", icon_ok(), style(&self.label).bold());
                println!("     {} (course backup area)", style(&self.filename).dim());
            },
            Status::NoArtifact => {
                println!("  {}  {} {id}", icon_ok(), style(&self.label).bold());
            },
            Status::CopyFailed { stored, target } => {
                println!("  {}  {} {id}", icon_warn(), style(&self.label).bold());
                println!("     could not write {}", style(target.display()).dim());
                println!("     kept at {}", style(stored.display()).dim());
            },
            Status::Failed => {
                println!("  {}  {} {id}", icon_err(), style(&self.label).bold());
            },
        }
    }
}

// ─── Trace output ─────────────────────────────────────────────────────────────

/// Banner printed before each course.
pub fn heading(out: &mut dyn Write, text: &str) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", style(text).bold())?;
    writeln!(out, "{}", style("=".repeat(text.chars().count())).dim())
}

/// One plain line of progress output.
pub fn trace(out: &mut dyn Write, text: &str) -> io::Result<()> {
    writeln!(out, "{text}")
}

/// A fatal precondition or lookup failure.
pub fn fatal(text: &str) {
    eprintln!("{}", style(text).red());
}

// ─── Spinner ──────────────────────────────────────────────────────────────────

/// Indeterminate spinner shown while the engine runs.  Hidden automatically
/// when stderr is not a terminal.
pub fn spinner(label: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(s) = ProgressStyle::with_template("  {spinner:.cyan}  {msg}") {
        pb.set_style(s.tick_chars(SPINNER_CHARS));
    }
    pb.set_message(format!("{}", style(label).dim()));
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

// ─── Summary banner ───────────────────────────────────────────────────────────

pub fn print_summary(outcomes: &[CourseOutcome]) {
    println!();
    for o in outcomes {
        o.print();
    }

    let failed: Vec<&CourseOutcome> = outcomes.iter().filter(|o| o.failed()).collect();
    println!();
    if outcomes.is_empty() {
        println!("  {}", style("No courses to back up.").dim());
    } else if failed.is_empty() {
        println!(
            "  {} {}",
            icon_done(),
            style(format!("{} course(s) backed up.", outcomes.len()))
                .cyan()
                .bold()
        );
    } else {
        eprintln!(
            "  {}  {}",
            icon_err(),
            style(format!("{} of {} course(s) need attention.", failed.len(), outcomes.len()))
                .red()
                .bold()
        );
        for o in &failed {
            eprintln!("    {} {}", icon_err(), style(&o.label).red());
        }
    }
    println!();
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(status: Status) -> CourseOutcome {
        CourseOutcome {
            course_id: 2,
            label: "Welcome (WELCOME)".into(),
            filename: "b.mbz".into(),
            status,
        }
    }

    #[test]
    fn relocated_and_kept_are_not_failures() {
        assert!(!outcome(Status::Relocated("/x".into())).failed());
        assert!(!outcome(Status::InCourseArea(None)).failed());
        assert!(!outcome(Status::NoArtifact).failed());
    }

    #[test]
    fn copy_and_engine_failures_are_failures() {
        assert!(
            outcome(Status::CopyFailed {
                stored: "/a".into(),
                target: "/b".into(),
            })
            .failed()
        );
        assert!(outcome(Status::Failed).failed());
    }

    #[test]
    fn summary_smoke() {
        // Smoke test: printing must not panic for any mix of outcomes.
        print_summary(&[]);
        print_summary(&[
            outcome(Status::Relocated("/x".into())),
            outcome(Status::CopyFailed {
                stored: "/a".into(),
                target: "/b".into(),
            }),
            outcome(Status::Failed),
        ]);
    }

    #[test]
    fn heading_and_trace_go_to_the_writer() {
        let mut out = Vec::new();
        heading(&mut out, "Performing backup of Welcome (WELCOME)...").unwrap();
        trace(&mut out, MSG_COMPLETED).unwrap();

        let text = console::strip_ansi_codes(&String::from_utf8(out).unwrap()).into_owned();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "");
        assert_eq!(lines[1], "Performing backup of Welcome (WELCOME)...");
        assert_eq!(lines[2].len(), lines[1].len());
        assert!(lines[2].chars().all(|c| c == '='));
        assert_eq!(lines[3], MSG_COMPLETED);
    }

    #[test]
    fn spinner_finishes_cleanly() {
        let pb = spinner("Working");
        pb.finish_and_clear();
        assert!(pb.is_finished());
    }
}
