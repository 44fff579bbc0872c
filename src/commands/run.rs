//! The backup run: preconditions, course resolution and the per-course loop.
//!
//! # Order of checks
//!
//! | # | Step                 | On failure                                  |
//! |---|----------------------|---------------------------------------------|
//! | 1 | Admin account        | abort, nothing looked up                    |
//! | 2 | Destination          | abort, no backup session opened             |
//! | 3 | Course resolution    | abort on an unknown course or category      |
//! | 4 | Per-course backup    | copy failures are reported, the loop goes on |
//!
//! An engine failure on one course destroys that course's session, prints the
//! summary and aborts the run.
//!
//! Headings and trace lines go to the `out` writer (stdout in the binary, a
//! buffer in tests).

use std::io::Write;

use anyhow::Result;
use chrono::Local;

use crate::{
    catalog::{Catalog, Course},
    cli::Selection,
    destination::Destination,
    engine::{BackupEngine, BackupSession, default_backup_filename},
    error::BackupError,
    resolve,
    ui::{self, CourseOutcome, MSG_COMPLETED, MSG_COPY_FAILED, MSG_IN_COURSE_AREA, Status},
};

// ─── Entry point ──────────────────────────────────────────────────────────────

/// Back up every course `selection` resolves to.
///
/// `destination` is the raw `--destination` value; `None` leaves each backup
/// in its course backup file area.
pub fn run<E: BackupEngine>(
    catalog: &Catalog,
    engine: &E,
    selection: &Selection,
    destination: Option<&str>,
    out: &mut dyn Write,
) -> Result<Vec<CourseOutcome>, BackupError> {
    let admin = catalog.admin().ok_or(BackupError::NoAdmin)?;
    tracing::debug!(admin = admin.id, "running backups as {}", admin.username);

    let destination = destination
        .map(|raw| Destination::resolve(raw, selection.is_category()))
        .transpose()?;

    let courses = resolve::courses(catalog, selection)?;

    backup_all(engine, &courses, admin.id, destination.as_ref(), out)
}

/// Run the per-course loop over already resolved courses.
pub fn backup_all<E: BackupEngine>(
    engine: &E,
    courses: &[&Course],
    user_id: i64,
    destination: Option<&Destination>,
    out: &mut dyn Write,
) -> Result<Vec<CourseOutcome>, BackupError> {
    let mut outcomes: Vec<CourseOutcome> = Vec::with_capacity(courses.len());

    for course in courses {
        let label = format!("{} ({})", course.fullname, course.shortname);

        match backup_course(engine, course, &label, user_id, destination, out) {
            Ok((filename, status)) => outcomes.push(CourseOutcome {
                course_id: course.id,
                label,
                filename,
                status,
            }),
            Err(source) => {
                outcomes.push(CourseOutcome {
                    course_id: course.id,
                    label: label.clone(),
                    filename: String::new(),
                    status: Status::Failed,
                });
                ui::print_summary(&outcomes);
                return Err(BackupError::Engine {
                    course: label,
                    source,
                });
            },
        }
    }

    ui::print_summary(&outcomes);
    Ok(outcomes)
}

// ─── One course ───────────────────────────────────────────────────────────────

/// Open a session for `course`, run it, place the archive and destroy the
/// session whatever happened in between.
fn backup_course<E: BackupEngine>(
    engine: &E,
    course: &Course,
    label: &str,
    user_id: i64,
    destination: Option<&Destination>,
    out: &mut dyn Write,
) -> Result<(String, Status)> {
    ui::heading(out, &format!("Performing backup of {label}..."))?;

    let mut session = engine.open(course, user_id)?;
    let result = execute(&mut session, course, destination, out);

    if let Err(e) = session.destroy() {
        tracing::warn!(course = course.id, "could not release backup session: {e:#}");
    }

    result
}

fn execute<S: BackupSession>(
    session: &mut S,
    course: &Course,
    destination: Option<&Destination>,
    out: &mut dyn Write,
) -> Result<(String, Status)> {
    let filename = default_backup_filename(
        session.format(),
        session.kind(),
        session.course_id(),
        Some(&course.shortname),
        session.plan().users,
        session.plan().anonymize,
        Local::now(),
    );
    session.plan_mut().filename = Some(filename.clone());

    session.finish_ui();
    let spinner = ui::spinner("Executing backup plan");
    let executed = session.execute_plan();
    spinner.finish_and_clear();
    executed?;

    let file = session.results();

    let status = match (destination, file) {
        // Copying onto itself would truncate the archive before deleting it.
        (Some(dest), Some(file)) if file.is_at(&dest.final_path(&filename)) => {
            ui::trace(out, MSG_IN_COURSE_AREA)?;
            Status::InCourseArea(Some(file.path().to_path_buf()))
        },
        (Some(dest), Some(file)) => {
            let target = dest.final_path(&filename);
            ui::trace(out, &format!("Writing {}", target.display()))?;
            match file.copy_content_to(&target) {
                Ok(_) => {
                    let stored = file.path().to_path_buf();
                    if let Err(e) = file.delete() {
                        tracing::warn!("could not remove {}: {e}", stored.display());
                    }
                    ui::trace(out, MSG_COMPLETED)?;
                    Status::Relocated(target)
                },
                Err(e) => {
                    tracing::debug!("copy to {} failed: {e}", target.display());
                    ui::trace(out, MSG_COPY_FAILED)?;
                    Status::CopyFailed {
                        stored: file.path().to_path_buf(),
                        target,
                    }
                },
            }
        },
        (Some(_), None) => Status::NoArtifact,
        (None, file) => {
            ui::trace(out, MSG_IN_COURSE_AREA)?;
            Status::InCourseArea(file.map(|f| f.path().to_path_buf()))
        },
    };

    Ok((filename, status))
}

// ─── Tests ────────────────────────────────────────────────────────────────────
