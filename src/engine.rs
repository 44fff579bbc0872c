//! Backup engine seam and the local engine behind it.
//!
//! The orchestration in [`crate::commands::run`] only talks to the
//! [`BackupEngine`] / [`BackupSession`] traits.  A session follows the same
//! life cycle for every course:
//!
//! ```text
//! open ─► plan_mut().filename = … ─► finish_ui ─► execute_plan ─► results ─► destroy
//! ```
//!
//! [`LocalEngine`] is the implementation the binary uses.  It writes a JSON
//! archive manifest into the course backup file area under the site data
//! root:
//!
//! ```text
//! <dataroot>/temp/backup/backup-<id>-XXXX/   working directory, one per session
//! <dataroot>/filedir/course/<id>/backup/     course backup file area
//! ```

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Local};
use serde::Serialize;

use crate::{catalog::Course, config::BackupConfig};

/// Archive format written by every session.
pub const FORMAT_MOODLE: &str = "moodle2";
/// Backup type for a whole single course.
pub const TYPE_COURSE: &str = "course";

const MANIFEST_NAME: &str = "moodle_backup.json";

// ─── Seam ─────────────────────────────────────────────────────────────────────

/// Settings of one backup plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Plan {
    pub users: bool,
    pub anonymize: bool,
    pub filename: Option<String>,
}

impl From<BackupConfig> for Plan {
    fn from(cfg: BackupConfig) -> Self {
        Self {
            users: cfg.users,
            anonymize: cfg.anonymize,
            filename: None,
        }
    }
}

pub trait BackupEngine {
    type Session: BackupSession;

    /// Build a backup plan for `course`, run on behalf of `user_id`.
    fn open(&self, course: &Course, user_id: i64) -> Result<Self::Session>;
}

pub trait BackupSession {
    fn format(&self) -> &str;
    fn kind(&self) -> &str;
    fn course_id(&self) -> i64;
    fn plan(&self) -> &Plan;
    fn plan_mut(&mut self) -> &mut Plan;

    /// Freeze the plan settings.  Must precede [`Self::execute_plan`].
    fn finish_ui(&mut self);

    fn execute_plan(&mut self) -> Result<()>;

    /// Take the stored archive.  `None` when the engine produced nothing or
    /// it was already taken.
    fn results(&mut self) -> Option<StoredFile>;

    /// Release everything the session holds.
    fn destroy(self) -> Result<()>
    where
        Self: Sized;
}

// ─── Stored file ──────────────────────────────────────────────────────────────

/// An archive sitting in a course backup file area.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    path: PathBuf,
}

impl StoredFile {
    pub const fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether `dest` names this very file, through symlinks or `..` too.
    pub fn is_at(&self, dest: &Path) -> bool {
        match (fs::canonicalize(&self.path), fs::canonicalize(dest)) {
            (Ok(own), Ok(other)) => own == other,
            _ => false,
        }
    }

    /// Refuses to copy onto itself: `fs::copy` would truncate the source.
    pub fn copy_content_to(&self, dest: &Path) -> io::Result<u64> {
        if self.is_at(dest) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} is the stored file itself", dest.display()),
            ));
        }
        fs::copy(&self.path, dest)
    }

    pub fn delete(self) -> io::Result<()> {
        fs::remove_file(&self.path)
    }
}

// ─── Filenames ────────────────────────────────────────────────────────────────

/// Default archive name for a backup taken at `when`:
///
/// ```text
/// backup-<format>-<kind>-<id>[-<shortname>]-<YYYYMMDD-HHMM>[-nu|-an].mbz
/// ```
///
/// `-nu` marks a backup without users, `-an` one with anonymised users.
pub fn default_backup_filename(
    format: &str,
    kind: &str,
    id: i64,
    shortname: Option<&str>,
    users: bool,
    anonymised: bool,
    when: DateTime<Local>,
) -> String {
    let shortname = shortname
        .map(|s| clean_segment(&s.replace(' ', "_")).to_lowercase())
        .filter(|s| !s.is_empty())
        .map(|s| format!("-{s}"))
        .unwrap_or_default();

    let date = when.format("%Y%m%d-%H%M");

    let info = if !users {
        "-nu"
    } else if anonymised {
        "-an"
    } else {
        ""
    };

    format!("backup-{format}-{kind}-{id}{shortname}-{date}{info}.mbz")
}

/// Drop characters that are not allowed in a stored filename and trim
/// surrounding underscores.
fn clean_segment(s: &str) -> String {
    s.chars()
        .filter(|c| !c.is_control() && !"&<>\"`|':\\/*?".contains(*c))
        .collect::<String>()
        .trim_matches('_')
        .to_string()
}

// ─── Local engine ─────────────────────────────────────────────────────────────

pub struct LocalEngine {
    dataroot: PathBuf,
    defaults: BackupConfig,
}

impl LocalEngine {
    pub fn new(dataroot: impl Into<PathBuf>, defaults: BackupConfig) -> Self {
        Self {
            dataroot: dataroot.into(),
            defaults,
        }
    }
}

/// Backup file area of course `id`.
pub fn backup_area(dataroot: &Path, id: i64) -> PathBuf {
    dataroot
        .join("filedir")
        .join("course")
        .join(id.to_string())
        .join("backup")
}

impl BackupEngine for LocalEngine {
    type Session = LocalSession;

    fn open(&self, course: &Course, user_id: i64) -> Result<LocalSession> {
        let temp_root = self.dataroot.join("temp").join("backup");
        fs::create_dir_all(&temp_root)
            .with_context(|| format!("creating {}", temp_root.display()))?;

        let workdir = tempfile::Builder::new()
            .prefix(&format!("backup-{}-", course.id))
            .tempdir_in(&temp_root)
            .with_context(|| format!("creating working directory in {}", temp_root.display()))?;

        tracing::debug!(course = course.id, workdir = %workdir.path().display(), "opened backup session");

        Ok(LocalSession {
            course: course.clone(),
            user_id,
            plan: Plan::from(self.defaults),
            area: backup_area(&self.dataroot, course.id),
            workdir,
            ui_finished: false,
            result: None,
        })
    }
}

pub struct LocalSession {
    course: Course,
    user_id: i64,
    plan: Plan,
    area: PathBuf,
    workdir: tempfile::TempDir,
    ui_finished: bool,
    result: Option<StoredFile>,
}

impl LocalSession {
    #[cfg(test)]
    pub fn workdir(&self) -> &Path {
        self.workdir.path()
    }
}

/// What ends up inside the archive.
#[derive(Serialize)]
struct Manifest<'a> {
    format: &'a str,
    kind: &'a str,
    course: &'a Course,
    settings: &'a Plan,
    created_by: i64,
    created_at: String,
}

impl BackupSession for LocalSession {
    fn format(&self) -> &str {
        FORMAT_MOODLE
    }

    fn kind(&self) -> &str {
        TYPE_COURSE
    }

    fn course_id(&self) -> i64 {
        self.course.id
    }

    fn plan(&self) -> &Plan {
        &self.plan
    }

    fn plan_mut(&mut self) -> &mut Plan {
        &mut self.plan
    }

    fn finish_ui(&mut self) {
        self.ui_finished = true;
    }

    fn execute_plan(&mut self) -> Result<()> {
        if !self.ui_finished {
            bail!("backup plan executed before its settings were finished");
        }
        let filename = self
            .plan
            .filename
            .clone()
            .context("backup plan has no filename")?;

        let manifest = Manifest {
            format: FORMAT_MOODLE,
            kind: TYPE_COURSE,
            course: &self.course,
            settings: &self.plan,
            created_by: self.user_id,
            created_at: Local::now().to_rfc3339(),
        };
        let staged = self.workdir.path().join(MANIFEST_NAME);
        let bytes = serde_json::to_vec_pretty(&manifest).context("serialising manifest")?;
        fs::write(&staged, bytes).with_context(|| format!("writing {}", staged.display()))?;

        fs::create_dir_all(&self.area)
            .with_context(|| format!("creating {}", self.area.display()))?;
        let stored = self.area.join(&filename);
        fs::copy(&staged, &stored).with_context(|| format!("storing {}", stored.display()))?;

        tracing::info!(course = self.course.id, file = %stored.display(), "backup stored");
        self.result = Some(StoredFile::new(stored));
        Ok(())
    }

    fn results(&mut self) -> Option<StoredFile> {
        self.result.take()
    }

    fn destroy(self) -> Result<()> {
        let path = self.workdir.path().to_path_buf();
        self.workdir
            .close()
            .with_context(|| format!("removing {}", path.display()))
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
