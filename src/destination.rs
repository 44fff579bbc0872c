//! Where finished backups are copied to.
//!
//! The raw `--destination` value is checked once, before any course is
//! looked up or any backup session is opened.  Writability is checked by
//! actually opening something rather than by reading permission bits, so the
//! answer matches what the later copy will see (ACLs, read-only mounts, root).

use std::{
    fs::OpenOptions,
    path::{Path, PathBuf},
};

use crate::error::BackupError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    /// Each backup lands in this directory under its generated filename.
    Directory(PathBuf),
    /// The single backup is written to exactly this path.
    File(PathBuf),
}

impl Destination {
    /// Validate `raw` for a run that is (or is not) a category backup.
    ///
    /// Trailing slashes are ignored; a bare `/` stays the root directory.
    pub fn resolve(raw: &str, category: bool) -> Result<Self, BackupError> {
        let trimmed = raw.trim_end_matches('/');
        let path = PathBuf::from(if trimmed.is_empty() { "/" } else { trimmed });

        if path.is_dir() {
            if !dir_is_writable(&path) {
                return Err(BackupError::DestinationDirNotWritable);
            }
            return Ok(Self::Directory(path));
        }

        if path.is_file() && !file_is_writable(&path) {
            return Err(BackupError::DestinationFileNotWritable);
        }

        if category {
            return Err(BackupError::CategoryToFile);
        }

        if !path.exists() {
            let parent = match path.parent() {
                Some(p) if !p.as_os_str().is_empty() => p,
                _ => Path::new("."),
            };
            if !parent.is_dir() || !dir_is_writable(parent) {
                return Err(BackupError::DestinationFileNotWritable);
            }
        }

        Ok(Self::File(path))
    }

    /// Full path a backup called `filename` is written to.
    pub fn final_path(&self, filename: &str) -> PathBuf {
        match self {
            Self::Directory(dir) => dir.join(filename),
            Self::File(file) => file.clone(),
        }
    }
}

/// Create (and immediately drop) an anonymous temp file inside `dir`.
fn dir_is_writable(dir: &Path) -> bool {
    tempfile::tempfile_in(dir).is_ok()
}

/// Open for append without creating or truncating anything.
fn file_is_writable(file: &Path) -> bool {
    OpenOptions::new().append(true).open(file).is_ok()
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn existing_directory_resolves_to_directory() {
        let dir = tempfile::tempdir().unwrap();
        let raw = format!("{}/", dir.path().display());
        assert_eq!(
            Destination::resolve(&raw, true).unwrap(),
            Destination::Directory(dir.path().to_path_buf())
        );
    }

    #[test]
    fn directory_final_path_appends_filename() {
        let d = Destination::Directory("/srv/backups".into());
        assert_eq!(
            d.final_path("backup-moodle2-course-2.mbz"),
            PathBuf::from("/srv/backups/backup-moodle2-course-2.mbz")
        );
    }

    #[test]
    fn file_final_path_ignores_filename() {
        let d = Destination::File("/srv/backups/course_2.mbz".into());
        assert_eq!(
            d.final_path("whatever.mbz"),
            PathBuf::from("/srv/backups/course_2.mbz")
        );
    }

    #[test]
    fn new_file_in_writable_dir_is_accepted_for_course() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("course_2.mbz");
        assert_eq!(
            Destination::resolve(target.to_str().unwrap(), false).unwrap(),
            Destination::File(target)
        );
    }

    #[test]
    fn existing_file_is_accepted_for_course() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("old.mbz");
        fs::write(&target, "old").unwrap();
        assert_eq!(
            Destination::resolve(target.to_str().unwrap(), false).unwrap(),
            Destination::File(target.clone())
        );
        // Probing must not touch the content.
        assert_eq!(fs::read_to_string(&target).unwrap(), "old");
    }

    #[test]
    fn category_cannot_target_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("all.mbz");
        assert!(matches!(
            Destination::resolve(target.to_str().unwrap(), true),
            Err(BackupError::CategoryToFile)
        ));
    }

    #[test]
    fn file_below_a_regular_file_is_not_writable() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "").unwrap();
        let target = blocker.join("course.mbz");
        assert!(matches!(
            Destination::resolve(target.to_str().unwrap(), false),
            Err(BackupError::DestinationFileNotWritable)
        ));
    }

    #[test]
    fn file_in_missing_directory_is_not_writable() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("missing").join("course.mbz");
        assert!(matches!(
            Destination::resolve(target.to_str().unwrap(), false),
            Err(BackupError::DestinationFileNotWritable)
        ));
    }

    #[test]
    #[cfg(target_os = "linux")]
    fn directory_refusing_new_files_is_not_writable() {
        // procfs refuses new files even for root.
        assert!(matches!(
            Destination::resolve("/proc/", true),
            Err(BackupError::DestinationDirNotWritable)
        ));
    }
}
