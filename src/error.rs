//! Errors that stop a run before or during the course loop.
//!
//! The display strings are the exact lines printed to the operator, so
//! `main` prints them without any decoration.  Infrastructure failures
//! (unreadable catalog, engine I/O) travel as `anyhow::Error` inside
//! [`BackupError::Engine`] or directly through `main`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BackupError {
    #[error("Error: No admin account was found")]
    NoAdmin,

    #[error("Destination directory does not exists or not writable.")]
    DestinationDirNotWritable,

    #[error("Destination file is not writable.")]
    DestinationFileNotWritable,

    #[error("You cannot backup entire Category to a file.")]
    CategoryToFile,

    /// A must-exist lookup matched nothing.
    #[error("Can't find data record in database table {table} ({field} = {value}).")]
    RecordNotFound {
        table: &'static str,
        field: &'static str,
        value: String,
    },

    /// The engine failed while backing up one course.
    #[error("Backup of {course} failed: {source:#}")]
    Engine {
        course: String,
        #[source]
        source: anyhow::Error,
    },
}

impl BackupError {
    pub fn not_found(table: &'static str, field: &'static str, value: impl ToString) -> Self {
        Self::RecordNotFound {
            table,
            field,
            value: value.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_not_found_names_table_and_key() {
        let err = BackupError::not_found("course", "shortname", "NOPE");
        assert_eq!(
            err.to_string(),
            "Can't find data record in database table course (shortname = NOPE)."
        );
    }

    #[test]
    fn engine_error_includes_context_chain() {
        let source = anyhow::anyhow!("disk full").context("writing archive");
        let err = BackupError::Engine {
            course: "Maths".into(),
            source,
        };
        assert_eq!(
            err.to_string(),
            "Backup of Maths failed: writing archive: disk full"
        );
    }
}
