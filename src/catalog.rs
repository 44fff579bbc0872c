//! Site catalog: the course, category and user records backups are taken of.
//!
//! The catalog is read once from a TOML file and then only queried.  Lookups
//! mirror what the site database offers: must-exist lookups return
//! [`BackupError::RecordNotFound`], list queries return records ordered by id.
//!
//! ```toml
//! siteadmins = [2]
//!
//! [[user]]
//! id = 2
//! username = "admin"
//!
//! [[category]]
//! id = 1
//! name = "Miscellaneous"
//! path = "/1"
//!
//! [[course]]
//! id = 2
//! fullname = "Mathematics 101"
//! shortname = "MATH101"
//! category = 1
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::BackupError;

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct Course {
    pub id: i64,
    pub fullname: String,
    pub shortname: String,
    pub category: i64,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct Category {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    /// Ids of every ancestor and the category itself, e.g. `/1/5/7`.
    pub path: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub username: String,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Catalog {
    #[serde(default)]
    pub siteadmins: Vec<i64>,
    #[serde(default, rename = "user")]
    pub users: Vec<User>,
    #[serde(default, rename = "category")]
    pub categories: Vec<Category>,
    #[serde(default, rename = "course")]
    pub courses: Vec<Course>,
}

impl Catalog {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading catalog {}", path.display()))?;
        let catalog: Self =
            toml::from_str(&text).with_context(|| format!("parsing catalog {}", path.display()))?;
        tracing::debug!(
            courses = catalog.courses.len(),
            categories = catalog.categories.len(),
            users = catalog.users.len(),
            "loaded catalog {}",
            path.display()
        );
        Ok(catalog)
    }

    /// The primary site administrator: the first `siteadmins` entry that
    /// names an existing user.
    pub fn admin(&self) -> Option<&User> {
        self.siteadmins
            .iter()
            .find_map(|id| self.users.iter().find(|u| u.id == *id))
    }

    pub fn course_by_id(&self, id: i64) -> Result<&Course, BackupError> {
        self.courses
            .iter()
            .find(|c| c.id == id)
            .ok_or_else(|| BackupError::not_found("course", "id", id))
    }

    pub fn course_by_shortname(&self, shortname: &str) -> Result<&Course, BackupError> {
        self.courses
            .iter()
            .find(|c| c.shortname == shortname)
            .ok_or_else(|| BackupError::not_found("course", "shortname", shortname))
    }

    pub fn category_by_id(&self, id: i64) -> Result<&Category, BackupError> {
        self.categories
            .iter()
            .find(|c| c.id == id)
            .ok_or_else(|| BackupError::not_found("course_categories", "id", id))
    }

    /// Courses placed directly in category `id`, ordered by course id.
    pub fn courses_in_category(&self, id: i64) -> Vec<&Course> {
        let mut found: Vec<&Course> = self.courses.iter().filter(|c| c.category == id).collect();
        found.sort_by_key(|c| c.id);
        found
    }

    /// Every category below `category`, at any depth, ordered by id.
    ///
    /// A category is a descendant when its path contains `/<id>/`.  The
    /// category's own path ends in `/<id>` and therefore never matches.
    pub fn descendant_categories(&self, category: &Category) -> Vec<&Category> {
        let needle = format!("/{}/", category.id);
        let mut found: Vec<&Category> = self
            .categories
            .iter()
            .filter(|c| c.path.contains(&needle))
            .collect();
        found.sort_by_key(|c| c.id);
        found
    }
}
