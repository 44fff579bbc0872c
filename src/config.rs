//! Configuration types and loading logic.
//!
//! `Config` is a direct mapping of `course-backup.toml`.  Every field has a
//! default, so the file is entirely optional.  Two files are read and merged
//! field by field: a global one (see [`global_config_path`]) and the local
//! one given by `--config`.  Local values win.
//!
//! # File format
//!
//! ```toml
//! [site]
//! dataroot = "/var/sitedata"
//! catalog  = "/var/sitedata/catalog.toml"   # optional
//!
//! [backup]
//! users     = true    # include enrolled users
//! anonymize = false   # anonymise user information
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

// ─── Top-level ────────────────────────────────────────────────────────────────

/// Fully resolved configuration.
#[derive(Debug, Deserialize, Serialize, Default, Clone, PartialEq)]
pub struct Config {
    /// Where the site keeps its data.
    #[serde(default)]
    pub site: SiteConfig,

    /// Default plan settings for every backup.
    #[serde(default)]
    pub backup: BackupConfig,
}

// ─── [site] ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SiteConfig {
    /// Site data root.  Holds the catalog, the course file areas and the
    /// temporary backup working directories.
    pub dataroot: PathBuf,

    /// Catalog of courses, categories and users.  Defaults to
    /// `<dataroot>/catalog.toml`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog: Option<PathBuf>,
}

impl SiteConfig {
    pub fn catalog_path(&self) -> PathBuf {
        self.catalog
            .clone()
            .unwrap_or_else(|| self.dataroot.join("catalog.toml"))
    }
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            dataroot: PathBuf::from("./sitedata"),
            catalog: None,
        }
    }
}

// ─── [backup] ─────────────────────────────────────────────────────────────────

/// Plan settings every backup session starts from.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
pub struct BackupConfig {
    /// Include user data (enrolments, submissions).  `false` adds `-nu` to
    /// the generated filename.
    #[serde(default = "default_users")]
    pub users: bool,

    /// Anonymise included user data.  Adds `-an` to the generated filename.
    #[serde(default)]
    pub anonymize: bool,
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            users: default_users(),
            anonymize: false,
        }
    }
}

pub fn default_users() -> bool {
    true
}

// ─── Partial config (merge layer) ─────────────────────────────────────────────

/// A config file as written on disk: every field optional so that two files
/// can be layered.
#[derive(Debug, Deserialize, Default)]
pub struct PartialConfig {
    #[serde(default)]
    pub site: PartialSite,
    #[serde(default)]
    pub backup: PartialBackup,
}

#[derive(Debug, Deserialize, Default)]
pub struct PartialSite {
    pub dataroot: Option<PathBuf>,
    pub catalog: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Default)]
pub struct PartialBackup {
    pub users: Option<bool>,
    pub anonymize: Option<bool>,
}

impl PartialConfig {
    /// Layer `other` on top of `self`; fields set in `other` win.
    pub fn merge(self, other: Self) -> Self {
        Self {
            site: PartialSite {
                dataroot: other.site.dataroot.or(self.site.dataroot),
                catalog: other.site.catalog.or(self.site.catalog),
            },
            backup: PartialBackup {
                users: other.backup.users.or(self.backup.users),
                anonymize: other.backup.anonymize.or(self.backup.anonymize),
            },
        }
    }

    /// Fill every unset field with its default.
    pub fn resolve(self) -> Config {
        let site = SiteConfig::default();
        let backup = BackupConfig::default();
        Config {
            site: SiteConfig {
                dataroot: self.site.dataroot.unwrap_or(site.dataroot),
                catalog: self.site.catalog,
            },
            backup: BackupConfig {
                users: self.backup.users.unwrap_or(backup.users),
                anonymize: self.backup.anonymize.unwrap_or(backup.anonymize),
            },
        }
    }
}

// ─── Loader ───────────────────────────────────────────────────────────────────

/// `~/.config/course-backup/config.toml`, when a config dir is known.
pub fn global_config_path() -> Option<PathBuf> {
    dirs_next::config_dir().map(|d| d.join("course-backup").join("config.toml"))
}

/// Read one layer.  `Ok(None)` when the file does not exist; an error when
/// it exists but cannot be read or is not valid TOML.
pub fn parse_partial(path: &Path) -> Result<Option<PartialConfig>> {
    if !path.exists() {
        return Ok(None);
    }

    let text =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;

    toml::from_str(&text)
        .map(Some)
        .with_context(|| format!("parsing {}", path.display()))
}

/// Load the global layer (if any) and the local layer, and merge them.
pub fn load_merged(local_path: &Path) -> Result<Config> {
    let global = match global_config_path() {
        Some(p) => parse_partial(&p)?.unwrap_or_default(),
        None => PartialConfig::default(),
    };

    let local = match parse_partial(local_path)? {
        Some(p) => p,
        None => {
            tracing::warn!(
                "config file '{}' not found, using defaults",
                local_path.display()
            );
            PartialConfig::default()
        },
    };

    Ok(global.merge(local).resolve())
}

// ─── Tests ────────────────────────────────────────────────────────────────────
