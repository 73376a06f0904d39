//! Local cache store: a versioned JSON snapshot of the collection plus the
//! theme preference, kept under a single directory.

use crate::catalog;
use crate::model::Category;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Version tag written alongside the snapshot. A mismatch on load is treated
/// the same as a missing snapshot, so stale shapes from earlier releases are
/// never parsed into the current model.
pub const CACHE_VERSION: &str = "2";

const DATA_FILE: &str = "board-data.json";
const VERSION_FILE: &str = "board-data.version";
const THEME_FILE: &str = "board-theme";

/// Theme preference persisted next to the data snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Theme {
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "light" => Some(Theme::Light),
            "dark" => Some(Theme::Dark),
            _ => None,
        }
    }
}

/// Error from cache I/O. Only surfaced to callers that explicitly ask for
/// it; the load/save entry points below degrade instead of propagating.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("cache io error: {0}")]
    Io(#[from] io::Error),
    #[error("cache parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// File-backed store for the collection snapshot and theme preference.
///
/// The running session's in-memory collection stays authoritative: writes
/// that fail are logged and swallowed, reads that fail fall back to the
/// default catalog.
pub struct CacheStore {
    dir: PathBuf,
}

impl CacheStore {
    /// Create a store rooted at `dir`. The directory is created on demand by
    /// the first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn data_path(&self) -> PathBuf {
        self.dir.join(DATA_FILE)
    }

    fn version_path(&self) -> PathBuf {
        self.dir.join(VERSION_FILE)
    }

    fn theme_path(&self) -> PathBuf {
        self.dir.join(THEME_FILE)
    }

    /// Load the cached collection.
    ///
    /// Returns the snapshot when it exists, carries the current version tag,
    /// and parses as a category list. Anything else (absent, version drift,
    /// malformed JSON) falls back to a fresh default catalog, which is
    /// immediately persisted as the new cache.
    pub fn load(&self) -> Vec<Category> {
        match self.try_load() {
            Ok(Some(categories)) => categories,
            Ok(None) => self.reseed(),
            Err(err) => {
                warn!("discarding unreadable cache snapshot: {}", err);
                self.reseed()
            }
        }
    }

    fn try_load(&self) -> Result<Option<Vec<Category>>, CacheError> {
        let version = match read_if_exists(&self.version_path())? {
            Some(version) => version,
            None => return Ok(None),
        };
        if version.trim() != CACHE_VERSION {
            debug!(
                "cache version {:?} does not match {:?}, reseeding",
                version.trim(),
                CACHE_VERSION
            );
            return Ok(None);
        }
        let payload = match read_if_exists(&self.data_path())? {
            Some(payload) => payload,
            None => return Ok(None),
        };
        let categories: Vec<Category> = serde_json::from_str(&payload)?;
        Ok(Some(categories))
    }

    fn reseed(&self) -> Vec<Category> {
        let defaults = catalog::default_categories();
        self.save(&defaults);
        defaults
    }

    /// Persist the full collection and the current version tag.
    ///
    /// Never propagates failures: the in-memory collection remains the
    /// source of truth for the running session, so a failed write only
    /// costs the next cold start its cache.
    pub fn save(&self, categories: &[Category]) {
        if let Err(err) = self.try_save(categories) {
            warn!("failed to persist cache snapshot: {}", err);
        }
    }

    fn try_save(&self, categories: &[Category]) -> Result<(), CacheError> {
        fs::create_dir_all(&self.dir)?;
        let payload = serde_json::to_string(categories)?;
        fs::write(self.data_path(), payload)?;
        fs::write(self.version_path(), CACHE_VERSION)?;
        Ok(())
    }

    /// Remove the snapshot and its version marker so the next cold load
    /// reseeds from the default catalog.
    pub fn clear(&self) {
        for path in [self.data_path(), self.version_path()] {
            if let Err(err) = remove_if_exists(&path) {
                warn!("failed to clear cache file {:?}: {}", path, err);
            }
        }
    }

    /// Load the persisted theme preference, if any.
    pub fn load_theme(&self) -> Option<Theme> {
        let raw = read_if_exists(&self.theme_path()).ok()??;
        Theme::from_str(raw.trim())
    }

    /// Persist the theme preference. Failures are logged, not propagated.
    pub fn save_theme(&self, theme: Theme) {
        let write = fs::create_dir_all(&self.dir)
            .and_then(|_| fs::write(self.theme_path(), theme.as_str()));
        if let Err(err) = write {
            warn!("failed to persist theme preference: {}", err);
        }
    }
}

fn read_if_exists(path: &Path) -> Result<Option<String>, CacheError> {
    match fs::read_to_string(path) {
        Ok(contents) => Ok(Some(contents)),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err.into()),
    }
}

fn remove_if_exists(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err),
    }
}
