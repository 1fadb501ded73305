//! Persisted-list side file.
//!
//! The file holds the row triples `(key, root, path)` and the current index.
//! It is a single-use cache: it is written only when every row validates,
//! and deleted as soon as it is read.

use folio_core::{ObjectResolver, Result, SortItem};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

const CACHE_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct CacheFile {
    version: u32,
    #[serde(default)]
    current: Option<usize>,
    items: Vec<SortItem>,
}

/// Rows read back from a cache file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CachedList {
    pub items: Vec<SortItem>,
    pub current: Option<usize>,
}

/// Outcome of a save.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SaveOutcome {
    Written,
    /// Some row failed validation; nothing was written and any older file
    /// was removed.
    SkippedInvalid,
}

/// The side file of one list.
#[derive(Clone, Debug)]
pub struct ListCache {
    path: PathBuf,
}

impl ListCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Writes the rows if all of them validate.
    pub fn save<R: ObjectResolver + ?Sized>(
        &self,
        items: &[SortItem],
        current: Option<usize>,
        resolver: &R,
    ) -> Result<SaveOutcome> {
        if let Some(bad) = items.iter().find(|item| !item.is_valid(resolver)) {
            debug!(path = %self.path.display(), key = bad.key(), "not persisting list with invalid row");
            self.discard()?;
            return Ok(SaveOutcome::SkippedInvalid);
        }
        let file = CacheFile {
            version: CACHE_VERSION,
            current,
            items: items.to_vec(),
        };
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }
        fs::write(&self.path, serde_json::to_vec(&file)?)?;
        Ok(SaveOutcome::Written)
    }

    /// Reads the rows and deletes the file. A missing file yields `None`.
    pub fn take(&self) -> Result<Option<CachedList>> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        self.discard()?;
        let file: CacheFile = serde_json::from_slice(&bytes)?;
        if file.version != CACHE_VERSION {
            debug!(path = %self.path.display(), version = file.version, "ignoring cache of another version");
            return Ok(None);
        }
        Ok(Some(CachedList {
            items: file.items,
            current: file.current,
        }))
    }

    /// Deletes the file if present.
    pub fn discard(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
