// src/store.rs

//! Persistent set of downloaded content fingerprints, one per destination directory.
//!
//! The store lives in a dotfile inside the directory it describes, so moving or
//! copying a lecture folder carries its download history along with it.

use crate::{
    constants,
    error::{AppError, AppResult},
    models::Fingerprint,
};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeSet,
    fs,
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
};
use tempfile::NamedTempFile;

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreFile {
    #[serde(default)]
    etags: BTreeSet<String>,
}

/// Open handle on a directory's fingerprint set.
///
/// Changes are written back by [`FingerprintStore::close`]. A handle dropped with
/// unsaved changes (an error path, say) still flushes them on a best-effort basis.
#[derive(Debug)]
pub struct FingerprintStore {
    path: PathBuf,
    etags: BTreeSet<String>,
    dirty: bool,
}

impl FingerprintStore {
    /// Loads the store of `directory`, starting empty when the file does not exist yet.
    pub fn open(directory: &Path) -> AppResult<Self> {
        let path = directory.join(constants::FINGERPRINT_STORE_FILE);
        let etags = match fs::read_to_string(&path) {
            Ok(content) => {
                let file: StoreFile =
                    serde_json::from_str(&content).map_err(|e| AppError::store(&path, e))?;
                file.etags
            }
            Err(e) if e.kind() == ErrorKind::NotFound => BTreeSet::new(),
            Err(e) => return Err(AppError::store(&path, e)),
        };
        debug!("Opened fingerprint store {:?} ({} entries)", path, etags.len());
        Ok(Self {
            path,
            etags,
            dirty: false,
        })
    }

    pub fn len(&self) -> usize {
        self.etags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.etags.is_empty()
    }

    pub fn contains(&self, fingerprint: &Fingerprint) -> bool {
        self.etags.contains(fingerprint.as_str())
    }

    /// Idempotent: adding a known fingerprint is a no-op.
    pub fn add(&mut self, fingerprint: &Fingerprint) {
        self.check_and_insert(fingerprint);
    }

    /// Inserts `fingerprint` and reports whether it was new.
    pub fn check_and_insert(&mut self, fingerprint: &Fingerprint) -> bool {
        let inserted = self.etags.insert(fingerprint.as_str().to_string());
        self.dirty |= inserted;
        inserted
    }

    pub fn remove(&mut self, fingerprint: &Fingerprint) -> bool {
        let removed = self.etags.remove(fingerprint.as_str());
        self.dirty |= removed;
        removed
    }

    /// Writes the set to disk via a temporary file and an atomic rename.
    pub fn flush(&mut self) -> AppResult<()> {
        if !self.dirty {
            return Ok(());
        }
        let directory = self
            .path
            .parent()
            .ok_or_else(|| AppError::store(&self.path, "store path has no parent directory"))?;
        let snapshot = StoreFile {
            etags: self.etags.clone(),
        };
        let content = serde_json::to_vec_pretty(&snapshot).map_err(|e| AppError::store(&self.path, e))?;

        let mut temp = NamedTempFile::new_in(directory).map_err(|e| AppError::store(&self.path, e))?;
        temp.write_all(&content)
            .and_then(|_| temp.as_file().sync_all())
            .map_err(|e| AppError::store(&self.path, e))?;
        temp.persist(&self.path)
            .map_err(|e| AppError::store(&self.path, e.error))?;

        self.dirty = false;
        debug!("Saved fingerprint store {:?} ({} entries)", self.path, self.etags.len());
        Ok(())
    }

    pub fn close(mut self) -> AppResult<()> {
        self.flush()
    }
}

impl Drop for FingerprintStore {
    fn drop(&mut self) {
        if self.dirty && let Err(e) = self.flush() {
            warn!("Fingerprint store {:?} could not be saved: {}", self.path, e);
        }
    }
}
