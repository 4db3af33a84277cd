//! File-backed key store
//!
//! The whole collection lives in memory behind a single mutex and is written
//! back to one JSON file after every mutation.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use super::models::{KeyRecord, KeyStats};
use crate::errors::{KeygateError, Result};

/// What a mutation closure did to the working copy.
#[derive(Debug)]
pub enum Outcome<T> {
    /// The collection changed and must be persisted.
    Changed(T),
    /// Nothing changed; skip the write.
    Unchanged(T),
}

pub struct KeyStore {
    path: PathBuf,
    records: Mutex<Vec<KeyRecord>>,
}

impl KeyStore {
    /// Open the store at `path`, loading whatever is persisted there.
    ///
    /// A missing file is initialized as an empty collection. An unreadable
    /// file either fails the open (`abort_on_corrupt`) or is moved aside to
    /// `<file>.corrupt-<unix-ts>` and the store starts empty.
    pub fn open(path: impl Into<PathBuf>, abort_on_corrupt: bool) -> Result<Self> {
        let store = KeyStore {
            path: path.into(),
            records: Mutex::new(Vec::new()),
        };

        let records = match store.load() {
            Ok(records) => records,
            Err(e) if abort_on_corrupt => {
                error!("Failed to load keys from {}: {}", store.path.display(), e);
                return Err(e);
            }
            Err(e) => {
                error!(
                    "Failed to load keys from {}: {}. Starting with an empty collection",
                    store.path.display(),
                    e
                );
                store.quarantine_corrupt_file();
                store.save(&[])?;
                Vec::new()
            }
        };

        info!(
            "KeyStore initialized from {}, {} keys loaded",
            store.path.display(),
            records.len()
        );
        *store.records.lock() = records;

        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the persisted collection.
    ///
    /// Writes and returns an empty collection when nothing is persisted yet.
    pub fn load(&self) -> Result<Vec<KeyRecord>> {
        match Self::read_file(&self.path)? {
            Some(records) => Ok(records),
            None => {
                info!(
                    "Keys file {} does not exist, creating an empty one",
                    self.path.display()
                );
                self.save(&[])?;
                Ok(Vec::new())
            }
        }
    }

    /// Read the collection at `path` without touching the filesystem.
    ///
    /// A missing file reads as empty and is not created. An unreadable file
    /// is an error and is left where it is.
    pub fn read_only(path: impl AsRef<Path>) -> Result<Vec<KeyRecord>> {
        Ok(Self::read_file(path.as_ref())?.unwrap_or_default())
    }

    fn read_file(path: &Path) -> Result<Option<Vec<KeyRecord>>> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(KeygateError::storage(format!(
                    "failed to read {}: {}",
                    path.display(),
                    e
                )));
            }
        };

        let records: Vec<KeyRecord> = serde_json::from_str(&content).map_err(|e| {
            KeygateError::storage(format!("failed to parse {}: {}", path.display(), e))
        })?;
        debug!("Loaded {} keys from {}", records.len(), path.display());
        Ok(Some(records))
    }

    /// Persist the full collection, replacing whatever was there.
    ///
    /// Writes to a sibling temp file and renames it over the target so a
    /// crash mid-write never leaves a truncated file behind.
    pub fn save(&self, records: &[KeyRecord]) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(records)?;
        let tmp_path = self.tmp_path();
        let result = (|| -> std::io::Result<()> {
            let mut file = fs::File::create(&tmp_path)?;
            file.write_all(json.as_bytes())?;
            file.sync_all()?;
            fs::rename(&tmp_path, &self.path)
        })();

        if let Err(e) = result {
            let _ = fs::remove_file(&tmp_path);
            error!("Failed to write keys to {}: {}", self.path.display(), e);
            return Err(KeygateError::storage(format!(
                "failed to write {}: {}",
                self.path.display(),
                e
            )));
        }

        debug!("Saved {} keys to {}", records.len(), self.path.display());
        Ok(())
    }

    /// Run `f` against a working copy of the collection under the mutation
    /// lock. A `Changed` outcome is persisted before it becomes visible; if
    /// the write fails the in-memory collection is left untouched.
    pub fn mutate<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Vec<KeyRecord>) -> Result<Outcome<T>>,
    {
        let mut guard = self.records.lock();
        let mut working = guard.clone();

        match f(&mut working)? {
            Outcome::Unchanged(value) => Ok(value),
            Outcome::Changed(value) => {
                self.save(&working)?;
                *guard = working;
                Ok(value)
            }
        }
    }

    /// Consistent copy of the current collection.
    pub fn snapshot(&self) -> Vec<KeyRecord> {
        self.records.lock().clone()
    }

    pub fn get(&self, id: &str) -> Option<KeyRecord> {
        self.records.lock().iter().find(|r| r.id == id).cloned()
    }

    pub fn stats(&self) -> KeyStats {
        KeyStats::from_records(&self.records.lock())
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Write the in-memory collection to disk.
    pub fn flush(&self) -> Result<()> {
        let guard = self.records.lock();
        self.save(&guard)
    }

    /// `<file>.tmp` next to the target, whatever the target's extension.
    fn tmp_path(&self) -> PathBuf {
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        PathBuf::from(tmp)
    }

    fn quarantine_corrupt_file(&self) {
        let mut target = self.path.clone().into_os_string();
        target.push(format!(".corrupt-{}", chrono::Utc::now().timestamp()));
        match fs::rename(&self.path, &target) {
            Ok(()) => warn!(
                "Moved unreadable keys file to {}",
                PathBuf::from(&target).display()
            ),
            Err(e) => warn!(
                "Could not move unreadable keys file {} aside: {}",
                self.path.display(),
                e
            ),
        }
    }
}
