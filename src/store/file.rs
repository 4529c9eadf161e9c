// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! File-backed token store.
//!
//! Entries are kept in memory and mirrored to a JSON object on disk after
//! every change, so a session survives restarts. If the file cannot be read
//! or written the store logs once and carries on memory-only for the rest of
//! the process. A corrupt file is treated as empty.

use super::TokenStore;
use dashmap::DashMap;
use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// Token store persisted as JSON at a fixed path.
#[derive(Debug)]
pub struct FileTokenStore {
    path: PathBuf,
    values: DashMap<String, String>,
    /// Set once persistence has failed; later writes stay in memory.
    memory_only: AtomicBool,
    /// Serializes snapshot + write so the newest state lands last.
    write_lock: Mutex<()>,
}

impl FileTokenStore {
    /// Open (or lazily create) the store at `path`.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let store = Self {
            path,
            values: DashMap::new(),
            memory_only: AtomicBool::new(false),
            write_lock: Mutex::new(()),
        };

        match read_entries(&store.path) {
            Ok(entries) => {
                for (key, value) in entries {
                    store.values.insert(key, value);
                }
            }
            Err(LoadError::Corrupt(e)) => {
                tracing::warn!(
                    path = %store.path.display(),
                    error = %e,
                    "Token file is corrupt, starting with an empty session"
                );
            }
            Err(LoadError::Io(e)) => {
                store.degrade(&e);
            }
        }

        store
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether persistence has been given up for this process.
    pub fn is_memory_only(&self) -> bool {
        self.memory_only.load(Ordering::Relaxed)
    }

    fn persist(&self) {
        if self.is_memory_only() {
            return;
        }

        let Ok(_guard) = self.write_lock.lock() else {
            return;
        };

        let snapshot: BTreeMap<String, String> = self
            .values
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();

        if let Err(e) = write_entries(&self.path, &snapshot) {
            self.degrade(&e);
        }
    }

    fn degrade(&self, error: &io::Error) {
        if !self.memory_only.swap(true, Ordering::Relaxed) {
            tracing::warn!(
                path = %self.path.display(),
                error = %error,
                "Token storage unavailable, keeping session in memory only"
            );
        }
    }
}

impl TokenStore for FileTokenStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).map(|v| v.value().clone())
    }

    fn set(&self, key: &str, value: &str) {
        self.values.insert(key.to_string(), value.to_string());
        self.persist();
    }

    fn clear(&self, key: &str) {
        if self.values.remove(key).is_some() {
            self.persist();
        }
    }
}

enum LoadError {
    Io(io::Error),
    Corrupt(serde_json::Error),
}

fn read_entries(path: &Path) -> Result<BTreeMap<String, String>, LoadError> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
        Err(e) => return Err(LoadError::Io(e)),
    };
    if raw.trim().is_empty() {
        return Ok(BTreeMap::new());
    }
    serde_json::from_str(&raw).map_err(LoadError::Corrupt)
}

/// Write via a sibling temp file and rename, so readers never see half a file.
fn write_entries(path: &Path, entries: &BTreeMap<String, String>) -> io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_vec_pretty(entries)?;
    let tmp = path.with_extension("tmp");
    {
        let mut file = create_private(&tmp)?;
        file.write_all(&json)?;
        file.sync_all()?;
    }
    fs::rename(&tmp, path)
}

#[cfg(unix)]
fn create_private(path: &Path) -> io::Result<fs::File> {
    use std::os::unix::fs::OpenOptionsExt;
    fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)
}

#[cfg(not(unix))]
fn create_private(path: &Path) -> io::Result<fs::File> {
    fs::File::create(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        let store = FileTokenStore::open(&path);
        store.set("accessToken", "tok");
        store.set("refreshToken", "ref");
        drop(store);

        let reopened = FileTokenStore::open(&path);
        assert_eq!(reopened.get("accessToken").as_deref(), Some("tok"));
        assert_eq!(reopened.get("refreshToken").as_deref(), Some("ref"));
        assert!(!reopened.is_memory_only());

        reopened.clear("accessToken");
        let again = FileTokenStore::open(&path);
        assert_eq!(again.get("accessToken"), None);
        assert_eq!(again.get("refreshToken").as_deref(), Some("ref"));
    }

    #[test]
    fn test_corrupt_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "{not json").unwrap();

        let store = FileTokenStore::open(&path);
        assert_eq!(store.get("accessToken"), None);

        store.set("accessToken", "tok");
        assert!(!store.is_memory_only());
        assert_eq!(
            FileTokenStore::open(&path).get("accessToken").as_deref(),
            Some("tok")
        );
    }

    #[test]
    fn test_unwritable_path_falls_back_to_memory() {
        let dir = tempfile::tempdir().unwrap();
        // A directory where the file should be: reads and writes both fail.
        let path = dir.path().join("occupied");
        fs::create_dir(&path).unwrap();

        let store = FileTokenStore::open(&path);
        store.set("accessToken", "tok");

        assert!(store.is_memory_only());
        assert_eq!(store.get("accessToken").as_deref(), Some("tok"));

        store.clear("accessToken");
        assert_eq!(store.get("accessToken"), None);
    }

    #[test]
    fn test_creates_missing_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("session.json");

        let store = FileTokenStore::open(&path);
        store.set("accessToken", "tok");

        assert!(path.exists());
        assert!(!store.is_memory_only());
    }
}
