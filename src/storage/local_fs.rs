// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Local filesystem operations for the data directory.
//!
//! Every JSON write goes to a sibling `.tmp` file first and is renamed into
//! place, so a crash mid-write leaves either the old record or the new one.
//! Secret files are created with mode `0600` on unix.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use serde::{de::DeserializeOwned, Serialize};

use super::StoragePaths;

#[derive(Debug)]
pub enum StorageError {
    Io(io::Error),
    Json(serde_json::Error),
    /// The file does not exist
    NotFound(String),
    /// `initialize()` has not run
    NotInitialized,
    /// Stored bytes that cannot be interpreted
    Malformed(String),
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::Io(e) => write!(f, "storage I/O failed: {e}"),
            StorageError::Json(e) => write!(f, "invalid JSON: {e}"),
            StorageError::NotFound(what) => write!(f, "not found: {what}"),
            StorageError::NotInitialized => f.write_str("data directory not initialized"),
            StorageError::Malformed(detail) => write!(f, "malformed data: {detail}"),
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StorageError::Io(e) => Some(e),
            StorageError::Json(e) => Some(e),
            StorageError::NotFound(_) | StorageError::NotInitialized | StorageError::Malformed(_) => {
                None
            }
        }
    }
}

impl From<io::Error> for StorageError {
    fn from(e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::NotFound => StorageError::NotFound(e.to_string()),
            _ => StorageError::Io(e),
        }
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(e: serde_json::Error) -> Self {
        StorageError::Json(e)
    }
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Handle on the data directory.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    paths: StoragePaths,
    initialized: bool,
}

impl LocalStorage {
    /// Wrap `paths` without touching the disk. Call `initialize()` before use.
    pub fn new(paths: StoragePaths) -> Self {
        Self {
            paths,
            initialized: false,
        }
    }

    /// Create and initialize in one step.
    pub fn open(paths: StoragePaths) -> StorageResult<Self> {
        let mut storage = Self::new(paths);
        storage.initialize()?;
        Ok(storage)
    }

    pub fn paths(&self) -> &StoragePaths {
        &self.paths
    }

    /// Create the token, key and audit directories. Idempotent.
    pub fn initialize(&mut self) -> StorageResult<()> {
        for dir in [
            self.paths.tokens_dir(),
            self.paths.keys_dir(),
            self.paths.audit_dir(),
        ] {
            fs::create_dir_all(dir)?;
        }

        self.initialized = true;
        Ok(())
    }

    fn ensure_initialized(&self) -> StorageResult<()> {
        if self.initialized {
            Ok(())
        } else {
            Err(StorageError::NotInitialized)
        }
    }

    /// Write, read back and remove a probe file under the root.
    pub fn health_check(&self) -> StorageResult<()> {
        self.ensure_initialized()?;

        let probe = self.paths.root().join(".probe");
        let token = uuid::Uuid::new_v4().to_string();
        fs::write(&probe, token.as_bytes())?;
        let echoed = fs::read_to_string(&probe)?;
        fs::remove_file(&probe)?;

        if echoed != token {
            return Err(StorageError::Malformed(
                "data directory probe read back different bytes".to_string(),
            ));
        }
        Ok(())
    }

    // ========== JSON Documents ==========

    pub fn read_json<T: DeserializeOwned>(&self, path: impl AsRef<Path>) -> StorageResult<T> {
        self.ensure_initialized()?;
        let bytes = fs::read(path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Atomically replace `path` with the pretty-printed JSON of `value`.
    pub fn write_json<T: Serialize>(&self, path: impl AsRef<Path>, value: &T) -> StorageResult<()> {
        self.write_json_with_mode(path.as_ref(), value, None)
    }

    /// Like [`write_json`](Self::write_json), but readable only by the owner.
    pub fn write_secret_json<T: Serialize>(
        &self,
        path: impl AsRef<Path>,
        value: &T,
    ) -> StorageResult<()> {
        self.write_json_with_mode(path.as_ref(), value, Some(0o600))
    }

    fn write_json_with_mode<T: Serialize>(
        &self,
        path: &Path,
        value: &T,
        mode: Option<u32>,
    ) -> StorageResult<()> {
        self.ensure_initialized()?;
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }

        let staging = path.with_extension("tmp");
        let mut out = BufWriter::new(create_file(&staging, mode)?);
        serde_json::to_writer_pretty(&mut out, value)?;
        out.flush()?;
        out.get_ref().sync_all()?;
        drop(out);

        fs::rename(&staging, path)?;
        Ok(())
    }

    /// Sorted stems of the files in `dir` ending in `.{extension}`.
    ///
    /// A missing directory lists as empty.
    pub fn list_files(&self, dir: impl AsRef<Path>, extension: &str) -> StorageResult<Vec<String>> {
        self.ensure_initialized()?;

        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut stems = Vec::new();
        for entry in entries {
            let path = entry?.path();
            let matches = path.is_file()
                && path.extension().and_then(|ext| ext.to_str()) == Some(extension);
            if let (true, Some(stem)) = (matches, path.file_stem().and_then(|s| s.to_str())) {
                stems.push(stem.to_owned());
            }
        }
        stems.sort();
        Ok(stems)
    }

    // ========== Append-only Logs ==========

    /// Append `line` and a newline, creating the file and its directory.
    pub fn append_line(&self, path: impl AsRef<Path>, line: &str) -> StorageResult<()> {
        self.ensure_initialized()?;
        let path = path.as_ref();
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }

        let mut log = OpenOptions::new().create(true).append(true).open(path)?;
        writeln!(log, "{line}")?;
        Ok(())
    }

    pub fn read_raw(&self, path: impl AsRef<Path>) -> StorageResult<Vec<u8>> {
        self.ensure_initialized()?;
        Ok(fs::read(path)?)
    }
}

#[cfg(unix)]
fn create_file(path: &Path, mode: Option<u32>) -> io::Result<File> {
    use std::os::unix::fs::OpenOptionsExt;

    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    if let Some(mode) = mode {
        options.mode(mode);
    }
    options.open(path)
}

#[cfg(not(unix))]
fn create_file(path: &Path, _mode: Option<u32>) -> io::Result<File> {
    File::create(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use tempfile::TempDir;

    fn open_temp() -> (TempDir, LocalStorage) {
        let temp = TempDir::new().unwrap();
        let storage = LocalStorage::open(StoragePaths::new(temp.path())).unwrap();
        (temp, storage)
    }

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Sample {
        label: String,
        count: u32,
    }

    fn sample(label: &str, count: u32) -> Sample {
        Sample {
            label: label.to_string(),
            count,
        }
    }

    #[test]
    fn open_lays_out_data_directory() {
        let (_temp, storage) = open_temp();
        for dir in [
            storage.paths().tokens_dir(),
            storage.paths().keys_dir(),
            storage.paths().audit_dir(),
        ] {
            assert!(dir.is_dir(), "{} missing", dir.display());
        }
    }

    #[test]
    fn json_survives_rewrite_without_leftovers() {
        let (_temp, storage) = open_temp();
        let path = storage.paths().tokens_dir().join("doc.json");

        storage.write_json(&path, &sample("first", 1)).unwrap();
        storage.write_json(&path, &sample("second", 2)).unwrap();

        let back: Sample = storage.read_json(&path).unwrap();
        assert_eq!(back, sample("second", 2));
        assert!(!path.with_extension("tmp").exists());
    }

    #[cfg(unix)]
    #[test]
    fn secret_json_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let (_temp, storage) = open_temp();
        let path = storage.paths().keys_dir().join("secret.json");
        storage.write_secret_json(&path, &sample("k", 7)).unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn probe_leaves_nothing_behind() {
        let (_temp, storage) = open_temp();
        storage.health_check().unwrap();
        assert!(!storage.paths().root().join(".probe").exists());
    }

    #[test]
    fn list_files_filters_by_extension_and_sorts() {
        let (_temp, storage) = open_temp();
        let dir = storage.paths().tokens_dir();

        for n in [3, 1, 2] {
            storage
                .write_json(dir.join(format!("t-{n}.json")), &sample("t", n))
                .unwrap();
        }
        storage.append_line(dir.join("notes.txt"), "ignored").unwrap();

        assert_eq!(storage.list_files(&dir, "json").unwrap(), vec!["t-1", "t-2", "t-3"]);
        assert!(storage
            .list_files(storage.paths().root().join("absent"), "json")
            .unwrap()
            .is_empty());
    }

    #[test]
    fn append_line_accumulates() {
        let (_temp, storage) = open_temp();
        let path = storage.paths().audit_events_file("2026-01-01");

        storage.append_line(&path, "one").unwrap();
        storage.append_line(&path, "two").unwrap();

        assert_eq!(storage.read_raw(&path).unwrap(), b"one\ntwo\n");
    }

    #[test]
    fn missing_file_maps_to_not_found() {
        let (_temp, storage) = open_temp();
        let result = storage.read_json::<Sample>(storage.paths().tokens_dir().join("nope.json"));
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[test]
    fn unopened_storage_refuses_work() {
        let storage = LocalStorage::new(StoragePaths::new("/nonexistent/rtm"));
        assert!(matches!(
            storage.read_raw("/nonexistent/rtm/x"),
            Err(StorageError::NotInitialized)
        ));
        assert!(matches!(
            storage.health_check(),
            Err(StorageError::NotInitialized)
        ));
    }
}
