//! Key-value persistence for ledger state.
//!
//! Ledgers never talk to a storage medium directly. They go through a
//! [`PersistenceStore`], which wraps any [`KeyValueStore`] backend and stores
//! one JSON document per logical key inside a versioned envelope:
//!
//! ```text
//! { "schemaVersion": 1, "checksum": "<sha256 of data>", "data": { ... } }
//! ```
//!
//! A bare JSON value without an envelope is read as schema version 0 (the
//! format older clients wrote) and upgraded through [`Document::upgrade`].
//! When no durable medium is available every read yields the document's
//! default and every write is a no-op.

use crate::error::{StoreError, StoreResult};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

static KEY_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9_.-]+$").expect("valid key regex"));

/// Check that a storage key is safe to use as a file name
pub fn is_valid_key(key: &str) -> bool {
    KEY_RE.is_match(key) && key != "." && key != ".."
}

fn check_key(key: &str) -> StoreResult<()> {
    if is_valid_key(key) {
        Ok(())
    } else {
        Err(StoreError::InvalidKey(key.to_string()))
    }
}

/// A durable string store addressed by key
pub trait KeyValueStore {
    /// Whether a real storage medium backs this store
    fn is_available(&self) -> bool {
        true
    }

    fn get_item(&self, key: &str) -> StoreResult<Option<String>>;

    fn set_item(&mut self, key: &str, value: &str) -> StoreResult<()>;

    fn remove_item(&mut self, key: &str) -> StoreResult<()>;
}

/// In-process store, lost when dropped
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    items: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All keys currently held
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.items.keys().cloned().collect();
        keys.sort();
        keys
    }
}

impl KeyValueStore for MemoryStore {
    fn get_item(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.items.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> StoreResult<()> {
        self.items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> StoreResult<()> {
        self.items.remove(key);
        Ok(())
    }
}

/// Directory-backed store: one `<key>.json` file per key
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> StoreResult<PathBuf> {
        check_key(key)?;
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

impl KeyValueStore for FileStore {
    fn get_item(&self, key: &str) -> StoreResult<Option<String>> {
        let path = self.path_for(key)?;
        match std::fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::Io {
                key: key.to_string(),
                source,
            }),
        }
    }

    fn set_item(&mut self, key: &str, value: &str) -> StoreResult<()> {
        let path = self.path_for(key)?;
        let io_err = |source| StoreError::Io {
            key: key.to_string(),
            source,
        };

        std::fs::create_dir_all(&self.dir).map_err(io_err)?;

        // Write-then-rename so a crash never leaves a half-written document
        let tmp = self.dir.join(format!(".{}.json.tmp", key));
        std::fs::write(&tmp, value).map_err(io_err)?;
        std::fs::rename(&tmp, &path).map_err(io_err)?;
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> StoreResult<()> {
        let path = self.path_for(key)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StoreError::Io {
                key: key.to_string(),
                source,
            }),
        }
    }
}

/// Stand-in used when no durable medium exists
#[derive(Debug, Default, Clone, Copy)]
pub struct NullStore;

impl KeyValueStore for NullStore {
    fn is_available(&self) -> bool {
        false
    }

    fn get_item(&self, _key: &str) -> StoreResult<Option<String>> {
        Ok(None)
    }

    fn set_item(&mut self, _key: &str, _value: &str) -> StoreResult<()> {
        Ok(())
    }

    fn remove_item(&mut self, _key: &str) -> StoreResult<()> {
        Ok(())
    }
}

/// A typed document persisted under a single key
pub trait Document: Serialize + DeserializeOwned + Default {
    /// Version written by this build
    const SCHEMA_VERSION: u32;

    /// Upgrade raw data one step, from `from` to `from + 1`
    fn upgrade(from: u32, data: Value) -> StoreResult<Value> {
        let _ = from;
        Ok(data)
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Envelope {
    schema_version: u32,
    checksum: String,
    data: Value,
}

fn sha256(data: &[u8]) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

/// Checksum over the canonical (key-sorted) rendering of a JSON value
fn checksum(data: &Value) -> String {
    sha256(data.to_string().as_bytes())
}

/// Split a stored document into (schema version, data)
fn unwrap_envelope(key: &str, raw: Value) -> StoreResult<(u32, Value)> {
    let is_envelope = raw
        .as_object()
        .is_some_and(|obj| obj.contains_key("schemaVersion") && obj.contains_key("data"));
    if !is_envelope {
        return Ok((0, raw));
    }

    let envelope: Envelope = serde_json::from_value(raw).map_err(|source| StoreError::Malformed {
        key: key.to_string(),
        source,
    })?;
    if checksum(&envelope.data) != envelope.checksum {
        return Err(StoreError::ChecksumMismatch {
            key: key.to_string(),
        });
    }
    Ok((envelope.schema_version, envelope.data))
}

/// Typed JSON persistence over a pluggable backend
pub struct PersistenceStore {
    backend: Box<dyn KeyValueStore>,
}

impl PersistenceStore {
    pub fn new(backend: impl KeyValueStore + 'static) -> Self {
        Self {
            backend: Box::new(backend),
        }
    }

    pub fn from_boxed(backend: Box<dyn KeyValueStore>) -> Self {
        Self { backend }
    }

    pub fn in_memory() -> Self {
        Self::new(MemoryStore::new())
    }

    pub fn unavailable() -> Self {
        Self::new(NullStore)
    }

    pub fn is_available(&self) -> bool {
        self.backend.is_available()
    }

    pub fn backend(&self) -> &dyn KeyValueStore {
        self.backend.as_ref()
    }

    pub fn backend_mut(&mut self) -> &mut dyn KeyValueStore {
        self.backend.as_mut()
    }

    /// Load the document under `key`, or its default when absent
    pub fn load<T: Document>(&self, key: &str) -> StoreResult<T> {
        check_key(key)?;
        if !self.backend.is_available() {
            tracing::debug!(key, "no durable storage; using defaults");
            return Ok(T::default());
        }

        let Some(content) = self.backend.get_item(key)? else {
            tracing::debug!(key, "no stored document; using defaults");
            return Ok(T::default());
        };

        let malformed = |source| StoreError::Malformed {
            key: key.to_string(),
            source,
        };
        let raw: Value = serde_json::from_str(&content).map_err(malformed)?;
        let (mut version, mut data) = unwrap_envelope(key, raw)?;

        if version > T::SCHEMA_VERSION {
            return Err(StoreError::UnsupportedVersion {
                key: key.to_string(),
                found: version,
                supported: T::SCHEMA_VERSION,
            });
        }
        while version < T::SCHEMA_VERSION {
            tracing::info!(key, from = version, "upgrading stored document");
            data = T::upgrade(version, data)?;
            version += 1;
        }

        serde_json::from_value(data).map_err(malformed)
    }

    /// Persist `value` under `key`, replacing whatever was there
    pub fn save<T: Document>(&mut self, key: &str, value: &T) -> StoreResult<()> {
        check_key(key)?;
        if !self.backend.is_available() {
            tracing::debug!(key, "no durable storage; dropping write");
            return Ok(());
        }

        let malformed = |source| StoreError::Malformed {
            key: key.to_string(),
            source,
        };
        let data = serde_json::to_value(value).map_err(malformed)?;
        let envelope = Envelope {
            schema_version: T::SCHEMA_VERSION,
            checksum: checksum(&data),
            data,
        };
        let content = serde_json::to_string(&envelope).map_err(malformed)?;
        self.backend.set_item(key, &content)?;
        tracing::debug!(key, bytes = content.len(), "saved document");
        Ok(())
    }

    /// Remove the document under `key`
    pub fn remove(&mut self, key: &str) -> StoreResult<()> {
        check_key(key)?;
        self.backend.remove_item(key)
    }
}
