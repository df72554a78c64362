//! Process-wide key-value memory backed by a single JSON file.
//!
//! The store is a flat `key -> JSON value` object rewritten whole on every
//! save. Missions use it single-writer-at-a-time; the lock here only guards
//! against torn reads within the process.

use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// Well-known keys used by the core runtime.
pub mod keys {
    /// The mission plan as last persisted by the director-equivalent.
    pub const MISSION_PLAN: &str = "mission_plan";
    /// Content staged by the Writer for the Poster.
    pub const POST_CONTENT: &str = "post_content";
    /// Cached display-context probe result.
    pub const DISPLAY_CONTEXT: &str = "display_context";
}

/// Errors emitted by the memory store.
#[derive(Debug, Error)]
pub enum MemoryError {
    #[error("memory file I/O failed: {0}")]
    Io(#[from] io::Error),

    #[error("memory file is not a JSON object: {0}")]
    Malformed(String),

    #[error("value for key '{key}' could not be serialized: {source}")]
    Encode {
        key: String,
        source: serde_json::Error,
    },
}

/// A string -> JSON mapping with whole-store durable write-through.
///
/// Reads return the last written value; writes persist the entire store
/// atomically (temp file + rename) before returning.
#[derive(Debug)]
pub struct MemoryStore {
    path: PathBuf,
    data: RwLock<Map<String, Value>>,
}

impl MemoryStore {
    /// Open the store at `path`, creating parent directories and an empty
    /// store file when nothing exists yet.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, MemoryError> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let data = if path.exists() {
            let bytes = fs::read(&path)?;
            if bytes.is_empty() {
                Map::new()
            } else {
                match serde_json::from_slice::<Value>(&bytes) {
                    Ok(Value::Object(map)) => map,
                    Ok(other) => {
                        return Err(MemoryError::Malformed(format!(
                            "expected object, found {}",
                            json_type_name(&other)
                        )))
                    }
                    Err(err) => return Err(MemoryError::Malformed(err.to_string())),
                }
            }
        } else {
            Map::new()
        };

        let store = Self {
            path,
            data: RwLock::new(data),
        };
        store.persist()?;
        Ok(store)
    }

    /// Store a serializable value under `key` and flush the whole store.
    pub fn save<T: Serialize>(&self, key: &str, value: &T) -> Result<(), MemoryError> {
        let value = serde_json::to_value(value).map_err(|source| MemoryError::Encode {
            key: key.to_string(),
            source,
        })?;
        {
            let mut data = self.data.write();
            data.insert(key.to_string(), value);
        }
        self.persist()?;
        debug!(key, "memory saved");
        Ok(())
    }

    /// The last written value for `key`, if any.
    pub fn load(&self, key: &str) -> Option<Value> {
        self.data.read().get(key).cloned()
    }

    /// Load and decode the value for `key`. Returns `None` both when the key
    /// is missing and when the stored value no longer decodes as `T`.
    pub fn load_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.load(key)?;
        match serde_json::from_value(value) {
            Ok(decoded) => Some(decoded),
            Err(err) => {
                warn!(key, error = %err, "stored value failed to decode");
                None
            }
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.data.read().contains_key(key)
    }

    /// Snapshot of all keys currently stored.
    pub fn keys(&self) -> Vec<String> {
        self.data.read().keys().cloned().collect()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self) -> Result<(), MemoryError> {
        let serialized = {
            let data = self.data.read();
            serde_json::to_vec_pretty(&Value::Object(data.clone()))
                .map_err(|err| MemoryError::Malformed(err.to_string()))?
        };
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, &serialized)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
