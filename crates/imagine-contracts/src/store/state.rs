use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

/// File-backed JSON object document (`state.json`). A missing or malformed
/// file loads as an empty document; write failures are the caller's to
/// handle, read failures never are.
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
    payload: Map<String, Value>,
}

impl StateStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let payload = read_json_object(&path).unwrap_or_default();
        Self { path, payload }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Deserializes the value stored under `key`; `None` when the key is
    /// missing or the stored value does not decode as `T`.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.payload.get(key)?;
        serde_json::from_value(value.clone()).ok()
    }

    pub fn set<T: Serialize>(&mut self, key: &str, value: &T) -> anyhow::Result<()> {
        let encoded = serde_json::to_value(value)?;
        if self.payload.get(key) == Some(&encoded) {
            return Ok(());
        }
        self.payload.insert(key.to_string(), encoded);
        self.flush()
    }

    pub fn remove(&mut self, key: &str) -> anyhow::Result<()> {
        if self.payload.remove(key).is_none() {
            return Ok(());
        }
        self.flush()
    }

    fn flush(&self) -> anyhow::Result<()> {
        write_json_object(&self.path, &self.payload)
    }
}

fn read_json_object(path: &Path) -> Option<Map<String, Value>> {
    let raw = std::fs::read_to_string(path).ok()?;
    let parsed: Value = serde_json::from_str(&raw).ok()?;
    parsed.as_object().cloned()
}

fn write_json_object(path: &Path, payload: &Map<String, Value>) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(
        path,
        serde_json::to_string_pretty(&Value::Object(payload.clone()))?,
    )?;
    Ok(())
}
