use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::store::{self, StoreError};

/// Key-value preferences. Reads never fail; a missing or mistyped key
/// yields the default.
pub trait PreferenceStore {
    fn get_int(&self, key: &str, default: i32) -> i32;
    fn put_int(&mut self, key: &str, value: i32) -> Result<(), StoreError>;
    fn get_bool(&self, key: &str, default: bool) -> bool;
    fn put_bool(&mut self, key: &str, value: bool) -> Result<(), StoreError>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
enum PrefValue {
    Bool(bool),
    Int(i32),
}

/// Preferences held only in memory.
#[derive(Debug, Default, Clone)]
pub struct MemoryPreferences {
    values: BTreeMap<String, PrefValue>,
}

impl PreferenceStore for MemoryPreferences {
    fn get_int(&self, key: &str, default: i32) -> i32 {
        match self.values.get(key) {
            Some(PrefValue::Int(v)) => *v,
            _ => default,
        }
    }

    fn put_int(&mut self, key: &str, value: i32) -> Result<(), StoreError> {
        self.values.insert(key.to_string(), PrefValue::Int(value));
        Ok(())
    }

    fn get_bool(&self, key: &str, default: bool) -> bool {
        match self.values.get(key) {
            Some(PrefValue::Bool(v)) => *v,
            _ => default,
        }
    }

    fn put_bool(&mut self, key: &str, value: bool) -> Result<(), StoreError> {
        self.values.insert(key.to_string(), PrefValue::Bool(value));
        Ok(())
    }
}

/// Preferences persisted as a flat JSON object, written through on every put.
#[derive(Debug)]
pub struct FilePreferences {
    path: PathBuf,
    inner: MemoryPreferences,
}

impl FilePreferences {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let values = store::load_json(path)?.unwrap_or_default();
        log::debug!("Preferences loaded from {}", path.display());
        Ok(FilePreferences {
            path: path.to_path_buf(),
            inner: MemoryPreferences { values },
        })
    }

    fn flush(&self) -> Result<(), StoreError> {
        store::save_json(&self.path, &self.inner.values)
    }
}

impl PreferenceStore for FilePreferences {
    fn get_int(&self, key: &str, default: i32) -> i32 {
        self.inner.get_int(key, default)
    }

    fn put_int(&mut self, key: &str, value: i32) -> Result<(), StoreError> {
        self.inner.put_int(key, value)?;
        self.flush()
    }

    fn get_bool(&self, key: &str, default: bool) -> bool {
        self.inner.get_bool(key, default)
    }

    fn put_bool(&mut self, key: &str, value: bool) -> Result<(), StoreError> {
        self.inner.put_bool(key, value)?;
        self.flush()
    }
}
