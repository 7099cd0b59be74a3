// SPDX-License-Identifier: Apache-2.0

use crate::paths::{slot_path, slot_tmp_path};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum StoreErrorCode {
    Persistence,
    Network,
    Unavailable,
    Validation,
    Config,
    Internal,
}

impl StoreErrorCode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Persistence => "persistence_error",
            Self::Network => "network_error",
            Self::Unavailable => "remote_unavailable",
            Self::Validation => "validation_error",
            Self::Config => "config_error",
            Self::Internal => "internal_error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreError {
    pub code: StoreErrorCode,
    pub message: String,
}

impl StoreError {
    #[must_use]
    pub fn new(code: StoreErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn persistence(message: impl Into<String>) -> Self {
        Self::new(StoreErrorCode::Persistence, message)
    }

    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(StoreErrorCode::Network, message)
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for StoreError {}

/// String-keyed persisted slots. `read` returns `Ok(None)` for an absent key.
pub trait SlotStorage: Send + Sync {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn write(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// One file per slot under `root`, replaced atomically on every write.
pub struct LocalFsSlots {
    root: PathBuf,
}

impl LocalFsSlots {
    #[must_use]
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl SlotStorage for LocalFsSlots {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        validate_slot_key(key)?;
        match fs::read_to_string(slot_path(&self.root, key)) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::persistence(format!("slot {key} read failed: {e}"))),
        }
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StoreError> {
        validate_slot_key(key)?;
        fs::create_dir_all(&self.root).map_err(|e| {
            StoreError::persistence(format!(
                "data dir {} not writable: {e}",
                self.root.display()
            ))
        })?;
        let tmp = slot_tmp_path(&self.root, key);
        write_and_sync(&tmp, value.as_bytes())?;
        fs::rename(&tmp, slot_path(&self.root, key))
            .map_err(|e| StoreError::persistence(format!("slot {key} rename failed: {e}")))?;
        sync_dir(&self.root)
    }
}

/// Process-local slots for hosts without a writable filesystem.
#[derive(Default)]
pub struct MemorySlots {
    inner: Mutex<BTreeMap<String, String>>,
}

impl MemorySlots {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SlotStorage for MemorySlots {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        let map = self
            .inner
            .lock()
            .map_err(|_| StoreError::new(StoreErrorCode::Internal, "memory slots poisoned"))?;
        Ok(map.get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut map = self
            .inner
            .lock()
            .map_err(|_| StoreError::new(StoreErrorCode::Internal, "memory slots poisoned"))?;
        map.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

fn validate_slot_key(key: &str) -> Result<(), StoreError> {
    if key.is_empty() || key.contains(['/', '\\']) || key.starts_with('.') {
        return Err(StoreError::new(
            StoreErrorCode::Validation,
            format!("invalid slot key: {key:?}"),
        ));
    }
    Ok(())
}

fn write_and_sync(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    let mut f = fs::File::create(path)
        .map_err(|e| StoreError::persistence(format!("create {} failed: {e}", path.display())))?;
    f.write_all(bytes)
        .map_err(|e| StoreError::persistence(format!("write {} failed: {e}", path.display())))?;
    f.sync_all()
        .map_err(|e| StoreError::persistence(format!("sync {} failed: {e}", path.display())))?;
    Ok(())
}

fn sync_dir(dir: &Path) -> Result<(), StoreError> {
    let f = OpenOptions::new()
        .read(true)
        .open(dir)
        .map_err(|e| StoreError::persistence(e.to_string()))?;
    f.sync_all()
        .map_err(|e| StoreError::persistence(e.to_string()))?;
    Ok(())
}
