// SPDX-License-Identifier: Apache-2.0

use crate::backend::{StoreError, StoreErrorCode};
use sdl_feedback_core::{
    resolve_config_path, resolve_data_dir, ConfigPathScope, ENV_ALLOW_PRIVATE_HOSTS, ENV_DATA_DIR,
    ENV_REMOTE_KEY, ENV_REMOTE_TABLE, ENV_REMOTE_TIMEOUT_MS, ENV_REMOTE_URL,
};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_REMOTE_TABLE: &str = "feedback";
pub const DEFAULT_REMOTE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteConfig {
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub table: String,
    pub timeout: Duration,
    pub allow_private_hosts: bool,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            api_key: None,
            table: DEFAULT_REMOTE_TABLE.to_string(),
            timeout: DEFAULT_REMOTE_TIMEOUT,
            allow_private_hosts: false,
        }
    }
}

impl RemoteConfig {
    /// Both the endpoint and the credential are present and non-blank.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        let filled = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
        filled(&self.base_url) && filled(&self.api_key)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedbackConfig {
    pub data_dir: PathBuf,
    pub source_agent: String,
    pub remote: RemoteConfig,
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            data_dir: resolve_data_dir(),
            source_agent: format!("sdl-feedback/{}", env!("CARGO_PKG_VERSION")),
            remote: RemoteConfig::default(),
        }
    }
}

/// On-disk TOML shape. Every field is optional and overrides the default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub data_dir: Option<PathBuf>,
    pub source_agent: Option<String>,
    pub remote: Option<FileRemoteConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileRemoteConfig {
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub table: Option<String>,
    pub timeout_ms: Option<u64>,
    pub allow_private_hosts: Option<bool>,
}

impl FeedbackConfig {
    /// Defaults, then the config file, then the process environment.
    ///
    /// An explicit `path` must exist; otherwise the user config file is read
    /// only when present.
    pub fn load(path: Option<&Path>) -> Result<Self, StoreError> {
        let mut cfg = Self::default();
        match path {
            Some(explicit) => cfg.apply_file(read_file_config(explicit)?)?,
            None => {
                let user = resolve_config_path(ConfigPathScope::User);
                if user.is_file() {
                    cfg.apply_file(read_file_config(&user)?)?;
                }
            }
        }
        cfg.apply_env_with(|name| std::env::var(name).ok())?;
        Ok(cfg)
    }

    pub fn apply_file(&mut self, file: FileConfig) -> Result<(), StoreError> {
        if let Some(data_dir) = file.data_dir {
            self.data_dir = data_dir;
        }
        if let Some(agent) = file.source_agent {
            self.source_agent = agent;
        }
        if let Some(remote) = file.remote {
            if remote.base_url.is_some() {
                self.remote.base_url = remote.base_url;
            }
            if remote.api_key.is_some() {
                self.remote.api_key = remote.api_key;
            }
            if let Some(table) = remote.table {
                self.remote.table = table;
            }
            if let Some(ms) = remote.timeout_ms {
                self.remote.timeout = timeout_from_millis(ms, "remote.timeout_ms")?;
            }
            if let Some(allow) = remote.allow_private_hosts {
                self.remote.allow_private_hosts = allow;
            }
        }
        Ok(())
    }

    pub fn apply_env_with(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), StoreError> {
        let set = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        if let Some(dir) = set(ENV_DATA_DIR) {
            self.data_dir = PathBuf::from(dir.trim());
        }
        if let Some(url) = set(ENV_REMOTE_URL) {
            self.remote.base_url = Some(url.trim().to_string());
        }
        if let Some(key) = set(ENV_REMOTE_KEY) {
            self.remote.api_key = Some(key.trim().to_string());
        }
        if let Some(table) = set(ENV_REMOTE_TABLE) {
            self.remote.table = table.trim().to_string();
        }
        if let Some(raw) = set(ENV_REMOTE_TIMEOUT_MS) {
            let ms = raw.trim().parse::<u64>().map_err(|e| {
                StoreError::new(
                    StoreErrorCode::Config,
                    format!("{ENV_REMOTE_TIMEOUT_MS} must be milliseconds: {e}"),
                )
            })?;
            self.remote.timeout = timeout_from_millis(ms, ENV_REMOTE_TIMEOUT_MS)?;
        }
        if let Some(raw) = set(ENV_ALLOW_PRIVATE_HOSTS) {
            self.remote.allow_private_hosts = parse_bool(&raw).ok_or_else(|| {
                StoreError::new(
                    StoreErrorCode::Config,
                    format!("{ENV_ALLOW_PRIVATE_HOSTS} must be a boolean"),
                )
            })?;
        }
        Ok(())
    }
}

fn read_file_config(path: &Path) -> Result<FileConfig, StoreError> {
    let raw = fs::read_to_string(path).map_err(|e| {
        StoreError::new(
            StoreErrorCode::Config,
            format!("config {} unreadable: {e}", path.display()),
        )
    })?;
    toml::from_str(&raw).map_err(|e| {
        StoreError::new(
            StoreErrorCode::Config,
            format!("config {} invalid: {e}", path.display()),
        )
    })
}

/// Timeouts must be non-zero.
fn timeout_from_millis(ms: u64, source: &str) -> Result<Duration, StoreError> {
    if ms == 0 {
        return Err(StoreError::new(
            StoreErrorCode::Config,
            format!("{source} must be greater than zero"),
        ));
    }
    Ok(Duration::from_millis(ms))
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim() {
        "1" | "true" | "TRUE" | "yes" | "YES" => Some(true),
        "0" | "false" | "FALSE" | "no" | "NO" => Some(false),
        _ => None,
    }
}
