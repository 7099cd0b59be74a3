// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

mod error;

use std::path::PathBuf;

pub use error::{ExitCode, MachineError};

pub const CRATE_NAME: &str = "sdl-feedback-core";

pub const ENV_LOG_LEVEL: &str = "SDL_FEEDBACK_LOG_LEVEL";
pub const ENV_LOG_JSON: &str = "SDL_FEEDBACK_LOG_JSON";
pub const ENV_DATA_DIR: &str = "SDL_FEEDBACK_DATA_DIR";
pub const ENV_CONFIG_PATH: &str = "SDL_FEEDBACK_CONFIG";
pub const ENV_REMOTE_URL: &str = "SDL_FEEDBACK_REMOTE_URL";
pub const ENV_REMOTE_KEY: &str = "SDL_FEEDBACK_REMOTE_KEY";
pub const ENV_REMOTE_TABLE: &str = "SDL_FEEDBACK_REMOTE_TABLE";
pub const ENV_REMOTE_TIMEOUT_MS: &str = "SDL_FEEDBACK_REMOTE_TIMEOUT_MS";
pub const ENV_ALLOW_PRIVATE_HOSTS: &str = "SDL_FEEDBACK_ALLOW_PRIVATE_HOSTS";

const APP_DIR: &str = "sdl-feedback";
const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigPathScope {
    User,
    Workspace,
}

/// Directory holding the persisted slots for this device.
#[must_use]
pub fn resolve_data_dir() -> PathBuf {
    resolve_data_dir_with(|name| std::env::var(name).ok())
}

/// Same as [`resolve_data_dir`], reading variables through `lookup`.
#[must_use]
pub fn resolve_data_dir_with(lookup: impl Fn(&str) -> Option<String>) -> PathBuf {
    if let Some(explicit) = non_blank(lookup(ENV_DATA_DIR)) {
        return PathBuf::from(explicit);
    }
    if let Some(xdg_data_home) = non_blank(lookup("XDG_DATA_HOME")) {
        return PathBuf::from(xdg_data_home).join(APP_DIR);
    }
    if let Some(home) = non_blank(lookup("HOME")) {
        return PathBuf::from(home)
            .join(".local")
            .join("share")
            .join(APP_DIR);
    }
    PathBuf::from(".sdl-feedback").join("data")
}

#[must_use]
pub fn resolve_config_path(scope: ConfigPathScope) -> PathBuf {
    resolve_config_path_with(scope, |name| std::env::var(name).ok())
}

#[must_use]
pub fn resolve_config_path_with(
    scope: ConfigPathScope,
    lookup: impl Fn(&str) -> Option<String>,
) -> PathBuf {
    match scope {
        ConfigPathScope::User => {
            if let Some(explicit) = non_blank(lookup(ENV_CONFIG_PATH)) {
                return PathBuf::from(explicit);
            }
            if let Some(xdg_config_home) = non_blank(lookup("XDG_CONFIG_HOME")) {
                return PathBuf::from(xdg_config_home).join(APP_DIR).join(CONFIG_FILE);
            }
            if let Some(home) = non_blank(lookup("HOME")) {
                return PathBuf::from(home)
                    .join(".config")
                    .join(APP_DIR)
                    .join(CONFIG_FILE);
            }
            PathBuf::from(".sdl-feedback").join(CONFIG_FILE)
        }
        ConfigPathScope::Workspace => PathBuf::from(".sdl-feedback").join(CONFIG_FILE),
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn explicit_data_dir_wins_over_xdg_and_home() {
        let lookup = env(&[
            (ENV_DATA_DIR, " /srv/feedback "),
            ("XDG_DATA_HOME", "/xdg"),
            ("HOME", "/home/u"),
        ]);
        assert_eq!(resolve_data_dir_with(lookup), PathBuf::from("/srv/feedback"));
    }

    #[test]
    fn blank_variables_fall_through_to_home() {
        let lookup = env(&[(ENV_DATA_DIR, "  "), ("XDG_DATA_HOME", ""), ("HOME", "/home/u")]);
        assert_eq!(
            resolve_data_dir_with(lookup),
            PathBuf::from("/home/u/.local/share/sdl-feedback")
        );
    }

    #[test]
    fn data_dir_has_relative_fallback() {
        assert_eq!(
            resolve_data_dir_with(env(&[])),
            PathBuf::from(".sdl-feedback/data")
        );
    }

    #[test]
    fn user_config_prefers_xdg_config_home() {
        let lookup = env(&[("XDG_CONFIG_HOME", "/cfg"), ("HOME", "/home/u")]);
        assert_eq!(
            resolve_config_path_with(ConfigPathScope::User, lookup),
            PathBuf::from("/cfg/sdl-feedback/config.toml")
        );
    }

    #[test]
    fn workspace_config_is_relative() {
        assert_eq!(
            resolve_config_path_with(ConfigPathScope::Workspace, env(&[("HOME", "/home/u")])),
            PathBuf::from(".sdl-feedback/config.toml")
        );
    }
}
