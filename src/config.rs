// merakictl - CLI for rotating Meraki SSID pre-shared keys
// Copyright (C) 2026 merakictl contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

use anyhow::{Context, Result};
use dirs::config_dir;
use serde::{Deserialize, Serialize};
use std::{
    env, fs,
    path::{Path, PathBuf},
};
use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "https://api.meraki.com/api/v0";
pub const DEFAULT_TARGET_SSID: &str = "Guest";
pub const DEFAULT_BACKUP_DIR: &str = "backup";
pub const MIN_PSK_LEN: usize = 8;

#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct Config {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub ssid: Option<String>,
    pub backup_dir: Option<PathBuf>,
    pub min_psk_len: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Local,
    User,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not locate a writable config directory for the current user")]
    MissingConfigDir,
    #[error(
        "API key is required; export MERAKI_API or set it with `merakictl configure --key <key>`"
    )]
    MissingApiKey,
}

/// Command-line values that take precedence over both config files.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub ssid: Option<String>,
}

#[derive(Debug)]
pub struct EffectiveConfig {
    pub api_key: String,
    pub base_url: String,
    pub ssid: String,
    pub backup_dir: PathBuf,
    pub min_psk_len: usize,
}

pub fn config_path(scope: Scope, cwd: &Path) -> Result<PathBuf> {
    match scope {
        Scope::Local => Ok(cwd.join(".merakictl.yaml")),
        Scope::User => {
            if let Ok(custom) = env::var("MERAKICTL_CONFIG_DIR") {
                return Ok(PathBuf::from(custom).join("config.yaml"));
            }
            let base = config_dir().ok_or(ConfigError::MissingConfigDir)?;
            Ok(base.join("merakictl").join("config.yaml"))
        }
    }
}

pub fn load(cwd: &Path) -> Result<Config> {
    let user = read_if_exists(&config_path(Scope::User, cwd)?)?.unwrap_or_default();
    let local = read_if_exists(&config_path(Scope::Local, cwd)?)?.unwrap_or_default();
    Ok(merge(user, local))
}

pub fn load_scope(scope: Scope, cwd: &Path) -> Result<Config> {
    Ok(read_if_exists(&config_path(scope, cwd)?)?.unwrap_or_default())
}

pub fn save(scope: Scope, config: &Config, cwd: &Path) -> Result<PathBuf> {
    let path = config_path(scope, cwd)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("creating {:?}", parent))?;
    }
    let serialized = serde_yaml::to_string(config).context("serializing config")?;
    fs::write(&path, serialized).with_context(|| format!("writing {:?}", path))?;
    Ok(path)
}

pub fn resolve(cwd: &Path, overrides: Overrides) -> Result<EffectiveConfig> {
    let mut merged = load(cwd)?;

    if let Some(key) = overrides.api_key {
        merged.api_key = Some(key);
    }
    if let Some(url) = overrides.base_url {
        merged.base_url = Some(url);
    }
    if let Some(ssid) = overrides.ssid {
        merged.ssid = Some(ssid);
    }

    let api_key = merged
        .api_key
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
        .ok_or(ConfigError::MissingApiKey)?;

    let base_url = merged
        .base_url
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
    let ssid = merged
        .ssid
        .unwrap_or_else(|| DEFAULT_TARGET_SSID.to_string());
    let backup_dir = match merged.backup_dir {
        Some(dir) if dir.is_absolute() => dir,
        Some(dir) => cwd.join(dir),
        None => cwd.join(DEFAULT_BACKUP_DIR),
    };
    // WPA2 rejects anything shorter, so a config file can only raise the floor.
    let min_psk_len = merged.min_psk_len.unwrap_or(MIN_PSK_LEN).max(MIN_PSK_LEN);

    Ok(EffectiveConfig {
        api_key,
        base_url,
        ssid,
        backup_dir,
        min_psk_len,
    })
}

fn read_if_exists(path: &Path) -> Result<Option<Config>> {
    if !path.exists() {
        return Ok(None);
    }

    let contents = fs::read_to_string(path).with_context(|| format!("reading {:?}", path))?;
    let config = serde_yaml::from_str(&contents).with_context(|| format!("parsing {:?}", path))?;
    Ok(Some(config))
}

fn merge(user: Config, local: Config) -> Config {
    Config {
        api_key: local.api_key.or(user.api_key),
        base_url: local.base_url.or(user.base_url),
        ssid: local.ssid.or(user.ssid),
        backup_dir: local.backup_dir.or(user.backup_dir),
        min_psk_len: local.min_psk_len.or(user.min_psk_len),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::OnceLock;
    use std::{env, fs};
    use tempfile::tempdir;

    static ENV_LOCK: OnceLock<std::sync::Mutex<()>> = OnceLock::new();

    fn isolate(cwd: &Path) {
        unsafe {
            env::set_var("MERAKICTL_CONFIG_DIR", cwd.join("config"));
        }
        fs::create_dir_all(cwd.join("config")).unwrap();
    }

    #[test]
    fn merges_user_and_local_and_overrides() {
        let _guard = ENV_LOCK
            .get_or_init(|| std::sync::Mutex::new(()))
            .lock()
            .unwrap();
        let cwd = tempdir().unwrap();
        isolate(cwd.path());

        let user_cfg = Config {
            api_key: Some("user-key".into()),
            base_url: Some("https://example.test".into()),
            ssid: Some("Corp".into()),
            backup_dir: Some(PathBuf::from("/var/backups/meraki")),
            min_psk_len: Some(12),
        };
        save(Scope::User, &user_cfg, cwd.path()).unwrap();

        let local_cfg = Config {
            api_key: Some("local-key".into()),
            ssid: Some("Guest".into()),
            ..Config::default()
        };
        save(Scope::Local, &local_cfg, cwd.path()).unwrap();

        let effective = resolve(cwd.path(), Overrides::default()).unwrap();
        assert_eq!(effective.api_key, "local-key");
        assert_eq!(effective.base_url, "https://example.test");
        assert_eq!(effective.ssid, "Guest");
        assert_eq!(effective.backup_dir, PathBuf::from("/var/backups/meraki"));
        assert_eq!(effective.min_psk_len, 12);

        let overridden = resolve(
            cwd.path(),
            Overrides {
                api_key: Some("override".into()),
                base_url: Some("https://override.test".into()),
                ssid: Some("Lobby".into()),
            },
        )
        .unwrap();
        assert_eq!(overridden.api_key, "override");
        assert_eq!(overridden.base_url, "https://override.test");
        assert_eq!(overridden.ssid, "Lobby");
    }

    #[test]
    fn applies_defaults_and_psk_floor() {
        let _guard = ENV_LOCK
            .get_or_init(|| std::sync::Mutex::new(()))
            .lock()
            .unwrap();
        let cwd = tempdir().unwrap();
        isolate(cwd.path());

        let local_cfg = Config {
            api_key: Some("  key-with-space \n".into()),
            min_psk_len: Some(4),
            ..Config::default()
        };
        save(Scope::Local, &local_cfg, cwd.path()).unwrap();

        let effective = resolve(cwd.path(), Overrides::default()).unwrap();
        assert_eq!(effective.api_key, "key-with-space");
        assert_eq!(effective.base_url, DEFAULT_BASE_URL);
        assert_eq!(effective.ssid, DEFAULT_TARGET_SSID);
        assert_eq!(effective.backup_dir, cwd.path().join("backup"));
        assert_eq!(effective.min_psk_len, MIN_PSK_LEN);
    }

    #[test]
    fn errors_when_missing_key() {
        let _guard = ENV_LOCK
            .get_or_init(|| std::sync::Mutex::new(()))
            .lock()
            .unwrap();
        let cwd = tempdir().unwrap();
        isolate(cwd.path());
        let err = resolve(cwd.path(), Overrides::default()).unwrap_err();
        assert!(err.to_string().contains("API key is required"));
    }
}
