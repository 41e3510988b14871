use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::app_dirs::AppDirs;
use crate::error::{Error, Result};
use crate::mode::{Difficulty, GameMode};
use crate::session::{SessionConfig, DEFAULT_BUTTON_COUNT, DEFAULT_MAX_ROUNDS};

pub const MIN_BUTTONS: u8 = 2;
pub const MAX_BUTTONS: u8 = 9;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub mode: GameMode,
    pub difficulty: Difficulty,
    pub button_count: u8,
    pub max_rounds: u32,
    pub player_name: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mode: GameMode::TimeAttack,
            difficulty: Difficulty::Easy,
            button_count: DEFAULT_BUTTON_COUNT,
            max_rounds: DEFAULT_MAX_ROUNDS,
            player_name: None,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if !(MIN_BUTTONS..=MAX_BUTTONS).contains(&self.button_count) {
            return Err(Error::InvalidConfig(format!(
                "button count must be between {} and {}, got {}",
                MIN_BUTTONS, MAX_BUTTONS, self.button_count
            )));
        }
        if self.max_rounds == 0 {
            return Err(Error::InvalidConfig(
                "endurance needs at least one round".to_string(),
            ));
        }
        Ok(())
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            button_count: self.button_count,
            max_rounds: self.max_rounds,
            player_name: self
                .player_name
                .as_deref()
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(str::to_string),
            ..SessionConfig::default()
        }
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    pub fn new() -> Self {
        let path = AppDirs::config_path().unwrap_or_else(|| PathBuf::from("glowtap_config.json"));
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    /// Missing, unreadable or invalid files fall back to defaults
    fn load(&self) -> Config {
        let Ok(bytes) = fs::read(&self.path) else {
            return Config::default();
        };
        match serde_json::from_slice::<Config>(&bytes) {
            Ok(cfg) if cfg.validate().is_ok() => cfg,
            Ok(_) => {
                warn!("Ignoring invalid config at {}", self.path.display());
                Config::default()
            }
            Err(e) => {
                warn!("Ignoring unreadable config at {}: {}", self.path.display(), e);
                Config::default()
            }
        }
    }

    fn save(&self, cfg: &Config) -> Result<()> {
        cfg.validate()?;
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg)?;
        fs::write(&self.path, data)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use tempfile::tempdir;

    #[test]
    fn roundtrip_default_config() {
        let dir = tempdir().unwrap();
        let store = FileConfigStore::with_path(dir.path().join("config.json"));
        let cfg = Config::default();
        store.save(&cfg).unwrap();
        assert_eq!(store.load(), cfg);
        assert!(store.path().ends_with("nested/config.json"));
    }

    #[test]
    fn save_and_load_custom_config() {
        let dir = tempdir().unwrap();
        let store = FileConfigStore::with_path(dir.path().join("nested").join("config.json"));
        let cfg = Config {
            mode: GameMode::Endurance,
            difficulty: Difficulty::Hell,
            button_count: 4,
            max_rounds: 8,
            player_name: Some("ada".into()),
        };
        store.save(&cfg).unwrap();
        assert_eq!(store.load(), cfg);
    }

    #[test]
    fn missing_or_garbled_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let store = FileConfigStore::with_path(&path);
        assert_eq!(store.load(), Config::default());

        fs::write(&path, b"{ not json").unwrap();
        assert_eq!(store.load(), Config::default());

        fs::write(&path, br#"{"button_count": 12}"#).unwrap();
        assert_eq!(store.load(), Config::default());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, br#"{"mode": "unlimited"}"#).unwrap();
        let cfg = FileConfigStore::with_path(&path).load();
        assert_eq!(cfg.mode, GameMode::Unlimited);
        assert_eq!(cfg.button_count, DEFAULT_BUTTON_COUNT);
    }

    #[test]
    fn validation_bounds() {
        let mut cfg = Config::default();
        assert!(cfg.validate().is_ok());
        cfg.button_count = 1;
        assert_matches!(cfg.validate(), Err(Error::InvalidConfig(_)));
        cfg.button_count = 9;
        assert!(cfg.validate().is_ok());
        cfg.max_rounds = 0;
        assert_matches!(cfg.validate(), Err(Error::InvalidConfig(_)));
    }

    #[test]
    fn blank_player_name_is_dropped() {
        let cfg = Config {
            player_name: Some("   ".into()),
            ..Config::default()
        };
        assert_eq!(cfg.session_config().player_name, None);
        let cfg = Config {
            player_name: Some(" bo ".into()),
            ..Config::default()
        };
        assert_eq!(cfg.session_config().player_name.as_deref(), Some("bo"));
    }
}
