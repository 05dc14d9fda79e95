//! Configuration management for rawline
//!
//! Handles loading and saving editor preferences from `~/.rawline/config.toml`.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::LevelFilter;
use serde::{Deserialize, Serialize};

use crate::engine::WriteMode;
use crate::error::{Error, Result};
use crate::input::decoder::{DEFAULT_ESCAPE_TIMEOUT, DEFAULT_POLL_INTERVAL};
use crate::input::{DecoderSettings, Key};

/// rawline configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// "insert" or "overwrite"
    pub write_mode: WriteMode,

    /// Write unbound printable keys at the cursor
    pub echo: bool,

    /// How long to wait for the rest of an arrow-key sequence; 0 waits forever
    pub escape_timeout_ms: u64,

    /// How often the key reader checks whether it should stop
    pub poll_interval_ms: u64,

    /// Key that ends the session, by name ("ctrl+d", "esc", ...)
    pub exit_key: String,

    /// "off", "error", "warn", "info", "debug" or "trace"
    pub log_level: String,

    /// Log file; defaults to `rawline.log` in the config directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            write_mode: WriteMode::Insert,
            echo: true,
            escape_timeout_ms: DEFAULT_ESCAPE_TIMEOUT.as_millis() as u64,
            poll_interval_ms: DEFAULT_POLL_INTERVAL.as_millis() as u64,
            exit_key: "ctrl+d".to_string(),
            log_level: "info".to_string(),
            log_file: None,
        }
    }
}

impl Config {
    /// Config directory (~/.rawline), if there is a home directory
    pub fn config_dir() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".rawline"))
    }

    /// Config file path (~/.rawline/config.toml)
    pub fn config_path() -> Option<PathBuf> {
        Self::config_dir().map(|dir| dir.join("config.toml"))
    }

    /// Load from the default location, or defaults if there is no file.
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load from `path`, or defaults if it does not exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path).map_err(|e| config_error(path, e))?;
        let config: Config = toml::from_str(&contents).map_err(|e| config_error(path, e))?;
        config.validate().map_err(|e| config_error(path, e))?;
        Ok(config)
    }

    /// Save to the default location.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path().ok_or_else(|| Error::Config {
            path: PathBuf::from("~/.rawline/config.toml"),
            message: "could not find home directory".to_string(),
        })?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(|e| config_error(dir, e))?;
        }
        let contents = toml::to_string_pretty(self).map_err(|e| config_error(path, e))?;

        // Atomic write: write to temp file then rename
        let tmp_path = path.with_extension("tmp");
        fs::write(&tmp_path, &contents).map_err(|e| config_error(&tmp_path, e))?;
        fs::rename(&tmp_path, path).map_err(|e| config_error(path, e))?;

        Ok(())
    }

    /// Check the fields that are stored as names.
    pub fn validate(&self) -> Result<()> {
        self.exit_key()?;
        self.log_level()?;
        Ok(())
    }

    pub fn exit_key(&self) -> Result<Key> {
        Key::from_name(&self.exit_key)
    }

    pub fn log_level(&self) -> Result<LevelFilter> {
        self.log_level
            .parse()
            .map_err(|_| Error::UnknownLogLevel(self.log_level.clone()))
    }

    pub fn log_file(&self) -> PathBuf {
        self.log_file.clone().unwrap_or_else(|| {
            Self::config_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join("rawline.log")
        })
    }

    pub fn decoder_settings(&self) -> DecoderSettings {
        DecoderSettings {
            escape_timeout: match self.escape_timeout_ms {
                0 => None,
                ms => Some(Duration::from_millis(ms)),
            },
            poll_interval: Duration::from_millis(self.poll_interval_ms.max(1)),
        }
    }
}

fn config_error(path: &Path, err: impl std::fmt::Display) -> Error {
    Error::Config {
        path: path.to_path_buf(),
        message: err.to_string(),
    }
}
