//! Optional user settings.
//!
//! With the `config` feature, settings are read from `<config_dir>/serialcup/config.toml`:
//!
//! ```toml
//! device_dir = "/dev/serial/by-id"
//! read_timeout_ms = 1000
//! file_extension = "txt"
//! ```
//!
//! Every key is optional. A missing file yields the defaults.

use crate::device::DEFAULT_DEVICE_DIR;
use crate::error::{Result, SerialcupError};
use crate::segment::DEFAULT_EXTENSION;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default bounded wait for one device read.
pub const DEFAULT_READ_TIMEOUT_MS: u64 = 1000;

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "config", derive(serde::Deserialize))]
#[cfg_attr(feature = "config", serde(default, deny_unknown_fields))]
pub struct Settings {
    /// Directory of stable device links used by `list` and `capture`
    pub device_dir: PathBuf,
    /// Bounded wait of one device read; also bounds interrupt latency
    pub read_timeout_ms: u64,
    /// Extension of newly created segment files
    pub file_extension: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            device_dir: PathBuf::from(DEFAULT_DEVICE_DIR),
            read_timeout_ms: DEFAULT_READ_TIMEOUT_MS,
            file_extension: DEFAULT_EXTENSION.to_string(),
        }
    }
}

impl Settings {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    /// Load settings from the user's config directory, or defaults when there is none.
    pub fn load() -> Result<Self> {
        match Self::default_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    #[cfg(feature = "config")]
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("serialcup").join("config.toml"))
    }

    #[cfg(not(feature = "config"))]
    pub fn default_path() -> Option<PathBuf> {
        None
    }

    /// Load settings from `path`; a missing file yields the defaults.
    #[cfg(feature = "config")]
    pub fn load_from(path: &Path) -> Result<Self> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => {
                return Err(SerialcupError::file_error(
                    format!("Failed to read config: {}", path.display()),
                    e,
                ))
            }
        };
        log::debug!("loading settings from {}", path.display());
        Self::from_toml(&text)
    }

    #[cfg(not(feature = "config"))]
    pub fn load_from(_path: &Path) -> Result<Self> {
        Ok(Self::default())
    }

    #[cfg(feature = "config")]
    pub fn from_toml(text: &str) -> Result<Self> {
        let settings: Self =
            toml::from_str(text).map_err(|e| SerialcupError::config(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    #[cfg_attr(not(feature = "config"), allow(dead_code))]
    fn validate(&self) -> Result<()> {
        if self.read_timeout_ms == 0 {
            return Err(SerialcupError::config("read_timeout_ms must be positive"));
        }
        if self.file_extension.is_empty() || self.file_extension.contains(['.', '/']) {
            return Err(SerialcupError::config(format!(
                "file_extension '{}' must be a non-empty name without dots or slashes",
                self.file_extension
            )));
        }
        Ok(())
    }
}

#[cfg(all(test, feature = "config"))]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn empty_file_gives_defaults() {
        assert_eq!(Settings::from_toml("").unwrap(), Settings::default());
    }

    #[test]
    fn keys_override_defaults() {
        let settings = Settings::from_toml(
            "device_dir = \"/tmp/devs\"\nread_timeout_ms = 250\nfile_extension = \"log\"\n",
        )
        .unwrap();
        assert_eq!(settings.device_dir, PathBuf::from("/tmp/devs"));
        assert_eq!(settings.read_timeout(), Duration::from_millis(250));
        assert_eq!(settings.file_extension, "log");
    }

    #[test]
    fn invalid_values_are_config_errors() {
        for text in [
            "read_timeout_ms = 0",
            "file_extension = \"tar.gz\"",
            "unknown_key = 1",
            "read_timeout_ms = \"soon\"",
        ] {
            assert!(
                matches!(
                    Settings::from_toml(text),
                    Err(SerialcupError::ConfigError { .. })
                ),
                "{text:?} should be rejected"
            );
        }
    }

    #[test]
    fn missing_file_gives_defaults() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let settings = Settings::load_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(settings, Settings::default());
    }
}
