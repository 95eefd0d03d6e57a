//! Configuration file support for srwp.
//!
//! Configuration is loaded from multiple sources with the following priority (highest first):
//! 1. Command-line arguments
//! 2. Environment variables (SRWP_*)
//! 3. Local config file (./srwp.toml)
//! 4. Global config file (~/.config/srwp/config.toml)
//!
//! ```toml
//! [device]
//! path = "/dev/ttyACM0"
//! fram_size = 8192
//! timeout_ms = 1000
//!
//! [transfer]
//! chunk_size = 100
//! max_retries = 3
//! ```

use {
    directories::ProjectDirs,
    log::{debug, warn},
    serde::{Deserialize, Serialize},
    std::{
        fs,
        path::{Path, PathBuf},
    },
};

/// Name of the per-directory config file.
pub const LOCAL_CONFIG_FILE: &str = "srwp.toml";

/// Device settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeviceConfig {
    /// Device path (e.g., "/dev/ttyACM0").
    pub path: Option<String>,
    /// FRAM size in bytes.
    pub fram_size: Option<u32>,
    /// Read timeout in milliseconds.
    pub timeout_ms: Option<u64>,
}

/// Bulk transfer settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TransferConfig {
    /// Bytes per read request.
    pub chunk_size: Option<u32>,
    /// Attempts per chunk.
    pub max_retries: Option<u32>,
}

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    /// Device configuration.
    #[serde(default)]
    pub device: DeviceConfig,
    /// Transfer configuration.
    #[serde(default)]
    pub transfer: TransferConfig,
}

impl Config {
    /// Load configuration from the global and local files.
    pub fn load() -> Self {
        let mut config = Self::default();

        if let Some(global_path) = Self::global_config_path() {
            if let Some(global_config) = Self::load_from_file(&global_path) {
                debug!("Loaded global config from {}", global_path.display());
                config.merge(global_config);
            }
        }

        // Local config overrides global
        if let Some(local_config) = Self::load_from_file(Path::new(LOCAL_CONFIG_FILE)) {
            debug!("Loaded local config from {LOCAL_CONFIG_FILE}");
            config.merge(local_config);
        }

        config
    }

    /// Load configuration from a specific file path (--config flag).
    pub fn load_from_path(path: &Path) -> Self {
        if let Some(config) = Self::load_from_file(path) {
            debug!("Loaded config from {}", path.display());
            config
        } else {
            warn!(
                "Could not load config from {}, using defaults",
                path.display()
            );
            Self::default()
        }
    }

    /// Load configuration from a specific file.
    ///
    /// Unreadable or malformed files are reported and skipped.
    fn load_from_file(path: &Path) -> Option<Self> {
        if !path.exists() {
            return None;
        }

        match fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => Some(config),
                Err(e) => {
                    warn!(
                        "Failed to parse config file {} as TOML: {}",
                        path.display(),
                        e
                    );
                    None
                },
            },
            Err(e) => {
                warn!("Failed to read config file {}: {}", path.display(), e);
                None
            },
        }
    }

    /// Get the global configuration directory.
    pub fn global_config_dir() -> Option<PathBuf> {
        ProjectDirs::from("", "", "srwp").map(|dirs| {
            dirs.config_dir()
                .to_path_buf()
        })
    }

    /// Get the global configuration file path.
    pub fn global_config_path() -> Option<PathBuf> {
        Self::global_config_dir().map(|dir| dir.join("config.toml"))
    }

    /// Merge another config into this one; set values in `other` win.
    fn merge(&mut self, other: Self) {
        if other.device.path.is_some() {
            self.device.path = other.device.path;
        }
        if other.device.fram_size.is_some() {
            self.device.fram_size = other.device.fram_size;
        }
        if other.device.timeout_ms.is_some() {
            self.device.timeout_ms = other.device.timeout_ms;
        }

        if other.transfer.chunk_size.is_some() {
            self.transfer.chunk_size = other.transfer.chunk_size;
        }
        if other.transfer.max_retries.is_some() {
            self.transfer.max_retries = other.transfer.max_retries;
        }
    }
}

#[cfg(test)]
mod tests {
    use {super::*, tempfile::tempdir};

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.device.path.is_none());
        assert!(config.device.fram_size.is_none());
        assert!(config.device.timeout_ms.is_none());
        assert!(config.transfer.chunk_size.is_none());
        assert!(config.transfer.max_retries.is_none());
    }

    #[test]
    fn test_config_from_toml() {
        let config: Config = toml::from_str(
            r#"
            [device]
            path = "/dev/ttyACM1"
            fram_size = 262144
            timeout_ms = 500

            [transfer]
            chunk_size = 64
            max_retries = 5
            "#,
        )
        .unwrap();

        assert_eq!(config.device.path.as_deref(), Some("/dev/ttyACM1"));
        assert_eq!(config.device.fram_size, Some(262_144));
        assert_eq!(config.device.timeout_ms, Some(500));
        assert_eq!(config.transfer.chunk_size, Some(64));
        assert_eq!(config.transfer.max_retries, Some(5));
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: Config = toml::from_str("[transfer]\nchunk_size = 10\n").unwrap();
        assert_eq!(config.transfer.chunk_size, Some(10));
        assert_eq!(config.device, DeviceConfig::default());
    }

    #[test]
    fn test_config_merge_overrides() {
        let mut base = Config::default();
        base.device.path = Some("/dev/ttyACM0".into());
        base.transfer.chunk_size = Some(100);

        let mut other = Config::default();
        other.device.path = Some("/dev/ttyACM1".into());
        other.device.fram_size = Some(8192);

        base.merge(other);

        assert_eq!(base.device.path.as_deref(), Some("/dev/ttyACM1"));
        assert_eq!(base.device.fram_size, Some(8192));
        assert_eq!(base.transfer.chunk_size, Some(100));
    }

    #[test]
    fn test_config_merge_does_not_overwrite_with_none() {
        let mut base = Config::default();
        base.device.timeout_ms = Some(2000);
        base.transfer.max_retries = Some(7);

        base.merge(Config::default());

        assert_eq!(base.device.timeout_ms, Some(2000));
        assert_eq!(base.transfer.max_retries, Some(7));
    }

    #[test]
    fn test_load_from_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        fs::write(&path, "[device]\npath = \"/dev/cu.usbmodem1\"\n").unwrap();

        let config = Config::load_from_path(&path);

        assert_eq!(config.device.path.as_deref(), Some("/dev/cu.usbmodem1"));
    }

    #[test]
    fn test_load_from_missing_path_falls_back() {
        let dir = tempdir().unwrap();
        let config = Config::load_from_path(&dir.path().join("nope.toml"));
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_invalid_toml_is_skipped() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        fs::write(&path, "invalid toml [[[").unwrap();

        assert!(Config::load_from_file(&path).is_none());
    }

    #[test]
    fn test_global_config_path_name() {
        if let Some(path) = Config::global_config_path() {
            assert!(path.ends_with("config.toml"));
        }
    }
}
