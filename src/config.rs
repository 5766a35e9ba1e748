use crate::core::EcuVariant;
use crate::hardware::{CanConfig, InterfaceType};
use crate::input::{DatalogSchema, ShortRowPolicy};
use crate::playback::PlaybackConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Highest tick rate that still leaves a nonzero tick period
pub const MAX_HZ: u32 = 1_000_000_000;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid settings in {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Tick frequency must be a positive number of Hz")]
    InvalidFrequency,

    #[error("Tick frequency {hz} Hz is above the {max} Hz limit")]
    FrequencyTooHigh { hz: u32, max: u32 },
}

/// Replay settings, read from `config.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplayConfig {
    /// Datalog export to replay
    pub datalog: PathBuf,
    /// Which ECU's auxiliary frame layout to emulate
    pub ecu: EcuVariant,
    /// Bus interface name, or serial port for SLCAN adapters
    pub interface: String,
    /// `socketcan` needs a Linux build with `--features socketcan`;
    /// use `serial` for SLCAN adapters or `virtual` for a dry run otherwise
    pub interface_type: InterfaceType,
    pub bitrate: u32,
    /// Ticks per second
    pub hz: u32,
    /// Read the GPS columns and broadcast the GPS frame
    pub gps: bool,
    pub short_rows: ShortRowPolicy,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            datalog: PathBuf::from("testdata.csv"),
            ecu: EcuVariant::KPro,
            interface: "vcan0".to_string(),
            interface_type: InterfaceType::SocketCan,
            bitrate: CanConfig::default().bitrate,
            hz: 10,
            gps: true,
            short_rows: ShortRowPolicy::Skip,
        }
    }
}

impl ReplayConfig {
    /// Default settings location, `<config dir>/ecu-replay/config.json`
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("ecu-replay").join("config.json"))
    }

    /// Load settings from an explicit path, the default location, or defaults
    ///
    /// An explicit path must exist; the default location is optional.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match explicit {
            Some(path) => Self::from_file(path)?,
            None => match Self::config_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => Self::default(),
            },
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.hz == 0 {
            return Err(ConfigError::InvalidFrequency);
        }
        if self.hz > MAX_HZ {
            return Err(ConfigError::FrequencyTooHigh {
                hz: self.hz,
                max: MAX_HZ,
            });
        }
        Ok(())
    }

    pub fn schema(&self) -> DatalogSchema {
        DatalogSchema::new(self.ecu, self.gps)
    }

    pub fn can_config(&self) -> CanConfig {
        CanConfig { bitrate: self.bitrate }
    }

    pub fn playback(&self) -> PlaybackConfig {
        PlaybackConfig {
            hz: self.hz,
            gps: self.gps,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(json: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults() {
        let config = ReplayConfig::default();
        assert_eq!(config.ecu, EcuVariant::KPro);
        assert_eq!(config.interface, "vcan0");
        assert_eq!(config.hz, 10);
        assert!(config.gps);
        assert_eq!(config.schema().required_columns(), 31);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let file = write_config(r#"{ "ecu": "variantA", "hz": 25, "interface_type": "virtual" }"#);
        let config = ReplayConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.ecu, EcuVariant::S300);
        assert_eq!(config.hz, 25);
        assert_eq!(config.interface_type, InterfaceType::Virtual);
        assert_eq!(config.interface, "vcan0");
        assert_eq!(config.short_rows, ShortRowPolicy::Skip);
    }

    #[test]
    fn test_variant_names() {
        for (name, variant) in [
            ("variantA", EcuVariant::S300),
            ("s300", EcuVariant::S300),
            ("variantB", EcuVariant::KPro),
            ("kpro", EcuVariant::KPro),
        ] {
            let json = format!(r#"{{ "ecu": "{}" }}"#, name);
            let config: ReplayConfig = serde_json::from_str(&json).unwrap();
            assert_eq!(config.ecu, variant, "{}", name);
        }
        assert!(serde_json::from_str::<ReplayConfig>(r#"{ "ecu": "ms3" }"#).is_err());
    }

    #[test]
    fn test_zero_frequency_rejected() {
        let file = write_config(r#"{ "hz": 0 }"#);
        assert!(matches!(
            ReplayConfig::load(Some(file.path())),
            Err(ConfigError::InvalidFrequency)
        ));
    }

    #[test]
    fn test_excessive_frequency_rejected() {
        let file = write_config(r#"{ "hz": 2000000000 }"#);
        assert!(matches!(
            ReplayConfig::load(Some(file.path())),
            Err(ConfigError::FrequencyTooHigh { hz: 2_000_000_000, max: MAX_HZ })
        ));

        let config = ReplayConfig { hz: MAX_HZ, ..ReplayConfig::default() };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_bad_json_and_missing_file() {
        let file = write_config("{ not json");
        assert!(matches!(
            ReplayConfig::load(Some(file.path())),
            Err(ConfigError::Parse { .. })
        ));
        assert!(matches!(
            ReplayConfig::load(Some(Path::new("/nonexistent/config.json"))),
            Err(ConfigError::Io { .. })
        ));
    }

    #[test]
    fn test_short_row_policy_names() {
        let config: ReplayConfig = serde_json::from_str(r#"{ "short_rows": "abort", "gps": false }"#).unwrap();
        assert_eq!(config.short_rows, ShortRowPolicy::Abort);
        assert_eq!(config.schema().required_columns(), 29);
        assert!(!config.playback().gps);
    }
}
