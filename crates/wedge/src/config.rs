//! JSON configuration file
//!
//! Every key is optional. Missing keys take their default, and a file that
//! cannot be parsed is replaced by the defaults in memory only.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tapwedge_apdu_core::Uid;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

/// Default location of the configuration file, relative to the working directory
pub const DEFAULT_CONFIG_PATH: &str = "config.json";

/// Runtime configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Text typed before the UID
    pub prefix: String,
    /// Text typed after the UID
    pub suffix: String,
    /// Log verbosity
    pub log_level: LogLevel,
    /// How the UID is rendered
    pub format: UidFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            prefix: String::new(),
            suffix: "\n".to_string(),
            log_level: LogLevel::default(),
            format: UidFormat::default(),
        }
    }
}

/// Errors reading or writing the configuration file
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read or written
    #[error("{}: {source}", path.display())]
    Io {
        /// Path of the configuration file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// The file is not valid JSON for [`Config`]
    #[error("{}: {source}", path.display())]
    Parse {
        /// Path of the configuration file
        path: PathBuf,
        /// Underlying parse error
        #[source]
        source: serde_json::Error,
    },
}

/// Where the loaded configuration came from
#[derive(Debug)]
pub enum ConfigSource {
    /// Read from an existing file
    File,
    /// The file did not exist and was created with the defaults
    Created,
    /// The file did not exist and was left absent
    Missing,
    /// The defaults are used because the file could not be read or created
    Defaults(ConfigError),
}

impl Config {
    /// Load the configuration at `path`
    ///
    /// Never fails: problems are reported through the returned [`ConfigSource`]
    /// so they can be logged once logging is set up. An existing file that
    /// fails to parse is left untouched.
    pub fn load(path: impl AsRef<Path>) -> (Self, ConfigSource) {
        Self::load_with(path.as_ref(), true)
    }

    /// Load the configuration at `path` without creating a missing file
    pub fn load_existing(path: impl AsRef<Path>) -> (Self, ConfigSource) {
        Self::load_with(path.as_ref(), false)
    }

    fn load_with(path: &Path, create: bool) -> (Self, ConfigSource) {
        match fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => (config, ConfigSource::File),
                Err(source) => (
                    Self::default(),
                    ConfigSource::Defaults(ConfigError::Parse {
                        path: path.to_path_buf(),
                        source,
                    }),
                ),
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                let config = Self::default();
                if !create {
                    return (config, ConfigSource::Missing);
                }
                match config.save(path) {
                    Ok(()) => (config, ConfigSource::Created),
                    Err(e) => (config, ConfigSource::Defaults(e)),
                }
            }
            Err(source) => (
                Self::default(),
                ConfigSource::Defaults(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                }),
            ),
        }
    }

    /// Write the configuration as JSON indented with four spaces
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();

        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.serialize(&mut serializer)
            .map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        fs::write(path, buf).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Log verbosity as named in the configuration file
///
/// Unrecognised names fall back to [`LogLevel::Info`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LogLevel {
    /// `DEBUG`
    Debug,
    /// `INFO`
    #[default]
    Info,
    /// `WARNING`
    Warning,
    /// `ERROR`
    Error,
    /// `CRITICAL`
    Critical,
}

impl LogLevel {
    /// Name used in the configuration file
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
            Self::Critical => "CRITICAL",
        }
    }

    /// Most verbose level that is still recorded
    pub const fn level_filter(&self) -> LevelFilter {
        match self {
            Self::Debug => LevelFilter::DEBUG,
            Self::Info => LevelFilter::INFO,
            Self::Warning => LevelFilter::WARN,
            // tracing has no level above ERROR
            Self::Error | Self::Critical => LevelFilter::ERROR,
        }
    }
}

impl From<String> for LogLevel {
    fn from(name: String) -> Self {
        match name.as_str() {
            "DEBUG" => Self::Debug,
            "WARNING" => Self::Warning,
            "ERROR" => Self::Error,
            "CRITICAL" => Self::Critical,
            _ => Self::Info,
        }
    }
}

impl From<LogLevel> for String {
    fn from(level: LogLevel) -> Self {
        level.as_str().to_string()
    }
}

/// Rendering of a UID as typed text
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum UidFormat {
    /// Uppercase hexadecimal, `04A1B2C3`
    #[default]
    Hex,
    /// Unsigned big-endian decimal, `77705923`
    Dec,
    /// A tag this version does not know; rendered as hexadecimal
    Unknown(String),
}

impl UidFormat {
    /// Render `uid` in this format
    pub fn render(&self, uid: &Uid) -> String {
        match self {
            Self::Dec => uid.to_decimal(),
            Self::Hex | Self::Unknown(_) => uid.to_hex(),
        }
    }
}

impl fmt::Display for UidFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hex => f.write_str("HEX"),
            Self::Dec => f.write_str("DEC"),
            Self::Unknown(tag) => f.write_str(tag),
        }
    }
}

impl From<String> for UidFormat {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "HEX" => Self::Hex,
            "DEC" => Self::Dec,
            _ => Self::Unknown(tag),
        }
    }
}

impl From<UidFormat> for String {
    fn from(format: UidFormat) -> Self {
        format.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_config(dir: &tempfile::TempDir, contents: &str) -> PathBuf {
        let path = dir.path().join("config.json");
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_missing_keys_take_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, r#"{"prefix": "ID:", "log_level": "DEBUG"}"#);

        let (config, source) = Config::load(&path);
        assert!(matches!(source, ConfigSource::File));
        assert_eq!(config.prefix, "ID:");
        assert_eq!(config.suffix, "\n");
        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(config.format, UidFormat::Hex);
    }

    #[test]
    fn test_malformed_file_uses_defaults_and_is_kept() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "{ not json");

        let (config, source) = Config::load(&path);
        assert_eq!(config, Config::default());
        assert!(matches!(
            source,
            ConfigSource::Defaults(ConfigError::Parse { .. })
        ));
        assert_eq!(fs::read_to_string(&path).unwrap(), "{ not json");
    }

    #[test]
    fn test_missing_file_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let (config, source) = Config::load(&path);
        assert!(matches!(source, ConfigSource::Created));
        assert_eq!(config, Config::default());

        let written = fs::read_to_string(&path).unwrap();
        assert_eq!(
            written,
            "{\n    \"prefix\": \"\",\n    \"suffix\": \"\\n\",\n    \"log_level\": \"INFO\",\n    \"format\": \"HEX\"\n}"
        );

        let (reloaded, source) = Config::load(&path);
        assert!(matches!(source, ConfigSource::File));
        assert_eq!(reloaded, config);
    }

    #[test]
    fn test_load_existing_leaves_missing_file_absent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let (config, source) = Config::load_existing(&path);
        assert!(matches!(source, ConfigSource::Missing));
        assert_eq!(config, Config::default());
        assert!(!path.exists());
    }

    #[test]
    fn test_unwritable_location_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing-dir").join("config.json");

        let (config, source) = Config::load(&path);
        assert_eq!(config, Config::default());
        assert!(matches!(source, ConfigSource::Defaults(ConfigError::Io { .. })));
    }

    #[test]
    fn test_unknown_values_fall_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, r#"{"log_level": "VERBOSE", "format": "BASE64"}"#);

        let (config, _) = Config::load(&path);
        assert_eq!(config.log_level, LogLevel::Info);
        assert_eq!(config.format, UidFormat::Unknown("BASE64".into()));
    }

    #[test]
    fn test_log_level_filters() {
        assert_eq!(LogLevel::Warning.level_filter(), LevelFilter::WARN);
        assert_eq!(LogLevel::Critical.level_filter(), LevelFilter::ERROR);
        assert_eq!(String::from(LogLevel::Critical), "CRITICAL");
    }

    #[test]
    fn test_uid_format_render() {
        let uid = Uid::new(vec![0x04, 0xA1, 0xB2, 0xC3]).unwrap();
        assert_eq!(UidFormat::Hex.render(&uid), "04A1B2C3");
        assert_eq!(UidFormat::Dec.render(&uid), "77705923");
        assert_eq!(UidFormat::Unknown("X".into()).render(&uid), "04A1B2C3");
    }
}
