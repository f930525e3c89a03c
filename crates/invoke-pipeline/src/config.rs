//! Invocation configuration
//!
//! Every field has a default, so an empty TOML document is a valid
//! configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Failure to load an [`InvokeConfig`]
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("failed to read config file {}: {source}", .path.display())]
    Read {
        /// File that was requested
        path: PathBuf,
        /// I/O failure
        #[source]
        source: std::io::Error,
    },

    /// Contents are not a valid configuration
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value parsed but is unusable
    #[error("invalid value for {field}: {reason}")]
    Invalid {
        /// Offending field
        field: &'static str,
        /// Why it was rejected
        reason: String,
    },
}

/// Output format of the log subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Default multi-field format
    #[default]
    Full,
    /// Single-line format
    Compact,
    /// Multi-line, human oriented
    Pretty,
    /// Newline-delimited JSON
    Json,
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset
    pub level: String,
    /// Output format
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: LogFormat::Full,
        }
    }
}

/// Client-wide invocation settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InvokeConfig {
    /// Default deadline for execute invocations, in seconds
    pub execute_timeout_secs: u64,
    /// Default deadline for query invocations, in seconds
    pub query_timeout_secs: u64,
    /// Verify endorsement signatures before commit
    pub verify_signatures: bool,
    /// Logging settings
    pub logging: LoggingConfig,
}

impl Default for InvokeConfig {
    fn default() -> Self {
        Self {
            execute_timeout_secs: 30,
            query_timeout_secs: 10,
            verify_signatures: false,
            logging: LoggingConfig::default(),
        }
    }
}

impl InvokeConfig {
    /// Parse a TOML document
    ///
    /// # Errors
    /// `Parse` for malformed TOML, `Invalid` for a zero timeout.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file
    ///
    /// # Errors
    /// `Read` if the file cannot be read, otherwise as
    /// [`InvokeConfig::from_toml_str`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    /// Set the execute deadline
    ///
    /// Rounded up to whole seconds, never below one.
    #[must_use]
    pub fn with_execute_timeout(mut self, timeout: Duration) -> Self {
        self.execute_timeout_secs = whole_secs(timeout);
        self
    }

    /// Set the query deadline
    ///
    /// Rounded up to whole seconds, never below one.
    #[must_use]
    pub fn with_query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout_secs = whole_secs(timeout);
        self
    }

    /// Enable or disable signature verification
    #[must_use]
    pub fn with_verify_signatures(mut self, verify: bool) -> Self {
        self.verify_signatures = verify;
        self
    }

    /// Set logging
    #[must_use]
    pub fn with_logging(mut self, logging: LoggingConfig) -> Self {
        self.logging = logging;
        self
    }

    /// Execute deadline
    #[inline]
    #[must_use]
    pub fn execute_timeout(&self) -> Duration {
        Duration::from_secs(self.execute_timeout_secs)
    }

    /// Query deadline
    #[inline]
    #[must_use]
    pub fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.query_timeout_secs)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.execute_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "execute_timeout_secs",
                reason: "must be greater than zero".to_owned(),
            });
        }
        if self.query_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "query_timeout_secs",
                reason: "must be greater than zero".to_owned(),
            });
        }
        Ok(())
    }
}

fn whole_secs(timeout: Duration) -> u64 {
    timeout
        .as_secs()
        .saturating_add(u64::from(timeout.subsec_nanos() > 0))
        .max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn empty_document_is_default() {
        assert_eq!(InvokeConfig::from_toml_str("").unwrap(), InvokeConfig::default());
    }

    #[test]
    fn partial_document_keeps_other_defaults() {
        let config = InvokeConfig::from_toml_str(
            r#"
            execute_timeout_secs = 45
            verify_signatures = true

            [logging]
            format = "json"
            "#,
        )
        .unwrap();

        assert_eq!(config.execute_timeout(), Duration::from_secs(45));
        assert_eq!(config.query_timeout(), Duration::from_secs(10));
        assert!(config.verify_signatures);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn zero_timeout_rejected() {
        let err = InvokeConfig::from_toml_str("query_timeout_secs = 0").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "query_timeout_secs",
                ..
            }
        ));
    }

    #[test]
    fn unknown_format_is_a_parse_error() {
        let err = InvokeConfig::from_toml_str("[logging]\nformat = \"xml\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "execute_timeout_secs = 5").unwrap();

        let config = InvokeConfig::load(file.path()).unwrap();
        assert_eq!(config.execute_timeout_secs, 5);
    }

    #[test]
    fn missing_file_names_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");

        let err = InvokeConfig::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
        assert!(err.to_string().contains("absent.toml"));
    }

    #[test]
    fn builder_setters() {
        let config = InvokeConfig::default()
            .with_execute_timeout(Duration::from_secs(60))
            .with_verify_signatures(true);
        assert_eq!(config.execute_timeout_secs, 60);
        assert!(config.verify_signatures);
    }

    #[test]
    fn sub_second_timeouts_round_up() {
        let config = InvokeConfig::default()
            .with_execute_timeout(Duration::from_millis(500))
            .with_query_timeout(Duration::from_millis(1500));

        assert_eq!(config.execute_timeout(), Duration::from_secs(1));
        assert_eq!(config.query_timeout(), Duration::from_secs(2));
    }

    #[test]
    fn zero_timeout_setter_keeps_a_deadline() {
        let config = InvokeConfig::default().with_execute_timeout(Duration::ZERO);
        assert_eq!(config.execute_timeout(), Duration::from_secs(1));
    }
}
