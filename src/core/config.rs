use crate::core::normalize::NormalizerConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Error while loading or parsing a config file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Report only user events that carry an error code.
    #[serde(default)]
    pub errors_only: bool,
    /// Default for admin records that do not say whether to attach the
    /// resource representation.
    #[serde(default)]
    pub include_representation: bool,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Report sink configuration.
    pub output: OutputConfig,
}

impl Config {
    /// Loads a config file from TOML.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    pub fn normalizer(&self) -> NormalizerConfig {
        NormalizerConfig {
            errors_only: self.errors_only,
        }
    }
}

/// Log filter and layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, e.g. `info` or `iamlog=debug`.
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Emit logs as JSON lines.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Output sink configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Output directory for report files.
    pub dir: String,
    /// Buffered size before a new file is written.
    #[serde(default = "default_target_size_mb")]
    pub target_size_mb: u64,
    /// Maximum age of buffered reports before they are written out.
    pub max_age_seconds: Option<u64>,
    /// Bound on reports queued for the writer thread.
    #[serde(default = "default_queue_depth")]
    pub queue_depth: usize,
    pub format: FormatConfig,
}

fn default_target_size_mb() -> u64 {
    16
}

fn default_queue_depth() -> usize {
    1024
}

/// Output format selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FormatConfig {
    Jsonl(FormatOptions),
}

/// Per-format options (compression, etc.).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormatOptions {
    pub compression: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_config() {
        let config: Config = toml::from_str(
            r#"
errors_only = true
include_representation = true

[logging]
level = "iamlog=debug"
json = true

[output]
dir = "out"
target_size_mb = 4
max_age_seconds = 30
queue_depth = 64

[output.format]
type = "jsonl"
compression = "gzip"
"#,
        )
        .expect("config");

        assert!(config.normalizer().errors_only);
        assert!(config.include_representation);
        assert_eq!(config.logging.level, "iamlog=debug");
        assert_eq!(config.output.max_age_seconds, Some(30));
        let FormatConfig::Jsonl(options) = &config.output.format;
        assert_eq!(options.compression.as_deref(), Some("gzip"));
    }

    #[test]
    fn defaults() {
        let config: Config = toml::from_str(
            r#"
[output]
dir = "out"
format = { type = "jsonl" }
"#,
        )
        .expect("config");

        assert!(!config.errors_only);
        assert!(!config.include_representation);
        assert_eq!(config.logging.level, "info");
        assert!(!config.logging.json);
        assert_eq!(config.output.target_size_mb, 16);
        assert_eq!(config.output.queue_depth, 1024);
        assert_eq!(config.output.max_age_seconds, None);
    }

    #[test]
    fn missing_file() {
        let err = Config::from_path("/nonexistent/iamlog.toml").expect_err("missing");
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
