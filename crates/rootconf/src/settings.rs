//! Configuration sections.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where normalized output lands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Directory for normalized pieces and vocabulary files when the command
    /// line gives a bare file name.
    /// Default: ~/.local/share/relroot
    #[serde(default = "PathsConfig::default_output_dir")]
    pub output_dir: PathBuf,
}

impl PathsConfig {
    fn default_output_dir() -> PathBuf {
        directories::BaseDirs::new()
            .map(|dirs| dirs.data_dir().join("relroot"))
            .unwrap_or_else(|| PathBuf::from(".local/share/relroot"))
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            output_dir: Self::default_output_dir(),
        }
    }
}

/// Pipeline switches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizeConfig {
    /// Fold cadential six-fours into the following dominant.
    /// Default: true
    #[serde(default = "NormalizeConfig::default_true")]
    pub merge_cadential: bool,

    /// Normalize pieces in parallel.
    /// Default: true
    #[serde(default = "NormalizeConfig::default_true")]
    pub parallel: bool,
}

impl NormalizeConfig {
    fn default_true() -> bool {
        true
    }
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            merge_cadential: true,
            parallel: true,
        }
    }
}

/// Log output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// `tracing` filter directive.
    /// Default: info
    #[serde(default = "TelemetryConfig::default_log_level")]
    pub log_level: String,
}

impl TelemetryConfig {
    fn default_log_level() -> String {
        "info".to_string()
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: Self::default_log_level(),
        }
    }
}
