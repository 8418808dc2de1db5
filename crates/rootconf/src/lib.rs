//! Layered configuration loading for relroot.
//!
//! Kept free of the normalizer itself so that anything driving it (the CLI,
//! batch scripts, tests) can load the same settings.
//!
//! # Usage
//!
//! ```rust,no_run
//! use rootconf::RelrootConfig;
//!
//! let config = RelrootConfig::load().expect("Failed to load config");
//!
//! println!("Output dir: {}", config.paths.output_dir.display());
//! println!("Merge cadential six-fours: {}", config.normalize.merge_cadential);
//! ```
//!
//! # Config File Locations
//!
//! Files are loaded in order (later wins):
//! 1. `/etc/relroot/config.toml` (system)
//! 2. `~/.config/relroot/config.toml` (user)
//! 3. `./relroot.toml` (local override, or the path given on the command line)
//! 4. Environment variables (`RELROOT_*`, `RUST_LOG`)
//!
//! # Example Config
//!
//! ```toml
//! [paths]
//! output_dir = "~/corpora/relroot"
//!
//! [normalize]
//! merge_cadential = true
//! parallel = true
//!
//! [telemetry]
//! log_level = "info"
//! ```

pub mod loader;
pub mod settings;

pub use loader::{discover_config_files_with_override, expand_path, ConfigSources};
pub use settings::{NormalizeConfig, PathsConfig, TelemetryConfig};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

/// Complete relroot configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RelrootConfig {
    #[serde(default)]
    pub paths: PathsConfig,

    #[serde(default)]
    pub normalize: NormalizeConfig,

    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl RelrootConfig {
    /// Load configuration from all sources.
    ///
    /// Load order (later wins):
    /// 1. Compiled defaults
    /// 2. `/etc/relroot/config.toml`
    /// 3. `~/.config/relroot/config.toml`
    /// 4. `./relroot.toml`
    /// 5. Environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let (config, _sources) = Self::load_with_sources_from(None)?;
        Ok(config)
    }

    /// Load configuration from optional path and return information about sources.
    pub fn load_with_sources_from(
        config_path: Option<&Path>,
    ) -> Result<(Self, ConfigSources), ConfigError> {
        let mut sources = ConfigSources::default();
        let mut config = RelrootConfig::default();

        for path in loader::discover_config_files_with_override(config_path) {
            loader::apply_file(&mut config, &path)?;
            sources.files.push(path);
        }

        loader::apply_env_overrides(&mut config, &mut sources);

        Ok((config, sources))
    }

    /// Resolve an output file name against `paths.output_dir`. Paths with a
    /// directory component are used as given.
    pub fn output_path(&self, name: &Path) -> PathBuf {
        if name.is_absolute() || name.parent().is_some_and(|p| !p.as_os_str().is_empty()) {
            name.to_path_buf()
        } else {
            self.paths.output_dir.join(name)
        }
    }

    /// Serialize config to TOML string.
    pub fn to_toml(&self) -> String {
        // Built by hand for stable section order and a header comment
        let mut output = String::new();

        output.push_str("# relroot configuration\n\n");

        output.push_str("[paths]\n");
        output.push_str(&format!(
            "output_dir = \"{}\"\n",
            self.paths.output_dir.display()
        ));

        output.push_str("\n[normalize]\n");
        output.push_str(&format!(
            "merge_cadential = {}\n",
            self.normalize.merge_cadential
        ));
        output.push_str(&format!("parallel = {}\n", self.normalize.parallel));

        output.push_str("\n[telemetry]\n");
        output.push_str(&format!(
            "log_level = \"{}\"\n",
            self.telemetry.log_level
        ));

        output
    }
}
