//! Config file discovery, loading, and environment variable overlay.

use crate::{ConfigError, RelrootConfig};
use std::env;
use std::path::{Path, PathBuf};

/// Information about where config values came from.
#[derive(Debug, Clone, Default)]
pub struct ConfigSources {
    /// Config files that were loaded (in order)
    pub files: Vec<PathBuf>,
    /// Environment variables that overrode config values
    pub env_overrides: Vec<String>,
}

/// Discover config files in standard locations.
///
/// Returns paths in load order (system, user, local).
/// Only returns files that exist.
pub fn discover_config_files() -> Vec<PathBuf> {
    discover_config_files_with_override(None)
}

/// Discover config files, optionally with a CLI override path.
///
/// If `cli_path` is provided and exists, it replaces the local override.
/// Returns paths in load order (system, user, local/cli).
pub fn discover_config_files_with_override(cli_path: Option<&Path>) -> Vec<PathBuf> {
    let mut files = Vec::new();

    let system = PathBuf::from("/etc/relroot/config.toml");
    if system.exists() {
        files.push(system);
    }

    // XDG_CONFIG_HOME or ~/.config
    if let Some(config_dir) = directories::BaseDirs::new().map(|d| d.config_dir().to_path_buf()) {
        let user = config_dir.join("relroot/config.toml");
        if user.exists() {
            files.push(user);
        }
    }

    if let Some(path) = cli_path {
        if path.exists() {
            files.push(path.to_path_buf());
            return files;
        }
    }

    let local = PathBuf::from("relroot.toml");
    if local.exists() {
        files.push(local);
    }

    files
}

/// Layer a TOML file onto `config`. Every key the file sets wins, even when
/// it spells out the compiled default.
pub fn apply_file(config: &mut RelrootConfig, path: &Path) -> Result<(), ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    apply_toml(config, &contents, path)
}

fn parse_error(path: &Path, message: impl Into<String>) -> ConfigError {
    ConfigError::Parse {
        path: path.to_path_buf(),
        message: message.into(),
    }
}

/// Parse config from TOML string, starting from the defaults.
#[cfg(test)]
pub(crate) fn parse_toml(contents: &str, path: &Path) -> Result<RelrootConfig, ConfigError> {
    let mut config = RelrootConfig::default();
    apply_toml(&mut config, contents, path)?;
    Ok(config)
}

/// Set the keys present in `contents`; absent keys keep their current value.
pub(crate) fn apply_toml(
    config: &mut RelrootConfig,
    contents: &str,
    path: &Path,
) -> Result<(), ConfigError> {
    let table: toml::Table = contents
        .parse()
        .map_err(|e: toml::de::Error| parse_error(path, e.to_string()))?;

    if let Some(paths) = table.get("paths").and_then(|v| v.as_table()) {
        if let Some(v) = paths.get("output_dir").and_then(|v| v.as_str()) {
            config.paths.output_dir = expand_path(v);
        }
    }

    if let Some(normalize) = table.get("normalize").and_then(|v| v.as_table()) {
        for (key, target) in [
            ("merge_cadential", &mut config.normalize.merge_cadential),
            ("parallel", &mut config.normalize.parallel),
        ] {
            if let Some(v) = normalize.get(key) {
                *target = v
                    .as_bool()
                    .ok_or_else(|| parse_error(path, format!("normalize.{} must be a boolean", key)))?;
            }
        }
    }

    if let Some(telemetry) = table.get("telemetry").and_then(|v| v.as_table()) {
        if let Some(v) = telemetry.get("log_level").and_then(|v| v.as_str()) {
            config.telemetry.log_level = v.to_string();
        }
    }

    Ok(())
}

/// Apply environment variable overrides to config.
pub fn apply_env_overrides(config: &mut RelrootConfig, sources: &mut ConfigSources) {
    apply_overrides(config, sources, |key| env::var(key).ok());
}

/// `true`/`false`, `1`/`0`, `yes`/`no`, `on`/`off`.
fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

pub(crate) fn apply_overrides(
    config: &mut RelrootConfig,
    sources: &mut ConfigSources,
    lookup: impl Fn(&str) -> Option<String>,
) {
    if let Some(v) = lookup("RELROOT_OUTPUT_DIR") {
        config.paths.output_dir = expand_path(&v);
        sources.env_overrides.push("RELROOT_OUTPUT_DIR".to_string());
    }

    if let Some(v) = lookup("RELROOT_MERGE_CADENTIAL").as_deref().and_then(parse_bool) {
        config.normalize.merge_cadential = v;
        sources.env_overrides.push("RELROOT_MERGE_CADENTIAL".to_string());
    }
    if let Some(v) = lookup("RELROOT_PARALLEL").as_deref().and_then(parse_bool) {
        config.normalize.parallel = v;
        sources.env_overrides.push("RELROOT_PARALLEL".to_string());
    }

    if let Some(v) = lookup("RELROOT_LOG_LEVEL") {
        config.telemetry.log_level = v;
        sources.env_overrides.push("RELROOT_LOG_LEVEL".to_string());
    }
    // Also support RUST_LOG
    if let Some(v) = lookup("RUST_LOG") {
        config.telemetry.log_level = v;
        sources.env_overrides.push("RUST_LOG".to_string());
    }
}

/// Expand ~ and environment variables in a path.
pub fn expand_path(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = directories::BaseDirs::new().map(|d| d.home_dir().to_path_buf()) {
            home.join(stripped)
        } else {
            PathBuf::from(path)
        }
    } else if let Some(stripped) = path.strip_prefix('$') {
        // $VAR/rest/of/path
        let (var_name, rest) = stripped.split_once('/').unwrap_or((stripped, ""));
        match env::var(var_name) {
            Ok(value) if rest.is_empty() => PathBuf::from(value),
            Ok(value) => PathBuf::from(value).join(rest),
            Err(_) => PathBuf::from(path),
        }
    } else {
        PathBuf::from(path)
    }
}
