//! Bootstrap configuration loading and credential resolution
//!
//! Settings are resolved with the following priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! Missing TOML files are not fatal: a warning is logged and defaults apply.

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Logging configuration
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Where a resolved setting came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    CommandLine,
    Environment,
    TomlFile,
    Default,
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConfigSource::CommandLine => "command line",
            ConfigSource::Environment => "environment",
            ConfigSource::TomlFile => "TOML",
            ConfigSource::Default => "default",
        };
        f.write_str(name)
    }
}

/// API credential together with the source it was loaded from
///
/// `Debug` never prints the secret itself.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    value: String,
    source: ConfigSource,
}

impl Credential {
    pub fn new(value: impl Into<String>, source: ConfigSource) -> Self {
        Self {
            value: value.into(),
            source,
        }
    }

    /// Raw secret value, for building outbound requests only
    pub fn expose(&self) -> &str {
        &self.value
    }

    pub fn source(&self) -> ConfigSource {
        self.source
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("value", &"<redacted>")
            .field("source", &self.source)
            .finish()
    }
}

/// Validate API key (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}

/// Resolve an API credential from environment and TOML
///
/// **Priority:** ENV → TOML
///
/// Invalid (blank) values are ignored. Returns `None` when no source holds a
/// valid key; callers decide whether that is fatal.
pub fn resolve_credential(
    name: &str,
    env_var: &str,
    toml_value: Option<&str>,
) -> Option<Credential> {
    let env_key = std::env::var(env_var).ok().filter(|k| is_valid_key(k));
    let toml_key = toml_value.filter(|k| is_valid_key(k));

    if env_key.is_some() && toml_key.is_some() {
        warn!(
            "{} found in both environment ({}) and TOML config. Using environment (highest priority).",
            name, env_var
        );
    }

    if let Some(key) = env_key {
        info!("{} loaded from environment variable", name);
        return Some(Credential::new(key.trim(), ConfigSource::Environment));
    }

    if let Some(key) = toml_key {
        info!("{} loaded from TOML config", name);
        return Some(Credential::new(key.trim(), ConfigSource::TomlFile));
    }

    None
}

/// Get default configuration file path for a module
///
/// `<config dir>/francoflex/<module>.toml`, e.g.
/// `~/.config/francoflex/ffx-pa.toml` on Linux.
pub fn default_config_path(module_name: &str) -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("francoflex").join(format!("{}.toml", module_name)))
}

/// Load a TOML config file into `T`
///
/// When `required` is false a missing file yields `T::default()` with a
/// warning. A file that exists but cannot be read or parsed is always an error.
pub fn load_toml_config<T>(path: &Path, required: bool) -> Result<T>
where
    T: DeserializeOwned + Default,
{
    if !path.exists() {
        if required {
            return Err(Error::Config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }
        warn!(
            "Config file not found at {}, using defaults",
            path.display()
        );
        return Ok(T::default());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read TOML failed ({}): {}", path.display(), e)))?;

    let config = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse TOML failed ({}): {}", path.display(), e)))?;

    info!("Loaded config from {}", path.display());
    Ok(config)
}

/// Read an environment variable and parse it
///
/// Unset variables yield `Ok(None)`; set but unparsable values are rejected.
pub fn env_override<T>(env_var: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: fmt::Display,
{
    match std::env::var(env_var) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| Error::InvalidInput(format!("{}={:?}: {}", env_var, raw, e))),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_valid_key() {
        assert!(is_valid_key("abc"));
        assert!(!is_valid_key(""));
        assert!(!is_valid_key("   \t"));
    }

    #[test]
    fn test_credential_debug_is_redacted() {
        let cred = Credential::new("super-secret", ConfigSource::TomlFile);
        let rendered = format!("{:?}", cred);
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("TomlFile"));
        assert_eq!(cred.expose(), "super-secret");
    }

    #[test]
    fn test_logging_config_defaults() {
        let logging = LoggingConfig::default();
        assert_eq!(logging.level, "info");
        assert!(logging.file.is_none());
    }

    #[test]
    fn test_default_config_path_names_module() {
        if let Some(path) = default_config_path("ffx-pa") {
            assert!(path.ends_with("francoflex/ffx-pa.toml"));
        }
    }
}
