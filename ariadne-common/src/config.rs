//! Configuration loading and resolution
//!
//! Every setting is resolved independently in priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! The resolved [`ResolverConfig`] is read-only and is handed to the
//! resolver at construction time.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_COVERAGE_URL: &str = "http://sfx.library.nyu.edu/sfxlcl41";
pub const DEFAULT_CATALOG_URL: &str =
    "http://bobcat.library.nyu.edu/primo_library/libweb/webservices/rest/primo-explore/v1/pnxs";
pub const DEFAULT_CATALOG_INSTITUTION: &str = "NYU";
pub const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 30;

pub const ENV_PORT: &str = "ARIADNE_PORT";
pub const ENV_LOG_LEVEL: &str = "ARIADNE_LOG_LEVEL";
pub const ENV_COVERAGE_URL: &str = "ARIADNE_COVERAGE_URL";
pub const ENV_CATALOG_URL: &str = "ARIADNE_CATALOG_URL";
pub const ENV_CATALOG_INSTITUTION: &str = "ARIADNE_CATALOG_INSTITUTION";
pub const ENV_CATALOG_API_KEY: &str = "ARIADNE_CATALOG_API_KEY";
pub const ENV_UPSTREAM_TIMEOUT_SECS: &str = "ARIADNE_UPSTREAM_TIMEOUT_SECS";

/// Logging verbosity accepted by `--log-level`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warn,
    Error,
    Disabled,
}

impl LogLevel {
    /// Option strings in order of increasing severity
    pub const VALID_OPTIONS: [&'static str; 5] = ["debug", "info", "warn", "error", "disabled"];

    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
            LogLevel::Disabled => "disabled",
        }
    }

    /// Directive understood by `tracing_subscriber::EnvFilter`
    pub fn filter_directive(&self) -> &'static str {
        match self {
            LogLevel::Disabled => "off",
            other => other.as_str(),
        }
    }
}

impl FromStr for LogLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            "disabled" => Ok(LogLevel::Disabled),
            _ => Err(Error::Config(format!(
                "\"{}\" is not a valid logging level. Valid options: {}",
                s,
                LogLevel::VALID_OPTIONS.join(", ")
            ))),
        }
    }
}

/// Settings that may appear in the TOML config file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    pub port: Option<u16>,
    pub log_level: Option<String>,
    pub coverage_url: Option<String>,
    pub catalog_url: Option<String>,
    pub catalog_institution: Option<String>,
    pub catalog_api_key: Option<String>,
    pub upstream_timeout_secs: Option<u64>,
}

/// Values given on the command line (tier 1)
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub config_file: Option<PathBuf>,
    pub port: Option<u16>,
    pub log_level: Option<String>,
    pub coverage_url: Option<String>,
    pub catalog_url: Option<String>,
    pub catalog_institution: Option<String>,
    pub catalog_api_key: Option<String>,
    pub upstream_timeout_secs: Option<u64>,
}

/// Fully resolved resolver configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverConfig {
    pub port: u16,
    pub log_level: LogLevel,
    /// Base URL of the coverage (knowledge-base) service
    pub coverage_url: String,
    /// Base URL of the catalog (discovery index) search API
    pub catalog_url: String,
    /// Institution code sent as `inst` and `vid` on catalog searches
    pub catalog_institution: String,
    pub catalog_api_key: Option<String>,
    /// Bound applied to every individual upstream call
    pub upstream_timeout: Duration,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            log_level: LogLevel::default(),
            coverage_url: DEFAULT_COVERAGE_URL.to_string(),
            catalog_url: DEFAULT_CATALOG_URL.to_string(),
            catalog_institution: DEFAULT_CATALOG_INSTITUTION.to_string(),
            catalog_api_key: None,
            upstream_timeout: Duration::from_secs(DEFAULT_UPSTREAM_TIMEOUT_SECS),
        }
    }
}

impl ResolverConfig {
    /// Resolve configuration from command-line overrides, the process
    /// environment, and the TOML config file.
    pub fn resolve(overrides: &ConfigOverrides) -> Result<Self> {
        let toml_config = load_toml_config(overrides.config_file.as_deref())?;
        Self::from_sources(overrides, &toml_config, |name| std::env::var(name).ok())
    }

    /// Resolve from explicit sources; `env` looks up an environment variable.
    pub fn from_sources<F>(overrides: &ConfigOverrides, toml_config: &TomlConfig, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let port = match overrides.port {
            Some(port) => port,
            None => match env(ENV_PORT) {
                Some(raw) => raw
                    .trim()
                    .parse()
                    .map_err(|_| Error::Config(format!("{ENV_PORT} is not a valid port: {raw}")))?,
                None => toml_config.port.unwrap_or(defaults.port),
            },
        };

        let log_level = pick(&overrides.log_level, &env, ENV_LOG_LEVEL, &toml_config.log_level)
            .map(|raw| raw.parse::<LogLevel>())
            .transpose()?
            .unwrap_or(defaults.log_level);

        let upstream_timeout_secs = match overrides.upstream_timeout_secs {
            Some(secs) => secs,
            None => match env(ENV_UPSTREAM_TIMEOUT_SECS) {
                Some(raw) => raw.trim().parse().map_err(|_| {
                    Error::Config(format!("{ENV_UPSTREAM_TIMEOUT_SECS} is not a number: {raw}"))
                })?,
                None => toml_config
                    .upstream_timeout_secs
                    .unwrap_or(DEFAULT_UPSTREAM_TIMEOUT_SECS),
            },
        };

        let config = Self {
            port,
            log_level,
            coverage_url: pick(&overrides.coverage_url, &env, ENV_COVERAGE_URL, &toml_config.coverage_url)
                .unwrap_or(defaults.coverage_url),
            catalog_url: pick(&overrides.catalog_url, &env, ENV_CATALOG_URL, &toml_config.catalog_url)
                .unwrap_or(defaults.catalog_url),
            catalog_institution: pick(
                &overrides.catalog_institution,
                &env,
                ENV_CATALOG_INSTITUTION,
                &toml_config.catalog_institution,
            )
            .unwrap_or(defaults.catalog_institution),
            catalog_api_key: pick(
                &overrides.catalog_api_key,
                &env,
                ENV_CATALOG_API_KEY,
                &toml_config.catalog_api_key,
            )
            .filter(|key| !key.trim().is_empty()),
            upstream_timeout: Duration::from_secs(upstream_timeout_secs),
        };

        config.validate()?;
        Ok(config)
    }

    /// Check URLs parse and the timeout is usable
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [("coverage_url", &self.coverage_url), ("catalog_url", &self.catalog_url)] {
            let parsed = url::Url::parse(value)
                .map_err(|e| Error::Config(format!("{name} is not a valid URL ({value}): {e}")))?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(Error::Config(format!("{name} must be an http(s) URL: {value}")));
            }
        }

        if self.upstream_timeout.is_zero() {
            return Err(Error::Config("upstream_timeout_secs must be greater than 0".to_string()));
        }

        if self.catalog_institution.trim().is_empty() {
            return Err(Error::Config("catalog_institution must not be empty".to_string()));
        }

        Ok(())
    }
}

fn pick<F>(cli: &Option<String>, env: &F, env_name: &str, toml_value: &Option<String>) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    cli.clone()
        .or_else(|| env(env_name))
        .or_else(|| toml_value.clone())
}

/// Load the TOML config file.
///
/// An explicitly given path must exist and parse. Otherwise the platform
/// locations are tried; a missing file yields defaults and a malformed one
/// is logged and ignored.
pub fn load_toml_config(explicit: Option<&Path>) -> Result<TomlConfig> {
    if let Some(path) = explicit {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Could not read config file {}: {}", path.display(), e)))?;
        return toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Could not parse config file {}: {}", path.display(), e)));
    }

    let Some(path) = default_config_file() else {
        return Ok(TomlConfig::default());
    };

    match std::fs::read_to_string(&path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(config) => Ok(config),
            Err(e) => {
                warn!("Ignoring malformed config file {}: {}", path.display(), e);
                Ok(TomlConfig::default())
            }
        },
        Err(e) => {
            warn!("Ignoring unreadable config file {}: {}", path.display(), e);
            Ok(TomlConfig::default())
        }
    }
}

/// First existing platform config file: `~/.config/ariadne/config.toml`,
/// then `/etc/ariadne/config.toml`
fn default_config_file() -> Option<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("ariadne").join("config.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    let system_config = PathBuf::from("/etc/ariadne/config.toml");
    system_config.exists().then_some(system_config)
}
