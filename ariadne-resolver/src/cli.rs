//! Command-line options shared by the server and the debug CLI

use std::path::PathBuf;

use ariadne_common::config::ConfigOverrides;
use clap::Args;

/// Configuration flags. Each one overrides its `ARIADNE_*` environment
/// variable and the TOML config file.
#[derive(Args, Debug, Clone, Default)]
pub struct ConfigArgs {
    /// TOML config file (default: ~/.config/ariadne/config.toml, then /etc/ariadne/config.toml)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Logging level: debug, info, warn, error, disabled
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Coverage service base URL
    #[arg(long, value_name = "URL")]
    pub coverage_url: Option<String>,

    /// Catalog service search URL
    #[arg(long, value_name = "URL")]
    pub catalog_url: Option<String>,

    /// Institution code for catalog searches
    #[arg(long, value_name = "CODE")]
    pub catalog_institution: Option<String>,

    /// Catalog service API key
    #[arg(long, value_name = "KEY")]
    pub catalog_api_key: Option<String>,

    /// Timeout for each upstream call, in seconds
    #[arg(long, value_name = "SECS")]
    pub upstream_timeout_secs: Option<u64>,
}

impl ConfigArgs {
    /// Overrides for config resolution, with an optional listen port
    pub fn overrides(&self, port: Option<u16>) -> ConfigOverrides {
        ConfigOverrides {
            config_file: self.config.clone(),
            port,
            log_level: self.log_level.clone(),
            coverage_url: self.coverage_url.clone(),
            catalog_url: self.catalog_url.clone(),
            catalog_institution: self.catalog_institution.clone(),
            catalog_api_key: self.catalog_api_key.clone(),
            upstream_timeout_secs: self.upstream_timeout_secs,
        }
    }
}
