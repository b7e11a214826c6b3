use core::time::Duration;
use std::path::{Path, PathBuf};

use anyhow::{ensure, Result};
use features::Feature;
use http_api::HttpApiConfig;
use log::info;
use monitor::{Eth2Config, MonitorConfig};
use serde::Deserialize;
use thiserror::Error;
use url::Url;

pub const DEFAULT_CONFIG_FILE: &str = "/config.yaml";

const DEFAULT_HTTP_TIMEOUT_MILLISECONDS: u64 = 500;

/// Contents of the YAML file passed with `--config-file`.
#[derive(Debug, Deserialize)]
pub struct ConfigFile {
    pub endpoints: Vec<Url>,
    pub eth2: Eth2Config,
    // Older configuration files spell it without the underscore.
    #[serde(alias = "outputdir")]
    pub output_dir: PathBuf,
    /// Timeout for requests to beacon nodes.
    #[serde(default = "default_http_timeout_milliseconds")]
    pub http_timeout_milliseconds: u64,
    // Accepted so that existing configuration files keep working. Neither is used.
    #[serde(default)]
    pub etherscan_api_key: Option<String>,
    #[serde(default)]
    pub weak_subjectivity_provider_endpoint: Option<String>,
}

const fn default_http_timeout_milliseconds() -> u64 {
    DEFAULT_HTTP_TIMEOUT_MILLISECONDS
}

impl ConfigFile {
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = fs_err::read(path)?;
        let config_file = serde_yaml::from_slice::<Self>(bytes.as_slice())?;

        ensure!(!config_file.endpoints.is_empty(), Error::NoEndpoints);

        Ok(config_file)
    }
}

#[derive(Debug, Error)]
enum Error {
    #[error("configuration file lists no beacon node endpoints")]
    NoEndpoints,
}

#[cfg_attr(test, derive(Debug))]
pub struct ForkMonitorConfig {
    pub eth2_config: Eth2Config,
    pub monitor_config: MonitorConfig,
    pub output_dir: PathBuf,
    pub request_timeout: Duration,
    pub http_api_config: HttpApiConfig,
    pub features: Vec<Feature>,
}

impl ForkMonitorConfig {
    pub fn report(&self) {
        let Self {
            eth2_config,
            monitor_config,
            output_dir,
            request_timeout,
            http_api_config,
            features,
        } = self;

        info!("network: {}", eth2_config.network);
        info!("genesis time: {}", eth2_config.genesis_time);

        for endpoint in &monitor_config.endpoints {
            info!("beacon node endpoint: {endpoint}");
        }

        info!("beacon node request timeout: {request_timeout:?}");
        info!("HTTP server address: {}", http_api_config.address);
        info!("serving static files from {}", output_dir.display());

        if monitor_config.compact_fork_choice {
            info!("serving compacted fork choice tree");
        }

        if !features.is_empty() {
            info!("enabled features: {features:?}");
        }
    }
}
