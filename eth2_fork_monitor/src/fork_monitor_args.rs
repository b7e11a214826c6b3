use core::{fmt::Display, net::IpAddr, time::Duration};
use std::path::PathBuf;

use anyhow::Result;
use clap::{error::ErrorKind, Args, CommandFactory as _, Error as ClapError, Parser};
use features::Feature;
use http_api::HttpApiConfig;
use log::warn;
use monitor::MonitorConfig;
use reqwest::header::HeaderValue;
use tower_http::cors::AllowOrigin;

use crate::fork_monitor_config::{ConfigFile, ForkMonitorConfig, DEFAULT_CONFIG_FILE};

/// Dashboard for watching forks in the beacon chain as seen by a set of beacon nodes
#[derive(Parser)]
#[clap(version, verbatim_doc_comment)]
pub struct ForkMonitorArgs {
    /// Path to the YAML configuration file
    #[clap(long, value_name = "YAML_FILE", default_value = DEFAULT_CONFIG_FILE)]
    config_file: PathBuf,

    #[clap(flatten)]
    http_api_options: HttpApiOptions,

    /// Collapse chains of single-child blocks in the served fork choice tree
    #[clap(long)]
    compact_fork_choice: bool,

    /// List of optional runtime features to enable
    #[clap(long, value_delimiter = ',')]
    features: Vec<Feature>,
}

#[derive(Args)]
struct HttpApiOptions {
    /// HTTP API address
    #[clap(long, default_value_t = HttpApiConfig::default().address.ip())]
    http_address: IpAddr,

    /// HTTP API port
    #[clap(long, default_value_t = HttpApiConfig::default().address.port())]
    http_port: u16,

    /// List of Access-Control-Allow-Origin header values for the HTTP API server.
    /// Defaults to any origin.
    #[clap(long, value_delimiter = ',')]
    http_allowed_origins: Vec<HeaderValue>,

    /// HTTP API timeout in milliseconds
    #[clap(long)]
    timeout: Option<u64>,
}

impl From<HttpApiOptions> for HttpApiConfig {
    fn from(http_api_options: HttpApiOptions) -> Self {
        let HttpApiOptions {
            http_address,
            http_port,
            http_allowed_origins,
            timeout,
        } = http_api_options;

        let Self {
            address,
            allow_origin,
            ..
        } = Self::with_address(http_address, http_port);

        Self {
            address,
            allow_origin: headers_to_allow_origin(http_allowed_origins).unwrap_or(allow_origin),
            timeout: timeout.map(Duration::from_millis),
        }
    }
}

impl ForkMonitorArgs {
    pub fn try_into_config(self) -> Result<ForkMonitorConfig> {
        let Self {
            config_file,
            http_api_options,
            compact_fork_choice,
            features,
        } = self;

        let ConfigFile {
            endpoints,
            eth2,
            output_dir,
            http_timeout_milliseconds,
            ..
        } = ConfigFile::load(&config_file)?;

        let monitor_config = MonitorConfig {
            compact_fork_choice,
            ..MonitorConfig::new(endpoints, eth2.slot_clock()?)
        };

        Ok(ForkMonitorConfig {
            eth2_config: eth2,
            monitor_config,
            output_dir,
            request_timeout: Duration::from_millis(http_timeout_milliseconds),
            http_api_config: http_api_options.into(),
            features,
        })
    }

    pub fn clap_error(message: impl Display) -> ClapError {
        Self::command().error(ErrorKind::ValueValidation, message)
    }
}

fn headers_to_allow_origin(allowed_origins: Vec<HeaderValue>) -> Option<AllowOrigin> {
    if !allowed_origins.is_empty() {
        // `tower_http::cors::AllowOrigin::list` panics if a wildcard is passed to it.
        if allowed_origins.contains(&HeaderValue::from_static("*")) {
            if allowed_origins.len() > 1 {
                warn!(
                    "extra values of Access-Control-Allow-Origin specified along with a wildcard; \
                    only the wildcard will be used",
                );
            }

            return Some(AllowOrigin::any());
        }

        return Some(AllowOrigin::list(allowed_origins));
    }

    None
}

#[cfg(test)]
mod tests {
    use core::net::{Ipv4Addr, SocketAddr};
    use std::io::Write as _;

    use tempfile::NamedTempFile;
    use test_case::test_case;

    use super::*;

    const CONFIG_FILE: &str = "
endpoints:
  - http://localhost:5052
eth2:
  seconds_per_slot: 12
  genesis_time: 1606824023
  slots_per_epoch: 32
  network: mainnet
outputdir: /public
";

    fn config_file() -> Result<NamedTempFile> {
        let mut file = NamedTempFile::new()?;
        file.write_all(CONFIG_FILE.as_bytes())?;
        Ok(file)
    }

    fn try_config_from_args<'a>(
        config_file: &NamedTempFile,
        arguments: impl IntoIterator<Item = &'a str>,
    ) -> Result<ForkMonitorConfig> {
        let path = config_file.path().to_string_lossy().into_owned();
        let program = ["eth2_fork_monitor".to_owned(), "--config-file".to_owned(), path];
        let arguments = arguments.into_iter().map(str::to_owned);

        ForkMonitorArgs::try_parse_from(program.into_iter().chain(arguments))?.try_into_config()
    }

    #[test]
    fn defaults() -> Result<()> {
        let config = try_config_from_args(&config_file()?, [])?;

        assert_eq!(
            config.http_api_config.address,
            SocketAddr::from((Ipv4Addr::UNSPECIFIED, 8080)),
        );
        assert_eq!(config.http_api_config.timeout, None);
        assert_eq!(config.request_timeout, Duration::from_millis(500));
        assert_eq!(config.monitor_config.endpoints.len(), 1);
        assert_eq!(config.monitor_config.clock.genesis_time(), 1_606_824_023);
        assert!(!config.monitor_config.compact_fork_choice);
        assert_eq!(config.output_dir, PathBuf::from("/public"));
        assert_eq!(config.features, []);

        Ok(())
    }

    #[test]
    fn http_api_and_monitor_options() -> Result<()> {
        let config = try_config_from_args(
            &config_file()?,
            [
                "--http-address",
                "127.0.0.1",
                "--http-port",
                "9000",
                "--timeout",
                "1000",
                "--compact-fork-choice",
                "--features",
                "DebugForkChoice,LogHttpRequests",
            ],
        )?;

        assert_eq!(
            config.http_api_config.address,
            SocketAddr::from((Ipv4Addr::LOCALHOST, 9000)),
        );
        assert_eq!(config.http_api_config.timeout, Some(Duration::from_secs(1)));
        assert!(config.monitor_config.compact_fork_choice);
        assert_eq!(
            config.features,
            [Feature::DebugForkChoice, Feature::LogHttpRequests],
        );

        Ok(())
    }

    #[test]
    fn unknown_feature_is_rejected() -> Result<()> {
        let result = try_config_from_args(&config_file()?, ["--features", "Nonexistent"]);

        assert!(result.is_err());

        Ok(())
    }

    #[test]
    fn missing_config_file_is_an_error() {
        let result = ForkMonitorArgs::try_parse_from([
            "eth2_fork_monitor",
            "--config-file",
            "/nonexistent/config.yaml",
        ])
        .map_err(Into::into)
        .and_then(ForkMonitorArgs::try_into_config);

        assert!(result.is_err());
    }

    #[test_case(&[] => None; "no origins")]
    #[test_case(&["*"] => Some(true); "wildcard")]
    #[test_case(&["http://a.example", "*"] => Some(true); "wildcard wins")]
    #[test_case(&["http://a.example"] => Some(false); "single origin")]
    fn allows_any_origin(origins: &[&'static str]) -> Option<bool> {
        let origins = origins.iter().copied().map(HeaderValue::from_static).collect();

        // `AllowOrigin` has no accessors. Its `Debug` output shows which origins it allows.
        headers_to_allow_origin(origins)
            .map(|allow_origin| format!("{allow_origin:?}").contains("\"*\""))
    }
}
