use core::future::Future;
use std::{process::ExitCode, sync::Arc};

use anyhow::{Error as AnyhowError, Result};
use clap::{Error as ClapError, Parser as _};
use features::Feature;
use futures::{future::FutureExt as _, select};
use http_api::HttpApi;
use log::{error, info};
use monitor::Monitor;
use reqwest::ClientBuilder;
use std_ext::ArcExt as _;
use tokio::{runtime::Builder, task::JoinError};

use crate::{fork_monitor_args::ForkMonitorArgs, fork_monitor_config::ForkMonitorConfig};

mod fork_monitor_args;
mod fork_monitor_config;

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

fn main() -> ExitCode {
    if let Err(error) = try_main() {
        error.downcast_ref().map(ClapError::exit);
        error!("{error:?}");
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn try_main() -> Result<()> {
    binary_utils::initialize_logger(module_path!())?;

    let config = ForkMonitorArgs::try_parse()?
        .try_into_config()
        .map_err(ForkMonitorArgs::clap_error)?;

    info!("starting fork monitor");
    config.report();

    config.features.iter().copied().for_each(Feature::enable);

    block_on(run(config))
}

async fn run(config: ForkMonitorConfig) -> Result<()> {
    let ForkMonitorConfig {
        eth2_config,
        monitor_config,
        output_dir,
        request_timeout,
        http_api_config,
        ..
    } = config;

    // A single client is shared by every node so that connections are pooled.
    let client = ClientBuilder::new()
        .timeout(request_timeout)
        .user_agent(USER_AGENT)
        .build()?;

    let monitor = Arc::new(Monitor::new(monitor_config, client).await);

    let http_api = HttpApi {
        monitor: monitor.clone_arc(),
        eth2_config: Arc::new(eth2_config),
        output_dir,
        http_api_config,
    };

    let run_monitor = tokio::spawn(async move { monitor.run().await });
    let run_http_api = tokio::spawn(http_api.run());

    // Neither task stops on its own unless it fails.
    select! {
        result = run_monitor.fuse() => flatten(result),
        result = run_http_api.fuse() => flatten(result),
    }
}

fn flatten(result: Result<Result<()>, JoinError>) -> Result<()> {
    match result {
        Ok(result) => result,
        Err(error) => match error.try_into_panic() {
            Ok(payload) => Err(panics::payload_into_error(payload)),
            Err(error) => Err(AnyhowError::new(error)),
        },
    }
}

fn block_on(future: impl Future<Output = Result<()>>) -> Result<()> {
    // This is roughly what `#[tokio::main]` expands to.
    Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(future)
}
