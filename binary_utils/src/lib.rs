use std::io::{self, IsTerminal as _};

use anyhow::{anyhow, Result};
use tracing_subscriber::{filter::LevelFilter, EnvFilter};

const LOG_ENVIRONMENT_VARIABLE: &str = "FORK_MONITOR_LOG";

/// Installs the global logger.
///
/// Workspace crates and `module_path` log at `INFO` and everything else is off.
/// Directives in `FORK_MONITOR_LOG` are applied on top of that.
/// Records emitted through `log` are forwarded to the same subscriber.
pub fn initialize_logger(module_path: &str) -> Result<()> {
    tracing_subscriber::fmt()
        .compact()
        .with_target(true)
        .with_ansi(io::stdout().is_terminal())
        .with_env_filter(env_filter(module_path)?)
        .try_init()
        .map_err(|error| anyhow!(error))
}

fn env_filter(module_path: &str) -> Result<EnvFilter> {
    let mut filter = EnvFilter::default()
        .add_directive(LevelFilter::OFF.into())
        .add_directive("beacon_api=info".parse()?)
        .add_directive("clock=info".parse()?)
        .add_directive("features=info".parse()?)
        .add_directive("fork_choice_tree=info".parse()?)
        .add_directive("http_api=info".parse()?)
        .add_directive("http_api_utils=info".parse()?)
        .add_directive("monitor=info".parse()?)
        .add_directive(format!("{module_path}=info").parse()?);

    if let Ok(env_filter) = EnvFilter::try_from_env(LOG_ENVIRONMENT_VARIABLE) {
        for directive in env_filter.to_string().split(',') {
            filter = filter.add_directive(directive.parse()?);
        }
    }

    Ok(filter)
}
