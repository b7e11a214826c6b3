use core::{future::IntoFuture as _, net::SocketAddr};
use std::{path::PathBuf, sync::Arc};

use anyhow::{Error as AnyhowError, Result};
use fork_choice_tree::PruneWindow;
use futures::future::TryFutureExt as _;
use logging::info_with_nodes;
use monitor::{Eth2Config, Monitor};
use tracing::instrument;

use crate::{
    error::Error,
    http_api_config::HttpApiConfig,
    routing::{self, NormalState},
};

pub struct HttpApi {
    pub monitor: Arc<Monitor>,
    pub eth2_config: Arc<Eth2Config>,
    pub output_dir: PathBuf,
    pub http_api_config: HttpApiConfig,
}

impl HttpApi {
    #[instrument(parent = None, skip(self), fields(address = %self.http_api_config.address))]
    pub async fn run(self) -> Result<()> {
        let Self {
            monitor,
            eth2_config,
            output_dir,
            http_api_config,
        } = self;

        let listener = http_api_config.listener().await?;

        let HttpApiConfig {
            address,
            allow_origin,
            timeout,
        } = http_api_config;

        let state = NormalState {
            prune_window: PruneWindow::new(monitor.config().clock),
            monitor,
            eth2_config,
            output_dir: Arc::new(output_dir),
        };

        let router = routing::normal_routes(state);
        let router =
            http_api_utils::extend_router_with_middleware::<Error>(router, timeout, allow_origin);

        let service = router.into_make_service_with_connect_info::<SocketAddr>();

        info_with_nodes!("HTTP server listening on {address}");

        axum::serve(listener, service)
            .into_future()
            .map_err(AnyhowError::new)
            .await
    }
}
