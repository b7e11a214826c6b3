use std::{path::PathBuf, sync::Arc};

use axum::{extract::FromRef, routing::get, Router};
use fork_choice_tree::PruneWindow;
use monitor::{Eth2Config, Monitor};
use std_ext::ArcExt as _;
use tower_http::services::ServeDir;

use crate::endpoints::{fork_choice, fork_choice_dot, heads, participation, spec};

#[derive(Clone)]
pub struct NormalState {
    pub monitor: Arc<Monitor>,
    pub eth2_config: Arc<Eth2Config>,
    pub prune_window: PruneWindow,
    pub output_dir: Arc<PathBuf>,
}

impl FromRef<NormalState> for Arc<Monitor> {
    fn from_ref(state: &NormalState) -> Self {
        state.monitor.clone_arc()
    }
}

impl FromRef<NormalState> for Arc<Eth2Config> {
    fn from_ref(state: &NormalState) -> Self {
        state.eth2_config.clone_arc()
    }
}

impl FromRef<NormalState> for PruneWindow {
    fn from_ref(state: &NormalState) -> Self {
        state.prune_window
    }
}

/// Dashboard endpoints, with everything else served from `output_dir`.
pub fn normal_routes(state: NormalState) -> Router {
    let static_files = ServeDir::new(state.output_dir.as_path());

    Router::new()
        .route("/spec", get(spec))
        .route("/heads", get(heads))
        .route("/fork-choice", get(fork_choice))
        .route("/fork-choice-dot", get(fork_choice_dot))
        .route("/participation", get(participation))
        .fallback_service(static_files)
        .with_state(state)
}
