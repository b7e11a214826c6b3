use std::{io::Error as IoError, sync::Arc};

use anyhow::Error as AnyhowError;
use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use beacon_api::{Checkpoint, ParticipationPair};
use fork_choice_tree::{
    compact_single_children, prune_for_browser, to_dot, write_json, ForkChoiceNode, PruneWindow,
};
use monitor::{Eth2Config, Monitor, NodeHead};
use serde::{Deserialize, Serialize};

use crate::{error::Error, extractors::EthQuery};

const GRAPHVIZ_CONTENT_TYPE: &str = "text/vnd.graphviz";
const JSON_CONTENT_TYPE: &str = "application/json";

// Everything in the `/fork-choice` response except `block_tree`, which is written separately.
#[derive(Serialize)]
struct ForkChoiceSummary<'snapshot> {
    total_weight: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    justified_checkpoint: Option<&'snapshot Checkpoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    finalized_checkpoint: Option<&'snapshot Checkpoint>,
}

impl ForkChoiceSummary<'_> {
    fn write_json_with_tree(&self, block_tree: &ForkChoiceNode) -> Result<Vec<u8>, IoError> {
        let mut bytes = br#"{"block_tree":"#.to_vec();

        write_json(block_tree, &mut bytes)?;

        // The summary always has `total_weight`, so its object is never empty.
        let summary = serde_json::to_vec(self)?;

        bytes.push(b',');
        bytes.extend_from_slice(summary.get(1..).unwrap_or_default());

        Ok(bytes)
    }
}

#[derive(Deserialize)]
pub struct DotQuery {
    #[serde(default = "compact_by_default")]
    compact: bool,
}

const fn compact_by_default() -> bool {
    true
}

/// `GET /spec`
pub async fn spec(State(eth2_config): State<Arc<Eth2Config>>) -> Json<Arc<Eth2Config>> {
    Json(eth2_config)
}

/// `GET /heads`
pub async fn heads(State(monitor): State<Arc<Monitor>>) -> Json<Vec<NodeHead>> {
    Json(monitor.heads())
}

/// `GET /participation`
pub async fn participation(State(monitor): State<Arc<Monitor>>) -> Json<Option<ParticipationPair>> {
    Json(monitor.snapshot().participation)
}

/// `GET /fork-choice`
///
/// Serves the part of the published tree that starts inside the pruning window.
pub async fn fork_choice(
    State(monitor): State<Arc<Monitor>>,
    State(prune_window): State<PruneWindow>,
) -> Result<Response, Error> {
    let snapshot = monitor.snapshot();
    let now = clock::unix_time_now()?;

    let block_tree = prune_for_browser(&snapshot.block_tree, prune_window, now);

    let summary = ForkChoiceSummary {
        total_weight: snapshot.total_weight,
        justified_checkpoint: snapshot.justified_checkpoint.as_ref(),
        finalized_checkpoint: snapshot.finalized_checkpoint.as_ref(),
    };

    // The pruned tree can still be an entire proto array, so it is not serialized recursively.
    let body = summary
        .write_json_with_tree(block_tree)
        .map_err(AnyhowError::new)?;

    Ok(([(header::CONTENT_TYPE, JSON_CONTENT_TYPE)], body).into_response())
}

/// `GET /fork-choice-dot`
pub async fn fork_choice_dot(
    State(monitor): State<Arc<Monitor>>,
    EthQuery(query): EthQuery<DotQuery>,
) -> impl IntoResponse {
    let snapshot = monitor.snapshot();

    let dot = if query.compact {
        to_dot(&compact_single_children(&snapshot.block_tree))
    } else {
        to_dot(&snapshot.block_tree)
    };

    ([(header::CONTENT_TYPE, GRAPHVIZ_CONTENT_TYPE)], dot)
}
