use core::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Result;
use arc_swap::ArcSwap;
use beacon_api::{register, BeaconApi, FinalityCheckpoints, ParticipationPair};
use fork_choice_tree::{compact_single_children, proto_array, roll_proto_array};
use futures::future::join_all;
use itertools::Itertools as _;
use logging::{info_with_nodes, warn_with_nodes, NODE_LOG_METRICS};
use reqwest::Client;
use tokio::time::MissedTickBehavior;

use crate::{
    config::MonitorConfig,
    node::{Node, NodeHead},
    snapshot::ForkChoiceSnapshot,
};

// Only Lighthouse serves `/lighthouse/proto_array`.
const FORK_CHOICE_PROVIDER_VERSION: &str = "Lighthouse";

pub struct Monitor {
    config: MonitorConfig,
    nodes: Vec<Node>,
    provider: Option<usize>,
    snapshot: ArcSwap<ForkChoiceSnapshot>,
    // Set when the provider's head has changed since the last successful rebuild.
    rebuild_pending: AtomicBool,
}

impl Monitor {
    /// Registers every endpoint in `config` concurrently.
    ///
    /// Endpoints that fail to register are logged and left out.
    /// The first Lighthouse node becomes the fork choice provider.
    pub async fn new(config: MonitorConfig, client: Client) -> Self {
        let registrations = join_all(config.endpoints.iter().map(|endpoint| {
            let api = BeaconApi::new(client.clone(), endpoint.clone());

            async move {
                let result = register(&api).await;
                (api, result)
            }
        }))
        .await;

        let nodes = registrations
            .into_iter()
            .filter_map(|(api, result)| match result {
                Ok(registration) => {
                    info_with_nodes!(
                        "registered {} node {} ({}) at {}",
                        registration.flavor,
                        registration.id,
                        registration.version,
                        api.endpoint(),
                    );

                    Some(Node::new(api, registration))
                }
                Err(error) => {
                    warn_with_nodes!("failed to register node at {}: {error:?}", api.endpoint());
                    None
                }
            })
            .collect_vec();

        NODE_LOG_METRICS.set_node_count(nodes.len());
        NODE_LOG_METRICS.set_healthy_node_count(nodes.len());

        let provider = nodes
            .iter()
            .position(|node| node.version().contains(FORK_CHOICE_PROVIDER_VERSION));

        match provider {
            Some(index) => info_with_nodes!(
                "using node {} as fork choice provider",
                nodes[index].id(),
            ),
            None => warn_with_nodes!(
                "no Lighthouse node registered; fork choice endpoints will serve an empty tree",
            ),
        }

        Self {
            config,
            nodes,
            provider,
            snapshot: ArcSwap::default(),
            rebuild_pending: AtomicBool::new(false),
        }
    }

    #[must_use]
    pub const fn config(&self) -> &MonitorConfig {
        &self.config
    }

    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    #[must_use]
    pub fn provider(&self) -> Option<&Node> {
        self.provider.map(|index| &self.nodes[index])
    }

    /// The most recently published snapshot.
    ///
    /// Readers keep the returned `Arc` alive for as long as they need it.
    /// Rebuilds never wait for them.
    #[must_use]
    pub fn snapshot(&self) -> Arc<ForkChoiceSnapshot> {
        self.snapshot.load_full()
    }

    #[must_use]
    pub fn heads(&self) -> Vec<NodeHead> {
        self.nodes.iter().map(Node::node_head).collect()
    }

    pub fn publish_snapshot(&self, snapshot: ForkChoiceSnapshot) {
        self.snapshot.store(Arc::new(snapshot));
    }

    /// Waits for the next slot boundary, builds the first snapshot and then polls heads forever.
    pub async fn run(&self) -> Result<()> {
        info_with_nodes!("synchronizing to next slot");

        self.config.clock.wait_until_next_slot().await?;

        info_with_nodes!("aligned to slot, continuing");

        self.try_rebuild_fork_choice().await;

        let mut interval = tokio::time::interval(self.config.polling_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            interval.tick().await;
            self.poll_heads().await;
        }
    }

    /// Fetches the head of every node concurrently.
    ///
    /// A node that fails to respond is marked unhealthy without affecting the others.
    /// The fork choice tree is rebuilt if the provider's head changed.
    /// A failed rebuild is retried on every poll until it succeeds.
    pub async fn poll_heads(&self) {
        let were_healthy = self.nodes.iter().map(Node::is_healthy).collect_vec();
        let results = join_all(self.nodes.iter().map(Node::poll_head)).await;

        let mut provider_head_changed = false;

        for (index, ((node, was_healthy), result)) in
            self.nodes.iter().zip(were_healthy).zip(results).enumerate()
        {
            match result {
                Ok(Some(head)) => {
                    features::log!(DebugHeadPolling, "node {} has new head {head}", node.id());

                    if self.provider == Some(index) {
                        provider_head_changed = true;
                    }
                }
                Ok(None) => {}
                Err(error) => {
                    if was_healthy {
                        warn_with_nodes!("node {} became unhealthy: {error:?}", node.id());
                    } else {
                        features::log!(
                            DebugHeadPolling,
                            "node {} is still unhealthy: {error}",
                            node.id(),
                        );
                    }
                }
            }
        }

        let healthy_node_count = self.nodes.iter().filter(|node| node.is_healthy()).count();
        NODE_LOG_METRICS.set_healthy_node_count(healthy_node_count);

        if provider_head_changed {
            self.rebuild_pending.store(true, Ordering::Relaxed);
        }

        if self.rebuild_pending.load(Ordering::Relaxed) {
            self.try_rebuild_fork_choice().await;
        }
    }

    async fn try_rebuild_fork_choice(&self) {
        match self.rebuild_fork_choice().await {
            Ok(()) => self.rebuild_pending.store(false, Ordering::Relaxed),
            Err(error) => {
                self.rebuild_pending.store(true, Ordering::Relaxed);
                warn_with_nodes!("failed to rebuild fork choice tree: {error:?}");
            }
        }
    }

    /// Fetches the provider's proto array and publishes a new snapshot built from it.
    ///
    /// If the proto array cannot be fetched or turned into a tree, the previous snapshot stays
    /// published and the error is returned. Checkpoints and participation are optional.
    /// Failing to fetch them keeps their previous values.
    pub async fn rebuild_fork_choice(&self) -> Result<()> {
        let Some(provider) = self.provider() else {
            return Ok(());
        };

        let nodes = provider.api().fetch_proto_array().await?;
        let head_index = proto_array::head_index(&nodes)?;
        let total_weight = proto_array::total_weight(&nodes)?;
        let mut block_tree = roll_proto_array(&nodes, head_index)?;

        if self.config.compact_fork_choice {
            block_tree = compact_single_children(&block_tree);
        }

        let previous = self.snapshot();

        let (justified_checkpoint, finalized_checkpoint) =
            match provider.api().fetch_finality_checkpoints().await {
                Ok(FinalityCheckpoints {
                    current_justified,
                    finalized,
                }) => (Some(current_justified), Some(finalized)),
                Err(error) => {
                    warn_with_nodes!("failed to fetch finality checkpoints: {error:?}");

                    (
                        previous.justified_checkpoint.clone(),
                        previous.finalized_checkpoint.clone(),
                    )
                }
            };

        let participation = self.refresh_participation(provider, previous.participation).await;

        features::log!(
            DebugForkChoice,
            "rebuilt fork choice tree from {} proto array nodes \
             ({} blocks, {} collapsed, total weight {total_weight})",
            nodes.len(),
            block_tree.node_count(),
            block_tree.collapsed_block_count(),
        );

        self.publish_snapshot(ForkChoiceSnapshot {
            block_tree,
            total_weight,
            justified_checkpoint,
            finalized_checkpoint,
            participation,
        });

        Ok(())
    }

    // Participation is requested for the last complete epoch, at most once per epoch.
    async fn refresh_participation(
        &self,
        provider: &Node,
        previous: Option<ParticipationPair>,
    ) -> Option<ParticipationPair> {
        let epoch = match self.config.clock.current_epoch() {
            Ok(epoch) => epoch.saturating_sub(1),
            Err(error) => {
                warn_with_nodes!("failed to read the current epoch: {error:?}");
                return previous;
            }
        };

        if previous.is_some_and(|pair| pair.current.epoch == epoch) {
            return previous;
        }

        match provider.api().fetch_participation(epoch).await {
            Ok(pair) => Some(pair),
            Err(error) => {
                warn_with_nodes!("failed to fetch participation for epoch {epoch}: {error:?}");
                previous
            }
        }
    }
}
