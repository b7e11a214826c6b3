use anyhow::Result;
use beacon_api::{BeaconApi, Flavor, HeadRef, NodeApi, Registration};
use parking_lot::Mutex;
use serde::Serialize;

/// A registered beacon node and the state observed by the last poll.
pub struct Node {
    id: String,
    version: String,
    flavor: Flavor,
    api: BeaconApi,
    node_api: Box<dyn NodeApi>,
    status: Mutex<NodeStatus>,
}

#[derive(Clone, Default)]
struct NodeStatus {
    head: Option<HeadRef>,
    healthy: bool,
    syncing: bool,
}

/// A node as reported by the `/heads` endpoint.
///
/// `slot` and `root` are empty until the first head is fetched.
#[derive(Clone, PartialEq, Eq, Debug, Serialize)]
pub struct NodeHead {
    pub id: String,
    pub version: String,
    pub slot: String,
    pub root: String,
    pub healthy: bool,
    pub syncing: bool,
}

impl Node {
    #[must_use]
    pub fn new(api: BeaconApi, registration: Registration) -> Self {
        let Registration {
            id,
            version,
            flavor,
            node_api,
            syncing,
        } = registration;

        Self {
            id,
            version,
            flavor,
            api,
            node_api,
            status: Mutex::new(NodeStatus {
                head: None,
                healthy: true,
                syncing,
            }),
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    #[must_use]
    pub const fn flavor(&self) -> Flavor {
        self.flavor
    }

    #[must_use]
    pub const fn api(&self) -> &BeaconApi {
        &self.api
    }

    #[must_use]
    pub fn is_healthy(&self) -> bool {
        self.status.lock().healthy
    }

    #[must_use]
    pub fn head(&self) -> Option<HeadRef> {
        self.status.lock().head.clone()
    }

    #[must_use]
    pub fn node_head(&self) -> NodeHead {
        let NodeStatus {
            head,
            healthy,
            syncing,
        } = self.status.lock().clone();

        let HeadRef { slot, root } = head.unwrap_or_default();

        NodeHead {
            id: self.id.clone(),
            version: self.version.clone(),
            slot,
            root,
            healthy,
            syncing,
        }
    }

    /// Fetches the head and records whether the node answered.
    ///
    /// Returns the new head if it differs from the previous one.
    /// The sync status of standard nodes is refreshed whenever the head changes.
    pub async fn poll_head(&self) -> Result<Option<HeadRef>> {
        let previous = self.head();

        let head = match self.node_api.fetch_head(&self.api, previous.as_ref()).await {
            Ok(head) => head,
            Err(error) => {
                self.status.lock().healthy = false;
                return Err(error);
            }
        };

        let syncing = match (&head, self.flavor) {
            (Some(_), Flavor::Standard) => match self.api.fetch_sync_status().await {
                Ok(syncing) => syncing,
                Err(error) => {
                    features::log!(
                        DebugHeadPolling,
                        "keeping previous sync status of node {}: {error}",
                        self.id,
                    );

                    None
                }
            },
            _ => None,
        };

        let mut status = self.status.lock();

        status.healthy = true;

        if let Some(syncing) = syncing {
            status.syncing = syncing;
        }

        if let Some(head) = &head {
            status.head = Some(head.clone());
        }

        Ok(head)
    }
}
