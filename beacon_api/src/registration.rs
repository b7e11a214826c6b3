use anyhow::Result;
use log::debug;
use serde::Deserialize;
use sha2::{Digest as _, Sha256};

use crate::{
    beacon_api::{BeaconApi, Data},
    node_api::{Flavor, NodeApi, NODE_VERSION_PATH},
};

const NODE_IDENTITY_PATH: &str = "/eth/v1/node/identity";

pub struct Registration {
    pub id: String,
    pub version: String,
    pub flavor: Flavor,
    pub node_api: Box<dyn NodeApi>,
    pub syncing: bool,
}

/// Short identifier derived from a peer ID or endpoint.
///
/// Peer IDs are not exposed to dashboard users, so only a prefix of their hash is kept.
#[must_use]
pub fn id_hash_of(identifier: &str) -> String {
    let digest = Sha256::digest(identifier);
    hex::encode(&digest[..4])
}

/// Detects the flavor of the node at `api` and fetches its version, identity and sync status.
pub async fn register(api: &BeaconApi) -> Result<Registration> {
    let status = api.get(NODE_VERSION_PATH).await?.status();
    let flavor = Flavor::from_version_status(status);
    let node_api = flavor.node_api();

    debug!("{} responded to version request with {status}", api.endpoint());

    let version = node_api.fetch_version(api).await?;

    let (id, syncing) = match flavor {
        Flavor::Standard => {
            let Data {
                data: Identity { peer_id },
            } = api.get_json(NODE_IDENTITY_PATH).await?;

            let syncing = api.fetch_sync_status().await?.unwrap_or_default();

            (id_hash_of(&peer_id), syncing)
        }
        Flavor::Prysm | Flavor::Nimbus => (id_hash_of(api.endpoint().as_str()), false),
    };

    Ok(Registration {
        id,
        version,
        flavor,
        node_api,
        syncing,
    })
}

#[derive(Deserialize)]
struct Identity {
    peer_id: String,
}
