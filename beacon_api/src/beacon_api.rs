use anyhow::{ensure, Result};
use clock::Epoch;
use fork_choice_tree::{ProtoArrayNode, ProtoArrayResponse};
use reqwest::{Client, Response};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use url::Url;

use crate::error::Error;

const FINALITY_CHECKPOINTS_PATH: &str = "/eth/v1/beacon/states/head/finality_checkpoints";
const NODE_SYNCING_PATH: &str = "/eth/v1/node/syncing";
const PROTO_ARRAY_PATH: &str = "/lighthouse/proto_array";

/// The `{ "data": ... }` envelope used by most Beacon Node API responses.
#[derive(Deserialize)]
pub(crate) struct Data<T> {
    pub data: T,
}

/// A single monitored beacon node.
///
/// Paths are appended to the endpoint as written, so an endpoint with a path prefix
/// (such as one behind a reverse proxy) keeps that prefix.
#[derive(Clone, Debug)]
pub struct BeaconApi {
    client: Client,
    endpoint: Url,
}

impl BeaconApi {
    #[must_use]
    pub const fn new(client: Client, endpoint: Url) -> Self {
        Self { client, endpoint }
    }

    #[must_use]
    pub const fn client(&self) -> &Client {
        &self.client
    }

    #[must_use]
    pub const fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub(crate) fn url(&self, path: &str) -> Result<Url> {
        let endpoint = self.endpoint.as_str().trim_end_matches('/');
        format!("{endpoint}{path}").parse().map_err(Into::into)
    }

    pub(crate) async fn get(&self, path: &str) -> Result<Response> {
        let url = self.url(path)?;
        self.client.get(url).send().await.map_err(Into::into)
    }

    pub(crate) async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self.get(path).await?;
        let status = response.status();

        ensure!(
            status.is_success(),
            Error::UnexpectedStatus {
                url: response.url().clone(),
                status,
            },
        );

        response.json().await.map_err(Into::into)
    }

    /// Returns `None` if the node did not report a sync status, which happens before genesis.
    pub async fn fetch_sync_status(&self) -> Result<Option<bool>> {
        // Error responses are decoded too. They have no `data` field.
        let SyncingResponse { data } = self.get(NODE_SYNCING_PATH).await?.json().await?;

        let Some(SyncingData {
            is_syncing,
            sync_distance,
        }) = data
        else {
            return Ok(None);
        };

        if let Some(is_syncing) = is_syncing {
            return Ok(Some(is_syncing));
        }

        let sync_distance = sync_distance
            .ok_or(Error::MissingSyncDistance)?
            .parse::<u64>()
            .map_err(Error::InvalidSyncDistance)?;

        Ok(Some(sync_distance > 1))
    }

    pub async fn fetch_proto_array(&self) -> Result<Vec<ProtoArrayNode>> {
        self.get_json::<ProtoArrayResponse>(PROTO_ARRAY_PATH)
            .await
            .map(ProtoArrayResponse::into_nodes)
    }

    pub async fn fetch_finality_checkpoints(&self) -> Result<FinalityCheckpoints> {
        let Data { data } = self.get_json(FINALITY_CHECKPOINTS_PATH).await?;
        Ok(data)
    }

    /// Fetches participation rates for `epoch` and the epoch before it.
    pub async fn fetch_participation(&self, epoch: Epoch) -> Result<ParticipationPair> {
        let path = format!("/lighthouse/validator_inclusion/{epoch}/global");
        let Data::<GlobalInclusion> { data } = self.get_json(&path).await?;
        data.participation(epoch)
    }
}

#[derive(Clone, PartialEq, Eq, Debug, Deserialize, Serialize)]
pub struct Checkpoint {
    pub epoch: String,
    pub root: String,
}

#[derive(Clone, PartialEq, Eq, Debug, Deserialize)]
pub struct FinalityCheckpoints {
    pub current_justified: Checkpoint,
    pub finalized: Checkpoint,
}

/// Attestation rates in percent of the active balance.
#[derive(Clone, Copy, PartialEq, Debug, Serialize)]
pub struct Participation {
    pub epoch: Epoch,
    pub participation_rate: f64,
    pub justification_rate: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub head_rate: Option<f64>,
}

#[derive(Clone, Copy, PartialEq, Debug, Serialize)]
pub struct ParticipationPair {
    pub current: Participation,
    pub previous: Participation,
}

#[derive(Deserialize)]
struct SyncingResponse {
    data: Option<SyncingData>,
}

#[derive(Deserialize)]
struct SyncingData {
    is_syncing: Option<bool>,
    sync_distance: Option<String>,
}

#[derive(Deserialize)]
struct GlobalInclusion {
    current_epoch_active_gwei: u64,
    current_epoch_attesting_gwei: u64,
    current_epoch_target_attesting_gwei: u64,
    previous_epoch_active_gwei: u64,
    previous_epoch_attesting_gwei: u64,
    previous_epoch_target_attesting_gwei: u64,
    previous_epoch_head_attesting_gwei: u64,
}

impl GlobalInclusion {
    fn participation(&self, epoch: Epoch) -> Result<ParticipationPair> {
        ensure!(
            self.current_epoch_active_gwei > 0 && self.previous_epoch_active_gwei > 0,
            Error::ZeroActiveBalance { epoch },
        );

        let current = Participation {
            epoch,
            participation_rate: percentage(
                self.current_epoch_attesting_gwei,
                self.current_epoch_active_gwei,
            ),
            justification_rate: percentage(
                self.current_epoch_target_attesting_gwei,
                self.current_epoch_active_gwei,
            ),
            head_rate: None,
        };

        let previous = Participation {
            epoch: epoch.saturating_sub(1),
            participation_rate: percentage(
                self.previous_epoch_attesting_gwei,
                self.previous_epoch_active_gwei,
            ),
            justification_rate: percentage(
                self.previous_epoch_target_attesting_gwei,
                self.previous_epoch_active_gwei,
            ),
            head_rate: Some(percentage(
                self.previous_epoch_head_attesting_gwei,
                self.previous_epoch_active_gwei,
            )),
        };

        Ok(ParticipationPair { current, previous })
    }
}

#[expect(
    clippy::cast_precision_loss,
    clippy::float_arithmetic,
    reason = "rates are only displayed, so rounding is acceptable"
)]
fn percentage(part: u64, whole: u64) -> f64 {
    part as f64 / whole as f64 * 100.0
}

#[cfg(test)]
mod tests {
    use httpmock::prelude::*;
    use reqwest::StatusCode;
    use serde_json::{json, Value};
    use test_case::test_case;

    use super::*;

    fn api_for(server: &MockServer) -> Result<BeaconApi> {
        Ok(BeaconApi::new(Client::new(), server.base_url().parse()?))
    }

    #[test]
    fn url_keeps_endpoint_path_prefix() -> Result<()> {
        let api = BeaconApi::new(Client::new(), "http://localhost:5052/beacon/".parse()?);

        assert_eq!(
            api.url(NODE_SYNCING_PATH)?.as_str(),
            "http://localhost:5052/beacon/eth/v1/node/syncing",
        );

        Ok(())
    }

    #[test_case(json!({"data": {"is_syncing": true, "sync_distance": "0"}}) => Some(true); "flag set")]
    #[test_case(json!({"data": {"is_syncing": false, "sync_distance": "90"}}) => Some(false); "flag wins over distance")]
    #[test_case(json!({"data": {"sync_distance": "5"}}) => Some(true); "far behind")]
    #[test_case(json!({"data": {"sync_distance": "1"}}) => Some(false); "one slot behind")]
    #[test_case(json!({"code": 503, "message": "not ready"}) => None; "before genesis")]
    #[tokio::test]
    async fn fetch_sync_status(body: Value) -> Option<bool> {
        let server = MockServer::start_async().await;

        server
            .mock_async(|when, then| {
                when.method(GET).path(NODE_SYNCING_PATH);
                then.status(200).json_body(body);
            })
            .await;

        api_for(&server)
            .expect("mock server URL is valid")
            .fetch_sync_status()
            .await
            .expect("sync status is well formed")
    }

    #[tokio::test]
    async fn fetch_sync_status_rejects_bad_distance() -> Result<()> {
        let server = MockServer::start_async().await;

        server
            .mock_async(|when, then| {
                when.method(GET).path(NODE_SYNCING_PATH);
                then.status(200)
                    .json_body(json!({"data": {"sync_distance": "far"}}));
            })
            .await;

        let error = api_for(&server)?
            .fetch_sync_status()
            .await
            .expect_err("sync distance is not a number");

        assert!(matches!(
            error.downcast_ref(),
            Some(Error::InvalidSyncDistance(_)),
        ));

        Ok(())
    }

    #[tokio::test]
    async fn fetch_proto_array() -> Result<()> {
        let server = MockServer::start_async().await;

        server
            .mock_async(|when, then| {
                when.method(GET).path(PROTO_ARRAY_PATH);
                then.status(200).json_body(json!({
                    "data": {
                        "nodes": [
                            {"slot": "10", "root": "0xa", "parent": null, "weight": 64, "best_descendant": 1},
                            {"slot": "11", "root": "0xb", "parent": 0, "weight": 32, "best_descendant": null},
                        ],
                    },
                }));
            })
            .await;

        let nodes = api_for(&server)?.fetch_proto_array().await?;

        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[1].parent, Some(0));
        assert_eq!(nodes[0].best_descendant, Some(1));

        Ok(())
    }

    #[tokio::test]
    async fn fetch_proto_array_fails_on_error_status() -> Result<()> {
        let server = MockServer::start_async().await;

        server
            .mock_async(|when, then| {
                when.method(GET).path(PROTO_ARRAY_PATH);
                then.status(404);
            })
            .await;

        let error = api_for(&server)?
            .fetch_proto_array()
            .await
            .expect_err("endpoint is missing");

        assert!(matches!(
            error.downcast_ref(),
            Some(Error::UnexpectedStatus { status, .. }) if *status == StatusCode::NOT_FOUND,
        ));

        Ok(())
    }

    #[tokio::test]
    async fn fetch_finality_checkpoints() -> Result<()> {
        let server = MockServer::start_async().await;

        server
            .mock_async(|when, then| {
                when.method(GET).path(FINALITY_CHECKPOINTS_PATH);
                then.status(200).json_body(json!({
                    "data": {
                        "previous_justified": {"epoch": "8", "root": "0x08"},
                        "current_justified": {"epoch": "9", "root": "0x09"},
                        "finalized": {"epoch": "7", "root": "0x07"},
                    },
                }));
            })
            .await;

        let checkpoints = api_for(&server)?.fetch_finality_checkpoints().await?;

        assert_eq!(
            checkpoints,
            FinalityCheckpoints {
                current_justified: Checkpoint {
                    epoch: "9".to_owned(),
                    root: "0x09".to_owned(),
                },
                finalized: Checkpoint {
                    epoch: "7".to_owned(),
                    root: "0x07".to_owned(),
                },
            },
        );

        Ok(())
    }

    #[tokio::test]
    async fn fetch_participation() -> Result<()> {
        let server = MockServer::start_async().await;

        server
            .mock_async(|when, then| {
                when.method(GET).path("/lighthouse/validator_inclusion/20/global");
                then.status(200).json_body(json!({
                    "data": {
                        "current_epoch_active_gwei": 400,
                        "current_epoch_attesting_gwei": 300,
                        "current_epoch_target_attesting_gwei": 200,
                        "previous_epoch_active_gwei": 800,
                        "previous_epoch_attesting_gwei": 800,
                        "previous_epoch_target_attesting_gwei": 600,
                        "previous_epoch_head_attesting_gwei": 400,
                    },
                }));
            })
            .await;

        let participation = api_for(&server)?.fetch_participation(20).await?;

        assert_eq!(
            participation,
            ParticipationPair {
                current: Participation {
                    epoch: 20,
                    participation_rate: 75.0,
                    justification_rate: 50.0,
                    head_rate: None,
                },
                previous: Participation {
                    epoch: 19,
                    participation_rate: 100.0,
                    justification_rate: 75.0,
                    head_rate: Some(50.0),
                },
            },
        );

        Ok(())
    }

    #[tokio::test]
    async fn fetch_participation_fails_on_error_status() -> Result<()> {
        let server = MockServer::start_async().await;

        server
            .mock_async(|when, then| {
                when.method(GET).path("/lighthouse/validator_inclusion/3/global");
                then.status(500);
            })
            .await;

        assert!(api_for(&server)?.fetch_participation(3).await.is_err());

        Ok(())
    }

    #[test]
    fn participation_requires_active_balance() {
        let inclusion = GlobalInclusion {
            current_epoch_active_gwei: 0,
            current_epoch_attesting_gwei: 0,
            current_epoch_target_attesting_gwei: 0,
            previous_epoch_active_gwei: 32,
            previous_epoch_attesting_gwei: 32,
            previous_epoch_target_attesting_gwei: 32,
            previous_epoch_head_attesting_gwei: 32,
        };

        let error = inclusion
            .participation(0)
            .expect_err("current epoch has no active balance");

        assert_eq!(
            error.downcast_ref(),
            Some(&Error::ZeroActiveBalance { epoch: 0 }),
        );
    }

    #[test]
    fn participation_omits_current_head_rate() -> Result<()> {
        let participation = Participation {
            epoch: 5,
            participation_rate: 50.0,
            justification_rate: 25.0,
            head_rate: None,
        };

        assert_eq!(
            serde_json::to_value(participation)?,
            json!({"epoch": 5, "participation_rate": 50.0, "justification_rate": 25.0}),
        );

        Ok(())
    }
}
