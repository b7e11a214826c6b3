use anyhow::{bail, Result};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use clock::Slot;
use derive_more::Display;
use reqwest::StatusCode;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::{
    beacon_api::{BeaconApi, Data},
    error::Error,
};

pub const NODE_VERSION_PATH: &str = "/eth/v1/node/version";

const HEAD_HEADER_PATH: &str = "/eth/v1/beacon/headers/head";
const PRYSM_CHAIN_HEAD_PATH: &str = "/eth/v1alpha1/beacon/chainhead";
const PRYSM_NODE_VERSION_PATH: &str = "/eth/v1alpha1/node/version";

#[derive(Clone, PartialEq, Eq, Default, Debug, Display, Serialize)]
#[display("({slot}, {root})")]
pub struct HeadRef {
    pub slot: String,
    pub root: String,
}

/// Client implementation family, detected from how a node answers the standard version request.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Display)]
pub enum Flavor {
    Standard,
    Prysm,
    Nimbus,
}

impl Flavor {
    // Prysm did not serve the standard API at first and responds with 404.
    // Nimbus only accepts JSON-RPC and rejects a bodiless request with 411 Length Required.
    #[must_use]
    pub fn from_version_status(status: StatusCode) -> Self {
        match status {
            StatusCode::NOT_FOUND => Self::Prysm,
            StatusCode::LENGTH_REQUIRED => Self::Nimbus,
            _ => Self::Standard,
        }
    }

    #[must_use]
    pub fn node_api(self) -> Box<dyn NodeApi> {
        match self {
            Self::Standard => Box::new(StandardApi),
            Self::Prysm => Box::new(PrysmApi),
            Self::Nimbus => Box::new(NimbusApi),
        }
    }
}

#[async_trait]
pub trait NodeApi: Send + Sync {
    async fn fetch_version(&self, api: &BeaconApi) -> Result<String>;

    /// Returns `None` if the head is the same as `previous` or the response is out of date.
    async fn fetch_head(
        &self,
        api: &BeaconApi,
        previous: Option<&HeadRef>,
    ) -> Result<Option<HeadRef>>;
}

pub struct StandardApi;

#[async_trait]
impl NodeApi for StandardApi {
    async fn fetch_version(&self, api: &BeaconApi) -> Result<String> {
        let Data {
            data: VersionData { version },
        } = api.get_json(NODE_VERSION_PATH).await?;

        Ok(version)
    }

    async fn fetch_head(
        &self,
        api: &BeaconApi,
        previous: Option<&HeadRef>,
    ) -> Result<Option<HeadRef>> {
        let Data {
            data: HeaderData { root, header },
        } = api.get_json(HEAD_HEADER_PATH).await?;

        if previous.is_some_and(|previous| previous.root == root) {
            return Ok(None);
        }

        Ok(Some(HeadRef {
            slot: header.message.slot,
            root,
        }))
    }
}

pub struct PrysmApi;

#[async_trait]
impl NodeApi for PrysmApi {
    async fn fetch_version(&self, api: &BeaconApi) -> Result<String> {
        let PrysmVersion { version } = api.get_json(PRYSM_NODE_VERSION_PATH).await?;
        Ok(version)
    }

    async fn fetch_head(
        &self,
        api: &BeaconApi,
        previous: Option<&HeadRef>,
    ) -> Result<Option<HeadRef>> {
        let PrysmChainHead {
            head_block_root,
            head_slot,
        } = api.get_json(PRYSM_CHAIN_HEAD_PATH).await?;

        let root = format!("0x{}", decode_prysm_root(&head_block_root)?);

        if let Some(previous) = previous {
            // The chain head endpoint can be slow enough for responses to arrive out of order.
            if previous.root == root || is_older(&head_slot, &previous.slot) {
                return Ok(None);
            }
        }

        Ok(Some(HeadRef {
            slot: head_slot,
            root,
        }))
    }
}

pub struct NimbusApi;

impl NimbusApi {
    async fn call<T: DeserializeOwned>(api: &BeaconApi, method: &str) -> Result<T> {
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            id: hex::encode(rand::random::<[u8; 32]>()),
            method,
            params: [],
        };

        let JsonRpcResponse { result, error } = api
            .client()
            .post(api.endpoint().clone())
            .json(&request)
            .send()
            .await?
            .json::<JsonRpcResponse<T>>()
            .await?;

        if let Some(JsonRpcError { code, message }) = error {
            bail!(Error::JsonRpc {
                method: method.to_owned(),
                code,
                message,
            });
        }

        result.ok_or_else(|| {
            Error::MissingJsonRpcResult {
                method: method.to_owned(),
            }
            .into()
        })
    }
}

#[async_trait]
impl NodeApi for NimbusApi {
    async fn fetch_version(&self, api: &BeaconApi) -> Result<String> {
        Self::call(api, "getNodeVersion").await
    }

    async fn fetch_head(
        &self,
        api: &BeaconApi,
        previous: Option<&HeadRef>,
    ) -> Result<Option<HeadRef>> {
        let NimbusChainHead {
            head_block_root,
            head_slot,
        } = Self::call(api, "getChainHead").await?;

        let root = format!("0x{head_block_root}");

        if previous.is_some_and(|previous| previous.root == root) {
            return Ok(None);
        }

        Ok(Some(HeadRef {
            slot: head_slot.to_string(),
            root,
        }))
    }
}

/// Converts a base64 block root from the Prysm API to unprefixed lowercase hex.
pub fn decode_prysm_root(root_base64: &str) -> Result<String, Error> {
    STANDARD
        .decode(root_base64)
        .map(hex::encode)
        .map_err(Error::InvalidPrysmRoot)
}

fn is_older(slot: &str, previous_slot: &str) -> bool {
    match (slot.parse::<Slot>(), previous_slot.parse::<Slot>()) {
        (Ok(slot), Ok(previous_slot)) => slot < previous_slot,
        _ => false,
    }
}

#[derive(Deserialize)]
struct VersionData {
    version: String,
}

#[derive(Deserialize)]
struct HeaderData {
    root: String,
    header: SignedHeader,
}

#[derive(Deserialize)]
struct SignedHeader {
    message: HeaderMessage,
}

#[derive(Deserialize)]
struct HeaderMessage {
    slot: String,
}

#[derive(Deserialize)]
struct PrysmVersion {
    version: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PrysmChainHead {
    head_block_root: String,
    head_slot: String,
}

#[derive(Deserialize)]
struct NimbusChainHead {
    head_block_root: String,
    head_slot: Slot,
}

#[derive(Serialize)]
struct JsonRpcRequest<'method> {
    jsonrpc: &'static str,
    id: String,
    method: &'method str,
    params: [(); 0],
}

#[derive(Deserialize)]
struct JsonRpcResponse<T> {
    result: Option<T>,
    error: Option<JsonRpcError>,
}

#[derive(Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}
