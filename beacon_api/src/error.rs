use core::num::ParseIntError;

use base64::DecodeError;
use clock::Epoch;
use reqwest::StatusCode;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
#[cfg_attr(test, derive(PartialEq, Eq))]
pub enum Error {
    #[error("{url} responded with status {status}")]
    UnexpectedStatus { url: Url, status: StatusCode },
    #[error("sync status contains neither is_syncing nor sync_distance")]
    MissingSyncDistance,
    #[error("sync distance is not a decimal integer")]
    InvalidSyncDistance(#[source] ParseIntError),
    #[error("Prysm block root is not valid base64")]
    InvalidPrysmRoot(#[source] DecodeError),
    #[error("JSON-RPC method {method} failed with code {code}: {message}")]
    JsonRpc {
        method: String,
        code: i64,
        message: String,
    },
    #[error("JSON-RPC method {method} returned neither a result nor an error")]
    MissingJsonRpcResult { method: String },
    #[error("no active balance reported around epoch {epoch}")]
    ZeroActiveBalance { epoch: Epoch },
}
