//! Extractors that report rejections as JSON errors like every other failure in the API.
//!
//! The extractors provided by `axum` report errors in plain text.

use anyhow::Error as AnyhowError;
use axum::{extract::FromRequestParts, http::request::Parts, RequestPartsExt as _};
use axum_extra::extract::Query;
use serde::de::DeserializeOwned;

use crate::error::Error;

pub struct EthQuery<T>(pub T);

impl<S: Send + Sync, T: DeserializeOwned + 'static> FromRequestParts<S> for EthQuery<T> {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extract()
            .await
            .map(|Query(query)| Self(query))
            .map_err(AnyhowError::msg)
            .map_err(Error::InvalidQuery)
    }
}
