use core::{net::SocketAddr, time::Duration};
use std::sync::Arc;

use axum::{
    extract::{ConnectInfo, Request},
    response::Response,
};
use features::Feature;
use logging::info_with_nodes;
use tracing::Span;

use crate::{middleware::RequestSummary, ApiError};

// `TraceLayer` emits its own events at `DEBUG` with targets that are filtered out by default.
// These callbacks log through the workspace macros instead.

pub fn log_request(request: &Request, _span: &Span) {
    let method = request.method();
    let uri = request.uri();

    if Feature::LogHttpRequests.is_enabled() {
        let version = request.version();

        match request.extensions().get::<ConnectInfo<SocketAddr>>() {
            Some(ConnectInfo(remote)) => {
                info_with_nodes!("received request ({method} {uri} {version:?}) from {remote}")
            }
            None => info_with_nodes!("received request ({method} {uri} {version:?})"),
        }
    }

    if Feature::LogHttpHeaders.is_enabled() {
        let headers = request.headers();

        info_with_nodes!("request headers for ({method} {uri}): {headers:?}");
    }
}

pub fn log_response<E: ApiError + Send + Sync>() -> impl Fn(&Response, Duration, &Span) + Clone {
    |response: &Response, latency: Duration, _span: &Span| {
        if !Feature::LogHttpRequests.is_enabled() {
            return;
        }

        let status = response.status();

        let request = response
            .extensions()
            .get::<RequestSummary>()
            .map_or_else(|| "unknown request".to_owned(), ToString::to_string);

        match response.extensions().get::<Arc<E>>() {
            Some(error) => info_with_nodes!(
                "produced response ({status}) to {request} in {latency:?} (error: {})",
                error.format_sources(),
            ),
            None => info_with_nodes!("produced response ({status}) to {request} in {latency:?}"),
        }
    }
}
