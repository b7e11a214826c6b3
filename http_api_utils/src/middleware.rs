use core::{
    fmt::{Display, Formatter, Result as FmtResult},
    net::SocketAddr,
};

use axum::{
    extract::{ConnectInfo, OriginalUri, Request},
    http::{Method, Uri},
    middleware::Next,
    response::{IntoResponse as _, Response},
    Extension,
};

/// Request details copied into the response so that they can be logged alongside it.
#[derive(Clone, Debug)]
pub struct RequestSummary {
    method: Method,
    uri: Uri,
    remote: Option<SocketAddr>,
}

impl Display for RequestSummary {
    fn fmt(&self, formatter: &mut Formatter) -> FmtResult {
        let Self {
            method,
            uri,
            remote,
        } = self;

        write!(formatter, "({method} {uri})")?;

        if let Some(remote) = remote {
            write!(formatter, " for {remote}")?;
        }

        Ok(())
    }
}

pub async fn insert_response_extensions(request: Request, next: Next) -> Response {
    // `ConnectInfo` is missing when the router is driven directly, as in tests.
    let remote = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(remote)| *remote);

    let uri = request
        .extensions()
        .get::<OriginalUri>()
        .map(|OriginalUri(uri)| uri.clone())
        .unwrap_or_else(|| request.uri().clone());

    let summary = RequestSummary {
        method: request.method().clone(),
        uri,
        remote,
    };

    (Extension(summary), next.run(request).await).into_response()
}
