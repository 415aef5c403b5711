use std::time::Instant;

use axum::{
    extract::{Query, Request},
    http::{HeaderMap, Uri},
    middleware::Next,
    response::Response,
};
use tracing::info;

use crate::api::session::guest_session;
use crate::util::QueryParams;

fn has_session(headers: &HeaderMap, uri: &Uri) -> bool {
    let params = Query::<QueryParams>::try_from_uri(uri)
        .map(|Query(params)| params)
        .unwrap_or_default();
    guest_session(headers, &params).is_some()
}

pub async fn log_request(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let uri = req.uri().clone();
    let has_session = has_session(req.headers(), &uri);
    let started = Instant::now();

    let response = next.run(req).await;

    let status = response.status().as_u16();
    let content_length = response
        .headers()
        .get(axum::http::header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(0);

    info!(
        method = %method,
        url = %uri,
        status = status,
        length = content_length,
        session = has_session,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "HTTP request"
    );

    response
}
