use crate::AppState;
use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use percent_encoding::percent_decode_str;
use std::net::SocketAddr;

/// Records every routed request in the request log before its handler runs.
///
/// Installed with `route_layer`, so unmatched paths (the 404 fallback) are not
/// logged.
pub async fn request_log_middleware(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    let endpoint = percent_decode_str(req.uri().path())
        .decode_utf8_lossy()
        .into_owned();
    let method = req.method().to_string();
    let client_address = client_address(&req);

    state
        .request_log
        .record(&endpoint, &method, &client_address)
        .await;

    next.run(req).await
}

fn client_address(req: &Request) -> String {
    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}
