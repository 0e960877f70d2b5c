//! services/api/src/web/middleware.rs
//!
//! Device identification middleware for all overlay-backed routes.

use axum::{
    extract::Request,
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use tracing::warn;
use uuid::Uuid;

pub const DEVICE_HEADER: &str = "x-device-id";
const DEVICE_QUERY_PARAM: &str = "device_id";

/// Middleware that resolves the calling device and inserts its id into the request
/// extensions.
///
/// The id comes from the `x-device-id` header. WebSocket clients that cannot set
/// headers pass it as the `device_id` query parameter instead. A missing or malformed
/// id is rejected with 400 Bad Request.
pub async fn require_device(mut req: Request, next: Next) -> Result<Response, StatusCode> {
    let device_id = device_id(req.headers(), req.uri().query()).ok_or_else(|| {
        warn!(path = %req.uri().path(), "request without a valid device id");
        StatusCode::BAD_REQUEST
    })?;

    req.extensions_mut().insert(device_id);
    Ok(next.run(req).await)
}

fn device_id(headers: &HeaderMap, query: Option<&str>) -> Option<Uuid> {
    let from_header = headers.get(DEVICE_HEADER).and_then(|v| v.to_str().ok());
    let from_query = || {
        query?
            .split('&')
            .find_map(|pair| pair.strip_prefix(DEVICE_QUERY_PARAM)?.strip_prefix('='))
    };
    Uuid::parse_str(from_header.or_else(from_query)?.trim()).ok()
}
