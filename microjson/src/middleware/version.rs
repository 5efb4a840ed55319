use axum::{
    extract::{Request, State},
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};

use crate::state::ServiceInfo;

pub const VERSION_HEADER: &str = "x-version";

/// Adds `X-Version` with the running version to every response.
pub async fn version_header(State(info): State<ServiceInfo>, req: Request, next: Next) -> Response {
    let mut response = next.run(req).await;

    match HeaderValue::from_str(&info.version) {
        Ok(value) => {
            response
                .headers_mut()
                .insert(HeaderName::from_static(VERSION_HEADER), value);
        }
        Err(_) => tracing::warn!(version = %info.version, "Version is not a valid header value"),
    }

    response
}
