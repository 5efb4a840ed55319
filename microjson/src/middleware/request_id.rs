use std::fmt;

use axum::{
    extract::Request,
    http::{HeaderMap, HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";
pub const CORRELATION_ID_HEADER: &str = "x-correlation-id";
const MAX_REQUEST_ID_LEN: usize = 128;

/// Identifier of the current request, available as a request extension.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestId(pub String);

impl RequestId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Reuses the caller's id when it is usable, otherwise generates one.
    fn from_headers(headers: &HeaderMap) -> Self {
        [REQUEST_ID_HEADER, CORRELATION_ID_HEADER]
            .into_iter()
            .filter_map(|name| headers.get(name))
            .filter_map(|value| value.to_str().ok())
            .map(str::trim)
            .find(|id| !id.is_empty() && id.len() <= MAX_REQUEST_ID_LEN)
            .map(|id| RequestId(id.to_string()))
            .unwrap_or_else(|| RequestId(Uuid::new_v4().to_string()))
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub async fn request_id(mut req: Request, next: Next) -> Response {
    let id = RequestId::from_headers(req.headers());
    req.extensions_mut().insert(id.clone());

    let mut response = next.run(req).await;

    if let Ok(value) = HeaderValue::from_str(id.as_str()) {
        response
            .headers_mut()
            .insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefers_request_id_over_correlation_id() {
        let mut headers = HeaderMap::new();
        headers.insert(REQUEST_ID_HEADER, HeaderValue::from_static("req-1"));
        headers.insert(CORRELATION_ID_HEADER, HeaderValue::from_static("corr-1"));
        assert_eq!(RequestId::from_headers(&headers).as_str(), "req-1");
    }

    #[test]
    fn blank_or_oversized_ids_are_replaced() {
        let mut headers = HeaderMap::new();
        headers.insert(REQUEST_ID_HEADER, HeaderValue::from_static("   "));
        let id = RequestId::from_headers(&headers);
        assert!(Uuid::parse_str(id.as_str()).is_ok());

        let long = "x".repeat(MAX_REQUEST_ID_LEN + 1);
        let mut headers = HeaderMap::new();
        headers.insert(CORRELATION_ID_HEADER, HeaderValue::from_str(&long).unwrap());
        let id = RequestId::from_headers(&headers);
        assert!(Uuid::parse_str(id.as_str()).is_ok());
    }
}
