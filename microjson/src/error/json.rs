use axum::{extract::Request, http::StatusCode};
use http_body_util::LengthLimitError;
use serde::de::DeserializeOwned;
use serde_json::error::Category;

use super::{
    new_error, wrap_error, AppError, HttpError, ERROR_MESSAGE_INVALID_JSON,
    ERROR_MESSAGE_SCHEMA_VIOLATION,
};

pub const DEFAULT_MAX_JSON_BODY_BYTES: usize = 1024 * 1024;

/// Classifies a JSON decoding failure into something safe to show the caller.
pub fn json_body_error(err: serde_json::Error) -> HttpError {
    match err.classify() {
        Category::Syntax | Category::Eof => wrap_error(err)
            .status(StatusCode::BAD_REQUEST)
            .message(ERROR_MESSAGE_INVALID_JSON),
        // Date and time parse failures surface here as custom data errors.
        Category::Data => wrap_error(err)
            .status(StatusCode::BAD_REQUEST)
            .message(ERROR_MESSAGE_SCHEMA_VIOLATION),
        Category::Io => wrap_error(err),
    }
}

/// Reads at most `limit` bytes of the request body and decodes them as JSON.
pub async fn read_json<T: DeserializeOwned>(req: Request, limit: usize) -> Result<T, AppError> {
    let bytes = axum::body::to_bytes(req.into_body(), limit)
        .await
        .map_err(|err| {
            let too_large = std::error::Error::source(&err)
                .is_some_and(|source| source.is::<LengthLimitError>());
            if too_large {
                new_error()
                    .status(StatusCode::PAYLOAD_TOO_LARGE)
                    .custom_field("limit", limit)
                    .wrap(err)
            } else {
                wrap_error(err).status(StatusCode::BAD_REQUEST)
            }
        })?;

    serde_json::from_slice(&bytes).map_err(|err| json_body_error(err).into())
}
