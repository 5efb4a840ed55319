//! Response envelope shared by the plain and transactional wrappers.

use std::{any::Any, backtrace::Backtrace};

use anyhow::anyhow;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::error::{send_error, AppError};

/// Payload of a panic caught at the handler boundary.
pub(crate) type PanicPayload = Box<dyn Any + Send>;

/// Everything a wrapped handler can end with: a result, an error, or a panic.
pub(crate) type HandlerOutcome<R> = Result<Result<R, AppError>, PanicPayload>;

/// Writes `body` as JSON with the given status.
///
/// A body that cannot be serialized is answered as an unhandled error, never with `status`.
pub fn send_object<B: Serialize>(status: StatusCode, body: B) -> Response {
    match serde_json::to_value(&body) {
        Ok(body) => (status, Json(body)).into_response(),
        Err(err) => send_error(AppError::unhandled(err)),
    }
}

pub(crate) fn respond<R: Serialize>(outcome: HandlerOutcome<R>) -> Response {
    match outcome {
        Ok(Ok(body)) => send_object(StatusCode::OK, body),
        Ok(Err(err)) => send_error(err),
        Err(payload) => send_error(recovered_panic(payload)),
    }
}

/// Logs a caught panic and turns it into an error the client only sees as a generic 500.
///
/// The stack has already unwound here, so the captured trace shows where the panic was caught.
/// The panic hook reports where it was raised.
pub(crate) fn recovered_panic(payload: PanicPayload) -> AppError {
    let message = panic_message(payload.as_ref());
    tracing::error!(
        panic = message,
        recovery_site = %Backtrace::force_capture(),
        "Recovered panic"
    );
    AppError::Unhandled(anyhow!("handler panicked: {message}"))
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        *message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "non-string panic payload"
    }
}
