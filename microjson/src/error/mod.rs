//! Error model shared by every wrapped handler.
//!
//! [`HttpError`] is built fluently at the call site and carries everything needed to answer the
//! client. Anything else that can describe itself as an HTTP response implements
//! [`ResponseError`]. Errors without that capability end up as [`AppError::Unhandled`] and are
//! rendered as a generic 500.

use std::fmt;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{Map, Value};

mod json;

pub use json::{json_body_error, read_json, DEFAULT_MAX_JSON_BODY_BYTES};

pub const ERROR_MESSAGE_GENERIC: &str = "Unknown Server Error";
pub const ERROR_MESSAGE_BAD_REQUEST: &str = "Bad Request";
pub const ERROR_MESSAGE_INVALID_JSON: &str = "Invalid JSON";
pub const ERROR_MESSAGE_SCHEMA_VIOLATION: &str = "Request did not match schema";
pub const ERROR_MESSAGE_UNKNOWN: &str = "Unknown Error";

/// Capability of an error to describe its own HTTP response.
pub trait ResponseError: std::error::Error + Send + Sync + 'static {
    fn http_status(&self) -> StatusCode;

    /// JSON body sent to the client.
    fn response_body(&self) -> Value;

    /// When `Some`, the response is sent as `text/plain` with this body instead of JSON.
    fn plain_text_body(&self) -> Option<String> {
        None
    }
}

/// Structured HTTP error assembled through chained calls.
///
/// ```
/// use axum::http::StatusCode;
/// use microjson::error::HttpError;
///
/// let err = HttpError::new()
///     .status(StatusCode::CONFLICT)
///     .message(format!("order {} already shipped", 42))
///     .tag("ORDER_SHIPPED");
/// assert_eq!(err.user_message(), "order 42 already shipped");
/// ```
#[derive(Debug)]
pub struct HttpError {
    status: StatusCode,
    message: Option<String>,
    tags: Vec<String>,
    cause: Option<anyhow::Error>,
    custom: Map<String, Value>,
    plain_text: bool,
}

impl HttpError {
    pub fn new() -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: None,
            tags: Vec::new(),
            cause: None,
            custom: Map::new(),
            plain_text: false,
        }
    }

    /// Sets the status. A client error status adopts its reason phrase as the message unless a
    /// message was already set.
    pub fn status(mut self, status: StatusCode) -> Self {
        self.status = status;
        if self.message.is_none() && status.as_u16() < 500 {
            self.message = Some(reason_phrase(status).to_string());
        }
        self
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    /// Attaches the underlying cause. It is logged, never sent to the client.
    pub fn wrap(mut self, cause: impl Into<anyhow::Error>) -> Self {
        self.cause = Some(cause.into());
        self
    }

    pub fn custom_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.custom.insert(key.into(), value.into());
        self
    }

    /// Switches the response to plain text and sets its message.
    pub fn plain_text(mut self, message: impl Into<String>) -> Self {
        self.plain_text = true;
        self.message(message)
    }

    pub fn user_message(&self) -> &str {
        self.message.as_deref().unwrap_or(ERROR_MESSAGE_GENERIC)
    }

    pub fn get_tags(&self) -> &[String] {
        &self.tags
    }

    pub fn custom_fields(&self) -> &Map<String, Value> {
        &self.custom
    }

    pub fn cause(&self) -> Option<&anyhow::Error> {
        self.cause.as_ref()
    }

    pub fn is_plain_text(&self) -> bool {
        self.plain_text
    }
}

impl Default for HttpError {
    fn default() -> Self {
        Self::new()
    }
}

/// Shorthand for [`HttpError::new`].
pub fn new_error() -> HttpError {
    HttpError::new()
}

/// Starts a builder around an existing error.
pub fn wrap_error(cause: impl Into<anyhow::Error>) -> HttpError {
    HttpError::new().wrap(cause)
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.cause {
            Some(cause) => write!(f, "{cause}"),
            None => f.write_str(self.user_message()),
        }
    }
}

impl std::error::Error for HttpError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause.as_ref().map(|cause| {
            let source: &(dyn std::error::Error + 'static) = cause.as_ref();
            source
        })
    }
}

impl ResponseError for HttpError {
    fn http_status(&self) -> StatusCode {
        self.status
    }

    fn response_body(&self) -> Value {
        let mut body = self.custom.clone();
        if !self.tags.is_empty() {
            body.insert("tags".to_string(), Value::from(self.tags.clone()));
        }
        body.insert(
            "status".to_string(),
            Value::from(reason_phrase(self.status)),
        );
        body.insert("message".to_string(), Value::from(self.user_message()));
        Value::Object(body)
    }

    fn plain_text_body(&self) -> Option<String> {
        self.plain_text.then(|| self.user_message().to_string())
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        send_error(self.into())
    }
}

/// Error type returned by wrapped handlers.
#[derive(Debug)]
pub enum AppError {
    /// Knows its own status and body.
    Response(Box<dyn ResponseError>),
    /// Anything else. Logged and answered with a generic 500.
    Unhandled(anyhow::Error),
}

impl AppError {
    pub fn response(err: impl ResponseError) -> Self {
        AppError::Response(Box::new(err))
    }

    pub fn unhandled(err: impl Into<anyhow::Error>) -> Self {
        AppError::Unhandled(err.into())
    }

    /// Status the client will receive.
    pub fn http_status(&self) -> StatusCode {
        match self {
            AppError::Response(err) => err.http_status(),
            AppError::Unhandled(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Response(err) => write!(f, "{err}"),
            AppError::Unhandled(err) => write!(f, "{err}"),
        }
    }
}

impl From<HttpError> for AppError {
    fn from(err: HttpError) -> Self {
        AppError::Response(Box::new(err))
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<HttpError>() {
            Ok(http) => AppError::Response(Box::new(http)),
            Err(err) => AppError::Unhandled(err),
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => wrap_error(err)
                .status(StatusCode::NOT_FOUND)
                .message("Resource not found")
                .into(),
            _ => AppError::Unhandled(err.into()),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        json_body_error(err).into()
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        send_error(self)
    }
}

/// Renders any error as a response. Every failure path of the wrappers ends here.
pub fn send_error(err: AppError) -> Response {
    match err {
        AppError::Response(err) => {
            let status = err.http_status();
            if status.is_server_error() {
                tracing::error!(status = status.as_u16(), error = %err, "Request failed");
            }
            render(err.as_ref())
        }
        AppError::Unhandled(err) => {
            tracing::error!("Unhandled error: {:#}", err);
            render(&wrap_error(err).message(ERROR_MESSAGE_UNKNOWN))
        }
    }
}

fn render(err: &dyn ResponseError) -> Response {
    let status = err.http_status();
    match err.plain_text_body() {
        Some(text) => (status, text).into_response(),
        None => (status, Json(err.response_body())).into_response(),
    }
}

pub(crate) fn reason_phrase(status: StatusCode) -> &'static str {
    status.canonical_reason().unwrap_or("Unknown Status")
}
