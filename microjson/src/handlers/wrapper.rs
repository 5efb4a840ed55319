//! Handlers that need no database transaction.

use std::{future::Future, panic::AssertUnwindSafe};

use axum::{extract::Request, response::Response};
use futures::{future::BoxFuture, FutureExt};
use serde::Serialize;

use super::response::respond;
use crate::error::AppError;

/// Turns `request -> Result<R, AppError>` into an axum handler.
///
/// Success is sent as `200` with `R` as JSON, errors through the error model, and panics are
/// recovered and answered with a generic `500`, exactly like transactional handlers.
pub fn wrap<F, Fut, R>(
    handler: F,
) -> impl Fn(Request) -> BoxFuture<'static, Response> + Clone + Send + Sync + 'static
where
    F: Fn(Request) -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = Result<R, AppError>> + Send + 'static,
    R: Serialize + Send + 'static,
{
    move |req| {
        let handler = handler.clone();
        Box::pin(async move { serve(req, &handler).await })
    }
}

/// Runs `handler` for one request behind the panic barrier.
pub async fn serve<F, Fut, R>(req: Request, handler: &F) -> Response
where
    F: Fn(Request) -> Fut,
    Fut: Future<Output = Result<R, AppError>>,
    R: Serialize,
{
    let outcome = AssertUnwindSafe(async move { handler(req).await })
        .catch_unwind()
        .await;
    respond(outcome)
}
