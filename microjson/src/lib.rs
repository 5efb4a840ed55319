//! Toolkit for JSON HTTP APIs on axum and Postgres.
//!
//! The centre piece is [`TxWrapper`]: it runs a handler inside a database transaction and
//! publishes the messages the handler deferred only once that transaction has committed.

pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod repositories;
pub mod services;
pub mod state;
pub mod types;

pub use error::{AppError, HttpError, ResponseError};
pub use handlers::{wrap, Tx, TxResult, TxWrapper};
pub use services::{MessagePublisher, PublisherRegistry};
