//! Request handlers bound to a database transaction.
//!
//! [`TxWrapper`] opens a transaction for every request and lends it to the business function as a
//! [`Tx`]. The transaction is committed when the function returns `Ok` and rolled back when it
//! returns `Err` or panics. Messages registered with [`Tx::defer_publish`] are published only
//! after a successful commit, in the order they were registered.

use std::panic::AssertUnwindSafe;

use axum::{extract::Request, response::Response};
use futures::{future::BoxFuture, FutureExt};
use serde::Serialize;
use serde_json::Value;

use super::{
    response::{respond, HandlerOutcome},
    tx::Tx,
};
use crate::{
    error::{send_error, wrap_error, AppError},
    repositories::transaction::{Database, Transaction},
    services::{DeferredPublishes, PublisherRegistry},
};

/// Future returned by transactional business functions. It may borrow the [`Tx`] for `'t`.
pub type TxResult<'t, R> = BoxFuture<'t, Result<R, AppError>>;

/// Builds transactional handlers sharing one database and one set of publishers.
///
/// ```ignore
/// fn create_order<'a>(req: Request, tx: &'a mut Tx<PgTransaction<'static>>) -> TxResult<'a, Order> {
///     Box::pin(async move {
///         let order = insert_order(tx.conn(), read_json(req, LIMIT).await?).await?;
///         tx.defer_publish("orders", serde_json::to_value(&order)?);
///         Ok(order)
///     })
/// }
///
/// let orders = TxWrapper::new(pool, PublisherRegistry::new().register("orders", publisher));
/// let app = Router::new().route("/orders", post(orders.handler(create_order)));
/// ```
#[derive(Debug, Clone)]
pub struct TxWrapper<D> {
    db: D,
    publishers: PublisherRegistry,
}

impl<D> TxWrapper<D>
where
    D: Database + Clone,
{
    pub fn new(db: D, publishers: PublisherRegistry) -> Self {
        Self { db, publishers }
    }

    pub fn publishers(&self) -> &PublisherRegistry {
        &self.publishers
    }

    /// Turns a business function into an axum handler.
    pub fn handler<F, R>(
        &self,
        handler: F,
    ) -> impl Fn(Request) -> BoxFuture<'static, Response> + Clone + Send + Sync + 'static
    where
        F: for<'t> Fn(Request, &'t mut Tx<D::Transaction>) -> TxResult<'t, R>
            + Clone
            + Send
            + Sync
            + 'static,
        R: Serialize + Send + 'static,
    {
        let wrapper = self.clone();
        move |req| {
            let wrapper = wrapper.clone();
            let handler = handler.clone();
            Box::pin(async move { wrapper.serve(req, &handler).await })
        }
    }

    /// Runs `handler` for one request inside its own transaction.
    pub async fn serve<F, R>(&self, req: Request, handler: &F) -> Response
    where
        F: for<'t> Fn(Request, &'t mut Tx<D::Transaction>) -> TxResult<'t, R> + Sync,
        R: Serialize,
    {
        let transaction = match self.db.begin().await {
            Ok(transaction) => transaction,
            Err(err) => {
                tracing::error!(error = %err, "Failed to begin transaction");
                return send_error(wrap_error(err).into());
            }
        };

        let mut tx = Tx::new(transaction, self.publishers.clone());
        let outcome = {
            let tx = &mut tx;
            AssertUnwindSafe(async move { handler(req, tx).await })
                .catch_unwind()
                .await
        };

        let (transaction, deferred) = tx.into_parts();
        let outcome = self.resolve(transaction, deferred, outcome).await;
        respond(outcome)
    }

    /// Commits or rolls back according to the outcome, publishing deferred messages only after
    /// a successful commit.
    ///
    /// The result is serialized before committing, so a value that cannot be written as JSON
    /// rolls the transaction back like any other unhandled error.
    async fn resolve<R: Serialize>(
        &self,
        transaction: D::Transaction,
        deferred: DeferredPublishes,
        outcome: HandlerOutcome<R>,
    ) -> HandlerOutcome<Value> {
        let outcome = match outcome {
            Ok(Ok(value)) => Ok(serde_json::to_value(&value).map_err(AppError::unhandled)),
            Ok(Err(err)) => Ok(Err(err)),
            Err(payload) => Err(payload),
        };

        match outcome {
            Ok(Ok(body)) => match transaction.commit().await {
                Ok(()) => {
                    let report = deferred.publish_all(&self.publishers).await;
                    if report.failed > 0 {
                        tracing::warn!(
                            published = report.published,
                            failed = report.failed,
                            "Transaction committed but some messages were not published"
                        );
                    }
                    Ok(Ok(body))
                }
                Err(err) => {
                    // The failed transaction rolls back when dropped.
                    tracing::error!(error = %err, "Failed to commit transaction");
                    deferred.discard();
                    Ok(Err(wrap_error(err).into()))
                }
            },
            failed => {
                if let Err(err) = transaction.rollback().await {
                    tracing::warn!(error = %err, "Failed to roll back transaction");
                }
                deferred.discard();
                failed
            }
        }
    }
}
