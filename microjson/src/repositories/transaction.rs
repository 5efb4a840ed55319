//! Transaction management for request-scoped units of work.
//!
//! [`Database`] and [`Transaction`] are the only database operations the transactional handler
//! needs. They are implemented for Postgres pools here and can be implemented by any other
//! store, including in-memory fakes in tests.

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgTransaction};

/// A connection pool able to open transactions.
#[async_trait]
pub trait Database: Send + Sync + 'static {
    type Transaction: Transaction;

    /// Begin a new database transaction.
    async fn begin(&self) -> Result<Self::Transaction, sqlx::Error>;
}

/// A live database transaction.
///
/// Implementations must roll back when dropped without having been committed or rolled back,
/// including after a failed commit. `sqlx` transactions already behave this way.
#[async_trait]
pub trait Transaction: Send + 'static {
    /// Commit all changes made within the transaction.
    async fn commit(self) -> Result<(), sqlx::Error>;

    /// Undo all changes made within the transaction since it began.
    async fn rollback(self) -> Result<(), sqlx::Error>;
}

/// Begin a new Postgres transaction.
pub async fn begin_transaction(db: &PgPool) -> Result<PgTransaction<'static>, sqlx::Error> {
    db.begin().await
}

/// Commit a Postgres transaction.
pub async fn commit_transaction(tx: PgTransaction<'static>) -> Result<(), sqlx::Error> {
    tx.commit().await
}

/// Roll back a Postgres transaction.
pub async fn rollback_transaction(tx: PgTransaction<'static>) -> Result<(), sqlx::Error> {
    tx.rollback().await
}

#[async_trait]
impl Database for PgPool {
    type Transaction = PgTransaction<'static>;

    async fn begin(&self) -> Result<Self::Transaction, sqlx::Error> {
        begin_transaction(self).await
    }
}

#[async_trait]
impl Transaction for PgTransaction<'static> {
    async fn commit(self) -> Result<(), sqlx::Error> {
        commit_transaction(self).await
    }

    async fn rollback(self) -> Result<(), sqlx::Error> {
        rollback_transaction(self).await
    }
}

#[async_trait]
impl<T: Database> Database for Arc<T> {
    type Transaction = T::Transaction;

    async fn begin(&self) -> Result<Self::Transaction, sqlx::Error> {
        T::begin(self).await
    }
}
