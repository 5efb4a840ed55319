//! Per-request transaction handle given to business logic.

use std::ops::{Deref, DerefMut};

use serde_json::Value;
use sqlx::postgres::{PgConnection, PgTransaction};

use crate::services::{DeferredPublishes, PublisherRegistry};

/// A live transaction plus the messages waiting for it to commit.
///
/// Created by [`TxWrapper`](super::transactional::TxWrapper) for one request and lent to the
/// business function as `&mut Tx`. The wrapper takes it back afterwards to commit or roll back,
/// so a `Tx` never outlives its request.
///
/// The handle derefs to the underlying transaction, which stays usable for SQL for the whole
/// call. Appending messages needs `&mut self`: work fanned out to several tasks has to
/// synchronise access to the handle itself.
pub struct Tx<T> {
    transaction: T,
    deferred: DeferredPublishes,
    publishers: PublisherRegistry,
}

impl<T> Tx<T> {
    pub(crate) fn new(transaction: T, publishers: PublisherRegistry) -> Self {
        Self {
            transaction,
            deferred: DeferredPublishes::new(),
            publishers,
        }
    }

    /// Registers `message` for `publisher`, to be sent only if this transaction commits.
    ///
    /// Nothing is published here. The publisher name is resolved after the commit.
    pub fn defer_publish(&mut self, publisher: impl Into<String>, message: impl Into<Value>) {
        self.deferred.push(publisher, message.into());
    }

    pub fn transaction(&mut self) -> &mut T {
        &mut self.transaction
    }

    pub fn deferred(&self) -> &DeferredPublishes {
        &self.deferred
    }

    /// Whether a publisher with this name is configured on the handler.
    pub fn has_publisher(&self, name: &str) -> bool {
        self.publishers.contains(name)
    }

    pub(crate) fn into_parts(self) -> (T, DeferredPublishes) {
        (self.transaction, self.deferred)
    }
}

impl Tx<PgTransaction<'static>> {
    /// Connection to run queries on, e.g. `query.execute(tx.conn())`.
    pub fn conn(&mut self) -> &mut PgConnection {
        &mut self.transaction
    }
}

impl<T> Deref for Tx<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.transaction
    }
}

impl<T> DerefMut for Tx<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.transaction
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::LogPublisher;
    use serde_json::json;

    #[derive(Debug, Default, PartialEq)]
    struct Statements(Vec<String>);

    #[test]
    fn defer_publish_records_without_publishing() {
        let publishers = PublisherRegistry::new().register("test", LogPublisher::new("test"));
        let mut tx = Tx::new(Statements::default(), publishers);

        tx.defer_publish("test", "Message");
        tx.defer_publish("unknown", json!({"id": 7}));

        let entries: Vec<_> = tx.deferred().iter().cloned().collect();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].publisher, "test");
        assert_eq!(entries[0].message, json!("Message"));
        assert_eq!(entries[1].publisher, "unknown");
        assert!(tx.has_publisher("test"));
        assert!(!tx.has_publisher("unknown"));
    }

    #[test]
    fn transaction_stays_usable_through_the_handle() {
        let mut tx = Tx::new(Statements::default(), PublisherRegistry::new());
        tx.transaction().0.push("INSERT INTO test (val) VALUES (1)".into());
        tx.0.push("UPDATE test SET val = 2".into());

        let (statements, deferred) = tx.into_parts();
        assert_eq!(statements.0.len(), 2);
        assert!(deferred.is_empty());
    }
}
