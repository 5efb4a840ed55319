//! Messages waiting for their transaction to commit.

use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use serde_json::Value;

use super::publisher::PublisherRegistry;
use crate::handlers::response::panic_message;

/// One message registered against a transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct DeferredMessage {
    pub publisher: String,
    pub message: Value,
}

/// Ordered registry of messages to publish once the owning transaction commits.
///
/// Appending requires `&mut self`; tasks sharing one registry must synchronise externally.
/// Draining consumes the registry, so it happens at most once.
#[derive(Debug, Default)]
pub struct DeferredPublishes {
    entries: Vec<DeferredMessage>,
}

/// Outcome of draining a registry.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PublishReport {
    pub published: usize,
    pub failed: usize,
}

impl DeferredPublishes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, publisher: impl Into<String>, message: Value) {
        self.entries.push(DeferredMessage {
            publisher: publisher.into(),
            message,
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DeferredMessage> {
        self.entries.iter()
    }

    /// Hands every entry to its publisher in registration order.
    ///
    /// Must only be called once the owning transaction has committed. Failures, including names
    /// with no registered publisher and publishers that panic, are logged and do not stop the
    /// remaining entries.
    pub(crate) async fn publish_all(self, publishers: &PublisherRegistry) -> PublishReport {
        let mut report = PublishReport::default();

        for DeferredMessage { publisher, message } in self.entries {
            let Some(sink) = publishers.get(&publisher) else {
                tracing::error!(publisher = %publisher, "No publisher registered, message dropped");
                report.failed += 1;
                continue;
            };

            let outcome = AssertUnwindSafe(async { sink.publish(message).await })
                .catch_unwind()
                .await;
            match outcome {
                Ok(Ok(())) => report.published += 1,
                Ok(Err(err)) => {
                    tracing::error!(publisher = %publisher, error = ?err, "Failed to publish message");
                    report.failed += 1;
                }
                Err(payload) => {
                    tracing::error!(
                        publisher = %publisher,
                        panic = panic_message(payload.as_ref()),
                        "Publisher panicked, message dropped"
                    );
                    report.failed += 1;
                }
            }
        }

        report
    }

    /// Drops every entry unpublished. Returns how many were discarded.
    pub(crate) fn discard(self) -> usize {
        let discarded = self.entries.len();
        if discarded > 0 {
            tracing::debug!(discarded, "Discarding deferred messages after rollback");
        }
        discarded
    }
}
