//! Named message sinks that receive deferred messages once a transaction commits.

use std::{collections::HashMap, fmt, sync::Arc};

use anyhow::anyhow;
use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;

/// A sink capable of accepting one message at a time.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessagePublisher: Send + Sync {
    async fn publish(&self, message: Value) -> anyhow::Result<()>;
}

/// Publishers by name. Built at startup, shared read-only between requests.
#[derive(Clone, Default)]
pub struct PublisherRegistry {
    publishers: Arc<HashMap<String, Arc<dyn MessagePublisher>>>,
}

impl PublisherRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(self, name: impl Into<String>, publisher: impl MessagePublisher + 'static) -> Self {
        self.register_shared(name, Arc::new(publisher))
    }

    pub fn register_shared(mut self, name: impl Into<String>, publisher: Arc<dyn MessagePublisher>) -> Self {
        Arc::make_mut(&mut self.publishers).insert(name.into(), publisher);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn MessagePublisher>> {
        self.publishers.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.publishers.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.publishers.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.publishers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.publishers.is_empty()
    }
}

impl fmt::Debug for PublisherRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.names().collect();
        names.sort_unstable();
        f.debug_struct("PublisherRegistry")
            .field("publishers", &names)
            .finish()
    }
}

/// Writes every message to the log.
#[derive(Debug, Clone)]
pub struct LogPublisher {
    topic: String,
}

impl LogPublisher {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
        }
    }
}

#[async_trait]
impl MessagePublisher for LogPublisher {
    async fn publish(&self, message: Value) -> anyhow::Result<()> {
        tracing::info!(topic = %self.topic, payload = %message, "Published message");
        Ok(())
    }
}

/// Forwards messages to an in-process consumer.
#[derive(Debug, Clone)]
pub struct ChannelPublisher {
    sender: mpsc::UnboundedSender<Value>,
}

impl ChannelPublisher {
    pub fn new(sender: mpsc::UnboundedSender<Value>) -> Self {
        Self { sender }
    }

    /// Creates a publisher together with the receiving end of its channel.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Value>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self::new(sender), receiver)
    }
}

#[async_trait]
impl MessagePublisher for ChannelPublisher {
    async fn publish(&self, message: Value) -> anyhow::Result<()> {
        self.sender
            .send(message)
            .map_err(|_| anyhow!("message channel receiver dropped"))
    }
}
