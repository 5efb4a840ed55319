pub mod deferred_publish;
pub mod publisher;

pub use deferred_publish::{DeferredMessage, DeferredPublishes, PublishReport};
pub use publisher::{ChannelPublisher, LogPublisher, MessagePublisher, PublisherRegistry};
