use crate::error::PublishError;
use crate::types::{EventPayload, PublishReceipt};
use async_trait::async_trait;

pub mod eventbridge;
pub use eventbridge::EventBridgePublisher;

/// Event bus that receives exporter change records.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Looks up the identity of the bus called `name`.  Called once at
    /// startup; [`PublishError::BusNotFound`] is fatal there.
    async fn resolve_event_bus(&self, name: &str) -> Result<String, PublishError>;

    /// Publishes a single event.  A receipt without an event id means
    /// the bus rejected it.
    async fn publish_event(
        &self,
        bus: &str,
        event_name: &str,
        payload: &EventPayload,
    ) -> Result<PublishReceipt, PublishError>;
}
