use super::EventPublisher;
use crate::error::PublishError;
use crate::types::{EventPayload, PublishReceipt};
use async_trait::async_trait;
use aws_sdk_eventbridge::error::DisplayErrorContext;
use aws_sdk_eventbridge::primitives::DateTime;
use aws_sdk_eventbridge::types::{EventBus, PutEventsRequestEntry, PutEventsResultEntry};
use aws_sdk_eventbridge::Client;
use log::{debug, error, info};
use std::time::SystemTime;

pub struct EventBridgePublisher {
    client: Client,
    source: String,
    detail_type: String,
}

impl EventBridgePublisher {
    pub fn new(sdk_config: &aws_config::SdkConfig, source: String, detail_type: String) -> Self {
        Self {
            client: Client::new(sdk_config),
            source,
            detail_type,
        }
    }

    fn entry(&self, bus: &str, detail: String) -> PutEventsRequestEntry {
        PutEventsRequestEntry::builder()
            .time(DateTime::from(SystemTime::now()))
            .source(&self.source)
            .detail_type(&self.detail_type)
            .detail(detail)
            .event_bus_name(bus)
            .build()
    }
}

#[async_trait]
impl EventPublisher for EventBridgePublisher {
    async fn resolve_event_bus(&self, name: &str) -> Result<String, PublishError> {
        let mut next_token: Option<String> = None;

        loop {
            let page = self
                .client
                .list_event_buses()
                .name_prefix(name)
                .set_next_token(next_token.take())
                .send()
                .await
                .map_err(|e| PublishError::Transport(DisplayErrorContext(&e).to_string()))?;

            if let Some(arn) = bus_arn(page.event_buses(), name) {
                info!("Found the event bus {}", arn);
                return Ok(arn.to_string());
            }

            match page.next_token() {
                Some(token) => next_token = Some(token.to_string()),
                None => break,
            }
        }

        Err(PublishError::BusNotFound(name.to_string()))
    }

    async fn publish_event(
        &self,
        bus: &str,
        event_name: &str,
        payload: &EventPayload,
    ) -> Result<PublishReceipt, PublishError> {
        let detail = serde_json::to_string(payload)?;
        debug!("Sending event {} on bus {}: {}", event_name, bus, detail);

        let out = self
            .client
            .put_events()
            .entries(self.entry(bus, detail))
            .send()
            .await
            .map_err(|e| PublishError::Transport(DisplayErrorContext(&e).to_string()))?;

        Ok(receipt(event_name, out.entries().first()))
    }
}

/// ARN of the bus named exactly `name`.  The listing is filtered by
/// prefix, so longer names sharing it are skipped.
fn bus_arn<'a>(buses: &'a [EventBus], name: &str) -> Option<&'a str> {
    buses
        .iter()
        .find(|bus| bus.name() == Some(name))
        .and_then(|bus| bus.arn())
}

fn receipt(event_name: &str, entry: Option<&PutEventsResultEntry>) -> PublishReceipt {
    let event_id = entry.and_then(|e| e.event_id()).map(str::to_string);
    match (&event_id, entry) {
        (Some(id), _) => info!("Event {} created for {}", id, event_name),
        (None, Some(e)) => error!(
            "Event for {} rejected: {} {}",
            event_name,
            e.error_code().unwrap_or("<no code>"),
            e.error_message().unwrap_or_default()
        ),
        (None, None) => error!("Event bus returned no result entry for {}", event_name),
    }
    PublishReceipt { event_id }
}
