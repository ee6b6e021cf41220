use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use sitestock_core::{DomainEvent, EventEnvelope, EventStore};
use tokio::sync::RwLock;

/// Movement journal kept in process memory, one stream per item.
#[derive(Default)]
pub struct InMemoryEventStore {
    streams: RwLock<HashMap<String, Vec<EventEnvelope>>>,
    sequence: RwLock<i64>,
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn append(&self, stream_id: &str, event: DomainEvent) -> anyhow::Result<EventEnvelope> {
        let mut sequence_guard = self.sequence.write().await;
        *sequence_guard += 1;

        let envelope = EventEnvelope {
            sequence: *sequence_guard,
            stream_id: stream_id.to_string(),
            event,
            stored_at: Utc::now(),
        };

        let mut streams = self.streams.write().await;
        streams
            .entry(stream_id.to_string())
            .or_default()
            .push(envelope.clone());

        Ok(envelope)
    }

    async fn stream(&self, stream_id: &str) -> anyhow::Result<Vec<EventEnvelope>> {
        let streams = self.streams.read().await;
        Ok(streams.get(stream_id).cloned().unwrap_or_default())
    }
}
