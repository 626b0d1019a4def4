use std::sync::Mutex;

use async_trait::async_trait;
use tracing::debug;

use crate::{DispatchError, EventEnvelope};

/// Default event-bus ingestion host.
pub const DEFAULT_EVENT_BUS_URL: &str = "https://inn.gs";

/// One-way publish into the event bus.
///
/// Retries and back-off belong to the bus and its consumers; a publisher
/// makes exactly one attempt per call.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, event: &EventEnvelope) -> Result<(), DispatchError>;

    fn name(&self) -> &'static str;

    fn is_configured(&self) -> bool {
        true
    }
}

/// Publishes to an HTTP event-ingestion endpoint (`<base>/e/<event key>`).
pub struct HttpEventPublisher {
    client: reqwest::Client,
    base_url: String,
    event_key: Option<String>,
}

impl HttpEventPublisher {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>, event_key: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            event_key: event_key.filter(|k| !k.trim().is_empty()),
        }
    }

    fn endpoint(&self, key: &str) -> String {
        format!("{}/e/{}", self.base_url, key)
    }
}

#[async_trait]
impl EventPublisher for HttpEventPublisher {
    async fn publish(&self, event: &EventEnvelope) -> Result<(), DispatchError> {
        let key = self
            .event_key
            .as_deref()
            .ok_or(DispatchError::NotConfigured)?;

        let response = self
            .client
            .post(self.endpoint(key))
            .json(event)
            .send()
            .await
            .map_err(|e| DispatchError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DispatchError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        debug!(event = %event.name, event_id = %event.id, "event_published");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "http"
    }

    fn is_configured(&self) -> bool {
        self.event_key.is_some()
    }
}

/// Records every published event in memory.
#[derive(Debug, Default)]
pub struct MemoryPublisher {
    events: Mutex<Vec<EventEnvelope>>,
}

impl MemoryPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Published events in publish order. One entry per `publish` call.
    pub fn events(&self) -> Vec<EventEnvelope> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn calls(&self) -> usize {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }
}

#[async_trait]
impl EventPublisher for MemoryPublisher {
    async fn publish(&self, event: &EventEnvelope) -> Result<(), DispatchError> {
        self.events
            .lock()
            .map_err(|_| DispatchError::Transport("publisher lock poisoned".into()))?
            .push(event.clone());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
