//! Event dispatch for accepted leads.
//!
//! Email delivery is decoupled from the HTTP request: once a lead is
//! accepted the handler publishes events and returns. The [`Dispatcher`]
//! knows which events each entry point emits; an [`EventPublisher`] knows how
//! to get one event onto the bus.
//!
//! | Entry point | Events |
//! |-------------|--------|
//! | apply | [`LEAD_CREATED`], then [`LEGACY_CONTACT_SUBMITTED`] |
//! | contact | [`LEAD_CREATED`] |

mod events;
mod publisher;

use std::sync::Arc;

use schema::{ContactSubmission, Receipt};
use store::LeadRecord;
use thiserror::Error;
use tracing::info;

pub use crate::events::{EventEnvelope, LeadEventData, LEAD_CREATED, LEGACY_CONTACT_SUBMITTED};
pub use crate::publisher::{
    EventPublisher, HttpEventPublisher, MemoryPublisher, DEFAULT_EVENT_BUS_URL,
};

/// Errors raised by the publish call itself.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DispatchError {
    #[error("event bus is not configured")]
    NotConfigured,

    #[error("event publish failed: {0}")]
    Transport(String),

    #[error("event bus rejected publish with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// Builds and publishes the events of each entry point.
#[derive(Clone)]
pub struct Dispatcher {
    publisher: Arc<dyn EventPublisher>,
}

impl Dispatcher {
    pub fn new(publisher: Arc<dyn EventPublisher>) -> Self {
        Self { publisher }
    }

    pub fn publisher(&self) -> &Arc<dyn EventPublisher> {
        &self.publisher
    }

    /// Publish the canonical and the legacy event for a stored application.
    ///
    /// Stops at the first failure; the canonical event goes first.
    pub async fn dispatch_application(&self, record: &LeadRecord) -> Result<(), DispatchError> {
        let data = LeadEventData::from_record(record);
        for name in [LEAD_CREATED, LEGACY_CONTACT_SUBMITTED] {
            self.publish(EventEnvelope::new(name, data.clone())).await?;
        }
        Ok(())
    }

    /// Publish the canonical event for a contact submission.
    pub async fn dispatch_contact(
        &self,
        lead_id: &str,
        submission: &ContactSubmission,
        receipt: &Receipt,
    ) -> Result<(), DispatchError> {
        let data = LeadEventData::from_contact(lead_id, submission, receipt);
        self.publish(EventEnvelope::new(LEAD_CREATED, data)).await
    }

    async fn publish(&self, envelope: EventEnvelope) -> Result<(), DispatchError> {
        self.publisher.publish(&envelope).await?;
        info!(
            event = %envelope.name,
            lead_id = %envelope.data.lead_id,
            publisher = self.publisher.name(),
            "lead_event_dispatched"
        );
        Ok(())
    }
}
