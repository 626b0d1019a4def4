//! Workspace umbrella crate for the lead intake service.
//!
//! This crate stitches the stage crates into the two submission pipelines:
//!
//! | Pipeline | Body | Verification | Storage | Events |
//! |----------|------|--------------|---------|--------|
//! | [`ApplyPipeline`] | strict JSON, two accepted shapes | always | one [`LeadRecord`] | canonical + legacy |
//! | [`ContactPipeline`] | JSON, urlencoded or multipart | if configured | none | canonical |
//!
//! Both pipelines split into `admit` (rate limit, before the body is read)
//! and `submit` (everything else), so the HTTP layer can keep rate limiting
//! ahead of body parsing for every content type.

mod apply;
mod contact;
mod error;
mod metrics;

pub use dispatch::{
    Dispatcher, EventEnvelope, EventPublisher, HttpEventPublisher, LeadEventData, MemoryPublisher,
    LEAD_CREATED, LEGACY_CONTACT_SUBMITTED,
};
pub use guard::{
    client_ip, BotVerifier, Camouflage, InMemoryRateLimitBackend, RateLimitBackend,
    RateLimitDecision, RateLimitPolicy, RateLimiter, RestRateLimitBackend, StaticVerifier,
    TurnstileVerifier,
};
pub use schema::{FormFields, Receipt, SchemaError};
pub use store::{InMemoryLeadStore, LeadRecord, LeadStore, StoreBackendConfig, StoreError};

pub use crate::apply::{ApplyPipeline, APPLY_SOURCE};
pub use crate::contact::ContactPipeline;
pub use crate::error::IntakeError;
pub use crate::metrics::{set_intake_metrics, IntakeMetrics, Route};

/// Successful end of a pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntakeOutcome {
    /// Verified and handed on. `lead_id` is the stored record id for
    /// applications and a fresh id for contact submissions.
    Accepted { lead_id: String },
    /// Honeypot tripped. The caller sees the same success response.
    SilentlyAccepted,
}

impl IntakeOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            IntakeOutcome::Accepted { .. } => "accepted",
            IntakeOutcome::SilentlyAccepted => "honeypot",
        }
    }
}
