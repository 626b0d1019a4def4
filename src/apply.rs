//! Application intake: the strict, stored entry point.
//!
//! Steps run in a fixed order and each one can end the request:
//!
//! 1. rate limit ([`ApplyPipeline::admit`])
//! 2. parse and validate one of the two application shapes
//! 3. honeypot (silent accept after a camouflage pause)
//! 4. bot verification, mandatory
//! 5. store one [`LeadRecord`]
//! 6. publish the canonical and the legacy event
use std::sync::Arc;

use dispatch::Dispatcher;
use guard::{
    honeypot_triggered, run_verification, BotVerifier, Camouflage, RateLimiter,
    VerificationPolicy, VerificationStep,
};
use schema::{parse_application, Lead, Receipt};
use store::{LeadRecord, LeadStore};
use tracing::{error, info, warn};

use crate::metrics::{record_rate_limit, Route, SubmissionSpan};
use crate::{IntakeError, IntakeOutcome};

/// Value of [`LeadRecord::source`] for applications.
pub const APPLY_SOURCE: &str = "apply";

pub struct ApplyPipeline {
    limiter: RateLimiter,
    verifier: Arc<dyn BotVerifier>,
    store: Arc<dyn LeadStore>,
    dispatcher: Dispatcher,
    camouflage: Camouflage,
}

impl ApplyPipeline {
    pub fn new(
        limiter: RateLimiter,
        verifier: Arc<dyn BotVerifier>,
        store: Arc<dyn LeadStore>,
        dispatcher: Dispatcher,
    ) -> Self {
        Self {
            limiter,
            verifier,
            store,
            dispatcher,
            camouflage: Camouflage::default(),
        }
    }

    pub fn with_camouflage(mut self, camouflage: Camouflage) -> Self {
        self.camouflage = camouflage;
        self
    }

    pub fn store(&self) -> &Arc<dyn LeadStore> {
        &self.store
    }

    pub fn verifier(&self) -> &Arc<dyn BotVerifier> {
        &self.verifier
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Rate-limit gate. Runs before the body is looked at.
    pub async fn admit(&self, receipt: &Receipt) -> Result<(), IntakeError> {
        let decision = self.limiter.check(&receipt.client_ip).await;
        record_rate_limit(Route::Apply, decision);
        if decision.is_denied() {
            info!(client_ip = %receipt.client_ip, "apply_rate_limited");
            SubmissionSpan::start(Route::Apply).finish("rate_limited");
            return Err(IntakeError::RateLimited);
        }
        Ok(())
    }

    /// Everything after the rate limit, for an admitted request.
    pub async fn submit(&self, body: &[u8], receipt: &Receipt) -> Result<IntakeOutcome, IntakeError> {
        let span = SubmissionSpan::start(Route::Apply);
        let result = self.run(body, receipt).await;
        span.finish(match &result {
            Ok(outcome) => outcome.as_str(),
            Err(err) => err.outcome(),
        });
        result
    }

    /// Count an admitted request whose body never made it to [`submit`](Self::submit).
    pub fn reject_unreadable(&self) {
        SubmissionSpan::start(Route::Apply).finish("unparseable");
    }

    /// [`admit`](Self::admit) followed by [`submit`](Self::submit).
    pub async fn process(&self, body: &[u8], receipt: &Receipt) -> Result<IntakeOutcome, IntakeError> {
        self.admit(receipt).await?;
        self.submit(body, receipt).await
    }

    async fn run(&self, body: &[u8], receipt: &Receipt) -> Result<IntakeOutcome, IntakeError> {
        let fields = parse_application(body).map_err(|err| {
            info!(code = err.code(), error = %err, "apply_rejected_by_schema");
            err
        })?;
        let shape = fields.shape;
        let lead = Lead::new(fields, receipt);

        if honeypot_triggered(&lead.honeypot) {
            info!(client_ip = %lead.client_ip, "apply_honeypot_triggered");
            self.camouflage.pause().await;
            return Ok(IntakeOutcome::SilentlyAccepted);
        }

        match run_verification(
            self.verifier.as_ref(),
            VerificationPolicy::Always,
            Some(&lead.verification_token),
            &lead.client_ip,
        )
        .await
        {
            VerificationStep::Verified | VerificationStep::Skipped => {}
            VerificationStep::TokenMissing => {
                warn!(client_ip = %lead.client_ip, "apply_token_missing");
                return Err(IntakeError::TokenMissing);
            }
            VerificationStep::Rejected { reason } => {
                warn!(client_ip = %lead.client_ip, reason = %reason, "apply_bot_detected");
                return Err(IntakeError::BotDetected { reason });
            }
        }

        let record = LeadRecord::from_lead(&lead, APPLY_SOURCE);
        self.store.insert(&record).await.map_err(|err| {
            error!(lead_id = %record.id, store = self.store.name(), error = %err, "lead_store_failed");
            err
        })?;
        info!(lead_id = %record.id, shape = ?shape, "lead_stored");

        self.dispatcher
            .dispatch_application(&record)
            .await
            .map_err(|err| {
                error!(lead_id = %record.id, error = %err, "lead_dispatch_failed");
                err
            })?;

        Ok(IntakeOutcome::Accepted {
            lead_id: record.id.to_string(),
        })
    }
}
