//! Contact intake: the loose, attribution-rich entry point.
//!
//! Same step order as applications, minus storage: contact submissions are
//! published as a single `lead/created` event and nothing is written here.
use std::sync::Arc;

use dispatch::Dispatcher;
use guard::{
    honeypot_triggered, run_verification, BotVerifier, Camouflage, RateLimiter,
    VerificationPolicy, VerificationStep,
};
use schema::{parse_contact, FormFields, Receipt};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::metrics::{record_rate_limit, Route, SubmissionSpan};
use crate::{IntakeError, IntakeOutcome};

pub struct ContactPipeline {
    limiter: RateLimiter,
    verifier: Arc<dyn BotVerifier>,
    dispatcher: Dispatcher,
    camouflage: Camouflage,
}

impl ContactPipeline {
    pub fn new(limiter: RateLimiter, verifier: Arc<dyn BotVerifier>, dispatcher: Dispatcher) -> Self {
        Self {
            limiter,
            verifier,
            dispatcher,
            camouflage: Camouflage::default(),
        }
    }

    pub fn with_camouflage(mut self, camouflage: Camouflage) -> Self {
        self.camouflage = camouflage;
        self
    }

    pub fn verifier(&self) -> &Arc<dyn BotVerifier> {
        &self.verifier
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub async fn admit(&self, receipt: &Receipt) -> Result<(), IntakeError> {
        let decision = self.limiter.check(&receipt.client_ip).await;
        record_rate_limit(Route::Contact, decision);
        if decision.is_denied() {
            info!(client_ip = %receipt.client_ip, "contact_rate_limited");
            SubmissionSpan::start(Route::Contact).finish("rate_limited");
            return Err(IntakeError::RateLimited);
        }
        Ok(())
    }

    pub async fn submit(
        &self,
        fields: &FormFields,
        receipt: &Receipt,
    ) -> Result<IntakeOutcome, IntakeError> {
        let span = SubmissionSpan::start(Route::Contact);
        let result = self.run(fields, receipt).await;
        span.finish(match &result {
            Ok(outcome) => outcome.as_str(),
            Err(err) => err.outcome(),
        });
        result
    }

    /// Count an admitted request whose fields could not be decoded.
    pub fn reject_unreadable(&self) {
        SubmissionSpan::start(Route::Contact).finish("unparseable");
    }

    pub async fn process(
        &self,
        fields: &FormFields,
        receipt: &Receipt,
    ) -> Result<IntakeOutcome, IntakeError> {
        self.admit(receipt).await?;
        self.submit(fields, receipt).await
    }

    async fn run(&self, fields: &FormFields, receipt: &Receipt) -> Result<IntakeOutcome, IntakeError> {
        let submission = parse_contact(fields).map_err(|err| {
            info!(code = err.code(), error = %err, "contact_rejected_by_schema");
            err
        })?;

        if honeypot_triggered(&submission.honeypot) {
            info!(client_ip = %receipt.client_ip, "contact_honeypot_triggered");
            self.camouflage.pause().await;
            return Ok(IntakeOutcome::SilentlyAccepted);
        }

        match run_verification(
            self.verifier.as_ref(),
            VerificationPolicy::IfConfigured,
            submission.verification_token.as_deref(),
            &receipt.client_ip,
        )
        .await
        {
            VerificationStep::Verified | VerificationStep::Skipped => {}
            VerificationStep::TokenMissing => {
                warn!(client_ip = %receipt.client_ip, "contact_token_missing");
                return Err(IntakeError::TokenMissing);
            }
            VerificationStep::Rejected { reason } => {
                warn!(client_ip = %receipt.client_ip, reason = %reason, "contact_bot_detected");
                return Err(IntakeError::BotDetected { reason });
            }
        }

        let lead_id = Uuid::new_v4().to_string();
        self.dispatcher
            .dispatch_contact(&lead_id, &submission, receipt)
            .await
            .map_err(|err| {
                error!(lead_id = %lead_id, error = %err, "contact_dispatch_failed");
                err
            })?;
        info!(lead_id = %lead_id, fields = fields.len(), "contact_accepted");

        Ok(IntakeOutcome::Accepted { lead_id })
    }
}
