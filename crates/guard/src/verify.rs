//! Server-side verification of challenge-response tokens.
//!
//! Verification fails closed: a failed check, a transport error and a
//! non-success HTTP status all reject the submission. Whether a missing
//! secret skips the step or rejects is chosen per route through
//! [`VerificationPolicy`].

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::warn;

use crate::{VerifyError, UNKNOWN_CLIENT};

/// Cloudflare Turnstile siteverify endpoint.
pub const TURNSTILE_VERIFY_URL: &str =
    "https://challenges.cloudflare.com/turnstile/v0/siteverify";

/// What the verification service said about a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationOutcome {
    Passed,
    Failed { error_codes: Vec<String> },
}

/// Client of a challenge verification service.
#[async_trait]
pub trait BotVerifier: Send + Sync {
    /// Whether a server-side secret is available.
    fn is_configured(&self) -> bool;

    /// Verify `token`, passing the client address when one is known.
    async fn verify(
        &self,
        token: &str,
        remote_ip: Option<&str>,
    ) -> Result<VerificationOutcome, VerifyError>;
}

/// Cloudflare Turnstile verifier.
pub struct TurnstileVerifier {
    client: reqwest::Client,
    secret: Option<String>,
    endpoint: String,
}

impl TurnstileVerifier {
    pub fn new(client: reqwest::Client, secret: Option<String>) -> Self {
        Self::with_endpoint(client, secret, TURNSTILE_VERIFY_URL)
    }

    pub fn with_endpoint(
        client: reqwest::Client,
        secret: Option<String>,
        endpoint: impl Into<String>,
    ) -> Self {
        Self {
            client,
            secret: secret.filter(|s| !s.trim().is_empty()),
            endpoint: endpoint.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SiteverifyResponse {
    success: bool,
    #[serde(default, rename = "error-codes")]
    error_codes: Vec<String>,
}

#[async_trait]
impl BotVerifier for TurnstileVerifier {
    fn is_configured(&self) -> bool {
        self.secret.is_some()
    }

    async fn verify(
        &self,
        token: &str,
        remote_ip: Option<&str>,
    ) -> Result<VerificationOutcome, VerifyError> {
        let secret = self.secret.as_deref().ok_or(VerifyError::NotConfigured)?;

        let mut form = vec![("secret", secret), ("response", token)];
        if let Some(ip) = remote_ip {
            form.push(("remoteip", ip));
        }

        let response = self
            .client
            .post(&self.endpoint)
            .form(&form)
            .send()
            .await
            .map_err(|e| VerifyError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(VerifyError::Status(response.status().as_u16()));
        }

        let body: SiteverifyResponse = response
            .json()
            .await
            .map_err(|e| VerifyError::Decode(e.to_string()))?;

        Ok(if body.success {
            VerificationOutcome::Passed
        } else {
            VerificationOutcome::Failed {
                error_codes: body.error_codes,
            }
        })
    }
}

/// A verifier with a fixed answer that records the tokens it saw.
///
/// Used by tests and by local setups that need the route to behave as if
/// verification were configured.
#[derive(Debug)]
pub struct StaticVerifier {
    configured: bool,
    outcome: Result<VerificationOutcome, VerifyError>,
    calls: AtomicUsize,
    tokens: Mutex<Vec<String>>,
}

impl StaticVerifier {
    pub fn passing() -> Self {
        Self::new(true, Ok(VerificationOutcome::Passed))
    }

    pub fn failing() -> Self {
        Self::new(
            true,
            Ok(VerificationOutcome::Failed {
                error_codes: vec!["invalid-input-response".into()],
            }),
        )
    }

    pub fn erroring(err: VerifyError) -> Self {
        Self::new(true, Err(err))
    }

    pub fn unconfigured() -> Self {
        Self::new(false, Err(VerifyError::NotConfigured))
    }

    fn new(configured: bool, outcome: Result<VerificationOutcome, VerifyError>) -> Self {
        Self {
            configured,
            outcome,
            calls: AtomicUsize::new(0),
            tokens: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn tokens(&self) -> Vec<String> {
        self.tokens
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait]
impl BotVerifier for StaticVerifier {
    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn verify(
        &self,
        token: &str,
        _remote_ip: Option<&str>,
    ) -> Result<VerificationOutcome, VerifyError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.tokens
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(token.to_string());
        self.outcome.clone()
    }
}

/// How a route treats a verifier without a secret.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationPolicy {
    /// Verification is mandatory; no secret means every submission fails.
    Always,
    /// Verification runs only when a secret is configured; otherwise the
    /// step is skipped with a warning (local development).
    IfConfigured,
}

/// Result of the verification step of a pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationStep {
    Verified,
    Skipped,
    TokenMissing,
    Rejected { reason: String },
}

impl VerificationStep {
    pub fn is_accepted(&self) -> bool {
        matches!(self, VerificationStep::Verified | VerificationStep::Skipped)
    }
}

/// Run the verification step for one submission under `policy`.
///
/// `client_ip` equal to [`UNKNOWN_CLIENT`] is not forwarded to the service.
pub async fn run_verification(
    verifier: &dyn BotVerifier,
    policy: VerificationPolicy,
    token: Option<&str>,
    client_ip: &str,
) -> VerificationStep {
    if !verifier.is_configured() {
        match policy {
            VerificationPolicy::IfConfigured => {
                warn!("verification_secret_missing_skipping_check");
                return VerificationStep::Skipped;
            }
            VerificationPolicy::Always => {
                warn!("verification_secret_missing_rejecting");
                return VerificationStep::Rejected {
                    reason: "missing-input-secret".into(),
                };
            }
        }
    }

    let token = match token.map(str::trim).filter(|t| !t.is_empty()) {
        Some(token) => token,
        None => return VerificationStep::TokenMissing,
    };

    let remote_ip = (client_ip != UNKNOWN_CLIENT).then_some(client_ip);
    match verifier.verify(token, remote_ip).await {
        Ok(VerificationOutcome::Passed) => VerificationStep::Verified,
        Ok(VerificationOutcome::Failed { error_codes }) => VerificationStep::Rejected {
            reason: error_codes.join(","),
        },
        Err(err) => {
            warn!(error = %err, "verification_request_failed");
            VerificationStep::Rejected {
                reason: err.to_string(),
            }
        }
    }
}
