use dispatch::DispatchError;
use schema::SchemaError;
use store::StoreError;
use thiserror::Error;

/// Every way a submission can be refused by an intake pipeline.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum IntakeError {
    #[error("too many submissions from this client")]
    RateLimited,

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("bot verification failed: {reason}")]
    BotDetected { reason: String },

    #[error("verification token missing")]
    TokenMissing,

    #[error("lead storage failed: {0}")]
    Storage(#[from] StoreError),

    #[error("event dispatch failed: {0}")]
    Dispatch(#[from] DispatchError),
}

impl IntakeError {
    /// Short label used for metrics and logs.
    pub fn outcome(&self) -> &'static str {
        match self {
            IntakeError::RateLimited => "rate_limited",
            IntakeError::Schema(err) if err.is_unparseable() => "unparseable",
            IntakeError::Schema(_) => "invalid",
            IntakeError::BotDetected { .. } => "bot_detected",
            IntakeError::TokenMissing => "token_missing",
            IntakeError::Storage(_) => "storage_error",
            IntakeError::Dispatch(_) => "dispatch_error",
        }
    }
}
