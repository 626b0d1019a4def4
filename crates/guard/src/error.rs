use thiserror::Error;

/// Failures of a rate-limit backend. The limiter never surfaces these to
/// callers: it logs them and lets the request through.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RateLimitError {
    #[error("rate limit backend unreachable: {0}")]
    Transport(String),

    #[error("rate limit backend returned an error: {0}")]
    Backend(String),
}

/// Failures while talking to the challenge verification service.
///
/// Every variant is treated as a failed verification by the pipeline.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerifyError {
    #[error("verification secret is not configured")]
    NotConfigured,

    #[error("verification request failed: {0}")]
    Transport(String),

    #[error("verification service answered with status {0}")]
    Status(u16),

    #[error("verification response could not be decoded: {0}")]
    Decode(String),
}
