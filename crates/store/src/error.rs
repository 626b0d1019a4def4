use thiserror::Error;

/// Errors returned by lead storage backends.
///
/// None of these carry text meant for end users; the HTTP layer replies with
/// a generic code and the detail only reaches the logs.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum StoreError {
    /// No storage backend is configured for this process.
    #[error("lead storage is not configured")]
    NotConfigured,

    /// The backend failed (I/O, transaction, connection).
    #[error("storage backend error: {0}")]
    Backend(String),

    /// A remote store answered with a non-success status.
    #[error("storage rejected insert with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("failed to encode lead record: {0}")]
    Encode(String),
}

impl StoreError {
    pub fn backend(message: impl Into<String>) -> Self {
        StoreError::Backend(message.into())
    }
}
