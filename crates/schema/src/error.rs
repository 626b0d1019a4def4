//! Error types produced by the schema crate.
//!
//! Parsing and validation failures are typed so the HTTP layer can pick the
//! status code and the machine-readable code of each entry point without
//! string matching.
//!
//! | Error | Meaning |
//! |-------|---------|
//! | [`InvalidJson`](SchemaError::InvalidJson) | Body could not be decoded at all |
//! | [`Invalid`](SchemaError::Invalid) | Body decoded but matched none of the accepted shapes |
//! | [`MissingFields`](SchemaError::MissingFields) | Loosely-typed body lacks required fields |
use thiserror::Error;

/// Errors that can occur while turning a request body into a canonical record.
///
/// # Examples
///
/// ```rust
/// use schema::SchemaError;
///
/// let err = SchemaError::MissingFields(vec!["name", "email"]);
/// assert_eq!(err.to_string(), "missing or invalid fields: name, email");
/// assert_eq!(err.code(), "missing_fields");
/// ```
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SchemaError {
    /// The body is not decodable (malformed JSON, non-object top level,
    /// broken form encoding).
    #[error("unparseable body: {0}")]
    InvalidJson(String),

    /// The body decoded but neither accepted application shape validated.
    #[error("body matches no accepted submission shape")]
    Invalid,

    /// Required fields are absent or malformed. Field names are listed in
    /// the order they were checked.
    #[error("missing or invalid fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),
}

impl SchemaError {
    /// Stable machine-readable code for logs and metrics.
    pub fn code(&self) -> &'static str {
        match self {
            SchemaError::InvalidJson(_) => "invalid_json",
            SchemaError::Invalid => "invalid",
            SchemaError::MissingFields(_) => "missing_fields",
        }
    }

    /// Returns true when the body could not be decoded at all.
    pub fn is_unparseable(&self) -> bool {
        matches!(self, SchemaError::InvalidJson(_))
    }
}
