use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::application::ApplicationFields;

/// Lifecycle flag of a lead. New leads always start as `Received`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadStatus {
    #[default]
    Received,
}

impl LeadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeadStatus::Received => "received",
        }
    }
}

/// Request facts captured when a submission arrives.
///
/// `client_ip` is best-effort (forwarded headers are not authenticated) and
/// only feeds rate limiting, verification and diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub client_ip: String,
    pub user_agent: String,
    pub submitted_at: DateTime<Utc>,
}

impl Receipt {
    pub fn new(client_ip: impl Into<String>, user_agent: impl Into<String>) -> Self {
        Self {
            client_ip: client_ip.into(),
            user_agent: user_agent.into(),
            submitted_at: Utc::now(),
        }
    }
}

/// The canonical submission record.
///
/// A `Lead` only exists once every required field validated; it is built
/// once per request and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lead {
    pub name: String,
    /// Trimmed and lowercased.
    pub email: String,
    pub company: String,
    pub phone: String,
    pub detail: String,
    /// Consumed by bot verification; never persisted.
    pub verification_token: String,
    pub honeypot: String,
    pub client_ip: String,
    pub user_agent: String,
    pub submitted_at: DateTime<Utc>,
    pub status: LeadStatus,
}

impl Lead {
    pub fn new(fields: ApplicationFields, receipt: &Receipt) -> Self {
        Self {
            name: fields.name,
            email: fields.email,
            company: fields.company,
            phone: fields.phone,
            detail: fields.detail,
            verification_token: fields.verification_token,
            honeypot: fields.honeypot,
            client_ip: receipt.client_ip.clone(),
            user_agent: receipt.user_agent.clone(),
            submitted_at: receipt.submitted_at,
            status: LeadStatus::Received,
        }
    }
}
