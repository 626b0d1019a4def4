use chrono::{DateTime, Utc};
use schema::{Lead, LeadStatus};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The persisted projection of a [`Lead`].
///
/// Carries neither the verification token nor the honeypot value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadRecord {
    pub id: Uuid,
    /// Entry point that accepted the lead, e.g. `apply`.
    pub source: String,
    pub name: String,
    pub email: String,
    pub company: String,
    pub phone: String,
    pub detail: String,
    pub client_ip: String,
    pub user_agent: String,
    pub submitted_at: DateTime<Utc>,
    pub status: LeadStatus,
}

impl LeadRecord {
    pub fn from_lead(lead: &Lead, source: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            source: source.into(),
            name: lead.name.clone(),
            email: lead.email.clone(),
            company: lead.company.clone(),
            phone: lead.phone.clone(),
            detail: lead.detail.clone(),
            client_ip: lead.client_ip.clone(),
            user_agent: lead.user_agent.clone(),
            submitted_at: lead.submitted_at,
            status: lead.status,
        }
    }
}
