//! Event names and payloads published for accepted leads.
use chrono::{DateTime, Utc};
use schema::{ContactSubmission, Receipt};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use store::LeadRecord;

/// Canonical event, consumed by the notification worker.
pub const LEAD_CREATED: &str = "lead/created";

/// Payload-compatible event still published for an older consumer.
pub const LEGACY_CONTACT_SUBMITTED: &str = "contact/form.submitted";

/// Data carried by every lead event.
///
/// The message body is written under both `message` and `detail`; contact
/// submissions add their attribution keys at the top level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadEventData {
    pub lead_id: String,
    pub source: String,
    pub name: String,
    pub email: String,
    pub message: String,
    pub detail: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub client_ip: String,
    #[serde(default)]
    pub user_agent: String,
    pub submitted_at: DateTime<Utc>,
    #[serde(flatten, default, skip_serializing_if = "Map::is_empty")]
    pub attribution: Map<String, Value>,
}

impl LeadEventData {
    pub fn from_record(record: &LeadRecord) -> Self {
        Self {
            lead_id: record.id.to_string(),
            source: record.source.clone(),
            name: record.name.clone(),
            email: record.email.clone(),
            message: record.detail.clone(),
            detail: record.detail.clone(),
            company: record.company.clone(),
            phone: record.phone.clone(),
            client_ip: record.client_ip.clone(),
            user_agent: record.user_agent.clone(),
            submitted_at: record.submitted_at,
            attribution: Map::new(),
        }
    }

    pub fn from_contact(
        lead_id: impl Into<String>,
        submission: &ContactSubmission,
        receipt: &Receipt,
    ) -> Self {
        Self {
            lead_id: lead_id.into(),
            source: "contact".to_string(),
            name: submission.name.clone(),
            email: submission.email.clone(),
            message: submission.message.clone(),
            detail: submission.message.clone(),
            company: submission.company.clone(),
            phone: submission.phone.clone(),
            client_ip: receipt.client_ip.clone(),
            user_agent: receipt.user_agent.clone(),
            submitted_at: receipt.submitted_at,
            attribution: submission.attribution.to_payload(),
        }
    }
}

/// One event as sent to the bus.
///
/// `id` is `<lead id>:<event name>` so the bus can drop duplicates of the
/// same event for the same lead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub name: String,
    pub id: String,
    /// Milliseconds since the Unix epoch.
    pub ts: i64,
    pub data: LeadEventData,
}

impl EventEnvelope {
    pub fn new(name: &str, data: LeadEventData) -> Self {
        Self {
            name: name.to_string(),
            id: format!("{}:{}", data.lead_id, name),
            ts: data.submitted_at.timestamp_millis(),
            data,
        }
    }

    pub fn is_lead_created(&self) -> bool {
        self.name == LEAD_CREATED
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use schema::{parse_contact, FormFields};
    use serde_json::json;

    #[test]
    fn contact_payload_flattens_attribution_with_both_spellings() {
        let fields = FormFields::from_json_bytes(
            &serde_json::to_vec(&json!({
                "name": "Taro",
                "email": "taro@example.com",
                "message": "Please contact me about pricing",
                "utm_campaign": "spring",
                "assets": "design,copy,seo"
            }))
            .unwrap(),
        )
        .unwrap();
        let submission = parse_contact(&fields).unwrap();
        let receipt = Receipt::new("203.0.113.7", "test-agent");
        let data = LeadEventData::from_contact("lead-1", &submission, &receipt);

        let json = serde_json::to_value(EventEnvelope::new(LEAD_CREATED, data)).unwrap();
        assert_eq!(json["name"], "lead/created");
        assert_eq!(json["id"], "lead-1:lead/created");
        assert_eq!(json["data"]["message"], "Please contact me about pricing");
        assert_eq!(json["data"]["detail"], "Please contact me about pricing");
        assert_eq!(json["data"]["clientIp"], "203.0.113.7");
        assert_eq!(json["data"]["utm_campaign"], "spring");
        assert_eq!(json["data"]["utmCampaign"], "spring");
        assert_eq!(json["data"]["assets"], json!(["design", "copy", "seo"]));
    }

    #[test]
    fn envelope_survives_serde() {
        let data = LeadEventData {
            lead_id: "abc".into(),
            source: "apply".into(),
            name: "Taro".into(),
            email: "taro@example.com".into(),
            message: "hello there friend".into(),
            detail: "hello there friend".into(),
            company: String::new(),
            phone: String::new(),
            client_ip: "unknown".into(),
            user_agent: String::new(),
            submitted_at: Utc::now(),
            attribution: Map::new(),
        };
        let envelope = EventEnvelope::new(LEGACY_CONTACT_SUBMITTED, data);
        let text = serde_json::to_string(&envelope).unwrap();
        let back: EventEnvelope = serde_json::from_str(&text).unwrap();
        assert_eq!(back.name, LEGACY_CONTACT_SUBMITTED);
        assert!(!back.is_lead_created());
        assert!(back.data.attribution.is_empty());
    }
}
