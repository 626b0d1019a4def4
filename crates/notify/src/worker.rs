use std::sync::Arc;

use dispatch::EventEnvelope;
use serde::Serialize;
use tracing::{info, warn};

use crate::{compose_admin_notification, compose_auto_reply, Email, EmailSender, EmailSettings};

/// Result of one notification step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum StepOutcome {
    Sent,
    Skipped(String),
    Failed(String),
}

impl StepOutcome {
    pub fn is_sent(&self) -> bool {
        matches!(self, StepOutcome::Sent)
    }
}

/// What the worker did with one event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationReport {
    pub event_id: String,
    pub ignored: bool,
    pub admin: StepOutcome,
    pub auto_reply: StepOutcome,
}

/// Consumes `lead/created` events and sends the two emails.
#[derive(Clone)]
pub struct NotificationWorker {
    sender: Arc<dyn EmailSender>,
    settings: EmailSettings,
}

impl NotificationWorker {
    pub fn new(sender: Arc<dyn EmailSender>, settings: EmailSettings) -> Self {
        Self { sender, settings }
    }

    pub fn sender(&self) -> &Arc<dyn EmailSender> {
        &self.sender
    }

    pub fn settings(&self) -> &EmailSettings {
        &self.settings
    }

    /// Handle one event. The admin and auto-reply steps never affect each other.
    pub async fn handle(&self, event: &EventEnvelope) -> NotificationReport {
        if !event.is_lead_created() {
            info!(event = %event.name, event_id = %event.id, "notification_event_ignored");
            let skipped = StepOutcome::Skipped("event not handled".to_string());
            return NotificationReport {
                event_id: event.id.clone(),
                ignored: true,
                admin: skipped.clone(),
                auto_reply: skipped,
            };
        }

        let admin = match self.settings.admin_to {
            Some(_) => {
                let email = compose_admin_notification(&event.data, &self.settings);
                self.deliver("admin", &email).await
            }
            None => StepOutcome::Skipped("no admin recipient configured".to_string()),
        };

        let auto_reply = match compose_auto_reply(&event.data, &self.settings) {
            Some(email) => self.deliver("auto_reply", &email).await,
            None => StepOutcome::Skipped("event has no email".to_string()),
        };

        info!(
            event_id = %event.id,
            lead_id = %event.data.lead_id,
            admin_sent = admin.is_sent(),
            auto_reply_sent = auto_reply.is_sent(),
            "notification_handled"
        );

        NotificationReport {
            event_id: event.id.clone(),
            ignored: false,
            admin,
            auto_reply,
        }
    }

    async fn deliver(&self, step: &'static str, email: &Email) -> StepOutcome {
        match self.sender.send(email).await {
            Ok(()) => StepOutcome::Sent,
            Err(e) => {
                warn!(step, sender = self.sender.name(), error = %e, "notification_step_failed");
                StepOutcome::Failed(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compose::tests::lead_data;
    use crate::MemoryEmailSender;
    use dispatch::{LEAD_CREATED, LEGACY_CONTACT_SUBMITTED};

    fn settings() -> EmailSettings {
        EmailSettings {
            admin_to: Some("owner@example.com".into()),
            ..EmailSettings::default()
        }
    }

    #[tokio::test]
    async fn sends_both_emails() {
        let sender = Arc::new(MemoryEmailSender::new());
        let worker = NotificationWorker::new(sender.clone(), settings());
        let report = worker
            .handle(&EventEnvelope::new(LEAD_CREATED, lead_data()))
            .await;

        assert!(!report.ignored);
        assert_eq!(report.admin, StepOutcome::Sent);
        assert_eq!(report.auto_reply, StepOutcome::Sent);
        assert_eq!(sender.sent().len(), 2);
    }

    #[tokio::test]
    async fn admin_failure_does_not_block_auto_reply() {
        let sender = Arc::new(MemoryEmailSender::failing_for("owner@example.com"));
        let worker = NotificationWorker::new(sender.clone(), settings());
        let report = worker
            .handle(&EventEnvelope::new(LEAD_CREATED, lead_data()))
            .await;

        assert!(matches!(report.admin, StepOutcome::Failed(_)));
        assert_eq!(report.auto_reply, StepOutcome::Sent);
        assert_eq!(sender.sent()[0].to, vec!["taro@example.com".to_string()]);
    }

    #[tokio::test]
    async fn auto_reply_failure_does_not_block_admin() {
        let sender = Arc::new(MemoryEmailSender::failing_for("taro@example.com"));
        let worker = NotificationWorker::new(sender.clone(), settings());
        let report = worker
            .handle(&EventEnvelope::new(LEAD_CREATED, lead_data()))
            .await;

        assert_eq!(report.admin, StepOutcome::Sent);
        assert!(matches!(report.auto_reply, StepOutcome::Failed(_)));
    }

    #[tokio::test]
    async fn legacy_event_is_ignored() {
        let sender = Arc::new(MemoryEmailSender::new());
        let worker = NotificationWorker::new(sender.clone(), settings());
        let report = worker
            .handle(&EventEnvelope::new(LEGACY_CONTACT_SUBMITTED, lead_data()))
            .await;

        assert!(report.ignored);
        assert!(sender.sent().is_empty());
    }

    #[tokio::test]
    async fn missing_admin_recipient_skips_admin_step() {
        let sender = Arc::new(MemoryEmailSender::new());
        let worker = NotificationWorker::new(sender.clone(), EmailSettings::default());
        let report = worker
            .handle(&EventEnvelope::new(LEAD_CREATED, lead_data()))
            .await;

        assert!(matches!(report.admin, StepOutcome::Skipped(_)));
        assert_eq!(report.auto_reply, StepOutcome::Sent);
    }

    #[test]
    fn outcome_serializes_with_status_tag() {
        let json = serde_json::to_value(StepOutcome::Failed("boom".into())).unwrap();
        assert_eq!(json, serde_json::json!({"status": "failed", "reason": "boom"}));
        let json = serde_json::to_value(StepOutcome::Sent).unwrap();
        assert_eq!(json, serde_json::json!({"status": "sent"}));
    }
}
