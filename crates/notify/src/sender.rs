use std::sync::Mutex;

use async_trait::async_trait;
use tracing::debug;

use crate::{Email, EmailError};

/// Default transactional-email endpoint.
pub const DEFAULT_EMAIL_API_URL: &str = "https://api.resend.com/emails";

#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, email: &Email) -> Result<(), EmailError>;

    fn name(&self) -> &'static str;

    fn is_configured(&self) -> bool {
        true
    }
}

/// Sends through an HTTP email API that takes a JSON message and a bearer key.
pub struct HttpEmailSender {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl HttpEmailSender {
    pub fn new(client: reqwest::Client, endpoint: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        }
    }
}

#[async_trait]
impl EmailSender for HttpEmailSender {
    async fn send(&self, email: &Email) -> Result<(), EmailError> {
        let key = self.api_key.as_deref().ok_or(EmailError::NotConfigured)?;
        if email.to.is_empty() {
            return Err(EmailError::NoRecipient);
        }

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(key)
            .json(email)
            .send()
            .await
            .map_err(|e| EmailError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EmailError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        debug!(subject = %email.subject, "email_sent");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "http"
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}

/// Keeps sent emails in memory. Recipients listed in `fail_for` are refused.
#[derive(Debug, Default)]
pub struct MemoryEmailSender {
    sent: Mutex<Vec<Email>>,
    fail_for: Vec<String>,
}

impl MemoryEmailSender {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sender that rejects any email addressed to `recipient`.
    pub fn failing_for(recipient: impl Into<String>) -> Self {
        Self {
            sent: Mutex::default(),
            fail_for: vec![recipient.into()],
        }
    }

    pub fn sent(&self) -> Vec<Email> {
        self.sent
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait]
impl EmailSender for MemoryEmailSender {
    async fn send(&self, email: &Email) -> Result<(), EmailError> {
        if email.to.is_empty() {
            return Err(EmailError::NoRecipient);
        }
        if email.to.iter().any(|to| self.fail_for.contains(to)) {
            return Err(EmailError::Rejected {
                status: 422,
                body: "recipient refused".to_string(),
            });
        }
        self.sent
            .lock()
            .map_err(|_| EmailError::Transport("sender lock poisoned".into()))?
            .push(email.clone());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn email(to: &str) -> Email {
        Email {
            from: "a@example.com".into(),
            to: vec![to.into()],
            reply_to: None,
            subject: "s".into(),
            text: "t".into(),
            html: "h".into(),
        }
    }

    #[tokio::test]
    async fn http_sender_without_key_is_not_configured() {
        let sender = HttpEmailSender::new(reqwest::Client::new(), DEFAULT_EMAIL_API_URL, None);
        assert!(!sender.is_configured());
        let err = sender.send(&email("x@example.com")).await.unwrap_err();
        assert_eq!(err, EmailError::NotConfigured);
    }

    #[tokio::test]
    async fn memory_sender_refuses_listed_recipient() {
        let sender = MemoryEmailSender::failing_for("bad@example.com");
        assert!(sender.send(&email("bad@example.com")).await.is_err());
        sender.send(&email("ok@example.com")).await.unwrap();
        assert_eq!(sender.sent().len(), 1);
    }
}
