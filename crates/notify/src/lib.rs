//! Notification worker for lead events.
//!
//! Runs out of band from the intake routes. For each `lead/created` event it
//! sends an admin notification and an auto-reply to the submitter; the two
//! steps succeed or fail independently and the outcome of each is reported
//! in a [`NotificationReport`].

mod compose;
mod sender;
mod worker;

use thiserror::Error;

pub use crate::compose::{
    compose_admin_notification, compose_auto_reply, escape_html, Email, EmailSettings,
};
pub use crate::sender::{EmailSender, HttpEmailSender, MemoryEmailSender, DEFAULT_EMAIL_API_URL};
pub use crate::worker::{NotificationReport, NotificationWorker, StepOutcome};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum EmailError {
    #[error("email provider is not configured")]
    NotConfigured,

    #[error("email has no recipient")]
    NoRecipient,

    #[error("email send failed: {0}")]
    Transport(String),

    #[error("email provider rejected message with status {status}: {body}")]
    Rejected { status: u16, body: String },
}
