//! Email composition for lead events.
use dispatch::LeadEventData;
use serde::{Deserialize, Serialize};

const NOT_PROVIDED: &str = "(not provided)";

/// Addresses and branding used when composing emails.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailSettings {
    /// `From` header of every outgoing email.
    pub from: String,
    /// Recipient of admin notifications. `None` skips the admin step.
    pub admin_to: Option<String>,
    /// Name used to sign auto-replies.
    pub site_name: String,
}

impl Default for EmailSettings {
    fn default() -> Self {
        Self {
            from: "Inquiries <no-reply@example.com>".to_string(),
            admin_to: None,
            site_name: "Our team".to_string(),
        }
    }
}

/// One outgoing email, serialized in the provider's JSON shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Email {
    pub from: String,
    pub to: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<String>,
    pub subject: String,
    pub text: String,
    pub html: String,
}

/// Escape text for inclusion in HTML element content or a quoted attribute.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

fn or_placeholder(value: &str) -> &str {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        NOT_PROVIDED
    } else {
        trimmed
    }
}

fn message_of(data: &LeadEventData) -> &str {
    if data.message.trim().is_empty() {
        &data.detail
    } else {
        &data.message
    }
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Notification sent to the site owner for every new lead.
pub fn compose_admin_notification(data: &LeadEventData, settings: &EmailSettings) -> Email {
    let name = or_placeholder(&data.name);
    let email = or_placeholder(&data.email);
    let company = or_placeholder(&data.company);
    let phone = or_placeholder(&data.phone);
    let message = or_placeholder(message_of(data));

    let text = format!(
        "New inquiry received\n\n\
         Name: {name}\n\
         Email: {email}\n\
         Company: {company}\n\
         Phone: {phone}\n\n\
         Message:\n{message}\n"
    );

    let email_html = match non_empty(&data.email) {
        Some(address) => {
            let escaped = escape_html(&address);
            format!("<a href=\"mailto:{escaped}\">{escaped}</a>")
        }
        None => NOT_PROVIDED.to_string(),
    };
    let html = format!(
        "<h2>New inquiry received</h2>\
         <p><strong>Name:</strong> {}</p>\
         <p><strong>Email:</strong> {}</p>\
         <p><strong>Company:</strong> {}</p>\
         <p><strong>Phone:</strong> {}</p>\
         <p><strong>Message:</strong></p>\
         <p style=\"white-space: pre-wrap\">{}</p>",
        escape_html(name),
        email_html,
        escape_html(company),
        escape_html(phone),
        escape_html(message),
    );

    Email {
        from: settings.from.clone(),
        to: settings.admin_to.iter().cloned().collect(),
        reply_to: non_empty(&data.email),
        subject: format!("New inquiry from {name}"),
        text,
        html,
    }
}

/// Acknowledgement sent back to the submitter, if the event carries an email.
pub fn compose_auto_reply(data: &LeadEventData, settings: &EmailSettings) -> Option<Email> {
    let to = non_empty(&data.email)?;
    let greeting = non_empty(&data.name).unwrap_or_else(|| "there".to_string());
    let message = or_placeholder(message_of(data));
    let site = &settings.site_name;

    let text = format!(
        "Hi {greeting},\n\n\
         Thanks for getting in touch. We have received your inquiry and will get back \
         to you within one business day.\n\n\
         For reference, here is the message you sent:\n\n{message}\n\n\
         {site}\n"
    );
    let html = format!(
        "<p>Hi {},</p>\
         <p>Thanks for getting in touch. We have received your inquiry and will get back \
         to you within one business day.</p>\
         <p>For reference, here is the message you sent:</p>\
         <blockquote style=\"white-space: pre-wrap\">{}</blockquote>\
         <p>{}</p>",
        escape_html(&greeting),
        escape_html(message),
        escape_html(site),
    );

    Some(Email {
        from: settings.from.clone(),
        to: vec![to],
        reply_to: settings.admin_to.clone(),
        subject: "We received your inquiry".to_string(),
        text,
        html,
    })
}
