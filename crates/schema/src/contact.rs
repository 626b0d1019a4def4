//! Loosely-typed contact submissions with marketing attribution.
use serde_json::{Map, Value};
use validator::ValidateEmail;

use crate::application::normalize_email;
use crate::{FormFields, SchemaError, MIN_DETAIL_CHARS};

const TOKEN_KEYS: &[&str] = &["turnstileToken", "cf-turnstile-response", "turnstile_token"];
const HONEYPOT_KEYS: &[&str] = &["honeypot", "hp", "website"];

/// Marketing attribution captured alongside a contact submission.
///
/// Scalar parameters are read from either their snake_case or camelCase
/// key; [`Attribution::to_payload`] writes both spellings back out for
/// downstream consumers that only know one of them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attribution {
    pub referrer: String,
    pub page_path: String,
    pub utm_source: String,
    pub utm_medium: String,
    pub utm_campaign: String,
    pub utm_term: String,
    pub utm_content: String,
    pub plan: String,
    pub timeline: String,
    pub priority: String,
    pub budget: String,
    pub assets: Vec<String>,
    pub features: Vec<String>,
}

impl Attribution {
    pub fn from_fields(fields: &FormFields) -> Self {
        Self {
            referrer: fields.text(&["referrer", "referer"]),
            page_path: fields.text(&["page_path", "pagePath"]),
            utm_source: fields.text(&["utm_source", "utmSource"]),
            utm_medium: fields.text(&["utm_medium", "utmMedium"]),
            utm_campaign: fields.text(&["utm_campaign", "utmCampaign"]),
            utm_term: fields.text(&["utm_term", "utmTerm"]),
            utm_content: fields.text(&["utm_content", "utmContent"]),
            plan: fields.text(&["plan"]),
            timeline: fields.text(&["timeline"]),
            priority: fields.text(&["priority"]),
            budget: fields.text(&["budget"]),
            assets: fields.list(&["assets"]),
            features: fields.list(&["features"]),
        }
    }

    /// Flat event-payload view. Multi-word keys appear in both spellings.
    pub fn to_payload(&self) -> Map<String, Value> {
        let mut out = Map::new();
        let scalars: [(&str, Option<&str>, &String); 11] = [
            ("referrer", None, &self.referrer),
            ("page_path", Some("pagePath"), &self.page_path),
            ("utm_source", Some("utmSource"), &self.utm_source),
            ("utm_medium", Some("utmMedium"), &self.utm_medium),
            ("utm_campaign", Some("utmCampaign"), &self.utm_campaign),
            ("utm_term", Some("utmTerm"), &self.utm_term),
            ("utm_content", Some("utmContent"), &self.utm_content),
            ("plan", None, &self.plan),
            ("timeline", None, &self.timeline),
            ("priority", None, &self.priority),
            ("budget", None, &self.budget),
        ];
        for (snake, camel, value) in scalars {
            out.insert(snake.to_string(), Value::String(value.clone()));
            if let Some(camel) = camel {
                out.insert(camel.to_string(), Value::String(value.clone()));
            }
        }
        out.insert("assets".into(), string_array(&self.assets));
        out.insert("features".into(), string_array(&self.features));
        out
    }
}

fn string_array(items: &[String]) -> Value {
    Value::Array(items.iter().cloned().map(Value::String).collect())
}

/// Canonical contact submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactSubmission {
    pub name: String,
    /// Trimmed and lowercased.
    pub email: String,
    pub message: String,
    pub company: String,
    pub phone: String,
    /// `None` when the client sent no token at all.
    pub verification_token: Option<String>,
    pub honeypot: String,
    pub attribution: Attribution,
}

/// Validate a loosely-typed contact body.
///
/// Requires a non-empty `name`, a syntactically valid `email` and a
/// `message` (or `detail`) of at least ten characters. Every failing field
/// is reported, not just the first.
///
/// ```rust
/// use schema::{parse_contact, FormFields, SchemaError};
///
/// let fields = FormFields::from_json_bytes(br#"{"email": "x@example.com"}"#).unwrap();
/// assert_eq!(
///     parse_contact(&fields),
///     Err(SchemaError::MissingFields(vec!["name", "message"]))
/// );
/// ```
pub fn parse_contact(fields: &FormFields) -> Result<ContactSubmission, SchemaError> {
    let name = fields.text(&["name"]);
    let email = normalize_email(&fields.text(&["email"]));
    let message = fields.text(&["message", "detail"]);

    let mut missing = Vec::new();
    if name.is_empty() {
        missing.push("name");
    }
    if !email.validate_email() {
        missing.push("email");
    }
    if message.chars().count() < MIN_DETAIL_CHARS {
        missing.push("message");
    }
    if !missing.is_empty() {
        return Err(SchemaError::MissingFields(missing));
    }

    let token = fields.text(TOKEN_KEYS);
    Ok(ContactSubmission {
        name,
        email,
        message,
        company: fields.text(&["company"]),
        phone: fields.text(&["phone", "tel"]),
        verification_token: (!token.is_empty()).then_some(token),
        honeypot: fields.raw_text(HONEYPOT_KEYS),
        attribution: Attribution::from_fields(fields),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: Value) -> FormFields {
        FormFields::from_json_bytes(&serde_json::to_vec(&value).unwrap()).unwrap()
    }

    #[test]
    fn valid_contact_with_attribution() {
        let submission = parse_contact(&fields(json!({
            "name": "Taro",
            "email": " Taro@Example.COM",
            "message": "I would like a quote for a new site",
            "utmSource": "newsletter",
            "utm_medium": "email",
            "pagePath": "/pricing",
            "plan": "standard",
            "assets": "design,copy,seo",
            "features": ["blog", "contact form"],
            "turnstileToken": "tok-1234567890"
        })))
        .expect("contact validates");

        assert_eq!(submission.email, "taro@example.com");
        assert_eq!(submission.verification_token.as_deref(), Some("tok-1234567890"));
        assert_eq!(submission.attribution.utm_source, "newsletter");
        assert_eq!(submission.attribution.utm_medium, "email");
        assert_eq!(submission.attribution.page_path, "/pricing");
        assert_eq!(submission.attribution.assets, vec!["design", "copy", "seo"]);
        assert_eq!(submission.attribution.features, vec!["blog", "contact form"]);
    }

    #[test]
    fn missing_fields_are_all_reported() {
        let res = parse_contact(&fields(json!({"message": "short"})));
        assert_eq!(
            res,
            Err(SchemaError::MissingFields(vec!["name", "email", "message"]))
        );
    }

    #[test]
    fn detail_is_accepted_as_message_alias() {
        let submission = parse_contact(&fields(json!({
            "name": "Hanako",
            "email": "hanako@example.com",
            "detail": "Detail field instead of message"
        })))
        .unwrap();
        assert_eq!(submission.message, "Detail field instead of message");
        assert_eq!(submission.verification_token, None);
    }

    #[test]
    fn legacy_token_and_honeypot_aliases() {
        let submission = parse_contact(&fields(json!({
            "name": "Bot",
            "email": "bot@example.com",
            "message": "Totally a human message",
            "cf-turnstile-response": "legacytoken1",
            "hp": "filled"
        })))
        .unwrap();
        assert_eq!(submission.verification_token.as_deref(), Some("legacytoken1"));
        assert_eq!(submission.honeypot, "filled");
    }

    #[test]
    fn payload_carries_both_spellings() {
        let attribution = Attribution {
            utm_source: "ads".into(),
            page_path: "/services".into(),
            assets: vec!["design".into()],
            ..Default::default()
        };
        let payload = attribution.to_payload();
        assert_eq!(payload["utm_source"], json!("ads"));
        assert_eq!(payload["utmSource"], json!("ads"));
        assert_eq!(payload["page_path"], json!("/services"));
        assert_eq!(payload["pagePath"], json!("/services"));
        assert_eq!(payload["assets"], json!(["design"]));
        assert!(!payload.contains_key("Referrer"));
    }
}
