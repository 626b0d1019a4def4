//! Application bodies accepted by the strict entry point.
//!
//! Two historical client integrations send different field names. Each shape
//! is parsed and validated on its own, in a fixed order, and the first one
//! whose required fields all validate wins. A body mixing names from both
//! shapes validates against neither.
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;
use validator::Validate;

use crate::SchemaError;

/// Which accepted shape a body matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplicationShape {
    /// `message` + `cf-turnstile-response` + `hp`.
    Legacy,
    /// `detail` + `turnstileToken` + `honeypot`.
    Current,
}

impl ApplicationShape {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationShape::Legacy => "legacy",
            ApplicationShape::Current => "current",
        }
    }
}

/// Validated, normalized application fields, independent of the shape they
/// arrived in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationFields {
    pub shape: ApplicationShape,
    pub name: String,
    pub email: String,
    pub company: String,
    pub phone: String,
    pub detail: String,
    pub verification_token: String,
    pub honeypot: String,
}

#[derive(Debug, Deserialize, Validate)]
struct LegacyApplication {
    #[validate(length(min = 1))]
    name: String,
    #[validate(email)]
    email: String,
    #[validate(length(min = 10))]
    message: String,
    #[serde(rename = "cf-turnstile-response")]
    #[validate(length(min = 10))]
    turnstile_response: String,
    #[serde(default)]
    company: Option<String>,
    #[serde(default)]
    phone: Option<String>,
    #[serde(default)]
    hp: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct CurrentApplication {
    #[validate(length(min = 1))]
    name: String,
    #[validate(email)]
    email: String,
    #[validate(length(min = 10))]
    detail: String,
    #[validate(length(min = 10))]
    turnstile_token: String,
    #[serde(default)]
    company: Option<String>,
    #[serde(default)]
    phone: Option<String>,
    #[serde(default)]
    honeypot: Option<String>,
}

trait Shape: DeserializeOwned + Validate {
    const SHAPE: ApplicationShape;

    /// Trim every field and lowercase the email so validation sees the
    /// values that will be stored. The honeypot is kept as sent.
    fn normalize(self) -> Self;

    fn into_fields(self) -> ApplicationFields;
}

impl Shape for LegacyApplication {
    const SHAPE: ApplicationShape = ApplicationShape::Legacy;

    fn normalize(self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            email: normalize_email(&self.email),
            message: self.message.trim().to_string(),
            turnstile_response: self.turnstile_response.trim().to_string(),
            company: self.company.map(|s| s.trim().to_string()),
            phone: self.phone.map(|s| s.trim().to_string()),
            hp: self.hp,
        }
    }

    fn into_fields(self) -> ApplicationFields {
        ApplicationFields {
            shape: Self::SHAPE,
            name: self.name,
            email: self.email,
            company: self.company.unwrap_or_default(),
            phone: self.phone.unwrap_or_default(),
            detail: self.message,
            verification_token: self.turnstile_response,
            honeypot: self.hp.unwrap_or_default(),
        }
    }
}

impl Shape for CurrentApplication {
    const SHAPE: ApplicationShape = ApplicationShape::Current;

    fn normalize(self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            email: normalize_email(&self.email),
            detail: self.detail.trim().to_string(),
            turnstile_token: self.turnstile_token.trim().to_string(),
            company: self.company.map(|s| s.trim().to_string()),
            phone: self.phone.map(|s| s.trim().to_string()),
            honeypot: self.honeypot,
        }
    }

    fn into_fields(self) -> ApplicationFields {
        ApplicationFields {
            shape: Self::SHAPE,
            name: self.name,
            email: self.email,
            company: self.company.unwrap_or_default(),
            phone: self.phone.unwrap_or_default(),
            detail: self.detail,
            verification_token: self.turnstile_token,
            honeypot: self.honeypot.unwrap_or_default(),
        }
    }
}

/// Trim and lowercase an email address.
pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

fn try_shape<S: Shape>(value: &Value) -> Option<ApplicationFields> {
    let parsed = match serde_json::from_value::<S>(value.clone()) {
        Ok(parsed) => parsed.normalize(),
        Err(err) => {
            debug!(shape = S::SHAPE.as_str(), error = %err, "application_shape_mismatch");
            return None;
        }
    };
    match parsed.validate() {
        Ok(()) => Some(parsed.into_fields()),
        Err(errors) => {
            debug!(shape = S::SHAPE.as_str(), error = %errors, "application_shape_invalid");
            None
        }
    }
}

/// Parse a JSON application body into canonical fields.
///
/// The legacy shape is tried first, then the current one.
///
/// # Errors
///
/// - [`SchemaError::InvalidJson`] when the body is not a JSON object.
/// - [`SchemaError::Invalid`] when neither shape validates.
///
/// # Example
///
/// ```rust
/// use schema::{parse_application, ApplicationShape};
///
/// let body = br#"{
///     "name": "Taro",
///     "email": " Taro@Example.com ",
///     "message": "Please contact me about pricing",
///     "cf-turnstile-response": "validtoken123"
/// }"#;
///
/// let fields = parse_application(body).unwrap();
/// assert_eq!(fields.shape, ApplicationShape::Legacy);
/// assert_eq!(fields.email, "taro@example.com");
/// ```
pub fn parse_application(body: &[u8]) -> Result<ApplicationFields, SchemaError> {
    let value: Value =
        serde_json::from_slice(body).map_err(|err| SchemaError::InvalidJson(err.to_string()))?;
    if !value.is_object() {
        return Err(SchemaError::InvalidJson("expected a JSON object".into()));
    }

    try_shape::<LegacyApplication>(&value)
        .or_else(|| try_shape::<CurrentApplication>(&value))
        .ok_or(SchemaError::Invalid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn bytes(value: Value) -> Vec<u8> {
        serde_json::to_vec(&value).unwrap()
    }

    fn legacy_body() -> Value {
        json!({
            "name": "Taro",
            "email": "Taro@Example.com",
            "message": "Please contact me about pricing",
            "cf-turnstile-response": "validtoken123",
            "hp": ""
        })
    }

    fn current_body() -> Value {
        json!({
            "name": "Hanako",
            "email": "hanako@example.com",
            "detail": "We need a new landing page",
            "turnstileToken": "anothertoken456",
            "company": "Acme",
            "phone": "+81 90 0000 0000"
        })
    }

    #[test]
    fn legacy_shape_maps_to_canonical_fields() {
        let fields = parse_application(&bytes(legacy_body())).expect("legacy body validates");
        assert_eq!(fields.shape, ApplicationShape::Legacy);
        assert_eq!(fields.name, "Taro");
        assert_eq!(fields.email, "taro@example.com");
        assert_eq!(fields.detail, "Please contact me about pricing");
        assert_eq!(fields.verification_token, "validtoken123");
        assert_eq!(fields.company, "");
        assert_eq!(fields.honeypot, "");
    }

    #[test]
    fn current_shape_maps_to_canonical_fields() {
        let fields = parse_application(&bytes(current_body())).expect("current body validates");
        assert_eq!(fields.shape, ApplicationShape::Current);
        assert_eq!(fields.detail, "We need a new landing page");
        assert_eq!(fields.verification_token, "anothertoken456");
        assert_eq!(fields.company, "Acme");
        assert_eq!(fields.phone, "+81 90 0000 0000");
    }

    #[test]
    fn email_is_trimmed_and_lowercased() {
        let mut body = current_body();
        body["email"] = json!(" Foo@BAR.com ");
        let fields = parse_application(&bytes(body)).unwrap();
        assert_eq!(fields.email, "foo@bar.com");
    }

    #[test]
    fn legacy_shape_wins_when_both_validate() {
        let mut body = legacy_body();
        body["detail"] = json!("Also a valid detail field");
        body["turnstileToken"] = json!("currenttoken99");
        let fields = parse_application(&bytes(body)).unwrap();
        assert_eq!(fields.shape, ApplicationShape::Legacy);
        assert_eq!(fields.verification_token, "validtoken123");
    }

    #[test]
    fn hybrid_body_is_rejected() {
        let body = json!({
            "name": "Mixed",
            "email": "mixed@example.com",
            "message": "Legacy message field here",
            "turnstileToken": "currenttoken99"
        });
        assert_eq!(parse_application(&bytes(body)), Err(SchemaError::Invalid));
    }

    #[test]
    fn short_detail_is_rejected() {
        let mut body = legacy_body();
        body["message"] = json!("too short");
        assert_eq!(parse_application(&bytes(body)), Err(SchemaError::Invalid));
    }

    #[test]
    fn whitespace_padding_does_not_count_towards_length() {
        let mut body = current_body();
        body["detail"] = json!("   short    ");
        assert_eq!(parse_application(&bytes(body)), Err(SchemaError::Invalid));
    }

    #[test]
    fn short_token_is_rejected() {
        let mut body = legacy_body();
        body["cf-turnstile-response"] = json!("abc");
        assert_eq!(parse_application(&bytes(body)), Err(SchemaError::Invalid));
    }

    #[test]
    fn missing_or_blank_name_is_rejected() {
        let mut body = legacy_body();
        body["name"] = json!("   ");
        assert_eq!(parse_application(&bytes(body)), Err(SchemaError::Invalid));

        let mut body = legacy_body();
        body.as_object_mut().unwrap().remove("name");
        assert_eq!(parse_application(&bytes(body)), Err(SchemaError::Invalid));
    }

    #[test]
    fn malformed_email_is_rejected() {
        let mut body = legacy_body();
        body["email"] = json!("not-an-email");
        assert_eq!(parse_application(&bytes(body)), Err(SchemaError::Invalid));
    }

    #[test]
    fn unparseable_body_is_invalid_json() {
        let res = parse_application(b"{\"name\": ");
        assert!(matches!(res, Err(SchemaError::InvalidJson(_))));

        let res = parse_application(b"[1, 2, 3]");
        assert!(matches!(res, Err(SchemaError::InvalidJson(_))));
    }

    #[test]
    fn honeypot_value_is_carried_through() {
        let mut body = legacy_body();
        body["hp"] = json!("x");
        let fields = parse_application(&bytes(body)).unwrap();
        assert_eq!(fields.honeypot, "x");
    }

    #[test]
    fn whitespace_honeypot_is_not_trimmed() {
        let mut body = legacy_body();
        body["hp"] = json!(" ");
        let fields = parse_application(&bytes(body)).unwrap();
        assert_eq!(fields.honeypot, " ");
    }
}
