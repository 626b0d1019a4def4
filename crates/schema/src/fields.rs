use serde_json::{Map, Value};

use crate::coerce::{coerce_list, coerce_text};
use crate::SchemaError;

/// An untyped key/value view over a JSON, urlencoded or multipart body.
///
/// Values stay as `serde_json::Value` so JSON bodies keep their arrays and
/// form bodies can express repeated keys as arrays.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormFields(Map<String, Value>);

impl FormFields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a JSON body. The top level must be an object.
    pub fn from_json_bytes(body: &[u8]) -> Result<Self, SchemaError> {
        match serde_json::from_slice::<Value>(body) {
            Ok(Value::Object(map)) => Ok(Self(map)),
            Ok(_) => Err(SchemaError::InvalidJson("expected a JSON object".into())),
            Err(err) => Err(SchemaError::InvalidJson(err.to_string())),
        }
    }

    /// Decode an `application/x-www-form-urlencoded` body.
    pub fn from_urlencoded_bytes(body: &[u8]) -> Result<Self, SchemaError> {
        let pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(body)
            .map_err(|err| SchemaError::InvalidJson(err.to_string()))?;
        Ok(Self::from_pairs(pairs))
    }

    /// Build from ordered key/value pairs. Repeated keys collapse into an
    /// array in arrival order, and a trailing `[]` on a key is dropped
    /// (`assets[]=a&assets[]=b`).
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut fields = Self::new();
        for (key, value) in pairs {
            fields.append(key, value);
        }
        fields
    }

    /// Add one value, turning the entry into an array on repetition.
    pub fn append(&mut self, key: String, value: String) {
        let key = match key.strip_suffix("[]") {
            Some(stripped) => stripped.to_string(),
            None => key,
        };
        match self.0.get_mut(&key) {
            Some(Value::Array(items)) => items.push(Value::String(value)),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, Value::String(value)]);
            }
            None => {
                self.0.insert(key, Value::String(value));
            }
        }
    }

    /// First present key among `keys`, coerced to trimmed text.
    pub fn text(&self, keys: &[&str]) -> String {
        coerce_text(self.first(keys))
    }

    /// First present key among `keys` as sent. Strings are not trimmed.
    pub fn raw_text(&self, keys: &[&str]) -> String {
        match self.first(keys) {
            Some(Value::String(s)) => s.clone(),
            other => coerce_text(other),
        }
    }

    /// First present key among `keys`, coerced to a list.
    pub fn list(&self, keys: &[&str]) -> Vec<String> {
        self.first(keys).map(coerce_list).unwrap_or_default()
    }

    fn first(&self, keys: &[&str]) -> Option<&Value> {
        keys.iter().find_map(|key| match self.0.get(*key) {
            None | Some(Value::Null) => None,
            Some(value) => Some(value),
        })
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Map<String, Value>> for FormFields {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urlencoded_repeated_keys_become_arrays() {
        let fields =
            FormFields::from_urlencoded_bytes(b"name=Taro&assets%5B%5D=logo&assets%5B%5D=copy")
                .unwrap();
        assert_eq!(fields.text(&["name"]), "Taro");
        assert_eq!(fields.list(&["assets"]), vec!["logo", "copy"]);
    }

    #[test]
    fn json_top_level_must_be_an_object() {
        assert!(FormFields::from_json_bytes(br#"{"a": 1}"#).is_ok());
        assert!(matches!(
            FormFields::from_json_bytes(b"\"text\""),
            Err(SchemaError::InvalidJson(_))
        ));
        assert!(matches!(
            FormFields::from_json_bytes(b"{"),
            Err(SchemaError::InvalidJson(_))
        ));
    }

    #[test]
    fn first_present_alias_wins_and_null_is_skipped() {
        let fields = FormFields::from_json_bytes(br#"{"utmSource": "ads", "utm_source": null}"#)
            .unwrap();
        assert_eq!(fields.text(&["utm_source", "utmSource"]), "ads");
        assert_eq!(fields.text(&["missing"]), "");
    }

    #[test]
    fn raw_text_keeps_whitespace() {
        let fields = FormFields::from_pairs(vec![("hp".to_string(), " ".to_string())]);
        assert_eq!(fields.raw_text(&["hp"]), " ");
        assert_eq!(fields.text(&["hp"]), "");
        assert_eq!(fields.raw_text(&["missing"]), "");
    }
}
