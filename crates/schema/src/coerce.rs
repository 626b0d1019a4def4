//! Per-field coercion rules for loosely-typed form values.
//!
//! Browsers and third-party form builders send the same logical field as a
//! single string, a repeated key (array) or a comma-separated string. These
//! helpers turn any of those into one predictable representation.
use serde_json::Value;

/// Normalize a multi-value field into an ordered list of trimmed, non-empty
/// strings.
///
/// - `"design,copy,seo"` → `["design", "copy", "seo"]`
/// - `["design", "copy", "seo"]` → `["design", "copy", "seo"]`
/// - `"design"` → `["design"]`
///
/// Array elements are themselves comma-split, numbers and booleans are
/// stringified, and anything else (objects, null) is dropped.
///
/// ```rust
/// use schema::coerce_list;
/// use serde_json::json;
///
/// assert_eq!(coerce_list(&json!("design, copy,,seo ")), vec!["design", "copy", "seo"]);
/// assert_eq!(coerce_list(&json!(["design", " copy "])), vec!["design", "copy"]);
/// ```
pub fn coerce_list(value: &Value) -> Vec<String> {
    let mut out = Vec::new();
    push_list_items(value, &mut out);
    out
}

fn push_list_items(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::String(s) => out.extend(
            s.split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(str::to_string),
        ),
        Value::Array(items) => {
            for item in items {
                if !item.is_array() {
                    push_list_items(item, out);
                }
            }
        }
        Value::Number(n) => out.push(n.to_string()),
        Value::Bool(b) => out.push(b.to_string()),
        Value::Null | Value::Object(_) => {}
    }
}

/// Normalize a single-value field into a trimmed string.
///
/// Arrays (from repeated form keys) are joined with `", "`; missing, null
/// and object values become the empty string.
pub fn coerce_text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(list @ Value::Array(_)) => coerce_list(list).join(", "),
        Some(Value::Null) | Some(Value::Object(_)) | None => String::new(),
    }
}
