use std::collections::BTreeMap;

use axum::{extract::rejection::JsonRejection, Json};
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::error::AppError;

pub const MISSING: &str = "Missing data for required field.";
pub const BLANK: &str = "Field may not be blank.";
pub const NOT_STRING: &str = "Not a valid string.";
pub const INVALID_EMAIL: &str = "Not a valid email address.";
pub const INVALID_INPUT_TYPE: &str = "Invalid input type.";

/// Key used for errors that concern the body as a whole.
pub const SCHEMA_KEY: &str = "_schema";

/// Field name to list of reasons, serialized in key order.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, reason: impl Into<String>) {
        self.0.entry(field.to_string()).or_default().push(reason.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn has_reason(&self, reason: &str) -> bool {
        self.0.values().flatten().any(|r| r == reason)
    }

    /// Ok when nothing was recorded, otherwise a `Validation` error carrying `message`.
    pub fn into_result(self, message: &str) -> Result<(), AppError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation {
                message: message.to_string(),
                errors: self,
            })
        }
    }
}

/// Unwraps a JSON body. Request structs hold raw `Value` fields, so the only
/// data error left is a body that is not an object; that one is reported
/// under `_schema`. Unparsable bodies stay a plain 400.
pub fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    match payload {
        Ok(Json(v)) => Ok(v),
        Err(JsonRejection::JsonDataError(e)) => {
            warn!(error = %e, "request body has wrong shape");
            let mut errors = FieldErrors::new();
            errors.add(SCHEMA_KEY, INVALID_INPUT_TYPE);
            Err(AppError::Validation {
                message: "Invalid input".into(),
                errors,
            })
        }
        Err(e) => {
            warn!(error = %e, "rejected request body");
            Err(AppError::BadRequest(e.body_text()))
        }
    }
}

pub fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// `None` when absent or null; `Err` when present with a non-string type.
fn string_value(
    errors: &mut FieldErrors,
    field: &str,
    value: Option<Value>,
) -> Result<Option<String>, ()> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(_) => {
            errors.add(field, NOT_STRING);
            Err(())
        }
    }
}

/// Required string: absent, null and whitespace-only all count as missing.
/// Returns the trimmed value.
pub fn required(errors: &mut FieldErrors, field: &str, value: Option<Value>) -> Option<String> {
    let s = string_value(errors, field, value).ok()?;
    match s.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Some(v.to_string()),
        _ => {
            errors.add(field, MISSING);
            None
        }
    }
}

/// Required string taken verbatim; only emptiness is rejected.
pub fn required_verbatim(
    errors: &mut FieldErrors,
    field: &str,
    value: Option<Value>,
) -> Option<String> {
    match string_value(errors, field, value).ok()? {
        Some(s) if !s.is_empty() => Some(s),
        _ => {
            errors.add(field, MISSING);
            None
        }
    }
}

/// Optional string that must not be blank when it is supplied.
pub fn non_blank(errors: &mut FieldErrors, field: &str, value: Option<Value>) -> Option<String> {
    let s = string_value(errors, field, value).ok()??;
    let v = s.trim();
    if v.is_empty() {
        errors.add(field, BLANK);
        None
    } else {
        Some(v.to_string())
    }
}

/// Optional string, any content.
pub fn optional(errors: &mut FieldErrors, field: &str, value: Option<Value>) -> Option<String> {
    string_value(errors, field, value).ok()?
}

pub fn max_len(errors: &mut FieldErrors, field: &str, value: Option<&str>, max: usize) {
    if let Some(v) = value {
        if v.chars().count() > max {
            errors.add(field, format!("Longer than maximum length {max}."));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn email_syntax() {
        assert!(is_valid_email("a@x.com"));
        assert!(is_valid_email("first.last@sub.example.org"));
        assert!(!is_valid_email("no-at-sign.com"));
        assert!(!is_valid_email("a@nodot"));
        assert!(!is_valid_email("spa ce@x.com"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn required_treats_blank_as_missing() {
        let mut errors = FieldErrors::new();
        assert_eq!(required(&mut errors, "name", Some(json!("  P  "))).as_deref(), Some("P"));
        assert!(required(&mut errors, "a", None).is_none());
        assert!(required(&mut errors, "b", Some(json!("   "))).is_none());
        assert!(required(&mut errors, "c", Some(Value::Null)).is_none());
        assert_eq!(errors.get("a"), Some(&[MISSING.to_string()][..]));
        assert_eq!(errors.get("b"), Some(&[MISSING.to_string()][..]));
        assert_eq!(errors.get("c"), Some(&[MISSING.to_string()][..]));
        assert!(errors.get("name").is_none());
    }

    #[test]
    fn wrong_type_is_reported_once() {
        let mut errors = FieldErrors::new();
        assert!(required(&mut errors, "email", Some(json!(5))).is_none());
        assert!(non_blank(&mut errors, "status", Some(json!(["x"]))).is_none());
        assert!(optional(&mut errors, "description", Some(json!({"a": 1}))).is_none());
        assert!(required_verbatim(&mut errors, "password", Some(json!(true))).is_none());
        for field in ["email", "status", "description", "password"] {
            assert_eq!(errors.get(field), Some(&[NOT_STRING.to_string()][..]), "{field}");
        }
    }

    #[test]
    fn required_verbatim_keeps_whitespace() {
        let mut errors = FieldErrors::new();
        assert_eq!(
            required_verbatim(&mut errors, "password", Some(json!(" pw "))).as_deref(),
            Some(" pw ")
        );
        assert!(errors.is_empty());
    }

    #[test]
    fn non_blank_ignores_absent() {
        let mut errors = FieldErrors::new();
        assert!(non_blank(&mut errors, "status", None).is_none());
        assert!(non_blank(&mut errors, "status", Some(Value::Null)).is_none());
        assert!(errors.is_empty());
        assert!(non_blank(&mut errors, "status", Some(json!(""))).is_none());
        assert_eq!(errors.get("status"), Some(&[BLANK.to_string()][..]));
    }

    #[test]
    fn max_len_counts_chars() {
        let mut errors = FieldErrors::new();
        max_len(&mut errors, "status", Some("ééé"), 3);
        assert!(errors.is_empty());
        max_len(&mut errors, "status", Some("abcd"), 3);
        assert!(!errors.is_empty());
    }

    #[test]
    fn into_result_carries_fields() {
        let mut errors = FieldErrors::new();
        errors.add("name", MISSING);
        match errors.into_result("Invalid input") {
            Err(AppError::Validation { message, errors }) => {
                assert_eq!(message, "Invalid input");
                assert!(errors.has_reason(MISSING));
                let json = serde_json::to_value(&errors).unwrap();
                assert_eq!(json["name"][0], MISSING);
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
