// ABOUTME: JSON request body parsing and field-by-field validation
// ABOUTME: Reads typed values out of a JSON object while collecting per-field error messages
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coderr

//! Request payload validation
//!
//! Bodies are decoded into a JSON object and then read field by field through a
//! [`FieldReader`], which records every failure instead of stopping at the first one.
//! In partial mode (PATCH) absent fields are skipped rather than reported as required.

use serde_json::{json, Map, Value};

use crate::constants::messages;
use crate::errors::{AppError, AppResult, ValidationErrors, NON_FIELD_ERRORS};
use crate::models::Price;

/// Decoded JSON object body
pub type Payload = Map<String, Value>;

/// Decode a request body into a JSON object; an empty body is an empty object
///
/// # Errors
///
/// Returns 400 for malformed JSON or a body that is not an object
pub fn parse_body(body: &[u8]) -> AppResult<Payload> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Payload::new());
    }
    let value: Value = serde_json::from_slice(body)
        .map_err(|e| AppError::invalid_input(format!("JSON parse error - {e}")))?;
    match value {
        Value::Object(map) => Ok(map),
        other => Err(AppError::non_field(format!(
            "Invalid data. Expected a dictionary, but got {}.",
            type_name(&other)
        ))),
    }
}

/// Reject keys outside `allowed`
///
/// The error renders as a single string under `non_field_errors`, listing the
/// unexpected keys alphabetically.
///
/// # Errors
///
/// Returns 400 when any key is not allowed
pub fn reject_unknown_fields(payload: &Payload, allowed: &[&str]) -> AppResult<()> {
    let mut unexpected: Vec<&str> = payload
        .keys()
        .map(String::as_str)
        .filter(|key| !allowed.contains(key))
        .collect();
    if unexpected.is_empty() {
        return Ok(());
    }
    unexpected.sort_unstable();
    let message = format!("Unexpected fields: {}", unexpected.join(", "));
    Err(AppError::invalid_input(message.clone())
        .with_body(json!({ NON_FIELD_ERRORS: message })))
}

/// Python-style type name used in client messages
fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "NoneType",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "int",
        Value::String(_) => "str",
        Value::Array(_) => "list",
        Value::Object(_) => "dict",
    }
}

/// Raw text of a value as shown inside choice errors
fn display_input(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Bool(true) => "True".to_owned(),
        Value::Bool(false) => "False".to_owned(),
        Value::Null => "None".to_owned(),
        other => other.to_string(),
    }
}

/// Coerce a JSON scalar into text; numbers are accepted, booleans and containers are not
fn coerce_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Coerce a JSON value into an integer (`3`, `"3"`, `3.0`)
fn coerce_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() < 9.0e15)
                .map(|f| f as i64)
        }),
        Value::String(s) => {
            let trimmed = s.trim();
            let trimmed = trimmed
                .strip_suffix(".0")
                .or_else(|| trimmed.strip_suffix('.'))
                .unwrap_or(trimmed);
            trimmed.parse().ok()
        }
        _ => None,
    }
}

/// Minimal structural email check: one `@`, non-empty local part, dotted domain
#[must_use]
pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.rsplit_once('@') else {
        return false;
    };
    if local.is_empty() || local.contains(char::is_whitespace) || local.contains('@') {
        return false;
    }
    let labels: Vec<&str> = domain.split('.').collect();
    labels.len() >= 2
        && labels.iter().all(|label| {
            !label.is_empty()
                && !label.starts_with('-')
                && !label.ends_with('-')
                && label.chars().all(|c| c.is_alphanumeric() || c == '-')
        })
}

/// Field-by-field reader over a payload
pub struct FieldReader<'a> {
    payload: &'a Payload,
    partial: bool,
    errors: ValidationErrors,
}

impl<'a> FieldReader<'a> {
    /// Reader requiring every required field to be present
    #[must_use]
    pub fn new(payload: &'a Payload) -> Self {
        Self {
            payload,
            partial: false,
            errors: ValidationErrors::new(),
        }
    }

    /// Reader that skips absent fields
    #[must_use]
    pub fn partial(payload: &'a Payload) -> Self {
        Self {
            payload,
            partial: true,
            errors: ValidationErrors::new(),
        }
    }

    /// Whether the reader runs in partial mode
    #[must_use]
    pub const fn is_partial(&self) -> bool {
        self.partial
    }

    /// Whether `name` is present in the payload
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.payload.contains_key(name)
    }

    /// Whether `name` already failed validation
    #[must_use]
    pub fn has_error(&self, name: &str) -> bool {
        self.errors.has(name)
    }

    /// Record an error against a field
    pub fn error(&mut self, name: &str, message: impl Into<String>) {
        self.errors.add(name, message);
    }

    /// Merge errors of a nested object under `prefix`
    pub fn nested_errors(&mut self, prefix: &str, errors: ValidationErrors) {
        self.errors.extend_nested(prefix, errors);
    }

    /// Finish reading; errors recorded so far fail the request
    ///
    /// # Errors
    ///
    /// Returns a 400 field map when any field failed
    pub fn finish(self) -> AppResult<()> {
        self.errors.into_result()
    }

    /// Hand back the collected errors without failing
    #[must_use]
    pub fn into_errors(self) -> ValidationErrors {
        self.errors
    }

    /// Non-null value of a field, recording required/null errors
    fn value(&mut self, name: &str, required: bool) -> Option<&'a Value> {
        match self.payload.get(name) {
            None => {
                if required && !self.partial {
                    self.errors.add(name, messages::FIELD_REQUIRED);
                }
                None
            }
            Some(Value::Null) => {
                self.errors.add(name, messages::FIELD_NULL);
                None
            }
            Some(value) => Some(value),
        }
    }

    fn text(
        &mut self,
        name: &str,
        required: bool,
        allow_blank: bool,
        max_length: Option<usize>,
    ) -> Option<String> {
        let value = self.value(name, required)?;
        let Some(text) = coerce_text(value) else {
            self.errors.add(name, messages::NOT_A_STRING);
            return None;
        };
        let text = text.trim().to_owned();
        if !allow_blank && text.is_empty() {
            self.errors.add(name, messages::FIELD_BLANK);
            return None;
        }
        if let Some(max) = max_length {
            if text.chars().count() > max {
                self.errors.add(
                    name,
                    format!("Ensure this field has no more than {max} characters."),
                );
                return None;
            }
        }
        Some(text)
    }

    /// Required non-blank text
    pub fn required_string(&mut self, name: &str, max_length: Option<usize>) -> Option<String> {
        self.text(name, true, false, max_length)
    }

    /// Required text that may be blank
    pub fn blankable_string(&mut self, name: &str, max_length: Option<usize>) -> Option<String> {
        self.text(name, true, true, max_length)
    }

    /// Required text kept exactly as sent (passwords)
    pub fn untrimmed_string(&mut self, name: &str) -> Option<String> {
        let value = self.value(name, true)?;
        match coerce_text(value) {
            Some(text) if text.is_empty() => {
                self.errors.add(name, messages::FIELD_BLANK);
                None
            }
            Some(text) => Some(text),
            None => {
                self.errors.add(name, messages::NOT_A_STRING);
                None
            }
        }
    }

    /// Optional text that may be blank
    pub fn optional_string(&mut self, name: &str, max_length: Option<usize>) -> Option<String> {
        self.text(name, false, true, max_length)
    }

    /// Optional nullable text; `Some(None)` means the client sent `null` or a blank value
    pub fn nullable_string(&mut self, name: &str) -> Option<Option<String>> {
        match self.payload.get(name)? {
            Value::Null => Some(None),
            value => {
                let Some(text) = coerce_text(value) else {
                    self.errors.add(name, messages::NOT_A_STRING);
                    return None;
                };
                let text = text.trim();
                Some((!text.is_empty()).then(|| text.to_owned()))
            }
        }
    }

    /// Required email address
    pub fn email(&mut self, name: &str, max_length: usize) -> Option<String> {
        self.text(name, true, false, Some(max_length))
            .and_then(|email| self.check_email(name, email))
    }

    /// Optional email address; blank is allowed
    pub fn optional_email(&mut self, name: &str, max_length: usize) -> Option<String> {
        self.text(name, false, true, Some(max_length))
            .and_then(|email| {
                if email.is_empty() {
                    Some(email)
                } else {
                    self.check_email(name, email)
                }
            })
    }

    fn check_email(&mut self, name: &str, email: String) -> Option<String> {
        if is_valid_email(&email) {
            Some(email)
        } else {
            self.errors.add(name, messages::INVALID_EMAIL);
            None
        }
    }

    /// Integer within optional bounds
    pub fn integer(
        &mut self,
        name: &str,
        required: bool,
        min: Option<i64>,
        max: Option<i64>,
    ) -> Option<i64> {
        let value = self.value(name, required)?;
        let Some(number) = coerce_integer(value) else {
            self.errors.add(name, messages::NOT_AN_INTEGER);
            return None;
        };
        if let Some(min) = min.filter(|min| number < *min) {
            self.errors.add(
                name,
                format!("Ensure this value is greater than or equal to {min}."),
            );
            return None;
        }
        if let Some(max) = max.filter(|max| number > *max) {
            self.errors.add(
                name,
                format!("Ensure this value is less than or equal to {max}."),
            );
            return None;
        }
        Some(number)
    }

    /// One of a fixed set of string choices
    pub fn choice<T>(
        &mut self,
        name: &str,
        required: bool,
        parse: impl Fn(&str) -> Option<T>,
    ) -> Option<T> {
        let value = self.value(name, required)?;
        let raw = display_input(value);
        let parsed = match value {
            Value::String(s) => parse(s),
            Value::Number(_) => parse(&raw),
            _ => None,
        };
        if parsed.is_none() {
            self.errors
                .add(name, format!("\"{raw}\" is not a valid choice."));
        }
        parsed
    }

    /// Decimal price with at most two fractional digits
    pub fn price(&mut self, name: &str, required: bool) -> Option<Price> {
        let value = self.value(name, required)?;
        match Price::from_json(value) {
            Ok(price) => Some(price),
            Err(error) => {
                self.errors.add(name, error.message());
                None
            }
        }
    }

    /// List of strings
    pub fn string_list(&mut self, name: &str, required: bool) -> Option<Vec<String>> {
        let value = self.value(name, required)?;
        let Value::Array(items) = value else {
            self.errors.add(
                name,
                format!(
                    "Expected a list of items but got type \"{}\".",
                    type_name(value)
                ),
            );
            return None;
        };
        let mut strings = Vec::with_capacity(items.len());
        for item in items {
            match coerce_text(item) {
                Some(text) => strings.push(text),
                None => {
                    self.errors.add(name, messages::NOT_A_STRING);
                    return None;
                }
            }
        }
        Some(strings)
    }

    /// Raw list of JSON objects for nested validation
    pub fn object_list(&mut self, name: &str, required: bool) -> Option<Vec<&'a Payload>> {
        let value = self.value(name, required)?;
        let Value::Array(items) = value else {
            self.errors.add(
                name,
                format!(
                    "Expected a list of items but got type \"{}\".",
                    type_name(value)
                ),
            );
            return None;
        };
        let mut objects = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            match item {
                Value::Object(map) => objects.push(map),
                other => self.errors.add(
                    &format!("{name}[{index}]"),
                    format!(
                        "Invalid data. Expected a dictionary, but got {}.",
                        type_name(other)
                    ),
                ),
            }
        }
        Some(objects)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(value: Value) -> Payload {
        match value {
            Value::Object(map) => map,
            _ => Payload::new(),
        }
    }

    #[test]
    fn test_parse_body_variants() {
        assert!(parse_body(b"").unwrap().is_empty());
        assert!(parse_body(b"  \n").unwrap().is_empty());
        assert_eq!(parse_body(br#"{"a": 1}"#).unwrap()["a"], 1);

        let malformed = parse_body(b"{oops").unwrap_err();
        assert!(malformed.message.starts_with("JSON parse error - "));

        let list = parse_body(b"[1, 2]").unwrap_err();
        assert_eq!(
            list.response_body(),
            json!({"non_field_errors": ["Invalid data. Expected a dictionary, but got list."]})
        );
    }

    #[test]
    fn test_unknown_fields_render_as_string() {
        let data = payload(json!({"offer_detail_id": 1, "zeta": 1, "alpha": 2}));
        let error = reject_unknown_fields(&data, &["offer_detail_id"]).unwrap_err();
        assert_eq!(
            error.response_body(),
            json!({"non_field_errors": "Unexpected fields: alpha, zeta"})
        );
        assert!(reject_unknown_fields(&data, &["offer_detail_id", "zeta", "alpha"]).is_ok());
    }

    #[test]
    fn test_required_null_and_blank() {
        let data = payload(json!({"b": null, "c": "   ", "d": 42}));
        let mut reader = FieldReader::new(&data);
        assert_eq!(reader.required_string("a", None), None);
        assert_eq!(reader.required_string("b", None), None);
        assert_eq!(reader.required_string("c", None), None);
        assert_eq!(reader.required_string("d", None).as_deref(), Some("42"));
        let errors = reader.into_errors();
        assert_eq!(errors.get("a"), Some(&[messages::FIELD_REQUIRED.to_owned()][..]));
        assert_eq!(errors.get("b"), Some(&[messages::FIELD_NULL.to_owned()][..]));
        assert_eq!(errors.get("c"), Some(&[messages::FIELD_BLANK.to_owned()][..]));
        assert!(!errors.has("d"));
    }

    #[test]
    fn test_blankable_string_requires_presence_only() {
        let data = payload(json!({"description": "  "}));
        let mut reader = FieldReader::new(&data);
        assert_eq!(reader.blankable_string("description", None).as_deref(), Some(""));
        assert_eq!(reader.blankable_string("missing", None), None);
        let errors = reader.into_errors();
        assert!(!errors.has("description"));
        assert_eq!(errors.get("missing"), Some(&[messages::FIELD_REQUIRED.to_owned()][..]));
    }

    #[test]
    fn test_partial_reader_skips_absent_fields() {
        let data = payload(json!({"title": "x"}));
        let mut reader = FieldReader::partial(&data);
        assert_eq!(reader.required_string("description", None), None);
        assert_eq!(reader.required_string("title", Some(3)).as_deref(), Some("x"));
        assert!(reader.finish().is_ok());
    }

    #[test]
    fn test_integer_and_choice_messages() {
        let data = payload(json!({"rating": "6", "count": "abc", "type": "admin", "ok": 3.0}));
        let mut reader = FieldReader::new(&data);
        assert_eq!(reader.integer("rating", true, Some(1), Some(5)), None);
        assert_eq!(reader.integer("count", true, None, None), None);
        assert_eq!(reader.integer("ok", true, None, None), Some(3));
        assert_eq!(reader.choice("type", true, |s| (s == "customer").then_some(())), None);
        let errors = reader.into_errors();
        assert_eq!(
            errors.get("rating"),
            Some(&["Ensure this value is less than or equal to 5.".to_owned()][..])
        );
        assert_eq!(errors.get("count"), Some(&[messages::NOT_AN_INTEGER.to_owned()][..]));
        assert_eq!(
            errors.get("type"),
            Some(&["\"admin\" is not a valid choice.".to_owned()][..])
        );
    }

    #[test]
    fn test_email_validation() {
        assert!(is_valid_email("jane@example.com"));
        assert!(is_valid_email("first.last+tag@mail.example.co"));
        assert!(!is_valid_email("jane"));
        assert!(!is_valid_email("jane@localhost"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("ja ne@example.com"));
    }

    #[test]
    fn test_max_length() {
        let data = payload(json!({"title": "abcdef"}));
        let mut reader = FieldReader::new(&data);
        assert_eq!(reader.required_string("title", Some(5)), None);
        assert_eq!(
            reader.into_errors().get("title"),
            Some(&["Ensure this field has no more than 5 characters.".to_owned()][..])
        );
    }
}
