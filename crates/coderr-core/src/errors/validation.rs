// ABOUTME: Field-keyed validation error collection rendered as a JSON map of message lists
// ABOUTME: Accumulates per-field and non-field messages before failing a request
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coderr

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use super::{AppError, AppResult};

/// Key used for errors that do not belong to a single field
pub const NON_FIELD_ERRORS: &str = "non_field_errors";

/// Validation errors keyed by field name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, Vec<String>>);

impl ValidationErrors {
    /// Create an empty collection
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Record a message against a field
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_owned())
            .or_default()
            .push(message.into());
    }

    /// Record a message not bound to any field
    pub fn add_non_field(&mut self, message: impl Into<String>) {
        self.add(NON_FIELD_ERRORS, message);
    }

    /// Record every message of `other` under `prefix`
    pub fn extend_nested(&mut self, prefix: &str, other: Self) {
        for (field, messages) in other.0 {
            for message in messages {
                self.add(&format!("{prefix}.{field}"), message);
            }
        }
    }

    /// Whether no error has been recorded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether `field` already has an error
    #[must_use]
    pub fn has(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// Messages recorded for `field`
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    /// Render as a JSON object
    #[must_use]
    pub fn to_value(&self) -> Value {
        serde_json::to_value(&self.0).unwrap_or(Value::Null)
    }

    /// One-line summary for logs
    #[must_use]
    pub fn summary(&self) -> String {
        self.0
            .iter()
            .map(|(field, messages)| format!("{field}: {}", messages.join(" ")))
            .collect::<Vec<_>>()
            .join("; ")
    }

    /// Fail with these errors when any were recorded
    ///
    /// # Errors
    ///
    /// Returns a validation `AppError` when the collection is not empty
    pub fn into_result(self) -> AppResult<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(AppError::validation(self))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_accumulates_messages_per_field() {
        let mut errors = ValidationErrors::new();
        errors.add("username", "This field is required.");
        errors.add("username", "Too short.");
        errors.add_non_field("Passwords do not match.");

        assert_eq!(
            errors.to_value(),
            json!({
                "non_field_errors": ["Passwords do not match."],
                "username": ["This field is required.", "Too short."],
            })
        );
    }

    #[test]
    fn test_empty_collection_is_ok() {
        assert!(ValidationErrors::new().into_result().is_ok());
    }

    #[test]
    fn test_nested_prefix() {
        let mut inner = ValidationErrors::new();
        inner.add("price", "A valid number is required.");
        let mut outer = ValidationErrors::new();
        outer.extend_nested("details[0]", inner);
        assert!(outer.has("details[0].price"));
    }
}
