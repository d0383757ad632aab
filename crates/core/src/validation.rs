//! Field-level validation errors.
//!
//! Forms are validated in one pass and every failing field is reported. The
//! [`Display`](core::fmt::Display) form joins the messages with `". "`, which is
//! what API clients show to the user.

use core::fmt;

use serde::Serialize;

/// A single failing field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// One or more field failures.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    /// A single-field error.
    #[must_use]
    pub fn single(field: &'static str, message: impl Into<String>) -> Self {
        Self(vec![FieldError {
            field,
            message: message.into(),
        }])
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn has_field(&self, field: &str) -> bool {
        self.0.iter().any(|e| e.field == field)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self
            .0
            .iter()
            .map(|e| e.message.as_str())
            .collect::<Vec<_>>()
            .join(". ");
        f.write_str(&joined)
    }
}

impl std::error::Error for ValidationErrors {}

/// Accumulates field failures.
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<FieldError>,
}

impl Validator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `message` against `field` unless `ok` holds.
    pub fn check(&mut self, ok: bool, field: &'static str, message: impl Into<String>) {
        if !ok {
            self.errors.push(FieldError {
                field,
                message: message.into(),
            });
        }
    }

    /// Require at least `min` characters after trimming.
    pub fn min_chars(&mut self, field: &'static str, value: &str, min: usize, message: &str) {
        self.check(value.trim().chars().count() >= min, field, message);
    }

    /// # Errors
    ///
    /// Returns the collected failures if any check failed.
    pub fn finish(self) -> Result<(), ValidationErrors> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationErrors(self.errors))
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_join_with_period() {
        let mut v = Validator::new();
        v.min_chars("name", "ab", 3, "Name must be at least 3 characters");
        v.check(false, "email", "Invalid email address");
        let err = v.finish().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Name must be at least 3 characters. Invalid email address"
        );
    }

    #[test]
    fn test_min_chars_ignores_surrounding_whitespace() {
        let mut v = Validator::new();
        v.min_chars("title", "  ab  ", 3, "too short");
        assert!(v.finish().is_err());
    }

    #[test]
    fn test_no_failures_is_ok() {
        let mut v = Validator::new();
        v.min_chars("name", "Jane", 3, "too short");
        assert!(v.finish().is_ok());
    }
}
