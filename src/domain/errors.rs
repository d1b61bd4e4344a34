//! Domain errors. Used by ports and use cases.
//!
//! Adapters map infrastructure errors into these.

use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Repository error: {0}")]
    Repo(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Password hashing failed: {0}")]
    PasswordHash(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Input error: {0}")]
    Input(String),
}

impl DomainError {
    /// Field-level messages when this is a validation failure.
    pub fn as_validation(&self) -> Option<&ValidationError> {
        match self {
            Self::Validation(v) => Some(v),
            _ => None,
        }
    }
}

/// Field-level validation failure. Field name -> messages, ordered by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationError {
    fields: BTreeMap<String, Vec<String>>,
}

impl ValidationError {
    pub fn new() -> Self {
        Self::default()
    }

    /// Error carrying a single message for one field.
    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut err = Self::new();
        err.add(field, message);
        err
    }

    pub fn invalid_choice(field: &str, value: &str) -> Self {
        Self::single(field, format!("Value '{}' is not a valid choice.", value))
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.fields
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Messages for `field`; empty if the field is valid.
    pub fn messages(&self, field: &str) -> &[String] {
        self.fields.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// `Ok(())` when nothing was collected.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.fields {
            for message in messages {
                if !first {
                    f.write_str("; ")?;
                }
                write!(f, "{}: {}", field, message)?;
                first = false;
            }
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collects_messages_per_field_in_order() {
        let mut err = ValidationError::new();
        assert!(err.is_empty());
        err.add("phone_number", "bad format");
        err.add("city", "too long");
        err.add("phone_number", "too long");

        assert!(err.has_field("city"));
        assert_eq!(err.messages("phone_number"), ["bad format", "too long"]);
        assert!(err.messages("bio").is_empty());
        assert_eq!(
            err.to_string(),
            "city: too long; phone_number: bad format; phone_number: too long"
        );
    }

    #[test]
    fn test_into_result_and_domain_conversion() {
        assert!(ValidationError::new().into_result().is_ok());

        let err: DomainError = ValidationError::single("username", "taken").into();
        assert!(err.to_string().starts_with("Validation failed: username: taken"));
        assert_eq!(err.as_validation().unwrap().messages("username"), ["taken"]);
        assert!(DomainError::Repo("x".into()).as_validation().is_none());
    }
}
