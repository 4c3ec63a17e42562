use std::fmt;

use sea_orm::{DbErr, SqlErr};
use serde::Serialize;
use thiserror::Error;

/// A single failed check, attached to the attribute it concerns.
///
/// `base` is used for errors that belong to the record as a whole.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// Ordered collection of validation failures for one record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shorthand for an error list holding exactly one entry.
    pub fn single(field: &'static str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.push(FieldError {
            field,
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.errors.iter()
    }

    /// `Ok(())` when nothing was recorded, otherwise the collected errors.
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }

    /// Messages recorded against `field`, in insertion order.
    pub fn messages_for(&self, field: &str) -> Vec<&str> {
        self.errors
            .iter()
            .filter(|e| e.field == field)
            .map(|e| e.message.as_str())
            .collect()
    }

    /// Human readable sentences, e.g. `"Content can't be blank"`.
    /// Errors on `base` are rendered without an attribute prefix.
    pub fn full_messages(&self) -> Vec<String> {
        self.errors
            .iter()
            .map(|e| {
                if e.field == "base" {
                    e.message.clone()
                } else {
                    format!("{} {}", humanize(e.field), e.message)
                }
            })
            .collect()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.full_messages().join(", "))
    }
}

impl std::error::Error for ValidationErrors {}

/// `sender_id` -> `Sender`, `password_confirmation` -> `Password confirmation`
fn humanize(field: &str) -> String {
    let trimmed = field.strip_suffix("_id").unwrap_or(field);
    let spaced = trimmed.replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Classification every service error collapses into before it reaches the
/// HTTP layer.
#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("validation failed: {0}")]
    Invalid(ValidationErrors),

    #[error("resource not found")]
    NotFound,

    #[error("infrastructure error: {0}")]
    Infra(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ResourceError {
    pub fn infra(error: impl std::error::Error + Send + Sync + 'static) -> Self {
        ResourceError::Infra(Box::new(error))
    }
}

/// True when the database rejected a write because of a unique index.
pub fn is_unique_violation(error: &DbErr) -> bool {
    matches!(error.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

#[derive(Debug, Error)]
pub enum StartError {
    #[error("configuration error")]
    Config(#[from] crate::config::ConfigError),

    #[error("database error")]
    Db(#[from] DbErr),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_messages_prefix_attribute() {
        let mut errors = ValidationErrors::new();
        errors.add("content", "can't be blank");
        errors.add("sender_id", "cannot send friend request to yourself");
        errors.add("base", "already friends with this user");
        errors.add("password_confirmation", "doesn't match Password");

        assert_eq!(
            errors.full_messages(),
            vec![
                "Content can't be blank",
                "Sender cannot send friend request to yourself",
                "already friends with this user",
                "Password confirmation doesn't match Password",
            ]
        );
    }

    #[test]
    fn test_messages_for_field() {
        let mut errors = ValidationErrors::new();
        errors.add("email", "can't be blank");
        errors.add("email", "is invalid");
        errors.add("name", "can't be blank");

        assert_eq!(errors.messages_for("email"), vec!["can't be blank", "is invalid"]);
        assert!(errors.messages_for("password").is_empty());
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn test_into_result() {
        assert!(ValidationErrors::new().into_result().is_ok());
        let err = ValidationErrors::single("content", "can't be blank")
            .into_result()
            .unwrap_err();
        assert_eq!(err.to_string(), "Content can't be blank");
    }
}
