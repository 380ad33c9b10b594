//! Request validation for the Fleetdesk API
//!
//! Provides type-safe validation with clear error messages. Validation is
//! client-side of the store: a draft that fails here never reaches the
//! network.

use crate::error::{AppError, ValidationBuilder};
use std::collections::HashMap;
use validator::ValidateEmail;

/// Validation result type
pub type ValidationResult<T> = Result<T, AppError>;

/// Minimum length for client, contact, and member names
pub const MIN_NAME_LEN: usize = 2;

fn single(field: &str, message: String) -> AppError {
    let mut d = HashMap::new();
    d.insert(field.to_string(), vec![message]);
    AppError::ValidationError { details: d }
}

/// Email validation
pub mod email {
    use super::*;

    /// Validate email format, normalizing to lowercase
    pub fn validate(value: &str, field: &str) -> ValidationResult<String> {
        let email = value.trim().to_lowercase();
        if email.is_empty() {
            return Err(single(field, format!("{} is required", field)));
        }
        if !email.validate_email() {
            return Err(single(field, "Invalid email format".to_string()));
        }
        Ok(email)
    }
}

/// Validator builder for complex validations
pub struct Validator {
    builder: ValidationBuilder,
}

impl Validator {
    pub fn new() -> Self {
        Self {
            builder: ValidationBuilder::new(),
        }
    }

    /// Add error for a field
    pub fn error(mut self, field: &str, message: &str) -> Self {
        self.builder = self.builder.error(field, message);
        self
    }

    /// Add error if condition is true
    pub fn error_if(self, condition: bool, field: &str, message: &str) -> Self {
        if condition {
            self.error(field, message)
        } else {
            self
        }
    }

    /// Validate required string with minimum trimmed length
    pub fn min_length(self, value: &str, field: &str, min: usize) -> Self {
        if value.trim().chars().count() < min {
            self.error(field, &format!("{} must be at least {} characters", field, min))
        } else {
            self
        }
    }

    /// Validate email format if a non-empty value is present
    pub fn email(self, value: &Option<String>, field: &str) -> Self {
        match value {
            Some(e) if !e.trim().is_empty() => {
                if email::validate(e, field).is_err() {
                    self.error(field, "Invalid email format")
                } else {
                    self
                }
            }
            _ => self,
        }
    }

    /// Finish validation, returning error if any
    pub fn finish(self) -> ValidationResult<()> {
        match self.builder.build() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Finish, returning the accumulated field errors instead of an error type
    pub fn into_field_errors(self) -> HashMap<String, Vec<String>> {
        self.builder.into_details()
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_validation() {
        assert_eq!(
            email::validate("Test@Example.com", "email").unwrap(),
            "test@example.com"
        );
        assert!(email::validate("invalid", "email").is_err());
        assert!(email::validate("", "email").is_err());
    }

    #[test]
    fn test_validator_builder() {
        let result = Validator::new()
            .min_length("Acme Ltd", "name", MIN_NAME_LEN)
            .email(&Some("jane@acme.test".to_string()), "email")
            .finish();
        assert!(result.is_ok());

        let result = Validator::new()
            .min_length("A", "name", MIN_NAME_LEN)
            .email(&Some("invalid".to_string()), "email")
            .finish();
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_email_passes_builder() {
        let errors = Validator::new()
            .email(&Some("   ".to_string()), "email")
            .email(&None, "email")
            .into_field_errors();
        assert!(errors.is_empty());
    }
}
