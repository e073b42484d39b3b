//! Input validation utilities
//!
//! Request DTOs derive `validator::Validate`; `validate_request` turns the
//! resulting error tree into the flat field map the API reports on 422.

use std::borrow::Cow;

use validator::{Validate, ValidationError, ValidationErrors, ValidationErrorsKind};

use crate::error::{ChoError, FieldErrors};

/// Maximum length for names (people, barangays, categories)
pub const MAX_NAME_LENGTH: usize = 255;

/// Minimum password length for accounts
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// bcrypt ignores everything past 72 bytes
pub const MAX_PASSWORD_LENGTH: usize = 72;

/// Runs the derived validators and maps failures to `ChoError::Validation`.
pub fn validate_request<T: Validate>(request: &T) -> Result<(), ChoError> {
    match request.validate() {
        Ok(()) => Ok(()),
        Err(errors) => {
            let mut fields = FieldErrors::new();
            collect("", &errors, &mut fields);
            Err(ChoError::validation_errors(fields))
        }
    }
}

fn collect(prefix: &str, errors: &ValidationErrors, out: &mut FieldErrors) {
    for (field, kind) in errors.errors() {
        let key = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{}.{}", prefix, field)
        };
        match kind {
            ValidationErrorsKind::Field(list) => {
                let messages = out.entry(key.clone()).or_default();
                messages.extend(list.iter().map(|e| message_for(&key, e)));
            }
            ValidationErrorsKind::Struct(inner) => collect(&key, inner, out),
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    collect(&format!("{}.{}", key, index), inner, out);
                }
            }
        }
    }
}

fn message_for(key: &str, error: &ValidationError) -> String {
    match &error.message {
        Some(message) => message.to_string(),
        None => {
            let field = key.rsplit('.').next().unwrap_or(key).replace('_', " ");
            format!("The {} field is invalid.", field)
        }
    }
}

/// A validation error carrying a display message.
pub fn invalid(code: &'static str, message: impl Into<Cow<'static, str>>) -> ValidationError {
    ValidationError::new(code).with_message(message.into())
}

/// Rejects blank strings; `length(min = 1)` accepts whitespace.
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(invalid("blank", "This field is required."));
    }
    Ok(())
}

/// Stored and looked-up form of an account email: trimmed, lowercase.
pub fn normalize_email(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Shape check only: one `@`, a dotted domain, no whitespace.
pub fn validate_email(value: &str) -> Result<(), ValidationError> {
    let value = value.trim();
    let Some((local, domain)) = value.split_once('@') else {
        return Err(invalid("email", "The email must be a valid email address."));
    };
    let valid = !local.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !value.chars().any(char::is_whitespace)
        && !domain.contains('@');
    if valid {
        Ok(())
    } else {
        Err(invalid("email", "The email must be a valid email address."))
    }
}

pub fn validate_password(value: &str) -> Result<(), ValidationError> {
    if value.len() < MIN_PASSWORD_LENGTH {
        return Err(invalid(
            "password_too_short",
            format!(
                "The password must be at least {} characters.",
                MIN_PASSWORD_LENGTH
            ),
        ));
    }
    if value.len() > MAX_PASSWORD_LENGTH {
        return Err(invalid(
            "password_too_long",
            format!(
                "The password may not be greater than {} characters.",
                MAX_PASSWORD_LENGTH
            ),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Validate)]
    struct Line {
        #[validate(range(min = 0, message = "The male count must be at least 0."))]
        male: i64,
    }

    #[derive(Validate)]
    struct Form {
        #[validate(custom(function = "validate_not_blank"))]
        name: String,
        #[validate(nested)]
        lines: Vec<Line>,
    }

    #[test]
    fn test_validate_request_flattens_nested_errors() {
        let form = Form {
            name: "  ".to_string(),
            lines: vec![Line { male: 1 }, Line { male: -4 }],
        };
        let err = validate_request(&form).unwrap_err();
        let ChoError::Validation { errors, .. } = err else {
            panic!("expected validation error");
        };
        assert_eq!(errors["name"], vec!["This field is required."]);
        assert_eq!(
            errors["lines.1.male"],
            vec!["The male count must be at least 0."]
        );
        assert!(!errors.contains_key("lines.0.male"));
    }

    #[test]
    fn test_validate_request_ok() {
        let form = Form {
            name: "Poblacion".to_string(),
            lines: vec![],
        };
        assert!(validate_request(&form).is_ok());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("encoder@cho.gov.ph").is_ok());
        assert!(validate_email("encoder@localhost").is_err());
        assert!(validate_email("no-at-sign").is_err());
        assert!(validate_email("a b@cho.gov.ph").is_err());
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Encoder@CHO.gov.ph "), "encoder@cho.gov.ph");
        assert_eq!(normalize_email("encoder@cho.gov.ph"), "encoder@cho.gov.ph");
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("longenough").is_ok());
        assert!(validate_password("short").is_err());
        assert!(validate_password(&"x".repeat(80)).is_err());
    }
}
