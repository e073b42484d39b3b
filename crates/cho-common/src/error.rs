//! Error types and error codes for the City Health Office backend
//!
//! This module defines:
//! - `ChoError`: classified application failures
//! - `ErrorCode`: structured error codes for API responses

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Field name -> messages, in the shape the admin frontend renders under each input.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Application-specific error types
#[derive(thiserror::Error, Debug)]
pub enum ChoError {
    #[error("{message}")]
    Validation {
        message: String,
        errors: FieldErrors,
    },

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthenticated(String),

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("{message}")]
    Forbidden {
        code: ErrorCode<'static>,
        message: String,
    },

    #[error("{0} not found")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("report submission {0} has already been submitted")]
    AlreadySubmitted(i64),

    #[error("report submissions for {year}-{month:02} already exist")]
    DuplicateTemplate { year: i32, month: u32 },

    #[error("an appointment for this category and date is already booked")]
    DuplicateAppointment,

    #[error("database error: {0}")]
    DatabaseError(String),

    #[error("internal error: {0}")]
    InternalError(String),
}

impl ChoError {
    /// A single-field validation failure.
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        let mut errors = FieldErrors::new();
        errors.insert(field.to_string(), vec![message.clone()]);
        ChoError::Validation { message, errors }
    }

    pub fn validation_errors(errors: FieldErrors) -> Self {
        let message = errors
            .values()
            .flat_map(|messages| messages.first())
            .next()
            .cloned()
            .unwrap_or_else(|| VALIDATION_FAILED.message.to_string());
        ChoError::Validation { message, errors }
    }

    pub fn unauthorized_role() -> Self {
        ChoError::Forbidden {
            code: UNAUTHORIZED_ROLE,
            message: UNAUTHORIZED_ROLE.message.to_string(),
        }
    }

    pub fn account_disabled() -> Self {
        ChoError::Forbidden {
            code: ACCOUNT_DISABLED,
            message: ACCOUNT_DISABLED.message.to_string(),
        }
    }

    pub fn no_affiliated_barangay() -> Self {
        ChoError::Forbidden {
            code: NO_AFFILIATED_BARANGAY,
            message: NO_AFFILIATED_BARANGAY.message.to_string(),
        }
    }

    pub fn unauthorized_barangay() -> Self {
        ChoError::Forbidden {
            code: UNAUTHORIZED_BARANGAY,
            message: UNAUTHORIZED_BARANGAY.message.to_string(),
        }
    }

    pub fn parameter_missing(name: &str) -> Self {
        ChoError::BadRequest(format!("Required parameter '{}' is missing", name))
    }

    /// The structured code reported in the response body.
    pub fn error_code(&self) -> ErrorCode<'static> {
        match self {
            ChoError::Validation { .. } => VALIDATION_FAILED,
            ChoError::BadRequest(_) => PARAMETER_MISSING,
            ChoError::Unauthenticated(_) => UNAUTHENTICATED,
            ChoError::InvalidCredentials => INVALID_CREDENTIALS,
            ChoError::Forbidden { code, .. } => code.clone(),
            ChoError::NotFound(_) => RESOURCE_NOT_FOUND,
            ChoError::Conflict(_) => RESOURCE_CONFLICT,
            ChoError::AlreadySubmitted(_) => ALREADY_SUBMITTED,
            ChoError::DuplicateTemplate { .. } => DUPLICATE_TEMPLATE,
            ChoError::DuplicateAppointment => DUPLICATE_APPOINTMENT,
            ChoError::DatabaseError(_) => DATA_ACCESS_ERROR,
            ChoError::InternalError(_) => SERVER_ERROR,
        }
    }
}

/// Error code structure for API responses
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorCode<'a> {
    pub code: &'a str,
    pub message: &'a str,
}

pub const SUCCESS: ErrorCode<'static> = ErrorCode {
    code: "SUCCESS",
    message: "success",
};

pub const VALIDATION_FAILED: ErrorCode<'static> = ErrorCode {
    code: "VALIDATION_FAILED",
    message: "The given data was invalid.",
};

pub const PARAMETER_MISSING: ErrorCode<'static> = ErrorCode {
    code: "PARAMETER_MISSING",
    message: "parameter missing",
};

pub const UNAUTHENTICATED: ErrorCode<'static> = ErrorCode {
    code: "UNAUTHENTICATED",
    message: "Unauthenticated.",
};

pub const INVALID_CREDENTIALS: ErrorCode<'static> = ErrorCode {
    code: "INVALID_CREDENTIALS",
    message: "The provided credentials are incorrect.",
};

pub const UNAUTHORIZED_ROLE: ErrorCode<'static> = ErrorCode {
    code: "UNAUTHORIZED_ROLE",
    message: "You are not authorized to perform this action.",
};

pub const ACCOUNT_DISABLED: ErrorCode<'static> = ErrorCode {
    code: "ACCOUNT_DISABLED",
    message: "Your account has been disabled.",
};

pub const NO_AFFILIATED_BARANGAY: ErrorCode<'static> = ErrorCode {
    code: "NO_AFFILIATED_BARANGAY",
    message: "Encoder does not have an affiliated barangay.",
};

pub const UNAUTHORIZED_BARANGAY: ErrorCode<'static> = ErrorCode {
    code: "UNAUTHORIZED_BARANGAY",
    message: "You can only submit reports for your own barangay.",
};

pub const RESOURCE_NOT_FOUND: ErrorCode<'static> = ErrorCode {
    code: "RESOURCE_NOT_FOUND",
    message: "resource not found",
};

pub const RESOURCE_CONFLICT: ErrorCode<'static> = ErrorCode {
    code: "RESOURCE_CONFLICT",
    message: "resource conflict",
};

pub const ALREADY_SUBMITTED: ErrorCode<'static> = ErrorCode {
    code: "ALREADY_SUBMITTED",
    message: "report already submitted",
};

pub const DUPLICATE_TEMPLATE: ErrorCode<'static> = ErrorCode {
    code: "DUPLICATE_TEMPLATE",
    message: "report submissions for this period already exist",
};

pub const DUPLICATE_APPOINTMENT: ErrorCode<'static> = ErrorCode {
    code: "DUPLICATE_APPOINTMENT",
    message: "duplicate appointment",
};

pub const DATA_ACCESS_ERROR: ErrorCode<'static> = ErrorCode {
    code: "DATA_ACCESS_ERROR",
    message: "data access error",
};

pub const SERVER_ERROR: ErrorCode<'static> = ErrorCode {
    code: "SERVER_ERROR",
    message: "Something went wrong. Please try again later.",
};
