//! Authentication and account models
//!
//! This file defines the JWT claims, the resolved request principal with its
//! role-scoping rules, and the account request bodies.

use chrono::NaiveDateTime;
use jsonwebtoken::errors::ErrorKind;
use serde::{Deserialize, Serialize};
use validator::Validate;

use cho_common::ChoError;
use cho_common::validation::{validate_email, validate_not_blank, validate_password};
use cho_persistence::model::{Role, UserInfo};

// Auth configuration keys
pub const TOKEN_SECRET_KEY: &str = "cho.auth.token.secret";
pub const TOKEN_EXPIRE_SECONDS: &str = "cho.auth.token.expireSeconds";
pub const COOKIE_SECRET_KEY: &str = "cho.auth.cookie.secret";
pub const COOKIE_SECURE: &str = "cho.auth.cookie.secure";
pub const DEFAULT_TOKEN_EXPIRE_SECONDS: i64 = 28800;

pub const AUTHORIZATION_HEADER: &str = "Authorization";
pub const TOKEN_PREFIX: &str = "Bearer ";
pub const TOKEN_TYPE: &str = "Bearer";
/// Name stored on the access-token row for interactive logins
pub const LOGIN_TOKEN_NAME: &str = "login";
pub const BCRYPT_COST: u32 = 10;

/// JWT payload. `jti` names the personal access token row that keeps the
/// session alive; deleting the row revokes the token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String,
    pub jti: String,
    pub exp: i64,
}

/// The authenticated caller of a request
#[derive(Debug, Clone)]
pub struct Principal {
    pub user: UserInfo,
    pub token_id: String,
}

impl Principal {
    pub fn id(&self) -> i64 {
        self.user.id
    }

    pub fn is_admin(&self) -> bool {
        self.user.role == Role::Admin
    }

    pub fn require_admin(&self) -> Result<(), ChoError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(ChoError::unauthorized_role())
        }
    }

    /// Barangay filter for role-scoped reads. Encoders always see their own
    /// barangay regardless of `requested`; admins see `requested`, or every
    /// barangay when it is `None`.
    pub fn scope_barangay(&self, requested: Option<i64>) -> Result<Option<i64>, ChoError> {
        match self.user.role {
            Role::Admin => Ok(requested),
            Role::Encoder => self
                .user
                .barangay_id
                .map(Some)
                .ok_or_else(ChoError::no_affiliated_barangay),
        }
    }

    /// Write access to a barangay's submissions.
    pub fn ensure_barangay(&self, barangay_id: i64) -> Result<(), ChoError> {
        match self.user.role {
            Role::Admin => Ok(()),
            Role::Encoder => match self.user.barangay_id {
                None => Err(ChoError::no_affiliated_barangay()),
                Some(own) if own == barangay_id => Ok(()),
                Some(_) => Err(ChoError::unauthorized_barangay()),
            },
        }
    }
}

/// Auth context passed through request extensions
#[derive(Debug, Default, Clone)]
pub struct AuthContext {
    pub principal: Option<Principal>,
    /// Raw JWT, kept so logout can evict it from the token cache
    pub token: Option<String>,
    pub token_provided: bool,
    pub error: Option<String>,
}

impl AuthContext {
    pub fn authenticated(principal: Principal, token: String) -> Self {
        Self {
            principal: Some(principal),
            token: Some(token),
            token_provided: true,
            error: None,
        }
    }

    pub fn rejected(error: impl Into<String>) -> Self {
        Self {
            principal: None,
            token: None,
            token_provided: true,
            error: Some(error.into()),
        }
    }
}

/// Human-readable reason for a JWT failure
pub fn jwt_error_string(e: &jsonwebtoken::errors::Error) -> String {
    match e.kind() {
        ErrorKind::ExpiredSignature => "token expired!".to_string(),
        _ => e.to_string(),
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(custom(function = "validate_not_blank"))]
    pub email: String,
    #[validate(custom(function = "validate_not_blank"))]
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginResult {
    pub token: String,
    pub token_type: &'static str,
    pub expires_at: NaiveDateTime,
    pub user: UserInfo,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(
        custom(function = "validate_not_blank"),
        length(max = 255, message = "The name may not be greater than 255 characters.")
    )]
    pub name: String,
    #[validate(custom(function = "validate_email"))]
    pub email: String,
    #[validate(custom(function = "validate_password"))]
    pub password: String,
    pub role: Role,
    pub barangay_id: Option<i64>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(
        custom(function = "validate_not_blank"),
        length(max = 255, message = "The name may not be greater than 255 characters.")
    )]
    pub name: String,
    #[validate(custom(function = "validate_email"))]
    pub email: String,
    /// Keeps the current password when absent
    #[validate(custom(function = "validate_password"))]
    pub password: Option<String>,
    pub role: Role,
    pub barangay_id: Option<i64>,
}
