// Access control for handlers
//
// The Authentication middleware resolves the caller; `secured!` turns the
// stored outcome into a `Principal` or returns the matching error response.

use actix_web::{HttpMessage, HttpRequest};

use cho_auth::Principal;
use cho_auth::model::AuthContext;
use cho_common::ChoError;
use cho_persistence::model::Role;

#[derive(Debug, Clone)]
pub struct Secured<'a> {
    pub req: &'a HttpRequest,
    /// `None` admits every authenticated role
    pub role: Option<Role>,
}

impl<'a> Secured<'a> {
    pub fn builder(req: &'a HttpRequest) -> SecuredBuilder<'a> {
        SecuredBuilder::new(req)
    }

    /// The authenticated principal, provided its role is admitted.
    pub fn check(&self) -> Result<Principal, ChoError> {
        let context = self.req.extensions().get::<AuthContext>().cloned();
        let principal = match context {
            Some(AuthContext {
                principal: Some(principal),
                ..
            }) => principal,
            Some(AuthContext {
                error: Some(reason),
                ..
            }) => return Err(ChoError::Unauthenticated(reason)),
            _ => return Err(ChoError::Unauthenticated("no token provided".to_string())),
        };

        match self.role {
            Some(Role::Admin) => principal.require_admin()?,
            Some(Role::Encoder) | None => {}
        }
        Ok(principal)
    }
}

#[derive(Debug, Clone)]
pub struct SecuredBuilder<'a> {
    req: &'a HttpRequest,
    role: Option<Role>,
}

impl<'a> SecuredBuilder<'a> {
    pub fn new(req: &'a HttpRequest) -> Self {
        SecuredBuilder { req, role: None }
    }

    pub fn role(mut self, role: Role) -> Self {
        self.role = Some(role);
        self
    }

    pub fn admin(self) -> Self {
        self.role(Role::Admin)
    }

    pub fn build(self) -> Secured<'a> {
        Secured {
            req: self.req,
            role: self.role,
        }
    }
}

/// Evaluates to the caller's `Principal`, or returns the error from the
/// enclosing handler, which must return `Result<_, AppError>`.
#[macro_export]
macro_rules! secured {
    ($secured: expr) => {
        match $secured.check() {
            Ok(__principal) => __principal,
            Err(__e) => return Err($crate::error::AppError::from(__e)),
        }
    };
}
