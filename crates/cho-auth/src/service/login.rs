//! Login, token resolution and logout

use std::sync::Arc;

use cho_common::validation::normalize_email;
use cho_common::{ChoError, Clock};
use cho_persistence::PersistenceService;
use cho_persistence::model::NewToken;
use tracing::{debug, info, warn};

use crate::model::{
    DEFAULT_TOKEN_EXPIRE_SECONDS, LOGIN_TOKEN_NAME, LoginResult, Principal, TOKEN_TYPE,
    jwt_error_string,
};
use crate::service::{password, token};

/// Token signing settings
#[derive(Debug, Clone)]
pub struct AuthSettings {
    /// Base64 encoded HS256 secret
    pub token_secret: String,
    pub expire_seconds: i64,
}

impl AuthSettings {
    pub fn new(token_secret: impl Into<String>) -> Self {
        Self {
            token_secret: token_secret.into(),
            expire_seconds: DEFAULT_TOKEN_EXPIRE_SECONDS,
        }
    }
}

#[derive(Clone)]
pub struct AuthService {
    persistence: Arc<dyn PersistenceService>,
    clock: Arc<dyn Clock>,
    settings: AuthSettings,
}

impl AuthService {
    pub fn new(
        persistence: Arc<dyn PersistenceService>,
        clock: Arc<dyn Clock>,
        settings: AuthSettings,
    ) -> Self {
        Self {
            persistence,
            clock,
            settings,
        }
    }

    /// Checks credentials and issues a JWT backed by a new access-token row.
    pub async fn login(&self, email: &str, password: &str) -> anyhow::Result<LoginResult> {
        let user = match self
            .persistence
            .user_find_by_email(&normalize_email(email))
            .await?
        {
            Some(user) if password::verify_password(password, &user.password) => user,
            _ => {
                warn!(email = %email, "login rejected: invalid credentials");
                return Err(ChoError::InvalidCredentials.into());
            }
        };

        if !user.is_active() {
            warn!(user_id = user.id, "login rejected: account disabled");
            return Err(ChoError::account_disabled().into());
        }

        let now = self.clock.now();
        let expires_at = now + chrono::Duration::seconds(self.settings.expire_seconds);
        let token_id = uuid::Uuid::new_v4().to_string();

        self.persistence
            .token_create(
                NewToken {
                    user_id: user.id,
                    token_id: token_id.clone(),
                    name: LOGIN_TOKEN_NAME.to_string(),
                    expires_at,
                },
                now,
            )
            .await?;

        let (token, _) = token::encode_jwt_token(
            user.id,
            &token_id,
            &self.settings.token_secret,
            self.settings.expire_seconds,
        )?;

        info!(user_id = user.id, role = %user.role, "user logged in");

        Ok(LoginResult {
            token,
            token_type: TOKEN_TYPE,
            expires_at,
            user,
        })
    }

    /// Resolves a presented JWT to its principal. The token row must still
    /// exist and be unexpired, and the user must be active.
    pub async fn resolve(&self, jwt: &str) -> anyhow::Result<Principal> {
        let claims = token::decode_jwt_token_cached(jwt, &self.settings.token_secret)
            .map_err(|e| ChoError::Unauthenticated(jwt_error_string(&e)))?;

        let now = self.clock.now();
        let row = match self.persistence.token_find(&claims.jti).await? {
            Some(row) if row.expires_at > now && row.user_id.to_string() == claims.sub => row,
            _ => {
                debug!(token_id = %claims.jti, "token row missing or expired");
                token::invalidate_token(jwt, &self.settings.token_secret);
                return Err(unauthenticated());
            }
        };

        let user = match self.persistence.user_find_by_id(row.user_id).await? {
            Some(user) if user.is_active() => user,
            _ => return Err(unauthenticated()),
        };

        self.persistence.token_touch(&row.token_id, now).await?;

        Ok(Principal {
            user,
            token_id: row.token_id,
        })
    }

    /// Revokes the token row behind the current session.
    pub async fn logout(&self, principal: &Principal, jwt: Option<&str>) -> anyhow::Result<()> {
        self.persistence.token_delete(&principal.token_id).await?;
        if let Some(jwt) = jwt {
            token::invalidate_token(jwt, &self.settings.token_secret);
        }
        info!(user_id = principal.id(), "user logged out");
        Ok(())
    }
}

fn unauthenticated() -> anyhow::Error {
    ChoError::Unauthenticated(cho_common::error::UNAUTHENTICATED.message.to_string()).into()
}
