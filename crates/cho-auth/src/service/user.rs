//! User account management

use std::sync::Arc;

use cho_common::validation::normalize_email;
use cho_common::{ChoError, Clock, validate_request};
use cho_persistence::PersistenceService;
use cho_persistence::model::{NewUser, Page, Role, UserChanges, UserInfo, UserQuery};
use tracing::info;

use crate::model::{CreateUserRequest, Principal, UpdateUserRequest};
use crate::service::password;

#[derive(Clone)]
pub struct UserService {
    persistence: Arc<dyn PersistenceService>,
    clock: Arc<dyn Clock>,
}

impl UserService {
    pub fn new(persistence: Arc<dyn PersistenceService>, clock: Arc<dyn Clock>) -> Self {
        Self { persistence, clock }
    }

    pub async fn list(
        &self,
        query: &UserQuery,
        page_no: u64,
        page_size: u64,
    ) -> anyhow::Result<Page<UserInfo>> {
        self.persistence
            .user_find_page(query, page_no.max(1), page_size)
            .await
    }

    pub async fn get(&self, id: i64) -> anyhow::Result<UserInfo> {
        self.persistence
            .user_find_by_id(id)
            .await?
            .ok_or_else(|| ChoError::NotFound(format!("user {}", id)).into())
    }

    pub async fn create(&self, request: CreateUserRequest) -> anyhow::Result<UserInfo> {
        validate_request(&request)?;
        let barangay_id = self.affiliation(request.role, request.barangay_id).await?;

        let user = self
            .persistence
            .user_create(
                NewUser {
                    name: request.name.trim().to_string(),
                    email: normalize_email(&request.email),
                    password_hash: password::hash_password(&request.password)?,
                    role: request.role,
                    barangay_id,
                },
                self.clock.now(),
            )
            .await?;

        info!(user_id = user.id, role = %user.role, "user created");
        Ok(user)
    }

    pub async fn update(&self, id: i64, request: UpdateUserRequest) -> anyhow::Result<UserInfo> {
        validate_request(&request)?;
        let barangay_id = self.affiliation(request.role, request.barangay_id).await?;
        let password_hash = match request.password.as_deref() {
            Some(password) => Some(password::hash_password(password)?),
            None => None,
        };

        self.persistence
            .user_update(
                id,
                UserChanges {
                    name: request.name.trim().to_string(),
                    email: normalize_email(&request.email),
                    password_hash,
                    role: request.role,
                    barangay_id,
                },
                self.clock.now(),
            )
            .await?
            .ok_or_else(|| ChoError::NotFound(format!("user {}", id)).into())
    }

    /// Disables the account and revokes every access token it holds.
    pub async fn disable(&self, actor: &Principal, id: i64) -> anyhow::Result<UserInfo> {
        if actor.id() == id {
            return Err(ChoError::validation("id", "You cannot disable your own account.").into());
        }

        let revoked = self
            .persistence
            .user_disable(id, self.clock.now())
            .await?
            .ok_or_else(|| ChoError::NotFound(format!("user {}", id)))?;

        info!(user_id = id, revoked_tokens = revoked, "user disabled");
        self.get(id).await
    }

    /// Creates the bootstrap admin, or resets the password of an existing
    /// account with that email and promotes it to admin.
    pub async fn seed_admin(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> anyhow::Result<UserInfo> {
        cho_common::validation::validate_password(password).map_err(|e| {
            ChoError::validation("password", e.message.unwrap_or_default().into_owned())
        })?;
        let password_hash = password::hash_password(password)?;
        let now = self.clock.now();
        let email = normalize_email(email);

        match self.persistence.user_find_by_email(&email).await? {
            Some(existing) => self
                .persistence
                .user_update(
                    existing.id,
                    UserChanges {
                        name: name.to_string(),
                        email: existing.email.clone(),
                        password_hash: Some(password_hash),
                        role: Role::Admin,
                        barangay_id: None,
                    },
                    now,
                )
                .await?
                .ok_or_else(|| ChoError::NotFound(format!("user {}", existing.id)).into()),
            None => {
                self.persistence
                    .user_create(
                        NewUser {
                            name: name.to_string(),
                            email,
                            password_hash,
                            role: Role::Admin,
                            barangay_id: None,
                        },
                        now,
                    )
                    .await
            }
        }
    }

    /// Encoders must belong to an existing barangay; admins never carry one.
    async fn affiliation(&self, role: Role, barangay_id: Option<i64>) -> anyhow::Result<Option<i64>> {
        match role {
            Role::Admin => Ok(None),
            Role::Encoder => {
                let id = barangay_id.ok_or_else(|| {
                    ChoError::validation("barangay_id", "The barangay field is required for encoders.")
                })?;
                if self.persistence.barangay_find_by_id(id).await?.is_none() {
                    return Err(
                        ChoError::validation("barangay_id", "The selected barangay is invalid.").into(),
                    );
                }
                Ok(Some(id))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};
    use cho_common::FixedClock;
    use cho_persistence::MemoryPersistService;
    use cho_persistence::model::UserStatus;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 1)
            .and_then(|d| d.and_hms_opt(8, 0, 0))
            .unwrap()
    }

    fn service() -> UserService {
        UserService::new(
            Arc::new(MemoryPersistService::seeded(now())),
            Arc::new(FixedClock::new(now())),
        )
    }

    fn create_request(email: &str, role: Role, barangay_id: Option<i64>) -> CreateUserRequest {
        CreateUserRequest {
            name: "Maria Santos".to_string(),
            email: email.to_string(),
            password: "password123".to_string(),
            role,
            barangay_id,
        }
    }

    fn validation_fields(err: &anyhow::Error) -> Vec<String> {
        match err.downcast_ref::<ChoError>() {
            Some(ChoError::Validation { errors, .. }) => errors.keys().cloned().collect(),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    fn principal(user: UserInfo) -> Principal {
        Principal {
            user,
            token_id: "t".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_encoder() {
        let service = service();
        let user = service
            .create(create_request("maria@cho.gov.ph", Role::Encoder, Some(2)))
            .await
            .unwrap();
        assert_eq!(user.role, Role::Encoder);
        assert_eq!(user.barangay_id, Some(2));
        assert!(user.barangay_name.is_some());
        assert_eq!(user.status, UserStatus::Active);
        assert!(password::verify_password("password123", &user.password));
    }

    #[tokio::test]
    async fn test_encoder_requires_existing_barangay() {
        let service = service();
        let err = service
            .create(create_request("a@cho.gov.ph", Role::Encoder, None))
            .await
            .unwrap_err();
        assert_eq!(validation_fields(&err), vec!["barangay_id"]);

        let err = service
            .create(create_request("a@cho.gov.ph", Role::Encoder, Some(99)))
            .await
            .unwrap_err();
        assert_eq!(validation_fields(&err), vec!["barangay_id"]);
    }

    #[tokio::test]
    async fn test_admin_barangay_is_cleared() {
        let user = service()
            .create(create_request("admin@cho.gov.ph", Role::Admin, Some(3)))
            .await
            .unwrap();
        assert_eq!(user.barangay_id, None);
    }

    #[tokio::test]
    async fn test_duplicate_email_and_short_password() {
        let service = service();
        service
            .create(create_request("dup@cho.gov.ph", Role::Admin, None))
            .await
            .unwrap();
        let err = service
            .create(create_request("dup@cho.gov.ph", Role::Admin, None))
            .await
            .unwrap_err();
        assert_eq!(validation_fields(&err), vec!["email"]);

        let mut request = create_request("short@cho.gov.ph", Role::Admin, None);
        request.password = "short".to_string();
        let err = service.create(request).await.unwrap_err();
        assert_eq!(validation_fields(&err), vec!["password"]);
    }

    #[tokio::test]
    async fn test_email_is_stored_lowercase() {
        let service = service();
        let user = service
            .create(create_request(" Maria.Santos@CHO.gov.ph ", Role::Encoder, Some(2)))
            .await
            .unwrap();
        assert_eq!(user.email, "maria.santos@cho.gov.ph");

        // differing only by case is still a duplicate
        let err = service
            .create(create_request("MARIA.SANTOS@cho.gov.ph", Role::Admin, None))
            .await
            .unwrap_err();
        assert_eq!(validation_fields(&err), vec!["email"]);

        let updated = service
            .update(
                user.id,
                UpdateUserRequest {
                    name: "Maria Santos".to_string(),
                    email: "Maria@CHO.gov.ph".to_string(),
                    password: None,
                    role: Role::Encoder,
                    barangay_id: Some(2),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.email, "maria@cho.gov.ph");

        let admin = service
            .seed_admin("Root", "Root@CHO.gov.ph", "password123")
            .await
            .unwrap();
        assert_eq!(admin.email, "root@cho.gov.ph");
    }

    #[tokio::test]
    async fn test_update_keeps_password_when_absent() {
        let service = service();
        let user = service
            .create(create_request("keep@cho.gov.ph", Role::Encoder, Some(1)))
            .await
            .unwrap();
        let updated = service
            .update(
                user.id,
                UpdateUserRequest {
                    name: "Renamed".to_string(),
                    email: "keep@cho.gov.ph".to_string(),
                    password: None,
                    role: Role::Encoder,
                    barangay_id: Some(4),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Renamed");
        assert_eq!(updated.barangay_id, Some(4));
        assert_eq!(updated.password, user.password);
    }

    #[tokio::test]
    async fn test_disable_rules() {
        let service = service();
        let admin = service
            .create(create_request("boss@cho.gov.ph", Role::Admin, None))
            .await
            .unwrap();
        let encoder = service
            .create(create_request("enc@cho.gov.ph", Role::Encoder, Some(1)))
            .await
            .unwrap();
        let actor = principal(admin.clone());

        let err = service.disable(&actor, admin.id).await.unwrap_err();
        assert_eq!(validation_fields(&err), vec!["id"]);

        let disabled = service.disable(&actor, encoder.id).await.unwrap();
        assert_eq!(disabled.status, UserStatus::Disabled);

        let err = service.disable(&actor, 999).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ChoError>(),
            Some(ChoError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_seed_admin_is_idempotent() {
        let service = service();
        let first = service
            .seed_admin("Admin", "root@cho.gov.ph", "password123")
            .await
            .unwrap();
        let second = service
            .seed_admin("Admin", "root@cho.gov.ph", "another-pass")
            .await
            .unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(second.role, Role::Admin);
        assert!(password::verify_password("another-pass", &second.password));
    }
}
