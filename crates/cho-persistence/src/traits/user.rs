//! User and access-token persistence trait

use async_trait::async_trait;
use chrono::NaiveDateTime;

use crate::model::{NewToken, NewUser, Page, TokenInfo, UserChanges, UserInfo, UserQuery};

#[async_trait]
pub trait UserPersistence: Send + Sync {
    // ==================== User Operations ====================

    async fn user_find_by_id(&self, id: i64) -> anyhow::Result<Option<UserInfo>>;

    async fn user_find_by_email(&self, email: &str) -> anyhow::Result<Option<UserInfo>>;

    /// Search users with pagination, ordered by name
    async fn user_find_page(
        &self,
        query: &UserQuery,
        page_no: u64,
        page_size: u64,
    ) -> anyhow::Result<Page<UserInfo>>;

    /// Active encoders of a barangay, the recipients of pending notices
    async fn user_find_active_encoders(&self, barangay_id: i64) -> anyhow::Result<Vec<UserInfo>>;

    async fn user_create(&self, user: NewUser, now: NaiveDateTime) -> anyhow::Result<UserInfo>;

    async fn user_update(
        &self,
        id: i64,
        changes: UserChanges,
        now: NaiveDateTime,
    ) -> anyhow::Result<Option<UserInfo>>;

    /// Marks the user disabled and deletes all of their access tokens in one
    /// transaction. Returns the number of tokens revoked, or `None` if the
    /// user does not exist.
    async fn user_disable(&self, id: i64, now: NaiveDateTime) -> anyhow::Result<Option<u64>>;

    // ==================== Token Operations ====================

    async fn token_create(&self, token: NewToken, now: NaiveDateTime) -> anyhow::Result<TokenInfo>;

    async fn token_find(&self, token_id: &str) -> anyhow::Result<Option<TokenInfo>>;

    async fn token_touch(&self, token_id: &str, now: NaiveDateTime) -> anyhow::Result<()>;

    async fn token_delete(&self, token_id: &str) -> anyhow::Result<bool>;
}
