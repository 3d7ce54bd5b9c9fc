use uuid::Uuid;

use crate::{
    api::error,
    modules::user::model::{InsertUser, UpdateUser},
    modules::user::schema::UserEntity,
};

#[async_trait::async_trait]
pub trait UserRepository {
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<UserEntity>, error::SystemError>;

    async fn find_by_email(&self, email: &str)
        -> Result<Option<UserEntity>, error::SystemError>;

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<UserEntity>, error::SystemError>;

    async fn create(&self, user: &InsertUser) -> Result<Uuid, error::SystemError>;

    /// Link a federated identity to an existing account, backfilling profile
    /// fields the account is still missing.
    async fn attach_provider(
        &self,
        id: &Uuid,
        provider_id: &str,
        name: Option<&str>,
        avatar_url: Option<&str>,
    ) -> Result<UserEntity, error::SystemError>;

    async fn update(&self, id: &Uuid, user: &UpdateUser) -> Result<UserEntity, error::SystemError>;

    async fn delete(&self, id: &Uuid) -> Result<bool, error::SystemError>;

    /// Search users by name or email (case-insensitive, partial match)
    async fn search_users(
        &self,
        query: &str,
        limit: i32,
    ) -> Result<Vec<UserEntity>, error::SystemError>;

    /// Ids of all live users except the given ones. Feeds the friend
    /// suggestion candidate pool.
    async fn list_ids_excluding(&self, excluded: &[Uuid])
        -> Result<Vec<Uuid>, error::SystemError>;
}
