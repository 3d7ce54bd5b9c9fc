use log::info;
use std::sync::Arc;
use uuid::Uuid;

use crate::api::error;
use crate::configs::RedisCache;
use crate::ENV;

use crate::modules::user::model::{
    SignInModel, SignUpModel, UpdateUser, UpdateUserModel, UserResponse,
};
use crate::modules::user::schema::UserEntity;
use crate::modules::user::{model::InsertUser, repository::UserRepository};
use crate::utils::{hash_password, verify_password, Claims, IdentityVerifier, TypeClaims};

#[derive(Clone)]
pub struct UserService {
    repo: Arc<dyn UserRepository + Send + Sync>,
    cache: Arc<RedisCache>,
    verifier: Arc<dyn IdentityVerifier + Send + Sync>,
}

impl UserService {
    pub fn with_dependencies(
        repo: Arc<dyn UserRepository + Send + Sync>,
        cache: Arc<RedisCache>,
        verifier: Arc<dyn IdentityVerifier + Send + Sync>,
    ) -> Self {
        info!("UserService initialized with dependencies");
        UserService { repo, cache, verifier }
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<UserResponse, error::SystemError> {
        let key = format!("user:{}", id);
        if let Some(cached_user) = self.cache.get::<UserResponse>(&key).await? {
            info!("User {} found in cache", id);
            return Ok(cached_user);
        }
        let user_entity = self.repo.find_by_id(&id).await?;
        if let Some(entity) = user_entity {
            self.cache.set(&key, &UserResponse::from(entity.clone()), 3600).await?;
            Ok(UserResponse::from(entity))
        } else {
            Err(error::SystemError::not_found("User not found"))
        }
    }

    pub async fn update_user(
        &self,
        id: Uuid,
        user: UpdateUserModel,
    ) -> Result<UserResponse, error::SystemError> {
        if user.name.is_none() && user.avatar_url.is_none() && user.bio.is_none() {
            return Err(error::SystemError::bad_request("No fields to update"));
        }

        let update_user =
            UpdateUser { name: user.name, avatar_url: user.avatar_url, bio: user.bio };

        let updated = self.repo.update(&id, &update_user).await?;

        let key = format!("user:{}", id);
        self.cache.delete(&key).await?;
        Ok(UserResponse::from(updated))
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), error::SystemError> {
        if !self.repo.delete(&id).await? {
            return Err(error::SystemError::not_found("User not found"));
        }
        let key = format!("user:{}", id);
        self.cache.delete(&key).await?;
        Ok(())
    }

    pub async fn search(
        &self,
        requester_id: Uuid,
        query: &str,
        limit: i32,
    ) -> Result<Vec<UserResponse>, error::SystemError> {
        let users = self.repo.search_users(query, limit).await?;
        Ok(users
            .into_iter()
            .filter(|u| u.id != requester_id)
            .map(UserResponse::from)
            .collect())
    }

    pub async fn sign_up(&self, user: SignUpModel) -> Result<Uuid, error::SystemError> {
        let hash_password = hash_password(&user.password)?;

        let new_user = InsertUser {
            email: user.email,
            hash_password: Some(hash_password),
            name: user.name,
            provider_id: None,
        };

        let user_id = self.repo.create(&new_user).await?;
        Ok(user_id)
    }

    pub async fn sign_in(&self, user: SignInModel) -> Result<(String, String), error::SystemError> {
        let user_entity = self
            .repo
            .find_by_email(&user.email)
            .await?
            .ok_or_else(|| error::SystemError::unauthorized("Invalid email or password"))?;

        // Federated-only accounts carry no password hash.
        let hash = user_entity
            .hash_password
            .as_deref()
            .ok_or_else(|| error::SystemError::unauthorized("Invalid email or password"))?;

        let valid = verify_password(hash, &user.password)?;
        if !valid {
            return Err(error::SystemError::unauthorized("Invalid email or password"));
        }

        self.issue_tokens(&user_entity).await
    }

    pub async fn federated_sign_in(
        &self,
        id_token: &str,
    ) -> Result<(String, String), error::SystemError> {
        let identity = self.verifier.verify(id_token).await?;

        let user_entity = match self.repo.find_by_email(&identity.email).await? {
            Some(existing) => {
                let linked = self
                    .repo
                    .attach_provider(
                        &existing.id,
                        &identity.subject,
                        identity.name.as_deref(),
                        identity.picture.as_deref(),
                    )
                    .await?;
                self.cache.delete(&format!("user:{}", linked.id)).await?;
                linked
            }
            None => {
                let new_user = InsertUser {
                    name: identity.name.unwrap_or_else(|| identity.email.clone()),
                    email: identity.email,
                    hash_password: None,
                    provider_id: Some(identity.subject),
                };
                let id = self.repo.create(&new_user).await?;
                self.repo
                    .find_by_id(&id)
                    .await?
                    .ok_or_else(|| error::SystemError::not_found("User not found"))?
            }
        };

        self.issue_tokens(&user_entity).await
    }

    pub async fn refresh(
        &self,
        refresh_token: Option<String>,
    ) -> Result<(String, String), error::SystemError> {
        let token = refresh_token
            .ok_or_else(|| error::SystemError::unauthorized("Missing refresh token"))?;

        let claims = Claims::decode(&token, ENV.jwt_secret.as_ref())
            .map_err(|_| error::SystemError::unauthorized("Token invalid or expired"))?;

        let jti = claims
            .jti
            .ok_or_else(|| error::SystemError::unauthorized("Token invalid or expired"))?;

        let refresh_key = format!("refresh_token:{jti}");
        let stored: Option<Uuid> = self.cache.get(&refresh_key).await?;
        if stored != Some(claims.sub) {
            return Err(error::SystemError::unauthorized("Token invalid or expired"));
        }

        // Rotate: the old token is single-use.
        self.cache.delete(&refresh_key).await?;

        let user_entity = self
            .repo
            .find_by_id(&claims.sub)
            .await?
            .ok_or_else(|| error::SystemError::unauthorized("Token invalid or expired"))?;

        self.issue_tokens(&user_entity).await
    }

    pub async fn sign_out(&self, refresh_token: Option<String>) -> Result<(), error::SystemError> {
        let Some(token) = refresh_token else {
            return Ok(());
        };

        if let Ok(claims) = Claims::decode(&token, ENV.jwt_secret.as_ref()) {
            if let Some(jti) = claims.jti {
                self.cache.delete(&format!("refresh_token:{jti}")).await?;
            }
        }

        Ok(())
    }

    async fn issue_tokens(
        &self,
        user: &UserEntity,
    ) -> Result<(String, String), error::SystemError> {
        let access_token = Claims::new(&user.id, &user.role, ENV.access_token_expiration)
            .with_type(TypeClaims::AccessToken)
            .encode(ENV.jwt_secret.as_ref())?;

        let jti = Uuid::new_v7(uuid::Timestamp::now(uuid::NoContext));

        let refresh_token = Claims::new(&user.id, &user.role, ENV.refresh_token_expiration)
            .with_jti(jti)
            .with_type(TypeClaims::RefreshToken)
            .encode(ENV.jwt_secret.as_ref())?;

        let refresh_key = format!("refresh_token:{jti}");
        self.cache
            .set(&refresh_key, &user.id, ENV.refresh_token_expiration as usize)
            .await?;

        Ok((access_token, refresh_token))
    }
}
