use std::sync::Arc;

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::modules::{
    friend::{
        error::FriendError,
        model::{
            FriendProfile, FriendRequestResponse, FriendshipResponse, RespondAction, SendOutcome,
        },
        repository::FriendRepo,
        schema::FriendRequestEntity,
    },
    user::repository::UserRepository,
};

/// How many candidates a suggestions call returns at most.
pub const SUGGESTION_LIMIT: usize = 5;

#[derive(Clone)]
pub struct FriendService<R, U>
where
    R: FriendRepo + Send + Sync,
    U: UserRepository + Send + Sync,
{
    friend_repo: Arc<R>,
    user_repo: Arc<U>,
    rng: Arc<Mutex<StdRng>>,
}

impl<R, U> FriendService<R, U>
where
    R: FriendRepo + Send + Sync,
    U: UserRepository + Send + Sync,
{
    pub fn with_dependencies(friend_repo: Arc<R>, user_repo: Arc<U>) -> Self {
        Self::with_rng(friend_repo, user_repo, StdRng::from_entropy())
    }

    /// Seeded variant so suggestion sampling is deterministic where needed.
    pub fn with_rng(friend_repo: Arc<R>, user_repo: Arc<U>, rng: StdRng) -> Self {
        FriendService { friend_repo, user_repo, rng: Arc::new(Mutex::new(rng)) }
    }

    pub async fn get_friends(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<FriendshipResponse>, FriendError> {
        self.friend_repo.find_friends(&user_id).await
    }

    pub async fn send_friend_request(
        &self,
        sender_id: Uuid,
        receiver_id: Uuid,
    ) -> Result<SendOutcome, FriendError> {
        if receiver_id == sender_id {
            return Err(FriendError::SelfRequest);
        }

        if self.user_repo.find_by_id(&receiver_id).await?.is_none() {
            return Err(FriendError::UserNotFound);
        }

        self.friend_repo.send_request_atomic(&sender_id, &receiver_id).await
    }

    pub async fn respond_to_request(
        &self,
        responder_id: Uuid,
        request_id: Uuid,
        action: RespondAction,
    ) -> Result<FriendRequestEntity, FriendError> {
        self.friend_repo.respond_request_atomic(&request_id, &responder_id, action).await
    }

    pub async fn get_friend_requests(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<FriendRequestResponse>, FriendError> {
        let (requests_to, requests_from) = tokio::try_join!(
            self.friend_repo.find_requests_to_user(&user_id),
            self.friend_repo.find_requests_from_user(&user_id),
        )?;

        let mut all = Vec::with_capacity(requests_to.len() + requests_from.len());
        all.extend(requests_to);
        all.extend(requests_from);
        Ok(all)
    }

    /// Up to [`SUGGESTION_LIMIT`] users sampled uniformly from everyone the
    /// user has no relationship with: not themselves, not a friend, and no
    /// request between them in either direction, whatever its status.
    pub async fn suggest_friends(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<FriendProfile>, FriendError> {
        let mut excluded = self.friend_repo.related_user_ids(&user_id).await?;
        excluded.push(user_id);

        let candidates = self.user_repo.list_ids_excluding(&excluded).await?;
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let sampled: Vec<Uuid> = {
            let mut rng = self.rng.lock().await;
            candidates.choose_multiple(&mut *rng, SUGGESTION_LIMIT).copied().collect()
        };

        let users = self.user_repo.find_by_ids(&sampled).await?;
        Ok(users.into_iter().map(FriendProfile::from).collect())
    }
}
