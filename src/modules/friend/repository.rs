use uuid::Uuid;

use crate::modules::friend::error::FriendError;
use crate::modules::friend::model::{
    FriendRequestResponse, FriendshipResponse, RespondAction, SendOutcome,
};
use crate::modules::friend::schema::{FriendRequestEntity, FriendshipEntity, RequestStatus};

#[async_trait::async_trait]
pub trait FriendshipRepository {
    /// Order-insensitive lookup of an established friendship.
    async fn find_friendship(
        &self,
        user_id_a: &Uuid,
        user_id_b: &Uuid,
    ) -> Result<Option<FriendshipEntity>, FriendError>;

    async fn find_friends(
        &self,
        user_id: &Uuid,
    ) -> Result<Vec<FriendshipResponse>, FriendError>;

    #[allow(dead_code)]
    async fn create_friendship(
        &self,
        user_id_a: &Uuid,
        user_id_b: &Uuid,
    ) -> Result<FriendshipEntity, FriendError>;
}

#[async_trait::async_trait]
pub trait FriendRequestRepository {
    /// Directed lookup, any status.
    async fn find_request(
        &self,
        sender_id: &Uuid,
        receiver_id: &Uuid,
    ) -> Result<Option<FriendRequestEntity>, FriendError>;

    async fn find_pending_request(
        &self,
        sender_id: &Uuid,
        receiver_id: &Uuid,
    ) -> Result<Option<FriendRequestEntity>, FriendError>;

    async fn find_request_by_id(
        &self,
        request_id: &Uuid,
    ) -> Result<Option<FriendRequestEntity>, FriendError>;

    async fn find_requests_from_user(
        &self,
        user_id: &Uuid,
    ) -> Result<Vec<FriendRequestResponse>, FriendError>;

    async fn find_requests_to_user(
        &self,
        user_id: &Uuid,
    ) -> Result<Vec<FriendRequestResponse>, FriendError>;

    #[allow(dead_code)]
    async fn create_request(
        &self,
        sender_id: &Uuid,
        receiver_id: &Uuid,
    ) -> Result<FriendRequestEntity, FriendError>;

    #[allow(dead_code)]
    async fn update_request_status(
        &self,
        request_id: &Uuid,
        status: RequestStatus,
    ) -> Result<FriendRequestEntity, FriendError>;
}

#[async_trait::async_trait]
pub trait FriendRepo: FriendshipRepository + FriendRequestRepository + Send + Sync {
    /// The whole send sequence in one transaction: already-friends and
    /// duplicate checks, the mutual-request auto-accept, or the insert of a
    /// fresh pending request.
    async fn send_request_atomic(
        &self,
        sender_id: &Uuid,
        receiver_id: &Uuid,
    ) -> Result<SendOutcome, FriendError>;

    /// Resolve a pending request as its receiver. Accepting also
    /// materializes the friendship; both writes commit together.
    async fn respond_request_atomic(
        &self,
        request_id: &Uuid,
        responder_id: &Uuid,
        action: RespondAction,
    ) -> Result<FriendRequestEntity, FriendError>;

    /// Everyone related to the user: friendship partners plus request
    /// counterparts in either direction, any status.
    async fn related_user_ids(&self, user_id: &Uuid) -> Result<Vec<Uuid>, FriendError>;
}
