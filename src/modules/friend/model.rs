use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::modules::friend::error::FriendError;
use crate::modules::friend::schema::{FriendRequestEntity, RequestStatus};
use crate::modules::user::schema::UserEntity;

/// Public profile fields exposed in friend lists and suggestions.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FriendProfile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub avatar_url: Option<String>,
}

impl From<UserEntity> for FriendProfile {
    fn from(user: UserEntity) -> Self {
        FriendProfile {
            id: user.id,
            name: user.name,
            email: user.email,
            avatar_url: user.avatar_url,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum IdOrProfile {
    Id(Uuid),
    Profile(FriendProfile),
}

/// One entry of the friends listing: the counterpart's profile plus when the
/// friendship was formed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FriendshipResponse {
    pub id: Uuid,
    pub friend: FriendProfile,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(sqlx::FromRow)]
pub struct FriendListRow {
    pub friendship_id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub avatar_url: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FriendRequestResponse {
    pub id: Uuid,
    pub from: IdOrProfile,
    pub to: IdOrProfile,
    pub status: RequestStatus,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(sqlx::FromRow)]
pub struct FriendRequestRow {
    pub req_id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub avatar_url: Option<String>,
    pub status: RequestStatus,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct FriendRequestBody {
    pub recipient_id: Uuid,
}

/// Result of sending a friend request: either a fresh pending request, or
/// the counter-request that was auto-accepted because the recipient had
/// already asked.
#[derive(Debug, Clone)]
pub enum SendOutcome {
    Sent(FriendRequestEntity),
    AutoAccepted(FriendRequestEntity),
}

impl SendOutcome {
    pub fn into_request(self) -> FriendRequestEntity {
        match self {
            SendOutcome::Sent(request) | SendOutcome::AutoAccepted(request) => request,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RespondAction {
    Accept,
    Reject,
}

impl std::str::FromStr for RespondAction {
    type Err = FriendError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "accept" => Ok(RespondAction::Accept),
            "reject" => Ok(RespondAction::Reject),
            _ => Err(FriendError::InvalidAction),
        }
    }
}
