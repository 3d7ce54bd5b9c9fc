use crate::api::error;
use crate::modules::friend::schema::RequestStatus;

/// Outcomes of the friend-relationship engine that are not successes.
#[derive(thiserror::Error, Debug)]
pub enum FriendError {
    #[error("You cannot send a friend request to yourself")]
    SelfRequest,
    #[error("You are already friends with this user")]
    AlreadyFriends,
    #[error("A friend request already exists for this user")]
    DuplicateRequest,
    #[error("User not found")]
    UserNotFound,
    #[error("Friend request not found")]
    RequestNotFound,
    #[error("This friend request has already been {0}")]
    AlreadyResolved(RequestStatus),
    #[error("Invalid action, use accept or reject")]
    InvalidAction,
    #[error("Friendship already exists")]
    DuplicateFriendship,
    #[error(transparent)]
    Store(#[from] error::SystemError),
}

impl From<sqlx::Error> for FriendError {
    fn from(err: sqlx::Error) -> Self {
        FriendError::Store(err.into())
    }
}

impl From<FriendError> for error::Error {
    fn from(value: FriendError) -> Self {
        match value {
            FriendError::SelfRequest
            | FriendError::AlreadyFriends
            | FriendError::DuplicateRequest
            | FriendError::AlreadyResolved(_)
            | FriendError::InvalidAction => error::Error::bad_request(value.to_string()),
            FriendError::DuplicateFriendship => error::Error::Conflict(value.to_string().into()),
            FriendError::UserNotFound | FriendError::RequestNotFound => {
                error::Error::not_found(value.to_string())
            }
            FriendError::Store(e) => e.into(),
        }
    }
}
