use std::sync::{Arc, Mutex};

use chrono::Utc;
use rand::{rngs::StdRng, SeedableRng};
use uuid::Uuid;

use crate::api::error;
use crate::modules::friend::{
    error::FriendError,
    model::{
        FriendProfile, FriendRequestResponse, FriendshipResponse, IdOrProfile, RespondAction,
        SendOutcome,
    },
    repository::{FriendRepo, FriendRequestRepository, FriendshipRepository},
    schema::{FriendRequestEntity, FriendshipEntity, RequestStatus},
    service::{FriendService, SUGGESTION_LIMIT},
};
use crate::modules::user::{
    model::{InsertUser, UpdateUser},
    repository::UserRepository,
    schema::{UserEntity, UserRole},
};

fn new_id() -> Uuid {
    Uuid::new_v7(uuid::Timestamp::now(uuid::NoContext))
}

#[derive(Default)]
pub struct InMemoryUserRepo {
    users: Mutex<Vec<UserEntity>>,
}

impl InMemoryUserRepo {
    fn profile(&self, id: &Uuid) -> Option<UserEntity> {
        self.users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.id == *id && u.deleted_at.is_none())
            .cloned()
    }
}

#[async_trait::async_trait]
impl UserRepository for InMemoryUserRepo {
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<UserEntity>, error::SystemError> {
        Ok(self.profile(id))
    }

    async fn find_by_email(
        &self,
        email: &str,
    ) -> Result<Option<UserEntity>, error::SystemError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.email.eq_ignore_ascii_case(email) && u.deleted_at.is_none())
            .cloned())
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<UserEntity>, error::SystemError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .filter(|u| ids.contains(&u.id) && u.deleted_at.is_none())
            .cloned()
            .collect())
    }

    async fn create(&self, user: &InsertUser) -> Result<Uuid, error::SystemError> {
        let id = new_id();
        let now = Utc::now();
        self.users.lock().unwrap().push(UserEntity {
            id,
            email: user.email.clone(),
            hash_password: user.hash_password.clone(),
            role: UserRole::User,
            name: user.name.clone(),
            avatar_url: None,
            bio: None,
            provider_id: user.provider_id.clone(),
            deleted_at: None,
            created_at: now,
            updated_at: now,
        });
        Ok(id)
    }

    async fn attach_provider(
        &self,
        id: &Uuid,
        provider_id: &str,
        name: Option<&str>,
        avatar_url: Option<&str>,
    ) -> Result<UserEntity, error::SystemError> {
        let mut users = self.users.lock().unwrap();
        let user = users
            .iter_mut()
            .find(|u| u.id == *id && u.deleted_at.is_none())
            .ok_or_else(|| error::SystemError::not_found("User not found"))?;

        user.provider_id = Some(provider_id.to_string());
        if user.name.is_empty() {
            if let Some(name) = name {
                user.name = name.to_string();
            }
        }
        if user.avatar_url.is_none() {
            user.avatar_url = avatar_url.map(|s| s.to_string());
        }
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn update(
        &self,
        id: &Uuid,
        update: &UpdateUser,
    ) -> Result<UserEntity, error::SystemError> {
        let mut users = self.users.lock().unwrap();
        let user = users
            .iter_mut()
            .find(|u| u.id == *id && u.deleted_at.is_none())
            .ok_or_else(|| error::SystemError::not_found("User not found"))?;

        if let Some(name) = &update.name {
            user.name = name.clone();
        }
        if let Some(avatar_url) = &update.avatar_url {
            user.avatar_url = avatar_url.clone();
        }
        if let Some(bio) = &update.bio {
            user.bio = bio.clone();
        }
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn delete(&self, id: &Uuid) -> Result<bool, error::SystemError> {
        let mut users = self.users.lock().unwrap();
        match users.iter_mut().find(|u| u.id == *id && u.deleted_at.is_none()) {
            Some(user) => {
                user.deleted_at = Some(Utc::now());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn search_users(
        &self,
        query: &str,
        limit: i32,
    ) -> Result<Vec<UserEntity>, error::SystemError> {
        let query = query.to_lowercase();
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .filter(|u| {
                u.deleted_at.is_none()
                    && (u.name.to_lowercase().contains(&query)
                        || u.email.to_lowercase().contains(&query))
            })
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn list_ids_excluding(
        &self,
        excluded: &[Uuid],
    ) -> Result<Vec<Uuid>, error::SystemError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .filter(|u| u.deleted_at.is_none() && !excluded.contains(&u.id))
            .map(|u| u.id)
            .collect())
    }
}

#[derive(Default)]
struct FriendState {
    requests: Vec<FriendRequestEntity>,
    friendships: Vec<FriendshipEntity>,
}

pub struct InMemoryFriendRepo {
    state: Mutex<FriendState>,
    users: Arc<InMemoryUserRepo>,
}

impl InMemoryFriendRepo {
    pub fn new(users: Arc<InMemoryUserRepo>) -> Self {
        Self { state: Mutex::new(FriendState::default()), users }
    }

    pub fn request_count(&self) -> usize {
        self.state.lock().unwrap().requests.len()
    }

    pub fn friendship_count(&self) -> usize {
        self.state.lock().unwrap().friendships.len()
    }

    pub fn friendships(&self) -> Vec<FriendshipEntity> {
        self.state.lock().unwrap().friendships.clone()
    }
}

fn canonical_pair(a: &Uuid, b: &Uuid) -> (Uuid, Uuid) {
    if a <= b {
        (*a, *b)
    } else {
        (*b, *a)
    }
}

fn push_friendship(
    state: &mut FriendState,
    user_id_a: &Uuid,
    user_id_b: &Uuid,
) -> Result<FriendshipEntity, FriendError> {
    let (user_a, user_b) = canonical_pair(user_id_a, user_id_b);
    if state.friendships.iter().any(|f| f.user_a == user_a && f.user_b == user_b) {
        return Err(FriendError::DuplicateFriendship);
    }
    let friendship =
        FriendshipEntity { id: new_id(), user_a, user_b, created_at: Utc::now() };
    state.friendships.push(friendship.clone());
    Ok(friendship)
}

#[async_trait::async_trait]
impl FriendshipRepository for InMemoryFriendRepo {
    async fn find_friendship(
        &self,
        user_id_a: &Uuid,
        user_id_b: &Uuid,
    ) -> Result<Option<FriendshipEntity>, FriendError> {
        let (user_a, user_b) = canonical_pair(user_id_a, user_id_b);
        Ok(self
            .state
            .lock()
            .unwrap()
            .friendships
            .iter()
            .find(|f| f.user_a == user_a && f.user_b == user_b)
            .cloned())
    }

    async fn find_friends(
        &self,
        user_id: &Uuid,
    ) -> Result<Vec<FriendshipResponse>, FriendError> {
        let rows: Vec<FriendshipEntity> = {
            let state = self.state.lock().unwrap();
            state
                .friendships
                .iter()
                .filter(|f| f.user_a == *user_id || f.user_b == *user_id)
                .cloned()
                .collect()
        };

        Ok(rows
            .into_iter()
            .filter_map(|f| {
                let friend_id = if f.user_a == *user_id { f.user_b } else { f.user_a };
                self.users.profile(&friend_id).map(|u| FriendshipResponse {
                    id: f.id,
                    friend: FriendProfile::from(u),
                    created_at: f.created_at,
                })
            })
            .collect())
    }

    async fn create_friendship(
        &self,
        user_id_a: &Uuid,
        user_id_b: &Uuid,
    ) -> Result<FriendshipEntity, FriendError> {
        let mut state = self.state.lock().unwrap();
        push_friendship(&mut state, user_id_a, user_id_b)
    }
}

#[async_trait::async_trait]
impl FriendRequestRepository for InMemoryFriendRepo {
    async fn find_request(
        &self,
        sender_id: &Uuid,
        receiver_id: &Uuid,
    ) -> Result<Option<FriendRequestEntity>, FriendError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .requests
            .iter()
            .find(|r| r.sender_id == *sender_id && r.receiver_id == *receiver_id)
            .cloned())
    }

    async fn find_pending_request(
        &self,
        sender_id: &Uuid,
        receiver_id: &Uuid,
    ) -> Result<Option<FriendRequestEntity>, FriendError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .requests
            .iter()
            .find(|r| {
                r.sender_id == *sender_id
                    && r.receiver_id == *receiver_id
                    && r.status == RequestStatus::Pending
            })
            .cloned())
    }

    async fn find_request_by_id(
        &self,
        request_id: &Uuid,
    ) -> Result<Option<FriendRequestEntity>, FriendError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .requests
            .iter()
            .find(|r| r.id == *request_id)
            .cloned())
    }

    async fn find_requests_from_user(
        &self,
        user_id: &Uuid,
    ) -> Result<Vec<FriendRequestResponse>, FriendError> {
        let rows: Vec<FriendRequestEntity> = {
            let state = self.state.lock().unwrap();
            state.requests.iter().filter(|r| r.sender_id == *user_id).cloned().collect()
        };

        Ok(rows
            .into_iter()
            .filter_map(|r| {
                self.users.profile(&r.receiver_id).map(|u| FriendRequestResponse {
                    id: r.id,
                    from: IdOrProfile::Id(*user_id),
                    to: IdOrProfile::Profile(FriendProfile::from(u)),
                    status: r.status,
                    created_at: r.created_at,
                })
            })
            .collect())
    }

    async fn find_requests_to_user(
        &self,
        user_id: &Uuid,
    ) -> Result<Vec<FriendRequestResponse>, FriendError> {
        let rows: Vec<FriendRequestEntity> = {
            let state = self.state.lock().unwrap();
            state.requests.iter().filter(|r| r.receiver_id == *user_id).cloned().collect()
        };

        Ok(rows
            .into_iter()
            .filter_map(|r| {
                self.users.profile(&r.sender_id).map(|u| FriendRequestResponse {
                    id: r.id,
                    from: IdOrProfile::Profile(FriendProfile::from(u)),
                    to: IdOrProfile::Id(*user_id),
                    status: r.status,
                    created_at: r.created_at,
                })
            })
            .collect())
    }

    async fn create_request(
        &self,
        sender_id: &Uuid,
        receiver_id: &Uuid,
    ) -> Result<FriendRequestEntity, FriendError> {
        let mut state = self.state.lock().unwrap();
        if state
            .requests
            .iter()
            .any(|r| r.sender_id == *sender_id && r.receiver_id == *receiver_id)
        {
            return Err(FriendError::DuplicateRequest);
        }
        let now = Utc::now();
        let request = FriendRequestEntity {
            id: new_id(),
            sender_id: *sender_id,
            receiver_id: *receiver_id,
            status: RequestStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        state.requests.push(request.clone());
        Ok(request)
    }

    async fn update_request_status(
        &self,
        request_id: &Uuid,
        status: RequestStatus,
    ) -> Result<FriendRequestEntity, FriendError> {
        let mut state = self.state.lock().unwrap();
        let request = state
            .requests
            .iter_mut()
            .find(|r| r.id == *request_id)
            .ok_or(FriendError::RequestNotFound)?;
        request.status = status;
        request.updated_at = Utc::now();
        Ok(request.clone())
    }
}

#[async_trait::async_trait]
impl FriendRepo for InMemoryFriendRepo {
    async fn send_request_atomic(
        &self,
        sender_id: &Uuid,
        receiver_id: &Uuid,
    ) -> Result<SendOutcome, FriendError> {
        let mut state = self.state.lock().unwrap();

        let (user_a, user_b) = canonical_pair(sender_id, receiver_id);
        if state.friendships.iter().any(|f| f.user_a == user_a && f.user_b == user_b) {
            return Err(FriendError::AlreadyFriends);
        }

        if state
            .requests
            .iter()
            .any(|r| r.sender_id == *sender_id && r.receiver_id == *receiver_id)
        {
            return Err(FriendError::DuplicateRequest);
        }

        let opposite = state
            .requests
            .iter_mut()
            .find(|r| {
                r.sender_id == *receiver_id
                    && r.receiver_id == *sender_id
                    && r.status == RequestStatus::Pending
            })
            .map(|r| {
                r.status = RequestStatus::Accepted;
                r.updated_at = Utc::now();
                r.clone()
            });

        if let Some(accepted) = opposite {
            push_friendship(&mut state, sender_id, receiver_id)?;
            return Ok(SendOutcome::AutoAccepted(accepted));
        }

        let now = Utc::now();
        let request = FriendRequestEntity {
            id: new_id(),
            sender_id: *sender_id,
            receiver_id: *receiver_id,
            status: RequestStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        state.requests.push(request.clone());
        Ok(SendOutcome::Sent(request))
    }

    async fn respond_request_atomic(
        &self,
        request_id: &Uuid,
        responder_id: &Uuid,
        action: RespondAction,
    ) -> Result<FriendRequestEntity, FriendError> {
        let mut state = self.state.lock().unwrap();

        let idx = state
            .requests
            .iter()
            .position(|r| r.id == *request_id && r.receiver_id == *responder_id)
            .ok_or(FriendError::RequestNotFound)?;

        if state.requests[idx].status != RequestStatus::Pending {
            return Err(FriendError::AlreadyResolved(state.requests[idx].status));
        }

        state.requests[idx].status = match action {
            RespondAction::Accept => RequestStatus::Accepted,
            RespondAction::Reject => RequestStatus::Rejected,
        };
        state.requests[idx].updated_at = Utc::now();
        let updated = state.requests[idx].clone();

        if action == RespondAction::Accept {
            push_friendship(&mut state, &updated.sender_id, &updated.receiver_id)?;
        }

        Ok(updated)
    }

    async fn related_user_ids(&self, user_id: &Uuid) -> Result<Vec<Uuid>, FriendError> {
        let state = self.state.lock().unwrap();
        let mut related: Vec<Uuid> = Vec::new();

        for f in &state.friendships {
            if f.user_a == *user_id {
                related.push(f.user_b);
            } else if f.user_b == *user_id {
                related.push(f.user_a);
            }
        }
        for r in &state.requests {
            if r.sender_id == *user_id {
                related.push(r.receiver_id);
            } else if r.receiver_id == *user_id {
                related.push(r.sender_id);
            }
        }

        related.sort();
        related.dedup();
        Ok(related)
    }
}

type TestService = FriendService<InMemoryFriendRepo, InMemoryUserRepo>;

async fn setup(
    user_count: usize,
) -> (TestService, Arc<InMemoryFriendRepo>, Arc<InMemoryUserRepo>, Vec<Uuid>) {
    let users = Arc::new(InMemoryUserRepo::default());
    let mut ids = Vec::with_capacity(user_count);
    for i in 0..user_count {
        let id = users
            .create(&InsertUser {
                email: format!("user{i}@example.com"),
                hash_password: None,
                name: format!("User {i}"),
                provider_id: None,
            })
            .await
            .unwrap();
        ids.push(id);
    }

    let friends = Arc::new(InMemoryFriendRepo::new(users.clone()));
    let service =
        FriendService::with_rng(friends.clone(), users.clone(), StdRng::seed_from_u64(7));
    (service, friends, users, ids)
}

fn sent(outcome: SendOutcome) -> FriendRequestEntity {
    match outcome {
        SendOutcome::Sent(request) => request,
        SendOutcome::AutoAccepted(_) => panic!("expected a fresh pending request"),
    }
}

#[actix_web::test]
async fn send_request_creates_directed_pending_row() {
    let (service, repo, _, ids) = setup(2).await;
    let (a, b) = (ids[0], ids[1]);

    let request = sent(service.send_friend_request(a, b).await.unwrap());

    assert_eq!(request.sender_id, a);
    assert_eq!(request.receiver_id, b);
    assert_eq!(request.status, RequestStatus::Pending);
    assert!(repo.find_request(&a, &b).await.unwrap().is_some());
    assert!(repo.find_request(&b, &a).await.unwrap().is_none());
}

#[actix_web::test]
async fn send_request_to_self_fails_without_writes() {
    let (service, repo, _, ids) = setup(1).await;

    let err = service.send_friend_request(ids[0], ids[0]).await.unwrap_err();

    assert!(matches!(err, FriendError::SelfRequest));
    assert_eq!(repo.request_count(), 0);
    assert_eq!(repo.friendship_count(), 0);
}

#[actix_web::test]
async fn send_request_to_unknown_user_fails() {
    let (service, repo, _, ids) = setup(1).await;

    let err = service.send_friend_request(ids[0], new_id()).await.unwrap_err();

    assert!(matches!(err, FriendError::UserNotFound));
    assert_eq!(repo.request_count(), 0);
}

#[actix_web::test]
async fn duplicate_request_is_rejected() {
    let (service, repo, _, ids) = setup(2).await;
    let (a, b) = (ids[0], ids[1]);

    service.send_friend_request(a, b).await.unwrap();
    let err = service.send_friend_request(a, b).await.unwrap_err();

    assert!(matches!(err, FriendError::DuplicateRequest));
    assert_eq!(repo.request_count(), 1);
}

#[actix_web::test]
async fn resend_after_rejection_stays_blocked() {
    let (service, repo, _, ids) = setup(2).await;
    let (a, b) = (ids[0], ids[1]);

    let request = sent(service.send_friend_request(a, b).await.unwrap());
    let rejected =
        service.respond_to_request(b, request.id, RespondAction::Reject).await.unwrap();
    assert_eq!(rejected.status, RequestStatus::Rejected);
    assert_eq!(repo.friendship_count(), 0);

    let err = service.send_friend_request(a, b).await.unwrap_err();
    assert!(matches!(err, FriendError::DuplicateRequest));
    assert_eq!(repo.request_count(), 1);
}

#[actix_web::test]
async fn send_request_between_friends_fails_either_way() {
    let (service, repo, _, ids) = setup(2).await;
    let (a, b) = (ids[0], ids[1]);

    let request = sent(service.send_friend_request(a, b).await.unwrap());
    service.respond_to_request(b, request.id, RespondAction::Accept).await.unwrap();
    assert_eq!(repo.friendship_count(), 1);

    let err = service.send_friend_request(b, a).await.unwrap_err();
    assert!(matches!(err, FriendError::AlreadyFriends));
    let err = service.send_friend_request(a, b).await.unwrap_err();
    assert!(matches!(err, FriendError::AlreadyFriends));
}

#[actix_web::test]
async fn mutual_requests_collapse_into_one_accepted_pair() {
    let (service, repo, _, ids) = setup(2).await;
    let (a, b) = (ids[0], ids[1]);

    let first = sent(service.send_friend_request(a, b).await.unwrap());

    let outcome = service.send_friend_request(b, a).await.unwrap();
    let accepted = match outcome {
        SendOutcome::AutoAccepted(request) => request,
        SendOutcome::Sent(_) => panic!("expected the counter-request to auto-accept"),
    };

    assert_eq!(accepted.id, first.id);
    assert_eq!(accepted.status, RequestStatus::Accepted);
    assert_eq!(repo.request_count(), 1);
    assert_eq!(repo.friendship_count(), 1);
    assert!(repo.find_friendship(&a, &b).await.unwrap().is_some());
    assert!(repo.find_friendship(&b, &a).await.unwrap().is_some());
}

#[actix_web::test]
async fn only_the_receiver_may_respond() {
    let (service, repo, _, ids) = setup(3).await;
    let (a, b, c) = (ids[0], ids[1], ids[2]);

    let request = sent(service.send_friend_request(a, b).await.unwrap());

    let err = service.respond_to_request(a, request.id, RespondAction::Accept).await.unwrap_err();
    assert!(matches!(err, FriendError::RequestNotFound));
    let err = service.respond_to_request(c, request.id, RespondAction::Reject).await.unwrap_err();
    assert!(matches!(err, FriendError::RequestNotFound));

    let untouched = repo.find_request_by_id(&request.id).await.unwrap().unwrap();
    assert_eq!(untouched.status, RequestStatus::Pending);
    assert_eq!(repo.friendship_count(), 0);
}

#[actix_web::test]
async fn accept_materializes_friendship_visible_from_both_sides() {
    let (service, repo, _, ids) = setup(2).await;
    let (a, b) = (ids[0], ids[1]);

    let request = sent(service.send_friend_request(a, b).await.unwrap());
    let accepted =
        service.respond_to_request(b, request.id, RespondAction::Accept).await.unwrap();

    assert_eq!(accepted.status, RequestStatus::Accepted);
    let friendship = repo.find_friendship(&a, &b).await.unwrap().unwrap();

    let friends_of_a = service.get_friends(a).await.unwrap();
    assert_eq!(friends_of_a.len(), 1);
    assert_eq!(friends_of_a[0].friend.id, b);
    assert_eq!(friends_of_a[0].created_at, friendship.created_at);

    let friends_of_b = service.get_friends(b).await.unwrap();
    assert_eq!(friends_of_b.len(), 1);
    assert_eq!(friends_of_b[0].friend.id, a);
}

#[actix_web::test]
async fn accepting_twice_fails_and_keeps_one_friendship() {
    let (service, repo, _, ids) = setup(2).await;
    let (a, b) = (ids[0], ids[1]);

    let request = sent(service.send_friend_request(a, b).await.unwrap());
    service.respond_to_request(b, request.id, RespondAction::Accept).await.unwrap();

    let err = service.respond_to_request(b, request.id, RespondAction::Accept).await.unwrap_err();
    assert!(matches!(err, FriendError::AlreadyResolved(RequestStatus::Accepted)));
    assert_eq!(repo.friendship_count(), 1);
}

#[actix_web::test]
async fn rejecting_leaves_no_friendship() {
    let (service, repo, _, ids) = setup(2).await;
    let (a, b) = (ids[0], ids[1]);

    let request = sent(service.send_friend_request(a, b).await.unwrap());
    service.respond_to_request(b, request.id, RespondAction::Reject).await.unwrap();

    assert_eq!(repo.friendship_count(), 0);
    assert!(service.get_friends(a).await.unwrap().is_empty());
    assert!(service.get_friends(b).await.unwrap().is_empty());
}

#[actix_web::test]
async fn friendships_are_stored_smaller_id_first() {
    let (service, repo, _, ids) = setup(2).await;
    let (small, large) = canonical_pair(&ids[0], &ids[1]);

    // Send from the larger id so canonicalization has to reorder.
    let request = sent(service.send_friend_request(large, small).await.unwrap());
    service.respond_to_request(small, request.id, RespondAction::Accept).await.unwrap();

    let friendships = repo.friendships();
    assert_eq!(friendships.len(), 1);
    assert_eq!(friendships[0].user_a, small);
    assert_eq!(friendships[0].user_b, large);
    assert!(friendships[0].user_a < friendships[0].user_b);
}

#[actix_web::test]
async fn request_listing_merges_both_directions() {
    let (service, _, _, ids) = setup(3).await;
    let (a, b, c) = (ids[0], ids[1], ids[2]);

    let outgoing = sent(service.send_friend_request(a, b).await.unwrap());
    let incoming = sent(service.send_friend_request(c, a).await.unwrap());

    let requests = service.get_friend_requests(a).await.unwrap();
    assert_eq!(requests.len(), 2);

    let to_a = requests.iter().find(|r| r.id == incoming.id).unwrap();
    assert!(matches!(&to_a.from, IdOrProfile::Profile(p) if p.id == c));
    assert!(matches!(to_a.to, IdOrProfile::Id(id) if id == a));

    let from_a = requests.iter().find(|r| r.id == outgoing.id).unwrap();
    assert!(matches!(from_a.from, IdOrProfile::Id(id) if id == a));
    assert!(matches!(&from_a.to, IdOrProfile::Profile(p) if p.id == b));
}

#[actix_web::test]
async fn suggestions_exclude_self_friends_and_contacts() {
    let (service, _, _, ids) = setup(6).await;
    let (a, b, c, d) = (ids[0], ids[1], ids[2], ids[3]);

    // a and b become friends.
    let request = sent(service.send_friend_request(a, b).await.unwrap());
    service.respond_to_request(b, request.id, RespondAction::Accept).await.unwrap();
    // a has a pending request to c.
    service.send_friend_request(a, c).await.unwrap();
    // d's request to a was rejected; d still stays excluded.
    let request = sent(service.send_friend_request(d, a).await.unwrap());
    service.respond_to_request(a, request.id, RespondAction::Reject).await.unwrap();

    let suggestions = service.suggest_friends(a).await.unwrap();
    let suggested: Vec<Uuid> = suggestions.iter().map(|s| s.id).collect();

    assert_eq!(suggestions.len(), 2);
    for excluded in [a, b, c, d] {
        assert!(!suggested.contains(&excluded));
    }
    assert!(suggested.contains(&ids[4]));
    assert!(suggested.contains(&ids[5]));
}

#[actix_web::test]
async fn suggestions_are_capped_and_deterministic_under_a_seed() {
    let (_, repo, users, ids) = setup(10).await;

    let service_one =
        FriendService::with_rng(repo.clone(), users.clone(), StdRng::seed_from_u64(42));
    let service_two = FriendService::with_rng(repo, users, StdRng::seed_from_u64(42));

    let first = service_one.suggest_friends(ids[0]).await.unwrap();
    let second = service_two.suggest_friends(ids[0]).await.unwrap();

    assert_eq!(first.len(), SUGGESTION_LIMIT);
    let first_ids: Vec<Uuid> = first.iter().map(|s| s.id).collect();
    let second_ids: Vec<Uuid> = second.iter().map(|s| s.id).collect();
    assert_eq!(first_ids, second_ids);
    assert!(!first_ids.contains(&ids[0]));
}

#[actix_web::test]
async fn suggestions_are_empty_without_candidates() {
    let (service, _, _, ids) = setup(2).await;
    let (a, b) = (ids[0], ids[1]);

    let request = sent(service.send_friend_request(a, b).await.unwrap());
    service.respond_to_request(b, request.id, RespondAction::Accept).await.unwrap();

    assert!(service.suggest_friends(a).await.unwrap().is_empty());
}

#[test]
fn respond_action_parses_known_segments_only() {
    assert!(matches!("accept".parse::<RespondAction>(), Ok(RespondAction::Accept)));
    assert!(matches!("reject".parse::<RespondAction>(), Ok(RespondAction::Reject)));
    assert!(matches!("block".parse::<RespondAction>(), Err(FriendError::InvalidAction)));
}
