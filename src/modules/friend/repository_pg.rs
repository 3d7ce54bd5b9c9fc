use uuid::Uuid;

use crate::modules::friend::{
    error::FriendError,
    model::{
        FriendListRow, FriendProfile, FriendRequestResponse, FriendRequestRow,
        FriendshipResponse, IdOrProfile, RespondAction, SendOutcome,
    },
    repository::{FriendRepo, FriendRequestRepository, FriendshipRepository},
    schema::{FriendRequestEntity, FriendshipEntity, RequestStatus},
};

#[derive(Clone)]
pub struct FriendRepositoryPg {
    pool: sqlx::PgPool,
}

impl FriendRepositoryPg {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

fn canonical_pair<'a>(a: &'a Uuid, b: &'a Uuid) -> (&'a Uuid, &'a Uuid) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.code().as_deref() == Some("23505"))
}

/// Insert the friendship for a pair inside the caller's transaction. A
/// concurrent insert of the same pair trips the unique index and surfaces as
/// `DuplicateFriendship`.
async fn insert_friendship(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    user_id_a: &Uuid,
    user_id_b: &Uuid,
) -> Result<FriendshipEntity, FriendError> {
    let (user_a, user_b) = canonical_pair(user_id_a, user_id_b);
    let id = Uuid::new_v7(uuid::Timestamp::now(uuid::NoContext));

    sqlx::query_as::<_, FriendshipEntity>(
        "INSERT INTO friendships (id, user_a, user_b) VALUES ($1, $2, $3) RETURNING *",
    )
    .bind(id)
    .bind(user_a)
    .bind(user_b)
    .fetch_one(&mut **tx)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            FriendError::DuplicateFriendship
        } else {
            FriendError::from(e)
        }
    })
}

#[async_trait::async_trait]
impl FriendshipRepository for FriendRepositoryPg {
    async fn find_friendship(
        &self,
        user_id_a: &Uuid,
        user_id_b: &Uuid,
    ) -> Result<Option<FriendshipEntity>, FriendError> {
        let (user_a, user_b) = canonical_pair(user_id_a, user_id_b);

        let friendship = sqlx::query_as::<_, FriendshipEntity>(
            "SELECT * FROM friendships WHERE user_a = $1 AND user_b = $2",
        )
        .bind(user_a)
        .bind(user_b)
        .fetch_optional(&self.pool)
        .await?;

        Ok(friendship)
    }

    async fn find_friends(
        &self,
        user_id: &Uuid,
    ) -> Result<Vec<FriendshipResponse>, FriendError> {
        let rows = sqlx::query_as::<_, FriendListRow>(
            r#"
        SELECT
            f.id AS friendship_id,
            u.id AS user_id,
            u.name,
            u.email,
            u.avatar_url,
            f.created_at
        FROM friendships f
        JOIN users u
            ON u.id = CASE
                WHEN f.user_a = $1 THEN f.user_b
                ELSE f.user_a
            END
        WHERE f.user_a = $1
           OR f.user_b = $1
        "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| FriendshipResponse {
                id: r.friendship_id,
                friend: FriendProfile {
                    id: r.user_id,
                    name: r.name,
                    email: r.email,
                    avatar_url: r.avatar_url,
                },
                created_at: r.created_at,
            })
            .collect())
    }

    async fn create_friendship(
        &self,
        user_id_a: &Uuid,
        user_id_b: &Uuid,
    ) -> Result<FriendshipEntity, FriendError> {
        let mut tx = self.pool.begin().await?;
        let friendship = insert_friendship(&mut tx, user_id_a, user_id_b).await?;
        tx.commit().await?;
        Ok(friendship)
    }
}

#[async_trait::async_trait]
impl FriendRequestRepository for FriendRepositoryPg {
    async fn find_request(
        &self,
        sender_id: &Uuid,
        receiver_id: &Uuid,
    ) -> Result<Option<FriendRequestEntity>, FriendError> {
        let request = sqlx::query_as::<_, FriendRequestEntity>(
            "SELECT * FROM friend_requests WHERE sender_id = $1 AND receiver_id = $2",
        )
        .bind(sender_id)
        .bind(receiver_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(request)
    }

    async fn find_pending_request(
        &self,
        sender_id: &Uuid,
        receiver_id: &Uuid,
    ) -> Result<Option<FriendRequestEntity>, FriendError> {
        let request = sqlx::query_as::<_, FriendRequestEntity>(
            r#"
            SELECT * FROM friend_requests
            WHERE sender_id = $1 AND receiver_id = $2 AND status = 'pending'
            "#,
        )
        .bind(sender_id)
        .bind(receiver_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(request)
    }

    async fn find_request_by_id(
        &self,
        request_id: &Uuid,
    ) -> Result<Option<FriendRequestEntity>, FriendError> {
        let request =
            sqlx::query_as::<_, FriendRequestEntity>("SELECT * FROM friend_requests WHERE id = $1")
                .bind(request_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(request)
    }

    async fn find_requests_from_user(
        &self,
        user_id: &Uuid,
    ) -> Result<Vec<FriendRequestResponse>, FriendError> {
        let rows = sqlx::query_as::<_, FriendRequestRow>(
            r#"
            SELECT
                fr.id AS req_id,
                u.id AS user_id,
                u.name,
                u.email,
                u.avatar_url,
                fr.status,
                fr.created_at
            FROM friend_requests fr
            JOIN users u
                ON fr.receiver_id = u.id
            WHERE fr.sender_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| FriendRequestResponse {
                id: r.req_id,
                from: IdOrProfile::Id(*user_id),
                to: IdOrProfile::Profile(FriendProfile {
                    id: r.user_id,
                    name: r.name,
                    email: r.email,
                    avatar_url: r.avatar_url,
                }),
                status: r.status,
                created_at: r.created_at,
            })
            .collect())
    }

    async fn find_requests_to_user(
        &self,
        user_id: &Uuid,
    ) -> Result<Vec<FriendRequestResponse>, FriendError> {
        let rows = sqlx::query_as::<_, FriendRequestRow>(
            r#"
            SELECT
                fr.id AS req_id,
                u.id AS user_id,
                u.name,
                u.email,
                u.avatar_url,
                fr.status,
                fr.created_at
            FROM friend_requests fr
            JOIN users u
                ON fr.sender_id = u.id
            WHERE fr.receiver_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| FriendRequestResponse {
                id: r.req_id,
                from: IdOrProfile::Profile(FriendProfile {
                    id: r.user_id,
                    name: r.name,
                    email: r.email,
                    avatar_url: r.avatar_url,
                }),
                to: IdOrProfile::Id(*user_id),
                status: r.status,
                created_at: r.created_at,
            })
            .collect())
    }

    async fn create_request(
        &self,
        sender_id: &Uuid,
        receiver_id: &Uuid,
    ) -> Result<FriendRequestEntity, FriendError> {
        let id = Uuid::new_v7(uuid::Timestamp::now(uuid::NoContext));
        let request = sqlx::query_as::<_, FriendRequestEntity>(
            r#"
            INSERT INTO friend_requests (id, sender_id, receiver_id)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(sender_id)
        .bind(receiver_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                FriendError::DuplicateRequest
            } else {
                FriendError::from(e)
            }
        })?;

        Ok(request)
    }

    async fn update_request_status(
        &self,
        request_id: &Uuid,
        status: RequestStatus,
    ) -> Result<FriendRequestEntity, FriendError> {
        let request = sqlx::query_as::<_, FriendRequestEntity>(
            r#"
            UPDATE friend_requests
            SET status = $2, updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(request_id)
        .bind(status)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(FriendError::RequestNotFound)?;

        Ok(request)
    }
}

#[async_trait::async_trait]
impl FriendRepo for FriendRepositoryPg {
    async fn send_request_atomic(
        &self,
        sender_id: &Uuid,
        receiver_id: &Uuid,
    ) -> Result<SendOutcome, FriendError> {
        let mut tx = self.pool.begin().await?;

        let (user_a, user_b) = canonical_pair(sender_id, receiver_id);
        let friendship = sqlx::query_as::<_, FriendshipEntity>(
            "SELECT * FROM friendships WHERE user_a = $1 AND user_b = $2",
        )
        .bind(user_a)
        .bind(user_b)
        .fetch_optional(&mut *tx)
        .await?;

        if friendship.is_some() {
            return Err(FriendError::AlreadyFriends);
        }

        // Any prior request in this direction blocks a resend, whatever its
        // status ended up as.
        let duplicate = sqlx::query_as::<_, FriendRequestEntity>(
            "SELECT * FROM friend_requests WHERE sender_id = $1 AND receiver_id = $2",
        )
        .bind(sender_id)
        .bind(receiver_id)
        .fetch_optional(&mut *tx)
        .await?;

        if duplicate.is_some() {
            return Err(FriendError::DuplicateRequest);
        }

        // The mutual case: the receiver already asked us. Lock their row so
        // a concurrent response cannot race the auto-accept.
        let opposite = sqlx::query_as::<_, FriendRequestEntity>(
            r#"
            SELECT * FROM friend_requests
            WHERE sender_id = $1 AND receiver_id = $2 AND status = 'pending'
            FOR UPDATE
            "#,
        )
        .bind(receiver_id)
        .bind(sender_id)
        .fetch_optional(&mut *tx)
        .await?;

        if let Some(opposite) = opposite {
            let accepted = sqlx::query_as::<_, FriendRequestEntity>(
                r#"
                UPDATE friend_requests
                SET status = 'accepted', updated_at = now()
                WHERE id = $1
                RETURNING *
                "#,
            )
            .bind(opposite.id)
            .fetch_one(&mut *tx)
            .await?;

            insert_friendship(&mut tx, sender_id, receiver_id).await?;

            tx.commit().await?;
            return Ok(SendOutcome::AutoAccepted(accepted));
        }

        let id = Uuid::new_v7(uuid::Timestamp::now(uuid::NoContext));
        let created = sqlx::query_as::<_, FriendRequestEntity>(
            r#"
            INSERT INTO friend_requests (id, sender_id, receiver_id)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(sender_id)
        .bind(receiver_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                FriendError::DuplicateRequest
            } else {
                FriendError::from(e)
            }
        })?;

        tx.commit().await?;
        Ok(SendOutcome::Sent(created))
    }

    async fn respond_request_atomic(
        &self,
        request_id: &Uuid,
        responder_id: &Uuid,
        action: RespondAction,
    ) -> Result<FriendRequestEntity, FriendError> {
        let mut tx = self.pool.begin().await?;

        // Scoping the lookup to the receiver keeps strangers (and the
        // sender) from learning whether the request id exists at all.
        let request = sqlx::query_as::<_, FriendRequestEntity>(
            "SELECT * FROM friend_requests WHERE id = $1 AND receiver_id = $2 FOR UPDATE",
        )
        .bind(request_id)
        .bind(responder_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(FriendError::RequestNotFound)?;

        if request.status != RequestStatus::Pending {
            return Err(FriendError::AlreadyResolved(request.status));
        }

        let status = match action {
            RespondAction::Accept => "accepted",
            RespondAction::Reject => "rejected",
        };

        let updated = sqlx::query_as::<_, FriendRequestEntity>(
            r#"
            UPDATE friend_requests
            SET status = $2::request_status, updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(request_id)
        .bind(status)
        .fetch_one(&mut *tx)
        .await?;

        if action == RespondAction::Accept {
            insert_friendship(&mut tx, &request.sender_id, &request.receiver_id).await?;
        }

        tx.commit().await?;
        Ok(updated)
    }

    async fn related_user_ids(&self, user_id: &Uuid) -> Result<Vec<Uuid>, FriendError> {
        let ids = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT CASE WHEN f.user_a = $1 THEN f.user_b ELSE f.user_a END
            FROM friendships f
            WHERE f.user_a = $1 OR f.user_b = $1
            UNION
            SELECT CASE WHEN fr.sender_id = $1 THEN fr.receiver_id ELSE fr.sender_id END
            FROM friend_requests fr
            WHERE fr.sender_id = $1 OR fr.receiver_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }
}
