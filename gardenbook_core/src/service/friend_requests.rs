use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{ConnectionTrait, DatabaseConnection};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::{
    entity::prelude::*,
    error::{is_unique_violation, ResourceError, ValidationErrors},
    ids::{FriendRequestId, UserId},
};

const ALREADY_SENT: &str = "already sent a friend request";
const TO_YOURSELF: &str = "cannot send friend request to yourself";
const ALREADY_FRIENDS: &str = "already friends with this user";
const NOT_PENDING: &str = "request is no longer pending";
const NOT_IN_LIST: &str = "is not included in the list";

#[derive(Debug, Error)]
pub enum FriendRequestsServiceError {
    #[error("fatal database error")]
    DbError(#[from] DbErr),

    #[error("user not found")]
    UserNotFound,

    #[error("friend request not found")]
    RequestNotFound,

    #[error("invalid friend request: {0}")]
    Invalid(ValidationErrors),
}

impl From<FriendRequestsServiceError> for ResourceError {
    fn from(error: FriendRequestsServiceError) -> Self {
        match error {
            FriendRequestsServiceError::DbError(error) => ResourceError::infra(error),
            FriendRequestsServiceError::UserNotFound => ResourceError::NotFound,
            FriendRequestsServiceError::RequestNotFound => ResourceError::NotFound,
            FriendRequestsServiceError::Invalid(errors) => ResourceError::Invalid(errors),
        }
    }
}

/// How one user relates to another, as shown in the user directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Relationship {
    Myself,
    Friends,
    Pending,
    None,
}

/// Pending requests touching one user, each paired with the other party.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PendingRequests {
    pub received: Vec<(FriendRequestModel, UserModel)>,
    pub sent: Vec<(FriendRequestModel, UserModel)>,
}

/// Condition matching requests between `a` and `b` in either direction.
fn between(a: UserId, b: UserId) -> Condition {
    Condition::any()
        .add(
            Condition::all()
                .add(FriendRequestColumn::SenderId.eq(a))
                .add(FriendRequestColumn::ReceiverId.eq(b)),
        )
        .add(
            Condition::all()
                .add(FriendRequestColumn::SenderId.eq(b))
                .add(FriendRequestColumn::ReceiverId.eq(a)),
        )
}

fn touching(user: UserId) -> Condition {
    Condition::any()
        .add(FriendRequestColumn::SenderId.eq(user))
        .add(FriendRequestColumn::ReceiverId.eq(user))
}

/// Counterparties of every accepted request `user` is part of.
pub async fn friend_ids<C: ConnectionTrait>(conn: &C, user: UserId) -> Result<Vec<UserId>, DbErr> {
    let accepted = FriendRequest::find()
        .filter(FriendRequestColumn::Status.eq(FriendRequestStatus::Accepted))
        .filter(touching(user))
        .all(conn)
        .await?;

    let mut ids: Vec<UserId> = accepted.iter().map(|r| r.counterparty(user)).collect();
    ids.sort_by_key(|id| id.into_uuid());
    ids.dedup();
    Ok(ids)
}

async fn exists_between<C: ConnectionTrait>(
    conn: &C,
    a: UserId,
    b: UserId,
    status: FriendRequestStatus,
) -> Result<bool, DbErr> {
    let count = FriendRequest::find()
        .filter(FriendRequestColumn::Status.eq(status))
        .filter(between(a, b))
        .count(conn)
        .await?;
    Ok(count > 0)
}

#[derive(Clone)]
pub struct FriendRequestsService {
    db: DatabaseConnection,
}

impl FriendRequestsService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Send a pending request from `sender` to `receiver`
    pub async fn send(
        &self,
        sender: UserId,
        receiver: UserId,
    ) -> Result<FriendRequestModel, FriendRequestsServiceError> {
        // Verify receiver exists
        let receiver_exists = User::find_by_id(receiver).one(&self.db).await?.is_some();
        if !receiver_exists {
            return Err(FriendRequestsServiceError::UserNotFound);
        }

        let mut errors = ValidationErrors::new();

        let duplicate = FriendRequest::find()
            .filter(FriendRequestColumn::SenderId.eq(sender))
            .filter(FriendRequestColumn::ReceiverId.eq(receiver))
            .one(&self.db)
            .await?;
        if duplicate.is_some() {
            errors.add("sender_id", ALREADY_SENT);
        }

        if sender == receiver {
            errors.add("sender_id", TO_YOURSELF);
        } else if self.are_friends(sender, receiver).await? {
            errors.add("base", ALREADY_FRIENDS);
        }

        errors
            .into_result()
            .map_err(FriendRequestsServiceError::Invalid)?;

        let now = Utc::now();
        let request = FriendRequestActiveModel {
            id: Set(FriendRequestId::new()),
            sender_id: Set(sender),
            receiver_id: Set(receiver),
            status: Set(FriendRequestStatus::Pending),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let created = FriendRequest::insert(request)
            .exec_with_returning(&self.db)
            .await
            .map_err(|err| {
                if is_unique_violation(&err) {
                    FriendRequestsServiceError::Invalid(ValidationErrors::single(
                        "sender_id",
                        ALREADY_SENT,
                    ))
                } else {
                    err.into()
                }
            })?;

        info!(request = %created.id, %sender, %receiver, "friend request sent");
        Ok(created)
    }

    /// Accept a request addressed to `acting`
    pub async fn accept(
        &self,
        acting: UserId,
        request_id: FriendRequestId,
    ) -> Result<FriendRequestModel, FriendRequestsServiceError> {
        self.transition(acting, request_id, FriendRequestStatus::Accepted)
            .await
    }

    /// Reject a request addressed to `acting`
    pub async fn reject(
        &self,
        acting: UserId,
        request_id: FriendRequestId,
    ) -> Result<FriendRequestModel, FriendRequestsServiceError> {
        self.transition(acting, request_id, FriendRequestStatus::Rejected)
            .await
    }

    /// Accept or reject from a submitted status string.
    pub async fn respond(
        &self,
        acting: UserId,
        request_id: FriendRequestId,
        status: &str,
    ) -> Result<FriendRequestModel, FriendRequestsServiceError> {
        // Lookup first so a stranger sees "not found" rather than a form error
        self.received_request(acting, request_id).await?;

        match status.parse::<FriendRequestStatus>() {
            Ok(FriendRequestStatus::Accepted) => self.accept(acting, request_id).await,
            Ok(FriendRequestStatus::Rejected) => self.reject(acting, request_id).await,
            _ => Err(FriendRequestsServiceError::Invalid(ValidationErrors::single(
                "status",
                NOT_IN_LIST,
            ))),
        }
    }

    /// Withdraw a request `acting` sent
    pub async fn cancel(
        &self,
        acting: UserId,
        request_id: FriendRequestId,
    ) -> Result<(), FriendRequestsServiceError> {
        let request = FriendRequest::find_by_id(request_id)
            .filter(FriendRequestColumn::SenderId.eq(acting))
            .one(&self.db)
            .await?
            .ok_or(FriendRequestsServiceError::RequestNotFound)?;

        FriendRequest::delete_by_id(request.id).exec(&self.db).await?;
        debug!(request = %request.id, "friend request cancelled");
        Ok(())
    }

    /// Pending requests in both directions, newest first
    pub async fn list_pending_for(
        &self,
        user: UserId,
    ) -> Result<PendingRequests, FriendRequestsServiceError> {
        let received = FriendRequest::find()
            .filter(FriendRequestColumn::ReceiverId.eq(user))
            .filter(FriendRequestColumn::Status.eq(FriendRequestStatus::Pending))
            .order_by_desc(FriendRequestColumn::CreatedAt)
            .order_by_desc(FriendRequestColumn::Id)
            .find_also_linked(SenderLink)
            .all(&self.db)
            .await?;

        let sent = FriendRequest::find()
            .filter(FriendRequestColumn::SenderId.eq(user))
            .filter(FriendRequestColumn::Status.eq(FriendRequestStatus::Pending))
            .order_by_desc(FriendRequestColumn::CreatedAt)
            .order_by_desc(FriendRequestColumn::Id)
            .find_also_linked(ReceiverLink)
            .all(&self.db)
            .await?;

        let pair = |(request, other): (FriendRequestModel, Option<UserModel>)| {
            other.map(|other| (request, other))
        };

        Ok(PendingRequests {
            received: received.into_iter().filter_map(pair).collect(),
            sent: sent.into_iter().filter_map(pair).collect(),
        })
    }

    /// True iff an accepted request exists between the two, either way round
    pub async fn are_friends(&self, a: UserId, b: UserId) -> Result<bool, FriendRequestsServiceError> {
        Ok(exists_between(&self.db, a, b, FriendRequestStatus::Accepted).await?)
    }

    pub async fn is_pending_between(
        &self,
        a: UserId,
        b: UserId,
    ) -> Result<bool, FriendRequestsServiceError> {
        Ok(exists_between(&self.db, a, b, FriendRequestStatus::Pending).await?)
    }

    pub async fn friend_ids(&self, user: UserId) -> Result<Vec<UserId>, FriendRequestsServiceError> {
        Ok(friend_ids(&self.db, user).await?)
    }

    /// Accepted friends, ordered by name
    pub async fn friends(&self, user: UserId) -> Result<Vec<UserModel>, FriendRequestsServiceError> {
        let ids = friend_ids(&self.db, user).await?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let friends = User::find()
            .filter(UserColumn::Id.is_in(ids))
            .order_by_asc(UserColumn::Name)
            .all(&self.db)
            .await?;
        Ok(friends)
    }

    pub async fn relationship(
        &self,
        viewer: UserId,
        other: UserId,
    ) -> Result<Relationship, FriendRequestsServiceError> {
        if viewer == other {
            return Ok(Relationship::Myself);
        }

        let requests = FriendRequest::find()
            .filter(between(viewer, other))
            .all(&self.db)
            .await?;

        let has = |status| requests.iter().any(|r| r.status == status);
        let relationship = if has(FriendRequestStatus::Accepted) {
            Relationship::Friends
        } else if has(FriendRequestStatus::Pending) {
            Relationship::Pending
        } else {
            Relationship::None
        };
        Ok(relationship)
    }

    /// Relationship of `viewer` to every user they share a request with.
    /// Users missing from the map relate as `Relationship::None`.
    pub async fn relationships(
        &self,
        viewer: UserId,
    ) -> Result<HashMap<UserId, Relationship>, FriendRequestsServiceError> {
        let requests = FriendRequest::find()
            .filter(touching(viewer))
            .all(&self.db)
            .await?;

        let mut relationships = HashMap::from([(viewer, Relationship::Myself)]);
        for request in requests {
            let other = request.counterparty(viewer);
            if other == viewer {
                continue;
            }
            match request.status {
                FriendRequestStatus::Accepted => {
                    relationships.insert(other, Relationship::Friends);
                }
                FriendRequestStatus::Pending => {
                    relationships.entry(other).or_insert(Relationship::Pending);
                }
                FriendRequestStatus::Rejected => {}
            }
        }
        Ok(relationships)
    }

    async fn received_request(
        &self,
        acting: UserId,
        request_id: FriendRequestId,
    ) -> Result<FriendRequestModel, FriendRequestsServiceError> {
        FriendRequest::find_by_id(request_id)
            .filter(FriendRequestColumn::ReceiverId.eq(acting))
            .one(&self.db)
            .await?
            .ok_or(FriendRequestsServiceError::RequestNotFound)
    }

    async fn transition(
        &self,
        acting: UserId,
        request_id: FriendRequestId,
        status: FriendRequestStatus,
    ) -> Result<FriendRequestModel, FriendRequestsServiceError> {
        let request = self.received_request(acting, request_id).await?;

        if !request.is_pending() {
            return Err(FriendRequestsServiceError::Invalid(ValidationErrors::single(
                "status",
                NOT_PENDING,
            )));
        }

        let (sender, receiver) = (request.sender_id, request.receiver_id);
        let accepting = status == FriendRequestStatus::Accepted;
        if accepting && self.are_friends(sender, receiver).await? {
            return Err(FriendRequestsServiceError::Invalid(ValidationErrors::single(
                "base",
                ALREADY_FRIENDS,
            )));
        }

        let txn = self.db.begin().await?;

        let mut active: FriendRequestActiveModel = request.into();
        active.status = Set(status);
        active.updated_at = Set(Utc::now());
        let updated = active.update(&txn).await?;

        // A crossed request the other way is settled by this acceptance
        if accepting {
            let crossed = FriendRequest::delete_many()
                .filter(FriendRequestColumn::SenderId.eq(receiver))
                .filter(FriendRequestColumn::ReceiverId.eq(sender))
                .filter(FriendRequestColumn::Status.eq(FriendRequestStatus::Pending))
                .exec(&txn)
                .await?;
            if crossed.rows_affected > 0 {
                debug!(%sender, %receiver, "crossed friend request removed");
            }
        }

        txn.commit().await?;
        info!(request = %updated.id, status = %updated.status, "friend request answered");
        Ok(updated)
    }
}
