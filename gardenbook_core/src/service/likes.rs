use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{ConnectionTrait, DatabaseConnection};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::{
    attachment::target_exists,
    entity::prelude::*,
    error::{is_unique_violation, ResourceError, ValidationErrors},
    ids::{LikeId, UserId},
    validation::TAKEN,
};

#[derive(Debug, Error)]
pub enum LikesServiceError {
    #[error("fatal database error")]
    DbError(#[from] DbErr),

    #[error("like target not found")]
    TargetNotFound,

    #[error("like not found")]
    LikeNotFound,

    #[error("invalid like: {0}")]
    Invalid(ValidationErrors),
}

impl From<LikesServiceError> for ResourceError {
    fn from(error: LikesServiceError) -> Self {
        match error {
            LikesServiceError::DbError(error) => ResourceError::infra(error),
            LikesServiceError::TargetNotFound => ResourceError::NotFound,
            LikesServiceError::LikeNotFound => ResourceError::NotFound,
            LikesServiceError::Invalid(errors) => ResourceError::Invalid(errors),
        }
    }
}

fn already_liked() -> LikesServiceError {
    LikesServiceError::Invalid(ValidationErrors::single("user_id", TAKEN))
}

fn on_target(target: Target) -> Condition {
    Condition::all()
        .add(LikeColumn::LikeableType.eq(target.kind()))
        .add(LikeColumn::LikeableId.eq(target.raw_id()))
}

/// Like counts for many targets of one kind, keyed by raw target id.
/// Targets without likes are absent from the map.
pub async fn count_by_target<C: ConnectionTrait>(
    conn: &C,
    kind: TargetKind,
    ids: Vec<Uuid>,
) -> Result<HashMap<Uuid, u64>, DbErr> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows: Vec<(Uuid, i64)> = Like::find()
        .select_only()
        .column(LikeColumn::LikeableId)
        .column_as(LikeColumn::Id.count(), "count")
        .filter(LikeColumn::LikeableType.eq(kind))
        .filter(LikeColumn::LikeableId.is_in(ids))
        .group_by(LikeColumn::LikeableId)
        .into_tuple()
        .all(conn)
        .await?;

    Ok(rows
        .into_iter()
        .map(|(id, count)| (id, count.max(0) as u64))
        .collect())
}

/// Which of `targets` `user` has liked, with the like to undo.
pub async fn viewer_likes<C: ConnectionTrait>(
    conn: &C,
    user: UserId,
    targets: &[Target],
) -> Result<HashMap<Target, LikeId>, DbErr> {
    if targets.is_empty() {
        return Ok(HashMap::new());
    }

    let raw_ids: Vec<Uuid> = targets.iter().map(Target::raw_id).collect();
    let likes = Like::find()
        .filter(LikeColumn::UserId.eq(user))
        .filter(LikeColumn::LikeableId.is_in(raw_ids))
        .all(conn)
        .await?;

    Ok(likes
        .into_iter()
        .map(|like| (like.likeable(), like.id))
        .filter(|(target, _)| targets.contains(target))
        .collect())
}

/// Delete every like on any of `targets`.
pub(crate) async fn delete_on_targets<C: ConnectionTrait>(
    conn: &C,
    kind: TargetKind,
    ids: Vec<Uuid>,
) -> Result<u64, DbErr> {
    if ids.is_empty() {
        return Ok(0);
    }

    let result = Like::delete_many()
        .filter(LikeColumn::LikeableType.eq(kind))
        .filter(LikeColumn::LikeableId.is_in(ids))
        .exec(conn)
        .await?;
    Ok(result.rows_affected)
}

#[derive(Clone)]
pub struct LikesService {
    db: DatabaseConnection,
}

impl LikesService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Like a post or comment; a second like on the same target is invalid
    pub async fn like(&self, user: UserId, target: Target) -> Result<LikeModel, LikesServiceError> {
        if !target_exists(&self.db, target).await? {
            return Err(LikesServiceError::TargetNotFound);
        }

        if self.liked_by(user, target).await?.is_some() {
            return Err(already_liked());
        }

        let like = LikeActiveModel {
            id: Set(LikeId::new()),
            user_id: Set(user),
            likeable_type: Set(target.kind()),
            likeable_id: Set(target.raw_id()),
            created_at: Set(Utc::now()),
        };

        // The unique index closes the gap between the check and the insert
        let created = Like::insert(like)
            .exec_with_returning(&self.db)
            .await
            .map_err(|err| {
                if is_unique_violation(&err) {
                    already_liked()
                } else {
                    err.into()
                }
            })?;

        debug!(like = %created.id, %target, "liked");
        Ok(created)
    }

    /// Remove one of `user`'s own likes
    pub async fn unlike(&self, user: UserId, like_id: LikeId) -> Result<Target, LikesServiceError> {
        let like = Like::find_by_id(like_id)
            .filter(LikeColumn::UserId.eq(user))
            .one(&self.db)
            .await?
            .ok_or(LikesServiceError::LikeNotFound)?;

        Like::delete_by_id(like.id).exec(&self.db).await?;
        Ok(like.likeable())
    }

    pub async fn count_for(&self, target: Target) -> Result<u64, LikesServiceError> {
        let count = Like::find().filter(on_target(target)).count(&self.db).await?;
        Ok(count)
    }

    pub async fn liked_by(
        &self,
        user: UserId,
        target: Target,
    ) -> Result<Option<LikeModel>, LikesServiceError> {
        let like = Like::find()
            .filter(LikeColumn::UserId.eq(user))
            .filter(on_target(target))
            .one(&self.db)
            .await?;
        Ok(like)
    }
}
