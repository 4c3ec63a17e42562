use std::collections::{HashMap, HashSet};

use chrono::Utc;
use sea_orm::{ConnectionTrait, DatabaseConnection};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    attachment::target_exists,
    entity::prelude::*,
    error::{ResourceError, ValidationErrors},
    ids::{CommentId, PostId, UserId},
    service::likes,
    validation,
};

#[derive(Debug, Error)]
pub enum CommentsServiceError {
    #[error("fatal database error")]
    DbError(#[from] DbErr),

    #[error("comment target not found")]
    TargetNotFound,

    #[error("comment not found")]
    CommentNotFound,

    #[error("invalid comment: {0}")]
    Invalid(ValidationErrors),
}

impl From<CommentsServiceError> for ResourceError {
    fn from(error: CommentsServiceError) -> Self {
        match error {
            CommentsServiceError::DbError(error) => ResourceError::infra(error),
            CommentsServiceError::TargetNotFound => ResourceError::NotFound,
            CommentsServiceError::CommentNotFound => ResourceError::NotFound,
            CommentsServiceError::Invalid(errors) => ResourceError::Invalid(errors),
        }
    }
}

fn validate_content(content: &str) -> Result<(), CommentsServiceError> {
    let mut errors = ValidationErrors::new();
    validation::presence(&mut errors, "content", content);
    errors.into_result().map_err(CommentsServiceError::Invalid)
}

/// One comment in a [`CommentThread`] with its author and direct replies.
#[derive(Debug, Clone, Serialize)]
pub struct CommentNode {
    pub comment: CommentModel,
    pub author: UserModel,
    pub like_count: u64,
    pub children: Vec<CommentId>,
}

/// Every comment under one post, stored flat and linked by id.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CommentThread {
    nodes: HashMap<CommentId, CommentNode>,
    roots: Vec<CommentId>,
}

impl CommentThread {
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: CommentId) -> Option<&CommentNode> {
        self.nodes.get(&id)
    }

    /// Direct comments on the post, oldest first.
    pub fn roots(&self) -> &[CommentId] {
        &self.roots
    }

    pub fn ids(&self) -> impl Iterator<Item = CommentId> + '_ {
        self.nodes.keys().copied()
    }

    /// Depth-first walk in display order, with the nesting depth of each node.
    pub fn walk(&self) -> Vec<(usize, &CommentNode)> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<(usize, CommentId)> =
            self.roots.iter().rev().map(|id| (0, *id)).collect();

        while let Some((depth, id)) = stack.pop() {
            let Some(node) = self.nodes.get(&id) else {
                continue;
            };
            out.push((depth, node));
            for child in node.children.iter().rev() {
                stack.push((depth + 1, *child));
            }
        }
        out
    }
}

/// All comment ids below `root`, level by level. `root` itself is excluded.
async fn descendant_ids<C: ConnectionTrait>(
    conn: &C,
    root: Target,
) -> Result<Vec<CommentModel>, DbErr> {
    let mut found: Vec<CommentModel> = Vec::new();
    let mut seen: HashSet<CommentId> = HashSet::new();
    let mut frontier: Vec<Uuid> = vec![root.raw_id()];
    let mut kind = root.kind();

    while !frontier.is_empty() {
        let level = Comment::find()
            .filter(CommentColumn::CommentableType.eq(kind))
            .filter(CommentColumn::CommentableId.is_in(frontier))
            .order_by_asc(CommentColumn::CreatedAt)
            .order_by_asc(CommentColumn::Id)
            .all(conn)
            .await?;

        frontier = Vec::new();
        for comment in level {
            if seen.insert(comment.id) {
                frontier.push(comment.id.into_uuid());
                found.push(comment);
            }
        }
        kind = TargetKind::Comment;
    }

    Ok(found)
}

/// Direct comment counts for many targets of one kind, keyed by raw id.
pub async fn count_by_parent<C: ConnectionTrait>(
    conn: &C,
    kind: TargetKind,
    ids: Vec<Uuid>,
) -> Result<HashMap<Uuid, u64>, DbErr> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows: Vec<(Uuid, i64)> = Comment::find()
        .select_only()
        .column(CommentColumn::CommentableId)
        .column_as(CommentColumn::Id.count(), "count")
        .filter(CommentColumn::CommentableType.eq(kind))
        .filter(CommentColumn::CommentableId.is_in(ids))
        .group_by(CommentColumn::CommentableId)
        .into_tuple()
        .all(conn)
        .await?;

    Ok(rows
        .into_iter()
        .map(|(id, count)| (id, count.max(0) as u64))
        .collect())
}

/// Delete every comment below `root` plus every like on `root` or on any of
/// those comments. `root` itself is left for the caller.
pub(crate) async fn purge_thread<C: ConnectionTrait>(conn: &C, root: Target) -> Result<(), DbErr> {
    let descendants: Vec<Uuid> = descendant_ids(conn, root)
        .await?
        .into_iter()
        .map(|c| c.id.into_uuid())
        .collect();

    let likes_removed = likes::delete_on_targets(conn, root.kind(), vec![root.raw_id()]).await?
        + likes::delete_on_targets(conn, TargetKind::Comment, descendants.clone()).await?;

    let comments_removed = if descendants.is_empty() {
        0
    } else {
        Comment::delete_many()
            .filter(CommentColumn::Id.is_in(descendants))
            .exec(conn)
            .await?
            .rows_affected
    };

    debug!(%root, comments_removed, likes_removed, "purged thread");
    Ok(())
}

/// Follow the commentable chain up to the post at the top.
pub async fn root_post<C: ConnectionTrait>(conn: &C, target: Target) -> Result<Option<PostId>, DbErr> {
    let mut current = target;
    let mut visited: HashSet<CommentId> = HashSet::new();

    loop {
        match current {
            Target::Post(id) => {
                let exists = Post::find_by_id(id).one(conn).await?.is_some();
                return Ok(exists.then_some(id));
            }
            Target::Comment(id) => {
                // A repeated id means a cycle
                if !visited.insert(id) {
                    return Ok(None);
                }
                match Comment::find_by_id(id).one(conn).await? {
                    Some(comment) => current = comment.parent(),
                    None => return Ok(None),
                }
            }
        }
    }
}

#[derive(Clone)]
pub struct CommentsService {
    db: DatabaseConnection,
}

impl CommentsService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Comment on a post or reply to a comment. Returns the comment and the
    /// post at the top of its thread.
    pub async fn create(
        &self,
        author: UserId,
        target: Target,
        content: String,
    ) -> Result<(CommentModel, PostId), CommentsServiceError> {
        // Verify target exists
        if !target_exists(&self.db, target).await? {
            return Err(CommentsServiceError::TargetNotFound);
        }
        let post_id = self.root_post(target).await?;

        validate_content(&content)?;

        let now = Utc::now();
        let comment = CommentActiveModel {
            id: Set(CommentId::new()),
            user_id: Set(author),
            commentable_type: Set(target.kind()),
            commentable_id: Set(target.raw_id()),
            content: Set(content),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let created = Comment::insert(comment)
            .exec_with_returning(&self.db)
            .await?;

        info!(comment = %created.id, %target, "comment created");
        Ok((created, post_id))
    }

    /// Edit one of `author`'s own comments
    pub async fn update(
        &self,
        author: UserId,
        comment_id: CommentId,
        content: String,
    ) -> Result<(CommentModel, PostId), CommentsServiceError> {
        let comment = self.find_owned(author, comment_id).await?;
        let post_id = self.root_post(comment.parent()).await?;

        validate_content(&content)?;

        let mut active: CommentActiveModel = comment.into();
        active.content = Set(content);
        active.updated_at = Set(Utc::now());

        let updated = active.update(&self.db).await?;
        Ok((updated, post_id))
    }

    /// Delete one of `author`'s comments together with its replies and their likes
    pub async fn delete(
        &self,
        author: UserId,
        comment_id: CommentId,
    ) -> Result<PostId, CommentsServiceError> {
        let comment = self.find_owned(author, comment_id).await?;
        let post_id = self.root_post(comment.parent()).await?;

        let txn = self.db.begin().await?;
        purge_thread(&txn, comment.target()).await?;
        Comment::delete_by_id(comment.id).exec(&txn).await?;
        txn.commit().await?;

        info!(comment = %comment_id, "comment deleted");
        Ok(post_id)
    }

    pub async fn find_owned(
        &self,
        author: UserId,
        comment_id: CommentId,
    ) -> Result<CommentModel, CommentsServiceError> {
        Comment::find_by_id(comment_id)
            .filter(CommentColumn::UserId.eq(author))
            .one(&self.db)
            .await?
            .ok_or(CommentsServiceError::CommentNotFound)
    }

    pub async fn root_post(&self, target: Target) -> Result<PostId, CommentsServiceError> {
        root_post(&self.db, target)
            .await?
            .ok_or(CommentsServiceError::TargetNotFound)
    }

    /// Every comment under `post_id` with authors and like counts
    pub async fn thread(&self, post_id: PostId) -> Result<CommentThread, CommentsServiceError> {
        let comments = descendant_ids(&self.db, Target::Post(post_id)).await?;
        if comments.is_empty() {
            return Ok(CommentThread::default());
        }

        let author_ids: Vec<UserId> = comments.iter().map(|c| c.user_id).collect();
        let authors: HashMap<UserId, UserModel> = User::find()
            .filter(UserColumn::Id.is_in(author_ids))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|u| (u.id, u))
            .collect();

        let raw_ids: Vec<Uuid> = comments.iter().map(|c| c.id.into_uuid()).collect();
        let like_counts = likes::count_by_target(&self.db, TargetKind::Comment, raw_ids).await?;

        let mut thread = CommentThread::default();
        // `comments` is level by level and oldest first, so parents are
        // always inserted before their children
        for comment in comments {
            let Some(author) = authors.get(&comment.user_id).cloned() else {
                continue;
            };
            match comment.parent() {
                Target::Post(_) => thread.roots.push(comment.id),
                Target::Comment(parent) => match thread.nodes.get_mut(&parent) {
                    Some(node) => node.children.push(comment.id),
                    None => continue,
                },
            }
            let like_count = like_counts.get(comment.id.as_uuid()).copied().unwrap_or(0);
            thread.nodes.insert(
                comment.id,
                CommentNode {
                    comment,
                    author,
                    like_count,
                    children: Vec::new(),
                },
            );
        }

        Ok(thread)
    }
}
