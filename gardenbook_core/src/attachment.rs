//! Polymorphic targets for comments and likes.
//!
//! A comment or like points at either a post or another comment. The
//! database stores that as a `(kind, raw uuid)` pair; in code it is the
//! [`Target`] enum.

use std::fmt;

use sea_orm::{entity::prelude::*, ConnectionTrait};
use serde::{Deserialize, Serialize};

use crate::{
    entity::{comment, post},
    ids::{CommentId, PostId},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    #[sea_orm(string_value = "post")]
    Post,
    #[sea_orm(string_value = "comment")]
    Comment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Target {
    Post(PostId),
    Comment(CommentId),
}

impl Target {
    pub fn kind(&self) -> TargetKind {
        match self {
            Target::Post(_) => TargetKind::Post,
            Target::Comment(_) => TargetKind::Comment,
        }
    }

    pub fn raw_id(&self) -> Uuid {
        match self {
            Target::Post(id) => id.into_uuid(),
            Target::Comment(id) => id.into_uuid(),
        }
    }

    pub fn from_parts(kind: TargetKind, raw_id: Uuid) -> Self {
        match kind {
            TargetKind::Post => Target::Post(PostId::from_uuid(raw_id)),
            TargetKind::Comment => Target::Comment(CommentId::from_uuid(raw_id)),
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Post(id) => write!(f, "post:{id}"),
            Target::Comment(id) => write!(f, "comment:{id}"),
        }
    }
}

impl From<PostId> for Target {
    fn from(id: PostId) -> Self {
        Target::Post(id)
    }
}

impl From<CommentId> for Target {
    fn from(id: CommentId) -> Self {
        Target::Comment(id)
    }
}

/// Anything a comment or a like can be attached to.
pub trait AttachmentTarget {
    fn target(&self) -> Target;
}

impl AttachmentTarget for post::Model {
    fn target(&self) -> Target {
        Target::Post(self.id)
    }
}

impl AttachmentTarget for comment::Model {
    fn target(&self) -> Target {
        Target::Comment(self.id)
    }
}

impl comment::Model {
    /// What this comment was written on.
    pub fn parent(&self) -> Target {
        Target::from_parts(self.commentable_type, self.commentable_id)
    }
}

impl crate::entity::like::Model {
    pub fn likeable(&self) -> Target {
        Target::from_parts(self.likeable_type, self.likeable_id)
    }
}

pub async fn target_exists<C: ConnectionTrait>(conn: &C, target: Target) -> Result<bool, DbErr> {
    let found = match target {
        Target::Post(id) => post::Entity::find_by_id(id).one(conn).await?.is_some(),
        Target::Comment(id) => comment::Entity::find_by_id(id).one(conn).await?.is_some(),
    };
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_parts_round_trip() {
        let post = PostId::new();
        let target = Target::from(post);
        assert_eq!(target.kind(), TargetKind::Post);
        assert_eq!(Target::from_parts(target.kind(), target.raw_id()), target);

        let comment = CommentId::new();
        let target = Target::from(comment);
        assert_eq!(target.kind(), TargetKind::Comment);
        assert_eq!(target.to_string(), format!("comment:{comment}"));
    }
}
