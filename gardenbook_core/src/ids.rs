//! Typed row identifiers. All are UUID v7, so sorting by id sorts by
//! creation time.

use sea_orm::{
    sea_query::{ArrayType, Nullable, ValueType, ValueTypeErr},
    ColIdx, ColumnType, DbErr, QueryResult, TryFromU64, TryGetError, TryGetable, Value,
};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use uuid::Uuid;

macro_rules! row_id {
    ($($name:ident),+ $(,)?) => {
        $(
            #[derive(
                Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
            )]
            #[serde(transparent)]
            pub struct $name(Uuid);

            impl $name {
                /// A fresh id for a row about to be inserted.
                pub fn new() -> Self {
                    Self(Uuid::now_v7())
                }

                pub fn from_uuid(uuid: Uuid) -> Self {
                    Self(uuid)
                }

                pub fn as_uuid(&self) -> &Uuid {
                    &self.0
                }

                pub fn into_uuid(self) -> Uuid {
                    self.0
                }

                pub fn parse_str(s: &str) -> Result<Self, uuid::Error> {
                    s.parse()
                }
            }

            impl Default for $name {
                fn default() -> Self {
                    Self::new()
                }
            }

            impl From<Uuid> for $name {
                fn from(uuid: Uuid) -> Self {
                    Self(uuid)
                }
            }

            impl From<$name> for Uuid {
                fn from(id: $name) -> Self {
                    id.0
                }
            }

            impl fmt::Display for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    fmt::Display::fmt(&self.0, f)
                }
            }

            impl FromStr for $name {
                type Err = uuid::Error;

                fn from_str(s: &str) -> Result<Self, Self::Err> {
                    Uuid::parse_str(s).map(Self)
                }
            }

            impl From<$name> for Value {
                fn from(id: $name) -> Self {
                    Value::Uuid(Some(Box::new(id.0)))
                }
            }

            impl TryGetable for $name {
                fn try_get_by<I: ColIdx>(res: &QueryResult, idx: I) -> Result<Self, TryGetError> {
                    Uuid::try_get_by(res, idx).map(Self)
                }
            }

            impl ValueType for $name {
                fn try_from(v: Value) -> Result<Self, ValueTypeErr> {
                    <Uuid as ValueType>::try_from(v).map(Self)
                }

                fn type_name() -> String {
                    stringify!($name).to_owned()
                }

                fn array_type() -> ArrayType {
                    ArrayType::Uuid
                }

                fn column_type() -> ColumnType {
                    ColumnType::Uuid
                }
            }

            impl Nullable for $name {
                fn null() -> Value {
                    Value::Uuid(None)
                }
            }

            // Ids are generated client side, never auto-incremented.
            impl TryFromU64 for $name {
                fn try_from_u64(_: u64) -> Result<Self, DbErr> {
                    Err(DbErr::ConvertFromU64(stringify!($name)))
                }
            }
        )+
    };
}

row_id!(UserId, SessionId, FriendRequestId, PostId, CommentId, LikeId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_ids_are_unique_and_time_ordered() {
        let first = PostId::new();
        let second = PostId::new();
        assert_ne!(first, second);
        assert!(first < second);
    }

    #[test]
    fn test_uuid_round_trip() {
        let uuid = Uuid::now_v7();
        let comment_id = CommentId::from_uuid(uuid);
        assert_eq!(comment_id.as_uuid(), &uuid);
        assert_eq!(Uuid::from(comment_id), uuid);
    }

    #[test]
    fn test_parse_from_path_segment() {
        let id = FriendRequestId::new();
        assert_eq!(FriendRequestId::parse_str(&id.to_string()).unwrap(), id);
        assert!("not-a-uuid".parse::<LikeId>().is_err());
    }

    #[test]
    fn test_serializes_as_bare_string() {
        let id = UserId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{id}\""));
        assert_eq!(serde_json::from_str::<UserId>(&json).unwrap(), id);
    }
}
