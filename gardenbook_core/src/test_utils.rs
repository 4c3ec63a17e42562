//! Shared fixtures for tests in this crate and in crates that enable the
//! `test-utils` feature.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, Database, DatabaseConnection, Set};
use sea_orm_migration::MigratorTrait;

use crate::{
    attachment::Target,
    entity::{
        comment, friend_request, friend_request::FriendRequestStatus, like, post, session, user,
    },
    ids::{CommentId, FriendRequestId, LikeId, PostId, SessionId, UserId},
    models::migrator::Migrator,
};

/// Well-formed PHC string that matches no password. Fixture users skip the
/// slow hashing step; tests that sign in go through `UsersService::sign_up`.
pub const PLACEHOLDER_PASSWORD_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$c2FsdHNhbHRzYWx0$ZHVtbXloYXNoZHVtbXloYXNoZHVtbXloYXNoZHVtbXk";

/// Create a new in-memory SQLite database with migrations already applied.
/// Each call creates a fresh, isolated database instance.
pub async fn setup_test_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory database");

    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    db
}

/// Insert a user named `name` with email `<name>@example.com`.
pub async fn create_user(db: &DatabaseConnection, name: &str) -> user::Model {
    user::ActiveModel {
        id: Set(UserId::new()),
        name: Set(name.to_string()),
        email: Set(format!("{}@example.com", name.to_lowercase())),
        password_hash: Set(PLACEHOLDER_PASSWORD_HASH.to_string()),
        avatar: Set(None),
        avatar_content_type: Set(None),
        created_at: Set(Utc::now()),
    }
    .insert(db)
    .await
    .expect("Failed to insert user")
}

/// Open a session for `user` with a predictable token.
pub async fn create_session(db: &DatabaseConnection, user: UserId) -> session::Model {
    session::ActiveModel {
        id: Set(SessionId::new()),
        token: Set(format!("test-session-{user}")),
        user_id: Set(user),
        created_at: Set(Utc::now()),
    }
    .insert(db)
    .await
    .expect("Failed to insert session")
}

/// Insert a friend request row directly, bypassing validation.
pub async fn create_friend_request(
    db: &DatabaseConnection,
    sender: UserId,
    receiver: UserId,
    status: FriendRequestStatus,
) -> friend_request::Model {
    let now = Utc::now();
    friend_request::ActiveModel {
        id: Set(FriendRequestId::new()),
        sender_id: Set(sender),
        receiver_id: Set(receiver),
        status: Set(status),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
    .expect("Failed to insert friend request")
}

pub async fn make_friends(db: &DatabaseConnection, a: UserId, b: UserId) {
    create_friend_request(db, a, b, FriendRequestStatus::Accepted).await;
}

pub async fn create_post(db: &DatabaseConnection, owner: UserId, content: &str) -> post::Model {
    insert_post_at(db, owner, content, Utc::now()).await
}

/// Insert a post with an explicit timestamp, for ordering tests.
pub async fn insert_post_at(
    db: &DatabaseConnection,
    owner: UserId,
    content: &str,
    created_at: DateTime<Utc>,
) -> post::Model {
    post::ActiveModel {
        id: Set(PostId::new()),
        user_id: Set(owner),
        content: Set(content.to_string()),
        image: Set(None),
        image_content_type: Set(None),
        created_at: Set(created_at),
        updated_at: Set(created_at),
    }
    .insert(db)
    .await
    .expect("Failed to insert post")
}

pub async fn create_comment(
    db: &DatabaseConnection,
    author: UserId,
    target: Target,
    content: &str,
) -> comment::Model {
    let now = Utc::now();
    comment::ActiveModel {
        id: Set(CommentId::new()),
        user_id: Set(author),
        commentable_type: Set(target.kind()),
        commentable_id: Set(target.raw_id()),
        content: Set(content.to_string()),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
    .expect("Failed to insert comment")
}

pub async fn create_like(db: &DatabaseConnection, user: UserId, target: Target) -> like::Model {
    like::ActiveModel {
        id: Set(LikeId::new()),
        user_id: Set(user),
        likeable_type: Set(target.kind()),
        likeable_id: Set(target.raw_id()),
        created_at: Set(Utc::now()),
    }
    .insert(db)
    .await
    .expect("Failed to insert like")
}
