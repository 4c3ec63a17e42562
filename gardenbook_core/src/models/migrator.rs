use sea_orm_migration::prelude::*;

mod m20251112_000001_create_user_table;
mod m20251112_000002_create_session_table;
mod m20251112_000003_create_friend_request_table;
mod m20251112_000004_create_post_table;
mod m20251112_000005_create_comment_table;
mod m20251112_000006_create_like_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20251112_000001_create_user_table::Migration),
            Box::new(m20251112_000002_create_session_table::Migration),
            Box::new(m20251112_000003_create_friend_request_table::Migration),
            Box::new(m20251112_000004_create_post_table::Migration),
            Box::new(m20251112_000005_create_comment_table::Migration),
            Box::new(m20251112_000006_create_like_table::Migration),
        ]
    }
}

#[cfg(test)]
use sea_orm::{Database, DbErr};

#[tokio::test]
async fn test_migrations_okay() -> Result<(), DbErr> {
    let db = Database::connect("sqlite::memory:").await?;
    let schema_manager = SchemaManager::new(&db);

    Migrator::refresh(&db).await?;

    assert!(schema_manager.has_table("user").await?);
    assert!(schema_manager.has_table("session").await?);
    assert!(schema_manager.has_table("friend_request").await?);
    assert!(schema_manager.has_table("post").await?);
    assert!(schema_manager.has_table("comment").await?);
    assert!(schema_manager.has_table("like").await?);

    Ok(())
}
