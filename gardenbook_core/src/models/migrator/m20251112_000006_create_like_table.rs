use sea_orm_migration::{prelude::*, schema::*};

use super::m20251112_000001_create_user_table::User;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Like::Table)
                    .col(pk_uuid(Like::Id))
                    .col(uuid(Like::UserId))
                    .col(string(Like::LikeableType))
                    .col(uuid(Like::LikeableId))
                    .col(timestamp_with_time_zone(Like::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-like-user_id")
                            .from(Like::Table, Like::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // A user likes a given target at most once
        manager
            .create_index(
                Index::create()
                    .name("idx_like_user_likeable")
                    .table(Like::Table)
                    .col(Like::UserId)
                    .col(Like::LikeableType)
                    .col(Like::LikeableId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_like_likeable")
                    .table(Like::Table)
                    .col(Like::LikeableType)
                    .col(Like::LikeableId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Like::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Like {
    Table,
    Id,
    UserId,
    LikeableType,
    LikeableId,
    CreatedAt,
}
