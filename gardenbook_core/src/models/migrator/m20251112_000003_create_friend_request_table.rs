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
                    .table(FriendRequest::Table)
                    .col(pk_uuid(FriendRequest::Id))
                    .col(uuid(FriendRequest::SenderId))
                    .col(uuid(FriendRequest::ReceiverId))
                    .col(string(FriendRequest::Status).default("pending"))
                    .col(timestamp_with_time_zone(FriendRequest::CreatedAt))
                    .col(timestamp_with_time_zone(FriendRequest::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-friend_request-sender_id")
                            .from(FriendRequest::Table, FriendRequest::SenderId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-friend_request-receiver_id")
                            .from(FriendRequest::Table, FriendRequest::ReceiverId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // One request per ordered (sender, receiver) pair
        manager
            .create_index(
                Index::create()
                    .name("idx_friend_request_sender_receiver")
                    .table(FriendRequest::Table)
                    .col(FriendRequest::SenderId)
                    .col(FriendRequest::ReceiverId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_friend_request_receiver_id")
                    .table(FriendRequest::Table)
                    .col(FriendRequest::ReceiverId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(FriendRequest::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum FriendRequest {
    Table,
    Id,
    SenderId,
    ReceiverId,
    Status,
    CreatedAt,
    UpdatedAt,
}
