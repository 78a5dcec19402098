//! Create post reaction table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PostReaction::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PostReaction::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PostReaction::PostId).string_len(32).not_null())
                    .col(ColumnDef::new(PostReaction::UserId).string_len(32).not_null())
                    .col(ColumnDef::new(PostReaction::ReactionType).string_len(10).not_null())
                    .col(
                        ColumnDef::new(PostReaction::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(PostReaction::UpdatedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_post_reaction_post")
                            .from(PostReaction::Table, PostReaction::PostId)
                            .to(Post::Table, Post::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_post_reaction_user")
                            .from(PostReaction::Table, PostReaction::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: (post_id, user_id) - one reaction per user per post
        manager
            .create_index(
                Index::create()
                    .name("idx_post_reaction_post_user")
                    .table(PostReaction::Table)
                    .col(PostReaction::PostId)
                    .col(PostReaction::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PostReaction::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum PostReaction {
    Table,
    Id,
    PostId,
    UserId,
    ReactionType,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Post {
    Table,
    Id,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
