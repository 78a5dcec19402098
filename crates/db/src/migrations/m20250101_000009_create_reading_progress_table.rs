//! Create reading progress table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ReadingProgress::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ReadingProgress::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ReadingProgress::PostId).string_len(32).not_null())
                    .col(ColumnDef::new(ReadingProgress::UserId).string_len(32).not_null())
                    .col(
                        ColumnDef::new(ReadingProgress::Percentage)
                            .small_integer()
                            .not_null()
                            .default(0)
                            .check(Expr::col(ReadingProgress::Percentage).between(0, 100)),
                    )
                    .col(
                        ColumnDef::new(ReadingProgress::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_reading_progress_post")
                            .from(ReadingProgress::Table, ReadingProgress::PostId)
                            .to(Post::Table, Post::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_reading_progress_user")
                            .from(ReadingProgress::Table, ReadingProgress::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: (post_id, user_id) - one progress row per user per post
        manager
            .create_index(
                Index::create()
                    .name("idx_reading_progress_post_user")
                    .table(ReadingProgress::Table)
                    .col(ReadingProgress::PostId)
                    .col(ReadingProgress::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ReadingProgress::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum ReadingProgress {
    Table,
    Id,
    PostId,
    UserId,
    Percentage,
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
