//! Create post table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Post::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Post::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(Post::Title).string_len(200).not_null())
                    .col(ColumnDef::new(Post::Slug).string_len(200).not_null())
                    .col(ColumnDef::new(Post::AuthorId).string_len(32).not_null())
                    .col(ColumnDef::new(Post::Content).text().not_null())
                    .col(ColumnDef::new(Post::Excerpt).string_len(500).not_null().default(""))
                    .col(ColumnDef::new(Post::FeaturedImageUrl).string_len(1024))
                    .col(ColumnDef::new(Post::CategoryId).string_len(32))
                    .col(
                        ColumnDef::new(Post::Status)
                            .string_len(10)
                            .not_null()
                            .default("draft"),
                    )
                    .col(
                        ColumnDef::new(Post::MetaDescription)
                            .string_len(160)
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(Post::MetaKeywords)
                            .string_len(255)
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(Post::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Post::UpdatedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Post::PublishedAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(Post::ViewCount)
                            .integer()
                            .not_null()
                            .default(0)
                            .check(Expr::col(Post::ViewCount).gte(0)),
                    )
                    .col(ColumnDef::new(Post::Featured).boolean().not_null().default(false))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_post_author")
                            .from(Post::Table, Post::AuthorId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_post_category")
                            .from(Post::Table, Post::CategoryId)
                            .to(Category::Table, Category::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: slug
        manager
            .create_index(
                Index::create()
                    .name("idx_post_slug")
                    .table(Post::Table)
                    .col(Post::Slug)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Index: (status, published_at) for the public listing
        manager
            .create_index(
                Index::create()
                    .name("idx_post_status_published_at")
                    .table(Post::Table)
                    .col(Post::Status)
                    .col(Post::PublishedAt)
                    .to_owned(),
            )
            .await?;

        // Index: (author_id, status) for profile and analytics
        manager
            .create_index(
                Index::create()
                    .name("idx_post_author_status")
                    .table(Post::Table)
                    .col(Post::AuthorId)
                    .col(Post::Status)
                    .to_owned(),
            )
            .await?;

        // Index: (category_id, status) for category pages and related posts
        manager
            .create_index(
                Index::create()
                    .name("idx_post_category_status")
                    .table(Post::Table)
                    .col(Post::CategoryId)
                    .col(Post::Status)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Post::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Post {
    Table,
    Id,
    Title,
    Slug,
    AuthorId,
    Content,
    Excerpt,
    FeaturedImageUrl,
    CategoryId,
    Status,
    MetaDescription,
    MetaKeywords,
    CreatedAt,
    UpdatedAt,
    PublishedAt,
    ViewCount,
    Featured,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}

#[derive(Iden)]
enum Category {
    Table,
    Id,
}
