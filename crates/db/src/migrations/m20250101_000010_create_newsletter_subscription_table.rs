//! Create newsletter subscription table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(NewsletterSubscription::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(NewsletterSubscription::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(NewsletterSubscription::Email).string_len(254).not_null())
                    .col(
                        ColumnDef::new(NewsletterSubscription::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(NewsletterSubscription::SubscribedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(NewsletterSubscription::UnsubscribedAt)
                            .timestamp_with_time_zone(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_newsletter_subscription_email")
                    .table(NewsletterSubscription::Table)
                    .col(NewsletterSubscription::Email)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(NewsletterSubscription::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum NewsletterSubscription {
    Table,
    Id,
    Email,
    IsActive,
    SubscribedAt,
    UnsubscribedAt,
}
