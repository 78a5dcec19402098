//! Newsletter subscription repository.

use std::sync::Arc;

use crate::entities::{NewsletterSubscription, newsletter_subscription};
use crate::write_error;
use quill_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    Set,
};

/// Newsletter repository for database operations.
#[derive(Clone)]
pub struct NewsletterRepository {
    db: Arc<DatabaseConnection>,
}

impl NewsletterRepository {
    /// Create a new newsletter repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a subscription by email (case-insensitive).
    pub async fn find_by_email(
        &self,
        email: &str,
    ) -> AppResult<Option<newsletter_subscription::Model>> {
        NewsletterSubscription::find()
            .filter(newsletter_subscription::Column::Email.eq(email.to_lowercase()))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new subscription.
    pub async fn create(
        &self,
        model: newsletter_subscription::ActiveModel,
    ) -> AppResult<newsletter_subscription::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| write_error(e, "This email is already subscribed"))
    }

    /// Activate or deactivate a subscription.
    pub async fn set_active(
        &self,
        subscription: newsletter_subscription::Model,
        active: bool,
    ) -> AppResult<newsletter_subscription::Model> {
        let now = chrono::Utc::now().fixed_offset();
        let mut model: newsletter_subscription::ActiveModel = subscription.into();
        model.is_active = Set(active);
        if active {
            model.subscribed_at = Set(now);
            model.unsubscribed_at = Set(None);
        } else {
            model.unsubscribed_at = Set(Some(now));
        }
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count active subscriptions.
    pub async fn count_active(&self) -> AppResult<u64> {
        NewsletterSubscription::find()
            .filter(newsletter_subscription::Column::IsActive.eq(true))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn create_test_subscription(active: bool) -> newsletter_subscription::Model {
        newsletter_subscription::Model {
            id: "sub1".to_string(),
            email: "reader@example.com".to_string(),
            is_active: active,
            subscribed_at: Utc::now().into(),
            unsubscribed_at: None,
        }
    }

    #[tokio::test]
    async fn test_find_by_email() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_subscription(true)]])
                .into_connection(),
        );

        let repo = NewsletterRepository::new(db);
        let found = repo.find_by_email("Reader@Example.com").await.unwrap();

        assert!(found.is_some());
    }

    #[tokio::test]
    async fn test_set_active_false() {
        let mut inactive = create_test_subscription(false);
        inactive.unsubscribed_at = Some(Utc::now().into());

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[inactive]])
                .into_connection(),
        );

        let repo = NewsletterRepository::new(db);
        let updated = repo
            .set_active(create_test_subscription(true), false)
            .await
            .unwrap();

        assert!(!updated.is_active);
        assert!(updated.unsubscribed_at.is_some());
    }

    #[tokio::test]
    async fn test_count_active() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(42))
                }]])
                .into_connection(),
        );

        let repo = NewsletterRepository::new(db);
        assert_eq!(repo.count_active().await.unwrap(), 42);
    }
}
