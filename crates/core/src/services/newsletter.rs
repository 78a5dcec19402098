//! Newsletter subscriptions.

use quill_common::{AppError, AppResult, IdGenerator};
use quill_db::{entities::newsletter_subscription, repositories::NewsletterRepository};
use sea_orm::Set;
use serde::Serialize;
use validator::ValidateEmail;

/// Newsletter service for business logic.
#[derive(Clone)]
pub struct NewsletterService {
    newsletter_repo: NewsletterRepository,
    id_gen: IdGenerator,
}

/// Result of a successful subscribe call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscribeOutcome {
    Subscribed,
    Reactivated,
}

impl NewsletterService {
    /// Create a new newsletter service.
    #[must_use]
    pub const fn new(newsletter_repo: NewsletterRepository) -> Self {
        Self {
            newsletter_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Subscribe an email, reactivating a lapsed subscription.
    pub async fn subscribe(&self, email: &str) -> AppResult<SubscribeOutcome> {
        let email = email.trim();
        if !email.validate_email() {
            return Err(AppError::Validation(format!("email: invalid address '{email}'")));
        }

        match self.newsletter_repo.find_by_email(email).await? {
            Some(existing) if existing.is_active => {
                Err(AppError::Conflict("This email is already subscribed".to_string()))
            }
            Some(existing) => {
                self.newsletter_repo.set_active(existing, true).await?;
                tracing::info!("Newsletter subscription reactivated");
                Ok(SubscribeOutcome::Reactivated)
            }
            None => {
                let model = newsletter_subscription::ActiveModel {
                    id: Set(self.id_gen.generate()),
                    email: Set(email.to_lowercase()),
                    is_active: Set(true),
                    subscribed_at: Set(chrono::Utc::now().into()),
                    unsubscribed_at: Set(None),
                };
                self.newsletter_repo.create(model).await?;
                tracing::info!("Newsletter subscription created");
                Ok(SubscribeOutcome::Subscribed)
            }
        }
    }

    /// Deactivate a subscription. Unsubscribing twice is not an error.
    pub async fn unsubscribe(&self, email: &str) -> AppResult<()> {
        let subscription = self
            .newsletter_repo
            .find_by_email(email.trim())
            .await?
            .ok_or_else(|| AppError::NotFound("Newsletter subscription".to_string()))?;

        if subscription.is_active {
            self.newsletter_repo.set_active(subscription, false).await?;
            tracing::info!("Newsletter subscription deactivated");
        }
        Ok(())
    }

    pub async fn active_count(&self) -> AppResult<u64> {
        self.newsletter_repo.count_active().await
    }
}
