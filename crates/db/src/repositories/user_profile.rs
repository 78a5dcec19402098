//! User profile repository.

use std::sync::Arc;

use crate::entities::{UserProfile, user_profile};
use quill_common::{AppError, AppResult};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};

/// User profile repository for database operations.
#[derive(Clone)]
pub struct UserProfileRepository {
    db: Arc<DatabaseConnection>,
}

impl UserProfileRepository {
    /// Create a new user profile repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a user profile by user ID.
    pub async fn find_by_user_id(&self, user_id: &str) -> AppResult<Option<user_profile::Model>> {
        UserProfile::find_by_id(user_id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a user profile by user ID, returning an error if not found.
    pub async fn get_by_user_id(&self, user_id: &str) -> AppResult<user_profile::Model> {
        self.find_by_user_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("UserProfile: {user_id}")))
    }

    /// Profiles for a set of users.
    pub async fn find_by_user_ids(&self, user_ids: &[String]) -> AppResult<Vec<user_profile::Model>> {
        if user_ids.is_empty() {
            return Ok(vec![]);
        }

        UserProfile::find()
            .filter(user_profile::Column::UserId.is_in(user_ids.to_vec()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new user profile.
    pub async fn create(&self, model: user_profile::ActiveModel) -> AppResult<user_profile::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a user profile.
    pub async fn update(&self, model: user_profile::ActiveModel) -> AppResult<user_profile::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Change a user's role.
    pub async fn update_role(
        &self,
        user_id: &str,
        role: user_profile::Role,
    ) -> AppResult<user_profile::Model> {
        let profile = self.get_by_user_id(user_id).await?;
        let mut active: user_profile::ActiveModel = profile.into();
        active.role = Set(role);
        active.updated_at = Set(Some(chrono::Utc::now().into()));
        self.update(active).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use user_profile::Role;

    fn create_test_profile(user_id: &str, role: Role) -> user_profile::Model {
        user_profile::Model {
            user_id: user_id.to_string(),
            password: Some("$argon2id$hash".to_string()),
            role,
            bio: String::new(),
            avatar_url: None,
            website: None,
            twitter: None,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_get_by_user_id_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<user_profile::Model>::new()])
                .into_connection(),
        );

        let repo = UserProfileRepository::new(db);
        let result = repo.get_by_user_id("missing").await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_update_role() {
        let reader = create_test_profile("user1", Role::Reader);
        let author = create_test_profile("user1", Role::Author);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[reader]])
                .append_query_results([[author]])
                .into_connection(),
        );

        let repo = UserProfileRepository::new(db);
        let updated = repo.update_role("user1", Role::Author).await.unwrap();

        assert_eq!(updated.role, Role::Author);
    }
}
