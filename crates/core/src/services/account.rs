//! Account service: registration, login, tokens, profiles and roles.

use std::sync::LazyLock;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use quill_common::{AppError, AppResult, IdGenerator};
use quill_db::{
    entities::{
        user,
        user_profile::{self, Role},
    },
    repositories::{UserProfileRepository, UserRepository},
};
use regex::Regex;
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::services::policy::{Actor, ensure_can_moderate};

/// Letters, digits and `@ . + - _`.
#[allow(clippy::unwrap_used)]
static USERNAME_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[\w.@+-]+$").unwrap());

/// Account service for business logic.
#[derive(Clone)]
pub struct AccountService {
    user_repo: UserRepository,
    profile_repo: UserProfileRepository,
    id_gen: IdGenerator,
}

/// Input for registering a new account.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterInput {
    #[validate(length(min = 1, max = 150), regex(path = *USERNAME_RE))]
    pub username: String,

    #[validate(email)]
    pub email: String,

    #[validate(length(min = 1, max = 30))]
    pub first_name: String,

    #[validate(length(min = 1, max = 30))]
    pub last_name: String,

    #[validate(length(min = 8, max = 128))]
    pub password: String,

    #[validate(must_match(other = "password"))]
    pub password_confirm: String,

    /// Requested role; only `reader` and `author` may be self-assigned.
    #[serde(default)]
    pub role: Role,
}

/// Input for updating one's own profile. Absent fields are left unchanged.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateProfileInput {
    #[validate(length(min = 1, max = 150), regex(path = *USERNAME_RE))]
    pub username: Option<String>,

    #[validate(email)]
    pub email: Option<String>,

    #[validate(length(max = 30))]
    pub first_name: Option<String>,

    #[validate(length(max = 30))]
    pub last_name: Option<String>,

    #[validate(length(max = 500))]
    pub bio: Option<String>,

    #[validate(url)]
    pub avatar_url: Option<String>,

    #[validate(url)]
    pub website: Option<String>,

    #[validate(length(max = 50))]
    pub twitter: Option<String>,
}

/// A logged-in user and the token identifying the session.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub user: user::Model,
    pub role: Role,
    pub token: String,
}

/// A user together with their profile.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileView {
    pub user: user::Model,
    pub profile: user_profile::Model,
}

impl AccountService {
    /// Create a new account service.
    #[must_use]
    pub const fn new(user_repo: UserRepository, profile_repo: UserProfileRepository) -> Self {
        Self {
            user_repo,
            profile_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Register a new account and log it in.
    pub async fn register(&self, input: RegisterInput) -> AppResult<Session> {
        input.validate()?;

        if input.role == Role::Admin {
            return Err(AppError::BadRequest(
                "Admin accounts cannot be self-registered".to_string(),
            ));
        }

        self.create_account(
            &input.username,
            &input.email,
            &input.first_name,
            &input.last_name,
            &input.password,
            input.role,
        )
        .await
    }

    /// Create an admin account. Used by the bootstrap command.
    pub async fn create_admin(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> AppResult<Session> {
        if !USERNAME_RE.is_match(username) {
            return Err(AppError::Validation("username: invalid characters".to_string()));
        }
        if password.len() < 8 {
            return Err(AppError::Validation(
                "password: must be at least 8 characters".to_string(),
            ));
        }

        let session = self
            .create_account(username, email, "Admin", "User", password, Role::Admin)
            .await?;
        tracing::info!(user_id = %session.user.id, username = %username, "Admin account created");
        Ok(session)
    }

    async fn create_account(
        &self,
        username: &str,
        email: &str,
        first_name: &str,
        last_name: &str,
        password: &str,
        role: Role,
    ) -> AppResult<Session> {
        if self.user_repo.username_taken(username, None).await? {
            return Err(AppError::Conflict("Username already taken".to_string()));
        }
        if self.user_repo.email_taken(email, None).await? {
            return Err(AppError::Conflict("Email already registered".to_string()));
        }

        let password_hash = hash_password(password)?;
        let user_id = self.id_gen.generate();
        let token = self.id_gen.generate_token();
        let now = chrono::Utc::now();

        let user = self
            .user_repo
            .create(user::ActiveModel {
                id: Set(user_id.clone()),
                username: Set(username.to_string()),
                username_lower: Set(username.to_lowercase()),
                email: Set(email.to_lowercase()),
                first_name: Set(first_name.to_string()),
                last_name: Set(last_name.to_string()),
                token: Set(Some(token.clone())),
                is_active: Set(true),
                created_at: Set(now.into()),
                updated_at: Set(None),
            })
            .await?;

        self.profile_repo
            .create(user_profile::ActiveModel {
                user_id: Set(user_id),
                password: Set(Some(password_hash)),
                role: Set(role),
                bio: Set(String::new()),
                avatar_url: Set(None),
                website: Set(None),
                twitter: Set(None),
                created_at: Set(now.into()),
                updated_at: Set(None),
            })
            .await?;

        tracing::info!(user_id = %user.id, role = role.as_str(), "Account registered");

        Ok(Session { user, role, token })
    }

    /// Authenticate by username and password.
    pub async fn authenticate(&self, username: &str, password: &str) -> AppResult<Session> {
        let user = self
            .user_repo
            .find_by_username(username)
            .await?
            .filter(|u| u.is_active)
            .ok_or(AppError::Unauthorized)?;

        let profile = self
            .profile_repo
            .find_by_user_id(&user.id)
            .await?
            .ok_or(AppError::Unauthorized)?;

        let password_hash = profile.password.as_deref().ok_or(AppError::Unauthorized)?;
        if !verify_password(password, password_hash)? {
            return Err(AppError::Unauthorized);
        }

        let (user, token) = match user.token.clone() {
            Some(token) => (user, token),
            None => {
                let token = self.id_gen.generate_token();
                (self.user_repo.set_token(user, token.clone()).await?, token)
            }
        };

        Ok(Session {
            user,
            role: profile.role,
            token,
        })
    }

    /// Resolve a bearer token to the user and their permissions.
    pub async fn authenticate_by_token(&self, token: &str) -> AppResult<(user::Model, Actor)> {
        let user = self
            .user_repo
            .find_by_token(token)
            .await?
            .filter(|u| u.is_active)
            .ok_or(AppError::Unauthorized)?;

        let role = self
            .profile_repo
            .find_by_user_id(&user.id)
            .await?
            .map(|p| p.role)
            .unwrap_or_default();

        let actor = Actor::new(user.id.clone(), role);
        Ok((user, actor))
    }

    /// Invalidate the current token by replacing it.
    pub async fn logout(&self, user_id: &str) -> AppResult<()> {
        let user = self.user_repo.get_by_id(user_id).await?;
        self.user_repo
            .set_token(user, self.id_gen.generate_token())
            .await?;
        Ok(())
    }

    /// A user's profile.
    pub async fn profile(&self, user_id: &str) -> AppResult<ProfileView> {
        let user = self.user_repo.get_by_id(user_id).await?;
        let profile = self.profile_repo.get_by_user_id(user_id).await?;
        Ok(ProfileView { user, profile })
    }

    /// Update one's own identity and profile fields.
    pub async fn update_profile(
        &self,
        user_id: &str,
        input: UpdateProfileInput,
    ) -> AppResult<ProfileView> {
        input.validate()?;

        let user = self.user_repo.get_by_id(user_id).await?;
        let profile = self.profile_repo.get_by_user_id(user_id).await?;
        let now = chrono::Utc::now();

        if let Some(username) = &input.username {
            if self.user_repo.username_taken(username, Some(user_id)).await? {
                return Err(AppError::Conflict("Username already taken".to_string()));
            }
        }
        if let Some(email) = &input.email {
            if self.user_repo.email_taken(email, Some(user_id)).await? {
                return Err(AppError::Conflict("Email already registered".to_string()));
            }
        }

        let mut active_user: user::ActiveModel = user.into();
        if let Some(username) = input.username {
            active_user.username_lower = Set(username.to_lowercase());
            active_user.username = Set(username);
        }
        if let Some(email) = input.email {
            active_user.email = Set(email.to_lowercase());
        }
        if let Some(first_name) = input.first_name {
            active_user.first_name = Set(first_name);
        }
        if let Some(last_name) = input.last_name {
            active_user.last_name = Set(last_name);
        }
        active_user.updated_at = Set(Some(now.into()));
        let user = self.user_repo.update(active_user).await?;

        let mut active_profile: user_profile::ActiveModel = profile.into();
        if let Some(bio) = input.bio {
            active_profile.bio = Set(bio);
        }
        if let Some(avatar_url) = input.avatar_url {
            active_profile.avatar_url = Set(non_empty(avatar_url));
        }
        if let Some(website) = input.website {
            active_profile.website = Set(non_empty(website));
        }
        if let Some(twitter) = input.twitter {
            active_profile.twitter = Set(non_empty(twitter.trim_start_matches('@').to_string()));
        }
        active_profile.updated_at = Set(Some(now.into()));
        let profile = self.profile_repo.update(active_profile).await?;

        Ok(ProfileView { user, profile })
    }

    /// Change another user's role (admins only).
    pub async fn set_role(
        &self,
        actor: &Actor,
        user_id: &str,
        role: Role,
    ) -> AppResult<user_profile::Model> {
        ensure_can_moderate(actor)?;

        let profile = self.profile_repo.update_role(user_id, role).await?;
        tracing::info!(
            user_id = %user_id,
            role = role.as_str(),
            changed_by = %actor.user_id,
            "Role changed"
        );
        Ok(profile)
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.trim().is_empty() { None } else { Some(value) }
}

/// Hash a password using Argon2.
fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {e}")))
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| AppError::Internal(format!("Invalid hash: {e}")))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase};
    use std::sync::Arc;

    fn empty_db() -> Arc<DatabaseConnection> {
        Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection())
    }

    fn count_row(n: i64) -> std::collections::BTreeMap<&'static str, sea_orm::Value> {
        maplit::btreemap! { "num_items" => sea_orm::Value::BigInt(Some(n)) }
    }

    fn create_test_user(id: &str, username: &str) -> user::Model {
        user::Model {
            id: id.to_string(),
            username: username.to_string(),
            username_lower: username.to_lowercase(),
            email: format!("{}@example.com", username.to_lowercase()),
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            token: Some("token123".to_string()),
            is_active: true,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn create_test_profile(user_id: &str, role: Role, password: Option<String>) -> user_profile::Model {
        user_profile::Model {
            user_id: user_id.to_string(),
            password,
            role,
            bio: String::new(),
            avatar_url: None,
            website: None,
            twitter: None,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn register_input(role: Role) -> RegisterInput {
        RegisterInput {
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            first_name: "Alice".to_string(),
            last_name: "Liddell".to_string(),
            password: "wonderland".to_string(),
            password_confirm: "wonderland".to_string(),
            role,
        }
    }

    #[tokio::test]
    async fn test_register_password_mismatch() {
        let service = AccountService::new(UserRepository::new(empty_db()), UserProfileRepository::new(empty_db()));
        let mut input = register_input(Role::Reader);
        input.password_confirm = "different!".to_string();

        let result = service.register(input).await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_register_rejects_admin_role() {
        let service = AccountService::new(UserRepository::new(empty_db()), UserProfileRepository::new(empty_db()));

        let result = service.register(register_input(Role::Admin)).await;

        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_register_invalid_username() {
        let service = AccountService::new(UserRepository::new(empty_db()), UserProfileRepository::new(empty_db()));
        let mut input = register_input(Role::Reader);
        input.username = "has space".to_string();

        assert!(matches!(service.register(input).await, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_register_duplicate_username() {
        let user_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[count_row(1)]])
                .into_connection(),
        );
        let service = AccountService::new(UserRepository::new(user_db), UserProfileRepository::new(empty_db()));

        let result = service.register(register_input(Role::Reader)).await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_register_success_as_author() {
        let user = create_test_user("user1", "alice");
        let profile = create_test_profile("user1", Role::Author, None);

        let user_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[count_row(0)]])
                .append_query_results([[count_row(0)]])
                .append_query_results([[user]])
                .into_connection(),
        );
        let profile_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[profile]])
                .into_connection(),
        );
        let service = AccountService::new(UserRepository::new(user_db), UserProfileRepository::new(profile_db));

        let session = service.register(register_input(Role::Author)).await.unwrap();

        assert_eq!(session.user.username, "alice");
        assert_eq!(session.role, Role::Author);
        assert_eq!(session.token.len(), 32);
    }

    #[tokio::test]
    async fn test_authenticate_wrong_password() {
        let user = create_test_user("user1", "alice");
        let profile = create_test_profile("user1", Role::Reader, Some(hash_password("correct-horse").unwrap()));

        let user_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[user]])
                .into_connection(),
        );
        let profile_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[profile]])
                .into_connection(),
        );
        let service = AccountService::new(UserRepository::new(user_db), UserProfileRepository::new(profile_db));

        let result = service.authenticate("alice", "battery-staple").await;

        assert!(matches!(result, Err(AppError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_authenticate_success() {
        let user = create_test_user("user1", "alice");
        let profile = create_test_profile("user1", Role::Author, Some(hash_password("correct-horse").unwrap()));

        let user_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[user]])
                .into_connection(),
        );
        let profile_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[profile]])
                .into_connection(),
        );
        let service = AccountService::new(UserRepository::new(user_db), UserProfileRepository::new(profile_db));

        let session = service.authenticate("Alice", "correct-horse").await.unwrap();

        assert_eq!(session.token, "token123");
        assert_eq!(session.role, Role::Author);
    }

    #[tokio::test]
    async fn test_authenticate_by_token_unknown() {
        let user_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<user::Model>::new()])
                .into_connection(),
        );
        let service = AccountService::new(UserRepository::new(user_db), UserProfileRepository::new(empty_db()));

        assert!(matches!(
            service.authenticate_by_token("bogus").await,
            Err(AppError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn test_authenticate_by_token_resolves_role() {
        let user = create_test_user("user1", "alice");
        let profile = create_test_profile("user1", Role::Admin, None);

        let user_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[user]])
                .into_connection(),
        );
        let profile_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[profile]])
                .into_connection(),
        );
        let service = AccountService::new(UserRepository::new(user_db), UserProfileRepository::new(profile_db));

        let (user, actor) = service.authenticate_by_token("token123").await.unwrap();

        assert_eq!(user.id, "user1");
        assert_eq!(actor, Actor::new("user1", Role::Admin));
    }

    #[tokio::test]
    async fn test_set_role_requires_admin() {
        let service = AccountService::new(UserRepository::new(empty_db()), UserProfileRepository::new(empty_db()));
        let author = Actor::new("author1", Role::Author);

        let result = service.set_role(&author, "user2", Role::Admin).await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[test]
    fn test_password_hash_roundtrip() {
        let hash = hash_password("s3cret-pass").unwrap();
        assert!(verify_password("s3cret-pass", &hash).unwrap());
        assert!(!verify_password("wrong", &hash).unwrap());
    }

    #[test]
    fn test_username_pattern() {
        assert!(USERNAME_RE.is_match("alice.b+c@d-e_f"));
        assert!(!USERNAME_RE.is_match("alice b"));
        assert!(!USERNAME_RE.is_match("alice/b"));
    }
}
