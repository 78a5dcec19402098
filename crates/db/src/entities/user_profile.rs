//! User profile entity (password, role and public profile fields).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Coarse permission tier gating write actions.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(10))")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    #[sea_orm(string_value = "reader")]
    Reader,
    #[sea_orm(string_value = "author")]
    Author,
    #[sea_orm(string_value = "admin")]
    Admin,
}

impl Role {
    /// Authors and admins may create posts and tags.
    #[must_use]
    pub const fn can_create_posts(self) -> bool {
        matches!(self, Self::Author | Self::Admin)
    }

    /// Only admins moderate other users' content.
    #[must_use]
    pub const fn can_moderate(self) -> bool {
        matches!(self, Self::Admin)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Reader => "reader",
            Self::Author => "author",
            Self::Admin => "admin",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user_profile")]
pub struct Model {
    /// Same as user.id (1:1 relationship)
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: String,

    /// Password hash (Argon2)
    #[sea_orm(nullable)]
    #[serde(skip_serializing)]
    pub password: Option<String>,

    pub role: Role,

    #[sea_orm(column_type = "Text")]
    pub bio: String,

    #[sea_orm(nullable)]
    pub avatar_url: Option<String>,

    #[sea_orm(nullable)]
    pub website: Option<String>,

    /// Twitter handle without the leading `@`
    #[sea_orm(nullable)]
    pub twitter: Option<String>,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_defaults_to_reader() {
        assert_eq!(Role::default(), Role::Reader);
    }

    #[test]
    fn test_role_permissions() {
        assert!(!Role::Reader.can_create_posts());
        assert!(Role::Author.can_create_posts());
        assert!(Role::Admin.can_create_posts());

        assert!(!Role::Reader.can_moderate());
        assert!(!Role::Author.can_moderate());
        assert!(Role::Admin.can_moderate());
    }

    #[test]
    fn test_role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Author).ok().as_deref(), Some("\"author\""));
        assert_eq!(Role::Admin.as_str(), "admin");
    }
}
