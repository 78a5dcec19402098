//! Newsletter subscription entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "newsletter_subscription")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Lowercased email address
    #[sea_orm(unique)]
    pub email: String,

    #[sea_orm(default_value = true)]
    pub is_active: bool,

    pub subscribed_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub unsubscribed_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
