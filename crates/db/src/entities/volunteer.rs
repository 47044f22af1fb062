//! Volunteer profile entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "volunteer")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(unique)]
    pub user_id: String,

    pub name: String,

    #[sea_orm(nullable)]
    pub phone: Option<String>,

    #[sea_orm(nullable)]
    pub dob: Option<Date>,

    /// Declared skills (JSON array of strings)
    #[sea_orm(column_type = "JsonBinary")]
    pub skills: Json,

    /// Preferred causes (JSON array of strings)
    #[sea_orm(column_type = "JsonBinary")]
    pub preferred_causes: Json,

    /// NRIC scan storage key
    #[sea_orm(nullable)]
    pub nric_image: Option<String>,

    #[sea_orm(default_value = false)]
    pub nric_verified: bool,

    #[sea_orm(nullable)]
    pub nric_rejection_reason: Option<String>,

    #[sea_orm(default_value = false)]
    pub nric_requires_reupload: bool,

    #[sea_orm(nullable)]
    pub nric_uploaded_at: Option<DateTimeWithTimeZone>,

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

impl Model {
    /// Declared skills as strings, ignoring malformed entries.
    #[must_use]
    pub fn skill_list(&self) -> Vec<String> {
        super::string_list(&self.skills)
    }
}
