//! Participation certificate entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "certificate")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Public UUID printed on the document and encoded in its QR code
    #[sea_orm(unique)]
    pub certificate_id: String,

    /// Volunteer user id
    pub user_id: String,

    pub event_id: String,

    // Display snapshot taken at issue time
    pub volunteer_name: String,
    pub event_name: String,
    pub organiser_name: String,
    #[sea_orm(nullable)]
    pub event_date: Option<Date>,

    #[sea_orm(column_type = "Double")]
    pub hours_contributed: f64,

    /// Up to three skills (JSON array of strings)
    #[sea_orm(column_type = "JsonBinary")]
    pub skills_demonstrated: Json,

    /// File name below the certificate output directory
    pub pdf_path: String,

    pub issued_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::event::Entity",
        from = "Column::EventId",
        to = "super::event::Column::Id",
        on_delete = "Cascade"
    )]
    Event,
}

impl Related<super::event::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Event.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    #[must_use]
    pub fn skill_list(&self) -> Vec<String> {
        super::string_list(&self.skills_demonstrated)
    }
}
