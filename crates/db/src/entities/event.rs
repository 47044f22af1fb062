//! Event entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Event lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize, Default)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    #[sea_orm(string_value = "active")]
    #[default]
    Active,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
    #[sea_orm(string_value = "completed")]
    Completed,
    #[sea_orm(string_value = "draft")]
    Draft,
}

/// Recurrence pattern for recurring events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum RecurrencePattern {
    #[sea_orm(string_value = "daily")]
    Daily,
    #[sea_orm(string_value = "weekly")]
    Weekly,
    #[sea_orm(string_value = "monthly")]
    Monthly,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "event")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Owning organiser profile
    #[sea_orm(indexed)]
    pub organiser_id: String,

    pub name: String,

    #[sea_orm(column_type = "Text")]
    pub description: String,

    pub location: String,

    /// Causes the event supports (JSON array of strings)
    #[sea_orm(column_type = "JsonBinary")]
    pub causes: Json,

    /// Capacity; `None` means unlimited
    #[sea_orm(nullable)]
    pub max_volunteers: Option<i32>,

    /// Registrations currently holding a seat
    #[sea_orm(default_value = 0)]
    pub registered_count: i32,

    #[sea_orm(indexed)]
    pub status: EventStatus,

    #[sea_orm(default_value = false)]
    pub is_recurring: bool,

    // Single occurrence
    #[sea_orm(nullable)]
    pub start_datetime: Option<DateTimeWithTimeZone>,
    #[sea_orm(nullable)]
    pub end_datetime: Option<DateTimeWithTimeZone>,

    // Recurrence
    #[sea_orm(nullable)]
    pub recurrence_pattern: Option<RecurrencePattern>,
    /// Weekday names for weekly recurrence (JSON array of strings)
    #[sea_orm(column_type = "JsonBinary")]
    pub recurrence_days: Json,
    #[sea_orm(nullable)]
    pub recurrence_start_date: Option<Date>,
    #[sea_orm(nullable)]
    pub recurrence_end_date: Option<Date>,
    #[sea_orm(nullable)]
    pub recurrence_time_start: Option<Time>,
    #[sea_orm(nullable)]
    pub recurrence_time_end: Option<Time>,

    /// Banner image storage key
    #[sea_orm(nullable)]
    pub image: Option<String>,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::organiser::Entity",
        from = "Column::OrganiserId",
        to = "super::organiser::Column::Id",
        on_delete = "Cascade"
    )]
    Organiser,

    #[sea_orm(has_many = "super::event_registration::Entity")]
    Registrations,
}

impl Related<super::organiser::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Organiser.def()
    }
}

impl Related<super::event_registration::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Registrations.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Causes as strings.
    #[must_use]
    pub fn cause_list(&self) -> Vec<String> {
        super::string_list(&self.causes)
    }

    /// Whether another registration fits.
    #[must_use]
    pub fn has_capacity(&self) -> bool {
        self.max_volunteers
            .is_none_or(|max| self.registered_count < max)
    }

    /// Date of the first occurrence, for display.
    #[must_use]
    pub fn first_date(&self) -> Option<Date> {
        if self.is_recurring {
            self.recurrence_start_date
        } else {
            self.start_datetime.map(|dt| dt.date_naive())
        }
    }
}
