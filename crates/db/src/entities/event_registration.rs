//! Event registration entity.
//!
//! Links one volunteer account to one event. Feedback from both sides is
//! stored inline.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Registration lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize, Default)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
pub enum RegistrationStatus {
    #[sea_orm(string_value = "registered")]
    #[default]
    Registered,
    #[sea_orm(string_value = "confirmed")]
    Confirmed,
    #[sea_orm(string_value = "attended")]
    Attended,
    #[sea_orm(string_value = "no_show")]
    NoShow,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
    #[sea_orm(string_value = "removed_by_organizer")]
    RemovedByOrganizer,
}

impl RegistrationStatus {
    /// No transition leaves a terminal status.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Cancelled | Self::RemovedByOrganizer)
    }

    /// Statuses that occupy a seat in `event.registered_count`.
    #[must_use]
    pub const fn counts_toward_capacity(self) -> bool {
        !self.is_terminal()
    }

    /// Whether `self -> next` is a legal transition.
    ///
    /// Staying in the same status is allowed for non-terminal statuses.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        use RegistrationStatus::{
            Attended, Cancelled, Confirmed, NoShow, Registered, RemovedByOrganizer,
        };
        match self {
            Cancelled | RemovedByOrganizer => false,
            Registered => true,
            Confirmed => !matches!(next, Registered),
            Attended | NoShow => matches!(
                next,
                Attended | NoShow | Cancelled | RemovedByOrganizer
            ),
        }
    }
}

/// Attendance as recorded by the organiser or settled by the sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, Default)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum AttendanceStatus {
    #[sea_orm(string_value = "pending")]
    #[default]
    Pending,
    #[sea_orm(string_value = "attended")]
    Attended,
    #[sea_orm(string_value = "absent")]
    Absent,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "event_registration")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// User id of the registering volunteer
    #[sea_orm(indexed)]
    pub volunteer_id: String,

    #[sea_orm(indexed)]
    pub event_id: String,

    pub status: RegistrationStatus,

    pub attendance_status: AttendanceStatus,

    pub signup_date: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub check_in_time: Option<DateTimeWithTimeZone>,

    #[sea_orm(nullable)]
    pub check_out_time: Option<DateTimeWithTimeZone>,

    #[sea_orm(column_type = "Text", nullable)]
    pub removal_reason: Option<String>,

    // Feedback from the volunteer
    #[sea_orm(column_type = "Text", nullable)]
    pub volunteer_feedback_comment: Option<String>,
    #[sea_orm(nullable)]
    pub volunteer_feedback_rating: Option<i16>,
    #[sea_orm(nullable)]
    pub volunteer_feedback_at: Option<DateTimeWithTimeZone>,

    // Feedback from the organiser
    #[sea_orm(column_type = "Text", nullable)]
    pub organiser_feedback_comment: Option<String>,
    #[sea_orm(nullable)]
    pub organiser_feedback_rating: Option<i16>,
    #[sea_orm(nullable)]
    pub organiser_feedback_at: Option<DateTimeWithTimeZone>,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
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

    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::VolunteerId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Volunteer,
}

impl Related<super::event::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Event.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Hours between check-in and check-out, rounded to two decimals.
    ///
    /// Zero when either timestamp is missing or check-out precedes check-in.
    #[must_use]
    pub fn hours_contributed(&self) -> f64 {
        match (self.check_in_time, self.check_out_time) {
            (Some(start), Some(end)) if end > start => {
                let minutes = (end - start).num_minutes() as f64;
                (minutes / 60.0 * 100.0).round() / 100.0
            }
            _ => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_statuses_are_sticky() {
        for next in [
            RegistrationStatus::Registered,
            RegistrationStatus::Confirmed,
            RegistrationStatus::Attended,
        ] {
            assert!(!RegistrationStatus::Cancelled.can_transition_to(next));
            assert!(!RegistrationStatus::RemovedByOrganizer.can_transition_to(next));
        }
    }

    #[test]
    fn test_forward_transitions() {
        assert!(RegistrationStatus::Registered.can_transition_to(RegistrationStatus::Confirmed));
        assert!(RegistrationStatus::Confirmed.can_transition_to(RegistrationStatus::Attended));
        assert!(RegistrationStatus::Registered.can_transition_to(RegistrationStatus::NoShow));
        assert!(!RegistrationStatus::Attended.can_transition_to(RegistrationStatus::Registered));
        assert!(!RegistrationStatus::Confirmed.can_transition_to(RegistrationStatus::Registered));
    }

    #[test]
    fn test_capacity_statuses() {
        assert!(RegistrationStatus::NoShow.counts_toward_capacity());
        assert!(!RegistrationStatus::Cancelled.counts_toward_capacity());
        assert!(!RegistrationStatus::RemovedByOrganizer.counts_toward_capacity());
    }
}
