//! User-submitted report entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Report handling status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize, Default)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    #[sea_orm(string_value = "pending")]
    #[default]
    Pending,
    #[sea_orm(string_value = "under_review")]
    UnderReview,
    #[sea_orm(string_value = "resolved")]
    Resolved,
    #[sea_orm(string_value = "dismissed")]
    Dismissed,
}

impl ReportStatus {
    #[must_use]
    pub const fn is_closed(self) -> bool {
        matches!(self, Self::Resolved | Self::Dismissed)
    }

    /// pending -> under_review -> {resolved, dismissed}; pending may close directly.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        match self {
            Self::Pending => !matches!(next, Self::Pending),
            Self::UnderReview => next.is_closed(),
            Self::Resolved | Self::Dismissed => false,
        }
    }
}

/// Action taken when a report is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, Default)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum ResolutionAction {
    #[sea_orm(string_value = "none")]
    #[default]
    None,
    #[sea_orm(string_value = "warning")]
    Warning,
    #[sea_orm(string_value = "suspension")]
    Suspension,
    #[sea_orm(string_value = "ban")]
    Ban,
    #[sea_orm(string_value = "event_removed")]
    EventRemoved,
}

/// Discriminant for polymorphic moderation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    #[sea_orm(string_value = "user")]
    User,
    #[sea_orm(string_value = "volunteer")]
    Volunteer,
    #[sea_orm(string_value = "organiser")]
    Organiser,
    #[sea_orm(string_value = "event")]
    Event,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "report")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// User who filed the report
    pub reporter_id: String,

    /// Never `User`; reports name a profile or an event
    pub target_type: TargetKind,

    /// Volunteer profile, organiser profile or event id
    #[sea_orm(indexed)]
    pub target_id: String,

    pub reason: String,

    #[sea_orm(column_type = "Text", nullable)]
    pub details: Option<String>,

    #[sea_orm(indexed)]
    pub status: ReportStatus,

    #[sea_orm(nullable)]
    pub resolution_action: Option<ResolutionAction>,

    #[sea_orm(column_type = "Text", nullable)]
    pub admin_notes: Option<String>,

    /// Admin profile that closed the report
    #[sea_orm(nullable)]
    pub resolved_by: Option<String>,

    #[sea_orm(nullable)]
    pub resolution_date: Option<DateTimeWithTimeZone>,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::ReporterId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Reporter,
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_transitions() {
        assert!(ReportStatus::Pending.can_transition_to(ReportStatus::UnderReview));
        assert!(ReportStatus::Pending.can_transition_to(ReportStatus::Resolved));
        assert!(ReportStatus::UnderReview.can_transition_to(ReportStatus::Dismissed));
        assert!(!ReportStatus::UnderReview.can_transition_to(ReportStatus::Pending));
        assert!(!ReportStatus::Resolved.can_transition_to(ReportStatus::UnderReview));
        assert!(!ReportStatus::Dismissed.can_transition_to(ReportStatus::Resolved));
    }
}
