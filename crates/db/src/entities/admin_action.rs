//! Admin action audit entity. Rows are append-only.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::report::TargetKind;

/// Kind of moderation decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
pub enum AdminActionType {
    #[sea_orm(string_value = "warning")]
    Warning,
    #[sea_orm(string_value = "suspension")]
    Suspension,
    #[sea_orm(string_value = "ban")]
    Ban,
    #[sea_orm(string_value = "reactivation")]
    Reactivation,
    #[sea_orm(string_value = "event_removed")]
    EventRemoved,
    #[sea_orm(string_value = "event_status_change")]
    EventStatusChange,
    #[sea_orm(string_value = "verification_approved")]
    VerificationApproved,
    #[sea_orm(string_value = "verification_rejected")]
    VerificationRejected,
    #[sea_orm(string_value = "organiser_verified")]
    OrganiserVerified,
    #[sea_orm(string_value = "organiser_rejected")]
    OrganiserRejected,
    #[sea_orm(string_value = "report_dismissed")]
    ReportDismissed,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "admin_action")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Admin profile that acted
    #[sea_orm(indexed)]
    pub admin_id: String,

    pub action_type: AdminActionType,

    pub target_type: TargetKind,

    #[sea_orm(indexed)]
    pub target_id: String,

    #[sea_orm(column_type = "Text")]
    pub reason: String,

    #[sea_orm(nullable)]
    pub related_report_id: Option<String>,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::admin::Entity",
        from = "Column::AdminId",
        to = "super::admin::Column::Id",
        on_delete = "Restrict"
    )]
    Admin,
    #[sea_orm(
        belongs_to = "super::report::Entity",
        from = "Column::RelatedReportId",
        to = "super::report::Column::Id",
        on_delete = "Restrict"
    )]
    Report,
}

impl Related<super::admin::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Admin.def()
    }
}

impl Related<super::report::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Report.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
