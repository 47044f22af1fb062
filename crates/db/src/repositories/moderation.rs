//! Moderation repository for reports and the admin audit trail.

use std::sync::Arc;

use crate::entities::{
    AdminAction, Report, admin_action,
    report::{self, ReportStatus, TargetKind},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select,
};
use volunteer_common::{AppError, AppResult};

/// Filters for the report listing.
#[derive(Debug, Clone, Default)]
pub struct ReportFilter {
    pub status: Option<ReportStatus>,
    pub target_type: Option<TargetKind>,
}

impl ReportFilter {
    fn apply(&self, mut query: Select<Report>) -> Select<Report> {
        if let Some(status) = self.status {
            query = query.filter(report::Column::Status.eq(status));
        }
        if let Some(target_type) = self.target_type {
            query = query.filter(report::Column::TargetType.eq(target_type));
        }
        query
    }
}

/// Moderation repository for database operations.
#[derive(Clone)]
pub struct ModerationRepository {
    db: Arc<DatabaseConnection>,
}

impl ModerationRepository {
    /// Create a new moderation repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    // ========== Reports ==========

    /// Create a new report.
    pub async fn create_report(&self, model: report::ActiveModel) -> AppResult<report::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a report by ID.
    pub async fn get_report(&self, id: &str) -> AppResult<report::Model> {
        Self::find_report_in(self.db.as_ref(), id)
            .await?
            .ok_or_else(|| AppError::NotFound("Report not found".to_string()))
    }

    /// Find a report by ID on the given connection.
    pub async fn find_report_in<C: ConnectionTrait>(
        conn: &C,
        id: &str,
    ) -> AppResult<Option<report::Model>> {
        Report::find_by_id(id)
            .one(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List reports, newest first.
    pub async fn list_reports(
        &self,
        filter: &ReportFilter,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<report::Model>> {
        filter
            .apply(Report::find())
            .order_by_desc(report::Column::CreatedAt)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count reports matching a filter.
    pub async fn count_reports(&self, filter: &ReportFilter) -> AppResult<u64> {
        filter
            .apply(Report::find())
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a report on the given connection.
    pub async fn update_report_in<C: ConnectionTrait>(
        conn: &C,
        model: report::ActiveModel,
    ) -> AppResult<report::Model> {
        model
            .update(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ========== Admin actions ==========

    /// Append an audit record on the given connection.
    pub async fn create_action_in<C: ConnectionTrait>(
        conn: &C,
        model: admin_action::ActiveModel,
    ) -> AppResult<admin_action::Model> {
        model
            .insert(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    fn actions(target_type: Option<TargetKind>) -> Select<AdminAction> {
        let query = AdminAction::find();
        match target_type {
            Some(kind) => query.filter(admin_action::Column::TargetType.eq(kind)),
            None => query,
        }
    }

    /// Audit trail, newest first.
    pub async fn list_actions(
        &self,
        target_type: Option<TargetKind>,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<admin_action::Model>> {
        Self::actions(target_type)
            .order_by_desc(admin_action::Column::CreatedAt)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count audit records.
    pub async fn count_actions(&self, target_type: Option<TargetKind>) -> AppResult<u64> {
        Self::actions(target_type)
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Audit records triggered by a report.
    pub async fn find_actions_for_report(
        &self,
        report_id: &str,
    ) -> AppResult<Vec<admin_action::Model>> {
        AdminAction::find()
            .filter(admin_action::Column::RelatedReportId.eq(report_id))
            .order_by_asc(admin_action::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
