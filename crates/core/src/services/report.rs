//! User-filed reports against volunteers, organisers and events.

use std::sync::Arc;

use chrono::Utc;
use sea_orm::{DatabaseConnection, Set};
use serde::Deserialize;
use tracing::info;
use validator::Validate;
use volunteer_common::{AppError, AppResult, IdGenerator};
use volunteer_db::{
    entities::{
        report::{self, ReportStatus, TargetKind},
        user,
    },
    repositories::ModerationRepository,
};

use super::moderation::TargetResolver;

/// Input for filing a report.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateReportInput {
    pub target_type: TargetKind,
    #[validate(length(min = 1))]
    pub target_id: String,
    #[validate(length(min = 1, max = 200))]
    pub reason: String,
    #[validate(length(max = 2000))]
    pub details: Option<String>,
}

/// Report service for business logic.
#[derive(Clone)]
pub struct ReportService {
    moderation_repo: ModerationRepository,
    targets: TargetResolver,
    id_gen: IdGenerator,
}

impl ReportService {
    /// Create a new report service.
    #[must_use]
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            targets: TargetResolver::new(&db),
            moderation_repo: ModerationRepository::new(db),
            id_gen: IdGenerator::new(),
        }
    }

    /// File a report.
    pub async fn create(
        &self,
        reporter: &user::Model,
        input: CreateReportInput,
    ) -> AppResult<report::Model> {
        input.validate()?;

        if input.target_type == TargetKind::User {
            return Err(AppError::BadRequest(
                "Reports must target a volunteer, organiser or event".to_string(),
            ));
        }

        let target = self.targets.load(input.target_type, &input.target_id).await?;

        // Can't report yourself or your own event
        let account = self.targets.account_of(&target).await?;
        if account.id == reporter.id {
            return Err(AppError::BadRequest("Cannot report yourself".to_string()));
        }

        let model = report::ActiveModel {
            id: Set(self.id_gen.generate()),
            reporter_id: Set(reporter.id.clone()),
            target_type: Set(input.target_type),
            target_id: Set(input.target_id),
            reason: Set(input.reason.trim().to_string()),
            details: Set(input.details.filter(|d| !d.trim().is_empty())),
            status: Set(ReportStatus::Pending),
            resolution_action: Set(None),
            admin_notes: Set(None),
            resolved_by: Set(None),
            resolution_date: Set(None),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        };

        let report = self.moderation_repo.create_report(model).await?;
        info!(report_id = %report.id, reporter_id = %reporter.id, "Report filed");
        Ok(report)
    }
}
