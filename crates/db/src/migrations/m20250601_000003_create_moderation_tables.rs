//! Create report and admin action tables.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Report::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Report::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(Report::ReporterId).string_len(32).not_null())
                    .col(ColumnDef::new(Report::TargetType).string_len(16).not_null())
                    .col(ColumnDef::new(Report::TargetId).string_len(32).not_null())
                    .col(ColumnDef::new(Report::Reason).string_len(256).not_null())
                    .col(ColumnDef::new(Report::Details).text())
                    .col(
                        ColumnDef::new(Report::Status)
                            .string_len(16)
                            .not_null()
                            .default("pending"),
                    )
                    .col(ColumnDef::new(Report::ResolutionAction).string_len(16))
                    .col(ColumnDef::new(Report::AdminNotes).text())
                    .col(ColumnDef::new(Report::ResolvedBy).string_len(32))
                    .col(ColumnDef::new(Report::ResolutionDate).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(Report::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Report::UpdatedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_report_reporter")
                            .from(Report::Table, Report::ReporterId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_report_status_created_at")
                    .table(Report::Table)
                    .col(Report::Status)
                    .col(Report::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_report_target")
                    .table(Report::Table)
                    .col(Report::TargetType)
                    .col(Report::TargetId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(AdminAction::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AdminAction::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(AdminAction::AdminId).string_len(32).not_null())
                    .col(ColumnDef::new(AdminAction::ActionType).string_len(32).not_null())
                    .col(ColumnDef::new(AdminAction::TargetType).string_len(16).not_null())
                    .col(ColumnDef::new(AdminAction::TargetId).string_len(32).not_null())
                    .col(ColumnDef::new(AdminAction::Reason).text().not_null())
                    .col(ColumnDef::new(AdminAction::RelatedReportId).string_len(32))
                    .col(
                        ColumnDef::new(AdminAction::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_admin_action_admin")
                            .from(AdminAction::Table, AdminAction::AdminId)
                            .to(Admin::Table, Admin::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_admin_action_report")
                            .from(AdminAction::Table, AdminAction::RelatedReportId)
                            .to(Report::Table, Report::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_admin_action_created_at")
                    .table(AdminAction::Table)
                    .col(AdminAction::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_admin_action_related_report_id")
                    .table(AdminAction::Table)
                    .col(AdminAction::RelatedReportId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AdminAction::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Report::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Report {
    Table,
    Id,
    ReporterId,
    TargetType,
    TargetId,
    Reason,
    Details,
    Status,
    ResolutionAction,
    AdminNotes,
    ResolvedBy,
    ResolutionDate,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum AdminAction {
    Table,
    Id,
    AdminId,
    ActionType,
    TargetType,
    TargetId,
    Reason,
    RelatedReportId,
    CreatedAt,
}

#[derive(Iden)]
enum Admin {
    Table,
    Id,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
