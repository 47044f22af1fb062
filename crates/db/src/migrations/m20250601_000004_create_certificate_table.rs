//! Create certificate table.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Certificate::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Certificate::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Certificate::CertificateId).string_len(36).not_null())
                    .col(ColumnDef::new(Certificate::UserId).string_len(32).not_null())
                    .col(ColumnDef::new(Certificate::EventId).string_len(32).not_null())
                    .col(ColumnDef::new(Certificate::VolunteerName).string_len(256).not_null())
                    .col(ColumnDef::new(Certificate::EventName).string_len(256).not_null())
                    .col(ColumnDef::new(Certificate::OrganiserName).string_len(256).not_null())
                    .col(ColumnDef::new(Certificate::EventDate).date())
                    .col(
                        ColumnDef::new(Certificate::HoursContributed)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(Certificate::SkillsDemonstrated)
                            .json_binary()
                            .not_null()
                            .default(Expr::cust("'[]'::jsonb")),
                    )
                    .col(ColumnDef::new(Certificate::PdfPath).string_len(512).not_null())
                    .col(
                        ColumnDef::new(Certificate::IssuedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_certificate_user")
                            .from(Certificate::Table, Certificate::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_certificate_event")
                            .from(Certificate::Table, Certificate::EventId)
                            .to(Event::Table, Event::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_certificate_certificate_id")
                    .table(Certificate::Table)
                    .col(Certificate::CertificateId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Unique index: one certificate per (user, event)
        manager
            .create_index(
                Index::create()
                    .name("idx_certificate_user_event")
                    .table(Certificate::Table)
                    .col(Certificate::UserId)
                    .col(Certificate::EventId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Certificate::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Certificate {
    Table,
    Id,
    CertificateId,
    UserId,
    EventId,
    VolunteerName,
    EventName,
    OrganiserName,
    EventDate,
    HoursContributed,
    SkillsDemonstrated,
    PdfPath,
    IssuedAt,
}

#[derive(Iden)]
enum Event {
    Table,
    Id,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
