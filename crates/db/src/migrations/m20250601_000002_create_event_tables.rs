//! Create event and event registration tables.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Event::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Event::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(Event::OrganiserId).string_len(32).not_null())
                    .col(ColumnDef::new(Event::Name).string_len(256).not_null())
                    .col(ColumnDef::new(Event::Description).text().not_null())
                    .col(ColumnDef::new(Event::Location).string_len(512).not_null())
                    .col(
                        ColumnDef::new(Event::Causes)
                            .json_binary()
                            .not_null()
                            .default(Expr::cust("'[]'::jsonb")),
                    )
                    .col(ColumnDef::new(Event::MaxVolunteers).integer())
                    .col(
                        ColumnDef::new(Event::RegisteredCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Event::Status)
                            .string_len(16)
                            .not_null()
                            .default("active"),
                    )
                    .col(
                        ColumnDef::new(Event::IsRecurring)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Event::StartDatetime).timestamp_with_time_zone())
                    .col(ColumnDef::new(Event::EndDatetime).timestamp_with_time_zone())
                    .col(ColumnDef::new(Event::RecurrencePattern).string_len(16))
                    .col(
                        ColumnDef::new(Event::RecurrenceDays)
                            .json_binary()
                            .not_null()
                            .default(Expr::cust("'[]'::jsonb")),
                    )
                    .col(ColumnDef::new(Event::RecurrenceStartDate).date())
                    .col(ColumnDef::new(Event::RecurrenceEndDate).date())
                    .col(ColumnDef::new(Event::RecurrenceTimeStart).time())
                    .col(ColumnDef::new(Event::RecurrenceTimeEnd).time())
                    .col(ColumnDef::new(Event::Image).string_len(512))
                    .col(
                        ColumnDef::new(Event::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Event::UpdatedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_event_organiser")
                            .from(Event::Table, Event::OrganiserId)
                            .to(Organiser::Table, Organiser::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .check(Expr::col(Event::RegisteredCount).gte(0))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_event_organiser_id")
                    .table(Event::Table)
                    .col(Event::OrganiserId)
                    .to_owned(),
            )
            .await?;

        // Index: (status, end_datetime) for listings and the completion sweep
        manager
            .create_index(
                Index::create()
                    .name("idx_event_status_end")
                    .table(Event::Table)
                    .col(Event::Status)
                    .col(Event::EndDatetime)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(EventRegistration::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(EventRegistration::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(EventRegistration::VolunteerId).string_len(32).not_null())
                    .col(ColumnDef::new(EventRegistration::EventId).string_len(32).not_null())
                    .col(
                        ColumnDef::new(EventRegistration::Status)
                            .string_len(32)
                            .not_null()
                            .default("registered"),
                    )
                    .col(
                        ColumnDef::new(EventRegistration::AttendanceStatus)
                            .string_len(16)
                            .not_null()
                            .default("pending"),
                    )
                    .col(
                        ColumnDef::new(EventRegistration::SignupDate)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(EventRegistration::CheckInTime).timestamp_with_time_zone())
                    .col(ColumnDef::new(EventRegistration::CheckOutTime).timestamp_with_time_zone())
                    .col(ColumnDef::new(EventRegistration::RemovalReason).text())
                    .col(ColumnDef::new(EventRegistration::VolunteerFeedbackComment).text())
                    .col(ColumnDef::new(EventRegistration::VolunteerFeedbackRating).small_integer())
                    .col(
                        ColumnDef::new(EventRegistration::VolunteerFeedbackAt)
                            .timestamp_with_time_zone(),
                    )
                    .col(ColumnDef::new(EventRegistration::OrganiserFeedbackComment).text())
                    .col(ColumnDef::new(EventRegistration::OrganiserFeedbackRating).small_integer())
                    .col(
                        ColumnDef::new(EventRegistration::OrganiserFeedbackAt)
                            .timestamp_with_time_zone(),
                    )
                    .col(ColumnDef::new(EventRegistration::UpdatedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_event_registration_event")
                            .from(EventRegistration::Table, EventRegistration::EventId)
                            .to(Event::Table, Event::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_event_registration_volunteer")
                            .from(EventRegistration::Table, EventRegistration::VolunteerId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: one registration per (volunteer, event)
        manager
            .create_index(
                Index::create()
                    .name("idx_event_registration_volunteer_event")
                    .table(EventRegistration::Table)
                    .col(EventRegistration::VolunteerId)
                    .col(EventRegistration::EventId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_event_registration_event_id")
                    .table(EventRegistration::Table)
                    .col(EventRegistration::EventId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(EventRegistration::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Event::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Event {
    Table,
    Id,
    OrganiserId,
    Name,
    Description,
    Location,
    Causes,
    MaxVolunteers,
    RegisteredCount,
    Status,
    IsRecurring,
    StartDatetime,
    EndDatetime,
    RecurrencePattern,
    RecurrenceDays,
    RecurrenceStartDate,
    RecurrenceEndDate,
    RecurrenceTimeStart,
    RecurrenceTimeEnd,
    Image,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum EventRegistration {
    Table,
    Id,
    VolunteerId,
    EventId,
    Status,
    AttendanceStatus,
    SignupDate,
    CheckInTime,
    CheckOutTime,
    RemovalReason,
    VolunteerFeedbackComment,
    VolunteerFeedbackRating,
    VolunteerFeedbackAt,
    OrganiserFeedbackComment,
    OrganiserFeedbackRating,
    OrganiserFeedbackAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Organiser {
    Table,
    Id,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
