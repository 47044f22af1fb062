//! Create user and role profile tables.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(User::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(User::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(User::Email).string_len(320).not_null())
                    .col(ColumnDef::new(User::PasswordHash).string_len(256).not_null())
                    .col(ColumnDef::new(User::Role).string_len(16).not_null())
                    .col(
                        ColumnDef::new(User::Status)
                            .string_len(16)
                            .not_null()
                            .default("active"),
                    )
                    .col(ColumnDef::new(User::ProfilePicture).string_len(512))
                    .col(
                        ColumnDef::new(User::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(User::UpdatedAt).timestamp_with_time_zone())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_user_email")
                    .table(User::Table)
                    .col(User::Email)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Index: role (dashboard counts, admin filters)
        manager
            .create_index(
                Index::create()
                    .name("idx_user_role")
                    .table(User::Table)
                    .col(User::Role)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Volunteer::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Volunteer::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(Volunteer::UserId).string_len(32).not_null())
                    .col(ColumnDef::new(Volunteer::Name).string_len(256).not_null())
                    .col(ColumnDef::new(Volunteer::Phone).string_len(32))
                    .col(ColumnDef::new(Volunteer::Dob).date())
                    .col(
                        ColumnDef::new(Volunteer::Skills)
                            .json_binary()
                            .not_null()
                            .default(Expr::cust("'[]'::jsonb")),
                    )
                    .col(
                        ColumnDef::new(Volunteer::PreferredCauses)
                            .json_binary()
                            .not_null()
                            .default(Expr::cust("'[]'::jsonb")),
                    )
                    .col(ColumnDef::new(Volunteer::NricImage).string_len(512))
                    .col(
                        ColumnDef::new(Volunteer::NricVerified)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Volunteer::NricRejectionReason).text())
                    .col(
                        ColumnDef::new(Volunteer::NricRequiresReupload)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Volunteer::NricUploadedAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(Volunteer::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Volunteer::UpdatedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_volunteer_user")
                            .from(Volunteer::Table, Volunteer::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_volunteer_user_id")
                    .table(Volunteer::Table)
                    .col(Volunteer::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Index: nric_uploaded_at (pending verification queue)
        manager
            .create_index(
                Index::create()
                    .name("idx_volunteer_nric_uploaded_at")
                    .table(Volunteer::Table)
                    .col(Volunteer::NricUploadedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Organiser::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Organiser::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(Organiser::UserId).string_len(32).not_null())
                    .col(ColumnDef::new(Organiser::OrganisationName).string_len(256).not_null())
                    .col(ColumnDef::new(Organiser::Phone).string_len(32))
                    .col(ColumnDef::new(Organiser::Description).text())
                    .col(
                        ColumnDef::new(Organiser::VerificationStatus)
                            .string_len(16)
                            .not_null()
                            .default("pending"),
                    )
                    .col(ColumnDef::new(Organiser::VerificationRejectionReason).text())
                    .col(ColumnDef::new(Organiser::CertificationDocument).string_len(512))
                    .col(
                        ColumnDef::new(Organiser::CertificationVerified)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Organiser::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Organiser::UpdatedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_organiser_user")
                            .from(Organiser::Table, Organiser::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_organiser_user_id")
                    .table(Organiser::Table)
                    .col(Organiser::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Admin::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Admin::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(Admin::UserId).string_len(32).not_null())
                    .col(ColumnDef::new(Admin::Name).string_len(256).not_null())
                    .col(
                        ColumnDef::new(Admin::Permissions)
                            .json_binary()
                            .not_null()
                            .default(Expr::cust("'[]'::jsonb")),
                    )
                    .col(
                        ColumnDef::new(Admin::ReportsHandled)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Admin::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_admin_user")
                            .from(Admin::Table, Admin::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_admin_user_id")
                    .table(Admin::Table)
                    .col(Admin::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Admin::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Organiser::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Volunteer::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(User::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum User {
    Table,
    Id,
    Email,
    PasswordHash,
    Role,
    Status,
    ProfilePicture,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Volunteer {
    Table,
    Id,
    UserId,
    Name,
    Phone,
    Dob,
    Skills,
    PreferredCauses,
    NricImage,
    NricVerified,
    NricRejectionReason,
    NricRequiresReupload,
    NricUploadedAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Organiser {
    Table,
    Id,
    UserId,
    OrganisationName,
    Phone,
    Description,
    VerificationStatus,
    VerificationRejectionReason,
    CertificationDocument,
    CertificationVerified,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Admin {
    Table,
    Id,
    UserId,
    Name,
    Permissions,
    ReportsHandled,
    CreatedAt,
}
