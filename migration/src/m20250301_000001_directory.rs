use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
pub(crate) enum Users {
    Table,
    Id,
    Email,
    PasswordHash,
    FirstName,
    LastName,
    PhoneNumber,
    Role,
    IsActive,
    IsVerified,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Cities {
    Table,
    Id,
    Name,
    State,
    Country,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Centers {
    Table,
    Id,
    Name,
    CityId,
    Address,
    PhoneNumber,
    Email,
    IsActive,
    CreatedAt,
}

#[derive(DeriveIden)]
pub(crate) enum Doctors {
    Table,
    Id,
    UserId,
    CenterId,
    Specialization,
    LicenseNumber,
    ExperienceYears,
    ConsultationFeeCents,
    IsAvailable,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Staff {
    Table,
    Id,
    UserId,
    CenterId,
    Department,
    EmployeeId,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Medicines {
    Table,
    Id,
    Name,
    GenericName,
    DosageForm,
    Strength,
    Manufacturer,
    IsPrescriptionRequired,
    IsActive,
    CreatedAt,
}

#[derive(DeriveIden)]
pub(crate) enum Diseases {
    Table,
    Id,
    Name,
    Category,
    IcdCode,
    IsActive,
    CreatedAt,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Users::Id).uuid().not_null().primary_key())
                    .col(
                        ColumnDef::new(Users::Email)
                            .string_len(320)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Users::PasswordHash).string().not_null())
                    .col(ColumnDef::new(Users::FirstName).string().not_null())
                    .col(ColumnDef::new(Users::LastName).string().not_null())
                    .col(ColumnDef::new(Users::PhoneNumber).string_len(32))
                    .col(ColumnDef::new(Users::Role).string_len(16).not_null())
                    .col(
                        ColumnDef::new(Users::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Users::IsVerified)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Users::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Users::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .check(Expr::cust(
                        "(role IN ('ADMIN','DOCTOR','STAFF','PATIENT'))",
                    ))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_users_role")
                    .table(Users::Table)
                    .col(Users::Role)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Cities::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Cities::Id).uuid().not_null().primary_key())
                    .col(
                        ColumnDef::new(Cities::Name)
                            .string_len(100)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Cities::State).string_len(100).not_null())
                    .col(ColumnDef::new(Cities::Country).string_len(100).not_null())
                    .col(
                        ColumnDef::new(Cities::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Centers::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Centers::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Centers::Name).string_len(200).not_null())
                    .col(ColumnDef::new(Centers::CityId).uuid().not_null())
                    .col(ColumnDef::new(Centers::Address).text().not_null())
                    .col(ColumnDef::new(Centers::PhoneNumber).string_len(32).not_null())
                    .col(ColumnDef::new(Centers::Email).string_len(320))
                    .col(
                        ColumnDef::new(Centers::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Centers::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_centers_city")
                            .from(Centers::Table, Centers::CityId)
                            .to(Cities::Table, Cities::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_centers_city")
                    .table(Centers::Table)
                    .col(Centers::CityId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Doctors::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Doctors::Id).uuid().not_null().primary_key())
                    .col(
                        ColumnDef::new(Doctors::UserId)
                            .uuid()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Doctors::CenterId).uuid().not_null())
                    .col(
                        ColumnDef::new(Doctors::Specialization)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Doctors::LicenseNumber)
                            .string_len(64)
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Doctors::ExperienceYears)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Doctors::ConsultationFeeCents)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Doctors::IsAvailable)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Doctors::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Doctors::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_doctors_user")
                            .from(Doctors::Table, Doctors::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_doctors_center")
                            .from(Doctors::Table, Doctors::CenterId)
                            .to(Centers::Table, Centers::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_doctors_center")
                    .table(Doctors::Table)
                    .col(Doctors::CenterId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Staff::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Staff::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Staff::UserId).uuid().not_null().unique_key())
                    .col(ColumnDef::new(Staff::CenterId).uuid().not_null())
                    .col(ColumnDef::new(Staff::Department).string_len(100).not_null())
                    .col(
                        ColumnDef::new(Staff::EmployeeId)
                            .string_len(32)
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Staff::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Staff::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Staff::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_staff_user")
                            .from(Staff::Table, Staff::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_staff_center")
                            .from(Staff::Table, Staff::CenterId)
                            .to(Centers::Table, Centers::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_staff_center")
                    .table(Staff::Table)
                    .col(Staff::CenterId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Medicines::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Medicines::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Medicines::Name).string_len(200).not_null())
                    .col(ColumnDef::new(Medicines::GenericName).string_len(200))
                    .col(ColumnDef::new(Medicines::DosageForm).string_len(50).not_null())
                    .col(ColumnDef::new(Medicines::Strength).string_len(50).not_null())
                    .col(
                        ColumnDef::new(Medicines::Manufacturer)
                            .string_len(200)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Medicines::IsPrescriptionRequired)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Medicines::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Medicines::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_medicines_name")
                    .table(Medicines::Table)
                    .col(Medicines::Name)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Diseases::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Diseases::Id).uuid().not_null().primary_key())
                    .col(
                        ColumnDef::new(Diseases::Name)
                            .string_len(200)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Diseases::Category).string_len(100).not_null())
                    .col(ColumnDef::new(Diseases::IcdCode).string_len(16))
                    .col(
                        ColumnDef::new(Diseases::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Diseases::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Diseases::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Medicines::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Staff::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Doctors::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Centers::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Cities::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;
        Ok(())
    }
}
