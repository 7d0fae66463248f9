use sea_orm_migration::prelude::*;

use crate::m20250301_000001_directory::{Diseases, Doctors, Users};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum Patients {
    Table,
    Id,
    UserId,
    DoctorId,
    PatientName,
    PatientCode,
    DateOfBirth,
    Gender,
    BloodGroup,
    Address,
    EmergencyContactName,
    EmergencyContactPhone,
    MedicalHistory,
    Allergies,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum PatientDiseases {
    Table,
    Id,
    PatientId,
    DiseaseId,
    DiagnosedDate,
    Status,
    Notes,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Tests {
    Table,
    Id,
    PatientId,
    DiseaseId,
    TestName,
    TestType,
    TestDate,
    Status,
    Results,
    NormalRange,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Treatments {
    Table,
    Id,
    PatientId,
    DiseaseId,
    TreatmentName,
    Description,
    StartDate,
    EndDate,
    Status,
    Notes,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Surgeries {
    Table,
    Id,
    PatientId,
    SurgeryName,
    Description,
    ScheduledDate,
    ActualDate,
    Status,
    SurgeonName,
    Complications,
    Notes,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Visits {
    Table,
    Id,
    PatientId,
    DoctorId,
    VisitType,
    VisitDate,
    Status,
    ChiefComplaint,
    Diagnosis,
    TreatmentPlan,
    FollowUpDate,
    CreatedAt,
    UpdatedAt,
}

fn patient_fk<T: IntoIden + 'static>(name: &str, table: T, column: T) -> ForeignKeyCreateStatement {
    ForeignKey::create()
        .name(name)
        .from(table, column)
        .to(Patients::Table, Patients::Id)
        .on_delete(ForeignKeyAction::Cascade)
        .to_owned()
}

fn disease_fk<T: IntoIden + 'static>(name: &str, table: T, column: T) -> ForeignKeyCreateStatement {
    ForeignKey::create()
        .name(name)
        .from(table, column)
        .to(Diseases::Table, Diseases::Id)
        .on_delete(ForeignKeyAction::Restrict)
        .to_owned()
}

fn index<T: IntoIden + 'static>(name: &str, table: T, column: T) -> IndexCreateStatement {
    Index::create()
        .if_not_exists()
        .name(name)
        .table(table)
        .col(column)
        .to_owned()
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Patients::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Patients::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Patients::UserId).uuid().not_null())
                    .col(ColumnDef::new(Patients::DoctorId).uuid().not_null())
                    .col(ColumnDef::new(Patients::PatientName).string_len(200).not_null())
                    .col(
                        ColumnDef::new(Patients::PatientCode)
                            .string_len(11)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Patients::DateOfBirth).date().not_null())
                    .col(ColumnDef::new(Patients::Gender).string_len(10).not_null())
                    .col(ColumnDef::new(Patients::BloodGroup).string_len(5))
                    .col(ColumnDef::new(Patients::Address).text().not_null())
                    .col(
                        ColumnDef::new(Patients::EmergencyContactName)
                            .string_len(200)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Patients::EmergencyContactPhone)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Patients::MedicalHistory).text())
                    .col(ColumnDef::new(Patients::Allergies).text())
                    .col(
                        ColumnDef::new(Patients::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Patients::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Patients::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_patients_user")
                            .from(Patients::Table, Patients::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_patients_doctor")
                            .from(Patients::Table, Patients::DoctorId)
                            .to(Doctors::Table, Doctors::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(index("idx_patients_doctor", Patients::Table, Patients::DoctorId))
            .await?;
        manager
            .create_index(index("idx_patients_user", Patients::Table, Patients::UserId))
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PatientDiseases::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PatientDiseases::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PatientDiseases::PatientId).uuid().not_null())
                    .col(ColumnDef::new(PatientDiseases::DiseaseId).uuid().not_null())
                    .col(ColumnDef::new(PatientDiseases::DiagnosedDate).date().not_null())
                    .col(
                        ColumnDef::new(PatientDiseases::Status)
                            .string_len(16)
                            .not_null()
                            .default("ACTIVE"),
                    )
                    .col(ColumnDef::new(PatientDiseases::Notes).text())
                    .col(
                        ColumnDef::new(PatientDiseases::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(&mut patient_fk(
                        "fk_patient_diseases_patient",
                        PatientDiseases::Table,
                        PatientDiseases::PatientId,
                    ))
                    .foreign_key(&mut disease_fk(
                        "fk_patient_diseases_disease",
                        PatientDiseases::Table,
                        PatientDiseases::DiseaseId,
                    ))
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_patient_diseases_patient_disease")
                    .table(PatientDiseases::Table)
                    .col(PatientDiseases::PatientId)
                    .col(PatientDiseases::DiseaseId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Tests::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Tests::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Tests::PatientId).uuid().not_null())
                    .col(ColumnDef::new(Tests::DiseaseId).uuid().not_null())
                    .col(ColumnDef::new(Tests::TestName).string_len(200).not_null())
                    .col(ColumnDef::new(Tests::TestType).string_len(100).not_null())
                    .col(
                        ColumnDef::new(Tests::TestDate)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Tests::Status)
                            .string_len(16)
                            .not_null()
                            .default("PENDING"),
                    )
                    .col(ColumnDef::new(Tests::Results).text())
                    .col(ColumnDef::new(Tests::NormalRange).string_len(200))
                    .col(
                        ColumnDef::new(Tests::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(&mut patient_fk(
                        "fk_tests_patient",
                        Tests::Table,
                        Tests::PatientId,
                    ))
                    .foreign_key(&mut disease_fk(
                        "fk_tests_disease",
                        Tests::Table,
                        Tests::DiseaseId,
                    ))
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(index("idx_tests_patient", Tests::Table, Tests::PatientId))
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Treatments::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Treatments::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Treatments::PatientId).uuid().not_null())
                    .col(ColumnDef::new(Treatments::DiseaseId).uuid().not_null())
                    .col(
                        ColumnDef::new(Treatments::TreatmentName)
                            .string_len(200)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Treatments::Description).text().not_null())
                    .col(ColumnDef::new(Treatments::StartDate).date().not_null())
                    .col(ColumnDef::new(Treatments::EndDate).date())
                    .col(
                        ColumnDef::new(Treatments::Status)
                            .string_len(16)
                            .not_null()
                            .default("ACTIVE"),
                    )
                    .col(ColumnDef::new(Treatments::Notes).text())
                    .col(
                        ColumnDef::new(Treatments::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(&mut patient_fk(
                        "fk_treatments_patient",
                        Treatments::Table,
                        Treatments::PatientId,
                    ))
                    .foreign_key(&mut disease_fk(
                        "fk_treatments_disease",
                        Treatments::Table,
                        Treatments::DiseaseId,
                    ))
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(index(
                "idx_treatments_patient",
                Treatments::Table,
                Treatments::PatientId,
            ))
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Surgeries::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Surgeries::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Surgeries::PatientId).uuid().not_null())
                    .col(ColumnDef::new(Surgeries::SurgeryName).string_len(200).not_null())
                    .col(ColumnDef::new(Surgeries::Description).text().not_null())
                    .col(
                        ColumnDef::new(Surgeries::ScheduledDate)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Surgeries::ActualDate).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(Surgeries::Status)
                            .string_len(16)
                            .not_null()
                            .default("SCHEDULED"),
                    )
                    .col(ColumnDef::new(Surgeries::SurgeonName).string_len(200).not_null())
                    .col(
                        ColumnDef::new(Surgeries::Complications)
                            .text()
                            .not_null()
                            .default(""),
                    )
                    .col(ColumnDef::new(Surgeries::Notes).text())
                    .col(
                        ColumnDef::new(Surgeries::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(&mut patient_fk(
                        "fk_surgeries_patient",
                        Surgeries::Table,
                        Surgeries::PatientId,
                    ))
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(index(
                "idx_surgeries_patient",
                Surgeries::Table,
                Surgeries::PatientId,
            ))
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Visits::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Visits::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Visits::PatientId).uuid().not_null())
                    .col(ColumnDef::new(Visits::DoctorId).uuid().not_null())
                    .col(ColumnDef::new(Visits::VisitType).string_len(32).not_null())
                    .col(
                        ColumnDef::new(Visits::VisitDate)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Visits::Status)
                            .string_len(16)
                            .not_null()
                            .default("SCHEDULED"),
                    )
                    .col(ColumnDef::new(Visits::ChiefComplaint).text().not_null())
                    .col(ColumnDef::new(Visits::Diagnosis).text())
                    .col(ColumnDef::new(Visits::TreatmentPlan).text())
                    .col(ColumnDef::new(Visits::FollowUpDate).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(Visits::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Visits::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(&mut patient_fk(
                        "fk_visits_patient",
                        Visits::Table,
                        Visits::PatientId,
                    ))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_visits_doctor")
                            .from(Visits::Table, Visits::DoctorId)
                            .to(Doctors::Table, Doctors::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(index("idx_visits_patient", Visits::Table, Visits::PatientId))
            .await?;
        manager
            .create_index(index("idx_visits_doctor", Visits::Table, Visits::DoctorId))
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Visits::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Surgeries::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Treatments::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Tests::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(PatientDiseases::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Patients::Table).to_owned())
            .await?;
        Ok(())
    }
}
