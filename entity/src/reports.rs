use crate::users;
use sea_orm::prelude::{DateTimeWithTimeZone, Json, *};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "reports")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    #[sea_orm(indexed)]
    pub kind: Kind,
    pub format: Format,
    #[sea_orm(indexed)]
    pub status: Status,
    pub parameters: Json,
    pub result: Option<Json>,
    pub error: Option<String>,
    #[sea_orm(indexed)]
    pub generated_by: Uuid,
    pub created_at: DateTimeWithTimeZone,
    pub completed_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveActiveEnum, Eq, PartialEq)]
#[sea_orm(rs_type = "String", db_type = "String(Some(24))")]
pub enum Kind {
    #[sea_orm(string_value = "PATIENT_RECORD")]
    PatientRecord,
    #[sea_orm(string_value = "TEST_RESULTS")]
    TestResults,
    #[sea_orm(string_value = "TREATMENT_SUMMARY")]
    TreatmentSummary,
    #[sea_orm(string_value = "SURGERY_REPORT")]
    SurgeryReport,
    #[sea_orm(string_value = "PATIENTS_PER_CITY")]
    PatientsPerCity,
    #[sea_orm(string_value = "COMMON_DISEASES")]
    CommonDiseases,
    #[sea_orm(string_value = "CENTER_STATISTICS")]
    CenterStatistics,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveActiveEnum, Eq, PartialEq)]
#[sea_orm(rs_type = "String", db_type = "String(Some(8))")]
pub enum Format {
    #[sea_orm(string_value = "PDF")]
    Pdf,
    #[sea_orm(string_value = "EXCEL")]
    Excel,
    #[sea_orm(string_value = "CSV")]
    Csv,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveActiveEnum, Eq, PartialEq)]
#[sea_orm(rs_type = "String", db_type = "String(Some(16))")]
pub enum Status {
    #[sea_orm(string_value = "PENDING")]
    Pending,
    #[sea_orm(string_value = "GENERATING")]
    Generating,
    #[sea_orm(string_value = "COMPLETED")]
    Completed,
    #[sea_orm(string_value = "FAILED")]
    Failed,
}

impl Status {
    /// `PENDING -> GENERATING -> {COMPLETED | FAILED}`.
    pub fn can_transition_to(self, next: Status) -> bool {
        matches!(
            (self, next),
            (Status::Pending, Status::Generating)
                | (Status::Generating, Status::Completed)
                | (Status::Generating, Status::Failed)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Status::Completed | Status::Failed)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "users::Entity",
        from = "Column::GeneratedBy",
        to = "users::Column::Id",
        on_delete = "Cascade"
    )]
    GeneratedBy,
}

impl Related<users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::GeneratedBy.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
