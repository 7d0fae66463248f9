use crate::{diseases, patients};
use sea_orm::prelude::{Date, DateTimeWithTimeZone, *};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "patient_diseases")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(indexed)]
    pub patient_id: Uuid,
    #[sea_orm(indexed)]
    pub disease_id: Uuid,
    pub diagnosed_date: Date,
    pub status: DiagnosisStatus,
    pub notes: Option<String>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveActiveEnum, Eq, PartialEq)]
#[sea_orm(rs_type = "String", db_type = "String(Some(16))")]
pub enum DiagnosisStatus {
    #[sea_orm(string_value = "ACTIVE")]
    Active,
    #[sea_orm(string_value = "TREATED")]
    Treated,
    #[sea_orm(string_value = "CHRONIC")]
    Chronic,
    #[sea_orm(string_value = "CURED")]
    Cured,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "patients::Entity",
        from = "Column::PatientId",
        to = "patients::Column::Id",
        on_delete = "Cascade"
    )]
    Patient,
    #[sea_orm(
        belongs_to = "diseases::Entity",
        from = "Column::DiseaseId",
        to = "diseases::Column::Id"
    )]
    Disease,
}

impl Related<patients::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Patient.def()
    }
}

impl Related<diseases::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Disease.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
