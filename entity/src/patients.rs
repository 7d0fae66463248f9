use crate::{doctors, users};
use sea_orm::prelude::{Date, DateTimeWithTimeZone, *};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "patients")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// Account that filled in the record, not necessarily the patient.
    #[sea_orm(indexed)]
    pub user_id: Uuid,
    #[sea_orm(indexed)]
    pub doctor_id: Uuid,
    pub patient_name: String,
    /// The patient's 11-digit phone number, used as a lookup code.
    #[sea_orm(unique)]
    pub patient_code: String,
    pub date_of_birth: Date,
    pub gender: String,
    pub blood_group: Option<String>,
    pub address: String,
    pub emergency_contact_name: String,
    pub emergency_contact_phone: String,
    pub medical_history: Option<String>,
    pub allergies: Option<String>,
    pub is_active: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "users::Entity",
        from = "Column::UserId",
        to = "users::Column::Id"
    )]
    User,
    #[sea_orm(
        belongs_to = "doctors::Entity",
        from = "Column::DoctorId",
        to = "doctors::Column::Id"
    )]
    Doctor,
}

impl Related<users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<doctors::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Doctor.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
