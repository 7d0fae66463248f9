use async_graphql::{Enum, InputObject, Json, SimpleObject};
use chrono::NaiveDate;
use entity::{
    centers, cities, diseases, doctors, lab_tests, medicines, patient_diseases, patients, reports,
    staff, surgeries, treatments, users, visits,
};
use platform_api::{ApiError, ApiResult};
use platform_authz::{Operation, ResourceKind, Role};
use platform_db::{DashboardCounts, authz_role, entity_role};
use sea_orm::{ActiveEnum, prelude::DateTimeWithTimeZone};
use uuid::Uuid;

/// Parse a stored status label such as `IN_PROGRESS`.
pub fn parse_status<E>(raw: &str) -> ApiResult<E>
where
    E: ActiveEnum<Value = String>,
{
    E::try_from_value(&raw.trim().to_ascii_uppercase())
        .map_err(|_| ApiError::invalid(format!("unknown status {raw}")))
}

#[derive(Enum, Copy, Clone, Debug, Eq, PartialEq)]
#[graphql(name = "Role")]
pub enum RoleGql {
    Admin,
    Doctor,
    Staff,
    Patient,
}

impl From<Role> for RoleGql {
    fn from(value: Role) -> Self {
        match value {
            Role::Admin => RoleGql::Admin,
            Role::Doctor => RoleGql::Doctor,
            Role::Staff => RoleGql::Staff,
            Role::Patient => RoleGql::Patient,
        }
    }
}

impl From<RoleGql> for users::Role {
    fn from(value: RoleGql) -> Self {
        entity_role(match value {
            RoleGql::Admin => Role::Admin,
            RoleGql::Doctor => Role::Doctor,
            RoleGql::Staff => Role::Staff,
            RoleGql::Patient => Role::Patient,
        })
    }
}

#[derive(Enum, Copy, Clone, Debug, Eq, PartialEq)]
#[graphql(name = "ResourceKind")]
pub enum ResourceKindGql {
    User,
    City,
    Center,
    Doctor,
    Staff,
    Medicine,
    Disease,
    Patient,
    PatientDisease,
    Test,
    Treatment,
    Surgery,
    Visit,
    Report,
}

impl From<ResourceKindGql> for ResourceKind {
    fn from(value: ResourceKindGql) -> Self {
        match value {
            ResourceKindGql::User => ResourceKind::User,
            ResourceKindGql::City => ResourceKind::City,
            ResourceKindGql::Center => ResourceKind::Center,
            ResourceKindGql::Doctor => ResourceKind::Doctor,
            ResourceKindGql::Staff => ResourceKind::Staff,
            ResourceKindGql::Medicine => ResourceKind::Medicine,
            ResourceKindGql::Disease => ResourceKind::Disease,
            ResourceKindGql::Patient => ResourceKind::Patient,
            ResourceKindGql::PatientDisease => ResourceKind::PatientDisease,
            ResourceKindGql::Test => ResourceKind::Test,
            ResourceKindGql::Treatment => ResourceKind::Treatment,
            ResourceKindGql::Surgery => ResourceKind::Surgery,
            ResourceKindGql::Visit => ResourceKind::Visit,
            ResourceKindGql::Report => ResourceKind::Report,
        }
    }
}

#[derive(Enum, Copy, Clone, Debug, Eq, PartialEq)]
#[graphql(name = "Operation")]
pub enum OperationGql {
    Read,
    Create,
    Update,
    Delete,
}

impl From<OperationGql> for Operation {
    fn from(value: OperationGql) -> Self {
        match value {
            OperationGql::Read => Operation::Read,
            OperationGql::Create => Operation::Create,
            OperationGql::Update => Operation::Update,
            OperationGql::Delete => Operation::Delete,
        }
    }
}

#[derive(Enum, Copy, Clone, Debug, Eq, PartialEq)]
#[graphql(name = "ReportKind")]
pub enum ReportKindGql {
    PatientRecord,
    TestResults,
    TreatmentSummary,
    SurgeryReport,
    PatientsPerCity,
    CommonDiseases,
    CenterStatistics,
}

impl From<ReportKindGql> for reports::Kind {
    fn from(value: ReportKindGql) -> Self {
        match value {
            ReportKindGql::PatientRecord => reports::Kind::PatientRecord,
            ReportKindGql::TestResults => reports::Kind::TestResults,
            ReportKindGql::TreatmentSummary => reports::Kind::TreatmentSummary,
            ReportKindGql::SurgeryReport => reports::Kind::SurgeryReport,
            ReportKindGql::PatientsPerCity => reports::Kind::PatientsPerCity,
            ReportKindGql::CommonDiseases => reports::Kind::CommonDiseases,
            ReportKindGql::CenterStatistics => reports::Kind::CenterStatistics,
        }
    }
}

#[derive(Enum, Copy, Clone, Debug, Eq, PartialEq)]
#[graphql(name = "ReportFormat")]
pub enum ReportFormatGql {
    Pdf,
    Excel,
    Csv,
}

impl From<ReportFormatGql> for reports::Format {
    fn from(value: ReportFormatGql) -> Self {
        match value {
            ReportFormatGql::Pdf => reports::Format::Pdf,
            ReportFormatGql::Excel => reports::Format::Excel,
            ReportFormatGql::Csv => reports::Format::Csv,
        }
    }
}

#[derive(Clone, Debug, SimpleObject)]
#[graphql(name = "User")]
pub struct UserNode {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub phone_number: Option<String>,
    pub role: RoleGql,
    pub is_active: bool,
    pub is_verified: bool,
    pub created_at: DateTimeWithTimeZone,
}

impl From<users::Model> for UserNode {
    fn from(model: users::Model) -> Self {
        Self {
            full_name: model.full_name(),
            id: model.id,
            email: model.email,
            first_name: model.first_name,
            last_name: model.last_name,
            phone_number: model.phone_number,
            role: authz_role(model.role).into(),
            is_active: model.is_active,
            is_verified: model.is_verified,
            created_at: model.created_at,
        }
    }
}

#[derive(Clone, Debug, SimpleObject)]
#[graphql(name = "City")]
pub struct CityNode {
    pub id: Uuid,
    pub name: String,
    pub state: String,
    pub country: String,
}

impl From<cities::Model> for CityNode {
    fn from(model: cities::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            state: model.state,
            country: model.country,
        }
    }
}

#[derive(Clone, Debug, SimpleObject)]
#[graphql(name = "Center")]
pub struct CenterNode {
    pub id: Uuid,
    pub name: String,
    pub city_id: Uuid,
    pub address: String,
    pub phone_number: String,
    pub email: Option<String>,
    pub is_active: bool,
}

impl From<centers::Model> for CenterNode {
    fn from(model: centers::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            city_id: model.city_id,
            address: model.address,
            phone_number: model.phone_number,
            email: model.email,
            is_active: model.is_active,
        }
    }
}

#[derive(Clone, Debug, SimpleObject)]
#[graphql(name = "Doctor")]
pub struct DoctorNode {
    pub id: Uuid,
    pub user_id: Uuid,
    pub center_id: Uuid,
    pub specialization: String,
    pub license_number: Option<String>,
    pub experience_years: i32,
    pub consultation_fee_cents: i64,
    pub is_available: bool,
}

impl From<doctors::Model> for DoctorNode {
    fn from(model: doctors::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            center_id: model.center_id,
            specialization: model.specialization,
            license_number: model.license_number,
            experience_years: model.experience_years,
            consultation_fee_cents: model.consultation_fee_cents,
            is_available: model.is_available,
        }
    }
}

#[derive(Clone, Debug, SimpleObject)]
#[graphql(name = "Staff")]
pub struct StaffNode {
    pub id: Uuid,
    pub user_id: Uuid,
    pub center_id: Uuid,
    pub department: String,
    pub employee_id: String,
    pub is_active: bool,
}

impl From<staff::Model> for StaffNode {
    fn from(model: staff::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            center_id: model.center_id,
            department: model.department,
            employee_id: model.employee_id,
            is_active: model.is_active,
        }
    }
}

#[derive(Clone, Debug, SimpleObject)]
#[graphql(name = "Medicine")]
pub struct MedicineNode {
    pub id: Uuid,
    pub name: String,
    pub generic_name: Option<String>,
    pub dosage_form: String,
    pub strength: String,
    pub manufacturer: String,
    pub is_prescription_required: bool,
    pub is_active: bool,
}

impl From<medicines::Model> for MedicineNode {
    fn from(model: medicines::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            generic_name: model.generic_name,
            dosage_form: model.dosage_form,
            strength: model.strength,
            manufacturer: model.manufacturer,
            is_prescription_required: model.is_prescription_required,
            is_active: model.is_active,
        }
    }
}

#[derive(Clone, Debug, SimpleObject)]
#[graphql(name = "Disease")]
pub struct DiseaseNode {
    pub id: Uuid,
    pub name: String,
    pub category: String,
    pub icd_code: Option<String>,
    pub is_active: bool,
}

impl From<diseases::Model> for DiseaseNode {
    fn from(model: diseases::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            category: model.category,
            icd_code: model.icd_code,
            is_active: model.is_active,
        }
    }
}

#[derive(Clone, Debug, SimpleObject)]
#[graphql(name = "Patient")]
pub struct PatientNode {
    pub id: Uuid,
    pub user_id: Uuid,
    pub doctor_id: Uuid,
    pub patient_name: String,
    pub patient_code: String,
    pub date_of_birth: NaiveDate,
    pub gender: String,
    pub blood_group: Option<String>,
    pub address: String,
    pub emergency_contact_name: String,
    pub emergency_contact_phone: String,
    pub medical_history: Option<String>,
    pub allergies: Option<String>,
    pub is_active: bool,
    pub created_at: DateTimeWithTimeZone,
}

impl From<patients::Model> for PatientNode {
    fn from(model: patients::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            doctor_id: model.doctor_id,
            patient_name: model.patient_name,
            patient_code: model.patient_code,
            date_of_birth: model.date_of_birth,
            gender: model.gender,
            blood_group: model.blood_group,
            address: model.address,
            emergency_contact_name: model.emergency_contact_name,
            emergency_contact_phone: model.emergency_contact_phone,
            medical_history: model.medical_history,
            allergies: model.allergies,
            is_active: model.is_active,
            created_at: model.created_at,
        }
    }
}

#[derive(Clone, Debug, SimpleObject)]
#[graphql(name = "PatientDisease")]
pub struct PatientDiseaseNode {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub disease_id: Uuid,
    pub diagnosed_date: NaiveDate,
    pub status: String,
    pub notes: Option<String>,
}

impl From<patient_diseases::Model> for PatientDiseaseNode {
    fn from(model: patient_diseases::Model) -> Self {
        Self {
            id: model.id,
            patient_id: model.patient_id,
            disease_id: model.disease_id,
            diagnosed_date: model.diagnosed_date,
            status: model.status.to_value(),
            notes: model.notes,
        }
    }
}

#[derive(Clone, Debug, SimpleObject)]
#[graphql(name = "Test")]
pub struct TestNode {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub disease_id: Uuid,
    pub test_name: String,
    pub test_type: String,
    pub test_date: DateTimeWithTimeZone,
    pub status: String,
    pub results: Option<String>,
    pub normal_range: Option<String>,
}

impl From<lab_tests::Model> for TestNode {
    fn from(model: lab_tests::Model) -> Self {
        Self {
            id: model.id,
            patient_id: model.patient_id,
            disease_id: model.disease_id,
            test_name: model.test_name,
            test_type: model.test_type,
            test_date: model.test_date,
            status: model.status.to_value(),
            results: model.results,
            normal_range: model.normal_range,
        }
    }
}

#[derive(Clone, Debug, SimpleObject)]
#[graphql(name = "Treatment")]
pub struct TreatmentNode {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub disease_id: Uuid,
    pub treatment_name: String,
    pub description: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub status: String,
    pub notes: Option<String>,
}

impl From<treatments::Model> for TreatmentNode {
    fn from(model: treatments::Model) -> Self {
        Self {
            id: model.id,
            patient_id: model.patient_id,
            disease_id: model.disease_id,
            treatment_name: model.treatment_name,
            description: model.description,
            start_date: model.start_date,
            end_date: model.end_date,
            status: model.status.to_value(),
            notes: model.notes,
        }
    }
}

#[derive(Clone, Debug, SimpleObject)]
#[graphql(name = "Surgery")]
pub struct SurgeryNode {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub surgery_name: String,
    pub description: String,
    pub scheduled_date: DateTimeWithTimeZone,
    pub actual_date: Option<DateTimeWithTimeZone>,
    pub status: String,
    pub surgeon_name: String,
    pub complications: String,
    pub notes: Option<String>,
}

impl From<surgeries::Model> for SurgeryNode {
    fn from(model: surgeries::Model) -> Self {
        Self {
            id: model.id,
            patient_id: model.patient_id,
            surgery_name: model.surgery_name,
            description: model.description,
            scheduled_date: model.scheduled_date,
            actual_date: model.actual_date,
            status: model.status.to_value(),
            surgeon_name: model.surgeon_name,
            complications: model.complications,
            notes: model.notes,
        }
    }
}

#[derive(Clone, Debug, SimpleObject)]
#[graphql(name = "Visit")]
pub struct VisitNode {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub visit_type: String,
    pub visit_date: DateTimeWithTimeZone,
    pub status: String,
    pub chief_complaint: String,
    pub diagnosis: Option<String>,
    pub treatment_plan: Option<String>,
    pub follow_up_date: Option<DateTimeWithTimeZone>,
}

impl From<visits::Model> for VisitNode {
    fn from(model: visits::Model) -> Self {
        Self {
            id: model.id,
            patient_id: model.patient_id,
            doctor_id: model.doctor_id,
            visit_type: model.visit_type,
            visit_date: model.visit_date,
            status: model.status.to_value(),
            chief_complaint: model.chief_complaint,
            diagnosis: model.diagnosis,
            treatment_plan: model.treatment_plan,
            follow_up_date: model.follow_up_date,
        }
    }
}

#[derive(Clone, Debug, SimpleObject)]
#[graphql(name = "Report")]
pub struct ReportNode {
    pub id: Uuid,
    pub name: String,
    pub kind: String,
    pub format: String,
    pub status: String,
    pub parameters: Json<serde_json::Value>,
    pub result: Option<Json<serde_json::Value>>,
    pub error: Option<String>,
    pub generated_by: Uuid,
    pub created_at: DateTimeWithTimeZone,
    pub completed_at: Option<DateTimeWithTimeZone>,
}

impl From<reports::Model> for ReportNode {
    fn from(model: reports::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            kind: model.kind.to_value(),
            format: model.format.to_value(),
            status: model.status.to_value(),
            parameters: Json(model.parameters),
            result: model.result.map(Json),
            error: model.error,
            generated_by: model.generated_by,
            created_at: model.created_at,
            completed_at: model.completed_at,
        }
    }
}

#[derive(Clone, Debug, SimpleObject)]
#[graphql(name = "Dashboard")]
pub struct DashboardNode {
    pub patients: u64,
    pub pending_tests: u64,
    pub active_treatments: u64,
    pub upcoming_surgeries: u64,
    pub scheduled_visits: u64,
}

impl From<DashboardCounts> for DashboardNode {
    fn from(counts: DashboardCounts) -> Self {
        Self {
            patients: counts.patients,
            pending_tests: counts.pending_tests,
            active_treatments: counts.active_treatments,
            upcoming_surgeries: counts.upcoming_surgeries,
            scheduled_visits: counts.scheduled_visits,
        }
    }
}

#[derive(InputObject)]
pub struct CityInput {
    pub name: String,
    pub state: String,
    pub country: String,
}

#[derive(InputObject)]
pub struct MedicineInput {
    pub name: String,
    pub generic_name: Option<String>,
    pub dosage_form: String,
    pub strength: String,
    pub manufacturer: String,
    #[graphql(default = true)]
    pub is_prescription_required: bool,
    #[graphql(default = true)]
    pub is_active: bool,
}

#[derive(InputObject)]
pub struct DiseaseInput {
    pub name: String,
    pub category: String,
    pub icd_code: Option<String>,
    #[graphql(default = true)]
    pub is_active: bool,
}

#[derive(InputObject)]
pub struct CenterInput {
    pub name: String,
    pub city_id: Uuid,
    pub address: String,
    pub phone_number: String,
    pub email: Option<String>,
    #[graphql(default = true)]
    pub is_active: bool,
}

#[derive(InputObject)]
pub struct CreateUserInput {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: Option<String>,
    pub role: RoleGql,
}

#[derive(InputObject)]
pub struct CreateDoctorInput {
    pub user_id: Uuid,
    pub center_id: Uuid,
    pub specialization: String,
    pub license_number: Option<String>,
    #[graphql(default)]
    pub experience_years: i32,
    #[graphql(default)]
    pub consultation_fee_cents: i64,
}

#[derive(InputObject)]
pub struct UpdateDoctorInput {
    pub specialization: Option<String>,
    pub experience_years: Option<i32>,
    pub consultation_fee_cents: Option<i64>,
    pub is_available: Option<bool>,
}

#[derive(InputObject)]
pub struct CreateStaffInput {
    pub user_id: Uuid,
    pub center_id: Uuid,
    pub department: String,
    pub employee_id: String,
}

#[derive(InputObject)]
pub struct UpdateStaffInput {
    pub department: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(InputObject)]
pub struct PatientInput {
    pub doctor_id: Uuid,
    pub patient_name: String,
    pub patient_code: String,
    pub date_of_birth: NaiveDate,
    pub gender: String,
    pub blood_group: Option<String>,
    pub address: String,
    pub emergency_contact_name: String,
    pub emergency_contact_phone: String,
    pub medical_history: Option<String>,
    pub allergies: Option<String>,
}

#[derive(InputObject)]
pub struct UpdatePatientInput {
    pub doctor_id: Option<Uuid>,
    pub patient_name: Option<String>,
    pub address: Option<String>,
    pub blood_group: Option<String>,
    pub emergency_contact_name: Option<String>,
    pub emergency_contact_phone: Option<String>,
    pub medical_history: Option<String>,
    pub allergies: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(InputObject)]
pub struct VisitInput {
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub visit_type: String,
    pub visit_date: DateTimeWithTimeZone,
    pub chief_complaint: String,
}

#[derive(InputObject)]
pub struct UpdateVisitInput {
    pub status: Option<String>,
    pub visit_date: Option<DateTimeWithTimeZone>,
    pub diagnosis: Option<String>,
    pub treatment_plan: Option<String>,
    pub follow_up_date: Option<DateTimeWithTimeZone>,
}

#[derive(InputObject)]
pub struct DiagnosisInput {
    pub patient_id: Uuid,
    pub disease_id: Uuid,
    pub diagnosed_date: NaiveDate,
    pub status: Option<String>,
    pub notes: Option<String>,
}

#[derive(InputObject)]
pub struct TestInput {
    pub patient_id: Uuid,
    pub disease_id: Uuid,
    pub test_name: String,
    pub test_type: String,
    pub test_date: DateTimeWithTimeZone,
    pub normal_range: Option<String>,
}

#[derive(InputObject)]
pub struct UpdateTestInput {
    pub status: Option<String>,
    pub results: Option<String>,
}

#[derive(InputObject)]
pub struct TreatmentInput {
    pub patient_id: Uuid,
    pub disease_id: Uuid,
    pub treatment_name: String,
    pub description: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

#[derive(InputObject)]
pub struct UpdateTreatmentInput {
    pub status: Option<String>,
    pub end_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

#[derive(InputObject)]
pub struct SurgeryInput {
    pub patient_id: Uuid,
    pub surgery_name: String,
    pub description: String,
    pub scheduled_date: DateTimeWithTimeZone,
    pub surgeon_name: String,
    pub notes: Option<String>,
}

#[derive(InputObject)]
pub struct UpdateSurgeryInput {
    pub status: Option<String>,
    pub actual_date: Option<DateTimeWithTimeZone>,
    pub complications: Option<String>,
    pub notes: Option<String>,
}

#[derive(InputObject)]
pub struct ReportInput {
    pub name: String,
    pub kind: ReportKindGql,
    pub format: ReportFormatGql,
    pub patient_id: Option<Uuid>,
    pub surgery_id: Option<Uuid>,
    pub parameters: Option<Json<serde_json::Value>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_parse_case_insensitively() {
        let status: visits::Status = parse_status("no_show").unwrap();
        assert_eq!(status, visits::Status::NoShow);
        let err = parse_status::<lab_tests::Status>("LOST").unwrap_err();
        assert!(matches!(err, ApiError::InvalidInput(_)));
    }
}
