use async_graphql::{Context, Object, Result};
use chrono::Utc;
use entity::{
    centers, cities, diseases, doctors, lab_tests, medicines, patient_diseases, patients, reports,
    staff, surgeries, treatments, users, visits,
};
use platform_api::{ApiError, ApiResult, IntoGraphql};
use platform_authz::Operation;
use platform_db::{
    ScopedEntity,
    reports::{ReportRequest, request_report},
};
use sea_orm::{
    ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, prelude::DateTimeWithTimeZone,
};
use tracing::{info, instrument};
use uuid::Uuid;

use super::{
    Scope, optional, required,
    types::{
        CenterInput, CenterNode, CityInput, CityNode, CreateDoctorInput, CreateStaffInput,
        CreateUserInput, DiagnosisInput, DiseaseInput, DiseaseNode, DoctorNode, MedicineInput,
        MedicineNode, PatientDiseaseNode, PatientInput, PatientNode, ReportInput, ReportNode,
        StaffNode, SurgeryInput, SurgeryNode, TestInput, TestNode, TreatmentInput, TreatmentNode,
        UpdateDoctorInput, UpdatePatientInput, UpdateStaffInput, UpdateSurgeryInput,
        UpdateTestInput, UpdateTreatmentInput, UpdateVisitInput, UserNode, VisitInput, VisitNode,
        parse_status,
    },
};
use crate::auth::{hash_password, normalize_email};

pub const PATIENT_CODE_LEN: usize = 11;

#[derive(Default)]
pub struct MutationRoot;

fn now() -> DateTimeWithTimeZone {
    Utc::now().into()
}

/// Patient codes are the contact phone number: exactly eleven digits.
pub fn patient_code(raw: &str) -> ApiResult<String> {
    let code = raw.trim();
    if code.len() == PATIENT_CODE_LEN && code.bytes().all(|byte| byte.is_ascii_digit()) {
        Ok(code.to_string())
    } else {
        Err(ApiError::invalid(format!(
            "patient code must be exactly {PATIENT_CODE_LEN} digits"
        )))
    }
}

/// Rows referenced by id must exist before anything points at them.
async fn ensure_exists<E>(scope: &Scope<'_>, id: Uuid) -> ApiResult<()>
where
    E: ScopedEntity,
    E::Model: Sync,
{
    let found = E::find()
        .filter(E::id_column().eq(id))
        .count(scope.db())
        .await?;
    if found == 0 {
        return Err(ApiError::invalid(format!("unknown {} {id}", E::KIND)));
    }
    Ok(())
}

#[Object]
impl MutationRoot {
    async fn create_city(&self, ctx: &Context<'_>, input: CityInput) -> Result<CityNode> {
        let scope = Scope::of(ctx)?;
        let model = cities::Model {
            id: Uuid::new_v4(),
            name: required("name", input.name).gql()?,
            state: input.state.trim().to_string(),
            country: input.country.trim().to_string(),
            created_at: now(),
        };
        scope
            .create::<cities::Entity, _>(model)
            .await
            .map(CityNode::from)
            .gql()
    }

    async fn update_city(&self, ctx: &Context<'_>, id: Uuid, input: CityInput) -> Result<CityNode> {
        let scope = Scope::of(ctx)?;
        scope
            .update::<cities::Entity, _>(id, |city| {
                city.name = required("name", input.name)?;
                city.state = input.state.trim().to_string();
                city.country = input.country.trim().to_string();
                Ok(())
            })
            .await
            .map(CityNode::from)
            .gql()
    }

    async fn delete_city(&self, ctx: &Context<'_>, id: Uuid) -> Result<bool> {
        Scope::of(ctx)?.delete::<cities::Entity>(id).await.gql()
    }

    async fn create_medicine(
        &self,
        ctx: &Context<'_>,
        input: MedicineInput,
    ) -> Result<MedicineNode> {
        let scope = Scope::of(ctx)?;
        let model = medicines::Model {
            id: Uuid::new_v4(),
            name: required("name", input.name).gql()?,
            generic_name: optional(input.generic_name),
            dosage_form: input.dosage_form.trim().to_string(),
            strength: input.strength.trim().to_string(),
            manufacturer: input.manufacturer.trim().to_string(),
            is_prescription_required: input.is_prescription_required,
            is_active: input.is_active,
            created_at: now(),
        };
        scope
            .create::<medicines::Entity, _>(model)
            .await
            .map(MedicineNode::from)
            .gql()
    }

    async fn update_medicine(
        &self,
        ctx: &Context<'_>,
        id: Uuid,
        input: MedicineInput,
    ) -> Result<MedicineNode> {
        let scope = Scope::of(ctx)?;
        scope
            .update::<medicines::Entity, _>(id, |medicine| {
                medicine.name = required("name", input.name)?;
                medicine.generic_name = optional(input.generic_name);
                medicine.dosage_form = input.dosage_form.trim().to_string();
                medicine.strength = input.strength.trim().to_string();
                medicine.manufacturer = input.manufacturer.trim().to_string();
                medicine.is_prescription_required = input.is_prescription_required;
                medicine.is_active = input.is_active;
                Ok(())
            })
            .await
            .map(MedicineNode::from)
            .gql()
    }

    async fn delete_medicine(&self, ctx: &Context<'_>, id: Uuid) -> Result<bool> {
        Scope::of(ctx)?.delete::<medicines::Entity>(id).await.gql()
    }

    async fn create_disease(&self, ctx: &Context<'_>, input: DiseaseInput) -> Result<DiseaseNode> {
        let scope = Scope::of(ctx)?;
        let model = diseases::Model {
            id: Uuid::new_v4(),
            name: required("name", input.name).gql()?,
            category: input.category.trim().to_string(),
            icd_code: optional(input.icd_code),
            is_active: input.is_active,
            created_at: now(),
        };
        scope
            .create::<diseases::Entity, _>(model)
            .await
            .map(DiseaseNode::from)
            .gql()
    }

    async fn update_disease(
        &self,
        ctx: &Context<'_>,
        id: Uuid,
        input: DiseaseInput,
    ) -> Result<DiseaseNode> {
        let scope = Scope::of(ctx)?;
        scope
            .update::<diseases::Entity, _>(id, |disease| {
                disease.name = required("name", input.name)?;
                disease.category = input.category.trim().to_string();
                disease.icd_code = optional(input.icd_code);
                disease.is_active = input.is_active;
                Ok(())
            })
            .await
            .map(DiseaseNode::from)
            .gql()
    }

    async fn delete_disease(&self, ctx: &Context<'_>, id: Uuid) -> Result<bool> {
        Scope::of(ctx)?.delete::<diseases::Entity>(id).await.gql()
    }

    async fn create_center(&self, ctx: &Context<'_>, input: CenterInput) -> Result<CenterNode> {
        let scope = Scope::of(ctx)?;
        scope.may::<centers::Entity>(Operation::Create).gql()?;
        ensure_exists::<cities::Entity>(&scope, input.city_id)
            .await
            .gql()?;
        let model = centers::Model {
            id: Uuid::new_v4(),
            name: required("name", input.name).gql()?,
            city_id: input.city_id,
            address: input.address.trim().to_string(),
            phone_number: input.phone_number.trim().to_string(),
            email: optional(input.email),
            is_active: input.is_active,
            created_at: now(),
        };
        scope
            .create::<centers::Entity, _>(model)
            .await
            .map(CenterNode::from)
            .gql()
    }

    async fn update_center(
        &self,
        ctx: &Context<'_>,
        id: Uuid,
        input: CenterInput,
    ) -> Result<CenterNode> {
        let scope = Scope::of(ctx)?;
        scope.may::<centers::Entity>(Operation::Update).gql()?;
        ensure_exists::<cities::Entity>(&scope, input.city_id)
            .await
            .gql()?;
        scope
            .update::<centers::Entity, _>(id, |center| {
                center.name = required("name", input.name)?;
                center.city_id = input.city_id;
                center.address = input.address.trim().to_string();
                center.phone_number = input.phone_number.trim().to_string();
                center.email = optional(input.email);
                center.is_active = input.is_active;
                Ok(())
            })
            .await
            .map(CenterNode::from)
            .gql()
    }

    async fn delete_center(&self, ctx: &Context<'_>, id: Uuid) -> Result<bool> {
        Scope::of(ctx)?.delete::<centers::Entity>(id).await.gql()
    }

    #[instrument(name = "graphql.create_user", skip_all)]
    async fn create_user(&self, ctx: &Context<'_>, input: CreateUserInput) -> Result<UserNode> {
        let scope = Scope::of(ctx)?;
        scope.may::<users::Entity>(Operation::Create).gql()?;
        let email = normalize_email(&input.email)
            .ok_or_else(|| ApiError::invalid("a valid email is required"))
            .gql()?;
        if input.password.len() < 8 {
            return Err(ApiError::invalid("password must have at least 8 characters")).gql();
        }
        let created = now();
        let model = users::Model {
            id: Uuid::new_v4(),
            email,
            password_hash: String::new(),
            first_name: required("first name", input.first_name).gql()?,
            last_name: input.last_name.trim().to_string(),
            phone_number: optional(input.phone_number),
            role: input.role.into(),
            is_active: true,
            is_verified: false,
            created_at: created,
            updated_at: created,
        };
        let mut model = scope
            .permit::<users::Entity>(Operation::Create, model)
            .await
            .gql()?;
        let taken = users::Entity::find()
            .filter(users::Column::Email.eq(model.email.as_str()))
            .count(scope.db())
            .await
            .gql()?;
        if taken > 0 {
            return Err(ApiError::invalid("email is already registered")).gql();
        }
        model.password_hash = hash_password(&input.password).gql()?;
        let user = scope.create::<users::Entity, _>(model).await.gql()?;
        info!(user_id = %user.id, role = ?user.role, "user created");
        Ok(user.into())
    }

    /// Deactivated users can no longer sign in; existing sessions end on
    /// their next request.
    async fn set_user_active(&self, ctx: &Context<'_>, id: Uuid, active: bool) -> Result<UserNode> {
        let scope = Scope::of(ctx)?;
        scope
            .update::<users::Entity, _>(id, |user| {
                user.is_active = active;
                user.updated_at = now();
                Ok(())
            })
            .await
            .map(UserNode::from)
            .gql()
    }

    async fn create_doctor(
        &self,
        ctx: &Context<'_>,
        input: CreateDoctorInput,
    ) -> Result<DoctorNode> {
        let scope = Scope::of(ctx)?;
        scope.may::<doctors::Entity>(Operation::Create).gql()?;
        ensure_exists::<users::Entity>(&scope, input.user_id)
            .await
            .gql()?;
        ensure_exists::<centers::Entity>(&scope, input.center_id)
            .await
            .gql()?;
        let created = now();
        let model = doctors::Model {
            id: Uuid::new_v4(),
            user_id: input.user_id,
            center_id: input.center_id,
            specialization: required("specialization", input.specialization).gql()?,
            license_number: optional(input.license_number),
            experience_years: input.experience_years.max(0),
            consultation_fee_cents: input.consultation_fee_cents.max(0),
            is_available: true,
            created_at: created,
            updated_at: created,
        };
        scope
            .create::<doctors::Entity, _>(model)
            .await
            .map(DoctorNode::from)
            .gql()
    }

    /// Doctors may edit their own profile; the center assignment is not
    /// editable here.
    async fn update_doctor(
        &self,
        ctx: &Context<'_>,
        id: Uuid,
        input: UpdateDoctorInput,
    ) -> Result<DoctorNode> {
        let scope = Scope::of(ctx)?;
        scope
            .update::<doctors::Entity, _>(id, |doctor| {
                if let Some(specialization) = input.specialization {
                    doctor.specialization = required("specialization", specialization)?;
                }
                if let Some(years) = input.experience_years {
                    doctor.experience_years = years.max(0);
                }
                if let Some(fee) = input.consultation_fee_cents {
                    doctor.consultation_fee_cents = fee.max(0);
                }
                if let Some(available) = input.is_available {
                    doctor.is_available = available;
                }
                doctor.updated_at = now();
                Ok(())
            })
            .await
            .map(DoctorNode::from)
            .gql()
    }

    async fn delete_doctor(&self, ctx: &Context<'_>, id: Uuid) -> Result<bool> {
        Scope::of(ctx)?.delete::<doctors::Entity>(id).await.gql()
    }

    async fn create_staff(&self, ctx: &Context<'_>, input: CreateStaffInput) -> Result<StaffNode> {
        let scope = Scope::of(ctx)?;
        scope.may::<staff::Entity>(Operation::Create).gql()?;
        ensure_exists::<users::Entity>(&scope, input.user_id)
            .await
            .gql()?;
        ensure_exists::<centers::Entity>(&scope, input.center_id)
            .await
            .gql()?;
        let created = now();
        let model = staff::Model {
            id: Uuid::new_v4(),
            user_id: input.user_id,
            center_id: input.center_id,
            department: required("department", input.department).gql()?,
            employee_id: required("employee id", input.employee_id).gql()?,
            is_active: true,
            created_at: created,
            updated_at: created,
        };
        scope
            .create::<staff::Entity, _>(model)
            .await
            .map(StaffNode::from)
            .gql()
    }

    async fn update_staff(
        &self,
        ctx: &Context<'_>,
        id: Uuid,
        input: UpdateStaffInput,
    ) -> Result<StaffNode> {
        let scope = Scope::of(ctx)?;
        scope
            .update::<staff::Entity, _>(id, |member| {
                if let Some(department) = input.department {
                    member.department = required("department", department)?;
                }
                if let Some(active) = input.is_active {
                    member.is_active = active;
                }
                member.updated_at = now();
                Ok(())
            })
            .await
            .map(StaffNode::from)
            .gql()
    }

    async fn delete_staff(&self, ctx: &Context<'_>, id: Uuid) -> Result<bool> {
        Scope::of(ctx)?.delete::<staff::Entity>(id).await.gql()
    }

    /// Register a patient under a doctor. The caller is recorded as the
    /// record's creator.
    #[instrument(name = "graphql.create_patient", skip_all)]
    async fn create_patient(&self, ctx: &Context<'_>, input: PatientInput) -> Result<PatientNode> {
        let scope = Scope::of(ctx)?;
        let creator = scope.user.ok_or(ApiError::Unauthorized).gql()?;
        scope.may::<patients::Entity>(Operation::Create).gql()?;
        let code = patient_code(&input.patient_code).gql()?;
        let created = now();
        let model = patients::Model {
            id: Uuid::new_v4(),
            user_id: creator.id,
            doctor_id: input.doctor_id,
            patient_name: required("patient name", input.patient_name).gql()?,
            patient_code: code,
            date_of_birth: input.date_of_birth,
            gender: input.gender.trim().to_string(),
            blood_group: optional(input.blood_group),
            address: input.address.trim().to_string(),
            emergency_contact_name: input.emergency_contact_name.trim().to_string(),
            emergency_contact_phone: input.emergency_contact_phone.trim().to_string(),
            medical_history: optional(input.medical_history),
            allergies: optional(input.allergies),
            is_active: true,
            created_at: created,
            updated_at: created,
        };
        let model = scope
            .permit::<patients::Entity>(Operation::Create, model)
            .await
            .gql()?;
        let taken = patients::Entity::find()
            .filter(patients::Column::PatientCode.eq(model.patient_code.as_str()))
            .count(scope.db())
            .await
            .gql()?;
        if taken > 0 {
            return Err(ApiError::invalid("patient code is already registered")).gql();
        }
        scope
            .create::<patients::Entity, _>(model)
            .await
            .map(PatientNode::from)
            .gql()
    }

    async fn update_patient(
        &self,
        ctx: &Context<'_>,
        id: Uuid,
        input: UpdatePatientInput,
    ) -> Result<PatientNode> {
        let scope = Scope::of(ctx)?;
        scope
            .update::<patients::Entity, _>(id, |patient| {
                if let Some(doctor_id) = input.doctor_id {
                    patient.doctor_id = doctor_id;
                }
                if let Some(name) = input.patient_name {
                    patient.patient_name = required("patient name", name)?;
                }
                if let Some(address) = input.address {
                    patient.address = address.trim().to_string();
                }
                if input.blood_group.is_some() {
                    patient.blood_group = optional(input.blood_group);
                }
                if let Some(name) = input.emergency_contact_name {
                    patient.emergency_contact_name = name.trim().to_string();
                }
                if let Some(phone) = input.emergency_contact_phone {
                    patient.emergency_contact_phone = phone.trim().to_string();
                }
                if input.medical_history.is_some() {
                    patient.medical_history = optional(input.medical_history);
                }
                if input.allergies.is_some() {
                    patient.allergies = optional(input.allergies);
                }
                if let Some(active) = input.is_active {
                    patient.is_active = active;
                }
                patient.updated_at = now();
                Ok(())
            })
            .await
            .map(PatientNode::from)
            .gql()
    }

    async fn delete_patient(&self, ctx: &Context<'_>, id: Uuid) -> Result<bool> {
        Scope::of(ctx)?.delete::<patients::Entity>(id).await.gql()
    }

    async fn create_visit(&self, ctx: &Context<'_>, input: VisitInput) -> Result<VisitNode> {
        let scope = Scope::of(ctx)?;
        scope.may::<visits::Entity>(Operation::Create).gql()?;
        ensure_exists::<doctors::Entity>(&scope, input.doctor_id)
            .await
            .gql()?;
        let created = now();
        let model = visits::Model {
            id: Uuid::new_v4(),
            patient_id: input.patient_id,
            doctor_id: input.doctor_id,
            visit_type: required("visit type", input.visit_type).gql()?,
            visit_date: input.visit_date,
            status: visits::Status::Scheduled,
            chief_complaint: input.chief_complaint.trim().to_string(),
            diagnosis: None,
            treatment_plan: None,
            follow_up_date: None,
            created_at: created,
            updated_at: created,
        };
        scope
            .create::<visits::Entity, _>(model)
            .await
            .map(VisitNode::from)
            .gql()
    }

    async fn update_visit(
        &self,
        ctx: &Context<'_>,
        id: Uuid,
        input: UpdateVisitInput,
    ) -> Result<VisitNode> {
        let scope = Scope::of(ctx)?;
        scope
            .update::<visits::Entity, _>(id, |visit| {
                if let Some(status) = input.status {
                    visit.status = parse_status(&status)?;
                }
                if let Some(date) = input.visit_date {
                    visit.visit_date = date;
                }
                if input.diagnosis.is_some() {
                    visit.diagnosis = optional(input.diagnosis);
                }
                if input.treatment_plan.is_some() {
                    visit.treatment_plan = optional(input.treatment_plan);
                }
                if input.follow_up_date.is_some() {
                    visit.follow_up_date = input.follow_up_date;
                }
                visit.updated_at = now();
                Ok(())
            })
            .await
            .map(VisitNode::from)
            .gql()
    }

    async fn delete_visit(&self, ctx: &Context<'_>, id: Uuid) -> Result<bool> {
        Scope::of(ctx)?.delete::<visits::Entity>(id).await.gql()
    }

    async fn create_diagnosis(
        &self,
        ctx: &Context<'_>,
        input: DiagnosisInput,
    ) -> Result<PatientDiseaseNode> {
        let scope = Scope::of(ctx)?;
        scope.may::<patient_diseases::Entity>(Operation::Create).gql()?;
        ensure_exists::<diseases::Entity>(&scope, input.disease_id)
            .await
            .gql()?;
        let status = match input.status {
            Some(status) => parse_status(&status).gql()?,
            None => patient_diseases::DiagnosisStatus::Active,
        };
        let model = patient_diseases::Model {
            id: Uuid::new_v4(),
            patient_id: input.patient_id,
            disease_id: input.disease_id,
            diagnosed_date: input.diagnosed_date,
            status,
            notes: optional(input.notes),
            created_at: now(),
        };
        scope
            .create::<patient_diseases::Entity, _>(model)
            .await
            .map(PatientDiseaseNode::from)
            .gql()
    }

    async fn update_diagnosis(
        &self,
        ctx: &Context<'_>,
        id: Uuid,
        status: Option<String>,
        notes: Option<String>,
    ) -> Result<PatientDiseaseNode> {
        let scope = Scope::of(ctx)?;
        scope
            .update::<patient_diseases::Entity, _>(id, |diagnosis| {
                if let Some(status) = status {
                    diagnosis.status = parse_status(&status)?;
                }
                if notes.is_some() {
                    diagnosis.notes = optional(notes);
                }
                Ok(())
            })
            .await
            .map(PatientDiseaseNode::from)
            .gql()
    }

    async fn delete_diagnosis(&self, ctx: &Context<'_>, id: Uuid) -> Result<bool> {
        Scope::of(ctx)?
            .delete::<patient_diseases::Entity>(id)
            .await
            .gql()
    }

    async fn create_test(&self, ctx: &Context<'_>, input: TestInput) -> Result<TestNode> {
        let scope = Scope::of(ctx)?;
        scope.may::<lab_tests::Entity>(Operation::Create).gql()?;
        ensure_exists::<diseases::Entity>(&scope, input.disease_id)
            .await
            .gql()?;
        let model = lab_tests::Model {
            id: Uuid::new_v4(),
            patient_id: input.patient_id,
            disease_id: input.disease_id,
            test_name: required("test name", input.test_name).gql()?,
            test_type: input.test_type.trim().to_string(),
            test_date: input.test_date,
            status: lab_tests::Status::Pending,
            results: None,
            normal_range: optional(input.normal_range),
            created_at: now(),
        };
        scope
            .create::<lab_tests::Entity, _>(model)
            .await
            .map(TestNode::from)
            .gql()
    }

    async fn update_test(
        &self,
        ctx: &Context<'_>,
        id: Uuid,
        input: UpdateTestInput,
    ) -> Result<TestNode> {
        let scope = Scope::of(ctx)?;
        scope
            .update::<lab_tests::Entity, _>(id, |test| {
                if let Some(status) = input.status {
                    test.status = parse_status(&status)?;
                }
                if input.results.is_some() {
                    test.results = optional(input.results);
                }
                Ok(())
            })
            .await
            .map(TestNode::from)
            .gql()
    }

    async fn delete_test(&self, ctx: &Context<'_>, id: Uuid) -> Result<bool> {
        Scope::of(ctx)?.delete::<lab_tests::Entity>(id).await.gql()
    }

    async fn create_treatment(
        &self,
        ctx: &Context<'_>,
        input: TreatmentInput,
    ) -> Result<TreatmentNode> {
        let scope = Scope::of(ctx)?;
        scope.may::<treatments::Entity>(Operation::Create).gql()?;
        ensure_exists::<diseases::Entity>(&scope, input.disease_id)
            .await
            .gql()?;
        if let Some(end) = input.end_date {
            if end < input.start_date {
                return Err(ApiError::invalid("treatment cannot end before it starts")).gql();
            }
        }
        let model = treatments::Model {
            id: Uuid::new_v4(),
            patient_id: input.patient_id,
            disease_id: input.disease_id,
            treatment_name: required("treatment name", input.treatment_name).gql()?,
            description: input.description.trim().to_string(),
            start_date: input.start_date,
            end_date: input.end_date,
            status: treatments::Status::Active,
            notes: optional(input.notes),
            created_at: now(),
        };
        scope
            .create::<treatments::Entity, _>(model)
            .await
            .map(TreatmentNode::from)
            .gql()
    }

    async fn update_treatment(
        &self,
        ctx: &Context<'_>,
        id: Uuid,
        input: UpdateTreatmentInput,
    ) -> Result<TreatmentNode> {
        let scope = Scope::of(ctx)?;
        scope
            .update::<treatments::Entity, _>(id, |treatment| {
                if let Some(status) = input.status {
                    treatment.status = parse_status(&status)?;
                }
                if let Some(end) = input.end_date {
                    if end < treatment.start_date {
                        return Err(ApiError::invalid("treatment cannot end before it starts"));
                    }
                    treatment.end_date = Some(end);
                }
                if input.notes.is_some() {
                    treatment.notes = optional(input.notes);
                }
                Ok(())
            })
            .await
            .map(TreatmentNode::from)
            .gql()
    }

    async fn delete_treatment(&self, ctx: &Context<'_>, id: Uuid) -> Result<bool> {
        Scope::of(ctx)?.delete::<treatments::Entity>(id).await.gql()
    }

    async fn create_surgery(&self, ctx: &Context<'_>, input: SurgeryInput) -> Result<SurgeryNode> {
        let scope = Scope::of(ctx)?;
        let model = surgeries::Model {
            id: Uuid::new_v4(),
            patient_id: input.patient_id,
            surgery_name: required("surgery name", input.surgery_name).gql()?,
            description: input.description.trim().to_string(),
            scheduled_date: input.scheduled_date,
            actual_date: None,
            status: surgeries::Status::Scheduled,
            surgeon_name: required("surgeon name", input.surgeon_name).gql()?,
            complications: String::new(),
            notes: optional(input.notes),
            created_at: now(),
        };
        scope
            .create::<surgeries::Entity, _>(model)
            .await
            .map(SurgeryNode::from)
            .gql()
    }

    async fn update_surgery(
        &self,
        ctx: &Context<'_>,
        id: Uuid,
        input: UpdateSurgeryInput,
    ) -> Result<SurgeryNode> {
        let scope = Scope::of(ctx)?;
        scope
            .update::<surgeries::Entity, _>(id, |surgery| {
                if let Some(status) = input.status {
                    surgery.status = parse_status(&status)?;
                }
                if input.actual_date.is_some() {
                    surgery.actual_date = input.actual_date;
                }
                if let Some(complications) = input.complications {
                    surgery.complications = complications.trim().to_string();
                }
                if input.notes.is_some() {
                    surgery.notes = optional(input.notes);
                }
                Ok(())
            })
            .await
            .map(SurgeryNode::from)
            .gql()
    }

    async fn delete_surgery(&self, ctx: &Context<'_>, id: Uuid) -> Result<bool> {
        Scope::of(ctx)?.delete::<surgeries::Entity>(id).await.gql()
    }

    /// Queue a report; it is generated in the background over the
    /// requester's own scope.
    #[instrument(name = "graphql.request_report", skip_all)]
    async fn request_report(&self, ctx: &Context<'_>, input: ReportInput) -> Result<ReportNode> {
        let scope = Scope::of(ctx)?;
        let request = ReportRequest {
            name: input.name,
            kind: input.kind.into(),
            format: input.format.into(),
            patient_id: input.patient_id,
            surgery_id: input.surgery_id,
            parameters: input.parameters.map(|json| json.0),
        };
        let report = request_report(scope.db(), scope.engine(), scope.actor(), request)
            .await
            .gql()?;
        scope.data.reports.enqueue(report.id);
        Ok(report.into())
    }

    async fn delete_report(&self, ctx: &Context<'_>, id: Uuid) -> Result<bool> {
        Scope::of(ctx)?.delete::<reports::Entity>(id).await.gql()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patient_codes_are_eleven_digits() {
        assert_eq!(patient_code(" 01711000001 ").unwrap(), "01711000001");
        assert!(patient_code("0171100000").is_err());
        assert!(patient_code("0171100000x").is_err());
        assert!(patient_code("017110000012").is_err());
    }
}
