//! Demo data for local development.

use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate, Utc};
use entity::{
    centers, cities, diseases, doctors, lab_tests, medicines, patient_diseases, patients, staff,
    surgeries, treatments, users, visits,
};
use platform_db::DbPool;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, IntoActiveModel, PaginatorTrait, QueryFilter,
    TransactionTrait, prelude::DateTimeWithTimeZone,
};
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::hash_password;

pub const ADMIN_EMAIL: &str = "admin@hospital.local";
const DEFAULT_PASSWORD: &str = "changeme123";

const CITIES: [(&str, &str); 3] = [
    ("Dhaka", "Dhaka"),
    ("Chattogram", "Chattogram"),
    ("Sylhet", "Sylhet"),
];

const DISEASES: [(&str, &str, &str); 5] = [
    ("Influenza", "Respiratory", "J11"),
    ("Asthma", "Respiratory", "J45"),
    ("Type 2 diabetes", "Endocrine", "E11"),
    ("Hypertension", "Cardiovascular", "I10"),
    ("Dengue fever", "Infectious", "A90"),
];

const MEDICINES: [(&str, &str, &str, &str); 4] = [
    ("Napa", "Paracetamol", "Tablet", "500mg"),
    ("Seclo", "Omeprazole", "Capsule", "20mg"),
    ("Amdocal", "Amlodipine", "Tablet", "5mg"),
    ("Ventolin", "Salbutamol", "Inhaler", "100mcg"),
];

const SPECIALIZATIONS: [&str; 3] = ["Medicine", "Cardiology", "Pulmonology"];

fn now() -> DateTimeWithTimeZone {
    Utc::now().into()
}

/// Insert the demo data set unless the admin account already exists.
/// Every account gets `SEED_PASSWORD` (or a fixed development default).
pub async fn run(pool: &DbPool) -> Result<()> {
    let existing = users::Entity::find()
        .filter(users::Column::Email.eq(ADMIN_EMAIL))
        .count(pool)
        .await?;
    if existing > 0 {
        info!("seed data already present; skipping");
        return Ok(());
    }
    let password = match std::env::var("SEED_PASSWORD") {
        Ok(password) if !password.trim().is_empty() => password,
        _ => {
            warn!("SEED_PASSWORD not set; using the development default");
            DEFAULT_PASSWORD.to_string()
        }
    };
    let password_hash = hash_password(&password)?;

    let txn = pool.begin().await?;
    user(&txn, ADMIN_EMAIL, "System", "Admin", users::Role::Admin, &password_hash).await?;

    let mut disease_ids = Vec::new();
    for (name, category, icd) in DISEASES {
        let disease = diseases::Model {
            id: Uuid::new_v4(),
            name: name.into(),
            category: category.into(),
            icd_code: Some(icd.into()),
            is_active: true,
            created_at: now(),
        }
        .into_active_model()
        .insert(&txn)
        .await?;
        disease_ids.push(disease.id);
    }

    for (name, generic, form, strength) in MEDICINES {
        medicines::Model {
            id: Uuid::new_v4(),
            name: name.into(),
            generic_name: Some(generic.into()),
            dosage_form: form.into(),
            strength: strength.into(),
            manufacturer: "Demo Pharma".into(),
            is_prescription_required: form != "Tablet",
            is_active: true,
            created_at: now(),
        }
        .into_active_model()
        .insert(&txn)
        .await?;
    }

    let mut patient_serial = 0u32;
    for (city_index, (city_name, state)) in CITIES.into_iter().enumerate() {
        let city = cities::Model {
            id: Uuid::new_v4(),
            name: city_name.into(),
            state: state.into(),
            country: "Bangladesh".into(),
            created_at: now(),
        }
        .into_active_model()
        .insert(&txn)
        .await?;
        let slug = city_name.to_lowercase();
        let center = centers::Model {
            id: Uuid::new_v4(),
            name: format!("{city_name} General Hospital"),
            city_id: city.id,
            address: format!("1 Hospital Road, {city_name}"),
            phone_number: format!("0200000000{city_index}"),
            email: Some(format!("info@{slug}.hospital.local")),
            is_active: true,
            created_at: now(),
        }
        .into_active_model()
        .insert(&txn)
        .await?;

        let doctor_user = user(
            &txn,
            &format!("doctor.{slug}@hospital.local"),
            "Doctor",
            city_name,
            users::Role::Doctor,
            &password_hash,
        )
        .await?;
        let doctor = doctors::Model {
            id: Uuid::new_v4(),
            user_id: doctor_user,
            center_id: center.id,
            specialization: SPECIALIZATIONS[city_index % SPECIALIZATIONS.len()].into(),
            license_number: Some(format!("BMDC-{:05}", city_index + 1)),
            experience_years: 5 + city_index as i32 * 3,
            consultation_fee_cents: 80_000,
            is_available: true,
            created_at: now(),
            updated_at: now(),
        }
        .into_active_model()
        .insert(&txn)
        .await?;

        let staff_user = user(
            &txn,
            &format!("staff.{slug}@hospital.local"),
            "Staff",
            city_name,
            users::Role::Staff,
            &password_hash,
        )
        .await?;
        staff::Model {
            id: Uuid::new_v4(),
            user_id: staff_user,
            center_id: center.id,
            department: "Front desk".into(),
            employee_id: format!("EMP-{:04}", city_index + 1),
            is_active: true,
            created_at: now(),
            updated_at: now(),
        }
        .into_active_model()
        .insert(&txn)
        .await?;

        for _ in 0..2 {
            patient_serial += 1;
            let disease_id = disease_ids[patient_serial as usize % disease_ids.len()];
            let creator = user(
                &txn,
                &format!("patient{patient_serial}@hospital.local"),
                "Patient",
                &patient_serial.to_string(),
                users::Role::Patient,
                &password_hash,
            )
            .await?;
            patient_record(&txn, creator, doctor.id, patient_serial, disease_id).await?;
        }
    }

    txn.commit().await?;
    info!(patients = patient_serial, "seed data inserted");
    Ok(())
}

async fn user<C: sea_orm::ConnectionTrait>(
    db: &C,
    email: &str,
    first_name: &str,
    last_name: &str,
    role: users::Role,
    password_hash: &str,
) -> Result<Uuid> {
    let created = now();
    let user = users::Model {
        id: Uuid::new_v4(),
        email: email.into(),
        password_hash: password_hash.into(),
        first_name: first_name.into(),
        last_name: last_name.into(),
        phone_number: None,
        role,
        is_active: true,
        is_verified: true,
        created_at: created,
        updated_at: created,
    }
    .into_active_model()
    .insert(db)
    .await
    .with_context(|| format!("failed to insert user {email}"))?;
    Ok(user.id)
}

/// A patient owned by its own patient account, with one of each record kind.
async fn patient_record<C: sea_orm::ConnectionTrait>(
    db: &C,
    owner: Uuid,
    doctor_id: Uuid,
    serial: u32,
    disease_id: Uuid,
) -> Result<()> {
    let created = now();
    let birth = NaiveDate::from_ymd_opt(1970 + (serial % 40) as i32, 1 + serial % 12, 10)
        .context("invalid birth date")?;
    let patient = patients::Model {
        id: Uuid::new_v4(),
        user_id: owner,
        doctor_id,
        patient_name: format!("Demo Patient {serial}"),
        patient_code: format!("017{serial:08}"),
        date_of_birth: birth,
        gender: if serial % 2 == 0 { "Female" } else { "Male" }.into(),
        blood_group: Some("O+".into()),
        address: "Demo address".into(),
        emergency_contact_name: "Next of kin".into(),
        emergency_contact_phone: format!("018{serial:08}"),
        medical_history: None,
        allergies: None,
        is_active: true,
        created_at: created,
        updated_at: created,
    }
    .into_active_model()
    .insert(db)
    .await?;

    patient_diseases::Model {
        id: Uuid::new_v4(),
        patient_id: patient.id,
        disease_id,
        diagnosed_date: created.date_naive(),
        status: patient_diseases::DiagnosisStatus::Active,
        notes: None,
        created_at: created,
    }
    .into_active_model()
    .insert(db)
    .await?;

    lab_tests::Model {
        id: Uuid::new_v4(),
        patient_id: patient.id,
        disease_id,
        test_name: "Complete blood count".into(),
        test_type: "Blood".into(),
        test_date: created,
        status: lab_tests::Status::Pending,
        results: None,
        normal_range: None,
        created_at: created,
    }
    .into_active_model()
    .insert(db)
    .await?;

    treatments::Model {
        id: Uuid::new_v4(),
        patient_id: patient.id,
        disease_id,
        treatment_name: "Initial therapy".into(),
        description: "Medication and follow-up".into(),
        start_date: created.date_naive(),
        end_date: None,
        status: treatments::Status::Active,
        notes: None,
        created_at: created,
    }
    .into_active_model()
    .insert(db)
    .await?;

    if serial % 3 == 0 {
        surgeries::Model {
            id: Uuid::new_v4(),
            patient_id: patient.id,
            surgery_name: "Appendectomy".into(),
            description: "Laparoscopic".into(),
            scheduled_date: created + Duration::days(14),
            actual_date: None,
            status: surgeries::Status::Scheduled,
            surgeon_name: "Dr. Demo".into(),
            complications: String::new(),
            notes: None,
            created_at: created,
        }
        .into_active_model()
        .insert(db)
        .await?;
    }

    visits::Model {
        id: Uuid::new_v4(),
        patient_id: patient.id,
        doctor_id,
        visit_type: "Consultation".into(),
        visit_date: created + Duration::days(2),
        status: visits::Status::Scheduled,
        chief_complaint: "Routine check".into(),
        diagnosis: None,
        treatment_plan: None,
        follow_up_date: None,
        created_at: created,
        updated_at: created,
    }
    .into_active_model()
    .insert(db)
    .await?;
    Ok(())
}
