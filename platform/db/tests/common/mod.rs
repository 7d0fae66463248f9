#![allow(dead_code)]

use chrono::{NaiveDate, Utc};
use entity::{
    centers, cities, diseases, doctors, lab_tests, patient_diseases, patients, staff, surgeries,
    treatments, users, visits,
};
use migration::{Migrator, MigratorTrait};
use platform_authz::Actor;
use platform_db::{DbPool, load_actor};
use sea_orm::{ActiveModelTrait, Database, IntoActiveModel, prelude::DateTimeWithTimeZone};
use uuid::Uuid;

pub async fn migrated_db() -> DbPool {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("connect sqlite");
    Migrator::up(&db, None).await.expect("migrate");
    db
}

fn now() -> DateTimeWithTimeZone {
    Utc::now().into()
}

/// Two centers in one city, each with a doctor, a staff member and one
/// patient, plus an admin, a patient account and a staff account with no
/// profile.
pub struct Hospital {
    pub db: DbPool,
    pub city: Uuid,
    pub center_a: Uuid,
    pub center_b: Uuid,
    pub doctor_a: Uuid,
    pub doctor_b: Uuid,
    pub admin_user: Uuid,
    pub doctor_a_user: Uuid,
    pub doctor_b_user: Uuid,
    pub staff_a_user: Uuid,
    pub staff_b_user: Uuid,
    pub patient_user: Uuid,
    pub orphan_staff_user: Uuid,
    pub patient_a: Uuid,
    pub patient_b: Uuid,
    pub visit_a: Uuid,
    pub visit_b: Uuid,
    pub flu: Uuid,
    pub asthma: Uuid,
}

impl Hospital {
    pub async fn seed() -> Self {
        let db = migrated_db().await;

        let admin_user = user(&db, "admin@hospital.test", users::Role::Admin).await;
        let doctor_a_user = user(&db, "doc.a@hospital.test", users::Role::Doctor).await;
        let doctor_b_user = user(&db, "doc.b@hospital.test", users::Role::Doctor).await;
        let staff_a_user = user(&db, "staff.a@hospital.test", users::Role::Staff).await;
        let staff_b_user = user(&db, "staff.b@hospital.test", users::Role::Staff).await;
        let patient_user = user(&db, "patient@hospital.test", users::Role::Patient).await;
        let orphan_staff_user = user(&db, "orphan@hospital.test", users::Role::Staff).await;

        let city = cities::Model {
            id: Uuid::new_v4(),
            name: "Dhaka".into(),
            state: "Dhaka".into(),
            country: "Bangladesh".into(),
            created_at: now(),
        }
        .into_active_model()
        .insert(&db)
        .await
        .expect("city")
        .id;

        let center_a = center(&db, city, "North Clinic").await;
        let center_b = center(&db, city, "South Clinic").await;
        let doctor_a = doctor(&db, doctor_a_user, center_a, "CARDIOLOGY").await;
        let doctor_b = doctor(&db, doctor_b_user, center_b, "PEDIATRICS").await;
        staff_member(&db, staff_a_user, center_a, "EMP-A").await;
        staff_member(&db, staff_b_user, center_b, "EMP-B").await;

        let flu = disease(&db, "Influenza").await;
        let asthma = disease(&db, "Asthma").await;

        let patient_a = patient(&db, staff_a_user, doctor_a, "01711000001").await;
        let patient_b = patient(&db, patient_user, doctor_b, "01711000002").await;

        let visit_a = visit(&db, patient_a, doctor_a).await;
        let visit_b = visit(&db, patient_b, doctor_b).await;

        diagnose(&db, patient_a, flu).await;
        diagnose(&db, patient_b, flu).await;
        diagnose(&db, patient_b, asthma).await;
        lab_test(&db, patient_a, flu).await;
        lab_test(&db, patient_b, asthma).await;
        treatment(&db, patient_b, asthma).await;
        surgery(&db, patient_a).await;

        Self {
            db,
            city,
            center_a,
            center_b,
            doctor_a,
            doctor_b,
            admin_user,
            doctor_a_user,
            doctor_b_user,
            staff_a_user,
            staff_b_user,
            patient_user,
            orphan_staff_user,
            patient_a,
            patient_b,
            visit_a,
            visit_b,
            flu,
            asthma,
        }
    }

    pub async fn actor(&self, user_id: Uuid) -> Actor {
        load_actor(&self.db, user_id).await.expect("load actor")
    }

    pub async fn everyone(&self) -> Vec<Actor> {
        let mut actors = Vec::new();
        for user in [
            self.admin_user,
            self.doctor_a_user,
            self.doctor_b_user,
            self.staff_a_user,
            self.staff_b_user,
            self.patient_user,
            self.orphan_staff_user,
        ] {
            actors.push(self.actor(user).await);
        }
        actors
    }
}

pub async fn user(db: &DbPool, email: &str, role: users::Role) -> Uuid {
    users::Model {
        id: Uuid::new_v4(),
        email: email.into(),
        password_hash: "unused".into(),
        first_name: email.split('@').next().unwrap_or_default().into(),
        last_name: "Test".into(),
        phone_number: None,
        role,
        is_active: true,
        is_verified: true,
        created_at: now(),
        updated_at: now(),
    }
    .into_active_model()
    .insert(db)
    .await
    .expect("user")
    .id
}

async fn center(db: &DbPool, city: Uuid, name: &str) -> Uuid {
    centers::Model {
        id: Uuid::new_v4(),
        name: name.into(),
        city_id: city,
        address: "1 Main Road".into(),
        phone_number: "0255000000".into(),
        email: None,
        is_active: true,
        created_at: now(),
    }
    .into_active_model()
    .insert(db)
    .await
    .expect("center")
    .id
}

async fn doctor(db: &DbPool, user: Uuid, center: Uuid, specialization: &str) -> Uuid {
    doctors::Model {
        id: Uuid::new_v4(),
        user_id: user,
        center_id: center,
        specialization: specialization.into(),
        license_number: None,
        experience_years: 5,
        consultation_fee_cents: 50_000,
        is_available: true,
        created_at: now(),
        updated_at: now(),
    }
    .into_active_model()
    .insert(db)
    .await
    .expect("doctor")
    .id
}

async fn staff_member(db: &DbPool, user: Uuid, center: Uuid, employee_id: &str) -> Uuid {
    staff::Model {
        id: Uuid::new_v4(),
        user_id: user,
        center_id: center,
        department: "Front desk".into(),
        employee_id: employee_id.into(),
        is_active: true,
        created_at: now(),
        updated_at: now(),
    }
    .into_active_model()
    .insert(db)
    .await
    .expect("staff")
    .id
}

async fn disease(db: &DbPool, name: &str) -> Uuid {
    diseases::Model {
        id: Uuid::new_v4(),
        name: name.into(),
        category: "General".into(),
        icd_code: None,
        is_active: true,
        created_at: now(),
    }
    .into_active_model()
    .insert(db)
    .await
    .expect("disease")
    .id
}

pub fn patient_model(creator: Uuid, doctor: Uuid, code: &str) -> patients::Model {
    patients::Model {
        id: Uuid::new_v4(),
        user_id: creator,
        doctor_id: doctor,
        patient_name: format!("Patient {code}"),
        patient_code: code.into(),
        date_of_birth: NaiveDate::from_ymd_opt(1990, 1, 1).unwrap_or_default(),
        gender: "FEMALE".into(),
        blood_group: Some("O+".into()),
        address: "2 Lake Road".into(),
        emergency_contact_name: "Next of kin".into(),
        emergency_contact_phone: "01800000000".into(),
        medical_history: None,
        allergies: None,
        is_active: true,
        created_at: now(),
        updated_at: now(),
    }
}

async fn patient(db: &DbPool, creator: Uuid, doctor: Uuid, code: &str) -> Uuid {
    patient_model(creator, doctor, code)
        .into_active_model()
        .insert(db)
        .await
        .expect("patient")
        .id
}

pub fn visit_model(patient: Uuid, doctor: Uuid) -> visits::Model {
    visits::Model {
        id: Uuid::new_v4(),
        patient_id: patient,
        doctor_id: doctor,
        visit_type: "CONSULTATION".into(),
        visit_date: now(),
        status: visits::Status::Scheduled,
        chief_complaint: "Cough".into(),
        diagnosis: None,
        treatment_plan: None,
        follow_up_date: None,
        created_at: now(),
        updated_at: now(),
    }
}

async fn visit(db: &DbPool, patient: Uuid, doctor: Uuid) -> Uuid {
    visit_model(patient, doctor)
        .into_active_model()
        .insert(db)
        .await
        .expect("visit")
        .id
}

async fn diagnose(db: &DbPool, patient: Uuid, disease: Uuid) -> Uuid {
    patient_diseases::Model {
        id: Uuid::new_v4(),
        patient_id: patient,
        disease_id: disease,
        diagnosed_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap_or_default(),
        status: patient_diseases::DiagnosisStatus::Active,
        notes: None,
        created_at: now(),
    }
    .into_active_model()
    .insert(db)
    .await
    .expect("diagnosis")
    .id
}

pub async fn lab_test(db: &DbPool, patient: Uuid, disease: Uuid) -> Uuid {
    lab_tests::Model {
        id: Uuid::new_v4(),
        patient_id: patient,
        disease_id: disease,
        test_name: "Blood panel".into(),
        test_type: "BLOOD".into(),
        test_date: now(),
        status: lab_tests::Status::Pending,
        results: None,
        normal_range: None,
        created_at: now(),
    }
    .into_active_model()
    .insert(db)
    .await
    .expect("test")
    .id
}

async fn treatment(db: &DbPool, patient: Uuid, disease: Uuid) -> Uuid {
    treatments::Model {
        id: Uuid::new_v4(),
        patient_id: patient,
        disease_id: disease,
        treatment_name: "Inhaler".into(),
        description: "Twice daily".into(),
        start_date: NaiveDate::from_ymd_opt(2024, 3, 2).unwrap_or_default(),
        end_date: None,
        status: treatments::Status::Active,
        notes: None,
        created_at: now(),
    }
    .into_active_model()
    .insert(db)
    .await
    .expect("treatment")
    .id
}

async fn surgery(db: &DbPool, patient: Uuid) -> Uuid {
    surgeries::Model {
        id: Uuid::new_v4(),
        patient_id: patient,
        surgery_name: "Appendectomy".into(),
        description: "Laparoscopic".into(),
        scheduled_date: now(),
        actual_date: None,
        status: surgeries::Status::Scheduled,
        surgeon_name: "Dr. A".into(),
        complications: String::new(),
        notes: None,
        created_at: now(),
    }
    .into_active_model()
    .insert(db)
    .await
    .expect("surgery")
    .id
}
