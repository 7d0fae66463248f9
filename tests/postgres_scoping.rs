use anyhow::Result;
use chrono::{NaiveDate, Utc};
use entity::{centers, cities, doctors, patients, staff, users, visits};
use hospital_tests::{connect_with_retry, postgres_image, postgres_url};
use migration::{Migrator, MigratorTrait};
use platform_authz::PolicyEngine;
use platform_db::{DbPool, load_actor, scoped_collection};
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, DatabaseBackend, IntoActiveModel, Statement,
    prelude::DateTimeWithTimeZone,
};
use testcontainers::clients::Cli;
use uuid::Uuid;

const ENGINE: PolicyEngine = PolicyEngine;

fn now() -> DateTimeWithTimeZone {
    Utc::now().into()
}

#[tokio::test]
#[ignore = "needs a Docker daemon"]
async fn center_scoping_runs_on_postgres() -> Result<()> {
    let docker = Cli::default();
    let container = docker.run(postgres_image());
    let db = connect_with_retry(&postgres_url(container.get_host_port_ipv4(5432))).await?;
    Migrator::up(&db, None).await?;

    let city = cities::Model {
        id: Uuid::new_v4(),
        name: "Sylhet".into(),
        state: "Sylhet".into(),
        country: "Bangladesh".into(),
        created_at: now(),
    }
    .into_active_model()
    .insert(&db)
    .await?;
    let center_a = center(&db, city.id, "East Clinic").await?;
    let center_b = center(&db, city.id, "West Clinic").await?;

    let doctor_a_user = user(&db, "doc.a@hospital.test", users::Role::Doctor).await?;
    let doctor_b_user = user(&db, "doc.b@hospital.test", users::Role::Doctor).await?;
    let staff_user = user(&db, "staff@hospital.test", users::Role::Staff).await?;
    let patient_user = user(&db, "patient@hospital.test", users::Role::Patient).await?;
    let doctor_a = doctor(&db, doctor_a_user, center_a).await?;
    let doctor_b = doctor(&db, doctor_b_user, center_b).await?;
    staff::Model {
        id: Uuid::new_v4(),
        user_id: staff_user,
        center_id: center_a,
        department: "Front desk".into(),
        employee_id: "EMP-1".into(),
        is_active: true,
        created_at: now(),
        updated_at: now(),
    }
    .into_active_model()
    .insert(&db)
    .await?;

    let east = patient(&db, staff_user, doctor_a, "01911000001").await?;
    let west = patient(&db, patient_user, doctor_b, "01911000002").await?;
    let east_visit = visit(&db, east, doctor_a).await?;
    visit(&db, west, doctor_b).await?;

    let staff = load_actor(&db, staff_user).await?;
    let ids = patient_ids(&db, &scoped_collection::<patients::Entity>(&ENGINE, Some(&staff)))
        .await?;
    assert_eq!(ids, vec![east]);
    let staff_visits: Vec<Uuid> = scoped_collection::<visits::Entity>(&ENGINE, Some(&staff))
        .all(&db)
        .await?
        .into_iter()
        .map(|row| row.id)
        .collect();
    assert_eq!(staff_visits, vec![east_visit]);

    let doctor = load_actor(&db, doctor_b_user).await?;
    let ids = patient_ids(&db, &scoped_collection::<patients::Entity>(&ENGINE, Some(&doctor)))
        .await?;
    assert_eq!(ids, vec![west]);

    let owner = load_actor(&db, patient_user).await?;
    let ids = patient_ids(&db, &scoped_collection::<patients::Entity>(&ENGINE, Some(&owner)))
        .await?;
    assert_eq!(ids, vec![west]);

    let ids = patient_ids(&db, &scoped_collection::<patients::Entity>(&ENGINE, None)).await?;
    assert!(ids.is_empty());
    Ok(())
}

#[tokio::test]
#[ignore = "needs a Docker daemon"]
async fn schema_constraints_hold_on_postgres() -> Result<()> {
    let docker = Cli::default();
    let container = docker.run(postgres_image());
    let db = connect_with_retry(&postgres_url(container.get_host_port_ipv4(5432))).await?;
    Migrator::up(&db, None).await?;

    let bogus_role = db
        .execute(Statement::from_string(
            DatabaseBackend::Postgres,
            format!(
                "INSERT INTO users (id, email, password_hash, first_name, last_name, role, \
                 is_active, is_verified, created_at, updated_at) VALUES ('{}', 'x@hospital.test', \
                 'hash', 'X', 'Y', 'NURSE', true, false, now(), now())",
                Uuid::new_v4()
            ),
        ))
        .await;
    assert!(bogus_role.is_err(), "unknown roles must be rejected");

    let city = cities::Model {
        id: Uuid::new_v4(),
        name: "Rajshahi".into(),
        state: "Rajshahi".into(),
        country: "Bangladesh".into(),
        created_at: now(),
    }
    .into_active_model()
    .insert(&db)
    .await?;
    let center = center(&db, city.id, "Central").await?;
    let doctor_user = user(&db, "doc@hospital.test", users::Role::Doctor).await?;
    let doctor = doctor(&db, doctor_user, center).await?;
    patient(&db, doctor_user, doctor, "01511000009").await?;
    let duplicate = patient(&db, doctor_user, doctor, "01511000009").await;
    assert!(duplicate.is_err(), "patient codes are unique");

    Migrator::down(&db, None).await?;
    Ok(())
}

async fn patient_ids(
    db: &DbPool,
    select: &sea_orm::Select<patients::Entity>,
) -> Result<Vec<Uuid>> {
    Ok(select
        .clone()
        .all(db)
        .await?
        .into_iter()
        .map(|row| row.id)
        .collect())
}

async fn user(db: &DbPool, email: &str, role: users::Role) -> Result<Uuid> {
    let user = users::Model {
        id: Uuid::new_v4(),
        email: email.into(),
        password_hash: "unused".into(),
        first_name: "Test".into(),
        last_name: "User".into(),
        phone_number: None,
        role,
        is_active: true,
        is_verified: true,
        created_at: now(),
        updated_at: now(),
    }
    .into_active_model()
    .insert(db)
    .await?;
    Ok(user.id)
}

async fn center(db: &DbPool, city: Uuid, name: &str) -> Result<Uuid> {
    let center = centers::Model {
        id: Uuid::new_v4(),
        name: name.into(),
        city_id: city,
        address: "1 Station Road".into(),
        phone_number: "0821000000".into(),
        email: None,
        is_active: true,
        created_at: now(),
    }
    .into_active_model()
    .insert(db)
    .await?;
    Ok(center.id)
}

async fn doctor(db: &DbPool, user: Uuid, center: Uuid) -> Result<Uuid> {
    let doctor = doctors::Model {
        id: Uuid::new_v4(),
        user_id: user,
        center_id: center,
        specialization: "Medicine".into(),
        license_number: None,
        experience_years: 3,
        consultation_fee_cents: 60_000,
        is_available: true,
        created_at: now(),
        updated_at: now(),
    }
    .into_active_model()
    .insert(db)
    .await?;
    Ok(doctor.id)
}

async fn patient(db: &DbPool, creator: Uuid, doctor: Uuid, code: &str) -> Result<Uuid> {
    let patient = patients::Model {
        id: Uuid::new_v4(),
        user_id: creator,
        doctor_id: doctor,
        patient_name: format!("Patient {code}"),
        patient_code: code.into(),
        date_of_birth: NaiveDate::from_ymd_opt(1985, 6, 15).unwrap_or_default(),
        gender: "MALE".into(),
        blood_group: None,
        address: "3 River Road".into(),
        emergency_contact_name: "Sibling".into(),
        emergency_contact_phone: "01700000000".into(),
        medical_history: None,
        allergies: None,
        is_active: true,
        created_at: now(),
        updated_at: now(),
    }
    .into_active_model()
    .insert(db)
    .await?;
    Ok(patient.id)
}

async fn visit(db: &DbPool, patient: Uuid, doctor: Uuid) -> Result<Uuid> {
    let visit = visits::Model {
        id: Uuid::new_v4(),
        patient_id: patient,
        doctor_id: doctor,
        visit_type: "CONSULTATION".into(),
        visit_date: now(),
        status: visits::Status::Scheduled,
        chief_complaint: "Fever".into(),
        diagnosis: None,
        treatment_plan: None,
        follow_up_date: None,
        created_at: now(),
        updated_at: now(),
    }
    .into_active_model()
    .insert(db)
    .await?;
    Ok(visit.id)
}
