//! Report requests and their generation.
//!
//! A report moves `PENDING -> GENERATING -> COMPLETED | FAILED`. Its payload
//! is computed over the collections its generator can read, never wider.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::Utc;
use entity::{
    centers, cities, diseases, doctors, lab_tests, patient_diseases, patients, reports, surgeries,
    treatments, visits,
};
use platform_authz::{Actor, AuthzError, Operation, PolicyEngine, ResourceKind, ScopeKey};
use sea_orm::{
    ActiveEnum, ActiveModelBehavior, ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait,
    IntoActiveModel, PaginatorTrait, QueryFilter, QueryOrder, Set,
    prelude::{DateTimeWithTimeZone, Json},
};
use serde_json::{Map, Value, json};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    DbError, DbResult,
    actor::load_actor,
    scope::{authorize_or_deny, find_existing, find_scoped, key_expr, scoped_collection},
};

const TOP_DISEASES: usize = 10;

/// Kinds generated for one patient; requesting them needs Read on it.
pub fn is_patient_scoped(kind: reports::Kind) -> bool {
    matches!(
        kind,
        reports::Kind::PatientRecord
            | reports::Kind::TestResults
            | reports::Kind::TreatmentSummary
            | reports::Kind::SurgeryReport
    )
}

#[derive(Clone, Debug)]
pub struct ReportRequest {
    pub name: String,
    pub kind: reports::Kind,
    pub format: reports::Format,
    pub patient_id: Option<Uuid>,
    pub surgery_id: Option<Uuid>,
    /// Extra options stored alongside the resolved subject ids.
    pub parameters: Option<Value>,
}

/// Record a new PENDING report owned by `actor`.
#[instrument(skip(db, engine, request), fields(kind = ?request.kind))]
pub async fn request_report<C: ConnectionTrait>(
    db: &C,
    engine: &PolicyEngine,
    actor: Option<&Actor>,
    request: ReportRequest,
) -> DbResult<reports::Model> {
    let Some(current) = actor else {
        return Err(AuthzError::Unauthenticated.into());
    };
    if !engine
        .can_perform(actor, ResourceKind::Report, Operation::Create, None)
        .is_allowed()
    {
        return Err(AuthzError::Denied {
            operation: Operation::Create,
            kind: ResourceKind::Report,
        }
        .into());
    }
    let name = request.name.trim();
    if name.is_empty() {
        return Err(DbError::InvalidInput("report name is required".into()));
    }

    let mut parameters = match request.parameters {
        Some(Value::Object(map)) => map,
        Some(Value::Null) | None => Map::new(),
        Some(_) => {
            return Err(DbError::InvalidInput(
                "report parameters must be an object".into(),
            ));
        }
    };

    if is_patient_scoped(request.kind) {
        match (request.kind, request.surgery_id, request.patient_id) {
            // Subjects outside the read scope look absent.
            (reports::Kind::SurgeryReport, Some(surgery_id), _) => {
                let surgery = find_scoped::<surgeries::Entity, C>(db, engine, actor, surgery_id)
                    .await?
                    .ok_or_else(|| DbError::not_found(ResourceKind::Surgery, surgery_id))?;
                parameters.insert("surgery_id".into(), json!(surgery.id));
                parameters.insert("patient_id".into(), json!(surgery.patient_id));
            }
            (_, _, Some(patient_id)) => {
                let patient = find_scoped::<patients::Entity, C>(db, engine, actor, patient_id)
                    .await?
                    .ok_or_else(|| DbError::not_found(ResourceKind::Patient, patient_id))?;
                parameters.insert("patient_id".into(), json!(patient.id));
            }
            (kind, _, _) => {
                return Err(DbError::InvalidInput(format!(
                    "{} reports need a patient",
                    kind.to_value()
                )));
            }
        }
    }

    let model = reports::Model {
        id: Uuid::new_v4(),
        name: name.to_owned(),
        kind: request.kind,
        format: request.format,
        status: reports::Status::Pending,
        parameters: Value::Object(parameters),
        result: None,
        error: None,
        generated_by: current.user_id,
        created_at: Utc::now().into(),
        completed_at: None,
    };
    let model =
        authorize_or_deny::<reports::Entity, C>(db, engine, actor, Operation::Create, model).await?;
    let saved = model.into_active_model().insert(db).await?;
    info!(report_id = %saved.id, "report requested");
    Ok(saved)
}

/// Ids of reports still waiting for a worker, oldest first.
pub async fn pending_reports<C: ConnectionTrait>(db: &C) -> DbResult<Vec<Uuid>> {
    let rows = reports::Entity::find()
        .filter(reports::Column::Status.eq(reports::Status::Pending))
        .order_by_asc(reports::Column::CreatedAt)
        .all(db)
        .await?;
    Ok(rows.into_iter().map(|report| report.id).collect())
}

enum Outcome {
    Started,
    Succeeded(Json),
    Failed(String),
}

impl Outcome {
    fn status(&self) -> reports::Status {
        match self {
            Outcome::Started => reports::Status::Generating,
            Outcome::Succeeded(_) => reports::Status::Completed,
            Outcome::Failed(_) => reports::Status::Failed,
        }
    }
}

/// Fail reports left GENERATING by a worker that stopped mid-run. Returns
/// how many were closed.
pub async fn fail_interrupted<C: ConnectionTrait>(db: &C) -> DbResult<usize> {
    let stuck = reports::Entity::find()
        .filter(reports::Column::Status.eq(reports::Status::Generating))
        .all(db)
        .await?;
    for report in &stuck {
        transition(
            db,
            report,
            Outcome::Failed("generation was interrupted".into()),
        )
        .await?;
        warn!(report_id = %report.id, "interrupted report marked failed");
    }
    Ok(stuck.len())
}

/// Compare-and-set on the status column, so two workers cannot both claim a
/// report.
async fn transition<C: ConnectionTrait>(
    db: &C,
    report: &reports::Model,
    outcome: Outcome,
) -> DbResult<reports::Model> {
    let next = outcome.status();
    let invalid = || DbError::InvalidTransition {
        from: report.status.to_value(),
        to: next.to_value(),
    };
    if !report.status.can_transition_to(next) {
        return Err(invalid());
    }

    let mut changes = reports::ActiveModel::new();
    changes.status = Set(next);
    if next.is_terminal() {
        let now: DateTimeWithTimeZone = Utc::now().into();
        changes.completed_at = Set(Some(now));
    }
    match outcome {
        Outcome::Succeeded(payload) => changes.result = Set(Some(payload)),
        Outcome::Failed(message) => changes.error = Set(Some(message)),
        Outcome::Started => {}
    }

    let updated = reports::Entity::update_many()
        .set(changes)
        .filter(reports::Column::Id.eq(report.id))
        .filter(reports::Column::Status.eq(report.status))
        .exec(db)
        .await?;
    if updated.rows_affected == 0 {
        return Err(invalid());
    }
    find_existing::<reports::Entity, C>(db, report.id).await
}

/// Generate a PENDING report and store the outcome. Generation errors end in
/// FAILED and are not returned; only storage and state errors are.
#[instrument(skip(db, engine))]
pub async fn run_report<C: ConnectionTrait>(
    db: &C,
    engine: &PolicyEngine,
    report_id: Uuid,
) -> DbResult<reports::Model> {
    let report = find_existing::<reports::Entity, C>(db, report_id).await?;
    let report = transition(db, &report, Outcome::Started).await?;
    info!(report_id = %report.id, "report generation started");

    match generate(db, engine, &report).await {
        Ok(payload) => {
            let report = transition(db, &report, Outcome::Succeeded(payload)).await?;
            info!(report_id = %report.id, "report completed");
            Ok(report)
        }
        Err(err) => {
            warn!(report_id = %report.id, error = %err, "report generation failed");
            transition(db, &report, Outcome::Failed(err.to_string())).await
        }
    }
}

async fn generate<C: ConnectionTrait>(
    db: &C,
    engine: &PolicyEngine,
    report: &reports::Model,
) -> DbResult<Json> {
    let generator = load_actor(db, report.generated_by).await?;
    let actor = Some(&generator);
    match report.kind {
        reports::Kind::PatientRecord => {
            patient_record(db, engine, actor, uuid_param(report, "patient_id")?).await
        }
        reports::Kind::TestResults => test_results(db, engine, actor, report).await,
        reports::Kind::TreatmentSummary => treatment_summary(db, engine, actor, report).await,
        reports::Kind::SurgeryReport => surgery_report(db, engine, actor, report).await,
        reports::Kind::PatientsPerCity => patients_per_city(db, engine, actor).await,
        reports::Kind::CommonDiseases => common_diseases(db, engine, actor).await,
        reports::Kind::CenterStatistics => center_statistics(db, engine, actor).await,
    }
}

fn uuid_param(report: &reports::Model, key: &str) -> DbResult<Uuid> {
    report
        .parameters
        .get(key)
        .and_then(Value::as_str)
        .and_then(|raw| Uuid::parse_str(raw).ok())
        .ok_or_else(|| DbError::InvalidInput(format!("report parameter {key} is missing")))
}

/// Optional list of ids narrowing a patient report. Absent or null means no
/// narrowing.
fn uuid_list_param(report: &reports::Model, key: &str) -> DbResult<Option<Vec<Uuid>>> {
    let invalid = || DbError::InvalidInput(format!("report parameter {key} must be a list of ids"));
    match report.parameters.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                item.as_str()
                    .and_then(|raw| Uuid::parse_str(raw).ok())
                    .ok_or_else(invalid)
            })
            .collect::<DbResult<Vec<_>>>()
            .map(Some),
        Some(_) => Err(invalid()),
    }
}

async fn readable_patient<C: ConnectionTrait>(
    db: &C,
    engine: &PolicyEngine,
    actor: Option<&Actor>,
    patient_id: Uuid,
) -> DbResult<patients::Model> {
    find_scoped::<patients::Entity, C>(db, engine, actor, patient_id)
        .await?
        .ok_or_else(|| DbError::not_found(ResourceKind::Patient, patient_id))
}

fn patient_json(patient: &patients::Model) -> Value {
    json!({
        "id": patient.id,
        "name": patient.patient_name,
        "code": patient.patient_code,
        "date_of_birth": patient.date_of_birth.to_string(),
        "gender": patient.gender,
        "blood_group": patient.blood_group,
    })
}

async fn disease_names<C: ConnectionTrait>(
    db: &C,
    ids: impl IntoIterator<Item = Uuid>,
) -> DbResult<HashMap<Uuid, String>> {
    let ids: HashSet<Uuid> = ids.into_iter().collect();
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows = diseases::Entity::find()
        .filter(diseases::Column::Id.is_in(ids))
        .all(db)
        .await?;
    Ok(rows.into_iter().map(|row| (row.id, row.name)).collect())
}

async fn patient_record<C: ConnectionTrait>(
    db: &C,
    engine: &PolicyEngine,
    actor: Option<&Actor>,
    patient_id: Uuid,
) -> DbResult<Json> {
    let patient = readable_patient(db, engine, actor, patient_id).await?;

    let diagnoses = scoped_collection::<patient_diseases::Entity>(engine, actor)
        .filter(patient_diseases::Column::PatientId.eq(patient.id))
        .order_by_asc(patient_diseases::Column::DiagnosedDate)
        .all(db)
        .await?;
    let names = disease_names(db, diagnoses.iter().map(|row| row.disease_id)).await?;
    let diagnoses: Vec<Value> = diagnoses
        .iter()
        .map(|row| {
            json!({
                "disease": names.get(&row.disease_id),
                "status": row.status.to_value(),
                "diagnosed_date": row.diagnosed_date.to_string(),
            })
        })
        .collect();

    let tests = scoped_collection::<lab_tests::Entity>(engine, actor)
        .filter(lab_tests::Column::PatientId.eq(patient.id))
        .count(db)
        .await?;
    let treatments = scoped_collection::<treatments::Entity>(engine, actor)
        .filter(treatments::Column::PatientId.eq(patient.id))
        .count(db)
        .await?;
    let surgeries = scoped_collection::<surgeries::Entity>(engine, actor)
        .filter(surgeries::Column::PatientId.eq(patient.id))
        .count(db)
        .await?;
    let visits = scoped_collection::<visits::Entity>(engine, actor)
        .filter(visits::Column::PatientId.eq(patient.id))
        .count(db)
        .await?;

    Ok(json!({
        "patient": patient_json(&patient),
        "medical_history": patient.medical_history,
        "allergies": patient.allergies,
        "diagnoses": diagnoses,
        "counts": {
            "tests": tests,
            "treatments": treatments,
            "surgeries": surgeries,
            "visits": visits,
        },
    }))
}

async fn test_results<C: ConnectionTrait>(
    db: &C,
    engine: &PolicyEngine,
    actor: Option<&Actor>,
    report: &reports::Model,
) -> DbResult<Json> {
    let patient = readable_patient(db, engine, actor, uuid_param(report, "patient_id")?).await?;
    let mut query = scoped_collection::<lab_tests::Entity>(engine, actor)
        .filter(lab_tests::Column::PatientId.eq(patient.id));
    if let Some(ids) = uuid_list_param(report, "test_ids")? {
        query = query.filter(lab_tests::Column::Id.is_in(ids));
    }
    let tests = query
        .order_by_desc(lab_tests::Column::TestDate)
        .all(db)
        .await?;
    let rows: Vec<Value> = tests
        .iter()
        .map(|test| {
            json!({
                "name": test.test_name,
                "type": test.test_type,
                "date": test.test_date.to_rfc3339(),
                "status": test.status.to_value(),
                "results": test.results,
                "normal_range": test.normal_range,
            })
        })
        .collect();
    Ok(json!({ "patient": patient_json(&patient), "tests": rows }))
}

async fn treatment_summary<C: ConnectionTrait>(
    db: &C,
    engine: &PolicyEngine,
    actor: Option<&Actor>,
    report: &reports::Model,
) -> DbResult<Json> {
    let patient = readable_patient(db, engine, actor, uuid_param(report, "patient_id")?).await?;
    let mut query = scoped_collection::<treatments::Entity>(engine, actor)
        .filter(treatments::Column::PatientId.eq(patient.id));
    if let Some(ids) = uuid_list_param(report, "treatment_ids")? {
        query = query.filter(treatments::Column::Id.is_in(ids));
    }
    let treatments = query
        .order_by_asc(treatments::Column::StartDate)
        .all(db)
        .await?;
    let names = disease_names(db, treatments.iter().map(|row| row.disease_id)).await?;
    let rows: Vec<Value> = treatments
        .iter()
        .map(|treatment| {
            json!({
                "name": treatment.treatment_name,
                "disease": names.get(&treatment.disease_id),
                "status": treatment.status.to_value(),
                "start_date": treatment.start_date.to_string(),
                "end_date": treatment.end_date.map(|date| date.to_string()),
            })
        })
        .collect();
    Ok(json!({ "patient": patient_json(&patient), "treatments": rows }))
}

async fn surgery_report<C: ConnectionTrait>(
    db: &C,
    engine: &PolicyEngine,
    actor: Option<&Actor>,
    report: &reports::Model,
) -> DbResult<Json> {
    let patient_id = uuid_param(report, "patient_id")?;
    let patient = readable_patient(db, engine, actor, patient_id).await?;
    let mut query = scoped_collection::<surgeries::Entity>(engine, actor)
        .filter(surgeries::Column::PatientId.eq(patient.id));
    if let Ok(surgery_id) = uuid_param(report, "surgery_id") {
        query = query.filter(surgeries::Column::Id.eq(surgery_id));
    }
    let surgeries = query
        .order_by_asc(surgeries::Column::ScheduledDate)
        .all(db)
        .await?;
    let rows: Vec<Value> = surgeries
        .iter()
        .map(|surgery| {
            json!({
                "name": surgery.surgery_name,
                "surgeon": surgery.surgeon_name,
                "status": surgery.status.to_value(),
                "scheduled_date": surgery.scheduled_date.to_rfc3339(),
                "actual_date": surgery.actual_date.map(|date| date.to_rfc3339()),
                "complications": surgery.complications,
            })
        })
        .collect();
    Ok(json!({ "patient": patient_json(&patient), "surgeries": rows }))
}

async fn patients_per_city<C: ConnectionTrait>(
    db: &C,
    engine: &PolicyEngine,
    actor: Option<&Actor>,
) -> DbResult<Json> {
    let patients = scoped_collection::<patients::Entity>(engine, actor)
        .all(db)
        .await?;
    let doctor_ids: HashSet<Uuid> = patients.iter().map(|patient| patient.doctor_id).collect();
    let doctor_center: HashMap<Uuid, Uuid> = if doctor_ids.is_empty() {
        HashMap::new()
    } else {
        doctors::Entity::find()
            .filter(doctors::Column::Id.is_in(doctor_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|doctor| (doctor.id, doctor.center_id))
            .collect()
    };
    let center_city: HashMap<Uuid, Uuid> = centers::Entity::find()
        .all(db)
        .await?
        .into_iter()
        .map(|center| (center.id, center.city_id))
        .collect();
    let city_names: HashMap<Uuid, String> = cities::Entity::find()
        .all(db)
        .await?
        .into_iter()
        .map(|city| (city.id, city.name))
        .collect();

    let mut per_city: BTreeMap<&str, u64> = BTreeMap::new();
    for patient in &patients {
        let city = doctor_center
            .get(&patient.doctor_id)
            .and_then(|center| center_city.get(center))
            .and_then(|city| city_names.get(city));
        if let Some(name) = city {
            *per_city.entry(name.as_str()).or_default() += 1;
        }
    }
    let rows: Vec<Value> = per_city
        .into_iter()
        .map(|(city, patients)| json!({ "city": city, "patients": patients }))
        .collect();
    Ok(json!({ "total": patients.len(), "cities": rows }))
}

async fn common_diseases<C: ConnectionTrait>(
    db: &C,
    engine: &PolicyEngine,
    actor: Option<&Actor>,
) -> DbResult<Json> {
    let diagnoses = scoped_collection::<patient_diseases::Entity>(engine, actor)
        .all(db)
        .await?;
    let mut counts: HashMap<Uuid, u64> = HashMap::new();
    for diagnosis in &diagnoses {
        *counts.entry(diagnosis.disease_id).or_default() += 1;
    }
    let names = disease_names(db, counts.keys().copied()).await?;
    let mut ranked: Vec<(&str, u64)> = counts
        .iter()
        .filter_map(|(id, count)| names.get(id).map(|name| (name.as_str(), *count)))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    ranked.truncate(TOP_DISEASES);
    let rows: Vec<Value> = ranked
        .into_iter()
        .map(|(disease, patients)| json!({ "disease": disease, "patients": patients }))
        .collect();
    Ok(json!({ "diseases": rows }))
}

async fn center_statistics<C: ConnectionTrait>(
    db: &C,
    engine: &PolicyEngine,
    actor: Option<&Actor>,
) -> DbResult<Json> {
    let centers = scoped_collection::<centers::Entity>(engine, actor)
        .order_by_asc(centers::Column::Name)
        .all(db)
        .await?;
    let mut rows = Vec::with_capacity(centers.len());
    for center in &centers {
        let doctors = scoped_collection::<doctors::Entity>(engine, actor)
            .filter(doctors::Column::CenterId.eq(center.id))
            .count(db)
            .await?;
        let mut patients = scoped_collection::<patients::Entity>(engine, actor);
        if let Some(expr) = key_expr::<patients::Entity>(ScopeKey::Center, center.id) {
            patients = patients.filter(expr);
        }
        let patients = patients.count(db).await?;
        let mut visits = scoped_collection::<visits::Entity>(engine, actor);
        if let Some(expr) = key_expr::<visits::Entity>(ScopeKey::Center, center.id) {
            visits = visits.filter(expr);
        }
        let visits = visits.count(db).await?;
        rows.push(json!({
            "center": center.name,
            "doctors": doctors,
            "patients": patients,
            "visits": visits,
        }));
    }
    Ok(json!({ "centers": rows }))
}
