use std::{
    net::{IpAddr, SocketAddr},
    sync::Arc,
};

use anyhow::Context;
use async_graphql_axum::{GraphQLRequest, GraphQLResponse};
use axum::{
    Json, Router,
    extract::{FromRef, State},
    http::{self, HeaderMap, HeaderName, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use axum_extra::extract::cookie::{Cookie, Key, PrivateCookieJar, SameSite};
use chrono::{Duration, Utc};
use entity::{sessions, users};
use platform_db::{DbPool, actor::actor_for, authz_role};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set, Statement,
};
use serde::{Deserialize, Serialize};
use time::Duration as TimeDuration;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::{
    auth::{normalize_email, verify_credentials},
    config::AppConfig,
    graphql::{RequestUser, SchemaType},
};

pub const SESSION_COOKIE: &str = "hospital_session";

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub schema: SchemaType,
    pub config: Arc<AppConfig>,
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.config.cookie_key.clone()
    }
}

#[derive(Clone, Debug)]
pub struct ServeConfig {
    addr: SocketAddr,
}

impl ServeConfig {
    pub fn new(host: IpAddr, port: u16) -> Self {
        Self {
            addr: SocketAddr::from((host, port)),
        }
    }
}

pub async fn serve(config: ServeConfig, state: AppState) -> anyhow::Result<()> {
    let router = build_router(state);
    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("failed to bind {}", config.addr))?;

    info!(%config.addr, "hospital server listening");
    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;
    Ok(())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed = origins
        .iter()
        .filter_map(|origin| origin.parse::<HeaderValue>().ok())
        .collect::<Vec<_>>();
    let layer = CorsLayer::new()
        .allow_headers([http::header::CONTENT_TYPE])
        .allow_methods([Method::POST, Method::GET]);
    // Credentialed CORS cannot be combined with a wildcard origin.
    if allowed.is_empty() {
        layer.allow_origin(AllowOrigin::any())
    } else {
        layer
            .allow_credentials(true)
            .allow_origin(AllowOrigin::list(allowed))
    }
}

pub fn build_router(state: AppState) -> Router {
    let header_name = HeaderName::from_static("x-request-id");
    Router::new()
        .route("/health", get(health_handler))
        .route("/login", post(login_handler))
        .route("/logout", post(logout_handler))
        .route("/graphql", post(graphql_handler))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(header_name.clone(), MakeRequestUuid))
                .layer(PropagateRequestIdLayer::new(header_name))
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(&state.config.cors_allowed_origins)),
        )
        .with_state(state)
}

#[derive(Deserialize)]
struct LoginRequest {
    email: String,
    password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: String,
}

async fn login_handler(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    headers: HeaderMap,
    Json(body): Json<LoginRequest>,
) -> HttpResult<(PrivateCookieJar, Json<LoginResponse>)> {
    let email = normalize_email(&body.email)
        .ok_or_else(|| HttpError::new(StatusCode::BAD_REQUEST, "email is required"))?;
    let user = users::Entity::find()
        .filter(users::Column::Email.eq(email.as_str()))
        .one(&state.pool)
        .await
        .map_err(|err| HttpError::internal(err.into()))?;
    let stored = user.as_ref().map(|user| user.password_hash.as_str());
    let verified = verify_credentials(&body.password, stored);
    let Some(user) = user.filter(|_| verified) else {
        debug!("login rejected: bad credentials");
        return Err(HttpError::new(
            StatusCode::UNAUTHORIZED,
            "invalid email or password",
        ));
    };
    if !user.is_active {
        debug!(user_id = %user.id, "login rejected: account inactive");
        return Err(HttpError::new(StatusCode::FORBIDDEN, "account is inactive"));
    }

    let session_id = Uuid::new_v4();
    let now = Utc::now();
    let ttl_days = state.config.session_ttl_days;
    let model = sessions::ActiveModel {
        id: Set(session_id),
        user_id: Set(user.id),
        created_at: Set(now.into()),
        expires_at: Set((now + Duration::days(ttl_days)).into()),
        ip: Set(header_text(&headers, "x-forwarded-for")),
        user_agent: Set(header_text(&headers, "user-agent")),
    };
    model
        .insert(&state.pool)
        .await
        .map_err(|err| HttpError::internal(err.into()))?;

    let cookie = Cookie::build((SESSION_COOKIE, session_id.to_string()))
        .path("/")
        .http_only(true)
        .secure(state.config.secure_cookies)
        .same_site(SameSite::Lax)
        .max_age(TimeDuration::days(ttl_days))
        .build();
    info!(user_id = %user.id, "user signed in");
    let response = LoginResponse {
        id: user.id,
        name: user.full_name(),
        email: user.email,
        role: authz_role(user.role).as_str().to_string(),
    };
    Ok((jar.add(cookie), Json(response)))
}

fn header_text(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.chars().take(255).collect())
}

async fn logout_handler(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
) -> HttpResult<(PrivateCookieJar, StatusCode)> {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        if let Ok(session_id) = Uuid::parse_str(cookie.value()) {
            if let Err(err) = sessions::Entity::delete_by_id(session_id)
                .exec(&state.pool)
                .await
            {
                warn!(error = %err, "failed to delete session");
            }
        }
    }
    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/").build());
    Ok((jar, StatusCode::NO_CONTENT))
}

async fn graphql_handler(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    request: GraphQLRequest,
) -> HttpResult<GraphQLResponse> {
    let user = load_session(&state, &jar).await?;
    let request = request.into_inner().data(user);
    Ok(state.schema.execute(request).await.into())
}

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let backend = state.pool.get_database_backend();
    let db_ok = state
        .pool
        .execute(Statement::from_string(backend, "SELECT 1".to_string()))
        .await
        .is_ok();
    Json(HealthResponse {
        ok: db_ok,
        db_ok,
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Serialize)]
struct HealthResponse {
    ok: bool,
    db_ok: bool,
    version: &'static str,
}

type HttpResult<T> = Result<T, HttpError>;

async fn load_session(state: &AppState, jar: &PrivateCookieJar) -> HttpResult<RequestUser> {
    let cookie = jar
        .get(SESSION_COOKIE)
        .ok_or_else(|| HttpError::new(StatusCode::UNAUTHORIZED, "missing session"))?;
    let session_id = Uuid::parse_str(cookie.value())
        .map_err(|_| HttpError::new(StatusCode::UNAUTHORIZED, "invalid session"))?;
    let session = sessions::Entity::find_by_id(session_id)
        .one(&state.pool)
        .await
        .map_err(|err| HttpError::internal(err.into()))?
        .ok_or_else(|| HttpError::new(StatusCode::UNAUTHORIZED, "session not found"))?;
    if session.expires_at.with_timezone(&Utc) < Utc::now() {
        if let Err(err) = sessions::Entity::delete_by_id(session_id)
            .exec(&state.pool)
            .await
        {
            warn!(error = %err, "failed to delete expired session");
        }
        return Err(HttpError::new(StatusCode::UNAUTHORIZED, "session expired"));
    }
    let user = users::Entity::find_by_id(session.user_id)
        .one(&state.pool)
        .await
        .map_err(|err| HttpError::internal(err.into()))?
        .filter(|user| user.is_active)
        .ok_or_else(|| HttpError::new(StatusCode::UNAUTHORIZED, "user not found"))?;
    let actor = actor_for(&state.pool, &user)
        .await
        .map_err(|err| HttpError::internal(err.into()))?;
    Ok(RequestUser {
        id: user.id,
        name: user.full_name(),
        email: user.email,
        actor,
    })
}

#[derive(Debug)]
struct HttpError {
    status: StatusCode,
    message: String,
}

impl HttpError {
    fn new(status: StatusCode, msg: &str) -> Self {
        Self {
            status,
            message: msg.to_string(),
        }
    }

    fn internal(err: anyhow::Error) -> Self {
        error!(error = %err, "request failed");
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: "internal server error".to_string(),
        }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        (self.status, self.message).into_response()
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "failed to listen for CTRL+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                error!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    ctrl_c.await;

    #[cfg(unix)]
    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    };
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use http_body_util::BodyExt;
    use migration::{Migrator, MigratorTrait};
    use platform_authz::PolicyEngine;
    use chrono::NaiveDate;
    use entity::{centers, cities, diseases, doctors, patients, staff};
    use sea_orm::{Database, IntoActiveModel};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;
    use crate::{
        auth::hash_password,
        graphql::{GraphqlData, build_schema},
        reports::ReportQueue,
    };

    const PASSWORD: &str = "correct horse battery";

    async fn app() -> (Router, DbPool) {
        let pool = Database::connect("sqlite::memory:").await.unwrap();
        Migrator::up(&pool, None).await.unwrap();
        let schema = build_schema(GraphqlData {
            pool: pool.clone(),
            engine: PolicyEngine::new(),
            reports: ReportQueue::detached(),
        });
        let config = AppConfig {
            cookie_key: Key::from(&[7u8; 64]),
            cors_allowed_origins: Vec::new(),
            session_ttl_days: 30,
            secure_cookies: false,
        };
        let state = AppState {
            pool: pool.clone(),
            schema,
            config: Arc::new(config),
        };
        (build_router(state), pool)
    }

    async fn add_user(pool: &DbPool, email: &str, role: users::Role, active: bool) -> Uuid {
        let now: sea_orm::prelude::DateTimeWithTimeZone = Utc::now().into();
        let user = users::ActiveModel {
            id: Set(Uuid::new_v4()),
            email: Set(email.to_string()),
            password_hash: Set(hash_password(PASSWORD).unwrap()),
            first_name: Set("Test".into()),
            last_name: Set("User".into()),
            phone_number: Set(None),
            role: Set(role),
            is_active: Set(active),
            is_verified: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(pool)
        .await
        .unwrap();
        user.id
    }

    fn json_request(uri: &str, body: Value, cookie: Option<&str>) -> http::Request<Body> {
        let mut builder = http::Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(http::header::CONTENT_TYPE, "application/json");
        if let Some(cookie) = cookie {
            builder = builder.header(http::header::COOKIE, cookie);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn login(router: &Router, email: &str) -> String {
        let response = router
            .clone()
            .oneshot(json_request(
                "/login",
                json!({"email": email, "password": PASSWORD}),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let set_cookie = response
            .headers()
            .get(http::header::SET_COOKIE)
            .and_then(|value| value.to_str().ok())
            .unwrap()
            .to_string();
        set_cookie.split(';').next().unwrap().to_string()
    }

    async fn graphql(router: &Router, cookie: Option<&str>, query: &str) -> Response {
        router
            .clone()
            .oneshot(json_request("/graphql", json!({"query": query}), cookie))
            .await
            .unwrap()
    }

    const TAKEN_CODE: &str = "01711000001";

    struct Clinic {
        doctor_a: Uuid,
        doctor_b: Uuid,
        patient: Uuid,
        disease: Uuid,
    }

    /// Two centers in one city. Doctor A and the staff member work at the
    /// first; the patient is under doctor A.
    async fn add_clinic(
        pool: &DbPool,
        doctor_a_user: Uuid,
        staff_user: Uuid,
        owner: Uuid,
    ) -> Clinic {
        let now: sea_orm::prelude::DateTimeWithTimeZone = Utc::now().into();
        let doctor_b_user = add_user(pool, "doc.b@hospital.test", users::Role::Doctor, true).await;
        let city = cities::Model {
            id: Uuid::new_v4(),
            name: "Dhaka".into(),
            state: "Dhaka".into(),
            country: "Bangladesh".into(),
            created_at: now,
        }
        .into_active_model()
        .insert(pool)
        .await
        .unwrap();
        let mut center_ids = Vec::new();
        for name in ["North Clinic", "South Clinic"] {
            let center = centers::Model {
                id: Uuid::new_v4(),
                name: name.into(),
                city_id: city.id,
                address: "1 Main Road".into(),
                phone_number: "0255000000".into(),
                email: None,
                is_active: true,
                created_at: now,
            }
            .into_active_model()
            .insert(pool)
            .await
            .unwrap();
            center_ids.push(center.id);
        }
        let mut doctor_ids = Vec::new();
        let assignments = [(doctor_a_user, center_ids[0]), (doctor_b_user, center_ids[1])];
        for (user_id, center_id) in assignments {
            let doctor = doctors::Model {
                id: Uuid::new_v4(),
                user_id,
                center_id,
                specialization: "Medicine".into(),
                license_number: None,
                experience_years: 4,
                consultation_fee_cents: 50_000,
                is_available: true,
                created_at: now,
                updated_at: now,
            }
            .into_active_model()
            .insert(pool)
            .await
            .unwrap();
            doctor_ids.push(doctor.id);
        }
        staff::Model {
            id: Uuid::new_v4(),
            user_id: staff_user,
            center_id: center_ids[0],
            department: "Front desk".into(),
            employee_id: "EMP-1".into(),
            is_active: true,
            created_at: now,
            updated_at: now,
        }
        .into_active_model()
        .insert(pool)
        .await
        .unwrap();
        let patient = patients::Model {
            id: Uuid::new_v4(),
            user_id: owner,
            doctor_id: doctor_ids[0],
            patient_name: "Rahim Uddin".into(),
            patient_code: TAKEN_CODE.into(),
            date_of_birth: NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
            gender: "MALE".into(),
            blood_group: None,
            address: "2 Lake Road".into(),
            emergency_contact_name: "Sibling".into(),
            emergency_contact_phone: "01800000000".into(),
            medical_history: None,
            allergies: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
        .into_active_model()
        .insert(pool)
        .await
        .unwrap();
        let disease = diseases::Model {
            id: Uuid::new_v4(),
            name: "Influenza".into(),
            category: "Respiratory".into(),
            icd_code: None,
            is_active: true,
            created_at: now,
        }
        .into_active_model()
        .insert(pool)
        .await
        .unwrap();
        Clinic {
            doctor_a: doctor_ids[0],
            doctor_b: doctor_ids[1],
            patient: patient.id,
            disease: disease.id,
        }
    }

    fn error_code(body: &Value) -> &Value {
        &body["errors"][0]["extensions"]["code"]
    }

    #[tokio::test]
    async fn health_reports_database_status() {
        let (router, _pool) = app().await;
        let response = router
            .oneshot(
                http::Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
        let body = body_json(response).await;
        assert_eq!(body["ok"], json!(true));
        assert_eq!(body["db_ok"], json!(true));
    }

    #[tokio::test]
    async fn graphql_requires_a_session() {
        let (router, _pool) = app().await;
        let response = graphql(&router, None, "{ version }").await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = graphql(&router, Some("hospital_session=forged"), "{ version }").await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn login_rejects_bad_credentials_and_inactive_users() {
        let (router, pool) = app().await;
        add_user(&pool, "admin@hospital.test", users::Role::Admin, true).await;
        add_user(&pool, "gone@hospital.test", users::Role::Staff, false).await;

        let wrong = router
            .clone()
            .oneshot(json_request(
                "/login",
                json!({"email": "admin@hospital.test", "password": "nope"}),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);

        let inactive = router
            .clone()
            .oneshot(json_request(
                "/login",
                json!({"email": "gone@hospital.test", "password": PASSWORD}),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(inactive.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn session_cookie_identifies_the_caller_until_logout() {
        let (router, pool) = app().await;
        add_user(&pool, "admin@hospital.test", users::Role::Admin, true).await;
        let cookie = login(&router, "Admin@Hospital.test").await;

        let response = graphql(&router, Some(&cookie), "{ me { email role } }").await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["data"]["me"]["email"], json!("admin@hospital.test"));
        assert_eq!(body["data"]["me"]["role"], json!("ADMIN"));

        let logout = router
            .clone()
            .oneshot(json_request("/logout", json!({}), Some(&cookie)))
            .await
            .unwrap();
        assert_eq!(logout.status(), StatusCode::NO_CONTENT);
        assert_eq!(sessions::Entity::find().all(&pool).await.unwrap().len(), 0);

        let response = graphql(&router, Some(&cookie), "{ me { email } }").await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn mutations_go_through_the_policy() {
        let (router, pool) = app().await;
        add_user(&pool, "admin@hospital.test", users::Role::Admin, true).await;
        add_user(&pool, "patient@hospital.test", users::Role::Patient, true).await;
        let admin = login(&router, "admin@hospital.test").await;
        let patient = login(&router, "patient@hospital.test").await;
        let create = r#"mutation { createCity(input: {name: "Dhaka", state: "Dhaka", country: "Bangladesh"}) { id name } }"#;

        let body = body_json(graphql(&router, Some(&patient), create).await).await;
        assert_eq!(body["errors"][0]["extensions"]["code"], json!("FORBIDDEN"));

        let body = body_json(graphql(&router, Some(&admin), create).await).await;
        assert_eq!(body["data"]["createCity"]["name"], json!("Dhaka"));

        let body = body_json(graphql(&router, Some(&patient), "{ cities { name } }").await).await;
        assert_eq!(body["data"]["cities"], json!([{"name": "Dhaka"}]));

        let body = body_json(graphql(&router, Some(&patient), "{ users { email } }").await).await;
        assert_eq!(body["data"]["users"], json!([{"email": "patient@hospital.test"}]));
    }

    #[tokio::test]
    async fn unauthorized_writes_reveal_nothing_about_stored_rows() {
        let (router, pool) = app().await;
        add_user(&pool, "admin@hospital.test", users::Role::Admin, true).await;
        let doctor_user = add_user(&pool, "doc.a@hospital.test", users::Role::Doctor, true).await;
        let staff_user = add_user(&pool, "staff@hospital.test", users::Role::Staff, true).await;
        let owner = add_user(&pool, "patient@hospital.test", users::Role::Patient, true).await;
        let clinic = add_clinic(&pool, doctor_user, staff_user, owner).await;
        let patient = login(&router, "patient@hospital.test").await;
        let staff = login(&router, "staff@hospital.test").await;

        for email in ["admin@hospital.test", "nobody@hospital.test"] {
            let create = format!(
                r#"mutation {{ createUser(input: {{email: "{email}", password: "long enough", firstName: "New", lastName: "User", role: PATIENT}}) {{ id }} }}"#
            );
            let body = body_json(graphql(&router, Some(&patient), &create).await).await;
            assert_eq!(error_code(&body), &json!("FORBIDDEN"), "{email}");
        }

        let register = |code: &str| {
            format!(
                r#"mutation {{ createPatient(input: {{doctorId: "{}", patientName: "Karim", patientCode: "{code}", dateOfBirth: "1992-05-04", gender: "MALE", address: "5 Hill Road", emergencyContactName: "Parent", emergencyContactPhone: "01900000000"}}) {{ id }} }}"#,
                clinic.doctor_a
            )
        };
        for code in [TAKEN_CODE, "01999999999"] {
            let body = body_json(graphql(&router, Some(&patient), &register(code)).await).await;
            assert_eq!(error_code(&body), &json!("FORBIDDEN"), "{code}");
        }

        // Callers allowed to register are told about duplicates.
        let body = body_json(graphql(&router, Some(&staff), &register(TAKEN_CODE)).await).await;
        assert_eq!(error_code(&body), &json!("INVALID_INPUT"));

        let unknown = router
            .clone()
            .oneshot(json_request(
                "/login",
                json!({"email": "nobody@hospital.test", "password": PASSWORD}),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(unknown.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn edits_cannot_move_records_out_of_scope() {
        let (router, pool) = app().await;
        let doctor_user = add_user(&pool, "doc.a@hospital.test", users::Role::Doctor, true).await;
        let staff_user = add_user(&pool, "staff@hospital.test", users::Role::Staff, true).await;
        let owner = add_user(&pool, "patient@hospital.test", users::Role::Patient, true).await;
        let clinic = add_clinic(&pool, doctor_user, staff_user, owner).await;
        let doctor = login(&router, "doc.a@hospital.test").await;
        let staff = login(&router, "staff@hospital.test").await;

        let reassign = format!(
            r#"mutation {{ updatePatient(id: "{}", input: {{doctorId: "{}"}}) {{ doctorId }} }}"#,
            clinic.patient, clinic.doctor_b
        );
        for cookie in [&doctor, &staff] {
            let body = body_json(graphql(&router, Some(cookie), &reassign).await).await;
            assert_eq!(error_code(&body), &json!("FORBIDDEN"));
        }
        let stored = patients::Entity::find_by_id(clinic.patient)
            .one(&pool)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.doctor_id, clinic.doctor_a);

        let rename = format!(
            r#"mutation {{ updatePatient(id: "{}", input: {{patientName: "Rahim U."}}) {{ patientName }} }}"#,
            clinic.patient
        );
        let body = body_json(graphql(&router, Some(&staff), &rename).await).await;
        assert_eq!(body["data"]["updatePatient"]["patientName"], json!("Rahim U."));

        let treat = format!(
            r#"mutation {{ createTreatment(input: {{patientId: "{}", diseaseId: "{}", treatmentName: "Antivirals", description: "Five days", startDate: "2024-03-01"}}) {{ treatmentName }} }}"#,
            clinic.patient, clinic.disease
        );
        let diagnose = format!(
            r#"mutation {{ createDiagnosis(input: {{patientId: "{}", diseaseId: "{}", diagnosedDate: "2024-03-01"}}) {{ id }} }}"#,
            clinic.patient, clinic.disease
        );
        for mutation in [&treat, &diagnose] {
            let body = body_json(graphql(&router, Some(&staff), mutation).await).await;
            assert_eq!(error_code(&body), &json!("FORBIDDEN"));
        }

        let body = body_json(graphql(&router, Some(&doctor), &treat).await).await;
        assert_eq!(body["data"]["createTreatment"]["treatmentName"], json!("Antivirals"));
    }
}
