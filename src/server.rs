//!
//! traingate HTTP server
//! ---------------------
//! This module defines the Axum-based HTTP API for traingate.
//!
//! Responsibilities:
//! - Request admission: every route runs behind the authentication gate,
//!   which whitelists public operations and otherwise requires an active
//!   session for the username asserted in the `x-username` header.
//! - Login/logout/password endpoints backed by the `identity` provider.
//! - Account creation with issued credentials for trainees and trainers.
//! - CRUD over the in-memory entity directory, plus training scheduling.
//! - First-run demo seeding and startup inventory logs.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::{Path, Query, Request, State};
use axum::http::{HeaderMap, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::domain::{Trainee, Trainer, Training};
use crate::error::{AppError, AppResult};
use crate::identity::{
    generate_password, generate_username, AuthProvider, AuthenticationGate, LocalAuthProvider,
    LoginRequest, RequestDescriptor, SessionRegistry,
};
use crate::security::UserStore;
use crate::seed;
use crate::storage::SharedDirectory;

/// Header carrying the caller-asserted username on authenticated requests.
pub const USERNAME_HEADER: &str = "x-username";

/// Shared server state injected into all handlers.
///
/// Holds the entity directory, the credential store, the session registry and
/// the gate/provider wired on top of them. All components are constructed in
/// `run_with_port` and shared via `Arc`; nothing here is a process global.
#[derive(Clone)]
pub struct AppState {
    pub directory: SharedDirectory,
    pub users: Arc<UserStore>,
    pub registry: Arc<SessionRegistry>,
    pub gate: Arc<AuthenticationGate>,
    pub auth: Arc<LocalAuthProvider>,
}

impl AppState {
    pub fn new() -> Self {
        let directory = SharedDirectory::new();
        let users = Arc::new(UserStore::new());
        let registry = Arc::new(SessionRegistry::new());
        let gate = Arc::new(AuthenticationGate::with_default_whitelist(registry.clone()));
        let auth = Arc::new(LocalAuthProvider::new(users.clone(), registry.clone()));
        Self { directory, users, registry, gate, auth }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

/// Start the traingate HTTP server bound to the given port.
///
/// Wires the identity components, seeds the directory (from `seed_file` when
/// given, otherwise with the embedded demo data on an empty store), prints a
/// startup inventory and mounts all routes behind the gate.
pub async fn run_with_port(http_port: u16, seed_file: Option<PathBuf>) -> anyhow::Result<()> {
    let state = AppState::new();

    if let Some(path) = seed_file {
        let data = seed::load_seed_file(&path)?;
        let report = seed::apply_seed(&data, &state.directory, &state.users)?;
        info!(
            "seed.applied source={:?} trainers={} trainees={} trainings={}",
            path, report.trainers, report.trainees, report.trainings
        );
    } else if state.directory.0.is_empty() {
        let data = seed::demo_seed()?;
        let report = seed::apply_seed(&data, &state.directory, &state.users)?;
        info!(
            "seed.applied source=embedded-demo trainers={} trainees={} trainings={}",
            report.trainers, report.trainees, report.trainings
        );
    }

    print_inventory(&state);

    let app = router(state);

    let addr: SocketAddr = format!("0.0.0.0:{}", http_port).parse()?;
    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Build the full route table with the gate layered in front of every route.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/docs", get(docs))
        .route("/api/auth/login", post(login))
        .route("/api/auth/logout", post(logout))
        .route("/api/auth/password", put(change_password))
        .route("/api/trainees", post(create_trainee).get(list_trainees))
        .route(
            "/api/trainees/{username}",
            get(get_trainee).put(update_trainee).delete(delete_trainee),
        )
        .route("/api/trainers", post(create_trainer).get(list_trainers))
        .route(
            "/api/trainers/{username}",
            get(get_trainer).put(update_trainer).delete(delete_trainer),
        )
        .route("/api/trainings", post(create_training).get(list_trainings))
        .layer(middleware::from_fn_with_state(state.clone(), require_session))
        .with_state(state)
}

fn print_inventory(state: &AppState) {
    let trainees = state.directory.0.trainees().len();
    let trainers = state.directory.0.trainers().len();
    let trainings = state.directory.0.trainings(None, None).len();
    info!(
        "Directory inventory: trainees={}, trainers={}, trainings={}",
        trainees, trainers, trainings
    );
}

/// Gate middleware: admit whitelisted requests, otherwise require an active
/// session for the asserted username. Rejections never reach a handler.
async fn require_session(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let decision = {
        let descriptor = RequestDescriptor {
            path: req.uri().path(),
            method: req.method().as_str(),
            username: req
                .headers()
                .get(USERNAME_HEADER)
                .and_then(|v| v.to_str().ok()),
        };
        state.gate.admit(&descriptor)
    };
    match decision {
        Ok(()) => next.run(req).await,
        Err(err) => err.into_response(),
    }
}

fn asserted_username(headers: &HeaderMap) -> Option<&str> {
    headers.get(USERNAME_HEADER).and_then(|v| v.to_str().ok()).filter(|u| !u.is_empty())
}

// --- auth endpoints ---

#[derive(Debug, Deserialize)]
struct LoginPayload {
    username: String,
    password: String,
}

async fn login(State(state): State<AppState>, Json(payload): Json<LoginPayload>) -> AppResult<Json<serde_json::Value>> {
    state.auth.login(&LoginRequest { username: payload.username, password: payload.password })?;
    Ok(Json(json!({"status":"ok"})))
}

async fn logout(State(state): State<AppState>, headers: HeaderMap) -> AppResult<Json<serde_json::Value>> {
    // the gate already required an active session for this username
    let Some(username) = asserted_username(&headers) else {
        return Err(AppError::unauthorized("unauthorized", "authentication required"));
    };
    state.auth.logout(username);
    Ok(Json(json!({"status":"ok"})))
}

#[derive(Debug, Deserialize)]
struct ChangePasswordPayload {
    username: String,
    old_password: String,
    new_password: String,
}

async fn change_password(
    State(state): State<AppState>,
    Json(payload): Json<ChangePasswordPayload>,
) -> AppResult<Json<serde_json::Value>> {
    if payload.new_password.is_empty() {
        return Err(AppError::user("empty_password", "new password must not be empty"));
    }
    state
        .auth
        .change_password(&payload.username, &payload.old_password, &payload.new_password)?;
    Ok(Json(json!({"status":"ok"})))
}

// --- account creation ---

/// Returned once, at registration time; the password is never shown again.
#[derive(Debug, Serialize)]
struct IssuedCredentials {
    username: String,
    password: String,
}

#[derive(Debug, Deserialize)]
struct CreateTraineePayload {
    first_name: String,
    last_name: String,
    #[serde(default)]
    date_of_birth: Option<NaiveDate>,
    #[serde(default)]
    address: Option<String>,
}

async fn create_trainee(
    State(state): State<AppState>,
    Json(payload): Json<CreateTraineePayload>,
) -> AppResult<(StatusCode, Json<IssuedCredentials>)> {
    require_name(&payload.first_name, &payload.last_name)?;
    let existing = state.users.usernames();
    let username = generate_username(&payload.first_name, &payload.last_name, &existing);
    let password = generate_password()?;
    state.users.add_user(&username, &password)?;
    state.directory.0.insert_trainee(Trainee {
        id: Uuid::new_v4(),
        username: username.clone(),
        first_name: payload.first_name,
        last_name: payload.last_name,
        date_of_birth: payload.date_of_birth,
        address: payload.address,
    });
    info!("account.created kind=trainee username={}", username);
    Ok((StatusCode::CREATED, Json(IssuedCredentials { username, password })))
}

#[derive(Debug, Deserialize)]
struct CreateTrainerPayload {
    first_name: String,
    last_name: String,
    specialization: String,
}

async fn create_trainer(
    State(state): State<AppState>,
    Json(payload): Json<CreateTrainerPayload>,
) -> AppResult<(StatusCode, Json<IssuedCredentials>)> {
    require_name(&payload.first_name, &payload.last_name)?;
    if payload.specialization.trim().is_empty() {
        return Err(AppError::user("invalid_specialization", "specialization is required"));
    }
    let existing = state.users.usernames();
    let username = generate_username(&payload.first_name, &payload.last_name, &existing);
    let password = generate_password()?;
    state.users.add_user(&username, &password)?;
    state.directory.0.insert_trainer(Trainer {
        id: Uuid::new_v4(),
        username: username.clone(),
        first_name: payload.first_name,
        last_name: payload.last_name,
        specialization: payload.specialization,
    });
    info!("account.created kind=trainer username={}", username);
    Ok((StatusCode::CREATED, Json(IssuedCredentials { username, password })))
}

fn require_name(first_name: &str, last_name: &str) -> AppResult<()> {
    if first_name.trim().is_empty() || last_name.trim().is_empty() {
        return Err(AppError::user("invalid_name", "first and last name are required"));
    }
    Ok(())
}

// --- trainee CRUD ---

async fn list_trainees(State(state): State<AppState>) -> Json<Vec<Trainee>> {
    Json(state.directory.0.trainees())
}

async fn get_trainee(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> AppResult<Json<Trainee>> {
    state
        .directory
        .0
        .trainee(&username)
        .map(Json)
        .ok_or_else(|| AppError::not_found("trainee_not_found", "no such trainee"))
}

#[derive(Debug, Deserialize)]
struct UpdateTraineePayload {
    first_name: String,
    last_name: String,
    #[serde(default)]
    date_of_birth: Option<NaiveDate>,
    #[serde(default)]
    address: Option<String>,
}

async fn update_trainee(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Json(payload): Json<UpdateTraineePayload>,
) -> AppResult<Json<Trainee>> {
    require_name(&payload.first_name, &payload.last_name)?;
    state
        .directory
        .0
        .update_trainee(&username, |t| {
            t.first_name = payload.first_name;
            t.last_name = payload.last_name;
            t.date_of_birth = payload.date_of_birth;
            t.address = payload.address;
        })
        .map(Json)
        .ok_or_else(|| AppError::not_found("trainee_not_found", "no such trainee"))
}

async fn delete_trainee(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> AppResult<Json<serde_json::Value>> {
    if !state.directory.0.remove_trainee(&username) {
        return Err(AppError::not_found("trainee_not_found", "no such trainee"));
    }
    state.users.remove_user(&username);
    state.registry.remove_user(&username);
    info!("account.removed kind=trainee username={}", username);
    Ok(Json(json!({"status":"ok"})))
}

// --- trainer CRUD ---

async fn list_trainers(State(state): State<AppState>) -> Json<Vec<Trainer>> {
    Json(state.directory.0.trainers())
}

async fn get_trainer(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> AppResult<Json<Trainer>> {
    state
        .directory
        .0
        .trainer(&username)
        .map(Json)
        .ok_or_else(|| AppError::not_found("trainer_not_found", "no such trainer"))
}

#[derive(Debug, Deserialize)]
struct UpdateTrainerPayload {
    first_name: String,
    last_name: String,
    specialization: String,
}

async fn update_trainer(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Json(payload): Json<UpdateTrainerPayload>,
) -> AppResult<Json<Trainer>> {
    require_name(&payload.first_name, &payload.last_name)?;
    state
        .directory
        .0
        .update_trainer(&username, |t| {
            t.first_name = payload.first_name;
            t.last_name = payload.last_name;
            t.specialization = payload.specialization;
        })
        .map(Json)
        .ok_or_else(|| AppError::not_found("trainer_not_found", "no such trainer"))
}

async fn delete_trainer(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> AppResult<Json<serde_json::Value>> {
    if !state.directory.0.remove_trainer(&username) {
        return Err(AppError::not_found("trainer_not_found", "no such trainer"));
    }
    state.users.remove_user(&username);
    state.registry.remove_user(&username);
    info!("account.removed kind=trainer username={}", username);
    Ok(Json(json!({"status":"ok"})))
}

// --- trainings ---

#[derive(Debug, Deserialize)]
struct CreateTrainingPayload {
    trainee_username: String,
    trainer_username: String,
    name: String,
    training_type: String,
    date: NaiveDate,
    duration_minutes: u32,
}

async fn create_training(
    State(state): State<AppState>,
    Json(payload): Json<CreateTrainingPayload>,
) -> AppResult<(StatusCode, Json<Training>)> {
    if state.directory.0.trainee(&payload.trainee_username).is_none() {
        return Err(AppError::not_found("trainee_not_found", "no such trainee"));
    }
    if state.directory.0.trainer(&payload.trainer_username).is_none() {
        return Err(AppError::not_found("trainer_not_found", "no such trainer"));
    }
    if payload.duration_minutes == 0 {
        return Err(AppError::user("invalid_duration", "duration must be positive"));
    }
    let training = Training {
        id: Uuid::new_v4(),
        trainee_username: payload.trainee_username,
        trainer_username: payload.trainer_username,
        name: payload.name,
        training_type: payload.training_type,
        date: payload.date,
        duration_minutes: payload.duration_minutes,
    };
    state.directory.0.insert_training(training.clone());
    Ok((StatusCode::CREATED, Json(training)))
}

#[derive(Debug, Deserialize)]
struct TrainingFilter {
    #[serde(default)]
    trainee: Option<String>,
    #[serde(default)]
    trainer: Option<String>,
}

async fn list_trainings(
    State(state): State<AppState>,
    Query(filter): Query<TrainingFilter>,
) -> Json<Vec<Training>> {
    Json(
        state
            .directory
            .0
            .trainings(filter.trainee.as_deref(), filter.trainer.as_deref()),
    )
}

// --- public info ---

async fn health() -> Json<serde_json::Value> {
    Json(json!({"status":"ok"}))
}

async fn docs() -> Json<serde_json::Value> {
    Json(json!({
        "service": "traingate",
        "auth": {
            "header": USERNAME_HEADER,
            "login": "POST /api/auth/login",
            "logout": "POST /api/auth/logout",
            "change_password": "PUT /api/auth/password"
        },
        "resources": {
            "trainees": "/api/trainees",
            "trainers": "/api/trainers",
            "trainings": "/api/trainings"
        }
    }))
}
