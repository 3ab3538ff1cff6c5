use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::*;
use crate::store::{App, Summary, ZooError};

type ApiError = (StatusCode, String);

// ============================================================
// Error Handling
// ============================================================

/// Log an internal error and return a sanitized response to the client.
fn internal_error(e: impl std::fmt::Display) -> ApiError {
    tracing::error!("Internal error: {}", e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal server error".to_string(),
    )
}

/// Business-rule failures are safe to show to the player as-is.
fn zoo_error(e: ZooError) -> ApiError {
    let status = match &e {
        ZooError::AnimalNotFound(_) | ZooError::PackNotFound(_) => StatusCode::NOT_FOUND,
        ZooError::AlreadyUnlocked(_) | ZooError::Locked(_) => StatusCode::CONFLICT,
        ZooError::InsufficientCoins { .. } => StatusCode::BAD_REQUEST,
        ZooError::Gacha(_) => StatusCode::CONFLICT,
    };
    tracing::warn!("Zoo action refused: {}", e);
    (status, e.to_string())
}

fn task_not_found() -> ApiError {
    (StatusCode::NOT_FOUND, "Task not found".to_string())
}

// ============================================================
// Health
// ============================================================

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

pub async fn summary(State(app): State<App>) -> Json<Summary> {
    Json(app.lock().summary())
}

/// Wait for pending writes; reports whether they all reached storage.
pub async fn flush(State(app): State<App>) -> Result<StatusCode, ApiError> {
    app.flush().await.map_err(internal_error)?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================
// Tasks
// ============================================================

pub async fn list_tasks(State(app): State<App>) -> Json<Vec<Task>> {
    Json(app.lock().tasks().tasks().to_vec())
}

pub async fn list_filtered_tasks(State(app): State<App>) -> Json<Vec<Task>> {
    let state = app.lock();
    Json(state.tasks().filtered_tasks().into_iter().cloned().collect())
}

pub async fn get_task(
    State(app): State<App>,
    Path(id): Path<Uuid>,
) -> Result<Json<Task>, ApiError> {
    app.lock()
        .tasks()
        .get(id)
        .cloned()
        .map(Json)
        .ok_or_else(task_not_found)
}

pub async fn create_task(
    State(app): State<App>,
    Json(input): Json<CreateTaskInput>,
) -> Result<(StatusCode, Json<Task>), ApiError> {
    if input.title.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Title is required".to_string()));
    }
    let task = app.lock().add_task(input);
    Ok((StatusCode::CREATED, Json(task)))
}

pub async fn update_task(
    State(app): State<App>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateTaskInput>,
) -> Result<Json<Task>, ApiError> {
    app.lock()
        .update_task(id, input)
        .map(Json)
        .ok_or_else(task_not_found)
}

pub async fn delete_task(
    State(app): State<App>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    if app.lock().delete_task(id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(task_not_found())
    }
}

pub async fn complete_task(
    State(app): State<App>,
    Path(id): Path<Uuid>,
) -> Result<Json<Task>, ApiError> {
    app.lock()
        .complete_task(id)
        .map(Json)
        .ok_or_else(task_not_found)
}

pub async fn increment_session(
    State(app): State<App>,
    Path(id): Path<Uuid>,
) -> Result<Json<Task>, ApiError> {
    app.lock()
        .increment_session(id)
        .map(Json)
        .ok_or_else(task_not_found)
}

// ============================================================
// Filters
// ============================================================

pub async fn get_filters(State(app): State<App>) -> Json<TaskFilters> {
    Json(app.lock().tasks().filters().clone())
}

pub async fn apply_filters(
    State(app): State<App>,
    Json(input): Json<ApplyFiltersInput>,
) -> Json<TaskFilters> {
    Json(app.lock().apply_filters(input))
}

pub async fn reset_filters(State(app): State<App>) -> StatusCode {
    app.lock().reset_filters();
    StatusCode::NO_CONTENT
}

// ============================================================
// Zoo
// ============================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct CoinsResponse {
    pub coins: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DecayResponse {
    pub ticked: usize,
}

#[derive(Debug, Deserialize)]
pub struct DialogQuery {
    pub activity: Option<Activity>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DialogResponse {
    pub personality: Option<Personality>,
    pub emoji: Option<String>,
    pub line: String,
}

pub async fn list_animals(State(app): State<App>) -> Json<Vec<Animal>> {
    Json(app.lock().zoo().animals().to_vec())
}

pub async fn get_animal(
    State(app): State<App>,
    Path(id): Path<String>,
) -> Result<Json<Animal>, ApiError> {
    app.lock()
        .zoo()
        .get(&id)
        .cloned()
        .map(Json)
        .ok_or_else(|| zoo_error(ZooError::AnimalNotFound(id)))
}

pub async fn unlock_animal(
    State(app): State<App>,
    Path(id): Path<String>,
) -> Result<Json<Animal>, ApiError> {
    app.lock().zoo_mut().unlock(&id).map(Json).map_err(zoo_error)
}

pub async fn care_for_animal(
    State(app): State<App>,
    Path((id, action)): Path<(String, String)>,
) -> Result<Json<Animal>, ApiError> {
    let action = CareAction::from_str(&action)
        .ok_or_else(|| (StatusCode::BAD_REQUEST, format!("Unknown action: {}", action)))?;
    app.lock()
        .zoo_mut()
        .care(&id, action)
        .map(Json)
        .map_err(zoo_error)
}

pub async fn get_dialog(
    State(app): State<App>,
    Path(id): Path<String>,
    Query(query): Query<DialogQuery>,
) -> Result<Json<DialogResponse>, ApiError> {
    let state = app.lock();
    let animal = state
        .zoo()
        .get(&id)
        .ok_or_else(|| zoo_error(ZooError::AnimalNotFound(id.clone())))?;
    let activity = query.activity.unwrap_or(Activity::Idle);
    Ok(Json(DialogResponse {
        personality: animal.personality,
        emoji: animal.personality.map(|p| p.emoji().to_string()),
        line: animal.dialog(activity).to_string(),
    }))
}

pub async fn get_coins(State(app): State<App>) -> Json<CoinsResponse> {
    Json(CoinsResponse {
        coins: app.lock().zoo().coins(),
    })
}

pub async fn run_decay(State(app): State<App>) -> Json<DecayResponse> {
    let ticked = app.lock().zoo_mut().decay_tick();
    Json(DecayResponse { ticked })
}

// ============================================================
// Shop
// ============================================================

#[derive(Debug, Serialize)]
pub struct PackView {
    #[serde(flatten)]
    pub pack: Pack,
    pub animals: Vec<GachaAnimal>,
}

pub async fn list_packs() -> Json<Vec<PackView>> {
    let packs = PACKS
        .iter()
        .map(|pack| PackView {
            pack: *pack,
            animals: GACHA_ANIMALS
                .iter()
                .filter(|a| a.pack == pack.id)
                .copied()
                .collect(),
        })
        .collect();
    Json(packs)
}

pub async fn buy_pack(
    State(app): State<App>,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<CollectedAnimal>), ApiError> {
    app.lock()
        .zoo_mut()
        .buy_pack(&id)
        .map(|won| (StatusCode::CREATED, Json(won)))
        .map_err(zoo_error)
}

pub async fn list_collection(State(app): State<App>) -> Json<Vec<CollectedAnimal>> {
    Json(app.lock().zoo().collection().to_vec())
}

// ============================================================
// Pomodoro
// ============================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct TickInput {
    pub seconds: u32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SelectTaskInput {
    pub task_id: Option<Uuid>,
}

/// Timer state plus the event produced by the call, if any.
#[derive(Debug, Serialize, Deserialize)]
pub struct TimerResponse {
    pub timer: PomodoroTimer,
    pub event: Option<IntervalEvent>,
}

pub async fn get_timer(State(app): State<App>) -> Json<PomodoroTimer> {
    Json(app.lock().timer().clone())
}

pub async fn toggle_timer(State(app): State<App>) -> Json<PomodoroTimer> {
    let mut state = app.lock();
    state.toggle_timer();
    Json(state.timer().clone())
}

pub async fn reset_timer(State(app): State<App>) -> Json<PomodoroTimer> {
    let mut state = app.lock();
    state.reset_timer();
    Json(state.timer().clone())
}

pub async fn skip_timer(State(app): State<App>) -> Json<TimerResponse> {
    let mut state = app.lock();
    let event = state.skip_timer();
    Json(TimerResponse {
        timer: state.timer().clone(),
        event,
    })
}

pub async fn tick_timer(
    State(app): State<App>,
    Json(input): Json<TickInput>,
) -> Json<TimerResponse> {
    let mut state = app.lock();
    let event = state.tick_timer(input.seconds);
    Json(TimerResponse {
        timer: state.timer().clone(),
        event,
    })
}

pub async fn select_task(
    State(app): State<App>,
    Json(input): Json<SelectTaskInput>,
) -> Result<Json<PomodoroTimer>, ApiError> {
    let mut state = app.lock();
    if !state.select_task(input.task_id) {
        return Err((
            StatusCode::BAD_REQUEST,
            "Task not found or already completed".to_string(),
        ));
    }
    Ok(Json(state.timer().clone()))
}

pub async fn get_pomodoro_settings(State(app): State<App>) -> Json<PomodoroSettings> {
    Json(app.lock().settings().pomodoro())
}

pub async fn update_pomodoro_settings(
    State(app): State<App>,
    Json(input): Json<PomodoroSettings>,
) -> Result<Json<PomodoroSettings>, ApiError> {
    if !input.is_valid() {
        return Err((
            StatusCode::BAD_REQUEST,
            format!(
                "Durations must be between 1 and {} minutes and the long break cadence at least 1",
                MAX_INTERVAL_MINUTES
            ),
        ));
    }
    Ok(Json(app.lock().set_pomodoro_settings(input)))
}

// ============================================================
// Onboarding
// ============================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct OnboardingResponse {
    pub complete: bool,
}

pub async fn get_onboarding(State(app): State<App>) -> Json<OnboardingResponse> {
    Json(OnboardingResponse {
        complete: app.lock().settings().onboarding_complete(),
    })
}

pub async fn complete_onboarding(State(app): State<App>) -> Json<OnboardingResponse> {
    app.lock().mark_onboarding_complete();
    Json(OnboardingResponse { complete: true })
}
