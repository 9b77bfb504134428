//! Task CRUD, the per-day completion log and completion history.
//!
//! Routes address other users by id, so every handler runs the caller's
//! claims through the access rules before touching storage. `{id}` is a
//! subject id on the listing routes and a task id on the per-task ones,
//! matching the historical surface.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use axum::{Extension, Json, Router};
use companion_core::access;
use companion_core::calendar;
use companion_core::models::{CompletionOutcome, NewTaskData, Task, TaskLog, UpdateTaskData};
use companion_core::repository::{CompletionRepository, TaskRepository};
use serde::Deserialize;
use serde_json::json;

use crate::auth::Claims;
use crate::error::ApiError;
use crate::input::{self, Flag, ValidJson, ValidQuery};
use crate::routes::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/tasks", post(create_task))
        .route("/tasks/today/{userId}", get(due_today))
        .route("/tasks/completed", delete(clear_completed))
        .route("/tasks/completed/today/{userId}", get(completed_today))
        .route(
            "/tasks/{id}",
            get(all_tasks).patch(update_task).delete(delete_task),
        )
        .route("/tasks/{id}/complete", post(complete_task))
        .route("/logs/{userId}", get(logs))
        .route("/history/{userId}", get(history))
}

/// Optional `?date=YYYY-MM-DD` override carried by several routes.
#[derive(Deserialize)]
struct DateQuery {
    date: Option<String>,
}

// ---- POST /tasks ----

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct CreateTaskRequest {
    #[serde(rename = "userId")]
    user_id: Option<i64>,
    title: Option<String>,
    task_time: Option<String>,
    category: Option<String>,
    task_date: Option<String>,
    end_date: Option<String>,
    #[serde(default)]
    important: Option<Flag>,
    description: Option<String>,
    #[serde(rename = "isDaily", default)]
    is_daily: Option<Flag>,
}

async fn create_task(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ValidJson(body): ValidJson<CreateTaskRequest>,
) -> Result<(StatusCode, Json<Task>), ApiError> {
    let missing = || ApiError::Validation("userId and title required".to_string());
    let user_id = body.user_id.ok_or_else(missing)?;
    let title = body.title.as_deref().map(str::trim).unwrap_or_default();
    if title.is_empty() {
        return Err(missing());
    }
    access::ensure_can_act_on(&claims.actor(), user_id)?;

    let task_time = body.task_time.as_deref().map(calendar::parse_time).transpose()?;
    let task_date = body.task_date.as_deref().map(calendar::parse_date).transpose()?;
    let end_date = body.end_date.as_deref().map(calendar::parse_date).transpose()?;

    let task = state
        .repo
        .create_task(NewTaskData {
            user_id,
            title: title.to_string(),
            task_time,
            category: body.category,
            task_date,
            end_date,
            important: body.important.map(bool::from).unwrap_or(false),
            description: body.description,
            is_daily: body.is_daily.map(bool::from).unwrap_or(false),
        })
        .await?;

    Ok((StatusCode::CREATED, Json(task)))
}

// ---- GET /tasks/today/{userId} ----

async fn due_today(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(user_id): Path<i64>,
    ValidQuery(query): ValidQuery<DateQuery>,
) -> Result<Json<Vec<Task>>, ApiError> {
    access::ensure_can_act_on(&claims.actor(), user_id)?;
    let date = input::resolve_date(query.date.as_deref(), state.timezone)?;
    let tasks = state.repo.find_tasks_due_on(user_id, date).await?;
    Ok(Json(tasks))
}

// ---- GET /tasks/{userId} ----

async fn all_tasks(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(user_id): Path<i64>,
) -> Result<Json<Vec<Task>>, ApiError> {
    access::ensure_can_act_on(&claims.actor(), user_id)?;
    let tasks = state.repo.find_tasks_for_user(user_id).await?;
    Ok(Json(tasks))
}

// ---- PATCH /tasks/{taskId} ----

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct UpdateTaskRequest {
    title: Option<String>,
    #[serde(default, with = "serde_with::rust::double_option")]
    task_time: Option<Option<String>>,
    #[serde(default, with = "serde_with::rust::double_option")]
    category: Option<Option<String>>,
    #[serde(default, with = "serde_with::rust::double_option")]
    task_date: Option<Option<String>>,
    #[serde(default, with = "serde_with::rust::double_option")]
    end_date: Option<Option<String>>,
    important: Option<Flag>,
    #[serde(default, with = "serde_with::rust::double_option")]
    description: Option<Option<String>>,
    #[serde(rename = "isDaily")]
    is_daily: Option<Flag>,
}

async fn update_task(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(task_id): Path<i64>,
    ValidJson(body): ValidJson<UpdateTaskRequest>,
) -> Result<Json<Task>, ApiError> {
    let task = state
        .repo
        .find_task_by_id(task_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Task {task_id} not found")))?;
    access::ensure_can_act_on(&claims.actor(), task.user_id)?;

    let update = UpdateTaskData {
        title: body.title,
        task_time: input::parse_time_patch(&body.task_time)?,
        category: body.category,
        task_date: input::parse_date_patch(&body.task_date)?,
        end_date: input::parse_date_patch(&body.end_date)?,
        important: body.important.map(bool::from),
        description: body.description,
        is_daily: body.is_daily.map(bool::from),
    };

    let updated = state.repo.update_task(task_id, update).await?;
    Ok(Json(updated))
}

// ---- DELETE /tasks/{taskId} ----

#[derive(Deserialize)]
struct DeleteTaskQuery {
    /// Optional ownership scope; a mismatch makes the delete a 404.
    #[serde(rename = "userId")]
    user_id: Option<i64>,
}

async fn delete_task(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(task_id): Path<i64>,
    ValidQuery(query): ValidQuery<DeleteTaskQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let task = state
        .repo
        .find_task_by_id(task_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Task {task_id} not found")))?;
    access::ensure_can_act_on(&claims.actor(), task.user_id)?;

    state.repo.delete_task(task_id, query.user_id).await?;
    Ok(Json(json!({ "ok": true })))
}

// ---- POST /tasks/{taskId}/complete ----

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct CompleteRequest {
    method: Option<String>,
}

async fn complete_task(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(task_id): Path<i64>,
    ValidQuery(query): ValidQuery<DateQuery>,
    body: Option<ValidJson<CompleteRequest>>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let method = body
        .and_then(|ValidJson(parsed)| parsed.method)
        .map(|raw| raw.trim().to_string())
        .filter(|trimmed| !trimmed.is_empty())
        .unwrap_or_else(|| "manual".to_string());
    let date = input::resolve_date(query.date.as_deref(), state.timezone)?;

    let outcome = state
        .repo
        .complete_task(task_id, &claims.actor(), &method, date)
        .await?;
    Ok(Json(match outcome {
        CompletionOutcome::Logged(log) => json!({ "ok": true, "log": log, "date": date }),
        CompletionOutcome::AlreadyCompleted => {
            json!({ "ok": true, "alreadyCompletedToday": true, "date": date })
        }
    }))
}

// ---- DELETE /tasks/completed ----

#[derive(Deserialize)]
struct ClearQuery {
    #[serde(rename = "userId")]
    user_id: Option<i64>,
    date: Option<String>,
}

async fn clear_completed(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ValidQuery(query): ValidQuery<ClearQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let user_id = query
        .user_id
        .ok_or_else(|| ApiError::Validation("userId required".to_string()))?;
    access::ensure_can_act_on(&claims.actor(), user_id)?;

    let date = input::resolve_date(query.date.as_deref(), state.timezone)?;
    let cleared = state.repo.clear_completions(user_id, date).await?;
    Ok(Json(json!({ "ok": true, "cleared": cleared, "date": date })))
}

// ---- GET /tasks/completed/today/{userId} ----

async fn completed_today(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(user_id): Path<i64>,
    ValidQuery(query): ValidQuery<DateQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    access::ensure_can_act_on(&claims.actor(), user_id)?;
    let date = input::resolve_date(query.date.as_deref(), state.timezone)?;
    let ids = state.repo.find_completed_task_ids(user_id, date).await?;
    Ok(Json(json!({ "completedToday": ids, "date": date })))
}

// ---- GET /logs/{userId} ----

async fn logs(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(user_id): Path<i64>,
) -> Result<Json<Vec<TaskLog>>, ApiError> {
    access::ensure_can_act_on(&claims.actor(), user_id)?;
    let entries = state.repo.find_logs_for_user(user_id).await?;
    Ok(Json(entries))
}

// ---- GET /history/{userId} ----

async fn history(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(user_id): Path<i64>,
    ValidQuery(query): ValidQuery<DateQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    access::ensure_can_act_on(&claims.actor(), user_id)?;
    // No date filter means the whole history, not just today.
    let date = query.date.as_deref().map(calendar::parse_date).transpose()?;
    let entries = state.repo.find_history(user_id, date).await?;
    Ok(Json(json!({ "logs": entries })))
}
