use axum::extract::State;
use axum::routing::get;
use axum::{Extension, Json, Router};
use companion_core::access;
use companion_core::calendar;
use companion_core::models::{DailyCompletion, DayProgress};
use companion_core::repository::ProgressRepository;
use serde::Deserialize;

use crate::auth::Claims;
use crate::error::ApiError;
use crate::input::ValidQuery;
use crate::routes::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/analytics/progress/day", get(day_progress))
        .route("/analytics/progress/today", get(today_progress))
        .route("/analytics/completion/daily", get(daily_completion))
}

// ---- GET /analytics/progress/day ----

#[derive(Deserialize)]
struct DayQuery {
    #[serde(rename = "userId")]
    user_id: Option<i64>,
    date: Option<String>,
}

async fn day_progress(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ValidQuery(query): ValidQuery<DayQuery>,
) -> Result<Json<DayProgress>, ApiError> {
    let (user_id, raw_date) = match (query.user_id, query.date.as_deref()) {
        (Some(user_id), Some(raw)) => (user_id, raw),
        _ => return Err(ApiError::Validation("userId and date required".to_string())),
    };
    access::ensure_can_act_on(&claims.actor(), user_id)?;

    let date = calendar::parse_date(raw_date)?;
    let progress = state.repo.day_progress(user_id, date).await?;
    Ok(Json(progress))
}

// ---- GET /analytics/progress/today ----

#[derive(Deserialize)]
struct TodayQuery {
    #[serde(rename = "userId")]
    user_id: Option<i64>,
}

async fn today_progress(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ValidQuery(query): ValidQuery<TodayQuery>,
) -> Result<Json<DayProgress>, ApiError> {
    let user_id = query
        .user_id
        .ok_or_else(|| ApiError::Validation("userId required".to_string()))?;
    access::ensure_can_act_on(&claims.actor(), user_id)?;

    let date = calendar::today_in(state.timezone);
    let progress = state.repo.day_progress(user_id, date).await?;
    Ok(Json(progress))
}

// ---- GET /analytics/completion/daily ----

#[derive(Deserialize)]
struct MonthQuery {
    #[serde(rename = "userId")]
    user_id: Option<i64>,
    year: Option<i32>,
    month: Option<u32>,
}

async fn daily_completion(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ValidQuery(query): ValidQuery<MonthQuery>,
) -> Result<Json<Vec<DailyCompletion>>, ApiError> {
    let (user_id, year, month) = match (query.user_id, query.year, query.month) {
        (Some(user_id), Some(year), Some(month)) => (user_id, year, month),
        _ => {
            return Err(ApiError::Validation(
                "userId, year, month required".to_string(),
            ))
        }
    };
    access::ensure_can_act_on(&claims.actor(), user_id)?;

    let report = state.repo.month_progress(user_id, year, month).await?;
    Ok(Json(report))
}
