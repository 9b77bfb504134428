use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use companion_core::models::{NewUser, Role, UserSummary};
use companion_core::repository::UserRepository;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::auth::{self, Claims};
use crate::error::ApiError;
use crate::input::{ValidJson, ValidQuery};
use crate::routes::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/signup", post(signup))
        .route("/auth/login", post(login))
        .route("/auth/me", get(me))
        .route("/auth/users", get(list_users))
}

#[derive(Serialize)]
struct SessionResponse {
    token: String,
    user: UserSummary,
}

fn parse_role(raw: &str) -> Result<Role, ApiError> {
    raw.parse().map_err(|_| {
        ApiError::Validation("userType must be \"user\" or \"caregiver\"".to_string())
    })
}

// ---- POST /auth/signup ----

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct SignupRequest {
    name: Option<String>,
    email: Option<String>,
    password: Option<String>,
    #[serde(rename = "userType")]
    user_type: Option<String>,
}

async fn signup(
    State(state): State<AppState>,
    ValidJson(body): ValidJson<SignupRequest>,
) -> Result<(StatusCode, Json<SessionResponse>), ApiError> {
    let email = body.email.as_deref().map(str::trim).unwrap_or_default();
    let password = body.password.as_deref().unwrap_or_default();
    if email.is_empty() || password.is_empty() {
        return Err(ApiError::Validation("Email and password required".to_string()));
    }

    let role = match body.user_type.as_deref().map(str::trim) {
        None | Some("") => return Err(ApiError::Validation("UserType required".to_string())),
        Some(raw) => parse_role(raw)?,
    };

    // A missing display name falls back to the mailbox part of the email.
    let name = match body.name.as_deref().map(str::trim) {
        Some(given) if !given.is_empty() => given.to_string(),
        _ => email.split('@').next().unwrap_or(email).to_string(),
    };

    let password_hash = auth::hash_password(password)?;
    let user = state
        .repo
        .create_user(NewUser {
            name,
            email: email.to_string(),
            password_hash,
            role,
        })
        .await?;

    let token = state.tokens.sign(&user)?;
    Ok((
        StatusCode::CREATED,
        Json(SessionResponse {
            token,
            user: user.summary(),
        }),
    ))
}

// ---- POST /auth/login ----

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct LoginRequest {
    /// Historical field name; takes an email address or a login name.
    email: Option<String>,
    password: Option<String>,
}

async fn login(
    State(state): State<AppState>,
    ValidJson(body): ValidJson<LoginRequest>,
) -> Result<Json<SessionResponse>, ApiError> {
    let identifier = body.email.as_deref().map(str::trim).unwrap_or_default();
    let password = body.password.as_deref().unwrap_or_default();
    if identifier.is_empty() || password.is_empty() {
        return Err(ApiError::Validation(
            "Email/Username and password required".to_string(),
        ));
    }

    let user = state
        .repo
        .find_user_by_identifier(identifier)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("user not found".to_string()))?;

    if !auth::verify_password(&user.password_hash, password) {
        return Err(ApiError::Unauthorized("invalid credentials".to_string()));
    }

    let token = state.tokens.sign(&user)?;
    Ok(Json(SessionResponse {
        token,
        user: user.summary(),
    }))
}

// ---- GET /auth/me ----

async fn me(Extension(claims): Extension<Claims>) -> Json<serde_json::Value> {
    Json(json!({ "user": claims }))
}

// ---- GET /auth/users ----

#[derive(Deserialize)]
struct UsersQuery {
    #[serde(rename = "userType")]
    user_type: Option<String>,
}

async fn list_users(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ValidQuery(query): ValidQuery<UsersQuery>,
) -> Result<Json<Vec<UserSummary>>, ApiError> {
    if claims.role != Role::Caregiver {
        return Err(ApiError::Forbidden);
    }

    let role = parse_role(query.user_type.as_deref().unwrap_or("user"))?;
    let users = state.repo.find_users_by_role(role).await?;
    Ok(Json(users))
}
