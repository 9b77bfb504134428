//! The `/auth/me/*` surface: profile, emergency contacts and health
//! record of the token holder. Everything here is scoped to `claims.sub`;
//! there is no way to address another user's rows.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, patch};
use axum::{Extension, Json, Router};
use companion_core::calendar;
use companion_core::models::{
    ContactUpdate, EmergencyContact, HealthData, HealthProfile, NewContact, Profile, ProfileData,
};
use companion_core::repository::ProfileRepository;
use serde::Deserialize;
use serde_json::json;

use crate::auth::Claims;
use crate::error::ApiError;
use crate::input::{Flag, ValidJson};
use crate::routes::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/me/profile", get(my_profile).patch(update_profile))
        .route("/auth/me/contacts", get(my_contacts).post(add_contact))
        .route(
            "/auth/me/contacts/{contactId}",
            patch(update_contact).delete(delete_contact),
        )
        .route("/auth/me/health", get(my_health).patch(update_health))
}

/// Trim an optional free-text field; whitespace-only collapses to absent.
fn trimmed_opt(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().to_string())
        .filter(|trimmed| !trimmed.is_empty())
}

/// Same, one level deeper, for tri-state patch fields. A provided blank
/// value behaves like an explicit clear.
fn trimmed_patch(field: Option<Option<String>>) -> Option<Option<String>> {
    field.map(trimmed_opt)
}

/// A patched mandatory column may be omitted but never blanked.
fn required_patch(field: Option<String>, what: &str) -> Result<Option<String>, ApiError> {
    match field {
        None => Ok(None),
        Some(raw) => {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                return Err(ApiError::Validation(format!("{what} must not be empty")));
            }
            Ok(Some(trimmed.to_string()))
        }
    }
}

// ---- GET /auth/me/profile ----

async fn my_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let profile = state.repo.find_profile(claims.sub).await?;
    Ok(Json(match profile {
        Some(row) => json!(row),
        None => json!({}),
    }))
}

// ---- PATCH /auth/me/profile ----

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct ProfileRequest {
    full_name: Option<String>,
    dob: Option<String>,
    gender: Option<String>,
    phone: Option<String>,
    address: Option<String>,
}

async fn update_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ValidJson(body): ValidJson<ProfileRequest>,
) -> Result<Json<Profile>, ApiError> {
    let dob = body.dob.as_deref().map(calendar::parse_date).transpose()?;
    let profile = state
        .repo
        .upsert_profile(
            claims.sub,
            ProfileData {
                full_name: body.full_name,
                dob,
                gender: body.gender,
                phone: body.phone,
                address: body.address,
            },
        )
        .await?;
    Ok(Json(profile))
}

// ---- GET /auth/me/contacts ----

async fn my_contacts(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let contacts = state.repo.find_contacts(claims.sub).await?;
    Ok(Json(json!({ "contacts": contacts })))
}

// ---- POST /auth/me/contacts ----

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct ContactRequest {
    name: Option<String>,
    relationship: Option<String>,
    phone: Option<String>,
    notes: Option<String>,
    #[serde(rename = "isPrimary", default)]
    is_primary: Option<Flag>,
}

async fn add_contact(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ValidJson(body): ValidJson<ContactRequest>,
) -> Result<(StatusCode, Json<EmergencyContact>), ApiError> {
    let name = body.name.as_deref().map(str::trim).unwrap_or_default();
    let phone = body.phone.as_deref().map(str::trim).unwrap_or_default();
    if name.is_empty() || phone.is_empty() {
        return Err(ApiError::Validation("name and phone required".to_string()));
    }

    let contact = state
        .repo
        .add_contact(
            claims.sub,
            NewContact {
                name: name.to_string(),
                relationship: trimmed_opt(body.relationship),
                phone: phone.to_string(),
                notes: trimmed_opt(body.notes),
                is_primary: body.is_primary.map(bool::from).unwrap_or(false),
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(contact)))
}

// ---- PATCH /auth/me/contacts/{contactId} ----

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct ContactPatchRequest {
    name: Option<String>,
    #[serde(default, with = "serde_with::rust::double_option")]
    relationship: Option<Option<String>>,
    phone: Option<String>,
    #[serde(default, with = "serde_with::rust::double_option")]
    notes: Option<Option<String>>,
    #[serde(rename = "isPrimary")]
    is_primary: Option<Flag>,
}

async fn update_contact(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(contact_id): Path<i64>,
    ValidJson(body): ValidJson<ContactPatchRequest>,
) -> Result<Json<EmergencyContact>, ApiError> {
    let update = ContactUpdate {
        name: required_patch(body.name, "name")?,
        relationship: trimmed_patch(body.relationship),
        phone: required_patch(body.phone, "phone")?,
        notes: trimmed_patch(body.notes),
        is_primary: body.is_primary.map(bool::from),
    };

    let contact = state
        .repo
        .update_contact(claims.sub, contact_id, update)
        .await?;
    Ok(Json(contact))
}

// ---- DELETE /auth/me/contacts/{contactId} ----

async fn delete_contact(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(contact_id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.repo.delete_contact(claims.sub, contact_id).await?;
    Ok(Json(json!({ "ok": true })))
}

// ---- GET /auth/me/health ----

async fn my_health(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let health = state.repo.find_health_profile(claims.sub).await?;
    Ok(Json(match health {
        Some(row) => json!(row),
        None => json!({}),
    }))
}

// ---- PATCH /auth/me/health ----

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct HealthRequest {
    blood_type: Option<String>,
    allergies: Option<String>,
    conditions: Option<String>,
    medical_notes: Option<String>,
}

async fn update_health(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ValidJson(body): ValidJson<HealthRequest>,
) -> Result<Json<HealthProfile>, ApiError> {
    let health = state
        .repo
        .upsert_health_profile(
            claims.sub,
            HealthData {
                blood_type: body.blood_type,
                allergies: body.allergies,
                conditions: body.conditions,
                medical_notes: body.medical_notes,
            },
        )
        .await?;
    Ok(Json(health))
}
