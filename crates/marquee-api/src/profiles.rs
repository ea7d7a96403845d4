//! Handlers for `/profiles` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `POST`   | `/profiles` | Body: `{"name","color","userId"}`; 400 over quota or on conflict |
//! | `GET`    | `/profiles/user/:userId` | Name order |
//! | `GET`    | `/profiles/user/:userId/limits` | Admission check |
//! | `POST`   | `/profiles/user/:userId/enforce-limits` | Delete profiles over quota |
//! | `GET`    | `/profiles/:id` | 404 if not found |
//! | `PUT`    | `/profiles/:id` | Partial update |
//! | `DELETE` | `/profiles/:id` | Refused for the last profile |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use marquee_core::{
  plan::Plan,
  profile::{CreateProfileInput, Profile, ProfileUpdate},
  store::Store,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{AppState, error::ApiError};

// ─── Create ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBody {
  pub name:    String,
  pub color:   String,
  pub user_id: Uuid,
}

/// `POST /profiles`
pub async fn create<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: Store + 'static,
{
  let input = CreateProfileInput::parse(body.user_id, &body.name, &body.color)?;
  let profile = state.profiles.create(input).await?;
  Ok((StatusCode::CREATED, Json(profile)))
}

// ─── By user ─────────────────────────────────────────────────────────────────

/// `GET /profiles/user/:userId`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  Path(user_id): Path<Uuid>,
) -> Result<Json<Vec<Profile>>, ApiError>
where
  S: Store + 'static,
{
  Ok(Json(state.profiles.list(user_id).await?))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LimitsView {
  pub current_profiles: usize,
  pub max_profiles:     usize,
  pub can_create_more:  bool,
  pub plan:             Option<Plan>,
}

/// `GET /profiles/user/:userId/limits`
pub async fn limits<S>(
  State(state): State<AppState<S>>,
  Path(user_id): Path<Uuid>,
) -> Result<Json<LimitsView>, ApiError>
where
  S: Store + 'static,
{
  let admission = state.profiles.engine().can_create(user_id).await?;
  Ok(Json(LimitsView {
    current_profiles: admission.current_count,
    max_profiles:     admission.max_profiles,
    can_create_more:  admission.allowed,
    plan:             admission.plan,
  }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnforceView {
  pub removed_profiles:   Vec<Profile>,
  pub remaining_profiles: Vec<Profile>,
}

/// `POST /profiles/user/:userId/enforce-limits`
pub async fn enforce_limits<S>(
  State(state): State<AppState<S>>,
  Path(user_id): Path<Uuid>,
) -> Result<Json<EnforceView>, ApiError>
where
  S: Store + 'static,
{
  let outcome = state.profiles.engine().enforce_limits(user_id).await?;
  Ok(Json(EnforceView {
    removed_profiles:   outcome.removed,
    remaining_profiles: outcome.kept,
  }))
}

// ─── Single profile ──────────────────────────────────────────────────────────

/// `GET /profiles/:id`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Profile>, ApiError>
where
  S: Store + 'static,
{
  Ok(Json(state.profiles.get(id).await?))
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateBody {
  pub name:  Option<String>,
  pub color: Option<String>,
}

/// `PUT /profiles/:id`
pub async fn update<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
  Json(body): Json<UpdateBody>,
) -> Result<Json<Profile>, ApiError>
where
  S: Store + 'static,
{
  let update = ProfileUpdate::parse(body.name.as_deref(), body.color.as_deref())?;
  Ok(Json(state.profiles.update(id, update).await?))
}

/// `DELETE /profiles/:id`: returns the deleted profile.
pub async fn remove<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Profile>, ApiError>
where
  S: Store + 'static,
{
  Ok(Json(state.profiles.delete(id).await?))
}
