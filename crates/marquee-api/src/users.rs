//! Handlers for `/user` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/user/register` | Body: [`RegisterBody`]; returns 201 |
//! | `POST` | `/user/login` | Body: `{"email":..,"password":..}`; 401 on mismatch |
//! | `GET`  | `/user/find/:id` | 404 if not found |
//! | `PUT`  | `/user/:id` | Partial update |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use marquee_core::{
  Error as CoreError,
  store::{Store, SubscriptionStore, UserStore},
  subscription::{NewSubscription, Subscription},
  user::{Email, NewUser, Registration, User, UserUpdate, check_password},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  AppState,
  auth::{hash_password, verify_password},
  error::ApiError,
};

/// A user as returned by the API, with their subscription if any.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
  #[serde(flatten)]
  pub user:         User,
  pub subscription: Option<Subscription>,
}

// ─── Register ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SubscriptionBody {
  pub plan:  String,
  pub value: f64,
}

#[derive(Debug, Deserialize)]
pub struct RegisterBody {
  pub email:        String,
  pub password:     String,
  pub firstname:    String,
  pub lastname:     String,
  pub phone:        String,
  pub address:      String,
  /// Optional initial subscription.
  pub subscription: Option<SubscriptionBody>,
}

/// `POST /user/register`
pub async fn register<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<RegisterBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: Store + 'static,
{
  check_password(&body.password)?;
  let registration = Registration::parse(
    &body.email,
    &body.firstname,
    &body.lastname,
    &body.phone,
    &body.address,
  )?;
  let initial = body
    .subscription
    .map(|s| NewSubscription::parse(&s.plan, s.value))
    .transpose()?;

  let existing = state
    .store
    .find_credentials(registration.email.as_str().to_owned())
    .await
    .map_err(ApiError::store)?;
  if existing.is_some() {
    return Err(CoreError::EmailTaken(registration.email.into_inner()).into());
  }

  let email = registration.email.as_str().to_owned();
  let password_hash = hash_password(body.password).await?;
  let user = state
    .store
    .insert_user(NewUser { registration, password_hash })
    .await
    .map_err(ApiError::store)?
    .into_user(&email)?;
  tracing::info!(user_id = %user.id, "registered user");

  let subscription = match initial {
    Some(input) => Some(state.subscriptions.create(user.id, input).await?),
    None => None,
  };

  Ok((StatusCode::CREATED, Json(UserView { user, subscription })))
}

// ─── Login ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct LoginBody {
  pub email:    String,
  pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginView {
  #[serde(flatten)]
  pub user:          User,
  pub is_subscribed: bool,
}

/// `POST /user/login`: a credential check only; no session is issued.
pub async fn login<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<LoginBody>,
) -> Result<Json<LoginView>, ApiError>
where
  S: Store + 'static,
{
  let email = Email::parse(&body.email).map_err(|_| CoreError::InvalidCredentials)?;
  let creds = state
    .store
    .find_credentials(email.into_inner())
    .await
    .map_err(ApiError::store)?
    .ok_or(CoreError::InvalidCredentials)?;

  if !verify_password(body.password, creds.password_hash).await? {
    return Err(CoreError::InvalidCredentials.into());
  }

  let subscription = state
    .store
    .get_subscription(creds.user.id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(LoginView { user: creds.user, is_subscribed: subscription.is_some() }))
}

// ─── Get one ─────────────────────────────────────────────────────────────────

/// `GET /user/find/:id`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<UserView>, ApiError>
where
  S: Store + 'static,
{
  let user = state
    .store
    .get_user(id)
    .await
    .map_err(ApiError::store)?
    .ok_or(CoreError::UserNotFound(id))?;
  let subscription = state
    .store
    .get_subscription(id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(UserView { user, subscription }))
}

// ─── Update ──────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct UpdateBody {
  pub email:     Option<String>,
  pub firstname: Option<String>,
  pub lastname:  Option<String>,
  pub phone:     Option<String>,
  pub address:   Option<String>,
}

/// `PUT /user/:id`
pub async fn update<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
  Json(body): Json<UpdateBody>,
) -> Result<Json<User>, ApiError>
where
  S: Store + 'static,
{
  let update = UserUpdate::parse(
    body.email.as_deref(),
    body.firstname.as_deref(),
    body.lastname.as_deref(),
    body.phone.as_deref(),
    body.address.as_deref(),
  )?;

  let email = update
    .email
    .as_ref()
    .map(|e| e.as_str().to_owned())
    .unwrap_or_default();
  if let Some(email) = &update.email {
    let holder = state
      .store
      .find_credentials(email.as_str().to_owned())
      .await
      .map_err(ApiError::store)?;
    if holder.is_some_and(|c| c.user.id != id) {
      return Err(CoreError::EmailTaken(email.as_str().to_owned()).into());
    }
  }

  let user = state
    .store
    .update_user(id, update)
    .await
    .map_err(ApiError::store)?
    .ok_or(CoreError::UserNotFound(id))?
    .into_user(&email)?;
  Ok(Json(user))
}
