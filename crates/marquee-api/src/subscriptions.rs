//! Handlers for `/subscriptions` endpoints.
//!
//! Every write that sets a plan reconciles the user's profiles against the
//! new quota before responding.

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::Utc;
use marquee_core::{
  store::Store,
  subscription::{
    DEFAULT_TERM_MONTHS, NewSubscription, Subscription, SubscriptionStatus,
    SubscriptionUpdate,
  },
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{AppState, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct SubscriptionBody {
  pub plan:  String,
  pub value: f64,
}

impl SubscriptionBody {
  fn parse(&self) -> Result<NewSubscription, ApiError> {
    Ok(NewSubscription::parse(&self.plan, self.value)?)
  }
}

/// `POST /subscriptions/user/:userId`: an existing subscription is updated.
pub async fn create<S>(
  State(state): State<AppState<S>>,
  Path(user_id): Path<Uuid>,
  Json(body): Json<SubscriptionBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: Store + 'static,
{
  let subscription = state.subscriptions.create(user_id, body.parse()?).await?;
  Ok((StatusCode::CREATED, Json(subscription)))
}

/// `GET /subscriptions`: newest first.
pub async fn list<S>(
  State(state): State<AppState<S>>,
) -> Result<Json<Vec<Subscription>>, ApiError>
where
  S: Store + 'static,
{
  Ok(Json(state.subscriptions.list().await?))
}

/// `GET /subscriptions/user/:userId`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  Path(user_id): Path<Uuid>,
) -> Result<Json<Subscription>, ApiError>
where
  S: Store + 'static,
{
  Ok(Json(state.subscriptions.get(user_id).await?))
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateBody {
  pub plan:  Option<String>,
  pub value: Option<f64>,
}

/// `PUT /subscriptions/user/:userId`
pub async fn update<S>(
  State(state): State<AppState<S>>,
  Path(user_id): Path<Uuid>,
  Json(body): Json<UpdateBody>,
) -> Result<Json<Subscription>, ApiError>
where
  S: Store + 'static,
{
  let update = SubscriptionUpdate::parse(body.plan.as_deref(), body.value)?;
  Ok(Json(state.subscriptions.update(user_id, update).await?))
}

/// `DELETE /subscriptions/user/:userId`: returns the cancelled subscription.
pub async fn remove<S>(
  State(state): State<AppState<S>>,
  Path(user_id): Path<Uuid>,
) -> Result<Json<Subscription>, ApiError>
where
  S: Store + 'static,
{
  Ok(Json(state.subscriptions.remove(user_id).await?))
}

/// `POST /subscriptions/user/:userId/upsert`
pub async fn upsert<S>(
  State(state): State<AppState<S>>,
  Path(user_id): Path<Uuid>,
  Json(body): Json<SubscriptionBody>,
) -> Result<Json<Subscription>, ApiError>
where
  S: Store + 'static,
{
  Ok(Json(state.subscriptions.upsert(user_id, body.parse()?).await?))
}

#[derive(Debug, Default, Deserialize)]
pub struct RenewBody {
  pub months: Option<u32>,
}

/// `POST /subscriptions/user/:userId/renew`: body `{"months": n}`, default 12.
pub async fn renew<S>(
  State(state): State<AppState<S>>,
  Path(user_id): Path<Uuid>,
  body: Option<Json<RenewBody>>,
) -> Result<Json<Subscription>, ApiError>
where
  S: Store + 'static,
{
  let months = body
    .and_then(|Json(b)| b.months)
    .unwrap_or(DEFAULT_TERM_MONTHS);
  Ok(Json(state.subscriptions.renew(user_id, months).await?))
}

/// `GET /subscriptions/user/:userId/status`
pub async fn status<S>(
  State(state): State<AppState<S>>,
  Path(user_id): Path<Uuid>,
) -> Result<Json<SubscriptionStatus>, ApiError>
where
  S: Store + 'static,
{
  Ok(Json(state.subscriptions.status(user_id, Utc::now()).await?))
}
