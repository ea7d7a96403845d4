//! Handlers for `/cards` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `POST`   | `/cards` | Body: [`CardBody`] plus `userId`; 404 if the user is missing |
//! | `GET`    | `/cards` | All cards |
//! | `GET`    | `/cards/user/:userId` | Cards of one user |
//! | `PUT`    | `/cards/:id` | Replaces the card details |
//! | `DELETE` | `/cards/:id` | Returns the deleted card |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use marquee_core::{
  Error as CoreError,
  card::{Card, CardDetails},
  store::{CardStore, ProfileStore, Store},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{AppState, error::ApiError};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardBody {
  pub name:            String,
  pub number:          String,
  /// `YYYY-MM-DD`
  pub expiration_date: String,
  pub security_code:   String,
}

impl CardBody {
  fn parse(&self) -> Result<CardDetails, ApiError> {
    Ok(CardDetails::parse(
      &self.name,
      &self.number,
      &self.expiration_date,
      &self.security_code,
    )?)
  }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBody {
  pub user_id: Uuid,
  #[serde(flatten)]
  pub card:    CardBody,
}

/// `POST /cards`
pub async fn create<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: Store + 'static,
{
  let details = body.card.parse()?;
  if !state
    .store
    .user_exists(body.user_id)
    .await
    .map_err(ApiError::store)?
  {
    return Err(CoreError::UserNotFound(body.user_id).into());
  }
  let card = state
    .store
    .insert_card(body.user_id, details)
    .await
    .map_err(ApiError::store)?;
  tracing::info!(user_id = %card.user_id, card = %card.masked_number(), "stored card");
  Ok((StatusCode::CREATED, Json(card)))
}

/// `GET /cards`
pub async fn list<S>(State(state): State<AppState<S>>) -> Result<Json<Vec<Card>>, ApiError>
where
  S: Store + 'static,
{
  let cards = state.store.list_cards(None).await.map_err(ApiError::store)?;
  Ok(Json(cards))
}

/// `GET /cards/user/:userId`
pub async fn list_by_user<S>(
  State(state): State<AppState<S>>,
  Path(user_id): Path<Uuid>,
) -> Result<Json<Vec<Card>>, ApiError>
where
  S: Store + 'static,
{
  let cards = state
    .store
    .list_cards(Some(user_id))
    .await
    .map_err(ApiError::store)?;
  Ok(Json(cards))
}

/// `PUT /cards/:id`
pub async fn update<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
  Json(body): Json<CardBody>,
) -> Result<Json<Card>, ApiError>
where
  S: Store + 'static,
{
  let card = state
    .store
    .update_card(id, body.parse()?)
    .await
    .map_err(ApiError::store)?
    .ok_or(CoreError::CardNotFound(id))?;
  Ok(Json(card))
}

/// `DELETE /cards/:id`
pub async fn remove<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Card>, ApiError>
where
  S: Store + 'static,
{
  let card = state
    .store
    .delete_card(id)
    .await
    .map_err(ApiError::store)?
    .ok_or(CoreError::CardNotFound(id))?;
  Ok(Json(card))
}
