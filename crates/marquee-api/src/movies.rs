//! Handlers for `/movies` endpoints.

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use marquee_core::{
  Error as CoreError,
  movie::{Movie, MovieUpdate, NewMovie},
  store::{CatalogStore, Store},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{AppState, error::ApiError};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBody {
  pub title:     String,
  pub api_id:    String,
  pub image_url: String,
}

/// `POST /movies`
pub async fn create<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: Store + 'static,
{
  let input = NewMovie::parse(&body.title, &body.api_id, &body.image_url)?;
  let movie = state.store.insert_movie(input).await.map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(movie)))
}

/// `GET /movies`: title order.
pub async fn list<S>(State(state): State<AppState<S>>) -> Result<Json<Vec<Movie>>, ApiError>
where
  S: Store + 'static,
{
  Ok(Json(state.store.list_movies().await.map_err(ApiError::store)?))
}

/// `GET /movies/:id`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Movie>, ApiError>
where
  S: Store + 'static,
{
  let movie = state
    .store
    .get_movie(id)
    .await
    .map_err(ApiError::store)?
    .ok_or(CoreError::MovieNotFound(id))?;
  Ok(Json(movie))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBody {
  pub title:     Option<String>,
  pub api_id:    Option<String>,
  pub image_url: Option<String>,
}

/// `PUT /movies/:id`
pub async fn update<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
  Json(body): Json<UpdateBody>,
) -> Result<Json<Movie>, ApiError>
where
  S: Store + 'static,
{
  let update = MovieUpdate::parse(
    body.title.as_deref(),
    body.api_id.as_deref(),
    body.image_url.as_deref(),
  )?;
  let movie = state
    .store
    .update_movie(id, update)
    .await
    .map_err(ApiError::store)?
    .ok_or(CoreError::MovieNotFound(id))?;
  Ok(Json(movie))
}

/// `DELETE /movies/:id`: also unlinks it from every favorites list.
pub async fn remove<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Movie>, ApiError>
where
  S: Store + 'static,
{
  let movie = state
    .store
    .delete_movie(id)
    .await
    .map_err(ApiError::store)?
    .ok_or(CoreError::MovieNotFound(id))?;
  Ok(Json(movie))
}
