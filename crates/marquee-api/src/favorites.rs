//! Handlers for `/favorites` endpoints.
//!
//! Each user has at most one favorites list. Adding a movie creates the list
//! on demand; adding the same movie twice is a no-op.

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use marquee_core::{
  Error as CoreError,
  movie::Favorites,
  store::{CatalogStore, ProfileStore, Store},
};
use uuid::Uuid;

use crate::{AppState, error::ApiError};

async fn ensure_user<S: Store>(store: &S, user_id: Uuid) -> Result<(), ApiError> {
  if store.user_exists(user_id).await.map_err(ApiError::store)? {
    Ok(())
  } else {
    Err(CoreError::UserNotFound(user_id).into())
  }
}

/// `POST /favorites/:userId`
pub async fn create<S>(
  State(state): State<AppState<S>>,
  Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError>
where
  S: Store + 'static,
{
  ensure_user(state.store.as_ref(), user_id).await?;
  let favorites = state
    .store
    .ensure_favorites(user_id)
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(favorites)))
}

/// `GET /favorites`
pub async fn list<S>(
  State(state): State<AppState<S>>,
) -> Result<Json<Vec<Favorites>>, ApiError>
where
  S: Store + 'static,
{
  Ok(Json(state.store.list_favorites().await.map_err(ApiError::store)?))
}

/// `GET /favorites/user/:userId`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  Path(user_id): Path<Uuid>,
) -> Result<Json<Favorites>, ApiError>
where
  S: Store + 'static,
{
  let favorites = state
    .store
    .get_favorites(user_id)
    .await
    .map_err(ApiError::store)?
    .ok_or(CoreError::FavoritesNotFound(user_id))?;
  Ok(Json(favorites))
}

/// `POST /favorites/add/:userId/:movieId`: returns the updated list.
pub async fn add<S>(
  State(state): State<AppState<S>>,
  Path((user_id, movie_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Favorites>, ApiError>
where
  S: Store + 'static,
{
  ensure_user(state.store.as_ref(), user_id).await?;
  if state
    .store
    .get_movie(movie_id)
    .await
    .map_err(ApiError::store)?
    .is_none()
  {
    return Err(CoreError::MovieNotFound(movie_id).into());
  }

  state
    .store
    .add_favorite(user_id, movie_id)
    .await
    .map_err(ApiError::store)?;
  let favorites = state
    .store
    .ensure_favorites(user_id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(favorites))
}

/// `DELETE /favorites/remove/:userId/:movieId`: returns the updated list.
pub async fn remove<S>(
  State(state): State<AppState<S>>,
  Path((user_id, movie_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Favorites>, ApiError>
where
  S: Store + 'static,
{
  let favorites = state
    .store
    .get_favorites(user_id)
    .await
    .map_err(ApiError::store)?
    .ok_or(CoreError::FavoritesNotFound(user_id))?;
  if !favorites.contains(movie_id) {
    return Err(ApiError::NotFound(format!(
      "movie {movie_id} is not in the favorites of user {user_id}"
    )));
  }

  state
    .store
    .remove_favorite(user_id, movie_id)
    .await
    .map_err(ApiError::store)?;
  let favorites = state
    .store
    .ensure_favorites(user_id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(favorites))
}
