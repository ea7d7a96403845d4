//! JSON REST API for Marquee.
//!
//! Exposes an axum [`Router`] backed by any [`marquee_core::store::Store`].
//! TLS, CORS and transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! let app = marquee_api::api_router(AppState::new(store, quota));
//! ```

pub mod auth;
pub mod cards;
pub mod error;
pub mod favorites;
pub mod health;
pub mod movies;
pub mod profiles;
pub mod subscriptions;
pub mod users;

use std::{sync::Arc, time::Instant};

use axum::{
  Router,
  routing::{delete, get, post, put},
};
use marquee_core::{
  plan::QuotaTable,
  profiles::ProfileService,
  quota::QuotaEngine,
  store::Store,
  subscription::SubscriptionService,
};

pub use error::ApiError;

// ─── Application state ───────────────────────────────────────────────────────

/// Shared state threaded through all handlers.
pub struct AppState<S> {
  pub store:         Arc<S>,
  pub profiles:      ProfileService<S>,
  pub subscriptions: SubscriptionService<S>,
  pub started_at:    Instant,
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      store:         Arc::clone(&self.store),
      profiles:      self.profiles.clone(),
      subscriptions: self.subscriptions.clone(),
      started_at:    self.started_at,
    }
  }
}

impl<S: Store> AppState<S> {
  /// Wire the services around `store`. Both services share one quota engine
  /// and therefore one set of per-user locks.
  pub fn new(store: Arc<S>, quota: QuotaTable) -> Self {
    let engine = Arc::new(QuotaEngine::new(Arc::clone(&store), quota));
    Self {
      profiles: ProfileService::new(Arc::clone(&engine)),
      subscriptions: SubscriptionService::new(engine),
      store,
      started_at: Instant::now(),
    }
  }
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(state: AppState<S>) -> Router<()>
where
  S: Store + 'static,
{
  Router::new()
    .route("/health", get(health::handler::<S>))
    // Users
    .route("/user/register", post(users::register::<S>))
    .route("/user/login", post(users::login::<S>))
    .route("/user/find/{id}", get(users::get_one::<S>))
    .route("/user/{id}", put(users::update::<S>))
    // Profiles
    .route("/profiles", post(profiles::create::<S>))
    .route("/profiles/user/{user_id}", get(profiles::list::<S>))
    .route("/profiles/user/{user_id}/limits", get(profiles::limits::<S>))
    .route(
      "/profiles/user/{user_id}/enforce-limits",
      post(profiles::enforce_limits::<S>),
    )
    .route(
      "/profiles/{id}",
      get(profiles::get_one::<S>)
        .put(profiles::update::<S>)
        .delete(profiles::remove::<S>),
    )
    // Subscriptions
    .route("/subscriptions", get(subscriptions::list::<S>))
    .route(
      "/subscriptions/user/{user_id}",
      post(subscriptions::create::<S>)
        .get(subscriptions::get_one::<S>)
        .put(subscriptions::update::<S>)
        .delete(subscriptions::remove::<S>),
    )
    .route("/subscriptions/user/{user_id}/upsert", post(subscriptions::upsert::<S>))
    .route("/subscriptions/user/{user_id}/renew", post(subscriptions::renew::<S>))
    .route("/subscriptions/user/{user_id}/status", get(subscriptions::status::<S>))
    // Cards
    .route("/cards", post(cards::create::<S>).get(cards::list::<S>))
    .route("/cards/user/{user_id}", get(cards::list_by_user::<S>))
    .route("/cards/{id}", put(cards::update::<S>).delete(cards::remove::<S>))
    // Movies
    .route("/movies", post(movies::create::<S>).get(movies::list::<S>))
    .route(
      "/movies/{id}",
      get(movies::get_one::<S>)
        .put(movies::update::<S>)
        .delete(movies::remove::<S>),
    )
    // Favorites
    .route("/favorites", get(favorites::list::<S>))
    .route("/favorites/{user_id}", post(favorites::create::<S>))
    .route("/favorites/user/{user_id}", get(favorites::get_one::<S>))
    .route("/favorites/add/{user_id}/{movie_id}", post(favorites::add::<S>))
    .route("/favorites/remove/{user_id}/{movie_id}", delete(favorites::remove::<S>))
    .with_state(state)
}

#[cfg(test)]
mod tests;
