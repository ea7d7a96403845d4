//! Store traits implemented by persistence backends.
//!
//! The traits are split by aggregate so that each service names only what it
//! touches: the quota engine needs [`ProfileStore`] and
//! [`SubscriptionStore`]; the API layer needs the full [`Store`].
//!
//! All methods return `Send` futures so the traits can be used in
//! multi-threaded async runtimes (e.g. tokio with `axum`).

use std::future::Future;

use uuid::Uuid;

use crate::{
  Error,
  card::{Card, CardDetails},
  movie::{Favorites, Movie, MovieUpdate, NewMovie},
  profile::{Profile, ProfileUpdate},
  subscription::Subscription,
  user::{NewUser, User, UserCredentials, UserUpdate},
};

/// Shared error type of a backend.
pub trait Backend: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;
}

// ─── Users ───────────────────────────────────────────────────────────────────

/// Outcome of a user write that can collide on the unique email.
#[derive(Debug, Clone, PartialEq)]
pub enum UserWrite {
  Saved(User),
  /// Another user already holds the email.
  EmailTaken,
}

impl UserWrite {
  /// The saved user, or [`Error::EmailTaken`] for `email`.
  pub fn into_user(self, email: &str) -> crate::Result<User> {
    match self {
      UserWrite::Saved(user) => Ok(user),
      UserWrite::EmailTaken => Err(Error::EmailTaken(email.to_owned())),
    }
  }
}

pub trait UserStore: Backend {
  /// Persist a new user. A taken email yields [`UserWrite::EmailTaken`], even
  /// when a concurrent write claimed it after the caller's own check.
  fn insert_user(
    &self,
    input: NewUser,
  ) -> impl Future<Output = Result<UserWrite, Self::Error>> + Send + '_;

  fn get_user(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  /// Look up a user by (already normalised) email, including the password
  /// hash.
  fn find_credentials(
    &self,
    email: String,
  ) -> impl Future<Output = Result<Option<UserCredentials>, Self::Error>> + Send + '_;

  /// Apply `update`. Returns `None` if the user does not exist.
  fn update_user(
    &self,
    id: Uuid,
    update: UserUpdate,
  ) -> impl Future<Output = Result<Option<UserWrite>, Self::Error>> + Send + '_;
}

// ─── Subscriptions ───────────────────────────────────────────────────────────

pub trait SubscriptionStore: Backend {
  fn get_subscription(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Option<Subscription>, Self::Error>> + Send + '_;

  /// All subscriptions, most recently registered first.
  fn list_subscriptions(
    &self,
  ) -> impl Future<Output = Result<Vec<Subscription>, Self::Error>> + Send + '_;

  /// Insert or replace the subscription of `subscription.user_id`.
  fn save_subscription(
    &self,
    subscription: Subscription,
  ) -> impl Future<Output = Result<Subscription, Self::Error>> + Send + '_;

  /// Returns `false` if the user had no subscription.
  fn delete_subscription(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;
}

// ─── Profiles ────────────────────────────────────────────────────────────────

/// The narrow persistence interface of the quota engine.
pub trait ProfileStore: Backend {
  fn user_exists(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  fn count_profiles(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  /// All profiles of a user, ordered by name ascending.
  fn list_profiles(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Profile>, Self::Error>> + Send + '_;

  fn get_profile(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Profile>, Self::Error>> + Send + '_;

  /// Persist a fully-built profile.
  fn insert_profile(
    &self,
    profile: Profile,
  ) -> impl Future<Output = Result<Profile, Self::Error>> + Send + '_;

  /// Returns `None` if the profile does not exist.
  fn update_profile(
    &self,
    id: Uuid,
    update: ProfileUpdate,
  ) -> impl Future<Output = Result<Option<Profile>, Self::Error>> + Send + '_;

  /// Returns `false` if the profile was already gone.
  fn delete_profile(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;
}

// ─── Cards ───────────────────────────────────────────────────────────────────

pub trait CardStore: Backend {
  fn insert_card(
    &self,
    user_id: Uuid,
    details: CardDetails,
  ) -> impl Future<Output = Result<Card, Self::Error>> + Send + '_;

  /// Replace the details of a card. Returns `None` if it does not exist.
  fn update_card(
    &self,
    id: Uuid,
    details: CardDetails,
  ) -> impl Future<Output = Result<Option<Card>, Self::Error>> + Send + '_;

  fn list_cards(
    &self,
    user_id: Option<Uuid>,
  ) -> impl Future<Output = Result<Vec<Card>, Self::Error>> + Send + '_;

  /// Returns the deleted card, or `None` if it did not exist.
  fn delete_card(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Card>, Self::Error>> + Send + '_;
}

// ─── Movies & favorites ──────────────────────────────────────────────────────

pub trait CatalogStore: Backend {
  fn insert_movie(
    &self,
    input: NewMovie,
  ) -> impl Future<Output = Result<Movie, Self::Error>> + Send + '_;

  fn get_movie(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Movie>, Self::Error>> + Send + '_;

  fn list_movies(
    &self,
  ) -> impl Future<Output = Result<Vec<Movie>, Self::Error>> + Send + '_;

  fn update_movie(
    &self,
    id: Uuid,
    update: MovieUpdate,
  ) -> impl Future<Output = Result<Option<Movie>, Self::Error>> + Send + '_;

  /// Returns the deleted movie, or `None` if it did not exist.
  fn delete_movie(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Movie>, Self::Error>> + Send + '_;

  /// Return the user's favorites list, creating an empty one if needed.
  fn ensure_favorites(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Favorites, Self::Error>> + Send + '_;

  fn get_favorites(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Option<Favorites>, Self::Error>> + Send + '_;

  fn list_favorites(
    &self,
  ) -> impl Future<Output = Result<Vec<Favorites>, Self::Error>> + Send + '_;

  /// Link `movie_id` to the user's list. Linking twice is a no-op.
  fn add_favorite(
    &self,
    user_id: Uuid,
    movie_id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Returns `false` if the movie was not in the list.
  fn remove_favorite(
    &self,
    user_id: Uuid,
    movie_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;
}

/// Everything the HTTP layer needs from a backend.
pub trait Store:
  UserStore + SubscriptionStore + ProfileStore + CardStore + CatalogStore
{
}

impl<T> Store for T where
  T: UserStore + SubscriptionStore + ProfileStore + CardStore + CatalogStore
{
}
