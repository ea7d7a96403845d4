//! Error types for `marquee-core`.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("user not found: {0}")]
  UserNotFound(Uuid),

  #[error("profile not found: {0}")]
  ProfileNotFound(Uuid),

  #[error("subscription not found for user {0}")]
  SubscriptionNotFound(Uuid),

  #[error("card not found: {0}")]
  CardNotFound(Uuid),

  #[error("movie not found: {0}")]
  MovieNotFound(Uuid),

  #[error("favorites not found for user {0}")]
  FavoritesNotFound(Uuid),

  /// Creation attempted with `current >= max` profiles.
  #[error("profile limit reached: {current} of {max} profiles in use")]
  QuotaExceeded { current: usize, max: usize },

  #[error("a profile named {0:?} already exists for this user")]
  NameConflict(String),

  #[error("the color {0} is already used by another profile of this user")]
  ColorConflict(String),

  #[error("a user must keep at least one profile")]
  LastProfile,

  #[error("a user with email {0} already exists")]
  EmailTaken(String),

  #[error("invalid credentials")]
  InvalidCredentials,

  #[error("invalid {field}: {reason}")]
  InvalidInput { field: &'static str, reason: String },

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Wrap a backend error.
  pub fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(e))
  }

  pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
    Self::InvalidInput { field, reason: reason.into() }
  }

  /// `true` for the "referenced entity does not exist" family.
  pub fn is_not_found(&self) -> bool {
    matches!(
      self,
      Self::UserNotFound(_)
        | Self::ProfileNotFound(_)
        | Self::SubscriptionNotFound(_)
        | Self::CardNotFound(_)
        | Self::MovieNotFound(_)
        | Self::FavoritesNotFound(_)
    )
  }

  /// `true` for rejections caused by the request itself (quota, conflicts,
  /// validation).
  pub fn is_bad_request(&self) -> bool {
    matches!(
      self,
      Self::QuotaExceeded { .. }
        | Self::NameConflict(_)
        | Self::ColorConflict(_)
        | Self::LastProfile
        | Self::EmailTaken(_)
        | Self::InvalidInput { .. }
    )
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
