//! Catalog movies and per-user favorites lists.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Result, user::required};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Movie {
  pub id:         Uuid,
  pub title:      String,
  /// Identifier of the movie in the external metadata catalog.
  pub api_id:     String,
  pub image_url:  String,
  pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewMovie {
  pub title:     String,
  pub api_id:    String,
  pub image_url: String,
}

impl NewMovie {
  pub fn parse(title: &str, api_id: &str, image_url: &str) -> Result<Self> {
    Ok(Self {
      title:     required("title", title)?,
      api_id:    required("apiId", api_id)?,
      image_url: required("imageUrl", image_url)?,
    })
  }
}

/// Partial update; `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct MovieUpdate {
  pub title:     Option<String>,
  pub api_id:    Option<String>,
  pub image_url: Option<String>,
}

impl MovieUpdate {
  pub fn parse(
    title: Option<&str>,
    api_id: Option<&str>,
    image_url: Option<&str>,
  ) -> Result<Self> {
    Ok(Self {
      title:     title.map(|v| required("title", v)).transpose()?,
      api_id:    api_id.map(|v| required("apiId", v)).transpose()?,
      image_url: image_url.map(|v| required("imageUrl", v)).transpose()?,
    })
  }
}

/// A user's favorites list with its movies, ordered by title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Favorites {
  pub id:         Uuid,
  pub user_id:    Uuid,
  pub movies:     Vec<Movie>,
  pub created_at: DateTime<Utc>,
}

impl Favorites {
  pub fn contains(&self, movie_id: Uuid) -> bool {
    self.movies.iter().any(|m| m.id == movie_id)
  }
}
