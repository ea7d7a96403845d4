//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 strings, card expiry dates are `YYYY-MM-DD`, UUIDs
//! are hyphenated lowercase strings and plans are their lowercase names.

use chrono::{DateTime, NaiveDate, Utc};
use marquee_core::{
  card::Card,
  movie::{Favorites, Movie},
  plan::Plan,
  profile::Profile,
  subscription::Subscription,
  user::{User, UserCredentials},
};
use rusqlite::Row;
use uuid::Uuid;

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| Error::DateParse(e.to_string()))
}

pub fn decode_plan(s: &str) -> Result<Plan> {
  s.parse().map_err(|_| Error::Decode { column: "plan", value: s.to_owned() })
}

// ─── Row types ───────────────────────────────────────────────────────────────

pub const USER_COLUMNS: &str =
  "user_id, email, firstname, lastname, phone, address, created_at, password_hash";

/// Raw strings read from a `users` row, selected with [`USER_COLUMNS`].
pub struct RawUser {
  pub user_id:       String,
  pub email:         String,
  pub firstname:     String,
  pub lastname:      String,
  pub phone:         String,
  pub address:       String,
  pub created_at:    String,
  pub password_hash: String,
}

impl RawUser {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      user_id:       row.get(0)?,
      email:         row.get(1)?,
      firstname:     row.get(2)?,
      lastname:      row.get(3)?,
      phone:         row.get(4)?,
      address:       row.get(5)?,
      created_at:    row.get(6)?,
      password_hash: row.get(7)?,
    })
  }

  pub fn into_credentials(self) -> Result<UserCredentials> {
    Ok(UserCredentials {
      user:          User {
        id:         decode_uuid(&self.user_id)?,
        email:      self.email,
        firstname:  self.firstname,
        lastname:   self.lastname,
        phone:      self.phone,
        address:    self.address,
        created_at: decode_dt(&self.created_at)?,
      },
      password_hash: self.password_hash,
    })
  }

  pub fn into_user(self) -> Result<User> { Ok(self.into_credentials()?.user) }
}

pub const SUBSCRIPTION_COLUMNS: &str =
  "subscription_id, user_id, plan, value, registered_at, expires_at";

pub struct RawSubscription {
  pub subscription_id: String,
  pub user_id:         String,
  pub plan:            String,
  pub value:           f64,
  pub registered_at:   String,
  pub expires_at:      String,
}

impl RawSubscription {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      subscription_id: row.get(0)?,
      user_id:         row.get(1)?,
      plan:            row.get(2)?,
      value:           row.get(3)?,
      registered_at:   row.get(4)?,
      expires_at:      row.get(5)?,
    })
  }

  pub fn into_subscription(self) -> Result<Subscription> {
    Ok(Subscription {
      id:            decode_uuid(&self.subscription_id)?,
      user_id:       decode_uuid(&self.user_id)?,
      plan:          decode_plan(&self.plan)?,
      value:         self.value,
      registered_at: decode_dt(&self.registered_at)?,
      expires_at:    decode_dt(&self.expires_at)?,
    })
  }
}

pub const PROFILE_COLUMNS: &str = "profile_id, user_id, name, color, created_at";

pub struct RawProfile {
  pub profile_id: String,
  pub user_id:    String,
  pub name:       String,
  pub color:      String,
  pub created_at: String,
}

impl RawProfile {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      profile_id: row.get(0)?,
      user_id:    row.get(1)?,
      name:       row.get(2)?,
      color:      row.get(3)?,
      created_at: row.get(4)?,
    })
  }

  pub fn into_profile(self) -> Result<Profile> {
    Ok(Profile {
      id:         decode_uuid(&self.profile_id)?,
      user_id:    decode_uuid(&self.user_id)?,
      name:       self.name,
      color:      self.color,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

pub const CARD_COLUMNS: &str =
  "card_id, user_id, name, number, expiration_date, security_code, created_at";

pub struct RawCard {
  pub card_id:         String,
  pub user_id:         String,
  pub name:            String,
  pub number:          String,
  pub expiration_date: String,
  pub security_code:   String,
  pub created_at:      String,
}

impl RawCard {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      card_id:         row.get(0)?,
      user_id:         row.get(1)?,
      name:            row.get(2)?,
      number:          row.get(3)?,
      expiration_date: row.get(4)?,
      security_code:   row.get(5)?,
      created_at:      row.get(6)?,
    })
  }

  pub fn into_card(self) -> Result<Card> {
    Ok(Card {
      id:              decode_uuid(&self.card_id)?,
      user_id:         decode_uuid(&self.user_id)?,
      name:            self.name,
      number:          self.number,
      expiration_date: decode_date(&self.expiration_date)?,
      security_code:   self.security_code,
      created_at:      decode_dt(&self.created_at)?,
    })
  }
}

pub const MOVIE_COLUMNS: &str = "movie_id, title, api_id, image_url, created_at";

pub struct RawMovie {
  pub movie_id:   String,
  pub title:      String,
  pub api_id:     String,
  pub image_url:  String,
  pub created_at: String,
}

impl RawMovie {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      movie_id:   row.get(0)?,
      title:      row.get(1)?,
      api_id:     row.get(2)?,
      image_url:  row.get(3)?,
      created_at: row.get(4)?,
    })
  }

  pub fn into_movie(self) -> Result<Movie> {
    Ok(Movie {
      id:         decode_uuid(&self.movie_id)?,
      title:      self.title,
      api_id:     self.api_id,
      image_url:  self.image_url,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

/// A `favorites` row together with its linked movies.
pub struct RawFavorites {
  pub favorites_id: String,
  pub user_id:      String,
  pub created_at:   String,
  pub movies:       Vec<RawMovie>,
}

impl RawFavorites {
  pub fn into_favorites(self) -> Result<Favorites> {
    Ok(Favorites {
      id:         decode_uuid(&self.favorites_id)?,
      user_id:    decode_uuid(&self.user_id)?,
      movies:     self
        .movies
        .into_iter()
        .map(RawMovie::into_movie)
        .collect::<Result<_>>()?,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}
