//! [`SqliteStore`]: the SQLite implementation of the Marquee store traits.

use std::path::Path;

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension as _};
use uuid::Uuid;

use marquee_core::{
  card::{Card, CardDetails},
  movie::{Favorites, Movie, MovieUpdate, NewMovie},
  profile::{Profile, ProfileUpdate},
  store::{
    Backend, CardStore, CatalogStore, ProfileStore, SubscriptionStore, UserStore,
    UserWrite,
  },
  subscription::Subscription,
  user::{NewUser, User, UserCredentials, UserUpdate},
};

use crate::{
  Error, Result,
  encode::{
    CARD_COLUMNS, MOVIE_COLUMNS, PROFILE_COLUMNS, RawCard, RawFavorites, RawMovie,
    RawProfile, RawSubscription, RawUser, SUBSCRIPTION_COLUMNS, USER_COLUMNS,
    encode_date, encode_dt, encode_uuid,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Marquee store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ── Synchronous helpers, run inside `Connection::call` ──────────────────────

fn select_user(conn: &Connection, id: &str) -> rusqlite::Result<Option<RawUser>> {
  conn
    .query_row(
      &format!("SELECT {USER_COLUMNS} FROM users WHERE user_id = ?1"),
      rusqlite::params![id],
      RawUser::from_row,
    )
    .optional()
}

fn select_profile(conn: &Connection, id: &str) -> rusqlite::Result<Option<RawProfile>> {
  conn
    .query_row(
      &format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE profile_id = ?1"),
      rusqlite::params![id],
      RawProfile::from_row,
    )
    .optional()
}

fn select_card(conn: &Connection, id: &str) -> rusqlite::Result<Option<RawCard>> {
  conn
    .query_row(
      &format!("SELECT {CARD_COLUMNS} FROM cards WHERE card_id = ?1"),
      rusqlite::params![id],
      RawCard::from_row,
    )
    .optional()
}

fn select_movie(conn: &Connection, id: &str) -> rusqlite::Result<Option<RawMovie>> {
  conn
    .query_row(
      &format!("SELECT {MOVIE_COLUMNS} FROM movies WHERE movie_id = ?1"),
      rusqlite::params![id],
      RawMovie::from_row,
    )
    .optional()
}

/// Movies linked to a favorites list, by title.
fn select_favorite_movies(
  conn: &Connection,
  favorites_id: &str,
) -> rusqlite::Result<Vec<RawMovie>> {
  let mut stmt = conn.prepare(
    "SELECT m.movie_id, m.title, m.api_id, m.image_url, m.created_at
     FROM favorite_movies fm
     JOIN movies m ON m.movie_id = fm.movie_id
     WHERE fm.favorites_id = ?1
     ORDER BY m.title COLLATE NOCASE, m.movie_id",
  )?;
  stmt
    .query_map(rusqlite::params![favorites_id], RawMovie::from_row)?
    .collect()
}

/// Favorites lists, optionally restricted to one user, with their movies.
fn select_favorites(
  conn: &Connection,
  user_id: Option<&str>,
) -> rusqlite::Result<Vec<RawFavorites>> {
  let mut stmt = conn.prepare(
    "SELECT favorites_id, user_id, created_at FROM favorites
     WHERE ?1 IS NULL OR user_id = ?1
     ORDER BY created_at",
  )?;
  let heads = stmt
    .query_map(rusqlite::params![user_id], |row| {
      Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?, row.get::<_, String>(2)?))
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  heads
    .into_iter()
    .map(|(favorites_id, user_id, created_at)| {
      let movies = select_favorite_movies(conn, &favorites_id)?;
      Ok(RawFavorites { favorites_id, user_id, created_at, movies })
    })
    .collect()
}

/// Create the user's favorites row unless it exists.
fn ensure_favorites_row(conn: &Connection, user_id: &str) -> rusqlite::Result<String> {
  conn.execute(
    "INSERT OR IGNORE INTO favorites (favorites_id, user_id, created_at)
     VALUES (?1, ?2, ?3)",
    rusqlite::params![encode_uuid(Uuid::new_v4()), user_id, encode_dt(Utc::now())],
  )?;
  conn.query_row(
    "SELECT favorites_id FROM favorites WHERE user_id = ?1",
    rusqlite::params![user_id],
    |row| row.get(0),
  )
}

// ─── Trait impls ─────────────────────────────────────────────────────────────

impl Backend for SqliteStore {
  type Error = Error;
}

// ── Users ───────────────────────────────────────────────────────────────────

/// `Ok(false)` when a write lost the `users.email` unique constraint.
fn email_claimed(outcome: rusqlite::Result<usize>) -> tokio_rusqlite::Result<bool> {
  match outcome {
    Ok(_) => Ok(true),
    Err(rusqlite::Error::SqliteFailure(err, Some(msg)))
      if err.code == rusqlite::ErrorCode::ConstraintViolation
        && msg.contains("users.email") =>
    {
      Ok(false)
    }
    Err(e) => Err(e.into()),
  }
}

impl UserStore for SqliteStore {
  async fn insert_user(&self, input: NewUser) -> Result<UserWrite> {
    let reg = input.registration;
    let user = User {
      id:         Uuid::new_v4(),
      email:      reg.email.into_inner(),
      firstname:  reg.firstname,
      lastname:   reg.lastname,
      phone:      reg.phone,
      address:    reg.address,
      created_at: Utc::now(),
    };

    let id_str = encode_uuid(user.id);
    let at_str = encode_dt(user.created_at);
    let row = user.clone();
    let hash = input.password_hash;

    let inserted = self
      .conn
      .call(move |conn| {
        let outcome = conn.execute(
          "INSERT INTO users (
             user_id, email, password_hash, firstname, lastname, phone, address, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
          rusqlite::params![
            id_str,
            row.email,
            hash,
            row.firstname,
            row.lastname,
            row.phone,
            row.address,
            at_str,
          ],
        );
        email_claimed(outcome)
      })
      .await?;

    Ok(if inserted { UserWrite::Saved(user) } else { UserWrite::EmailTaken })
  }

  async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
    let id_str = encode_uuid(id);
    let raw = self
      .conn
      .call(move |conn| Ok(select_user(conn, &id_str)?))
      .await?;
    raw.map(RawUser::into_user).transpose()
  }

  async fn find_credentials(&self, email: String) -> Result<Option<UserCredentials>> {
    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1"),
            rusqlite::params![email],
            RawUser::from_row,
          )
          .optional()?)
      })
      .await?;
    raw.map(RawUser::into_credentials).transpose()
  }

  async fn update_user(&self, id: Uuid, update: UserUpdate) -> Result<Option<UserWrite>> {
    let Some(mut user) = self.get_user(id).await? else {
      return Ok(None);
    };
    update.apply(&mut user);

    let id_str = encode_uuid(id);
    let row = user.clone();
    let updated = self
      .conn
      .call(move |conn| {
        let outcome = conn.execute(
          "UPDATE users
           SET email = ?2, firstname = ?3, lastname = ?4, phone = ?5, address = ?6
           WHERE user_id = ?1",
          rusqlite::params![
            id_str,
            row.email,
            row.firstname,
            row.lastname,
            row.phone,
            row.address,
          ],
        );
        email_claimed(outcome)
      })
      .await?;

    Ok(Some(if updated { UserWrite::Saved(user) } else { UserWrite::EmailTaken }))
  }
}

// ── Subscriptions ───────────────────────────────────────────────────────────

impl SubscriptionStore for SqliteStore {
  async fn get_subscription(&self, user_id: Uuid) -> Result<Option<Subscription>> {
    let id_str = encode_uuid(user_id);
    let raw: Option<RawSubscription> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions WHERE user_id = ?1"),
            rusqlite::params![id_str],
            RawSubscription::from_row,
          )
          .optional()?)
      })
      .await?;
    raw.map(RawSubscription::into_subscription).transpose()
  }

  async fn list_subscriptions(&self) -> Result<Vec<Subscription>> {
    let raws: Vec<RawSubscription> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions ORDER BY registered_at DESC"
        ))?;
        let rows = stmt
          .query_map([], RawSubscription::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(RawSubscription::into_subscription).collect()
  }

  async fn save_subscription(&self, subscription: Subscription) -> Result<Subscription> {
    let id_str         = encode_uuid(subscription.id);
    let user_id_str    = encode_uuid(subscription.user_id);
    let plan_str       = subscription.plan.as_str();
    let value          = subscription.value;
    let registered_str = encode_dt(subscription.registered_at);
    let expires_str    = encode_dt(subscription.expires_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO subscriptions (
             subscription_id, user_id, plan, value, registered_at, expires_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
           ON CONFLICT (user_id) DO UPDATE SET
             subscription_id = excluded.subscription_id,
             plan            = excluded.plan,
             value           = excluded.value,
             registered_at   = excluded.registered_at,
             expires_at      = excluded.expires_at",
          rusqlite::params![
            id_str,
            user_id_str,
            plan_str,
            value,
            registered_str,
            expires_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(subscription)
  }

  async fn delete_subscription(&self, user_id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(user_id);
    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM subscriptions WHERE user_id = ?1",
          rusqlite::params![id_str],
        )?)
      })
      .await?;
    Ok(changed > 0)
  }
}

// ── Profiles ────────────────────────────────────────────────────────────────

impl ProfileStore for SqliteStore {
  async fn user_exists(&self, user_id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(user_id);
    let exists = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT 1 FROM users WHERE user_id = ?1",
            rusqlite::params![id_str],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false))
      })
      .await?;
    Ok(exists)
  }

  async fn count_profiles(&self, user_id: Uuid) -> Result<usize> {
    let id_str = encode_uuid(user_id);
    let count: i64 = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT COUNT(*) FROM profiles WHERE user_id = ?1",
          rusqlite::params![id_str],
          |row| row.get(0),
        )?)
      })
      .await?;
    Ok(usize::try_from(count).unwrap_or_default())
  }

  async fn list_profiles(&self, user_id: Uuid) -> Result<Vec<Profile>> {
    let id_str = encode_uuid(user_id);
    let raws: Vec<RawProfile> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {PROFILE_COLUMNS} FROM profiles
           WHERE user_id = ?1
           ORDER BY name COLLATE NOCASE, name, profile_id"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], RawProfile::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(RawProfile::into_profile).collect()
  }

  async fn get_profile(&self, id: Uuid) -> Result<Option<Profile>> {
    let id_str = encode_uuid(id);
    let raw = self
      .conn
      .call(move |conn| Ok(select_profile(conn, &id_str)?))
      .await?;
    raw.map(RawProfile::into_profile).transpose()
  }

  async fn insert_profile(&self, profile: Profile) -> Result<Profile> {
    let id_str      = encode_uuid(profile.id);
    let user_id_str = encode_uuid(profile.user_id);
    let name        = profile.name.clone();
    let color       = profile.color.clone();
    let at_str      = encode_dt(profile.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO profiles (profile_id, user_id, name, color, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![id_str, user_id_str, name, color, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(profile)
  }

  async fn update_profile(&self, id: Uuid, update: ProfileUpdate) -> Result<Option<Profile>> {
    let id_str = encode_uuid(id);
    let name   = update.name.map(|n| n.as_str().to_owned());
    let color  = update.color.map(|c| c.as_str().to_owned());

    let raw = self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE profiles
           SET name = COALESCE(?2, name), color = COALESCE(?3, color)
           WHERE profile_id = ?1",
          rusqlite::params![id_str, name, color],
        )?;
        Ok(select_profile(conn, &id_str)?)
      })
      .await?;
    raw.map(RawProfile::into_profile).transpose()
  }

  async fn delete_profile(&self, id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(id);
    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM profiles WHERE profile_id = ?1",
          rusqlite::params![id_str],
        )?)
      })
      .await?;
    Ok(changed > 0)
  }
}

// ── Cards ───────────────────────────────────────────────────────────────────

impl CardStore for SqliteStore {
  async fn insert_card(&self, user_id: Uuid, details: CardDetails) -> Result<Card> {
    let card = Card {
      id:              Uuid::new_v4(),
      user_id,
      name:            details.name,
      number:          details.number,
      expiration_date: details.expiration_date,
      security_code:   details.security_code,
      created_at:      Utc::now(),
    };

    let id_str      = encode_uuid(card.id);
    let user_id_str = encode_uuid(user_id);
    let expiry_str  = encode_date(card.expiration_date);
    let at_str      = encode_dt(card.created_at);
    let row         = card.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO cards (
             card_id, user_id, name, number, expiration_date, security_code, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          rusqlite::params![
            id_str,
            user_id_str,
            row.name,
            row.number,
            expiry_str,
            row.security_code,
            at_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(card)
  }

  async fn update_card(&self, id: Uuid, details: CardDetails) -> Result<Option<Card>> {
    let id_str     = encode_uuid(id);
    let expiry_str = encode_date(details.expiration_date);

    let raw = self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE cards
           SET name = ?2, number = ?3, expiration_date = ?4, security_code = ?5
           WHERE card_id = ?1",
          rusqlite::params![
            id_str,
            details.name,
            details.number,
            expiry_str,
            details.security_code,
          ],
        )?;
        Ok(select_card(conn, &id_str)?)
      })
      .await?;
    raw.map(RawCard::into_card).transpose()
  }

  async fn list_cards(&self, user_id: Option<Uuid>) -> Result<Vec<Card>> {
    let user_id_str = user_id.map(encode_uuid);
    let raws: Vec<RawCard> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {CARD_COLUMNS} FROM cards
           WHERE ?1 IS NULL OR user_id = ?1
           ORDER BY created_at"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![user_id_str], RawCard::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(RawCard::into_card).collect()
  }

  async fn delete_card(&self, id: Uuid) -> Result<Option<Card>> {
    let id_str = encode_uuid(id);
    let raw = self
      .conn
      .call(move |conn| {
        let existing = select_card(conn, &id_str)?;
        if existing.is_some() {
          conn.execute("DELETE FROM cards WHERE card_id = ?1", rusqlite::params![id_str])?;
        }
        Ok(existing)
      })
      .await?;
    raw.map(RawCard::into_card).transpose()
  }
}

// ── Movies & favorites ──────────────────────────────────────────────────────

impl CatalogStore for SqliteStore {
  async fn insert_movie(&self, input: NewMovie) -> Result<Movie> {
    let movie = Movie {
      id:         Uuid::new_v4(),
      title:      input.title,
      api_id:     input.api_id,
      image_url:  input.image_url,
      created_at: Utc::now(),
    };

    let id_str = encode_uuid(movie.id);
    let at_str = encode_dt(movie.created_at);
    let row    = movie.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO movies (movie_id, title, api_id, image_url, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![id_str, row.title, row.api_id, row.image_url, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(movie)
  }

  async fn get_movie(&self, id: Uuid) -> Result<Option<Movie>> {
    let id_str = encode_uuid(id);
    let raw = self
      .conn
      .call(move |conn| Ok(select_movie(conn, &id_str)?))
      .await?;
    raw.map(RawMovie::into_movie).transpose()
  }

  async fn list_movies(&self) -> Result<Vec<Movie>> {
    let raws: Vec<RawMovie> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {MOVIE_COLUMNS} FROM movies ORDER BY title COLLATE NOCASE, movie_id"
        ))?;
        let rows = stmt
          .query_map([], RawMovie::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(RawMovie::into_movie).collect()
  }

  async fn update_movie(&self, id: Uuid, update: MovieUpdate) -> Result<Option<Movie>> {
    let id_str = encode_uuid(id);
    let raw = self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE movies
           SET title     = COALESCE(?2, title),
               api_id    = COALESCE(?3, api_id),
               image_url = COALESCE(?4, image_url)
           WHERE movie_id = ?1",
          rusqlite::params![id_str, update.title, update.api_id, update.image_url],
        )?;
        Ok(select_movie(conn, &id_str)?)
      })
      .await?;
    raw.map(RawMovie::into_movie).transpose()
  }

  async fn delete_movie(&self, id: Uuid) -> Result<Option<Movie>> {
    let id_str = encode_uuid(id);
    let raw = self
      .conn
      .call(move |conn| {
        let existing = select_movie(conn, &id_str)?;
        if existing.is_some() {
          conn.execute("DELETE FROM movies WHERE movie_id = ?1", rusqlite::params![id_str])?;
        }
        Ok(existing)
      })
      .await?;
    raw.map(RawMovie::into_movie).transpose()
  }

  async fn ensure_favorites(&self, user_id: Uuid) -> Result<Favorites> {
    let id_str = encode_uuid(user_id);
    let raws = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        ensure_favorites_row(&tx, &id_str)?;
        let raws = select_favorites(&tx, Some(&id_str))?;
        tx.commit()?;
        Ok(raws)
      })
      .await?;
    raws
      .into_iter()
      .next()
      .ok_or(Error::Decode { column: "favorites", value: user_id.to_string() })?
      .into_favorites()
  }

  async fn get_favorites(&self, user_id: Uuid) -> Result<Option<Favorites>> {
    let id_str = encode_uuid(user_id);
    let raws = self
      .conn
      .call(move |conn| Ok(select_favorites(conn, Some(&id_str))?))
      .await?;
    raws.into_iter().next().map(RawFavorites::into_favorites).transpose()
  }

  async fn list_favorites(&self) -> Result<Vec<Favorites>> {
    let raws = self
      .conn
      .call(|conn| Ok(select_favorites(conn, None)?))
      .await?;
    raws.into_iter().map(RawFavorites::into_favorites).collect()
  }

  async fn add_favorite(&self, user_id: Uuid, movie_id: Uuid) -> Result<()> {
    let user_id_str  = encode_uuid(user_id);
    let movie_id_str = encode_uuid(movie_id);
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let favorites_id = ensure_favorites_row(&tx, &user_id_str)?;
        tx.execute(
          "INSERT OR IGNORE INTO favorite_movies (favorites_id, movie_id, added_at)
           VALUES (?1, ?2, ?3)",
          rusqlite::params![favorites_id, movie_id_str, encode_dt(Utc::now())],
        )?;
        tx.commit()?;
        Ok(())
      })
      .await?;
    tracing::debug!(user_id = %user_id, movie_id = %movie_id, "linked favorite");
    Ok(())
  }

  async fn remove_favorite(&self, user_id: Uuid, movie_id: Uuid) -> Result<bool> {
    let user_id_str  = encode_uuid(user_id);
    let movie_id_str = encode_uuid(movie_id);
    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM favorite_movies
           WHERE movie_id = ?2
             AND favorites_id = (SELECT favorites_id FROM favorites WHERE user_id = ?1)",
          rusqlite::params![user_id_str, movie_id_str],
        )?)
      })
      .await?;
    Ok(changed > 0)
  }
}
