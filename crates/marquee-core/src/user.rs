//! Users and the validated inputs used to register and edit them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

pub const MIN_PASSWORD_LEN: usize = 6;

/// A registered account. Never carries the password hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
  pub id:         Uuid,
  pub email:      String,
  pub firstname:  String,
  pub lastname:   String,
  pub phone:      String,
  pub address:    String,
  pub created_at: DateTime<Utc>,
}

/// A user together with the stored argon2 PHC string, for credential checks.
#[derive(Debug, Clone)]
pub struct UserCredentials {
  pub user:          User,
  pub password_hash: String,
}

// ─── Email ───────────────────────────────────────────────────────────────────

/// A trimmed, lowercased email address.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Email(String);

impl Email {
  pub fn parse(raw: &str) -> Result<Self> {
    let email = raw.trim().to_lowercase();
    let valid = match email.split_once('@') {
      Some((local, domain)) => {
        !local.is_empty()
          && !domain.contains('@')
          && domain.contains('.')
          && !domain.starts_with('.')
          && !domain.ends_with('.')
          && !email.chars().any(char::is_whitespace)
      }
      None => false,
    };
    if !valid {
      return Err(Error::invalid("email", format!("{raw:?} is not a valid address")));
    }
    Ok(Self(email))
  }

  pub fn as_str(&self) -> &str { &self.0 }

  pub fn into_inner(self) -> String { self.0 }
}

/// Trim `value` and reject it if nothing is left.
pub fn required(field: &'static str, value: &str) -> Result<String> {
  let trimmed = value.trim();
  if trimmed.is_empty() {
    return Err(Error::invalid(field, "must not be empty"));
  }
  Ok(trimmed.to_owned())
}

pub fn check_password(password: &str) -> Result<()> {
  if password.chars().count() < MIN_PASSWORD_LEN {
    return Err(Error::invalid(
      "password",
      format!("must have at least {MIN_PASSWORD_LEN} characters"),
    ));
  }
  Ok(())
}

// ─── Inputs ──────────────────────────────────────────────────────────────────

/// Profile data of a new account; the password is hashed by the caller.
#[derive(Debug, Clone)]
pub struct Registration {
  pub email:     Email,
  pub firstname: String,
  pub lastname:  String,
  pub phone:     String,
  pub address:   String,
}

impl Registration {
  pub fn parse(
    email: &str,
    firstname: &str,
    lastname: &str,
    phone: &str,
    address: &str,
  ) -> Result<Self> {
    Ok(Self {
      email:     Email::parse(email)?,
      firstname: required("firstname", firstname)?,
      lastname:  required("lastname", lastname)?,
      phone:     required("phone", phone)?,
      address:   required("address", address)?,
    })
  }
}

/// Input to [`crate::store::UserStore::insert_user`].
#[derive(Debug, Clone)]
pub struct NewUser {
  pub registration:  Registration,
  pub password_hash: String,
}

/// Partial update; `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
  pub email:     Option<Email>,
  pub firstname: Option<String>,
  pub lastname:  Option<String>,
  pub phone:     Option<String>,
  pub address:   Option<String>,
}

impl UserUpdate {
  pub fn parse(
    email: Option<&str>,
    firstname: Option<&str>,
    lastname: Option<&str>,
    phone: Option<&str>,
    address: Option<&str>,
  ) -> Result<Self> {
    Ok(Self {
      email:     email.map(Email::parse).transpose()?,
      firstname: firstname.map(|v| required("firstname", v)).transpose()?,
      lastname:  lastname.map(|v| required("lastname", v)).transpose()?,
      phone:     phone.map(|v| required("phone", v)).transpose()?,
      address:   address.map(|v| required("address", v)).transpose()?,
    })
  }

  pub fn apply(self, user: &mut User) {
    if let Some(email) = self.email {
      user.email = email.into_inner();
    }
    if let Some(v) = self.firstname {
      user.firstname = v;
    }
    if let Some(v) = self.lastname {
      user.lastname = v;
    }
    if let Some(v) = self.phone {
      user.phone = v;
    }
    if let Some(v) = self.address {
      user.address = v;
    }
  }
}
