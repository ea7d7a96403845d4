//! Stored payment cards.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result, user::required};

/// A payment card on file. The security code is kept for the billing
/// collaborator but never leaves the service in a response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
  pub id:              Uuid,
  pub user_id:         Uuid,
  pub name:            String,
  pub number:          String,
  pub expiration_date: NaiveDate,
  #[serde(skip_serializing, default)]
  pub security_code:   String,
  pub created_at:      DateTime<Utc>,
}

impl Card {
  /// The number with all but the last four digits replaced by `*`.
  pub fn masked_number(&self) -> String {
    let visible = self.number.len().saturating_sub(4);
    self
      .number
      .chars()
      .enumerate()
      .map(|(i, c)| if i < visible { '*' } else { c })
      .collect()
  }
}

/// Validated card fields, used for both creation and edits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardDetails {
  pub name:            String,
  pub number:          String,
  pub expiration_date: NaiveDate,
  pub security_code:   String,
}

fn digits(field: &'static str, raw: &str, min: usize, max: usize) -> Result<String> {
  let value: String = raw.chars().filter(|c| !matches!(c, ' ' | '-')).collect();
  if !value.chars().all(|c| c.is_ascii_digit()) {
    return Err(Error::invalid(field, "must contain only digits"));
  }
  if !(min..=max).contains(&value.len()) {
    return Err(Error::invalid(field, format!("must have {min} to {max} digits")));
  }
  Ok(value)
}

impl CardDetails {
  /// `expiration_date` is `YYYY-MM-DD`. Spaces and dashes in the number are
  /// ignored.
  pub fn parse(
    name: &str,
    number: &str,
    expiration_date: &str,
    security_code: &str,
  ) -> Result<Self> {
    let expiration_date = NaiveDate::parse_from_str(expiration_date.trim(), "%Y-%m-%d")
      .map_err(|e| Error::invalid("expirationDate", e.to_string()))?;
    Ok(Self {
      name: required("name", name)?,
      number: digits("number", number, 12, 19)?,
      expiration_date,
      security_code: digits("securityCode", security_code.trim(), 3, 4)?,
    })
  }
}
