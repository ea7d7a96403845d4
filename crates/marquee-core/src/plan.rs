//! Subscription plans and the plan → profile quota table.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize};

use crate::{Error, Result};

/// The subscription tier of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
  Basic,
  Intermediary,
  Complete,
}

impl Plan {
  pub const ALL: [Plan; 3] = [Plan::Basic, Plan::Intermediary, Plan::Complete];

  pub fn as_str(self) -> &'static str {
    match self {
      Self::Basic => "basic",
      Self::Intermediary => "intermediary",
      Self::Complete => "complete",
    }
  }

  /// Monthly reference price in BRL.
  pub fn list_price(self) -> f64 {
    match self {
      Self::Basic => 18.90,
      Self::Intermediary => 39.90,
      Self::Complete => 55.90,
    }
  }
}

impl fmt::Display for Plan {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Case-insensitive: `"BASIC"`, `"Basic"` and `"basic"` all parse.
impl FromStr for Plan {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    let wanted = s.trim();
    Self::ALL
      .into_iter()
      .find(|p| p.as_str().eq_ignore_ascii_case(wanted))
      .ok_or_else(|| {
        Error::invalid(
          "plan",
          format!("{s:?} is not one of basic, intermediary, complete"),
        )
      })
  }
}

impl<'de> Deserialize<'de> for Plan {
  fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
  where
    D: Deserializer<'de>,
  {
    let raw = String::deserialize(deserializer)?;
    raw.parse().map_err(serde::de::Error::custom)
  }
}

// ─── Quota table ─────────────────────────────────────────────────────────────

/// Maximum number of profiles per plan.
///
/// Loaded from configuration so the business values can be corrected without
/// touching control flow. Every entry is floored at 1 when read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuotaTable {
  pub basic:           usize,
  pub intermediary:    usize,
  pub complete:        usize,
  /// Applies to users without a subscription.
  pub no_subscription: usize,
}

impl Default for QuotaTable {
  fn default() -> Self {
    Self { basic: 1, intermediary: 2, complete: 4, no_subscription: 1 }
  }
}

impl QuotaTable {
  /// The profile quota for `plan`; `None` means the user has no subscription.
  pub fn quota_for(&self, plan: Option<Plan>) -> usize {
    let raw = match plan {
      Some(Plan::Basic) => self.basic,
      Some(Plan::Intermediary) => self.intermediary,
      Some(Plan::Complete) => self.complete,
      None => self.no_subscription,
    };
    raw.max(1)
  }
}
