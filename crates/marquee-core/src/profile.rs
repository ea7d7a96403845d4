//! Profiles: the per-user viewing identities bounded by the plan quota.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result, plan::Plan};

pub const MAX_NAME_LEN: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
  pub id:         Uuid,
  pub user_id:    Uuid,
  pub name:       String,
  pub color:      String,
  pub created_at: DateTime<Utc>,
}

/// Ordering used for listings and for choosing which profiles survive a
/// downgrade: name ascending, ignoring case, then the exact name, then id.
pub fn by_name(a: &Profile, b: &Profile) -> Ordering {
  a.name
    .to_lowercase()
    .cmp(&b.name.to_lowercase())
    .then_with(|| a.name.cmp(&b.name))
    .then_with(|| a.id.cmp(&b.id))
}

// ─── Validated fields ────────────────────────────────────────────────────────

/// A trimmed profile name of 1 to [`MAX_NAME_LEN`] characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileName(String);

impl ProfileName {
  pub fn parse(raw: &str) -> Result<Self> {
    let name = raw.trim();
    let len = name.chars().count();
    if len == 0 {
      return Err(Error::invalid("name", "must have at least 1 character"));
    }
    if len > MAX_NAME_LEN {
      return Err(Error::invalid(
        "name",
        format!("must have at most {MAX_NAME_LEN} characters"),
      ));
    }
    Ok(Self(name.to_owned()))
  }

  pub fn as_str(&self) -> &str { &self.0 }

  /// Case-insensitive comparison used for per-user uniqueness.
  pub fn matches(&self, other: &str) -> bool {
    self.0.to_lowercase() == other.to_lowercase()
  }
}

/// A `#RRGGBB` color. Stored exactly as given; uniqueness is exact-match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HexColor(String);

impl HexColor {
  pub fn parse(raw: &str) -> Result<Self> {
    let color = raw.trim();
    let valid = color.len() == 7
      && color.starts_with('#')
      && color[1..].chars().all(|c| c.is_ascii_hexdigit());
    if !valid {
      return Err(Error::invalid("color", format!("{raw:?} is not in #RRGGBB format")));
    }
    Ok(Self(color.to_owned()))
  }

  pub fn as_str(&self) -> &str { &self.0 }
}

// ─── Inputs ──────────────────────────────────────────────────────────────────

/// Input to [`crate::profiles::ProfileService::create`].
#[derive(Debug, Clone)]
pub struct CreateProfileInput {
  pub user_id: Uuid,
  pub name:    ProfileName,
  pub color:   HexColor,
}

impl CreateProfileInput {
  pub fn parse(user_id: Uuid, name: &str, color: &str) -> Result<Self> {
    Ok(Self { user_id, name: ProfileName::parse(name)?, color: HexColor::parse(color)? })
  }
}

/// Partial update; `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
  pub name:  Option<ProfileName>,
  pub color: Option<HexColor>,
}

impl ProfileUpdate {
  pub fn parse(name: Option<&str>, color: Option<&str>) -> Result<Self> {
    Ok(Self {
      name:  name.map(ProfileName::parse).transpose()?,
      color: color.map(HexColor::parse).transpose()?,
    })
  }

  pub fn is_empty(&self) -> bool { self.name.is_none() && self.color.is_none() }
}

/// Reject `name` / `color` if another profile of the same user already uses
/// them. `skip` excludes the profile being edited.
pub fn check_conflicts(
  existing: &[Profile],
  name: Option<&ProfileName>,
  color: Option<&HexColor>,
  skip: Option<Uuid>,
) -> Result<()> {
  for profile in existing.iter().filter(|p| Some(p.id) != skip) {
    if let Some(name) = name
      && name.matches(&profile.name)
    {
      return Err(Error::NameConflict(name.as_str().to_owned()));
    }
    if let Some(color) = color
      && color.as_str() == profile.color
    {
      return Err(Error::ColorConflict(color.as_str().to_owned()));
    }
  }
  Ok(())
}

// ─── Engine results ──────────────────────────────────────────────────────────

/// Result of the admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Admission {
  pub allowed:       bool,
  pub current_count: usize,
  pub max_profiles:  usize,
  pub plan:          Option<Plan>,
}

/// Result of a reconciliation pass. Both lists are in name order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Enforcement {
  pub removed: Vec<Profile>,
  pub kept:    Vec<Profile>,
}

#[cfg(test)]
mod tests {
  use super::*;

  fn profile(name: &str, color: &str) -> Profile {
    Profile {
      id:         Uuid::new_v4(),
      user_id:    Uuid::nil(),
      name:       name.into(),
      color:      color.into(),
      created_at: Utc::now(),
    }
  }

  #[test]
  fn name_length_bounds() {
    assert!(ProfileName::parse("").is_err());
    assert!(ProfileName::parse("   ").is_err());
    assert!(ProfileName::parse("a").is_ok());
    assert!(ProfileName::parse(&"x".repeat(20)).is_ok());
    assert!(ProfileName::parse(&"x".repeat(21)).is_err());
    // Counted in characters, not bytes.
    assert!(ProfileName::parse("Joãozinho").is_ok());
  }

  #[test]
  fn color_format() {
    assert!(HexColor::parse("#EC4899").is_ok());
    assert!(HexColor::parse("#ec4899").is_ok());
    assert!(HexColor::parse("EC4899").is_err());
    assert!(HexColor::parse("#EC489").is_err());
    assert!(HexColor::parse("#GG4899").is_err());
  }

  #[test]
  fn name_conflict_ignores_case() {
    let existing = vec![profile("Ana", "#000000")];
    let name = ProfileName::parse("ANA").unwrap();
    let err = check_conflicts(&existing, Some(&name), None, None).unwrap_err();
    assert!(matches!(err, Error::NameConflict(_)));
  }

  #[test]
  fn color_conflict_is_exact() {
    let existing = vec![profile("Ana", "#EC4899")];
    let same = HexColor::parse("#EC4899").unwrap();
    let other_case = HexColor::parse("#ec4899").unwrap();
    assert!(matches!(
      check_conflicts(&existing, None, Some(&same), None),
      Err(Error::ColorConflict(_))
    ));
    assert!(check_conflicts(&existing, None, Some(&other_case), None).is_ok());
  }

  #[test]
  fn conflicts_skip_the_edited_profile() {
    let ana = profile("Ana", "#EC4899");
    let existing = vec![ana.clone()];
    let name = ProfileName::parse("ana").unwrap();
    assert!(check_conflicts(&existing, Some(&name), None, Some(ana.id)).is_ok());
  }

  #[test]
  fn by_name_is_case_insensitive() {
    let mut list = vec![profile("bob", "#000001"), profile("Ana", "#000002"), profile("Carl", "#000003")];
    list.sort_by(by_name);
    let names: Vec<_> = list.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, ["Ana", "bob", "Carl"]);
  }
}
