//! Profile management on top of the quota engine.
//!
//! Every mutation takes the owner's lock from [`QuotaEngine`] so that the
//! count, the conflict checks and the write happen as one step.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::{
  Error, Result,
  profile::{CreateProfileInput, Profile, ProfileUpdate, by_name, check_conflicts},
  quota::QuotaEngine,
  store::{ProfileStore, SubscriptionStore},
};

pub struct ProfileService<S> {
  engine: Arc<QuotaEngine<S>>,
}

impl<S> Clone for ProfileService<S> {
  fn clone(&self) -> Self { Self { engine: Arc::clone(&self.engine) } }
}

impl<S> ProfileService<S>
where
  S: ProfileStore + SubscriptionStore,
{
  pub fn new(engine: Arc<QuotaEngine<S>>) -> Self { Self { engine } }

  pub fn engine(&self) -> &Arc<QuotaEngine<S>> { &self.engine }

  fn store(&self) -> &S { self.engine.store() }

  /// Create a profile if the name and color are free and the quota allows it.
  ///
  /// Conflicts are reported before the quota, so a duplicate name is a
  /// conflict even when the user still has headroom.
  pub async fn create(&self, input: CreateProfileInput) -> Result<Profile> {
    let user_id = input.user_id;
    let _guard = self.engine.lock(user_id).await;

    self.engine.ensure_user(user_id).await?;
    let existing = self
      .store()
      .list_profiles(user_id)
      .await
      .map_err(Error::store)?;
    check_conflicts(&existing, Some(&input.name), Some(&input.color), None)?;

    let max = self.engine.quota_for(self.engine.plan_of(user_id).await?);
    if existing.len() >= max {
      return Err(Error::QuotaExceeded { current: existing.len(), max });
    }

    let profile = Profile {
      id: Uuid::new_v4(),
      user_id,
      name: input.name.as_str().to_owned(),
      color: input.color.as_str().to_owned(),
      created_at: Utc::now(),
    };
    let profile = self
      .store()
      .insert_profile(profile)
      .await
      .map_err(Error::store)?;
    tracing::info!(user_id = %user_id, profile_id = %profile.id, "created profile");
    Ok(profile)
  }

  /// Profiles of a user in name order.
  pub async fn list(&self, user_id: Uuid) -> Result<Vec<Profile>> {
    self.engine.ensure_user(user_id).await?;
    let mut profiles = self
      .store()
      .list_profiles(user_id)
      .await
      .map_err(Error::store)?;
    profiles.sort_by(by_name);
    Ok(profiles)
  }

  pub async fn get(&self, id: Uuid) -> Result<Profile> {
    self
      .store()
      .get_profile(id)
      .await
      .map_err(Error::store)?
      .ok_or(Error::ProfileNotFound(id))
  }

  pub async fn update(&self, id: Uuid, update: ProfileUpdate) -> Result<Profile> {
    let current = self.get(id).await?;
    if update.is_empty() {
      return Ok(current);
    }
    let _guard = self.engine.lock(current.user_id).await;

    let siblings = self
      .store()
      .list_profiles(current.user_id)
      .await
      .map_err(Error::store)?;
    check_conflicts(&siblings, update.name.as_ref(), update.color.as_ref(), Some(id))?;

    self
      .store()
      .update_profile(id, update)
      .await
      .map_err(Error::store)?
      .ok_or(Error::ProfileNotFound(id))
  }

  /// Delete a profile unless it is the owner's last one.
  pub async fn delete(&self, id: Uuid) -> Result<Profile> {
    let profile = self.get(id).await?;
    let _guard = self.engine.lock(profile.user_id).await;

    let count = self
      .store()
      .count_profiles(profile.user_id)
      .await
      .map_err(Error::store)?;
    if count <= 1 {
      return Err(Error::LastProfile);
    }
    if !self.store().delete_profile(id).await.map_err(Error::store)? {
      return Err(Error::ProfileNotFound(id));
    }
    tracing::info!(user_id = %profile.user_id, profile_id = %id, "deleted profile");
    Ok(profile)
  }
}
