//! The profile quota engine.
//!
//! Computes a user's profile quota from their subscription plan, decides
//! whether one more profile may be created, and reconciles the profile set
//! after a quota-reducing plan change by deleting the excess profiles in name
//! order.

use std::sync::Arc;

use tokio::sync::OwnedMutexGuard;
use uuid::Uuid;

use crate::{
  Error, Result,
  locks::UserLocks,
  plan::{Plan, QuotaTable},
  profile::{Admission, Enforcement, by_name},
  store::{ProfileStore, SubscriptionStore},
};

pub struct QuotaEngine<S> {
  store: Arc<S>,
  table: QuotaTable,
  locks: UserLocks,
}

impl<S> QuotaEngine<S>
where
  S: ProfileStore + SubscriptionStore,
{
  pub fn new(store: Arc<S>, table: QuotaTable) -> Self {
    Self { store, table, locks: UserLocks::new() }
  }

  pub fn store(&self) -> &Arc<S> { &self.store }

  /// Take the per-user serialization lock.
  pub async fn lock(&self, user_id: Uuid) -> OwnedMutexGuard<()> {
    self.locks.lock(user_id).await
  }

  pub fn quota_for(&self, plan: Option<Plan>) -> usize {
    self.table.quota_for(plan)
  }

  pub(crate) async fn ensure_user(&self, user_id: Uuid) -> Result<()> {
    if self.store.user_exists(user_id).await.map_err(Error::store)? {
      Ok(())
    } else {
      Err(Error::UserNotFound(user_id))
    }
  }

  /// The user's current plan, or `None` without a subscription.
  pub async fn plan_of(&self, user_id: Uuid) -> Result<Option<Plan>> {
    let subscription = self
      .store
      .get_subscription(user_id)
      .await
      .map_err(Error::store)?;
    Ok(subscription.map(|s| s.plan))
  }

  /// Read-only admission check: may `user_id` create one more profile?
  pub async fn can_create(&self, user_id: Uuid) -> Result<Admission> {
    self.ensure_user(user_id).await?;
    let plan = self.plan_of(user_id).await?;
    let current_count = self
      .store
      .count_profiles(user_id)
      .await
      .map_err(Error::store)?;
    let max_profiles = self.quota_for(plan);
    Ok(Admission {
      allowed: current_count < max_profiles,
      current_count,
      max_profiles,
      plan,
    })
  }

  /// Delete the profiles of `user_id` beyond the quota of their current plan.
  pub async fn enforce_limits(&self, user_id: Uuid) -> Result<Enforcement> {
    let _guard = self.lock(user_id).await;
    self.enforce_limits_locked(user_id).await
  }

  /// [`Self::enforce_limits`] for callers already holding the user's lock.
  pub(crate) async fn enforce_limits_locked(
    &self,
    user_id: Uuid,
  ) -> Result<Enforcement> {
    self.ensure_user(user_id).await?;
    let plan = self.plan_of(user_id).await?;
    let max = self.quota_for(plan);

    let mut kept = self
      .store
      .list_profiles(user_id)
      .await
      .map_err(Error::store)?;
    kept.sort_by(by_name);

    if kept.len() <= max {
      return Ok(Enforcement { removed: Vec::new(), kept });
    }

    let excess = kept.split_off(max);
    let mut removed = Vec::with_capacity(excess.len());
    for profile in excess {
      match self.store.delete_profile(profile.id).await {
        Ok(true) => removed.push(profile),
        Ok(false) => {
          tracing::warn!(
            user_id = %user_id,
            profile_id = %profile.id,
            "profile vanished before it could be removed"
          );
        }
        Err(e) => {
          tracing::warn!(
            user_id = %user_id,
            profile_id = %profile.id,
            error = %e,
            "failed to remove excess profile, skipping"
          );
        }
      }
    }

    tracing::info!(
      user_id = %user_id,
      plan = plan.map(Plan::as_str).unwrap_or("none"),
      max,
      removed = removed.len(),
      kept = kept.len(),
      "enforced profile limits"
    );
    Ok(Enforcement { removed, kept })
  }
}
