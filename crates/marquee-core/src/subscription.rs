//! Subscriptions and their lifecycle.
//!
//! A user has at most one subscription. Any write that sets the plan runs the
//! quota engine afterwards, under the same user lock, so a downgrade never
//! leaves more profiles than the new plan allows.

use std::sync::Arc;

use chrono::{DateTime, Months, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Error, Result,
  plan::Plan,
  quota::QuotaEngine,
  store::{ProfileStore, SubscriptionStore},
};

/// Length of a subscription term when none is given.
pub const DEFAULT_TERM_MONTHS: u32 = 12;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
  pub id:            Uuid,
  pub user_id:       Uuid,
  pub plan:          Plan,
  pub value:         f64,
  pub registered_at: DateTime<Utc>,
  pub expires_at:    DateTime<Utc>,
}

impl Subscription {
  pub fn is_active(&self, now: DateTime<Utc>) -> bool { self.expires_at > now }
}

fn check_value(value: f64) -> Result<f64> {
  if value.is_finite() && value > 0.0 {
    Ok(value)
  } else {
    Err(Error::invalid("value", "must be a positive amount"))
  }
}

fn add_months(from: DateTime<Utc>, months: u32) -> Result<DateTime<Utc>> {
  from
    .checked_add_months(Months::new(months))
    .ok_or_else(|| Error::invalid("expiresAt", "out of range"))
}

// ─── Inputs ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NewSubscription {
  pub plan:  Plan,
  pub value: f64,
}

impl NewSubscription {
  pub fn parse(plan: &str, value: f64) -> Result<Self> {
    Ok(Self { plan: plan.parse()?, value: check_value(value)? })
  }
}

/// Partial update; `None` fields are left untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SubscriptionUpdate {
  pub plan:  Option<Plan>,
  pub value: Option<f64>,
}

impl SubscriptionUpdate {
  pub fn parse(plan: Option<&str>, value: Option<f64>) -> Result<Self> {
    Ok(Self {
      plan:  plan.map(str::parse).transpose()?,
      value: value.map(check_value).transpose()?,
    })
  }
}

impl From<NewSubscription> for SubscriptionUpdate {
  fn from(input: NewSubscription) -> Self {
    Self { plan: Some(input.plan), value: Some(input.value) }
  }
}

/// Summary returned by [`SubscriptionService::status`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionStatus {
  pub has_subscription:  bool,
  pub is_active:         bool,
  pub plan:              Option<Plan>,
  pub expires_at:        Option<DateTime<Utc>>,
  pub days_until_expiry: i64,
}

impl SubscriptionStatus {
  pub fn of(subscription: Option<&Subscription>, now: DateTime<Utc>) -> Self {
    let Some(sub) = subscription else {
      return Self {
        has_subscription:  false,
        is_active:         false,
        plan:              None,
        expires_at:        None,
        days_until_expiry: 0,
      };
    };
    let secs = (sub.expires_at - now).num_seconds();
    let days = if secs > 0 { (secs + 86_399) / 86_400 } else { 0 };
    Self {
      has_subscription:  true,
      is_active:         sub.is_active(now),
      plan:              Some(sub.plan),
      expires_at:        Some(sub.expires_at),
      days_until_expiry: days,
    }
  }
}

// ─── Service ─────────────────────────────────────────────────────────────────

pub struct SubscriptionService<S> {
  engine: Arc<QuotaEngine<S>>,
}

impl<S> Clone for SubscriptionService<S> {
  fn clone(&self) -> Self { Self { engine: Arc::clone(&self.engine) } }
}

impl<S> SubscriptionService<S>
where
  S: ProfileStore + SubscriptionStore,
{
  pub fn new(engine: Arc<QuotaEngine<S>>) -> Self { Self { engine } }

  fn store(&self) -> &S { self.engine.store() }

  async fn current(&self, user_id: Uuid) -> Result<Option<Subscription>> {
    self
      .store()
      .get_subscription(user_id)
      .await
      .map_err(Error::store)
  }

  pub async fn get(&self, user_id: Uuid) -> Result<Subscription> {
    self
      .current(user_id)
      .await?
      .ok_or(Error::SubscriptionNotFound(user_id))
  }

  /// All subscriptions, most recently registered first.
  pub async fn list(&self) -> Result<Vec<Subscription>> {
    let mut all = self
      .store()
      .list_subscriptions()
      .await
      .map_err(Error::store)?;
    all.sort_by(|a, b| b.registered_at.cmp(&a.registered_at));
    Ok(all)
  }

  /// Subscribe `user_id`. An existing subscription is updated instead.
  pub async fn create(
    &self,
    user_id: Uuid,
    input: NewSubscription,
  ) -> Result<Subscription> {
    self.upsert(user_id, input).await
  }

  /// Create or replace the plan and value of the user's subscription.
  pub async fn upsert(
    &self,
    user_id: Uuid,
    input: NewSubscription,
  ) -> Result<Subscription> {
    let _guard = self.engine.lock(user_id).await;
    self.engine.ensure_user(user_id).await?;
    let current = self.current(user_id).await?;
    self.write_locked(user_id, current, input.into()).await
  }

  /// Change the plan and/or value. Without a subscription both fields are
  /// required, otherwise the input is rejected as invalid.
  pub async fn update(
    &self,
    user_id: Uuid,
    update: SubscriptionUpdate,
  ) -> Result<Subscription> {
    let _guard = self.engine.lock(user_id).await;
    self.engine.ensure_user(user_id).await?;
    let current = self.current(user_id).await?;
    self.write_locked(user_id, current, update).await
  }

  /// Cancel the subscription; the user falls back to the no-plan quota.
  /// Returns the subscription as it was before deletion.
  pub async fn remove(&self, user_id: Uuid) -> Result<Subscription> {
    let _guard = self.engine.lock(user_id).await;
    let existing = self.get(user_id).await?;
    let deleted = self
      .store()
      .delete_subscription(user_id)
      .await
      .map_err(Error::store)?;
    if !deleted {
      return Err(Error::SubscriptionNotFound(user_id));
    }
    tracing::info!(user_id = %user_id, plan = %existing.plan, "cancelled subscription");
    self.engine.enforce_limits_locked(user_id).await?;
    Ok(existing)
  }

  /// Extend the subscription by `months`, counting from the current expiry
  /// or from `now` if it already lapsed.
  pub async fn renew(&self, user_id: Uuid, months: u32) -> Result<Subscription> {
    if months == 0 {
      return Err(Error::invalid("months", "must be at least 1"));
    }
    let _guard = self.engine.lock(user_id).await;
    let mut sub = self.get(user_id).await?;
    let base = sub.expires_at.max(Utc::now());
    sub.expires_at = add_months(base, months)?;
    let sub = self
      .store()
      .save_subscription(sub)
      .await
      .map_err(Error::store)?;
    tracing::info!(user_id = %user_id, months, expires_at = %sub.expires_at, "renewed subscription");
    Ok(sub)
  }

  pub async fn status(
    &self,
    user_id: Uuid,
    now: DateTime<Utc>,
  ) -> Result<SubscriptionStatus> {
    self.engine.ensure_user(user_id).await?;
    let current = self.current(user_id).await?;
    Ok(SubscriptionStatus::of(current.as_ref(), now))
  }

  async fn write_locked(
    &self,
    user_id: Uuid,
    current: Option<Subscription>,
    update: SubscriptionUpdate,
  ) -> Result<Subscription> {
    let now = Utc::now();
    let next = match current {
      Some(mut sub) => {
        if let Some(plan) = update.plan {
          sub.plan = plan;
          sub.expires_at = add_months(now, DEFAULT_TERM_MONTHS)?;
        }
        if let Some(value) = update.value {
          sub.value = value;
        }
        sub
      }
      None => {
        let (Some(plan), Some(value)) = (update.plan, update.value) else {
          return Err(Error::invalid(
            "plan",
            "plan and value are both required to start a subscription",
          ));
        };
        Subscription {
          id: Uuid::new_v4(),
          user_id,
          plan,
          value,
          registered_at: now,
          expires_at: add_months(now, DEFAULT_TERM_MONTHS)?,
        }
      }
    };

    let saved = self
      .store()
      .save_subscription(next)
      .await
      .map_err(Error::store)?;
    tracing::info!(user_id = %user_id, plan = %saved.plan, "saved subscription");

    if update.plan.is_some() {
      self.engine.enforce_limits_locked(user_id).await?;
    }
    Ok(saved)
  }
}
