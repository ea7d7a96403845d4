//! In-memory store for engine and service tests.

use std::{
  collections::{HashMap, HashSet},
  sync::Mutex,
};

use chrono::{Months, Utc};
use uuid::Uuid;

use crate::{
  plan::Plan,
  profile::{Profile, ProfileUpdate, by_name},
  store::{Backend, ProfileStore, SubscriptionStore},
  subscription::Subscription,
};

#[derive(Debug, thiserror::Error)]
#[error("injected failure deleting profile {0}")]
pub struct FakeError(Uuid);

#[derive(Debug, Default)]
struct State {
  users:         HashSet<Uuid>,
  subscriptions: HashMap<Uuid, Subscription>,
  profiles:      HashMap<Uuid, Profile>,
  failing:       HashSet<Uuid>,
  reads:         usize,
}

#[derive(Debug, Default)]
pub struct FakeStore {
  state: Mutex<State>,
}

impl FakeStore {
  pub fn add_user(&self) -> Uuid {
    let id = Uuid::new_v4();
    self.state.lock().unwrap().users.insert(id);
    id
  }

  pub fn subscribe(&self, user_id: Uuid, plan: Plan) -> Subscription {
    let now = Utc::now();
    let mut state = self.state.lock().unwrap();
    let sub = state
      .subscriptions
      .entry(user_id)
      .or_insert_with(|| Subscription {
        id: Uuid::new_v4(),
        user_id,
        plan,
        value: plan.list_price(),
        registered_at: now,
        expires_at: now + Months::new(12),
      });
    sub.plan = plan;
    sub.clone()
  }

  pub fn add_profile(&self, user_id: Uuid, name: &str, color: &str) -> Uuid {
    let profile = Profile {
      id: Uuid::new_v4(),
      user_id,
      name: name.into(),
      color: color.into(),
      created_at: Utc::now(),
    };
    let id = profile.id;
    self.state.lock().unwrap().profiles.insert(id, profile);
    id
  }

  /// Make every deletion of `profile_id` fail.
  pub fn fail_deletes_of(&self, profile_id: Uuid) {
    self.state.lock().unwrap().failing.insert(profile_id);
  }

  /// Store reads served so far.
  pub fn reads(&self) -> usize { self.state.lock().unwrap().reads }

  pub fn profile_names(&self, user_id: Uuid) -> Vec<String> {
    let state = self.state.lock().unwrap();
    let mut profiles: Vec<_> =
      state.profiles.values().filter(|p| p.user_id == user_id).collect();
    profiles.sort_by(|a, b| by_name(a, b));
    profiles.into_iter().map(|p| p.name.clone()).collect()
  }
}

pub fn names(profiles: &[Profile]) -> Vec<&str> {
  profiles.iter().map(|p| p.name.as_str()).collect()
}

impl Backend for FakeStore {
  type Error = FakeError;
}

impl ProfileStore for FakeStore {
  async fn user_exists(&self, user_id: Uuid) -> Result<bool, FakeError> {
    let mut state = self.state.lock().unwrap();
    state.reads += 1;
    Ok(state.users.contains(&user_id))
  }

  async fn count_profiles(&self, user_id: Uuid) -> Result<usize, FakeError> {
    let mut state = self.state.lock().unwrap();
    state.reads += 1;
    Ok(state.profiles.values().filter(|p| p.user_id == user_id).count())
  }

  async fn list_profiles(&self, user_id: Uuid) -> Result<Vec<Profile>, FakeError> {
    let mut state = self.state.lock().unwrap();
    state.reads += 1;
    let mut profiles: Vec<_> = state
      .profiles
      .values()
      .filter(|p| p.user_id == user_id)
      .cloned()
      .collect();
    profiles.sort_by(by_name);
    Ok(profiles)
  }

  async fn get_profile(&self, id: Uuid) -> Result<Option<Profile>, FakeError> {
    Ok(self.state.lock().unwrap().profiles.get(&id).cloned())
  }

  async fn insert_profile(&self, profile: Profile) -> Result<Profile, FakeError> {
    let mut state = self.state.lock().unwrap();
    state.profiles.insert(profile.id, profile.clone());
    Ok(profile)
  }

  async fn update_profile(
    &self,
    id: Uuid,
    update: ProfileUpdate,
  ) -> Result<Option<Profile>, FakeError> {
    let mut state = self.state.lock().unwrap();
    let Some(profile) = state.profiles.get_mut(&id) else {
      return Ok(None);
    };
    if let Some(name) = update.name {
      profile.name = name.as_str().to_owned();
    }
    if let Some(color) = update.color {
      profile.color = color.as_str().to_owned();
    }
    Ok(Some(profile.clone()))
  }

  async fn delete_profile(&self, id: Uuid) -> Result<bool, FakeError> {
    let mut state = self.state.lock().unwrap();
    if state.failing.contains(&id) {
      return Err(FakeError(id));
    }
    Ok(state.profiles.remove(&id).is_some())
  }
}

impl SubscriptionStore for FakeStore {
  async fn get_subscription(
    &self,
    user_id: Uuid,
  ) -> Result<Option<Subscription>, FakeError> {
    let mut state = self.state.lock().unwrap();
    state.reads += 1;
    Ok(state.subscriptions.get(&user_id).cloned())
  }

  async fn list_subscriptions(&self) -> Result<Vec<Subscription>, FakeError> {
    Ok(self.state.lock().unwrap().subscriptions.values().cloned().collect())
  }

  async fn save_subscription(
    &self,
    subscription: Subscription,
  ) -> Result<Subscription, FakeError> {
    let mut state = self.state.lock().unwrap();
    state.subscriptions.insert(subscription.user_id, subscription.clone());
    Ok(subscription)
  }

  async fn delete_subscription(&self, user_id: Uuid) -> Result<bool, FakeError> {
    Ok(self.state.lock().unwrap().subscriptions.remove(&user_id).is_some())
  }
}
