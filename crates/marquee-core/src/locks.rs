//! Per-user mutual exclusion for profile mutations.
//!
//! Every operation that counts a user's profiles and then acts on the count
//! (create, delete, reconcile) runs while holding that user's lock, so two
//! concurrent creations can never both observe `count < max`. Different users
//! never contend.

use std::{
  collections::HashMap,
  sync::{Arc, Mutex, PoisonError},
};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use uuid::Uuid;

/// A keyed set of async mutexes, one per user id.
///
/// Cloning is cheap and clones share the same key space.
#[derive(Debug, Clone, Default)]
pub struct UserLocks {
  inner: Arc<Mutex<HashMap<Uuid, Arc<AsyncMutex<()>>>>>,
}

impl UserLocks {
  pub fn new() -> Self { Self::default() }

  /// Wait for and take the lock of `user_id`. Released when the guard drops.
  pub async fn lock(&self, user_id: Uuid) -> OwnedMutexGuard<()> {
    let slot = {
      let mut map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
      // Entries only referenced by the map are idle.
      map.retain(|_, slot| Arc::strong_count(slot) > 1);
      map.entry(user_id).or_default().clone()
    };
    slot.lock_owned().await
  }

  /// Number of users with a held or awaited lock.
  pub fn active(&self) -> usize {
    let map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
    map.values().filter(|slot| Arc::strong_count(slot) > 1).count()
  }
}

#[cfg(test)]
mod tests {
  use std::time::Duration;

  use super::*;

  #[tokio::test]
  async fn same_user_is_serialized() {
    let locks = UserLocks::new();
    let user = Uuid::new_v4();

    let guard = locks.lock(user).await;
    let second = tokio::time::timeout(Duration::from_millis(50), locks.lock(user)).await;
    assert!(second.is_err(), "second lock must wait while the first is held");

    drop(guard);
    let third = tokio::time::timeout(Duration::from_millis(50), locks.lock(user)).await;
    assert!(third.is_ok());
  }

  #[tokio::test]
  async fn different_users_do_not_contend() {
    let locks = UserLocks::new();
    let _a = locks.lock(Uuid::new_v4()).await;
    let b = tokio::time::timeout(Duration::from_millis(50), locks.lock(Uuid::new_v4())).await;
    assert!(b.is_ok());
  }

  #[tokio::test]
  async fn idle_entries_are_pruned() {
    let locks = UserLocks::new();
    drop(locks.lock(Uuid::new_v4()).await);
    drop(locks.lock(Uuid::new_v4()).await);
    let _held = locks.lock(Uuid::new_v4()).await;
    assert_eq!(locks.active(), 1);
    assert_eq!(locks.inner.lock().unwrap().len(), 1);
  }
}
