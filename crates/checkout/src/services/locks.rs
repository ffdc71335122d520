//! Per-user workflow serialization.
//!
//! Two concurrent checkout invocations for the same user's cart would both
//! pass validation against the same stock snapshot and both reach the
//! gateway. Both order creation and payment reconciliation therefore hold
//! the owning user's lock from cart validation through cart clear.
//!
//! This is an in-process lock; a multi-instance deployment would replace it
//! with a `pg_advisory_xact_lock` keyed on the user. The seam is here so
//! that swap stays local.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

use tamarind_core::UserId;

/// Map of per-user async mutexes.
#[derive(Clone, Default)]
pub struct UserLocks {
    inner: Arc<Mutex<HashMap<UserId, Arc<Mutex<()>>>>>,
}

impl UserLocks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the lock for a user, waiting if another workflow for the
    /// same user is in flight. The guard is held across await points until
    /// dropped.
    pub async fn acquire(&self, user_id: &UserId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.inner.lock().await;
            Arc::clone(map.entry(user_id.clone()).or_default())
        };
        lock.lock_owned().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_same_user_is_serialized() {
        let locks = UserLocks::new();
        let user = UserId::new("user-1");
        let concurrent = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let locks = locks.clone();
            let user = user.clone();
            let concurrent = Arc::clone(&concurrent);
            handles.push(tokio::spawn(async move {
                let _guard = locks.acquire(&user).await;
                let inside = concurrent.fetch_add(1, Ordering::SeqCst);
                assert_eq!(inside, 0, "two workflows inside the same user's lock");
                tokio::task::yield_now().await;
                concurrent.fetch_sub(1, Ordering::SeqCst);
            }));
        }
        for handle in handles {
            handle.await.expect("task panicked");
        }
    }

    #[tokio::test]
    async fn test_different_users_do_not_block() {
        let locks = UserLocks::new();
        let guard_a = locks.acquire(&UserId::new("user-a")).await;
        // Would deadlock if users shared a lock.
        let _guard_b = locks.acquire(&UserId::new("user-b")).await;
        drop(guard_a);
    }
}
