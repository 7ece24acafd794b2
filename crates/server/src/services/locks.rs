//! Per-scope async locks.
//!
//! Serializes wishlist writes for one (customer, sales channel) pair within
//! this process. The partial unique index covers other processes.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use wishlist_core::WishlistScope;

/// Guard held for the duration of a scoped write.
pub type ScopeGuard = OwnedMutexGuard<()>;

/// Keyed set of async mutexes, one per active scope.
#[derive(Default)]
pub struct ScopeLocks {
    locks: Mutex<HashMap<WishlistScope, Arc<AsyncMutex<()>>>>,
}

impl ScopeLocks {
    /// Create an empty lock set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `scope`.
    pub async fn lock(&self, scope: &WishlistScope) -> ScopeGuard {
        let mutex = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            // Entries nobody holds or waits on
            locks.retain(|_, m| Arc::strong_count(m) > 1);
            Arc::clone(locks.entry(scope.clone()).or_default())
        };

        mutex.lock_owned().await
    }

    /// Number of scopes currently tracked.
    #[must_use]
    pub fn len(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether no scope is tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use wishlist_core::{CustomerId, SalesChannelId};

    use super::*;

    fn scope(customer: &str) -> WishlistScope {
        WishlistScope::new(
            CustomerId::parse(customer).unwrap(),
            SalesChannelId::parse("sc_1").unwrap(),
        )
    }

    #[tokio::test]
    async fn test_same_scope_is_exclusive() {
        let locks = Arc::new(ScopeLocks::new());
        let guard = locks.lock(&scope("cus_1")).await;

        let contender = {
            let locks = Arc::clone(&locks);
            tokio::spawn(async move {
                let _guard = locks.lock(&scope("cus_1")).await;
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        drop(guard);
        tokio::time::timeout(Duration::from_secs(1), contender)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_other_scope_is_independent() {
        let locks = ScopeLocks::new();
        let _first = locks.lock(&scope("cus_1")).await;

        tokio::time::timeout(Duration::from_secs(1), locks.lock(&scope("cus_2")))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_released_scopes_are_pruned() {
        let locks = ScopeLocks::new();
        drop(locks.lock(&scope("cus_1")).await);
        drop(locks.lock(&scope("cus_2")).await);

        // Acquiring prunes everything no longer held
        let _guard = locks.lock(&scope("cus_3")).await;
        assert_eq!(locks.len(), 1);
    }
}
