//! Per-aggregate lock manager
//!
//! Grants short-lived, named, mutually exclusive leases
//! (`order:{id}`, `invoice:{id}`) so only one in-flight operation can
//! mutate an aggregate at a time. Leases carry a TTL and expire on their
//! own, so a crashed or abandoned caller can never deadlock the
//! aggregate; a release token prevents a stale guard from freeing a
//! lease that was already taken over.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

/// Interval between acquisition retries while waiting for a busy lease
const RETRY_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Debug, thiserror::Error)]
pub enum LockError {
    #[error("Timed out waiting for lease on {0}")]
    Timeout(String),
}

#[derive(Debug, Clone, Copy)]
struct Lease {
    token: u64,
    expires_at: Instant,
}

/// Lease-based lock manager
#[derive(Debug)]
pub struct LockManager {
    leases: DashMap<String, Lease>,
    ttl: Duration,
    next_token: AtomicU64,
}

impl LockManager {
    pub fn new(ttl: Duration) -> Arc<Self> {
        Arc::new(Self {
            leases: DashMap::new(),
            ttl,
            next_token: AtomicU64::new(1),
        })
    }

    /// Try to take the lease immediately. Returns the token on success.
    fn try_acquire(&self, key: &str) -> Option<u64> {
        let token = self.next_token.fetch_add(1, Ordering::Relaxed);
        let lease = Lease {
            token,
            expires_at: Instant::now() + self.ttl,
        };
        match self.leases.entry(key.to_string()) {
            Entry::Vacant(slot) => {
                slot.insert(lease);
                Some(token)
            }
            Entry::Occupied(mut slot) => {
                if slot.get().expires_at <= Instant::now() {
                    // Holder's lease expired; take over
                    slot.insert(lease);
                    Some(token)
                } else {
                    None
                }
            }
        }
    }

    /// Acquire the named lease, waiting up to `wait` for the current
    /// holder to release or expire
    pub async fn acquire(
        self: &Arc<Self>,
        key: &str,
        wait: Duration,
    ) -> Result<LockGuard, LockError> {
        let deadline = Instant::now() + wait;
        loop {
            if let Some(token) = self.try_acquire(key) {
                return Ok(LockGuard {
                    manager: Arc::clone(self),
                    key: key.to_string(),
                    token,
                });
            }
            if Instant::now() >= deadline {
                return Err(LockError::Timeout(key.to_string()));
            }
            tokio::time::sleep(RETRY_INTERVAL).await;
        }
    }

    /// Release a lease if the token still matches (internal, used by guard drop)
    fn release(&self, key: &str, token: u64) {
        self.leases
            .remove_if(key, |_key, lease| lease.token == token);
    }

    /// Remove expired leases. Returns the number swept.
    ///
    /// Expired leases are also taken over lazily on acquire; the sweep
    /// just keeps the table from accumulating dead entries.
    pub fn sweep_expired(&self) -> usize {
        let before = self.leases.len();
        let now = Instant::now();
        self.leases.retain(|_key, lease| lease.expires_at > now);
        before - self.leases.len()
    }

    /// Number of currently held leases
    pub fn held(&self) -> usize {
        self.leases.len()
    }
}

/// Exclusive hold on a named resource; released on drop
#[must_use = "dropping the guard releases the lease"]
#[derive(Debug)]
pub struct LockGuard {
    manager: Arc<LockManager>,
    key: String,
    token: u64,
}

impl LockGuard {
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        self.manager.release(&self.key, self.token);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn exclusive_while_held() {
        let manager = LockManager::new(Duration::from_secs(30));
        let guard = manager
            .acquire("order:1", Duration::from_millis(50))
            .await
            .unwrap();

        let err = manager
            .acquire("order:1", Duration::from_millis(50))
            .await
            .unwrap_err();
        assert!(matches!(err, LockError::Timeout(_)));

        drop(guard);
        // Released, so immediately acquirable again
        let _guard = manager
            .acquire("order:1", Duration::from_millis(50))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn independent_keys_do_not_contend() {
        let manager = LockManager::new(Duration::from_secs(30));
        let _a = manager
            .acquire("order:1", Duration::from_millis(50))
            .await
            .unwrap();
        let _b = manager
            .acquire("order:2", Duration::from_millis(50))
            .await
            .unwrap();
        assert_eq!(manager.held(), 2);
    }

    #[tokio::test]
    async fn waiter_gets_lease_after_release() {
        let manager = LockManager::new(Duration::from_secs(30));
        let guard = manager
            .acquire("invoice:1", Duration::from_secs(1))
            .await
            .unwrap();

        let waiter = {
            let manager = Arc::clone(&manager);
            tokio::spawn(async move {
                manager.acquire("invoice:1", Duration::from_secs(2)).await
            })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        drop(guard);

        let result = waiter.await.unwrap();
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn expired_lease_can_be_taken_over() {
        let manager = LockManager::new(Duration::from_millis(20));
        let stale = manager
            .acquire("order:1", Duration::from_millis(50))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(40)).await;

        // Lease expired: a new caller takes over even though the old
        // guard was never dropped
        let fresh = manager
            .acquire("order:1", Duration::from_millis(50))
            .await
            .unwrap();

        // The stale guard's drop must not release the new holder's lease
        drop(stale);
        assert_eq!(manager.held(), 1);
        drop(fresh);
        assert_eq!(manager.held(), 0);
    }

    #[tokio::test]
    async fn sweep_removes_only_expired() {
        let manager = LockManager::new(Duration::from_millis(20));
        let _short = manager
            .acquire("order:1", Duration::from_millis(50))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(manager.sweep_expired(), 1);
        assert_eq!(manager.held(), 0);
    }
}
