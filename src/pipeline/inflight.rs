//! Per-key serialization of cache misses.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::cache::CacheKey;

/// Hands out one async lock per cache key. Locks are dropped once no
/// request holds or waits on them.
#[derive(Default)]
pub struct InFlight {
    locks: Mutex<HashMap<String, Weak<AsyncMutex<()>>>>,
}

/// Held while a miss for its key is being filled.
pub struct InFlightGuard {
    _guard: OwnedMutexGuard<()>,
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, key: &CacheKey) -> InFlightGuard {
        let lock = {
            let mut locks = self.locks.lock();
            locks.retain(|_, lock| lock.strong_count() > 0);
            match locks.get(key.as_str()).and_then(Weak::upgrade) {
                Some(lock) => lock,
                None => {
                    let lock = Arc::new(AsyncMutex::new(()));
                    locks.insert(key.to_string(), Arc::downgrade(&lock));
                    lock
                }
            }
        };
        InFlightGuard {
            _guard: lock.lock_owned().await,
        }
    }

    /// Number of keys currently locked or awaited.
    pub fn active(&self) -> usize {
        self.locks
            .lock()
            .values()
            .filter(|lock| lock.strong_count() > 0)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{OutputFormat, ResizeMode, ResizeRequest};
    use std::time::Duration;

    fn key(path: &str) -> CacheKey {
        CacheKey::new(&ResizeRequest::new(
            path,
            10,
            10,
            ResizeMode::MaxWidth,
            OutputFormat::Png,
        ))
    }

    #[tokio::test]
    async fn same_key_is_serialized() {
        let inflight = Arc::new(InFlight::new());
        let first = inflight.acquire(&key("/a.png")).await;

        let waiter = {
            let inflight = inflight.clone();
            tokio::spawn(async move {
                let _guard = inflight.acquire(&key("/a.png")).await;
            })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!waiter.is_finished());

        drop(first);
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn different_keys_do_not_block() {
        let inflight = InFlight::new();
        let _a = inflight.acquire(&key("/a.png")).await;
        let b = tokio::time::timeout(Duration::from_secs(1), inflight.acquire(&key("/b.png"))).await;
        assert!(b.is_ok());
        assert_eq!(inflight.active(), 2);
    }

    #[tokio::test]
    async fn released_locks_are_forgotten() {
        let inflight = InFlight::new();
        drop(inflight.acquire(&key("/a.png")).await);
        assert_eq!(inflight.active(), 0);
    }
}
