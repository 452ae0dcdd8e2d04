//! Double-spend bookkeeping for redeemed tokens.
use async_trait::async_trait;
use std::collections::HashSet;
use tokio::sync::Mutex;

/// Ledger of spent token values.
///
/// A single flat set per issuer suffices: token values are PRF outputs over
/// messages that already commit to the redemption context.
///
/// # Security contract
///
/// [`mark_spent`](SpentStore::mark_spent) is atomic: of any number of
/// concurrent callers presenting the same value, exactly one observes `true`.
///
/// The store requires interior mutability.
#[async_trait]
pub trait SpentStore: Send + Sync {
    /// Atomically transitions a value from unseen to spent.
    ///
    /// Returns `true` if the value was newly marked, `false` if it had
    /// already been spent.
    async fn mark_spent(&self, value: &[u8]) -> bool;

    /// Returns whether a value has been spent.
    async fn is_spent(&self, value: &[u8]) -> bool;

    /// Transitions a value back to unseen.
    ///
    /// Returns `true` if the value was present.
    async fn unmark(&self, value: &[u8]) -> bool;

    /// Number of spent values.
    async fn len(&self) -> usize;

    /// Returns `true` if nothing has been spent yet.
    async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

/// Spent store that keeps values in memory.
///
/// Entries are never evicted.
#[derive(Default, Debug)]
pub struct MemorySpentStore {
    spent: Mutex<HashSet<Vec<u8>>>,
}

#[async_trait]
impl SpentStore for MemorySpentStore {
    async fn mark_spent(&self, value: &[u8]) -> bool {
        let mut spent = self.spent.lock().await;
        if spent.contains(value) {
            return false;
        }
        spent.insert(value.to_vec())
    }

    async fn is_spent(&self, value: &[u8]) -> bool {
        self.spent.lock().await.contains(value)
    }

    async fn unmark(&self, value: &[u8]) -> bool {
        self.spent.lock().await.remove(value)
    }

    async fn len(&self) -> usize {
        self.spent.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[tokio::test]
    async fn mark_once() {
        let store = MemorySpentStore::default();
        assert!(store.is_empty().await);
        assert!(store.mark_spent(b"value").await);
        assert!(!store.mark_spent(b"value").await);
        assert!(store.is_spent(b"value").await);
        assert!(!store.is_spent(b"other").await);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn unmark_resets() {
        let store = MemorySpentStore::default();
        assert!(!store.unmark(b"value").await);
        store.mark_spent(b"value").await;
        assert!(store.unmark(b"value").await);
        assert!(store.mark_spent(b"value").await);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_mark() {
        let store = Arc::new(MemorySpentStore::default());
        let handles = (0..64)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.mark_spent(b"contended").await })
            })
            .collect::<Vec<_>>();

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
    }
}
