//! # Per-Customer Checkout Locks
//!
//! Serializes checkouts for the same customer across terminals.
//!
//! ```text
//! Terminal A ──► acquire("cust-1") ──► read ──► validate ──► commit ──► release
//! Terminal B ──► acquire("cust-1") ········waits········► read (post-A balance) ──► ...
//! Terminal C ──► acquire("cust-2") ──► proceeds immediately (different mutex)
//! ```
//!
//! The map holds one async mutex per customer with a checkout in flight.
//! Entries that nobody holds or waits for are dropped on the next acquire.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::debug;

type Slot = Arc<AsyncMutex<()>>;

/// Keyed async mutexes, one per customer id.
#[derive(Debug, Clone, Default)]
pub struct CustomerLocks {
    slots: Arc<Mutex<HashMap<String, Slot>>>,
}

/// Held for the duration of one customer's checkout. Releases on drop.
#[derive(Debug)]
pub struct CustomerGuard {
    customer_id: String,
    _guard: OwnedMutexGuard<()>,
}

impl CustomerGuard {
    pub fn customer_id(&self) -> &str {
        &self.customer_id
    }
}

impl CustomerLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits until no other checkout holds `customer_id`, then holds it.
    pub async fn acquire(&self, customer_id: &str) -> CustomerGuard {
        let slot = self.slot(customer_id);
        let guard = slot.lock_owned().await;
        debug!(customer_id = %customer_id, "Customer lock acquired");

        CustomerGuard {
            customer_id: customer_id.to_string(),
            _guard: guard,
        }
    }

    /// Holds `customer_id` if it is free right now.
    pub fn try_acquire(&self, customer_id: &str) -> Option<CustomerGuard> {
        let slot = self.slot(customer_id);
        slot.try_lock_owned().ok().map(|guard| CustomerGuard {
            customer_id: customer_id.to_string(),
            _guard: guard,
        })
    }

    /// Number of customers with a live slot.
    pub fn len(&self) -> usize {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn slot(&self, customer_id: &str) -> Slot {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);

        // Only the map references an idle slot; holders and waiters keep a clone.
        slots.retain(|id, slot| id == customer_id || Arc::strong_count(slot) > 1);

        slots
            .entry(customer_id.to_string())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_same_customer_is_exclusive() {
        let locks = CustomerLocks::new();

        let held = locks.acquire("cust-1").await;
        assert_eq!(held.customer_id(), "cust-1");
        assert!(locks.try_acquire("cust-1").is_none());

        drop(held);
        assert!(locks.try_acquire("cust-1").is_some());
    }

    #[tokio::test]
    async fn test_different_customers_do_not_contend() {
        let locks = CustomerLocks::new();

        let _a = locks.acquire("cust-1").await;
        let b = locks.try_acquire("cust-2");
        assert!(b.is_some());
    }

    #[tokio::test]
    async fn test_idle_slots_are_pruned() {
        let locks = CustomerLocks::new();

        for i in 0..10 {
            let _guard = locks.acquire(&format!("cust-{}", i)).await;
        }
        // every earlier slot was idle when the next one was acquired
        assert_eq!(locks.len(), 1);

        let held = locks.acquire("busy").await;
        let _other = locks.acquire("other").await;
        assert_eq!(locks.len(), 2);
        drop(held);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_waiter_runs_after_holder() {
        let locks = CustomerLocks::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        let first = locks.acquire("cust-1").await;

        let waiter = {
            let locks = locks.clone();
            let order = order.clone();
            tokio::spawn(async move {
                let _guard = locks.acquire("cust-1").await;
                order.lock().unwrap().push("second");
            })
        };

        tokio::task::yield_now().await;
        order.lock().unwrap().push("first");
        drop(first);

        waiter.await.unwrap();
        assert_eq!(*order.lock().unwrap(), vec!["first", "second"]);
    }
}
