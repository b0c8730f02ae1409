//! # Bill State
//!
//! Holds the register's one open bill.
//!
//! ## Bill Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Bill State Operations                                │
//! │                                                                         │
//! │  Shell Action             Command                 Bill State Change     │
//! │  ────────────             ───────                 ─────────────────     │
//! │                                                                         │
//! │  Scan / pick item ───────► add_to_bill() ───────► lines.push(line)     │
//! │                                                                         │
//! │  Change Quantity ────────► update_bill_item() ──► lines[i].qty = n     │
//! │                                                                         │
//! │  Click Remove ───────────► remove_from_bill() ──► lines.remove(i)      │
//! │                                                                         │
//! │  Cancel ─────────────────► void_bill() ─────────► voided, replaced     │
//! │                                                                         │
//! │  Pay ────────────────────► checkout() ──────────► committed, replaced  │
//! │                                                                         │
//! │  NOTE: checkout holds the lock across the store write, so no line      │
//! │        can change between validation and persistence.                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use smartdesk_core::{Bill, TaxPolicy};
use tokio::sync::{Mutex, MutexGuard};

/// The open bill behind an async mutex.
#[derive(Debug)]
pub struct BillState {
    bill: Mutex<Bill>,
    tax_policy: TaxPolicy,
}

impl BillState {
    /// Starts with an empty open bill under `tax_policy`.
    pub fn new(tax_policy: TaxPolicy) -> Self {
        BillState {
            bill: Mutex::new(Bill::open(tax_policy.clone())),
            tax_policy,
        }
    }

    /// Locks the current bill.
    pub async fn lock(&self) -> MutexGuard<'_, Bill> {
        self.bill.lock().await
    }

    /// A fresh open bill under the configured policy.
    pub fn fresh(&self) -> Bill {
        Bill::open(self.tax_policy.clone())
    }

    /// Swaps in a fresh bill and returns the previous one.
    pub async fn replace(&self) -> Bill {
        let mut guard = self.bill.lock().await;
        std::mem::replace(&mut *guard, self.fresh())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_replace_installs_fresh_bill() {
        let state = BillState::new(TaxPolicy::none());
        let first_id = state.lock().await.id().to_string();

        let previous = state.replace().await;
        assert_eq!(previous.id(), first_id);

        let current = state.lock().await;
        assert_ne!(current.id(), first_id);
        assert!(current.status().is_open());
        assert_eq!(current.tax_policy(), &TaxPolicy::none());
    }
}
