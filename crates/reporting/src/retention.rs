//! Repeat-purchase rate.

use insights_core::{CustomerId, Transaction};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RepeatPurchase {
    /// Customers with at least one transaction.
    pub customers: usize,
    /// Customers with more than one transaction.
    pub repeat_customers: usize,
    pub rate: f64,
}

impl RepeatPurchase {
    pub fn compute(transactions: &[Transaction]) -> Self {
        let mut counts: HashMap<CustomerId, u64> = HashMap::new();
        for t in transactions {
            *counts.entry(t.customer_id).or_insert(0) += 1;
        }
        let customers = counts.len();
        let repeat_customers = counts.values().filter(|&&c| c > 1).count();
        let rate = if customers > 0 {
            repeat_customers as f64 / customers as f64
        } else {
            0.0
        };
        Self {
            customers,
            repeat_customers,
            rate,
        }
    }
}
