//! Customer lifetime value: total spend per customer and its distribution.

use insights_core::{CustomerId, Transaction};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LifetimeValue {
    pub customer_id: CustomerId,
    pub lifetime_value: f64,
}

/// One row per customer with at least one transaction, ordered by id.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LifetimeValueTable {
    pub rows: Vec<LifetimeValue>,
}

impl LifetimeValueTable {
    pub fn compute(transactions: &[Transaction]) -> Self {
        let mut totals: BTreeMap<CustomerId, f64> = BTreeMap::new();
        for t in transactions {
            *totals.entry(t.customer_id).or_insert(0.0) += t.amount;
        }
        let rows = totals
            .into_iter()
            .map(|(customer_id, lifetime_value)| LifetimeValue {
                customer_id,
                lifetime_value,
            })
            .collect();
        Self { rows }
    }

    pub fn get(&self, customer_id: CustomerId) -> Option<f64> {
        self.rows
            .binary_search_by_key(&customer_id, |r| r.customer_id)
            .ok()
            .map(|i| self.rows[i].lifetime_value)
    }

    /// Highest `n` lifetime values, descending; ties by ascending id.
    pub fn top(&self, n: usize) -> Vec<&LifetimeValue> {
        let mut ranked: Vec<&LifetimeValue> = self.rows.iter().collect();
        ranked.sort_by(|a, b| {
            b.lifetime_value
                .total_cmp(&a.lifetime_value)
                .then(a.customer_id.cmp(&b.customer_id))
        });
        ranked.truncate(n);
        ranked
    }

    pub fn values(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.lifetime_value).collect()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Equal-width histogram. `edges` has one more entry than `counts`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Histogram {
    pub edges: Vec<f64>,
    pub counts: Vec<u64>,
}

impl Histogram {
    /// Bucket `values` into `bins` bins spanning `[min, max]`. The last bin
    /// is closed on the right. A degenerate range is widened by 0.5 on
    /// each side.
    pub fn from_values(values: &[f64], bins: usize) -> Self {
        if values.is_empty() || bins == 0 {
            return Self::default();
        }
        let mut lo = values.iter().copied().fold(f64::INFINITY, f64::min);
        let mut hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if lo == hi {
            lo -= 0.5;
            hi += 0.5;
        }

        let width = (hi - lo) / bins as f64;
        let edges: Vec<f64> = (0..=bins).map(|i| lo + width * i as f64).collect();
        let mut counts = vec![0u64; bins];
        for v in values {
            let idx = (((v - lo) / width) as usize).min(bins - 1);
            counts[idx] += 1;
        }
        Self { edges, counts }
    }

    /// `(left, right, count)` per bin.
    pub fn bins(&self) -> impl Iterator<Item = (f64, f64, u64)> + '_ {
        self.edges
            .windows(2)
            .zip(&self.counts)
            .map(|(e, &c)| (e[0], e[1], c))
    }

    pub fn max_count(&self) -> u64 {
        self.counts.iter().copied().max().unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::*;

    #[test]
    fn test_sums_amount_per_customer() {
        let ds = three_customers();
        let ltv = LifetimeValueTable::compute(&ds.transactions);
        assert_eq!(ltv.len(), 3);
        assert_eq!(ltv.get(1), Some(30.0));
        assert_eq!(ltv.get(2), Some(15.0));
        assert_eq!(ltv.get(3), Some(40.0));
    }

    #[test]
    fn test_customer_without_transactions_has_no_row() {
        let ds = dataset(
            vec![
                customer(1, at(2025, 1, 1), "US", "ads"),
                customer(2, at(2025, 1, 1), "US", "ads"),
            ],
            vec![txn(1, at(2025, 1, 2), 5.0)],
        );
        let ltv = LifetimeValueTable::compute(&ds.transactions);
        assert_eq!(ltv.len(), 1);
        assert_eq!(ltv.get(2), None);
    }

    #[test]
    fn test_top_orders_descending() {
        let ds = three_customers();
        let ltv = LifetimeValueTable::compute(&ds.transactions);
        let top: Vec<CustomerId> = ltv.top(2).iter().map(|r| r.customer_id).collect();
        assert_eq!(top, vec![3, 1]);
        assert_eq!(ltv.top(10).len(), 3);
    }

    #[test]
    fn test_top_breaks_ties_by_id() {
        let txns = vec![
            txn(9, at(2025, 1, 1), 10.0),
            txn(4, at(2025, 1, 1), 10.0),
        ];
        let ltv = LifetimeValueTable::compute(&txns);
        let top: Vec<CustomerId> = ltv.top(2).iter().map(|r| r.customer_id).collect();
        assert_eq!(top, vec![4, 9]);
    }

    #[test]
    fn test_histogram_counts_every_value() {
        let values = vec![1.0, 2.0, 2.5, 7.0, 10.0];
        let hist = Histogram::from_values(&values, 3);
        assert_eq!(hist.edges.len(), 4);
        assert_eq!(hist.edges[0], 1.0);
        assert_eq!(hist.edges[3], 10.0);
        // [1,4) [4,7) [7,10]
        assert_eq!(hist.counts, vec![3, 0, 2]);
        assert_eq!(hist.total(), 5);
        assert_eq!(hist.max_count(), 3);
    }

    #[test]
    fn test_histogram_degenerate_range() {
        let hist = Histogram::from_values(&[5.0, 5.0], 2);
        assert_eq!(hist.edges, vec![4.5, 5.0, 5.5]);
        assert_eq!(hist.counts, vec![0, 2]);
    }

    #[test]
    fn test_histogram_empty_input() {
        assert!(Histogram::from_values(&[], 30).is_empty());
        assert!(Histogram::from_values(&[1.0], 0).is_empty());
    }
}
