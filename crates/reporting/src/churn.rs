//! Churn flagging: days since each customer's last purchase measured
//! against a fixed reference date.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use insights_core::{CustomerId, Dataset};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const SECONDS_PER_DAY: i64 = 86_400;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChurnRecord {
    pub customer_id: CustomerId,
    pub last_transaction_date: NaiveDateTime,
    pub days_since_txn: i64,
    pub churned: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChurnReport {
    pub reference_date: NaiveDate,
    pub threshold_days: i64,
    /// One record per customer with a joined transaction, ordered by id.
    pub records: Vec<ChurnRecord>,
}

impl ChurnReport {
    pub fn compute(dataset: &Dataset, reference_date: NaiveDate, threshold_days: i64) -> Self {
        let mut latest: BTreeMap<CustomerId, NaiveDateTime> = BTreeMap::new();
        for (t, c) in dataset.joined_transactions() {
            latest
                .entry(c.customer_id)
                .and_modify(|d| *d = (*d).max(t.transaction_date))
                .or_insert(t.transaction_date);
        }

        let reference = reference_date.and_time(NaiveTime::default());
        let records = latest
            .into_iter()
            .map(|(customer_id, last)| {
                let days_since_txn = days_between(last, reference);
                ChurnRecord {
                    customer_id,
                    last_transaction_date: last,
                    days_since_txn,
                    churned: days_since_txn > threshold_days,
                }
            })
            .collect();

        Self {
            reference_date,
            threshold_days,
            records,
        }
    }

    pub fn churned_count(&self) -> usize {
        self.records.iter().filter(|r| r.churned).count()
    }

    /// Fraction of customers flagged as churned; 0 with no customers.
    pub fn churn_rate(&self) -> f64 {
        if self.records.is_empty() {
            0.0
        } else {
            self.churned_count() as f64 / self.records.len() as f64
        }
    }

    pub fn get(&self, customer_id: CustomerId) -> Option<&ChurnRecord> {
        self.records.iter().find(|r| r.customer_id == customer_id)
    }
}

/// Whole days from `from` to `to`, rounded toward negative infinity.
fn days_between(from: NaiveDateTime, to: NaiveDateTime) -> i64 {
    (to - from).num_seconds().div_euclid(SECONDS_PER_DAY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::*;
    use proptest::prelude::*;

    fn reference() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 5, 20).unwrap()
    }

    #[test]
    fn test_flags_customers_past_threshold() {
        let ds = three_customers();
        let report = ChurnReport::compute(&ds, reference(), 30);
        assert_eq!(report.records.len(), 3);

        // Last purchase 2025-03-02 -> 79 days.
        let c1 = report.get(1).unwrap();
        assert_eq!(c1.last_transaction_date, at(2025, 3, 2));
        assert_eq!(c1.days_since_txn, 79);
        assert!(c1.churned);

        // 2025-05-01 -> 19 days.
        let c3 = report.get(3).unwrap();
        assert_eq!(c3.days_since_txn, 19);
        assert!(!c3.churned);

        assert_eq!(report.churned_count(), 2);
        assert!((report.churn_rate() - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_threshold_is_strict() {
        let ds = dataset(
            vec![customer(1, at(2025, 1, 1), "US", "ads")],
            vec![txn(1, at(2025, 4, 20), 1.0)],
        );
        let report = ChurnReport::compute(&ds, reference(), 30);
        assert_eq!(report.records[0].days_since_txn, 30);
        assert!(!report.records[0].churned);
    }

    #[test]
    fn test_partial_days_floor() {
        let last = at(2025, 5, 19).date().and_hms_opt(18, 0, 0).unwrap();
        assert_eq!(days_between(last, at(2025, 5, 20)), 0);
        // A purchase after the reference date counts as negative days.
        let after = at(2025, 5, 20).date().and_hms_opt(6, 0, 0).unwrap();
        assert_eq!(days_between(after, at(2025, 5, 20)), -1);
    }

    #[test]
    fn test_no_transactions_gives_zero_rate() {
        let ds = dataset(vec![customer(1, at(2025, 1, 1), "US", "ads")], vec![]);
        let report = ChurnReport::compute(&ds, reference(), 30);
        assert!(report.records.is_empty());
        assert_eq!(report.churn_rate(), 0.0);
    }

    proptest! {
        #[test]
        fn prop_later_reference_never_unchurns(
            days in proptest::collection::vec(0i64..200, 1..20),
            shift in 0i64..120
        ) {
            let start = at(2025, 1, 1);
            let customers = (0..days.len() as u64)
                .map(|id| customer(id, start, "US", "ads"))
                .collect();
            let transactions = days
                .iter()
                .enumerate()
                .map(|(id, &d)| txn(id as u64, start + chrono::Duration::days(d), 1.0))
                .collect();
            let ds = dataset(customers, transactions);

            let early = ChurnReport::compute(&ds, reference(), 30);
            let late = ChurnReport::compute(
                &ds,
                reference() + chrono::Duration::days(shift),
                30,
            );
            for (e, l) in early.records.iter().zip(&late.records) {
                prop_assert_eq!(e.customer_id, l.customer_id);
                prop_assert!(!e.churned || l.churned);
            }
        }
    }
}
