//! Cohort analysis: monthly active customers per signup cohort.

use insights_core::{CustomerId, Dataset, YearMonth};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CohortRow {
    pub cohort_month: YearMonth,
    /// Distinct active customers, aligned with `CohortMatrix::active_months`.
    pub active_customers: Vec<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CohortMatrix {
    pub active_months: Vec<YearMonth>,
    pub rows: Vec<CohortRow>,
    /// Transactions dated before their customer's signup month.
    pub excluded_transactions: usize,
}

impl CohortMatrix {
    pub fn compute(dataset: &Dataset) -> Self {
        let mut cells: BTreeMap<(YearMonth, YearMonth), HashSet<CustomerId>> = BTreeMap::new();
        let mut excluded = 0usize;

        for (t, c) in dataset.joined_transactions() {
            let cohort = YearMonth::of(&c.signup_date);
            let active = YearMonth::of(&t.transaction_date);
            if active < cohort {
                excluded += 1;
                continue;
            }
            cells.entry((cohort, active)).or_default().insert(c.customer_id);
        }

        if excluded > 0 {
            warn!(
                excluded,
                "Transactions before customer signup month left out of cohort matrix"
            );
        }

        let active_months: Vec<YearMonth> = cells
            .keys()
            .map(|&(_, active)| active)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let cohorts: BTreeSet<YearMonth> = cells.keys().map(|&(cohort, _)| cohort).collect();

        let rows = cohorts
            .into_iter()
            .map(|cohort_month| CohortRow {
                cohort_month,
                active_customers: active_months
                    .iter()
                    .map(|active| {
                        cells
                            .get(&(cohort_month, *active))
                            .map(|s| s.len() as u64)
                            .unwrap_or(0)
                    })
                    .collect(),
            })
            .collect();

        Self {
            active_months,
            rows,
            excluded_transactions: excluded,
        }
    }

    pub fn cohort_months(&self) -> impl Iterator<Item = YearMonth> + '_ {
        self.rows.iter().map(|r| r.cohort_month)
    }

    /// Cell value; combinations absent from the matrix are 0.
    pub fn cell(&self, cohort: YearMonth, active: YearMonth) -> u64 {
        let Some(col) = self.active_months.iter().position(|m| *m == active) else {
            return 0;
        };
        self.rows
            .iter()
            .find(|r| r.cohort_month == cohort)
            .map(|r| r.active_customers[col])
            .unwrap_or(0)
    }

    pub fn max_cell(&self) -> u64 {
        self.rows
            .iter()
            .flat_map(|r| r.active_customers.iter().copied())
            .max()
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
