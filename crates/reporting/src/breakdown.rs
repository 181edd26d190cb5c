//! Revenue breakdowns by a customer dimension.

use insights_core::{Customer, Dataset};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Customer attributes revenue can be grouped by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Country,
    AcquisitionChannel,
}

impl Dimension {
    /// Column name used in exported tables.
    pub fn column(&self) -> &'static str {
        match self {
            Dimension::Country => "country",
            Dimension::AcquisitionChannel => "acquisition_channel",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Dimension::Country => "Country",
            Dimension::AcquisitionChannel => "Acquisition Channel",
        }
    }

    fn value<'a>(&self, customer: &'a Customer) -> &'a str {
        match self {
            Dimension::Country => &customer.country,
            Dimension::AcquisitionChannel => &customer.acquisition_channel,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevenueRow {
    pub key: String,
    pub amount: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevenueBreakdown {
    pub dimension: Dimension,
    /// Sorted by amount descending, then key ascending.
    pub rows: Vec<RevenueRow>,
}

impl RevenueBreakdown {
    /// Sum transaction amounts per dimension value over transactions joined
    /// to a known customer.
    pub fn compute(dataset: &Dataset, dimension: Dimension) -> Self {
        let mut groups: HashMap<&str, f64> = HashMap::new();
        for (t, c) in dataset.joined_transactions() {
            *groups.entry(dimension.value(c)).or_insert(0.0) += t.amount;
        }

        let mut rows: Vec<RevenueRow> = groups
            .into_iter()
            .map(|(key, amount)| RevenueRow {
                key: key.to_string(),
                amount,
            })
            .collect();
        rows.sort_by(|a, b| b.amount.total_cmp(&a.amount).then_with(|| a.key.cmp(&b.key)));

        Self { dimension, rows }
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        self.rows.iter().find(|r| r.key == key).map(|r| r.amount)
    }

    pub fn total(&self) -> f64 {
        self.rows.iter().map(|r| r.amount).sum()
    }
}
