//! Synthetic A/B test: parity split of customers and a Welch t-test on
//! transaction amounts.

use insights_core::{Dataset, InsightsError, InsightsResult, TestGroup};
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, StudentsT};
use statrs::statistics::Statistics;
use tracing::warn;

/// Mean transaction amount for one test group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupRevenue {
    pub test_group: TestGroup,
    pub transactions: usize,
    pub mean_amount: f64,
}

/// Two-sample t-test with unequal variances.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WelchTTest {
    pub t_statistic: f64,
    pub degrees_of_freedom: f64,
    /// Two-sided.
    pub p_value: f64,
}

impl WelchTTest {
    /// Returns `None` when the test is undefined: a sample with fewer than
    /// two observations or a zero standard error.
    pub fn compute(a: &[f64], b: &[f64]) -> InsightsResult<Option<Self>> {
        if a.len() < 2 || b.len() < 2 {
            return Ok(None);
        }
        let (n_a, n_b) = (a.len() as f64, b.len() as f64);
        let (mean_a, mean_b) = (a.iter().mean(), b.iter().mean());
        let se_a = a.iter().variance() / n_a;
        let se_b = b.iter().variance() / n_b;
        let se = se_a + se_b;
        if se <= 0.0 || !se.is_finite() {
            return Ok(None);
        }

        let t_statistic = (mean_a - mean_b) / se.sqrt();
        let degrees_of_freedom =
            se * se / (se_a * se_a / (n_a - 1.0) + se_b * se_b / (n_b - 1.0));

        let dist = StudentsT::new(0.0, 1.0, degrees_of_freedom)
            .map_err(|e| InsightsError::Statistics(e.to_string()))?;
        let p_value = (2.0 * dist.sf(t_statistic.abs())).min(1.0);

        Ok(Some(Self {
            t_statistic,
            degrees_of_freedom,
            p_value,
        }))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbTestResult {
    /// Groups with at least one transaction, A before B.
    pub groups: Vec<GroupRevenue>,
    pub t_test: Option<WelchTTest>,
}

impl AbTestResult {
    /// Split joined transactions by the customer's group and compare mean
    /// amounts.
    pub fn compute(dataset: &Dataset) -> InsightsResult<Self> {
        let mut amounts_a = Vec::new();
        let mut amounts_b = Vec::new();
        for (t, c) in dataset.joined_transactions() {
            match TestGroup::for_customer(c.customer_id) {
                TestGroup::A => amounts_a.push(t.amount),
                TestGroup::B => amounts_b.push(t.amount),
            }
        }

        let groups = [(TestGroup::A, &amounts_a), (TestGroup::B, &amounts_b)]
            .into_iter()
            .filter(|(_, amounts)| !amounts.is_empty())
            .map(|(test_group, amounts)| GroupRevenue {
                test_group,
                transactions: amounts.len(),
                mean_amount: amounts.iter().mean(),
            })
            .collect();

        let t_test = WelchTTest::compute(&amounts_a, &amounts_b)?;
        if t_test.is_none() {
            warn!(
                group_a = amounts_a.len(),
                group_b = amounts_b.len(),
                "T-test not computable for these samples"
            );
        }

        Ok(Self { groups, t_test })
    }

    pub fn group(&self, test_group: TestGroup) -> Option<&GroupRevenue> {
        self.groups.iter().find(|g| g.test_group == test_group)
    }
}
