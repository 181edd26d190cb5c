//! Report pipeline: computes every metric over one dataset, then renders
//! charts and exports the tables.

use crate::breakdown::{Dimension, RevenueBreakdown};
use crate::charts;
use crate::churn::ChurnReport;
use crate::cohort::CohortMatrix;
use crate::experiment::{AbTestResult, GroupRevenue};
use crate::export::{self, ReportExporter};
use crate::lifetime_value::{Histogram, LifetimeValueTable};
use crate::retention::RepeatPurchase;
use chrono::{DateTime, NaiveDate, Utc};
use insights_core::{Dataset, InsightsResult, ReportConfig};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use tracing::info;
use uuid::Uuid;

pub const LTV_CHART_FILE: &str = "ltv_distribution.svg";
pub const COHORT_CHART_FILE: &str = "cohort_heatmap.svg";

/// Row counts of the input tables.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InputCounts {
    pub customers: usize,
    pub transactions: usize,
    pub sessions: usize,
    pub campaigns: usize,
    pub orphan_transactions: usize,
}

impl InputCounts {
    pub fn of(dataset: &Dataset) -> Self {
        Self {
            customers: dataset.customers.len(),
            transactions: dataset.transactions.len(),
            sessions: dataset.sessions.len(),
            campaigns: dataset.campaigns.len(),
            orphan_transactions: dataset.orphan_transaction_count(),
        }
    }
}

/// Every metric of one run.
#[derive(Debug, Clone)]
pub struct InsightsReport {
    pub inputs: InputCounts,
    pub total_revenue: f64,
    pub lifetime_value: LifetimeValueTable,
    pub ltv_histogram: Histogram,
    pub repeat_purchase: RepeatPurchase,
    pub revenue_by_country: RevenueBreakdown,
    pub revenue_by_channel: RevenueBreakdown,
    pub cohorts: CohortMatrix,
    pub ab_test: AbTestResult,
    pub churn: ChurnReport,
    pub top_n: usize,
}

/// Files written by [`InsightsReport::write`].
#[derive(Debug, Clone, Default)]
pub struct ReportArtifacts {
    pub tables: Vec<PathBuf>,
    pub charts: Vec<PathBuf>,
    pub summary: PathBuf,
}

/// Headline numbers of one run, written as `report_summary.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportSummary {
    pub report_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub inputs: InputCounts,
    pub customers_with_transactions: usize,
    pub total_revenue: f64,
    pub repeat_purchase_rate: f64,
    pub ab_groups: Vec<GroupRevenue>,
    pub t_statistic: Option<f64>,
    pub p_value: Option<f64>,
    pub reference_date: NaiveDate,
    pub churn_threshold_days: i64,
    pub churned_customers: usize,
    pub churn_rate: f64,
}

impl InsightsReport {
    pub fn compute(dataset: &Dataset, config: &ReportConfig) -> InsightsResult<Self> {
        let lifetime_value = LifetimeValueTable::compute(&dataset.transactions);
        let ltv_histogram =
            Histogram::from_values(&lifetime_value.values(), config.charts.histogram_bins);
        info!(customers = lifetime_value.len(), "Lifetime value computed");

        let repeat_purchase = RepeatPurchase::compute(&dataset.transactions);
        info!(rate = repeat_purchase.rate, "Repeat purchase rate computed");

        let revenue_by_country = RevenueBreakdown::compute(dataset, Dimension::Country);
        let revenue_by_channel = RevenueBreakdown::compute(dataset, Dimension::AcquisitionChannel);
        info!(
            countries = revenue_by_country.rows.len(),
            channels = revenue_by_channel.rows.len(),
            "Revenue breakdowns computed"
        );

        let cohorts = CohortMatrix::compute(dataset);
        info!(
            cohorts = cohorts.rows.len(),
            active_months = cohorts.active_months.len(),
            "Cohort matrix computed"
        );

        let ab_test = AbTestResult::compute(dataset)?;
        info!(groups = ab_test.groups.len(), "A/B test computed");

        let churn = ChurnReport::compute(
            dataset,
            config.churn.reference_date,
            config.churn.threshold_days,
        );
        info!(
            customers = churn.records.len(),
            churned = churn.churned_count(),
            "Churn flags computed"
        );

        Ok(Self {
            inputs: InputCounts::of(dataset),
            total_revenue: dataset.total_amount(),
            lifetime_value,
            ltv_histogram,
            repeat_purchase,
            revenue_by_country,
            revenue_by_channel,
            cohorts,
            ab_test,
            churn,
            top_n: config.display.top_n,
        })
    }

    pub fn summary(&self) -> ReportSummary {
        ReportSummary {
            report_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            inputs: self.inputs.clone(),
            customers_with_transactions: self.repeat_purchase.customers,
            total_revenue: self.total_revenue,
            repeat_purchase_rate: self.repeat_purchase.rate,
            ab_groups: self.ab_test.groups.clone(),
            t_statistic: self.ab_test.t_test.map(|t| t.t_statistic),
            p_value: self.ab_test.t_test.map(|t| t.p_value),
            reference_date: self.churn.reference_date,
            churn_threshold_days: self.churn.threshold_days,
            churned_customers: self.churn.churned_count(),
            churn_rate: self.churn.churn_rate(),
        }
    }

    /// Render charts (when enabled) and write all tables plus the summary
    /// into `config.output_dir`.
    pub fn write(&self, config: &ReportConfig) -> InsightsResult<ReportArtifacts> {
        let exporter = ReportExporter::new(&config.output_dir)?;
        let mut artifacts = ReportArtifacts::default();

        if config.charts.enabled {
            let size = (config.charts.width, config.charts.height);
            let ltv_path = exporter.path(LTV_CHART_FILE);
            if charts::render_ltv_histogram(&self.ltv_histogram, &ltv_path, size)? {
                artifacts.charts.push(ltv_path);
            }
            let cohort_path = exporter.path(COHORT_CHART_FILE);
            if charts::render_cohort_heatmap(&self.cohorts, &cohort_path, size)? {
                artifacts.charts.push(cohort_path);
            }
        }

        artifacts.tables = vec![
            exporter.write_lifetime_value(&self.lifetime_value)?,
            exporter.write_revenue(export::COUNTRY_REVENUE_FILE, &self.revenue_by_country)?,
            exporter.write_revenue(export::CHANNEL_REVENUE_FILE, &self.revenue_by_channel)?,
            exporter.write_cohort_matrix(&self.cohorts)?,
            exporter.write_group_revenue(&self.ab_test)?,
            exporter.write_churn(&self.churn)?,
        ];
        artifacts.summary = exporter.write_json(export::SUMMARY_FILE, &self.summary())?;

        info!(
            output_dir = %exporter.output_dir().display(),
            tables = artifacts.tables.len(),
            charts = artifacts.charts.len(),
            "All result files saved"
        );
        Ok(artifacts)
    }
}

fn percent(rate: f64) -> String {
    format!("{:.2}%", rate * 100.0)
}

impl fmt::Display for InsightsReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Top {} LTV customers:", self.top_n)?;
        writeln!(f, "  {:>12}  {:>14}", "customer_id", "lifetime_value")?;
        for row in self.lifetime_value.top(self.top_n) {
            writeln!(f, "  {:>12}  {:>14.2}", row.customer_id, row.lifetime_value)?;
        }
        writeln!(f)?;

        writeln!(
            f,
            "Repeat Purchase Rate: {}",
            percent(self.repeat_purchase.rate)
        )?;
        writeln!(f)?;

        for breakdown in [&self.revenue_by_country, &self.revenue_by_channel] {
            writeln!(f, "Revenue by {}:", breakdown.dimension.label())?;
            for row in &breakdown.rows {
                writeln!(f, "  {:<20}  {:>12.2}", row.key, row.amount)?;
            }
            writeln!(f)?;
        }

        writeln!(f, "Average Revenue per Test Group:")?;
        for group in &self.ab_test.groups {
            writeln!(
                f,
                "  {}  {:>12.2}  (n = {})",
                group.test_group, group.mean_amount, group.transactions
            )?;
        }
        match &self.ab_test.t_test {
            Some(t) => writeln!(
                f,
                "T-Test Results: t-stat = {:.3}, p-value = {:.4}",
                t.t_statistic, t.p_value
            )?,
            None => writeln!(f, "T-Test Results: not computable for these samples")?,
        }
        writeln!(f)?;

        writeln!(
            f,
            "Estimated Churn Rate (>{} days inactive): {}",
            self.churn.threshold_days,
            percent(self.churn.churn_rate())
        )
    }
}
