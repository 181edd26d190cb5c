//! Export of the derived tables to CSV, and of the run summary to JSON.

use crate::breakdown::RevenueBreakdown;
use crate::churn::ChurnReport;
use crate::cohort::CohortMatrix;
use crate::experiment::AbTestResult;
use crate::lifetime_value::LifetimeValueTable;
use chrono::{NaiveDateTime, Timelike};
use insights_core::{InsightsError, InsightsResult};
use serde::Serialize;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const LTV_FILE: &str = "ltv_customers.csv";
pub const COUNTRY_REVENUE_FILE: &str = "revenue_by_country.csv";
pub const CHANNEL_REVENUE_FILE: &str = "revenue_by_channel.csv";
pub const COHORT_MATRIX_FILE: &str = "cohort_matrix.csv";
pub const AB_GROUP_REVENUE_FILE: &str = "ab_group_revenue.csv";
pub const CHURN_FILE: &str = "churn_flagged_customers.csv";
pub const SUMMARY_FILE: &str = "report_summary.json";

/// Writes report tables into one output directory.
pub struct ReportExporter {
    output_dir: PathBuf,
}

impl ReportExporter {
    /// Create the exporter, creating `output_dir` and its parents if absent.
    pub fn new(output_dir: impl Into<PathBuf>) -> InsightsResult<Self> {
        let output_dir = output_dir.into();
        std::fs::create_dir_all(&output_dir).map_err(|e| InsightsError::io(&output_dir, e))?;
        Ok(Self { output_dir })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn path(&self, file: &str) -> PathBuf {
        self.output_dir.join(file)
    }

    fn writer(&self, file: &str) -> InsightsResult<(csv::Writer<File>, PathBuf)> {
        let path = self.path(file);
        debug!(path = %path.display(), "Writing table");
        let writer = csv::Writer::from_path(&path).map_err(|e| InsightsError::csv(&path, e))?;
        Ok((writer, path))
    }

    fn write_records(
        &self,
        file: &str,
        header: Vec<String>,
        records: impl IntoIterator<Item = Vec<String>>,
    ) -> InsightsResult<PathBuf> {
        let (mut writer, path) = self.writer(file)?;
        writer
            .write_record(&header)
            .map_err(|e| InsightsError::csv(&path, e))?;
        for record in records {
            writer
                .write_record(&record)
                .map_err(|e| InsightsError::csv(&path, e))?;
        }
        writer.flush().map_err(|e| InsightsError::io(&path, e))?;
        Ok(path)
    }

    pub fn write_lifetime_value(&self, ltv: &LifetimeValueTable) -> InsightsResult<PathBuf> {
        self.write_records(
            LTV_FILE,
            vec!["customer_id".into(), "lifetime_value".into()],
            ltv.rows
                .iter()
                .map(|r| vec![r.customer_id.to_string(), r.lifetime_value.to_string()]),
        )
    }

    pub fn write_revenue(
        &self,
        file: &str,
        breakdown: &RevenueBreakdown,
    ) -> InsightsResult<PathBuf> {
        self.write_records(
            file,
            vec![breakdown.dimension.column().to_string(), "amount".into()],
            breakdown
                .rows
                .iter()
                .map(|r| vec![r.key.clone(), r.amount.to_string()]),
        )
    }

    pub fn write_cohort_matrix(&self, matrix: &CohortMatrix) -> InsightsResult<PathBuf> {
        let header = std::iter::once("cohort_month".to_string())
            .chain(matrix.active_months.iter().map(|m| m.to_string()))
            .collect();
        self.write_records(
            COHORT_MATRIX_FILE,
            header,
            matrix.rows.iter().map(|row| {
                std::iter::once(row.cohort_month.to_string())
                    .chain(row.active_customers.iter().map(|c| c.to_string()))
                    .collect()
            }),
        )
    }

    pub fn write_group_revenue(&self, ab: &AbTestResult) -> InsightsResult<PathBuf> {
        self.write_records(
            AB_GROUP_REVENUE_FILE,
            vec!["test_group".into(), "amount".into()],
            ab.groups
                .iter()
                .map(|g| vec![g.test_group.to_string(), g.mean_amount.to_string()]),
        )
    }

    pub fn write_churn(&self, churn: &ChurnReport) -> InsightsResult<PathBuf> {
        self.write_records(
            CHURN_FILE,
            vec![
                "customer_id".into(),
                "last_transaction_date".into(),
                "days_since_txn".into(),
                "churned".into(),
            ],
            churn.records.iter().map(|r| {
                vec![
                    r.customer_id.to_string(),
                    format_datetime(&r.last_transaction_date),
                    r.days_since_txn.to_string(),
                    r.churned.to_string(),
                ]
            }),
        )
    }

    pub fn write_json<T: Serialize>(&self, file: &str, value: &T) -> InsightsResult<PathBuf> {
        let path = self.path(file);
        let json = serde_json::to_string_pretty(value)?;
        std::fs::write(&path, json).map_err(|e| InsightsError::io(&path, e))?;
        Ok(path)
    }
}

/// `YYYY-MM-DD` for midnight values, `YYYY-MM-DD HH:MM:SS` otherwise.
fn format_datetime(dt: &NaiveDateTime) -> String {
    if dt.num_seconds_from_midnight() == 0 && dt.nanosecond() == 0 {
        dt.format("%Y-%m-%d").to_string()
    } else {
        dt.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}
