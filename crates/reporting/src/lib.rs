//! Customer analytics reporting: lifetime value, repeat purchases, revenue
//! breakdowns, cohort analysis, A/B testing, churn, charts and export.

pub mod breakdown;
pub mod charts;
pub mod churn;
pub mod cohort;
pub mod experiment;
pub mod export;
pub mod lifetime_value;
pub mod report;
pub mod retention;

#[cfg(test)]
mod test_support;

pub use breakdown::{Dimension, RevenueBreakdown};
pub use churn::ChurnReport;
pub use cohort::CohortMatrix;
pub use experiment::{AbTestResult, WelchTTest};
pub use export::ReportExporter;
pub use lifetime_value::{Histogram, LifetimeValueTable};
pub use report::{InsightsReport, ReportArtifacts, ReportSummary};
pub use retention::RepeatPurchase;
