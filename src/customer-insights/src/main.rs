//! Customer Insights: one-shot analytics report over customer and
//! transaction exports.
//!
//! Loads the input tables, computes every metric, prints the console
//! summary and writes charts and tables to the output directory.

use anyhow::Context;
use chrono::NaiveDate;
use clap::Parser;
use insights_core::types::parse_date;
use insights_core::{Dataset, ReportConfig};
use insights_reporting::InsightsReport;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "customer-insights")]
#[command(about = "Customer lifetime value, cohort, A/B and churn report generator")]
#[command(version)]
struct Cli {
    /// TOML config file (optional)
    #[arg(long, env = "CUSTOMER_INSIGHTS_CONFIG", default_value = "customer-insights.toml")]
    config: PathBuf,

    /// Directory holding the input CSV files (overrides config)
    #[arg(long, env = "CUSTOMER_INSIGHTS__DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Directory the report is written to (overrides config)
    #[arg(long, env = "CUSTOMER_INSIGHTS__OUTPUT_DIR")]
    output_dir: Option<PathBuf>,

    /// Date inactivity is measured against (overrides config)
    #[arg(long, env = "CUSTOMER_INSIGHTS__CHURN__REFERENCE_DATE", value_parser = parse_date)]
    reference_date: Option<NaiveDate>,

    /// Days without a purchase before a customer counts as churned (overrides config)
    #[arg(long, env = "CUSTOMER_INSIGHTS__CHURN__THRESHOLD_DAYS")]
    churn_threshold_days: Option<i64>,

    /// Skip chart rendering
    #[arg(long, default_value_t = false)]
    no_charts: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "customer_insights=info,insights_core=info,insights_reporting=info".into()
            }),
        )
        .with_writer(std::io::stderr)
        .json()
        .init();

    let cli = Cli::parse();

    info!("Customer Insights starting up");

    let mut config = load_config(&cli.config);
    apply_overrides(cli, &mut config);

    info!(
        data_dir = %config.data_dir.display(),
        output_dir = %config.output_dir.display(),
        reference_date = %config.churn.reference_date,
        churn_threshold_days = config.churn.threshold_days,
        charts = config.charts.enabled,
        "Configuration loaded"
    );

    if let Err(e) = run(&config) {
        error!(error = %format!("{:#}", e), "Report run failed");
        return Err(e);
    }

    info!("All analysis completed successfully");
    Ok(())
}

/// Load the config file layered under the environment, falling back to
/// defaults when it cannot be read or parsed.
fn load_config(path: &Path) -> ReportConfig {
    ReportConfig::load(Some(path)).unwrap_or_else(|e| {
        warn!(error = %e, path = %path.display(), "Failed to load config, using defaults");
        ReportConfig::default()
    })
}

/// CLI flags take precedence over the file and the environment.
fn apply_overrides(cli: Cli, config: &mut ReportConfig) {
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }
    if let Some(dir) = cli.output_dir {
        config.output_dir = dir;
    }
    if let Some(date) = cli.reference_date {
        config.churn.reference_date = date;
    }
    if let Some(days) = cli.churn_threshold_days {
        config.churn.threshold_days = days;
    }
    if cli.no_charts {
        config.charts.enabled = false;
    }
}

fn run(config: &ReportConfig) -> anyhow::Result<()> {
    let dataset = Dataset::load(config)
        .with_context(|| format!("loading input tables from {}", config.data_dir.display()))?;

    let report = InsightsReport::compute(&dataset, config).context("computing report metrics")?;
    println!("{}", report);

    let artifacts = report
        .write(config)
        .with_context(|| format!("writing report to {}", config.output_dir.display()))?;
    for path in artifacts.charts.iter().chain(&artifacts.tables) {
        info!(path = %path.display(), "Result file written");
    }
    Ok(())
}
