use chrono::NaiveDate;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Root report configuration. Loaded from an optional TOML file, then
/// environment variables with the prefix `CUSTOMER_INSIGHTS__`.
#[derive(Debug, Clone, Deserialize)]
pub struct ReportConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default)]
    pub inputs: InputFiles,
    #[serde(default)]
    pub churn: ChurnConfig,
    #[serde(default)]
    pub charts: ChartConfig,
    #[serde(default)]
    pub display: DisplayConfig,
}

/// File names of the four input tables, relative to `data_dir`.
#[derive(Debug, Clone, Deserialize)]
pub struct InputFiles {
    #[serde(default = "default_customers_file")]
    pub customers: String,
    #[serde(default = "default_transactions_file")]
    pub transactions: String,
    #[serde(default = "default_sessions_file")]
    pub sessions: String,
    #[serde(default = "default_campaigns_file")]
    pub campaigns: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChurnConfig {
    /// Fixed date inactivity is measured against.
    #[serde(default = "default_reference_date")]
    pub reference_date: NaiveDate,
    /// Customers inactive for strictly more days than this are churned.
    #[serde(default = "default_threshold_days")]
    pub threshold_days: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChartConfig {
    #[serde(default = "default_charts_enabled")]
    pub enabled: bool,
    #[serde(default = "default_histogram_bins")]
    pub histogram_bins: usize,
    #[serde(default = "default_chart_width")]
    pub width: u32,
    #[serde(default = "default_chart_height")]
    pub height: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DisplayConfig {
    #[serde(default = "default_top_n")]
    pub top_n: usize,
}

// Default functions
fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("outputs")
}
fn default_customers_file() -> String {
    "customers.csv".to_string()
}
fn default_transactions_file() -> String {
    "transactions.csv".to_string()
}
fn default_sessions_file() -> String {
    "sessions.csv".to_string()
}
fn default_campaigns_file() -> String {
    "campaigns.csv".to_string()
}
fn default_reference_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 5, 20).unwrap_or_default()
}
fn default_threshold_days() -> i64 {
    30
}
fn default_charts_enabled() -> bool {
    true
}
fn default_histogram_bins() -> usize {
    30
}
fn default_chart_width() -> u32 {
    800
}
fn default_chart_height() -> u32 {
    500
}
fn default_top_n() -> usize {
    5
}

impl Default for InputFiles {
    fn default() -> Self {
        Self {
            customers: default_customers_file(),
            transactions: default_transactions_file(),
            sessions: default_sessions_file(),
            campaigns: default_campaigns_file(),
        }
    }
}

impl Default for ChurnConfig {
    fn default() -> Self {
        Self {
            reference_date: default_reference_date(),
            threshold_days: default_threshold_days(),
        }
    }
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            enabled: default_charts_enabled(),
            histogram_bins: default_histogram_bins(),
            width: default_chart_width(),
            height: default_chart_height(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            top_n: default_top_n(),
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            output_dir: default_output_dir(),
            inputs: InputFiles::default(),
            churn: ChurnConfig::default(),
            charts: ChartConfig::default(),
            display: DisplayConfig::default(),
        }
    }
}

impl ReportConfig {
    /// Load configuration from `file` (if it exists) layered under the
    /// `CUSTOMER_INSIGHTS__*` environment.
    pub fn load(file: Option<&Path>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();
        if let Some(path) = file {
            builder = builder.add_source(config::File::from(path).required(false));
        }
        let builder = builder.add_source(
            config::Environment::with_prefix("CUSTOMER_INSIGHTS")
                .separator("__")
                .try_parsing(true),
        );

        let config: Self = builder.build()?.try_deserialize()?;
        if config.charts.histogram_bins == 0 {
            return Err(config::ConfigError::Message(
                "charts.histogram_bins must be at least 1".into(),
            ));
        }
        Ok(config)
    }

    pub fn input_path(&self, file: &str) -> PathBuf {
        self.data_dir.join(file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = ReportConfig::default();
        assert_eq!(config.data_dir, PathBuf::from("data"));
        assert_eq!(config.output_dir, PathBuf::from("outputs"));
        assert_eq!(
            config.churn.reference_date,
            NaiveDate::from_ymd_opt(2025, 5, 20).unwrap()
        );
        assert_eq!(config.churn.threshold_days, 30);
        assert_eq!(config.charts.histogram_bins, 30);
        assert_eq!(config.display.top_n, 5);
        assert_eq!(config.inputs.transactions, "transactions.csv");
    }

    #[test]
    fn test_load_from_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("insights.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            r#"
output_dir = "reports"

[churn]
reference_date = "2025-06-01"
threshold_days = 45

[charts]
enabled = false
"#
        )
        .unwrap();

        let config = ReportConfig::load(Some(&path)).unwrap();
        assert_eq!(config.output_dir, PathBuf::from("reports"));
        assert_eq!(
            config.churn.reference_date,
            NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
        );
        assert_eq!(config.churn.threshold_days, 45);
        assert!(!config.charts.enabled);
        // Untouched sections keep their defaults.
        assert_eq!(config.charts.histogram_bins, 30);
        assert_eq!(config.data_dir, PathBuf::from("data"));
    }

    #[test]
    fn test_env_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("insights.toml");
        std::fs::write(&path, "[charts]\nwidth = 800\nheight = 500\n").unwrap();

        // No other test reads charts.width through `load`.
        std::env::set_var("CUSTOMER_INSIGHTS__CHARTS__WIDTH", "1024");
        let config = ReportConfig::load(Some(&path));
        std::env::remove_var("CUSTOMER_INSIGHTS__CHARTS__WIDTH");

        let config = config.unwrap();
        assert_eq!(config.charts.width, 1024);
        assert_eq!(config.charts.height, 500);
    }

    #[test]
    fn test_rejects_zero_histogram_bins() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("insights.toml");
        std::fs::write(&path, "[charts]\nhistogram_bins = 0\n").unwrap();
        let err = ReportConfig::load(Some(&path)).unwrap_err();
        assert!(err.to_string().contains("histogram_bins"));
    }

    #[test]
    fn test_missing_file_is_optional() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let config = ReportConfig::load(Some(&path)).unwrap();
        assert_eq!(config.display.top_n, 5);
    }

    #[test]
    fn test_input_path_joins_data_dir() {
        let config = ReportConfig::default();
        assert_eq!(
            config.input_path("customers.csv"),
            PathBuf::from("data").join("customers.csv")
        );
    }
}
