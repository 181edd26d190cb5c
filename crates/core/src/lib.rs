//! Shared building blocks for customer insights reports: input record
//! types, dataset loading, configuration and the error taxonomy.

pub mod config;
pub mod dataset;
pub mod error;
pub mod types;

pub use config::ReportConfig;
pub use dataset::Dataset;
pub use error::{InsightsError, InsightsResult};
pub use types::{CampaignTable, Customer, CustomerId, Session, TestGroup, Transaction, YearMonth};
