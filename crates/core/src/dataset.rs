//! Input tables for one report run, loaded from delimited files.

use crate::config::{InputFiles, ReportConfig};
use crate::error::{InsightsError, InsightsResult};
use crate::types::{CampaignTable, Customer, CustomerId, Session, Transaction};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info, warn};

/// Customers logged at debug level after loading.
const PREVIEW_ROWS: usize = 5;

/// The four input tables, held for the duration of one run.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub customers: Vec<Customer>,
    pub transactions: Vec<Transaction>,
    /// Loaded and validated, not used by any metric.
    pub sessions: Vec<Session>,
    /// Loaded and validated, not used by any metric.
    pub campaigns: CampaignTable,
    /// customer_id -> index into `customers`; the first row wins on duplicates.
    index: HashMap<CustomerId, usize>,
}

impl Dataset {
    pub fn new(
        customers: Vec<Customer>,
        transactions: Vec<Transaction>,
        sessions: Vec<Session>,
        campaigns: CampaignTable,
    ) -> Self {
        let mut index = HashMap::with_capacity(customers.len());
        let mut duplicates = 0usize;
        for (i, customer) in customers.iter().enumerate() {
            if index.contains_key(&customer.customer_id) {
                duplicates += 1;
            } else {
                index.insert(customer.customer_id, i);
            }
        }
        if duplicates > 0 {
            warn!(duplicates, "Duplicate customer_id rows ignored for joins");
        }

        let dataset = Self {
            customers,
            transactions,
            sessions,
            campaigns,
            index,
        };

        let orphans = dataset.orphan_transaction_count();
        if orphans > 0 {
            warn!(
                orphans,
                "Transactions reference unknown customers; excluded from joined metrics"
            );
        }
        dataset
    }

    /// Load every input table named in `config`.
    pub fn load(config: &ReportConfig) -> InsightsResult<Self> {
        Self::load_from(&config.data_dir, &config.inputs)
    }

    pub fn load_from(dir: &Path, files: &InputFiles) -> InsightsResult<Self> {
        let customers: Vec<Customer> = read_table(&dir.join(&files.customers))?;
        let transactions: Vec<Transaction> = read_table(&dir.join(&files.transactions))?;
        let sessions: Vec<Session> = read_table(&dir.join(&files.sessions))?;
        let campaigns = read_raw_table(&dir.join(&files.campaigns))?;

        info!(
            customers = customers.len(),
            transactions = transactions.len(),
            sessions = sessions.len(),
            campaigns = campaigns.len(),
            "Data loaded successfully"
        );

        let dataset = Self::new(customers, transactions, sessions, campaigns);
        for c in dataset.customer_head(PREVIEW_ROWS) {
            debug!(
                customer_id = c.customer_id,
                signup_date = %c.signup_date,
                country = %c.country,
                acquisition_channel = %c.acquisition_channel,
                "Customer preview"
            );
        }
        Ok(dataset)
    }

    /// The first `n` customers in file order.
    pub fn customer_head(&self, n: usize) -> &[Customer] {
        &self.customers[..n.min(self.customers.len())]
    }

    pub fn customer(&self, customer_id: CustomerId) -> Option<&Customer> {
        self.index.get(&customer_id).map(|&i| &self.customers[i])
    }

    /// Transactions paired with their customer. Orphans are skipped, as in
    /// an inner join on `customer_id`.
    pub fn joined_transactions(&self) -> impl Iterator<Item = (&Transaction, &Customer)> + '_ {
        self.transactions
            .iter()
            .filter_map(|t| self.customer(t.customer_id).map(|c| (t, c)))
    }

    pub fn orphan_transaction_count(&self) -> usize {
        self.transactions
            .iter()
            .filter(|t| !self.index.contains_key(&t.customer_id))
            .count()
    }

    pub fn total_amount(&self) -> f64 {
        self.transactions.iter().map(|t| t.amount).sum()
    }
}

fn reader_for(path: &Path) -> InsightsResult<csv::Reader<std::fs::File>> {
    debug!(path = %path.display(), "Opening input table");
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| InsightsError::csv(path, e))
}

/// Deserialize every row of a headed CSV file into `T`.
pub fn read_table<T: DeserializeOwned>(path: &Path) -> InsightsResult<Vec<T>> {
    let mut reader = reader_for(path)?;
    reader
        .deserialize()
        .collect::<Result<Vec<T>, _>>()
        .map_err(|e| InsightsError::csv(path, e))
}

/// Read a headed CSV file without a fixed schema.
pub fn read_raw_table(path: &Path) -> InsightsResult<CampaignTable> {
    let mut reader = reader_for(path)?;
    let columns = reader
        .headers()
        .map_err(|e| InsightsError::csv(path, e))?
        .iter()
        .map(str::to_string)
        .collect();
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| InsightsError::csv(path, e))?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok(CampaignTable { columns, rows })
}
