//! Small in-memory fixtures shared by the unit tests.

use chrono::{NaiveDate, NaiveDateTime};
use insights_core::{CampaignTable, Customer, CustomerId, Dataset, Transaction};

pub fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

pub fn customer(id: CustomerId, signup: NaiveDateTime, country: &str, channel: &str) -> Customer {
    Customer {
        customer_id: id,
        signup_date: signup,
        country: country.into(),
        acquisition_channel: channel.into(),
    }
}

pub fn txn(id: CustomerId, date: NaiveDateTime, amount: f64) -> Transaction {
    Transaction {
        customer_id: id,
        transaction_date: date,
        amount,
    }
}

pub fn dataset(customers: Vec<Customer>, transactions: Vec<Transaction>) -> Dataset {
    Dataset::new(customers, transactions, vec![], CampaignTable::default())
}

/// Three customers: #1 buys twice (10 + 20), #2 and #3 once each.
pub fn three_customers() -> Dataset {
    dataset(
        vec![
            customer(1, at(2025, 1, 5), "US", "ads"),
            customer(2, at(2025, 1, 20), "DE", "organic"),
            customer(3, at(2025, 2, 3), "US", "organic"),
        ],
        vec![
            txn(1, at(2025, 1, 6), 10.0),
            txn(1, at(2025, 3, 2), 20.0),
            txn(2, at(2025, 1, 21), 15.0),
            txn(3, at(2025, 5, 1), 40.0),
        ],
    )
}
