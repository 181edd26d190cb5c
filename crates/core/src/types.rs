use crate::error::{InsightsError, InsightsResult};
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

pub type CustomerId = u64;

/// A customer row from `customers.csv`. Source of dimensional attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub customer_id: CustomerId,
    #[serde(deserialize_with = "deserialize_datetime")]
    pub signup_date: NaiveDateTime,
    pub country: String,
    pub acquisition_channel: String,
}

/// A purchase row from `transactions.csv`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub customer_id: CustomerId,
    #[serde(deserialize_with = "deserialize_datetime")]
    pub transaction_date: NaiveDateTime,
    pub amount: f64,
}

/// A session row from `sessions.csv`. Loaded and counted only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub customer_id: CustomerId,
    #[serde(deserialize_with = "deserialize_datetime")]
    pub session_date: NaiveDateTime,
}

/// Campaign table with no fixed schema. Loaded and counted only.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CampaignTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl CampaignTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Calendar month period, displayed as `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Self {
        Self { year, month }
    }

    pub fn of(date: &NaiveDateTime) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl Serialize for YearMonth {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A/B experiment arm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TestGroup {
    A,
    B,
}

impl TestGroup {
    /// Even identifiers go to A, odd ones to B.
    pub fn for_customer(customer_id: CustomerId) -> Self {
        if customer_id % 2 == 0 {
            TestGroup::A
        } else {
            TestGroup::B
        }
    }
}

impl fmt::Display for TestGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestGroup::A => f.write_str("A"),
            TestGroup::B => f.write_str("B"),
        }
    }
}

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d"];

/// Parse a calendar date or timestamp. Date-only values are midnight;
/// zoned timestamps are converted to their naive UTC value.
pub fn parse_datetime(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, fmt) {
            return Some(dt);
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(value, fmt) {
            return d.and_hms_opt(0, 0, 0);
        }
    }
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.naive_utc())
}

/// Parse a calendar date, dropping any time of day.
pub fn parse_date(value: &str) -> InsightsResult<NaiveDate> {
    parse_datetime(value)
        .map(|dt| dt.date())
        .ok_or_else(|| InsightsError::InvalidDate {
            value: value.to_string(),
        })
}

fn deserialize_datetime<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_datetime(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid date {:?}", raw)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_parse_date_formats() {
        assert_eq!(parse_datetime("2025-01-15"), Some(date(2025, 1, 15)));
        assert_eq!(parse_datetime("01/15/2025"), Some(date(2025, 1, 15)));
        assert_eq!(parse_datetime(" 2025-01-15 "), Some(date(2025, 1, 15)));
        let with_time = parse_datetime("2025-01-15 13:45:00").unwrap();
        assert_eq!(with_time.date(), date(2025, 1, 15).date());
        assert!(parse_datetime("2025-01-15T13:45:00").is_some());
        let fractional = parse_datetime("2025-01-15 13:45:00.250").unwrap();
        assert_eq!(
            fractional,
            NaiveDate::from_ymd_opt(2025, 1, 15)
                .unwrap()
                .and_hms_milli_opt(13, 45, 0, 250)
                .unwrap()
        );
        assert!(parse_datetime("2025-01-15T13:45:00Z").is_some());
        assert!(parse_datetime("2025-01-15T13:45:00+02:00").is_some());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(parse_datetime("not a date"), None);
        assert_eq!(parse_datetime("2025-13-01"), None);
        assert_eq!(parse_datetime(""), None);
    }

    #[test]
    fn test_parse_date_reports_invalid_input() {
        assert_eq!(
            parse_date("2025-05-20").unwrap(),
            NaiveDate::from_ymd_opt(2025, 5, 20).unwrap()
        );
        assert!(matches!(
            parse_date("20/05/2025"),
            Err(InsightsError::InvalidDate { .. })
        ));
    }

    #[test]
    fn test_year_month_ordering_and_display() {
        let jan = YearMonth::of(&date(2025, 1, 31));
        let feb = YearMonth::of(&date(2025, 2, 1));
        let dec = YearMonth::of(&date(2024, 12, 15));
        assert!(dec < jan);
        assert!(jan < feb);
        assert_eq!(jan.to_string(), "2025-01");
        assert_eq!(dec.to_string(), "2024-12");
    }

    #[test]
    fn test_group_assignment_by_parity() {
        assert_eq!(TestGroup::for_customer(0), TestGroup::A);
        assert_eq!(TestGroup::for_customer(2), TestGroup::A);
        assert_eq!(TestGroup::for_customer(7), TestGroup::B);
        assert_eq!(TestGroup::B.to_string(), "B");
    }

    #[test]
    fn test_deserialize_transaction_row() {
        let data = "customer_id,transaction_date,amount\n42,2025-03-04,19.99\n";
        let mut reader = csv::Reader::from_reader(data.as_bytes());
        let txn: Transaction = reader.deserialize().next().unwrap().unwrap();
        assert_eq!(txn.customer_id, 42);
        assert_eq!(txn.transaction_date, date(2025, 3, 4));
        assert!((txn.amount - 19.99).abs() < 1e-9);
    }
}
