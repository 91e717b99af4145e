use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

pub use api_types::transaction::{TransactionStatus, TransactionType};

use crate::MoneyCents;

/// Canonical transaction.
///
/// Every payload coming from the server is normalized into this shape by
/// [`canonicalize`](crate::canonical::canonicalize) before any derivation
/// looks at it. The serialized form is the canonical wire shape, so
/// canonicalizing a serialized `Transaction` gives back the same value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    /// ISO date as sent by the server. Use [`Transaction::day`] to compare.
    pub date: String,
    pub description: String,
    pub category_name: String,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    /// Never negative: the direction lives in `kind`.
    pub amount: MoneyCents,
    pub status: TransactionStatus,
    pub is_recurring: bool,
    pub notes: String,
}

impl Transaction {
    /// Calendar day of the transaction, if the date is usable.
    pub fn day(&self) -> Option<NaiveDate> {
        parse_day(&self.date)
    }

    pub fn is_income(&self) -> bool {
        self.kind == TransactionType::Income
    }

    pub fn is_expense(&self) -> bool {
        self.kind == TransactionType::Expense
    }
}

/// Parses the day part of a server date.
///
/// Accepts plain dates (`2024-02-10`), naive timestamps
/// (`2024-02-10T00:00:00`, optional fraction) and RFC3339 timestamps. The
/// day is taken as written; no timezone conversion happens.
pub fn parse_day(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(day) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(day);
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Some(ts.date_naive());
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .map(|ts| ts.date())
}
