//! The module contains the errors the engine can return.
//!
//! Derivations ([`filter`], [`stats`]) never fail. Errors only come from
//! turning server payloads or user input into engine types, and from writing
//! reports.
//!
//!  [`filter`]: crate::filter
//!  [`stats`]: crate::stats
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("transaction record has no id")]
    MissingId,
    #[error("malformed transaction record: {0}")]
    MalformedRecord(String),
    #[error("record {index}: {source}")]
    InvalidRecord {
        index: usize,
        #[source]
        source: Box<EngineError>,
    },
    #[error("\"{0}\" appears more than once")]
    DuplicateId(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Invalid date: {0}")]
    InvalidDate(String),
    #[error("Invalid transaction: {0}")]
    InvalidForm(String),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error("report encoding failed: {0}")]
    Encoding(String),
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::MissingId, Self::MissingId) => true,
            (Self::MalformedRecord(a), Self::MalformedRecord(b)) => a == b,
            (
                Self::InvalidRecord {
                    index: a,
                    source: sa,
                },
                Self::InvalidRecord {
                    index: b,
                    source: sb,
                },
            ) => a == b && sa == sb,
            (Self::DuplicateId(a), Self::DuplicateId(b)) => a == b,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::InvalidDate(a), Self::InvalidDate(b)) => a == b,
            (Self::InvalidForm(a), Self::InvalidForm(b)) => a == b,
            (Self::Csv(a), Self::Csv(b)) => a.to_string() == b.to_string(),
            (Self::Encoding(a), Self::Encoding(b)) => a == b,
            _ => false,
        }
    }
}
