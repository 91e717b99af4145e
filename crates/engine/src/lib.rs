//! Transaction data and aggregation layer.
//!
//! The engine owns no I/O: it turns raw server records into canonical
//! [`Transaction`]s ([`canonical`]), derives filtered views ([`filter`]) and
//! aggregates ([`stats`]) from them, and renders exports ([`report`]).

pub use error::EngineError;
pub use money::MoneyCents;
pub use transactions::{Transaction, TransactionStatus, TransactionType, parse_day};

pub mod canonical;
mod error;
pub mod filter;
mod money;
pub mod report;
pub mod stats;
mod transactions;

pub type ResultEngine<T> = Result<T, EngineError>;
