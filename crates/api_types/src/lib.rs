//! Payloads exchanged with the Nexkontrol HTTP API.
//!
//! The server speaks camelCase JSON and encodes every enumeration as a small
//! integer. The enums here own that encoding so the rest of the workspace
//! never handles raw discriminants.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Error returned when a numeric discriminant has no matching variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownDiscriminant {
    pub kind: &'static str,
    pub value: u8,
}

impl fmt::Display for UnknownDiscriminant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown {} discriminant: {}", self.kind, self.value)
    }
}

impl std::error::Error for UnknownDiscriminant {}

/// Body of every non-2xx response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub mod auth {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct LoginRequest {
        pub email: String,
        pub password: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct RegisterRequest {
        pub name: String,
        pub email: String,
        pub password: String,
    }

    /// Issued by both login and register.
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct AuthResponse {
        pub token: String,
        pub name: String,
        #[serde(default)]
        pub email: String,
    }
}

pub mod account {
    use super::*;

    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(into = "u8", try_from = "u8")]
    pub enum AccountType {
        #[default]
        Bank,
        CreditCard,
        Cash,
        DigitalWallet,
    }

    impl AccountType {
        pub fn label(self) -> &'static str {
            match self {
                Self::Bank => "Bank",
                Self::CreditCard => "Credit card",
                Self::Cash => "Cash",
                Self::DigitalWallet => "Digital wallet",
            }
        }
    }

    impl From<AccountType> for u8 {
        fn from(value: AccountType) -> Self {
            match value {
                AccountType::Bank => 0,
                AccountType::CreditCard => 1,
                AccountType::Cash => 2,
                AccountType::DigitalWallet => 3,
            }
        }
    }

    impl TryFrom<u8> for AccountType {
        type Error = UnknownDiscriminant;

        fn try_from(value: u8) -> Result<Self, Self::Error> {
            match value {
                0 => Ok(Self::Bank),
                1 => Ok(Self::CreditCard),
                2 => Ok(Self::Cash),
                3 => Ok(Self::DigitalWallet),
                value => Err(UnknownDiscriminant {
                    kind: "account type",
                    value,
                }),
            }
        }
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Account {
        pub id: String,
        pub name: String,
        #[serde(default, alias = "InitialBalance")]
        pub initial_balance: f64,
        #[serde(rename = "type", default)]
        pub kind: AccountType,
    }

    /// Request body for `POST /api/account`. The response is the new id.
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct NewAccount {
        pub name: String,
        pub initial_balance: f64,
        #[serde(rename = "type")]
        pub kind: AccountType,
    }
}

pub mod category {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Category {
        pub id: String,
        pub category_name: String,
        #[serde(default)]
        pub total_spent: f64,
    }

    /// Request body for `POST /api/category`. The response is the new id.
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct NewCategory {
        pub category_name: String,
    }
}

pub mod transaction {
    use super::*;

    /// Direction of a transaction. The amount itself is never signed.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(into = "u8", try_from = "u8")]
    pub enum TransactionType {
        Income,
        Expense,
    }

    impl From<TransactionType> for u8 {
        fn from(value: TransactionType) -> Self {
            match value {
                TransactionType::Income => 0,
                TransactionType::Expense => 1,
            }
        }
    }

    impl TryFrom<u8> for TransactionType {
        type Error = UnknownDiscriminant;

        fn try_from(value: u8) -> Result<Self, Self::Error> {
            match value {
                0 => Ok(Self::Income),
                1 => Ok(Self::Expense),
                value => Err(UnknownDiscriminant {
                    kind: "transaction type",
                    value,
                }),
            }
        }
    }

    /// Settlement state. The server encodes "paid" as `0`.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(into = "u8", try_from = "u8")]
    pub enum TransactionStatus {
        Completed,
        Pending,
    }

    impl From<TransactionStatus> for u8 {
        fn from(value: TransactionStatus) -> Self {
            match value {
                TransactionStatus::Completed => 0,
                TransactionStatus::Pending => 1,
            }
        }
    }

    impl TryFrom<u8> for TransactionStatus {
        type Error = UnknownDiscriminant;

        fn try_from(value: u8) -> Result<Self, Self::Error> {
            match value {
                0 => Ok(Self::Completed),
                1 => Ok(Self::Pending),
                value => Err(UnknownDiscriminant {
                    kind: "transaction status",
                    value,
                }),
            }
        }
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(into = "u8", try_from = "u8")]
    pub enum RecurrenceInterval {
        Daily,
        Weekly,
        Monthly,
        Yearly,
    }

    impl From<RecurrenceInterval> for u8 {
        fn from(value: RecurrenceInterval) -> Self {
            match value {
                RecurrenceInterval::Daily => 0,
                RecurrenceInterval::Weekly => 1,
                RecurrenceInterval::Monthly => 2,
                RecurrenceInterval::Yearly => 3,
            }
        }
    }

    impl TryFrom<u8> for RecurrenceInterval {
        type Error = UnknownDiscriminant;

        fn try_from(value: u8) -> Result<Self, Self::Error> {
            match value {
                0 => Ok(Self::Daily),
                1 => Ok(Self::Weekly),
                2 => Ok(Self::Monthly),
                3 => Ok(Self::Yearly),
                value => Err(UnknownDiscriminant {
                    kind: "recurrence interval",
                    value,
                }),
            }
        }
    }

    /// Mutation payload for create and update.
    ///
    /// `account_id` and `category_id` must reference records that already
    /// exist server-side.
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct TransactionFormData {
        pub amount: f64,
        /// ISO date (`YYYY-MM-DD`).
        pub date: String,
        pub description: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub notes: Option<String>,
        #[serde(rename = "type")]
        pub kind: TransactionType,
        pub status: TransactionStatus,
        pub account_id: String,
        pub category_id: String,
        pub is_recurring: bool,
        /// Required when `is_recurring` is set, omitted otherwise.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub recurrence_interval: Option<RecurrenceInterval>,
    }

    impl TransactionFormData {
        /// Checks the payload before it is sent.
        ///
        /// Returns the first problem found as a human readable message.
        pub fn validate(&self) -> Result<(), String> {
            if !self.amount.is_finite() || self.amount < 0.0 {
                return Err("amount must be a non-negative number".to_string());
            }
            if self.date.trim().is_empty() {
                return Err("date is required".to_string());
            }
            if self.account_id.trim().is_empty() {
                return Err("account is required".to_string());
            }
            if self.category_id.trim().is_empty() {
                return Err("category is required".to_string());
            }
            if self.is_recurring && self.recurrence_interval.is_none() {
                return Err("recurring transactions need a recurrence interval".to_string());
            }
            Ok(())
        }

        /// Drops the interval when the transaction is not recurring and
        /// blank notes, matching what the server expects.
        pub fn normalized(mut self) -> Self {
            if !self.is_recurring {
                self.recurrence_interval = None;
            }
            if self.notes.as_deref().is_some_and(|notes| notes.trim().is_empty()) {
                self.notes = None;
            }
            self
        }
    }
}
