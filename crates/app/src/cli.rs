use std::path::PathBuf;

use api_types::{
    account::AccountType,
    transaction::{RecurrenceInterval, TransactionStatus, TransactionType},
};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use engine::filter::{CategoryFilter, DateRange, FilterCriteria, TypeFilter};

use crate::{
    config::ConfigArgs,
    error::{AppError, Result},
};

#[derive(Debug, Parser)]
#[command(name = "nexkontrol")]
#[command(about = "Track income and expenses against a Nexkontrol server")]
pub struct Cli {
    #[command(flatten)]
    pub config: ConfigArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Sign in and remember the session.
    Login {
        #[arg(long)]
        email: String,
    },
    /// Create an account and sign in.
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
    },
    /// Forget the stored session.
    Logout,
    /// Check whether the stored session is still accepted.
    Status,
    /// List transactions matching the filters.
    List(FilterArgs),
    /// Totals, count and average of the matching transactions.
    Summary(FilterArgs),
    /// Income, expense and balance per month.
    Monthly(FilterArgs),
    /// Largest expense categories.
    Categories {
        #[command(flatten)]
        filters: FilterArgs,
        /// Show income and expense categories side by side.
        #[arg(long)]
        split: bool,
    },
    /// Write recent transactions to a CSV file.
    Export {
        /// Look-back window in days: 30, 90, 180 or 365.
        #[arg(long, default_value_t = 30)]
        period: u64,
        /// Output path; defaults to a dated name in the current directory.
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Record a new transaction.
    Add(TransactionArgs),
    /// Replace an existing transaction.
    Edit {
        id: String,
        #[command(flatten)]
        fields: TransactionArgs,
    },
    /// Remove a transaction.
    Delete { id: String },
    /// Ask the financial assistant a question.
    Ask {
        #[arg(required = true, num_args = 1..)]
        question: Vec<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
    All,
    Income,
    Expense,
}

impl KindArg {
    fn transaction_type(self) -> Option<TransactionType> {
        match self {
            Self::All => None,
            Self::Income => Some(TransactionType::Income),
            Self::Expense => Some(TransactionType::Expense),
        }
    }
}

#[derive(Debug, Default, Args)]
pub struct FilterArgs {
    /// Case-insensitive text in description or category.
    #[arg(long, default_value = "")]
    pub search: String,
    /// Exact category name.
    #[arg(long)]
    pub category: Option<String>,
    #[arg(long = "type", value_enum)]
    pub kind: Option<KindArg>,
    /// First day included (YYYY-MM-DD).
    #[arg(long)]
    pub from: Option<NaiveDate>,
    /// Last day included (YYYY-MM-DD).
    #[arg(long)]
    pub to: Option<NaiveDate>,
}

impl FilterArgs {
    pub fn criteria(&self) -> FilterCriteria {
        FilterCriteria {
            search_term: self.search.clone(),
            category: self
                .category
                .as_deref()
                .map(CategoryFilter::from)
                .unwrap_or_default(),
            kind: self
                .kind
                .and_then(KindArg::transaction_type)
                .map(TypeFilter::Only)
                .unwrap_or_default(),
            date_range: DateRange::new(self.from, self.to),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StatusArg {
    Paid,
    Pending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AccountKindArg {
    Bank,
    CreditCard,
    Cash,
    DigitalWallet,
}

impl From<AccountKindArg> for AccountType {
    fn from(value: AccountKindArg) -> Self {
        match value {
            AccountKindArg::Bank => Self::Bank,
            AccountKindArg::CreditCard => Self::CreditCard,
            AccountKindArg::Cash => Self::Cash,
            AccountKindArg::DigitalWallet => Self::DigitalWallet,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum IntervalArg {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl From<IntervalArg> for RecurrenceInterval {
    fn from(value: IntervalArg) -> Self {
        match value {
            IntervalArg::Daily => Self::Daily,
            IntervalArg::Weekly => Self::Weekly,
            IntervalArg::Monthly => Self::Monthly,
            IntervalArg::Yearly => Self::Yearly,
        }
    }
}

#[derive(Debug, Args)]
pub struct TransactionArgs {
    /// Positive amount, e.g. 12.50 or 12,50.
    #[arg(long)]
    pub amount: String,
    #[arg(long)]
    pub date: NaiveDate,
    #[arg(long)]
    pub description: String,
    #[arg(long)]
    pub notes: Option<String>,
    #[arg(long = "type", value_enum)]
    pub kind: KindArg,
    #[arg(long, value_enum, default_value_t = StatusArg::Paid)]
    pub status: StatusArg,
    /// Existing account id.
    #[arg(long, conflicts_with = "new_account")]
    pub account: Option<String>,
    /// Create an account with this name first.
    #[arg(long)]
    pub new_account: Option<String>,
    #[arg(long, value_enum, default_value_t = AccountKindArg::Bank)]
    pub new_account_type: AccountKindArg,
    /// Initial balance of the account created with `--new-account`.
    #[arg(long, default_value_t = 0.0)]
    pub new_account_balance: f64,
    /// Existing category id.
    #[arg(long, conflicts_with = "new_category")]
    pub category: Option<String>,
    /// Create a category with this name first.
    #[arg(long)]
    pub new_category: Option<String>,
    #[arg(long, value_enum)]
    pub recurring: Option<IntervalArg>,
}

impl TransactionArgs {
    pub fn kind(&self) -> Result<TransactionType> {
        self.kind
            .transaction_type()
            .ok_or_else(|| AppError::Input("--type must be income or expense".to_string()))
    }

    pub fn status(&self) -> TransactionStatus {
        match self.status {
            StatusArg::Paid => TransactionStatus::Completed,
            StatusArg::Pending => TransactionStatus::Pending,
        }
    }
}
