//! Filtered views over a transaction collection.
//!
//! Each criterion is an independent predicate and a transaction is kept only
//! when every active predicate accepts it, so the order in which criteria are
//! applied never changes the result and filtering twice is the same as
//! filtering once.

use chrono::NaiveDate;

use crate::{EngineError, ResultEngine, Transaction, TransactionType, transactions::parse_day};

/// Sentinel used by the UI to disable the category and type filters.
pub const ALL: &str = "all";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self { start, end }
    }

    /// Builds a range from ISO date strings. Empty strings leave the bound
    /// unset.
    pub fn parse(start: &str, end: &str) -> ResultEngine<Self> {
        Ok(Self {
            start: parse_bound(start)?,
            end: parse_bound(end)?,
        })
    }

    pub fn is_set(&self) -> bool {
        self.start.is_some() || self.end.is_some()
    }

    /// Inclusive on both ends. With any bound set, a transaction whose date
    /// does not parse is outside the range.
    pub fn contains(&self, transaction: &Transaction) -> bool {
        if !self.is_set() {
            return true;
        }
        let Some(day) = transaction.day() else {
            return false;
        };
        self.start.is_none_or(|start| day >= start) && self.end.is_none_or(|end| day <= end)
    }
}

fn parse_bound(raw: &str) -> ResultEngine<Option<NaiveDate>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    parse_day(raw)
        .map(Some)
        .ok_or_else(|| EngineError::InvalidDate(raw.to_string()))
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CategoryFilter {
    #[default]
    All,
    Named(String),
}

impl CategoryFilter {
    pub fn matches(&self, transaction: &Transaction) -> bool {
        match self {
            Self::All => true,
            Self::Named(name) => transaction.category_name == *name,
        }
    }
}

impl From<&str> for CategoryFilter {
    fn from(value: &str) -> Self {
        if value == ALL {
            Self::All
        } else {
            Self::Named(value.to_string())
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TypeFilter {
    #[default]
    All,
    Only(TransactionType),
}

impl TypeFilter {
    pub fn matches(&self, transaction: &Transaction) -> bool {
        match self {
            Self::All => true,
            Self::Only(kind) => transaction.kind == *kind,
        }
    }
}

impl TryFrom<&str> for TypeFilter {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_lowercase().as_str() {
            ALL => Ok(Self::All),
            "income" | "entrada" => Ok(Self::Only(TransactionType::Income)),
            "expense" | "saída" | "saida" => Ok(Self::Only(TransactionType::Expense)),
            other => Err(EngineError::InvalidForm(format!(
                "unknown transaction type filter: {other}"
            ))),
        }
    }
}

/// Filter state owned by the UI.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    pub search_term: String,
    pub category: CategoryFilter,
    pub kind: TypeFilter,
    pub date_range: DateRange,
}

impl FilterCriteria {
    /// Resets every filter to its disabled state.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn is_active(&self) -> bool {
        !self.search_term.is_empty()
            || self.category != CategoryFilter::All
            || self.kind != TypeFilter::All
            || self.date_range.is_set()
    }

    /// Case-insensitive substring match on description or category name.
    pub fn matches_search(&self, transaction: &Transaction) -> bool {
        if self.search_term.is_empty() {
            return true;
        }
        let needle = self.search_term.to_lowercase();
        transaction.description.to_lowercase().contains(&needle)
            || transaction.category_name.to_lowercase().contains(&needle)
    }

    pub fn matches(&self, transaction: &Transaction) -> bool {
        self.date_range.contains(transaction)
            && self.matches_search(transaction)
            && self.category.matches(transaction)
            && self.kind.matches(transaction)
    }
}

/// Returns the transactions accepted by every active criterion, in their
/// original order.
pub fn filter(transactions: &[Transaction], criteria: &FilterCriteria) -> Vec<Transaction> {
    transactions
        .iter()
        .filter(|transaction| criteria.matches(transaction))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MoneyCents, TransactionStatus};

    fn tx(id: &str, date: &str, description: &str, category: &str, kind: TransactionType) -> Transaction {
        Transaction {
            id: id.to_string(),
            date: date.to_string(),
            description: description.to_string(),
            category_name: category.to_string(),
            kind,
            amount: MoneyCents::new(100),
            status: TransactionStatus::Completed,
            is_recurring: false,
            notes: String::new(),
        }
    }

    fn sample() -> Vec<Transaction> {
        vec![
            tx("1", "2024-01-05", "Supermarket", "Food", TransactionType::Expense),
            tx("2", "2024-02-10", "Salary", "Work", TransactionType::Income),
            tx("3", "2024-03-01", "Train ticket", "Transport", TransactionType::Expense),
            tx("4", "2024-02-20", "Food truck", "Leisure", TransactionType::Expense),
            tx("5", "not a date", "Lunch", "Food", TransactionType::Expense),
        ]
    }

    fn ids(transactions: &[Transaction]) -> Vec<&str> {
        transactions.iter().map(|tx| tx.id.as_str()).collect()
    }

    #[test]
    fn empty_criteria_keep_everything() {
        let all = sample();
        assert_eq!(filter(&all, &FilterCriteria::default()), all);
    }

    #[test]
    fn date_range_is_inclusive() {
        let criteria = FilterCriteria {
            date_range: DateRange::parse("2024-02-01", "2024-02-28").unwrap(),
            ..Default::default()
        };
        let transactions = vec![
            tx("a", "2024-01-05", "", "", TransactionType::Expense),
            tx("b", "2024-02-10", "", "", TransactionType::Expense),
            tx("c", "2024-03-01", "", "", TransactionType::Expense),
        ];
        assert_eq!(ids(&filter(&transactions, &criteria)), ["b"]);

        let edges = DateRange::parse("2024-01-05", "2024-03-01").unwrap();
        assert!(transactions.iter().all(|t| edges.contains(t)));
    }

    #[test]
    fn undated_transactions_fall_outside_any_range() {
        let open_start = FilterCriteria {
            date_range: DateRange::parse("", "2030-01-01").unwrap(),
            ..Default::default()
        };
        assert!(!ids(&filter(&sample(), &open_start)).contains(&"5"));
        assert!(ids(&filter(&sample(), &FilterCriteria::default())).contains(&"5"));
    }

    #[test]
    fn search_matches_description_or_category_ignoring_case() {
        let criteria = FilterCriteria {
            search_term: "FOOD".to_string(),
            ..Default::default()
        };
        assert_eq!(ids(&filter(&sample(), &criteria)), ["1", "4", "5"]);
    }

    #[test]
    fn category_and_type_sentinels() {
        assert_eq!(CategoryFilter::from("all"), CategoryFilter::All);
        assert_eq!(TypeFilter::try_from("all").unwrap(), TypeFilter::All);
        assert_eq!(
            TypeFilter::try_from("Income").unwrap(),
            TypeFilter::Only(TransactionType::Income)
        );
        assert!(TypeFilter::try_from("transfer").is_err());

        let criteria = FilterCriteria {
            category: CategoryFilter::from("Food"),
            kind: TypeFilter::Only(TransactionType::Expense),
            ..Default::default()
        };
        assert_eq!(ids(&filter(&sample(), &criteria)), ["1", "5"]);
    }

    #[test]
    fn filters_are_order_insensitive() {
        let full = FilterCriteria {
            search_term: "o".to_string(),
            category: CategoryFilter::All,
            kind: TypeFilter::Only(TransactionType::Expense),
            date_range: DateRange::parse("2024-01-01", "2024-02-28").unwrap(),
        };
        let singles = [
            FilterCriteria {
                search_term: full.search_term.clone(),
                ..Default::default()
            },
            FilterCriteria {
                kind: full.kind,
                ..Default::default()
            },
            FilterCriteria {
                date_range: full.date_range,
                ..Default::default()
            },
        ];
        let expected = filter(&sample(), &full);

        for order in [[0, 1, 2], [2, 1, 0], [1, 0, 2], [2, 0, 1]] {
            let mut current = sample();
            for index in order {
                current = filter(&current, &singles[index]);
            }
            assert_eq!(current, expected);
        }
    }

    #[test]
    fn filtering_is_idempotent() {
        let criteria = FilterCriteria {
            search_term: "a".to_string(),
            date_range: DateRange::parse("2024-01-01", "").unwrap(),
            ..Default::default()
        };
        let once = filter(&sample(), &criteria);
        assert_eq!(filter(&once, &criteria), once);
    }

    #[test]
    fn clear_disables_everything() {
        let mut criteria = FilterCriteria {
            search_term: "x".to_string(),
            category: CategoryFilter::from("Food"),
            kind: TypeFilter::Only(TransactionType::Income),
            date_range: DateRange::parse("2024-01-01", "2024-12-31").unwrap(),
        };
        assert!(criteria.is_active());
        criteria.clear();
        assert!(!criteria.is_active());
    }

    #[test]
    fn invalid_bound_is_reported() {
        assert_eq!(
            DateRange::parse("soon", "").unwrap_err(),
            EngineError::InvalidDate("soon".to_string())
        );
    }
}
