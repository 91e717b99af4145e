//! Aggregates feeding the dashboard cards, charts and reports.
//!
//! All sums are exact integer cents. Negative amounts violate the
//! transaction invariant and count as zero instead of failing the whole
//! view.

use std::{
    collections::{BTreeMap, HashMap},
    fmt,
};

use chrono::Datelike;

use crate::{MoneyCents, Transaction};

/// Number of categories shown by [`category_breakdown`].
pub const TOP_CATEGORIES: usize = 10;

/// Label used by [`category_split`] for transactions without a category.
pub const UNCATEGORIZED: &str = "Uncategorized";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransactionTotals {
    pub income: MoneyCents,
    pub expense: MoneyCents,
    pub balance: MoneyCents,
}

impl TransactionTotals {
    fn add(&mut self, transaction: &Transaction) {
        let amount = transaction.amount.or_zero_if_negative();
        if transaction.is_income() {
            self.income += amount;
        } else {
            self.expense += amount;
        }
        self.balance = self.income - self.expense;
    }
}

pub fn totals(transactions: &[Transaction]) -> TransactionTotals {
    let mut totals = TransactionTotals::default();
    for transaction in transactions {
        totals.add(transaction);
    }
    totals
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthlySummary {
    pub month: YearMonth,
    pub income: MoneyCents,
    pub expense: MoneyCents,
    pub balance: MoneyCents,
    pub transaction_count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MonthlyBreakdown {
    /// Ascending by month.
    pub months: Vec<MonthlySummary>,
    /// Transactions left out because their date does not parse.
    pub undated: usize,
}

/// Groups transactions by calendar month.
///
/// A transaction whose date does not parse joins no month; it is counted in
/// [`MonthlyBreakdown::undated`] so callers can tell the series is partial.
pub fn monthly_breakdown(transactions: &[Transaction]) -> MonthlyBreakdown {
    let mut months: BTreeMap<YearMonth, TransactionTotals> = BTreeMap::new();
    let mut counts: HashMap<YearMonth, usize> = HashMap::new();
    let mut undated = 0;

    for transaction in transactions {
        let Some(day) = transaction.day() else {
            undated += 1;
            continue;
        };
        let key = YearMonth {
            year: day.year(),
            month: day.month(),
        };
        months.entry(key).or_default().add(transaction);
        *counts.entry(key).or_default() += 1;
    }

    MonthlyBreakdown {
        months: months
            .into_iter()
            .map(|(month, totals)| MonthlySummary {
                month,
                income: totals.income,
                expense: totals.expense,
                balance: totals.balance,
                transaction_count: counts.get(&month).copied().unwrap_or_default(),
            })
            .collect(),
        undated,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategorySummary {
    pub category: String,
    pub total: MoneyCents,
    pub count: usize,
    /// Share of all expenses, `0.0..=100.0`.
    pub percentage: f64,
}

/// Every expense category, largest first. Ties keep first-seen order.
pub fn category_breakdown_all(transactions: &[Transaction]) -> Vec<CategorySummary> {
    let expenses = transactions.iter().filter(|tx| tx.is_expense());
    let mut groups = group_by_category(expenses, |name| name.to_string());

    let total_expenses: MoneyCents = groups.iter().map(|group| group.total).sum();
    for group in &mut groups {
        group.percentage = percentage(group.total, total_expenses);
    }

    // `sort_by` is stable, which keeps first-encountered order on ties.
    groups.sort_by(|a, b| b.total.cmp(&a.total));
    groups
}

/// The [`TOP_CATEGORIES`] largest expense categories.
///
/// Percentages are relative to all expenses, not just the ones returned.
pub fn category_breakdown(transactions: &[Transaction]) -> Vec<CategorySummary> {
    let mut groups = category_breakdown_all(transactions);
    groups.truncate(TOP_CATEGORIES);
    groups
}

fn percentage(part: MoneyCents, whole: MoneyCents) -> f64 {
    if whole.cents() <= 0 {
        return 0.0;
    }
    100.0 * part.cents() as f64 / whole.cents() as f64
}

fn group_by_category<'a>(
    transactions: impl Iterator<Item = &'a Transaction>,
    label: impl Fn(&str) -> String,
) -> Vec<CategorySummary> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<CategorySummary> = Vec::new();

    for transaction in transactions {
        let category = label(&transaction.category_name);
        let position = *index.entry(category.clone()).or_insert_with(|| {
            groups.push(CategorySummary {
                category,
                total: MoneyCents::ZERO,
                count: 0,
                percentage: 0.0,
            });
            groups.len() - 1
        });
        let group = &mut groups[position];
        group.total += transaction.amount.or_zero_if_negative();
        group.count += 1;
    }

    groups
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Summary {
    pub totals: TransactionTotals,
    pub transaction_count: usize,
    /// Mean absolute amount per transaction, rounded to the cent.
    pub average: MoneyCents,
}

pub fn summary(transactions: &[Transaction]) -> Summary {
    let totals = totals(transactions);
    let transaction_count = transactions.len();
    let average = if transaction_count == 0 {
        MoneyCents::ZERO
    } else {
        let moved = (totals.income + totals.expense).cents() as f64;
        MoneyCents::new((moved / transaction_count as f64).round() as i64)
    };

    Summary {
        totals,
        transaction_count,
        average,
    }
}

/// Per-category totals for each side of the ledger, as drawn by the two
/// pie charts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategorySplit {
    pub income: Vec<CategorySummary>,
    pub expense: Vec<CategorySummary>,
}

pub fn category_split(transactions: &[Transaction]) -> CategorySplit {
    let label = |name: &str| {
        if name.trim().is_empty() {
            UNCATEGORIZED.to_string()
        } else {
            name.to_string()
        }
    };

    let mut split = CategorySplit {
        income: group_by_category(transactions.iter().filter(|tx| tx.is_income()), label),
        expense: group_by_category(transactions.iter().filter(|tx| tx.is_expense()), label),
    };

    for side in [&mut split.income, &mut split.expense] {
        let total: MoneyCents = side.iter().map(|group| group.total).sum();
        for group in side.iter_mut() {
            group.percentage = percentage(group.total, total);
        }
    }

    split
}
