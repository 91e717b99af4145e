//! CSV export of a transaction collection.

use chrono::{Days, NaiveDate};

use crate::{EngineError, ResultEngine, Transaction, TransactionStatus, TransactionType};

/// Localized strings used in the exported document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportLabels {
    pub headers: [&'static str; 7],
    pub income: &'static str,
    pub expense: &'static str,
    pub completed: &'static str,
    pub pending: &'static str,
}

impl ReportLabels {
    pub fn portuguese() -> Self {
        Self {
            headers: [
                "Data",
                "Tipo",
                "Descrição",
                "Categoria",
                "Valor",
                "Status",
                "Observações",
            ],
            income: "Entrada",
            expense: "Saída",
            completed: "Concluída",
            pending: "Pendente",
        }
    }

    pub fn english() -> Self {
        Self {
            headers: [
                "Date",
                "Type",
                "Description",
                "Category",
                "Amount",
                "Status",
                "Notes",
            ],
            income: "Income",
            expense: "Expense",
            completed: "Completed",
            pending: "Pending",
        }
    }

    fn kind(&self, kind: TransactionType) -> &'static str {
        match kind {
            TransactionType::Income => self.income,
            TransactionType::Expense => self.expense,
        }
    }

    fn status(&self, status: TransactionStatus) -> &'static str {
        match status {
            TransactionStatus::Completed => self.completed,
            TransactionStatus::Pending => self.pending,
        }
    }
}

impl Default for ReportLabels {
    fn default() -> Self {
        Self::portuguese()
    }
}

/// Writes `transactions` as comma separated UTF-8 text, keeping their order.
///
/// Fields containing commas, quotes or line breaks are quoted.
pub fn export_csv(transactions: &[Transaction], labels: &ReportLabels) -> ResultEngine<String> {
    let mut writer = csv::Writer::from_writer(vec![]);
    writer.write_record(labels.headers)?;

    for transaction in transactions {
        let amount = transaction.amount.to_string();
        writer.write_record([
            transaction.date.as_str(),
            labels.kind(transaction.kind),
            transaction.description.as_str(),
            transaction.category_name.as_str(),
            amount.as_str(),
            labels.status(transaction.status),
            transaction.notes.as_str(),
        ])?;
    }

    let data = writer
        .into_inner()
        .map_err(|err| EngineError::Encoding(err.to_string()))?;
    String::from_utf8(data).map_err(|err| EngineError::Encoding(err.to_string()))
}

/// Look-back windows offered by the reports screen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReportPeriod {
    #[default]
    Last30Days,
    Last90Days,
    Last180Days,
    LastYear,
}

impl ReportPeriod {
    pub fn days(self) -> u64 {
        match self {
            Self::Last30Days => 30,
            Self::Last90Days => 90,
            Self::Last180Days => 180,
            Self::LastYear => 365,
        }
    }

    pub fn from_days(days: u64) -> Option<Self> {
        match days {
            30 => Some(Self::Last30Days),
            90 => Some(Self::Last90Days),
            180 => Some(Self::Last180Days),
            365 => Some(Self::LastYear),
            _ => None,
        }
    }

    /// First day included in the period.
    pub fn start(self, today: NaiveDate) -> NaiveDate {
        today
            .checked_sub_days(Days::new(self.days()))
            .unwrap_or(NaiveDate::MIN)
    }

    /// Transactions dated on or after [`ReportPeriod::start`]. Undated
    /// transactions are left out.
    pub fn bound(self, transactions: &[Transaction], today: NaiveDate) -> Vec<Transaction> {
        let start = self.start(today);
        transactions
            .iter()
            .filter(|tx| tx.day().is_some_and(|day| day >= start))
            .cloned()
            .collect()
    }
}

/// Download name for an export, e.g. `transacoes_30dias_2024-03-01.csv`.
pub fn export_file_name(period: ReportPeriod, today: NaiveDate) -> String {
    format!(
        "transacoes_{}dias_{}.csv",
        period.days(),
        today.format("%Y-%m-%d")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MoneyCents;

    fn tx(id: &str, date: &str, description: &str, notes: &str) -> Transaction {
        Transaction {
            id: id.to_string(),
            date: date.to_string(),
            description: description.to_string(),
            category_name: "Food".to_string(),
            kind: TransactionType::Expense,
            amount: MoneyCents::new(1250),
            status: TransactionStatus::Completed,
            is_recurring: false,
            notes: notes.to_string(),
        }
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn header_and_rows_in_input_order() {
        let mut income = tx("2", "2024-02-01", "Salary", "");
        income.kind = TransactionType::Income;
        income.status = TransactionStatus::Pending;
        income.amount = MoneyCents::new(300_000);

        let csv = export_csv(
            &[tx("1", "2024-01-05", "Lunch", ""), income],
            &ReportLabels::portuguese(),
        )
        .unwrap();
        let lines: Vec<_> = csv.lines().collect();
        assert_eq!(lines[0], "Data,Tipo,Descrição,Categoria,Valor,Status,Observações");
        assert_eq!(lines[1], "2024-01-05,Saída,Lunch,Food,12.50,Concluída,");
        assert_eq!(lines[2], "2024-02-01,Entrada,Salary,Food,3000.00,Pendente,");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn fields_with_delimiters_or_quotes_are_quoted() {
        let csv = export_csv(
            &[tx("1", "2024-01-05", "Rice, beans", "the \"good\" one")],
            &ReportLabels::english(),
        )
        .unwrap();
        let row = csv.lines().nth(1).unwrap();
        assert_eq!(
            row,
            "2024-01-05,Expense,\"Rice, beans\",Food,12.50,Completed,\"the \"\"good\"\" one\""
        );
    }

    #[test]
    fn empty_collection_still_has_header() {
        let csv = export_csv(&[], &ReportLabels::english()).unwrap();
        assert_eq!(csv, "Date,Type,Description,Category,Amount,Status,Notes\n");
    }

    #[test]
    fn period_bound_keeps_recent_dated_transactions() {
        let today = day(2024, 3, 31);
        let transactions = vec![
            tx("old", "2024-02-29", "", ""),
            tx("edge", "2024-03-01", "", ""),
            tx("new", "2024-03-30", "", ""),
            tx("undated", "", "", ""),
        ];
        let kept: Vec<_> = ReportPeriod::Last30Days
            .bound(&transactions, today)
            .into_iter()
            .map(|tx| tx.id)
            .collect();
        assert_eq!(kept, ["edge", "new"]);
        assert_eq!(ReportPeriod::LastYear.start(today), day(2023, 4, 1));
    }

    #[test]
    fn file_name_mentions_period_and_day() {
        assert_eq!(
            export_file_name(ReportPeriod::Last90Days, day(2024, 3, 1)),
            "transacoes_90dias_2024-03-01.csv"
        );
        assert_eq!(ReportPeriod::from_days(180), Some(ReportPeriod::Last180Days));
        assert_eq!(ReportPeriod::from_days(7), None);
    }
}
