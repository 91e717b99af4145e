use std::path::PathBuf;

use api_types::{
    account::NewAccount,
    category::NewCategory,
    transaction::{TransactionFormData, TransactionStatus, TransactionType},
};
use client::{DerivedViews, SessionManager, TransactionDraft, TransactionStore};
use engine::{
    MoneyCents, Transaction,
    filter::FilterCriteria,
    report::{self, ReportPeriod},
    stats::{self, CategorySummary},
};
use tokio_util::sync::CancellationToken;

use crate::{
    cli::{Command, FilterArgs, TransactionArgs},
    config::AppConfig,
    error::{AppError, Result},
    prompt,
};

pub struct Context {
    pub config: AppConfig,
    pub sessions: SessionManager,
    pub store: TransactionStore,
    pub cancel: CancellationToken,
}

pub async fn run(ctx: &Context, command: Command) -> Result<()> {
    match command {
        Command::Login { email } => {
            let password = prompt::password()?;
            let credential = ctx.sessions.login(&email, &password).await?;
            println!("Logged in as {}", credential.name);
        }
        Command::Register { name, email } => {
            let password = prompt::new_password()?;
            let credential = ctx.sessions.register(&name, &email, &password).await?;
            println!("Welcome, {}", credential.name);
        }
        Command::Logout => {
            ctx.sessions.logout();
            println!("Logged out");
        }
        Command::Status => status(ctx).await,
        Command::List(filters) => list(ctx, &filters).await?,
        Command::Summary(filters) => summary(ctx, &filters).await?,
        Command::Monthly(filters) => monthly(ctx, &filters).await?,
        Command::Categories { filters, split } => categories(ctx, &filters, split).await?,
        Command::Export { period, out } => export(ctx, period, out).await?,
        Command::Add(fields) => add(ctx, fields).await?,
        Command::Edit { id, fields } => edit(ctx, &id, fields).await?,
        Command::Delete { id } => {
            ctx.store.delete(&id, &ctx.cancel).await?;
            println!("Transaction deleted");
        }
        Command::Ask { question } => ask(ctx, &question.join(" ")).await?,
    }
    Ok(())
}

async fn status(ctx: &Context) {
    let Some(credential) = ctx.sessions.session().credential() else {
        println!("Not logged in");
        return;
    };
    if ctx.sessions.validate().await {
        println!("Logged in as {} <{}>", credential.name, credential.email);
    } else {
        println!("Session expired, log in again");
    }
}

async fn views(ctx: &Context, criteria: &FilterCriteria) -> Result<DerivedViews> {
    ctx.store.fetch(&ctx.cancel).await?;
    Ok(DerivedViews::compute(&ctx.store.snapshot(), criteria))
}

async fn list(ctx: &Context, filters: &FilterArgs) -> Result<()> {
    let views = views(ctx, &filters.criteria()).await?;
    for transaction in &views.filtered {
        println!("{}", row(transaction));
    }
    println!(
        "{} of {} transactions | balance {}",
        views.filtered.len(),
        ctx.store.snapshot().transactions.len(),
        views.totals.balance
    );
    Ok(())
}

async fn summary(ctx: &Context, filters: &FilterArgs) -> Result<()> {
    let views = views(ctx, &filters.criteria()).await?;
    let summary = &views.summary;
    println!("Transactions  {}", summary.transaction_count);
    println!("Income        {}", summary.totals.income);
    println!("Expense       {}", summary.totals.expense);
    println!("Balance       {}", summary.totals.balance);
    println!("Average       {}", summary.average);
    Ok(())
}

async fn monthly(ctx: &Context, filters: &FilterArgs) -> Result<()> {
    let views = views(ctx, &filters.criteria()).await?;
    println!(
        "{:<8} {:>12} {:>12} {:>12} {:>6}",
        "Month", "Income", "Expense", "Balance", "Count"
    );
    for month in &views.monthly.months {
        println!(
            "{:<8} {:>12} {:>12} {:>12} {:>6}",
            month.month.to_string(),
            month.income.to_string(),
            month.expense.to_string(),
            month.balance.to_string(),
            month.transaction_count
        );
    }
    if views.monthly.undated > 0 {
        println!("{} transactions without a usable date", views.monthly.undated);
    }
    Ok(())
}

async fn categories(ctx: &Context, filters: &FilterArgs, split: bool) -> Result<()> {
    let views = views(ctx, &filters.criteria()).await?;
    if !split {
        print_categories(&views.categories);
        return Ok(());
    }

    let split = stats::category_split(&views.filtered);
    println!("Income");
    print_categories(&split.income);
    println!("Expense");
    print_categories(&split.expense);
    Ok(())
}

fn print_categories(groups: &[CategorySummary]) {
    for group in groups {
        println!(
            "{:<24} {:>12} {:>6.1}% ({})",
            group.category,
            group.total.to_string(),
            group.percentage,
            group.count
        );
    }
}

async fn export(ctx: &Context, days: u64, out: Option<PathBuf>) -> Result<()> {
    let period = ReportPeriod::from_days(days).ok_or_else(|| {
        AppError::Input(format!("unsupported period: {days} (use 30, 90, 180 or 365)"))
    })?;
    let labels = ctx.config.report_labels()?;
    let today = chrono::Local::now().date_naive();

    ctx.store.fetch(&ctx.cancel).await?;
    let transactions = period.bound(&ctx.store.snapshot().transactions, today);
    let document = report::export_csv(&transactions, &labels)?;

    let path = out.unwrap_or_else(|| PathBuf::from(report::export_file_name(period, today)));
    std::fs::write(&path, document)?;
    tracing::info!(path = %path.display(), rows = transactions.len(), "report exported");
    println!(
        "Exported {} transactions to {}",
        transactions.len(),
        path.display()
    );
    Ok(())
}

async fn ask(ctx: &Context, question: &str) -> Result<()> {
    if question.trim().is_empty() {
        return Err(AppError::Input("question must not be empty".to_string()));
    }
    let answer = ctx.store.ask(question, &ctx.cancel).await?;
    println!("{answer}");
    Ok(())
}

fn form_data(fields: &TransactionArgs) -> Result<TransactionFormData> {
    let amount: MoneyCents = fields.amount.parse()?;
    Ok(TransactionFormData {
        amount: amount.as_f64(),
        date: fields.date.format("%Y-%m-%d").to_string(),
        description: fields.description.clone(),
        notes: fields.notes.clone(),
        kind: fields.kind()?,
        status: fields.status(),
        account_id: fields.account.clone().unwrap_or_default(),
        category_id: fields.category.clone().unwrap_or_default(),
        is_recurring: fields.recurring.is_some(),
        recurrence_interval: fields.recurring.map(Into::into),
    })
}

fn draft(fields: TransactionArgs) -> Result<TransactionDraft> {
    Ok(TransactionDraft {
        data: form_data(&fields)?,
        new_account: fields.new_account.map(|name| NewAccount {
            name,
            initial_balance: fields.new_account_balance,
            kind: fields.new_account_type.into(),
        }),
        new_category: fields
            .new_category
            .map(|category_name| NewCategory { category_name }),
    })
}

async fn add(ctx: &Context, fields: TransactionArgs) -> Result<()> {
    match ctx.store.submit(draft(fields)?, &ctx.cancel).await? {
        Some(created) => println!("Created {}", row(&created)),
        None => println!("Transaction created"),
    }
    Ok(())
}

async fn edit(ctx: &Context, id: &str, fields: TransactionArgs) -> Result<()> {
    let TransactionDraft {
        mut data,
        new_account,
        new_category,
    } = draft(fields)?;

    if let Some(category) = new_category {
        data.category_id = ctx.store.create_category(category, &ctx.cancel).await?;
    }
    if let Some(account) = new_account {
        data.account_id = ctx.store.create_account(account, &ctx.cancel).await?;
    }

    match ctx.store.update(id, data, &ctx.cancel).await? {
        Some(updated) => println!("Updated {}", row(&updated)),
        None => println!("Transaction updated"),
    }
    Ok(())
}

fn row(transaction: &Transaction) -> String {
    let kind = match transaction.kind {
        TransactionType::Income => "+",
        TransactionType::Expense => "-",
    };
    let status = match transaction.status {
        TransactionStatus::Completed => "paid",
        TransactionStatus::Pending => "pending",
    };
    format!(
        "{:<10} {}{:>11} {:<8} {:<20} {} [{}]",
        transaction.date.get(..10).unwrap_or(&transaction.date),
        kind,
        transaction.amount.to_string(),
        status,
        transaction.category_name,
        transaction.description,
        transaction.id
    )
}

#[cfg(test)]
mod tests {
    use api_types::transaction::RecurrenceInterval;
    use chrono::NaiveDate;

    use super::*;
    use crate::cli::{AccountKindArg, IntervalArg, KindArg, StatusArg};

    fn fields() -> TransactionArgs {
        TransactionArgs {
            amount: "12,50".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 3, 9).unwrap(),
            description: "Vet".to_string(),
            notes: None,
            kind: KindArg::Expense,
            status: StatusArg::Pending,
            account: Some("acc-1".to_string()),
            new_account: None,
            new_account_type: AccountKindArg::Bank,
            new_account_balance: 0.0,
            category: None,
            new_category: Some("Pets".to_string()),
            recurring: Some(IntervalArg::Monthly),
        }
    }

    #[test]
    fn flags_become_a_draft() {
        let draft = draft(fields()).unwrap();
        assert_eq!(draft.data.amount, 12.5);
        assert_eq!(draft.data.date, "2024-03-09");
        assert_eq!(draft.data.status, TransactionStatus::Pending);
        assert_eq!(draft.data.account_id, "acc-1");
        assert_eq!(draft.data.category_id, "");
        assert!(draft.data.is_recurring);
        assert_eq!(
            draft.data.recurrence_interval,
            Some(RecurrenceInterval::Monthly)
        );
        assert_eq!(draft.new_category.unwrap().category_name, "Pets");
        assert!(draft.new_account.is_none());
    }

    #[test]
    fn type_all_is_not_a_transaction_type() {
        let mut fields = fields();
        fields.kind = KindArg::All;
        assert!(matches!(draft(fields), Err(AppError::Input(_))));
    }

    #[test]
    fn malformed_amount_is_rejected() {
        let mut fields = fields();
        fields.amount = "12.345".to_string();
        assert!(matches!(draft(fields), Err(AppError::Engine(_))));
    }

    #[test]
    fn row_trims_timestamps_to_the_day() {
        let transaction = Transaction {
            id: "t1".to_string(),
            date: "2024-03-09T10:00:00".to_string(),
            description: "Vet".to_string(),
            category_name: "Pets".to_string(),
            kind: TransactionType::Expense,
            amount: MoneyCents::new(1_250),
            status: TransactionStatus::Completed,
            is_recurring: false,
            notes: String::new(),
        };
        let line = row(&transaction);
        assert!(line.starts_with("2024-03-09 -"));
        assert!(line.contains("12.50"));
        assert!(line.ends_with("[t1]"));
    }
}
