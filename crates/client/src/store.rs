//! Authoritative in-memory transaction set.
//!
//! The server is the system of record: every successful mutation is
//! followed by a full reload instead of patching the local collection.
//!
//! Overlapping fetches are neither deduplicated nor serialized. Each one
//! replaces the collection when its response arrives, so the last response
//! to resolve wins. Mutations are not queued either; callers are expected to
//! avoid submitting the same action twice while it is in flight.
//!
//! Every operation takes a [`CancellationToken`]. Requests run on their own
//! task together with the state update they lead to, so a response is always
//! applied to the shared state. The token only releases the caller: once it
//! fires the operation returns [`StoreError::Cancelled`] while the work
//! finishes in the background. A write the server has already accepted is
//! reported as successful even if the token fires during the reload.

use std::{
    future::Future,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use api_types::{
    account::{Account, NewAccount},
    category::{Category, NewCategory},
    transaction::TransactionFormData,
};
use engine::{
    Transaction, canonical,
    filter::{self, FilterCriteria},
    stats::{self, CategorySummary, MonthlyBreakdown, Summary, TransactionTotals},
};
use tokio::{
    sync::{broadcast, oneshot, watch},
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;

use crate::{ClientError, Gateway, StoreError};

const NOTIFICATION_CAPACITY: usize = 64;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreState {
    pub transactions: Vec<Transaction>,
    pub is_loading: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Success,
    Error,
    /// The server rejected the credential; the session is gone.
    SessionEnded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operation {
    Fetch,
    Create,
    Update,
    Delete,
    ListCategories,
    CreateCategory,
    ListAccounts,
    CreateAccount,
    AskAssistant,
}

impl Operation {
    fn failure_message(self) -> &'static str {
        match self {
            Self::Fetch => "Failed to load transactions",
            Self::Create => "Failed to create transaction",
            Self::Update => "Failed to update transaction",
            Self::Delete => "Failed to delete transaction",
            Self::ListCategories => "Failed to load categories",
            Self::CreateCategory => "Failed to create category",
            Self::ListAccounts => "Failed to load accounts",
            Self::CreateAccount => "Failed to create account",
            Self::AskAssistant => "The assistant could not answer",
        }
    }

    fn success_message(self) -> Option<&'static str> {
        match self {
            Self::Create => Some("Transaction created successfully"),
            Self::Update => Some("Transaction updated successfully"),
            Self::Delete => Some("Transaction deleted successfully"),
            _ => None,
        }
    }
}

/// A transaction about to be submitted, possibly referencing an account or
/// category that has to be created first.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionDraft {
    /// `account_id`/`category_id` are overwritten when the matching `new_*`
    /// field is set.
    pub data: TransactionFormData,
    pub new_account: Option<NewAccount>,
    pub new_category: Option<NewCategory>,
}

#[derive(Debug, Clone)]
pub struct TransactionStore {
    gateway: Gateway,
    state: Arc<watch::Sender<StoreState>>,
    fetches_in_flight: Arc<AtomicUsize>,
    notifications: broadcast::Sender<Notification>,
}

impl TransactionStore {
    pub fn new(gateway: Gateway) -> Self {
        let (state, _) = watch::channel(StoreState::default());
        let (notifications, _) = broadcast::channel(NOTIFICATION_CAPACITY);
        Self {
            gateway,
            state: Arc::new(state),
            fetches_in_flight: Arc::new(AtomicUsize::new(0)),
            notifications,
        }
    }

    pub fn gateway(&self) -> &Gateway {
        &self.gateway
    }

    pub fn snapshot(&self) -> StoreState {
        self.state.borrow().clone()
    }

    /// Receives every state change; derived views should be recomputed on
    /// each one.
    pub fn watch(&self) -> watch::Receiver<StoreState> {
        self.state.subscribe()
    }

    pub fn notifications(&self) -> broadcast::Receiver<Notification> {
        self.notifications.subscribe()
    }

    /// Reloads the whole collection from the server.
    ///
    /// On failure the message is recorded in [`StoreState::error`] and the
    /// previous collection is kept; the error is returned as well.
    pub async fn fetch(&self, cancel: &CancellationToken) -> Result<(), StoreError> {
        if cancel.is_cancelled() {
            return Err(StoreError::Cancelled);
        }
        let store = self.clone();
        wait(cancel, tokio::spawn(async move { store.reload().await })).await
    }

    /// Lists, canonicalizes and publishes the collection, whether or not
    /// anyone is still waiting for it.
    async fn reload(&self) -> Result<(), StoreError> {
        let _loading = LoadingGuard::start(self);

        let result = self
            .gateway
            .list_transactions()
            .await
            .map_err(StoreError::from)
            .and_then(|records| canonical::canonicalize_all(&records).map_err(StoreError::from));

        match result {
            Ok(transactions) => {
                tracing::debug!(count = transactions.len(), "transactions loaded");
                self.state.send_modify(|state| {
                    state.transactions = transactions;
                    state.error = None;
                });
                Ok(())
            }
            Err(err) => {
                if !matches!(err, StoreError::SessionExpired) {
                    let message = err.user_message(Operation::Fetch.failure_message());
                    self.state.send_modify(|state| state.error = Some(message));
                }
                self.report_failure(Operation::Fetch, &err);
                Err(err)
            }
        }
    }

    /// Creates a transaction and reloads. Returns the created record when
    /// the server echoed one back.
    pub async fn create(
        &self,
        data: TransactionFormData,
        cancel: &CancellationToken,
    ) -> Result<Option<Transaction>, StoreError> {
        let data = self.checked(Operation::Create, data)?;
        let gateway = self.gateway.clone();
        let created = self
            .mutate(Operation::Create, cancel, async move {
                gateway.create_transaction(&data).await
            })
            .await?;
        Ok(canonical::canonicalize(&created).ok())
    }

    pub async fn update(
        &self,
        id: &str,
        data: TransactionFormData,
        cancel: &CancellationToken,
    ) -> Result<Option<Transaction>, StoreError> {
        let data = self.checked(Operation::Update, data)?;
        let gateway = self.gateway.clone();
        let id = id.to_string();
        let updated = self
            .mutate(Operation::Update, cancel, async move {
                gateway.update_transaction(&id, &data).await
            })
            .await?;
        Ok(canonical::canonicalize(&updated).ok())
    }

    pub async fn delete(&self, id: &str, cancel: &CancellationToken) -> Result<(), StoreError> {
        let gateway = self.gateway.clone();
        let id = id.to_string();
        self.mutate(Operation::Delete, cancel, async move {
            gateway.delete_transaction(&id).await
        })
        .await
    }

    /// Creates the draft's inline account and category, then the
    /// transaction itself.
    ///
    /// Nothing is submitted unless every referenced record exists and has a
    /// server-assigned id.
    pub async fn submit(
        &self,
        draft: TransactionDraft,
        cancel: &CancellationToken,
    ) -> Result<Option<Transaction>, StoreError> {
        let TransactionDraft {
            mut data,
            new_account,
            new_category,
        } = draft;

        if let Some(category) = new_category {
            data.category_id = self.create_category(category, cancel).await?;
        }
        if let Some(account) = new_account {
            data.account_id = self.create_account(account, cancel).await?;
        }

        self.create(data, cancel).await
    }

    pub async fn categories(&self, cancel: &CancellationToken) -> Result<Vec<Category>, StoreError> {
        let gateway = self.gateway.clone();
        self.lookup(Operation::ListCategories, cancel, async move {
            gateway.list_categories().await
        })
        .await
    }

    pub async fn accounts(&self, cancel: &CancellationToken) -> Result<Vec<Account>, StoreError> {
        let gateway = self.gateway.clone();
        self.lookup(Operation::ListAccounts, cancel, async move {
            gateway.list_accounts().await
        })
        .await
    }

    pub async fn create_category(
        &self,
        category: NewCategory,
        cancel: &CancellationToken,
    ) -> Result<String, StoreError> {
        if category.category_name.trim().is_empty() {
            return Err(self.reject(Operation::CreateCategory, "category name is required"));
        }
        let gateway = self.gateway.clone();
        self.lookup(Operation::CreateCategory, cancel, async move {
            gateway.create_category(&category).await
        })
        .await
    }

    pub async fn create_account(
        &self,
        account: NewAccount,
        cancel: &CancellationToken,
    ) -> Result<String, StoreError> {
        if account.name.trim().is_empty() {
            return Err(self.reject(Operation::CreateAccount, "account name is required"));
        }
        let gateway = self.gateway.clone();
        self.lookup(Operation::CreateAccount, cancel, async move {
            gateway.create_account(&account).await
        })
        .await
    }

    /// Asks the financial assistant a free-form question. Blank questions
    /// never reach the server.
    pub async fn ask(
        &self,
        question: &str,
        cancel: &CancellationToken,
    ) -> Result<String, StoreError> {
        let question = question.trim().to_string();
        if question.is_empty() {
            return Err(self.reject(Operation::AskAssistant, "question is required"));
        }
        let gateway = self.gateway.clone();
        self.lookup(Operation::AskAssistant, cancel, async move {
            gateway.ask_ai(&question).await
        })
        .await
    }

    fn checked(
        &self,
        operation: Operation,
        data: TransactionFormData,
    ) -> Result<TransactionFormData, StoreError> {
        let data = data.normalized();
        data.validate()
            .map_err(|message| self.reject(operation, &message))?;
        Ok(data)
    }

    fn reject(&self, operation: Operation, message: &str) -> StoreError {
        let err = StoreError::Invalid(message.to_string());
        self.report_failure(operation, &err);
        err
    }

    /// Runs a mutation and resynchronizes with the server on success.
    ///
    /// The write, the reload and the notifications all happen on one task.
    /// Cancelling before the write resolves returns
    /// [`StoreError::Cancelled`]; after that the write is reported as done
    /// and cancelling only skips waiting for the reload.
    async fn mutate<T, F>(
        &self,
        operation: Operation,
        cancel: &CancellationToken,
        request: F,
    ) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: Future<Output = Result<T, ClientError>> + Send + 'static,
    {
        if cancel.is_cancelled() {
            return Err(StoreError::Cancelled);
        }

        let (written_tx, written_rx) = oneshot::channel();
        let store = self.clone();
        let task = tokio::spawn(async move {
            let written = request.await.map_err(StoreError::from);
            let committed = written.is_ok();
            if let Err(err) = &written {
                store.report_failure(operation, err);
            }
            // The caller may have stopped waiting.
            let _ = written_tx.send(written);
            if !committed {
                return;
            }

            // A failed reload is recorded in the state; the write stands.
            let _ = store.reload().await;
            if let Some(message) = operation.success_message() {
                store.notify(NotificationLevel::Success, message);
            }
        });

        let value = tokio::select! {
            written = written_rx => match written {
                Ok(written) => written?,
                Err(_) => {
                    return Err(StoreError::TaskFailed(
                        "mutation task ended without a result".to_string(),
                    ));
                }
            },
            _ = cancel.cancelled() => {
                tracing::debug!(?operation, "caller stopped waiting, request keeps running");
                return Err(StoreError::Cancelled);
            }
        };

        tokio::select! {
            joined = task => {
                if let Err(err) = joined {
                    tracing::warn!(?operation, "reload after write failed to run: {err}");
                }
            }
            _ = cancel.cancelled() => {
                tracing::debug!(?operation, "write accepted, reload continues in the background");
            }
        }
        Ok(value)
    }

    async fn lookup<T, F>(
        &self,
        operation: Operation,
        cancel: &CancellationToken,
        request: F,
    ) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: Future<Output = Result<T, ClientError>> + Send + 'static,
    {
        if cancel.is_cancelled() {
            return Err(StoreError::Cancelled);
        }
        let store = self.clone();
        let task = tokio::spawn(async move {
            request
                .await
                .map_err(StoreError::from)
                .inspect_err(|err| store.report_failure(operation, err))
        });
        wait(cancel, task).await
    }

    fn report_failure(&self, operation: Operation, err: &StoreError) {
        match err {
            StoreError::Cancelled => {}
            StoreError::SessionExpired => {
                tracing::info!(?operation, "credential rejected by the server");
                self.notify(
                    NotificationLevel::SessionEnded,
                    "Your session has expired, please log in again",
                );
            }
            err => {
                tracing::warn!(?operation, "{err}");
                self.notify(
                    NotificationLevel::Error,
                    &err.user_message(operation.failure_message()),
                );
            }
        }
    }

    fn notify(&self, level: NotificationLevel, message: &str) {
        // Nobody listening is fine.
        let _ = self.notifications.send(Notification {
            level,
            message: message.to_string(),
        });
    }
}

/// Waits for `task` unless `cancel` fires first; the task keeps running
/// either way.
async fn wait<T>(
    cancel: &CancellationToken,
    task: JoinHandle<Result<T, StoreError>>,
) -> Result<T, StoreError> {
    tokio::select! {
        joined = task => {
            joined.unwrap_or_else(|err| Err(StoreError::TaskFailed(err.to_string())))
        }
        _ = cancel.cancelled() => {
            tracing::debug!("caller stopped waiting, request keeps running");
            Err(StoreError::Cancelled)
        }
    }
}

/// Keeps `is_loading` set while at least one fetch is running, on every
/// exit path including drop.
struct LoadingGuard<'a> {
    store: &'a TransactionStore,
}

impl<'a> LoadingGuard<'a> {
    fn start(store: &'a TransactionStore) -> Self {
        store.fetches_in_flight.fetch_add(1, Ordering::SeqCst);
        store.state.send_modify(|state| state.is_loading = true);
        Self { store }
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        if self.store.fetches_in_flight.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.store
                .state
                .send_modify(|state| state.is_loading = false);
        }
    }
}

/// Everything a dashboard shows, derived from one store snapshot.
///
/// Totals cover the whole collection; the list, monthly series and
/// breakdowns follow the active filters.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedViews {
    pub totals: TransactionTotals,
    pub filtered: Vec<Transaction>,
    pub summary: Summary,
    pub monthly: MonthlyBreakdown,
    pub categories: Vec<CategorySummary>,
}

impl DerivedViews {
    pub fn compute(state: &StoreState, criteria: &FilterCriteria) -> Self {
        let filtered = filter::filter(&state.transactions, criteria);
        Self {
            totals: stats::totals(&state.transactions),
            summary: stats::summary(&filtered),
            monthly: stats::monthly_breakdown(&filtered),
            categories: stats::category_breakdown(&filtered),
            filtered,
        }
    }
}
