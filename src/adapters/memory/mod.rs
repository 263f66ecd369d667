use crate::domain::{
    self, BookId, Charge, CustomerId, LendingTransaction, StockCode, StockTransitionError,
    StockUnit, TransactionId, TransactionStatus,
};
use crate::ports::stock_ledger::StockLedgerError;
use crate::ports::unit_of_work::{LendingSession, UnitOfWork};
use crate::ports::{ChargeRepository, StockLedger, TransactionStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{Mutex, OwnedMutexGuard};

type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// インメモリストアの制約違反
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MemoryStoreError {
    /// 同じ在庫コードに貸出中の取引が既にある
    #[error("Stock unit {0} already has an open transaction")]
    DuplicateOpenTransaction(StockCode),

    #[error("Transaction {0} already exists")]
    DuplicateTransaction(TransactionId),

    /// 延滞料金の参照先の取引が存在しない
    #[error("Transaction {0} not found")]
    TransactionNotFound(TransactionId),
}

#[derive(Debug, Clone, Default)]
struct State {
    stocks: BTreeMap<StockCode, StockUnit>,
    transactions: HashMap<TransactionId, LendingTransaction>,
    charges: Vec<Charge>,
}

impl State {
    /// 在庫コードごとに貸出中の取引は1件まで
    fn check_single_open(
        &self,
        transaction: &LendingTransaction,
    ) -> std::result::Result<(), MemoryStoreError> {
        if transaction.status != TransactionStatus::Borrowed {
            return Ok(());
        }
        let conflict = self.transactions.values().any(|other| {
            other.transaction_id != transaction.transaction_id
                && other.status == TransactionStatus::Borrowed
                && other.stock_code == transaction.stock_code
        });
        if conflict {
            return Err(MemoryStoreError::DuplicateOpenTransaction(
                transaction.stock_code.clone(),
            ));
        }
        Ok(())
    }

    fn collect<F>(&self, predicate: F) -> Vec<LendingTransaction>
    where
        F: Fn(&LendingTransaction) -> bool,
    {
        let mut found: Vec<LendingTransaction> = self
            .transactions
            .values()
            .filter(|t| predicate(t))
            .cloned()
            .collect();
        found.sort_by(|a, b| b.borrowed_at.cmp(&a.borrowed_at));
        found
    }
}

/// インメモリの在庫台帳・取引ストア・延滞料金リポジトリ
///
/// 1つの状態を共有し、セッションはロックを保持したまま複製に書き込み、
/// コミット時にだけ公開する。テストと単一プロセスでの実行向け。
///
/// ロックはストア全体に1つなので、別の在庫コードに対する操作も直列化される。
/// 在庫コード単位の並行性が必要な場合は PostgreSQL アダプターを使う。
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<State>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 在庫管理による在庫登録を再現する
    pub async fn add_stock_unit(&self, unit: StockUnit) {
        self.state.lock().await.stocks.insert(unit.code.clone(), unit);
    }

    /// 在庫管理による状態変更（破損・紛失など）を再現する
    pub async fn set_stock_unit(&self, unit: StockUnit) {
        self.add_stock_unit(unit).await;
    }

    /// 在庫管理による在庫削除を再現する
    pub async fn remove_stock_unit(&self, code: &StockCode) {
        self.state.lock().await.stocks.remove(code);
    }
}

#[async_trait]
impl StockLedger for InMemoryStore {
    async fn get_by_code(&self, code: &StockCode) -> Result<Option<StockUnit>> {
        Ok(self.state.lock().await.stocks.get(code).cloned())
    }

    async fn find_available(&self, book_id: BookId) -> Result<Vec<StockUnit>> {
        let state = self.state.lock().await;
        Ok(state
            .stocks
            .values()
            .filter(|u| u.book_id == book_id && u.is_available())
            .cloned()
            .collect())
    }

    async fn find_by_book(&self, book_id: BookId) -> Result<Vec<StockUnit>> {
        let state = self.state.lock().await;
        Ok(state
            .stocks
            .values()
            .filter(|u| u.book_id == book_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl TransactionStore for InMemoryStore {
    async fn get_by_id(
        &self,
        transaction_id: TransactionId,
    ) -> Result<Option<LendingTransaction>> {
        Ok(self
            .state
            .lock()
            .await
            .transactions
            .get(&transaction_id)
            .cloned())
    }

    async fn find_all(&self, status: Option<TransactionStatus>) -> Result<Vec<LendingTransaction>> {
        let state = self.state.lock().await;
        Ok(state.collect(|t| status.is_none_or(|s| t.status == s)))
    }

    async fn find_by_customer(&self, customer_id: CustomerId) -> Result<Vec<LendingTransaction>> {
        let state = self.state.lock().await;
        Ok(state.collect(|t| t.customer_id == customer_id))
    }

    async fn find_by_book(&self, book_id: BookId) -> Result<Vec<LendingTransaction>> {
        let state = self.state.lock().await;
        Ok(state.collect(|t| t.book_id == book_id))
    }

    async fn find_by_stock_code(&self, code: &StockCode) -> Result<Vec<LendingTransaction>> {
        let state = self.state.lock().await;
        Ok(state.collect(|t| &t.stock_code == code))
    }

    async fn find_active(&self) -> Result<Vec<LendingTransaction>> {
        let state = self.state.lock().await;
        Ok(state.collect(|t| t.status == TransactionStatus::Borrowed))
    }

    async fn find_overdue(&self, now: DateTime<Utc>) -> Result<Vec<LendingTransaction>> {
        let state = self.state.lock().await;
        Ok(state.collect(|t| domain::is_overdue(t, now)))
    }

    async fn update(&self, transaction: &LendingTransaction) -> Result<bool> {
        let mut state = self.state.lock().await;
        if !state.transactions.contains_key(&transaction.transaction_id) {
            return Ok(false);
        }
        state.check_single_open(transaction)?;
        state
            .transactions
            .insert(transaction.transaction_id, transaction.clone());
        Ok(true)
    }

    async fn delete(&self, transaction_id: TransactionId) -> Result<bool> {
        let mut state = self.state.lock().await;
        if state.transactions.remove(&transaction_id).is_none() {
            return Ok(false);
        }
        state.charges.retain(|c| c.transaction_id != transaction_id);
        Ok(true)
    }
}

#[async_trait]
impl ChargeRepository for InMemoryStore {
    async fn create(&self, charge: &Charge) -> Result<()> {
        let mut state = self.state.lock().await;
        if !state.transactions.contains_key(&charge.transaction_id) {
            return Err(Box::new(MemoryStoreError::TransactionNotFound(
                charge.transaction_id,
            )));
        }
        state.charges.push(charge.clone());
        Ok(())
    }

    async fn find_by_transaction(&self, transaction_id: TransactionId) -> Result<Vec<Charge>> {
        let state = self.state.lock().await;
        Ok(state
            .charges
            .iter()
            .filter(|c| c.transaction_id == transaction_id)
            .cloned()
            .collect())
    }

    async fn find_all(&self) -> Result<Vec<Charge>> {
        let state = self.state.lock().await;
        let mut charges = state.charges.clone();
        charges.reverse();
        charges.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(charges)
    }
}

#[async_trait]
impl UnitOfWork for InMemoryStore {
    async fn begin(&self) -> Result<Box<dyn LendingSession>> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        let staged = (*guard).clone();
        Ok(Box::new(InMemorySession { guard, staged }))
    }
}

/// インメモリのセッション
///
/// ロックを保持している間、他のセッションと読み取りは待たされる。
/// 書き込みは `staged` にだけ行い、`commit` で公開する。
pub struct InMemorySession {
    guard: OwnedMutexGuard<State>,
    staged: State,
}

#[async_trait]
impl LendingSession for InMemorySession {
    async fn mark_borrowed(
        &mut self,
        code: &StockCode,
        borrower_id: CustomerId,
        at: DateTime<Utc>,
    ) -> std::result::Result<StockUnit, StockLedgerError> {
        let unit = self
            .staged
            .stocks
            .get_mut(code)
            .ok_or_else(|| StockLedgerError::StockNotFound(code.clone()))?;

        let borrowed = domain::mark_borrowed(unit, borrower_id, at).map_err(|e| match e {
            StockTransitionError::NotAvailable(status)
            | StockTransitionError::InvalidStateTransition(status) => {
                StockLedgerError::NotAvailable {
                    code: code.clone(),
                    status,
                }
            }
        })?;
        *unit = borrowed.clone();
        Ok(borrowed)
    }

    async fn mark_available(
        &mut self,
        code: &StockCode,
    ) -> std::result::Result<StockUnit, StockLedgerError> {
        let unit = self
            .staged
            .stocks
            .get_mut(code)
            .ok_or_else(|| StockLedgerError::StockNotFound(code.clone()))?;

        let available = domain::mark_available(unit).map_err(|e| match e {
            StockTransitionError::NotAvailable(status)
            | StockTransitionError::InvalidStateTransition(status) => {
                StockLedgerError::InvalidStateTransition {
                    code: code.clone(),
                    status,
                }
            }
        })?;
        *unit = available.clone();
        Ok(available)
    }

    async fn insert_transaction(&mut self, transaction: &LendingTransaction) -> Result<()> {
        if self
            .staged
            .transactions
            .contains_key(&transaction.transaction_id)
        {
            return Err(Box::new(MemoryStoreError::DuplicateTransaction(
                transaction.transaction_id,
            )));
        }
        self.staged.check_single_open(transaction)?;
        self.staged
            .transactions
            .insert(transaction.transaction_id, transaction.clone());
        Ok(())
    }

    async fn close_transaction(
        &mut self,
        transaction_id: TransactionId,
        returned_at: DateTime<Utc>,
    ) -> Result<Option<LendingTransaction>> {
        let Some(transaction) = self.staged.transactions.get_mut(&transaction_id) else {
            return Ok(None);
        };
        let Ok(closed) = domain::close_transaction(transaction, returned_at) else {
            return Ok(None);
        };
        *transaction = closed.clone();
        Ok(Some(closed))
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let InMemorySession { mut guard, staged } = *self;
        *guard = staged;
        Ok(())
    }
}
