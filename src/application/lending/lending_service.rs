use crate::domain::{
    self, Charge, Correction, LendingTransaction, StockUnit, TransactionStatus, commands::*,
};
use chrono::{DateTime, Utc};
use crate::ports::book_catalog::Result as PortResult;
use crate::ports::*;
use rust_decimal::Decimal;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use super::errors::{LendingError, ReferenceKind, Result};
use super::views::{TransactionView, build_transaction_view, compose_view};

/// 延滞料金の既定日額
pub const DEFAULT_DAILY_LATE_FEE: i64 = 1000;

/// 操作の既定の期限（秒）
pub const DEFAULT_OPERATION_TIMEOUT_SECS: u64 = 10;

/// 貸出ポリシー（設定から供給される）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LendingPolicy {
    /// 既定の延滞料金日額（0以上）
    pub daily_late_fee: Decimal,
    /// 各操作の期限
    pub operation_timeout: Duration,
}

impl Default for LendingPolicy {
    fn default() -> Self {
        Self {
            daily_late_fee: Decimal::from(DEFAULT_DAILY_LATE_FEE),
            operation_timeout: Duration::from_secs(DEFAULT_OPERATION_TIMEOUT_SECS),
        }
    }
}

/// サービスの依存関係
///
/// 依存はすべてこの構造体経由で明示的に渡す。プロセス全体のシングルトンは持たない。
#[derive(Clone)]
pub struct ServiceDependencies {
    pub book_catalog: Arc<dyn BookCatalog>,
    pub customer_directory: Arc<dyn CustomerDirectory>,
    pub stock_ledger: Arc<dyn StockLedger>,
    pub transaction_store: Arc<dyn TransactionStore>,
    pub charge_repository: Arc<dyn ChargeRepository>,
    pub unit_of_work: Arc<dyn UnitOfWork>,
    pub policy: LendingPolicy,
}

/// 返却時の延滞料金の記録結果
#[derive(Debug)]
pub enum ChargeOutcome {
    /// 期限内の返却
    NotCharged,
    /// 延滞料金を記録した
    Recorded(Charge),
    /// 返却は確定したが、延滞料金の記録に失敗した
    Failed(LendingError),
}

/// 返却の結果
#[derive(Debug)]
pub struct ReturnReceipt {
    pub transaction: TransactionView,
    pub charge: ChargeOutcome,
}

/// 操作を期限内で実行する
///
/// 期限切れで未コミットのセッションはドロップされ、書き込みは破棄される。
pub(super) async fn within<T>(
    limit: Duration,
    operation: impl Future<Output = Result<T>>,
) -> Result<T> {
    tokio::time::timeout(limit, operation)
        .await
        .map_err(|_| LendingError::Timeout)?
}

/// 書籍を貸し出す
///
/// 処理の流れ：
/// 1. 書籍・在庫・利用者の存在確認（ReferenceNotFound）
/// 2. 在庫の貸出可能性の事前確認（NotAvailable）
/// 3. 返却期限の検証（InvalidDate）
/// 4. 1つのセッション内で在庫の比較交換と取引の作成を行い、コミット
///
/// 在庫コードが省略された場合は、貸出可能な在庫を順に試し、
/// 比較交換に最初に成功したものを使う。
///
/// 検証エラーはすべて書き込みの前に検出する。
pub async fn borrow_book(deps: &ServiceDependencies, cmd: BorrowBook) -> Result<TransactionView> {
    within(deps.policy.operation_timeout, execute_borrow(deps, cmd)).await
}

async fn execute_borrow(deps: &ServiceDependencies, cmd: BorrowBook) -> Result<TransactionView> {
    // 1. 参照の存在確認
    let book = deps
        .book_catalog
        .get_book(cmd.book_id)
        .await
        .map_err(LendingError::BookCatalogError)?
        .ok_or(LendingError::ReferenceNotFound {
            kind: ReferenceKind::Book,
        })?;

    let candidates = match &cmd.stock_code {
        Some(code) => {
            let unit = deps
                .stock_ledger
                .get_by_code(code)
                .await
                .map_err(LendingError::StoreError)?
                .ok_or(LendingError::ReferenceNotFound {
                    kind: ReferenceKind::StockUnit,
                })?;

            if unit.book_id != book.book_id {
                return Err(LendingError::InvalidInput(format!(
                    "stock unit {} does not belong to book {}",
                    unit.code, book.book_id
                )));
            }
            vec![unit]
        }
        None => deps
            .stock_ledger
            .find_available(book.book_id)
            .await
            .map_err(LendingError::StoreError)?,
    };

    let customer = deps
        .customer_directory
        .get_customer(cmd.customer_id)
        .await
        .map_err(LendingError::CustomerDirectoryError)?
        .ok_or(LendingError::ReferenceNotFound {
            kind: ReferenceKind::Customer,
        })?;

    // 2. 貸出可能性の事前確認（確定判定は書き込み時の比較交換で行う）
    let candidates: Vec<StockUnit> = candidates
        .into_iter()
        .filter(StockUnit::is_available)
        .collect();
    if candidates.is_empty() {
        return Err(LendingError::NotAvailable {
            book_id: book.book_id,
            stock_code: cmd.stock_code,
        });
    }

    // 3. 返却期限の検証
    let due_date = domain::parse_due_date(&cmd.due_date)
        .map_err(|e| LendingError::InvalidDate(e.to_string()))?;

    // 4. 書き込み
    for candidate in candidates {
        let transaction = domain::open_transaction(
            book.book_id,
            candidate.code.clone(),
            customer.customer_id,
            due_date,
            cmd.borrowed_at,
        );

        match commit_borrow(deps, &transaction).await {
            Ok(stock) => {
                tracing::info!(
                    transaction_id = %transaction.transaction_id,
                    stock_code = %stock.code,
                    customer_id = %customer.customer_id,
                    "book borrowed"
                );
                return Ok(compose_view(
                    transaction,
                    Some(book),
                    Some(stock),
                    Some(customer),
                    cmd.borrowed_at,
                ));
            }
            // 自動選択中に他の貸出に先を越された場合は次の候補へ
            Err(LendingError::NotAvailable { .. }) if cmd.stock_code.is_none() => {
                tracing::debug!(stock_code = %candidate.code, "candidate taken concurrently");
                continue;
            }
            Err(e) => return Err(e),
        }
    }

    Err(LendingError::NotAvailable {
        book_id: book.book_id,
        stock_code: None,
    })
}

/// 在庫の比較交換と取引の作成を1セッションで確定する
async fn commit_borrow(
    deps: &ServiceDependencies,
    transaction: &LendingTransaction,
) -> Result<StockUnit> {
    let mut session = deps
        .unit_of_work
        .begin()
        .await
        .map_err(LendingError::StoreError)?;

    let stock = session
        .mark_borrowed(
            &transaction.stock_code,
            transaction.customer_id,
            transaction.borrowed_at,
        )
        .await
        .map_err(|e| match e {
            StockLedgerError::NotAvailable { .. }
            | StockLedgerError::InvalidStateTransition { .. } => LendingError::NotAvailable {
                book_id: transaction.book_id,
                stock_code: Some(transaction.stock_code.clone()),
            },
            StockLedgerError::StockNotFound(_) => LendingError::ReferenceNotFound {
                kind: ReferenceKind::StockUnit,
            },
            StockLedgerError::Storage(source) => LendingError::StoreError(source),
        })?;

    session
        .insert_transaction(transaction)
        .await
        .map_err(LendingError::StoreError)?;

    session.commit().await.map_err(LendingError::StoreError)?;

    Ok(stock)
}

/// 書籍を返却する
///
/// 処理の流れ：
/// 1. 延滞料金の日額の検証（InvalidInput）
/// 2. 取引の存在確認（TransactionNotFound）
/// 3. 取引が貸出中であることの確認（NotBorrowed）
/// 4. 在庫の存在確認（StockNotFound：データ整合性の障害）
/// 5. 1つのセッション内で取引を返却済みに、在庫を貸出可能にしてコミット
/// 6. 期限を過ぎていれば延滞料金を記録
///
/// 期限（`operation_timeout`）が適用されるのは 1〜5 まで。コミット後の処理は
/// 個別に期限を持ち、失敗しても `Err` にはならない。延滞料金の記録に失敗した
/// 場合は `ChargeOutcome::Failed`、書籍・利用者の取得に失敗した場合は
/// スナップショットなしのビューとして返す。
pub async fn return_book(deps: &ServiceDependencies, cmd: ReturnBook) -> Result<ReturnReceipt> {
    let limit = deps.policy.operation_timeout;

    let (closed, stock, daily_late_fee) = within(limit, execute_return(deps, &cmd)).await?;

    tracing::info!(
        transaction_id = %closed.transaction_id,
        stock_code = %stock.code,
        "book returned"
    );

    let charge = match tokio::time::timeout(
        limit,
        record_late_fee(deps, &closed, &cmd, daily_late_fee),
    )
    .await
    {
        Ok(outcome) => outcome,
        Err(_) => {
            tracing::warn!(
                transaction_id = %closed.transaction_id,
                "late fee recording timed out; return stays committed"
            );
            ChargeOutcome::Failed(LendingError::Timeout)
        }
    };

    let book = snapshot(limit, "book", deps.book_catalog.get_book(closed.book_id)).await;
    let customer = snapshot(
        limit,
        "customer",
        deps.customer_directory.get_customer(closed.customer_id),
    )
    .await;

    Ok(ReturnReceipt {
        transaction: compose_view(closed, book, Some(stock), customer, cmd.returned_at),
        charge,
    })
}

async fn execute_return(
    deps: &ServiceDependencies,
    cmd: &ReturnBook,
) -> Result<(LendingTransaction, StockUnit, Decimal)> {
    // 1. 日額の検証
    let daily_late_fee =
        domain::fee::validate_daily_rate(cmd.daily_late_fee.unwrap_or(deps.policy.daily_late_fee))
            .map_err(|e| LendingError::InvalidInput(e.to_string()))?;

    // 2. 取引の取得
    let transaction = deps
        .transaction_store
        .get_by_id(cmd.transaction_id)
        .await
        .map_err(LendingError::StoreError)?
        .ok_or(LendingError::TransactionNotFound)?;

    // 3. 状態確認
    domain::close_transaction(&transaction, cmd.returned_at)
        .map_err(|_| LendingError::NotBorrowed)?;

    // 4. 在庫の存在確認
    deps.stock_ledger
        .get_by_code(&transaction.stock_code)
        .await
        .map_err(LendingError::StoreError)?
        .ok_or_else(|| LendingError::StockNotFound(transaction.stock_code.clone()))?;

    // 5. 書き込み
    let (closed, stock) = commit_return(deps, &transaction, cmd.returned_at).await?;

    Ok((closed, stock, daily_late_fee))
}

/// コミット後にビュー用のスナップショットを取得する
///
/// 失敗・期限切れは `None` として扱う。
async fn snapshot<T>(
    limit: Duration,
    kind: &'static str,
    lookup: impl Future<Output = PortResult<Option<T>>>,
) -> Option<T> {
    match tokio::time::timeout(limit, lookup).await {
        Ok(Ok(found)) => found,
        Ok(Err(e)) => {
            tracing::warn!(kind, error = %e, "snapshot lookup failed after commit");
            None
        }
        Err(_) => {
            tracing::warn!(kind, "snapshot lookup timed out after commit");
            None
        }
    }
}

/// 取引の比較交換と在庫の返却を1セッションで確定する
async fn commit_return(
    deps: &ServiceDependencies,
    transaction: &LendingTransaction,
    returned_at: DateTime<Utc>,
) -> Result<(LendingTransaction, StockUnit)> {
    let mut session = deps
        .unit_of_work
        .begin()
        .await
        .map_err(LendingError::StoreError)?;

    let closed = session
        .close_transaction(transaction.transaction_id, returned_at)
        .await
        .map_err(LendingError::StoreError)?
        .ok_or(LendingError::NotBorrowed)?;

    let stock = session
        .mark_available(&closed.stock_code)
        .await
        .map_err(|e| match e {
            StockLedgerError::StockNotFound(code) => LendingError::StockNotFound(code),
            StockLedgerError::NotAvailable { code, status }
            | StockLedgerError::InvalidStateTransition { code, status } => {
                LendingError::StockStateConflict { code, status }
            }
            StockLedgerError::Storage(source) => LendingError::StoreError(source),
        })?;

    session.commit().await.map_err(LendingError::StoreError)?;

    Ok((closed, stock))
}

async fn record_late_fee(
    deps: &ServiceDependencies,
    closed: &LendingTransaction,
    cmd: &ReturnBook,
    daily_late_fee: Decimal,
) -> ChargeOutcome {
    let charge = match domain::assess_late_fee(
        closed,
        cmd.returned_at,
        daily_late_fee,
        cmd.processed_by,
    ) {
        Ok(Some(charge)) => charge,
        Ok(None) => return ChargeOutcome::NotCharged,
        Err(e) => {
            tracing::warn!(
                transaction_id = %closed.transaction_id,
                error = %e,
                "late fee could not be computed; return stays committed"
            );
            return ChargeOutcome::Failed(LendingError::InvalidInput(e.to_string()));
        }
    };

    match deps.charge_repository.create(&charge).await {
        Ok(()) => {
            tracing::info!(
                transaction_id = %closed.transaction_id,
                days_late = charge.days_late,
                total = %charge.total,
                "late fee recorded"
            );
            ChargeOutcome::Recorded(charge)
        }
        Err(e) => {
            tracing::warn!(
                transaction_id = %closed.transaction_id,
                error = %e,
                "late fee recording failed; return stays committed"
            );
            ChargeOutcome::Failed(LendingError::ChargeStoreError(e))
        }
    }
}

/// 貸出取引を管理者が訂正する
///
/// 在庫台帳を経由しない管理用の抜け道。在庫コードやステータスを変更しても
/// 在庫の状態は変わらないため、貸出と在庫の対応が崩れうる。
/// これは意図した仕様として残しており、呼び出し側が整合性に責任を持つ。
pub async fn update_transaction(
    deps: &ServiceDependencies,
    cmd: UpdateTransaction,
) -> Result<TransactionView> {
    within(deps.policy.operation_timeout, execute_update(deps, cmd)).await
}

async fn execute_update(
    deps: &ServiceDependencies,
    cmd: UpdateTransaction,
) -> Result<TransactionView> {
    let transaction = deps
        .transaction_store
        .get_by_id(cmd.transaction_id)
        .await
        .map_err(LendingError::StoreError)?
        .ok_or(LendingError::TransactionNotFound)?;

    let due_date = cmd
        .due_date
        .as_deref()
        .map(domain::parse_due_date)
        .transpose()
        .map_err(|e| LendingError::InvalidDate(e.to_string()))?;

    let status = cmd
        .status
        .as_deref()
        .map(str::parse::<TransactionStatus>)
        .transpose()
        .map_err(LendingError::InvalidInput)?;

    let correction = Correction {
        book_id: cmd.book_id,
        stock_code: cmd.stock_code,
        customer_id: cmd.customer_id,
        due_date,
        status,
    };
    let corrected = domain::apply_correction(&transaction, correction, cmd.updated_at);

    let updated = deps
        .transaction_store
        .update(&corrected)
        .await
        .map_err(LendingError::StoreError)?;
    if !updated {
        return Err(LendingError::TransactionNotFound);
    }

    if corrected.stock_code != transaction.stock_code || corrected.status != transaction.status {
        tracing::warn!(
            transaction_id = %corrected.transaction_id,
            stock_code = %corrected.stock_code,
            status = %corrected.status,
            "administrative correction bypassed the stock ledger"
        );
    }

    build_transaction_view(deps, corrected, cmd.updated_at).await
}

/// 貸出取引を削除する
///
/// 在庫の状態は戻さない。貸出中の取引を削除すると在庫は Borrowed のまま残る。
/// 取引に紐づく延滞料金も一緒に削除されるため、料金の履歴は失われる。
pub async fn delete_transaction(deps: &ServiceDependencies, cmd: DeleteTransaction) -> Result<()> {
    within(deps.policy.operation_timeout, execute_delete(deps, cmd)).await
}

async fn execute_delete(deps: &ServiceDependencies, cmd: DeleteTransaction) -> Result<()> {
    let transaction = deps
        .transaction_store
        .get_by_id(cmd.transaction_id)
        .await
        .map_err(LendingError::StoreError)?
        .ok_or(LendingError::TransactionNotFound)?;

    let charges = deps
        .charge_repository
        .find_by_transaction(cmd.transaction_id)
        .await
        .map_err(LendingError::ChargeStoreError)?;

    let deleted = deps
        .transaction_store
        .delete(cmd.transaction_id)
        .await
        .map_err(LendingError::StoreError)?;
    if !deleted {
        return Err(LendingError::TransactionNotFound);
    }

    if transaction.status == TransactionStatus::Borrowed {
        tracing::warn!(
            transaction_id = %transaction.transaction_id,
            stock_code = %transaction.stock_code,
            "open transaction deleted; stock unit remains BORROWED"
        );
    }
    if !charges.is_empty() {
        tracing::warn!(
            transaction_id = %transaction.transaction_id,
            charges = charges.len(),
            "late fee history deleted with the transaction"
        );
    }

    Ok(())
}
