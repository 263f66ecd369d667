use crate::domain::{
    BookId, Charge, CustomerId, LendingStatus, LendingTransaction, StockCode, StockUnit,
    TransactionId, TransactionStatus,
};
use chrono::{DateTime, Utc};

use super::errors::{LendingError, ReferenceKind, Result};
use super::lending_service::{ServiceDependencies, within};
use super::views::{TransactionView, build_transaction_view};

/// 取引一覧の絞り込み条件
///
/// 任意の文字列キーではなく、列挙したフィールドだけを受け付ける。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionFilter {
    /// 導出ステータスで絞り込む（Borrowed は延滞中を含まない）
    pub status: Option<LendingStatus>,
    /// 利用者名または書籍タイトルの部分一致（大文字小文字を区別しない）
    pub search: Option<String>,
}

impl TransactionFilter {
    /// ストアに渡す保存ステータス
    fn stored_status(&self) -> Option<TransactionStatus> {
        self.status.map(|status| match status {
            LendingStatus::Borrowed | LendingStatus::Overdue => TransactionStatus::Borrowed,
            LendingStatus::Returned => TransactionStatus::Returned,
        })
    }

    fn matches(&self, view: &TransactionView) -> bool {
        let status_ok = self.status.is_none_or(|status| view.status == status);
        let search_ok = match self.search.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(needle) => view.matches_search(needle),
        };
        status_ok && search_ok
    }
}

async fn compose_all(
    deps: &ServiceDependencies,
    transactions: Vec<LendingTransaction>,
    now: DateTime<Utc>,
) -> Result<Vec<TransactionView>> {
    let mut views = Vec::with_capacity(transactions.len());
    for transaction in transactions {
        views.push(build_transaction_view(deps, transaction, now).await?);
    }
    Ok(views)
}

/// 取引を絞り込み条件付きで一覧する（borrowed_at の新しい順）
pub async fn find_transactions(
    deps: &ServiceDependencies,
    filter: &TransactionFilter,
    now: DateTime<Utc>,
) -> Result<Vec<TransactionView>> {
    within(deps.policy.operation_timeout, async {
        let transactions = deps
            .transaction_store
            .find_all(filter.stored_status())
            .await
            .map_err(LendingError::StoreError)?;

        let views = compose_all(deps, transactions, now).await?;
        Ok(views.into_iter().filter(|v| filter.matches(v)).collect())
    })
    .await
}

pub async fn get_transaction(
    deps: &ServiceDependencies,
    transaction_id: TransactionId,
    now: DateTime<Utc>,
) -> Result<TransactionView> {
    within(deps.policy.operation_timeout, async {
        let transaction = deps
            .transaction_store
            .get_by_id(transaction_id)
            .await
            .map_err(LendingError::StoreError)?
            .ok_or(LendingError::TransactionNotFound)?;

        build_transaction_view(deps, transaction, now).await
    })
    .await
}

pub async fn find_by_customer(
    deps: &ServiceDependencies,
    customer_id: CustomerId,
    now: DateTime<Utc>,
) -> Result<Vec<TransactionView>> {
    within(deps.policy.operation_timeout, async {
        let transactions = deps
            .transaction_store
            .find_by_customer(customer_id)
            .await
            .map_err(LendingError::StoreError)?;
        compose_all(deps, transactions, now).await
    })
    .await
}

pub async fn find_by_book(
    deps: &ServiceDependencies,
    book_id: BookId,
    now: DateTime<Utc>,
) -> Result<Vec<TransactionView>> {
    within(deps.policy.operation_timeout, async {
        let transactions = deps
            .transaction_store
            .find_by_book(book_id)
            .await
            .map_err(LendingError::StoreError)?;
        compose_all(deps, transactions, now).await
    })
    .await
}

/// 在庫1冊の貸出履歴
pub async fn find_by_stock_code(
    deps: &ServiceDependencies,
    code: &StockCode,
    now: DateTime<Utc>,
) -> Result<Vec<TransactionView>> {
    within(deps.policy.operation_timeout, async {
        let transactions = deps
            .transaction_store
            .find_by_stock_code(code)
            .await
            .map_err(LendingError::StoreError)?;
        compose_all(deps, transactions, now).await
    })
    .await
}

/// 貸出中の取引（延滞中を含む）
pub async fn find_active(
    deps: &ServiceDependencies,
    now: DateTime<Utc>,
) -> Result<Vec<TransactionView>> {
    within(deps.policy.operation_timeout, async {
        let transactions = deps
            .transaction_store
            .find_active()
            .await
            .map_err(LendingError::StoreError)?;
        compose_all(deps, transactions, now).await
    })
    .await
}

/// 延滞中の取引
///
/// 延滞は保存されない。呼び出し時点の `now` で判定する。
pub async fn find_overdue(
    deps: &ServiceDependencies,
    now: DateTime<Utc>,
) -> Result<Vec<TransactionView>> {
    within(deps.policy.operation_timeout, async {
        let transactions = deps
            .transaction_store
            .find_overdue(now)
            .await
            .map_err(LendingError::StoreError)?;
        compose_all(deps, transactions, now).await
    })
    .await
}

pub async fn get_stock(deps: &ServiceDependencies, code: &StockCode) -> Result<StockUnit> {
    within(deps.policy.operation_timeout, async {
        deps.stock_ledger
            .get_by_code(code)
            .await
            .map_err(LendingError::StoreError)?
            .ok_or(LendingError::ReferenceNotFound {
                kind: ReferenceKind::StockUnit,
            })
    })
    .await
}

pub async fn find_stock_by_book(
    deps: &ServiceDependencies,
    book_id: BookId,
) -> Result<Vec<StockUnit>> {
    within(deps.policy.operation_timeout, async {
        deps.stock_ledger
            .find_by_book(book_id)
            .await
            .map_err(LendingError::StoreError)
    })
    .await
}

/// 書籍の貸出可能な在庫（コード順）
pub async fn find_available_stock(
    deps: &ServiceDependencies,
    book_id: BookId,
) -> Result<Vec<StockUnit>> {
    within(deps.policy.operation_timeout, async {
        deps.stock_ledger
            .find_available(book_id)
            .await
            .map_err(LendingError::StoreError)
    })
    .await
}

/// 取引に紐づく延滞料金
pub async fn find_charges_for_transaction(
    deps: &ServiceDependencies,
    transaction_id: TransactionId,
) -> Result<Vec<Charge>> {
    within(deps.policy.operation_timeout, async {
        deps.transaction_store
            .get_by_id(transaction_id)
            .await
            .map_err(LendingError::StoreError)?
            .ok_or(LendingError::TransactionNotFound)?;

        deps.charge_repository
            .find_by_transaction(transaction_id)
            .await
            .map_err(LendingError::ChargeStoreError)
    })
    .await
}

pub async fn find_all_charges(deps: &ServiceDependencies) -> Result<Vec<Charge>> {
    within(deps.policy.operation_timeout, async {
        deps.charge_repository
            .find_all()
            .await
            .map_err(LendingError::ChargeStoreError)
    })
    .await
}
