use crate::domain::{
    self, Book, BookId, Customer, CustomerId, LendingStatus, LendingTransaction, StockCode,
    StockUnit, TransactionId,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

use super::errors::{LendingError, Result};
use super::lending_service::ServiceDependencies;

/// 貸出取引ビュー
///
/// 表示用の非正規化ビュー。書籍・在庫・利用者のスナップショットを埋め込む。
/// 参照先が削除されている場合、該当スナップショットは `None`。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransactionView {
    pub transaction_id: TransactionId,
    pub book_id: BookId,
    pub stock_code: StockCode,
    pub customer_id: CustomerId,
    pub due_date: DateTime<Utc>,
    /// 読み取り時点で導出したステータス（Overdueを含む）
    pub status: LendingStatus,
    pub borrowed_at: DateTime<Utc>,
    pub returned_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
    pub book: Option<Book>,
    pub stock: Option<StockUnit>,
    pub customer: Option<Customer>,
}

/// 取得済みのスナップショットからビューを組み立てる
pub(super) fn compose_view(
    transaction: LendingTransaction,
    book: Option<Book>,
    stock: Option<StockUnit>,
    customer: Option<Customer>,
    now: DateTime<Utc>,
) -> TransactionView {
    let status = domain::derive_status(&transaction, now);

    TransactionView {
        transaction_id: transaction.transaction_id,
        book_id: transaction.book_id,
        stock_code: transaction.stock_code,
        customer_id: transaction.customer_id,
        due_date: transaction.due_date,
        status,
        borrowed_at: transaction.borrowed_at,
        returned_at: transaction.returned_at,
        updated_at: transaction.updated_at,
        book,
        stock,
        customer,
    }
}

/// 参照先を引いてビューを組み立てる
pub(super) async fn build_transaction_view(
    deps: &ServiceDependencies,
    transaction: LendingTransaction,
    now: DateTime<Utc>,
) -> Result<TransactionView> {
    let book = deps
        .book_catalog
        .get_book(transaction.book_id)
        .await
        .map_err(LendingError::BookCatalogError)?;

    let stock = deps
        .stock_ledger
        .get_by_code(&transaction.stock_code)
        .await
        .map_err(LendingError::StoreError)?;

    let customer = deps
        .customer_directory
        .get_customer(transaction.customer_id)
        .await
        .map_err(LendingError::CustomerDirectoryError)?;

    Ok(compose_view(transaction, book, stock, customer, now))
}

impl TransactionView {
    /// 利用者名または書籍タイトルに検索語を含むか（大文字小文字を区別しない）
    pub fn matches_search(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        let in_customer = self
            .customer
            .as_ref()
            .is_some_and(|c| c.name.to_lowercase().contains(&needle));
        let in_book = self
            .book
            .as_ref()
            .is_some_and(|b| b.title.to_lowercase().contains(&needle));
        in_customer || in_book
    }
}
