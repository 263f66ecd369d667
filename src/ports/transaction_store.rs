use crate::domain::{
    BookId, CustomerId, LendingTransaction, StockCode, TransactionId, TransactionStatus,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// 貸出取引ストアポート
///
/// 取引ディレクトリの読み取りと、管理者による訂正・削除を扱う。
/// 貸出・返却による書き込みはここではなく `LendingSession` で行う。
///
/// 一覧系はすべて borrowed_at の新しい順で返す。
#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// IDで取引を取得する
    async fn get_by_id(&self, transaction_id: TransactionId)
    -> Result<Option<LendingTransaction>>;

    /// 全取引を取得する（保存ステータスで絞り込み可能）
    async fn find_all(&self, status: Option<TransactionStatus>) -> Result<Vec<LendingTransaction>>;

    /// 利用者の取引を取得する
    async fn find_by_customer(&self, customer_id: CustomerId)
    -> Result<Vec<LendingTransaction>>;

    /// 書籍の取引を取得する
    async fn find_by_book(&self, book_id: BookId) -> Result<Vec<LendingTransaction>>;

    /// 在庫コードの取引履歴を取得する
    async fn find_by_stock_code(&self, code: &StockCode) -> Result<Vec<LendingTransaction>>;

    /// 貸出中（Borrowed）の取引を取得する
    async fn find_active(&self) -> Result<Vec<LendingTransaction>>;

    /// 延滞中の取引を取得する
    ///
    /// status が Borrowed かつ due_date < now のもの。
    async fn find_overdue(&self, now: DateTime<Utc>) -> Result<Vec<LendingTransaction>>;

    /// 取引を上書き保存する（管理者訂正）
    ///
    /// 取引が存在しない場合は `Ok(false)`。
    async fn update(&self, transaction: &LendingTransaction) -> Result<bool>;

    /// 取引を削除する（管理者操作）
    ///
    /// 紐づく延滞料金も削除される。取引が存在しない場合は `Ok(false)`。
    async fn delete(&self, transaction_id: TransactionId) -> Result<bool>;
}
