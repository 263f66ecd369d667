use crate::domain::{CustomerId, LendingTransaction, StockCode, StockUnit, TransactionId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::stock_ledger::StockLedgerError;

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// 作業単位ポート
///
/// 貸出・返却は「取引レコード」と「在庫台帳」への2つの書き込みを伴う。
/// 両者は同じ物理的事実（この1冊は貸出中）を別の角度から表すため、
/// 1つのセッション内で全部成功するか全部取り消されるかのどちらかにする。
#[async_trait]
pub trait UnitOfWork: Send + Sync {
    /// 新しいセッションを開始する
    async fn begin(&self) -> Result<Box<dyn LendingSession>>;
}

/// 貸出セッション
///
/// `commit` するまで書き込みは他から見えない。
/// `commit` せずにドロップした場合、すべての書き込みは破棄される。
#[async_trait]
pub trait LendingSession: Send {
    /// 在庫を貸出中にする（MarkBorrowed）
    ///
    /// 「現在 Available であること」を条件とする比較交換として実行する。
    /// 同じ在庫への並行した貸出は、一方だけが成功し他方は
    /// `StockLedgerError::NotAvailable` になる。
    async fn mark_borrowed(
        &mut self,
        code: &StockCode,
        borrower_id: CustomerId,
        at: DateTime<Utc>,
    ) -> std::result::Result<StockUnit, StockLedgerError>;

    /// 在庫を貸出可能に戻す（MarkAvailable）
    ///
    /// Borrowed 以外からは `StockLedgerError::InvalidStateTransition`。
    async fn mark_available(
        &mut self,
        code: &StockCode,
    ) -> std::result::Result<StockUnit, StockLedgerError>;

    /// 貸出取引を新規作成する
    async fn insert_transaction(&mut self, transaction: &LendingTransaction) -> Result<()>;

    /// 貸出中の取引を返却済みにする
    ///
    /// 「現在 Borrowed であること」を条件とする比較交換。
    /// 既に返却済み（または存在しない）場合は `Ok(None)`。
    async fn close_transaction(
        &mut self,
        transaction_id: TransactionId,
        returned_at: DateTime<Utc>,
    ) -> Result<Option<LendingTransaction>>;

    /// すべての書き込みを確定する
    async fn commit(self: Box<Self>) -> Result<()>;
}
