use crate::domain::{BookId, StockCode, StockStatus, StockUnit};
use async_trait::async_trait;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// 在庫台帳への書き込みエラー
///
/// 貸出可能性の判定結果とストレージ障害を区別するため、
/// 書き込み系だけは型付きのエラーを返す。
#[derive(Debug, Error)]
pub enum StockLedgerError {
    /// 在庫が貸出可能ではない
    #[error("Stock unit {code} is not available (status: {status})")]
    NotAvailable { code: StockCode, status: StockStatus },

    /// 貸出中以外から貸出可能へ戻そうとした
    #[error("Stock unit {code} cannot become available from {status}")]
    InvalidStateTransition { code: StockCode, status: StockStatus },

    /// 在庫が存在しない
    #[error("Stock unit {0} not found")]
    StockNotFound(StockCode),

    /// ストレージ障害
    #[error("Stock ledger storage error")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// 在庫台帳ポート（読み取り側）
///
/// 在庫の状態は貸出エンジンのみが `LendingSession` 経由で変更する。
/// このポートは貸出・返却・取引を知らない。
#[async_trait]
pub trait StockLedger: Send + Sync {
    /// コードで在庫を取得する
    async fn get_by_code(&self, code: &StockCode) -> Result<Option<StockUnit>>;

    /// 書籍の貸出可能な在庫をコード順で取得する
    ///
    /// 在庫コードが指定されない貸出で、候補を選ぶために使用される。
    async fn find_available(&self, book_id: BookId) -> Result<Vec<StockUnit>>;

    /// 書籍の全在庫をコード順で取得する
    async fn find_by_book(&self, book_id: BookId) -> Result<Vec<StockUnit>>;
}
