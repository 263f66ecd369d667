use crate::domain::{BookId, StockCode, StockStatus};
use thiserror::Error;

/// 存在確認に失敗した参照の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    Book,
    StockUnit,
    Customer,
}

impl std::fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReferenceKind::Book => f.write_str("book"),
            ReferenceKind::StockUnit => f.write_str("stock unit"),
            ReferenceKind::Customer => f.write_str("customer"),
        }
    }
}

/// 貸出エンジンのエラー
#[derive(Debug, Error)]
pub enum LendingError {
    /// 書籍・在庫・利用者のいずれかが存在しない
    #[error("Referenced {kind} not found")]
    ReferenceNotFound { kind: ReferenceKind },

    /// 在庫が貸出可能ではない（貸出中・破損・紛失、または候補なし）
    #[error("No available stock unit for book {book_id}")]
    NotAvailable {
        book_id: BookId,
        stock_code: Option<StockCode>,
    },

    /// 貸出中ではない取引を返却しようとした
    #[error("Transaction is not in borrowed status")]
    NotBorrowed,

    /// 日付の形式が不正
    #[error("Invalid date: {0}")]
    InvalidDate(String),

    /// 入力が不正
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// 貸出取引が見つからない
    #[error("Transaction not found")]
    TransactionNotFound,

    /// 取引が参照する在庫が存在しない（データ整合性の障害）
    #[error("Stock unit {0} referenced by the transaction not found")]
    StockNotFound(StockCode),

    /// 在庫台帳が返却を拒否した（在庫が貸出中ではない）
    #[error("Stock unit {code} is {status}, expected BORROWED")]
    StockStateConflict { code: StockCode, status: StockStatus },

    /// 期限内に完了しなかった
    #[error("Operation timed out")]
    Timeout,

    /// 取引ストア・在庫台帳のエラー
    #[error("Store error")]
    StoreError(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// 延滞料金ストアのエラー
    #[error("Charge store error")]
    ChargeStoreError(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// BookCatalogのエラー
    #[error("Book catalog error")]
    BookCatalogError(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// CustomerDirectoryのエラー
    #[error("Customer directory error")]
    CustomerDirectoryError(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl LendingError {
    /// 呼び出し側の誤りではなくサーバー側の障害か
    pub fn is_server_fault(&self) -> bool {
        matches!(
            self,
            LendingError::StockNotFound(_)
                | LendingError::StockStateConflict { .. }
                | LendingError::Timeout
                | LendingError::StoreError(_)
                | LendingError::ChargeStoreError(_)
                | LendingError::BookCatalogError(_)
                | LendingError::CustomerDirectoryError(_)
        )
    }
}

/// アプリケーション層の Result型
pub type Result<T> = std::result::Result<T, LendingError>;
