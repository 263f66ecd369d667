use rust_decimal::Decimal;
use thiserror::Error;

use super::fee::CURRENCY_SCALE;
use super::{StockStatus, TransactionStatus};

/// 在庫の状態遷移エラー
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StockTransitionError {
    /// 貸出可能ではない（現在のステータスを保持）
    NotAvailable(StockStatus),
    /// 貸出中以外から貸出可能へ戻そうとした
    InvalidStateTransition(StockStatus),
}

/// 返却のエラー
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReturnError {
    /// 貸出中ではない（既に返却済み）
    NotBorrowed(TransactionStatus),
}

/// 延滞料金計算のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeeError {
    /// 延滞日数が1未満
    #[error("days late must be positive (got {0})")]
    NonPositiveDaysLate(i64),
    /// 日額が負
    #[error("daily late fee must not be negative")]
    NegativeDailyRate,
    /// 日額が通貨の精度を超える
    #[error("daily late fee {0} has more than {} decimal places", CURRENCY_SCALE)]
    RateTooPrecise(Decimal),
    /// 計算結果が表現できない
    #[error("late fee is too large to represent")]
    Overflow,
}
