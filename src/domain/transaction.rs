use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::{BookId, CustomerId, ReturnError, StockCode, TransactionId};

/// 保存される貸出取引ステータス
///
/// Overdue は保存しない。`derive_status` で読み取りのたびに導出する。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    /// 貸出中（初期状態）
    Borrowed,
    /// 返却済み（終端状態）
    Returned,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Borrowed => "BORROWED",
            TransactionStatus::Returned => "RETURNED",
        }
    }
}

impl std::str::FromStr for TransactionStatus {
    type Err = String;

    /// 旧スキーマの "AVAILABLE"（返却済み）も受け付ける
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "BORROWED" => Ok(TransactionStatus::Borrowed),
            "RETURNED" | "AVAILABLE" => Ok(TransactionStatus::Returned),
            _ => Err(format!("Invalid transaction status: {}", s)),
        }
    }
}

impl std::fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 表示用の貸出ステータス（保存ステータス＋現在時刻から導出）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LendingStatus {
    /// 貸出中（期限内）
    Borrowed,
    /// 延滞中（貸出中かつ期限切れ）
    Overdue,
    /// 返却済み
    Returned,
}

impl LendingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LendingStatus::Borrowed => "BORROWED",
            LendingStatus::Overdue => "OVERDUE",
            LendingStatus::Returned => "RETURNED",
        }
    }
}

impl std::str::FromStr for LendingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "BORROWED" => Ok(LendingStatus::Borrowed),
            "OVERDUE" => Ok(LendingStatus::Overdue),
            "RETURNED" | "AVAILABLE" => Ok(LendingStatus::Returned),
            _ => Err(format!("Invalid lending status: {}", s)),
        }
    }
}

/// 貸出取引 - 1回の貸出から返却までのサイクル
///
/// 不変条件：
/// - returned_at は status が Returned のときのみ存在する
/// - due_date と borrowed_at は作成時に設定され、通常の遷移では変わらない
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LendingTransaction {
    pub transaction_id: TransactionId,

    // 他の集約への参照（IDと在庫コードのみ）
    pub book_id: BookId,
    pub stock_code: StockCode,
    pub customer_id: CustomerId,

    pub due_date: DateTime<Utc>,
    pub status: TransactionStatus,
    pub borrowed_at: DateTime<Utc>,
    pub returned_at: Option<DateTime<Utc>>,

    // 監査情報
    pub updated_at: DateTime<Utc>,
}

/// 純粋関数：貸出取引を開始する
///
/// 副作用なし。在庫の状態変更はセッション側で同時に行う。
pub fn open_transaction(
    book_id: BookId,
    stock_code: StockCode,
    customer_id: CustomerId,
    due_date: DateTime<Utc>,
    borrowed_at: DateTime<Utc>,
) -> LendingTransaction {
    LendingTransaction {
        transaction_id: TransactionId::new(),
        book_id,
        stock_code,
        customer_id,
        due_date,
        status: TransactionStatus::Borrowed,
        borrowed_at,
        returned_at: None,
        updated_at: borrowed_at,
    }
}

/// 純粋関数：貸出取引を返却済みにする
///
/// 延滞していても返却は受け付ける（延滞料金は別途計算）。
pub fn close_transaction(
    transaction: &LendingTransaction,
    returned_at: DateTime<Utc>,
) -> Result<LendingTransaction, ReturnError> {
    if transaction.status != TransactionStatus::Borrowed {
        return Err(ReturnError::NotBorrowed(transaction.status));
    }

    Ok(LendingTransaction {
        status: TransactionStatus::Returned,
        returned_at: Some(returned_at),
        updated_at: returned_at,
        ..transaction.clone()
    })
}

/// 純粋関数：延滞判定
pub fn is_overdue(transaction: &LendingTransaction, now: DateTime<Utc>) -> bool {
    transaction.status == TransactionStatus::Borrowed && transaction.due_date < now
}

/// 純粋関数：表示用ステータスを導出する
pub fn derive_status(transaction: &LendingTransaction, now: DateTime<Utc>) -> LendingStatus {
    match transaction.status {
        TransactionStatus::Returned => LendingStatus::Returned,
        TransactionStatus::Borrowed if is_overdue(transaction, now) => LendingStatus::Overdue,
        TransactionStatus::Borrowed => LendingStatus::Borrowed,
    }
}

/// 純粋関数：延滞日数を計算する
///
/// 返却が期限を過ぎていなければ `None`。
/// 過ぎていれば日単位で切り上げ、最低1日。
pub fn days_late(due_date: DateTime<Utc>, returned_at: DateTime<Utc>) -> Option<i64> {
    if returned_at <= due_date {
        return None;
    }

    let elapsed = returned_at - due_date;
    let whole_days = elapsed.num_days();
    let days = if elapsed > Duration::days(whole_days) {
        whole_days + 1
    } else {
        whole_days
    };

    Some(days.max(1))
}

/// 管理者による訂正内容（検証済み）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Correction {
    pub book_id: Option<BookId>,
    pub stock_code: Option<StockCode>,
    pub customer_id: Option<CustomerId>,
    pub due_date: Option<DateTime<Utc>>,
    pub status: Option<TransactionStatus>,
}

/// 純粋関数：管理者訂正を適用する
///
/// 在庫台帳には一切触れない（貸出・返却の対応関係を迂回する）。
/// 取引内の returned_at とステータスの対応だけは保つ：
/// Returned への訂正で returned_at がなければ訂正時刻を、
/// Borrowed への訂正では returned_at をクリアする。
pub fn apply_correction(
    transaction: &LendingTransaction,
    correction: Correction,
    corrected_at: DateTime<Utc>,
) -> LendingTransaction {
    let status = correction.status.unwrap_or(transaction.status);
    let returned_at = match status {
        TransactionStatus::Borrowed => None,
        TransactionStatus::Returned => transaction.returned_at.or(Some(corrected_at)),
    };

    LendingTransaction {
        book_id: correction.book_id.unwrap_or(transaction.book_id),
        stock_code: correction
            .stock_code
            .unwrap_or_else(|| transaction.stock_code.clone()),
        customer_id: correction.customer_id.unwrap_or(transaction.customer_id),
        due_date: correction.due_date.unwrap_or(transaction.due_date),
        status,
        returned_at,
        updated_at: corrected_at,
        ..transaction.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::parse_due_date;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    fn borrowed_transaction() -> LendingTransaction {
        open_transaction(
            BookId::new(),
            StockCode::parse("S-001").unwrap(),
            CustomerId::new(),
            parse_due_date("2025-01-10").unwrap(),
            at(2025, 1, 1, 9),
        )
    }

    #[test]
    fn test_open_transaction_is_borrowed() {
        let transaction = borrowed_transaction();

        assert_eq!(transaction.status, TransactionStatus::Borrowed);
        assert_eq!(transaction.returned_at, None);
        assert_eq!(transaction.borrowed_at, at(2025, 1, 1, 9));
        assert_eq!(transaction.due_date, at(2025, 1, 10, 0));
    }

    #[test]
    fn test_close_transaction_sets_returned_at() {
        let transaction = borrowed_transaction();
        let returned_at = at(2025, 1, 8, 0);

        let closed = close_transaction(&transaction, returned_at).unwrap();

        assert_eq!(closed.status, TransactionStatus::Returned);
        assert_eq!(closed.returned_at, Some(returned_at));
        assert_eq!(closed.borrowed_at, transaction.borrowed_at);
        assert_eq!(closed.due_date, transaction.due_date);
    }

    #[test]
    fn test_close_transaction_twice_fails() {
        let transaction = borrowed_transaction();
        let closed = close_transaction(&transaction, at(2025, 1, 8, 0)).unwrap();

        let result = close_transaction(&closed, at(2025, 1, 9, 0));
        assert_eq!(
            result,
            Err(ReturnError::NotBorrowed(TransactionStatus::Returned))
        );
    }

    #[test]
    fn test_derive_status() {
        let transaction = borrowed_transaction();

        assert_eq!(
            derive_status(&transaction, at(2025, 1, 9, 0)),
            LendingStatus::Borrowed
        );
        // 期限ちょうどはまだ延滞ではない
        assert_eq!(
            derive_status(&transaction, at(2025, 1, 10, 0)),
            LendingStatus::Borrowed
        );
        assert_eq!(
            derive_status(&transaction, at(2025, 1, 10, 1)),
            LendingStatus::Overdue
        );

        let closed = close_transaction(&transaction, at(2025, 1, 15, 0)).unwrap();
        assert_eq!(
            derive_status(&closed, at(2025, 2, 1, 0)),
            LendingStatus::Returned
        );
    }

    #[test]
    fn test_days_late_whole_days() {
        let due = parse_due_date("2025-01-10").unwrap();
        assert_eq!(days_late(due, at(2025, 1, 15, 0)), Some(5));
    }

    #[test]
    fn test_days_late_partial_day_rounds_up() {
        let due = parse_due_date("2025-01-10").unwrap();
        assert_eq!(days_late(due, at(2025, 1, 10, 1)), Some(1));
        assert_eq!(days_late(due, at(2025, 1, 15, 10)), Some(6));
    }

    #[test]
    fn test_days_late_none_when_on_time() {
        let due = parse_due_date("2025-01-10").unwrap();
        assert_eq!(days_late(due, at(2025, 1, 8, 0)), None);
        assert_eq!(days_late(due, due), None);
    }

    #[test]
    fn test_apply_correction_changes_fields_without_touching_borrowed_at() {
        let transaction = borrowed_transaction();
        let new_code = StockCode::parse("S-999").unwrap();
        let new_due = parse_due_date("2025-02-01").unwrap();
        let corrected_at = at(2025, 1, 3, 0);

        let corrected = apply_correction(
            &transaction,
            Correction {
                stock_code: Some(new_code.clone()),
                due_date: Some(new_due),
                ..Correction::default()
            },
            corrected_at,
        );

        assert_eq!(corrected.stock_code, new_code);
        assert_eq!(corrected.due_date, new_due);
        assert_eq!(corrected.customer_id, transaction.customer_id);
        assert_eq!(corrected.borrowed_at, transaction.borrowed_at);
        assert_eq!(corrected.updated_at, corrected_at);
        assert_eq!(corrected.status, TransactionStatus::Borrowed);
    }

    #[test]
    fn test_apply_correction_keeps_returned_at_paired_with_status() {
        let transaction = borrowed_transaction();
        let corrected_at = at(2025, 1, 3, 0);

        let closed = apply_correction(
            &transaction,
            Correction {
                status: Some(TransactionStatus::Returned),
                ..Correction::default()
            },
            corrected_at,
        );
        assert_eq!(closed.returned_at, Some(corrected_at));

        let reopened = apply_correction(
            &closed,
            Correction {
                status: Some(TransactionStatus::Borrowed),
                ..Correction::default()
            },
            at(2025, 1, 4, 0),
        );
        assert_eq!(reopened.returned_at, None);
    }

    #[test]
    fn test_transaction_status_accepts_legacy_available() {
        assert_eq!(
            "AVAILABLE".parse::<TransactionStatus>(),
            Ok(TransactionStatus::Returned)
        );
        assert!("OVERDUE".parse::<TransactionStatus>().is_err());
    }
}
