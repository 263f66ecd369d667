use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{BookId, CustomerId, StaffId, StockCode, TransactionId};

/// コマンド：書籍を貸し出す
///
/// stock_code を省略した場合は、その書籍の貸出可能な在庫から選ぶ。
/// due_date は境界の形式（YYYY-MM-DD）のまま受け取り、エンジンで検証する。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BorrowBook {
    pub book_id: BookId,
    pub stock_code: Option<StockCode>,
    pub customer_id: CustomerId,
    pub due_date: String,
    pub borrowed_at: DateTime<Utc>,
}

/// コマンド：書籍を返却する
///
/// returned_at は通常は現在時刻。管理者は明示的な日時を指定できる。
/// daily_late_fee を指定した場合のみ、設定の既定日額を上書きする。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnBook {
    pub transaction_id: TransactionId,
    pub processed_by: StaffId,
    pub returned_at: DateTime<Utc>,
    pub daily_late_fee: Option<Decimal>,
}

/// コマンド：貸出取引を管理者が訂正する
///
/// 在庫台帳を経由しない管理用の抜け道。指定したフィールドのみ変更する。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateTransaction {
    pub transaction_id: TransactionId,
    pub book_id: Option<BookId>,
    pub stock_code: Option<StockCode>,
    pub customer_id: Option<CustomerId>,
    pub due_date: Option<String>,
    pub status: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// コマンド：貸出取引を削除する（在庫の状態は戻さない）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteTransaction {
    pub transaction_id: TransactionId,
}
