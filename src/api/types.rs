use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::application::lending::{
    ChargeOutcome, LendingError, ReturnReceipt, TransactionFilter, TransactionView,
};
use crate::domain::{
    Book, BookId, Charge, Customer, CustomerId, LendingStatus, StaffId, StockCode, StockUnit,
    TransactionId, commands::{BorrowBook, ReturnBook, UpdateTransaction},
};

fn parse_stock_code(raw: &str) -> Result<StockCode, LendingError> {
    StockCode::parse(raw).map_err(|e| LendingError::InvalidInput(e.to_string()))
}

/// 貸出リクエスト（POST /v1/book-transactions）
#[derive(Debug, Deserialize)]
pub struct BorrowRequest {
    pub book_id: Uuid,
    /// 省略時は貸出可能な在庫から自動で選ぶ
    pub stock_code: Option<String>,
    pub customer_id: Uuid,
    /// YYYY-MM-DD
    pub due_date: String,
}

impl BorrowRequest {
    pub fn to_command(self, now: DateTime<Utc>) -> Result<BorrowBook, LendingError> {
        Ok(BorrowBook {
            book_id: BookId::from_uuid(self.book_id),
            stock_code: self.stock_code.as_deref().map(parse_stock_code).transpose()?,
            customer_id: CustomerId::from_uuid(self.customer_id),
            due_date: self.due_date,
            borrowed_at: now,
        })
    }
}

/// 返却リクエスト（PUT /v1/book-transactions/:id/return）
#[derive(Debug, Deserialize)]
pub struct ReturnRequest {
    /// 処理した職員
    pub user_id: Uuid,
    /// 返却日時の明示指定（管理者用）。省略時は現在時刻
    pub date: Option<DateTime<Utc>>,
    /// この返却に限り既定の日額を上書きする
    pub daily_late_fee: Option<Decimal>,
}

impl ReturnRequest {
    pub fn to_command(self, transaction_id: TransactionId, now: DateTime<Utc>) -> ReturnBook {
        ReturnBook {
            transaction_id,
            processed_by: StaffId::from_uuid(self.user_id),
            returned_at: self.date.unwrap_or(now),
            daily_late_fee: self.daily_late_fee,
        }
    }
}

/// 管理者訂正リクエスト（PUT /v1/book-transactions/:id）
#[derive(Debug, Default, Deserialize)]
pub struct UpdateRequest {
    pub book_id: Option<Uuid>,
    pub stock_code: Option<String>,
    pub customer_id: Option<Uuid>,
    pub due_date: Option<String>,
    pub status: Option<String>,
}

impl UpdateRequest {
    pub fn to_command(
        self,
        transaction_id: TransactionId,
        now: DateTime<Utc>,
    ) -> Result<UpdateTransaction, LendingError> {
        Ok(UpdateTransaction {
            transaction_id,
            book_id: self.book_id.map(BookId::from_uuid),
            stock_code: self.stock_code.as_deref().map(parse_stock_code).transpose()?,
            customer_id: self.customer_id.map(CustomerId::from_uuid),
            due_date: self.due_date,
            status: self.status,
            updated_at: now,
        })
    }
}

/// 取引一覧のクエリパラメータ
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    /// BORROWED / OVERDUE / RETURNED（大文字小文字を区別しない）
    pub status: Option<String>,
    pub search: Option<String>,
}

impl ListQuery {
    pub fn to_filter(self) -> Result<TransactionFilter, LendingError> {
        let status = self
            .status
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::parse::<LendingStatus>)
            .transpose()
            .map_err(LendingError::InvalidInput)?;

        Ok(TransactionFilter {
            status,
            search: self.search,
        })
    }
}

/// 貸出取引レスポンス
#[derive(Debug, Serialize)]
pub struct TransactionResponse {
    pub id: Uuid,
    pub book_id: Uuid,
    pub stock_code: String,
    pub customer_id: Uuid,
    pub due_date: DateTime<Utc>,
    pub status: String,
    pub borrowed_at: DateTime<Utc>,
    pub returned_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
    pub book: Option<Book>,
    pub stock: Option<StockUnit>,
    pub customer: Option<Customer>,
}

impl From<TransactionView> for TransactionResponse {
    fn from(view: TransactionView) -> Self {
        Self {
            id: view.transaction_id.value(),
            book_id: view.book_id.value(),
            stock_code: view.stock_code.to_string(),
            customer_id: view.customer_id.value(),
            due_date: view.due_date,
            status: view.status.as_str().to_string(),
            borrowed_at: view.borrowed_at,
            returned_at: view.returned_at,
            updated_at: view.updated_at,
            book: view.book,
            stock: view.stock,
            customer: view.customer,
        }
    }
}

/// 延滞料金レスポンス
#[derive(Debug, Serialize)]
pub struct ChargeResponse {
    pub id: Uuid,
    pub transaction_id: Uuid,
    pub days_late: i64,
    pub daily_late_fee: Decimal,
    pub total: Decimal,
    pub processed_by: Uuid,
    pub created_at: DateTime<Utc>,
}

impl From<Charge> for ChargeResponse {
    fn from(charge: Charge) -> Self {
        Self {
            id: charge.charge_id.value(),
            transaction_id: charge.transaction_id.value(),
            days_late: charge.days_late,
            daily_late_fee: charge.daily_late_fee,
            total: charge.total,
            processed_by: charge.processed_by.value(),
            created_at: charge.created_at,
        }
    }
}

/// 返却レスポンス
///
/// 延滞料金の記録に失敗しても返却は確定している。その場合は
/// `charge_error` に理由が入る。
#[derive(Debug, Serialize)]
pub struct ReturnResponse {
    pub transaction: TransactionResponse,
    pub charge: Option<ChargeResponse>,
    pub charge_error: Option<String>,
}

impl From<ReturnReceipt> for ReturnResponse {
    fn from(receipt: ReturnReceipt) -> Self {
        let (charge, charge_error) = match receipt.charge {
            ChargeOutcome::NotCharged => (None, None),
            ChargeOutcome::Recorded(charge) => (Some(charge.into()), None),
            ChargeOutcome::Failed(e) => (None, Some(e.to_string())),
        };

        Self {
            transaction: receipt.transaction.into(),
            charge,
            charge_error,
        }
    }
}

/// エラーレスポンス
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
        }
    }
}
