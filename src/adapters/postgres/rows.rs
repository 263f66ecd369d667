use crate::domain::{
    BookId, Charge, ChargeId, CustomerId, LendingTransaction, StaffId, StockCode, StockStatus,
    StockUnit, TransactionId, TransactionStatus,
};
use sqlx::{Row, postgres::PgRow};
use std::str::FromStr;

pub(super) type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// 保存値がドメインの制約を満たさない場合のエラー
pub(super) fn invalid_data(message: impl Into<String>) -> BoxError {
    Box::new(std::io::Error::new(
        std::io::ErrorKind::InvalidData,
        message.into(),
    ))
}

pub(super) const STOCK_COLUMNS: &str = "code, book_id, status, borrower_id, borrowed_at";

pub(super) const TRANSACTION_COLUMNS: &str =
    "id, book_id, stock_code, customer_id, due_date, status, borrowed_at, returned_at, updated_at";

pub(super) const CHARGE_COLUMNS: &str =
    "id, transaction_id, days_late, daily_late_fee, total, processed_by, created_at";

fn stock_code(row: &PgRow, column: &str) -> Result<StockCode, BoxError> {
    let raw: &str = row.try_get(column)?;
    StockCode::parse(raw).map_err(|e| invalid_data(e.to_string()))
}

/// book_stocks の行を StockUnit に変換する
pub(super) fn map_row_to_stock_unit(row: &PgRow) -> Result<StockUnit, BoxError> {
    let status_str: &str = row.try_get("status")?;
    let status = StockStatus::from_str(status_str).map_err(invalid_data)?;

    let borrower_id: Option<uuid::Uuid> = row.try_get("borrower_id")?;

    Ok(StockUnit {
        code: stock_code(row, "code")?,
        book_id: BookId::from_uuid(row.try_get("book_id")?),
        status,
        borrower_id: borrower_id.map(CustomerId::from_uuid),
        borrowed_at: row.try_get("borrowed_at")?,
    })
}

/// book_transactions の行を LendingTransaction に変換する
///
/// 旧スキーマの status 'AVAILABLE' は返却済みとして読む。
pub(super) fn map_row_to_transaction(row: &PgRow) -> Result<LendingTransaction, BoxError> {
    let status_str: &str = row.try_get("status")?;
    let status = TransactionStatus::from_str(status_str).map_err(invalid_data)?;

    Ok(LendingTransaction {
        transaction_id: TransactionId::from_uuid(row.try_get("id")?),
        book_id: BookId::from_uuid(row.try_get("book_id")?),
        stock_code: stock_code(row, "stock_code")?,
        customer_id: CustomerId::from_uuid(row.try_get("customer_id")?),
        due_date: row.try_get("due_date")?,
        status,
        borrowed_at: row.try_get("borrowed_at")?,
        returned_at: row.try_get("returned_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

/// charges の行を Charge に変換する
pub(super) fn map_row_to_charge(row: &PgRow) -> Result<Charge, BoxError> {
    Ok(Charge {
        charge_id: ChargeId::from_uuid(row.try_get("id")?),
        transaction_id: TransactionId::from_uuid(row.try_get("transaction_id")?),
        days_late: row.try_get("days_late")?,
        daily_late_fee: row.try_get("daily_late_fee")?,
        total: row.try_get("total")?,
        processed_by: StaffId::from_uuid(row.try_get("processed_by")?),
        created_at: row.try_get("created_at")?,
    })
}
