use crate::domain::{BookId, StockCode, StockUnit};
use crate::ports::stock_ledger::{Result, StockLedger as StockLedgerTrait};
use async_trait::async_trait;
use sqlx::PgPool;

use super::rows::{STOCK_COLUMNS, map_row_to_stock_unit};

/// StockLedgerのPostgreSQL実装（読み取り側）
///
/// 書き込みは `UnitOfWork` のセッション内でのみ行う。
pub struct StockLedger {
    pool: PgPool,
}

impl StockLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StockLedgerTrait for StockLedger {
    async fn get_by_code(&self, code: &StockCode) -> Result<Option<StockUnit>> {
        let row = sqlx::query(&format!(
            "SELECT {STOCK_COLUMNS} FROM book_stocks WHERE code = $1"
        ))
        .bind(code.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(map_row_to_stock_unit).transpose()
    }

    async fn find_available(&self, book_id: BookId) -> Result<Vec<StockUnit>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {STOCK_COLUMNS}
            FROM book_stocks
            WHERE book_id = $1 AND status = 'AVAILABLE'
            ORDER BY code
            "#
        ))
        .bind(book_id.value())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_row_to_stock_unit).collect()
    }

    async fn find_by_book(&self, book_id: BookId) -> Result<Vec<StockUnit>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {STOCK_COLUMNS}
            FROM book_stocks
            WHERE book_id = $1
            ORDER BY code
            "#
        ))
        .bind(book_id.value())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_row_to_stock_unit).collect()
    }
}
