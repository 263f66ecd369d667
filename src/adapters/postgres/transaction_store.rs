use crate::domain::{
    BookId, CustomerId, LendingTransaction, StockCode, TransactionId, TransactionStatus,
};
use crate::ports::transaction_store::{Result, TransactionStore as TransactionStoreTrait};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::rows::{TRANSACTION_COLUMNS, map_row_to_transaction};

/// TransactionStoreのPostgreSQL実装
///
/// 一覧系はすべて borrowed_at の新しい順。
pub struct TransactionStore {
    pool: PgPool,
}

impl TransactionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TransactionStoreTrait for TransactionStore {
    async fn get_by_id(
        &self,
        transaction_id: TransactionId,
    ) -> Result<Option<LendingTransaction>> {
        let row = sqlx::query(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM book_transactions WHERE id = $1"
        ))
        .bind(transaction_id.value())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(map_row_to_transaction).transpose()
    }

    /// 返却済みでの絞り込みは旧スキーマの 'AVAILABLE' も含む
    async fn find_all(&self, status: Option<TransactionStatus>) -> Result<Vec<LendingTransaction>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {TRANSACTION_COLUMNS}
            FROM book_transactions
            WHERE $1::text IS NULL
               OR status = $1
               OR ($1 = 'RETURNED' AND status = 'AVAILABLE')
            ORDER BY borrowed_at DESC
            "#
        ))
        .bind(status.map(|s| s.as_str()))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_row_to_transaction).collect()
    }

    async fn find_by_customer(&self, customer_id: CustomerId) -> Result<Vec<LendingTransaction>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {TRANSACTION_COLUMNS}
            FROM book_transactions
            WHERE customer_id = $1
            ORDER BY borrowed_at DESC
            "#
        ))
        .bind(customer_id.value())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_row_to_transaction).collect()
    }

    async fn find_by_book(&self, book_id: BookId) -> Result<Vec<LendingTransaction>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {TRANSACTION_COLUMNS}
            FROM book_transactions
            WHERE book_id = $1
            ORDER BY borrowed_at DESC
            "#
        ))
        .bind(book_id.value())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_row_to_transaction).collect()
    }

    async fn find_by_stock_code(&self, code: &StockCode) -> Result<Vec<LendingTransaction>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {TRANSACTION_COLUMNS}
            FROM book_transactions
            WHERE stock_code = $1
            ORDER BY borrowed_at DESC
            "#
        ))
        .bind(code.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_row_to_transaction).collect()
    }

    /// 部分インデックス（status = 'BORROWED'）を使用する
    async fn find_active(&self) -> Result<Vec<LendingTransaction>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {TRANSACTION_COLUMNS}
            FROM book_transactions
            WHERE status = 'BORROWED'
            ORDER BY borrowed_at DESC
            "#
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_row_to_transaction).collect()
    }

    async fn find_overdue(&self, now: DateTime<Utc>) -> Result<Vec<LendingTransaction>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {TRANSACTION_COLUMNS}
            FROM book_transactions
            WHERE status = 'BORROWED' AND due_date < $1
            ORDER BY borrowed_at DESC
            "#
        ))
        .bind(now)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_row_to_transaction).collect()
    }

    /// 在庫台帳には触れない。貸出中の取引が同じ在庫コードに重なる訂正は
    /// 一意インデックス違反としてエラーになる。
    async fn update(&self, transaction: &LendingTransaction) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE book_transactions
            SET book_id = $2,
                stock_code = $3,
                customer_id = $4,
                due_date = $5,
                status = $6,
                returned_at = $7,
                updated_at = $8
            WHERE id = $1
            "#,
        )
        .bind(transaction.transaction_id.value())
        .bind(transaction.book_id.value())
        .bind(transaction.stock_code.as_str())
        .bind(transaction.customer_id.value())
        .bind(transaction.due_date)
        .bind(transaction.status.as_str())
        .bind(transaction.returned_at)
        .bind(transaction.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// charges は ON DELETE CASCADE で一緒に削除される
    async fn delete(&self, transaction_id: TransactionId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM book_transactions WHERE id = $1")
            .bind(transaction_id.value())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
