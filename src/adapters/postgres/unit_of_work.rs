use crate::domain::{CustomerId, LendingTransaction, StockCode, StockStatus, StockUnit, TransactionId};
use crate::ports::stock_ledger::StockLedgerError;
use crate::ports::unit_of_work::{LendingSession, Result, UnitOfWork as UnitOfWorkTrait};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Row, Transaction};
use std::str::FromStr;

use super::rows::{
    STOCK_COLUMNS, TRANSACTION_COLUMNS, invalid_data, map_row_to_stock_unit,
    map_row_to_transaction,
};

/// UnitOfWorkのPostgreSQL実装
///
/// 1セッション = 1データベーストランザクション。
pub struct UnitOfWork {
    pool: PgPool,
}

impl UnitOfWork {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UnitOfWorkTrait for UnitOfWork {
    async fn begin(&self) -> Result<Box<dyn LendingSession>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PostgresSession { tx }))
    }
}

/// PostgreSQLのセッション
///
/// `commit` せずにドロップされると sqlx がロールバックする。
pub struct PostgresSession {
    tx: Transaction<'static, Postgres>,
}

fn storage(e: impl std::error::Error + Send + Sync + 'static) -> StockLedgerError {
    StockLedgerError::Storage(Box::new(e))
}

fn storage_boxed(e: Box<dyn std::error::Error + Send + Sync>) -> StockLedgerError {
    StockLedgerError::Storage(e)
}

impl PostgresSession {
    /// 条件付き更新が0行だったときに、理由（不在か状態不一致か）を調べる
    async fn current_status(
        &mut self,
        code: &StockCode,
    ) -> std::result::Result<Option<StockStatus>, StockLedgerError> {
        let row = sqlx::query("SELECT status FROM book_stocks WHERE code = $1")
            .bind(code.as_str())
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(storage)?;

        row.map(|row| {
            let status: &str = row.try_get("status").map_err(storage)?;
            StockStatus::from_str(status).map_err(|e| storage_boxed(invalid_data(e)))
        })
        .transpose()
    }
}

#[async_trait]
impl LendingSession for PostgresSession {
    /// status = 'AVAILABLE' を条件とする UPDATE で比較交換する
    ///
    /// 並行する同じ在庫への更新は行ロックで待たされ、
    /// 先行がコミットした後に条件を再評価して0行になる。
    async fn mark_borrowed(
        &mut self,
        code: &StockCode,
        borrower_id: CustomerId,
        at: DateTime<Utc>,
    ) -> std::result::Result<StockUnit, StockLedgerError> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE book_stocks
            SET status = 'BORROWED', borrower_id = $2, borrowed_at = $3
            WHERE code = $1 AND status = 'AVAILABLE'
            RETURNING {STOCK_COLUMNS}
            "#
        ))
        .bind(code.as_str())
        .bind(borrower_id.value())
        .bind(at)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(storage)?;

        if let Some(row) = row {
            return map_row_to_stock_unit(&row).map_err(storage_boxed);
        }

        match self.current_status(code).await? {
            Some(status) => Err(StockLedgerError::NotAvailable {
                code: code.clone(),
                status,
            }),
            None => Err(StockLedgerError::StockNotFound(code.clone())),
        }
    }

    async fn mark_available(
        &mut self,
        code: &StockCode,
    ) -> std::result::Result<StockUnit, StockLedgerError> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE book_stocks
            SET status = 'AVAILABLE', borrower_id = NULL, borrowed_at = NULL
            WHERE code = $1 AND status = 'BORROWED'
            RETURNING {STOCK_COLUMNS}
            "#
        ))
        .bind(code.as_str())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(storage)?;

        if let Some(row) = row {
            return map_row_to_stock_unit(&row).map_err(storage_boxed);
        }

        match self.current_status(code).await? {
            Some(status) => Err(StockLedgerError::InvalidStateTransition {
                code: code.clone(),
                status,
            }),
            None => Err(StockLedgerError::StockNotFound(code.clone())),
        }
    }

    async fn insert_transaction(&mut self, transaction: &LendingTransaction) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO book_transactions (
                id,
                book_id,
                stock_code,
                customer_id,
                due_date,
                status,
                borrowed_at,
                returned_at,
                updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(transaction.transaction_id.value())
        .bind(transaction.book_id.value())
        .bind(transaction.stock_code.as_str())
        .bind(transaction.customer_id.value())
        .bind(transaction.due_date)
        .bind(transaction.status.as_str())
        .bind(transaction.borrowed_at)
        .bind(transaction.returned_at)
        .bind(transaction.updated_at)
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    /// status = 'BORROWED' を条件とする UPDATE で比較交換する
    async fn close_transaction(
        &mut self,
        transaction_id: TransactionId,
        returned_at: DateTime<Utc>,
    ) -> Result<Option<LendingTransaction>> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE book_transactions
            SET status = 'RETURNED', returned_at = $2, updated_at = $2
            WHERE id = $1 AND status = 'BORROWED'
            RETURNING {TRANSACTION_COLUMNS}
            "#
        ))
        .bind(transaction_id.value())
        .bind(returned_at)
        .fetch_optional(&mut *self.tx)
        .await?;

        row.as_ref().map(map_row_to_transaction).transpose()
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }
}
