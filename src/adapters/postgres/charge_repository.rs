use crate::domain::{Charge, TransactionId};
use crate::ports::charge_repository::{ChargeRepository as ChargeRepositoryTrait, Result};
use async_trait::async_trait;
use sqlx::PgPool;

use super::rows::{CHARGE_COLUMNS, map_row_to_charge};

/// ChargeRepositoryのPostgreSQL実装（追記専用）
pub struct ChargeRepository {
    pool: PgPool,
}

impl ChargeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ChargeRepositoryTrait for ChargeRepository {
    async fn create(&self, charge: &Charge) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO charges (
                id,
                transaction_id,
                days_late,
                daily_late_fee,
                total,
                processed_by,
                created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(charge.charge_id.value())
        .bind(charge.transaction_id.value())
        .bind(charge.days_late)
        .bind(charge.daily_late_fee)
        .bind(charge.total)
        .bind(charge.processed_by.value())
        .bind(charge.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_transaction(&self, transaction_id: TransactionId) -> Result<Vec<Charge>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {CHARGE_COLUMNS}
            FROM charges
            WHERE transaction_id = $1
            ORDER BY created_at ASC
            "#
        ))
        .bind(transaction_id.value())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_row_to_charge).collect()
    }

    async fn find_all(&self) -> Result<Vec<Charge>> {
        let rows = sqlx::query(&format!(
            "SELECT {CHARGE_COLUMNS} FROM charges ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_row_to_charge).collect()
    }
}
