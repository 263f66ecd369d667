use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{ChargeId, FeeError, LendingTransaction, StaffId, TransactionId, fee, transaction};

/// 延滞料金 - 返却済みの貸出取引1件に紐づく記録
///
/// 作成後は変更しない（日額が後で変わっても追従しない追記専用の履歴）。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Charge {
    pub charge_id: ChargeId,
    pub transaction_id: TransactionId,
    pub days_late: i64,
    /// 計算時点の日額のスナップショット
    pub daily_late_fee: Decimal,
    pub total: Decimal,
    pub processed_by: StaffId,
    pub created_at: DateTime<Utc>,
}

/// 純粋関数：返却時の延滞料金を査定する
///
/// 期限内の返却なら `Ok(None)`。
pub fn assess_late_fee(
    transaction: &LendingTransaction,
    returned_at: DateTime<Utc>,
    daily_late_fee: Decimal,
    processed_by: StaffId,
) -> Result<Option<Charge>, FeeError> {
    let Some(days_late) = transaction::days_late(transaction.due_date, returned_at) else {
        return Ok(None);
    };

    let total = fee::calculate_fee(days_late, daily_late_fee)?;

    Ok(Some(Charge {
        charge_id: ChargeId::new(),
        transaction_id: transaction.transaction_id,
        days_late,
        daily_late_fee,
        total,
        processed_by,
        created_at: returned_at,
    }))
}
