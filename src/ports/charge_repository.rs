use crate::domain::{Charge, TransactionId};
use async_trait::async_trait;

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// 延滞料金リポジトリポート
///
/// 延滞料金は追記専用。更新・削除の操作は持たない。
#[async_trait]
pub trait ChargeRepository: Send + Sync {
    /// 延滞料金を記録する
    async fn create(&self, charge: &Charge) -> Result<()>;

    /// 貸出取引に紐づく延滞料金を作成順で取得する
    async fn find_by_transaction(&self, transaction_id: TransactionId) -> Result<Vec<Charge>>;

    /// すべての延滞料金を新しい順で取得する
    async fn find_all(&self) -> Result<Vec<Charge>>;
}
