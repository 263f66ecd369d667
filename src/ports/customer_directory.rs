use crate::domain::{Customer, CustomerId};
use async_trait::async_trait;

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// 利用者ディレクトリポート
///
/// 貸出コンテキストと利用者管理コンテキストの境界を維持する。
#[async_trait]
pub trait CustomerDirectory: Send + Sync {
    /// IDで利用者を取得する
    ///
    /// 存在しない場合は `Ok(None)`。
    async fn get_customer(&self, customer_id: CustomerId) -> Result<Option<Customer>>;
}
