use crate::domain::{Book, BookId};
use async_trait::async_trait;

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// 書籍カタログポート
///
/// 貸出コンテキストとカタログコンテキストの境界を維持する。
/// 書籍の登録・更新はカタログ側の責務で、貸出コンテキストは参照のみ行う。
#[async_trait]
pub trait BookCatalog: Send + Sync {
    /// IDで書籍を取得する
    ///
    /// 存在しない場合は `Ok(None)`。
    async fn get_book(&self, book_id: BookId) -> Result<Option<Book>>;
}
