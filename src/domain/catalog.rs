use serde::{Deserialize, Serialize};

use super::{BookId, CustomerId};

/// 書籍のスナップショット（カタログ管理コンテキストから取得）
///
/// 貸出コンテキストは書籍を更新しない。表示と検索のためにのみ参照する。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub book_id: BookId,
    pub title: String,
    pub description: String,
}

/// 利用者のスナップショット（利用者管理コンテキストから取得）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub customer_id: CustomerId,
    pub code: String,
    pub name: String,
}
