use crate::domain::{Book, BookId};
use crate::ports::book_catalog::{BookCatalog as BookCatalogTrait, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

/// BookCatalogのモック実装
///
/// 登録した書籍だけを返す。
pub struct BookCatalog {
    books: Mutex<HashMap<BookId, Book>>,
}

impl BookCatalog {
    pub fn new() -> Self {
        Self {
            books: Mutex::new(HashMap::new()),
        }
    }

    /// テスト用に書籍を登録
    pub fn add_book(&self, book: Book) {
        self.books.lock().unwrap().insert(book.book_id, book);
    }

    /// テスト用に書籍を削除（カタログ側で削除された状態を再現）
    pub fn remove_book(&self, book_id: BookId) {
        self.books.lock().unwrap().remove(&book_id);
    }
}

impl Default for BookCatalog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BookCatalogTrait for BookCatalog {
    async fn get_book(&self, book_id: BookId) -> Result<Option<Book>> {
        Ok(self.books.lock().unwrap().get(&book_id).cloned())
    }
}
