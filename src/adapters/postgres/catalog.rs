use crate::domain::{Book, BookId, Customer, CustomerId};
use crate::ports::book_catalog::BookCatalog as BookCatalogTrait;
use crate::ports::customer_directory::{CustomerDirectory as CustomerDirectoryTrait, Result};
use async_trait::async_trait;
use sqlx::{PgPool, Row};

/// BookCatalogのPostgreSQL実装
///
/// カタログ管理が書き込む books テーブルを参照のみする。論理削除された書籍は見えない。
pub struct BookCatalog {
    pool: PgPool,
}

impl BookCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookCatalogTrait for BookCatalog {
    async fn get_book(&self, book_id: BookId) -> Result<Option<Book>> {
        let row = sqlx::query(
            r#"
            SELECT id, title, description
            FROM books
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(book_id.value())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| Book {
            book_id: BookId::from_uuid(row.get("id")),
            title: row.get("title"),
            description: row.get("description"),
        }))
    }
}

/// CustomerDirectoryのPostgreSQL実装
pub struct CustomerDirectory {
    pool: PgPool,
}

impl CustomerDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CustomerDirectoryTrait for CustomerDirectory {
    async fn get_customer(&self, customer_id: CustomerId) -> Result<Option<Customer>> {
        let row = sqlx::query(
            r#"
            SELECT id, code, name
            FROM customers
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(customer_id.value())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| Customer {
            customer_id: CustomerId::from_uuid(row.get("id")),
            code: row.get("code"),
            name: row.get("name"),
        }))
    }
}
