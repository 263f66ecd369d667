//! PostgreSQLアダプターの結合テスト
//!
//! DATABASE_URL のデータベースが必要なため `#[ignore]` にしている。
//! `cargo test -- --ignored` で実行する。各テストは自前の書籍・利用者・在庫を
//! 一意なコードで作るため、並行して実行しても干渉しない。

use chrono::{DateTime, TimeZone, Utc};
use library_lending::adapters::postgres::*;
use library_lending::application::lending::*;
use library_lending::domain::commands::*;
use library_lending::domain::*;
use library_lending::ports::{StockLedger, TransactionStore};
use rust_decimal::Decimal;
use sqlx::PgPool;
use std::sync::Arc;

mod common;

fn at(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).unwrap()
}

fn deps(pool: &PgPool) -> ServiceDependencies {
    ServiceDependencies {
        book_catalog: Arc::new(PostgresBookCatalog::new(pool.clone())),
        customer_directory: Arc::new(PostgresCustomerDirectory::new(pool.clone())),
        stock_ledger: Arc::new(PostgresStockLedger::new(pool.clone())),
        transaction_store: Arc::new(PostgresTransactionStore::new(pool.clone())),
        charge_repository: Arc::new(PostgresChargeRepository::new(pool.clone())),
        unit_of_work: Arc::new(PostgresUnitOfWork::new(pool.clone())),
        policy: LendingPolicy::default(),
    }
}

struct Seeded {
    book_id: BookId,
    customer_id: CustomerId,
    code: StockCode,
}

/// 書籍・利用者・在庫1冊を登録する
async fn seed(pool: &PgPool) -> Seeded {
    let book_id = BookId::new();
    let customer_id = CustomerId::new();
    let code = StockCode::parse(&format!("S-{}", uuid::Uuid::new_v4().simple())).unwrap();

    sqlx::query("INSERT INTO books (id, title, description) VALUES ($1, $2, '')")
        .bind(book_id.value())
        .bind("The Rust Programming Language")
        .execute(pool)
        .await
        .expect("Failed to insert book");

    sqlx::query("INSERT INTO customers (id, code, name) VALUES ($1, $2, $3)")
        .bind(customer_id.value())
        .bind(format!("C-{}", customer_id.value().simple()))
        .bind("Alice Johnson")
        .execute(pool)
        .await
        .expect("Failed to insert customer");

    sqlx::query("INSERT INTO book_stocks (code, book_id) VALUES ($1, $2)")
        .bind(code.as_str())
        .bind(book_id.value())
        .execute(pool)
        .await
        .expect("Failed to insert stock unit");

    Seeded {
        book_id,
        customer_id,
        code,
    }
}

fn borrow_command(seeded: &Seeded) -> BorrowBook {
    BorrowBook {
        book_id: seeded.book_id,
        stock_code: Some(seeded.code.clone()),
        customer_id: seeded.customer_id,
        due_date: "2025-01-10".to_string(),
        borrowed_at: at(2025, 1, 1),
    }
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_postgres_borrow_and_late_return() {
    // Arrange
    let pool = common::create_test_pool().await;
    let deps = deps(&pool);
    let seeded = seed(&pool).await;

    // Act: 貸出
    let view = borrow_book(&deps, borrow_command(&seeded)).await.unwrap();

    // Assert
    let unit = deps.stock_ledger.get_by_code(&seeded.code).await.unwrap().unwrap();
    assert_eq!(unit.status, StockStatus::Borrowed);
    assert_eq!(unit.borrower_id, Some(seeded.customer_id));

    // Act: 延滞返却
    let receipt = return_book(
        &deps,
        ReturnBook {
            transaction_id: view.transaction_id,
            processed_by: StaffId::new(),
            returned_at: at(2025, 1, 15),
            daily_late_fee: None,
        },
    )
    .await
    .unwrap();

    // Assert
    match receipt.charge {
        ChargeOutcome::Recorded(charge) => {
            assert_eq!(charge.days_late, 5);
            assert_eq!(charge.total, Decimal::from(5000));
        }
        other => panic!("expected a recorded charge, got {other:?}"),
    }
    let unit = deps.stock_ledger.get_by_code(&seeded.code).await.unwrap().unwrap();
    assert_eq!(unit, StockUnit::available(seeded.code.clone(), seeded.book_id));

    let charges = find_charges_for_transaction(&deps, view.transaction_id)
        .await
        .unwrap();
    assert_eq!(charges.len(), 1);
    assert_eq!(charges[0].daily_late_fee, Decimal::from(1000));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore = "requires DATABASE_URL"]
async fn test_postgres_concurrent_borrows_only_one_succeeds() {
    let pool = common::create_test_pool().await;
    let deps = deps(&pool);
    let seeded = seed(&pool).await;

    let tasks = (0..6).map(|_| {
        let deps = deps.clone();
        let cmd = borrow_command(&seeded);
        tokio::spawn(async move { borrow_book(&deps, cmd).await })
    });
    let results: Vec<_> = futures::future::join_all(tasks)
        .await
        .into_iter()
        .map(|joined| joined.expect("task panicked"))
        .collect();

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(
        results
            .iter()
            .filter(|r| r.is_err())
            .all(|r| matches!(r, Err(LendingError::NotAvailable { .. })))
    );
    let history = deps
        .transaction_store
        .find_by_stock_code(&seeded.code)
        .await
        .unwrap();
    assert_eq!(history.len(), 1);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_postgres_return_rolls_back_when_ledger_refuses() {
    let pool = common::create_test_pool().await;
    let deps = deps(&pool);
    let seeded = seed(&pool).await;
    let view = borrow_book(&deps, borrow_command(&seeded)).await.unwrap();

    // 在庫管理が在庫を紛失扱いにした
    sqlx::query(
        "UPDATE book_stocks SET status = 'LOST', borrower_id = NULL, borrowed_at = NULL WHERE code = $1",
    )
    .bind(seeded.code.as_str())
    .execute(&pool)
    .await
    .unwrap();

    let result = return_book(
        &deps,
        ReturnBook {
            transaction_id: view.transaction_id,
            processed_by: StaffId::new(),
            returned_at: at(2025, 1, 5),
            daily_late_fee: None,
        },
    )
    .await;

    assert!(matches!(
        result,
        Err(LendingError::StockStateConflict {
            status: StockStatus::Lost,
            ..
        })
    ));
    let stored = deps
        .transaction_store
        .get_by_id(view.transaction_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, TransactionStatus::Borrowed);
    assert_eq!(stored.returned_at, None);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_postgres_legacy_available_status_reads_as_returned() {
    let pool = common::create_test_pool().await;
    let deps = deps(&pool);
    let seeded = seed(&pool).await;
    let view = borrow_book(&deps, borrow_command(&seeded)).await.unwrap();

    sqlx::query(
        "UPDATE book_transactions SET status = 'AVAILABLE', returned_at = $2 WHERE id = $1",
    )
    .bind(view.transaction_id.value())
    .bind(at(2025, 1, 5))
    .execute(&pool)
    .await
    .unwrap();

    let stored = deps
        .transaction_store
        .get_by_id(view.transaction_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, TransactionStatus::Returned);

    let returned = deps
        .transaction_store
        .find_all(Some(TransactionStatus::Returned))
        .await
        .unwrap();
    assert!(returned.iter().any(|t| t.transaction_id == view.transaction_id));
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_postgres_delete_cascades_charges() {
    let pool = common::create_test_pool().await;
    let deps = deps(&pool);
    let seeded = seed(&pool).await;
    let view = borrow_book(&deps, borrow_command(&seeded)).await.unwrap();
    return_book(
        &deps,
        ReturnBook {
            transaction_id: view.transaction_id,
            processed_by: StaffId::new(),
            returned_at: at(2025, 1, 12),
            daily_late_fee: None,
        },
    )
    .await
    .unwrap();

    delete_transaction(
        &deps,
        DeleteTransaction {
            transaction_id: view.transaction_id,
        },
    )
    .await
    .unwrap();

    let (count,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM charges WHERE transaction_id = $1")
            .bind(view.transaction_id.value())
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(count, 0);
}
