pub mod catalog;
pub mod charge_repository;
mod rows;
pub mod stock_ledger;
pub mod transaction_store;
pub mod unit_of_work;

// パブリックに型を再エクスポート
pub use catalog::BookCatalog as PostgresBookCatalog;
pub use catalog::CustomerDirectory as PostgresCustomerDirectory;
pub use charge_repository::ChargeRepository as PostgresChargeRepository;
pub use stock_ledger::StockLedger as PostgresStockLedger;
pub use transaction_store::TransactionStore as PostgresTransactionStore;
pub use unit_of_work::{PostgresSession, UnitOfWork as PostgresUnitOfWork};
