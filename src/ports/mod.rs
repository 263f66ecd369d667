pub mod book_catalog;
pub mod charge_repository;
pub mod customer_directory;
pub mod stock_ledger;
pub mod transaction_store;
pub mod unit_of_work;

pub use book_catalog::BookCatalog;
pub use charge_repository::ChargeRepository;
pub use customer_directory::CustomerDirectory;
pub use stock_ledger::{StockLedger, StockLedgerError};
pub use transaction_store::TransactionStore;
pub use unit_of_work::{LendingSession, UnitOfWork};
