mod directory;
mod errors;
mod lending_service;
mod views;

pub use directory::{
    TransactionFilter, find_active, find_all_charges, find_available_stock, find_by_book,
    find_by_customer, find_by_stock_code, find_charges_for_transaction, find_overdue,
    find_stock_by_book, find_transactions, get_stock, get_transaction,
};
pub use errors::{LendingError, ReferenceKind, Result};
pub use lending_service::{
    ChargeOutcome, DEFAULT_DAILY_LATE_FEE, DEFAULT_OPERATION_TIMEOUT_SECS, LendingPolicy,
    ReturnReceipt, ServiceDependencies, borrow_book, delete_transaction, return_book,
    update_transaction,
};
pub use views::TransactionView;
