pub mod book_catalog;
pub mod customer_directory;

pub use book_catalog::BookCatalog;
pub use customer_directory::CustomerDirectory;
