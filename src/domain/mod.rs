pub mod catalog;
pub mod charge;
pub mod commands;
pub mod errors;
pub mod fee;
pub mod stock;
pub mod transaction;
pub mod value_objects;

pub use catalog::*;
pub use charge::*;
pub use errors::*;
pub use stock::*;
pub use transaction::*;
pub use value_objects::*;
