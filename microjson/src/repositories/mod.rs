pub mod transaction;

pub use transaction::{Database, Transaction};
