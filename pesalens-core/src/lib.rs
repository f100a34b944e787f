//! pesalens-core: shared statement types, errors and text helpers

pub mod error;
pub mod text;
pub mod transaction;

pub use error::{Error, Result};
pub use text::{collapse_whitespace, starts_with_digit, title_case};
pub use transaction::{CategorizedTransaction, Direction, NO_DETAILS, Transaction, UNCATEGORIZED};
