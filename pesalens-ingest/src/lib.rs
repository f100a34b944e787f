//! pesalens-ingest: extracted statement tables and the normalizer that turns
//! them into canonical transactions.

pub mod details;
pub mod normalize;
pub mod table;

pub use details::{clean_details, split_details, split_type};
pub use normalize::{StatementSummary, normalize, parse_amount, parse_completion_time, standardize_column};
pub use table::RawTable;
