//! pesalens-finance: category definitions, the multi-label categorizer,
//! statement filters and per-category analysis

pub mod analyzer;
pub mod categorizer;
pub mod definitions;
pub mod entity;
pub mod filter;
pub mod rules;

pub use analyzer::{AnalysisResult, CategoryAnalysis, EntityRollup, analyze, analyze_statement, group_by_type, infer_direction};
pub use categorizer::{CategorizedStatement, CategoryBucket, Categorizer};
pub use definitions::{CategoryDefinition, CategorySet, load_definitions, parse_definitions};
pub use entity::{EntityExtractor, EntityStrategy, ExtractedEntity};
pub use filter::{StatementFilter, available_months, month_key, transaction_months};
pub use rules::{FieldValues, MatchOp, MatchSpec, PatternField, Patterns};
