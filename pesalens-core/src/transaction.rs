//! Canonical transaction records produced by the normalizer and categorizer

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Category assigned to transactions whose details are empty.
pub const NO_DETAILS: &str = "NoDetails";

/// Category assigned to transactions that matched no definition.
pub const UNCATEGORIZED: &str = "uncategorized";

/// A normalized statement row
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transaction {
    /// Receipt number; the same receipt may appear on several rows
    /// (a transfer and its charge share one).
    pub receipt_no: String,
    pub completion_time: NaiveDateTime,
    /// Whitespace-collapsed, title-cased description
    pub details: String,
    /// Money received, never negative
    pub paid_in: f64,
    /// Money paid out, never negative
    pub withdrawn: f64,
    /// Part of `details` before the last " - " separator
    #[serde(rename = "type")]
    pub txn_type: String,
    /// Part of `details` after the last " - " separator
    pub entity: String,
    /// First four tokens of `txn_type`
    pub type_class: String,
    /// Remaining tokens of `txn_type`
    pub type_desc: String,
}

impl Transaction {
    /// False when the details are empty or the literal `nan` left behind by
    /// the extraction backend.
    pub fn has_details(&self) -> bool {
        let d = self.details.trim();
        !d.is_empty() && !d.eq_ignore_ascii_case("nan")
    }

    /// True if "charge" appears in the type description or the details.
    pub fn is_charge(&self) -> bool {
        self.type_desc.to_lowercase().contains("charge")
            || self.details.to_lowercase().contains("charge")
    }

    /// The amount column that is authoritative for `direction`.
    pub fn amount(&self, direction: Direction) -> f64 {
        match direction {
            Direction::Inbound => self.paid_in,
            Direction::Outbound => self.withdrawn,
        }
    }
}

/// A transaction tagged with one category.
///
/// One transaction may produce several of these, one per matched category.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CategorizedTransaction {
    #[serde(flatten)]
    pub transaction: Transaction,
    /// Cleaned counterparty name
    pub processed_entity: String,
    /// Secondary identifier pulled out of the entity (phone, paybill account)
    pub account_no: Option<String>,
    pub is_charge: bool,
    pub category: String,
}

impl CategorizedTransaction {
    /// Tag `transaction` with `category`, leaving the entity untouched.
    pub fn new(transaction: Transaction, category: impl Into<String>) -> Self {
        let is_charge = transaction.is_charge();
        Self {
            processed_entity: transaction.entity.clone(),
            account_no: None,
            is_charge,
            category: category.into(),
            transaction,
        }
    }

    pub fn amount(&self, direction: Direction) -> f64 {
        self.transaction.amount(direction)
    }

    pub fn receipt_no(&self) -> &str {
        &self.transaction.receipt_no
    }
}

/// Which amount column is authoritative for a category
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Money received: `paid_in`
    Inbound,
    /// Money paid out: `withdrawn`
    #[default]
    Outbound,
}

impl Direction {
    pub fn from_money_in(is_money_in: bool) -> Self {
        if is_money_in {
            Direction::Inbound
        } else {
            Direction::Outbound
        }
    }

    /// Name of the authoritative amount column
    pub fn amount_column(&self) -> &'static str {
        match self {
            Direction::Inbound => "paid_in",
            Direction::Outbound => "withdrawn",
        }
    }
}
