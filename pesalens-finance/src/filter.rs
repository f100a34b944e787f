//! Narrowing a categorized statement by date range or by month.

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use pesalens_core::{CategorizedTransaction, Transaction};
use std::collections::BTreeSet;
use tracing::{debug, info};

use crate::categorizer::CategorizedStatement;

/// Which transactions of a statement to keep
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum StatementFilter {
    #[default]
    All,
    /// Inclusive of both end dates
    DateRange { start: NaiveDate, end: NaiveDate },
    /// Month keys such as `January_2024`
    Months(Vec<String>),
}

impl StatementFilter {
    /// A date range wins over months when both are supplied; a range needs
    /// both ends.
    pub fn from_options(
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        months: Vec<String>,
    ) -> Self {
        match (start, end) {
            (Some(start), Some(end)) => StatementFilter::DateRange { start, end },
            _ if !months.is_empty() => StatementFilter::Months(months),
            _ => StatementFilter::All,
        }
    }

    pub fn matches(&self, completion_time: &NaiveDateTime) -> bool {
        match self {
            StatementFilter::All => true,
            StatementFilter::DateRange { start, end } => {
                let date = completion_time.date();
                *start <= date && date <= *end
            }
            StatementFilter::Months(months) => {
                let key = month_key(completion_time);
                months.iter().any(|m| *m == key)
            }
        }
    }

    pub fn apply(&self, statement: &CategorizedStatement) -> CategorizedStatement {
        if *self == StatementFilter::All {
            return statement.clone();
        }
        let filtered = statement.retain(|t: &CategorizedTransaction| {
            self.matches(&t.transaction.completion_time)
        });
        info!(
            "Filter {:?} kept {} of {} rows",
            self,
            filtered.total_rows(),
            statement.total_rows()
        );
        filtered
    }
}

/// `"<Month>_<Year>"`, e.g. `January_2024`.
pub fn month_key(time: &NaiveDateTime) -> String {
    time.format("%B_%Y").to_string()
}

/// Month keys present in the statement, oldest first.
pub fn available_months(statement: &CategorizedStatement) -> Vec<String> {
    month_keys(
        statement
            .iter()
            .flat_map(|b| b.transactions.iter())
            .map(|t| t.transaction.completion_time),
    )
}

/// Month keys present in normalized transactions, oldest first.
pub fn transaction_months(txns: &[Transaction]) -> Vec<String> {
    month_keys(txns.iter().map(|t| t.completion_time))
}

fn month_keys(times: impl Iterator<Item = NaiveDateTime>) -> Vec<String> {
    let months: BTreeSet<(i32, u32)> = times.map(|time| (time.year(), time.month())).collect();
    debug!("{} months in statement", months.len());
    months
        .into_iter()
        .filter_map(|(y, m)| NaiveDate::from_ymd_opt(y, m, 1))
        .filter_map(|d| d.and_hms_opt(0, 0, 0))
        .map(|d| month_key(&d))
        .collect()
}
