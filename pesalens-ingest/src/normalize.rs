//! Normalize an extracted statement table into canonical transactions.
//!
//! Steps, in order:
//! 1. standardize column names (case, spacing, the two historical aliases)
//! 2. drop rows without a completion time
//! 3. keep only recognized columns, logging the rest
//! 4. coerce receipt, time and amount cells
//! 5. clean details, then derive type/entity and type_class/type_desc

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use pesalens_core::{Error, Result, Transaction};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::details::{clean_details, split_details, split_type};
use crate::table::RawTable;

/// Canonical statement column names
pub const RECOGNIZED_COLUMNS: [&str; 5] =
    ["receiptno", "completiontime", "details", "paidin", "withdrawn"];

/// Placeholders the extraction backend emits for an empty amount cell.
const AMOUNT_SENTINELS: [&str; 4] = ["", "-", "n/a", "nan"];

const DATETIME_FORMATS: [&str; 11] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%d-%m-%Y %H:%M:%S",
    "%d-%m-%Y %H:%M",
];

const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d-%m-%Y"];

/// Layouts carrying a UTC offset; the wall-clock time is kept.
const OFFSET_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%:z", "%Y-%m-%d %H:%M:%S%.f%:z"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Column {
    ReceiptNo,
    CompletionTime,
    Details,
    PaidIn,
    Withdrawn,
}

impl Column {
    fn from_standard(name: &str) -> Option<Self> {
        match name {
            "receiptno" => Some(Column::ReceiptNo),
            "completiontime" => Some(Column::CompletionTime),
            "details" => Some(Column::Details),
            "paidin" => Some(Column::PaidIn),
            "withdrawn" => Some(Column::Withdrawn),
            _ => None,
        }
    }
}

/// Positions of the recognized columns in the raw table. When a column
/// appears more than once the last occurrence wins.
#[derive(Debug, Default)]
struct ColumnMap {
    receipt_no: Option<usize>,
    completion_time: Option<usize>,
    details: Option<usize>,
    paid_in: Option<usize>,
    withdrawn: Option<usize>,
}

impl ColumnMap {
    fn slot(&mut self, column: Column) -> &mut Option<usize> {
        match column {
            Column::ReceiptNo => &mut self.receipt_no,
            Column::CompletionTime => &mut self.completion_time,
            Column::Details => &mut self.details,
            Column::PaidIn => &mut self.paid_in,
            Column::Withdrawn => &mut self.withdrawn,
        }
    }

    fn is_empty(&self) -> bool {
        self.receipt_no.is_none()
            && self.completion_time.is_none()
            && self.details.is_none()
            && self.paid_in.is_none()
            && self.withdrawn.is_none()
    }
}

/// Lower-case and trim a column name, then resolve the known aliases.
///
/// Whitespace inside the name is dropped too, which folds both the
/// "Receipt No." / "receiptno." variant and the "withdraw\nn" line-break
/// variant onto their canonical names. Names that are not recognized are
/// returned lower-cased and trimmed.
pub fn standardize_column(name: &str) -> String {
    let lowered = name.trim().to_lowercase();
    let compact: String = lowered.chars().filter(|c| !c.is_whitespace()).collect();
    let candidate = compact.strip_suffix('.').unwrap_or(&compact);
    if RECOGNIZED_COLUMNS.contains(&candidate) {
        candidate.to_string()
    } else {
        lowered
    }
}

/// Parse an amount cell. Thousands separators are stripped; blanks, `-`,
/// `N/A` and `nan` read as zero, as does anything unparseable. The sign is
/// preserved; callers decide how to make it non-negative.
pub fn parse_amount(raw: Option<&str>) -> f64 {
    let Some(raw) = raw else {
        return 0.0;
    };
    let cleaned = raw.trim().replace(',', "");
    if AMOUNT_SENTINELS.contains(&cleaned.to_lowercase().as_str()) {
        return 0.0;
    }
    match cleaned.parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        _ => 0.0,
    }
}

/// Parse a completion time in any of the layouts statements use. Dates
/// without a time read as midnight. Offset timestamps keep their local
/// wall-clock time.
pub fn parse_completion_time(raw: &str) -> Option<NaiveDateTime> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .or_else(|| {
            DateTime::parse_from_rfc3339(s)
                .ok()
                .or_else(|| {
                    OFFSET_FORMATS
                        .iter()
                        .find_map(|fmt| DateTime::parse_from_str(s, fmt).ok())
                })
                .map(|dt| dt.naive_local())
        })
}

/// Normalize an extracted table into transactions.
///
/// Fails with [`Error::Schema`] when the table is empty, carries none of the
/// recognized statement columns, or has no completion-time column (every row
/// would be dropped). Rows with a missing or unparseable completion time are
/// dropped and counted in the log.
pub fn normalize(table: &RawTable) -> Result<Vec<Transaction>> {
    info!("Starting statement normalization");

    if table.is_empty() {
        let msg = "statement table is empty - nothing to normalize".to_string();
        warn!("{msg}");
        return Err(Error::Schema(msg));
    }
    debug!("Input shape: {} rows x {} columns", table.len(), table.columns.len());

    let standardized: Vec<String> = table.columns.iter().map(|c| standardize_column(c)).collect();

    let mut map = ColumnMap::default();
    let mut extras = Vec::new();
    for (i, name) in standardized.iter().enumerate() {
        match Column::from_standard(name) {
            Some(column) => {
                let slot = map.slot(column);
                if slot.is_some() {
                    warn!("Duplicate column '{}'; keeping the last occurrence", name);
                }
                *slot = Some(i);
            }
            None => extras.push(name.clone()),
        }
    }

    if map.is_empty() {
        let found: Vec<&str> = table.columns.iter().take(5).map(String::as_str).collect();
        return Err(Error::Schema(format!(
            "no statement transaction columns found. Expected columns like: {}... Found columns: {}",
            RECOGNIZED_COLUMNS[..4].join(", "),
            found.join(", ")
        )));
    }
    info!("Statement transaction columns detected");

    if !extras.is_empty() {
        info!("Removing {} unexpected column(s): {:?}", extras.len(), extras);
    }

    let Some(time_col) = map.completion_time else {
        return Err(Error::Schema(
            "completion time column not found after standardization".to_string(),
        ));
    };
    for (col, name) in [
        (map.receipt_no, "receiptno"),
        (map.details, "details"),
        (map.paid_in, "paidin"),
        (map.withdrawn, "withdrawn"),
    ] {
        if col.is_none() {
            warn!("Column '{}' missing; filling with defaults", name);
        }
    }

    let mut txns = Vec::with_capacity(table.len());
    let mut null_times = 0usize;
    let mut bad_times = 0usize;
    let mut negative_paid_in = 0usize;

    for row in 0..table.len() {
        let cell = |col: Option<usize>| col.and_then(|c| table.cell(row, c));

        let Some(raw_time) = table.cell(row, time_col) else {
            null_times += 1;
            continue;
        };
        let Some(completion_time) = parse_completion_time(raw_time) else {
            bad_times += 1;
            continue;
        };

        let paid_in = parse_amount(cell(map.paid_in));
        if paid_in < 0.0 {
            negative_paid_in += 1;
        }

        let details = cell(map.details).map(clean_details).unwrap_or_default();
        let (txn_type, entity) = split_details(&details);
        let (type_class, type_desc) = split_type(&txn_type);

        txns.push(Transaction {
            receipt_no: cell(map.receipt_no).map(|s| s.trim().to_string()).unwrap_or_default(),
            completion_time,
            details,
            paid_in: paid_in.abs(),
            withdrawn: parse_amount(cell(map.withdrawn)).abs(),
            txn_type,
            entity,
            type_class,
            type_desc,
        });
    }

    if null_times > 0 {
        debug!("Dropped {} rows without a completion time", null_times);
    }
    if bad_times > 0 {
        warn!("{} dates could not be parsed", bad_times);
    }
    if negative_paid_in > 0 {
        warn!("{} negative paid-in amounts made positive", negative_paid_in);
    }

    let summary = StatementSummary::from_transactions(&txns);
    match (summary.first, summary.last) {
        (Some(first), Some(last)) => info!(
            "Date range: {} -> {}",
            first.format("%b %d, %Y"),
            last.format("%b %d, %Y")
        ),
        _ => warn!("No transactions survived normalization"),
    }
    info!("Normalization complete: {} transactions", txns.len());

    Ok(txns)
}

/// Headline figures for a normalized statement
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatementSummary {
    pub transactions: usize,
    pub first: Option<NaiveDateTime>,
    pub last: Option<NaiveDateTime>,
    pub total_paid_in: f64,
    pub total_withdrawn: f64,
}

impl StatementSummary {
    pub fn from_transactions(txns: &[Transaction]) -> Self {
        Self {
            transactions: txns.len(),
            first: txns.iter().map(|t| t.completion_time).min(),
            last: txns.iter().map(|t| t.completion_time).max(),
            total_paid_in: txns.iter().map(|t| t.paid_in).sum(),
            total_withdrawn: txns.iter().map(|t| t.withdrawn).sum(),
        }
    }
}
