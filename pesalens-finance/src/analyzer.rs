//! Per-category aggregation: totals, charges, receipt counts and the
//! per-counterparty rollup.

use pesalens_core::{CategorizedTransaction, Direction};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use tracing::debug;

use crate::categorizer::CategorizedStatement;
use crate::definitions::CategorySet;

/// Display group for the sentinel buckets and untyped categories.
pub const OTHER_TYPE: &str = "other";

/// Non-charge rows of one counterparty
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityRollup {
    pub processed_entity: String,
    pub count: usize,
    pub amount: f64,
    /// Distinct non-empty account numbers seen for this counterparty
    pub accounts: Vec<String>,
}

/// Aggregates for one category
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    pub direction: Direction,
    /// Authoritative column summed over non-charge rows
    pub total_amount: f64,
    /// Authoritative column summed over charge rows
    pub total_charges: f64,
    /// Distinct receipt numbers among non-charge rows
    pub transaction_count: usize,
    /// Sorted by amount, largest first
    pub by_entity: Vec<EntityRollup>,
    /// Every row of the category, charges included
    pub transactions: Vec<CategorizedTransaction>,
}

impl AnalysisResult {
    pub fn empty(direction: Direction) -> Self {
        Self {
            direction,
            total_amount: 0.0,
            total_charges: 0.0,
            transaction_count: 0,
            by_entity: Vec::new(),
            transactions: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    /// The `k` largest counterparties.
    pub fn top(&self, k: usize) -> &[EntityRollup] {
        &self.by_entity[..k.min(self.by_entity.len())]
    }
}

#[derive(Default)]
struct EntityAccumulator {
    count: usize,
    amount: f64,
    accounts: BTreeSet<String>,
}

/// Aggregate the rows of one category, reading amounts from the column
/// `direction` selects.
pub fn analyze(rows: &[CategorizedTransaction], direction: Direction) -> AnalysisResult {
    if rows.is_empty() {
        return AnalysisResult::empty(direction);
    }

    let mut total_amount = 0.0;
    let mut total_charges = 0.0;
    let mut receipts = HashSet::new();
    let mut entities: BTreeMap<&str, EntityAccumulator> = BTreeMap::new();

    for row in rows {
        let amount = row.amount(direction);
        if row.is_charge {
            total_charges += amount;
            continue;
        }
        total_amount += amount;
        receipts.insert(row.receipt_no());

        let acc = entities.entry(row.processed_entity.as_str()).or_default();
        acc.count += 1;
        acc.amount += amount;
        if let Some(account) = row.account_no.as_deref().filter(|a| !a.is_empty()) {
            acc.accounts.insert(account.to_string());
        }
    }

    let mut by_entity: Vec<EntityRollup> = entities
        .into_iter()
        .map(|(name, acc)| EntityRollup {
            processed_entity: name.to_string(),
            count: acc.count,
            amount: acc.amount,
            accounts: acc.accounts.into_iter().collect(),
        })
        .collect();
    by_entity.sort_by(|a, b| b.amount.total_cmp(&a.amount));

    AnalysisResult {
        direction,
        total_amount,
        total_charges,
        transaction_count: receipts.len(),
        by_entity,
        transactions: rows.to_vec(),
    }
}

/// Inbound when more money came in than went out across `rows`.
pub fn infer_direction(rows: &[CategorizedTransaction]) -> Direction {
    let paid_in: f64 = rows.iter().map(|r| r.transaction.paid_in).sum();
    let withdrawn: f64 = rows.iter().map(|r| r.transaction.withdrawn).sum();
    Direction::from_money_in(paid_in > withdrawn)
}

/// One category's analysis with its display metadata
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryAnalysis {
    pub name: String,
    pub category_type: String,
    pub result: AnalysisResult,
}

/// Analyze every non-empty category of `statement`. Defined categories use
/// their declared or colour-implied direction; the sentinel buckets infer it
/// from their rows.
pub fn analyze_statement(
    statement: &CategorizedStatement,
    categories: &CategorySet,
) -> Vec<CategoryAnalysis> {
    statement
        .non_empty()
        .map(|bucket| {
            let (category_type, direction) = match categories.get(&bucket.name) {
                Some(def) if !def.category_type.is_empty() => {
                    (def.category_type.clone(), def.direction())
                }
                Some(def) => (OTHER_TYPE.to_string(), def.direction()),
                None => (OTHER_TYPE.to_string(), infer_direction(&bucket.transactions)),
            };
            debug!("Analyzing {} as {:?}", bucket.name, direction);
            CategoryAnalysis {
                name: bucket.name.clone(),
                category_type,
                result: analyze(&bucket.transactions, direction),
            }
        })
        .collect()
}

/// Category names grouped by display type, both in first-appearance order.
pub fn group_by_type(analyses: &[CategoryAnalysis]) -> Vec<(String, Vec<String>)> {
    let mut groups: Vec<(String, Vec<String>)> = Vec::new();
    for a in analyses {
        match groups.iter_mut().find(|(t, _)| *t == a.category_type) {
            Some((_, names)) => names.push(a.name.clone()),
            None => groups.push((a.category_type.clone(), vec![a.name.clone()])),
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::categorizer::Categorizer;
    use crate::definitions::CategoryDefinition;
    use crate::rules::{MatchSpec, PatternField};
    use chrono::NaiveDate;
    use pesalens_core::{Transaction, UNCATEGORIZED};

    fn row(receipt: &str, entity: &str, paid_in: f64, withdrawn: f64, charge: bool) -> CategorizedTransaction {
        let t = Transaction {
            receipt_no: receipt.to_string(),
            completion_time: NaiveDate::from_ymd_opt(2024, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            details: entity.to_string(),
            paid_in,
            withdrawn,
            txn_type: String::new(),
            entity: entity.to_string(),
            type_class: String::new(),
            type_desc: String::new(),
        };
        let mut c = CategorizedTransaction::new(t, "Test");
        c.is_charge = charge;
        c
    }

    #[test]
    fn test_outbound_totals_and_charges() {
        let rows = vec![
            row("R1", "A", 0.0, 300.0, false),
            row("R1", "A", 0.0, 30.0, true),
        ];
        let r = analyze(&rows, Direction::Outbound);
        assert_eq!(r.total_amount, 300.0);
        assert_eq!(r.total_charges, 30.0);
        assert_eq!(r.transaction_count, 1);
        assert_eq!(r.transactions.len(), 2);
        assert_eq!(r.by_entity.len(), 1);
        assert_eq!(r.by_entity[0].count, 1);
    }

    #[test]
    fn test_inbound_reads_paid_in() {
        let rows = vec![row("R1", "A", 500.0, 0.0, false)];
        let r = analyze(&rows, Direction::Inbound);
        assert_eq!(r.total_amount, 500.0);
        assert_eq!(analyze(&rows, Direction::Outbound).total_amount, 0.0);
    }

    #[test]
    fn test_empty_is_canonical() {
        let r = analyze(&[], Direction::Inbound);
        assert_eq!(r, AnalysisResult::empty(Direction::Inbound));
        assert!(r.is_empty());
        assert!(r.top(5).is_empty());
    }

    #[test]
    fn test_receipts_counted_once() {
        let rows = vec![
            row("R1", "A", 0.0, 100.0, false),
            row("R1", "A", 0.0, 50.0, false),
            row("R2", "B", 0.0, 10.0, false),
        ];
        assert_eq!(analyze(&rows, Direction::Outbound).transaction_count, 2);
    }

    #[test]
    fn test_rollup_sorted_descending() {
        let rows = vec![
            row("R1", "Small", 0.0, 10.0, false),
            row("R2", "Big", 0.0, 900.0, false),
            row("R3", "Mid", 0.0, 200.0, false),
            row("R4", "Small", 0.0, 15.0, false),
        ];
        let r = analyze(&rows, Direction::Outbound);
        let amounts: Vec<f64> = r.by_entity.iter().map(|e| e.amount).collect();
        assert!(amounts.windows(2).all(|w| w[0] >= w[1]));
        assert_eq!(r.by_entity[2].processed_entity, "Small");
        assert_eq!(r.by_entity[2].count, 2);
        assert_eq!(r.top(2).len(), 2);
        assert_eq!(r.top(10).len(), 3);
    }

    #[test]
    fn test_rollup_collects_accounts() {
        let mut a = row("R1", "Kplc Prepaid", 0.0, 100.0, false);
        a.account_no = Some("111".into());
        let mut b = row("R2", "Kplc Prepaid", 0.0, 100.0, false);
        b.account_no = Some("222".into());
        let mut c = row("R3", "Kplc Prepaid", 0.0, 100.0, false);
        c.account_no = Some("111".into());
        let r = analyze(&[a, b, c], Direction::Outbound);
        assert_eq!(r.by_entity[0].accounts, vec!["111", "222"]);
    }

    #[test]
    fn test_infer_direction() {
        let rows = vec![row("R1", "A", 500.0, 0.0, false), row("R2", "B", 0.0, 100.0, false)];
        assert_eq!(infer_direction(&rows), Direction::Inbound);
        assert_eq!(infer_direction(&[]), Direction::Outbound);
    }

    #[test]
    fn test_analyze_statement_and_grouping() {
        let defs = vec![
            CategoryDefinition::new("Deposit", "Money In")
                .with_color_map("Greens")
                .with_pattern(PatternField::Details, MatchSpec::new().contains(&["deposit"])),
            CategoryDefinition::new("Empty", "Money In")
                .with_pattern(PatternField::Details, MatchSpec::new().contains(&["never"])),
        ];
        let set = CategorySet::new(defs).unwrap();
        let categorizer = Categorizer::new(set.clone()).unwrap();

        let mut deposit = row("R1", "Deposit Of Funds", 1000.0, 0.0, false).transaction;
        deposit.details = "Deposit Of Funds At Agent".into();
        let mut refund = row("R2", "Refund", 70.0, 0.0, false).transaction;
        refund.details = "Refund Of Something".into();

        let statement = categorizer.categorize_all(&[deposit, refund]);
        let analyses = analyze_statement(&statement, &set);

        let names: Vec<&str> = analyses.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["Deposit", UNCATEGORIZED]);
        assert_eq!(analyses[0].result.direction, Direction::Inbound);
        assert_eq!(analyses[0].result.total_amount, 1000.0);
        assert_eq!(analyses[1].result.direction, Direction::Inbound);
        assert_eq!(analyses[1].result.total_amount, 70.0);

        assert_eq!(
            group_by_type(&analyses),
            vec![
                ("Money In".to_string(), vec!["Deposit".to_string()]),
                (OTHER_TYPE.to_string(), vec![UNCATEGORIZED.to_string()]),
            ]
        );
    }
}
