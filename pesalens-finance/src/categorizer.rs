//! Multi-label categorization of normalized transactions.
//!
//! Every definition is evaluated against every transaction; a transaction
//! lands in each category it matches. Transactions without details go to
//! `NoDetails`, and those matching nothing go to `uncategorized`.

use pesalens_core::{
    CategorizedTransaction, NO_DETAILS, Result, Transaction, UNCATEGORIZED,
};
use std::collections::BTreeSet;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::definitions::{CategoryDefinition, CategorySet, load_definitions};
use crate::entity::EntityExtractor;
use crate::rules::FieldValues;

/// Applies a fixed, ordered set of category definitions
#[derive(Debug, Clone)]
pub struct Categorizer {
    categories: CategorySet,
    extractor: EntityExtractor,
}

impl Categorizer {
    pub fn new(categories: CategorySet) -> Result<Self> {
        info!("Categorizer ready with {} categories", categories.len());
        Ok(Self {
            categories,
            extractor: EntityExtractor::new()?,
        })
    }

    /// Load definitions from `path`, with the optional `custom` file
    /// evaluated ahead of them.
    pub fn from_path(path: impl AsRef<Path>, custom: Option<&Path>) -> Result<Self> {
        let mut categories = CategorySet::load(path)?;
        if let Some(custom) = custom {
            categories = categories.with_custom(load_definitions(custom)?)?;
        }
        Self::new(categories)
    }

    pub fn categories(&self) -> &CategorySet {
        &self.categories
    }

    pub fn definitions(&self) -> &[CategoryDefinition] {
        self.categories.definitions()
    }

    /// Tag `txn` with every matching category. Never returns an empty vec.
    pub fn categorize(&self, txn: &Transaction) -> Vec<CategorizedTransaction> {
        if !txn.has_details() {
            return vec![CategorizedTransaction::new(txn.clone(), NO_DETAILS)];
        }

        let fields = FieldValues::from_transaction(txn);
        let matched: Vec<CategorizedTransaction> = self
            .definitions()
            .iter()
            .filter(|def| def.patterns.matches(&fields))
            .map(|def| self.tag(txn, def))
            .collect();

        if matched.is_empty() {
            vec![CategorizedTransaction::new(txn.clone(), UNCATEGORIZED)]
        } else {
            matched
        }
    }

    fn tag(&self, txn: &Transaction, def: &CategoryDefinition) -> CategorizedTransaction {
        let entity = self.extractor.extract(def.entity_strategy(), &txn.entity);
        let mut tagged = CategorizedTransaction::new(txn.clone(), def.name.as_str());
        tagged.processed_entity = entity.name;
        tagged.account_no = entity.account_no;
        tagged
    }

    /// Categorize a whole statement into per-category buckets.
    pub fn categorize_all(&self, txns: &[Transaction]) -> CategorizedStatement {
        let mut statement = CategorizedStatement::with_names(
            self.definitions().iter().map(|d| d.name.as_str()),
        );
        for txn in txns {
            for tagged in self.categorize(txn) {
                statement.push(tagged);
            }
        }

        for bucket in statement.non_empty() {
            debug!("{}: {} rows", bucket.name, bucket.transactions.len());
        }
        if let Some(bucket) = statement.get(UNCATEGORIZED).filter(|b| !b.is_empty()) {
            let classes: BTreeSet<&str> = bucket
                .transactions
                .iter()
                .map(|t| t.transaction.type_class.as_str())
                .collect();
            warn!("{} transactions matched no category", bucket.len());
            debug!("Uncategorized type classes: {:?}", classes);
        }
        info!(
            "Categorized {} transactions into {} rows across {} categories",
            txns.len(),
            statement.total_rows(),
            statement.non_empty().count()
        );
        statement
    }
}

/// Transactions tagged with one category
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryBucket {
    pub name: String,
    pub transactions: Vec<CategorizedTransaction>,
}

impl CategoryBucket {
    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }
}

/// Category name -> transactions, in definition order followed by the
/// `NoDetails` and `uncategorized` sentinels. Every category appears, even
/// when empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategorizedStatement {
    buckets: Vec<CategoryBucket>,
}

impl CategorizedStatement {
    fn with_names<'a>(names: impl Iterator<Item = &'a str>) -> Self {
        let buckets = names
            .chain([NO_DETAILS, UNCATEGORIZED])
            .map(|name| CategoryBucket {
                name: name.to_string(),
                transactions: Vec::new(),
            })
            .collect();
        Self { buckets }
    }

    fn push(&mut self, tagged: CategorizedTransaction) {
        match self.buckets.iter_mut().find(|b| b.name == tagged.category) {
            Some(bucket) => bucket.transactions.push(tagged),
            None => self.buckets.push(CategoryBucket {
                name: tagged.category.clone(),
                transactions: vec![tagged],
            }),
        }
    }

    pub fn get(&self, name: &str) -> Option<&CategoryBucket> {
        self.buckets.iter().find(|b| b.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CategoryBucket> {
        self.buckets.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.buckets.iter().map(|b| b.name.as_str())
    }

    pub fn non_empty(&self) -> impl Iterator<Item = &CategoryBucket> {
        self.buckets.iter().filter(|b| !b.is_empty())
    }

    /// Rows across all buckets; a transaction counts once per category.
    pub fn total_rows(&self) -> usize {
        self.buckets.iter().map(CategoryBucket::len).sum()
    }

    /// Copy of the statement keeping only rows accepted by `keep`.
    pub fn retain(&self, mut keep: impl FnMut(&CategorizedTransaction) -> bool) -> Self {
        let buckets = self
            .buckets
            .iter()
            .map(|b| CategoryBucket {
                name: b.name.clone(),
                transactions: b.transactions.iter().filter(|t| keep(*t)).cloned().collect(),
            })
            .collect();
        Self { buckets }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityStrategy;
    use crate::rules::{MatchSpec, PatternField};
    use chrono::NaiveDate;
    use pesalens_ingest::{clean_details, split_details, split_type};

    fn txn(receipt: &str, raw_details: &str, withdrawn: f64) -> Transaction {
        let details = clean_details(raw_details);
        let (txn_type, entity) = split_details(&details);
        let (type_class, type_desc) = split_type(&txn_type);
        Transaction {
            receipt_no: receipt.to_string(),
            completion_time: NaiveDate::from_ymd_opt(2024, 1, 10)
                .unwrap()
                .and_hms_opt(9, 0, 0)
                .unwrap(),
            details,
            paid_in: 0.0,
            withdrawn,
            txn_type,
            entity,
            type_class,
            type_desc,
        }
    }

    fn categorizer() -> Categorizer {
        let defs = vec![
            CategoryDefinition::new("PayBillPayments", "Bills").with_pattern(
                PatternField::Details,
                MatchSpec::new().contains(&["pay bill"]),
            ),
            CategoryDefinition::new("Send Money", "Transfers").with_pattern(
                PatternField::Details,
                MatchSpec::new().contains(&["customer transfer"]),
            ),
            CategoryDefinition::new("Utilities", "Bills")
                .with_pattern(PatternField::Details, MatchSpec::new().contains(&["kplc"]))
                .with_entity_extraction(EntityStrategy::None),
        ];
        Categorizer::new(CategorySet::new(defs).unwrap()).unwrap()
    }

    #[test]
    fn test_pay_bill_contains_case_insensitive() {
        let out = categorizer().categorize(&txn("R1", "PAY BILL Online to 123 - ZUKU", 900.0));
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].category, "PayBillPayments");
    }

    #[test]
    fn test_fan_out_to_every_match() {
        let t = txn("R2", "Pay Bill Online To 888880 - KPLC PREPAID Acc. 54321098", 2000.0);
        let out = categorizer().categorize(&t);
        let cats: Vec<&str> = out.iter().map(|c| c.category.as_str()).collect();
        assert_eq!(cats, vec!["PayBillPayments", "Utilities"]);

        // Each copy gets its own category's entity processing
        assert_eq!(out[0].processed_entity, "Kplc Prepaid");
        assert_eq!(out[0].account_no.as_deref(), Some("54321098"));
        assert_eq!(out[1].processed_entity, "Kplc Prepaid Acc. 54321098");
        assert_eq!(out[1].account_no, None);
    }

    #[test]
    fn test_no_details_skips_rules() {
        let mut t = txn("R3", "", 10.0);
        t.details = "nan".into();
        let out = categorizer().categorize(&t);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].category, NO_DETAILS);
    }

    #[test]
    fn test_unmatched_is_uncategorized() {
        let out = categorizer().categorize(&txn("R4", "Mystery Item - SOMEONE", 5.0));
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].category, UNCATEGORIZED);
        assert_eq!(out[0].processed_entity, "Someone");
    }

    #[test]
    fn test_transfer_entity_split() {
        let t = txn("R5", "Customer Transfer to - 0712***678 JOHN DOE", 1500.0);
        let out = categorizer().categorize(&t);
        assert_eq!(out[0].category, "Send Money");
        assert_eq!(out[0].processed_entity, "John Doe");
        assert_eq!(out[0].account_no.as_deref(), Some("0712***678"));
    }

    #[test]
    fn test_categorize_all_buckets_in_order() {
        let c = categorizer();
        let txns = vec![
            txn("R1", "Pay Bill Online To 888880 - KPLC PREPAID Acc. 1", 100.0),
            txn("R2", "Customer Transfer To - 0712***678 JOHN DOE", 50.0),
            txn("R3", "Unknown - X", 1.0),
        ];
        let statement = c.categorize_all(&txns);
        let names: Vec<&str> = statement.names().collect();
        assert_eq!(
            names,
            vec!["PayBillPayments", "Send Money", "Utilities", NO_DETAILS, UNCATEGORIZED]
        );
        assert_eq!(statement.get("PayBillPayments").unwrap().len(), 1);
        assert_eq!(statement.get("Utilities").unwrap().len(), 1);
        assert!(statement.get(NO_DETAILS).unwrap().is_empty());
        assert_eq!(statement.get(UNCATEGORIZED).unwrap().len(), 1);
        assert_eq!(statement.total_rows(), 4);
        assert_eq!(statement.non_empty().count(), 4);
    }

    #[test]
    fn test_categorization_is_idempotent() {
        let c = categorizer();
        let txns = vec![
            txn("R1", "Pay Bill Online To 888880 - KPLC PREPAID Acc. 1", 100.0),
            txn("R2", "Customer Transfer To - 0712***678 JOHN DOE", 50.0),
        ];
        assert_eq!(c.categorize_all(&txns), c.categorize_all(&txns));
    }

    #[test]
    fn test_retain_filters_rows_keeps_buckets() {
        let c = categorizer();
        let txns = vec![
            txn("R1", "Pay Bill Online To 888880 - KPLC PREPAID Acc. 1", 100.0),
            txn("R2", "Customer Transfer To - 0712***678 JOHN DOE", 50.0),
        ];
        let kept = c.categorize_all(&txns).retain(|t| t.receipt_no() == "R2");
        assert_eq!(kept.total_rows(), 1);
        assert_eq!(kept.names().count(), 5);
    }
}
