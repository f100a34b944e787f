//! Declarative match rules for category definitions.
//!
//! A definition's `patterns` map a transaction field to a [`MatchSpec`].
//! Within one spec the operators are OR'd, evaluated in a fixed order:
//! contains, equals, startswith, startswith_numeric, not_starts_with.
//! Across fields the specs are AND'd. All comparisons are case-insensitive.

use pesalens_core::{Transaction, starts_with_digit};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Transaction fields a pattern may inspect
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternField {
    Details,
    Entity,
    TypeClass,
    TypeDesc,
}

/// A single named predicate over a lower-cased field value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchOp {
    /// Any substring occurs in the value
    Contains(Vec<String>),
    /// The value equals any entry
    Equals(Vec<String>),
    /// The value starts with any prefix
    StartsWith(Vec<String>),
    /// The value's first character is a digit (when `true`)
    StartsWithNumeric(bool),
    /// The value does not start with the prefix
    NotStartsWith(String),
}

impl MatchOp {
    /// `value` must already be lower-cased.
    pub fn matches(&self, value: &str) -> bool {
        match self {
            MatchOp::Contains(needles) => needles.iter().any(|n| value.contains(n.as_str())),
            MatchOp::Equals(candidates) => candidates.iter().any(|c| value == c.as_str()),
            MatchOp::StartsWith(prefixes) => prefixes.iter().any(|p| value.starts_with(p.as_str())),
            MatchOp::StartsWithNumeric(enabled) => *enabled && starts_with_digit(value),
            MatchOp::NotStartsWith(prefix) => !value.starts_with(prefix.as_str()),
        }
    }
}

/// The operators configured for one field, in evaluation order.
///
/// An empty spec has no recognized operator and places no constraint on
/// the field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawMatchSpec", into = "RawMatchSpec")]
pub struct MatchSpec {
    ops: Vec<MatchOp>,
}

impl MatchSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains<S: AsRef<str>>(mut self, needles: &[S]) -> Self {
        self.push(MatchOp::Contains(lowered(needles)));
        self
    }

    pub fn equals<S: AsRef<str>>(mut self, candidates: &[S]) -> Self {
        self.push(MatchOp::Equals(lowered(candidates)));
        self
    }

    pub fn starts_with<S: AsRef<str>>(mut self, prefixes: &[S]) -> Self {
        self.push(MatchOp::StartsWith(lowered(prefixes)));
        self
    }

    pub fn starts_with_numeric(mut self, enabled: bool) -> Self {
        self.push(MatchOp::StartsWithNumeric(enabled));
        self
    }

    pub fn not_starts_with(mut self, prefix: &str) -> Self {
        self.push(MatchOp::NotStartsWith(prefix.to_lowercase()));
        self
    }

    /// Insert `op`, replacing an operator of the same kind and keeping the
    /// fixed evaluation order.
    fn push(&mut self, op: MatchOp) {
        self.ops.retain(|existing| op_rank(existing) != op_rank(&op));
        self.ops.push(op);
        self.ops.sort_by_key(op_rank);
    }

    pub fn ops(&self) -> &[MatchOp] {
        &self.ops
    }

    /// True when no operator is configured.
    pub fn is_unconstrained(&self) -> bool {
        self.ops.is_empty()
    }

    /// True if any operator accepts `value` (lower-cased), or if the spec is
    /// unconstrained.
    pub fn matches(&self, value: &str) -> bool {
        self.is_unconstrained() || self.ops.iter().any(|op| op.matches(value))
    }
}

fn op_rank(op: &MatchOp) -> u8 {
    match op {
        MatchOp::Contains(_) => 0,
        MatchOp::Equals(_) => 1,
        MatchOp::StartsWith(_) => 2,
        MatchOp::StartsWithNumeric(_) => 3,
        MatchOp::NotStartsWith(_) => 4,
    }
}

fn lowered<S: AsRef<str>>(values: &[S]) -> Vec<String> {
    values.iter().map(|v| v.as_ref().to_lowercase()).collect()
}

/// A single value or a list, as written in a category file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    fn into_vec(self) -> Vec<String> {
        match self {
            OneOrMany::One(s) => vec![s],
            OneOrMany::Many(v) => v,
        }
    }
}

/// Match-spec keys as they appear in a category file. Unknown keys are
/// ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct RawMatchSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    contains: Option<OneOrMany>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    equals: Option<OneOrMany>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    startswith: Option<OneOrMany>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    startswith_numeric: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    not_starts_with: Option<String>,
}

impl From<RawMatchSpec> for MatchSpec {
    fn from(raw: RawMatchSpec) -> Self {
        let mut spec = MatchSpec::new();
        if let Some(v) = raw.contains {
            spec = spec.contains(&v.into_vec());
        }
        if let Some(v) = raw.equals {
            spec = spec.equals(&v.into_vec());
        }
        if let Some(v) = raw.startswith {
            spec = spec.starts_with(&v.into_vec());
        }
        if let Some(flag) = raw.startswith_numeric {
            spec = spec.starts_with_numeric(flag);
        }
        if let Some(prefix) = raw.not_starts_with {
            spec = spec.not_starts_with(&prefix);
        }
        spec
    }
}

impl From<MatchSpec> for RawMatchSpec {
    fn from(spec: MatchSpec) -> Self {
        let mut raw = RawMatchSpec::default();
        for op in spec.ops {
            match op {
                MatchOp::Contains(v) => raw.contains = Some(OneOrMany::Many(v)),
                MatchOp::Equals(v) => raw.equals = Some(OneOrMany::Many(v)),
                MatchOp::StartsWith(v) => raw.startswith = Some(OneOrMany::Many(v)),
                MatchOp::StartsWithNumeric(flag) => raw.startswith_numeric = Some(flag),
                MatchOp::NotStartsWith(p) => raw.not_starts_with = Some(p),
            }
        }
        raw
    }
}

/// Lower-cased copies of the fields patterns can inspect
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldValues {
    pub details: String,
    pub entity: String,
    pub type_class: String,
    pub type_desc: String,
}

impl FieldValues {
    pub fn from_transaction(txn: &Transaction) -> Self {
        Self {
            details: txn.details.to_lowercase(),
            entity: txn.entity.to_lowercase(),
            type_class: txn.type_class.to_lowercase(),
            type_desc: txn.type_desc.to_lowercase(),
        }
    }

    pub fn get(&self, field: PatternField) -> &str {
        match field {
            PatternField::Details => &self.details,
            PatternField::Entity => &self.entity,
            PatternField::TypeClass => &self.type_class,
            PatternField::TypeDesc => &self.type_desc,
        }
    }
}

/// Field -> match-spec mapping of one category definition
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Patterns(BTreeMap<PatternField, MatchSpec>);

impl Patterns {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: PatternField, spec: MatchSpec) -> Self {
        self.0.insert(field, spec);
        self
    }

    pub fn get(&self, field: PatternField) -> Option<&MatchSpec> {
        self.0.get(&field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True if every configured field matches. Fields without a spec impose
    /// no constraint.
    pub fn matches(&self, fields: &FieldValues) -> bool {
        self.0
            .iter()
            .all(|(field, spec)| spec.matches(fields.get(*field)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(details: &str, entity: &str, type_class: &str, type_desc: &str) -> FieldValues {
        FieldValues {
            details: details.to_lowercase(),
            entity: entity.to_lowercase(),
            type_class: type_class.to_lowercase(),
            type_desc: type_desc.to_lowercase(),
        }
    }

    #[test]
    fn test_contains_any() {
        let op = MatchOp::Contains(vec!["pay bill".into(), "paybill".into()]);
        assert!(op.matches("pay bill online to 888880"));
        assert!(op.matches("via paybill"));
        assert!(!op.matches("buy goods"));
    }

    #[test]
    fn test_equals_any() {
        let op = MatchOp::Equals(vec!["deposit of funds at agent".into()]);
        assert!(op.matches("deposit of funds at agent"));
        assert!(!op.matches("deposit of funds at agent till"));
    }

    #[test]
    fn test_starts_with_numeric() {
        assert!(MatchOp::StartsWithNumeric(true).matches("0712***678 john"));
        assert!(!MatchOp::StartsWithNumeric(true).matches("john"));
        assert!(!MatchOp::StartsWithNumeric(false).matches("0712"));
        assert!(!MatchOp::StartsWithNumeric(true).matches(""));
    }

    #[test]
    fn test_not_starts_with() {
        let op = MatchOp::NotStartsWith("safaricom".into());
        assert!(op.matches("kplc prepaid"));
        assert!(!op.matches("safaricom offers"));
    }

    #[test]
    fn test_spec_is_or_within_field() {
        let spec = MatchSpec::new()
            .contains(&["airtime"])
            .starts_with(&["bundle"]);
        assert!(spec.matches("airtime purchase"));
        assert!(spec.matches("bundle purchase"));
        assert!(!spec.matches("pay bill"));
    }

    #[test]
    fn test_spec_values_are_lowered() {
        let spec = MatchSpec::new().contains(&["Pay Bill"]);
        assert!(spec.matches("pay bill online"));
    }

    #[test]
    fn test_spec_keeps_evaluation_order() {
        let spec = MatchSpec::new()
            .not_starts_with("x")
            .contains(&["a"])
            .equals(&["b"]);
        let ranks: Vec<u8> = spec.ops().iter().map(op_rank).collect();
        assert_eq!(ranks, vec![0, 1, 4]);
    }

    #[test]
    fn test_empty_spec_is_unconstrained() {
        let spec = MatchSpec::new();
        assert!(spec.is_unconstrained());
        assert!(spec.matches("anything"));
    }

    #[test]
    fn test_patterns_and_across_fields() {
        let patterns = Patterns::new()
            .with(PatternField::Details, MatchSpec::new().contains(&["customer transfer"]))
            .with(PatternField::Entity, MatchSpec::new().starts_with_numeric(true));

        assert!(patterns.matches(&fields(
            "Customer Transfer To - 0712***678 John",
            "0712***678 John",
            "Customer Transfer To",
            ""
        )));
        assert!(!patterns.matches(&fields(
            "Customer Transfer To - John",
            "John",
            "Customer Transfer To",
            ""
        )));
    }

    #[test]
    fn test_empty_patterns_match_everything() {
        assert!(Patterns::new().matches(&fields("a", "b", "c", "d")));
    }

    #[test]
    fn test_deserialize_match_spec() {
        let spec: MatchSpec = serde_yaml::from_str(
            "contains: [\"Pay Bill\"]\nequals: exact\nunknown_key: 1\n",
        )
        .unwrap();
        assert_eq!(
            spec.ops(),
            &[
                MatchOp::Contains(vec!["pay bill".into()]),
                MatchOp::Equals(vec!["exact".into()]),
            ]
        );

        let empty: MatchSpec = serde_yaml::from_str("unknown_key: 1\n").unwrap();
        assert!(empty.is_unconstrained());
    }

    #[test]
    fn test_deserialize_patterns_rejects_unknown_field() {
        let err = serde_yaml::from_str::<Patterns>("amount:\n  contains: [x]\n");
        assert!(err.is_err());
    }
}
