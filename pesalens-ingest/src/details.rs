//! Splitting the free-text details column.
//!
//! Statement details read like:
//!   Customer Transfer To - 0712***678 John Doe
//!   Pay Bill Online To 888880 - Kplc Prepaid Acc. 54321098
//! The part before the separator describes the mechanism (`type`), the part
//! after it names the counterparty (`entity`).

use pesalens_core::{collapse_whitespace, title_case};

/// Number of leading `type` tokens that form the `type_class`.
pub const TYPE_CLASS_TOKENS: usize = 4;

/// Collapse whitespace and title-case raw details text.
pub fn clean_details(raw: &str) -> String {
    title_case(&collapse_whitespace(raw))
}

/// Split details into `(type, entity)` at the last hyphen that has
/// whitespace (or the start of the text) before it and whitespace then
/// more text after it. Without such a separator both halves are the whole
/// input.
pub fn split_details(details: &str) -> (String, String) {
    let separator = details.match_indices('-').rev().find(|(i, _)| {
        let before = &details[..*i];
        let after = &details[i + 1..];
        (before.is_empty() || before.ends_with(char::is_whitespace))
            && after.starts_with(char::is_whitespace)
            && !after.trim().is_empty()
    });

    match separator {
        Some((i, _)) => (
            details[..i].trim().to_string(),
            details[i + 1..].trim().to_string(),
        ),
        None => (details.to_string(), details.to_string()),
    }
}

/// Split a transaction type into `(type_class, type_desc)`: the first four
/// tokens and whatever follows them.
pub fn split_type(txn_type: &str) -> (String, String) {
    let words: Vec<&str> = txn_type.split_whitespace().collect();
    let split = words.len().min(TYPE_CLASS_TOKENS);
    (words[..split].join(" "), words[split..].join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_details_with_separator() {
        let (ttype, entity) = split_details("Customer transfer to 254712345678 - JOHN DOE");
        assert!(ttype.contains("Customer transfer to 254712345678"));
        assert_eq!(entity, "JOHN DOE");
    }

    #[test]
    fn test_split_details_without_separator() {
        let (ttype, entity) = split_details("no separator here");
        assert_eq!(ttype, "no separator here");
        assert_eq!(entity, "no separator here");
    }

    #[test]
    fn test_split_details_uses_last_separator() {
        let (ttype, entity) = split_details("Merchant Payment To 5222 - Naivas - Kilimani");
        assert_eq!(ttype, "Merchant Payment To 5222 - Naivas");
        assert_eq!(entity, "Kilimani");
    }

    #[test]
    fn test_split_details_ignores_inline_hyphens() {
        // Hyphens inside words or without trailing whitespace are not separators
        let text = "Pay Bill To E-Citizen -Ref";
        assert_eq!(split_details(text), (text.to_string(), text.to_string()));

        let (ttype, entity) = split_details("Customer Transfer To - 0712***678 John Doe");
        assert_eq!(ttype, "Customer Transfer To");
        assert_eq!(entity, "0712***678 John Doe");
    }

    #[test]
    fn test_split_details_trailing_hyphen() {
        let text = "Funds Received -";
        assert_eq!(split_details(text), (text.to_string(), text.to_string()));
    }

    #[test]
    fn test_split_type_short_and_long() {
        assert_eq!(
            split_type("Funds received from"),
            ("Funds received from".to_string(), String::new())
        );
        assert_eq!(
            split_type("Customer transfer to 254712345678 from account"),
            (
                "Customer transfer to 254712345678".to_string(),
                "from account".to_string()
            )
        );
    }

    #[test]
    fn test_split_type_reconstructs_type() {
        let t = "Customer Transfer Of Funds Charge Reversal";
        let (class, desc) = split_type(t);
        assert_eq!(format!("{class} {desc}"), t);
        assert_eq!(split_type(""), (String::new(), String::new()));
    }

    #[test]
    fn test_clean_details() {
        assert_eq!(
            clean_details("  PAY BILL   online\nto 888880 - KPLC "),
            "Pay Bill Online To 888880 - Kplc"
        );
    }
}
