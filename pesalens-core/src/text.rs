//! Text helpers shared by the normalizer and entity extraction.

/// Collapse every whitespace run to a single space and trim the ends.
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Title-case `s` the way statement text is conventionally rendered:
/// the first letter of every run of letters is upper-cased and the rest of
/// the run lower-cased. Digits and punctuation break a run, so
/// `"0712***678 JOHN"` becomes `"0712***678 John"` and `"o'neil"` becomes
/// `"O'Neil"`.
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_word = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if in_word {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(c);
            in_word = false;
        }
    }
    out
}

/// True if `s` starts with an ASCII digit.
pub fn starts_with_digit(s: &str) -> bool {
    s.chars().next().is_some_and(|c| c.is_ascii_digit())
}
