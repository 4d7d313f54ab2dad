//! Per-type value conversion and validation.
//!
//! A [`Converter`] turns one raw token into a typed value and then checks the
//! value against any additional constraints (ranges, lengths, regexes).
//! Conversion failures carry the offending text and a short description of
//! what was expected; the owning argument renders the final message.

mod choice;
mod file;
mod number;
mod text;

pub use choice::ChoiceConverter;
pub use file::{FileHandle, OpenMode};
pub use number::{
    Float, FloatConverter, Integer, IntegerConverter, RangeBound, RangeSet, ValueRange,
};
pub use text::{Captures, StringConverter};
pub(crate) use text::{RegexRule, RulePattern};

/// A value that could not be converted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionError {
    /// The raw text that failed to convert.
    pub text: String,
    /// What the text should have looked like (e.g. "an integer").
    pub reason: String,
}

impl ConversionError {
    pub fn new(text: &str, reason: impl Into<String>) -> Self {
        Self {
            text: text.to_string(),
            reason: reason.into(),
        }
    }
}

/// Parsing and validation logic for one value type.
pub trait Converter {
    /// The type produced by a successful conversion.
    type Value: Clone + 'static;

    /// Converts raw text to a value.
    fn parse(&self, raw: &str) -> Result<Self::Value, ConversionError>;

    /// Returns a message if `value` violates a semantic constraint.
    fn violates_constraints(&self, _value: &Self::Value) -> Option<String> {
        None
    }

    /// Returns capture groups recorded while validating `value`, if the
    /// converter records any.
    fn captures_for(&self, _value: &Self::Value) -> Option<Captures> {
        None
    }
}

const FALSE_WORDS: [&str; 3] = ["no", "false", "0"];
const TRUE_WORDS: [&str; 3] = ["yes", "true", "1"];

/// Parses an attached boolean value.
///
/// The text must be a non-empty, case-sensitive prefix of exactly one of
/// `no`, `false`, `0`, `yes`, `true`, `1`.
///
/// # Examples
///
/// ```
/// use farg_core::parse_bool;
///
/// assert_eq!(parse_bool("y").unwrap(), true);
/// assert_eq!(parse_bool("fal").unwrap(), false);
/// assert!(parse_bool("").is_err());
/// assert!(parse_bool("Yes").is_err());
/// ```
pub fn parse_bool(raw: &str) -> Result<bool, ConversionError> {
    let reason = "expected a prefix of no, false, 0, yes, true or 1";
    if raw.is_empty() {
        return Err(ConversionError::new(raw, reason));
    }
    let is_false = FALSE_WORDS.iter().any(|w| w.starts_with(raw));
    let is_true = TRUE_WORDS.iter().any(|w| w.starts_with(raw));
    match (is_false, is_true) {
        (true, false) => Ok(false),
        (false, true) => Ok(true),
        _ => Err(ConversionError::new(raw, reason)),
    }
}

/// Joins items as "a", "a and b", or "a, b and c".
pub(crate) fn join_with(items: &[String], last: &str) -> String {
    match items {
        [] => String::new(),
        [only] => only.clone(),
        [init @ .., tail] => format!("{} {last} {tail}", init.join(", ")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bool_accepts_prefixes() {
        for raw in ["n", "no", "f", "fa", "false", "0"] {
            assert_eq!(parse_bool(raw), Ok(false), "{raw}");
        }
        for raw in ["y", "ye", "yes", "t", "tru", "true", "1"] {
            assert_eq!(parse_bool(raw), Ok(true), "{raw}");
        }
    }

    #[test]
    fn test_parse_bool_rejects_bad_input() {
        for raw in ["", "nope", "TRUE", "2", "yess", "on"] {
            assert!(parse_bool(raw).is_err(), "{raw}");
        }
    }

    #[test]
    fn test_join_with() {
        let items: Vec<String> = ["a", "b", "c"].iter().map(|s| s.to_string()).collect();
        assert_eq!(join_with(&items[..1], "and"), "a");
        assert_eq!(join_with(&items[..2], "and"), "a and b");
        assert_eq!(join_with(&items, "or"), "a, b or c");
    }
}
