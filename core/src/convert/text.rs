//! String conversion with length bounds and ordered regex checks.

use std::sync::LazyLock;

use regex::Regex;

use super::{ConversionError, Converter};

/// A declared check pattern; lookaround is available, unlike [`Regex`].
pub(crate) type RulePattern = fancy_regex::Regex;

static REFERENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{(\d+):([A-Za-z0-9_]+)\}").expect("static regex must compile")
});

/// Capture groups recorded while validating a string.
///
/// Groups are kept per regex, in declaration order. Named groups are keyed by
/// name and unnamed groups by their number, so `{1:TYPE}` in a later error
/// message refers to group `TYPE` of regex `1`.
///
/// # Examples
///
/// ```
/// use farg_core::Handler;
///
/// let mut handler = Handler::new();
/// let iface = handler
///     .string("iface")
///     .snip_regex(r"^(?P<TYPE>eth|agg)(?=[0-9]|$)", "must begin with eth or agg")
///     .unwrap()
///     .regex(r"^(?P<NUMBER>[0-9]{1,3})$", "{0:TYPE} needs a 1-3 digit suffix")
///     .unwrap()
///     .register()
///     .unwrap();
///
/// handler.parse(["prog", "--iface", "agg12"]).unwrap();
/// let captures = handler.captures(&iface).unwrap();
/// assert_eq!(captures.get("TYPE"), Some("agg"));
/// assert_eq!(captures.get("NUMBER"), Some("12"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Captures {
    groups: Vec<Vec<(String, Option<String>)>>,
}

impl Captures {
    /// Returns the first group called `name` across all regexes.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.groups
            .iter()
            .find_map(|groups| Self::lookup(groups, name))
    }

    /// Returns group `name` of the regex at `index`.
    pub fn get_at(&self, index: usize, name: &str) -> Option<&str> {
        self.groups
            .get(index)
            .and_then(|groups| Self::lookup(groups, name))
    }

    /// Number of regexes that have recorded groups.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Iterates `(regex index, group key, text)` for every participating group.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &str, &str)> {
        self.groups.iter().enumerate().flat_map(|(index, groups)| {
            groups.iter().filter_map(move |(key, text)| {
                text.as_deref().map(|text| (index, key.as_str(), text))
            })
        })
    }

    fn lookup<'a>(groups: &'a [(String, Option<String>)], name: &str) -> Option<&'a str> {
        groups
            .iter()
            .find(|(key, _)| key == name)
            .and_then(|(_, text)| text.as_deref())
    }

    fn record(&mut self, regex: &RulePattern, caps: &fancy_regex::Captures<'_>) {
        let groups = regex
            .capture_names()
            .enumerate()
            .map(|(number, name)| {
                let key = name.map_or_else(|| number.to_string(), str::to_string);
                (key, caps.get(number).map(|m| m.as_str().to_string()))
            })
            .collect();
        self.groups.push(groups);
    }

    /// Replaces `{index:name}` references with recorded group text.
    ///
    /// References to unknown groups are left as written.
    pub fn interpolate(&self, message: &str) -> String {
        REFERENCE_RE
            .replace_all(message, |caps: &regex::Captures<'_>| {
                caps[1]
                    .parse::<usize>()
                    .ok()
                    .and_then(|index| self.get_at(index, &caps[2]))
                    .map_or_else(|| caps[0].to_string(), str::to_string)
            })
            .into_owned()
    }
}

#[derive(Debug, Clone)]
pub(crate) struct RegexRule {
    pub(crate) regex: RulePattern,
    pub(crate) message: String,
    pub(crate) snip: bool,
}

/// Converts strings, checking length (in code points) and regexes.
///
/// Regexes run in declaration order and stop at the first failure. A regex
/// marked `snip` hides the text it matched from the regexes after it: the
/// cut falls at the end of the whole match. Lookahead such as `(?=[0-9]|$)`
/// checks what follows without consuming it.
#[derive(Debug, Clone, Default)]
pub struct StringConverter {
    pub(crate) min_length: Option<usize>,
    pub(crate) max_length: Option<usize>,
    pub(crate) rules: Vec<RegexRule>,
}

impl StringConverter {
    fn validate(&self, value: &str) -> Result<Captures, String> {
        let length = value.chars().count();
        if let Some(min) = self.min_length {
            if length < min {
                return Err(format!("it must be at least {min} characters long"));
            }
        }
        if let Some(max) = self.max_length {
            if length > max {
                return Err(format!("it must be no more than {max} characters long"));
            }
        }

        let mut captures = Captures::default();
        let mut rest = value;
        for rule in &self.rules {
            // A match that exceeds the backtracking limit counts as a failure.
            let Ok(Some(caps)) = rule.regex.captures(rest) else {
                return Err(captures.interpolate(&rule.message));
            };
            captures.record(&rule.regex, &caps);
            if rule.snip {
                let end = caps.get(0).map_or(0, |m| m.end());
                rest = &rest[end..];
            }
        }
        Ok(captures)
    }
}

impl Converter for StringConverter {
    type Value = String;

    fn parse(&self, raw: &str) -> Result<String, ConversionError> {
        Ok(raw.to_string())
    }

    fn violates_constraints(&self, value: &String) -> Option<String> {
        self.validate(value).err()
    }

    fn captures_for(&self, value: &String) -> Option<Captures> {
        self.validate(value).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(pattern: &str, message: &str, snip: bool) -> RegexRule {
        RegexRule {
            regex: RulePattern::new(pattern).unwrap(),
            message: message.to_string(),
            snip,
        }
    }

    fn interface_converter() -> StringConverter {
        StringConverter {
            rules: vec![
                rule(
                    r"^(?P<TYPE>eth|agg)(?=[0-9]|$)",
                    "must begin with eth or agg",
                    true,
                ),
                rule(
                    r"^(?P<NUMBER>[0-9]{1,3})$",
                    "{0:TYPE} must be followed by 1 to 3 digits",
                    false,
                ),
            ],
            ..Default::default()
        }
    }

    #[test]
    fn test_snip_regex_accepts_and_captures() {
        let converter = interface_converter();
        let captures = converter.validate("eth2").unwrap();
        assert_eq!(captures.get("TYPE"), Some("eth"));
        assert_eq!(captures.get("NUMBER"), Some("2"));
        assert_eq!(captures.get_at(1, "NUMBER"), Some("2"));
        assert_eq!(captures.get_at(0, "NUMBER"), None);
    }

    #[test]
    fn test_first_regex_failure_short_circuits() {
        let converter = interface_converter();
        assert_eq!(
            converter.validate("ether").unwrap_err(),
            "must begin with eth or agg"
        );
    }

    #[test]
    fn test_second_regex_failure_interpolates_earlier_capture() {
        let converter = interface_converter();
        assert_eq!(
            converter.validate("eth").unwrap_err(),
            "eth must be followed by 1 to 3 digits"
        );
        assert_eq!(
            converter.validate("agg1234").unwrap_err(),
            "agg must be followed by 1 to 3 digits"
        );
    }

    #[test]
    fn test_snip_cuts_at_end_of_whole_match() {
        let converter = StringConverter {
            rules: vec![
                rule(r"^(?P<TYPE>eth|agg)-", "must begin with eth- or agg-", true),
                rule(r"^(?P<NUMBER>[0-9]{1,3})$", "{0:TYPE} needs a number", false),
            ],
            ..Default::default()
        };
        let captures = converter.validate("eth-2").unwrap();
        assert_eq!(captures.get("TYPE"), Some("eth"));
        assert_eq!(captures.get("NUMBER"), Some("2"));
        assert_eq!(converter.validate("eth-").unwrap_err(), "eth needs a number");
        assert_eq!(
            converter.validate("eth2").unwrap_err(),
            "must begin with eth- or agg-"
        );
    }

    #[test]
    fn test_lookahead_is_not_snipped() {
        let converter = StringConverter {
            rules: vec![
                rule(r"^[a-z]+(?=[0-9])", "letters first", true),
                rule(r"^[0-9]+$", "digits after", false),
            ],
            ..Default::default()
        };
        assert!(converter.validate("abc123").is_ok());
        assert_eq!(converter.validate("abc").unwrap_err(), "letters first");
        assert_eq!(converter.validate("abc12x").unwrap_err(), "digits after");
    }

    #[test]
    fn test_length_counts_code_points() {
        let converter = StringConverter {
            min_length: Some(2),
            max_length: Some(3),
            ..Default::default()
        };
        assert!(converter.violates_constraints(&"ab".to_string()).is_none());
        assert!(converter.violates_constraints(&"äöü".to_string()).is_none());
        assert!(converter.violates_constraints(&"ä".to_string()).is_some());
        assert!(converter.violates_constraints(&"äöüß".to_string()).is_some());
    }

    #[test]
    fn test_unnamed_groups_keyed_by_number() {
        let converter = StringConverter {
            rules: vec![rule(r"^([a-z]+)-([0-9]+)$", "bad", false)],
            ..Default::default()
        };
        let captures = converter.validate("abc-42").unwrap();
        assert_eq!(captures.get("0"), Some("abc-42"));
        assert_eq!(captures.get("1"), Some("abc"));
        assert_eq!(captures.get("2"), Some("42"));
        assert_eq!(captures.iter().count(), 3);
    }

    #[test]
    fn test_interpolate_leaves_unknown_references() {
        let captures = Captures::default();
        assert_eq!(captures.interpolate("see {3:X} here"), "see {3:X} here");
    }
}
