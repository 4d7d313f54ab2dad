//! Formal argument model.
//!
//! A formal argument is one declared input: its names, its flags, and a
//! typed receiver. Every kind implements [`Argument`]; the parser drives it
//! through `set_to_default`, one of the `commit*` calls per occurrence, and a
//! final `post_process`.

use std::any::Any;

use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

use crate::convert::{
    Captures, ConversionError, Converter, FileHandle, Integer, OpenMode, join_with, parse_bool,
};
use crate::error::{ParseError, Result};

/// How (or whether) an argument obtained its value in the last parse.
///
/// # Examples
///
/// ```
/// use farg_core::{Handler, Indicator};
///
/// let mut handler = Handler::new();
/// let level = handler
///     .integer::<u8>("level")
///     .end_of_line_default(3)
///     .unwrap()
///     .register()
///     .unwrap();
///
/// handler.parse(["prog", "--level"]).unwrap();
/// assert_eq!(*handler.value(&level), 3);
/// assert_eq!(handler.indicator(&level), Indicator::UsedEndOfLineDefault);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Indicator {
    #[default]
    NotSeen,
    UsedEndOfLineDefault,
    UsedEqualsDefault,
    Seen,
}

/// How the token being committed named its argument.
///
/// Only changes the phrasing of error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Invocation {
    ByLongName,
    ByShortName,
    ByPosition,
}

/// Declaration metadata shared by every argument kind.
#[derive(Debug, Clone, Default)]
pub struct Formal {
    /// Long names; the first is canonical. Positional arguments have one.
    pub names: Vec<String>,
    pub short: Option<char>,
    pub description: Option<String>,
    pub positional: bool,
    pub mandatory: bool,
    pub documented: bool,
    pub(crate) seen: bool,
    pub(crate) indicator: Indicator,
}

impl Formal {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            names: vec![name.to_string()],
            documented: true,
            ..Default::default()
        }
    }

    pub fn canonical(&self) -> &str {
        self.names.first().map_or("", String::as_str)
    }

    pub fn seen(&self) -> bool {
        self.seen
    }

    pub fn indicator(&self) -> Indicator {
        self.indicator
    }

    /// Names the argument for messages.
    ///
    /// Uses the description when one was given, otherwise
    /// "the --foo option (also known as --bar and --baz)" for named
    /// arguments and "the foo" for positional ones.
    pub fn describe(&self) -> String {
        if let Some(description) = &self.description {
            return description.clone();
        }
        if self.positional {
            return format!("the {}", self.canonical());
        }

        let mut text = format!("the --{} option", self.canonical());
        let aliases: Vec<String> = self.names.iter().skip(1).map(|n| format!("--{n}")).collect();
        if !aliases.is_empty() {
            text.push_str(&format!(" (also known as {})", join_with(&aliases, "and")));
        }
        text
    }

    pub(crate) fn reset(&mut self) {
        self.seen = false;
        self.indicator = Indicator::NotSeen;
    }

    pub(crate) fn record(&mut self, indicator: Indicator) {
        self.seen = true;
        self.indicator = indicator;
    }

    fn reject_text(&self, how: Invocation, text: &str) -> String {
        let target = self.describe();
        match (how, self.short) {
            (Invocation::ByPosition, _) => format!("'{text}' is not valid as {target}"),
            (Invocation::ByShortName, Some(short)) => {
                format!("the value '{text}' given via -{short} for {target} is not valid")
            }
            _ => format!("the value '{text}' given for {target} is not valid"),
        }
    }

    /// Renders a conversion failure for this argument.
    pub(crate) fn conversion_error(&self, how: Invocation, err: ConversionError) -> ParseError {
        ParseError::Conversion(format!("{}: {}", self.reject_text(how, &err.text), err.reason))
    }

    /// Renders a constraint violation for this argument.
    pub(crate) fn constraint_error(&self, how: Invocation, raw: &str, message: &str) -> ParseError {
        ParseError::Constraint(format!("{}: {message}", self.reject_text(how, raw)))
    }

    pub(crate) fn unexpected_value(&self) -> ParseError {
        ParseError::UnexpectedValue(format!("{} does not take a value", self.describe()))
    }
}

/// Capability interface shared by every argument kind.
pub trait Argument {
    fn formal(&self) -> &Formal;
    fn formal_mut(&mut self) -> &mut Formal;

    /// `false` only for booleans and incrementals.
    fn needs_value(&self) -> bool {
        true
    }

    fn is_incremental(&self) -> bool {
        false
    }

    fn has_end_of_line_default(&self) -> bool {
        false
    }

    fn has_equals_default(&self) -> bool {
        false
    }

    /// Resets the receiver to its declared default and the indicator to
    /// `NotSeen`. Calling it twice in a row is the same as calling it once.
    fn set_to_default(&mut self);

    /// Converts, validates, and stores a raw value.
    fn commit(&mut self, raw: &str, how: Invocation) -> Result<()>;

    /// Records a bare occurrence of a no-value argument.
    fn commit_flag_presence(&mut self) -> Result<()> {
        Err(ParseError::MissingValue(format!(
            "{} needs a value",
            self.formal().describe()
        )))
    }

    fn commit_end_of_line_default(&mut self) -> Result<()> {
        Err(ParseError::MissingValue(format!(
            "{} needs a value",
            self.formal().describe()
        )))
    }

    fn commit_equals_default(&mut self) -> Result<()> {
        Err(ParseError::MissingValue(format!(
            "{} needs a value",
            self.formal().describe()
        )))
    }

    /// Runs once after every token has been consumed.
    fn post_process(&mut self) -> Result<()> {
        Ok(())
    }

    fn value_any(&self) -> &dyn Any;
    fn value_any_mut(&mut self) -> &mut dyn Any;

    fn captures(&self) -> Option<&Captures> {
        None
    }

    fn open_error(&self) -> Option<&str> {
        None
    }
}

/// An argument whose value comes from a [`Converter`].
pub(crate) struct ValueArg<C: Converter> {
    pub(crate) formal: Formal,
    pub(crate) converter: C,
    pub(crate) default: C::Value,
    pub(crate) end_of_line_default: Option<C::Value>,
    pub(crate) equals_default: Option<C::Value>,
    pub(crate) value: C::Value,
    pub(crate) captures: Option<Captures>,
}

impl<C: Converter> ValueArg<C> {
    pub(crate) fn new(formal: Formal, converter: C, default: C::Value) -> Self {
        Self {
            formal,
            converter,
            value: default.clone(),
            default,
            end_of_line_default: None,
            equals_default: None,
            captures: None,
        }
    }

    fn store(&mut self, value: C::Value, indicator: Indicator) {
        self.captures = self.converter.captures_for(&value);
        self.value = value;
        self.formal.record(indicator);
    }
}

impl<C: Converter> Argument for ValueArg<C> {
    fn formal(&self) -> &Formal {
        &self.formal
    }

    fn formal_mut(&mut self) -> &mut Formal {
        &mut self.formal
    }

    fn has_end_of_line_default(&self) -> bool {
        self.end_of_line_default.is_some()
    }

    fn has_equals_default(&self) -> bool {
        self.equals_default.is_some()
    }

    fn set_to_default(&mut self) {
        trace!(argument = self.formal.canonical(), "Resetting to default");
        self.value = self.default.clone();
        self.captures = None;
        self.formal.reset();
    }

    fn commit(&mut self, raw: &str, how: Invocation) -> Result<()> {
        let value = self
            .converter
            .parse(raw)
            .map_err(|e| self.formal.conversion_error(how, e))?;
        if let Some(message) = self.converter.violates_constraints(&value) {
            return Err(self.formal.constraint_error(how, raw, &message));
        }
        self.store(value, Indicator::Seen);
        Ok(())
    }

    fn commit_end_of_line_default(&mut self) -> Result<()> {
        match self.end_of_line_default.clone() {
            Some(value) => {
                self.store(value, Indicator::UsedEndOfLineDefault);
                Ok(())
            }
            None => Err(ParseError::MissingValue(format!(
                "{} needs a value",
                self.formal.describe()
            ))),
        }
    }

    fn commit_equals_default(&mut self) -> Result<()> {
        match self.equals_default.clone() {
            Some(value) => {
                self.store(value, Indicator::UsedEqualsDefault);
                Ok(())
            }
            None => Err(ParseError::MissingValue(format!(
                "{} needs a value",
                self.formal.describe()
            ))),
        }
    }

    fn value_any(&self) -> &dyn Any {
        &self.value
    }

    fn value_any_mut(&mut self) -> &mut dyn Any {
        &mut self.value
    }

    fn captures(&self) -> Option<&Captures> {
        self.captures.as_ref()
    }
}

/// A boolean switch. Bare presence flips the declared default.
pub(crate) struct FlagArg {
    pub(crate) formal: Formal,
    pub(crate) default: bool,
    pub(crate) value: bool,
}

impl Argument for FlagArg {
    fn formal(&self) -> &Formal {
        &self.formal
    }

    fn formal_mut(&mut self) -> &mut Formal {
        &mut self.formal
    }

    fn needs_value(&self) -> bool {
        false
    }

    fn set_to_default(&mut self) {
        self.value = self.default;
        self.formal.reset();
    }

    fn commit(&mut self, raw: &str, how: Invocation) -> Result<()> {
        self.value = parse_bool(raw).map_err(|e| self.formal.conversion_error(how, e))?;
        self.formal.record(Indicator::Seen);
        Ok(())
    }

    fn commit_flag_presence(&mut self) -> Result<()> {
        self.value = !self.default;
        self.formal.record(Indicator::Seen);
        Ok(())
    }

    fn value_any(&self) -> &dyn Any {
        &self.value
    }

    fn value_any_mut(&mut self) -> &mut dyn Any {
        &mut self.value
    }
}

/// An incremental counter; each occurrence adds one.
pub(crate) struct CounterArg<T> {
    pub(crate) formal: Formal,
    pub(crate) default: T,
    pub(crate) value: T,
}

impl<T: Integer> Argument for CounterArg<T> {
    fn formal(&self) -> &Formal {
        &self.formal
    }

    fn formal_mut(&mut self) -> &mut Formal {
        &mut self.formal
    }

    fn needs_value(&self) -> bool {
        false
    }

    fn is_incremental(&self) -> bool {
        true
    }

    fn set_to_default(&mut self) {
        self.value = self.default;
        self.formal.reset();
    }

    fn commit(&mut self, _raw: &str, _how: Invocation) -> Result<()> {
        Err(self.formal.unexpected_value())
    }

    fn commit_flag_presence(&mut self) -> Result<()> {
        self.value = self.value.increment().ok_or_else(|| {
            ParseError::Constraint(format!(
                "{} was given too many times",
                self.formal.describe()
            ))
        })?;
        self.formal.record(Indicator::Seen);
        Ok(())
    }

    fn value_any(&self) -> &dyn Any {
        &self.value
    }

    fn value_any_mut(&mut self) -> &mut dyn Any {
        &mut self.value
    }
}

/// A file-like argument. Commits only record the path; the open happens in
/// `post_process` so earlier token errors surface first.
pub(crate) struct FileArg {
    pub(crate) formal: Formal,
    pub(crate) mode: OpenMode,
    pub(crate) default_path: Option<String>,
    pub(crate) end_of_line_default: Option<String>,
    pub(crate) equals_default: Option<String>,
    pub(crate) soft_errors: bool,
    pub(crate) path: Option<String>,
    pub(crate) handle: FileHandle,
    pub(crate) open_error: Option<String>,
}

impl FileArg {
    pub(crate) fn new(formal: Formal, mode: OpenMode) -> Self {
        Self {
            formal,
            mode,
            default_path: None,
            end_of_line_default: None,
            equals_default: None,
            soft_errors: false,
            path: None,
            handle: FileHandle::NotOpen,
            open_error: None,
        }
    }

    fn store(&mut self, path: String, indicator: Indicator) {
        self.path = Some(path);
        self.formal.record(indicator);
    }
}

impl Argument for FileArg {
    fn formal(&self) -> &Formal {
        &self.formal
    }

    fn formal_mut(&mut self) -> &mut Formal {
        &mut self.formal
    }

    fn has_end_of_line_default(&self) -> bool {
        self.end_of_line_default.is_some()
    }

    fn has_equals_default(&self) -> bool {
        self.equals_default.is_some()
    }

    fn set_to_default(&mut self) {
        self.path = None;
        self.handle = FileHandle::NotOpen;
        self.open_error = None;
        self.formal.reset();
    }

    fn commit(&mut self, raw: &str, _how: Invocation) -> Result<()> {
        self.store(raw.to_string(), Indicator::Seen);
        Ok(())
    }

    fn commit_end_of_line_default(&mut self) -> Result<()> {
        match self.end_of_line_default.clone() {
            Some(path) => {
                self.store(path, Indicator::UsedEndOfLineDefault);
                Ok(())
            }
            None => Err(ParseError::MissingValue(format!(
                "{} needs a file name",
                self.formal.describe()
            ))),
        }
    }

    fn commit_equals_default(&mut self) -> Result<()> {
        match self.equals_default.clone() {
            Some(path) => {
                self.store(path, Indicator::UsedEqualsDefault);
                Ok(())
            }
            None => Err(ParseError::MissingValue(format!(
                "{} needs a file name",
                self.formal.describe()
            ))),
        }
    }

    fn post_process(&mut self) -> Result<()> {
        let Some(path) = self.path.clone().or_else(|| self.default_path.clone()) else {
            return Ok(());
        };

        match self.mode.open(&path) {
            Ok(handle) => {
                self.handle = handle;
                Ok(())
            }
            Err(e) => {
                let message = format!(
                    "unable to open '{path}' (mode {}) for {}: {e}",
                    self.mode,
                    self.formal.describe()
                );
                if !self.soft_errors {
                    return Err(ParseError::Open(message));
                }
                warn!(argument = self.formal.canonical(), error = %e, "Captured file open failure");
                self.handle = FileHandle::NotOpen;
                self.open_error = Some(message);
                Ok(())
            }
        }
    }

    fn value_any(&self) -> &dyn Any {
        &self.handle
    }

    fn value_any_mut(&mut self) -> &mut dyn Any {
        &mut self.handle
    }

    fn open_error(&self) -> Option<&str> {
        self.open_error.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::IntegerConverter;

    fn named(names: &[&str]) -> Formal {
        Formal {
            names: names.iter().map(|n| n.to_string()).collect(),
            documented: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_describe_variants() {
        assert_eq!(named(&["foo"]).describe(), "the --foo option");
        assert_eq!(
            named(&["foo", "bar", "baz"]).describe(),
            "the --foo option (also known as --bar and --baz)"
        );

        let mut positional = named(&["input"]);
        positional.positional = true;
        assert_eq!(positional.describe(), "the input");

        let mut described = named(&["foo"]);
        described.description = Some("the frobnication level".to_string());
        assert_eq!(described.describe(), "the frobnication level");
    }

    #[test]
    fn test_set_to_default_is_idempotent() {
        let mut arg = ValueArg::new(named(&["alpha"]), IntegerConverter::<i32>::default(), 5);
        arg.commit("9", Invocation::ByLongName).unwrap();
        assert_eq!(arg.value, 9);
        assert_eq!(arg.formal.indicator, Indicator::Seen);

        arg.set_to_default();
        let first = (arg.value, arg.formal.indicator, arg.formal.seen);
        arg.set_to_default();
        let second = (arg.value, arg.formal.indicator, arg.formal.seen);
        assert_eq!(first, (5, Indicator::NotSeen, false));
        assert_eq!(first, second);
    }

    #[test]
    fn test_conversion_error_phrasing_by_invocation() {
        let mut formal = named(&["count"]);
        formal.short = Some('c');
        let mut arg = ValueArg::new(formal, IntegerConverter::<i32>::default(), 0);

        let long = arg.commit("x", Invocation::ByLongName).unwrap_err();
        assert_eq!(
            long.to_string(),
            "the value 'x' given for the --count option is not valid: an integer"
        );
        let short = arg.commit("x", Invocation::ByShortName).unwrap_err();
        assert!(short.to_string().contains("given via -c"));
        assert!(matches!(short, ParseError::Conversion(_)));
        assert!(!arg.formal.seen);
    }

    #[test]
    fn test_flag_presence_flips_default() {
        let mut flag = FlagArg {
            formal: named(&["color"]),
            default: true,
            value: true,
        };
        flag.commit_flag_presence().unwrap();
        assert!(!flag.value);

        flag.set_to_default();
        flag.commit("yes", Invocation::ByLongName).unwrap();
        assert!(flag.value);
        assert!(flag.commit("maybe", Invocation::ByLongName).is_err());
    }

    #[test]
    fn test_counter_increments_and_rejects_values() {
        let mut counter = CounterArg {
            formal: named(&["verbose"]),
            default: 0u8,
            value: 0u8,
        };
        counter.commit_flag_presence().unwrap();
        counter.commit_flag_presence().unwrap();
        assert_eq!(counter.value, 2);
        assert!(matches!(
            counter.commit("3", Invocation::ByLongName),
            Err(ParseError::UnexpectedValue(_))
        ));
    }

    #[test]
    fn test_counter_overflow() {
        let mut counter = CounterArg {
            formal: named(&["verbose"]),
            default: u8::MAX,
            value: u8::MAX,
        };
        assert!(counter.commit_flag_presence().is_err());
    }

    #[test]
    fn test_file_soft_error_leaves_handle_closed() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.txt");

        let mut arg = FileArg::new(named(&["input"]), OpenMode::Read);
        arg.soft_errors = true;
        arg.commit(missing.to_str().unwrap(), Invocation::ByLongName)
            .unwrap();
        arg.post_process().unwrap();
        assert!(!arg.handle.is_open());
        assert!(arg.open_error().unwrap().contains("unable to open"));
    }

    #[test]
    fn test_file_hard_error_propagates() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.txt");

        let mut arg = FileArg::new(named(&["input"]), OpenMode::Read);
        arg.commit(missing.to_str().unwrap(), Invocation::ByLongName)
            .unwrap();
        assert!(matches!(arg.post_process(), Err(ParseError::Open(_))));
    }

    #[test]
    fn test_file_without_path_stays_closed() {
        let mut arg = FileArg::new(named(&["input"]), OpenMode::Read);
        arg.post_process().unwrap();
        assert!(!arg.handle.is_open());
        assert!(arg.open_error().is_none());
    }
}
