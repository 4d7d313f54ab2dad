//! Registration facade.
//!
//! A [`Handler`] owns every declared argument and its receiver. Each kind has
//! a constructor returning a [`Declaration`] builder; `register` validates
//! the declaration and returns a typed [`ArgHandle`] used to read the value
//! back after a successful parse.
//!
//! # Example
//!
//! ```
//! use farg_core::{Handler, Indicator};
//!
//! let mut handler = Handler::new();
//! let alpha = handler.integer::<i64>("alpha").default_value(5).register().unwrap();
//! let bravo = handler.integer::<i64>("bravo").register().unwrap();
//! let charlie = handler
//!     .integer::<i64>("charlie")
//!     .short('c')
//!     .mandatory()
//!     .register()
//!     .unwrap();
//! let delta = handler.counter::<u32>("delta").register().unwrap();
//!
//! handler.parse(["prog", "--al", "23", "-c", "17"]).unwrap();
//! assert_eq!(*handler.value(&alpha), 23);
//! assert_eq!(*handler.value(&charlie), 17);
//! assert_eq!(handler.indicator(&bravo), Indicator::NotSeen);
//! assert_eq!(*handler.value(&delta), 0);
//! ```

use std::collections::HashSet;
use std::fmt::{self, Display};
use std::marker::PhantomData;

use tracing::debug;

use crate::argument::{Argument, CounterArg, FileArg, FlagArg, Formal, Indicator, ValueArg};
use crate::config::ParserConfig;
use crate::convert::{
    Captures, ChoiceConverter, Converter, FileHandle, Float, FloatConverter, Integer,
    IntegerConverter, OpenMode, RegexRule, RulePattern, StringConverter, ValueRange,
};
use crate::error::{ParseError, RegistrationError};
use crate::group::ArgumentGroup;
use crate::parser::Parser;

/// Untyped identity of a registered argument, used to declare groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ArgId(usize);

/// Typed handle to a registered argument's receiver.
pub struct ArgHandle<T> {
    index: usize,
    marker: PhantomData<fn() -> T>,
}

impl<T> ArgHandle<T> {
    fn new(index: usize) -> Self {
        Self {
            index,
            marker: PhantomData,
        }
    }

    pub fn id(&self) -> ArgId {
        ArgId(self.index)
    }
}

impl<T> Clone for ArgHandle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ArgHandle<T> {}

impl<T> fmt::Debug for ArgHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ArgHandle").field(&self.index).finish()
    }
}

impl<T> From<ArgHandle<T>> for ArgId {
    fn from(handle: ArgHandle<T>) -> Self {
        handle.id()
    }
}

/// Builder state for one argument kind.
pub trait Kind {
    /// The receiver type.
    type Value: 'static;

    /// `false` for booleans and incrementals.
    fn takes_value(&self) -> bool;

    fn has_special_default(&self) -> bool;

    fn build(self, formal: Formal) -> Result<Box<dyn Argument>, RegistrationError>;
}

/// Boolean switch.
#[derive(Debug, Clone, Default)]
pub struct Flag {
    default: bool,
}

impl Kind for Flag {
    type Value = bool;

    fn takes_value(&self) -> bool {
        false
    }

    fn has_special_default(&self) -> bool {
        false
    }

    fn build(self, formal: Formal) -> Result<Box<dyn Argument>, RegistrationError> {
        Ok(Box::new(FlagArg {
            formal,
            default: self.default,
            value: self.default,
        }))
    }
}

/// Incremental counter.
#[derive(Debug, Clone, Default)]
pub struct Counter<T> {
    default: T,
}

impl<T: Integer> Kind for Counter<T> {
    type Value = T;

    fn takes_value(&self) -> bool {
        false
    }

    fn has_special_default(&self) -> bool {
        false
    }

    fn build(self, formal: Formal) -> Result<Box<dyn Argument>, RegistrationError> {
        Ok(Box::new(CounterArg {
            formal,
            default: self.default,
            value: self.default,
        }))
    }
}

/// Any argument converted by a [`Converter`].
pub struct Valued<C: Converter> {
    converter: C,
    default: Option<C::Value>,
    end_of_line_default: Option<C::Value>,
    equals_default: Option<C::Value>,
}

impl<C: Converter> Valued<C> {
    fn new(converter: C, default: Option<C::Value>) -> Self {
        Self {
            converter,
            default,
            end_of_line_default: None,
            equals_default: None,
        }
    }
}

impl<C: Converter + 'static> Kind for Valued<C> {
    type Value = C::Value;

    fn takes_value(&self) -> bool {
        true
    }

    fn has_special_default(&self) -> bool {
        self.end_of_line_default.is_some() || self.equals_default.is_some()
    }

    fn build(self, formal: Formal) -> Result<Box<dyn Argument>, RegistrationError> {
        // Only choices can lack a default, when they have no members.
        let default = self
            .default
            .ok_or_else(|| RegistrationError::EmptyChoice(formal.canonical().to_string()))?;
        let mut arg = ValueArg::new(formal, self.converter, default);
        arg.end_of_line_default = self.end_of_line_default;
        arg.equals_default = self.equals_default;
        Ok(Box::new(arg))
    }
}

/// File-like argument.
#[derive(Debug, Clone)]
pub struct FileKind {
    mode: OpenMode,
    default_path: Option<String>,
    end_of_line_default: Option<String>,
    equals_default: Option<String>,
    soft_errors: bool,
}

impl Kind for FileKind {
    type Value = FileHandle;

    fn takes_value(&self) -> bool {
        true
    }

    fn has_special_default(&self) -> bool {
        self.end_of_line_default.is_some() || self.equals_default.is_some()
    }

    fn build(self, formal: Formal) -> Result<Box<dyn Argument>, RegistrationError> {
        let mut arg = FileArg::new(formal, self.mode);
        arg.default_path = self.default_path;
        arg.end_of_line_default = self.end_of_line_default;
        arg.equals_default = self.equals_default;
        arg.soft_errors = self.soft_errors;
        Ok(Box::new(arg))
    }
}

/// Chained configuration of one argument, finished by [`register`].
///
/// [`register`]: Declaration::register
#[must_use = "a declaration does nothing until it is registered"]
pub struct Declaration<'h, K> {
    handler: &'h mut Handler,
    formal: Formal,
    kind: K,
}

impl<'h, K: Kind> Declaration<'h, K> {
    fn new(handler: &'h mut Handler, name: &str, kind: K) -> Self {
        Self {
            handler,
            formal: Formal::new(name),
            kind,
        }
    }

    /// Single-character name, used as `-x`.
    pub fn short(mut self, short: char) -> Self {
        self.formal.short = Some(short);
        self
    }

    /// Additional long name.
    pub fn alias(mut self, name: &str) -> Self {
        self.formal.names.push(name.to_string());
        self
    }

    /// Human description, used in messages and the syntax summary.
    pub fn description(mut self, text: &str) -> Self {
        self.formal.description = Some(text.to_string());
        self
    }

    pub fn mandatory(mut self) -> Self {
        self.formal.mandatory = true;
        self
    }

    /// Match by position among non-option tokens instead of by name.
    pub fn positional(mut self) -> Self {
        self.formal.positional = true;
        self
    }

    /// Leave the argument out of the syntax summary.
    pub fn undocumented(mut self) -> Self {
        self.formal.documented = false;
        self
    }

    /// Validates the declaration and adds it to the handler.
    ///
    /// # Errors
    ///
    /// Returns a [`RegistrationError`] for bad or duplicate names, positional
    /// shape violations, or a mandatory positional after an optional one.
    pub fn register(self) -> Result<ArgHandle<K::Value>, RegistrationError> {
        let Self {
            handler,
            formal,
            kind,
        } = self;
        handler.validate(&formal, &kind)?;

        let name = formal.canonical().to_string();
        let arg = kind.build(formal)?;
        let index = handler.args.len();
        handler.args.push(arg);
        debug!(argument = %name, index, "Registered argument");
        Ok(ArgHandle::new(index))
    }

    fn conflicting_defaults(&self) -> RegistrationError {
        RegistrationError::ConflictingDefaults(self.formal.canonical().to_string())
    }

    fn invalid_range(&self, detail: String) -> RegistrationError {
        RegistrationError::InvalidRange {
            name: self.formal.canonical().to_string(),
            detail,
        }
    }
}

impl Declaration<'_, Flag> {
    /// Declared default; bare presence sets the opposite.
    pub fn default_value(mut self, value: bool) -> Self {
        self.kind.default = value;
        self
    }
}

impl<T: Integer> Declaration<'_, Counter<T>> {
    pub fn default_value(mut self, value: T) -> Self {
        self.kind.default = value;
        self
    }
}

impl<C: Converter + 'static> Declaration<'_, Valued<C>> {
    pub fn default_value(mut self, value: C::Value) -> Self {
        self.kind.default = Some(value);
        self
    }

    /// Value used when the option is the last token and has no value.
    ///
    /// # Errors
    ///
    /// Returns [`RegistrationError::ConflictingDefaults`] if an equals
    /// default is already set.
    pub fn end_of_line_default(mut self, value: C::Value) -> Result<Self, RegistrationError> {
        if self.kind.equals_default.is_some() {
            return Err(self.conflicting_defaults());
        }
        self.kind.end_of_line_default = Some(value);
        Ok(self)
    }

    /// Value used whenever the option appears without `=value`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistrationError::ConflictingDefaults`] if an end-of-line
    /// default is already set.
    pub fn equals_default(mut self, value: C::Value) -> Result<Self, RegistrationError> {
        if self.kind.end_of_line_default.is_some() {
            return Err(self.conflicting_defaults());
        }
        self.kind.equals_default = Some(value);
        Ok(self)
    }
}

impl<T: Integer> Declaration<'_, Valued<IntegerConverter<T>>> {
    /// Radix for unprefixed values; `0n` then forces decimal.
    ///
    /// # Errors
    ///
    /// Returns [`RegistrationError::InvalidRadix`] outside 2..=36.
    pub fn radix(mut self, radix: u32) -> Result<Self, RegistrationError> {
        if !(2..=36).contains(&radix) {
            return Err(RegistrationError::InvalidRadix(radix));
        }
        self.kind.converter.radix = radix;
        Ok(self)
    }

    /// Adds `[min, max]` to the acceptable ranges.
    ///
    /// # Errors
    ///
    /// Returns [`RegistrationError::InvalidRange`] if `min > max`.
    pub fn range(mut self, min: T, max: T) -> Result<Self, RegistrationError> {
        let range = ValueRange::new(min, max)
            .ok_or_else(|| self.invalid_range(format!("{min} is greater than {max}")))?;
        self.kind.converter.ranges.insert(range);
        Ok(self)
    }

    /// Adds one acceptable value.
    pub fn allow(self, value: T) -> Result<Self, RegistrationError> {
        self.range(value, value)
    }
}

impl<T: Float> Declaration<'_, Valued<FloatConverter<T>>> {
    /// Adds `[min, max]` to the acceptable ranges.
    ///
    /// # Errors
    ///
    /// Returns [`RegistrationError::InvalidRange`] if `min > max` or either
    /// bound is NaN.
    pub fn range(mut self, min: T, max: T) -> Result<Self, RegistrationError> {
        let range = ValueRange::new(min, max).ok_or_else(|| {
            self.invalid_range(format!("{min} to {max} is not an ordered range"))
        })?;
        self.kind.converter.ranges.insert(range);
        Ok(self)
    }

    pub fn allow(self, value: T) -> Result<Self, RegistrationError> {
        self.range(value, value)
    }
}

impl Declaration<'_, Valued<StringConverter>> {
    /// Minimum length in code points.
    pub fn min_length(mut self, min: usize) -> Result<Self, RegistrationError> {
        if self.kind.converter.max_length.is_some_and(|max| min > max) {
            return Err(RegistrationError::InvalidLength(self.formal.canonical().to_string()));
        }
        self.kind.converter.min_length = Some(min);
        Ok(self)
    }

    /// Maximum length in code points.
    pub fn max_length(mut self, max: usize) -> Result<Self, RegistrationError> {
        if self.kind.converter.min_length.is_some_and(|min| min > max) {
            return Err(RegistrationError::InvalidLength(self.formal.canonical().to_string()));
        }
        self.kind.converter.max_length = Some(max);
        Ok(self)
    }

    /// Appends a regex the value must match, failing with `message`.
    ///
    /// `message` may reference groups of earlier regexes as `{index:name}`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistrationError::InvalidRegex`] if `pattern` does not
    /// compile.
    pub fn regex(self, pattern: &str, message: &str) -> Result<Self, RegistrationError> {
        self.push_rule(pattern, message, false)
    }

    /// Like [`regex`](Self::regex), but later regexes only see the text after
    /// this one's whole match. Use lookahead (`(?=...)`) to test text without
    /// consuming it.
    pub fn snip_regex(self, pattern: &str, message: &str) -> Result<Self, RegistrationError> {
        self.push_rule(pattern, message, true)
    }

    fn push_rule(
        mut self,
        pattern: &str,
        message: &str,
        snip: bool,
    ) -> Result<Self, RegistrationError> {
        let regex = RulePattern::new(pattern).map_err(|e| RegistrationError::InvalidRegex {
            pattern: pattern.to_string(),
            detail: e.to_string(),
        })?;
        self.kind.converter.rules.push(RegexRule {
            regex,
            message: message.to_string(),
            snip,
        });
        Ok(self)
    }
}

impl Declaration<'_, FileKind> {
    /// Path opened when the argument is not supplied.
    pub fn default_path(mut self, path: &str) -> Self {
        self.kind.default_path = Some(path.to_string());
        self
    }

    /// Path used when the option is the last token and has no value.
    pub fn end_of_line_default(mut self, path: &str) -> Result<Self, RegistrationError> {
        if self.kind.equals_default.is_some() {
            return Err(self.conflicting_defaults());
        }
        self.kind.end_of_line_default = Some(path.to_string());
        Ok(self)
    }

    /// Path used whenever the option appears without `=path`.
    pub fn equals_default(mut self, path: &str) -> Result<Self, RegistrationError> {
        if self.kind.end_of_line_default.is_some() {
            return Err(self.conflicting_defaults());
        }
        self.kind.equals_default = Some(path.to_string());
        Ok(self)
    }

    /// Capture open failures instead of failing the parse; read them with
    /// [`Handler::open_error`].
    pub fn soft_errors(mut self) -> Self {
        self.kind.soft_errors = true;
        self
    }
}

/// Owns the declared arguments and groups and runs parses.
///
/// A handler can parse any number of times in sequence; each parse starts by
/// resetting every argument to its default.
#[derive(Default)]
pub struct Handler {
    args: Vec<Box<dyn Argument>>,
    groups: Vec<ArgumentGroup>,
    config: ParserConfig,
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.args.iter().map(|a| a.formal().canonical()).collect();
        f.debug_struct("Handler")
            .field("args", &names)
            .field("groups", &self.groups.len())
            .field("config", &self.config)
            .finish()
    }
}

impl Handler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ParserConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut ParserConfig {
        &mut self.config
    }

    /// Declares a boolean switch (default `false`).
    pub fn flag(&mut self, name: &str) -> Declaration<'_, Flag> {
        Declaration::new(self, name, Flag::default())
    }

    /// Declares an incremental counter (default zero).
    pub fn counter<T: Integer>(&mut self, name: &str) -> Declaration<'_, Counter<T>> {
        Declaration::new(self, name, Counter { default: T::default() })
    }

    pub fn integer<T: Integer>(
        &mut self,
        name: &str,
    ) -> Declaration<'_, Valued<IntegerConverter<T>>> {
        Declaration::new(
            self,
            name,
            Valued::new(IntegerConverter::default(), Some(T::default())),
        )
    }

    pub fn float<T: Float>(&mut self, name: &str) -> Declaration<'_, Valued<FloatConverter<T>>> {
        Declaration::new(
            self,
            name,
            Valued::new(FloatConverter::default(), Some(T::default())),
        )
    }

    pub fn string(&mut self, name: &str) -> Declaration<'_, Valued<StringConverter>> {
        Declaration::new(
            self,
            name,
            Valued::new(StringConverter::default(), Some(String::new())),
        )
    }

    /// Declares an enumeration over `members`, matched by their `Display`
    /// text. The first member is the default.
    pub fn choice<T: Clone + Display + 'static>(
        &mut self,
        name: &str,
        members: impl IntoIterator<Item = T>,
    ) -> Declaration<'_, Valued<ChoiceConverter<T>>> {
        let converter = ChoiceConverter::new(members);
        let default = converter.first().cloned();
        Declaration::new(self, name, Valued::new(converter, default))
    }

    /// Declares an argument converted by a caller-supplied [`Converter`].
    ///
    /// # Examples
    ///
    /// ```
    /// use farg_core::{ConversionError, Converter, Handler};
    ///
    /// struct Percent;
    ///
    /// impl Converter for Percent {
    ///     type Value = u8;
    ///
    ///     fn parse(&self, raw: &str) -> Result<u8, ConversionError> {
    ///         raw.strip_suffix('%')
    ///             .and_then(|digits| digits.parse().ok())
    ///             .ok_or_else(|| ConversionError::new(raw, "a percentage such as 40%"))
    ///     }
    ///
    ///     fn violates_constraints(&self, value: &u8) -> Option<String> {
    ///         (*value > 100).then(|| "it must not exceed 100%".to_string())
    ///     }
    /// }
    ///
    /// let mut handler = Handler::new();
    /// let load = handler.custom("load", Percent, 0).register().unwrap();
    ///
    /// handler.parse(["prog", "--load", "40%"]).unwrap();
    /// assert_eq!(*handler.value(&load), 40);
    /// assert!(handler.parse(["prog", "--load", "140%"]).is_err());
    /// ```
    pub fn custom<C: Converter + 'static>(
        &mut self,
        name: &str,
        converter: C,
        default: C::Value,
    ) -> Declaration<'_, Valued<C>> {
        Declaration::new(self, name, Valued::new(converter, Some(default)))
    }

    pub fn file(&mut self, name: &str, mode: OpenMode) -> Declaration<'_, FileKind> {
        let kind = FileKind {
            mode,
            default_path: None,
            end_of_line_default: None,
            equals_default: None,
            soft_errors: false,
        };
        Declaration::new(self, name, kind)
    }

    /// Requires exactly `count` of `members` to be given.
    pub fn exactly(&mut self, count: usize, members: &[ArgId]) -> Result<(), RegistrationError> {
        self.between(count, count, members)
    }

    /// Allows at most `max` of `members` to be given.
    pub fn at_most(&mut self, max: usize, members: &[ArgId]) -> Result<(), RegistrationError> {
        self.between(0, max, members)
    }

    /// Requires between `min` and `max` of `members` to be given.
    ///
    /// # Errors
    ///
    /// Rejects fewer than two members, `max == 0`, `min > max`, bounds that
    /// can never fail, and mandatory members.
    pub fn between(
        &mut self,
        min: usize,
        max: usize,
        members: &[ArgId],
    ) -> Result<(), RegistrationError> {
        let members = self.resolve(members)?;
        self.add_group(ArgumentGroup::count(members, min, max)?)
    }

    /// Requires `head` whenever any of `tails` is given.
    pub fn implies(&mut self, head: ArgId, tails: &[ArgId]) -> Result<(), RegistrationError> {
        let head = self.resolve(&[head])?[0];
        let tails = self.resolve(tails)?;
        self.add_group(ArgumentGroup::implies(head, tails)?)
    }

    /// Requires every member or none of them.
    pub fn all_or_none(&mut self, members: &[ArgId]) -> Result<(), RegistrationError> {
        let members = self.resolve(members)?;
        self.add_group(ArgumentGroup::all_or_none(members)?)
    }

    /// Parses a full argument vector; the first element (the program name)
    /// is discarded.
    ///
    /// Returns the leftover tokens when the configuration passes them back,
    /// otherwise an empty vector.
    ///
    /// # Errors
    ///
    /// Returns the first [`ParseError`] encountered. Receivers are then in
    /// an unspecified state.
    pub fn parse<I, S>(&mut self, argv: I) -> Result<Vec<String>, ParseError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.parse_tokens(argv.into_iter().skip(1))
    }

    /// Parses tokens that do not include a program name.
    pub fn parse_tokens<I, S>(&mut self, tokens: I) -> Result<Vec<String>, ParseError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tokens: Vec<String> = tokens.into_iter().map(Into::into).collect();
        debug!(tokens = tokens.len(), arguments = self.args.len(), "Parsing command line");
        Parser::new(&mut self.args, &self.groups, &self.config, tokens).run()
    }

    /// Parses the process's own command line.
    pub fn parse_env(&mut self) -> Result<Vec<String>, ParseError> {
        self.parse(std::env::args_os().map(|arg| arg.to_string_lossy().into_owned()))
    }

    /// Returns the value behind `handle`, or `None` if the handle belongs to
    /// another handler.
    pub fn get<T: 'static>(&self, handle: &ArgHandle<T>) -> Option<&T> {
        self.args.get(handle.index)?.value_any().downcast_ref()
    }

    /// Returns the value behind `handle`.
    ///
    /// # Panics
    ///
    /// Panics if the handle was issued by a different handler.
    pub fn value<T: 'static>(&self, handle: &ArgHandle<T>) -> &T {
        match self.get(handle) {
            Some(value) => value,
            None => panic!("{}", RegistrationError::ForeignHandle(handle.index)),
        }
    }

    /// Moves the value out, leaving `T::default()` behind.
    pub fn take<T: Default + 'static>(&mut self, handle: &ArgHandle<T>) -> Option<T> {
        self.args
            .get_mut(handle.index)?
            .value_any_mut()
            .downcast_mut::<T>()
            .map(std::mem::take)
    }

    pub fn indicator<T>(&self, handle: &ArgHandle<T>) -> Indicator {
        self.args
            .get(handle.index)
            .map_or(Indicator::NotSeen, |arg| arg.formal().indicator())
    }

    pub fn was_seen<T>(&self, handle: &ArgHandle<T>) -> bool {
        self.args
            .get(handle.index)
            .is_some_and(|arg| arg.formal().seen())
    }

    /// Regex capture groups recorded for a string argument's value.
    pub fn captures(&self, handle: &ArgHandle<String>) -> Option<&Captures> {
        self.args.get(handle.index)?.captures()
    }

    /// The captured open failure of a soft-error file argument.
    pub fn open_error(&self, handle: &ArgHandle<FileHandle>) -> Option<&str> {
        self.args.get(handle.index)?.open_error()
    }

    pub fn formal(&self, id: ArgId) -> Option<&Formal> {
        self.args.get(id.0).map(|arg| arg.formal())
    }

    /// One-line syntax summary of the documented arguments, in registration
    /// order.
    ///
    /// # Examples
    ///
    /// ```
    /// use farg_core::{Handler, OpenMode};
    ///
    /// let mut handler = Handler::new();
    /// handler.integer::<u16>("port").description("port").mandatory().register().unwrap();
    /// handler.counter::<u8>("verbose").register().unwrap();
    /// handler.flag("dry-run").register().unwrap();
    /// handler.file("input", OpenMode::Read).positional().register().unwrap();
    ///
    /// assert_eq!(handler.syntax(), "--port <port> [--verbose*] [--dry-run] [<input>]");
    /// ```
    pub fn syntax(&self) -> String {
        self.args
            .iter()
            .filter(|arg| arg.formal().documented)
            .map(|arg| {
                let formal = arg.formal();
                let name = formal.canonical();
                let entry = if formal.positional {
                    format!("<{name}>")
                } else if arg.is_incremental() {
                    format!("--{name}*")
                } else if arg.needs_value() {
                    format!("--{name} <{}>", formal.description.as_deref().unwrap_or(name))
                } else {
                    format!("--{name}")
                };
                if formal.mandatory {
                    entry
                } else {
                    format!("[{entry}]")
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// `usage: <program> <syntax>`.
    pub fn usage(&self, program: &str) -> String {
        format!("usage: {program} {}", self.syntax())
            .trim_end()
            .to_string()
    }

    fn validate<K: Kind>(&self, formal: &Formal, kind: &K) -> Result<(), RegistrationError> {
        for name in &formal.names {
            let bad_named = !formal.positional
                && (name.contains('=') || name.starts_with('-'));
            if name.is_empty() || name.chars().any(char::is_whitespace) || bad_named {
                return Err(RegistrationError::InvalidName(name.clone()));
            }
        }

        let mut own = HashSet::new();
        for name in &formal.names {
            let taken = self.args.iter().any(|arg| arg.formal().names.contains(name));
            if taken || !own.insert(name.as_str()) {
                return Err(RegistrationError::DuplicateName(name.clone()));
            }
        }

        if let Some(short) = formal.short {
            if short.is_whitespace() || short == '-' || short == '=' {
                return Err(RegistrationError::InvalidShortName(short));
            }
            if self.args.iter().any(|arg| arg.formal().short == Some(short)) {
                return Err(RegistrationError::DuplicateShortName(short));
            }
        }

        if formal.positional {
            let name = formal.canonical().to_string();
            let shape = |problem| RegistrationError::PositionalShape {
                name: name.clone(),
                problem,
            };
            if formal.names.len() != 1 {
                return Err(shape("must have exactly one name"));
            }
            if formal.short.is_some() {
                return Err(shape("cannot have a short name"));
            }
            if formal.description.is_some() {
                return Err(shape("cannot have a description"));
            }
            if !kind.takes_value() {
                return Err(shape("must take a value"));
            }
            if kind.has_special_default() {
                return Err(shape("cannot have an end-of-line or equals default"));
            }
            let after_optional = self
                .args
                .iter()
                .any(|arg| arg.formal().positional && !arg.formal().mandatory);
            if formal.mandatory && after_optional {
                return Err(RegistrationError::MandatoryAfterOptional(name));
            }
        }
        Ok(())
    }

    fn resolve(&self, ids: &[ArgId]) -> Result<Vec<usize>, RegistrationError> {
        let mut seen = HashSet::new();
        let mut indices = Vec::with_capacity(ids.len());
        for &ArgId(index) in ids {
            if index >= self.args.len() {
                return Err(RegistrationError::ForeignHandle(index));
            }
            if !seen.insert(index) {
                return Err(RegistrationError::InvalidGroup(format!(
                    "'{}' is listed more than once",
                    self.args[index].formal().canonical()
                )));
            }
            indices.push(index);
        }
        Ok(indices)
    }

    fn add_group(&mut self, group: ArgumentGroup) -> Result<(), RegistrationError> {
        for index in group.members() {
            let formal = self.args[index].formal();
            if formal.mandatory {
                return Err(RegistrationError::MandatoryGroupMember(
                    formal.canonical().to_string(),
                ));
            }
        }
        self.groups.push(group);
        Ok(())
    }
}
