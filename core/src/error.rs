//! Error types for argument registration, parsing, and configuration.
//!
//! Parsing has a single failure surface: every [`ParseError`] variant carries
//! a fully rendered, user-facing message and `Display` prints exactly that
//! message. The variants exist so callers and tests can tell categories
//! apart; they add no structured payload beyond the text.

use thiserror::Error;

/// Errors raised while matching and validating a command line.
///
/// After any of these is returned the receivers of the failed parse are in
/// an unspecified state; only a fully successful parse guarantees values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// An option token named no declared argument.
    #[error("{0}")]
    UnknownOption(String),
    /// An abbreviated long name matched more than one argument.
    #[error("{0}")]
    AmbiguousOption(String),
    /// A non-incremental argument was supplied more than once.
    #[error("{0}")]
    Duplicate(String),
    /// An option that needs a value was the last token and has no default.
    #[error("{0}")]
    MissingValue(String),
    /// A value was attached to an option that does not accept one.
    #[error("{0}")]
    UnexpectedValue(String),
    /// A value could not be converted to the argument's type.
    #[error("{0}")]
    Conversion(String),
    /// A converted value failed a range, length, regex, or membership check.
    #[error("{0}")]
    Constraint(String),
    /// A mandatory argument was never supplied.
    #[error("{0}")]
    MissingMandatory(String),
    /// An argument group constraint was not met.
    #[error("{0}")]
    Group(String),
    /// Tokens were left over that no argument accepted.
    #[error("{0}")]
    UnexpectedText(String),
    /// An option appeared after positional data under the `Fail` policy.
    #[error("{0}")]
    OptionAfterData(String),
    /// A bundled short-option token had characters left over.
    #[error("{0}")]
    BundleLeftover(String),
    /// A file argument could not be opened and is not in soft-error mode.
    #[error("{0}")]
    Open(String),
}

/// Errors raised while declaring arguments and groups.
///
/// These describe programming mistakes in the argument declarations rather
/// than bad user input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    /// A long or positional name is empty or contains forbidden characters.
    #[error("invalid argument name '{0}'")]
    InvalidName(String),
    /// A short name is whitespace, `-`, or `=`.
    #[error("invalid short name {0:?}")]
    InvalidShortName(char),
    /// Two arguments share a long or positional name.
    #[error("duplicate argument name '{0}'")]
    DuplicateName(String),
    /// Two arguments share a short name.
    #[error("duplicate short name '-{0}'")]
    DuplicateShortName(char),
    /// A positional argument was given a feature only named arguments have.
    #[error("positional argument '{name}' {problem}")]
    PositionalShape { name: String, problem: &'static str },
    /// A mandatory positional argument follows an optional one.
    #[error("mandatory positional argument '{0}' cannot follow an optional positional argument")]
    MandatoryAfterOptional(String),
    /// Both an end-of-line default and an equals default were requested.
    #[error("argument '{0}' cannot have both an end-of-line default and an equals default")]
    ConflictingDefaults(String),
    /// A numeric range has `min > max` or unordered bounds.
    #[error("invalid range for argument '{name}': {detail}")]
    InvalidRange { name: String, detail: String },
    /// An integer radix outside 2..=36.
    #[error("invalid radix {0}; must be between 2 and 36")]
    InvalidRadix(u32),
    /// A string length bound pair with `min > max`.
    #[error("invalid length bounds for argument '{0}'")]
    InvalidLength(String),
    /// A validation regex failed to compile.
    #[error("invalid regex '{pattern}': {detail}")]
    InvalidRegex { pattern: String, detail: String },
    /// An enumeration argument was declared with no members.
    #[error("choice argument '{0}' needs at least one member")]
    EmptyChoice(String),
    /// A group was declared with an impossible or vacuous shape.
    #[error("invalid argument group: {0}")]
    InvalidGroup(String),
    /// A mandatory argument was placed in a group.
    #[error("mandatory argument '{0}' cannot be a member of a group")]
    MandatoryGroupMember(String),
    /// A handle did not refer to an argument of this handler.
    #[error("argument handle {0} does not belong to this handler")]
    ForeignHandle(usize),
}

/// Errors raised while loading a [`ParserConfig`](crate::ParserConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File I/O failure.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// YAML parsing failure.
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),
}

/// Convenience alias for results with [`ParseError`].
pub type Result<T> = std::result::Result<T, ParseError>;
