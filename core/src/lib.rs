//! Declarative command-line argument parsing.
//!
//! This crate turns a list of command-line tokens into typed values:
//!
//! - [`Handler`]: owns declared arguments and groups, runs parses, and
//!   hands values back through typed [`ArgHandle`]s.
//! - [`Converter`] implementations: integers with radix prefixes and
//!   ranges, floats with ranges, strings with length and regex checks,
//!   enumerations matched by prefix, and file-like arguments.
//! - Argument groups: "exactly / at most / between N of", implication, and
//!   all-or-none constraints checked after matching.
//! - [`ParserConfig`]: option-after-data policy, bundling, and handling of
//!   leftover tokens, loadable from YAML.
//!
//! Long options accept unambiguous prefixes (`--al` for `--alpha`), values
//! may be attached (`--alpha=5`, `-c17`) or follow as the next token, and
//! short options bundle (`-vvn`).
//!
//! # Example
//!
//! ```
//! use farg_core::*;
//!
//! let mut handler = Handler::new();
//! let count = handler
//!     .integer::<u32>("count")
//!     .short('c')
//!     .range(1, 10)
//!     .unwrap()
//!     .register()
//!     .unwrap();
//! let verbose = handler.counter::<u8>("verbose").short('v').register().unwrap();
//! let input = handler.string("input").positional().mandatory().register().unwrap();
//!
//! handler.parse(["prog", "-vv", "--co=7", "data.txt"]).unwrap();
//! assert_eq!(*handler.value(&count), 7);
//! assert_eq!(*handler.value(&verbose), 2);
//! assert_eq!(handler.value(&input), "data.txt");
//!
//! let err = handler.parse(["prog", "-c", "11", "x"]).unwrap_err();
//! assert!(matches!(err, ParseError::Constraint(_)));
//! ```

mod argument;
mod config;
mod convert;
mod error;
mod group;
mod handler;
mod parser;

pub use argument::{Argument, Formal, Indicator, Invocation};
pub use config::{OptionAfterData, ParserConfig, UnusedTokens};
pub use convert::{
    Captures, ChoiceConverter, ConversionError, Converter, FileHandle, Float, FloatConverter,
    Integer, IntegerConverter, OpenMode, RangeBound, RangeSet, StringConverter, ValueRange,
    parse_bool,
};
pub use error::{ConfigError, ParseError, RegistrationError, Result};
pub use handler::{ArgHandle, ArgId, Counter, Declaration, FileKind, Flag, Handler, Kind, Valued};
