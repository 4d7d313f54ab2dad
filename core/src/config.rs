//! Parser configuration knobs.
//!
//! The knobs are set once, before parsing, and can be read from YAML:
//!
//! ```yaml
//! option_after_data: assume_data
//! bundling: false
//! unused_tokens: pass_back
//! ```
//!
//! Every field is optional in YAML; missing fields take their defaults.

use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// What to do with an option-looking token once positional data has started.
///
/// # Examples
///
/// ```
/// use farg_core::OptionAfterData;
///
/// assert_eq!(OptionAfterData::default(), OptionAfterData::AssumeOption);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OptionAfterData {
    /// Always treat `-x`/`--name` tokens as options (the default).
    #[default]
    AssumeOption,
    /// Treat option-looking tokens as data once data has been seen.
    AssumeData,
    /// Reject option-looking tokens once data has been seen.
    Fail,
}

/// What to do with tokens no argument accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UnusedTokens {
    /// Fail the parse with an "unexpected text" error (the default).
    #[default]
    Fail,
    /// Return the leftover tokens to the caller.
    PassBack,
}

/// Parser behaviour switches.
///
/// # Examples
///
/// ```
/// use farg_core::{OptionAfterData, ParserConfig, UnusedTokens};
///
/// let config = ParserConfig::from_yaml_str("unused_tokens: pass_back").unwrap();
/// assert_eq!(config.unused_tokens, UnusedTokens::PassBack);
/// assert_eq!(config.option_after_data, OptionAfterData::AssumeOption);
/// assert!(config.bundling);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Policy for options that follow positional data.
    pub option_after_data: OptionAfterData,
    /// Whether `-xyz` may combine several no-value short options.
    pub bundling: bool,
    /// Policy for tokens that matched nothing.
    pub unused_tokens: UnusedTokens,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            option_after_data: OptionAfterData::default(),
            bundling: true,
            unused_tokens: UnusedTokens::default(),
        }
    }
}

impl ParserConfig {
    /// Parses a configuration from YAML text.
    ///
    /// # Errors
    ///
    /// Returns [`YamlError`](ConfigError::YamlError) if the text is not a
    /// valid configuration.
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Loads a configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](ConfigError::IoError) if the file cannot be read,
    /// or [`YamlError`](ConfigError::YamlError) if parsing fails.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let config = serde_yaml::from_reader(reader)?;
        Ok(config)
    }

    /// Saves the configuration as YAML.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](ConfigError::IoError) if the file cannot be
    /// written, or [`YamlError`](ConfigError::YamlError) if serialization
    /// fails.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let file = std::fs::File::create(path)?;
        let writer = BufWriter::new(file);
        serde_yaml::to_writer(writer, self)?;
        Ok(())
    }
}
