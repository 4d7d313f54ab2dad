//! Token matching state machine.
//!
//! One [`Parser`] runs one parse: it resets every argument, consumes the
//! tokens front to back, commits each match immediately, and then runs the
//! end-of-parse phase (post-processing, mandatory checks, groups, spillover).
//! Resource-opening side effects happen only in the end phase, so token
//! errors such as unknown options are reported before any file is opened.

use std::collections::VecDeque;

use tracing::debug;

use crate::argument::{Argument, Invocation};
use crate::config::{OptionAfterData, ParserConfig, UnusedTokens};
use crate::convert::join_with;
use crate::error::{ParseError, Result};
use crate::group::ArgumentGroup;

/// Transient state of a single parse.
#[derive(Debug, Default)]
struct ParseState {
    remaining: VecDeque<String>,
    spillover: Vec<String>,
    options_ended: bool,
    data_seen: bool,
}

enum Placement {
    Option,
    Data,
}

pub(crate) struct Parser<'a> {
    args: &'a mut [Box<dyn Argument>],
    groups: &'a [ArgumentGroup],
    config: &'a ParserConfig,
    state: ParseState,
}

impl<'a> Parser<'a> {
    pub(crate) fn new(
        args: &'a mut [Box<dyn Argument>],
        groups: &'a [ArgumentGroup],
        config: &'a ParserConfig,
        tokens: Vec<String>,
    ) -> Self {
        Self {
            args,
            groups,
            config,
            state: ParseState {
                remaining: tokens.into(),
                ..Default::default()
            },
        }
    }

    /// Runs the parse, returning spillover tokens when the configuration
    /// passes them back (always empty otherwise).
    pub(crate) fn run(mut self) -> Result<Vec<String>> {
        for arg in self.args.iter_mut() {
            arg.set_to_default();
        }

        while let Some(token) = self.state.remaining.pop_front() {
            if !self.state.options_ended {
                if token == "--" {
                    debug!("End of options");
                    self.state.options_ended = true;
                    continue;
                }
                if let Some(body) = token.strip_prefix("--") {
                    if let Placement::Option = self.placement(&token)? {
                        self.long(body)?;
                        continue;
                    }
                } else if token.len() > 1 && token.starts_with('-') {
                    if let Placement::Option = self.placement(&token)? {
                        self.short(&token[1..])?;
                        continue;
                    }
                }
            }
            self.data(token)?;
        }

        self.finish()
    }

    fn placement(&self, token: &str) -> Result<Placement> {
        if !self.state.data_seen {
            return Ok(Placement::Option);
        }
        match self.config.option_after_data {
            OptionAfterData::AssumeOption => Ok(Placement::Option),
            OptionAfterData::AssumeData => Ok(Placement::Data),
            OptionAfterData::Fail => Err(ParseError::OptionAfterData(format!(
                "the option '{token}' must come before any positional arguments"
            ))),
        }
    }

    /// Matching candidates are unseen arguments, plus incrementals which may
    /// repeat.
    fn available(arg: &dyn Argument) -> bool {
        !arg.formal().seen() || arg.is_incremental()
    }

    fn duplicate(&self, index: usize) -> ParseError {
        ParseError::Duplicate(format!(
            "{} was specified more than once",
            self.args[index].formal().describe()
        ))
    }

    fn find_long(&self, name: &str) -> Result<usize> {
        let named: Vec<(usize, &dyn Argument)> = self
            .args
            .iter()
            .enumerate()
            .filter(|(_, arg)| !arg.formal().positional)
            .map(|(index, arg)| (index, &**arg))
            .collect();

        let exact = named
            .iter()
            .find(|(_, arg)| arg.formal().names.iter().any(|n| n == name));
        if let Some(&(index, arg)) = exact {
            if !Self::available(arg) {
                return Err(self.duplicate(index));
            }
            return Ok(index);
        }

        let prefixed =
            |arg: &dyn Argument| arg.formal().names.iter().any(|n| n.starts_with(name));
        let candidates: Vec<usize> = named
            .iter()
            .filter(|(_, arg)| Self::available(*arg) && prefixed(*arg))
            .map(|(index, _)| *index)
            .collect();
        match candidates.as_slice() {
            [index] => Ok(*index),
            [] => match named.iter().find(|(_, arg)| prefixed(*arg)) {
                Some(&(index, _)) => Err(self.duplicate(index)),
                None => Err(ParseError::UnknownOption(format!(
                    "there is no --{name} option"
                ))),
            },
            many => {
                let matches: Vec<String> = many
                    .iter()
                    .flat_map(|&index| self.args[index].formal().names.iter())
                    .filter(|n| n.starts_with(name))
                    .map(|n| format!("--{n}"))
                    .collect();
                Err(ParseError::AmbiguousOption(format!(
                    "--{name} is ambiguous; it could be {}. Please supply more characters",
                    join_with(&matches, "or")
                )))
            }
        }
    }

    fn find_short(&self, short: char) -> Result<usize> {
        let found = self
            .args
            .iter()
            .position(|arg| !arg.formal().positional && arg.formal().short == Some(short));
        match found {
            Some(index) if Self::available(&*self.args[index]) => Ok(index),
            Some(index) => Err(self.duplicate(index)),
            None => Err(ParseError::UnknownOption(format!("there is no -{short} option"))),
        }
    }

    /// Supplies a value from the next token, or the end-of-line default when
    /// the line is exhausted.
    fn take_following_value(&mut self, index: usize, how: Invocation) -> Result<()> {
        match self.state.remaining.pop_front() {
            Some(value) => self.args[index].commit(&value, how),
            None if self.args[index].has_end_of_line_default() => {
                self.args[index].commit_end_of_line_default()
            }
            None => Err(ParseError::MissingValue(format!(
                "{} needs a value",
                self.args[index].formal().describe()
            ))),
        }
    }

    fn long(&mut self, body: &str) -> Result<()> {
        let (name, attached) = match body.split_once('=') {
            Some((name, value)) => (name, Some(value)),
            None => (body, None),
        };
        if name.is_empty() {
            return Err(ParseError::UnknownOption(format!(
                "'--{body}' does not name an option"
            )));
        }

        let index = self.find_long(name)?;
        debug!(
            option = name,
            argument = self.args[index].formal().canonical(),
            "Matched long option"
        );
        let arg = &mut self.args[index];

        if arg.needs_value() {
            return match attached {
                Some(value) => arg.commit(value, Invocation::ByLongName),
                None if arg.has_equals_default() => arg.commit_equals_default(),
                None => self.take_following_value(index, Invocation::ByLongName),
            };
        }

        match attached {
            Some(_) if arg.is_incremental() => Err(arg.formal().unexpected_value()),
            Some(value) => arg.commit(value, Invocation::ByLongName),
            None => arg.commit_flag_presence(),
        }
    }

    fn short(&mut self, body: &str) -> Result<()> {
        let mut rest = body;
        while let Some(short) = rest.chars().next() {
            rest = &rest[short.len_utf8()..];
            let index = self.find_short(short)?;
            debug!(
                option = %short,
                argument = self.args[index].formal().canonical(),
                "Matched short option"
            );
            let arg = &mut self.args[index];

            if arg.needs_value() {
                if let Some(value) = rest.strip_prefix('=') {
                    return arg.commit(value, Invocation::ByShortName);
                }
                if arg.has_equals_default() {
                    // No `=` follows: the equals default applies and any
                    // remaining letters are further bundled options.
                    arg.commit_equals_default()?;
                } else if rest.is_empty() {
                    return self.take_following_value(index, Invocation::ByShortName);
                } else {
                    return arg.commit(rest, Invocation::ByShortName);
                }
            } else if let Some(value) = rest.strip_prefix('=') {
                if arg.is_incremental() {
                    return Err(arg.formal().unexpected_value());
                }
                return arg.commit(value, Invocation::ByShortName);
            } else {
                arg.commit_flag_presence()?;
            }

            if !rest.is_empty() && !self.config.bundling {
                return Err(ParseError::BundleLeftover(format!(
                    "unexpected '{rest}' after -{short}; short options cannot be combined"
                )));
            }
        }
        Ok(())
    }

    fn data(&mut self, token: String) -> Result<()> {
        self.state.data_seen = true;
        let slot = self
            .args
            .iter()
            .position(|arg| arg.formal().positional && !arg.formal().seen());
        match slot {
            Some(index) => {
                debug!(
                    argument = self.args[index].formal().canonical(),
                    "Matched positional argument"
                );
                self.args[index].commit(&token, Invocation::ByPosition)
            }
            None => {
                debug!(token = %token, "Unmatched token");
                self.state.spillover.push(token);
                Ok(())
            }
        }
    }

    fn finish(self) -> Result<Vec<String>> {
        for arg in self.args.iter_mut() {
            arg.post_process()?;
            if arg.formal().mandatory && !arg.formal().seen() {
                return Err(ParseError::MissingMandatory(format!(
                    "this command needs {} to be specified",
                    arg.formal().describe()
                )));
            }
        }

        for group in self.groups {
            group.check(self.args)?;
        }

        let spillover = self.state.spillover;
        if spillover.is_empty() || self.config.unused_tokens == UnusedTokens::PassBack {
            return Ok(spillover);
        }

        let quoted: Vec<String> = spillover.iter().map(|t| format!("'{t}'")).collect();
        let text = join_with(&quoted, "and");
        let message = if self.args.iter().any(|arg| arg.formal().positional) {
            format!("unexpected text {text} after all positional arguments")
        } else {
            format!("unexpected text {text}; this command takes no positional arguments")
        };
        Err(ParseError::UnexpectedText(message))
    }
}
