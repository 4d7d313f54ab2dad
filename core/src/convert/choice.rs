//! Enumeration conversion by unambiguous prefix.

use std::fmt::Display;

use super::{ConversionError, Converter, join_with};

/// Converts text to one of a fixed list of members.
///
/// Input is compared case-sensitively against each member's `Display`
/// rendering. An exact match always wins; otherwise the input must be a
/// prefix of exactly one rendering.
#[derive(Debug, Clone)]
pub struct ChoiceConverter<T> {
    members: Vec<(String, T)>,
}

impl<T: Clone + Display + 'static> ChoiceConverter<T> {
    pub fn new(members: impl IntoIterator<Item = T>) -> Self {
        Self {
            members: members
                .into_iter()
                .map(|member| (member.to_string(), member))
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn first(&self) -> Option<&T> {
        self.members.first().map(|(_, member)| member)
    }

    fn names(&self) -> Vec<String> {
        self.members.iter().map(|(name, _)| name.clone()).collect()
    }
}

impl<T: Clone + Display + 'static> Converter for ChoiceConverter<T> {
    type Value = T;

    fn parse(&self, raw: &str) -> Result<T, ConversionError> {
        if let Some((_, member)) = self.members.iter().find(|(name, _)| name == raw) {
            return Ok(member.clone());
        }

        let candidates: Vec<&(String, T)> = self
            .members
            .iter()
            .filter(|(name, _)| name.starts_with(raw))
            .collect();
        match candidates.as_slice() {
            [(_, member)] => Ok(member.clone()),
            [] => Err(ConversionError::new(
                raw,
                format!("expected one of {}", join_with(&self.names(), "or")),
            )),
            many => {
                let names: Vec<String> = many.iter().map(|(name, _)| name.clone()).collect();
                Err(ConversionError::new(
                    raw,
                    format!(
                        "it is ambiguous between {}; supply more characters",
                        join_with(&names, "and")
                    ),
                ))
            }
        }
    }
}
