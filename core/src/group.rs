//! Post-parse constraints over sets of arguments.

use crate::argument::Argument;
use crate::convert::join_with;
use crate::error::{ParseError, RegistrationError};

/// A constraint checked after every argument has been validated.
///
/// Members are indices into the handler's argument list. Groups are built at
/// registration time and never change afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ArgumentGroup {
    /// Between `min` and `max` members must be seen.
    Count {
        members: Vec<usize>,
        min: usize,
        max: usize,
    },
    /// If any of `tails` is seen, `head` must be seen.
    Implies { head: usize, tails: Vec<usize> },
    /// Either every member or none is seen.
    AllOrNone { members: Vec<usize> },
}

impl ArgumentGroup {
    /// Builds a counting group, rejecting impossible or vacuous bounds.
    pub(crate) fn count(
        members: Vec<usize>,
        min: usize,
        max: usize,
    ) -> Result<Self, RegistrationError> {
        if members.len() < 2 {
            return Err(RegistrationError::InvalidGroup(
                "a counting group needs at least two members".to_string(),
            ));
        }
        if max == 0 {
            return Err(RegistrationError::InvalidGroup(
                "the maximum must be at least 1".to_string(),
            ));
        }
        if min > max {
            return Err(RegistrationError::InvalidGroup(format!(
                "the minimum {min} exceeds the maximum {max}"
            )));
        }
        if min > members.len() {
            return Err(RegistrationError::InvalidGroup(format!(
                "the minimum {min} exceeds the {} members",
                members.len()
            )));
        }
        if min == 0 && max >= members.len() {
            return Err(RegistrationError::InvalidGroup(format!(
                "at most {max} of {} members is always satisfied",
                members.len()
            )));
        }
        Ok(Self::Count { members, min, max })
    }

    pub(crate) fn implies(head: usize, tails: Vec<usize>) -> Result<Self, RegistrationError> {
        if tails.is_empty() {
            return Err(RegistrationError::InvalidGroup(
                "an implication needs at least one dependent argument".to_string(),
            ));
        }
        if tails.contains(&head) {
            return Err(RegistrationError::InvalidGroup(
                "an argument cannot imply itself".to_string(),
            ));
        }
        Ok(Self::Implies { head, tails })
    }

    pub(crate) fn all_or_none(members: Vec<usize>) -> Result<Self, RegistrationError> {
        if members.len() < 2 {
            return Err(RegistrationError::InvalidGroup(
                "an all-or-none group needs at least two members".to_string(),
            ));
        }
        Ok(Self::AllOrNone { members })
    }

    pub(crate) fn members(&self) -> Vec<usize> {
        match self {
            Self::Count { members, .. } | Self::AllOrNone { members } => members.clone(),
            Self::Implies { head, tails } => {
                std::iter::once(*head).chain(tails.iter().copied()).collect()
            }
        }
    }

    /// Fails with a rendered message if the constraint is not met.
    pub(crate) fn check(&self, args: &[Box<dyn Argument>]) -> Result<(), ParseError> {
        let seen = |index: usize| args[index].formal().seen();
        let names = |members: &[usize]| -> Vec<String> {
            members
                .iter()
                .map(|&index| args[index].formal().describe())
                .collect()
        };

        match self {
            Self::Count { members, min, max } => {
                let count = members.iter().filter(|&&index| seen(index)).count();
                if (*min..=*max).contains(&count) {
                    return Ok(());
                }
                let list = join_with(&names(&members[..]), "and");
                let message = if min == max {
                    format!("please specify exactly {min} of {list}")
                } else if *min == 0 {
                    format!("please don't specify more than {max} of {list}")
                } else {
                    format!("please specify between {min} and {max} of {list}")
                };
                Err(ParseError::Group(message))
            }
            Self::Implies { head, tails } => {
                if seen(*head) {
                    return Ok(());
                }
                match tails.iter().find(|&&index| seen(index)) {
                    Some(&tail) => Err(ParseError::Group(format!(
                        "{} can only be specified together with {}",
                        args[tail].formal().describe(),
                        args[*head].formal().describe()
                    ))),
                    None => Ok(()),
                }
            }
            Self::AllOrNone { members } => {
                let count = members.iter().filter(|&&index| seen(index)).count();
                if count == 0 || count == members.len() {
                    return Ok(());
                }
                let message = match names(&members[..]).as_slice() {
                    [first, second] => {
                        format!("please specify both or neither of {first} and {second}")
                    }
                    all => format!("please specify all or none of {}", join_with(all, "and")),
                };
                Err(ParseError::Group(message))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::argument::{FlagArg, Formal};

    fn flags(names: &[&str], seen: &[bool]) -> Vec<Box<dyn Argument>> {
        names
            .iter()
            .zip(seen)
            .map(|(name, &was_seen)| {
                let mut flag = FlagArg {
                    formal: Formal::new(name),
                    default: false,
                    value: false,
                };
                if was_seen {
                    flag.commit_flag_presence().unwrap();
                }
                Box::new(flag) as Box<dyn Argument>
            })
            .collect()
    }

    #[test]
    fn test_count_exact() {
        let group = ArgumentGroup::count(vec![0, 1], 1, 1).unwrap();

        assert!(group.check(&flags(&["alpha", "bravo"], &[true, false])).is_ok());
        assert!(group.check(&flags(&["alpha", "bravo"], &[false, true])).is_ok());

        let err = group
            .check(&flags(&["alpha", "bravo"], &[false, false]))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "please specify exactly 1 of the --alpha option and the --bravo option"
        );
        assert!(group.check(&flags(&["alpha", "bravo"], &[true, true])).is_err());
    }

    #[test]
    fn test_count_upper_bound_and_range_messages() {
        let names = ["a", "b", "c"];
        let at_most = ArgumentGroup::count(vec![0, 1, 2], 0, 1).unwrap();
        let err = at_most.check(&flags(&names, &[true, true, false])).unwrap_err();
        assert!(err.to_string().starts_with("please don't specify more than 1 of"));

        let between = ArgumentGroup::count(vec![0, 1, 2], 1, 2).unwrap();
        let err = between.check(&flags(&names, &[true, true, true])).unwrap_err();
        assert!(err.to_string().starts_with("please specify between 1 and 2 of"));
        assert!(between.check(&flags(&names, &[false, true, true])).is_ok());
    }

    #[test]
    fn test_count_registration_rules() {
        assert!(ArgumentGroup::count(vec![0, 1], 0, 2).is_err());
        assert!(ArgumentGroup::count(vec![0, 1], 0, 0).is_err());
        assert!(ArgumentGroup::count(vec![0, 1], 2, 1).is_err());
        assert!(ArgumentGroup::count(vec![0, 1], 3, 3).is_err());
        assert!(ArgumentGroup::count(vec![0], 1, 1).is_err());
        assert!(ArgumentGroup::count(vec![0, 1], 2, 2).is_ok());
    }

    #[test]
    fn test_implies_names_offending_member() {
        let group = ArgumentGroup::implies(0, vec![1, 2]).unwrap();
        let names = ["head", "left", "right"];

        assert!(group.check(&flags(&names, &[false, false, false])).is_ok());
        assert!(group.check(&flags(&names, &[true, true, true])).is_ok());
        let err = group.check(&flags(&names, &[false, false, true])).unwrap_err();
        assert_eq!(
            err.to_string(),
            "the --right option can only be specified together with the --head option"
        );
        assert!(ArgumentGroup::implies(0, vec![0]).is_err());
    }

    #[test]
    fn test_all_or_none_phrasing() {
        let pair = ArgumentGroup::all_or_none(vec![0, 1]).unwrap();
        let err = pair.check(&flags(&["user", "password"], &[true, false])).unwrap_err();
        assert!(err.to_string().contains("both or neither"));

        let triple = ArgumentGroup::all_or_none(vec![0, 1, 2]).unwrap();
        let names = ["x", "y", "z"];
        assert!(triple.check(&flags(&names, &[true, true, true])).is_ok());
        let err = triple.check(&flags(&names, &[true, false, true])).unwrap_err();
        assert!(err.to_string().contains("all or none"));
    }
}
