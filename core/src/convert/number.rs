//! Integer and floating-point conversion with range constraints.

use std::cmp::Ordering;
use std::fmt::{self, Debug, Display};
use std::num::{IntErrorKind, ParseIntError};
use std::str::FromStr;

use super::{ConversionError, Converter, join_with};

/// A numeric type that can bound a [`ValueRange`].
pub trait RangeBound: Copy + PartialOrd + Display + Debug + 'static {
    const ZERO: Self;

    /// Default merge gap of a [`RangeSet`].
    ///
    /// One for integers, so `[1, 4]` and `[5, 9]` merge; zero for floats,
    /// which then merge only when they overlap or share an endpoint.
    const ADJACENT: Self;

    /// Returns `true` when a range ending at `self` reaches `next` within
    /// `gap`. Overflow counts as reaching.
    fn reaches(self, next: Self, gap: Self) -> bool;
}

/// Integer receiver types.
pub trait Integer: RangeBound + Default {
    /// Parses digits (with an optional leading `-`) in the given radix.
    fn from_str_radix(text: &str, radix: u32) -> Result<Self, ParseIntError>;

    /// Adds one, returning `None` on overflow.
    fn increment(self) -> Option<Self>;
}

/// Floating-point receiver types.
pub trait Float: RangeBound + Default + FromStr {}

macro_rules! impl_integer {
    ($($t:ty),* $(,)?) => {$(
        impl RangeBound for $t {
            const ZERO: Self = 0;
            const ADJACENT: Self = 1;

            fn reaches(self, next: Self, gap: Self) -> bool {
                self.checked_add(gap).is_none_or(|reach| reach >= next)
            }
        }

        impl Integer for $t {
            fn from_str_radix(text: &str, radix: u32) -> Result<Self, ParseIntError> {
                <$t>::from_str_radix(text, radix)
            }

            fn increment(self) -> Option<Self> {
                self.checked_add(1)
            }
        }
    )*};
}

impl_integer!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);

macro_rules! impl_float {
    ($($t:ty),* $(,)?) => {$(
        impl RangeBound for $t {
            const ZERO: Self = 0.0;
            const ADJACENT: Self = 0.0;

            fn reaches(self, next: Self, gap: Self) -> bool {
                self + gap >= next
            }
        }

        impl Float for $t {}
    )*};
}

impl_float!(f32, f64);

/// A closed interval `[min, max]` of acceptable values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueRange<T> {
    pub min: T,
    pub max: T,
}

impl<T: RangeBound> ValueRange<T> {
    /// Creates a range, or `None` if `min > max` or the bounds are unordered
    /// (e.g. NaN).
    pub fn new(min: T, max: T) -> Option<Self> {
        (min <= max).then_some(Self { min, max })
    }

    /// A range holding exactly one value.
    pub fn single(value: T) -> Option<Self> {
        Self::new(value, value)
    }

    pub fn contains(&self, value: T) -> bool {
        self.min <= value && value <= self.max
    }
}

impl<T: RangeBound> Display for ValueRange<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.min == self.max {
            write!(f, "{}", self.min)
        } else {
            write!(f, "{} to {}", self.min, self.max)
        }
    }
}

/// An ordered, minimal union of [`ValueRange`]s.
///
/// Ranges stay sorted by lower bound. After every insertion, ranges that
/// overlap or lie within the merge gap of each other are merged, so the
/// final set does not depend on insertion order. The gap defaults to
/// [`RangeBound::ADJACENT`]. An empty set accepts every value.
///
/// # Examples
///
/// ```
/// use farg_core::{RangeSet, ValueRange};
///
/// let mut set = RangeSet::new();
/// set.insert(ValueRange::new(50, 59).unwrap());
/// set.insert(ValueRange::single(49).unwrap());
/// set.insert(ValueRange::new(42, 48).unwrap());
///
/// assert_eq!(set.ranges(), &[ValueRange::new(42, 59).unwrap()]);
/// assert!(set.contains(45));
/// assert!(!set.contains(60));
///
/// let mut wide = RangeSet::with_merge_gap(0.5).unwrap();
/// wide.insert(ValueRange::new(0.0, 1.0).unwrap());
/// wide.insert(ValueRange::new(1.25, 2.0).unwrap());
/// assert_eq!(wide.ranges(), &[ValueRange::new(0.0, 2.0).unwrap()]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RangeSet<T> {
    ranges: Vec<ValueRange<T>>,
    gap: T,
}

impl<T: RangeBound> Default for RangeSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: RangeBound> RangeSet<T> {
    pub fn new() -> Self {
        Self {
            ranges: Vec::new(),
            gap: T::ADJACENT,
        }
    }

    /// An empty set whose ranges merge when at most `gap` apart.
    ///
    /// Returns `None` for a negative or unordered (NaN) gap.
    pub fn with_merge_gap(gap: T) -> Option<Self> {
        (gap >= T::ZERO).then(|| Self {
            ranges: Vec::new(),
            gap,
        })
    }

    pub fn merge_gap(&self) -> T {
        self.gap
    }

    pub fn insert(&mut self, range: ValueRange<T>) {
        self.ranges.push(range);
        self.coalesce();
    }

    pub fn ranges(&self) -> &[ValueRange<T>] {
        &self.ranges
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Returns `true` if `value` is acceptable. An empty set accepts all.
    pub fn contains(&self, value: T) -> bool {
        self.ranges.is_empty() || self.ranges.iter().any(|r| r.contains(value))
    }

    fn coalesce(&mut self) {
        self.ranges.sort_by(|a, b| a.min.partial_cmp(&b.min).unwrap_or(Ordering::Equal));

        let mut merged: Vec<ValueRange<T>> = Vec::with_capacity(self.ranges.len());
        for range in self.ranges.drain(..) {
            match merged.last_mut() {
                Some(last) if range.min <= last.max || last.max.reaches(range.min, self.gap) => {
                    if range.max > last.max {
                        last.max = range.max;
                    }
                }
                _ => merged.push(range),
            }
        }
        self.ranges = merged;
    }

    fn describe(&self) -> String {
        let parts: Vec<String> = self.ranges.iter().map(ToString::to_string).collect();
        join_with(&parts, "or")
    }
}

fn radix_reason(radix: u32) -> String {
    match radix {
        2 => "a binary integer".to_string(),
        8 => "an octal integer".to_string(),
        10 => "an integer".to_string(),
        16 => "a hexadecimal integer".to_string(),
        other => format!("an integer in base {other}"),
    }
}

/// Parses an integer, honouring `0b`/`0o`/`0n`/`0x` prefixes.
///
/// Unprefixed text is read in `default_radix`. A prefix selects the radix for
/// this value only and may follow a sign (`-0x1f`).
pub(crate) fn parse_integer<T: Integer>(
    raw: &str,
    default_radix: u32,
) -> Result<T, ConversionError> {
    let (negative, body) = match raw.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, raw.strip_prefix('+').unwrap_or(raw)),
    };
    let (radix, digits) = match body.get(..2) {
        Some("0b") => (2, &body[2..]),
        Some("0o") => (8, &body[2..]),
        Some("0n") => (10, &body[2..]),
        Some("0x") => (16, &body[2..]),
        _ => (default_radix, body),
    };
    if digits.is_empty() || digits.starts_with(['+', '-']) {
        return Err(ConversionError::new(raw, radix_reason(radix)));
    }

    let signed = if negative {
        format!("-{digits}")
    } else {
        digits.to_string()
    };
    T::from_str_radix(&signed, radix).map_err(|e| match e.kind() {
        IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => {
            ConversionError::new(raw, "an integer small enough for this option")
        }
        _ => ConversionError::new(raw, radix_reason(radix)),
    })
}

/// Converts integers with an optional default radix and range set.
#[derive(Debug, Clone)]
pub struct IntegerConverter<T> {
    pub(crate) radix: u32,
    pub(crate) ranges: RangeSet<T>,
}

impl<T: Integer> Default for IntegerConverter<T> {
    fn default() -> Self {
        Self {
            radix: 10,
            ranges: RangeSet::new(),
        }
    }
}

impl<T: Integer> Converter for IntegerConverter<T> {
    type Value = T;

    fn parse(&self, raw: &str) -> Result<T, ConversionError> {
        parse_integer(raw, self.radix)
    }

    fn violates_constraints(&self, value: &T) -> Option<String> {
        (!self.ranges.contains(*value)).then(|| {
            format!(
                "{value} is out of range; acceptable values are {}",
                self.ranges.describe()
            )
        })
    }
}

/// Converts floating-point numbers with an optional range set.
#[derive(Debug, Clone)]
pub struct FloatConverter<T> {
    pub(crate) ranges: RangeSet<T>,
}

impl<T: Float> Default for FloatConverter<T> {
    fn default() -> Self {
        Self {
            ranges: RangeSet::new(),
        }
    }
}

impl<T: Float> Converter for FloatConverter<T> {
    type Value = T;

    fn parse(&self, raw: &str) -> Result<T, ConversionError> {
        raw.parse::<T>()
            .map_err(|_| ConversionError::new(raw, "a number"))
    }

    fn violates_constraints(&self, value: &T) -> Option<String> {
        (!self.ranges.contains(*value)).then(|| {
            format!(
                "{value} is out of range; acceptable values are {}",
                self.ranges.describe()
            )
        })
    }
}
