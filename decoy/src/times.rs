// vim: tw=80

use std::{
    fmt,
    ops::{RangeFrom, RangeInclusive},
};

/// How many times an expectation may be satisfied: an inclusive range of call
/// counts.
///
/// # Examples
/// ```
/// # use decoy::*;
/// assert!(Times::at_least(2).verify(5));
/// assert!(!Times::at_most_once().verify(2));
/// assert_eq!(Times::between(1, 3), Times::from(1..=3));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Times {
    min: usize,
    /// `usize::MAX` means unbounded
    max: usize,
}

impl Times {
    pub fn never() -> Self {
        Times { min: 0, max: 0 }
    }

    pub fn once() -> Self {
        Times::exactly(1)
    }

    pub fn exactly(n: usize) -> Self {
        Times { min: n, max: n }
    }

    pub fn at_least_once() -> Self {
        Times::at_least(1)
    }

    pub fn at_least(n: usize) -> Self {
        Times { min: n, max: usize::MAX }
    }

    pub fn at_most_once() -> Self {
        Times::at_most(1)
    }

    pub fn at_most(n: usize) -> Self {
        Times { min: 0, max: n }
    }

    /// # Panics
    ///
    /// If `min > max`
    pub fn between(min: usize, max: usize) -> Self {
        assert!(min <= max, "Times::between({}, {}): min exceeds max", min,
                max);
        Times { min, max }
    }

    /// Is `count` within range?
    pub fn verify(&self, count: usize) -> bool {
        self.min <= count && count <= self.max
    }

    pub fn min(&self) -> usize {
        self.min
    }

    /// The upper bound, if there is one
    pub fn max(&self) -> Option<usize> {
        if self.max == usize::MAX {
            None
        } else {
            Some(self.max)
        }
    }

    /// The upper bound, clamped to `limit`
    pub(crate) fn max_within(&self, limit: usize) -> usize {
        self.max.min(limit)
    }
}

impl From<usize> for Times {
    fn from(n: usize) -> Self {
        Times::exactly(n)
    }
}

impl From<RangeInclusive<usize>> for Times {
    fn from(r: RangeInclusive<usize>) -> Self {
        Times::between(*r.start(), *r.end())
    }
}

impl From<RangeFrom<usize>> for Times {
    fn from(r: RangeFrom<usize>) -> Self {
        Times::at_least(r.start)
    }
}

impl fmt::Display for Times {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.max() {
            Some(max) if max == self.min => {
                let s = if max == 1 { "" } else { "s" };
                write!(f, "exactly {} time{}", max, s)
            },
            None => {
                let s = if self.min == 1 { "" } else { "s" };
                write!(f, "at least {} time{}", self.min, s)
            },
            Some(max) if self.min == 0 => {
                let s = if max == 1 { "" } else { "s" };
                write!(f, "at most {} time{}", max, s)
            },
            Some(max) => {
                write!(f, "between {} and {} times", self.min, max)
            }
        }
    }
}

#[cfg(test)]
mod t {
    use super::*;

    #[test]
    fn factories() {
        assert_eq!(Times::between(0, 0), Times::never());
        assert_eq!(Times::between(1, 1), Times::once());
        assert_eq!(Times::between(0, 1), Times::at_most_once());
        assert_eq!(Times::from(1..), Times::at_least_once());
        assert_eq!(Times::from(3), Times::exactly(3));
    }

    #[test]
    fn verify() {
        let t = Times::between(2, 4);
        assert!(!t.verify(1));
        assert!(t.verify(2));
        assert!(t.verify(4));
        assert!(!t.verify(5));
        assert!(Times::at_least(0).verify(usize::MAX - 1));
        assert!(Times::never().verify(0));
        assert!(!Times::never().verify(1));
    }

    #[test]
    #[should_panic(expected = "min exceeds max")]
    fn between_backwards() {
        Times::between(3, 2);
    }

    #[test]
    fn unbounded_max() {
        assert_eq!(None, Times::at_least(2).max());
        assert_eq!(Some(2), Times::at_most(2).max());
        assert_eq!(5, Times::at_least(2).max_within(5));
    }

    #[test]
    fn display() {
        assert_eq!("exactly 1 time", Times::once().to_string());
        assert_eq!("exactly 0 times", Times::never().to_string());
        assert_eq!("at least 1 time", Times::at_least_once().to_string());
        assert_eq!("at most 3 times", Times::at_most(3).to_string());
        assert_eq!("between 2 and 4 times", Times::between(2, 4).to_string());
    }
}
