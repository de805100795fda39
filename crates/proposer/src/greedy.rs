//! Greedy accumulation of units under a set of ceilings.

use std::fmt;

/// The resources consumed by a unit, or by a group of units.
pub(crate) trait Usage: Copy {
    /// Returns the usage of `self` and `other` together.
    fn add(&self, other: &Self) -> Self;

    /// Returns the name of the first ceiling of `limits` that `self` exceeds.
    fn exceeded(&self, limits: &Self) -> Option<&'static str>;
}

/// The reason a proposal was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// Adding the next unit would exceed the named ceiling.
    Ceiling(&'static str),
    /// The first unit alone exceeds the named ceiling and forms a proposal by itself.
    Oversized(&'static str),
    /// The proposal reached its timeout under the ceilings.
    Timeout,
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ceiling(name) => write!(f, "ceiling {name}"),
            Self::Oversized(name) => write!(f, "oversized {name}"),
            Self::Timeout => write!(f, "timeout"),
        }
    }
}

/// The prefix of units selected for a proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Selection<U> {
    /// The number of units selected.
    pub(crate) count: usize,
    /// The total usage of the selected units.
    pub(crate) usage: U,
    /// The reason the proposal closed, [`None`] while more units may still fit.
    pub(crate) closed: Option<CloseReason>,
}

/// Selects the longest prefix of `units` whose total usage, starting from `initial`, stays within
/// `limits`. A first unit that exceeds a ceiling alone is selected by itself.
pub(crate) fn select<U: Usage>(units: &[U], initial: U, limits: &U) -> Selection<U> {
    let mut usage = initial;
    for (i, unit) in units.iter().enumerate() {
        let candidate = usage.add(unit);
        if let Some(name) = candidate.exceeded(limits) {
            if i == 0 {
                let closed = Some(CloseReason::Oversized(name));
                return Selection { count: 1, usage: candidate, closed };
            }
            return Selection { count: i, usage, closed: Some(CloseReason::Ceiling(name)) };
        }
        usage = candidate;
    }
    Selection { count: units.len(), usage, closed: None }
}
