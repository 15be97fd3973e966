//! Propagation delay scalars and process-corner bundles.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign};

/// A propagation delay stored as an integer number of picoseconds.
///
/// Integer storage keeps addition exactly associative, which the design
/// checksum and the budget arithmetic rely on. Negative values are legal
/// (slack can go negative).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Delay(i64);

impl Delay {
    /// A zero delay.
    pub const ZERO: Self = Self(0);

    /// Creates a delay from a picosecond count.
    pub const fn from_ps(ps: i64) -> Self {
        Self(ps)
    }

    /// Creates a delay from a nanosecond value, rounding to picoseconds.
    pub fn from_ns(ns: f64) -> Self {
        Self((ns * 1_000.0).round() as i64)
    }

    /// Returns the delay in picoseconds.
    pub const fn to_ps(self) -> i64 {
        self.0
    }

    /// Returns the delay in nanoseconds.
    pub fn to_ns(self) -> f64 {
        self.0 as f64 / 1_000.0
    }

    /// Returns a stable 32-bit digest of this delay for the design checksum.
    pub fn checksum(self) -> u32 {
        self.0 as u32
    }
}

impl Add for Delay {
    type Output = Delay;

    fn add(self, rhs: Delay) -> Delay {
        Delay(self.0 + rhs.0)
    }
}

impl AddAssign for Delay {
    fn add_assign(&mut self, rhs: Delay) {
        self.0 += rhs.0;
    }
}

impl Sum for Delay {
    fn sum<I: Iterator<Item = Delay>>(iter: I) -> Delay {
        iter.fold(Delay::ZERO, Add::add)
    }
}

impl fmt::Debug for Delay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Delay({}ps)", self.0)
    }
}

impl fmt::Display for Delay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}ns", self.to_ns())
    }
}

/// A delay across process corners: minimum and maximum for both rising and
/// falling transitions.
///
/// Combines with `+` edge-by-edge, so a chain of elements can be summed in
/// any grouping.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub struct DelayInfo {
    /// Fastest rising-edge delay.
    pub min_rise: Delay,
    /// Slowest rising-edge delay.
    pub max_rise: Delay,
    /// Fastest falling-edge delay.
    pub min_fall: Delay,
    /// Slowest falling-edge delay.
    pub max_fall: Delay,
}

impl DelayInfo {
    /// A zero delay on every edge.
    pub const ZERO: Self = Self {
        min_rise: Delay::ZERO,
        max_rise: Delay::ZERO,
        min_fall: Delay::ZERO,
        max_fall: Delay::ZERO,
    };

    /// Creates a corner bundle where every edge has the same delay.
    pub const fn uniform(delay: Delay) -> Self {
        Self {
            min_rise: delay,
            max_rise: delay,
            min_fall: delay,
            max_fall: delay,
        }
    }

    /// Returns the smallest delay across all edges.
    pub fn min_delay(&self) -> Delay {
        self.min_rise.min(self.min_fall)
    }

    /// Returns the largest delay across all edges.
    pub fn max_delay(&self) -> Delay {
        self.max_rise.max(self.max_fall)
    }
}

impl Add for DelayInfo {
    type Output = DelayInfo;

    fn add(self, rhs: DelayInfo) -> DelayInfo {
        DelayInfo {
            min_rise: self.min_rise + rhs.min_rise,
            max_rise: self.max_rise + rhs.max_rise,
            min_fall: self.min_fall + rhs.min_fall,
            max_fall: self.max_fall + rhs.max_fall,
        }
    }
}
