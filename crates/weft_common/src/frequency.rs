//! Frequency values with unit parsing and period conversion.

use crate::delay::Delay;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Recognised frequency units, largest first so parsing tries `GHz` before
/// the bare `Hz` suffix and display picks the largest unit that fits.
const UNITS: [(&str, f64); 4] = [
    ("GHz", 1e9),
    ("MHz", 1e6),
    ("KHz", 1e3),
    ("Hz", 1.0),
];

/// A clock frequency stored in Hertz.
///
/// Parses from strings like `"50MHz"`, `"100KHz"`, `"1GHz"`, `"48000Hz"` or
/// bare numbers (interpreted as MHz, the unit operators actually type on a
/// `--freq` flag). The [`period`](Self::period) accessor converts a target
/// frequency into the delay budget one clock cycle affords.
#[derive(Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Frequency(f64);

impl Frequency {
    /// Creates a frequency from a value in Hertz.
    pub fn from_hz(hz: f64) -> Self {
        Self(hz)
    }

    /// Creates a frequency from a value in Megahertz.
    pub fn from_mhz(mhz: f64) -> Self {
        Self(mhz * 1e6)
    }

    /// Returns the frequency in Hertz.
    pub fn hz(&self) -> f64 {
        self.0
    }

    /// Returns the frequency in Megahertz.
    pub fn mhz(&self) -> f64 {
        self.0 / 1e6
    }

    /// Returns the clock period, the total delay budget of one cycle.
    pub fn period(&self) -> Delay {
        Delay::from_ns(1e9 / self.0)
    }
}

impl fmt::Debug for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Frequency({} Hz)", self.0)
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Largest unit the value reaches; sub-Hz values fall back to Hz.
        let (suffix, scale) = UNITS
            .into_iter()
            .find(|&(_, scale)| self.0 >= scale)
            .unwrap_or(("Hz", 1.0));
        write!(f, "{}{}", self.0 / scale, suffix)
    }
}

/// Error type for parsing frequency strings.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid frequency: '{input}'")]
pub struct ParseFrequencyError {
    /// The input string that failed to parse.
    pub input: String,
}

impl FromStr for Frequency {
    type Err = ParseFrequencyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let err = || ParseFrequencyError {
            input: s.to_string(),
        };

        let lower = s.to_ascii_lowercase();
        for (suffix, scale) in UNITS {
            let Some(num) = lower.strip_suffix(&suffix.to_ascii_lowercase()) else {
                continue;
            };
            let value: f64 = num.trim().parse().map_err(|_| err())?;
            return Ok(Frequency(value * scale));
        }

        // Bare number, interpreted as MHz
        let value: f64 = s.parse().map_err(|_| err())?;
        Ok(Frequency(value * 1e6))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_suffixed_units() {
        assert_eq!("1GHz".parse::<Frequency>().unwrap().hz(), 1e9);
        assert_eq!("50MHz".parse::<Frequency>().unwrap().hz(), 50e6);
        assert_eq!("100KHz".parse::<Frequency>().unwrap().hz(), 100e3);
        assert_eq!("48000Hz".parse::<Frequency>().unwrap().hz(), 48e3);
    }

    #[test]
    fn parse_bare_number_is_mhz() {
        let f: Frequency = "25".parse().unwrap();
        assert_eq!(f.hz(), 25e6);
    }

    #[test]
    fn parse_case_insensitive() {
        let f: Frequency = "50mhz".parse().unwrap();
        assert_eq!(f.mhz(), 50.0);
    }

    #[test]
    fn parse_invalid() {
        assert!("fast".parse::<Frequency>().is_err());
        assert!("MHz".parse::<Frequency>().is_err());
    }

    #[test]
    fn period_of_common_clocks() {
        assert_eq!(Frequency::from_mhz(100.0).period(), Delay::from_ns(10.0));
        assert_eq!(Frequency::from_mhz(12.0).period(), Delay::from_ps(83_333));
    }

    #[test]
    fn display_picks_largest_fitting_unit() {
        assert_eq!(format!("{}", Frequency::from_hz(1e9)), "1GHz");
        assert_eq!(format!("{}", Frequency::from_hz(50e6)), "50MHz");
        assert_eq!(format!("{}", Frequency::from_hz(44_100.0)), "44.1KHz");
        assert_eq!(format!("{}", Frequency::from_hz(500.0)), "500Hz");
        assert_eq!(format!("{}", Frequency::from_hz(0.5)), "0.5Hz");
    }

    #[test]
    fn display_roundtrips_through_parse() {
        for hz in [1e9, 48e6, 100e3, 750.0] {
            let f = Frequency::from_hz(hz);
            let reparsed: Frequency = format!("{f}").parse().unwrap();
            assert_eq!(reparsed.hz(), hz);
        }
    }

    #[test]
    fn debug_shows_exact_hertz() {
        let f = Frequency::from_mhz(48.0);
        assert_eq!(format!("{f:?}"), "Frequency(48000000 Hz)");
    }

    #[test]
    fn serde_roundtrip() {
        let f = Frequency::from_mhz(48.0);
        let json = serde_json::to_string(&f).unwrap();
        let back: Frequency = serde_json::from_str(&json).unwrap();
        assert_eq!(f, back);
    }
}
