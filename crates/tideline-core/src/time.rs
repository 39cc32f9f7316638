//! Message timestamps, page arithmetic and clocks

use crate::errors::TidelineError;
use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::fmt;
use std::str::FromStr;

const MICROS_PER_SEC: u64 = 1_000_000;

/// Page number of the message timeline.
///
/// `page = timestamp_secs / page_span_secs`. Page `0` is the lower bound of
/// the timeline; negative values only ever appear as intermediate results
/// and are never requested.
pub type Page = i64;

/// Remote message timestamp with microsecond precision.
///
/// The wire form is the service's `"<seconds>.<micros>"` string, e.g.
/// `"1512085950.000216"`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Timestamp(u64);

impl Timestamp {
    /// Timestamp from whole seconds.
    pub const fn from_secs(secs: u64) -> Self {
        Self(secs * MICROS_PER_SEC)
    }

    /// Timestamp from microseconds.
    pub const fn from_micros(micros: u64) -> Self {
        Self(micros)
    }

    /// Whole seconds (truncated).
    pub const fn as_secs(&self) -> u64 {
        self.0 / MICROS_PER_SEC
    }

    /// Microseconds since the epoch.
    pub const fn as_micros(&self) -> u64 {
        self.0
    }

    /// Page this timestamp falls into.
    pub fn page(&self, page_span_secs: u64) -> Page {
        timestamp_to_page(*self, page_span_secs)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:06}", self.0 / MICROS_PER_SEC, self.0 % MICROS_PER_SEC)
    }
}

impl FromStr for Timestamp {
    type Err = TidelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || TidelineError::serialization(format!("invalid timestamp: {s:?}"));
        let (secs, frac) = match s.split_once('.') {
            Some((secs, frac)) => (secs, frac),
            None => (s, ""),
        };
        if secs.is_empty() || frac.len() > 6 || !frac.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let secs: u64 = secs.parse().map_err(|_| invalid())?;
        let mut micros: u64 = 0;
        for (i, digit) in frac.bytes().enumerate() {
            micros += u64::from(digit - b'0') * 10u64.pow(5 - i as u32);
        }
        secs.checked_mul(MICROS_PER_SEC)
            .and_then(|m| m.checked_add(micros))
            .map(Timestamp)
            .ok_or_else(invalid)
    }
}

impl TryFrom<String> for Timestamp {
    type Error = TidelineError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Timestamp> for String {
    fn from(ts: Timestamp) -> Self {
        ts.to_string()
    }
}

/// Page a timestamp falls into for the given page span.
pub fn timestamp_to_page(ts: Timestamp, page_span_secs: u64) -> Page {
    let span = page_span_secs.max(1);
    i64::try_from(ts.as_secs() / span).unwrap_or(i64::MAX)
}

/// Wall clock used to find the current page.
pub trait Clock {
    /// Current time.
    fn now(&self) -> Timestamp;
}

/// Clock backed by the system time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        let micros = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| u64::try_from(d.as_micros()).unwrap_or(u64::MAX))
            .unwrap_or(0);
        Timestamp::from_micros(micros)
    }
}

/// Manually driven clock for deterministic tests.
#[derive(Debug, Default)]
pub struct FixedClock {
    now: Cell<Timestamp>,
}

impl FixedClock {
    /// Clock frozen at `now`.
    pub fn new(now: Timestamp) -> Self {
        Self { now: Cell::new(now) }
    }

    /// Move the clock to `now`.
    pub fn set(&self, now: Timestamp) {
        self.now.set(now);
    }

    /// Advance the clock by whole seconds.
    pub fn advance_secs(&self, secs: u64) {
        let next = self.now.get().as_micros() + secs * MICROS_PER_SEC;
        self.now.set(Timestamp::from_micros(next));
    }
}

impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        self.now.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_wire_format() {
        let ts: Timestamp = "1512085950.000216".parse().unwrap();
        assert_eq!(ts.as_secs(), 1_512_085_950);
        assert_eq!(ts.as_micros() % MICROS_PER_SEC, 216);
        assert_eq!(ts.to_string(), "1512085950.000216");

        let short: Timestamp = "12.5".parse().unwrap();
        assert_eq!(short.as_micros(), 12_500_000);

        let whole: Timestamp = "42".parse().unwrap();
        assert_eq!(whole, Timestamp::from_secs(42));
    }

    #[test]
    fn test_timestamp_rejects_garbage() {
        assert!("".parse::<Timestamp>().is_err());
        assert!("abc.1".parse::<Timestamp>().is_err());
        assert!("1.1234567".parse::<Timestamp>().is_err());
        assert!("1.-5".parse::<Timestamp>().is_err());
    }

    #[test]
    fn test_timestamp_serde_roundtrip_as_string() {
        let ts = Timestamp::from_micros(5_100_000_042);
        let json = serde_json::to_string(&ts).unwrap();
        assert_eq!(json, "\"5100.000042\"");
        let back: Timestamp = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ts);
    }

    #[test]
    fn test_page_arithmetic() {
        assert_eq!(timestamp_to_page(Timestamp::from_secs(5_100), 1_000), 5);
        assert_eq!(timestamp_to_page(Timestamp::from_secs(999), 1_000), 0);
        assert_eq!(Timestamp::from_secs(86_400 * 3 + 1).page(86_400), 3);
        // zero span is clamped instead of dividing by zero
        assert_eq!(timestamp_to_page(Timestamp::from_secs(7), 0), 7);
    }

    #[test]
    fn test_fixed_clock() {
        let clock = FixedClock::new(Timestamp::from_secs(10));
        clock.advance_secs(5);
        assert_eq!(clock.now(), Timestamp::from_secs(15));
        clock.set(Timestamp::from_secs(1));
        assert_eq!(clock.now().as_secs(), 1);
    }
}
