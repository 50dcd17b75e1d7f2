use std::fmt;
use std::ops::{Add, Neg, Sub};

use chrono::Duration;

/// Signed distance between two cycles, e.g. "six hours before the current cycle".
/// This is always the first component of a [`crate::Path`].
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct CycleOffset(Duration);

impl Default for CycleOffset {
    fn default() -> Self {
        Self::zero()
    }
}

impl CycleOffset {
    /// The current cycle.
    #[inline]
    pub fn zero() -> Self {
        Self(Duration::zero())
    }

    #[inline]
    pub fn hours(hours: i64) -> Self {
        Self(Duration::hours(hours))
    }

    #[inline]
    pub fn minutes(minutes: i64) -> Self {
        Self(Duration::minutes(minutes))
    }

    #[inline]
    pub fn duration(&self) -> Duration {
        self.0
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0 == Duration::zero()
    }

    /// True if this offset is a whole number of `step`s.
    /// A zero step only divides a zero offset.
    pub fn is_multiple_of(&self, step: Duration) -> bool {
        let step_ms = step.num_milliseconds();
        if step_ms == 0 {
            return self.is_zero();
        }
        self.0.num_milliseconds() % step_ms == 0
    }
}

impl From<Duration> for CycleOffset {
    fn from(dt: Duration) -> Self {
        Self(dt)
    }
}

impl Add for CycleOffset {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sub for CycleOffset {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl Neg for CycleOffset {
    type Output = Self;
    fn neg(self) -> Self {
        Self(-self.0)
    }
}

/// Formats as `[-]HH:MM:SS`; hours are not wrapped at 24.
impl fmt::Display for CycleOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total = self.0.num_seconds();
        let sign = if total < 0 { "-" } else { "" };
        let total = total.abs();
        let hours = total / 3600;
        let minutes = (total % 3600) / 60;
        let seconds = total % 60;
        write!(f, "{sign}{hours:02}:{minutes:02}:{seconds:02}")
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_display() {
        let dt = CycleOffset::from(Duration::days(2) + Duration::seconds(7380));
        assert_eq!(dt.to_string(), "50:03:00");
        assert_eq!(CycleOffset::hours(-6).to_string(), "-06:00:00");
        assert_eq!(CycleOffset::zero().to_string(), "00:00:00");
    }

    #[test]
    fn test_is_multiple_of() {
        let step = Duration::hours(6);
        assert!(CycleOffset::hours(-12).is_multiple_of(step));
        assert!(CycleOffset::zero().is_multiple_of(step));
        assert!(!CycleOffset::hours(3).is_multiple_of(step));
        assert!(!CycleOffset::hours(3).is_multiple_of(Duration::zero()));
    }
}
