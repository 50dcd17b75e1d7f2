use chrono::{Duration, NaiveDateTime};

use crate::{CycleOffset, Error};

/// The set of valid cycles: every `step` from `start` through `end`, inclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clock {
    start: NaiveDateTime,
    end: NaiveDateTime,
    step: Duration,
}

impl Clock {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime, step: Duration) -> Result<Self, Error> {
        if step <= Duration::zero() {
            return Err(Error::InvalidClock(format!("step {} is not positive", CycleOffset::from(step))));
        }
        if end < start {
            return Err(Error::InvalidClock(format!("end {end} is before start {start}")));
        }
        if !CycleOffset::from(end - start).is_multiple_of(step) {
            return Err(Error::InvalidClock(format!(
                "end {end} is not a whole number of steps after start {start}"
            )));
        }
        Ok(Self { start, end, step })
    }

    #[inline]
    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    #[inline]
    pub fn end(&self) -> NaiveDateTime {
        self.end
    }

    #[inline]
    pub fn step(&self) -> Duration {
        self.step
    }

    /// Iterate through every cycle of this clock, in increasing order.
    pub fn cycles(&self) -> impl Iterator<Item = NaiveDateTime> + '_ {
        std::iter::successors(Some(self.start), move |t| t.checked_add_signed(self.step))
            .take_while(move |t| *t <= self.end)
    }

    /// True if `t` lies within the clock bounds and on a step boundary.
    pub fn is_cycle(&self, t: NaiveDateTime) -> bool {
        t >= self.start && t <= self.end && CycleOffset::from(t - self.start).is_multiple_of(self.step)
    }

    /// Offset of `cycle` from the first cycle of the clock.
    pub fn offset_of(&self, cycle: NaiveDateTime) -> Result<CycleOffset, Error> {
        if !self.is_cycle(cycle) {
            return Err(Error::CycleNotOnClock(cycle));
        }
        Ok(CycleOffset::from(cycle - self.start))
    }

    /// Cycle time at `offset` from the first cycle of the clock.
    pub fn cycle_at(&self, offset: CycleOffset) -> Result<NaiveDateTime, Error> {
        self.start
            .checked_add_signed(offset.duration())
            .ok_or(Error::OffsetOutOfRange {
                cycle: self.start,
                offset,
            })
    }

    /// Fail if `dt` does not land on a step boundary.
    pub fn check_offset(&self, dt: CycleOffset) -> Result<(), Error> {
        if dt.is_multiple_of(self.step) {
            Ok(())
        } else {
            Err(Error::OffsetNotOnClock {
                offset: dt,
                step: self.step.into(),
            })
        }
    }

    /// True if the cycle `dt` away from `now` exists.
    /// A time past the calendar's range is never on the clock.
    pub fn contains(&self, now: NaiveDateTime, dt: CycleOffset) -> Result<bool, Error> {
        self.check_offset(dt)?;
        Ok(match now.checked_add_signed(dt.duration()) {
            Some(then) => then >= self.start && then <= self.end,
            None => false,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::NaiveDate;

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2017, 8, day)
            .and_then(|d| d.and_hms_opt(hour, 0, 0))
            .unwrap()
    }

    fn clock() -> Clock {
        Clock::new(at(15, 0), at(16, 0), Duration::hours(6)).unwrap()
    }

    #[test]
    fn test_cycles() {
        let cycles: Vec<_> = clock().cycles().collect();
        assert_eq!(cycles, vec![at(15, 0), at(15, 6), at(15, 12), at(15, 18), at(16, 0)]);
    }

    #[test]
    fn test_contains() -> Result<(), Error> {
        let clock = clock();
        assert!(!clock.contains(at(15, 0), CycleOffset::hours(-6))?);
        assert!(clock.contains(at(15, 6), CycleOffset::hours(-6))?);
        assert!(!clock.contains(at(16, 0), CycleOffset::hours(6))?);
        let err = clock.contains(at(15, 6), CycleOffset::hours(-3)).unwrap_err();
        assert!(matches!(err, Error::OffsetNotOnClock { .. }));
        Ok(())
    }

    #[test]
    fn test_invalid_clocks() {
        assert!(Clock::new(at(15, 0), at(16, 0), Duration::zero()).is_err());
        assert!(Clock::new(at(16, 0), at(15, 0), Duration::hours(6)).is_err());
        assert!(Clock::new(at(15, 0), at(15, 5), Duration::hours(6)).is_err());
    }

    #[test]
    fn test_offset_of() {
        let clock = clock();
        assert_eq!(clock.offset_of(at(15, 12)).unwrap(), CycleOffset::hours(12));
        assert!(clock.offset_of(at(15, 13)).is_err());
        assert_eq!(clock.cycle_at(CycleOffset::hours(18)).unwrap(), at(15, 18));
    }

    #[test]
    fn test_past_calendar() -> Result<(), Error> {
        let clock = clock();
        let far = CycleOffset::hours(3_000_000_000);
        assert!(!clock.contains(at(15, 6), far)?);
        assert!(!clock.contains(at(15, 6), -far)?);
        assert!(matches!(clock.cycle_at(far), Err(Error::OffsetOutOfRange { .. })));
        Ok(())
    }
}
