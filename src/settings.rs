use anyhow::Result;
use chrono::NaiveDateTime;

use workflow::Clock;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Analysis window {start} to {end} is not within the clock, or not on a cycle")]
    InvalidWindow {
        start: NaiveDateTime,
        end: NaiveDateTime,
    },
    #[error("Final task name \"{0}\" must be a single non-empty name")]
    InvalidFinalTask(String),
}

/// Target job scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Rocoto,
    Ecflow,
}

/// Everything that controls one generation run,
/// with defaults applied.
#[derive(Debug, Clone)]
pub struct Settings {
    pub clock: Clock,
    /// First and last cycle to generate; cycles of the clock outside
    /// the window are only referred to, never generated.
    pub window: Option<(NaiveDateTime, NaiveDateTime)>,
    pub dialect: Dialect,
    /// strftime pattern for cycle names.
    pub cycle_format: String,
    /// Name of the synthetic top-level task that waits for the whole cycle.
    pub final_task: String,
    /// 0 logs warnings only; see [`Settings::log_level`].
    pub verbose: u8,
}

impl Settings {
    pub fn new(clock: Clock) -> Self {
        Self {
            clock,
            window: None,
            dialect: Dialect::Rocoto,
            cycle_format: "cyc_%Y%m%d_%H%M%S".to_owned(),
            final_task: "final".to_owned(),
            verbose: 0,
        }
    }

    pub fn with_window(mut self, start: NaiveDateTime, end: NaiveDateTime) -> Self {
        self.window = Some((start, end));
        self
    }

    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    pub fn with_cycle_format(mut self, format: &str) -> Self {
        self.cycle_format = format.to_owned();
        self
    }

    pub fn with_final_task(mut self, name: &str) -> Self {
        self.final_task = name.to_owned();
        self
    }

    pub fn with_verbose(mut self, verbose: u8) -> Self {
        self.verbose = verbose;
        self
    }

    /// Check the window lies on the clock.
    pub fn validate(&self) -> Result<(), Error> {
        if let Some((start, end)) = self.window {
            let clock = &self.clock;
            if start > end || !clock.is_cycle(start) || !clock.is_cycle(end) {
                return Err(Error::InvalidWindow { start, end });
            }
        }
        if self.final_task.is_empty() || self.final_task.contains('.') {
            return Err(Error::InvalidFinalTask(self.final_task.clone()));
        }
        Ok(())
    }

    /// Cycles to generate, earliest first.
    pub fn cycles(&self) -> Vec<NaiveDateTime> {
        match self.window {
            Some((start, end)) => self
                .clock
                .cycles()
                .filter(|&c| c >= start && c <= end)
                .collect(),
            None => self.clock.cycles().collect(),
        }
    }

    pub fn cycle_name(&self, cycle: NaiveDateTime) -> String {
        cycle.format(&self.cycle_format).to_string()
    }

    /// Each step of `verbose` adds info, debug and trace.
    pub fn log_level(&self) -> log::LevelFilter {
        match self.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn at(hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2017, 8, 15)
            .and_then(|d| d.and_hms_opt(hour, 0, 0))
            .unwrap()
    }

    fn settings() -> Settings {
        Settings::new(Clock::new(at(0), at(18), Duration::hours(6)).unwrap())
    }

    #[test]
    fn test_defaults() {
        let settings = settings();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.cycles().len(), 4);
        assert_eq!(settings.dialect, Dialect::Rocoto);
        assert_eq!(settings.cycle_name(at(6)), "cyc_20170815_060000");
    }

    #[test]
    fn test_window() {
        let settings = settings().with_window(at(6), at(12));
        assert!(settings.validate().is_ok());
        assert_eq!(settings.cycles(), vec![at(6), at(12)]);

        assert!(settings.clone().with_window(at(7), at(12)).validate().is_err());
        assert!(settings.clone().with_window(at(12), at(6)).validate().is_err());
        assert!(settings.with_final_task("a.b").validate().is_err());
    }

    #[test]
    fn test_log_level() {
        assert_eq!(settings().log_level(), log::LevelFilter::Warn);
        assert_eq!(settings().with_verbose(2).log_level(), log::LevelFilter::Debug);
        assert_eq!(settings().with_verbose(9).log_level(), log::LevelFilter::Trace);
    }
}
