//! Source of the current time.
//!
//! Lock decisions depend on what "today" is, so the ledger never calls
//! `Utc::now()` directly; it asks a [`Clock`].

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, Offset, Utc};
use std::fmt;

/// Provides the current instant and the current calendar date.
pub trait Clock: Send + Sync + fmt::Debug {
    /// Current instant.
    fn now(&self) -> DateTime<Utc>;

    /// Current calendar date in the clock's local offset.
    fn today(&self) -> NaiveDate;
}

/// Wall clock with a fixed offset from UTC for the business day.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    offset: FixedOffset,
}

impl SystemClock {
    /// Creates a clock whose days are UTC days.
    #[must_use]
    pub fn utc() -> Self {
        Self {
            offset: Utc.fix(),
        }
    }

    /// Creates a clock whose days start at the given offset from UTC.
    ///
    /// Out-of-range offsets (beyond ±24h) fall back to UTC.
    #[must_use]
    pub fn with_offset_minutes(minutes: i32) -> Self {
        minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .map_or_else(Self::utc, |offset| Self { offset })
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::utc()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.offset).date_naive()
    }
}

/// Clock frozen at one instant. Used by tests and by replay tooling.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    now: DateTime<Utc>,
}

impl FixedClock {
    /// Freezes the clock at `now`.
    #[must_use]
    pub const fn at(now: DateTime<Utc>) -> Self {
        Self { now }
    }

    /// Freezes the clock at noon UTC on `date`.
    #[must_use]
    pub fn on(date: NaiveDate) -> Self {
        let noon = NaiveTime::from_hms_opt(12, 0, 0).unwrap_or_default();
        Self {
            now: date.and_time(noon).and_utc(),
        }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.now
    }

    fn today(&self) -> NaiveDate {
        self.now.date_naive()
    }
}
