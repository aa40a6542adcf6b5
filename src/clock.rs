//! Source of "today" for every date-dependent rule (registration dates,
//! overdue checks, reservation expiry, date of birth and publication year
//! bounds).

use std::fmt;

use chrono::{Datelike, Local, NaiveDate, NaiveDateTime, NaiveTime};

pub trait Clock: fmt::Debug {
    fn today(&self) -> NaiveDate;

    fn now(&self) -> NaiveDateTime;

    fn current_year(&self) -> i32 {
        self.today().year()
    }
}

/// Wall clock in the local time zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }

    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// A clock pinned to one day, noon. Tests and demo data use it so overdue
/// and expiry rules are reproducible.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    today: NaiveDate,
}

impl FixedClock {
    #[must_use]
    pub fn new(today: NaiveDate) -> Self {
        Self { today }
    }
}

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.today
    }

    fn now(&self) -> NaiveDateTime {
        self.today.and_time(NaiveTime::MIN) + chrono::Duration::hours(12)
    }
}
