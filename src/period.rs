use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate, Utc};
use serde::Serialize;

/// Month in which the first semester of an academic session begins.
const SESSION_START_MONTH: u32 = 8;

/// Offer period of a course: an academic year and a semester index.
///
/// Ordering is lexicographic on `(year, sem)`, so `Period` comparisons answer
/// "does this period come before that one" directly.
#[derive(Serialize, Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Period {
    pub year: i32,
    /// Semester index, always 1 or 2.
    pub sem: i32,
}

impl Period {
    pub const fn new(year: i32, sem: i32) -> Self {
        Period { year, sem }
    }

    /// The period a given calendar date falls in.
    ///
    /// The session starts in August: August through December belong to
    /// semester 1 of that year, January through July to semester 2 of the
    /// session that started the year before.
    pub fn for_date(date: NaiveDate) -> Self {
        if date.month() >= SESSION_START_MONTH {
            Period::new(date.year(), 1)
        } else {
            Period::new(date.year() - 1, 2)
        }
    }

    /// The period the wall clock is currently in.
    pub fn current() -> Self {
        Self::for_date(Utc::now().date_naive())
    }

    /// The period immediately after this one.
    pub fn next(self) -> Self {
        if self.sem == 1 {
            Period::new(self.year, 2)
        } else {
            Period::new(self.year + 1, 1)
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.year, self.sem)
    }
}

impl FromStr for Period {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (year, sem) = s
            .split_once('-')
            .ok_or_else(|| format!("expected YEAR-SEM, got {s:?}"))?;
        let year = year.parse().map_err(|e| format!("bad year: {e}"))?;
        let sem = sem.parse().map_err(|e| format!("bad semester: {e}"))?;
        if !(sem == 1 || sem == 2) {
            return Err(format!("semester must be 1 or 2, got {sem}"));
        }
        Ok(Period::new(year, sem))
    }
}

/// One entry in the archive listing.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub stamp: String,
    pub link: String,
}

impl From<Period> for ArchiveEntry {
    fn from(period: Period) -> Self {
        ArchiveEntry {
            stamp: period.to_string(),
            link: format!("/archives/{}/{}", period.year, period.sem),
        }
    }
}

/// Every period strictly between `start` and `end`, ascending.
///
/// `end` is the current period and is never listed; `start` marks where the
/// catalog begins and is excluded as well.
pub fn archives_between(start: Period, end: Period) -> Vec<ArchiveEntry> {
    let mut periods = Vec::new();
    let mut period = start.next();
    while period < end {
        periods.push(ArchiveEntry::from(period));
        period = period.next();
    }
    periods
}
