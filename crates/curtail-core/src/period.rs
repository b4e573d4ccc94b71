//! Calendar-month periods, the unit of aggregation and incremental update.
//!
//! A [`Period`] is a year-month pair rendered as `YYYY-MM`. Ordering is
//! chronological, which makes "most recent period" and "periods from X
//! through Y" trivial to express without string comparison tricks.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::error::CurtailError;

/// One calendar month, e.g. `2025-03`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Period {
    year: i32,
    month: u32,
}

impl Period {
    /// Create a period; fails when the month is outside 1..=12.
    pub fn new(year: i32, month: u32) -> Result<Self, CurtailError> {
        if !(1..=12).contains(&month) {
            return Err(CurtailError::Parse(format!(
                "month {month} out of range for period"
            )));
        }
        Ok(Period { year, month })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// The period a timestamp falls into.
    pub fn from_timestamp(ts: NaiveDateTime) -> Self {
        Period {
            year: ts.year(),
            month: ts.month(),
        }
    }

    /// The period containing a calendar date.
    pub fn from_date(date: NaiveDate) -> Self {
        Period {
            year: date.year(),
            month: date.month(),
        }
    }

    /// The next calendar month.
    pub fn succ(self) -> Self {
        if self.month == 12 {
            Period {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Period {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    /// The previous calendar month.
    pub fn pred(self) -> Self {
        if self.month == 1 {
            Period {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Period {
                year: self.year,
                month: self.month - 1,
            }
        }
    }

    /// All periods from `self` through `end`, inclusive. Empty when
    /// `end < self`.
    pub fn through(self, end: Period) -> Vec<Period> {
        let mut out = Vec::new();
        let mut cur = self;
        while cur <= end {
            out.push(cur);
            cur = cur.succ();
        }
        out
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for Period {
    type Err = CurtailError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        // Accept both the canonical `YYYY-MM` and the underscore form used in
        // upstream file names (`YYYY_MM`).
        let (year_str, month_str) = trimmed
            .split_once(['-', '_'])
            .ok_or_else(|| CurtailError::Parse(format!("invalid period '{trimmed}'")))?;
        let year: i32 = year_str
            .parse()
            .map_err(|_| CurtailError::Parse(format!("invalid period year in '{trimmed}'")))?;
        let month: u32 = month_str
            .parse()
            .map_err(|_| CurtailError::Parse(format!("invalid period month in '{trimmed}'")))?;
        Period::new(year, month)
    }
}

impl Serialize for Period {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Period {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}
