//! Named reporting periods and their resolution into inclusive date windows.
use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;

/// Inclusive calendar-date range `[start, end]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn single_day(date: NaiveDate) -> Self {
        Self::new(date, date)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

impl fmt::Display for DateWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} .. {}", self.start, self.end)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Period {
    Today,
    ThisWeek,
    ThisMonth,
    Last30Days,
    Custom { start: NaiveDate, end: NaiveDate },
    /// No date filter at all.
    All,
}

impl Period {
    /// Resolves the period against `today`. Returns `None` for [`Period::All`].
    ///
    /// Weeks start on Monday. Custom windows are passed through untouched, even
    /// when `start > end`; queries over such a window simply come back empty.
    pub fn resolve(self, today: NaiveDate) -> Option<DateWindow> {
        let start = match self {
            Period::Today => today,
            Period::ThisWeek => {
                today - Duration::days(i64::from(today.weekday().num_days_from_monday()))
            }
            Period::ThisMonth => today - Duration::days(i64::from(today.day0())),
            Period::Last30Days => today - Duration::days(30),
            Period::Custom { start, end } => return Some(DateWindow::new(start, end)),
            Period::All => return None,
        };
        Some(DateWindow::new(start, today))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownPeriod(pub String);

impl fmt::Display for UnknownPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown period '{}' (expected today, this-week, this-month, last-30-days or all)",
            self.0
        )
    }
}

impl std::error::Error for UnknownPeriod {}

impl FromStr for Period {
    type Err = UnknownPeriod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "today" => Ok(Period::Today),
            "this-week" | "week" => Ok(Period::ThisWeek),
            "this-month" | "month" => Ok(Period::ThisMonth),
            "last-30-days" | "30d" => Ok(Period::Last30Days),
            "all" => Ok(Period::All),
            other => Err(UnknownPeriod(other.to_string())),
        }
    }
}
