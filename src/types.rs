use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::period::DateWindow;

pub type EntryId = u32;
pub type CategoryId = u32;
pub type TimeRecordId = u32;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub color: String,
    pub created_at: NaiveDateTime,
}

/// A named trackable activity, joined with its category's label when it has one.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Entry {
    pub id: EntryId,
    pub title: String,
    pub category_id: Option<CategoryId>,
    pub category_name: Option<String>,
    pub category_color: Option<String>,
    pub created_at: NaiveDateTime,
}

pub enum EntryQuery {
    All,
    InWindow(DateWindow),
}

/// One logged duration against an entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TimeRecord {
    pub id: TimeRecordId,
    pub entry_id: EntryId,
    pub duration: u32,
    pub date: NaiveDate,
    pub note: Option<String>,
    pub created_at: NaiveDateTime,
}

/// A time record as shown in the cross-entry "recent" listing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RecentTimeRecord {
    pub record: TimeRecord,
    pub entry_title: String,
    pub category_name: Option<String>,
    pub category_color: Option<String>,
}

/// Per-entry totals over a window. Never persisted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EntryTotals {
    pub entry: Entry,
    pub total_duration: i64,
    pub entry_count: u32,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
}

#[derive(Clone, Debug, Default)]
pub struct TotalsQuery {
    /// `None` aggregates over all time.
    pub window: Option<DateWindow>,
    pub search: Option<String>,
    /// Keep entries that have no records in the window (zero totals, no dates).
    pub include_empty: bool,
}
