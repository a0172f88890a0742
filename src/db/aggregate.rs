//! Per-entry totals over a date window.
//!
//! Both listing variants share one grouped query; the only difference is whether
//! entries without records in the window survive the `HAVING` clause. Window
//! bounds are compared as ISO `YYYY-MM-DD` text and are inclusive on both ends.

use rusqlite::{Connection, ToSql};
use tracing::debug;

use super::entry::{like_pattern, map_entry_row};
use super::error::StoreResult;
use crate::period::DateWindow;
use crate::types::{EntryId, EntryTotals, TotalsQuery};

pub fn query_entry_totals(query: &TotalsQuery, conn: &Connection) -> StoreResult<Vec<EntryTotals>> {
    let pattern = query.search.as_deref().map(like_pattern);
    let mut params: Vec<&dyn ToSql> = Vec::new();

    let mut join = String::from("LEFT JOIN time_entries t ON t.entry_id = e.id");
    if let Some(window) = &query.window {
        join.push_str(" AND t.date >= ? AND t.date <= ?");
        params.push(&window.start);
        params.push(&window.end);
    }

    let filter = match &pattern {
        Some(pattern) => {
            params.push(pattern);
            "WHERE e.title LIKE ? ESCAPE '\\'"
        }
        None => "",
    };

    let having = if query.include_empty {
        ""
    } else {
        "HAVING COUNT(t.id) > 0"
    };

    let sql = format!(
        "SELECT e.id, e.title, e.category_id, c.name, c.color, e.created_at,
            COALESCE(SUM(t.duration), 0), COUNT(t.id), MIN(t.date), MAX(t.date)
        FROM entries e
        LEFT JOIN categories c ON c.id = e.category_id
        {join}
        {filter}
        GROUP BY e.id
        {having}
        ORDER BY MAX(t.date) IS NULL, MAX(t.date) DESC, e.title ASC, e.id ASC"
    );

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params.as_slice(), |row| {
        Ok(EntryTotals {
            entry: map_entry_row(row)?,
            total_duration: row.get(6)?,
            entry_count: row.get(7)?,
            first_date: row.get(8)?,
            last_date: row.get(9)?,
        })
    })?;
    let mut totals = Vec::new();
    for row in rows {
        totals.push(row?);
    }
    debug!(
        rows = totals.len(),
        include_empty = query.include_empty,
        "computed entry totals"
    );
    Ok(totals)
}

/// Sums the minutes logged against any of `ids` inside `window` (all time when `None`).
///
/// An empty selection is `0` and never reaches the database.
pub fn total_minutes_for_entries(
    ids: &[EntryId],
    window: Option<DateWindow>,
    conn: &Connection,
) -> StoreResult<i64> {
    if ids.is_empty() {
        return Ok(0);
    }

    let placeholders = vec!["?"; ids.len()].join(", ");
    let mut sql = format!(
        "SELECT COALESCE(SUM(duration), 0) FROM time_entries WHERE entry_id IN ({placeholders})"
    );
    let mut params: Vec<&dyn ToSql> = ids.iter().map(|id| id as &dyn ToSql).collect();
    if let Some(window) = &window {
        sql.push_str(" AND date >= ? AND date <= ?");
        params.push(&window.start);
        params.push(&window.end);
    }

    let total = conn.query_row(&sql, params.as_slice(), |row| row.get(0))?;
    Ok(total)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::db::{Store, create_category, create_entry, create_time_record};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn may_week() -> DateWindow {
        DateWindow::new(date(2024, 5, 13), date(2024, 5, 19))
    }

    #[test]
    fn empty_entries_only_appear_when_requested() {
        let store = Store::open_in_memory().expect("store");
        let conn = store.conn();
        let active = create_entry("Active", None, conn).expect("active");
        let quiet = create_entry("Quiet", None, conn).expect("quiet");
        create_time_record(active, 30, date(2024, 5, 14), None, conn).expect("record");
        create_time_record(quiet, 30, date(2024, 4, 1), None, conn).expect("outside window");

        let excluding = query_entry_totals(
            &TotalsQuery {
                window: Some(may_week()),
                ..TotalsQuery::default()
            },
            conn,
        )
        .expect("excluding");
        assert_eq!(excluding.len(), 1);
        assert_eq!(excluding[0].entry.id, active);

        let including = query_entry_totals(
            &TotalsQuery {
                window: Some(may_week()),
                include_empty: true,
                ..TotalsQuery::default()
            },
            conn,
        )
        .expect("including");
        assert_eq!(including.len(), 2);
        let empty = &including[1];
        assert_eq!(empty.entry.id, quiet);
        assert_eq!(empty.total_duration, 0);
        assert_eq!(empty.entry_count, 0);
        assert_eq!(empty.first_date, None);
        assert_eq!(empty.last_date, None);
    }

    #[test]
    fn window_bounds_are_inclusive() {
        let store = Store::open_in_memory().expect("store");
        let conn = store.conn();
        let entry = create_entry("Edges", None, conn).expect("entry");
        create_time_record(entry, 10, date(2024, 5, 12), None, conn).expect("before");
        create_time_record(entry, 20, date(2024, 5, 13), None, conn).expect("start");
        create_time_record(entry, 40, date(2024, 5, 19), None, conn).expect("end");
        create_time_record(entry, 80, date(2024, 5, 20), None, conn).expect("after");

        let totals = query_entry_totals(
            &TotalsQuery {
                window: Some(may_week()),
                ..TotalsQuery::default()
            },
            conn,
        )
        .expect("totals");
        assert_eq!(totals.len(), 1);
        assert_eq!(totals[0].total_duration, 60);
        assert_eq!(totals[0].entry_count, 2);
        assert_eq!(totals[0].first_date, Some(date(2024, 5, 13)));
        assert_eq!(totals[0].last_date, Some(date(2024, 5, 19)));

        let selected = total_minutes_for_entries(&[entry], Some(may_week()), conn).expect("sum");
        assert_eq!(selected, 60);
    }

    #[test]
    fn ordering_puts_recent_activity_first_then_titles() {
        let store = Store::open_in_memory().expect("store");
        let conn = store.conn();
        let older = create_entry("Older", None, conn).expect("older");
        let newer = create_entry("Newer", None, conn).expect("newer");
        create_entry("Zeta", None, conn).expect("zeta");
        create_entry("Alpha", None, conn).expect("alpha");
        create_time_record(older, 15, date(2024, 5, 13), None, conn).expect("older record");
        create_time_record(newer, 15, date(2024, 5, 18), None, conn).expect("newer record");

        let titles: Vec<String> = query_entry_totals(
            &TotalsQuery {
                window: Some(may_week()),
                include_empty: true,
                ..TotalsQuery::default()
            },
            conn,
        )
        .expect("totals")
        .into_iter()
        .map(|t| t.entry.title)
        .collect();
        assert_eq!(titles, ["Newer", "Older", "Alpha", "Zeta"]);
    }

    #[test]
    fn totals_without_window_cover_all_time_and_honor_search() {
        let store = Store::open_in_memory().expect("store");
        let conn = store.conn();
        let work = create_category("Work", None, conn).expect("category");
        let report = create_entry("Quarterly report", Some(work), conn).expect("report");
        let gym = create_entry("Gym", None, conn).expect("gym");
        create_time_record(report, 90, date(2020, 1, 1), None, conn).expect("old");
        create_time_record(report, 30, date(2024, 5, 14), None, conn).expect("new");
        create_time_record(gym, 45, date(2024, 5, 14), None, conn).expect("gym");

        let totals = query_entry_totals(
            &TotalsQuery {
                search: Some("REPORT".to_string()),
                ..TotalsQuery::default()
            },
            conn,
        )
        .expect("totals");
        assert_eq!(totals.len(), 1);
        assert_eq!(totals[0].entry.category_name.as_deref(), Some("Work"));
        assert_eq!(totals[0].total_duration, 120);
        assert_eq!(totals[0].first_date, Some(date(2020, 1, 1)));
    }

    #[test]
    fn inverted_window_is_empty_not_an_error() {
        let store = Store::open_in_memory().expect("store");
        let conn = store.conn();
        let entry = create_entry("Entry", None, conn).expect("entry");
        create_time_record(entry, 30, date(2024, 5, 14), None, conn).expect("record");

        let inverted = DateWindow::new(date(2024, 5, 19), date(2024, 5, 13));
        let totals = query_entry_totals(
            &TotalsQuery {
                window: Some(inverted),
                ..TotalsQuery::default()
            },
            conn,
        )
        .expect("totals");
        assert!(totals.is_empty());
        assert_eq!(
            total_minutes_for_entries(&[entry], Some(inverted), conn).expect("sum"),
            0
        );
    }

    #[test]
    fn selection_total_spans_several_entries() {
        let store = Store::open_in_memory().expect("store");
        let conn = store.conn();
        let a = create_entry("A", None, conn).expect("a");
        let b = create_entry("B", None, conn).expect("b");
        let c = create_entry("C", None, conn).expect("c");
        create_time_record(a, 25, date(2024, 5, 14), None, conn).expect("a");
        create_time_record(b, 35, date(2024, 5, 15), None, conn).expect("b");
        create_time_record(c, 1000, date(2024, 5, 15), None, conn).expect("c");

        assert_eq!(
            total_minutes_for_entries(&[a, b], Some(may_week()), conn).expect("sum"),
            60
        );
        assert_eq!(total_minutes_for_entries(&[a, b, c], None, conn).expect("sum"), 1060);
        assert_eq!(total_minutes_for_entries(&[404], None, conn).expect("sum"), 0);
    }

    #[test]
    fn empty_selection_never_touches_the_database() {
        // No schema at all: any query against it would fail.
        let conn = Connection::open_in_memory().expect("open");
        assert_eq!(
            total_minutes_for_entries(&[], Some(may_week()), &conn).expect("short circuit"),
            0
        );
        assert!(total_minutes_for_entries(&[1], None, &conn).is_err());
    }
}
