use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, Row};
use tracing::debug;

use super::error::StoreResult;
use crate::types::{EntryId, RecentTimeRecord, TimeRecord, TimeRecordId};

pub const DEFAULT_RECENT_LIMIT: u32 = 50;

const RECORD_COLUMNS: &str = "t.id, t.entry_id, t.duration, t.date, t.note, t.created_at";

/// Logs `duration` minutes against an entry. Callers validate `duration > 0`.
pub fn create_time_record(
    entry_id: EntryId,
    duration: u32,
    date: NaiveDate,
    note: Option<&str>,
    conn: &Connection,
) -> StoreResult<TimeRecordId> {
    conn.execute(
        "INSERT INTO time_entries (entry_id, duration, date, note) VALUES (?1, ?2, ?3, ?4)",
        rusqlite::params![entry_id, duration, date, note],
    )?;
    let record_id = conn.last_insert_rowid() as TimeRecordId;
    debug!(record_id, entry_id, duration, %date, "created time record");
    Ok(record_id)
}

pub fn query_time_records_by_entry(entry_id: EntryId, conn: &Connection) -> StoreResult<Vec<TimeRecord>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {RECORD_COLUMNS}
        FROM time_entries t
        WHERE t.entry_id = ?1
        ORDER BY t.date DESC, t.created_at DESC, t.id DESC"
    ))?;
    let rows = stmt.query_map([entry_id], map_record_row)?;
    let mut records = Vec::new();
    for row in rows {
        records.push(row?);
    }
    Ok(records)
}

pub fn query_time_record_by_id(id: TimeRecordId, conn: &Connection) -> StoreResult<Option<TimeRecord>> {
    let record = conn
        .query_row(
            &format!("SELECT {RECORD_COLUMNS} FROM time_entries t WHERE t.id = ?1"),
            [id],
            map_record_row,
        )
        .optional()?;
    Ok(record)
}

/// Newest records across all entries, for the activity feed.
pub fn query_recent_time_records(
    limit: u32,
    offset: u32,
    conn: &Connection,
) -> StoreResult<Vec<RecentTimeRecord>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {RECORD_COLUMNS}, e.title, c.name, c.color
        FROM time_entries t
        JOIN entries e ON e.id = t.entry_id
        LEFT JOIN categories c ON c.id = e.category_id
        ORDER BY t.date DESC, t.created_at DESC, t.id DESC
        LIMIT ?1 OFFSET ?2"
    ))?;
    let rows = stmt.query_map((limit, offset), |row| {
        Ok(RecentTimeRecord {
            record: map_record_row(row)?,
            entry_title: row.get(6)?,
            category_name: row.get(7)?,
            category_color: row.get(8)?,
        })
    })?;
    let mut records = Vec::new();
    for row in rows {
        records.push(row?);
    }
    Ok(records)
}

pub fn update_time_record(
    id: TimeRecordId,
    duration: u32,
    date: NaiveDate,
    note: Option<&str>,
    conn: &Connection,
) -> StoreResult<()> {
    let changed = conn.execute(
        "UPDATE time_entries SET duration = ?1, date = ?2, note = ?3 WHERE id = ?4",
        rusqlite::params![duration, date, note, id],
    )?;
    debug!(record_id = id, changed, "updated time record");
    Ok(())
}

pub fn delete_time_record(id: TimeRecordId, conn: &Connection) -> StoreResult<()> {
    let changed = conn.execute("DELETE FROM time_entries WHERE id = ?1", [id])?;
    debug!(record_id = id, changed, "deleted time record");
    Ok(())
}

fn map_record_row(row: &Row<'_>) -> rusqlite::Result<TimeRecord> {
    Ok(TimeRecord {
        id: row.get(0)?,
        entry_id: row.get(1)?,
        duration: row.get(2)?,
        date: row.get(3)?,
        note: row.get(4)?,
        created_at: row.get(5)?,
    })
}
