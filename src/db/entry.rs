//! Entry database queries.
use rusqlite::{Connection, OptionalExtension, Row};
use tracing::{debug, info};

use super::error::StoreResult;
use crate::types::{CategoryId, Entry, EntryId, EntryQuery};

/// Upper bound on title search results.
pub const SEARCH_LIMIT: u32 = 10;

pub(super) const ENTRY_SELECT: &str = "SELECT e.id, e.title, e.category_id, c.name, c.color, e.created_at
    FROM entries e
    LEFT JOIN categories c ON c.id = e.category_id";

pub fn create_entry(title: &str, category_id: Option<CategoryId>, conn: &Connection) -> StoreResult<EntryId> {
    conn.execute(
        "INSERT INTO entries (title, category_id) VALUES (?1, ?2)",
        (title, category_id),
    )?;
    let entry_id = conn.last_insert_rowid() as EntryId;
    debug!(entry_id, ?category_id, "created entry");
    Ok(entry_id)
}

pub fn query_entries(query: EntryQuery, conn: &Connection) -> StoreResult<Vec<Entry>> {
    match query {
        EntryQuery::All => {
            let mut stmt = conn.prepare(&format!("{ENTRY_SELECT} ORDER BY e.title ASC, e.id ASC"))?;
            let rows = stmt.query_map([], map_entry_row)?;
            collect_entries(rows)
        }
        EntryQuery::InWindow(window) => {
            let mut stmt = conn.prepare(&format!(
                "{ENTRY_SELECT}
                WHERE EXISTS (
                    SELECT 1 FROM time_entries t
                    WHERE t.entry_id = e.id AND t.date >= ?1 AND t.date <= ?2
                )
                ORDER BY e.title ASC, e.id ASC"
            ))?;
            let rows = stmt.query_map((window.start, window.end), map_entry_row)?;
            collect_entries(rows)
        }
    }
}

/// Case-insensitive substring search on titles, used to pick an existing entry
/// before creating a new one.
pub fn search_entries(needle: &str, conn: &Connection) -> StoreResult<Vec<Entry>> {
    let mut stmt = conn.prepare(&format!(
        "{ENTRY_SELECT}
        WHERE e.title LIKE ?1 ESCAPE '\\'
        ORDER BY e.title ASC, e.id ASC
        LIMIT ?2"
    ))?;
    let rows = stmt.query_map((like_pattern(needle), SEARCH_LIMIT), map_entry_row)?;
    collect_entries(rows)
}

pub fn query_entry_by_id(id: EntryId, conn: &Connection) -> StoreResult<Option<Entry>> {
    let entry = conn
        .query_row(&format!("{ENTRY_SELECT} WHERE e.id = ?1"), [id], map_entry_row)
        .optional()?;
    Ok(entry)
}

/// Looks up an entry whose title equals `title`, ignoring ASCII case. The oldest
/// entry wins when several share a title.
pub fn query_entry_by_title(title: &str, conn: &Connection) -> StoreResult<Option<Entry>> {
    let entry = conn
        .query_row(
            &format!("{ENTRY_SELECT} WHERE e.title = ?1 COLLATE NOCASE ORDER BY e.id ASC LIMIT 1"),
            [title],
            map_entry_row,
        )
        .optional()?;
    Ok(entry)
}

pub fn update_entry(
    id: EntryId,
    title: &str,
    category_id: Option<CategoryId>,
    conn: &Connection,
) -> StoreResult<()> {
    let changed = conn.execute(
        "UPDATE entries SET title = ?1, category_id = ?2 WHERE id = ?3",
        (title, category_id, id),
    )?;
    debug!(entry_id = id, changed, "updated entry");
    Ok(())
}

/// Deletes an entry; its time records are removed by the schema's cascade.
pub fn delete_entry(id: EntryId, conn: &Connection) -> StoreResult<()> {
    let changed = conn.execute("DELETE FROM entries WHERE id = ?1", [id])?;
    debug!(entry_id = id, changed, "deleted entry");
    Ok(())
}

/// Sets (or clears) the category of every listed entry. Either all rows change or none do.
pub fn assign_category(
    ids: &[EntryId],
    category_id: Option<CategoryId>,
    conn: &Connection,
) -> StoreResult<()> {
    if ids.is_empty() {
        return Ok(());
    }
    let tx = conn.unchecked_transaction()?;
    {
        let mut stmt = tx.prepare("UPDATE entries SET category_id = ?1 WHERE id = ?2")?;
        for id in ids {
            stmt.execute((category_id, id))?;
        }
    }
    tx.commit()?;
    info!(count = ids.len(), ?category_id, "assigned category to entries");
    Ok(())
}

/// Deletes every listed entry (and their time records). Either all go or none do.
pub fn delete_entries(ids: &[EntryId], conn: &Connection) -> StoreResult<()> {
    if ids.is_empty() {
        return Ok(());
    }
    let tx = conn.unchecked_transaction()?;
    {
        let mut stmt = tx.prepare("DELETE FROM entries WHERE id = ?1")?;
        for id in ids {
            stmt.execute([id])?;
        }
    }
    tx.commit()?;
    info!(count = ids.len(), "deleted entries");
    Ok(())
}

/// Builds an unanchored LIKE pattern, escaping the needle's own wildcards.
pub(super) fn like_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

pub(super) fn map_entry_row(row: &Row<'_>) -> rusqlite::Result<Entry> {
    Ok(Entry {
        id: row.get(0)?,
        title: row.get(1)?,
        category_id: row.get(2)?,
        category_name: row.get(3)?,
        category_color: row.get(4)?,
        created_at: row.get(5)?,
    })
}

fn collect_entries(
    rows: impl Iterator<Item = rusqlite::Result<Entry>>,
) -> StoreResult<Vec<Entry>> {
    let mut entries = Vec::new();
    for row in rows {
        entries.push(row?);
    }
    Ok(entries)
}
