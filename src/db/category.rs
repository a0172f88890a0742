//! Category database queries.
use rusqlite::{Connection, OptionalExtension, Row};
use tracing::debug;

use super::error::StoreResult;
use crate::color::DEFAULT_COLOR;
use crate::types::{Category, CategoryId};

const CATEGORY_COLUMNS: &str = "id, name, COALESCE(color, '#6366f1'), created_at";

pub fn create_category(name: &str, color: Option<&str>, conn: &Connection) -> StoreResult<CategoryId> {
    conn.execute(
        "INSERT INTO categories (name, color) VALUES (?1, ?2)",
        (name, color.unwrap_or(DEFAULT_COLOR)),
    )?;
    let category_id = conn.last_insert_rowid() as CategoryId;
    debug!(category_id, "created category");
    Ok(category_id)
}

pub fn query_categories(conn: &Connection) -> StoreResult<Vec<Category>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {CATEGORY_COLUMNS} FROM categories ORDER BY name ASC, id ASC"
    ))?;
    let rows = stmt.query_map([], map_category_row)?;
    let mut categories = Vec::new();
    for row in rows {
        categories.push(row?);
    }
    Ok(categories)
}

pub fn query_category_by_id(id: CategoryId, conn: &Connection) -> StoreResult<Option<Category>> {
    let category = conn
        .query_row(
            &format!("SELECT {CATEGORY_COLUMNS} FROM categories WHERE id = ?1"),
            [id],
            map_category_row,
        )
        .optional()?;
    Ok(category)
}

pub fn update_category(id: CategoryId, name: &str, color: &str, conn: &Connection) -> StoreResult<()> {
    let changed = conn.execute(
        "UPDATE categories SET name = ?1, color = ?2 WHERE id = ?3",
        (name, color, id),
    )?;
    debug!(category_id = id, changed, "updated category");
    Ok(())
}

/// Deletes a category. Entries pointing at it become uncategorized; they are never removed.
pub fn delete_category(id: CategoryId, conn: &Connection) -> StoreResult<()> {
    let tx = conn.unchecked_transaction()?;
    let detached = tx.execute(
        "UPDATE entries SET category_id = NULL WHERE category_id = ?1",
        [id],
    )?;
    tx.execute("DELETE FROM categories WHERE id = ?1", [id])?;
    tx.commit()?;
    debug!(category_id = id, detached, "deleted category");
    Ok(())
}

fn map_category_row(row: &Row<'_>) -> rusqlite::Result<Category> {
    Ok(Category {
        id: row.get(0)?,
        name: row.get(1)?,
        color: row.get(2)?,
        created_at: row.get(3)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{Store, create_entry, query_entry_by_id};

    #[test]
    fn lists_categories_by_name() {
        let store = Store::open_in_memory().expect("store");
        let conn = store.conn();
        create_category("Work", Some("#ff5733"), conn).expect("work");
        create_category("Errands", None, conn).expect("errands");
        create_category("Work", None, conn).expect("duplicate names are allowed");

        let categories = query_categories(conn).expect("categories");
        let names: Vec<&str> = categories.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["Errands", "Work", "Work"]);
        assert_eq!(categories[0].color, DEFAULT_COLOR);
        assert_eq!(categories[1].color, "#ff5733");
    }

    #[test]
    fn update_changes_name_and_color() {
        let store = Store::open_in_memory().expect("store");
        let conn = store.conn();
        let id = create_category("Work", None, conn).expect("create");

        update_category(id, "Client work", "#00ff00", conn).expect("update");

        let category = query_category_by_id(id, conn).expect("query").expect("present");
        assert_eq!(category.name, "Client work");
        assert_eq!(category.color, "#00ff00");
    }

    #[test]
    fn update_of_missing_category_is_silent() {
        let store = Store::open_in_memory().expect("store");
        update_category(42, "Nope", DEFAULT_COLOR, store.conn()).expect("no error");
        assert!(query_category_by_id(42, store.conn()).expect("query").is_none());
    }

    #[test]
    fn delete_detaches_entries_instead_of_removing_them() {
        let store = Store::open_in_memory().expect("store");
        let conn = store.conn();
        let category = create_category("Work", None, conn).expect("category");
        let entry = create_entry("Report", Some(category), conn).expect("entry");

        delete_category(category, conn).expect("delete");

        let entry = query_entry_by_id(entry, conn).expect("query").expect("entry survives");
        assert_eq!(entry.category_id, None);
        assert_eq!(entry.category_name, None);
        assert!(query_categories(conn).expect("categories").is_empty());
    }
}
