//! Database module with category, entry, time record and aggregate queries plus migrations.
mod aggregate;
mod category;
mod entry;
mod error;
mod migrations;
mod time_record;

use std::path::{Path, PathBuf};

use rusqlite::Connection;
use tracing::info;

pub use aggregate::{query_entry_totals, total_minutes_for_entries};
pub use category::{
    create_category, delete_category, query_categories, query_category_by_id, update_category,
};
pub use entry::{
    SEARCH_LIMIT, assign_category, create_entry, delete_entries, delete_entry, query_entries,
    query_entry_by_id, query_entry_by_title, search_entries, update_entry,
};
pub use error::{StoreError, StoreResult};
pub use time_record::{
    DEFAULT_RECENT_LIMIT, create_time_record, delete_time_record, query_recent_time_records,
    query_time_record_by_id, query_time_records_by_entry, update_time_record,
};

/// Handle to the local database. Opened once by the caller and passed to every query.
pub struct Store {
    conn: Connection,
}

impl Store {
    /// Opens (or creates) the SQLite database and runs migrations.
    pub fn open(path: &Path) -> StoreResult<Self> {
        let conn = Connection::open(path).map_err(|source| StoreError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), "opened database");
        Self::prepare(conn)
    }

    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory().map_err(|source| StoreError::Open {
            path: PathBuf::from(":memory:"),
            source,
        })?;
        Self::prepare(conn)
    }

    fn prepare(conn: Connection) -> StoreResult<Self> {
        // Time records rely on ON DELETE CASCADE, which SQLite only honors with this pragma.
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        migrations::run_migrations(&conn)?;
        Ok(Self { conn })
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    pub fn close(self) -> StoreResult<()> {
        self.conn.close().map_err(|(_, err)| StoreError::from(err))
    }
}

/// Returns the default database path inside the user's data directory.
/// Falls back to `./timeloop.db` when no data dir is found.
pub fn default_db_path() -> PathBuf {
    if let Some(data_dir) = dirs::data_local_dir() {
        let app_dir = data_dir.join("timeloop");
        std::fs::create_dir_all(&app_dir).ok();
        app_dir.join("timeloop.db")
    } else {
        PathBuf::from("timeloop.db")
    }
}
