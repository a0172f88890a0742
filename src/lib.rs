//! Local time tracking: entries, logged minutes, categories and period totals
//! over an SQLite store.

pub mod cli;
pub mod color;
pub mod config;
pub mod db;
pub mod duration;
pub mod logging;
pub mod period;
pub mod types;
