use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use timeloop::{cli, config, config::ConfigStore, db, logging};
use tracing::{debug, warn};

fn main() -> Result<()> {
    let cli_opts = cli::Cli::parse();
    let config_store = ConfigStore::from_default_location();
    let config = config::load_or_default(config_store.as_ref())?;
    logging::enable_logging(&config.log_level, cli_opts.verbose);
    match &config_store {
        Some(store) => debug!(path = %store.path().display(), "loaded config"),
        None => warn!("no per-user config directory, using default settings"),
    }

    let db_path = cli_opts
        .db
        .clone()
        .or_else(|| config.db_path.clone())
        .unwrap_or_else(db::default_db_path);
    let store = db::Store::open(&db_path)
        .with_context(|| format!("unable to open {}", db_path.display()))?;

    let ctx = cli::Context {
        conn: store.conn(),
        config: &config,
        today: Local::now().date_naive(),
        json: cli_opts.json,
    };
    let result = cli::run(cli_opts.command, &ctx);

    finish(result, store.close())
}

/// A failed command reports its own error; a close failure only surfaces on success.
fn finish(result: Result<()>, closed: db::StoreResult<()>) -> Result<()> {
    if let Err(err) = closed {
        warn!(error = %err, "failed to close database");
        if result.is_ok() {
            return Err(err.into());
        }
    }
    result
}
