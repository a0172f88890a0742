//! CLI argument parsing and command handling.
use std::path::PathBuf;

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use rusqlite::Connection;
use serde::Serialize;

use crate::config::AppConfig;
use crate::db;
use crate::duration::{DurationInput, format_minutes, parse_clock};
use crate::period::{DateWindow, Period};
use crate::types::{
    Category, CategoryId, Entry, EntryId, EntryQuery, EntryTotals, TimeRecord, TimeRecordId,
    TotalsQuery,
};

#[derive(Parser, Debug)]
#[command(
    name = "timeloop",
    version,
    about = "Timeloop - A local time tracker for logging minutes against entries"
)]
pub struct Cli {
    /// Database file to use instead of the configured one.
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,
    /// Log store activity to stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,
    /// Print listings as JSON.
    #[arg(long, global = true)]
    pub json: bool,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    Category {
        #[command(subcommand)]
        command: CategoryCommand,
    },
    Entry {
        #[command(subcommand)]
        command: EntryCommand,
    },
    /// Log time against an entry, selected by exact title or, failing that, by id.
    Log {
        entry: String,
        #[command(flatten)]
        duration: DurationArgs,
        #[arg(short, long)]
        date: Option<NaiveDate>,
        #[arg(short, long)]
        note: Option<String>,
        /// Create the entry when no title matches.
        #[arg(long)]
        new: bool,
        /// Category for a newly created entry.
        #[arg(short, long)]
        category: Option<String>,
    },
    Record {
        #[command(subcommand)]
        command: RecordCommand,
    },
    /// Latest time records across all entries.
    Recent {
        #[arg(short, long)]
        limit: Option<u32>,
        #[arg(short, long, default_value_t = 0)]
        offset: u32,
    },
    /// Per-entry totals for a period.
    Totals {
        #[command(flatten)]
        period: PeriodArgs,
        /// Also list entries without time in the period.
        #[arg(short, long)]
        all_entries: bool,
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Total time of a hand-picked set of entries.
    Sum {
        ids: Vec<EntryId>,
        #[command(flatten)]
        period: PeriodArgs,
    },
}

#[derive(Subcommand, Debug)]
pub enum CategoryCommand {
    Add {
        name: String,
        color_opt: Option<String>,
    },
    List,
    Edit {
        id: CategoryId,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        color: Option<String>,
    },
    Delete {
        id: CategoryId,
    },
}

#[derive(Subcommand, Debug)]
pub enum EntryCommand {
    Add {
        title: String,
        #[arg(short, long)]
        category: Option<String>,
    },
    List {
        #[command(flatten)]
        period: PeriodArgs,
    },
    Search {
        query: String,
    },
    Show {
        id: EntryId,
    },
    Edit {
        id: EntryId,
        #[arg(long)]
        title: Option<String>,
        #[arg(short, long, conflicts_with = "no_category")]
        category: Option<String>,
        #[arg(long)]
        no_category: bool,
    },
    Delete {
        #[arg(required = true)]
        ids: Vec<EntryId>,
    },
    /// Move entries into a category, or out of any with `none`.
    Assign {
        category: String,
        #[arg(required = true)]
        ids: Vec<EntryId>,
    },
}

#[derive(Subcommand, Debug)]
pub enum RecordCommand {
    List {
        entry_id: EntryId,
    },
    Edit {
        id: TimeRecordId,
        #[command(flatten)]
        duration: DurationArgs,
        #[arg(short, long)]
        date: Option<NaiveDate>,
        #[arg(short, long, conflicts_with = "clear_note")]
        note: Option<String>,
        #[arg(long)]
        clear_note: bool,
    },
    Delete {
        id: TimeRecordId,
    },
}

#[derive(Args, Debug, Default)]
pub struct PeriodArgs {
    /// today, this-week, this-month, last-30-days or all
    #[arg(short, long)]
    pub period: Option<Period>,
    #[arg(long, requires = "to")]
    pub from: Option<NaiveDate>,
    #[arg(long, requires = "from")]
    pub to: Option<NaiveDate>,
}

impl PeriodArgs {
    /// An explicit `--from/--to` pair wins over the named period.
    pub fn window(&self, today: NaiveDate, default: Period) -> Option<DateWindow> {
        let period = match (self.from, self.to) {
            (Some(start), Some(end)) => Period::Custom { start, end },
            _ => self.period.unwrap_or(default),
        };
        period.resolve(today)
    }
}

#[derive(Args, Debug, Default)]
pub struct DurationArgs {
    #[arg(short, long, conflicts_with_all = ["hours", "start", "end"])]
    pub minutes: Option<i64>,
    /// Decimal hours, e.g. 1.5
    #[arg(short = 'H', long, conflicts_with_all = ["start", "end"])]
    pub hours: Option<f64>,
    /// Start clock time (HH:MM)
    #[arg(long = "from", requires = "end")]
    pub start: Option<String>,
    /// End clock time (HH:MM)
    #[arg(long = "to", requires = "start")]
    pub end: Option<String>,
}

impl DurationArgs {
    fn is_empty(&self) -> bool {
        self.minutes.is_none() && self.hours.is_none() && self.start.is_none()
    }

    /// Resolves to stored minutes; `None` when the input is missing or invalid.
    fn to_minutes(&self) -> Option<u32> {
        let input = if let Some(minutes) = self.minutes {
            DurationInput::Minutes(minutes)
        } else if let Some(hours) = self.hours {
            DurationInput::Hours(hours)
        } else {
            let start = parse_clock(self.start.as_deref()?)?;
            let end = parse_clock(self.end.as_deref()?)?;
            DurationInput::Range { start, end }
        };
        input.to_minutes()
    }
}

/// Everything a command needs: the open database plus user settings.
pub struct Context<'a> {
    pub conn: &'a Connection,
    pub config: &'a AppConfig,
    pub today: NaiveDate,
    pub json: bool,
}

/// Execute a CLI command. Without one, show this week's totals.
pub fn run(command: Option<Command>, ctx: &Context<'_>) -> Result<()> {
    let Some(command) = command else {
        return handle_totals(&PeriodArgs::default(), false, None, ctx);
    };
    match command {
        Command::Category { command } => run_category(command, ctx),
        Command::Entry { command } => run_entry(command, ctx),
        Command::Log {
            entry,
            duration,
            date,
            note,
            new,
            category,
        } => handle_log(&entry, &duration, date, note, new, category, ctx),
        Command::Record { command } => run_record(command, ctx),
        Command::Recent { limit, offset } => handle_recent(limit, offset, ctx),
        Command::Totals {
            period,
            all_entries,
            search,
        } => handle_totals(&period, all_entries, search, ctx),
        Command::Sum { ids, period } => handle_sum(&ids, &period, ctx),
    }
}

fn run_category(command: CategoryCommand, ctx: &Context<'_>) -> Result<()> {
    match command {
        CategoryCommand::Add { name, color_opt } => {
            let Some(name) = non_empty(&name) else {
                println!("Category name cannot be empty.");
                return Ok(());
            };
            let color = match color_opt {
                Some(c) => match crate::color::normalize(&c) {
                    Some(c) => c,
                    None => {
                        println!("Invalid color format. Please provide a hex code like #RRGGBB.");
                        return Ok(());
                    }
                },
                None => ctx.config.default_category_color.clone(),
            };
            let id = db::create_category(name, Some(&color), ctx.conn)?;
            println!("Created category '{name}' ({id}).");
            print_categories(ctx)
        }
        CategoryCommand::List => print_categories(ctx),
        CategoryCommand::Edit { id, name, color } => {
            let Some(current) = db::query_category_by_id(id, ctx.conn)? else {
                println!("Category {id} not found.");
                return Ok(());
            };
            let name = match name.as_deref() {
                Some(name) => match non_empty(name) {
                    Some(name) => name.to_string(),
                    None => {
                        println!("Category name cannot be empty.");
                        return Ok(());
                    }
                },
                None => current.name,
            };
            let color = match color.as_deref() {
                Some(c) => match crate::color::normalize(c) {
                    Some(c) => c,
                    None => {
                        println!("Invalid color format. Please provide a hex code like #RRGGBB.");
                        return Ok(());
                    }
                },
                None => current.color,
            };
            db::update_category(id, &name, &color, ctx.conn)?;
            print_categories(ctx)
        }
        CategoryCommand::Delete { id } => {
            db::delete_category(id, ctx.conn)?;
            print_categories(ctx)
        }
    }
}

fn run_entry(command: EntryCommand, ctx: &Context<'_>) -> Result<()> {
    match command {
        EntryCommand::Add { title, category } => {
            let Some(title) = non_empty(&title) else {
                println!("Entry title cannot be empty.");
                return Ok(());
            };
            let category_id = match category {
                Some(reference) => match resolve_category(&reference, ctx.conn)? {
                    Some(id) => Some(id),
                    None => {
                        println!("Category '{reference}' not found.");
                        return Ok(());
                    }
                },
                None => None,
            };
            let id = db::create_entry(title, category_id, ctx.conn)?;
            println!("Created entry '{title}' ({id}).");
            Ok(())
        }
        EntryCommand::List { period } => {
            let query = match period.window(ctx.today, Period::All) {
                Some(window) => EntryQuery::InWindow(window),
                None => EntryQuery::All,
            };
            let entries = db::query_entries(query, ctx.conn)?;
            print_entries(&entries, ctx)
        }
        EntryCommand::Search { query } => {
            let entries = db::search_entries(&query, ctx.conn)?;
            print_entries(&entries, ctx)
        }
        EntryCommand::Show { id } => {
            let Some(entry) = db::query_entry_by_id(id, ctx.conn)? else {
                println!("Entry {id} not found.");
                return Ok(());
            };
            let records = db::query_time_records_by_entry(id, ctx.conn)?;
            if ctx.json {
                return print_json(&EntryDetail {
                    entry: &entry,
                    records: &records,
                });
            }
            println!("{}", entry_line(&entry));
            print_records(&records);
            let total: i64 = records.iter().map(|r| i64::from(r.duration)).sum();
            println!("  total {}", format_minutes(total));
            Ok(())
        }
        EntryCommand::Edit {
            id,
            title,
            category,
            no_category,
        } => {
            let Some(current) = db::query_entry_by_id(id, ctx.conn)? else {
                println!("Entry {id} not found.");
                return Ok(());
            };
            let title = match title.as_deref() {
                Some(title) => match non_empty(title) {
                    Some(title) => title.to_string(),
                    None => {
                        println!("Entry title cannot be empty.");
                        return Ok(());
                    }
                },
                None => current.title,
            };
            let category_id = if no_category {
                None
            } else if let Some(reference) = category {
                match resolve_category(&reference, ctx.conn)? {
                    Some(id) => Some(id),
                    None => {
                        println!("Category '{reference}' not found.");
                        return Ok(());
                    }
                }
            } else {
                current.category_id
            };
            db::update_entry(id, &title, category_id, ctx.conn)?;
            if let Some(entry) = db::query_entry_by_id(id, ctx.conn)? {
                println!("{}", entry_line(&entry));
            }
            Ok(())
        }
        EntryCommand::Delete { ids } => {
            db::delete_entries(&ids, ctx.conn)?;
            println!("Deleted {} entries.", ids.len());
            Ok(())
        }
        EntryCommand::Assign { category, ids } => {
            let category_id = if category.eq_ignore_ascii_case("none") {
                None
            } else {
                match resolve_category(&category, ctx.conn)? {
                    Some(id) => Some(id),
                    None => {
                        println!("Category '{category}' not found.");
                        return Ok(());
                    }
                }
            };
            db::assign_category(&ids, category_id, ctx.conn)?;
            let entries = db::query_entries(EntryQuery::All, ctx.conn)?;
            let touched: Vec<Entry> = entries
                .into_iter()
                .filter(|entry| ids.contains(&entry.id))
                .collect();
            print_entries(&touched, ctx)
        }
    }
}

fn run_record(command: RecordCommand, ctx: &Context<'_>) -> Result<()> {
    match command {
        RecordCommand::List { entry_id } => {
            let records = db::query_time_records_by_entry(entry_id, ctx.conn)?;
            if ctx.json {
                return print_json(&records);
            }
            print_records(&records);
            Ok(())
        }
        RecordCommand::Edit {
            id,
            duration,
            date,
            note,
            clear_note,
        } => {
            let Some(current) = db::query_time_record_by_id(id, ctx.conn)? else {
                println!("Time record {id} not found.");
                return Ok(());
            };
            let minutes = if duration.is_empty() {
                current.duration
            } else {
                match duration.to_minutes() {
                    Some(minutes) => minutes,
                    None => {
                        println!("Duration must be a positive number of minutes.");
                        return Ok(());
                    }
                }
            };
            let note = if clear_note {
                None
            } else {
                note.or(current.note)
            };
            db::update_time_record(
                id,
                minutes,
                date.unwrap_or(current.date),
                note.as_deref(),
                ctx.conn,
            )?;
            print_records(&db::query_time_records_by_entry(current.entry_id, ctx.conn)?);
            Ok(())
        }
        RecordCommand::Delete { id } => {
            db::delete_time_record(id, ctx.conn)?;
            println!("Deleted time record {id}.");
            Ok(())
        }
    }
}

fn handle_log(
    entry: &str,
    duration: &DurationArgs,
    date: Option<NaiveDate>,
    note: Option<String>,
    create_missing: bool,
    category: Option<String>,
    ctx: &Context<'_>,
) -> Result<()> {
    let Some(minutes) = duration.to_minutes() else {
        println!("Duration must be a positive number of minutes (use --minutes, --hours or --from/--to).");
        return Ok(());
    };
    let Some(title) = non_empty(entry) else {
        println!("Entry title cannot be empty.");
        return Ok(());
    };

    let entry_id = match select_entry(title, ctx.conn)? {
        EntryMatch::Found(id) => id,
        EntryMatch::Missing(suggestions) if !create_missing => {
            println!("No entry named '{title}'. Pass --new to create it.");
            for suggestion in &suggestions {
                println!("  did you mean: {}", entry_line(suggestion));
            }
            return Ok(());
        }
        EntryMatch::Missing(_) => {
            let category_id = match category {
                Some(reference) => match resolve_category(&reference, ctx.conn)? {
                    Some(id) => Some(id),
                    None => {
                        println!("Category '{reference}' not found.");
                        return Ok(());
                    }
                },
                None => None,
            };
            let id = db::create_entry(title, category_id, ctx.conn)?;
            println!("Created entry '{title}' ({id}).");
            id
        }
    };

    let note = note.as_deref().and_then(non_empty);
    let date = date.unwrap_or(ctx.today);
    db::create_time_record(entry_id, minutes, date, note, ctx.conn)?;

    let day_total = db::total_minutes_for_entries(
        &[entry_id],
        Some(DateWindow::single_day(date)),
        ctx.conn,
    )?;
    let logged = format_minutes(i64::from(minutes));
    match Period::ThisWeek.resolve(ctx.today).filter(|week| week.contains(date)) {
        Some(week) => {
            let week_total = db::total_minutes_for_entries(&[entry_id], Some(week), ctx.conn)?;
            println!(
                "Logged {logged} on {date} (day total {}, week total {}).",
                format_minutes(day_total),
                format_minutes(week_total)
            );
        }
        None => println!("Logged {logged} on {date} (day total {}).", format_minutes(day_total)),
    }
    Ok(())
}

fn handle_recent(limit: Option<u32>, offset: u32, ctx: &Context<'_>) -> Result<()> {
    let limit = limit.unwrap_or(ctx.config.recent_limit);
    let records = db::query_recent_time_records(limit, offset, ctx.conn)?;
    if ctx.json {
        return print_json(&records);
    }
    if records.is_empty() {
        println!("No time logged yet.");
        return Ok(());
    }
    for recent in &records {
        let category = recent
            .category_name
            .as_deref()
            .map(|name| format!(" [{name}]"))
            .unwrap_or_default();
        println!(
            "{}  {:>7}  {}{}{}",
            recent.record.date,
            format_minutes(i64::from(recent.record.duration)),
            clamp_name(&recent.entry_title, 30).trim_end(),
            category,
            note_suffix(recent.record.note.as_deref()),
        );
    }
    Ok(())
}

fn handle_totals(
    period: &PeriodArgs,
    include_empty: bool,
    search: Option<String>,
    ctx: &Context<'_>,
) -> Result<()> {
    let window = period.window(ctx.today, Period::ThisWeek);
    let totals = db::query_entry_totals(
        &TotalsQuery {
            window,
            search,
            include_empty,
        },
        ctx.conn,
    )?;
    if ctx.json {
        return print_json(&TotalsReport {
            window,
            total: grand_total(&totals),
            entries: &totals,
        });
    }

    match window {
        Some(window) => println!("Totals for {window}"),
        None => println!("Totals for all time"),
    }
    if totals.is_empty() {
        println!("  No time logged in this period.");
        return Ok(());
    }
    let mut running = 0;
    for row in &totals {
        running += row.total_duration;
        let dates = match (row.first_date, row.last_date) {
            (Some(first), Some(last)) if first == last => first.to_string(),
            (Some(first), Some(last)) => format!("{first} .. {last}"),
            _ => "-".to_string(),
        };
        println!(
            "{:>5}  {}  {:>7}  {:>3}x  {:>8}  {}",
            row.entry.id,
            clamp_name(&row.entry.title, 28),
            format_minutes(row.total_duration),
            row.entry_count,
            format_minutes(running),
            dates,
        );
    }
    println!("  total {}", format_minutes(running));
    Ok(())
}

fn handle_sum(ids: &[EntryId], period: &PeriodArgs, ctx: &Context<'_>) -> Result<()> {
    let window = period.window(ctx.today, Period::ThisWeek);
    let total = db::total_minutes_for_entries(ids, window, ctx.conn)?;
    if ctx.json {
        return print_json(&SumReport { window, ids, total });
    }
    println!("{} across {} entries", format_minutes(total), ids.len());
    Ok(())
}

enum EntryMatch {
    Found(EntryId),
    Missing(Vec<Entry>),
}

/// Picks an entry by case-insensitive exact title, then by id; otherwise returns
/// the closest title matches as suggestions.
fn select_entry(reference: &str, conn: &Connection) -> Result<EntryMatch> {
    if let Some(entry) = db::query_entry_by_title(reference, conn)? {
        return Ok(EntryMatch::Found(entry.id));
    }
    if let Ok(id) = reference.parse::<EntryId>() {
        if db::query_entry_by_id(id, conn)?.is_some() {
            return Ok(EntryMatch::Found(id));
        }
    }
    Ok(EntryMatch::Missing(db::search_entries(reference, conn)?))
}

/// Resolves a category by id, then by case-insensitive name.
fn resolve_category(reference: &str, conn: &Connection) -> Result<Option<CategoryId>> {
    if let Ok(id) = reference.parse::<CategoryId>() {
        if let Some(category) = db::query_category_by_id(id, conn)? {
            return Ok(Some(category.id));
        }
    }
    let categories = db::query_categories(conn)?;
    Ok(categories
        .iter()
        .find(|category| category.name.eq_ignore_ascii_case(reference.trim()))
        .map(|category| category.id))
}

fn non_empty(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

#[derive(Serialize)]
struct EntryDetail<'a> {
    entry: &'a Entry,
    records: &'a [TimeRecord],
}

#[derive(Serialize)]
struct TotalsReport<'a> {
    window: Option<DateWindow>,
    total: i64,
    entries: &'a [EntryTotals],
}

#[derive(Serialize)]
struct SumReport<'a> {
    window: Option<DateWindow>,
    ids: &'a [EntryId],
    total: i64,
}

fn grand_total(totals: &[EntryTotals]) -> i64 {
    totals.iter().map(|row| row.total_duration).sum()
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_categories(ctx: &Context<'_>) -> Result<()> {
    let categories: Vec<Category> = db::query_categories(ctx.conn)?;
    if ctx.json {
        return print_json(&categories);
    }
    for category in &categories {
        println!("{:>5}  {}  {}", category.id, category.color, category.name);
    }
    Ok(())
}

fn print_entries(entries: &[Entry], ctx: &Context<'_>) -> Result<()> {
    if ctx.json {
        return print_json(entries);
    }
    if entries.is_empty() {
        println!("No entries.");
    }
    for entry in entries {
        println!("{}", entry_line(entry));
    }
    Ok(())
}

fn print_records(records: &[TimeRecord]) {
    for record in records {
        println!(
            "{:>5}  {}  {:>7}{}",
            record.id,
            record.date,
            format_minutes(i64::from(record.duration)),
            note_suffix(record.note.as_deref()),
        );
    }
}

fn entry_line(entry: &Entry) -> String {
    match &entry.category_name {
        Some(category) => format!("{:>5}  {} [{category}]", entry.id, entry.title),
        None => format!("{:>5}  {}", entry.id, entry.title),
    }
}

fn note_suffix(note: Option<&str>) -> String {
    note.map(|note| format!("  - {note}")).unwrap_or_default()
}

fn clamp_name(value: &str, width: usize) -> String {
    let value_len = value.chars().count();
    if value_len <= width {
        return format!("{value:<width$}", width = width);
    }
    let trimmed = value
        .chars()
        .take(width.saturating_sub(2))
        .collect::<String>();
    format!("{trimmed}..")
}
