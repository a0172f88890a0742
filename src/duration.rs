//! Duration input conversion and display formatting. Storage is always integer minutes.
use chrono::NaiveTime;

/// The ways a user may express how long they worked.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DurationInput {
    Minutes(i64),
    /// Decimal hours, rounded to the nearest minute.
    Hours(f64),
    /// Clock times on the same day; `end` must be after `start`.
    Range { start: NaiveTime, end: NaiveTime },
}

impl DurationInput {
    /// Converts the input to stored minutes, or `None` when the result would not
    /// be a positive number of minutes.
    pub fn to_minutes(self) -> Option<u32> {
        let minutes = match self {
            DurationInput::Minutes(minutes) => minutes,
            DurationInput::Hours(hours) => {
                if !hours.is_finite() {
                    return None;
                }
                (hours * 60.0).round() as i64
            }
            DurationInput::Range { start, end } => end.signed_duration_since(start).num_minutes(),
        };
        if minutes <= 0 {
            return None;
        }
        u32::try_from(minutes).ok()
    }
}

/// Parses a `HH:MM` clock time.
pub fn parse_clock(value: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M").ok()
}

/// Formats minutes as `1h30`, `45min` or `2h`.
pub fn format_minutes(minutes: i64) -> String {
    let minutes = minutes.max(0);
    let hours = minutes / 60;
    let rest = minutes % 60;
    match (hours, rest) {
        (0, rest) => format!("{rest}min"),
        (hours, 0) => format!("{hours}h"),
        (hours, rest) => format!("{hours}h{rest:02}"),
    }
}
