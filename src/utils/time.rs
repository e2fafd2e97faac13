use chrono::{Datelike, Days, NaiveDate};
use serde::Serialize;

/// Parses a wall-clock `HH:MM` value into minutes since midnight. Anything after the minutes
/// (`HH:MM:SS`) is ignored.
pub fn parse_time_of_day(value: &str) -> Option<u32> {
    let mut parts = value.split(':');
    let hours = parts.next()?.trim().parse::<u32>().ok()?;
    let minutes = parts.next()?.trim().parse::<u32>().ok()?;
    if hours > 23 || minutes > 59 {
        return None;
    }
    Some(hours * 60 + minutes)
}

/// A non-negative amount of worked time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkDuration {
    pub total_minutes: u32,
    pub hours: u32,
    pub minutes: u32,
}

impl WorkDuration {
    pub fn from_minutes(total_minutes: u32) -> Self {
        Self {
            total_minutes,
            hours: total_minutes / 60,
            minutes: total_minutes % 60,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.total_minutes == 0
    }
}

/// Time between `time_in` and `time_out`. A session that ends before it starts counts as zero,
/// and so does one with an unparseable bound.
pub fn calculate_duration(time_in: &str, time_out: &str) -> WorkDuration {
    match (parse_time_of_day(time_in), parse_time_of_day(time_out)) {
        (Some(start), Some(end)) => WorkDuration::from_minutes(end.saturating_sub(start)),
        _ => WorkDuration::default(),
    }
}

/// Parses a `YYYY-MM-DD` entry date. Days past the end of a month roll over into the next one, so
/// `2024-02-30` is read as `2024-03-01`.
pub fn parse_entry_date(value: &str) -> Option<NaiveDate> {
    let mut parts = value.split('-');
    let (Some(year), Some(month), Some(day), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return None;
    };

    let year = year.trim().parse::<i32>().ok()?;
    let month = month.trim().parse::<u32>().ok()?;
    let day = day.trim().parse::<u32>().ok()?;

    if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
        return None;
    }

    NaiveDate::from_ymd_opt(year, month, 1)?.checked_add_days(Days::new(u64::from(day - 1)))
}

/// Monday to Sunday week containing some date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekBounds {
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,
}

impl WeekBounds {
    /// `None` when the week would leave the supported calendar range.
    pub fn containing(date: NaiveDate) -> Option<Self> {
        // Sunday = 0 .. Saturday = 6, shifted so that weeks always start on Monday.
        let since_monday = (date.weekday().num_days_from_sunday() + 6) % 7;
        let week_start = date.checked_sub_days(Days::new(u64::from(since_monday)))?;
        Some(Self {
            week_start,
            week_end: week_start.checked_add_days(Days::new(6))?,
        })
    }
}

pub fn week_bounds(date: &str) -> Option<WeekBounds> {
    parse_entry_date(date).and_then(WeekBounds::containing)
}

/// This is the standard way of converting a date to a string in timesheet.
pub fn iso_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub fn format_duration(duration: WorkDuration) -> String {
    let mut parts = vec![];
    if duration.hours > 0 {
        parts.push(format!("{}h", duration.hours));
    }
    if duration.minutes > 0 {
        parts.push(format!("{}m", duration.minutes));
    }
    if parts.is_empty() {
        return "0m".into();
    }
    parts.join(" ")
}

pub fn format_week_range(week_start: &str, week_end: &str) -> String {
    match (parse_entry_date(week_start), parse_entry_date(week_end)) {
        (Some(start), Some(end)) => format!(
            "{} – {}, {}",
            start.format("%b %-d"),
            end.format("%b %-d"),
            end.year()
        ),
        _ => format!("{week_start} - {week_end}"),
    }
}

pub fn format_date(date: &str) -> String {
    parse_entry_date(date)
        .map(|v| v.format("%a, %B %-d, %Y").to_string())
        .unwrap_or_else(|| date.to_string())
}

pub fn format_time_range(time_in: &str, time_out: &str) -> String {
    let or_placeholder = |v: &str| if v.is_empty() { "--:--".to_string() } else { v.to_string() };
    format!("{} - {}", or_placeholder(time_in), or_placeholder(time_out))
}
