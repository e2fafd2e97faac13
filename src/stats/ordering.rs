use std::cmp::Reverse;

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};

use crate::storage::entities::TimeEntry;

const COMPOSED_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"];

/// Moment an entry is sorted by, in milliseconds since epoch. In priority:
///  - `date` with `time_out` (or `time_in` if there is no `time_out`)
///  - `date` at midnight
///  - `created_at`
///  - epoch
///
/// Wall-clock values are taken in the local timezone.
pub fn resolve_entry_timestamp(entry: &TimeEntry) -> i64 {
    let time = if entry.time_out.is_empty() {
        &entry.time_in
    } else {
        &entry.time_out
    };

    if !entry.date.is_empty() && !time.is_empty() {
        if let Some(v) = parse_local(&format!("{}T{}", entry.date, time)) {
            return v;
        }
    }

    if !entry.date.is_empty() {
        if let Some(v) = parse_local(&format!("{}T00:00", entry.date)) {
            return v;
        }
    }

    parse_timestamp(&entry.created_at).unwrap_or(0)
}

fn parse_local(value: &str) -> Option<i64> {
    let naive = COMPOSED_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())?;
    local_millis(naive)
}

fn local_millis(naive: NaiveDateTime) -> Option<i64> {
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|v| v.timestamp_millis())
}

/// Parses a creation timestamp. Values with an offset are exact, values without one are treated as
/// local time and bare dates as UTC midnight.
fn parse_timestamp(value: &str) -> Option<i64> {
    if value.is_empty() {
        return None;
    }
    if let Ok(v) = DateTime::parse_from_rfc3339(value) {
        return Some(v.timestamp_millis());
    }
    if let Some(v) = parse_local(value) {
        return Some(v);
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .map(|v| v.and_time(NaiveTime::MIN).and_utc().timestamp_millis())
}

/// Sorts entries so that the most recent session comes first.
pub fn sort_entries_newest_first(mut entries: Vec<TimeEntry>) -> Vec<TimeEntry> {
    entries.sort_by_cached_key(|v| Reverse(resolve_entry_timestamp(v)));
    entries
}
