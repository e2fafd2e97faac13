//! Derived statistics. Everything here is recomputed from the full entry list and rate mapping on
//! every read, nothing is persisted.

pub mod ordering;

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::NaiveDate;
use serde::Serialize;

use crate::{
    storage::entities::{CourseRates, TimeEntry},
    utils::time::{calculate_duration, week_bounds, WeekBounds},
};

pub const DEFAULT_HOURLY_RATE: f64 = 18.;

/// Weekly benchmark used to compute pending time.
pub const WEEKLY_TARGET_MINUTES: u32 = 20 * 60;

/// Rates have to be finite and non-negative to be stored or used.
pub fn is_valid_rate(rate: f64) -> bool {
    rate.is_finite() && rate >= 0.
}

/// Rate for a course. Unknown courses and broken rates (negative, NaN, infinite) are paid the
/// default rate.
pub fn hourly_rate(course_name: &str, rates: &CourseRates) -> f64 {
    let course_name = course_name.trim();
    if course_name.is_empty() {
        return DEFAULT_HOURLY_RATE;
    }

    match rates.get(course_name) {
        Some(&rate) if is_valid_rate(rate) => rate,
        _ => DEFAULT_HOURLY_RATE,
    }
}

fn entry_minutes_and_earnings(entry: &TimeEntry, rates: &CourseRates) -> (u32, f64) {
    let minutes = calculate_duration(&entry.time_in, &entry.time_out).total_minutes;
    let earnings = minutes as f64 / 60. * hourly_rate(&entry.course_name, rates);
    (minutes, earnings)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyStats {
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,
    pub total_minutes: u32,
    pub session_count: usize,
    pub pending_minutes: u32,
    pub projected_earnings: f64,
}

#[derive(Default)]
struct WeekAccumulator {
    total_minutes: u32,
    session_count: usize,
    earnings: f64,
}

/// Groups entries into Monday to Sunday weeks, newest week first. Entries without a usable date
/// don't belong to any week and are skipped.
pub fn weekly_stats(entries: &[TimeEntry], rates: &CourseRates) -> Vec<WeeklyStats> {
    let mut weeks = BTreeMap::<WeekBounds, WeekAccumulator>::new();

    for entry in entries {
        let Some(bounds) = week_bounds(&entry.date) else {
            continue;
        };
        let (minutes, earnings) = entry_minutes_and_earnings(entry, rates);
        let week = weeks.entry(bounds).or_default();
        week.total_minutes += minutes;
        week.session_count += 1;
        week.earnings += earnings;
    }

    weeks
        .into_iter()
        .rev()
        .map(|(bounds, week)| WeeklyStats {
            week_start: bounds.week_start,
            week_end: bounds.week_end,
            total_minutes: week.total_minutes,
            session_count: week.session_count,
            pending_minutes: WEEKLY_TARGET_MINUTES.saturating_sub(week.total_minutes),
            projected_earnings: week.earnings,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CumulativeStats {
    pub total_minutes: u32,
    pub session_count: usize,
    pub total_earnings: f64,
}

/// Totals over every entry. Unlike [weekly_stats] the date isn't validated, so entries with a
/// broken date still count here.
pub fn cumulative_stats(entries: &[TimeEntry], rates: &CourseRates) -> CumulativeStats {
    entries
        .iter()
        .fold(CumulativeStats::default(), |mut acc, entry| {
            let (minutes, earnings) = entry_minutes_and_earnings(entry, rates);
            acc.total_minutes += minutes;
            acc.session_count += 1;
            acc.total_earnings += earnings;
            acc
        })
}

/// Entries that fall into the same week. `week_start` and `week_end` are empty for entries whose
/// date can't be parsed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekGroup {
    pub week_start: Option<NaiveDate>,
    pub week_end: Option<NaiveDate>,
    pub entries: Vec<TimeEntry>,
}

/// Splits entries into week groups. Groups keep the order in which their first entry appears, and
/// entries keep their relative order, so a newest first list stays newest first.
pub fn group_by_week(entries: impl IntoIterator<Item = TimeEntry>) -> Vec<WeekGroup> {
    let mut groups = Vec::<WeekGroup>::new();
    let mut positions = HashMap::<Option<WeekBounds>, usize>::new();

    for entry in entries {
        let bounds = week_bounds(&entry.date);
        let position = *positions.entry(bounds).or_insert_with(|| {
            groups.push(WeekGroup {
                week_start: bounds.map(|v| v.week_start),
                week_end: bounds.map(|v| v.week_end),
                entries: vec![],
            });
            groups.len() - 1
        });
        groups[position].entries.push(entry);
    }

    groups
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseOverview {
    /// Every course that has entries or a rate, sorted alphabetically.
    pub known: Vec<String>,
    /// Known courses that are paid the default rate because they have no rate.
    pub missing_rates: Vec<String>,
}

pub fn course_overview(entries: &[TimeEntry], rates: &CourseRates) -> CourseOverview {
    let mut known = entries
        .iter()
        .map(|v| v.course_name.trim())
        .filter(|v| !v.is_empty())
        .chain(rates.keys().map(String::as_str))
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect::<Vec<_>>();
    known.sort_by(|a, b| a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| a.cmp(b)));

    let missing_rates = known
        .iter()
        .filter(|v| !rates.contains_key(*v))
        .cloned()
        .collect();

    CourseOverview {
        known,
        missing_rates,
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use crate::storage::entities::{CourseRates, TimeEntry};

    use super::*;

    fn entry(date: &str, time_in: &str, time_out: &str, course: &str) -> TimeEntry {
        TimeEntry::default()
            .with_id(format!("{date}-{time_in}-{course}"))
            .with_date(date)
            .with_times(time_in, time_out)
            .with_course(course)
    }

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn rates(values: &[(&str, f64)]) -> CourseRates {
        values.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_hourly_rate_fallbacks() {
        let rates = rates(&[
            ("Algebra", 25.),
            ("Broken", -3.),
            ("Weird", f64::NAN),
            ("Infinite", f64::INFINITY),
            ("Free", 0.),
        ]);

        assert_eq!(hourly_rate("Algebra", &rates), 25.);
        assert_eq!(hourly_rate("  Algebra  ", &rates), 25.);
        assert_eq!(hourly_rate("Free", &rates), 0.);
        assert_eq!(hourly_rate("algebra", &rates), DEFAULT_HOURLY_RATE);
        assert_eq!(hourly_rate("Unknown", &rates), DEFAULT_HOURLY_RATE);
        assert_eq!(hourly_rate("Broken", &rates), DEFAULT_HOURLY_RATE);
        assert_eq!(hourly_rate("Weird", &rates), DEFAULT_HOURLY_RATE);
        assert_eq!(hourly_rate("Infinite", &rates), DEFAULT_HOURLY_RATE);
        assert_eq!(hourly_rate("", &rates), DEFAULT_HOURLY_RATE);
        assert_eq!(DEFAULT_HOURLY_RATE, 18.);
    }

    #[test]
    fn test_weekly_stats_groups_by_monday() {
        let entries = vec![
            entry("2024-01-08", "09:00", "10:00", "Algebra"),
            entry("2024-01-14", "09:00", "09:30", "Algebra"),
            entry("2024-01-15", "10:00", "12:00", "Physics"),
        ];
        let rates = rates(&[("Algebra", 30.)]);

        let stats = weekly_stats(&entries, &rates);

        assert_eq!(stats.len(), 2);
        // Newest week first.
        assert_eq!(stats[0].week_start, date(2024, 1, 15));
        assert_eq!(stats[0].week_end, date(2024, 1, 21));
        assert_eq!(stats[0].total_minutes, 120);
        assert_eq!(stats[0].session_count, 1);
        assert_eq!(stats[0].projected_earnings, 2. * DEFAULT_HOURLY_RATE);

        assert_eq!(stats[1].week_start, date(2024, 1, 8));
        assert_eq!(stats[1].total_minutes, 90);
        assert_eq!(stats[1].session_count, 2);
        assert_eq!(stats[1].pending_minutes, WEEKLY_TARGET_MINUTES - 90);
        assert_eq!(stats[1].projected_earnings, 45.);
    }

    #[test]
    fn test_weekly_stats_pending_never_negative() {
        let entries = (1..=5)
            .map(|day| entry(&format!("2024-01-{:02}", day + 7), "08:00", "13:00", ""))
            .collect::<Vec<_>>();

        let stats = weekly_stats(&entries, &CourseRates::new());

        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].total_minutes, 25 * 60);
        assert_eq!(stats[0].pending_minutes, 0);
    }

    #[test]
    fn test_weekly_stats_skips_unparseable_dates() {
        let entries = vec![
            entry("2024-01-10", "09:00", "10:00", ""),
            entry("", "09:00", "10:00", ""),
            entry("someday", "09:00", "10:00", ""),
            entry("2024-02-10", "09:00", "08:00", ""),
        ];

        let stats = weekly_stats(&entries, &CourseRates::new());

        let sessions = stats.iter().map(|v| v.session_count).sum::<usize>();
        assert_eq!(sessions, 2);
        // Zero length sessions still count as sessions.
        assert_eq!(stats[0].week_start, date(2024, 2, 5));
        assert_eq!(stats[0].total_minutes, 0);
        assert_eq!(stats[0].session_count, 1);
    }

    #[test]
    fn test_dates_at_calendar_end_have_no_week() {
        let last_day = crate::utils::time::iso_date(NaiveDate::MAX);
        let entries = vec![
            entry("2024-01-10", "09:00", "10:00", ""),
            entry(&last_day, "09:00", "10:00", ""),
        ];

        let stats = weekly_stats(&entries, &CourseRates::new());
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].session_count, 1);

        let groups = group_by_week(entries);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[1].week_start, None);
        assert_eq!(groups[1].entries[0].date, last_day);
    }

    #[test]
    fn test_weekly_stats_sorted_descending() {
        let entries = vec![
            entry("2023-12-31", "09:00", "10:00", ""),
            entry("2024-03-01", "09:00", "10:00", ""),
            entry("2024-01-10", "09:00", "10:00", ""),
        ];

        let starts = weekly_stats(&entries, &CourseRates::new())
            .into_iter()
            .map(|v| v.week_start)
            .collect::<Vec<_>>();

        assert_eq!(
            starts,
            vec![date(2024, 2, 26), date(2024, 1, 8), date(2023, 12, 25)]
        );
    }

    #[test]
    fn test_weekly_stats_serialization() -> anyhow::Result<()> {
        let stats = weekly_stats(
            &[entry("2024-01-10", "09:00", "10:30", "")],
            &CourseRates::new(),
        );
        assert_eq!(
            serde_json::to_value(&stats)?,
            serde_json::json!([{
                "weekStart": "2024-01-08",
                "weekEnd": "2024-01-14",
                "totalMinutes": 90,
                "sessionCount": 1,
                "pendingMinutes": 1110,
                "projectedEarnings": 27.0,
            }])
        );
        Ok(())
    }

    #[test]
    fn test_cumulative_stats_counts_every_entry() {
        let entries = vec![
            entry("2024-01-10", "09:00", "10:00", "Algebra"),
            entry("broken", "09:00", "09:30", ""),
            entry("2024-01-11", "10:00", "09:00", "Algebra"),
        ];
        let rates = rates(&[("Algebra", 40.)]);

        let stats = cumulative_stats(&entries, &rates);

        assert_eq!(stats.total_minutes, 90);
        assert_eq!(stats.session_count, 3);
        assert_eq!(stats.total_earnings, 40. + 9.);

        let weekly_sessions = weekly_stats(&entries, &rates)
            .iter()
            .map(|v| v.session_count)
            .sum::<usize>();
        assert_eq!(weekly_sessions, 2);
    }

    #[test]
    fn test_cumulative_stats_empty() {
        assert_eq!(
            cumulative_stats(&[], &CourseRates::new()),
            CumulativeStats::default()
        );
    }

    #[test]
    fn test_group_by_week_keeps_order() {
        let entries = vec![
            entry("2024-01-15", "09:00", "10:00", "a"),
            entry("2024-01-10", "09:00", "10:00", "b"),
            entry("nope", "09:00", "10:00", "c"),
            entry("2024-01-16", "09:00", "10:00", "d"),
            entry("2024-01-08", "09:00", "10:00", "e"),
            entry("", "09:00", "10:00", "f"),
        ];

        let groups = group_by_week(entries);

        assert_eq!(groups.len(), 3);
        let courses = |group: &WeekGroup| {
            group
                .entries
                .iter()
                .map(|v| v.course_name.clone())
                .collect::<Vec<_>>()
        };
        assert_eq!(groups[0].week_start, Some(date(2024, 1, 15)));
        assert_eq!(courses(&groups[0]), vec!["a", "d"]);
        assert_eq!(groups[1].week_start, Some(date(2024, 1, 8)));
        assert_eq!(courses(&groups[1]), vec!["b", "e"]);
        assert_eq!(groups[2].week_start, None);
        assert_eq!(groups[2].week_end, None);
        assert_eq!(courses(&groups[2]), vec!["c", "f"]);
    }

    #[test]
    fn test_course_overview() {
        let entries = vec![
            entry("2024-01-10", "09:00", "10:00", " physics "),
            entry("2024-01-10", "09:00", "10:00", ""),
            entry("2024-01-10", "09:00", "10:00", "Algebra"),
        ];
        let rates = rates(&[("Chemistry", 20.), ("Algebra", 25.)]);

        let overview = course_overview(&entries, &rates);

        assert_eq!(overview.known, vec!["Algebra", "Chemistry", "physics"]);
        assert_eq!(overview.missing_rates, vec!["physics"]);
    }
}
