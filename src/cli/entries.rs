use ansi_term::Style;
use anyhow::{anyhow, Result};
use chrono::{Local, NaiveDate};
use chrono_english::parse_date_string;
use clap::Parser;
use tracing::info;
use uuid::Uuid;

use crate::{
    stats::{group_by_week, ordering::sort_entries_newest_first, WeekGroup},
    storage::{entities::TimeEntry, repository::EntryStorage},
    utils::{
        clock::Clock,
        time::{
            calculate_duration, format_date, format_duration, format_time_range,
            format_week_range, iso_date, parse_time_of_day, WorkDuration,
        },
    },
};

use super::{validation_error, DateStyle};

const DATE_HELP: &str = "Date of the session. Examples are \"today\", \"yesterday\", \"2025-03-15\", \"15/03/2025\"";

#[derive(Debug, Parser)]
pub struct AddCommand {
    #[arg(long, help = DATE_HELP)]
    date: Option<String>,
    #[arg(long, default_value_t = DateStyle::Uk, help = "Style of dates used during parsing. For Uk it's day/month/year. For Us it's month/day/year")]
    date_style: DateStyle,
    #[arg(long, help = "Start of the session, HH:MM")]
    time_in: String,
    #[arg(long, help = "End of the session, HH:MM")]
    time_out: String,
    #[arg(long, help = "Course the session belongs to")]
    course: Option<String>,
    #[arg(long, help = "What was done, markdown is fine")]
    notes: Option<String>,
}

#[derive(Debug, Parser)]
pub struct EditCommand {
    id: String,
    #[arg(long, help = DATE_HELP)]
    date: Option<String>,
    #[arg(long, default_value_t = DateStyle::Uk, help = "Style of dates used during parsing. For Uk it's day/month/year. For Us it's month/day/year")]
    date_style: DateStyle,
    #[arg(long, help = "Start of the session, HH:MM")]
    time_in: Option<String>,
    #[arg(long, help = "End of the session, HH:MM")]
    time_out: Option<String>,
    #[arg(long, help = "Course the session belongs to. Empty value clears it")]
    course: Option<String>,
    #[arg(long, help = "What was done, markdown is fine")]
    notes: Option<String>,
}

/// Resolves a user supplied date into the stored `YYYY-MM-DD` form. Natural language dates are
/// anchored at the clock's current local time.
fn parse_date(value: &str, date_style: DateStyle, clock: &dyn Clock) -> Result<String> {
    if let Ok(v) = NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d") {
        return Ok(iso_date(v));
    }
    let now = clock.now().with_timezone(&Local);
    match parse_date_string(value, now, date_style.into()) {
        Ok(v) => Ok(iso_date(v.date_naive())),
        Err(e) => Err(validation_error(format!("Failed to validate date {value}: {e}"))),
    }
}

fn parse_time(value: &str, name: &str) -> Result<String> {
    let value = value.trim();
    if parse_time_of_day(value).is_none() {
        return Err(validation_error(format!(
            "{name} has to look like HH:MM, got \"{value}\""
        )));
    }
    Ok(value.to_string())
}

/// Command to process `add`. Creates a new entry with a fresh id.
pub async fn process_add_command(
    AddCommand {
        date,
        date_style,
        time_in,
        time_out,
        course,
        notes,
    }: AddCommand,
    storage: &dyn EntryStorage,
    clock: &dyn Clock,
) -> Result<()> {
    let date = match date {
        Some(v) => parse_date(&v, date_style, clock)?,
        None => iso_date(clock.now().with_timezone(&Local).date_naive()),
    };

    let entry = TimeEntry {
        id: Uuid::new_v4().to_string(),
        date,
        time_in: parse_time(&time_in, "time-in")?,
        time_out: parse_time(&time_out, "time-out")?,
        course_name: course.unwrap_or_default().trim().to_string(),
        work_markdown: notes.unwrap_or_default(),
        created_at: clock.timestamp(),
        ..Default::default()
    };

    if !storage.insert(entry.clone()).await? {
        return Err(anyhow!("Entry {} already exists", entry.id));
    }
    info!("Added entry {}", entry.id);
    println!(
        "Added {} ({})",
        entry.id,
        format_duration(calculate_duration(&entry.time_in, &entry.time_out))
    );
    Ok(())
}

/// Command to process `edit`. Only the given fields change, the rest of the entry is kept as is.
pub async fn process_edit_command(
    EditCommand {
        id,
        date,
        date_style,
        time_in,
        time_out,
        course,
        notes,
    }: EditCommand,
    storage: &dyn EntryStorage,
    clock: &dyn Clock,
) -> Result<()> {
    let Some(mut entry) = storage.get(&id).await? else {
        return Err(validation_error(format!("There is no entry with id {id}")));
    };

    if let Some(date) = date {
        entry.date = parse_date(&date, date_style, clock)?;
    }
    if let Some(time_in) = time_in {
        entry.time_in = parse_time(&time_in, "time-in")?;
    }
    if let Some(time_out) = time_out {
        entry.time_out = parse_time(&time_out, "time-out")?;
    }
    if let Some(course) = course {
        entry.course_name = course.trim().to_string();
    }
    if let Some(notes) = notes {
        entry.work_markdown = notes;
    }

    if !storage.replace(entry).await? {
        return Err(validation_error(format!("There is no entry with id {id}")));
    }
    info!("Updated entry {id}");
    println!("Updated {id}");
    Ok(())
}

pub async fn process_remove_command(id: &str, storage: &dyn EntryStorage) -> Result<()> {
    if !storage.delete(id).await? {
        return Err(validation_error(format!("There is no entry with id {id}")));
    }
    info!("Removed entry {id}");
    println!("Removed {id}");
    Ok(())
}

/// Command to process `log`. Prints every session, newest first, grouped by week.
pub async fn process_log_command(storage: &dyn EntryStorage) -> Result<()> {
    let entries = sort_entries_newest_first(storage.list().await?);
    print!("{}", render_log(&group_by_week(entries)));
    Ok(())
}

fn render_log(groups: &[WeekGroup]) -> String {
    if groups.is_empty() {
        return "No sessions logged yet.\n".into();
    }

    let mut output = String::new();
    for group in groups {
        let heading = match (group.week_start, group.week_end) {
            (Some(start), Some(end)) => format_week_range(&iso_date(start), &iso_date(end)),
            _ => "Unknown week".into(),
        };
        let total: u32 = group
            .entries
            .iter()
            .map(|v| calculate_duration(&v.time_in, &v.time_out).total_minutes)
            .sum();

        output.push_str(&format!(
            "{}\t{}\n",
            Style::new().bold().paint(heading),
            format_duration(WorkDuration::from_minutes(total))
        ));
        for entry in &group.entries {
            let course = if entry.course_name.is_empty() {
                "No course"
            } else {
                &entry.course_name
            };
            output.push_str(&format!(
                "  {}\t{}\t{}\t{}\t{}\n",
                format_date(&entry.date),
                format_time_range(&entry.time_in, &entry.time_out),
                format_duration(calculate_duration(&entry.time_in, &entry.time_out)),
                course,
                Style::new().dimmed().paint(entry.id.as_str()),
            ));
        }
        output.push('\n');
    }
    output
}
