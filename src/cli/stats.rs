use ansi_term::Style;
use anyhow::Result;

use crate::{
    stats::{cumulative_stats, weekly_stats, CumulativeStats, WeeklyStats},
    storage::repository::{EntryStorage, RateStorage},
    utils::time::{format_duration, format_week_range, iso_date, WorkDuration},
};

const HIDDEN_EARNINGS: &str = "••••";

fn format_earnings(amount: f64, hide_earnings: bool) -> String {
    if hide_earnings {
        HIDDEN_EARNINGS.into()
    } else {
        format!("${amount:.2}")
    }
}

/// Command to process `stats`. Shows totals over every session followed by each week.
pub async fn process_stats_command(
    entries: &dyn EntryStorage,
    rates: &dyn RateStorage,
    hide_earnings: bool,
) -> Result<()> {
    let entries = entries.list().await?;
    let rates = rates.list().await?;

    print!(
        "{}",
        render_stats(
            &cumulative_stats(&entries, &rates),
            &weekly_stats(&entries, &rates),
            hide_earnings
        )
    );
    Ok(())
}

fn render_stats(cumulative: &CumulativeStats, weekly: &[WeeklyStats], hide_earnings: bool) -> String {
    let mut output = String::new();
    let heading = Style::new().bold();

    output.push_str(&format!("{}\n", heading.paint("Total")));
    output.push_str(&format!(
        "  {} over {} sessions, earned {}\n",
        format_duration(WorkDuration::from_minutes(cumulative.total_minutes)),
        cumulative.session_count,
        format_earnings(cumulative.total_earnings, hide_earnings)
    ));

    for week in weekly {
        output.push('\n');
        output.push_str(&format!(
            "{}\n",
            heading.paint(format_week_range(
                &iso_date(week.week_start),
                &iso_date(week.week_end)
            ))
        ));
        output.push_str(&format!(
            "  {} over {} sessions, {} pending, projected {}\n",
            format_duration(WorkDuration::from_minutes(week.total_minutes)),
            week.session_count,
            format_duration(WorkDuration::from_minutes(week.pending_minutes)),
            format_earnings(week.projected_earnings, hide_earnings)
        ));
    }
    output
}
