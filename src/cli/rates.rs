use ansi_term::Style;
use anyhow::Result;
use clap::Subcommand;
use tracing::info;

use crate::{
    stats::{course_overview, is_valid_rate, DEFAULT_HOURLY_RATE},
    storage::{
        entities::CourseRates,
        repository::{EntryStorage, RateStorage},
    },
};

use super::validation_error;

#[derive(Subcommand, Debug)]
pub enum RatesCommand {
    #[command(about = "Display configured rates and courses paid the default rate")]
    List {},
    #[command(about = "Set the hourly rate of a course")]
    Set { course: String, rate: f64 },
    #[command(about = "Remove the rate of a course, it falls back to the default rate")]
    Delete { course: String },
}

pub async fn process_rates_command(
    command: RatesCommand,
    entries: &dyn EntryStorage,
    rates: &dyn RateStorage,
) -> Result<()> {
    match command {
        RatesCommand::List {} => {
            let rates = rates.list().await?;
            let missing = course_overview(&entries.list().await?, &rates).missing_rates;
            print!("{}", render_rates(&rates, &missing));
        }
        RatesCommand::Set { course, rate } => {
            let course = course.trim();
            if course.is_empty() {
                return Err(validation_error("Course name can't be empty"));
            }
            if !is_valid_rate(rate) {
                return Err(validation_error(format!(
                    "Rate has to be a non-negative number, got {rate}"
                )));
            }
            rates.put(course, rate).await?;
            info!("Set rate of {course} to {rate}");
            println!("{course}\t${rate:.2}/h");
        }
        RatesCommand::Delete { course } => {
            let course = course.trim();
            if rates.delete(course).await? {
                info!("Removed rate of {course}");
                println!("Removed rate of {course}");
            } else {
                println!("{course} had no rate");
            }
        }
    }
    Ok(())
}

fn render_rates(rates: &CourseRates, missing: &[String]) -> String {
    let mut output = String::new();
    if rates.is_empty() && missing.is_empty() {
        return "No courses yet.\n".into();
    }

    for (course, rate) in rates {
        output.push_str(&format!("{course}\t${rate:.2}/h\n"));
    }
    for course in missing {
        output.push_str(&format!(
            "{course}\t{}\n",
            Style::new()
                .italic()
                .paint(format!("${DEFAULT_HOURLY_RATE:.2}/h (default)"))
        ));
    }
    output
}
