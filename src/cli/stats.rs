use std::{fmt::Display, path::Path, sync::Arc};

use anyhow::Result;
use chrono::{DateTime, Local};
use chrono_english::parse_date_string;
use clap::{CommandFactory, Parser, ValueEnum};

use crate::{
    statistics::{aggregate, AggregateTotals},
    storage::{
        entities::SessionEntity,
        session_storage::{SessionStorage, SessionStorageImpl},
    },
    utils::{clock::DefaultClock, time::format_time},
};

use super::Args;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum DateStyle {
    Uk,
    Us,
}

impl From<DateStyle> for chrono_english::Dialect {
    fn from(value: DateStyle) -> Self {
        match value {
            DateStyle::Uk => Self::Uk,
            DateStyle::Us => Self::Us,
        }
    }
}

impl Display for DateStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DateStyle::Uk => write!(f, "uk"),
            DateStyle::Us => write!(f, "us"),
        }
    }
}

#[derive(Debug, Parser)]
pub struct StatsCommand {
    #[arg(
        long = "at",
        help = "Moment the totals are computed for. Examples are \"yesterday\", \"2 days ago\", \"15/03/2025\". Defaults to now"
    )]
    at: Option<String>,
    #[arg(long, default_value_t = DateStyle::Uk, help = "Style of dates used during parsing. For Uk it's day/month/year. For Us it's month/day/year")]
    date_style: DateStyle,
}

#[derive(Debug, Parser)]
pub struct SessionsCommand {
    #[arg(short, long, default_value_t = 10, help = "How many sessions to show")]
    limit: usize,
}

/// Command to process `stats`. Prints the totals of the windows the given moment falls in.
pub async fn process_stats_command(
    app_dir: &Path,
    StatsCommand { at, date_style }: StatsCommand,
) -> Result<()> {
    let moment = parse_moment(at, date_style, Local::now())?;
    let storage = SessionStorageImpl::new(app_dir, Arc::new(DefaultClock))?;
    let sessions = storage.load().await;

    let totals = aggregate(&sessions, moment, 0);
    print!("{}", format_totals(moment, &totals));
    Ok(())
}

/// Command to process `sessions`. Newest sessions come first.
pub async fn process_sessions_command(
    app_dir: &Path,
    SessionsCommand { limit }: SessionsCommand,
) -> Result<()> {
    let storage = SessionStorageImpl::new(app_dir, Arc::new(DefaultClock))?;
    let sessions = storage.load().await;
    if sessions.is_empty() {
        println!("No recent sessions");
        return Ok(());
    }
    for line in format_sessions(&sessions, limit) {
        println!("{line}");
    }
    Ok(())
}

fn parse_moment(
    at: Option<String>,
    date_style: DateStyle,
    now: DateTime<Local>,
) -> Result<DateTime<Local>> {
    match at.map(|s| parse_date_string(&s, now, date_style.into())) {
        Some(Ok(v)) => Ok(v.with_timezone(&Local)),
        Some(Err(e)) => Err(Args::command()
            .error(
                clap::error::ErrorKind::ValueValidation,
                format!("Failed to validate date {e}"),
            )
            .into()),
        None => Ok(now),
    }
}

fn format_totals(moment: DateTime<Local>, totals: &AggregateTotals) -> String {
    format!(
        "Totals for {}\n\
         Today\t{}\n\
         This week\t{}\n\
         This month\t{}\n\
         This year\t{}\n\
         Daily average\t{}\n",
        moment.format("%x %H:%M"),
        format_time(totals.daily),
        format_time(totals.weekly),
        format_time(totals.monthly),
        format_time(totals.yearly),
        format_time(totals.average_daily),
    )
}

fn format_sessions(sessions: &[SessionEntity], limit: usize) -> Vec<String> {
    sessions
        .iter()
        .rev()
        .take(limit)
        .map(|session| {
            format!(
                "{}\t{}",
                session.timestamp.with_timezone(&Local).format("%x %H:%M:%S"),
                format_time(session.seconds)
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Local, TimeZone, Utc};

    use super::{format_sessions, format_totals, parse_moment, DateStyle};
    use crate::{statistics::AggregateTotals, storage::entities::SessionEntity};

    #[test]
    fn default_moment_is_now() {
        let now = Local::now();
        assert_eq!(parse_moment(None, DateStyle::Uk, now).unwrap(), now);
    }

    #[test]
    fn relative_moment_is_parsed() {
        let now = Local::now();
        let moment = parse_moment(Some("1 hour ago".into()), DateStyle::Uk, now).unwrap();
        assert_eq!(now - moment, Duration::hours(1));
    }

    #[test]
    fn bad_moment_is_rejected() {
        assert!(parse_moment(Some("not a date at all".into()), DateStyle::Us, Local::now()).is_err());
    }

    #[test]
    fn sessions_are_listed_newest_first() {
        let start = Utc.with_ymd_and_hms(2025, 3, 13, 8, 0, 0).unwrap();
        let sessions = [
            SessionEntity::new(30, start),
            SessionEntity::new(45, start + Duration::hours(1)),
            SessionEntity::new(100, start + Duration::hours(2)),
        ];

        let lines = format_sessions(&sessions, 2);

        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("00:01:40"));
        assert!(lines[1].ends_with("00:00:45"));
    }

    #[test]
    fn totals_are_printed_in_order() {
        let totals = AggregateTotals {
            daily: 75,
            weekly: 175,
            monthly: 175,
            yearly: 175,
            average_daily: 88,
        };
        let text = format_totals(Local::now(), &totals);
        let values = text
            .lines()
            .skip(1)
            .filter_map(|line| line.split('\t').nth(1))
            .collect::<Vec<_>>();
        assert_eq!(
            values,
            ["00:01:15", "00:02:55", "00:02:55", "00:02:55", "00:01:28"]
        );
    }
}
