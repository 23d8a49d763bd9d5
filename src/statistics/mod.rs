//! Calendar based totals over saved sessions.
//!
//! Everything here is a pure function of the sessions, the moment passed in as `now` and the
//! time of a session that is still running. Which time zone the calendar follows is decided by
//! the zone of `now`; the application passes local time.

use std::collections::BTreeSet;

use chrono::{DateTime, Datelike, NaiveDate, TimeZone};
use crate::{storage::entities::SessionEntity, utils::time::week_start};

/// Durations in seconds for every aggregate window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AggregateTotals {
    pub daily: u64,
    pub weekly: u64,
    pub monthly: u64,
    pub yearly: u64,
    pub average_daily: u64,
}

/// Sums sessions into the day, week, month and year that `now` falls in. Sums saturate, a
/// hand edited log with absurd durations can't bring the timer down.
///
/// A positive `in_progress` is counted as if it were a session saved at `now`, so it lands in
/// every window and makes today count as an active day for the average.
pub fn aggregate<Tz: TimeZone>(
    sessions: &[SessionEntity],
    now: DateTime<Tz>,
    in_progress: u64,
) -> AggregateTotals {
    let tz = now.timezone();
    let today = now.date_naive();
    let week_start = week_start(now.clone());

    let mut totals = AggregateTotals::default();
    let mut active_days = BTreeSet::<NaiveDate>::new();
    let mut overall = 0u64;

    for session in sessions {
        let moment = session.timestamp.with_timezone(&tz);
        let date = moment.date_naive();

        overall = overall.saturating_add(session.seconds);
        active_days.insert(date);

        if date == today {
            totals.daily = totals.daily.saturating_add(session.seconds);
        }
        if moment >= week_start && moment <= now {
            totals.weekly = totals.weekly.saturating_add(session.seconds);
        }
        if date.year() == today.year() {
            totals.yearly = totals.yearly.saturating_add(session.seconds);
            if date.month() == today.month() {
                totals.monthly = totals.monthly.saturating_add(session.seconds);
            }
        }
    }

    if in_progress > 0 {
        totals.daily = totals.daily.saturating_add(in_progress);
        totals.weekly = totals.weekly.saturating_add(in_progress);
        totals.monthly = totals.monthly.saturating_add(in_progress);
        totals.yearly = totals.yearly.saturating_add(in_progress);
        overall = overall.saturating_add(in_progress);
        active_days.insert(today);
    }

    totals.average_daily = average(overall, active_days.len());
    totals
}

/// Rounds to the nearest second, halves going up.
fn average(total: u64, days: usize) -> u64 {
    if days == 0 {
        return 0;
    }
    let days = days as u64;
    total.saturating_add(days / 2) / days
}
