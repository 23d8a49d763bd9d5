use std::fmt::Write;

use ansi_term::Style;
use chrono::Local;

use crate::{
    account::Account,
    config::Settings,
    statistics::AggregateTotals,
    storage::entities::SessionEntity,
    timer::observer::{describe_controls, ControlStates, TimerState},
    utils::time::format_time,
};

use super::View;

pub const NO_RECENT_SESSIONS: &str = "No recent sessions";

/// What the views draw from.
pub struct ViewContext<'a> {
    pub state: TimerState,
    pub totals: AggregateTotals,
    pub last_session: Option<&'a SessionEntity>,
    pub settings: &'a Settings,
    pub account: Option<&'a Account>,
}

/// Text shown in the "recent session" boxes of home and statistics.
pub fn recent_session_text(last: Option<&SessionEntity>) -> String {
    match last {
        Some(session) => format_time(session.seconds),
        None => NO_RECENT_SESSIONS.to_string(),
    }
}

pub fn render_view(view: View, context: &ViewContext) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", Style::new().bold().paint(title(view)));
    let _ = match view {
        View::Home => render_home(&mut out, context),
        View::Session => render_session(&mut out, context),
        View::Statistics => render_statistics(&mut out, context),
        View::Settings => render_settings(&mut out, context),
        View::Account => render_account(&mut out, context),
    };
    out
}

fn title(view: View) -> &'static str {
    match view {
        View::Home => "Home",
        View::Session => "Session",
        View::Statistics => "Statistics",
        View::Settings => "Settings",
        View::Account => "Account",
    }
}

fn timer_line(state: TimerState) -> String {
    let status = if state.running { "running" } else { "paused" };
    format!("{} ({status})", format_time(state.elapsed_seconds))
}

fn render_home(out: &mut String, context: &ViewContext) -> std::fmt::Result {
    writeln!(out, "  Timer           {}", timer_line(context.state))?;
    writeln!(
        out,
        "  Recent session  {}",
        recent_session_text(context.last_session)
    )?;
    writeln!(out, "  Today           {}", format_time(context.totals.daily))
}

fn render_session(out: &mut String, context: &ViewContext) -> std::fmt::Result {
    writeln!(out, "  Timer     {}", timer_line(context.state))?;
    writeln!(
        out,
        "  Controls  {}",
        describe_controls(ControlStates::from(context.state))
    )
}

fn render_statistics(out: &mut String, context: &ViewContext) -> std::fmt::Result {
    let totals = context.totals;
    writeln!(
        out,
        "  Recent session  {}",
        recent_session_text(context.last_session)
    )?;
    if let Some(session) = context.last_session {
        writeln!(
            out,
            "  Saved at        {}",
            session.timestamp.with_timezone(&Local).format("%x %H:%M:%S")
        )?;
    }
    writeln!(out, "  Today           {}", format_time(totals.daily))?;
    writeln!(out, "  This week       {}", format_time(totals.weekly))?;
    writeln!(out, "  This month      {}", format_time(totals.monthly))?;
    writeln!(out, "  This year       {}", format_time(totals.yearly))?;
    writeln!(out, "  Daily average   {}", format_time(totals.average_daily))
}

fn render_settings(out: &mut String, context: &ViewContext) -> std::fmt::Result {
    let settings = context.settings;
    writeln!(out, "  Sessions file   {}", settings.sessions_file().display())?;
    writeln!(out, "  Log directory   {}", settings.log_dir().display())?;
    writeln!(
        out,
        "  Console logs    {}",
        if settings.log_to_console { "on" } else { "off" }
    )?;
    writeln!(
        out,
        "  Identity        {} ({})",
        settings.identity.authorize_endpoint,
        settings
            .identity
            .client_id
            .as_deref()
            .unwrap_or("no client id")
    )
}

fn render_account(out: &mut String, context: &ViewContext) -> std::fmt::Result {
    match context.account {
        Some(account) => {
            writeln!(out, "  Signed in as    {}", account.display_name())?;
            if let Some(email) = &account.email {
                writeln!(out, "  Email           {email}")?;
            }
            Ok(())
        }
        None => writeln!(
            out,
            "  Not signed in. Type `login`, then `signin <redirect url>`."
        ),
    }
}
