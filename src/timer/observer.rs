use std::io::{self, Write};

use ansi_term::Colour;
use tracing::{debug, warn};

use crate::{statistics::AggregateTotals, utils::time::format_time};

/// State of the shared timer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimerState {
    pub elapsed_seconds: u64,
    pub running: bool,
}

/// Which controls make sense in the current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlStates {
    pub start: bool,
    pub pause: bool,
    pub reset: bool,
    pub save: bool,
}

impl From<TimerState> for ControlStates {
    fn from(state: TimerState) -> Self {
        let has_time = state.elapsed_seconds > 0;
        Self {
            start: !state.running,
            pause: state.running,
            reset: has_time,
            save: has_time,
        }
    }
}

/// Everything an observer needs to draw itself after a change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerSnapshot {
    pub state: TimerState,
    /// Totals including the time on the clock.
    pub totals: AggregateTotals,
}

/// A region displaying and controlling the shared timer. Every registered observer receives the
/// same snapshot after each change.
#[cfg_attr(test, mockall::automock)]
pub trait TimerObserver {
    fn render(&mut self, snapshot: &TimerSnapshot);

    fn set_controls_enabled(&mut self, controls: ControlStates);
}

/// The timer bar at the bottom of the terminal. It keeps rewriting a single line.
pub struct TerminalTimerBar<W: Write> {
    out: W,
    last_line: String,
    controls: Option<ControlStates>,
}

impl TerminalTimerBar<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> TerminalTimerBar<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            last_line: String::new(),
            controls: None,
        }
    }

    fn draw(&mut self) {
        let controls = self
            .controls
            .map(describe_controls)
            .unwrap_or_default();
        // Clear to the end of the line, the previous draw may have been longer.
        let line = format!("\r{}  {controls}\x1b[K", self.last_line);
        if let Err(e) = self.out.write_all(line.as_bytes()).and_then(|_| self.out.flush()) {
            warn!("Failed to draw timer bar {e}");
        }
    }
}

impl<W: Write> TimerObserver for TerminalTimerBar<W> {
    fn render(&mut self, snapshot: &TimerSnapshot) {
        let time = format_time(snapshot.state.elapsed_seconds);
        self.last_line = if snapshot.state.running {
            format!("{} {}", Colour::Green.paint("●"), Colour::Green.bold().paint(time))
        } else {
            format!("{} {}", Colour::Yellow.paint("‖"), time)
        };
        self.draw();
    }

    fn set_controls_enabled(&mut self, controls: ControlStates) {
        self.controls = Some(controls);
        self.draw();
    }
}

/// Lists the enabled controls, e.g. `[pause]` or `[start reset save]`.
pub fn describe_controls(controls: ControlStates) -> String {
    let names = [
        (controls.start, "start"),
        (controls.pause, "pause"),
        (controls.reset, "reset"),
        (controls.save, "save"),
    ]
    .into_iter()
    .filter_map(|(enabled, name)| enabled.then_some(name))
    .collect::<Vec<_>>();
    format!("[{}]", names.join(" "))
}

/// Writes running/paused transitions into the log. Ticks are not logged.
#[derive(Default)]
pub struct TracingObserver {
    running: Option<bool>,
}

impl TimerObserver for TracingObserver {
    fn render(&mut self, snapshot: &TimerSnapshot) {
        if self.running != Some(snapshot.state.running) {
            debug!(
                running = snapshot.state.running,
                elapsed = snapshot.state.elapsed_seconds,
                daily = snapshot.totals.daily,
                "Timer state changed"
            );
            self.running = Some(snapshot.state.running);
        }
    }

    fn set_controls_enabled(&mut self, _controls: ControlStates) {}
}
