//! Views of the interactive session. Only one is shown at a time and it is picked with a
//! fragment such as `#statistics`, the same identifiers the browser version used in its URL.

pub mod render;

use std::{fmt::Display, str::FromStr};

use anyhow::anyhow;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Home,
    Session,
    Statistics,
    Settings,
    Account,
}

impl View {
    pub const ALL: [View; 5] = [
        View::Home,
        View::Session,
        View::Statistics,
        View::Settings,
        View::Account,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            View::Home => "home",
            View::Session => "session",
            View::Statistics => "statistics",
            View::Settings => "settings",
            View::Account => "account",
        }
    }

    /// Accepts both `#name` and `name`.
    pub fn from_fragment(fragment: &str) -> Option<View> {
        let name = fragment.trim().trim_start_matches('#');
        View::ALL.into_iter().find(|v| v.name() == name)
    }

    /// Views showing the most recent session and the totals.
    pub fn shows_statistics(&self) -> bool {
        matches!(self, View::Home | View::Statistics)
    }
}

impl Display for View {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.name())
    }
}

impl FromStr for View {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        View::from_fragment(s).ok_or_else(|| anyhow!("Unknown view {s}"))
    }
}

/// Result of a navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewChange {
    pub view: View,
    /// The recent session and totals need to be drawn again.
    pub refresh_statistics: bool,
}

pub struct ViewSwitcher {
    current: View,
}

impl Default for ViewSwitcher {
    fn default() -> Self {
        Self {
            current: View::Home,
        }
    }
}

impl ViewSwitcher {
    /// Selects the view for `fragment`. Unknown and missing fragments lead home.
    pub fn navigate(&mut self, fragment: Option<&str>) -> ViewChange {
        let view = fragment.and_then(View::from_fragment).unwrap_or(View::Home);
        debug!("Switching from {} to {view}", self.current);
        self.current = view;
        ViewChange {
            view,
            refresh_statistics: view.shows_statistics(),
        }
    }

    pub fn current(&self) -> View {
        self.current
    }

    pub fn is_visible(&self, view: View) -> bool {
        self.current == view
    }
}
