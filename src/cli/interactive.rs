use std::{
    io::{self, Write},
    path::PathBuf,
    sync::Arc,
};

use anyhow::Result;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_stream::{wrappers::LinesStream, Stream, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::{
    account::{authorization_url, new_nonce, parse_redirect, Account},
    config::{IdentityArgs, Settings},
    storage::session_storage::{SessionStorage, SessionStorageImpl},
    timer::{
        observer::{TerminalTimerBar, TracingObserver},
        wait_for_tick, SharedTimer,
    },
    utils::{
        clock::{DefaultClock, SharedClock},
        time::format_time,
    },
    view::{
        render::{render_view, ViewContext},
        ViewSwitcher,
    },
};

use super::shutdown::detect_shutdown;

#[derive(Debug, Default, Parser)]
pub struct RunCommand {
    #[arg(long, help = "View to open first, for example \"#statistics\"")]
    view: Option<String>,
    #[command(flatten)]
    identity: IdentityArgs,
}

const HELP: &str = "\
Commands:
  start | pause | reset | save   control the timer
  #<view> | go <view>            switch to home, session, statistics, settings or account
  stats                          same as #statistics
  login                          print the sign-in URL
  signin <redirect url>          finish signing in with the URL you were sent back to
  help                           show this text
  quit                           leave, discarding unsaved time";

/// One line typed by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Start,
    Pause,
    Reset,
    Save,
    Navigate(String),
    Stats,
    Login,
    SignIn(String),
    Help,
    Quit,
    Empty,
    Unknown(String),
}

pub fn parse_input(line: &str) -> Input {
    let line = line.trim();
    if line.starts_with('#') {
        return Input::Navigate(line.to_string());
    }
    let (command, rest) = match line.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, rest.trim()),
        None => (line, ""),
    };
    match (command.to_lowercase().as_str(), rest) {
        ("", _) => Input::Empty,
        ("start", "") => Input::Start,
        ("pause", "") => Input::Pause,
        ("reset", "") => Input::Reset,
        ("save", "") => Input::Save,
        ("stats", "") => Input::Stats,
        ("login", "") => Input::Login,
        ("help", "") => Input::Help,
        ("quit" | "exit", "") => Input::Quit,
        ("go", view) if !view.is_empty() => Input::Navigate(view.to_string()),
        ("signin", response) if !response.is_empty() => Input::SignIn(response.to_string()),
        _ => Input::Unknown(line.to_string()),
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

/// The interactive session: one shared timer, one visible view.
pub struct App<S: SessionStorage, W: Write> {
    timer: SharedTimer<S>,
    switcher: ViewSwitcher,
    settings: Settings,
    account: Option<Account>,
    out: W,
}

impl<S: SessionStorage, W: Write> App<S, W> {
    pub fn new(timer: SharedTimer<S>, settings: Settings, out: W) -> Self {
        Self {
            timer,
            switcher: ViewSwitcher::default(),
            settings,
            account: None,
            out,
        }
    }

    pub fn timer_mut(&mut self) -> &mut SharedTimer<S> {
        &mut self.timer
    }

    /// Switches views. Home and statistics read the session log again before drawing.
    pub async fn navigate(&mut self, fragment: Option<&str>) -> Result<()> {
        let change = self.switcher.navigate(fragment);
        if change.refresh_statistics {
            self.timer.refresh_sessions().await;
        }
        self.show_current_view()
    }

    fn show_current_view(&mut self) -> Result<()> {
        let context = ViewContext {
            state: self.timer.state(),
            totals: self.timer.totals(),
            last_session: self.timer.last_session(),
            settings: &self.settings,
            account: self.account.as_ref(),
        };
        let text = render_view(self.switcher.current(), &context);
        write!(self.out, "\n{text}")?;
        self.out.flush()?;
        Ok(())
    }

    fn message(&mut self, text: impl AsRef<str>) -> Result<()> {
        writeln!(self.out, "\n{}", text.as_ref())?;
        Ok(())
    }

    async fn handle(&mut self, input: Input) -> Result<Flow> {
        let controls = self.timer.controls();
        match input {
            Input::Start if controls.start => self.timer.start(),
            Input::Pause if controls.pause => self.timer.pause(),
            Input::Reset if controls.reset => self.timer.reset(),
            Input::Save if controls.save => self.save().await?,
            Input::Start => self.message("The timer is already running")?,
            Input::Pause => self.message("The timer is not running")?,
            Input::Reset | Input::Save => self.message("There is no time on the timer")?,
            Input::Navigate(fragment) => self.navigate(Some(fragment.as_str())).await?,
            Input::Stats => self.navigate(Some("#statistics")).await?,
            Input::Login => self.login()?,
            Input::SignIn(response) => self.sign_in(&response).await?,
            Input::Help => self.message(HELP)?,
            Input::Quit => {
                let elapsed = self.timer.state().elapsed_seconds;
                if elapsed > 0 {
                    warn!("Discarding {elapsed}s that were not saved");
                }
                return Ok(Flow::Quit);
            }
            Input::Empty => (),
            Input::Unknown(line) => {
                self.message(format!("Unknown command `{line}`, type `help`"))?
            }
        }
        Ok(Flow::Continue)
    }

    async fn save(&mut self) -> Result<()> {
        match self.timer.save().await {
            Ok(session) => {
                self.message(format!("Saved session {}", format_time(session.seconds)))?;
                if self.switcher.current().shows_statistics() {
                    self.show_current_view()?;
                }
            }
            Err(e) => {
                error!("Failed to save session {e:?}");
                self.message(format!("Couldn't save the session: {e}"))?;
            }
        }
        Ok(())
    }

    fn login(&mut self) -> Result<()> {
        match authorization_url(&self.settings.identity, &new_nonce()) {
            Ok(url) => self.message(format!(
                "Open this URL to sign in, then paste the address you are sent back to with `signin`:\n{url}"
            )),
            Err(e) => self.message(format!("Can't sign in: {e}")),
        }
    }

    /// A failed sign-in is reported once; the user has to start over with `login`.
    async fn sign_in(&mut self, response: &str) -> Result<()> {
        match parse_redirect(response) {
            Ok(account) => {
                info!("Signed in as {}", account.display_name());
                self.account = Some(account);
                self.navigate(Some("#account")).await
            }
            Err(e) => {
                warn!("Sign-in failed {e:?}");
                self.message(format!("Sign-in failed: {e}"))
            }
        }
    }

    /// Runs until the input ends, the user quits or `shutdown` is cancelled.
    pub async fn event_loop(
        &mut self,
        mut lines: impl Stream<Item = io::Result<String>> + Unpin,
        shutdown: &CancellationToken,
    ) -> Result<()> {
        loop {
            let tick = wait_for_tick(self.timer.clock(), self.timer.tick_deadline());
            tokio::select! {
                _ = shutdown.cancelled() => return Ok(()),
                _ = tick => self.timer.tick(),
                line = lines.next() => {
                    let Some(line) = line else {
                        info!("Input closed");
                        return Ok(());
                    };
                    if self.handle(parse_input(&line?)).await? == Flow::Quit {
                        return Ok(());
                    }
                }
            }
        }
    }
}

/// Entry point of `stint run`.
pub async fn run_interactive(
    app_dir: PathBuf,
    log_to_console: bool,
    command: RunCommand,
) -> Result<()> {
    let clock: SharedClock = Arc::new(DefaultClock);
    let storage = SessionStorageImpl::new(&app_dir, clock.clone())?;
    let settings = Settings {
        data_dir: app_dir,
        log_to_console,
        identity: command.identity.to_config()?,
    };

    let mut timer = SharedTimer::new(storage, clock).await;
    timer.register(Box::new(TracingObserver::default()));

    let mut app = App::new(timer, settings, io::stdout());
    app.message("Type `help` for the list of commands")?;
    app.navigate(command.view.as_deref()).await?;
    app.timer_mut()
        .register(Box::new(TerminalTimerBar::stdout()));

    let lines = LinesStream::new(BufReader::new(tokio::io::stdin()).lines());
    let shutdown = CancellationToken::new();

    let (_, result) = tokio::join!(detect_shutdown(shutdown.clone()), async {
        let result = app.event_loop(lines, &shutdown).await;
        shutdown.cancel();
        result
    });
    println!();
    result
}
