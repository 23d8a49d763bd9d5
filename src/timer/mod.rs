//! The single count-up clock shared by every view of an interactive session.
//!
//! [SharedTimer] owns the elapsed time and the list of observer regions. It doesn't run its own
//! task: the event loop asks for [SharedTimer::tick_deadline], waits for it alongside user input
//! and calls [SharedTimer::tick]. Ticks are anchored at the moment the timer was started, so a
//! slow iteration of the loop doesn't shift the following ticks.

pub mod observer;

use std::time::Duration;

use anyhow::Result;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::{
    statistics::{aggregate, AggregateTotals},
    storage::{entities::SessionEntity, session_storage::SessionStorage},
    utils::clock::SharedClock,
};

use observer::{ControlStates, TimerObserver, TimerSnapshot, TimerState};

const TICK_INTERVAL: Duration = Duration::from_secs(1);

pub struct SharedTimer<S: SessionStorage> {
    storage: S,
    clock: SharedClock,
    elapsed_seconds: u64,
    next_tick: Option<Instant>,
    /// Cache of the saved sessions. Only this timer appends to the log, so it stays in sync.
    sessions: Vec<SessionEntity>,
    observers: Vec<Box<dyn TimerObserver>>,
}

impl<S: SessionStorage> SharedTimer<S> {
    pub async fn new(storage: S, clock: SharedClock) -> Self {
        let sessions = storage.load().await;
        debug!("Loaded {} saved sessions", sessions.len());
        Self {
            storage,
            clock,
            elapsed_seconds: 0,
            next_tick: None,
            sessions,
            observers: vec![],
        }
    }

    /// Attaches another region. It's drawn right away so it never shows stale state.
    pub fn register(&mut self, mut observer: Box<dyn TimerObserver>) {
        let snapshot = self.snapshot();
        observer.render(&snapshot);
        observer.set_controls_enabled(snapshot.state.into());
        self.observers.push(observer);
    }

    pub fn state(&self) -> TimerState {
        TimerState {
            elapsed_seconds: self.elapsed_seconds,
            running: self.next_tick.is_some(),
        }
    }

    pub fn controls(&self) -> ControlStates {
        self.state().into()
    }

    pub fn clock(&self) -> SharedClock {
        self.clock.clone()
    }

    pub fn sessions(&self) -> &[SessionEntity] {
        &self.sessions
    }

    pub fn last_session(&self) -> Option<&SessionEntity> {
        self.sessions.last()
    }

    /// Totals at the current moment, including time on the clock.
    pub fn totals(&self) -> AggregateTotals {
        aggregate(&self.sessions, self.clock.local_time(), self.elapsed_seconds)
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        TimerSnapshot {
            state: self.state(),
            totals: self.totals(),
        }
    }

    /// When the next tick is due. `None` while paused.
    pub fn tick_deadline(&self) -> Option<Instant> {
        self.next_tick
    }

    pub fn start(&mut self) {
        if self.next_tick.is_some() {
            return;
        }
        self.next_tick = Some(self.clock.instant() + TICK_INTERVAL);
        info!("Timer started at {}s", self.elapsed_seconds);
        self.notify();
    }

    pub fn pause(&mut self) {
        if self.next_tick.take().is_none() {
            return;
        }
        info!("Timer paused at {}s", self.elapsed_seconds);
        self.notify();
    }

    pub fn reset(&mut self) {
        self.next_tick = None;
        self.elapsed_seconds = 0;
        info!("Timer reset");
        self.notify();
    }

    /// Stops the clock and stores what was on it. The clock is only cleared once the session is
    /// persisted.
    pub async fn save(&mut self) -> Result<SessionEntity> {
        self.next_tick = None;
        let result = self.storage.append(self.elapsed_seconds).await;
        if let Ok(session) = &result {
            self.sessions.push(*session);
            self.elapsed_seconds = 0;
        }
        self.notify();
        result
    }

    /// Reads the log again, picking up sessions saved by another stint process.
    pub async fn refresh_sessions(&mut self) {
        self.sessions = self.storage.load().await;
        debug!("Refreshed {} saved sessions", self.sessions.len());
        self.notify();
    }

    /// Advances the clock by a second if it's running.
    pub fn tick(&mut self) {
        let Some(deadline) = self.next_tick else {
            return;
        };
        self.elapsed_seconds += 1;
        self.next_tick = Some(deadline + TICK_INTERVAL);
        self.notify();
    }

    fn notify(&mut self) {
        let snapshot = self.snapshot();
        let controls = snapshot.state.into();
        for observer in self.observers.iter_mut() {
            observer.render(&snapshot);
            observer.set_controls_enabled(controls);
        }
    }
}

/// Resolves at `deadline`, or never when there is none. Takes owned values so it can be raced
/// against other events that need the timer mutably.
pub async fn wait_for_tick(clock: SharedClock, deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => clock.sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{Arc, Mutex},
        time::Duration,
    };

    use anyhow::Result;
    use chrono::{Local, TimeZone, Utc};
    use tempfile::{tempdir, TempDir};

    use super::{
        observer::{ControlStates, MockTimerObserver, TimerObserver, TimerSnapshot},
        wait_for_tick, SharedTimer,
    };
    use crate::{
        storage::session_storage::{SessionStorage, SessionStorageImpl},
        utils::{
            clock::{test_clock::TestClock, SharedClock},
            logging::TEST_LOGGING,
        },
    };

    async fn test_timer() -> Result<(SharedTimer<SessionStorageImpl>, TempDir)> {
        *TEST_LOGGING;
        let dir = tempdir()?;
        // Noon local time keeps the whole test inside one calendar day.
        let start = Local
            .with_ymd_and_hms(2025, 3, 13, 12, 0, 0)
            .single()
            .unwrap_or_else(|| Utc::now().with_timezone(&Local));
        let clock: SharedClock = Arc::new(TestClock::new(start.with_timezone(&Utc)));
        let storage = SessionStorageImpl::new(dir.path(), clock.clone())?;
        Ok((SharedTimer::new(storage, clock).await, dir))
    }

    async fn run_ticks(timer: &mut SharedTimer<SessionStorageImpl>, count: u64) {
        for _ in 0..count {
            wait_for_tick(timer.clock(), timer.tick_deadline()).await;
            timer.tick();
        }
    }

    struct Recorder(Arc<Mutex<Vec<TimerSnapshot>>>);

    impl TimerObserver for Recorder {
        fn render(&mut self, snapshot: &TimerSnapshot) {
            self.0.lock().unwrap().push(*snapshot);
        }

        fn set_controls_enabled(&mut self, _controls: ControlStates) {}
    }

    #[tokio::test(start_paused = true)]
    async fn start_then_pause_keeps_time() -> Result<()> {
        let (mut timer, _dir) = test_timer().await?;

        timer.start();
        timer.pause();

        assert_eq!(timer.state().elapsed_seconds, 0);
        assert!(!timer.state().running);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn elapsed_matches_waited_seconds() -> Result<()> {
        let (mut timer, _dir) = test_timer().await?;

        timer.start();
        run_ticks(&mut timer, 5).await;
        timer.pause();

        assert_eq!(timer.state().elapsed_seconds, 5);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn start_twice_does_not_move_deadline() -> Result<()> {
        let (mut timer, _dir) = test_timer().await?;

        timer.start();
        let deadline = timer.tick_deadline();
        tokio::time::advance(Duration::from_millis(400)).await;
        timer.start();

        assert_eq!(timer.tick_deadline(), deadline);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn paused_timer_does_not_tick() -> Result<()> {
        let (mut timer, _dir) = test_timer().await?;

        timer.tick();
        let waited = tokio::time::timeout(
            Duration::from_secs(3),
            wait_for_tick(timer.clock(), timer.tick_deadline()),
        )
        .await;

        assert!(waited.is_err());
        assert_eq!(timer.state().elapsed_seconds, 0);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn reset_zeroes_and_stops() -> Result<()> {
        let (mut timer, _dir) = test_timer().await?;

        timer.start();
        run_ticks(&mut timer, 3).await;
        timer.reset();

        assert_eq!(timer.state().elapsed_seconds, 0);
        assert!(timer.tick_deadline().is_none());
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn save_persists_and_clears() -> Result<()> {
        let (mut timer, dir) = test_timer().await?;

        timer.start();
        run_ticks(&mut timer, 42).await;
        let saved = timer.save().await?;

        assert_eq!(saved.seconds, 42);
        assert_eq!(timer.state().elapsed_seconds, 0);
        assert!(!timer.state().running);
        assert_eq!(timer.last_session(), Some(&saved));

        let storage = SessionStorageImpl::new(dir.path(), timer.clock())?;
        let stored = storage.load().await;
        assert_eq!(stored.last().map(|v| v.seconds), Some(42));
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn totals_include_running_time() -> Result<()> {
        let (mut timer, _dir) = test_timer().await?;

        timer.start();
        run_ticks(&mut timer, 10).await;
        timer.save().await?;
        timer.start();
        run_ticks(&mut timer, 5).await;

        let totals = timer.totals();
        assert_eq!(totals.daily, 15);
        assert_eq!(totals.average_daily, 15);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn observers_share_the_same_state() -> Result<()> {
        let (mut timer, _dir) = test_timer().await?;
        let first = Arc::new(Mutex::new(vec![]));
        let second = Arc::new(Mutex::new(vec![]));
        timer.register(Box::new(Recorder(first.clone())));
        timer.register(Box::new(Recorder(second.clone())));

        timer.start();
        run_ticks(&mut timer, 2).await;
        timer.pause();

        let first = first.lock().unwrap();
        let second = second.lock().unwrap();
        assert_eq!(*first, *second);
        assert_eq!(first.len(), 5);
        assert_eq!(second.last().map(|v| v.state.elapsed_seconds), Some(2));
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn observers_receive_control_states() -> Result<()> {
        let (mut timer, _dir) = test_timer().await?;
        let mut observer = MockTimerObserver::new();
        observer.expect_render().times(3).return_const(());
        let mut sequence = mockall::Sequence::new();
        observer
            .expect_set_controls_enabled()
            .withf(|c| c.start && !c.pause && !c.save)
            .times(1)
            .in_sequence(&mut sequence)
            .return_const(());
        observer
            .expect_set_controls_enabled()
            .withf(|c| !c.start && c.pause && !c.reset)
            .times(1)
            .in_sequence(&mut sequence)
            .return_const(());
        observer
            .expect_set_controls_enabled()
            .withf(|c| !c.start && c.pause && c.reset && c.save)
            .times(1)
            .in_sequence(&mut sequence)
            .return_const(());

        timer.register(Box::new(observer));
        timer.start();
        run_ticks(&mut timer, 1).await;
        Ok(())
    }
}
