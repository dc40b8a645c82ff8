// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Adaptive polling of the vendor API.
//!
//! The controller owns one background task that sleeps for the next
//! interval, runs a refresh, and re-arms. After activity (a state change
//! seen by a refresh, or an accepted command) it switches to the short
//! interval for a bounded number of cycles before falling back to the
//! long interval.
//!
//! Refreshes never overlap: the periodic cycle and [`PollingController::refresh_now`]
//! share one gate, and [`PollingController::accelerate`] only re-arms the
//! timer, it never starts a refresh itself.
//!
//! # Examples
//!
//! ```no_run
//! use std::sync::Arc;
//! use sesame_bridge::poll::{PollConfig, PollingController, RefreshOutcome, Refresher};
//!
//! struct Noop;
//!
//! impl Refresher for Noop {
//!     async fn refresh(&self, _needs_login: bool) -> RefreshOutcome {
//!         RefreshOutcome::Synced { changed: false }
//!     }
//! }
//!
//! # async fn example() {
//! let poller = PollingController::new(PollConfig::default());
//! poller.start(Arc::new(Noop));
//! poller.accelerate();
//! poller.stop();
//! # }
//! ```

mod config;
mod state;

use std::future::Future;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

pub use config::PollConfig;
pub use state::{PollPhase, PollState, RefreshOutcome};

/// One refresh cycle: optional login, then a full device sync.
pub trait Refresher: Send + Sync + 'static {
    /// Runs one refresh.
    ///
    /// `needs_login` is true when the previous refresh did not produce
    /// valid data, so the session should be re-established first.
    fn refresh(&self, needs_login: bool) -> impl Future<Output = RefreshOutcome> + Send;
}

#[derive(Debug)]
struct Shared {
    config: PollConfig,
    state: Mutex<PollState>,
    wake: Notify,
    gate: tokio::sync::Mutex<()>,
}

impl Shared {
    /// Runs a refresh under the gate and folds the outcome into the state.
    ///
    /// Returns the outcome and whether the pending timer should be re-armed.
    async fn refresh<R: Refresher>(&self, refresher: &R, from_loop: bool) -> (RefreshOutcome, bool) {
        let _gate = self.gate.lock().await;
        let needs_login = {
            let mut state = self.state.lock();
            if from_loop {
                state.set_phase(PollPhase::Refreshing);
            }
            !state.valid_data()
        };

        let outcome = refresher.refresh(needs_login).await;

        let rearm = self.state.lock().record(outcome);
        tracing::debug!(?outcome, needs_login, "Refresh cycle finished");
        (outcome, rearm)
    }

    async fn run<R: Refresher>(self: Arc<Self>, refresher: Arc<R>) {
        loop {
            let interval = {
                let mut state = self.state.lock();
                state.set_phase(PollPhase::Scheduled);
                state.next_interval(&self.config)
            };
            tracing::debug!(?interval, "Next refresh scheduled");

            tokio::select! {
                () = tokio::time::sleep(interval) => {}
                () = self.wake.notified() => continue,
            }

            self.state.lock().tick();
            self.refresh(refresher.as_ref(), true).await;
        }
    }

    fn wake_if_scheduled(&self) {
        if self.state.lock().phase() == PollPhase::Scheduled {
            self.wake.notify_one();
        }
    }
}

/// Schedules refreshes on a short or long interval.
#[derive(Debug)]
pub struct PollingController {
    shared: Arc<Shared>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl PollingController {
    /// Creates a stopped controller.
    #[must_use]
    pub fn new(config: PollConfig) -> Self {
        let state = PollState::new(config.max_short_poll_count());
        Self {
            shared: Arc::new(Shared {
                config,
                state: Mutex::new(state),
                wake: Notify::new(),
                gate: tokio::sync::Mutex::new(()),
            }),
            task: Mutex::new(None),
        }
    }

    /// Returns the cadence.
    #[must_use]
    pub fn config(&self) -> &PollConfig {
        &self.shared.config
    }

    /// Spawns the polling task. Does nothing if it is already running.
    ///
    /// The first timer uses the long interval unless activity was recorded
    /// before starting.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn start<R: Refresher>(&self, refresher: Arc<R>) {
        let mut task = self.task.lock();
        if task.as_ref().is_some_and(|handle| !handle.is_finished()) {
            tracing::debug!("Polling already running");
            return;
        }

        tracing::info!(
            long_interval_secs = self.shared.config.long_interval().as_secs(),
            short_interval_secs = self.shared.config.short_interval().as_secs(),
            max_short_polls = self.shared.config.max_short_poll_count(),
            "Starting device polling"
        );
        *task = Some(tokio::spawn(Arc::clone(&self.shared).run(refresher)));
    }

    /// Cancels the pending timer and any in-flight refresh.
    pub fn stop(&self) {
        if let Some(handle) = self.task.lock().take() {
            handle.abort();
            tracing::info!("Stopped device polling");
        }
        self.shared.state.lock().set_phase(PollPhase::Idle);
    }

    /// Returns true while the polling task is alive.
    pub fn is_running(&self) -> bool {
        self.task
            .lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Restarts the short-polling window.
    ///
    /// A pending timer is re-armed with the short interval. If a refresh
    /// is in flight, the short interval applies when it finishes.
    pub fn accelerate(&self) {
        self.shared.state.lock().accelerate();
        tracing::debug!("Polling accelerated");
        self.shared.wake_if_scheduled();
    }

    /// Runs a refresh right away, outside the timer.
    ///
    /// Waits for an in-flight refresh to finish first. A change or a first
    /// failure re-arms the pending timer.
    pub async fn refresh_now<R: Refresher>(&self, refresher: &R) -> RefreshOutcome {
        let (outcome, rearm) = self.shared.refresh(refresher, false).await;
        if rearm {
            self.shared.wake_if_scheduled();
        }
        outcome
    }

    /// Returns the controller phase.
    pub fn phase(&self) -> PollPhase {
        self.shared.state.lock().phase()
    }

    /// Returns a copy of the scheduling state.
    pub fn snapshot(&self) -> PollState {
        self.shared.state.lock().clone()
    }
}

impl Drop for PollingController {
    fn drop(&mut self) {
        if let Some(handle) = self.task.get_mut().take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use tokio::time::Instant;

    use super::*;

    /// Replays scripted outcomes and records when each refresh started.
    struct Scripted {
        started: Instant,
        script: Mutex<VecDeque<RefreshOutcome>>,
        fallback: RefreshOutcome,
        delay: Duration,
        calls: Mutex<Vec<(u64, bool)>>,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    impl Scripted {
        fn new(script: Vec<RefreshOutcome>, fallback: RefreshOutcome) -> Self {
            Self {
                started: Instant::now(),
                script: Mutex::new(script.into()),
                fallback,
                delay: Duration::ZERO,
                calls: Mutex::new(Vec::new()),
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
            }
        }

        fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }

        /// Start times in whole seconds since creation.
        fn times(&self) -> Vec<u64> {
            self.calls.lock().iter().map(|(t, _)| *t).collect()
        }

        fn logins(&self) -> Vec<bool> {
            self.calls.lock().iter().map(|(_, login)| *login).collect()
        }
    }

    impl Refresher for Scripted {
        async fn refresh(&self, needs_login: bool) -> RefreshOutcome {
            self.calls
                .lock()
                .push((self.started.elapsed().as_secs(), needs_login));
            let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(running, Ordering::SeqCst);

            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }

            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            self.script.lock().pop_front().unwrap_or(self.fallback)
        }
    }

    const UNCHANGED: RefreshOutcome = RefreshOutcome::Synced { changed: false };
    const CHANGED: RefreshOutcome = RefreshOutcome::Synced { changed: true };

    async fn advance(secs: u64) {
        tokio::time::sleep(Duration::from_secs(secs)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn change_switches_to_short_polling_then_back() {
        let refresher = Arc::new(Scripted::new(vec![CHANGED], UNCHANGED));
        let poller = PollingController::new(PollConfig::default());
        poller.start(Arc::clone(&refresher));

        advance(721).await;

        let mut expected = vec![300];
        expected.extend((1..=24).map(|i| 300 + i * 5));
        expected.push(720);
        assert_eq!(refresher.times(), expected);
        assert_eq!(poller.snapshot().short_poll_elapsed_count(), 24);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_login_keeps_requesting_login() {
        let refresher = Arc::new(Scripted::new(
            vec![RefreshOutcome::Failed, RefreshOutcome::Failed],
            UNCHANGED,
        ));
        let poller = PollingController::new(PollConfig::default());
        poller.start(Arc::clone(&refresher));

        advance(906).await;

        assert_eq!(refresher.times(), vec![300, 305, 605, 905]);
        assert_eq!(refresher.logins(), vec![true, true, true, false]);
        assert!(poller.snapshot().valid_data());
    }

    #[tokio::test(start_paused = true)]
    async fn persistent_failure_falls_back_to_long_interval() {
        let refresher = Arc::new(Scripted::new(Vec::new(), RefreshOutcome::Failed));
        let poller = PollingController::new(PollConfig::default());
        poller.start(Arc::clone(&refresher));

        advance(1206).await;

        assert_eq!(refresher.times(), vec![300, 305, 605, 905, 1205]);
        assert!(refresher.logins().iter().all(|login| *login));
        assert_eq!(poller.snapshot().failure_streak(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn accelerate_rearms_pending_timer() {
        let refresher = Arc::new(Scripted::new(Vec::new(), UNCHANGED));
        let poller = PollingController::new(PollConfig::default());
        poller.start(Arc::clone(&refresher));

        advance(10).await;
        assert_eq!(poller.phase(), PollPhase::Scheduled);
        poller.accelerate();
        advance(11).await;

        assert_eq!(refresher.times(), vec![15, 20]);
    }

    #[tokio::test(start_paused = true)]
    async fn accelerate_during_refresh_does_not_overlap() {
        let refresher =
            Arc::new(Scripted::new(Vec::new(), UNCHANGED).with_delay(Duration::from_secs(10)));
        let poller = PollingController::new(PollConfig::default());
        poller.start(Arc::clone(&refresher));

        advance(302).await;
        assert_eq!(poller.phase(), PollPhase::Refreshing);
        poller.accelerate();
        advance(14).await;

        // Refresh ran 300..310, short timer armed afterwards.
        assert_eq!(refresher.times(), vec![300, 315]);
        assert_eq!(refresher.max_in_flight.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn refresh_now_waits_for_in_flight_refresh() {
        let refresher =
            Arc::new(Scripted::new(Vec::new(), UNCHANGED).with_delay(Duration::from_secs(10)));
        let poller = PollingController::new(PollConfig::default());
        poller.start(Arc::clone(&refresher));

        advance(301).await;
        let outcome = poller.refresh_now(refresher.as_ref()).await;

        assert_eq!(outcome, UNCHANGED);
        assert_eq!(refresher.times(), vec![300, 310]);
        assert_eq!(refresher.max_in_flight.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn refresh_now_with_change_accelerates_loop() {
        let refresher = Arc::new(Scripted::new(vec![CHANGED], UNCHANGED));
        let poller = PollingController::new(PollConfig::default());
        poller.start(Arc::clone(&refresher));

        advance(10).await;
        poller.refresh_now(refresher.as_ref()).await;
        advance(6).await;

        assert_eq!(refresher.times(), vec![10, 15]);
        assert_eq!(refresher.logins(), vec![true, false]);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_cancels_pending_timer() {
        let refresher = Arc::new(Scripted::new(Vec::new(), UNCHANGED));
        let poller = PollingController::new(PollConfig::default());
        poller.start(Arc::clone(&refresher));
        assert!(poller.is_running());

        advance(1).await;
        poller.stop();
        advance(600).await;

        assert!(refresher.times().is_empty());
        assert!(!poller.is_running());
        assert_eq!(poller.phase(), PollPhase::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn start_twice_keeps_single_loop() {
        let refresher = Arc::new(Scripted::new(Vec::new(), UNCHANGED));
        let poller = PollingController::new(PollConfig::default());
        poller.start(Arc::clone(&refresher));
        poller.start(Arc::clone(&refresher));

        advance(301).await;
        assert_eq!(refresher.times(), vec![300]);
    }
}
