use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time;

/// The time budget reported for a side that plays without a clock.
pub const UNTIMED: Duration = Duration::MAX;

#[derive(Debug)]
struct State {
    left: Duration,
    since: Option<Instant>,
    done: bool,
}

impl State {
    fn remaining(&self) -> Duration {
        match self.since {
            Some(t) => self.left.saturating_sub(t.elapsed()),
            None => self.left,
        }
    }
}

fn lock(state: &Mutex<State>) -> MutexGuard<'_, State> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A pausable, best-effort countdown.
///
/// This is a coarse device, not a precision timer. The bookkeeping task
/// sleeps in bounded naps and is woken by [`Clock::pause`]/[`Clock::resume`];
/// expiry pins the remaining time to exactly zero, is terminal, and fires the
/// completion callback exactly once, from a context distinct from the
/// bookkeeping task itself.
#[derive(Debug)]
pub struct Clock {
    state: Arc<Mutex<State>>,
    alarm: Arc<Notify>,
    task: JoinHandle<()>,
}

impl Clock {
    /// Starts a clock that runs down the given budget.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(budget: Duration, expired: impl FnOnce() + Send + 'static) -> Self {
        let state = Arc::new(Mutex::new(State {
            left: budget,
            since: Some(Instant::now()),
            done: false,
        }));

        let alarm = Arc::new(Notify::new());

        let task = tokio::spawn({
            let state = Arc::clone(&state);
            let alarm = Arc::clone(&alarm);
            async move {
                if Clock::run(&state, &alarm).await {
                    tokio::spawn(async move { expired() });
                }
            }
        });

        Clock { state, alarm, task }
    }

    async fn run(state: &Mutex<State>, alarm: &Notify) -> bool {
        loop {
            let nap = {
                let s = lock(state);
                if s.done {
                    return false;
                }

                s.since.map(|t| s.left.saturating_sub(t.elapsed()))
            };

            match nap {
                None => alarm.notified().await,
                Some(Duration::ZERO) => {}
                Some(d) => {
                    tokio::select! {
                        _ = time::sleep(d) => {}
                        _ = alarm.notified() => {}
                    }
                }
            }

            let mut s = lock(state);

            if s.done {
                return false;
            }

            if let Some(t) = s.since {
                if t.elapsed() >= s.left {
                    s.left = Duration::ZERO;
                    s.since = None;
                    s.done = true;
                    return true;
                }
            }
        }
    }

    /// The time left on this clock.
    pub fn remaining(&self) -> Duration {
        lock(&self.state).remaining()
    }

    /// Whether this clock has run out of time.
    pub fn expired(&self) -> bool {
        let s = lock(&self.state);
        s.done && s.left == Duration::ZERO
    }

    /// Stops the countdown; a no-op while paused or after expiry.
    pub fn pause(&self) {
        let mut s = lock(&self.state);

        if let Some(t) = s.since.take() {
            s.left = s.left.saturating_sub(t.elapsed());
        }

        self.alarm.notify_one();
    }

    /// Restarts the countdown; a no-op while running or after expiry.
    pub fn resume(&self) {
        let mut s = lock(&self.state);

        if !s.done && s.since.is_none() {
            s.since = Some(Instant::now());
            self.alarm.notify_one();
        }
    }

    /// Silently aborts this clock without firing its completion callback.
    pub fn cancel(&self) {
        let mut s = lock(&self.state);

        if let Some(t) = s.since.take() {
            s.left = s.left.saturating_sub(t.elapsed());
        }

        s.done = true;
        drop(s);

        self.task.abort();
        self.alarm.notify_one();
    }
}

impl Drop for Clock {
    fn drop(&mut self) {
        self.task.abort();
    }
}
