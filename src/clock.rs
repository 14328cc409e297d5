//! Countdown clock driving session lifetime
//!
//! The timer task sleeps until absolute deadlines (`start + n` seconds), so a
//! late wakeup never shifts later ticks. Overdue ticks are delivered one by
//! one as soon as the task runs again.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info};

/// Event emitted by a running [`Countdown`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockEvent {
    /// One second elapsed
    Tick { remaining: u64 },
    /// Remaining time reached zero (emitted once, after the final tick)
    Expired,
}

pub struct Countdown {
    duration_secs: u64,
    remaining: Arc<AtomicU64>,
    events: Option<mpsc::UnboundedReceiver<ClockEvent>>,
    task: Option<JoinHandle<()>>,
}

impl Countdown {
    pub fn new(duration_secs: u64) -> Self {
        Self {
            duration_secs,
            remaining: Arc::new(AtomicU64::new(duration_secs)),
            events: None,
            task: None,
        }
    }

    /// Start counting down from the configured duration
    ///
    /// Restarting a running countdown cancels the previous timer first.
    pub fn start(&mut self) {
        self.cancel();

        let duration_secs = self.duration_secs;
        let remaining = Arc::clone(&self.remaining);
        remaining.store(duration_secs, Ordering::SeqCst);

        let (tx, rx) = mpsc::unbounded_channel();
        let started_at = Instant::now();

        info!("Countdown started ({}s)", duration_secs);

        let task = tokio::spawn(async move {
            for elapsed in 1..=duration_secs {
                sleep_until(started_at + Duration::from_secs(elapsed)).await;

                let left = duration_secs - elapsed;
                remaining.store(left, Ordering::SeqCst);

                if tx.send(ClockEvent::Tick { remaining: left }).is_err() {
                    return;
                }
            }

            let _ = tx.send(ClockEvent::Expired);
            debug!("Countdown expired");
        });

        self.events = Some(rx);
        self.task = Some(task);
    }

    /// Wait for the next clock event
    ///
    /// Returns `None` once the countdown has expired or was cancelled.
    pub async fn next(&mut self) -> Option<ClockEvent> {
        match self.events.as_mut() {
            Some(rx) => rx.recv().await,
            None => None,
        }
    }

    /// Seconds left on the clock
    pub fn remaining(&self) -> u64 {
        self.remaining.load(Ordering::SeqCst)
    }

    pub fn duration_secs(&self) -> u64 {
        self.duration_secs
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Stop the timer without emitting `Expired`
    ///
    /// Idempotent. `remaining()` keeps the value it had when cancelled.
    pub fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            debug!("Countdown cancelled at {}s", self.remaining());
        }
        self.events = None;
    }
}

impl Drop for Countdown {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
