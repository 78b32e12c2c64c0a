// Timer capability used by the countdown and the cue scheduler
//
// Timers never call back into the session directly. A fired timer is
// delivered as a `Fired` message to the session's event loop, which checks
// the handle against what it still has armed before acting on it.

use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use tokio::time::{Instant, MissedTickBehavior};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(u64);

impl TimerHandle {
    pub fn new(id: u64) -> Self {
        Self(id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    Tick,
    /// Index into the session's guidance script
    Cue(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fired {
    pub handle: TimerHandle,
    pub kind: TimerKind,
}

pub trait Scheduler {
    /// Monotonic time since the scheduler was created
    fn now(&self) -> Duration;
    fn arm(&mut self, delay: Duration, kind: TimerKind) -> TimerHandle;
    fn arm_repeating(&mut self, period: Duration, kind: TimerKind) -> TimerHandle;
    /// Disarming an unknown or already fired handle is a no-op
    fn disarm(&mut self, handle: TimerHandle);
}

/// Scheduler backed by tokio tasks, one per armed timer
pub struct TokioScheduler {
    origin: Instant,
    next_id: u64,
    fired_tx: mpsc::UnboundedSender<Fired>,
    armed: HashMap<TimerHandle, AbortHandle>,
}

impl TokioScheduler {
    /// Must be called inside a tokio runtime
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Fired>) {
        let (fired_tx, fired_rx) = mpsc::unbounded_channel();
        let scheduler = Self {
            origin: Instant::now(),
            next_id: 0,
            fired_tx,
            armed: HashMap::new(),
        };
        (scheduler, fired_rx)
    }

    fn next_handle(&mut self) -> TimerHandle {
        self.next_id += 1;
        TimerHandle(self.next_id)
    }

    pub fn armed_count(&self) -> usize {
        self.armed.values().filter(|t| !t.is_finished()).count()
    }
}

impl Scheduler for TokioScheduler {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    fn arm(&mut self, delay: Duration, kind: TimerKind) -> TimerHandle {
        let handle = self.next_handle();
        let tx = self.fired_tx.clone();

        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(Fired { handle, kind });
        });

        // Fired one-shots are dropped from the map when the session disarms them
        self.armed.retain(|_, t| !t.is_finished());
        self.armed.insert(handle, task.abort_handle());
        handle
    }

    fn arm_repeating(&mut self, period: Duration, kind: TimerKind) -> TimerHandle {
        let handle = self.next_handle();
        let tx = self.fired_tx.clone();

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if tx.send(Fired { handle, kind }).is_err() {
                    break;
                }
            }
        });

        self.armed.insert(handle, task.abort_handle());
        handle
    }

    fn disarm(&mut self, handle: TimerHandle) {
        if let Some(task) = self.armed.remove(&handle) {
            task.abort();
        }
    }
}

impl Drop for TokioScheduler {
    fn drop(&mut self) {
        for (_, task) in self.armed.drain() {
            task.abort();
        }
    }
}
