// Session countdown: one tick per second from the duration down to zero
use std::time::Duration;

use super::timers::{Scheduler, TimerHandle, TimerKind};

pub const TICK_PERIOD: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Running { remaining_sec: u32 },
    /// Remaining time just reached zero. Reported once per session.
    Completed,
    /// Tick observed after completion
    AlreadyComplete,
}

#[derive(Debug)]
pub struct Countdown {
    duration_sec: u32,
    remaining_sec: u32,
    completed: bool,
    tick: Option<TimerHandle>,
}

impl Countdown {
    pub fn new(duration_sec: u32) -> Self {
        Self {
            duration_sec,
            remaining_sec: duration_sec,
            completed: false,
            tick: None,
        }
    }

    pub fn duration_sec(&self) -> u32 {
        self.duration_sec
    }

    pub fn remaining_sec(&self) -> u32 {
        self.remaining_sec
    }

    pub fn is_armed(&self) -> bool {
        self.tick.is_some()
    }

    /// True when `handle` is the tick this countdown has armed
    pub fn owns(&self, handle: TimerHandle) -> bool {
        self.tick == Some(handle)
    }

    /// Arm the repeating tick. Returns false if it was already armed.
    pub fn start(&mut self, scheduler: &mut dyn Scheduler) -> bool {
        if self.tick.is_some() || self.completed {
            return false;
        }
        self.tick = Some(scheduler.arm_repeating(TICK_PERIOD, TimerKind::Tick));
        true
    }

    pub fn stop(&mut self, scheduler: &mut dyn Scheduler) {
        if let Some(handle) = self.tick.take() {
            scheduler.disarm(handle);
        }
    }

    pub fn tick(&mut self) -> TickOutcome {
        if self.completed {
            return TickOutcome::AlreadyComplete;
        }

        self.remaining_sec = self.remaining_sec.saturating_sub(1);
        if self.remaining_sec == 0 {
            self.completed = true;
            TickOutcome::Completed
        } else {
            TickOutcome::Running {
                remaining_sec: self.remaining_sec,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::testing::ManualScheduler;

    #[test]
    fn test_completes_after_exactly_duration_ticks() {
        for duration in [1u32, 2, 7, 180] {
            let mut countdown = Countdown::new(duration);
            for expected in (1..duration).rev() {
                assert_eq!(countdown.tick(), TickOutcome::Running { remaining_sec: expected });
            }
            assert_eq!(countdown.tick(), TickOutcome::Completed);
            assert_eq!(countdown.remaining_sec(), 0);
        }
    }

    #[test]
    fn test_completion_is_edge_triggered() {
        let mut countdown = Countdown::new(2);
        countdown.tick();
        assert_eq!(countdown.tick(), TickOutcome::Completed);
        for _ in 0..5 {
            assert_eq!(countdown.tick(), TickOutcome::AlreadyComplete);
            assert_eq!(countdown.remaining_sec(), 0);
        }
    }

    #[test]
    fn test_start_is_guarded_by_existing_handle() {
        let mut scheduler = ManualScheduler::default();
        let mut countdown = Countdown::new(10);

        assert!(countdown.start(&mut scheduler));
        assert!(!countdown.start(&mut scheduler));
        assert_eq!(scheduler.armed_count(), 1);

        countdown.stop(&mut scheduler);
        countdown.stop(&mut scheduler);
        assert!(!countdown.is_armed());
        assert_eq!(scheduler.armed_count(), 0);
    }
}
