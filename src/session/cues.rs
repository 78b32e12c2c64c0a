// Guidance cue scheduling for synthesized-speech sessions
//
// Every cue gets its own one-shot timer. A fire is only honoured while its
// handle is still pending, so `cancel_all` invalidates fires already queued
// on the event loop as well as timers that have not run yet.

use std::time::Duration;

use super::timers::{Fired, Scheduler, TimerHandle, TimerKind};
use crate::catalog::Cue;
use crate::settings::CueAnchoring;

#[derive(Debug)]
pub struct CueScheduler {
    cues: Vec<Cue>,
    duration_sec: u32,
    anchoring: CueAnchoring,
    fired: Vec<bool>,
    pending: Vec<(TimerHandle, usize)>,
    /// Playing time accumulated before the current run
    played: Duration,
    /// Scheduler time at which the current run started
    running_since: Option<Duration>,
}

impl CueScheduler {
    pub fn new(cues: Vec<Cue>, duration_sec: u32, anchoring: CueAnchoring) -> Self {
        let fired = vec![false; cues.len()];
        Self {
            cues,
            duration_sec,
            anchoring,
            fired,
            pending: Vec::new(),
            played: Duration::ZERO,
            running_since: None,
        }
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Elapsed playing time, excluding pauses
    pub fn elapsed_playing(&self, now: Duration) -> Duration {
        match self.running_since {
            Some(since) => self.played + now.saturating_sub(since),
            None => self.played,
        }
    }

    /// Arm every cue against a session that starts now. Cues at or past the
    /// session duration are never armed. Returns how many were armed.
    pub fn schedule(&mut self, scheduler: &mut dyn Scheduler) -> usize {
        self.cancel_all(scheduler);
        self.fired.iter_mut().for_each(|f| *f = false);
        self.played = Duration::ZERO;
        self.running_since = Some(scheduler.now());
        self.arm_remaining(scheduler)
    }

    /// Called on pause
    pub fn suspend(&mut self, scheduler: &mut dyn Scheduler) {
        match self.anchoring {
            CueAnchoring::PlaybackTime => {
                let now = scheduler.now();
                self.played = self.elapsed_playing(now);
                self.running_since = None;
                self.disarm_pending(scheduler);
            }
            CueAnchoring::WallClock => {}
        }
    }

    /// Called on resume
    pub fn resume(&mut self, scheduler: &mut dyn Scheduler) {
        match self.anchoring {
            CueAnchoring::PlaybackTime => {
                if self.running_since.is_some() {
                    return;
                }
                self.running_since = Some(scheduler.now());
                let armed = self.arm_remaining(scheduler);
                tracing::debug!(armed, played_ms = self.played.as_millis() as u64, "cues re-armed");
            }
            CueAnchoring::WallClock => {}
        }
    }

    /// Resolve a fired timer to its cue. Stale or cancelled fires yield None.
    pub fn on_fire(&mut self, scheduler: &mut dyn Scheduler, fired: Fired) -> Option<&Cue> {
        let TimerKind::Cue(index) = fired.kind else {
            return None;
        };
        let position = self
            .pending
            .iter()
            .position(|&(handle, i)| handle == fired.handle && i == index)?;
        self.pending.swap_remove(position);
        scheduler.disarm(fired.handle);

        if self.fired[index] {
            return None;
        }
        self.fired[index] = true;
        self.cues.get(index)
    }

    /// Invalidate every pending cue timer. Idempotent.
    pub fn cancel_all(&mut self, scheduler: &mut dyn Scheduler) {
        if let Some(since) = self.running_since.take() {
            self.played += scheduler.now().saturating_sub(since);
        }
        self.disarm_pending(scheduler);
    }

    fn disarm_pending(&mut self, scheduler: &mut dyn Scheduler) {
        for (handle, _) in self.pending.drain(..) {
            scheduler.disarm(handle);
        }
    }

    fn arm_remaining(&mut self, scheduler: &mut dyn Scheduler) -> usize {
        let played = self.played;
        let mut armed = 0;
        for (index, cue) in self.cues.iter().enumerate() {
            if self.fired[index] || cue.offset_sec >= self.duration_sec {
                continue;
            }
            if self.pending.iter().any(|&(_, i)| i == index) {
                continue;
            }
            let delay = Duration::from_secs(cue.offset_sec as u64).saturating_sub(played);
            let handle = scheduler.arm(delay, TimerKind::Cue(index));
            self.pending.push((handle, index));
            armed += 1;
        }
        armed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::testing::ManualScheduler;

    fn script() -> Vec<Cue> {
        vec![
            Cue::new(0, "Welcome."),
            Cue::new(3, "Breathe in..."),
            Cue::new(10, "Breathe out..."),
            Cue::new(60, "Never, the session is shorter"),
        ]
    }

    fn run_until(
        cues: &mut CueScheduler,
        scheduler: &mut ManualScheduler,
        until: Duration,
    ) -> Vec<String> {
        let mut spoken = Vec::new();
        while let Some(fired) = scheduler.next_due(until) {
            if let Some(cue) = cues.on_fire(scheduler, fired) {
                spoken.push(cue.text.clone());
            }
        }
        scheduler.set_now(until);
        spoken
    }

    #[test]
    fn test_cues_past_duration_are_not_armed() {
        let mut scheduler = ManualScheduler::default();
        let mut cues = CueScheduler::new(script(), 30, CueAnchoring::PlaybackTime);
        assert_eq!(cues.schedule(&mut scheduler), 3);
        assert_eq!(scheduler.armed_count(), 3);
    }

    #[test]
    fn test_cue_fires_at_offset_not_before() {
        let mut scheduler = ManualScheduler::default();
        let mut cues = CueScheduler::new(script(), 30, CueAnchoring::PlaybackTime);
        cues.schedule(&mut scheduler);

        assert_eq!(run_until(&mut cues, &mut scheduler, Duration::from_millis(2999)), vec!["Welcome."]);
        assert_eq!(run_until(&mut cues, &mut scheduler, Duration::from_secs(3)), vec!["Breathe in..."]);
    }

    #[test]
    fn test_cancel_all_invalidates_queued_fires() {
        let mut scheduler = ManualScheduler::default();
        let mut cues = CueScheduler::new(script(), 30, CueAnchoring::PlaybackTime);
        cues.schedule(&mut scheduler);

        // A fire that was already delivered to the loop when cancel ran
        let queued = scheduler.next_due(Duration::ZERO).unwrap();
        cues.cancel_all(&mut scheduler);
        cues.cancel_all(&mut scheduler);

        assert!(cues.on_fire(&mut scheduler, queued).is_none());
        assert_eq!(cues.pending_count(), 0);
        assert_eq!(scheduler.armed_count(), 0);
    }

    #[test]
    fn test_playback_time_rearms_after_pause() {
        let mut scheduler = ManualScheduler::default();
        let mut cues = CueScheduler::new(script(), 30, CueAnchoring::PlaybackTime);
        cues.schedule(&mut scheduler);
        run_until(&mut cues, &mut scheduler, Duration::from_secs(2));

        cues.suspend(&mut scheduler);
        assert_eq!(scheduler.armed_count(), 0);

        // A 20s pause: nothing fires while suspended
        assert!(run_until(&mut cues, &mut scheduler, Duration::from_secs(22)).is_empty());

        cues.resume(&mut scheduler);
        // 1s of playing time left until the 3s cue
        assert!(run_until(&mut cues, &mut scheduler, Duration::from_millis(22_999)).is_empty());
        assert_eq!(run_until(&mut cues, &mut scheduler, Duration::from_secs(23)), vec!["Breathe in..."]);
        assert_eq!(run_until(&mut cues, &mut scheduler, Duration::from_secs(30)), vec!["Breathe out..."]);
    }

    #[test]
    fn test_zero_length_pause_neither_skips_nor_doubles() {
        let mut scheduler = ManualScheduler::default();
        let mut cues = CueScheduler::new(script(), 30, CueAnchoring::PlaybackTime);
        cues.schedule(&mut scheduler);

        let mut spoken = run_until(&mut cues, &mut scheduler, Duration::from_secs(3));
        cues.suspend(&mut scheduler);
        cues.resume(&mut scheduler);
        spoken.extend(run_until(&mut cues, &mut scheduler, Duration::from_secs(30)));

        assert_eq!(spoken, vec!["Welcome.", "Breathe in...", "Breathe out..."]);
    }

    #[test]
    fn test_wall_clock_keeps_timers_through_pause() {
        let mut scheduler = ManualScheduler::default();
        let mut cues = CueScheduler::new(script(), 30, CueAnchoring::WallClock);
        cues.schedule(&mut scheduler);
        run_until(&mut cues, &mut scheduler, Duration::from_secs(1));

        cues.suspend(&mut scheduler);
        assert_eq!(scheduler.armed_count(), 2);

        // Cues due during the pause still fire on the original timeline
        assert_eq!(
            run_until(&mut cues, &mut scheduler, Duration::from_secs(12)),
            vec!["Breathe in...", "Breathe out..."]
        );
        cues.resume(&mut scheduler);
        assert_eq!(scheduler.armed_count(), 0);
    }

    #[test]
    fn test_schedule_again_restarts_script() {
        let mut scheduler = ManualScheduler::default();
        let mut cues = CueScheduler::new(script(), 30, CueAnchoring::PlaybackTime);
        cues.schedule(&mut scheduler);
        run_until(&mut cues, &mut scheduler, Duration::from_secs(5));

        cues.schedule(&mut scheduler);
        assert_eq!(cues.pending_count(), 3);
        assert_eq!(
            run_until(&mut cues, &mut scheduler, Duration::from_secs(8)),
            vec!["Welcome.", "Breathe in..."]
        );
    }
}
