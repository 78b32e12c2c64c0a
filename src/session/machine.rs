// Player state machine
//
// Idle -> Loading -> Ready -> Playing <-> Paused, Playing -> Completed,
// and any state -> Exited. The machine owns the countdown, the cue
// scheduler and the audio channel of exactly one session; nothing else
// mutates them.

use std::sync::Arc;

use super::boundary::{
    AnalyticsEvent, AnalyticsSink, AudioChannel, Navigator, SilentAudio, SpeechSink, Utterance,
};
use super::countdown::{Countdown, TickOutcome};
use super::cues::CueScheduler;
use super::mode::PlaybackMode;
use super::snapshot::{format_clock, progress, PlayerPhase, PlayerSnapshot};
use super::timers::{Fired, Scheduler, TimerKind};
use crate::catalog::{Cue, MeditationEntry};
use crate::settings::CueAnchoring;

/// User actions coming from the player screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerCommand {
    Start,
    Pause,
    Resume,
    TogglePlay,
    Exit,
}

/// Where a session reports to
#[derive(Clone)]
pub struct SessionOutputs {
    pub speech: Arc<dyn SpeechSink>,
    pub analytics: Arc<dyn AnalyticsSink>,
    pub navigator: Arc<dyn Navigator>,
}

/// The mutable runtime state of one session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerSession {
    pub entry: MeditationEntry,
    pub mode: PlaybackMode,
    pub remaining_sec: u32,
    pub is_playing: bool,
    pub is_ready: bool,
}

pub struct PlayerMachine<S: Scheduler> {
    phase: PlayerPhase,
    entry: MeditationEntry,
    mode: PlaybackMode,
    countdown: Countdown,
    cues: CueScheduler,
    audio: Box<dyn AudioChannel>,
    scheduler: S,
    outputs: SessionOutputs,
    /// Audio or speech has been driven since the last release
    engaged: bool,
}

impl<S: Scheduler> PlayerMachine<S> {
    pub fn new(
        entry: MeditationEntry,
        script: Vec<Cue>,
        anchoring: CueAnchoring,
        scheduler: S,
        outputs: SessionOutputs,
    ) -> Self {
        let countdown = Countdown::new(entry.duration_sec);
        let cues = CueScheduler::new(script, entry.duration_sec, anchoring);
        Self {
            phase: PlayerPhase::Idle,
            entry,
            mode: PlaybackMode::Silent,
            countdown,
            cues,
            audio: Box::new(SilentAudio),
            scheduler,
            outputs,
            engaged: false,
        }
    }

    pub fn phase(&self) -> PlayerPhase {
        self.phase
    }

    pub fn mode(&self) -> PlaybackMode {
        self.mode
    }

    pub fn entry(&self) -> &MeditationEntry {
        &self.entry
    }

    pub fn remaining_sec(&self) -> u32 {
        self.countdown.remaining_sec()
    }

    pub fn is_ready(&self) -> bool {
        !matches!(self.phase, PlayerPhase::Idle | PlayerPhase::Loading)
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    pub fn session(&self) -> PlayerSession {
        PlayerSession {
            entry: self.entry.clone(),
            mode: self.mode,
            remaining_sec: self.remaining_sec(),
            is_playing: self.phase == PlayerPhase::Playing,
            is_ready: self.is_ready(),
        }
    }

    /// The session as the player screen renders it
    pub fn snapshot(&self) -> PlayerSnapshot {
        let PlayerSession {
            entry,
            mode,
            remaining_sec,
            is_playing,
            is_ready,
        } = self.session();

        PlayerSnapshot {
            meditation_id: entry.id,
            title: entry.title,
            subtitle: entry.subtitle,
            cover_ref: entry.cover_ref,
            mode,
            mode_label: mode.label(),
            phase: self.phase,
            status: self.phase.label(),
            duration_sec: entry.duration_sec,
            remaining_sec,
            is_playing,
            is_ready,
            clock: format_clock(remaining_sec),
            progress: progress(remaining_sec, entry.duration_sec),
        }
    }

    /// Screen entered: mode resolution is underway
    pub fn begin_loading(&mut self) -> bool {
        if self.phase != PlayerPhase::Idle {
            return false;
        }
        self.phase = PlayerPhase::Loading;
        tracing::debug!(meditation_id = %self.entry.id, "loading meditation");
        true
    }

    /// Mode resolved. The audio channel is only kept for recorded sessions.
    pub fn resolve(&mut self, mode: PlaybackMode, audio: Box<dyn AudioChannel>) -> bool {
        if self.phase != PlayerPhase::Loading {
            tracing::debug!(phase = ?self.phase, "ignoring mode resolution outside loading");
            return false;
        }
        self.mode = mode;
        self.audio = match mode {
            PlaybackMode::Recorded => audio,
            _ => Box::new(SilentAudio),
        };
        self.phase = PlayerPhase::Ready;
        tracing::info!(meditation_id = %self.entry.id, ?mode, "meditation ready");
        true
    }

    pub fn apply(&mut self, command: PlayerCommand) -> bool {
        let applied = match command {
            PlayerCommand::Start => self.start(),
            PlayerCommand::Pause => self.pause(),
            PlayerCommand::Resume => self.resume(),
            PlayerCommand::TogglePlay => self.toggle_play(),
            PlayerCommand::Exit => self.exit(),
        };
        if !applied {
            tracing::debug!(?command, phase = ?self.phase, "command ignored");
        }
        applied
    }

    /// Start from the top. Allowed from Ready, or from Paused while the
    /// countdown is still at the full duration.
    pub fn start(&mut self) -> bool {
        let at_full = self.countdown.remaining_sec() == self.countdown.duration_sec();
        let restart = self.phase == PlayerPhase::Paused && at_full;
        if self.phase != PlayerPhase::Ready && !restart {
            return false;
        }

        self.phase = PlayerPhase::Playing;
        self.engaged = true;
        self.countdown.start(&mut self.scheduler);

        match self.mode {
            PlaybackMode::Recorded => self.audio.play_from_start(),
            PlaybackMode::Synthesized => {
                if restart {
                    self.outputs.speech.cancel();
                    self.outputs.speech.resume();
                }
                let armed = self.cues.schedule(&mut self.scheduler);
                tracing::debug!(armed, "guidance cues armed");
            }
            PlaybackMode::Silent => {}
        }

        self.outputs.analytics.track(&AnalyticsEvent::MeditationStart {
            meditation_id: self.entry.id.clone(),
            mode: self.mode,
        });
        tracing::info!(meditation_id = %self.entry.id, mode = ?self.mode, "meditation started");
        true
    }

    pub fn pause(&mut self) -> bool {
        if self.phase != PlayerPhase::Playing {
            return false;
        }
        self.phase = PlayerPhase::Paused;
        self.countdown.stop(&mut self.scheduler);

        match self.mode {
            PlaybackMode::Recorded => self.audio.pause(),
            PlaybackMode::Synthesized => {
                self.outputs.speech.pause();
                self.cues.suspend(&mut self.scheduler);
            }
            PlaybackMode::Silent => {}
        }
        tracing::debug!(remaining_sec = self.remaining_sec(), "meditation paused");
        true
    }

    pub fn resume(&mut self) -> bool {
        if self.phase != PlayerPhase::Paused {
            return false;
        }
        self.phase = PlayerPhase::Playing;
        self.engaged = true;
        self.countdown.start(&mut self.scheduler);

        match self.mode {
            PlaybackMode::Recorded => self.audio.resume(),
            PlaybackMode::Synthesized => {
                self.outputs.speech.resume();
                self.cues.resume(&mut self.scheduler);
            }
            PlaybackMode::Silent => {}
        }
        tracing::debug!(remaining_sec = self.remaining_sec(), "meditation resumed");
        true
    }

    /// Playing pauses; otherwise start at full duration, resume elsewhere
    pub fn toggle_play(&mut self) -> bool {
        if self.phase == PlayerPhase::Playing {
            self.pause()
        } else if self.countdown.remaining_sec() == self.countdown.duration_sec() {
            self.start()
        } else {
            self.resume()
        }
    }

    /// Leave the player from any state
    pub fn exit(&mut self) -> bool {
        if self.phase == PlayerPhase::Exited {
            return false;
        }
        self.stop_all();
        self.phase = PlayerPhase::Exited;
        self.outputs.navigator.go_back();
        tracing::info!(meditation_id = %self.entry.id, "meditation exited");
        true
    }

    /// The screen went away without an explicit exit
    pub fn teardown(&mut self) {
        self.stop_all();
        tracing::debug!(meditation_id = %self.entry.id, phase = ?self.phase, "session torn down");
    }

    /// Release the tick, audio, cue timers and speech. Idempotent, and the
    /// only place playback resources are released.
    pub fn stop_all(&mut self) {
        self.countdown.stop(&mut self.scheduler);
        self.cues.cancel_all(&mut self.scheduler);

        if self.engaged {
            self.audio.stop();
            if self.mode == PlaybackMode::Synthesized {
                self.outputs.speech.cancel();
            }
            self.engaged = false;
        }

        if self.phase == PlayerPhase::Playing {
            self.phase = PlayerPhase::Paused;
        }
    }

    pub fn on_timer(&mut self, fired: Fired) {
        match fired.kind {
            TimerKind::Tick => {
                if self.phase != PlayerPhase::Playing || !self.countdown.owns(fired.handle) {
                    tracing::trace!(?fired, "stale tick");
                    return;
                }
                match self.countdown.tick() {
                    TickOutcome::Running { remaining_sec } => {
                        tracing::trace!(remaining_sec, "tick");
                    }
                    TickOutcome::Completed => self.complete(),
                    TickOutcome::AlreadyComplete => {}
                }
            }
            TimerKind::Cue(_) => {
                if self.phase.is_terminal() {
                    return;
                }
                if let Some(cue) = self.cues.on_fire(&mut self.scheduler, fired) {
                    tracing::debug!(offset_sec = cue.offset_sec, "speaking cue");
                    self.outputs.speech.speak(&Utterance::new(&cue.text));
                }
            }
        }
    }

    fn complete(&mut self) {
        self.stop_all();
        self.phase = PlayerPhase::Completed;

        self.outputs.analytics.track(&AnalyticsEvent::MeditationComplete {
            meditation_id: self.entry.id.clone(),
            duration_sec: self.entry.duration_sec,
            mode: self.mode,
        });
        self.outputs.navigator.show_completion(&self.entry.id);
        tracing::info!(meditation_id = %self.entry.id, mode = ?self.mode, "meditation complete");
    }
}

impl<S: Scheduler> Drop for PlayerMachine<S> {
    fn drop(&mut self) {
        self.stop_all();
    }
}
