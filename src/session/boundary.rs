// Collaborators the player drives: audio, speech, analytics and navigation
use serde::Serialize;

use super::mode::PlaybackMode;

/// The recorded-audio output of one session.
///
/// Implementations absorb playback failures themselves (log and stay silent);
/// the countdown completes regardless of what the audio does.
pub trait AudioChannel: Send {
    /// Rewind to position 0 and play
    fn play_from_start(&mut self);
    fn pause(&mut self);
    fn resume(&mut self);
    /// Pause and rewind to 0
    fn stop(&mut self);
}

/// Audio channel for sessions without recorded audio
#[derive(Debug, Default)]
pub struct SilentAudio;

impl AudioChannel for SilentAudio {
    fn play_from_start(&mut self) {}
    fn pause(&mut self) {}
    fn resume(&mut self) {}
    fn stop(&mut self) {}
}

/// A guidance phrase with its prosody. Prosody is fixed for every cue.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Utterance {
    pub text: String,
    pub rate: f32,
    pub pitch: f32,
    pub volume: f32,
}

impl Utterance {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            rate: 1.0,
            pitch: 1.0,
            volume: 1.0,
        }
    }
}

/// Speech-synthesis queue. Utterances spoken while paused wait in the queue.
pub trait SpeechSink: Send + Sync {
    fn speak(&self, utterance: &Utterance);
    fn pause(&self);
    fn resume(&self);
    /// Drop queued utterances and interrupt the current one
    fn cancel(&self);
}

#[derive(Debug, Default)]
pub struct NoSpeech;

impl SpeechSink for NoSpeech {
    fn speak(&self, _utterance: &Utterance) {}
    fn pause(&self) {}
    fn resume(&self) {}
    fn cancel(&self) {}
}

/// Lifecycle events reported to analytics
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", content = "props", rename_all = "snake_case")]
pub enum AnalyticsEvent {
    MeditationStart {
        #[serde(rename = "meditationId")]
        meditation_id: String,
        mode: PlaybackMode,
    },
    MeditationComplete {
        #[serde(rename = "meditationId")]
        meditation_id: String,
        #[serde(rename = "durationSec")]
        duration_sec: u32,
        mode: PlaybackMode,
    },
}

impl AnalyticsEvent {
    pub fn name(&self) -> &'static str {
        match self {
            AnalyticsEvent::MeditationStart { .. } => "meditation_start",
            AnalyticsEvent::MeditationComplete { .. } => "meditation_complete",
        }
    }
}

/// Fire-and-forget analytics
pub trait AnalyticsSink: Send + Sync {
    fn track(&self, event: &AnalyticsEvent);
}

/// Logs events under the `analytics` target until a provider is wired in
#[derive(Debug, Default)]
pub struct TracingAnalytics;

impl AnalyticsSink for TracingAnalytics {
    fn track(&self, event: &AnalyticsEvent) {
        let props = serde_json::to_string(event).unwrap_or_default();
        tracing::debug!(target: "analytics", event = event.name(), %props);
    }
}

/// The two ways a session leaves the player screen
pub trait Navigator: Send + Sync {
    fn show_completion(&self, meditation_id: &str);
    fn go_back(&self);
}
