// Test doubles for the session collaborators
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use super::boundary::{AnalyticsEvent, AnalyticsSink, AudioChannel, Navigator, SpeechSink, Utterance};
use super::mode::{AudioLoader, SourceProber};
use super::timers::{Fired, Scheduler, TimerHandle, TimerKind};

struct ManualTimer {
    due: Duration,
    period: Option<Duration>,
    kind: TimerKind,
}

/// Virtual-clock scheduler. Time only moves when a test advances it.
#[derive(Default)]
pub struct ManualScheduler {
    now: Duration,
    next_id: u64,
    timers: BTreeMap<TimerHandle, ManualTimer>,
}

impl ManualScheduler {
    pub fn armed_count(&self) -> usize {
        self.timers.len()
    }

    /// Pop the earliest timer due at or before `until`, moving the clock to it
    pub fn next_due(&mut self, until: Duration) -> Option<Fired> {
        let (&handle, _) = self
            .timers
            .iter()
            .filter(|(_, t)| t.due <= until)
            .min_by_key(|(h, t)| (t.due, **h))?;

        let timer = self.timers.remove(&handle)?;
        self.now = self.now.max(timer.due);
        if let Some(period) = timer.period {
            self.timers.insert(
                handle,
                ManualTimer {
                    due: timer.due + period,
                    ..timer
                },
            );
        }
        Some(Fired {
            handle,
            kind: timer.kind,
        })
    }

    pub fn set_now(&mut self, now: Duration) {
        self.now = self.now.max(now);
    }

    fn insert(&mut self, delay: Duration, period: Option<Duration>, kind: TimerKind) -> TimerHandle {
        self.next_id += 1;
        let handle = TimerHandle::new(self.next_id);
        self.timers.insert(
            handle,
            ManualTimer {
                due: self.now + delay,
                period,
                kind,
            },
        );
        handle
    }
}

impl Scheduler for ManualScheduler {
    fn now(&self) -> Duration {
        self.now
    }

    fn arm(&mut self, delay: Duration, kind: TimerKind) -> TimerHandle {
        self.insert(delay, None, kind)
    }

    fn arm_repeating(&mut self, period: Duration, kind: TimerKind) -> TimerHandle {
        self.insert(period, Some(period), kind)
    }

    fn disarm(&mut self, handle: TimerHandle) {
        self.timers.remove(&handle);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeechCall {
    Speak(String),
    Pause,
    Resume,
    Cancel,
}

#[derive(Default)]
pub struct RecordingSpeech {
    calls: Mutex<Vec<SpeechCall>>,
}

impl RecordingSpeech {
    pub fn calls(&self) -> Vec<SpeechCall> {
        self.calls.lock().clone()
    }

    pub fn spoken(&self) -> Vec<String> {
        self.calls
            .lock()
            .iter()
            .filter_map(|c| match c {
                SpeechCall::Speak(text) => Some(text.clone()),
                _ => None,
            })
            .collect()
    }
}

impl SpeechSink for RecordingSpeech {
    fn speak(&self, utterance: &Utterance) {
        self.calls.lock().push(SpeechCall::Speak(utterance.text.clone()));
    }

    fn pause(&self) {
        self.calls.lock().push(SpeechCall::Pause);
    }

    fn resume(&self) {
        self.calls.lock().push(SpeechCall::Resume);
    }

    fn cancel(&self) {
        self.calls.lock().push(SpeechCall::Cancel);
    }
}

#[derive(Default)]
pub struct RecordingAnalytics {
    events: Mutex<Vec<AnalyticsEvent>>,
}

impl RecordingAnalytics {
    pub fn events(&self) -> Vec<AnalyticsEvent> {
        self.events.lock().clone()
    }
}

impl AnalyticsSink for RecordingAnalytics {
    fn track(&self, event: &AnalyticsEvent) {
        self.events.lock().push(event.clone());
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavCall {
    Completion(String),
    Back,
}

#[derive(Default)]
pub struct RecordingNavigator {
    calls: Mutex<Vec<NavCall>>,
}

impl RecordingNavigator {
    pub fn calls(&self) -> Vec<NavCall> {
        self.calls.lock().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn show_completion(&self, meditation_id: &str) {
        self.calls.lock().push(NavCall::Completion(meditation_id.to_string()));
    }

    fn go_back(&self) {
        self.calls.lock().push(NavCall::Back);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioCall {
    PlayFromStart,
    Pause,
    Resume,
    Stop,
}

/// Audio channel whose call log outlives the boxed channel
#[derive(Clone, Default)]
pub struct RecordingAudio {
    calls: Arc<Mutex<Vec<AudioCall>>>,
}

impl RecordingAudio {
    pub fn calls(&self) -> Vec<AudioCall> {
        self.calls.lock().clone()
    }
}

impl AudioChannel for RecordingAudio {
    fn play_from_start(&mut self) {
        self.calls.lock().push(AudioCall::PlayFromStart);
    }

    fn pause(&mut self) {
        self.calls.lock().push(AudioCall::Pause);
    }

    fn resume(&mut self) {
        self.calls.lock().push(AudioCall::Resume);
    }

    fn stop(&mut self) {
        self.calls.lock().push(AudioCall::Stop);
    }
}

pub struct CountingProber {
    reachable: bool,
    calls: AtomicUsize,
}

impl CountingProber {
    pub fn new(reachable: bool) -> Self {
        Self {
            reachable,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SourceProber for CountingProber {
    async fn probe(&self, _audio_ref: Option<&str>) -> bool {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.reachable
    }
}

/// Prober that never answers, keeping a session in Loading
pub struct StalledProber;

#[async_trait]
impl SourceProber for StalledProber {
    async fn probe(&self, _audio_ref: Option<&str>) -> bool {
        std::future::pending::<bool>().await
    }
}

/// Loader handing out one shared `RecordingAudio`
#[derive(Default)]
pub struct RecordingLoader {
    pub audio: RecordingAudio,
    loaded: Mutex<Vec<String>>,
}

impl RecordingLoader {
    pub fn loaded(&self) -> Vec<String> {
        self.loaded.lock().clone()
    }
}

#[async_trait]
impl AudioLoader for RecordingLoader {
    async fn load(&self, audio_ref: &str) -> Box<dyn AudioChannel> {
        self.loaded.lock().push(audio_ref.to_string());
        Box::new(self.audio.clone())
    }
}
