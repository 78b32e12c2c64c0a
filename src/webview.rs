// Session outputs delivered to the webview as Tauri events
//
// Speech synthesis runs in the webview's engine; the backend only sends
// speak/pause/resume/cancel commands in order.

use serde::Serialize;
use tauri::{AppHandle, Emitter};

use crate::routes::{NavigationEvent, Route};
use crate::session::{
    AnalyticsEvent, AnalyticsSink, Navigator, SpeechSink, TracingAnalytics, Utterance,
};

pub const PLAYER_STATE_EVENT: &str = "player-state";
pub const NAVIGATE_EVENT: &str = "navigate";
pub const ANALYTICS_EVENT: &str = "analytics";
pub const SPEAK_EVENT: &str = "guidance-speak";
pub const SPEECH_PAUSE_EVENT: &str = "guidance-pause";
pub const SPEECH_RESUME_EVENT: &str = "guidance-resume";
pub const SPEECH_CANCEL_EVENT: &str = "guidance-cancel";

pub fn emit<S: Serialize + Clone>(app: &AppHandle, event: &str, payload: S) {
    if let Err(e) = app.emit(event, payload) {
        tracing::warn!(event, "Failed to emit event: {}", e);
    }
}

pub struct WebviewSpeech {
    app: AppHandle,
}

impl WebviewSpeech {
    pub fn new(app: AppHandle) -> Self {
        Self { app }
    }
}

impl SpeechSink for WebviewSpeech {
    fn speak(&self, utterance: &Utterance) {
        emit(&self.app, SPEAK_EVENT, utterance.clone());
    }

    fn pause(&self) {
        emit(&self.app, SPEECH_PAUSE_EVENT, ());
    }

    fn resume(&self) {
        emit(&self.app, SPEECH_RESUME_EVENT, ());
    }

    fn cancel(&self) {
        emit(&self.app, SPEECH_CANCEL_EVENT, ());
    }
}

pub struct WebviewNavigator {
    app: AppHandle,
}

impl WebviewNavigator {
    pub fn new(app: AppHandle) -> Self {
        Self { app }
    }
}

impl Navigator for WebviewNavigator {
    fn show_completion(&self, meditation_id: &str) {
        emit(&self.app, NAVIGATE_EVENT, NavigationEvent::push(Route::completion(meditation_id)));
    }

    fn go_back(&self) {
        emit(&self.app, NAVIGATE_EVENT, NavigationEvent::Back);
    }
}

/// Forwards events to the webview's analytics provider and logs them
pub struct WebviewAnalytics {
    app: AppHandle,
    log: TracingAnalytics,
}

impl WebviewAnalytics {
    pub fn new(app: AppHandle) -> Self {
        Self {
            app,
            log: TracingAnalytics,
        }
    }
}

impl AnalyticsSink for WebviewAnalytics {
    fn track(&self, event: &AnalyticsEvent) {
        self.log.track(event);
        emit(&self.app, ANALYTICS_EVENT, event.clone());
    }
}
