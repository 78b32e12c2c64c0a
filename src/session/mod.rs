// Meditation session module
// Mode selection, countdown, guidance cues and the player state machine

pub mod boundary;
pub mod countdown;
pub mod cues;
pub mod driver;
pub mod machine;
pub mod mode;
pub mod prober;
pub mod snapshot;
pub mod timers;

#[cfg(test)]
pub mod testing;

pub use boundary::{
    AnalyticsEvent, AnalyticsSink, AudioChannel, Navigator, NoSpeech, SilentAudio, SpeechSink,
    TracingAnalytics, Utterance,
};
pub use driver::{PlayerEnvironment, PlayerHandle};
pub use machine::{PlayerCommand, PlayerMachine, PlayerSession, SessionOutputs};
pub use mode::{decide, resolve_playback, select_mode, AudioLoader, PlatformCapabilities, PlaybackMode, SourceProber};
pub use prober::{HttpProber, ProbeReport, SoundDiagnostics, SourceRef};
pub use snapshot::{PlayerPhase, PlayerSnapshot};
pub use timers::{Scheduler, TokioScheduler};
