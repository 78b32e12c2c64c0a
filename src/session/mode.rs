// Playback mode selection: recorded audio > synthesized speech > silent
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::boundary::{AudioChannel, SilentAudio};
use crate::catalog::MeditationEntry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlaybackMode {
    #[serde(rename = "mp3")]
    Recorded,
    #[serde(rename = "tts")]
    Synthesized,
    #[serde(rename = "silent")]
    Silent,
}

impl PlaybackMode {
    /// Label shown under the player controls
    pub fn label(&self) -> &'static str {
        match self {
            PlaybackMode::Recorded => "Recorded audio",
            PlaybackMode::Synthesized => "Speech synthesis",
            PlaybackMode::Silent => "Silent",
        }
    }
}

/// What the platform can do. Missing capabilities downgrade the mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformCapabilities {
    pub network_fetch: bool,
    pub speech_synthesis: bool,
    pub audio_output: bool,
}

/// Checks whether a recorded source can be played. Never fails: every
/// problem is reported as `false`.
#[async_trait]
pub trait SourceProber: Send + Sync {
    async fn probe(&self, audio_ref: Option<&str>) -> bool;
}

/// Opens the recorded-audio channel once the source is known to be reachable
#[async_trait]
pub trait AudioLoader: Send + Sync {
    async fn load(&self, audio_ref: &str) -> Box<dyn AudioChannel>;
}

/// The mode decision given the probe result and speech capability
pub fn decide(source_reachable: bool, speech_synthesis: bool) -> PlaybackMode {
    if source_reachable {
        PlaybackMode::Recorded
    } else if speech_synthesis {
        PlaybackMode::Synthesized
    } else {
        PlaybackMode::Silent
    }
}

/// Pick the mode for a session. The prober is only consulted when there is
/// an audio device to play on and the entry has a source.
pub async fn select_mode(
    entry: &MeditationEntry,
    capabilities: &PlatformCapabilities,
    prober: &dyn SourceProber,
) -> PlaybackMode {
    let reachable = match entry.audio_ref.as_deref() {
        Some(audio_ref) if capabilities.audio_output => prober.probe(Some(audio_ref)).await,
        _ => false,
    };

    let mode = decide(reachable, capabilities.speech_synthesis);
    tracing::info!(meditation_id = %entry.id, ?mode, reachable, "playback mode selected");
    mode
}

/// Select the mode and open the audio channel it needs
pub async fn resolve_playback(
    entry: &MeditationEntry,
    capabilities: &PlatformCapabilities,
    prober: &dyn SourceProber,
    loader: &dyn AudioLoader,
) -> (PlaybackMode, Box<dyn AudioChannel>) {
    let mode = select_mode(entry, capabilities, prober).await;

    let audio: Box<dyn AudioChannel> = match (mode, entry.audio_ref.as_deref()) {
        (PlaybackMode::Recorded, Some(audio_ref)) => loader.load(audio_ref).await,
        _ => Box::new(SilentAudio),
    };

    (mode, audio)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::testing::{CountingProber, RecordingLoader};

    fn calm3() -> MeditationEntry {
        MeditationEntry::new("calm3", "3-Minute Calm", 180).with_audio("https://x/calm3.mp3")
    }

    fn caps(speech: bool) -> PlatformCapabilities {
        PlatformCapabilities {
            network_fetch: true,
            speech_synthesis: speech,
            audio_output: true,
        }
    }

    #[test]
    fn test_decision_table() {
        assert_eq!(decide(true, true), PlaybackMode::Recorded);
        assert_eq!(decide(true, false), PlaybackMode::Recorded);
        assert_eq!(decide(false, true), PlaybackMode::Synthesized);
        assert_eq!(decide(false, false), PlaybackMode::Silent);
    }

    #[test]
    fn test_wire_names() {
        assert_eq!(serde_json::to_string(&PlaybackMode::Recorded).unwrap(), "\"mp3\"");
        assert_eq!(serde_json::to_string(&PlaybackMode::Synthesized).unwrap(), "\"tts\"");
        assert_eq!(serde_json::to_string(&PlaybackMode::Silent).unwrap(), "\"silent\"");
    }

    #[tokio::test]
    async fn test_reachable_source_selects_recorded() {
        let prober = CountingProber::new(true);
        let mode = select_mode(&calm3(), &caps(true), &prober).await;
        assert_eq!(mode, PlaybackMode::Recorded);
        assert_eq!(prober.calls(), 1);
    }

    #[tokio::test]
    async fn test_unreachable_source_with_speech_selects_synthesized() {
        let prober = CountingProber::new(false);
        assert_eq!(select_mode(&calm3(), &caps(true), &prober).await, PlaybackMode::Synthesized);
        assert_eq!(select_mode(&calm3(), &caps(false), &prober).await, PlaybackMode::Silent);
    }

    #[tokio::test]
    async fn test_missing_audio_ref_skips_probe() {
        let prober = CountingProber::new(true);
        let entry = MeditationEntry::new("bare", "No audio", 60);
        assert_eq!(select_mode(&entry, &caps(true), &prober).await, PlaybackMode::Synthesized);
        assert_eq!(prober.calls(), 0);
    }

    #[tokio::test]
    async fn test_no_audio_device_skips_probe() {
        let prober = CountingProber::new(true);
        let no_device = PlatformCapabilities {
            audio_output: false,
            ..caps(false)
        };
        assert_eq!(select_mode(&calm3(), &no_device, &prober).await, PlaybackMode::Silent);
        assert_eq!(prober.calls(), 0);
    }

    #[tokio::test]
    async fn test_loader_only_used_for_recorded() {
        let loader = RecordingLoader::default();

        let (mode, _) = resolve_playback(&calm3(), &caps(true), &CountingProber::new(false), &loader).await;
        assert_eq!(mode, PlaybackMode::Synthesized);
        assert!(loader.loaded().is_empty());

        let (mode, _) = resolve_playback(&calm3(), &caps(true), &CountingProber::new(true), &loader).await;
        assert_eq!(mode, PlaybackMode::Recorded);
        assert_eq!(loader.loaded(), vec!["https://x/calm3.mp3".to_string()]);
    }
}
