// Built-in meditation entries
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Id of the entry used whenever a requested meditation is unknown
pub const DEFAULT_MEDITATION_ID: &str = "mindful7";

/// A playable meditation. Immutable once the catalog is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeditationEntry {
    pub id: String,
    pub title: String,
    pub subtitle: Option<String>,
    pub duration_sec: u32,
    pub audio_ref: Option<String>,
    pub cover_ref: Option<String>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
}

impl MeditationEntry {
    pub fn new(id: &str, title: &str, duration_sec: u32) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            subtitle: None,
            duration_sec,
            audio_ref: None,
            cover_ref: None,
            tags: BTreeSet::new(),
        }
    }

    pub fn with_subtitle(mut self, subtitle: &str) -> Self {
        self.subtitle = Some(subtitle.to_string());
        self
    }

    pub fn with_audio(mut self, audio_ref: &str) -> Self {
        self.audio_ref = Some(audio_ref.to_string());
        self
    }

    pub fn with_cover(mut self, cover_ref: &str) -> Self {
        self.cover_ref = Some(cover_ref.to_string());
        self
    }

    pub fn with_tags(mut self, tags: &[&str]) -> Self {
        self.tags = tags.iter().map(|t| t.to_string()).collect();
        self
    }
}

pub(super) fn builtin_meditations() -> Vec<MeditationEntry> {
    vec![
        MeditationEntry::new(DEFAULT_MEDITATION_ID, "7-Minute Mindfulness", 420)
            .with_subtitle("Guided attention + soft breathing")
            .with_audio("/audio/mindful7.mp3")
            .with_cover("/images/meditations/mindful7.jpg")
            .with_tags(&["mindfulness", "breathing"]),
        MeditationEntry::new("calm3", "3-Minute Calm", 180)
            .with_subtitle("A brief guided reset")
            .with_audio("/audio/calm3.mp3")
            .with_cover("/images/meditations/calm3.jpg")
            .with_tags(&["calm", "reset"]),
        MeditationEntry::new("calm2", "2-Minute Calm", 120)
            .with_subtitle("Short reset with gentle guidance")
            .with_audio("/audio/calm2.mp3")
            .with_cover("/images/meditations/calm2.jpg")
            .with_tags(&["calm", "reset"]),
        MeditationEntry::new("mindful5", "5-Minute Mindfulness", 300)
            .with_subtitle("Center yourself and breathe")
            .with_audio("/audio/mindful5.mp3")
            .with_cover("/images/meditations/mindful5.jpg")
            .with_tags(&["mindfulness"]),
        // Shares the mindful5 clip and cover until a dedicated recording exists
        MeditationEntry::new("deep10", "10-Minute Deep Focus", 600)
            .with_subtitle("Extended mindfulness practice")
            .with_audio("/audio/mindful5.mp3")
            .with_cover("/images/meditations/mindful5.jpg")
            .with_tags(&["focus", "deep"]),
    ]
}
