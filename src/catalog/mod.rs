// Content catalog module
// Static registry of meditations, guidance scripts and swipe cards

pub mod cards;
pub mod guidance;
pub mod meditations;

use std::collections::{BTreeMap, HashMap};

pub use cards::{Card, CardAction, CardKind};
pub use guidance::Cue;
pub use meditations::{MeditationEntry, DEFAULT_MEDITATION_ID};

/// Read-only content registry, built once at startup
#[derive(Debug, Clone)]
pub struct Catalog {
    meditations: BTreeMap<String, MeditationEntry>,
    guidance: HashMap<String, Vec<Cue>>,
    cards: Vec<Card>,
    fallback: MeditationEntry,
}

impl Catalog {
    /// The catalog shipped with the app
    pub fn builtin() -> Self {
        let meditations: BTreeMap<String, MeditationEntry> = meditations::builtin_meditations()
            .into_iter()
            .map(|m| (m.id.clone(), m))
            .collect();

        // The builtin table always carries the default entry
        let fallback = meditations
            .get(DEFAULT_MEDITATION_ID)
            .cloned()
            .unwrap_or_else(|| MeditationEntry::new(DEFAULT_MEDITATION_ID, "7-Minute Mindfulness", 420));

        Self {
            meditations,
            guidance: guidance::builtin_guidance(),
            cards: cards::builtin_cards(),
            fallback,
        }
    }

    /// Use another known entry as the fallback. Unknown ids keep the current one.
    pub fn with_default(mut self, id: &str) -> Self {
        match self.meditations.get(id) {
            Some(entry) => self.fallback = entry.clone(),
            None => tracing::warn!(meditation_id = id, "default meditation not in catalog, keeping {}", self.fallback.id),
        }
        self
    }

    /// Look up a meditation, falling back to the default entry for unknown ids
    pub fn get(&self, id: &str) -> &MeditationEntry {
        match self.meditations.get(id) {
            Some(entry) => entry,
            None => {
                tracing::debug!(meditation_id = id, fallback = %self.fallback.id, "unknown meditation id");
                &self.fallback
            }
        }
    }

    pub fn find(&self, id: &str) -> Option<&MeditationEntry> {
        self.meditations.get(id)
    }

    pub fn default_entry(&self) -> &MeditationEntry {
        &self.fallback
    }

    /// Guidance cues for a meditation, empty when it has no script
    pub fn guidance(&self, id: &str) -> &[Cue] {
        self.guidance.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn meditations(&self) -> impl Iterator<Item = &MeditationEntry> {
        self.meditations.values()
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn card(&self, id: &str) -> Option<&Card> {
        self.cards.iter().find(|c| c.id == id)
    }
}
