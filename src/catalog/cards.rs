// Swipe deck cards. Only the meditation action matters to the player.
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardKind {
    Meditation,
    Breathing,
    Perspective,
    Companion,
}

/// What tapping a card does
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CardAction {
    OpenMeditation {
        #[serde(rename = "meditationId")]
        meditation_id: String,
    },
    OpenCompanion,
    None,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: CardKind,
    pub title: String,
    pub subtitle: Option<String>,
    pub content: String,
    pub image_ref: Option<String>,
    pub duration_sec: Option<u32>,
    pub action: CardAction,
}

pub(super) fn builtin_cards() -> Vec<Card> {
    vec![
        Card {
            id: "card_mindful7".to_string(),
            kind: CardKind::Meditation,
            title: "7-Minute Mindfulness".to_string(),
            subtitle: Some("Guided attention + soft breathing".to_string()),
            content: "A guided practice to open attention and soften the breath with gentle voice instruction.".to_string(),
            image_ref: Some("/assets/meditation-card.png".to_string()),
            duration_sec: Some(420),
            action: CardAction::OpenMeditation {
                meditation_id: "mindful7".to_string(),
            },
        },
        Card {
            id: "card_calm3".to_string(),
            kind: CardKind::Meditation,
            title: "3-Minute Calm".to_string(),
            subtitle: Some("A brief guided reset".to_string()),
            content: "Short guided reset with gentle breathing instructions to help you find calm quickly.".to_string(),
            image_ref: Some("/assets/meditation-card.png".to_string()),
            duration_sec: Some(180),
            action: CardAction::OpenMeditation {
                meditation_id: "calm3".to_string(),
            },
        },
        Card {
            id: "card_breathing".to_string(),
            kind: CardKind::Breathing,
            title: "Box Breathing".to_string(),
            subtitle: None,
            content: "Try this simple breathing technique: Inhale for 4, hold for 4, exhale for 4, hold for 4. Repeat to find your calm.".to_string(),
            image_ref: Some("/assets/breathing-card.png".to_string()),
            duration_sec: Some(180),
            action: CardAction::None,
        },
        Card {
            id: "card_journal".to_string(),
            kind: CardKind::Perspective,
            title: "Gratitude Reflection".to_string(),
            subtitle: None,
            content: "What are three things you're grateful for today? Write them down and reflect on why they matter to you.".to_string(),
            image_ref: Some("/assets/journal-card.png".to_string()),
            duration_sec: Some(120),
            action: CardAction::None,
        },
        Card {
            id: "card_companion".to_string(),
            kind: CardKind::Companion,
            title: "AI Companion Chat".to_string(),
            subtitle: None,
            content: "I'm here to listen and support you. What's on your mind today? Share your thoughts and feelings in a safe space.".to_string(),
            image_ref: None,
            duration_sec: None,
            action: CardAction::OpenCompanion,
        },
    ]
}
