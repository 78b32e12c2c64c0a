// Voice guidance scripts, spoken in synthesized-speech mode
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A guidance phrase spoken `offset_sec` seconds into the session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cue {
    pub offset_sec: u32,
    pub text: String,
}

impl Cue {
    pub fn new(offset_sec: u32, text: &str) -> Self {
        Self {
            offset_sec,
            text: text.to_string(),
        }
    }
}

fn script(lines: &[(u32, &str)]) -> Vec<Cue> {
    lines.iter().map(|(t, text)| Cue::new(*t, text)).collect()
}

pub(super) fn builtin_guidance() -> HashMap<String, Vec<Cue>> {
    let mut guidance = HashMap::new();

    // 7-minute mindfulness, breathing cadence cues roughly every 20-30s
    guidance.insert(
        "mindful7".to_string(),
        script(&[
            (0, "Welcome. Find a comfy posture. Let your shoulders soften."),
            (6, "If it helps, close your eyes, or lower your gaze."),
            (14, "Take a slow inhale through the nose... and a long gentle exhale."),
            (26, "Let the breath settle into a natural rhythm."),
            (40, "Notice contact points: feet on the floor, body on the seat."),
            (55, "We'll rest attention on the sensation of breathing."),
            (70, "Inhale four... hold one... exhale six... and soften the jaw."),
            (100, "When the mind wanders, gently note 'thinking', and return to the breath."),
            (130, "Sense the rise and fall in the chest or the belly."),
            (160, "If there's tension, breathe into it, and let it release on the exhale."),
            (190, "Allow sounds to come and go. Nothing to fix."),
            (220, "Back to the breath. Inhale four... hold one... exhale six."),
            (250, "Notice the space around the breath, the pauses between."),
            (280, "If you feel sleepy or restless, that's okay. Start again, kindly."),
            (310, "Widen attention: body, breath, and sounds, held with ease."),
            (340, "One more minute. Inhale four... hold one... exhale six."),
            (380, "Gently deepen the breath. Wiggle fingers and toes."),
            (405, "When you're ready, open the eyes. Notice how you feel."),
        ]),
    );

    guidance.insert(
        "calm3".to_string(),
        script(&[
            (0, "Let's reset together. Relax the shoulders."),
            (3, "Breathe in through the nose for four... hold one... out for six."),
            (13, "Again. In four... hold... out six. Let the belly soften."),
            (25, "Notice one place that feels steady, maybe the feet or the seat."),
            (38, "If thoughts appear, label them 'thinking', and return to the breath."),
            (50, "In four... hold... out six. Imagine exhaling any tightness."),
            (70, "Soften the jaw and the muscles around the eyes."),
            (85, "One more slow breath. In four... hold... out six."),
            (105, "Gently open the eyes. Carry this calm into the next thing."),
        ]),
    );

    guidance
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripts_are_ordered_by_offset() {
        for (id, cues) in builtin_guidance() {
            assert!(
                cues.windows(2).all(|w| w[0].offset_sec <= w[1].offset_sec),
                "script {} is out of order",
                id
            );
        }
    }
}
