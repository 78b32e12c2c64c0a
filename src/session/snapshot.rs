// Read-only view of a session for the player screen
use serde::Serialize;

use super::mode::PlaybackMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerPhase {
    Idle,
    Loading,
    Ready,
    Playing,
    Paused,
    Completed,
    Exited,
}

impl PlayerPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PlayerPhase::Completed | PlayerPhase::Exited)
    }

    pub fn label(&self) -> &'static str {
        match self {
            PlayerPhase::Idle | PlayerPhase::Loading => "Loading...",
            PlayerPhase::Ready => "Ready",
            PlayerPhase::Playing => "Playing",
            PlayerPhase::Paused => "Paused",
            PlayerPhase::Completed => "Complete",
            PlayerPhase::Exited => "Stopped",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSnapshot {
    pub meditation_id: String,
    pub title: String,
    pub subtitle: Option<String>,
    pub cover_ref: Option<String>,
    pub mode: PlaybackMode,
    pub mode_label: &'static str,
    pub phase: PlayerPhase,
    pub status: &'static str,
    pub duration_sec: u32,
    pub remaining_sec: u32,
    pub is_playing: bool,
    pub is_ready: bool,
    /// `m:ss`
    pub clock: String,
    /// remaining / duration, drives the progress ring
    pub progress: f32,
}

pub fn format_clock(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

pub fn progress(remaining_sec: u32, duration_sec: u32) -> f32 {
    if duration_sec == 0 {
        return 0.0;
    }
    remaining_sec as f32 / duration_sec as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_format() {
        assert_eq!(format_clock(420), "7:00");
        assert_eq!(format_clock(185), "3:05");
        assert_eq!(format_clock(9), "0:09");
        assert_eq!(format_clock(0), "0:00");
    }

    #[test]
    fn test_progress() {
        assert_eq!(progress(180, 180), 1.0);
        assert_eq!(progress(90, 180), 0.5);
        assert_eq!(progress(0, 0), 0.0);
    }
}
