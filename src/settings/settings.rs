// Settings management and persistence
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use url::Url;

use crate::catalog::DEFAULT_MEDITATION_ID;

const DEFAULT_ASSET_BASE_URL: &str = "http://localhost:1420/";

/// How guidance cues are anchored across a pause
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CueAnchoring {
    /// Remaining cues are re-armed against elapsed playing time on resume
    PlaybackTime,
    /// Cues stay armed against the session start; cues due during a pause
    /// wait in the paused speech queue
    WallClock,
}

/// Playback settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackSettings {
    #[serde(default = "default_cue_anchoring")]
    pub cue_anchoring: CueAnchoring,
    #[serde(default = "default_volume")]
    pub volume: f32, // 0.0-1.0, recorded audio only
}

fn default_cue_anchoring() -> CueAnchoring {
    CueAnchoring::PlaybackTime
}

fn default_volume() -> f32 {
    1.0
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            cue_anchoring: default_cue_anchoring(),
            volume: default_volume(),
        }
    }
}

/// Where recorded audio comes from
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceSettings {
    /// Base for relative audio refs such as `/audio/calm3.mp3`
    #[serde(default = "default_asset_base_url")]
    pub asset_base_url: String,
    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,
    /// Bound on downloading a whole clip once the probe succeeded
    #[serde(default = "default_load_timeout_ms")]
    pub load_timeout_ms: u64,
    #[serde(default = "default_allow_network")]
    pub allow_network: bool,
}

fn default_asset_base_url() -> String {
    DEFAULT_ASSET_BASE_URL.to_string()
}

fn default_probe_timeout_ms() -> u64 {
    5000
}

fn default_load_timeout_ms() -> u64 {
    30000
}

fn default_allow_network() -> bool {
    true
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            asset_base_url: default_asset_base_url(),
            probe_timeout_ms: default_probe_timeout_ms(),
            load_timeout_ms: default_load_timeout_ms(),
            allow_network: default_allow_network(),
        }
    }
}

impl SourceSettings {
    /// Parsed asset base, the dev server address when the setting is malformed
    pub fn asset_base(&self) -> Url {
        match Url::parse(&self.asset_base_url) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!(base = %self.asset_base_url, "invalid asset base url: {}", e);
                Url::parse(DEFAULT_ASSET_BASE_URL).expect("default asset base url is valid")
            }
        }
    }

    pub fn probe_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.probe_timeout_ms)
    }

    pub fn load_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.load_timeout_ms)
    }
}

/// Catalog settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogSettings {
    #[serde(default = "default_meditation_id")]
    pub default_meditation_id: String,
}

fn default_meditation_id() -> String {
    DEFAULT_MEDITATION_ID.to_string()
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            default_meditation_id: default_meditation_id(),
        }
    }
}

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    #[serde(default = "default_version")]
    pub version: i32, // Settings schema version for future migrations
    #[serde(default)]
    pub playback: PlaybackSettings,
    #[serde(default)]
    pub sources: SourceSettings,
    #[serde(default)]
    pub catalog: CatalogSettings,
}

fn default_version() -> i32 {
    1
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            version: default_version(),
            playback: PlaybackSettings::default(),
            sources: SourceSettings::default(),
            catalog: CatalogSettings::default(),
        }
    }
}

impl AppSettings {
    /// Get the settings file path
    pub fn get_settings_path(app_dir: &Path) -> PathBuf {
        app_dir.join("settings.json")
    }

    /// Load settings from file, or return defaults if file doesn't exist
    pub fn load(app_dir: &Path) -> Result<Self> {
        let path = Self::get_settings_path(app_dir);

        if !path.exists() {
            tracing::info!("No settings file found, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read settings file {:?}", path))?;

        let mut settings: AppSettings = serde_json::from_str(&content)
            .context("Failed to parse settings")?;
        settings.playback.volume = settings.playback.volume.clamp(0.0, 1.0);

        tracing::info!("Loaded settings from {:?}", path);
        Ok(settings)
    }

    /// Save settings to file
    pub fn save(&self, app_dir: &Path) -> Result<()> {
        // Ensure directory exists
        fs::create_dir_all(app_dir).context("Failed to create settings directory")?;

        let path = Self::get_settings_path(app_dir);
        let content = serde_json::to_string_pretty(self).context("Failed to serialize settings")?;

        fs::write(&path, content)
            .with_context(|| format!("Failed to write settings file {:?}", path))?;

        tracing::info!("Saved settings to {:?}", path);
        Ok(())
    }
}
