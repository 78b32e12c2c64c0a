// Application state management
use parking_lot::Mutex;
use std::path::PathBuf;
use tokio::sync::watch;

use crate::catalog::{CardAction, Catalog, MeditationEntry};
use crate::error::{PlayerError, Result};
use crate::routes::Route;
use crate::session::{PlayerCommand, PlayerEnvironment, PlayerHandle, PlayerSnapshot};
use crate::settings::AppSettings;

pub struct AppState {
    pub catalog: Catalog,
    pub app_dir: PathBuf,
    settings: Mutex<AppSettings>,
    /// The open player screen, at most one
    player: Mutex<Option<PlayerHandle>>,
}

impl AppState {
    pub fn new(catalog: Catalog, settings: AppSettings, app_dir: PathBuf) -> Self {
        Self {
            catalog,
            app_dir,
            settings: Mutex::new(settings),
            player: Mutex::new(None),
        }
    }

    pub fn settings(&self) -> AppSettings {
        self.settings.lock().clone()
    }

    /// Persist and apply new settings. Open sessions keep the settings they
    /// were opened with.
    pub fn save_settings(&self, settings: AppSettings) -> Result<()> {
        settings
            .save(&self.app_dir)
            .map_err(|e| PlayerError::Settings(format!("{:#}", e)))?;
        *self.settings.lock() = settings;
        Ok(())
    }

    /// Parse a router path, mapping unknown meditation ids onto the fallback
    pub fn resolve_route(&self, path: &str) -> Result<Route> {
        let route = Route::parse_with_default(path, &self.catalog.default_entry().id)
            .ok_or_else(|| PlayerError::UnknownRoute(path.to_string()))?;
        Ok(match route {
            Route::Meditation { id } => Route::meditation(&self.catalog.get(&id).id),
            Route::MeditationComplete { id } => Route::completion(&self.catalog.get(&id).id),
            other => other,
        })
    }

    /// The meditation a card opens, None for cards without a player action
    pub fn card_meditation(&self, card_id: &str) -> Result<Option<&MeditationEntry>> {
        let card = self
            .catalog
            .card(card_id)
            .ok_or_else(|| PlayerError::UnknownCard(card_id.to_string()))?;

        Ok(match &card.action {
            CardAction::OpenMeditation { meditation_id } => Some(self.catalog.get(meditation_id)),
            CardAction::OpenCompanion | CardAction::None => None,
        })
    }

    /// Enter the player screen for `meditation_id`, tearing down any session
    /// that is still open. Returns the new session's snapshot stream.
    pub async fn open_session(
        &self,
        meditation_id: &str,
        env: PlayerEnvironment,
    ) -> watch::Receiver<PlayerSnapshot> {
        self.close_session().await;

        let entry = self.catalog.get(meditation_id).clone();
        let script = self.catalog.guidance(&entry.id).to_vec();
        tracing::info!(meditation_id = %entry.id, cues = script.len(), "opening meditation");

        let handle = PlayerHandle::spawn(entry, script, env);
        let snapshots = handle.subscribe();
        *self.player.lock() = Some(handle);
        snapshots
    }

    /// Leave the player screen without navigating
    pub async fn close_session(&self) {
        let previous = self.player.lock().take();
        if let Some(handle) = previous {
            tracing::debug!(meditation_id = handle.meditation_id(), "closing previous session");
            handle.close().await;
        }
    }

    /// Apply a command to the open session and return its state afterwards
    pub async fn send(&self, command: PlayerCommand) -> Result<PlayerSnapshot> {
        let applied = {
            let player = self.player.lock();
            player
                .as_ref()
                .ok_or(PlayerError::NoActiveSession)?
                .request(command)
        };
        applied.await
    }

    pub fn snapshot(&self) -> Result<PlayerSnapshot> {
        let player = self.player.lock();
        let handle = player.as_ref().ok_or(PlayerError::NoActiveSession)?;
        Ok(handle.snapshot())
    }
}
