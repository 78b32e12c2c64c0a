// Tauri command handlers
use std::sync::Arc;
use tauri::{AppHandle, State};
use tokio::sync::watch;

use crate::audio::{cpal_sink_factory, output_available, NativeAudioLoader};
use crate::catalog::{Card, MeditationEntry};
use crate::routes::Route;
use crate::session::{
    HttpProber, NoSpeech, PlatformCapabilities, PlayerCommand, PlayerEnvironment, PlayerSnapshot,
    SessionOutputs, SoundDiagnostics,
};
use crate::settings::AppSettings;
use crate::state::AppState;
use crate::webview::{self, WebviewAnalytics, WebviewNavigator, WebviewSpeech, PLAYER_STATE_EVENT};

// ===== Catalog =====

#[tauri::command]
pub fn list_meditations(state: State<'_, AppState>) -> Vec<MeditationEntry> {
    state.catalog.meditations().cloned().collect()
}

/// Unknown ids resolve to the default meditation
#[tauri::command]
pub fn get_meditation(id: String, state: State<'_, AppState>) -> MeditationEntry {
    state.catalog.get(&id).clone()
}

#[tauri::command]
pub fn get_cards(state: State<'_, AppState>) -> Vec<Card> {
    state.catalog.cards().to_vec()
}

#[tauri::command]
pub fn resolve_route(path: String, state: State<'_, AppState>) -> Result<Route, String> {
    state.resolve_route(&path).map_err(|e| e.to_string())
}

// ===== Player =====

/// The platform as the backend sees it: audio output needs a real device
fn effective_capabilities(reported: PlatformCapabilities) -> PlatformCapabilities {
    PlatformCapabilities {
        audio_output: reported.audio_output && output_available(),
        ..reported
    }
}

fn environment(
    app: &AppHandle,
    settings: &AppSettings,
    capabilities: PlatformCapabilities,
) -> Result<PlayerEnvironment, String> {
    let prober = HttpProber::new(&settings.sources)
        .map_err(|e| format!("Failed to create source prober: {:#}", e))?
        .with_network(capabilities.network_fetch);

    let loader = NativeAudioLoader::new(
        prober.client().clone(),
        prober.base().clone(),
        cpal_sink_factory(settings.playback.volume),
        settings.sources.load_timeout(),
    );

    Ok(PlayerEnvironment {
        capabilities,
        prober: Arc::new(prober),
        loader: Arc::new(loader),
        outputs: SessionOutputs {
            speech: if capabilities.speech_synthesis {
                Arc::new(WebviewSpeech::new(app.clone()))
            } else {
                Arc::new(NoSpeech)
            },
            analytics: Arc::new(WebviewAnalytics::new(app.clone())),
            navigator: Arc::new(WebviewNavigator::new(app.clone())),
        },
        anchoring: settings.playback.cue_anchoring,
    })
}

/// Emit every snapshot of a session until it ends
async fn forward_snapshots(app: AppHandle, mut snapshots: watch::Receiver<PlayerSnapshot>) {
    loop {
        let snapshot = snapshots.borrow_and_update().clone();
        webview::emit(&app, PLAYER_STATE_EVENT, snapshot);
        if snapshots.changed().await.is_err() {
            break;
        }
    }
}

async fn open(
    meditation_id: &str,
    capabilities: PlatformCapabilities,
    state: &AppState,
    app: &AppHandle,
) -> Result<PlayerSnapshot, String> {
    let env = environment(app, &state.settings(), effective_capabilities(capabilities))?;
    let snapshots = state.open_session(meditation_id, env).await;
    let snapshot = snapshots.borrow().clone();
    tauri::async_runtime::spawn(forward_snapshots(app.clone(), snapshots));
    Ok(snapshot)
}

#[tauri::command]
pub async fn open_meditation(
    id: String,
    capabilities: PlatformCapabilities,
    state: State<'_, AppState>,
    app: AppHandle,
) -> Result<PlayerSnapshot, String> {
    open(&id, capabilities, &state, &app).await
}

/// Open whatever a router path points at. Non-player routes close the
/// current session and return None.
#[tauri::command]
pub async fn open_route(
    path: String,
    capabilities: PlatformCapabilities,
    state: State<'_, AppState>,
    app: AppHandle,
) -> Result<Option<PlayerSnapshot>, String> {
    match state.resolve_route(&path).map_err(|e| e.to_string())? {
        Route::Meditation { id } => open(&id, capabilities, &state, &app).await.map(Some),
        _ => {
            state.close_session().await;
            Ok(None)
        }
    }
}

/// Tapping a card: opens its meditation, if it has one
#[tauri::command]
pub async fn open_card(
    card_id: String,
    capabilities: PlatformCapabilities,
    state: State<'_, AppState>,
    app: AppHandle,
) -> Result<Option<PlayerSnapshot>, String> {
    let meditation_id = state
        .card_meditation(&card_id)
        .map_err(|e| e.to_string())?
        .map(|entry| entry.id.clone());

    match meditation_id {
        Some(id) => open(&id, capabilities, &state, &app).await.map(Some),
        None => Ok(None),
    }
}

async fn send(state: &AppState, command: PlayerCommand) -> Result<PlayerSnapshot, String> {
    state.send(command).await.map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn toggle_play(state: State<'_, AppState>) -> Result<PlayerSnapshot, String> {
    send(&state, PlayerCommand::TogglePlay).await
}

#[tauri::command]
pub async fn start_meditation(state: State<'_, AppState>) -> Result<PlayerSnapshot, String> {
    send(&state, PlayerCommand::Start).await
}

#[tauri::command]
pub async fn pause_meditation(state: State<'_, AppState>) -> Result<PlayerSnapshot, String> {
    send(&state, PlayerCommand::Pause).await
}

#[tauri::command]
pub async fn resume_meditation(state: State<'_, AppState>) -> Result<PlayerSnapshot, String> {
    send(&state, PlayerCommand::Resume).await
}

#[tauri::command]
pub async fn exit_meditation(state: State<'_, AppState>) -> Result<PlayerSnapshot, String> {
    send(&state, PlayerCommand::Exit).await
}

#[tauri::command]
pub fn get_player_state(state: State<'_, AppState>) -> Result<PlayerSnapshot, String> {
    state.snapshot().map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn get_sound_diagnostics(
    id: String,
    capabilities: PlatformCapabilities,
    state: State<'_, AppState>,
) -> Result<SoundDiagnostics, String> {
    let capabilities = effective_capabilities(capabilities);
    let settings = state.settings();
    let prober = HttpProber::new(&settings.sources)
        .map_err(|e| format!("Failed to create source prober: {:#}", e))?
        .with_network(capabilities.network_fetch);

    let entry = state.catalog.get(&id).clone();
    Ok(prober.diagnose(&entry, &capabilities).await)
}

// ===== Settings =====

#[tauri::command]
pub fn get_settings(state: State<'_, AppState>) -> AppSettings {
    state.settings()
}

#[tauri::command]
pub fn save_settings(settings: AppSettings, state: State<'_, AppState>) -> Result<(), String> {
    state.save_settings(settings).map_err(|e| e.to_string())
}
