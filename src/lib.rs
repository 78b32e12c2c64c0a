// Stillwater - Guided meditation player
// Module declarations
pub mod audio;
pub mod catalog;
#[cfg(feature = "desktop")]
mod commands;
pub mod error;
pub mod logging;
pub mod routes;
pub mod session;
pub mod settings;
pub mod state;
#[cfg(feature = "desktop")]
mod webview;

#[cfg(feature = "desktop")]
use tauri::Manager;

#[cfg(feature = "desktop")]
#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    use catalog::Catalog;
    use settings::AppSettings;
    use state::AppState;

    logging::init();

    tauri::Builder::default()
        .setup(|app| {
            // Get app data directory
            let app_dir = app.path().app_data_dir()?;

            let settings = AppSettings::load(&app_dir).unwrap_or_else(|e| {
                tracing::warn!("Failed to load settings, using defaults: {:#}", e);
                AppSettings::default()
            });
            let catalog = Catalog::builtin().with_default(&settings.catalog.default_meditation_id);

            tracing::info!(app_dir = ?app_dir, "starting Stillwater");
            app.manage(AppState::new(catalog, settings, app_dir));

            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            commands::list_meditations,
            commands::get_meditation,
            commands::get_cards,
            commands::resolve_route,
            commands::open_meditation,
            commands::open_route,
            commands::open_card,
            commands::toggle_play,
            commands::start_meditation,
            commands::pause_meditation,
            commands::resume_meditation,
            commands::exit_meditation,
            commands::get_player_state,
            commands::get_sound_diagnostics,
            commands::get_settings,
            commands::save_settings,
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
