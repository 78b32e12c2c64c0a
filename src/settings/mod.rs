// Settings module
// Persistent app settings (settings.json in the app data directory)

#[allow(clippy::module_inception)]
pub mod settings;

pub use settings::{AppSettings, CatalogSettings, CueAnchoring, PlaybackSettings, SourceSettings};
