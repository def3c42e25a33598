//! Settings persistence for the app shell.

use std::path::PathBuf;

use shared::settings::AppSettings;
use tracing::warn;

/// Get the config file path
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|mut p| {
        p.push("parley");
        p.push("settings.json");
        p
    })
}

/// Load settings from disk or return defaults
pub fn load_settings_or_default() -> AppSettings {
    if let Some(path) = config_path() {
        if let Ok(contents) = std::fs::read_to_string(&path) {
            match serde_json::from_str::<AppSettings>(&contents) {
                Ok(settings) => return settings,
                Err(err) => {
                    warn!(%err, path = %path.display(), "ignoring unreadable settings file");
                }
            }
        }
    }
    AppSettings::default()
}

/// Save settings to disk (best effort)
pub fn save_settings(settings: &AppSettings) {
    if let Some(path) = config_path() {
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        if let Ok(json) = serde_json::to_string_pretty(settings) {
            let _ = std::fs::write(&path, json);
        }
    }
}
