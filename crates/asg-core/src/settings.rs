//! Engine settings: timing and safety knobs, every field defaulted.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// File name looked up next to the executable when no path is given.
pub const SETTINGS_FILE: &str = "asg-settings.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineSettings {
    /// Pause after pressing modifiers and after the main key of a toggle chord.
    #[serde(default = "default_chord_settle_ms")]
    pub chord_settle_ms: u64,
    /// Pause between moving onto a found image and clicking it.
    #[serde(default = "default_image_click_settle_ms")]
    pub image_click_settle_ms: u64,
    /// Deepest allowed `if`/`for` nesting.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    /// Upper bound for a single platform script (osascript, PowerShell, xdotool).
    #[serde(default = "default_script_timeout_secs")]
    pub script_timeout_secs: u64,
    /// Per-channel color distance accepted by image search.
    #[serde(default)]
    pub image_match_tolerance: u8,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            chord_settle_ms: default_chord_settle_ms(),
            image_click_settle_ms: default_image_click_settle_ms(),
            max_depth: default_max_depth(),
            script_timeout_secs: default_script_timeout_secs(),
            image_match_tolerance: 0,
        }
    }
}

impl EngineSettings {
    pub fn chord_settle(&self) -> Duration {
        Duration::from_millis(self.chord_settle_ms)
    }

    pub fn image_click_settle(&self) -> Duration {
        Duration::from_millis(self.image_click_settle_ms)
    }

    pub fn script_timeout(&self) -> Duration {
        Duration::from_secs(self.script_timeout_secs.max(1))
    }
}

// ── Defaults ───────────────────────────────────────────────────────────────

fn default_chord_settle_ms() -> u64 { 50 }
fn default_image_click_settle_ms() -> u64 { 100 }
fn default_max_depth() -> usize { 64 }
fn default_script_timeout_secs() -> u64 { 15 }

// ── Load ───────────────────────────────────────────────────────────────────

fn default_settings_path() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|d| d.join(SETTINGS_FILE)))
        .unwrap_or_else(|| PathBuf::from(SETTINGS_FILE))
}

/// Load settings from `path`, or from the file next to the binary.
///
/// A missing file yields defaults. An unreadable or malformed file is logged
/// and also yields defaults: settings never abort a run.
pub fn load_settings(path: Option<&Path>) -> EngineSettings {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_settings_path);
    let contents = match std::fs::read_to_string(&path) {
        Ok(c) => c,
        Err(_) => {
            log::info!("No settings at {:?}, using defaults", path);
            return EngineSettings::default();
        }
    };
    match serde_json::from_str(&contents) {
        Ok(settings) => {
            log::info!("Loaded settings from {:?}", path);
            settings
        }
        Err(e) => {
            log::warn!("Failed to parse settings {:?}: {e}. Using defaults.", path);
            EngineSettings::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_settings() {
        let s = EngineSettings::default();
        assert_eq!(s.chord_settle_ms, 50);
        assert_eq!(s.image_click_settle_ms, 100);
        assert_eq!(s.max_depth, 64);
        assert_eq!(s.script_timeout(), Duration::from_secs(15));
        assert_eq!(s.image_match_tolerance, 0);
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"max_depth": 8, "image_match_tolerance": 12}}"#).unwrap();
        let s = load_settings(Some(file.path()));
        assert_eq!(s.max_depth, 8);
        assert_eq!(s.image_match_tolerance, 12);
        assert_eq!(s.chord_settle_ms, 50);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let s = load_settings(Some(&dir.path().join("nope.json")));
        assert_eq!(s.max_depth, 64);
    }

    #[test]
    fn test_malformed_file_uses_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        let s = load_settings(Some(file.path()));
        assert_eq!(s.chord_settle_ms, 50);
    }

    #[test]
    fn test_script_timeout_floor() {
        let s = EngineSettings { script_timeout_secs: 0, ..EngineSettings::default() };
        assert_eq!(s.script_timeout(), Duration::from_secs(1));
    }
}
