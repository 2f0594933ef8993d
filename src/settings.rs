use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{PricePairError, Result};

const APP_DIR: &str = "pricepair";
const SETTINGS_FILE: &str = "settings.json";

/// Persisted defaults. Every CLI flag that names one of these overrides it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub data_dir: String,
    #[serde(default = "default_baseline_year")]
    pub baseline_year: i32,
    #[serde(default = "default_current_year")]
    pub current_year: i32,
    #[serde(default = "default_map_width")]
    pub map_width: u32,
    #[serde(default = "default_map_height")]
    pub map_height: u32,
}

fn default_baseline_year() -> i32 {
    2012
}

fn default_current_year() -> i32 {
    2022
}

fn default_map_width() -> u32 {
    800
}

fn default_map_height() -> u32 {
    1000
}

fn home() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: home().join("Documents").join(APP_DIR).to_string_lossy().into_owned(),
            baseline_year: default_baseline_year(),
            current_year: default_current_year(),
            map_width: default_map_width(),
            map_height: default_map_height(),
        }
    }
}

impl Settings {
    /// Missing file means defaults. An unreadable or invalid file also falls
    /// back to defaults, with a warning naming it.
    pub fn load_from(path: &Path) -> Self {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Self::default(),
            Err(e) => {
                log::warn!("{}: {e}; using default settings", path.display());
                return Self::default();
            }
        };
        serde_json::from_str(&content).unwrap_or_else(|e| {
            log::warn!("{}: {e}; using default settings", path.display());
            Self::default()
        })
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| PricePairError::Settings(e.to_string()))?;
        std::fs::write(path, format!("{json}\n"))?;
        Ok(())
    }
}

/// `~/.config/pricepair/settings.json`
fn settings_path() -> PathBuf {
    home().join(".config").join(APP_DIR).join(SETTINGS_FILE)
}

pub fn load_settings() -> Settings {
    Settings::load_from(&settings_path())
}

pub fn save_settings(settings: &Settings) -> Result<()> {
    settings.save_to(&settings_path())
}

pub fn get_data_dir() -> PathBuf {
    PathBuf::from(load_settings().data_dir)
}

/// Expand a leading `~` and make existing paths absolute. A path that does
/// not exist yet is returned as given.
pub fn shellexpand_path(path: &str) -> String {
    let expanded = match path.strip_prefix('~') {
        Some(rest) => home().join(rest.trim_start_matches('/')),
        None => PathBuf::from(path),
    };
    std::fs::canonicalize(&expanded)
        .unwrap_or(expanded)
        .to_string_lossy()
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_then_load_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".config").join(APP_DIR).join(SETTINGS_FILE);
        let settings = Settings {
            data_dir: "/srv/pricepair".to_string(),
            baseline_year: 2013,
            current_year: 2023,
            map_width: 400,
            map_height: 500,
        };
        settings.save_to(&path).unwrap();
        assert!(std::fs::read_to_string(&path).unwrap().ends_with("}\n"));
        assert_eq!(Settings::load_from(&path), settings);
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = Settings::load_from(&dir.path().join("absent.json"));
        assert_eq!(loaded, Settings::default());
        assert_eq!(loaded.baseline_year, 2012);
        assert_eq!(loaded.current_year, 2022);
    }

    #[test]
    fn test_invalid_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE);
        std::fs::write(&path, "{not json").unwrap();
        assert_eq!(Settings::load_from(&path), Settings::default());
    }

    #[test]
    fn test_partial_file_merges_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE);
        std::fs::write(&path, r#"{"data_dir": "/srv/pp", "current_year": 2024}"#).unwrap();
        let s = Settings::load_from(&path);
        assert_eq!(s.data_dir, "/srv/pp");
        assert_eq!(s.baseline_year, 2012);
        assert_eq!(s.current_year, 2024);
        assert_eq!(s.map_width, 800);
    }

    #[test]
    fn test_shellexpand_keeps_missing_path() {
        assert_eq!(shellexpand_path("/no/such/dir/here"), "/no/such/dir/here");
    }

    #[test]
    fn test_shellexpand_tilde() {
        let expanded = shellexpand_path("~/no-such-pricepair-dir");
        assert!(!expanded.starts_with('~'));
        assert!(expanded.ends_with("no-such-pricepair-dir"));
    }
}
