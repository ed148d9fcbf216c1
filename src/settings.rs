// src/settings.rs  —  Persisted runtime mode (small JSON file)
//
//   { "mode": "url" }
//
// Lives next to config.toml.  Missing or corrupt files fall back to the
// configured default mode; the user never sees an error for it.
use crate::config::OperatingMode;
use crate::error::SettingsError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub mode: OperatingMode,
}

pub struct SettingsStore {
    /// `None` → nothing is persisted (tests)
    path: Option<PathBuf>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Self { Self { path: Some(path) } }

    pub fn in_memory() -> Self { Self { path: None } }

    /// `Ok(None)` when there is no settings file yet.
    pub fn load(&self) -> Result<Option<Settings>, SettingsError> {
        let Some(path) = &self.path else { return Ok(None); };
        if !path.exists() {
            return Ok(None);
        }
        let raw = std::fs::read_to_string(path)
            .map_err(|source| SettingsError::Read { path: path.clone(), source })?;
        let s = serde_json::from_str(&raw)
            .map_err(|source| SettingsError::Parse { path: path.clone(), source })?;
        Ok(Some(s))
    }

    /// Persisted mode, or `default` when absent / unreadable.
    pub fn load_mode_or(&self, default: OperatingMode) -> OperatingMode {
        match self.load() {
            Ok(Some(s)) => {
                log::debug!("[settings] persisted mode {:?}", s.mode);
                s.mode
            }
            Ok(None) => default,
            Err(e) => {
                log::warn!("[settings] {e} — using default mode {default:?}");
                default
            }
        }
    }

    pub fn save(&self, settings: &Settings) -> Result<(), SettingsError> {
        let Some(path) = &self.path else { return Ok(()); };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|source| SettingsError::Write { path: parent.to_path_buf(), source })?;
        }
        let json = serde_json::to_string_pretty(settings)?;
        std::fs::write(path, json)
            .map_err(|source| SettingsError::Write { path: path.clone(), source })?;
        log::debug!("[settings] saved mode {:?} to {}", settings.mode, path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_uses_default() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("settings.json"));
        assert!(store.load().unwrap().is_none());
        assert_eq!(store.load_mode_or(OperatingMode::OpenUrl), OperatingMode::OpenUrl);
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");
        let store = SettingsStore::new(path.clone());
        store.save(&Settings { mode: OperatingMode::KeyboardPassthrough }).unwrap();
        assert_eq!(store.load_mode_or(OperatingMode::OpenUrl), OperatingMode::KeyboardPassthrough);
        let raw = std::fs::read_to_string(path).unwrap();
        assert!(raw.contains("\"keyboard\""), "{raw}");
    }

    #[test]
    fn corrupt_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{ not json").unwrap();
        let store = SettingsStore::new(path);
        assert!(matches!(store.load(), Err(SettingsError::Parse { .. })));
        assert_eq!(store.load_mode_or(OperatingMode::KeyboardPassthrough), OperatingMode::KeyboardPassthrough);
    }

    #[test]
    fn unknown_mode_value_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"mode":"telepathy"}"#).unwrap();
        let store = SettingsStore::new(path);
        assert_eq!(store.load_mode_or(OperatingMode::OpenUrl), OperatingMode::OpenUrl);
    }

    #[test]
    fn in_memory_never_touches_disk() {
        let store = SettingsStore::in_memory();
        store.save(&Settings { mode: OperatingMode::OpenUrl }).unwrap();
        assert!(store.load().unwrap().is_none());
    }
}
