use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::settings::types::{PipelineSettings, ProcessMode};

/// Environment variable that overrides the configured process mode.
pub const MODE_ENV_VAR: &str = "EDGE_PREVIEW_MODE";

/// Settings persistence errors.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("settings I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("settings file is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid settings: {0}")]
    Invalid(String),
}

/// JSON-file backed pipeline settings.
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load settings from a JSON file, returning default on missing file.
    ///
    /// Loaded settings are validated; the mode override from
    /// [`MODE_ENV_VAR`] is applied afterwards.
    pub fn load(&self) -> Result<PipelineSettings, SettingsError> {
        let mut settings = Self::load_file(&self.path)?;
        apply_env_override(&mut settings, std::env::var(MODE_ENV_VAR).ok().as_deref());
        settings.validate().map_err(SettingsError::Invalid)?;
        Ok(settings)
    }

    /// Load the file alone, without the environment override.
    pub fn load_file(path: &Path) -> Result<PipelineSettings, SettingsError> {
        if !path.exists() {
            return Ok(PipelineSettings::default());
        }
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Save settings to disk atomically (write .tmp then rename).
    pub fn save(&self, settings: &PipelineSettings) -> Result<(), SettingsError> {
        settings.validate().map_err(SettingsError::Invalid)?;
        let json = serde_json::to_string_pretty(settings)?;

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let tmp_path = self.path.with_extension("json.tmp");
        std::fs::write(&tmp_path, &json)?;
        std::fs::rename(&tmp_path, &self.path)?;

        Ok(())
    }
}

/// Replace the mode when an override value is present and parses.
///
/// An unparseable override is logged and ignored rather than failing the load.
pub fn apply_env_override(settings: &mut PipelineSettings, value: Option<&str>) {
    let Some(raw) = value else {
        return;
    };
    match raw.parse::<ProcessMode>() {
        Ok(mode) => {
            tracing::info!("{MODE_ENV_VAR} overrides process mode: {mode}");
            settings.mode = mode;
        }
        Err(e) => tracing::warn!("ignoring {MODE_ENV_VAR}: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    /// Helper: create a store backed by a temp directory.
    fn temp_store() -> (SettingsStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pipeline.json");
        (SettingsStore::new(path), dir)
    }

    #[test]
    fn load_returns_default_when_file_missing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nonexistent.json");
        let result = SettingsStore::load_file(&path).unwrap();
        assert_eq!(result, PipelineSettings::default());
    }

    #[test]
    fn load_parses_valid_json_file() {
        let (store, _dir) = temp_store();
        let json = r#"{"mode":"blur","lowThreshold":40,"highThreshold":90,"blurSigma":1.5}"#;
        std::fs::write(store.path(), json).unwrap();

        let result = SettingsStore::load_file(store.path()).unwrap();
        assert_eq!(result.mode, ProcessMode::Blur);
        assert_eq!(result.low_threshold, 40.0);
        assert_eq!(result.high_threshold, 90.0);
        assert_eq!(result.blur_sigma, 1.5);
    }

    #[test]
    fn load_returns_error_for_invalid_json() {
        let (store, _dir) = temp_store();
        std::fs::write(store.path(), "not valid json!!!").unwrap();

        let result = SettingsStore::load_file(store.path());
        assert!(matches!(result, Err(SettingsError::Parse(_))));
    }

    #[test]
    fn load_rejects_invalid_values() {
        let (store, _dir) = temp_store();
        std::fs::write(store.path(), r#"{"lowThreshold":300,"highThreshold":200}"#).unwrap();

        assert!(matches!(store.load(), Err(SettingsError::Invalid(_))));
    }

    #[test]
    fn save_round_trips_through_load() {
        let (store, _dir) = temp_store();
        let settings = PipelineSettings {
            mode: ProcessMode::Passthrough,
            low_threshold: 10.0,
            high_threshold: 20.0,
            blur_sigma: 3.0,
        };
        store.save(&settings).unwrap();

        let loaded = SettingsStore::load_file(store.path()).unwrap();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn save_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("deep").join("pipeline.json");
        let store = SettingsStore::new(path.clone());
        store.save(&PipelineSettings::default()).unwrap();

        assert!(path.exists());
    }

    #[test]
    fn save_is_atomic() {
        let (store, dir) = temp_store();
        store.save(&PipelineSettings::default()).unwrap();

        let tmp_path = dir.path().join("pipeline.json.tmp");
        assert!(!tmp_path.exists(), "temp file should be renamed away");
    }

    #[test]
    fn save_refuses_invalid_settings() {
        let (store, _dir) = temp_store();
        let settings = PipelineSettings {
            blur_sigma: 0.0,
            ..Default::default()
        };
        assert!(store.save(&settings).is_err());
        assert!(!store.path().exists());
    }

    #[test]
    fn env_override_replaces_mode() {
        let mut settings = PipelineSettings::default();
        apply_env_override(&mut settings, Some("passthrough"));
        assert_eq!(settings.mode, ProcessMode::Passthrough);
    }

    #[test]
    fn env_override_ignores_garbage_and_absence() {
        let mut settings = PipelineSettings::default();
        apply_env_override(&mut settings, Some("sepia"));
        assert_eq!(settings.mode, ProcessMode::Edges);
        apply_env_override(&mut settings, None);
        assert_eq!(settings.mode, ProcessMode::Edges);
    }
}
