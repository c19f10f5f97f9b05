use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

const APP_DIR: &str = "Unspoken";
const SETTINGS_FILE: &str = "settings.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CueSettings {
    /// Speak roles again while say-all is reading
    pub say_all: bool,

    /// Keep spoken role names alongside the cues
    pub speak_roles: bool,

    /// Don't play any cue
    pub muted: bool,

    /// Use HRTF panning instead of plain stereo
    pub hrtf: bool,

    /// Follow the speech volume
    pub volume_adjust: bool,

    /// Route emitters through the reverb bus (applies at next startup)
    pub reverb: bool,

    /// Reverb send gain (0.0-1.0)
    pub reverb_level: f32,

    /// Reverb decay time T60 in seconds
    pub reverb_time: f32,

    /// Directory holding the cue files, overriding the default location
    pub sounds_dir: Option<String>,
}

impl Default for CueSettings {
    fn default() -> Self {
        Self {
            say_all: false,
            speak_roles: false,
            muted: false,
            hrtf: true,
            volume_adjust: true,
            reverb: true,
            reverb_level: 1.0,
            reverb_time: 0.2,
            sounds_dir: None,
        }
    }
}

impl CueSettings {
    /// Load settings from the platform config directory.
    /// Creates a default file if none exists.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::settings_path()?;
        if path.exists() {
            let settings = Self::load_from(&path)?;
            tracing::info!("Loaded settings from {}", path.display());
            Ok(settings)
        } else {
            let settings = Self::default();
            settings.save()?;
            tracing::info!("Created default settings at {}", path.display());
            Ok(settings)
        }
    }

    /// Save settings to the platform config directory.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::settings_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let load_failed = |source: Box<dyn std::error::Error + Send + Sync>| ConfigError::LoadFailed {
            path: path.display().to_string(),
            source,
        };

        let content = fs::read_to_string(path).map_err(|e| load_failed(Box::new(e)))?;
        let settings: CueSettings =
            serde_json::from_str(&content).map_err(|e| load_failed(Box::new(e)))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        self.validate()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| ConfigError::DirectoryCreationFailed {
                path: parent.display().to_string(),
                source,
            })?;
        }

        let save_failed = |source: Box<dyn std::error::Error + Send + Sync>| ConfigError::SaveFailed {
            path: path.display().to_string(),
            source,
        };
        let json = serde_json::to_string_pretty(self).map_err(|e| save_failed(Box::new(e)))?;
        fs::write(path, json).map_err(|e| save_failed(Box::new(e)))?;
        Ok(())
    }

    /// Reject combinations the cue engine cannot honor.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.muted && !self.speak_roles {
            return Err(ConfigError::Invalid(
                "cues are muted and roles are not spoken; one of them must stay on".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.reverb_level) {
            return Err(ConfigError::Invalid(format!(
                "reverb level {} is outside 0.0-1.0",
                self.reverb_level
            )));
        }
        if !(self.reverb_time > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "reverb time {} must be positive",
                self.reverb_time
            )));
        }
        Ok(())
    }

    /// Settings panel sliders run 0-100.
    pub fn reverb_level_from_slider(value: u8) -> f32 {
        f32::from(value.min(100)) / 100.0
    }

    pub fn reverb_time_from_slider(value: u8) -> f32 {
        // A zero decay is not a valid T60
        f32::from(value.clamp(1, 100)) / 100.0
    }

    /// Directory the cue files are read from.
    pub fn sounds_path(&self) -> Result<PathBuf, ConfigError> {
        match &self.sounds_dir {
            Some(dir) => Ok(PathBuf::from(dir)),
            None => Ok(Self::app_dir()?.join("sounds")),
        }
    }

    /// Get the settings file path
    pub fn settings_path() -> Result<PathBuf, ConfigError> {
        Ok(Self::app_dir()?.join(SETTINGS_FILE))
    }

    /// Application directory under the user config folder
    pub fn app_dir() -> Result<PathBuf, ConfigError> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or(ConfigError::NoConfigDir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_settings_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("unspoken-config-{}-{}", name, std::process::id()))
            .join(SETTINGS_FILE)
    }

    #[test]
    fn test_default_settings() {
        let settings = CueSettings::default();
        assert!(settings.hrtf);
        assert!(settings.reverb);
        assert!(settings.volume_adjust);
        assert!(!settings.muted);
        assert_eq!(settings.reverb_level, 1.0);
        assert_eq!(settings.reverb_time, 0.2);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_settings_roundtrip_on_disk() {
        let path = temp_settings_path("roundtrip");
        let settings = CueSettings {
            hrtf: false,
            reverb_level: 0.4,
            ..CueSettings::default()
        };

        settings.save_to(&path).unwrap();
        let loaded = CueSettings::load_from(&path).unwrap();
        let _ = fs::remove_dir_all(path.parent().unwrap());

        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let settings: CueSettings = serde_json::from_str(r#"{ "hrtf": false }"#).unwrap();
        assert!(!settings.hrtf);
        assert!(settings.reverb);
        assert_eq!(settings.reverb_time, 0.2);
    }

    #[test]
    fn test_muted_without_spoken_roles_is_rejected() {
        let settings = CueSettings {
            muted: true,
            speak_roles: false,
            ..CueSettings::default()
        };
        assert!(matches!(settings.validate(), Err(ConfigError::Invalid(_))));

        let settings = CueSettings {
            muted: true,
            speak_roles: true,
            ..CueSettings::default()
        };
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_reverb_ranges_are_checked() {
        let settings = CueSettings {
            reverb_level: 1.5,
            ..CueSettings::default()
        };
        assert!(settings.validate().is_err());

        let settings = CueSettings {
            reverb_time: 0.0,
            ..CueSettings::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_slider_conversion() {
        assert_eq!(CueSettings::reverb_level_from_slider(50), 0.5);
        assert_eq!(CueSettings::reverb_level_from_slider(200), 1.0);
        assert_eq!(CueSettings::reverb_time_from_slider(20), 0.2);
        assert_eq!(CueSettings::reverb_time_from_slider(0), 0.01);
    }

    #[test]
    fn test_load_missing_file_fails() {
        let path = temp_settings_path("missing");
        assert!(matches!(
            CueSettings::load_from(&path),
            Err(ConfigError::LoadFailed { .. })
        ));
    }
}
