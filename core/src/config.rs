use crate::errors::{GeminiError, GeminiResult};
use crate::style::LearningStyle;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_TEXT_MODEL: &str = "gemini-3-flash-preview";
pub const DEFAULT_IMAGE_MODEL: &str = "gemini-2.5-flash-image";
pub const DEFAULT_AUDIO_MODEL: &str = "gemini-2.5-flash-preview-tts";
pub const DEFAULT_VOICE: &str = "Kore";

/// Configuration struct for Gemini API
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct GeminiConfig {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub text_model: Option<String>,
    pub image_model: Option<String>,
    pub audio_model: Option<String>,
    pub voice_name: Option<String>,
    pub temperature: Option<f32>,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: Some(DEFAULT_BASE_URL.to_string()),
            text_model: Some(DEFAULT_TEXT_MODEL.to_string()),
            image_model: Some(DEFAULT_IMAGE_MODEL.to_string()),
            audio_model: Some(DEFAULT_AUDIO_MODEL.to_string()),
            voice_name: Some(DEFAULT_VOICE.to_string()),
            temperature: Some(0.7),
        }
    }
}

impl GeminiConfig {
    /// Merges this config with another config, preferring values from the other config if present
    pub fn merge(&self, other: &Self) -> Self {
        Self {
            api_key: other.api_key.clone().or_else(|| self.api_key.clone()),
            base_url: other.base_url.clone().or_else(|| self.base_url.clone()),
            text_model: other.text_model.clone().or_else(|| self.text_model.clone()),
            image_model: other
                .image_model
                .clone()
                .or_else(|| self.image_model.clone()),
            audio_model: other
                .audio_model
                .clone()
                .or_else(|| self.audio_model.clone()),
            voice_name: other.voice_name.clone().or_else(|| self.voice_name.clone()),
            temperature: other.temperature.or(self.temperature),
        }
    }
}

/// Learner preferences seeded into the session settings
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct TutorConfig {
    pub learning_style: Option<LearningStyle>,
    pub auto_audio: Option<bool>,
    pub auto_visual: Option<bool>,
    pub asset_dir: Option<PathBuf>,
    pub log_level: Option<String>,
}

impl TutorConfig {
    pub fn merge(&self, other: &Self) -> Self {
        Self {
            learning_style: other.learning_style.or(self.learning_style),
            auto_audio: other.auto_audio.or(self.auto_audio),
            auto_visual: other.auto_visual.or(self.auto_visual),
            asset_dir: other.asset_dir.clone().or_else(|| self.asset_dir.clone()),
            log_level: other.log_level.clone().or_else(|| self.log_level.clone()),
        }
    }
}

/// Contents of `config.toml`
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub gemini: GeminiConfig,
    #[serde(default)]
    pub tutor: TutorConfig,
}

impl AppConfig {
    /// Loads configuration from a file if it exists, otherwise returns the default config
    pub fn load_from_file(path: &Path) -> GeminiResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| {
            GeminiError::ConfigError(format!("Failed to read config file: {}", e))
        })?;

        let loaded: Self = toml::from_str(&content).map_err(|e| {
            GeminiError::ConfigError(format!("Failed to parse config file: {}", e))
        })?;

        // Keys left out of the file fall back to the defaults
        Ok(Self::default().merge(&loaded))
    }

    /// Saves configuration to a file
    pub fn save_to_file(&self, path: &Path) -> GeminiResult<()> {
        let content = toml::to_string(self).map_err(|e| {
            GeminiError::ConfigError(format!("Failed to serialize config: {}", e))
        })?;

        // Ensure the directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                GeminiError::ConfigError(format!("Failed to create config directory: {}", e))
            })?;
        }

        fs::write(path, content).map_err(|e| {
            GeminiError::ConfigError(format!("Failed to write config file: {}", e))
        })?;

        Ok(())
    }

    pub fn merge(&self, other: &Self) -> Self {
        Self {
            gemini: self.gemini.merge(&other.gemini),
            tutor: self.tutor.merge(&other.tutor),
        }
    }
}

/// Helper function to get default config directory
pub fn get_default_config_dir(app_name: &str) -> GeminiResult<PathBuf> {
    let home_dir = dirs::home_dir().ok_or_else(|| {
        GeminiError::ConfigError("Could not determine home directory".to_string())
    })?;

    Ok(home_dir.join(".config").join(app_name))
}

/// Helper function to get default config file path
pub fn get_default_config_file(app_name: &str) -> GeminiResult<PathBuf> {
    let config_dir = get_default_config_dir(app_name)?;
    Ok(config_dir.join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let config = AppConfig::load_from_file(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.gemini.text_model.as_deref(), Some(DEFAULT_TEXT_MODEL));
    }

    #[test]
    fn test_partial_file_keeps_defaults_for_missing_keys() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "[gemini]\napi_key = \"abc\"\n\n[tutor]\nlearning_style = \"auditory\"\nauto_audio = true\n",
        )
        .unwrap();

        let config = AppConfig::load_from_file(&path).unwrap();
        assert_eq!(config.gemini.api_key.as_deref(), Some("abc"));
        assert_eq!(config.gemini.voice_name.as_deref(), Some(DEFAULT_VOICE));
        assert_eq!(config.tutor.learning_style, Some(LearningStyle::Auditory));
        assert_eq!(config.tutor.auto_audio, Some(true));
        assert_eq!(config.tutor.auto_visual, None);
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = AppConfig::default();
        config.gemini.api_key = Some("key".to_string());
        config.tutor.learning_style = Some(LearningStyle::Practical);
        config.save_to_file(&path).unwrap();

        assert_eq!(AppConfig::load_from_file(&path).unwrap(), config);
    }

    #[test]
    fn test_invalid_file_is_config_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[tutor]\nlearning_style = \"kinesthetic\"\n").unwrap();

        let err = AppConfig::load_from_file(&path).unwrap_err();
        assert!(matches!(err, GeminiError::ConfigError(_)));
    }

    #[test]
    fn test_merge_prefers_other() {
        let base = GeminiConfig::default();
        let other = GeminiConfig {
            api_key: Some("override".to_string()),
            base_url: None,
            text_model: Some("custom".to_string()),
            image_model: None,
            audio_model: None,
            voice_name: None,
            temperature: None,
        };

        let merged = base.merge(&other);
        assert_eq!(merged.api_key.as_deref(), Some("override"));
        assert_eq!(merged.text_model.as_deref(), Some("custom"));
        assert_eq!(merged.base_url.as_deref(), Some(DEFAULT_BASE_URL));
        assert_eq!(merged.temperature, Some(0.7));
    }
}
