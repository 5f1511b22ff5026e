use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use neurolearn_core::{LearningStyle, TutorConfig};

/// Learner preferences read at the start of each turn
#[derive(Clone, PartialEq, Eq)]
pub struct UserSettings {
    pub learning_style: LearningStyle,
    pub auto_audio: bool,
    pub auto_visual: bool,
    pub api_key: String,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            learning_style: LearningStyle::Visual,
            auto_audio: false,
            auto_visual: true,
            api_key: String::new(),
        }
    }
}

impl UserSettings {
    /// Defaults overridden by whatever the config file sets
    pub fn from_config(config: &TutorConfig, api_key: Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            learning_style: config.learning_style.unwrap_or(defaults.learning_style),
            auto_audio: config.auto_audio.unwrap_or(defaults.auto_audio),
            auto_visual: config.auto_visual.unwrap_or(defaults.auto_visual),
            api_key: api_key.unwrap_or_default(),
        }
    }

    pub fn wants_visual(&self) -> bool {
        self.learning_style == LearningStyle::Visual || self.auto_visual
    }

    pub fn wants_audio(&self) -> bool {
        self.learning_style == LearningStyle::Auditory || self.auto_audio
    }

    pub fn has_api_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    /// Key with all but the last four characters hidden
    pub fn masked_api_key(&self) -> String {
        let count = self.api_key.chars().count();
        if count <= 4 {
            return "*".repeat(count);
        }
        let tail: String = self.api_key.chars().skip(count - 4).collect();
        format!("****{}", tail)
    }
}

impl fmt::Debug for UserSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserSettings")
            .field("learning_style", &self.learning_style)
            .field("auto_audio", &self.auto_audio)
            .field("auto_visual", &self.auto_visual)
            .field("api_key", &self.masked_api_key())
            .finish()
    }
}

/// Shared holder for the session's current settings
#[derive(Debug, Clone, Default)]
pub struct SettingsHandle {
    inner: Arc<RwLock<UserSettings>>,
}

impl SettingsHandle {
    pub fn new(settings: UserSettings) -> Self {
        Self {
            inner: Arc::new(RwLock::new(settings)),
        }
    }

    /// Snapshot of the current settings
    pub fn get(&self) -> UserSettings {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn replace(&self, settings: UserSettings) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = settings;
    }

    /// Applies an edit to a copy of the current value and stores the result
    pub fn update(&self, edit: impl FnOnce(&mut UserSettings)) -> UserSettings {
        let mut settings = self.get();
        edit(&mut settings);
        self.replace(settings.clone());
        settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = UserSettings::default();
        assert_eq!(settings.learning_style, LearningStyle::Visual);
        assert!(!settings.auto_audio);
        assert!(settings.auto_visual);
        assert!(!settings.has_api_key());
    }

    #[test]
    fn test_modalities_follow_style_or_flags() {
        let mut settings = UserSettings {
            learning_style: LearningStyle::Theoretical,
            auto_audio: false,
            auto_visual: false,
            api_key: String::new(),
        };
        assert!(!settings.wants_visual());
        assert!(!settings.wants_audio());

        settings.learning_style = LearningStyle::Auditory;
        assert!(settings.wants_audio());
        assert!(!settings.wants_visual());

        settings.learning_style = LearningStyle::Practical;
        settings.auto_visual = true;
        settings.auto_audio = true;
        assert!(settings.wants_visual());
        assert!(settings.wants_audio());
    }

    #[test]
    fn test_from_config_overrides_defaults() {
        let config = TutorConfig {
            learning_style: Some(LearningStyle::Practical),
            auto_audio: Some(true),
            ..Default::default()
        };
        let settings = UserSettings::from_config(&config, Some("key".to_string()));
        assert_eq!(settings.learning_style, LearningStyle::Practical);
        assert!(settings.auto_audio);
        assert!(settings.auto_visual);
        assert_eq!(settings.api_key, "key");
    }

    #[test]
    fn test_snapshot_is_unaffected_by_replace() {
        let handle = SettingsHandle::new(UserSettings::default());
        let snapshot = handle.get();

        handle.update(|s| s.learning_style = LearningStyle::Auditory);

        assert_eq!(snapshot.learning_style, LearningStyle::Visual);
        assert_eq!(handle.get().learning_style, LearningStyle::Auditory);
    }

    #[test]
    fn test_debug_masks_key() {
        let settings = UserSettings {
            api_key: "AIzaSecretKey1234".to_string(),
            ..Default::default()
        };
        assert_eq!(settings.masked_api_key(), "****1234");
        assert!(!format!("{:?}", settings).contains("Secret"));
        assert_eq!(UserSettings::default().masked_api_key(), "");
    }
}
