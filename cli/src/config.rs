use anyhow::{Context, Result};
use neurolearn_core::config::{AppConfig, get_default_config_file};
use neurolearn_tutor::UserSettings;
use std::path::{Path, PathBuf};

use crate::cli::Args;

pub const APP_NAME: &str = "neurolearn";

/// Everything the session needs, after flags, environment and file are combined
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub file: AppConfig,
    pub path: PathBuf,
    pub settings: UserSettings,
    pub asset_dir: PathBuf,
}

impl ResolvedConfig {
    /// Config loaded from `--config` or the default location
    pub fn load(args: &Args) -> Result<Self> {
        let path = match &args.config {
            Some(path) => path.clone(),
            None => get_default_config_file(APP_NAME)
                .context("Failed to locate the default config file")?,
        };

        let file = AppConfig::load_from_file(&path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?;

        Ok(Self::resolve(args, file, path))
    }

    /// Precedence: flag (or `GEMINI_API_KEY`, which clap folds into the flag) > file > defaults
    pub fn resolve(args: &Args, mut file: AppConfig, path: PathBuf) -> Self {
        let api_key = args
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .or_else(|| file.gemini.api_key.clone());

        let mut settings = UserSettings::from_config(&file.tutor, api_key.clone());
        if let Some(style) = args.style {
            settings.learning_style = style;
        }
        if let Some(auto_audio) = args.auto_audio {
            settings.auto_audio = auto_audio;
        }
        if let Some(auto_visual) = args.auto_visual {
            settings.auto_visual = auto_visual;
        }

        let asset_dir = args
            .asset_dir
            .clone()
            .or_else(|| file.tutor.asset_dir.clone())
            .unwrap_or_else(default_asset_dir);

        // The gateway is built from the file's Gemini section
        file.gemini.api_key = api_key;

        Self {
            file,
            path,
            settings,
            asset_dir,
        }
    }

    /// Writes the current settings back into the config file.
    ///
    /// The API key is only persisted if the file already carried one.
    pub fn save_settings(&self, settings: &UserSettings) -> Result<()> {
        let mut on_disk = AppConfig::load_from_file(&self.path)
            .with_context(|| format!("Failed to reload config from {}", self.path.display()))?;

        on_disk.tutor.learning_style = Some(settings.learning_style);
        on_disk.tutor.auto_audio = Some(settings.auto_audio);
        on_disk.tutor.auto_visual = Some(settings.auto_visual);
        if on_disk.gemini.api_key.is_some() && settings.has_api_key() {
            on_disk.gemini.api_key = Some(settings.api_key.clone());
        }

        on_disk
            .save_to_file(&self.path)
            .with_context(|| format!("Failed to save config to {}", self.path.display()))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn default_asset_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|dir| dir.join(APP_NAME).join("assets"))
        .unwrap_or_else(|| PathBuf::from("neurolearn-assets"))
}
