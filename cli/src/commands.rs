use anyhow::{Result, anyhow, bail};
use neurolearn_core::LearningStyle;
use neurolearn_tutor::UserSettings;

/// One line of interactive input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// A question for the tutor
    Ask(String),
    Style(LearningStyle),
    AutoAudio(bool),
    AutoVisual(bool),
    ShowSettings,
    History,
    Save,
    Help,
    Exit,
}

impl Command {
    /// Parses a line. Blank lines yield `Ok(None)`.
    pub fn parse(line: &str) -> Result<Option<Self>> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }
        if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
            return Ok(Some(Command::Exit));
        }

        let Some(rest) = line.strip_prefix('/') else {
            return Ok(Some(Command::Ask(line.to_string())));
        };

        let mut parts = rest.split_whitespace();
        let name = parts.next().unwrap_or_default().to_lowercase();
        let arg = parts.next();

        let command = match (name.as_str(), arg) {
            ("style", Some(style)) => Command::Style(style.parse()?),
            ("style", None) => bail!("Usage: /style <visual|auditory|theoretical|practical>"),
            ("audio", Some(flag)) => Command::AutoAudio(parse_switch(flag)?),
            ("visual", Some(flag)) => Command::AutoVisual(parse_switch(flag)?),
            ("audio", None) | ("visual", None) => bail!("Usage: /{} on|off", name),
            ("settings", _) => Command::ShowSettings,
            ("history", _) => Command::History,
            ("save", _) => Command::Save,
            ("help", _) => Command::Help,
            ("exit", _) | ("quit", _) => Command::Exit,
            _ => bail!("Unknown command '/{}'. Type /help for the list.", name),
        };

        Ok(Some(command))
    }

    /// Applies a settings edit, producing the full replacement value.
    /// Returns `None` for commands that do not edit settings.
    pub fn edit(&self, current: &UserSettings) -> Option<UserSettings> {
        let mut next = current.clone();
        match self {
            Command::Style(style) => next.learning_style = *style,
            Command::AutoAudio(on) => next.auto_audio = *on,
            Command::AutoVisual(on) => next.auto_visual = *on,
            _ => return None,
        }
        Some(next)
    }
}

fn parse_switch(value: &str) -> Result<bool> {
    match value.to_lowercase().as_str() {
        "on" | "true" | "yes" | "1" => Ok(true),
        "off" | "false" | "no" | "0" => Ok(false),
        other => Err(anyhow!("Expected on or off, got '{}'", other)),
    }
}
