//! Learning styles and the instructions that steer lesson generation.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Persona shared by every lesson request
pub const TUTOR_PERSONA: &str = "You are NeuroLearn, an expert AI tutor specialized in Machine Learning. \
Explain concepts accurately, build intuition before detail, and keep answers focused on the learner's question.";

const VISUAL_INSTRUCTION: &str = "The learner is a visual thinker. Describe the shape of ideas: diagrams, \
geometric intuition, plots and how quantities move. Refer to what an accompanying diagram would show.";

const AUDITORY_INSTRUCTION: &str = "The learner prefers listening. Write conversational prose that reads well \
aloud. Avoid tables, code blocks and dense notation; use analogies and short spoken-style sentences.";

const THEORETICAL_INSTRUCTION: &str = "The learner wants the theory. Give precise definitions, the relevant \
mathematics in LaTeX-style notation, assumptions, and a short derivation where it helps.";

const PRACTICAL_INSTRUCTION: &str = "The learner learns by doing. Lead with a minimal, runnable Python example \
(numpy or scikit-learn), then explain the code line by line and suggest one experiment to try.";

/// How the learner wants concepts explained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LearningStyle {
    #[default]
    Visual,
    Auditory,
    Theoretical,
    Practical,
}

impl LearningStyle {
    pub const ALL: [LearningStyle; 4] = [
        LearningStyle::Visual,
        LearningStyle::Auditory,
        LearningStyle::Theoretical,
        LearningStyle::Practical,
    ];

    /// Human-facing label
    pub fn label(self) -> &'static str {
        match self {
            LearningStyle::Visual => "Visual",
            LearningStyle::Auditory => "Auditory",
            LearningStyle::Theoretical => "Theoretical",
            LearningStyle::Practical => "Code-Focused",
        }
    }

    /// System instruction used for text generation in this style
    pub fn instruction(self) -> &'static str {
        match self {
            LearningStyle::Visual => VISUAL_INSTRUCTION,
            LearningStyle::Auditory => AUDITORY_INSTRUCTION,
            LearningStyle::Theoretical => THEORETICAL_INSTRUCTION,
            LearningStyle::Practical => PRACTICAL_INSTRUCTION,
        }
    }

    pub fn system_prompt(self) -> String {
        format!("{}\n\n{}", TUTOR_PERSONA, self.instruction())
    }
}

impl fmt::Display for LearningStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Error returned when a string names no learning style
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown learning style '{0}' (expected visual, auditory, theoretical or practical)")]
pub struct UnknownStyle(pub String);

impl FromStr for LearningStyle {
    type Err = UnknownStyle;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "visual" => Ok(LearningStyle::Visual),
            "auditory" | "audio" => Ok(LearningStyle::Auditory),
            "theoretical" | "theory" => Ok(LearningStyle::Theoretical),
            "practical" | "code-focused" | "code" => Ok(LearningStyle::Practical),
            _ => Err(UnknownStyle(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_accepts_names_and_labels() {
        assert_eq!("Visual".parse::<LearningStyle>(), Ok(LearningStyle::Visual));
        assert_eq!(" AUDITORY ".parse::<LearningStyle>(), Ok(LearningStyle::Auditory));
        assert_eq!("theory".parse::<LearningStyle>(), Ok(LearningStyle::Theoretical));
        assert_eq!("Code-Focused".parse::<LearningStyle>(), Ok(LearningStyle::Practical));
        assert_eq!("code".parse::<LearningStyle>(), Ok(LearningStyle::Practical));
    }

    #[test]
    fn test_parse_rejects_unknown() {
        let err = "kinesthetic".parse::<LearningStyle>().unwrap_err();
        assert_eq!(err, UnknownStyle("kinesthetic".to_string()));
        assert_eq!(
            err.to_string(),
            "unknown learning style 'kinesthetic' (expected visual, auditory, theoretical or practical)"
        );
        let _: Box<dyn std::error::Error + Send + Sync> = Box::new(err);
    }

    #[test]
    fn test_labels_round_trip_through_parse() {
        for style in LearningStyle::ALL {
            assert_eq!(style.label().parse::<LearningStyle>(), Ok(style));
        }
    }

    #[test]
    fn test_system_prompt_includes_persona_and_instruction() {
        let prompt = LearningStyle::Practical.system_prompt();
        assert!(prompt.starts_with(TUTOR_PERSONA));
        assert!(prompt.contains("runnable Python"));
    }

    #[test]
    fn test_serde_uses_lowercase_names() {
        #[derive(Serialize, Deserialize)]
        struct Wrapper {
            style: LearningStyle,
        }

        let text = toml::to_string(&Wrapper { style: LearningStyle::Practical }).unwrap();
        assert_eq!(text.trim(), "style = \"practical\"");
        let back: Wrapper = toml::from_str("style = \"auditory\"").unwrap();
        assert_eq!(back.style, LearningStyle::Auditory);
    }
}
