use clap::Parser;
use neurolearn_core::LearningStyle;
use std::path::PathBuf;

/// Terminal client for the NeuroLearn machine learning tutor
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// The question to ask the tutor
    #[arg(index = 1)] // Positional argument
    pub prompt: Option<String>,

    /// Enter interactive chat mode
    #[arg(short, long, default_value_t = false)]
    pub interactive: bool,

    /// Learning style: visual, auditory, theoretical or practical
    #[arg(short, long)]
    pub style: Option<LearningStyle>,

    /// Always narrate answers, whatever the learning style
    #[arg(long)]
    pub auto_audio: Option<bool>,

    /// Always illustrate answers, whatever the learning style
    #[arg(long)]
    pub auto_visual: Option<bool>,

    /// Gemini API key
    #[arg(short = 'k', long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Path to the config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Directory where generated images and audio are written
    #[arg(long)]
    pub asset_dir: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}
