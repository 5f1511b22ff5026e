use anyhow::{Context, Result};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use neurolearn_tutor::{
    MessageStore, SettingsHandle, TurnHandle, TurnOutcome, TurnReport, Tutor, TutorError,
};
use std::io::{self, Write};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, error, info};

use crate::assets::AssetWriter;
use crate::commands::Command;
use crate::config::ResolvedConfig;
use crate::output::{
    print_assets, print_error, print_help, print_message, print_settings, print_transcript,
};

/// How often the transcript is checked while a turn is running
const POLL_INTERVAL: Duration = Duration::from_millis(100);

fn spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner()
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
        .template("{spinner} {msg}")
    {
        spinner.set_style(style);
    }
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(120));
    spinner
}

/// State shared by both modes
pub struct Session {
    pub tutor: Tutor,
    pub settings: SettingsHandle,
    pub assets: AssetWriter,
    pub config: ResolvedConfig,
}

/// Asks one question and prints the answer with its assets
pub async fn run_single_query(session: &Session, prompt: String) -> Result<()> {
    info!("Running single query: {}", prompt);

    let spinner = spinner("Preparing your lesson...");
    let result = session
        .tutor
        .handle_send_message(prompt, session.settings.get())
        .await;
    spinner.finish_and_clear();

    let report = result.context("Failed to start the turn")?;
    if let Some(message) = session.tutor.store().get(&report.model_message_id) {
        print_message(&message);
        print_assets(&message, &session.assets);
    }

    if report.outcome == TurnOutcome::TextFailed {
        anyhow::bail!("The tutor could not be reached");
    }
    Ok(())
}

/// A turn running in the background while input keeps being read
struct ActiveTurn {
    model_message_id: String,
    join: JoinHandle<TurnReport>,
    spinner: ProgressBar,
    text_shown: bool,
}

impl ActiveTurn {
    fn start(turn: TurnHandle) -> Self {
        Self {
            model_message_id: turn.model_message_id,
            join: turn.join,
            spinner: spinner("Thinking..."),
            text_shown: false,
        }
    }

    /// Prints the lesson text as soon as it leaves the loading state
    fn show_text_if_ready(&mut self, store: &MessageStore) {
        if self.text_shown {
            return;
        }
        if let Some(message) = store.get(&self.model_message_id).filter(|m| !m.is_loading) {
            self.spinner.suspend(|| print_message(&message));
            self.spinner.set_message("Generating diagram and narration...");
            self.text_shown = true;
        }
    }

    /// Prints whatever was not shown yet once the turn has settled
    fn finish(self, session: &Session, result: Result<TurnReport, JoinError>) {
        self.spinner.finish_and_clear();
        match result {
            Ok(report) => debug!(outcome = ?report.outcome, "Turn settled"),
            Err(e) => error!(error = %e, "Turn task failed"),
        }

        if let Some(message) = session.tutor.store().get(&self.model_message_id) {
            if !self.text_shown {
                print_message(&message);
            }
            print_assets(&message, &session.assets);
        }
    }
}

/// Resolves when the active turn settles; never resolves when idle
async fn settle(active: &mut Option<ActiveTurn>) -> Result<TurnReport, JoinError> {
    match active {
        Some(turn) => (&mut turn.join).await,
        None => std::future::pending().await,
    }
}

fn prompt() -> Result<()> {
    print!("{}: ", "You".green().bold());
    io::stdout().flush().context("Failed to flush stdout")
}

/// Handles one line of input. Returns false when the session should end.
fn handle_line(session: &Session, line: &str, active: &mut Option<ActiveTurn>) -> bool {
    let command = match Command::parse(line) {
        Ok(Some(command)) => command,
        Ok(None) => return true,
        Err(e) => {
            print_error(&e.to_string());
            return true;
        }
    };

    match command {
        Command::Exit => return false,
        Command::Ask(question) => {
            debug!("Sending question: {}", question);
            match session.tutor.send_message(question, session.settings.get()) {
                Ok(turn) => *active = Some(ActiveTurn::start(turn)),
                Err(TutorError::Busy) => print_error(
                    "Still working on the previous answer. Settings changes apply to the next one.",
                ),
                Err(e) => print_error(&e.to_string()),
            }
        }
        Command::ShowSettings => {
            print_settings(&session.settings.get(), session.assets.dir());
        }
        Command::History => print_transcript(&session.tutor.store().messages()),
        Command::Save => match session.config.save_settings(&session.settings.get()) {
            Ok(()) => println!("Settings saved to {}", session.config.path().display()),
            Err(e) => print_error(&format!("{:#}", e)),
        },
        Command::Help => print_help(),
        edit => {
            if let Some(next) = edit.edit(&session.settings.get()) {
                session.settings.replace(next);
                print_settings(&session.settings.get(), session.assets.dir());
            }
        }
    }
    true
}

/// Runs an interactive tutoring session.
///
/// Input is read while a turn is in flight, so settings can be edited and a
/// second question is turned away by the tutor's busy flag.
pub async fn run_interactive_chat(session: &Session) -> Result<()> {
    if let Some(welcome) = session.tutor.store().messages().first() {
        print_message(welcome);
    }
    println!();
    println!(
        "Learning style: {}. Type {} for commands, 'exit' or 'quit' to leave.",
        session.settings.get().learning_style.label().yellow(),
        "/help".cyan()
    );
    println!();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut active: Option<ActiveTurn> = None;
    let mut ticker = tokio::time::interval(POLL_INTERVAL);
    prompt()?;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read input")? else {
                    // EOF
                    println!();
                    break;
                };
                if !handle_line(session, &line, &mut active) {
                    println!("Exiting tutoring session.");
                    break;
                }
                if active.is_none() {
                    println!();
                    prompt()?;
                }
            }
            result = settle(&mut active) => {
                if let Some(turn) = active.take() {
                    turn.finish(session, result);
                }
                println!(); // Add spacing between interactions
                prompt()?;
            }
            _ = ticker.tick(), if active.is_some() => {
                if let Some(turn) = active.as_mut() {
                    turn.show_text_if_ready(session.tutor.store());
                }
            }
        }
    }

    if let Some(mut turn) = active.take() {
        info!("Waiting for the running turn before leaving");
        let result = (&mut turn.join).await;
        turn.finish(session, result);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Args;
    use async_trait::async_trait;
    use clap::Parser;
    use neurolearn_core::{AppConfig, LearningStyle};
    use neurolearn_tutor::{GatewayError, GenerationGateway};
    use std::sync::Arc;
    use tempfile::tempdir;
    use tokio::sync::Notify;

    /// Holds every lesson until released
    struct GatedGateway {
        gate: Arc<Notify>,
    }

    #[async_trait]
    impl GenerationGateway for GatedGateway {
        async fn generate_text(
            &self,
            _prompt: &str,
            _style: LearningStyle,
        ) -> Result<Option<String>, GatewayError> {
            self.gate.notified().await;
            Ok(Some("Attention weighs tokens".to_string()))
        }

        async fn generate_image(&self, _prompt_seed: &str) -> Result<Option<String>, GatewayError> {
            Ok(None)
        }

        async fn generate_audio(&self, _source_text: &str) -> Result<Option<Vec<u8>>, GatewayError> {
            Ok(None)
        }
    }

    fn session(gate: Arc<Notify>, dir: &std::path::Path) -> Session {
        let args = Args::try_parse_from(["neurolearn", "-i"]).unwrap();
        let config = ResolvedConfig::resolve(&args, AppConfig::default(), dir.join("config.toml"));
        Session {
            tutor: Tutor::new(MessageStore::with_welcome(), Arc::new(GatedGateway { gate })),
            settings: SettingsHandle::new(config.settings.clone()),
            assets: AssetWriter::new(dir.join("assets")),
            config,
        }
    }

    #[tokio::test]
    async fn test_input_during_turn_edits_settings_and_hits_busy() {
        let dir = tempdir().unwrap();
        let gate = Arc::new(Notify::new());
        let session = session(gate.clone(), dir.path());
        let mut active = None;

        assert!(handle_line(&session, "What is attention?", &mut active));
        assert!(active.is_some());
        assert!(session.tutor.is_busy());
        let len = session.tutor.store().len();

        assert!(handle_line(&session, "/style theory", &mut active));
        assert_eq!(session.settings.get().learning_style, LearningStyle::Theoretical);

        assert!(handle_line(&session, "And transformers?", &mut active));
        assert_eq!(session.tutor.store().len(), len);

        gate.notify_one();
        let report = settle(&mut active).await.unwrap();
        let turn = active.take().unwrap();
        assert_eq!(turn.model_message_id, report.model_message_id);
        turn.finish(&session, Ok(report));
        assert!(!session.tutor.is_busy());

        assert!(!handle_line(&session, "exit", &mut active));
    }

    #[tokio::test]
    async fn test_settle_waits_forever_when_idle() {
        let mut active = None;
        let idle = tokio::time::timeout(Duration::from_millis(50), settle(&mut active)).await;
        assert!(idle.is_err());
    }
}
