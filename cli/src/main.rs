use clap::Parser;
use colored::*;
use neurolearn_tutor::{GeminiGateway, MessageStore, SettingsHandle, Tutor};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info, warn};

mod app;
mod assets;
mod cli;
mod commands;
mod config;
mod logging;
mod output;

use crate::app::Session;
use crate::assets::AssetWriter;
use crate::cli::Args;
use crate::config::ResolvedConfig;
use crate::logging::init_logging;
use crate::output::{print_error, print_usage_instructions};

/// Main function - resolves configuration and runs the requested mode
#[tokio::main]
async fn main() -> ExitCode {
    // Load environment variables from .env before clap reads GEMINI_API_KEY
    dotenvy::dotenv().ok();

    // Parse command-line arguments
    let args = Args::parse();

    let config = match ResolvedConfig::load(&args) {
        Ok(config) => config,
        Err(e) => {
            init_logging(None, args.verbose);
            print_error(&format!("{:#}", e));
            return ExitCode::FAILURE;
        }
    };

    init_logging(config.file.tutor.log_level.as_deref(), args.verbose);
    info!("Using config file {}", config.path().display());

    let gateway = GeminiGateway::new(config.file.gemini.clone());
    if !gateway.is_configured() {
        warn!("No Gemini API key configured");
        eprintln!(
            "{}",
            "No API key set. Pass --api-key or set GEMINI_API_KEY; answers will fail until then."
                .yellow()
        );
    }

    let settings = SettingsHandle::new(config.settings.clone());
    let session = Session {
        tutor: Tutor::new(MessageStore::with_welcome(), Arc::new(gateway)),
        settings,
        assets: AssetWriter::new(config.asset_dir.clone()),
        config,
    };

    let result = if args.interactive {
        app::run_interactive_chat(&session).await
    } else if let Some(prompt) = args.prompt {
        app::run_single_query(&session, prompt).await
    } else {
        // No prompt and not interactive, show usage
        print_usage_instructions();
        Ok(())
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "NeuroLearn failed");
            print_error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}
