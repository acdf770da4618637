//! SecBuddy - Main CLI Entry Point

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use log::{debug, warn};
use std::sync::Arc;
use uuid::Uuid;

use secbuddy::assessment::{AnswerSet, AssessmentReport, ScoringEngine, StepDriver};
use secbuddy::chat::{ChatSession, GeminiClient};
use secbuddy::cli::{parse_answer, Args, Commands, Config};
use secbuddy::repl::{AssessmentRepl, ChatRepl, DisplayManager, InputHandler};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let verbosity = args.verbosity();

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(verbosity.log_level().to_string()),
    )
    .init();

    let config = Config::load(args.config.clone()).context("Failed to load configuration")?;
    debug!("Loaded configuration (verbosity: {})", verbosity.as_str());

    let color = config.display.color_output && !args.no_color;
    let display = DisplayManager::new(color, verbosity.show_progress());

    match args.command() {
        Commands::Assess => run_assessment(&config, display).await?,
        Commands::Chat => run_chat(&config, display).await?,
        Commands::Score { answers, json } => score_answers(&config, display, &answers, json)?,
        Commands::Questions => {
            let catalog = config.load_catalog()?;
            display.show_catalog(catalog.questions());
        }
        Commands::Config => print!("{}", config.to_toml()?),
    }

    Ok(())
}

async fn run_assessment(config: &Config, display: DisplayManager) -> Result<()> {
    let catalog = config.load_catalog()?;
    let driver = StepDriver::launch(catalog, config.driver_config())?;

    let mut input = InputHandler::new("assess> ")?;
    let mut repl = AssessmentRepl::new(driver, display);
    repl.run(&mut input).await
}

async fn run_chat(config: &Config, display: DisplayManager) -> Result<()> {
    let client = GeminiClient::new(config.chat_config())?;
    if !client.has_api_key() {
        warn!(
            "{} is not set; assistant replies will fail until it is",
            config.chat.api_key_env
        );
        display.show_warning(&format!(
            "No API key found. Set {} to enable the assistant.",
            config.chat.api_key_env
        ));
    }

    let mut input = InputHandler::with_history("you> ", config.history_path())?;
    let mut repl = ChatRepl::new(ChatSession::new(client), display);
    repl.run(&mut input).await
}

fn score_answers(config: &Config, display: DisplayManager, raw: &[String], json: bool) -> Result<()> {
    let catalog = Arc::new(config.load_catalog()?);

    let pairs = raw
        .iter()
        .map(|a| parse_answer(a).with_context(|| format!("Expected ID=OPTION, got {:?}", a)))
        .collect::<Result<Vec<_>>>()?;
    let answers = AnswerSet::from_pairs(&catalog, pairs)?;

    let score = ScoringEngine::new(Arc::clone(&catalog)).score(&answers)?;

    if json {
        let report = AssessmentReport {
            run_id: Uuid::new_v4(),
            completed_at: Utc::now(),
            answers,
            score,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        display.show_score(&score);
    }

    Ok(())
}
