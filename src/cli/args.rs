//! Command-line argument parsing for SecBuddy
//!
//! Provides clap-based CLI with subcommands and verbosity control.

use clap::{Parser, Subcommand};
use log::LevelFilter;
use std::path::PathBuf;

/// SecBuddy - Network security self-assessment in the terminal
#[derive(Parser, Debug)]
#[command(name = "secbuddy")]
#[command(author = "Jerome (Kubashen) Naidoo")]
#[command(version)]
#[command(about = "Assess your network security posture and ask a security assistant", long_about = None)]
pub struct Args {
    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbosity level: -q (quiet), default (normal), -v (verbose), -vv (very verbose)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Subcommand (defaults to `assess`)
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Run the interactive assessment
    Assess,

    /// Chat with the security assistant
    Chat,

    /// Score a complete answer set without the interactive flow
    Score {
        /// Answer as QUESTION_ID=OPTION, once per question
        #[arg(short, long = "answer", value_name = "ID=OPTION", required = true)]
        answers: Vec<String>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the questions and their options
    Questions,

    /// Display current configuration
    Config,
}

/// Verbosity level enum
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    Normal,
    Verbose,
    VeryVerbose,
}

impl Args {
    /// Get verbosity level based on flags
    pub fn verbosity(&self) -> Verbosity {
        if self.quiet {
            Verbosity::Quiet
        } else {
            match self.verbose {
                0 => Verbosity::Normal,
                1 => Verbosity::Verbose,
                _ => Verbosity::VeryVerbose,
            }
        }
    }

    /// Subcommand to run, `assess` when none was given
    pub fn command(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Assess)
    }
}

impl Verbosity {
    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Verbosity::Quiet => "quiet",
            Verbosity::Normal => "normal",
            Verbosity::Verbose => "verbose",
            Verbosity::VeryVerbose => "very_verbose",
        }
    }

    /// Default log filter; `RUST_LOG` still wins when set
    pub fn log_level(&self) -> LevelFilter {
        match self {
            Verbosity::Quiet => LevelFilter::Error,
            Verbosity::Normal => LevelFilter::Warn,
            Verbosity::Verbose => LevelFilter::Info,
            Verbosity::VeryVerbose => LevelFilter::Debug,
        }
    }

    /// Check if should show progress bars
    pub fn show_progress(&self) -> bool {
        !matches!(self, Verbosity::Quiet)
    }
}

/// Split an `ID=OPTION` argument
pub fn parse_answer(raw: &str) -> Option<(&str, &str)> {
    let (id, option) = raw.split_once('=')?;
    let (id, option) = (id.trim(), option.trim());
    if id.is_empty() || option.is_empty() {
        return None;
    }
    Some((id, option))
}
