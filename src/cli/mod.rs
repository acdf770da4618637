//! CLI module for SecBuddy
//!
//! Handles command-line argument parsing and configuration management.

pub mod args;
pub mod config;

pub use args::{parse_answer, Args, Commands, Verbosity};
pub use config::Config;
