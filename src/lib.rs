//! SecBuddy - Terminal network security self-assessment
//!
//! A short multiple-choice questionnaire about how the user connects to the
//! internet, scored into a security level with recommendations, plus a
//! security assistant chat backed by a text completion service.
//!
//! # Architecture
//!
//! - **assessment**: question catalog, answer store, scoring engine and the
//!   step driver that walks Welcome → Questioning → Analyzing → Results
//! - **telemetry**: simulated connection metrics published on a timer
//! - **chat**: completion service interface, HTTP client and chat session
//! - **cli** / **repl**: configuration, argument parsing and the terminal UI

pub mod errors;
pub mod assessment;
pub mod telemetry;
pub mod chat;
pub mod cli;
pub mod repl;

// Re-export commonly used types
pub use errors::{AssessError, Result};
pub use assessment::{
    AnswerSet, AssessmentPhase, AssessmentReport, DriverConfig, Outcome, QuestionCatalog,
    ScoreResult, ScoringEngine, SecurityLevel, StepDriver,
};
pub use telemetry::{LinkQuality, SimulatorConfig, TelemetrySample, TelemetrySimulator};
pub use chat::{ChatSession, GeminiClient, TextCompletionService};
