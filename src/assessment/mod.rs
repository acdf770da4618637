//! Network security assessment engine
//!
//! Question catalog, answer store, phase state machine, weighted scoring and
//! the step driver that ties them together.

pub mod answers;
pub mod catalog;
pub mod driver;
pub mod scoring;
pub mod state;

// Re-export commonly used types
pub use answers::{Answer, AnswerSet};
pub use catalog::{ChoiceRule, Question, QuestionCatalog, MAX_OPTION_POINTS};
pub use driver::{AssessmentReport, DriverConfig, Outcome, Progress, StepDriver};
pub use scoring::{QuestionScore, ScoreResult, ScoringEngine, SecurityLevel};
pub use state::{AssessmentPhase, PhaseEvent};
