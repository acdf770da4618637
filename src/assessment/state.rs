//! Assessment phase state machine
//!
//! Deterministic finite state machine over four ordered phases:
//! - Safety: only the listed edges are reachable
//! - Determinism: unique next phase per (phase, event)
//! - Reset is the only edge that moves backwards

use crate::errors::{AssessError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Assessment phases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssessmentPhase {
    /// Nothing started yet
    Welcome,

    /// Collecting answers
    Questioning,

    /// Answers frozen, waiting for the simulated processing delay
    Analyzing,

    /// Score available
    Results,
}

/// Events that trigger phase transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseEvent {
    /// User started the assessment
    Start,

    /// An answer was selected or cleared
    AnswerChanged,

    /// User asked to analyze a complete answer set
    Proceed,

    /// Processing delay elapsed
    AnalysisComplete,

    /// User started over
    Reset,
}

impl AssessmentPhase {
    /// Attempt a phase transition
    ///
    /// Valid transitions:
    /// 1. Welcome     → Questioning (on: Start)
    /// 2. Questioning → Questioning (on: AnswerChanged)
    /// 3. Questioning → Analyzing   (on: Proceed)
    /// 4. Analyzing   → Results     (on: AnalysisComplete)
    /// 5. Results     → Welcome     (on: Reset)
    /// 6. Analyzing   → Welcome     (on: Reset, cancels the pending analysis)
    ///
    /// Anything else is rejected with `InvalidTransition`; callers treat that
    /// as a no-op.
    pub fn transition(&self, event: PhaseEvent) -> Result<AssessmentPhase> {
        use AssessmentPhase::*;
        use PhaseEvent::*;

        let next = match (self, event) {
            (Welcome, Start) => Questioning,
            (Questioning, AnswerChanged) => Questioning,
            (Questioning, Proceed) => Analyzing,
            (Analyzing, AnalysisComplete) => Results,
            (Analyzing | Results, Reset) => Welcome,

            (from, event) => {
                return Err(AssessError::InvalidTransition {
                    from: format!("{:?}", from),
                    to: format!("{:?}", event),
                    reason: format!("No valid transition from {:?} on {:?}", from, event),
                });
            }
        };

        Ok(next)
    }

    /// Events accepted in this phase
    pub fn valid_events(&self) -> Vec<PhaseEvent> {
        use AssessmentPhase::*;
        use PhaseEvent::*;

        match self {
            Welcome => vec![Start],
            Questioning => vec![AnswerChanged, Proceed],
            Analyzing => vec![AnalysisComplete, Reset],
            Results => vec![Reset],
        }
    }

    /// Human-readable phase name
    pub fn display_name(&self) -> &'static str {
        match self {
            AssessmentPhase::Welcome => "Welcome",
            AssessmentPhase::Questioning => "Security Assessment",
            AssessmentPhase::Analyzing => "Analyzing",
            AssessmentPhase::Results => "Results",
        }
    }
}

impl fmt::Display for AssessmentPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_path() {
        let mut phase = AssessmentPhase::Welcome;
        phase = phase.transition(PhaseEvent::Start).unwrap();
        assert_eq!(phase, AssessmentPhase::Questioning);
        phase = phase.transition(PhaseEvent::AnswerChanged).unwrap();
        assert_eq!(phase, AssessmentPhase::Questioning);
        phase = phase.transition(PhaseEvent::Proceed).unwrap();
        assert_eq!(phase, AssessmentPhase::Analyzing);
        phase = phase.transition(PhaseEvent::AnalysisComplete).unwrap();
        assert_eq!(phase, AssessmentPhase::Results);
        phase = phase.transition(PhaseEvent::Reset).unwrap();
        assert_eq!(phase, AssessmentPhase::Welcome);
    }

    #[test]
    fn test_invalid_transitions() {
        assert!(AssessmentPhase::Welcome.transition(PhaseEvent::Proceed).is_err());
        assert!(AssessmentPhase::Welcome.transition(PhaseEvent::Reset).is_err());
        assert!(AssessmentPhase::Questioning.transition(PhaseEvent::Start).is_err());
        assert!(AssessmentPhase::Results.transition(PhaseEvent::AnalysisComplete).is_err());
        assert!(AssessmentPhase::Analyzing.transition(PhaseEvent::AnswerChanged).is_err());
        assert!(AssessmentPhase::Questioning.transition(PhaseEvent::Reset).is_err());
    }

    #[test]
    fn test_reset_cancels_analysis() {
        assert_eq!(
            AssessmentPhase::Analyzing.transition(PhaseEvent::Reset).unwrap(),
            AssessmentPhase::Welcome
        );
    }

    #[test]
    fn test_valid_events_agree_with_transition() {
        let all = [
            PhaseEvent::Start,
            PhaseEvent::AnswerChanged,
            PhaseEvent::Proceed,
            PhaseEvent::AnalysisComplete,
            PhaseEvent::Reset,
        ];
        for phase in [
            AssessmentPhase::Welcome,
            AssessmentPhase::Questioning,
            AssessmentPhase::Analyzing,
            AssessmentPhase::Results,
        ] {
            let valid = phase.valid_events();
            for event in all {
                assert_eq!(phase.transition(event).is_ok(), valid.contains(&event));
            }
        }
    }
}
