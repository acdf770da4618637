//! Weighted scoring engine
//!
//! Pure function over a complete answer set. Every question contributes
//! independently: total = sum of the chosen options' points. Recommendations
//! follow catalog order, not answer order.

use crate::assessment::answers::AnswerSet;
use crate::assessment::catalog::QuestionCatalog;
use crate::errors::{AssessError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Minimum score for each level, highest first
const LEVEL_THRESHOLDS: [(u32, SecurityLevel); 4] = [
    (85, SecurityLevel::Excellent),
    (70, SecurityLevel::Good),
    (50, SecurityLevel::Fair),
    (30, SecurityLevel::Poor),
];

/// Overall security posture band
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SecurityLevel {
    Critical,
    Poor,
    Fair,
    Good,
    Excellent,
}

impl SecurityLevel {
    /// Map an absolute score onto a level
    pub fn from_score(score: u32) -> Self {
        LEVEL_THRESHOLDS
            .iter()
            .find(|(min, _)| score >= *min)
            .map(|(_, level)| *level)
            .unwrap_or(SecurityLevel::Critical)
    }

    pub fn label(&self) -> &'static str {
        match self {
            SecurityLevel::Critical => "Critical",
            SecurityLevel::Poor => "Poor",
            SecurityLevel::Fair => "Fair",
            SecurityLevel::Good => "Good",
            SecurityLevel::Excellent => "Excellent",
        }
    }
}

impl fmt::Display for SecurityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Points awarded for one question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionScore {
    pub question_id: String,
    pub option: String,
    pub points: u32,
    pub max_points: u32,
}

/// Outcome of scoring one complete answer set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub total_score: u32,
    pub max_score: u32,
    pub level: SecurityLevel,
    pub recommendations: Vec<String>,
    pub breakdown: Vec<QuestionScore>,
}

impl ScoreResult {
    /// Score as a fraction of the catalog maximum, in `[0, 1]`
    pub fn fraction(&self) -> f64 {
        if self.max_score == 0 {
            0.0
        } else {
            self.total_score as f64 / self.max_score as f64
        }
    }
}

/// Scores answer sets against a catalog's rule table
#[derive(Debug, Clone)]
pub struct ScoringEngine {
    catalog: Arc<QuestionCatalog>,
}

impl ScoringEngine {
    pub fn new(catalog: Arc<QuestionCatalog>) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &QuestionCatalog {
        &self.catalog
    }

    /// Score a complete answer set
    ///
    /// Fails with `IncompleteInput` if any catalog question is unanswered;
    /// there is no partial scoring.
    pub fn score(&self, answers: &AnswerSet) -> Result<ScoreResult> {
        let missing = answers.missing(&self.catalog);
        if !missing.is_empty() {
            return Err(AssessError::IncompleteInput { missing });
        }

        let mut total_score = 0;
        let mut recommendations = Vec::new();
        let mut breakdown = Vec::with_capacity(self.catalog.len());

        for question in self.catalog.questions() {
            let option = answers.get(&question.id).ok_or_else(|| AssessError::IncompleteInput {
                missing: vec![question.id.clone()],
            })?;

            // AnswerSet::select only admits catalog options
            let rule = question.rule_for(option).ok_or_else(|| AssessError::InvalidOption {
                question_id: question.id.clone(),
                option: option.to_string(),
            })?;

            total_score += rule.points;
            if let Some(text) = &rule.recommendation {
                recommendations.push(text.clone());
            }
            breakdown.push(QuestionScore {
                question_id: question.id.clone(),
                option: option.to_string(),
                points: rule.points,
                max_points: question.max_points(),
            });
        }

        Ok(ScoreResult {
            total_score,
            max_score: self.catalog.max_score(),
            level: SecurityLevel::from_score(total_score),
            recommendations,
            breakdown,
        })
    }
}
