//! Question catalog and per-option rule table
//!
//! The catalog is an ordered, immutable list of questions. Each option carries
//! its own scoring rule: a point contribution in `[0, MAX_OPTION_POINTS]` and
//! an optional recommendation emitted when the option is chosen.

use crate::errors::{AssessError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Upper bound for a single option's point contribution
pub const MAX_OPTION_POINTS: u32 = 25;

/// One selectable answer and the rule attached to it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceRule {
    pub label: String,
    pub points: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,
}

impl ChoiceRule {
    pub fn new(label: &str, points: u32) -> Self {
        Self {
            label: label.to_string(),
            points,
            recommendation: None,
        }
    }

    /// Attach the recommendation emitted when this option is chosen
    pub fn recommend(mut self, text: &str) -> Self {
        self.recommendation = Some(text.to_string());
        self
    }
}

/// A single assessment question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub prompt: String,
    pub options: Vec<ChoiceRule>,
}

impl Question {
    pub fn new(id: &str, prompt: &str, options: Vec<ChoiceRule>) -> Self {
        Self {
            id: id.to_string(),
            prompt: prompt.to_string(),
            options,
        }
    }

    /// Option labels in presentation order
    pub fn option_labels(&self) -> impl Iterator<Item = &str> {
        self.options.iter().map(|o| o.label.as_str())
    }

    /// Look up the rule for an option label
    pub fn rule_for(&self, option: &str) -> Option<&ChoiceRule> {
        self.options.iter().find(|o| o.label == option)
    }

    pub fn has_option(&self, option: &str) -> bool {
        self.rule_for(option).is_some()
    }

    /// Best achievable contribution for this question
    pub fn max_points(&self) -> u32 {
        self.options.iter().map(|o| o.points).max().unwrap_or(0)
    }
}

/// Ordered, validated list of questions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionCatalog {
    questions: Vec<Question>,
}

impl QuestionCatalog {
    /// Build a catalog, rejecting anything that would break the answer-set invariants
    pub fn new(questions: Vec<Question>) -> Result<Self> {
        if questions.is_empty() {
            return Err(AssessError::InvalidCatalog(
                "catalog must contain at least one question".to_string(),
            ));
        }

        let mut ids = HashSet::new();
        for question in &questions {
            if question.id.trim().is_empty() {
                return Err(AssessError::InvalidCatalog(
                    "question id must not be empty".to_string(),
                ));
            }
            if !ids.insert(question.id.as_str()) {
                return Err(AssessError::InvalidCatalog(format!(
                    "duplicate question id: {}",
                    question.id
                )));
            }
            if question.options.is_empty() {
                return Err(AssessError::InvalidCatalog(format!(
                    "question {} has no options",
                    question.id
                )));
            }

            let mut labels = HashSet::new();
            for option in &question.options {
                if !labels.insert(option.label.as_str()) {
                    return Err(AssessError::InvalidCatalog(format!(
                        "question {} repeats option {:?}",
                        question.id, option.label
                    )));
                }
                if option.points > MAX_OPTION_POINTS {
                    return Err(AssessError::InvalidCatalog(format!(
                        "option {:?} of {} awards {} points (max {})",
                        option.label, question.id, option.points, MAX_OPTION_POINTS
                    )));
                }
            }
        }

        Ok(Self { questions })
    }

    /// Load a catalog from a TOML file with `[[questions]]` tables
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AssessError::InvalidCatalog(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        #[derive(Deserialize)]
        struct CatalogFile {
            questions: Vec<Question>,
        }

        let file: CatalogFile = toml::from_str(contents)
            .map_err(|e| AssessError::InvalidCatalog(format!("Failed to parse catalog: {}", e)))?;
        Self::new(file.questions)
    }

    /// The five-question home network security assessment
    pub fn network_security() -> Self {
        let questions = vec![
            Question::new(
                "networkType",
                "What type of network are you primarily using?",
                vec![
                    ChoiceRule::new("Home WiFi", 20),
                    ChoiceRule::new("Work Network", 25),
                    ChoiceRule::new("Mobile Data", 15),
                    ChoiceRule::new("Public WiFi", 5).recommend(
                        "Using public WiFi introduces significant security risks. Always use a VPN when connected to public networks.",
                    ),
                ],
            ),
            Question::new(
                "usesVPN",
                "Do you use a VPN service?",
                vec![
                    ChoiceRule::new("Yes, always", 25),
                    ChoiceRule::new("Sometimes", 15).recommend(
                        "Consider using a VPN consistently to enhance your connection security.",
                    ),
                    ChoiceRule::new("No", 5).recommend(
                        "Installing and using a reputable VPN service would significantly improve your network security.",
                    ),
                    ChoiceRule::new("Not sure what a VPN is", 0).recommend(
                        "A VPN (Virtual Private Network) encrypts your internet connection and provides anonymity. We recommend learning about and using VPN services.",
                    ),
                ],
            ),
            Question::new(
                "publicWifi",
                "How often do you connect to public WiFi networks?",
                vec![
                    ChoiceRule::new("Daily", 5).recommend(
                        "Daily use of public WiFi is a significant security risk. Always use a VPN and consider using mobile data for sensitive tasks.",
                    ),
                    ChoiceRule::new("Weekly", 10).recommend(
                        "Be cautious when using public WiFi networks. Use a VPN and avoid accessing sensitive information.",
                    ),
                    ChoiceRule::new("Rarely", 20),
                    ChoiceRule::new("Never", 25),
                ],
            ),
            Question::new(
                "passwordStrength",
                "How would you rate your WiFi password strength?",
                vec![
                    ChoiceRule::new("Very Strong (16+ characters, mixed types)", 25),
                    ChoiceRule::new("Strong (12+ characters)", 20),
                    ChoiceRule::new("Moderate (8-12 characters)", 15).recommend(
                        "Consider strengthening your WiFi password to at least 12 characters with a mix of letters, numbers, and symbols.",
                    ),
                    ChoiceRule::new("Weak or Default", 5).recommend(
                        "Your WiFi password is a critical security element. Change it immediately to a strong password of at least 12 characters with mixed character types.",
                    ),
                ],
            ),
            Question::new(
                "deviceUpdates",
                "How often do you update your devices and router firmware?",
                vec![
                    ChoiceRule::new("Automatic updates enabled", 25),
                    ChoiceRule::new("Monthly", 20),
                    ChoiceRule::new("When reminded", 15).recommend(
                        "Set up automatic updates for all your devices and router firmware to ensure security patches are applied promptly.",
                    ),
                    ChoiceRule::new("Rarely or never", 5).recommend(
                        "Update all your devices and router firmware immediately, and set a regular schedule for future updates. This is critical for security.",
                    ),
                ],
            ),
        ];

        Self { questions }
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == id)
    }

    /// Catalog position of a question id
    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.questions.iter().position(|q| q.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index_of(id).is_some()
    }

    /// Highest total score the catalog can produce
    pub fn max_score(&self) -> u32 {
        self.questions.iter().map(Question::max_points).sum()
    }
}

impl Default for QuestionCatalog {
    fn default() -> Self {
        Self::network_security()
    }
}
