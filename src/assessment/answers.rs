//! Answer store
//!
//! Maps question ids to the selected option. Entries are kept in the order
//! they were answered so that "go back" has a single unambiguous target.

use crate::assessment::catalog::QuestionCatalog;
use crate::errors::{AssessError, Result};
use serde::{Deserialize, Serialize};

/// A single recorded answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub question_id: String,
    pub option: String,
}

/// Selected options keyed by question id, in answer order
///
/// Invariant: every entry names a catalog question and one of its options.
/// The only way to add entries is through [`AnswerSet::select`], which checks
/// both against the catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AnswerSet {
    entries: Vec<Answer>,
}

impl AnswerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a validated answer set from `(question_id, option)` pairs
    pub fn from_pairs<'a, I>(catalog: &QuestionCatalog, pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut answers = Self::new();
        for (id, option) in pairs {
            answers.select(catalog, id, option)?;
        }
        Ok(answers)
    }

    /// Record an answer
    ///
    /// Re-answering a question replaces its value and makes it the most
    /// recent entry.
    pub fn select(&mut self, catalog: &QuestionCatalog, question_id: &str, option: &str) -> Result<()> {
        let question = catalog.get(question_id).ok_or_else(|| AssessError::InvalidQuestionId {
            id: question_id.to_string(),
        })?;

        if !question.has_option(option) {
            return Err(AssessError::InvalidOption {
                question_id: question_id.to_string(),
                option: option.to_string(),
            });
        }

        self.entries.retain(|a| a.question_id != question_id);
        self.entries.push(Answer {
            question_id: question_id.to_string(),
            option: option.to_string(),
        });
        Ok(())
    }

    /// Selected option for a question, if answered
    pub fn get(&self, question_id: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|a| a.question_id == question_id)
            .map(|a| a.option.as_str())
    }

    pub fn is_answered(&self, question_id: &str) -> bool {
        self.get(question_id).is_some()
    }

    /// Remove and return the most recently answered entry
    pub fn remove_last(&mut self) -> Option<Answer> {
        self.entries.pop()
    }

    /// Most recently answered entry
    pub fn last(&self) -> Option<&Answer> {
        self.entries.last()
    }

    /// Catalog question ids that still have no answer, in catalog order
    pub fn missing(&self, catalog: &QuestionCatalog) -> Vec<String> {
        catalog
            .questions()
            .iter()
            .filter(|q| !self.is_answered(&q.id))
            .map(|q| q.id.clone())
            .collect()
    }

    pub fn is_complete(&self, catalog: &QuestionCatalog) -> bool {
        catalog.questions().iter().all(|q| self.is_answered(&q.id))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Answers in the order they were given
    pub fn iter(&self) -> impl Iterator<Item = &Answer> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
