//! Step driver - owns the assessment state and drives phase transitions
//!
//! All mutation of the answer set, cursor and phase goes through one mutex,
//! so user actions and the analyzing timer can never interleave mid-update.
//! The analyzing timer is tagged with an epoch; reset bumps the epoch and
//! aborts the timer so a stale score can never land on a cleared answer set.

use crate::assessment::answers::AnswerSet;
use crate::assessment::catalog::{Question, QuestionCatalog};
use crate::assessment::scoring::{ScoreResult, ScoringEngine};
use crate::assessment::state::{AssessmentPhase, PhaseEvent};
use crate::errors::{AssessError, Result};
use crate::telemetry::{SimulatorConfig, TelemetrySample, TelemetrySimulator};
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use uuid::Uuid;

/// Step driver configuration
#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// Simulated processing time between proceed and results
    pub processing_delay: Duration,

    /// Telemetry simulator settings
    pub telemetry: SimulatorConfig,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            processing_delay: Duration::from_secs(3),
            telemetry: SimulatorConfig::default(),
        }
    }
}

/// Whether an action changed anything
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    /// Action not valid in the current phase; nothing changed
    Ignored,
}

/// Progress snapshot for "Question k of n" style display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub answered: usize,
    pub total: usize,
    /// Catalog index of the question being presented
    pub cursor: usize,
}

impl Progress {
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.answered as f64 / self.total as f64
        }
    }

    pub fn is_complete(&self) -> bool {
        self.answered == self.total
    }
}

/// A finished assessment run
#[derive(Debug, Clone, Serialize)]
pub struct AssessmentReport {
    pub run_id: Uuid,
    pub completed_at: DateTime<Utc>,
    pub answers: AnswerSet,
    pub score: ScoreResult,
}

struct DriverState {
    phase: AssessmentPhase,
    answers: AnswerSet,
    cursor: usize,
    report: Option<AssessmentReport>,
    /// Bumped whenever a pending analysis must be invalidated
    epoch: u64,
    pending: Option<JoinHandle<()>>,
}

struct Inner {
    state: Mutex<DriverState>,
    phase_tx: watch::Sender<AssessmentPhase>,
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, DriverState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply an event to the locked state, publishing the new phase
    fn apply(&self, state: &mut DriverState, event: PhaseEvent) -> Result<AssessmentPhase> {
        let next = state.phase.transition(event)?;
        if next != state.phase {
            debug!("[STATE] {:?} -> {:?}", state.phase, next);
        }
        state.phase = next;
        self.phase_tx.send_replace(next);
        Ok(next)
    }
}

/// Sequential questionnaire driver
///
/// Must be used from within a tokio runtime: `proceed` spawns the analyzing
/// timer and [`StepDriver::launch`] starts telemetry.
pub struct StepDriver {
    catalog: Arc<QuestionCatalog>,
    engine: ScoringEngine,
    config: DriverConfig,
    inner: Arc<Inner>,
    telemetry: TelemetrySimulator,
}

impl StepDriver {
    /// Create a driver in the `Welcome` phase with telemetry stopped
    pub fn new(catalog: QuestionCatalog, config: DriverConfig) -> Result<Self> {
        let catalog = Arc::new(catalog);
        let telemetry = TelemetrySimulator::new(config.telemetry.clone())?;
        let (phase_tx, _) = watch::channel(AssessmentPhase::Welcome);

        Ok(Self {
            engine: ScoringEngine::new(Arc::clone(&catalog)),
            catalog,
            config,
            inner: Arc::new(Inner {
                state: Mutex::new(DriverState {
                    phase: AssessmentPhase::Welcome,
                    answers: AnswerSet::new(),
                    cursor: 0,
                    report: None,
                    epoch: 0,
                    pending: None,
                }),
                phase_tx,
            }),
            telemetry,
        })
    }

    /// Create a driver and start its telemetry feed
    pub fn launch(catalog: QuestionCatalog, config: DriverConfig) -> Result<Self> {
        let mut driver = Self::new(catalog, config)?;
        driver.telemetry.start();
        Ok(driver)
    }

    /// Welcome → Questioning
    pub fn start(&self) -> Outcome {
        let mut state = self.inner.lock();
        match self.inner.apply(&mut state, PhaseEvent::Start) {
            Ok(_) => {
                state.cursor = 0;
                info!("Assessment started ({} questions)", self.catalog.len());
                Outcome::Applied
            }
            Err(e) => {
                debug!("start ignored: {}", e);
                Outcome::Ignored
            }
        }
    }

    /// Record an answer while questioning
    ///
    /// Answering the presented question moves the cursor to the next
    /// unanswered question in catalog order.
    pub fn select_answer(&self, question_id: &str, option: &str) -> Result<Outcome> {
        let mut state = self.inner.lock();
        if state.phase != AssessmentPhase::Questioning {
            debug!("select_answer ignored in {:?}", state.phase);
            return Ok(Outcome::Ignored);
        }

        let index = self
            .catalog
            .index_of(question_id)
            .ok_or_else(|| AssessError::InvalidQuestionId {
                id: question_id.to_string(),
            })?;
        state.answers.select(&self.catalog, question_id, option)?;

        if index == state.cursor {
            if let Some(next) = self.next_unanswered(&state.answers, index) {
                state.cursor = next;
            }
        }

        self.inner.apply(&mut state, PhaseEvent::AnswerChanged)?;
        Ok(Outcome::Applied)
    }

    /// Select by option position within the presented question
    pub fn select_current(&self, option_index: usize) -> Result<Outcome> {
        let (question_id, option) = {
            let state = self.inner.lock();
            if state.phase != AssessmentPhase::Questioning {
                return Ok(Outcome::Ignored);
            }
            let question = &self.catalog.questions()[state.cursor];
            let option = question.options.get(option_index).ok_or_else(|| AssessError::InvalidOption {
                question_id: question.id.clone(),
                option: format!("#{}", option_index + 1),
            })?;
            (question.id.clone(), option.label.clone())
        };
        self.select_answer(&question_id, &option)
    }

    /// Questioning → Analyzing, once every question is answered
    ///
    /// On success the analyzing timer is armed; scoring runs once when it
    /// fires. An incomplete answer set is left untouched.
    pub fn proceed(&self) -> Result<Outcome> {
        let mut state = self.inner.lock();
        if state.phase != AssessmentPhase::Questioning {
            debug!("proceed ignored in {:?}", state.phase);
            return Ok(Outcome::Ignored);
        }

        let missing = state.answers.missing(&self.catalog);
        if !missing.is_empty() {
            return Err(AssessError::IncompleteAssessment { missing });
        }

        self.inner.apply(&mut state, PhaseEvent::Proceed)?;
        state.epoch += 1;

        let task = tokio::spawn(finish_analysis(
            Arc::clone(&self.inner),
            self.engine.clone(),
            state.epoch,
            self.config.processing_delay,
        ));
        state.pending = Some(task);
        info!("Analyzing {} answers", state.answers.len());
        Ok(Outcome::Applied)
    }

    /// Clear the most recently answered question and present it again
    pub fn go_back(&self) -> Outcome {
        let mut state = self.inner.lock();
        if state.phase != AssessmentPhase::Questioning {
            return Outcome::Ignored;
        }

        let Some(removed) = state.answers.remove_last() else {
            return Outcome::Ignored;
        };
        if let Some(index) = self.catalog.index_of(&removed.question_id) {
            state.cursor = index;
        }
        let _ = self.inner.apply(&mut state, PhaseEvent::AnswerChanged);
        debug!("Cleared answer to {}", removed.question_id);
        Outcome::Applied
    }

    /// Present a specific question without changing any answer
    pub fn jump_to(&self, question_id: &str) -> Result<Outcome> {
        let mut state = self.inner.lock();
        if state.phase != AssessmentPhase::Questioning {
            return Ok(Outcome::Ignored);
        }
        state.cursor = self
            .catalog
            .index_of(question_id)
            .ok_or_else(|| AssessError::InvalidQuestionId {
                id: question_id.to_string(),
            })?;
        Ok(Outcome::Applied)
    }

    /// Results (or Analyzing) → Welcome, discarding answers and score
    pub fn reset(&self) -> Outcome {
        let mut state = self.inner.lock();
        if let Err(e) = self.inner.apply(&mut state, PhaseEvent::Reset) {
            debug!("reset ignored: {}", e);
            return Outcome::Ignored;
        }

        state.epoch += 1;
        if let Some(task) = state.pending.take() {
            task.abort();
            info!("Pending analysis cancelled");
        }
        state.answers.clear();
        state.cursor = 0;
        state.report = None;
        Outcome::Applied
    }

    /// Stop telemetry and cancel any pending analysis
    pub fn shutdown(&mut self) {
        self.telemetry.stop();
        let mut state = self.inner.lock();
        state.epoch += 1;
        if let Some(task) = state.pending.take() {
            task.abort();
        }
    }

    pub fn phase(&self) -> AssessmentPhase {
        self.inner.lock().phase
    }

    /// Snapshot of the current answers
    pub fn answers(&self) -> AnswerSet {
        self.inner.lock().answers.clone()
    }

    /// Score of the finished run; `None` outside `Results`
    pub fn score(&self) -> Option<ScoreResult> {
        self.report().map(|r| r.score)
    }

    pub fn report(&self) -> Option<AssessmentReport> {
        let state = self.inner.lock();
        match state.phase {
            AssessmentPhase::Results => state.report.clone(),
            _ => None,
        }
    }

    /// Question at the cursor; `None` outside `Questioning`
    pub fn current_question(&self) -> Option<Question> {
        let state = self.inner.lock();
        match state.phase {
            AssessmentPhase::Questioning => self.catalog.questions().get(state.cursor).cloned(),
            _ => None,
        }
    }

    pub fn progress(&self) -> Progress {
        let state = self.inner.lock();
        Progress {
            answered: state.answers.len(),
            total: self.catalog.len(),
            cursor: state.cursor,
        }
    }

    /// Latest telemetry sample
    pub fn current_telemetry(&self) -> TelemetrySample {
        self.telemetry.current()
    }

    pub fn telemetry(&self) -> &TelemetrySimulator {
        &self.telemetry
    }

    pub fn telemetry_mut(&mut self) -> &mut TelemetrySimulator {
        &mut self.telemetry
    }

    pub fn catalog(&self) -> &QuestionCatalog {
        &self.catalog
    }

    /// Receiver that observes every phase change
    pub fn watch_phase(&self) -> watch::Receiver<AssessmentPhase> {
        self.inner.phase_tx.subscribe()
    }

    /// Wait out the analyzing phase
    ///
    /// Returns the report once `Results` is reached, or `None` if the run was
    /// reset (or was never analyzing).
    pub async fn wait_for_results(&self) -> Option<AssessmentReport> {
        let mut rx = self.watch_phase();
        loop {
            let phase = *rx.borrow_and_update();
            match phase {
                AssessmentPhase::Results => return self.report(),
                AssessmentPhase::Analyzing => {}
                _ => return None,
            }
            if rx.changed().await.is_err() {
                return None;
            }
        }
    }

    fn next_unanswered(&self, answers: &AnswerSet, from: usize) -> Option<usize> {
        let questions = self.catalog.questions();
        let n = questions.len();
        (1..=n)
            .map(|step| (from + step) % n)
            .find(|&i| !answers.is_answered(&questions[i].id))
    }
}

impl Drop for StepDriver {
    fn drop(&mut self) {
        self.shutdown();
    }
}

async fn finish_analysis(inner: Arc<Inner>, engine: ScoringEngine, epoch: u64, delay: Duration) {
    tokio::time::sleep(delay).await;

    let mut state = inner.lock();
    if state.epoch != epoch || state.phase != AssessmentPhase::Analyzing {
        debug!("Discarding stale analysis (epoch {})", epoch);
        return;
    }
    state.pending = None;

    match engine.score(&state.answers) {
        Ok(score) => {
            info!("Assessment scored {}/{} ({})", score.total_score, score.max_score, score.level);
            state.report = Some(AssessmentReport {
                run_id: Uuid::new_v4(),
                completed_at: Utc::now(),
                answers: state.answers.clone(),
                score,
            });
            if let Err(e) = inner.apply(&mut state, PhaseEvent::AnalysisComplete) {
                warn!("Could not publish results: {}", e);
            }
        }
        Err(e) => {
            // Answers are frozen while analyzing, so this means proceed let
            // an incomplete set through. Hand the answers back to the user.
            warn!("Scoring failed: {}", e);
            state.phase = AssessmentPhase::Questioning;
            inner.phase_tx.send_replace(AssessmentPhase::Questioning);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn driver() -> StepDriver {
        let config = DriverConfig {
            processing_delay: Duration::from_millis(50),
            ..DriverConfig::default()
        };
        StepDriver::new(QuestionCatalog::network_security(), config).unwrap()
    }

    #[test]
    fn test_initial_state() {
        let driver = driver();
        assert_eq!(driver.phase(), AssessmentPhase::Welcome);
        assert!(driver.answers().is_empty());
        assert!(driver.score().is_none());
        assert!(driver.current_question().is_none());
    }

    #[test]
    fn test_actions_ignored_before_start() {
        let driver = driver();
        assert_eq!(driver.select_answer("usesVPN", "No").unwrap(), Outcome::Ignored);
        assert_eq!(driver.proceed().unwrap(), Outcome::Ignored);
        assert_eq!(driver.go_back(), Outcome::Ignored);
        assert_eq!(driver.reset(), Outcome::Ignored);
        assert_eq!(driver.phase(), AssessmentPhase::Welcome);
    }

    #[test]
    fn test_start_is_idempotent() {
        let driver = driver();
        assert_eq!(driver.start(), Outcome::Applied);
        assert_eq!(driver.start(), Outcome::Ignored);
        assert_eq!(driver.phase(), AssessmentPhase::Questioning);
    }

    #[test]
    fn test_cursor_advances_on_answer() {
        let driver = driver();
        driver.start();
        assert_eq!(driver.current_question().unwrap().id, "networkType");

        driver.select_current(0).unwrap();
        assert_eq!(driver.current_question().unwrap().id, "usesVPN");
        assert_eq!(driver.answers().get("networkType"), Some("Home WiFi"));

        // Answering a question other than the presented one keeps the cursor
        driver.select_answer("deviceUpdates", "Monthly").unwrap();
        assert_eq!(driver.current_question().unwrap().id, "usesVPN");
        assert_eq!(driver.progress().answered, 2);
    }

    #[test]
    fn test_cursor_skips_answered_questions() {
        let driver = driver();
        driver.start();
        driver.select_answer("usesVPN", "No").unwrap();
        driver.select_current(1).unwrap();
        assert_eq!(driver.current_question().unwrap().id, "publicWifi");
    }

    #[test]
    fn test_invalid_selection_is_a_no_op() {
        let driver = driver();
        driver.start();

        let err = driver.select_answer("firewall", "Yes").unwrap_err();
        assert!(matches!(err, AssessError::InvalidQuestionId { .. }));

        let err = driver.select_current(9).unwrap_err();
        assert!(matches!(err, AssessError::InvalidOption { .. }));

        assert!(driver.answers().is_empty());
        assert_eq!(driver.progress().cursor, 0);
    }

    #[test]
    fn test_go_back_clears_last_answer() {
        let driver = driver();
        driver.start();
        assert_eq!(driver.go_back(), Outcome::Ignored);

        driver.select_answer("networkType", "Mobile Data").unwrap();
        driver.select_answer("usesVPN", "Sometimes").unwrap();
        assert_eq!(driver.go_back(), Outcome::Applied);

        assert!(!driver.answers().is_answered("usesVPN"));
        assert!(driver.answers().is_answered("networkType"));
        assert_eq!(driver.current_question().unwrap().id, "usesVPN");
        assert_eq!(driver.phase(), AssessmentPhase::Questioning);
    }

    #[test]
    fn test_proceed_requires_every_answer() {
        let driver = driver();
        driver.start();
        driver.select_answer("networkType", "Home WiFi").unwrap();

        match driver.proceed() {
            Err(AssessError::IncompleteAssessment { missing }) => {
                assert_eq!(missing, vec!["usesVPN", "publicWifi", "passwordStrength", "deviceUpdates"]);
            }
            other => panic!("expected IncompleteAssessment, got {:?}", other),
        }
        assert_eq!(driver.phase(), AssessmentPhase::Questioning);
        assert_eq!(driver.answers().get("networkType"), Some("Home WiFi"));
    }

    #[test]
    fn test_jump_to() {
        let driver = driver();
        driver.start();
        driver.jump_to("passwordStrength").unwrap();
        assert_eq!(driver.current_question().unwrap().id, "passwordStrength");
        assert!(driver.jump_to("firewall").is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_run() {
        let driver = driver();
        driver.start();
        for _ in 0..5 {
            driver.select_current(0).unwrap();
        }
        assert!(driver.progress().is_complete());

        assert_eq!(driver.proceed().unwrap(), Outcome::Applied);
        assert_eq!(driver.phase(), AssessmentPhase::Analyzing);
        assert!(driver.score().is_none());

        // Answers are frozen while analyzing
        assert_eq!(driver.select_answer("usesVPN", "No").unwrap(), Outcome::Ignored);

        let report = driver.wait_for_results().await.unwrap();
        assert_eq!(driver.phase(), AssessmentPhase::Results);
        // Home WiFi, Yes always, Daily, Very Strong, Automatic
        assert_eq!(report.score.total_score, 20 + 25 + 5 + 25 + 25);
        assert_eq!(report.score.recommendations.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_during_analysis_cancels_results() {
        let driver = driver();
        driver.start();
        for _ in 0..5 {
            driver.select_current(3).unwrap();
        }
        driver.proceed().unwrap();
        assert_eq!(driver.reset(), Outcome::Applied);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(driver.phase(), AssessmentPhase::Welcome);
        assert!(driver.answers().is_empty());
        assert!(driver.score().is_none());
    }
}
