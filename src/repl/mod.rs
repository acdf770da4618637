//! Interactive terminal front ends
//!
//! [`AssessmentRepl`] presents the step driver one question at a time;
//! [`ChatRepl`] runs the security assistant conversation. Both read lines
//! with rustyline, parse them into [`Command`]s and render through the
//! [`DisplayManager`].

pub mod commands;
pub mod display;
pub mod input;

use anyhow::Result;
use log::info;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::assessment::{AssessmentPhase, Outcome, StepDriver};
use crate::chat::{ChatSession, TextCompletionService};
use crate::errors::AssessError;
use crate::telemetry::{LinkQuality, TelemetrySubscription};

pub use crate::repl::commands::{parse, Command};
pub use crate::repl::display::DisplayManager;
pub use crate::repl::input::{InputEvent, InputHandler};

use crate::repl::commands::{ASSESSMENT_HELP, CHAT_HELP};

/// Assessment session coordinator
pub struct AssessmentRepl {
    driver: StepDriver,
    display: DisplayManager,
    _link_watch: TelemetrySubscription,
}

impl AssessmentRepl {
    pub fn new(driver: StepDriver, display: DisplayManager) -> Self {
        let unstable = AtomicBool::new(false);
        let link_watch = driver.telemetry().subscribe(move |sample| {
            let now = sample.link_quality == LinkQuality::Unstable;
            if unstable.swap(now, Ordering::Relaxed) != now {
                info!("Link quality changed: {}", sample.link_quality);
            }
        });

        Self {
            driver,
            display,
            _link_watch: link_watch,
        }
    }

    /// Run until the user exits
    pub async fn run(&mut self, input: &mut InputHandler) -> Result<()> {
        self.display
            .show_banner(env!("CARGO_PKG_VERSION"), "Network Security Assessment");
        self.display.show_welcome(self.driver.catalog().len());

        loop {
            let line = match input.read_line()? {
                InputEvent::Line(line) => line,
                InputEvent::Interrupted | InputEvent::Eof => break,
            };
            if line.is_empty() {
                continue;
            }
            if !self.handle(parse(&line)).await? {
                break;
            }
        }

        self.driver.shutdown();
        Ok(())
    }

    /// Apply one command
    ///
    /// Returns true if the session should continue, false to exit
    pub async fn handle(&mut self, command: Command) -> Result<bool> {
        match command {
            Command::Help => self.display.show_help(ASSESSMENT_HELP),
            Command::Start => match self.driver.start() {
                Outcome::Applied => self.render(),
                Outcome::Ignored => self.hint(),
            },
            Command::Select(n) => {
                if self.driver.phase() != AssessmentPhase::Questioning {
                    self.hint();
                    return Ok(true);
                }
                let Some(index) = n.checked_sub(1) else {
                    self.hint();
                    return Ok(true);
                };
                match self.driver.select_current(index) {
                    Ok(_) => self.render(),
                    Err(e) => self.display.show_error(&e.to_string()),
                }
            }
            Command::Next => self.proceed().await,
            Command::Back => match self.driver.go_back() {
                Outcome::Applied => self.render(),
                Outcome::Ignored => self.display.show_info("Nothing to undo"),
            },
            Command::Goto { question_id } => match self.driver.jump_to(&question_id) {
                Ok(Outcome::Applied) => self.render(),
                Ok(Outcome::Ignored) => self.hint(),
                Err(e) => self.display.show_error(&e.to_string()),
            },
            Command::Status => self.show_status(),
            Command::Telemetry => self.display.show_telemetry(&self.driver.current_telemetry()),
            Command::Reset => match self.driver.reset() {
                Outcome::Applied => self.display.show_welcome(self.driver.catalog().len()),
                Outcome::Ignored => self.display.show_info("Reset is available once results are shown"),
            },
            Command::Clear => self.display.clear_screen(),
            Command::Exit => return Ok(false),
            Command::Text { .. } => self.hint(),
            Command::Unknown { input } => {
                self.display.show_error(&format!("Unknown command: {}", input));
                self.display.show_info("Type /help for available commands");
            }
        }
        Ok(true)
    }

    async fn proceed(&mut self) {
        match self.driver.proceed() {
            Ok(Outcome::Applied) => {
                self.display.start_analyzing();
                match self.driver.wait_for_results().await {
                    Some(report) => self.display.show_results(&report),
                    None => {
                        self.display.finish_current();
                        self.display.show_error("Analysis did not complete");
                        self.render();
                    }
                }
            }
            Ok(Outcome::Ignored) => self.hint(),
            Err(e @ AssessError::IncompleteAssessment { .. }) => {
                self.display.show_warning(&e.to_string())
            }
            Err(e) => self.display.show_error(&e.to_string()),
        }
    }

    /// Show the question at the cursor
    fn render(&self) {
        let Some(question) = self.driver.current_question() else {
            return;
        };
        let answers = self.driver.answers();
        self.display.show_telemetry(&self.driver.current_telemetry());
        self.display
            .show_question(&question, self.driver.progress(), answers.get(&question.id));
    }

    fn show_status(&self) {
        let progress = self.driver.progress();
        self.display.show_section("Status");
        println!("  Phase:     {}", self.driver.phase().display_name());
        println!("  Answered:  {}/{}", progress.answered, progress.total);
        let stats = self.driver.telemetry().stats();
        println!(
            "  Telemetry: {} updates, {} unstable",
            stats.ticks, stats.unstable_events
        );
        println!();
    }

    /// Nudge toward the next valid action for the current phase
    fn hint(&self) {
        let msg = match self.driver.phase() {
            AssessmentPhase::Welcome => "Type /start to begin the assessment",
            AssessmentPhase::Questioning => "Type an option number, or /help for commands",
            AssessmentPhase::Analyzing => "Analysis in progress",
            AssessmentPhase::Results => "Type /reset to take the assessment again",
        };
        self.display.show_info(msg);
    }

    pub fn driver(&self) -> &StepDriver {
        &self.driver
    }
}

/// Chat session coordinator
pub struct ChatRepl<S: TextCompletionService> {
    session: ChatSession<S>,
    display: DisplayManager,
}

impl<S: TextCompletionService> ChatRepl<S> {
    pub fn new(session: ChatSession<S>, display: DisplayManager) -> Self {
        Self { session, display }
    }

    /// Run until the user exits
    pub async fn run(&mut self, input: &mut InputHandler) -> Result<()> {
        self.display
            .show_banner(env!("CARGO_PKG_VERSION"), "Security Assistant");
        for message in self.session.messages() {
            self.display.show_chat_message(message);
        }

        loop {
            let line = match input.read_line()? {
                InputEvent::Line(line) => line,
                InputEvent::Interrupted | InputEvent::Eof => break,
            };
            if line.is_empty() {
                continue;
            }
            if !self.handle(parse(&line)).await? {
                break;
            }
        }

        input.save_history()?;
        Ok(())
    }

    /// Returns true if the session should continue, false to exit
    pub async fn handle(&mut self, command: Command) -> Result<bool> {
        match command {
            Command::Help => self.display.show_help(CHAT_HELP),
            Command::Exit => return Ok(false),
            Command::Clear => {
                self.session.clear();
                if let Some(message) = self.session.messages().last() {
                    self.display.show_chat_message(message);
                }
            }
            Command::Text { input } => self.send(&input).await?,
            // Bare numbers are questions too
            Command::Select(n) => self.send(&n.to_string()).await?,
            Command::Unknown { input } => {
                self.display.show_error(&format!("Unknown command: {}", input));
                self.display.show_info("Type /help for available commands");
            }
            _ => self.display.show_info("That command is only available in the assessment"),
        }
        Ok(true)
    }

    async fn send(&mut self, text: &str) -> Result<()> {
        let spinner = self.display.start_analyzing();
        if let Some(pb) = &spinner {
            pb.set_message("Thinking...");
        }
        let reply = self.session.send(text).await?.cloned();
        self.display.finish_current();
        if let Some(message) = reply {
            self.display.show_chat_message(&message);
        }
        Ok(())
    }

    pub fn session(&self) -> &ChatSession<S> {
        &self.session
    }
}
