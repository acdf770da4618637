//! Display manager for the terminal UI
//!
//! Renders questions, telemetry, results and chat messages with colored
//! output, and an indicatif spinner while answers are analyzed.

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

use crate::assessment::{AssessmentReport, Progress, Question, ScoreResult, SecurityLevel};
use crate::chat::{ChatMessage, Role};
use crate::telemetry::{LinkQuality, TelemetrySample};

const WIDTH: usize = 64;

/// Display manager for REPL UI
pub struct DisplayManager {
    current_bar: Option<ProgressBar>,
    update_interval: Duration,
    show_progress: bool,
}

impl DisplayManager {
    pub fn new(color: bool, show_progress: bool) -> Self {
        colored::control::set_override(color);
        DisplayManager {
            current_bar: None,
            update_interval: Duration::from_millis(100),
            show_progress,
        }
    }

    /// Show welcome banner
    pub fn show_banner(&self, version: &str, subtitle: &str) {
        let rule = "=".repeat(WIDTH);
        println!("\n{}", rule.cyan());
        println!("{}", format!("  SecBuddy {} - {}", version, subtitle).bold().cyan());
        println!("{}\n", rule.cyan());
    }

    /// Welcome screen text for the assessment
    pub fn show_welcome(&self, question_count: usize) {
        println!("Answer {} quick questions about how you connect to the internet.", question_count);
        println!("Your answers are scored and turned into concrete recommendations.\n");
        println!(
            "Type {} to begin, {} for commands, {} to quit\n",
            "/start".green(),
            "/help".green(),
            "/exit".green()
        );
    }

    /// Show the current question with its numbered options
    pub fn show_question(&self, question: &Question, progress: Progress, selected: Option<&str>) {
        println!();
        println!(
            "{} {}",
            format!("Question {} of {}", progress.cursor + 1, progress.total).bold().cyan(),
            format!("({})", question.id).dimmed()
        );
        println!("{}", progress_bar(progress.answered, progress.total).cyan());
        println!("\n{}\n", question.prompt.bold());

        for (i, label) in question.option_labels().enumerate() {
            if selected == Some(label) {
                println!("  {} {}", format!("{}.", i + 1).green().bold(), label.green().bold());
            } else {
                println!("  {} {}", format!("{}.", i + 1).cyan(), label);
            }
        }
        println!();

        if progress.is_complete() {
            println!("All questions answered. Type {} to analyze.", "/next".green());
        }
    }

    /// One-line simulated network status
    pub fn show_telemetry(&self, sample: &TelemetrySample) {
        println!("{}", telemetry_line(sample));
    }

    /// Start the analyzing spinner
    pub fn start_analyzing(&mut self) -> Option<ProgressBar> {
        self.finish_current();
        if !self.show_progress {
            return None;
        }

        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg} [{elapsed}]")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message("Analyzing your network security...");
        pb.enable_steady_tick(self.update_interval);

        self.current_bar = Some(pb.clone());
        Some(pb)
    }

    /// Finish current progress bar
    pub fn finish_current(&mut self) {
        if let Some(pb) = self.current_bar.take() {
            pb.finish_and_clear();
        }
    }

    /// Show the scored report
    pub fn show_results(&mut self, report: &AssessmentReport) {
        self.finish_current();
        self.show_score(&report.score);
        println!(
            "{}",
            format!(
                "Run {} | {}",
                report.run_id,
                report.completed_at.format("%Y-%m-%d %H:%M:%S UTC")
            )
            .dimmed()
        );
        println!("\nType {} to take the assessment again.\n", "/reset".green());
    }

    /// Score, level and recommendations
    pub fn show_score(&self, score: &ScoreResult) {
        self.show_section("Security Assessment Results");
        println!(
            "  Score: {}   Level: {}",
            format!("{}/{}", score.total_score, score.max_score).bold(),
            level_colored(score.level)
        );
        println!(
            "  {}",
            progress_bar(score.total_score as usize, score.max_score as usize)
        );

        println!("\n{}", "Breakdown".bold());
        for item in &score.breakdown {
            println!(
                "  {} {} {}",
                "•".cyan(),
                format!("{:<18}", item.question_id),
                format!("{:>2}/{:<2}  {}", item.points, item.max_points, item.option).dimmed()
            );
        }

        println!("\n{}", "Recommendations".bold());
        if score.recommendations.is_empty() {
            println!(
                "  {} {}",
                "✓".green(),
                "Your network security practices look solid. Keep it up!".green()
            );
        } else {
            for (i, rec) in score.recommendations.iter().enumerate() {
                println!("  {}. {}", (i + 1).to_string().cyan(), rec);
            }
        }
        println!();
    }

    /// List every question with its options
    pub fn show_catalog(&self, questions: &[Question]) {
        for (n, question) in questions.iter().enumerate() {
            println!(
                "{} {} {}",
                format!("{}.", n + 1).bold().cyan(),
                question.prompt.bold(),
                format!("({})", question.id).dimmed()
            );
            for (i, option) in question.options.iter().enumerate() {
                println!(
                    "     {}) {} {}",
                    i + 1,
                    option.label,
                    format!("[{} pts]", option.points).dimmed()
                );
            }
        }
    }

    pub fn show_chat_message(&self, message: &ChatMessage) {
        let time = message.sent_at.format("%H:%M").to_string();
        match message.role {
            Role::User => println!("{} {} {}", "You".green().bold(), time.dimmed(), message.content),
            Role::Assistant => println!(
                "{} {} {}",
                "Assistant".cyan().bold(),
                time.dimmed(),
                message.content
            ),
        }
    }

    pub fn show_help(&self, entries: &[(&str, &str)]) {
        println!("\n{}", "Available Commands:".bold().cyan());
        println!("{}", "=".repeat(WIDTH).cyan());
        for (cmd, desc) in entries {
            println!("  {:<22} {}", cmd.green(), desc);
        }
        println!();
    }

    /// Display error message
    pub fn show_error(&self, error: &str) {
        println!("{} {}", "Error:".red().bold(), error.red());
    }

    /// Display warning message
    pub fn show_warning(&self, warning: &str) {
        println!("{} {}", "Warning:".yellow().bold(), warning.yellow());
    }

    /// Display info message
    pub fn show_info(&self, info: &str) {
        println!("{} {}", "Info:".cyan(), info);
    }

    /// Show section header
    pub fn show_section(&self, title: &str) {
        println!("\n{}", title.bold().cyan());
        println!("{}", "-".repeat(WIDTH).cyan());
    }

    /// Clear screen
    pub fn clear_screen(&self) {
        print!("\x1B[2J\x1B[1;1H");
    }
}

impl Drop for DisplayManager {
    fn drop(&mut self) {
        self.finish_current();
    }
}

/// Fixed-width text bar, `[#####-----] 2/5`
pub fn progress_bar(done: usize, total: usize) -> String {
    const SLOTS: usize = 20;
    let filled = if total == 0 {
        0
    } else {
        (done.min(total) * SLOTS) / total
    };
    format!(
        "[{}{}] {}/{}",
        "#".repeat(filled),
        "-".repeat(SLOTS - filled),
        done,
        total
    )
}

pub fn telemetry_line(sample: &TelemetrySample) -> String {
    let status = match sample.link_quality {
        LinkQuality::Stable => sample.link_quality.to_string().green(),
        LinkQuality::Unstable => sample.link_quality.to_string().yellow(),
    };
    format!(
        "{} {}  {} {} Mbps  {} {} Mbps",
        "Network:".dimmed(),
        status,
        "↓".dimmed(),
        sample.download_rate,
        "↑".dimmed(),
        sample.upload_rate
    )
}

fn level_colored(level: SecurityLevel) -> ColoredString {
    let label = level.label().bold();
    match level {
        SecurityLevel::Excellent | SecurityLevel::Good => label.green(),
        SecurityLevel::Fair => label.yellow(),
        SecurityLevel::Poor | SecurityLevel::Critical => label.red(),
    }
}
