//! Input parsing for the assessment and chat REPLs
//!
//! Slash commands drive the step driver; a bare number picks an option of
//! the current question. Anything else is free text (a chat message, or a
//! hint in the assessment).

/// REPL command types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Start,
    /// 1-based option number for the current question
    Select(usize),
    Next,
    Back,
    Goto { question_id: String },
    Status,
    Telemetry,
    Reset,
    Clear,
    Exit,
    Text { input: String },
    Unknown { input: String },
}

/// Check whether input is a slash command
pub fn is_command(input: &str) -> bool {
    input.trim_start().starts_with('/')
}

/// Parse input string into a command
pub fn parse(input: &str) -> Command {
    let trimmed = input.trim();

    if !trimmed.starts_with('/') {
        return match trimmed.parse::<usize>() {
            Ok(n) if n > 0 => Command::Select(n),
            _ => Command::Text {
                input: trimmed.to_string(),
            },
        };
    }

    let parts: Vec<&str> = trimmed[1..].split_whitespace().collect();
    if parts.is_empty() {
        return Command::Unknown {
            input: input.to_string(),
        };
    }

    match parts[0].to_lowercase().as_str() {
        "help" | "h" => Command::Help,
        "start" | "begin" => Command::Start,
        "next" | "proceed" | "n" => Command::Next,
        "back" | "b" => Command::Back,
        "goto" | "go" => match parts.get(1) {
            Some(id) => Command::Goto {
                question_id: id.to_string(),
            },
            None => Command::Unknown {
                input: input.to_string(),
            },
        },
        "status" => Command::Status,
        "telemetry" | "net" => Command::Telemetry,
        "reset" | "restart" => Command::Reset,
        "clear" | "cls" => Command::Clear,
        "exit" | "quit" | "q" => Command::Exit,
        _ => Command::Unknown {
            input: input.to_string(),
        },
    }
}

/// Help lines for the assessment REPL
pub const ASSESSMENT_HELP: &[(&str, &str)] = &[
    ("/start", "Begin the assessment"),
    ("<number>", "Choose an option for the current question"),
    ("/next", "Analyze answers once every question is answered"),
    ("/back", "Undo the most recent answer"),
    ("/goto <id>", "Jump to a question by id"),
    ("/status", "Show progress and current phase"),
    ("/telemetry", "Show simulated network status"),
    ("/reset", "Start over from the results screen"),
    ("/help, /h", "Show this help message"),
    ("/exit, /quit, /q", "Exit"),
];

/// Help lines for the chat REPL
pub const CHAT_HELP: &[(&str, &str)] = &[
    ("<text>", "Ask the security assistant"),
    ("/clear, /cls", "Clear the conversation"),
    ("/help, /h", "Show this help message"),
    ("/exit, /quit, /q", "Exit"),
];
