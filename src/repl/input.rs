//! Input handler for REPL using rustyline
//!
//! Provides readline functionality with optional persistent history.

use anyhow::Result;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::path::PathBuf;

/// What the user did at the prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    Line(String),
    /// Ctrl-C
    Interrupted,
    /// Ctrl-D
    Eof,
}

/// Input handler managing readline interface and command history
pub struct InputHandler {
    editor: DefaultEditor,
    history_path: Option<PathBuf>,
    prompt: String,
}

impl InputHandler {
    pub fn new(prompt: &str) -> Result<Self> {
        Ok(InputHandler {
            editor: DefaultEditor::new()?,
            history_path: None,
            prompt: prompt.to_string(),
        })
    }

    /// Create input handler with persistent history
    pub fn with_history(prompt: &str, history_file: PathBuf) -> Result<Self> {
        let mut editor = DefaultEditor::new()?;

        if history_file.exists() {
            let _ = editor.load_history(&history_file);
        }

        Ok(InputHandler {
            editor,
            history_path: Some(history_file),
            prompt: prompt.to_string(),
        })
    }

    pub fn set_prompt(&mut self, prompt: &str) {
        self.prompt = prompt.to_string();
    }

    /// Read a line of input from user
    pub fn read_line(&mut self) -> Result<InputEvent> {
        match self.editor.readline(&self.prompt) {
            Ok(line) => {
                let trimmed = line.trim();
                if !trimmed.is_empty() {
                    let _ = self.editor.add_history_entry(trimmed);
                }
                Ok(InputEvent::Line(trimmed.to_string()))
            }
            Err(ReadlineError::Interrupted) => Ok(InputEvent::Interrupted),
            Err(ReadlineError::Eof) => Ok(InputEvent::Eof),
            Err(err) => Err(anyhow::anyhow!("Readline error: {}", err)),
        }
    }

    /// Save history to disk
    pub fn save_history(&mut self) -> Result<()> {
        if let Some(ref path) = self.history_path {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            self.editor.save_history(path)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustyline::history::History;
    use tempfile::TempDir;

    #[test]
    fn test_custom_prompt() {
        let mut handler = InputHandler::new("assess> ").unwrap();
        assert_eq!(handler.prompt, "assess> ");
        handler.set_prompt("chat> ");
        assert_eq!(handler.prompt, "chat> ");
        assert!(handler.history_path.is_none());
    }

    #[test]
    fn test_history_persistence() {
        let temp_dir = TempDir::new().unwrap();
        let history_path = temp_dir.path().join("nested").join("history");

        {
            let mut handler = InputHandler::with_history("> ", history_path.clone()).unwrap();
            let _ = handler.editor.add_history_entry("is WPA2 safe?");
            let _ = handler.editor.add_history_entry("what about WPS?");
            handler.save_history().unwrap();
        }

        assert!(history_path.exists());

        let handler = InputHandler::with_history("> ", history_path).unwrap();
        assert_eq!(handler.editor.history().len(), 2);
    }
}
