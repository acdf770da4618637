//! Security assistant chat session
//!
//! Keeps the visible message history and turns user input into a single
//! completion request. Service failures become an assistant message rather
//! than an error so the conversation can continue.

use crate::chat::client::TextCompletionService;
use crate::errors::Result;
use chrono::{DateTime, Utc};
use log::warn;
use serde::{Deserialize, Serialize};

pub const WELCOME_MESSAGE: &str = "Hello! I'm your Security Assistant. How can I help you with cybersecurity questions, privacy concerns, or general security best practices today?";

pub const CLEARED_MESSAGE: &str = "Chat cleared. How else can I help with your security questions?";

pub const EMPTY_REPLY_MESSAGE: &str = "I'm sorry, I couldn't generate a response. Please try again.";

pub const ERROR_REPLY_MESSAGE: &str = "Sorry, there was an error processing your request. Please check your API key and try again.";

/// Who sent a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    pub sent_at: DateTime<Utc>,
}

impl ChatMessage {
    pub fn user(content: &str) -> Self {
        Self {
            role: Role::User,
            content: content.to_string(),
            sent_at: Utc::now(),
        }
    }

    pub fn assistant(content: &str) -> Self {
        Self {
            role: Role::Assistant,
            content: content.to_string(),
            sent_at: Utc::now(),
        }
    }
}

/// Wrap user text in the assistant persona instructions
pub fn build_prompt(user_message: &str) -> String {
    format!(
        "You are a Security Assistant chatbot. Provide helpful, accurate security advice.\n\
         The user's message is: {}\n\
         Keep your response concise and focused on cybersecurity, data protection, privacy, secure practices, and security-related information.\n\
         IMPORTANT: Do not use asterisks or markdown formatting in your responses. Provide plain text responses only.",
        user_message
    )
}

/// Strip markdown emphasis the model was asked not to produce
pub fn clean_reply(text: &str) -> String {
    text.replace('*', "")
}

/// Chat history plus the service that answers it
pub struct ChatSession<S: TextCompletionService> {
    service: S,
    messages: Vec<ChatMessage>,
}

impl<S: TextCompletionService> ChatSession<S> {
    pub fn new(service: S) -> Self {
        Self {
            service,
            messages: vec![ChatMessage::assistant(WELCOME_MESSAGE)],
        }
    }

    /// Send user input and append the assistant's reply
    ///
    /// Blank input is ignored and returns `Ok(None)`.
    pub async fn send(&mut self, input: &str) -> Result<Option<&ChatMessage>> {
        let input = input.trim();
        if input.is_empty() {
            return Ok(None);
        }

        self.messages.push(ChatMessage::user(input));

        let reply = match self.service.complete(&build_prompt(input)).await {
            Ok(text) if text.trim().is_empty() => EMPTY_REPLY_MESSAGE.to_string(),
            Ok(text) => clean_reply(&text),
            Err(e) => {
                warn!("Completion request failed: {}", e);
                ERROR_REPLY_MESSAGE.to_string()
            }
        };

        self.messages.push(ChatMessage::assistant(&reply));
        Ok(self.messages.last())
    }

    /// Drop the history, leaving only a fresh greeting
    pub fn clear(&mut self) {
        self.messages = vec![ChatMessage::assistant(CLEARED_MESSAGE)];
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn service(&self) -> &S {
        &self.service
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AssessError;
    use async_trait::async_trait;

    struct Canned(&'static str);

    #[async_trait]
    impl TextCompletionService for Canned {
        async fn complete(&self, _prompt: &str) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    struct Failing;

    #[async_trait]
    impl TextCompletionService for Failing {
        async fn complete(&self, _prompt: &str) -> Result<String> {
            Err(AssessError::CompletionApiError("HTTP 403".to_string()))
        }
    }

    #[test]
    fn test_prompt_template() {
        let prompt = build_prompt("Is WPA2 safe?");
        assert!(prompt.starts_with("You are a Security Assistant chatbot."));
        assert!(prompt.contains("The user's message is: Is WPA2 safe?"));
        assert!(prompt.contains("Do not use asterisks"));
    }

    #[test]
    fn test_clean_reply() {
        assert_eq!(clean_reply("**Use** a *VPN*"), "Use a VPN");
    }

    #[tokio::test]
    async fn test_send_appends_both_messages() {
        let mut chat = ChatSession::new(Canned("Use **strong** passwords."));
        let reply = chat.send("  tips?  ").await.unwrap().unwrap();
        assert_eq!(reply.role, Role::Assistant);
        assert_eq!(reply.content, "Use strong passwords.");

        let messages = chat.messages();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].content, WELCOME_MESSAGE);
        assert_eq!(messages[1].role, Role::User);
        assert_eq!(messages[1].content, "tips?");
    }

    #[tokio::test]
    async fn test_blank_input_ignored() {
        let mut chat = ChatSession::new(Canned("unused"));
        assert!(chat.send("   ").await.unwrap().is_none());
        assert_eq!(chat.messages().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_reply_and_failure() {
        let mut chat = ChatSession::new(Canned(""));
        let reply = chat.send("hello").await.unwrap().unwrap();
        assert_eq!(reply.content, EMPTY_REPLY_MESSAGE);

        let mut chat = ChatSession::new(Failing);
        let reply = chat.send("hello").await.unwrap().unwrap();
        assert_eq!(reply.content, ERROR_REPLY_MESSAGE);
    }

    #[test]
    fn test_clear() {
        let mut chat = ChatSession::new(Canned("x"));
        chat.clear();
        assert_eq!(chat.messages().len(), 1);
        assert_eq!(chat.messages()[0].content, CLEARED_MESSAGE);
    }
}
