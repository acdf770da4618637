//! Integration tests for the security assistant chat

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use secbuddy::chat::session::{ERROR_REPLY_MESSAGE, WELCOME_MESSAGE};
use secbuddy::chat::{ChatConfig, ChatSession, GeminiClient, Role, TextCompletionService};
use secbuddy::Result;

/// Records prompts and answers from a script
struct Scripted {
    replies: Mutex<Vec<&'static str>>,
    prompts: Mutex<Vec<String>>,
}

impl Scripted {
    fn new(replies: &[&'static str]) -> Self {
        let mut replies = replies.to_vec();
        replies.reverse();
        Self {
            replies: Mutex::new(replies),
            prompts: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl TextCompletionService for Scripted {
    async fn complete(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(self.replies.lock().unwrap().pop().unwrap_or_default().to_string())
    }
}

#[tokio::test]
async fn test_conversation_keeps_order() {
    let mut chat = ChatSession::new(Scripted::new(&["Use WPA3.", "Enable automatic updates."]));

    chat.send("Which WiFi security should I use?").await.unwrap();
    chat.send("How do I keep my router safe?").await.unwrap();

    let roles: Vec<Role> = chat.messages().iter().map(|m| m.role).collect();
    assert_eq!(
        roles,
        vec![Role::Assistant, Role::User, Role::Assistant, Role::User, Role::Assistant]
    );
    assert_eq!(chat.messages()[0].content, WELCOME_MESSAGE);
    assert_eq!(chat.messages()[2].content, "Use WPA3.");
    assert_eq!(chat.messages()[4].content, "Enable automatic updates.");

    // Each request carries only the latest user message
    let prompts = chat.service().prompts.lock().unwrap();
    assert_eq!(prompts.len(), 2);
    assert!(prompts[1].contains("How do I keep my router safe?"));
    assert!(!prompts[1].contains("Which WiFi security"));
}

#[tokio::test]
async fn test_missing_api_key_becomes_error_reply() {
    let client = GeminiClient::new(ChatConfig {
        endpoint: "http://127.0.0.1:9".to_string(),
        api_key: None,
        timeout: Duration::from_secs(1),
        ..ChatConfig::default()
    })
    .unwrap();

    let mut chat = ChatSession::new(client);
    let reply = chat.send("hello").await.unwrap().unwrap();
    assert_eq!(reply.role, Role::Assistant);
    assert_eq!(reply.content, ERROR_REPLY_MESSAGE);
}

#[tokio::test]
async fn test_unreachable_endpoint_becomes_error_reply() {
    let client = GeminiClient::new(ChatConfig {
        endpoint: "http://127.0.0.1:9".to_string(),
        api_key: Some("test-key".to_string()),
        timeout: Duration::from_secs(2),
        ..ChatConfig::default()
    })
    .unwrap();

    let mut chat = ChatSession::new(client);
    let reply = chat.send("hello").await.unwrap().unwrap();
    assert_eq!(reply.content, ERROR_REPLY_MESSAGE);
    assert_eq!(chat.messages().len(), 3);
}

#[test]
fn test_blank_input_sends_nothing() {
    let mut chat = ChatSession::new(Scripted::new(&["unused"]));
    let sent = tokio_test::block_on(chat.send("   \n"));
    let sent = tokio_test::assert_ok!(sent);
    assert!(sent.is_none());
    assert_eq!(chat.messages().len(), 1);
    assert!(chat.service().prompts.lock().unwrap().is_empty());
}
