//! Security assistant chat
//!
//! Completion service interface and the chat panel state built on it.

pub mod client;
pub mod session;

pub use client::{ChatConfig, GeminiClient, TextCompletionService};
pub use session::{ChatMessage, ChatSession, Role};
