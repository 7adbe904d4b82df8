//! Forwarding of prompts to the upstream chat-completion API.
//!
//! Only reachable behind the auth gate.

pub mod completion;
pub mod handlers;

pub use completion::{
    ChatMessage, ChatRequest, ChatResponse, Choice, CompletionClient, OpenAiClient,
    UnconfiguredCompletions,
};
