//! OpenAI-compatible chat backend for copyloop.
//!
//! Provides a [`ChatGenerator`] for drafting and revising text and a
//! [`ChatJudge`] backend for the judged evaluators, both over one
//! [`ChatClient`] with bounded retry on transient failures.

pub mod client;
pub mod config;
pub mod error;
pub mod generator;
pub mod retry;

pub use client::{ChatClient, ChatJudge, ChatMessage, Role};
pub use config::{LlmConfig, ModelSettings};
pub use error::LlmError;
pub use generator::{generation_prompt, ChatGenerator};
pub use retry::{with_retry, RetryPolicy};
