//! Completion service implementations for Fireside.
//!
//! The only backend shipped today is the OpenAI-compatible chat-completions
//! API, which also covers OpenRouter, Ollama, vLLM, and anything else that
//! exposes `/v1/chat/completions`.

pub mod openai;

pub use openai::OpenAiChatService;
