//! LLM providers, routing and reply parsing.

pub mod claude;
pub mod codex;
pub mod json;
mod process;
pub mod retry;
pub mod router;

pub use json::extract_json;
pub use router::{
    LlmError, LlmProviderError, LlmRouter, ModelClient, Provider, ProviderSelection,
    check_provider_installed,
};
