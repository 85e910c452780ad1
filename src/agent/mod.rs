//! The review agent: prompts and the tool-calling session.

pub mod prompt;
pub mod session;

pub use prompt::{DEFAULT_REVIEW_PROMPT, SYSTEM_PROMPT, TranscriptEntry, render_prompt};
pub use session::{AgentSession, DEFAULT_MAX_STEPS, SessionOutcome};
