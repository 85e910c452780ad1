//! The bounded tool-calling loop.

use serde::Deserialize;
use serde_json::{Value, json};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

use crate::agent::prompt::{SYSTEM_PROMPT, TranscriptEntry, render_prompt};
use crate::error::AgentError;
use crate::llm::{ModelClient, extract_json};
use crate::tools::ToolRegistry;

pub const DEFAULT_MAX_STEPS: usize = 10;

/// How a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    /// The model gave a final answer.
    Finished { steps: usize },
    /// The step budget ran out first.
    StepLimitReached { steps: usize },
}

/// A parsed model reply.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
enum ModelReply {
    ToolCall {
        tool: String,
        #[serde(default)]
        input: Value,
        #[serde(default)]
        message: Option<String>,
    },
    Final {
        #[serde(rename = "final")]
        text: String,
    },
}

/// Interpret a raw reply. Anything that is not one of the two JSON shapes is
/// taken as final answer text.
fn parse_reply(raw: &str) -> ModelReply {
    if let Some(json) = extract_json(raw)
        && let Ok(reply) = serde_json::from_str::<ModelReply>(&json)
    {
        return reply;
    }

    debug!("Reply is not a tool call, treating it as the final answer");
    ModelReply::Final {
        text: raw.trim().to_string(),
    }
}

pub struct AgentSession<M> {
    model: M,
    registry: ToolRegistry,
    max_steps: usize,
}

impl<M: ModelClient> AgentSession<M> {
    pub fn new(model: M, registry: ToolRegistry, max_steps: usize) -> Self {
        Self {
            model,
            registry,
            max_steps: max_steps.max(1),
        }
    }

    pub fn max_steps(&self) -> usize {
        self.max_steps
    }

    /// Drive the model until it answers or the step budget is spent,
    /// streaming user-facing text to `output`.
    ///
    /// Tool failures are fed back to the model as `{"error": ...}` and never
    /// end the session. A failing model call does.
    pub async fn run(
        &mut self,
        request: &str,
        output: &UnboundedSender<String>,
    ) -> Result<SessionOutcome, AgentError> {
        let definitions = self.registry.definitions();
        let mut transcript: Vec<TranscriptEntry> = Vec::new();

        for step in 1..=self.max_steps {
            let prompt = render_prompt(SYSTEM_PROMPT, &definitions, request, &transcript);
            debug!("Step {}/{}: prompt is {} bytes", step, self.max_steps, prompt.len());

            let raw = self.model.complete(&prompt).await?;

            match parse_reply(&raw) {
                ModelReply::Final { text } => {
                    info!("Session finished after {} step(s)", step);
                    emit(output, with_newline(text))?;
                    return Ok(SessionOutcome::Finished { steps: step });
                }
                ModelReply::ToolCall {
                    tool,
                    input,
                    message,
                } => {
                    if let Some(message) = message.filter(|m| !m.trim().is_empty()) {
                        emit(output, with_newline(message))?;
                    }

                    info!("Step {}: calling {}", step, tool);
                    let result = match self.registry.invoke(&tool, input.clone()).await {
                        Ok(value) => value,
                        Err(e) => {
                            warn!("Tool {} failed: {}", tool, e);
                            emit(output, format!("[{} failed: {}]\n", tool, e))?;
                            json!({ "error": e.to_string() })
                        }
                    };

                    transcript.push(TranscriptEntry {
                        tool,
                        input,
                        result,
                    });
                }
            }
        }

        warn!("Step limit of {} reached", self.max_steps);
        emit(
            output,
            format!(
                "\n[Stopped after {} steps without a final answer]\n",
                self.max_steps
            ),
        )?;
        Ok(SessionOutcome::StepLimitReached {
            steps: self.max_steps,
        })
    }
}

fn emit(output: &UnboundedSender<String>, chunk: String) -> Result<(), AgentError> {
    output.send(chunk).map_err(|_| AgentError::OutputClosed)
}

fn with_newline(mut text: String) -> String {
    if !text.ends_with('\n') {
        text.push('\n');
    }
    text
}
