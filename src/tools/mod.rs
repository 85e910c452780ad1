//! Tools the review agent can call.
//!
//! Each tool has a typed input (deserialized from the model's JSON arguments
//! and described to the model through its JSON schema) and a serializable
//! output. [`ToolRegistry`] erases the types so the agent can dispatch by name.

pub mod changes;
pub mod commit;
pub mod review;

use async_trait::async_trait;
use schemars::{JsonSchema, schema_for};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{ToolError, ValidationError};

pub use changes::{FileChangesInput, GetFileChanges};
pub use commit::{CommitMessageInput, GenerateCommitMessage};
pub use review::{WriteReviewInput, WriteReviewToMarkdown};

/// A callable tool.
#[async_trait]
pub trait Tool: Send + Sync {
    const NAME: &'static str;
    const DESCRIPTION: &'static str;

    type Input: DeserializeOwned + JsonSchema + Send;
    type Output: Serialize + Send;

    /// Check constraints the schema alone cannot enforce.
    fn validate(&self, _input: &Self::Input) -> Result<(), ValidationError> {
        Ok(())
    }

    async fn call(&self, input: Self::Input) -> Result<Self::Output, ToolError>;

    fn input_schema() -> Value
    where
        Self: Sized,
    {
        schema_for!(Self::Input).as_value().to_owned()
    }
}

/// Name, description and input schema, as shown to the model.
#[derive(Debug, Clone, Serialize)]
pub struct ToolDefinition {
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: Value,
}

#[async_trait]
trait DynTool: Send + Sync {
    fn name(&self) -> &'static str;
    fn definition(&self) -> ToolDefinition;
    async fn invoke(&self, args: Value) -> Result<Value, ToolError>;
}

#[async_trait]
impl<T: Tool> DynTool for T {
    fn name(&self) -> &'static str {
        T::NAME
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: T::NAME,
            description: T::DESCRIPTION,
            input_schema: T::input_schema(),
        }
    }

    async fn invoke(&self, args: Value) -> Result<Value, ToolError> {
        let input: T::Input = parse_input(T::NAME, args)?;
        self.validate(&input)?;
        let output = Tool::call(self, input).await?;
        serde_json::to_value(output).map_err(ToolError::Output)
    }
}

/// Deserialize tool arguments, reporting the JSON path of the offending field.
fn parse_input<I: DeserializeOwned>(tool: &str, args: Value) -> Result<I, ValidationError> {
    // Models sometimes send `null` instead of `{}` for all-default inputs.
    let args = if args.is_null() {
        Value::Object(Default::default())
    } else {
        args
    };

    serde_path_to_error::deserialize(args).map_err(|e| {
        let path = e.path().to_string();
        let message = e.into_inner().to_string();
        warn!("Invalid arguments for {} at '{}': {}", tool, path, message);
        ValidationError::InvalidInput {
            tool: tool.to_string(),
            path,
            message,
        }
    })
}

/// Tools available to a session, in registration order.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Box<dyn DynTool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The three review tools.
    pub fn with_defaults() -> Self {
        Self::new()
            .register(GetFileChanges)
            .register(GenerateCommitMessage)
            .register(WriteReviewToMarkdown)
    }

    pub fn register<T: Tool + 'static>(mut self, tool: T) -> Self {
        self.tools.push(Box::new(tool));
        self
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.definition()).collect()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    /// Run the named tool with JSON arguments and return its JSON output.
    pub async fn invoke(&self, name: &str, args: Value) -> Result<Value, ToolError> {
        let tool = self
            .tools
            .iter()
            .find(|t| t.name() == name)
            .ok_or_else(|| ValidationError::UnknownTool(name.to_string()))?;

        debug!("Invoking tool {} with {}", name, args);
        tool.invoke(args).await
    }
}
