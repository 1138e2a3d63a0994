//! LLM integration for Data Insights.
//!
//! Provides the client trait, an OpenAI-compatible implementation, a mock,
//! the `query_database` tool and the agent loop that ties them together.

pub mod agent;
pub mod mock;
pub mod openai;
pub mod prompt;
pub mod tools;
pub mod types;

pub use agent::{AgentReply, DataAgent, MAX_TOOL_ROUNDS};
pub use mock::MockLlmClient;
pub use openai::{OpenAiClient, OpenAiConfig};
pub use prompt::{build_messages, build_system_prompt};
pub use tools::{dispatch_tool_call, get_tool_definitions, QueryDatabaseInput, ToolDefinition};
pub use types::{Conversation, LlmResponse, Message, Role, ToolCall, ToolResult};

use async_trait::async_trait;
use std::str::FromStr;

use crate::config::LlmConfig;
use crate::error::{InsightsError, Result};

/// Trait for LLM clients that support function calling.
///
/// Implementations must be thread-safe (Send + Sync) to support async operations.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Generates a completion, offering the given tools.
    ///
    /// An empty tool list asks for a plain text answer.
    async fn complete_with_tools(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
    ) -> Result<LlmResponse>;

    /// Generates a plain text completion.
    async fn complete(&self, messages: &[Message]) -> Result<String> {
        Ok(self.complete_with_tools(messages, &[]).await?.content)
    }
}

/// LLM provider type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LlmProvider {
    /// OpenAI or any OpenAI-compatible endpoint
    #[default]
    OpenAi,
    /// Mock client for testing (no API key required)
    Mock,
}

impl LlmProvider {
    /// Returns the provider as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Mock => "mock",
        }
    }
}

impl FromStr for LlmProvider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "mock" => Ok(Self::Mock),
            _ => Err(format!("Unknown LLM provider: {}", s)),
        }
    }
}

impl std::fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Creates the client named by the config's provider.
pub fn create_client(config: &LlmConfig) -> Result<Box<dyn LlmClient>> {
    let provider: LlmProvider = config.provider.parse().map_err(InsightsError::config)?;
    tracing::debug!(provider = %provider, model = %config.model, "Creating LLM client");

    match provider {
        LlmProvider::OpenAi => Ok(Box::new(OpenAiClient::from_config(config)?)),
        LlmProvider::Mock => Ok(Box::new(MockLlmClient::new())),
    }
}
