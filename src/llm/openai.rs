//! OpenAI LLM client implementation.
//!
//! Implements the LlmClient trait for OpenAI-compatible chat completions
//! with function calling. Failures are reported once; nothing is retried.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::config::LlmConfig;
use crate::error::{InsightsError, Result};
use crate::llm::tools::ToolDefinition;
use crate::llm::types::{LlmResponse, Message, ToolCall};
use crate::llm::LlmClient;

/// Default timeout for API requests.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// OpenAI API base URL.
const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";

/// OpenAI client configuration.
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// API key for authentication.
    pub api_key: String,
    /// Model to use (e.g., "gpt-4", "gpt-4o-mini").
    pub model: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Chat completions endpoint.
    pub api_url: String,
}

impl OpenAiConfig {
    /// Creates a new config with the given API key and model.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            api_url: OPENAI_API_URL.to_string(),
        }
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Points the client at another OpenAI-compatible endpoint.
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }
}

/// OpenAI LLM client.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    config: OpenAiConfig,
    client: Client,
}

impl OpenAiClient {
    /// Creates a new OpenAI client with the given configuration.
    pub fn new(config: OpenAiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| InsightsError::llm(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    /// Creates a client from the LLM config section.
    ///
    /// Reads `OPENAI_API_KEY` from the environment; the model comes from the
    /// config, which already reflects `OPENAI_MODEL`.
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .ok()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| InsightsError::llm("OPENAI_API_KEY environment variable not set"))?;

        Self::new(OpenAiConfig::new(api_key, &config.model).with_timeout(config.timeout_secs))
    }

    /// Converts internal messages to OpenAI API format.
    fn convert_messages(messages: &[Message]) -> Vec<OpenAiMessage> {
        messages
            .iter()
            .map(|m| OpenAiMessage {
                role: m.role.as_str().to_string(),
                content: if m.content.is_empty() && !m.tool_calls.is_empty() {
                    None
                } else {
                    Some(m.content.clone())
                },
                tool_calls: m
                    .tool_calls
                    .iter()
                    .map(|call| OpenAiToolCall {
                        id: call.id.clone(),
                        kind: "function".to_string(),
                        function: OpenAiFunctionCall {
                            name: call.name.clone(),
                            arguments: call.arguments.clone(),
                        },
                    })
                    .collect(),
                tool_call_id: m.tool_call_id.clone(),
            })
            .collect()
    }

    /// Converts tool definitions to OpenAI API format.
    fn convert_tools(tools: &[ToolDefinition]) -> Vec<OpenAiTool> {
        tools
            .iter()
            .map(|tool| OpenAiTool {
                kind: "function".to_string(),
                function: OpenAiFunction {
                    name: tool.name.clone(),
                    description: tool.description.clone(),
                    parameters: tool.parameters.clone(),
                },
            })
            .collect()
    }

    /// Builds a request body.
    fn build_request(&self, messages: &[Message], tools: &[ToolDefinition]) -> OpenAiRequest {
        OpenAiRequest {
            model: self.config.model.clone(),
            messages: Self::convert_messages(messages),
            tools: Self::convert_tools(tools),
            tool_choice: (!tools.is_empty()).then(|| "auto".to_string()),
        }
    }

    /// Parses a successful response body.
    fn parse_response(body: &str) -> Result<LlmResponse> {
        let response: OpenAiResponse = serde_json::from_str(body)
            .map_err(|e| InsightsError::llm(format!("Failed to parse response: {}", e)))?;

        let message = response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message)
            .ok_or_else(|| InsightsError::llm("No response from OpenAI"))?;

        let tool_calls = message
            .tool_calls
            .into_iter()
            .map(|call| ToolCall::new(call.id, call.function.name, call.function.arguments))
            .collect();

        Ok(LlmResponse::with_tool_calls(
            message.content.unwrap_or_default(),
            tool_calls,
        ))
    }

    /// Parses an API error response.
    fn parse_error(status: reqwest::StatusCode, body: &str) -> InsightsError {
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return InsightsError::llm("Authentication failed. Check your OPENAI_API_KEY.");
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return InsightsError::llm("Rate limited. Please wait and try again.");
        }

        if let Ok(error_response) = serde_json::from_str::<OpenAiErrorResponse>(body) {
            return InsightsError::llm(format!(
                "OpenAI API error: {}",
                error_response.error.message
            ));
        }

        InsightsError::llm(format!("OpenAI API error ({}): {}", status, body))
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn complete_with_tools(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
    ) -> Result<LlmResponse> {
        let request = self.build_request(messages, tools);
        debug!(
            model = %self.config.model,
            messages = messages.len(),
            tools = tools.len(),
            "OpenAI API request"
        );

        let response = self
            .client
            .post(&self.config.api_url)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    InsightsError::llm("Request timed out. Try again.")
                } else if e.is_connect() {
                    InsightsError::llm("Failed to connect to OpenAI API. Check your network.")
                } else {
                    InsightsError::llm(format!("Request failed: {}", e))
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| InsightsError::llm(format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            return Err(Self::parse_error(status, &body));
        }

        Self::parse_response(&body)
    }
}

// OpenAI API types

#[derive(Debug, Serialize)]
struct OpenAiRequest {
    model: String,
    messages: Vec<OpenAiMessage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<OpenAiTool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAiMessage {
    role: String,
    content: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    tool_calls: Vec<OpenAiToolCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAiToolCall {
    id: String,
    #[serde(rename = "type")]
    kind: String,
    function: OpenAiFunctionCall,
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAiFunctionCall {
    name: String,
    arguments: String,
}

#[derive(Debug, Serialize)]
struct OpenAiTool {
    #[serde(rename = "type")]
    kind: String,
    function: OpenAiFunction,
}

#[derive(Debug, Serialize)]
struct OpenAiFunction {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorResponse {
    error: OpenAiError,
}

#[derive(Debug, Deserialize)]
struct OpenAiError {
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::tools::get_tool_definitions;
    use crate::llm::types::ToolResult;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_config_new() {
        let config = OpenAiConfig::new("sk-test", "gpt-4");
        assert_eq!(config.api_key, "sk-test");
        assert_eq!(config.model, "gpt-4");
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert_eq!(config.api_url, OPENAI_API_URL);
    }

    #[test]
    fn test_config_with_timeout() {
        let config = OpenAiConfig::new("sk-test", "gpt-4").with_timeout(60);
        assert_eq!(config.timeout_secs, 60);
    }

    #[test]
    fn test_request_serialization_with_tools() {
        let client = OpenAiClient::new(OpenAiConfig::new("sk-test", "gpt-4")).unwrap();
        let call = ToolCall::new("call_1", "query_database", r#"{"query":"SELECT 1"}"#);
        let messages = vec![
            Message::system("You are helpful."),
            Message::user("How many sales?"),
            Message::assistant_tool_calls("", vec![call]),
            Message::tool(ToolResult {
                tool_call_id: "call_1".to_string(),
                content: r#"{"success":true}"#.to_string(),
            }),
        ];

        let request = client.build_request(&messages, &get_tool_definitions());
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["tool_choice"], "auto");
        assert_eq!(json["tools"][0]["type"], "function");
        assert_eq!(json["tools"][0]["function"]["name"], "query_database");
        assert_eq!(json["messages"][2]["role"], "assistant");
        assert!(json["messages"][2]["content"].is_null());
        assert_eq!(json["messages"][2]["tool_calls"][0]["id"], "call_1");
        assert_eq!(
            json["messages"][2]["tool_calls"][0]["function"]["arguments"],
            r#"{"query":"SELECT 1"}"#
        );
        assert_eq!(json["messages"][3]["role"], "tool");
        assert_eq!(json["messages"][3]["tool_call_id"], "call_1");
    }

    #[test]
    fn test_request_without_tools_omits_tool_fields() {
        let client = OpenAiClient::new(OpenAiConfig::new("sk-test", "gpt-4")).unwrap();
        let request = client.build_request(&[Message::user("Hi")], &[]);
        let json = serde_json::to_value(&request).unwrap();

        assert!(json.get("tools").is_none());
        assert!(json.get("tool_choice").is_none());
        assert!(json["messages"][0].get("tool_calls").is_none());
    }

    #[test]
    fn test_parse_response_with_tool_calls() {
        let body = r#"{
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_abc",
                        "type": "function",
                        "function": {"name": "query_database", "arguments": "{\"query\":\"SELECT 1\"}"}
                    }]
                }
            }]
        }"#;

        let response = OpenAiClient::parse_response(body).unwrap();
        assert_eq!(response.content, "");
        assert_eq!(
            response.tool_calls,
            vec![ToolCall::new("call_abc", "query_database", r#"{"query":"SELECT 1"}"#)]
        );
    }

    #[test]
    fn test_parse_response_text() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"Laptop Pro leads."}}]}"#;
        let response = OpenAiClient::parse_response(body).unwrap();
        assert_eq!(response, LlmResponse::text("Laptop Pro leads."));
    }

    #[test]
    fn test_parse_response_without_choices() {
        let err = OpenAiClient::parse_response(r#"{"choices":[]}"#).unwrap_err();
        assert!(err.to_string().contains("No response"));
    }

    #[test]
    fn test_parse_error_unauthorized() {
        let error = OpenAiClient::parse_error(reqwest::StatusCode::UNAUTHORIZED, "");
        assert!(error.to_string().contains("Authentication failed"));
    }

    #[test]
    fn test_parse_error_rate_limited() {
        let error = OpenAiClient::parse_error(reqwest::StatusCode::TOO_MANY_REQUESTS, "");
        assert!(error.to_string().contains("Rate limited"));
    }

    #[test]
    fn test_parse_error_with_message() {
        let body = r#"{"error":{"message":"Invalid API key"}}"#;
        let error = OpenAiClient::parse_error(reqwest::StatusCode::BAD_REQUEST, body);
        assert!(error.to_string().contains("Invalid API key"));
    }
}
