//! Mock LLM client for testing.
//!
//! Provides deterministic responses based on input patterns. A question that
//! matches a pattern becomes a `query_database` tool call; once a tool result
//! is in the conversation the mock summarizes it in plain text.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::Result;
use crate::llm::tools::{ToolDefinition, QUERY_DATABASE};
use crate::llm::types::{LlmResponse, Message, Role, ToolCall};
use crate::llm::LlmClient;

/// Reply used when no pattern matches.
const FALLBACK_REPLY: &str = "I don't understand that question. Could you please rephrase it?";

/// Mock LLM client that returns canned responses based on input patterns.
#[derive(Debug, Default)]
pub struct MockLlmClient {
    /// Custom mappings (pattern -> SQL to request).
    custom_queries: Vec<(String, String)>,
    /// Requests served so far, used for tool call ids.
    requests: AtomicUsize,
}

impl MockLlmClient {
    /// Creates a new mock client with default patterns.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a custom mapping.
    ///
    /// When the user input contains `pattern`, the mock requests `sql`.
    pub fn with_query(mut self, pattern: impl Into<String>, sql: impl Into<String>) -> Self {
        self.custom_queries.push((pattern.into(), sql.into()));
        self
    }

    /// Number of completion requests served.
    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    /// Picks the SQL to request for a question, if any.
    fn query_for(&self, input: &str) -> Option<String> {
        let input_lower = input.to_lowercase();

        for (pattern, sql) in &self.custom_queries {
            if input_lower.contains(&pattern.to_lowercase()) {
                return Some(sql.clone());
            }
        }

        if input_lower.contains("product")
            && (input_lower.contains("revenue") || input_lower.contains("sales by"))
        {
            return Some(
                "SELECT product, SUM(total_amount) AS revenue FROM sales GROUP BY product ORDER BY revenue DESC"
                    .to_string(),
            );
        }

        if input_lower.contains("region") {
            return Some(
                "SELECT region, SUM(total_amount) AS revenue FROM sales GROUP BY region ORDER BY revenue DESC"
                    .to_string(),
            );
        }

        if input_lower.contains("top customers") {
            return Some(
                "SELECT name, total_spent FROM customers ORDER BY total_spent DESC LIMIT 5"
                    .to_string(),
            );
        }

        if input_lower.contains("how many") && input_lower.contains("sales") {
            return Some("SELECT COUNT(*) AS sales FROM sales".to_string());
        }

        if input_lower.contains("delete") {
            return Some("DELETE FROM sales".to_string());
        }

        None
    }

    /// Summarizes a query_database result.
    fn summarize(content: &str) -> String {
        let Ok(body) = serde_json::from_str::<serde_json::Value>(content) else {
            return "The tool returned an unreadable result.".to_string();
        };

        if body["success"].as_bool() != Some(true) {
            let error = body["error"].as_str().unwrap_or("unknown error");
            return format!("I could not run that query: {error}");
        }

        let row_count = body["row_count"].as_u64().unwrap_or(0);
        let total_rows = body["total_rows"].as_u64().unwrap_or(row_count);
        let mut summary = if row_count == total_rows {
            format!("The query returned {row_count} rows.")
        } else {
            format!("The query returned {total_rows} rows; showing the first {row_count}.")
        };

        if let Some(first) = body["data"].get(0).and_then(|row| row.as_object()) {
            let fields = first
                .iter()
                .map(|(k, v)| format!("{k} = {v}"))
                .collect::<Vec<_>>()
                .join(", ");
            summary.push_str(&format!(" First row: {fields}."));
        }
        summary
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete_with_tools(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
    ) -> Result<LlmResponse> {
        let request = self.requests.fetch_add(1, Ordering::SeqCst) + 1;

        let Some(last) = messages.last() else {
            return Ok(LlmResponse::text(FALLBACK_REPLY));
        };

        if last.role == Role::Tool {
            return Ok(LlmResponse::text(Self::summarize(&last.content)));
        }

        let can_call = tools.iter().any(|t| t.name == QUERY_DATABASE);
        match self.query_for(&last.content) {
            Some(sql) if can_call && last.role == Role::User => {
                let arguments = serde_json::json!({ "query": sql }).to_string();
                Ok(LlmResponse::with_tool_calls(
                    "",
                    vec![ToolCall::new(
                        format!("call_{request}"),
                        QUERY_DATABASE,
                        arguments,
                    )],
                ))
            }
            _ => Ok(LlmResponse::text(FALLBACK_REPLY)),
        }
    }
}
