//! LLM tool definitions and dispatch for function calling.
//!
//! The only tool is `query_database`. Its arguments are untrusted model
//! output, so every path through [`dispatch_tool_call`] ends in a JSON string
//! and none of them panic.

use std::time::Instant;

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::db::QueryResult;
use crate::llm::types::{ToolCall, ToolResult};
use crate::query::{ExecutionError, QueryGate};

/// Name of the query tool.
pub const QUERY_DATABASE: &str = "query_database";

/// Tool definition for LLM function calling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

/// Input parameters for the query_database tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryDatabaseInput {
    pub query: String,
}

/// Returns the tool definitions available to the LLM.
pub fn get_tool_definitions() -> Vec<ToolDefinition> {
    vec![ToolDefinition {
        name: QUERY_DATABASE.to_string(),
        description: "Execute a read-only SELECT query on the sales database. Only SELECT \
                      queries are allowed. Returns columns, rows as objects keyed by column \
                      name, and row counts."
            .to_string(),
        parameters: json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "SQL SELECT query to execute. Must be a single SELECT statement."
                }
            },
            "required": ["query"]
        }),
    }]
}

/// Runs a tool call and wraps the JSON output as a [`ToolResult`].
pub async fn dispatch_tool_call(gate: &QueryGate<'_>, call: &ToolCall) -> ToolResult {
    let start = Instant::now();
    tracing::debug!(tool_name = %call.name, tool_call_id = %call.id, "Executing tool");

    let content = match call.name.as_str() {
        QUERY_DATABASE => execute_query_database(gate, &call.arguments).await,
        _ => {
            tracing::warn!(tool_name = %call.name, "Unknown tool requested");
            failure_json(&format!("Unknown tool: {}", call.name), "unknown_tool").to_string()
        }
    };

    tracing::debug!(
        tool_name = %call.name,
        duration_ms = start.elapsed().as_millis() as u64,
        result_len = content.len(),
        "Tool execution complete"
    );

    ToolResult {
        tool_call_id: call.id.clone(),
        content,
    }
}

/// Executes the query_database tool with raw JSON arguments.
pub async fn execute_query_database(gate: &QueryGate<'_>, arguments: &str) -> String {
    let input: QueryDatabaseInput = match serde_json::from_str(arguments) {
        Ok(input) => input,
        Err(e) => {
            tracing::warn!(error = %e, "Invalid tool arguments");
            return failure_json(&format!("Invalid arguments: {e}"), "invalid_arguments")
                .to_string();
        }
    };

    match gate.execute(&input.query).await {
        Ok(result) => success_json(&result).to_string(),
        Err(e) => execution_failure_json(&e).to_string(),
    }
}

/// JSON body for a successful query.
pub fn success_json(result: &QueryResult) -> serde_json::Value {
    let mut body = json!({
        "success": true,
        "columns": result.columns,
        "data": result.records(),
        "row_count": result.row_count,
        "total_rows": result.total_rows,
        "truncated": result.was_truncated,
    });
    if !result.fallbacks.is_empty() {
        body["coerced_cells"] = json!(result.coerced_cells());
    }
    body
}

/// JSON body for a gate failure.
pub fn execution_failure_json(error: &ExecutionError) -> serde_json::Value {
    failure_json(&error.to_string(), error.error_kind())
}

fn failure_json(message: &str, kind: &str) -> serde_json::Value {
    json!({
        "success": false,
        "error": message,
        "error_kind": kind,
        "data": null,
    })
}
