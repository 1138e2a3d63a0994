//! Agent loop tests with the mock LLM against a seeded store.

use data_insights::db::QueryStore;
use data_insights::llm::tools::{dispatch_tool_call, execute_query_database};
use data_insights::llm::{DataAgent, MockLlmClient, Role, ToolCall};
use data_insights::query::{GatePolicy, QueryGate};
use pretty_assertions::assert_eq;
use serde_json::Value as JsonValue;
use tempfile::TempDir;

use super::seeded_store;

#[tokio::test]
async fn test_agent_answers_from_store() {
    let dir = TempDir::new().unwrap();
    let store = seeded_store(&dir).await;
    let gate = QueryGate::new(&store, GatePolicy::default());
    let schema = store.introspect_schema().await.unwrap();
    let mut agent = DataAgent::new(Box::new(MockLlmClient::new()), &schema, 100, 10);

    let reply = agent.chat(&gate, "How many sales are there?").await.unwrap();

    assert_eq!(reply.text, "The query returned 1 rows. First row: sales = 600.");
    assert_eq!(reply.tool_calls.len(), 1);
}

#[tokio::test]
async fn test_agent_reports_rejection_as_text() {
    let dir = TempDir::new().unwrap();
    let store = seeded_store(&dir).await;
    let gate = QueryGate::new(&store, GatePolicy::default());
    let schema = store.introspect_schema().await.unwrap();
    let mut agent = DataAgent::new(Box::new(MockLlmClient::new()), &schema, 100, 10);

    let reply = agent.chat(&gate, "Delete all sales").await.unwrap();
    assert!(reply.text.contains("forbidden keyword: DELETE"));

    let reply = agent.chat(&gate, "How many sales are left?").await.unwrap();
    assert!(reply.text.ends_with("sales = 600."));
}

#[tokio::test]
async fn test_agent_keeps_history_across_turns() {
    let dir = TempDir::new().unwrap();
    let store = seeded_store(&dir).await;
    let gate = QueryGate::new(&store, GatePolicy::default());
    let schema = store.introspect_schema().await.unwrap();
    let mut agent = DataAgent::new(Box::new(MockLlmClient::new()), &schema, 100, 10);

    agent.chat(&gate, "Show revenue by region").await.unwrap();
    agent.chat(&gate, "Who are the top customers?").await.unwrap();

    let conversation = agent.conversation();
    assert_eq!(conversation.turns(), 2);
    let users = conversation
        .messages()
        .iter()
        .filter(|m| m.role == Role::User)
        .count();
    assert_eq!(users, 2);
}

#[tokio::test]
async fn test_tool_json_success_shape() {
    let dir = TempDir::new().unwrap();
    let store = seeded_store(&dir).await;
    let gate = QueryGate::new(&store, GatePolicy::default());

    let content = execute_query_database(
        &gate,
        r#"{"query":"SELECT name, total_orders FROM customers ORDER BY name LIMIT 3"}"#,
    )
    .await;
    let body: JsonValue = serde_json::from_str(&content).unwrap();

    assert_eq!(body["success"], true);
    assert_eq!(body["columns"], serde_json::json!(["name", "total_orders"]));
    assert_eq!(body["row_count"], 3);
    assert_eq!(body["total_rows"], 3);
    assert_eq!(body["truncated"], false);
    assert!(body["data"][0]["name"].is_string());
    assert!(body["data"][0]["total_orders"].is_i64());
    assert!(body.get("coerced_cells").is_none());
}

#[tokio::test]
async fn test_tool_json_failure_shape() {
    let dir = TempDir::new().unwrap();
    let store = seeded_store(&dir).await;
    let gate = QueryGate::new(&store, GatePolicy::default());

    let call = ToolCall::new("call_9", "query_database", r#"{"query":"DROP TABLE sales"}"#);
    let result = dispatch_tool_call(&gate, &call).await;
    let body: JsonValue = serde_json::from_str(&result.content).unwrap();

    assert_eq!(result.tool_call_id, "call_9");
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Query rejected: forbidden keyword: DROP");
    assert_eq!(body["error_kind"], "rejected_query");
    assert!(body["data"].is_null());
}
