//! Prompt construction for LLM requests.
//!
//! Builds the system prompt with store schema context.

use crate::db::Schema;
use crate::llm::types::{Conversation, Message};

/// System prompt template for the data assistant.
const SYSTEM_PROMPT_TEMPLATE: &str = r#"You are a data assistant for a SQLite sales database. Answer questions by querying the database with the query_database tool.

DATABASE SCHEMA:
{schema}
INSTRUCTIONS:
- Only SELECT queries are accepted; anything else is rejected before it runs
- Use one SELECT statement per tool call
- Results are capped at {max_rows} rows; aggregate instead of listing rows when you can
- If a query fails, read the error and try a corrected query
- Explain findings in clear, business-friendly language"#;

/// Builds the system prompt with the schema and row cap injected.
pub fn build_system_prompt(schema: &Schema, max_rows: usize) -> String {
    SYSTEM_PROMPT_TEMPLATE
        .replace("{schema}", &schema.format_for_llm())
        .replace("{max_rows}", &max_rows.to_string())
}

/// Builds the complete message list for an LLM request.
///
/// Combines the system prompt, the conversation history and the messages of
/// the turn in progress.
pub fn build_messages(
    system_prompt: &str,
    conversation: &Conversation,
    turn: &[Message],
) -> Vec<Message> {
    let mut messages = Vec::with_capacity(conversation.len() + turn.len() + 1);
    messages.push(Message::system(system_prompt));
    messages.extend(conversation.messages().iter().cloned());
    messages.extend(turn.iter().cloned());
    messages
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{Column, Table};
    use crate::llm::types::Role;

    fn sample_schema() -> Schema {
        Schema {
            tables: vec![Table {
                name: "sales".to_string(),
                columns: vec![Column::new("product", "TEXT")],
                primary_key: vec![],
                row_count: 600,
            }],
        }
    }

    #[test]
    fn test_build_system_prompt() {
        let prompt = build_system_prompt(&sample_schema(), 100);
        assert!(prompt.contains("Table: sales"));
        assert!(prompt.contains("product: TEXT"));
        assert!(prompt.contains("capped at 100 rows"));
        assert!(!prompt.contains("{schema}"));
    }

    #[test]
    fn test_build_messages_order() {
        let mut conversation = Conversation::new();
        conversation.push_turn(vec![Message::user("Q1"), Message::assistant("A1")]);

        let messages = build_messages("system", &conversation, &[Message::user("Q2")]);
        let roles: Vec<Role> = messages.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![Role::System, Role::User, Role::Assistant, Role::User]
        );
        assert_eq!(messages[3].content, "Q2");
    }
}
