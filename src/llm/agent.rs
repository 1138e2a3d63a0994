//! The data agent: a function-calling conversation loop.
//!
//! Each turn sends the conversation plus tool definitions to the model,
//! dispatches tool calls through the query gate, feeds the results back and
//! returns the model's final text. The gate is passed in per call; the agent
//! owns no store.

use std::time::Instant;

use crate::db::Schema;
use crate::error::Result;
use crate::query::QueryGate;

use super::prompt::{build_messages, build_system_prompt};
use super::tools::{dispatch_tool_call, get_tool_definitions, ToolDefinition};
use super::types::{Conversation, Message, ToolCall};
use super::LlmClient;

/// Tool-calling rounds allowed per turn before a text answer is forced.
pub const MAX_TOOL_ROUNDS: usize = 4;

/// Reply used when the model returns no text.
const EMPTY_REPLY: &str = "I've processed your request.";

/// Outcome of one conversation turn.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentReply {
    /// Final text from the model.
    pub text: String,
    /// Tool calls dispatched during the turn, in order.
    pub tool_calls: Vec<ToolCall>,
}

/// Conversation loop over an LLM client.
pub struct DataAgent {
    client: Box<dyn LlmClient>,
    conversation: Conversation,
    system_prompt: String,
    tools: Vec<ToolDefinition>,
}

impl DataAgent {
    /// Creates an agent whose system prompt describes the given schema.
    pub fn new(
        client: Box<dyn LlmClient>,
        schema: &Schema,
        max_rows: usize,
        max_turns: usize,
    ) -> Self {
        Self {
            client,
            conversation: Conversation::with_max_turns(max_turns),
            system_prompt: build_system_prompt(schema, max_rows),
            tools: get_tool_definitions(),
        }
    }

    /// Runs one turn.
    ///
    /// On error the turn is discarded and the history is left as it was, so
    /// the caller can report the failure and keep chatting.
    pub async fn chat(&mut self, gate: &QueryGate<'_>, input: &str) -> Result<AgentReply> {
        let start = Instant::now();
        tracing::info!(input_len = input.len(), "Processing user message");

        let mut turn = vec![Message::user(input)];
        let mut dispatched = Vec::new();

        for round in 0..MAX_TOOL_ROUNDS {
            let messages = build_messages(&self.system_prompt, &self.conversation, &turn);
            let response = self
                .client
                .complete_with_tools(&messages, &self.tools)
                .await?;

            tracing::debug!(
                round,
                has_tool_calls = response.has_tool_calls(),
                "LLM response received"
            );

            if !response.has_tool_calls() {
                return Ok(self.finish(turn, response.content, dispatched, start));
            }

            turn.push(Message::assistant_tool_calls(
                response.content,
                response.tool_calls.clone(),
            ));
            for call in response.tool_calls {
                let result = dispatch_tool_call(gate, &call).await;
                turn.push(Message::tool(result));
                dispatched.push(call);
            }
        }

        tracing::warn!(
            rounds = MAX_TOOL_ROUNDS,
            "Tool round limit reached, requesting final answer"
        );
        let messages = build_messages(&self.system_prompt, &self.conversation, &turn);
        let response = self.client.complete_with_tools(&messages, &[]).await?;
        Ok(self.finish(turn, response.content, dispatched, start))
    }

    /// Clears the conversation history.
    pub fn reset(&mut self) {
        self.conversation.clear();
        tracing::info!("Conversation history reset");
    }

    /// Returns the conversation history.
    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    fn finish(
        &mut self,
        mut turn: Vec<Message>,
        content: String,
        tool_calls: Vec<ToolCall>,
        start: Instant,
    ) -> AgentReply {
        let text = if content.trim().is_empty() {
            EMPTY_REPLY.to_string()
        } else {
            content
        };

        turn.push(Message::assistant(text.clone()));
        self.conversation.push_turn(turn);

        tracing::info!(
            tool_calls = tool_calls.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Turn complete"
        );

        AgentReply { text, tool_calls }
    }
}
