//! Conversation and tool-call types shared by every LLM client.

use serde::{Deserialize, Serialize};

/// A function invocation emitted by the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Provider-assigned id; the matching [`ToolResult`] echoes it.
    pub id: String,
    /// Tool name, e.g. `query_database`.
    pub name: String,
    /// JSON arguments for the tool, as sent by the model.
    pub arguments: String,
}

impl ToolCall {
    /// Creates a tool call.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments: arguments.into(),
        }
    }
}

/// Output of a dispatched tool call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolResult {
    /// Id of the answered call.
    pub tool_call_id: String,
    /// JSON body handed back to the model.
    pub content: String,
}

/// One completion: text, tool calls, or both.
#[derive(Debug, Clone, PartialEq)]
pub struct LlmResponse {
    /// Empty when the model only asked for tools.
    pub content: String,
    pub tool_calls: Vec<ToolCall>,
}

impl LlmResponse {
    /// A plain text answer.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            tool_calls: Vec::new(),
        }
    }

    /// An answer requesting tool calls.
    pub fn with_tool_calls(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            content: content.into(),
            tool_calls,
        }
    }

    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    /// The model, possibly carrying tool calls.
    Assistant,
    /// A tool result answering an assistant call.
    Tool,
}

impl Role {
    /// Wire name used by chat-completion APIs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::Tool => "tool",
        }
    }
}

/// One entry in the chat transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    /// Tool calls made by an assistant message.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    /// Call answered by a tool message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Creates an assistant message carrying tool calls.
    pub fn assistant_tool_calls(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            tool_calls,
            ..Self::new(Role::Assistant, content)
        }
    }

    /// Creates a tool message answering a call.
    pub fn tool(result: ToolResult) -> Self {
        Self {
            tool_call_id: Some(result.tool_call_id),
            ..Self::new(Role::Tool, result.content)
        }
    }
}

/// Conversation history kept across turns.
///
/// A turn starts with a user message and includes every assistant and tool
/// message up to the next user message. Trimming drops whole turns so tool
/// calls are never separated from their results.
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    messages: Vec<Message>,
    max_turns: usize,
}

impl Conversation {
    /// Creates a new empty conversation keeping 10 turns.
    pub fn new() -> Self {
        Self::with_max_turns(10)
    }

    /// Creates a conversation with a custom turn limit.
    pub fn with_max_turns(max_turns: usize) -> Self {
        Self {
            messages: Vec::new(),
            max_turns,
        }
    }

    /// Appends the messages of a completed turn and trims old turns.
    pub fn push_turn(&mut self, turn: Vec<Message>) {
        self.messages.extend(turn);
        self.drop_oldest_turns();
    }

    /// Messages of the retained turns, oldest first.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Number of user turns held.
    pub fn turns(&self) -> usize {
        self.messages.iter().filter(|m| m.role == Role::User).count()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// Message count across all retained turns.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    fn drop_oldest_turns(&mut self) {
        let excess = self.turns().saturating_sub(self.max_turns);
        if excess == 0 {
            return;
        }

        // Index of the first user message that survives.
        let cut = self
            .messages
            .iter()
            .enumerate()
            .filter(|(_, m)| m.role == Role::User)
            .nth(excess)
            .map(|(i, _)| i)
            .unwrap_or(self.messages.len());
        self.messages.drain(..cut);
    }
}
