//! The line-oriented grammar the model is asked to answer in.
//!
//! A reply either selects a tool:
//!
//! ```text
//! Thought: I need to look this up.
//! Action: web_search
//! Action Input: deep learning definition
//! ```
//!
//! or finishes the turn:
//!
//! ```text
//! Thought: I know the answer now.
//! Final Answer: Deep learning is ...
//! ```
//!
//! Markers are recognized at the start of a line, after optional leading
//! whitespace, and are case-sensitive. Everything else is free text.

/// Marker of the line naming the tool to call.
pub const ACTION: &str = "Action:";
/// Marker of the line holding the tool query.
pub const ACTION_INPUT: &str = "Action Input:";
/// Marker of the final answer. The answer runs to the end of the reply.
pub const FINAL_ANSWER: &str = "Final Answer:";
/// Prefix the tool output is fed back with. Also used as a stop sequence,
/// so the model doesn't make up observations by itself.
pub const OBSERVATION: &str = "Observation:";

/// What a model reply asks the agent to do next.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ModelTurn {
    /// Run a tool with a query.
    ToolCall {
        /// Name of the tool, exactly as the model wrote it.
        tool_name: String,
        /// The query to pass to the tool.
        query: String,
    },
    /// The turn is over, with this answer.
    FinalAnswer(String),
    /// The reply matched neither form. Holds a description of why.
    Unparsable(String),
}

/// Parses a complete model reply.
pub fn parse(text: &str) -> ModelTurn {
    let mut answer_start = None;
    let mut action = None;
    let mut action_input = None;

    let mut offset = 0;
    for line in text.split_inclusive('\n') {
        let trimmed = line.trim_start();
        let marker_start = offset + (line.len() - trimmed.len());
        offset += line.len();

        if trimmed.starts_with(FINAL_ANSWER) {
            answer_start.get_or_insert(marker_start + FINAL_ANSWER.len());
        } else if let Some(rest) = trimmed.strip_prefix(ACTION_INPUT) {
            action_input.get_or_insert(rest.trim());
        } else if let Some(rest) = trimmed.strip_prefix(ACTION) {
            action.get_or_insert(rest.trim());
        }
    }

    match (answer_start, action) {
        (Some(_), Some(_)) => ModelTurn::Unparsable(
            "reply contains both a final answer and an action".to_owned(),
        ),
        (Some(start), None) => {
            let answer = text[start..].trim();
            if answer.is_empty() {
                ModelTurn::Unparsable("final answer is empty".to_owned())
            } else {
                ModelTurn::FinalAnswer(answer.to_owned())
            }
        }
        (None, Some(tool_name)) => {
            if tool_name.is_empty() {
                return ModelTurn::Unparsable("action names no tool".to_owned());
            }
            let query = action_input.map(strip_quotes).unwrap_or_default();
            if query.is_empty() {
                return ModelTurn::Unparsable(format!(
                    "action `{tool_name}` has no usable query"
                ));
            }
            ModelTurn::ToolCall {
                tool_name: tool_name.to_owned(),
                query: query.to_owned(),
            }
        }
        (None, None) => ModelTurn::Unparsable(
            "reply has neither an action nor a final answer".to_owned(),
        ),
    }
}

fn strip_quotes(input: &str) -> &str {
    for quote in ['"', '\'', '`'] {
        if let Some(inner) = input
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return inner.trim();
        }
    }
    input
}
