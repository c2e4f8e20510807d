use serde::{Deserialize, Serialize};

/// A request to be sent to the model provider.
#[derive(Clone, Debug, PartialEq)]
pub struct ModelRequest {
    /// The input messages.
    pub messages: Vec<ModelMessage>,
    /// Sampling parameters for this request.
    pub sampling: Sampling,
    /// Sequences where the model should stop generating.
    pub stop: Vec<String>,
}

/// A complete message.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelMessage {
    /// The system instructions.
    System(String),
    /// A user input text.
    User(String),
    /// An assistant text.
    Assistant(String),
    /// The result of a tool the assistant asked for.
    Observation(Observation),
}

/// What a tool returned for the assistant's last action.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Observation {
    /// Name of the tool that produced the content.
    pub tool: String,
    /// The (already truncated) tool output.
    pub content: String,
}

/// Sampling parameters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Sampling {
    /// Sampling temperature.
    pub temperature: f32,
    /// Upper bound of generated tokens.
    pub max_tokens: u32,
}

impl Default for Sampling {
    #[inline]
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 1024,
        }
    }
}
