use std::time::Duration;

use reqwest::Client;
use search_agent_core::conversation::{Message, Transcript};
use search_agent_core::tool::Tool;
use search_agent_core::{
    Agent, AgentBuilder, AgentEvent, AgentOutcome, TurnReport,
};
use search_agent_model::ModelProvider;

use crate::config::Config;
use crate::tools::*;

/// The first message of every session.
pub const GREETING: &str = "I am a chatbot with search engine. I am here to \
answer your question. What do you want to know?";

/// What the user sees when a turn fails, whatever the reason.
pub const APOLOGY: &str = "Sorry, I encountered an issue processing your \
request. Please try asking in a different way.";

/// A session builder.
///
/// See [`Session`].
pub struct SessionBuilder {
    agent_builder: AgentBuilder,
}

impl SessionBuilder {
    /// Creates a session builder with a specified model provider.
    pub fn with_model_provider<M: ModelProvider + 'static>(
        provider: M,
    ) -> Self {
        let agent_builder = AgentBuilder::with_model_provider(provider);
        Self { agent_builder }
    }

    /// Attaches a callback to be invoked with the progress of each turn.
    #[inline]
    pub fn on_event(
        mut self,
        on_event: impl Fn(AgentEvent) + Send + Sync + 'static,
    ) -> Self {
        self.agent_builder = self.agent_builder.on_event(on_event);
        self
    }

    /// Registers a single tool.
    #[inline]
    pub fn with_tool<T: Tool>(mut self, tool: T) -> Self {
        self.agent_builder = self.agent_builder.with_tool(tool);
        self
    }

    /// Registers the three lookup tools, configured from `config`.
    pub fn with_search_tools(self, client: Client, config: &Config) -> Self {
        let mut wikipedia = WikipediaTool::new(client.clone());
        let mut arxiv = ArxivTool::new(client.clone());
        let mut web_search =
            WebSearchTool::new(client, config.search_api_key.clone());

        if let Some(token) = config.wikipedia_token() {
            wikipedia = wikipedia.with_token(token.to_owned());
        }
        if let Some(token) = config.arxiv_token() {
            arxiv = arxiv.with_token(token.to_owned());
        }
        if let Some(base_url) = &config.wikipedia_base_url {
            wikipedia = wikipedia.with_base_url(base_url.clone());
        }
        if let Some(base_url) = &config.arxiv_base_url {
            arxiv = arxiv.with_base_url(base_url.clone());
        }
        if let Some(base_url) = &config.search_base_url {
            web_search = web_search.with_base_url(base_url.clone());
        }

        self.with_tool(wikipedia)
            .with_tool(arxiv)
            .with_tool(web_search)
    }

    /// Sets how many times the model may be asked within one turn.
    #[inline]
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.agent_builder =
            self.agent_builder.with_max_iterations(max_iterations);
        self
    }

    /// Sets the wall-clock budget of one turn.
    #[inline]
    pub fn with_max_execution_time(mut self, duration: Duration) -> Self {
        self.agent_builder =
            self.agent_builder.with_max_execution_time(duration);
        self
    }

    /// Builds a new session, seeded with the greeting.
    pub fn build(self) -> Session {
        Session {
            agent: self.agent_builder.build(),
            transcript: Transcript::with_greeting(GREETING),
        }
    }
}

/// A chat session, like a window that displays messages and has an input
/// box.
///
/// Each call to [`Session::send_message`] grows the transcript by exactly
/// two messages: the user's input and one reply. Failed turns are replied
/// to with [`APOLOGY`] and leave the session usable.
pub struct Session {
    agent: Agent,
    transcript: Transcript,
}

impl Session {
    /// Sends a message to the session and waits for the reply.
    ///
    /// The transcript is only updated once the turn has ended, so dropping
    /// the returned future leaves it untouched.
    pub async fn send_message(&mut self, message: &str) -> TurnReport {
        let user_message = Message::user(message);
        let mut history = self.transcript.snapshot();
        history.push(user_message.clone());

        let report = self.agent.run(&history).await;
        let reply = match &report.outcome {
            AgentOutcome::FinalAnswer(answer) => answer.clone(),
            AgentOutcome::Failed(reason) => {
                warn!("replying with an apology: {reason}");
                APOLOGY.to_owned()
            }
        };

        self.transcript.append(user_message);
        self.transcript.append(Message::assistant(reply));
        report
    }

    /// Returns the transcript so far.
    #[inline]
    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }
}
