use std::sync::Arc;
use std::time::Duration;

use search_agent_model::{ModelProvider, Sampling};

use super::{Agent, AgentEvent, EventHandler};
use crate::model_client::ModelClient;
use crate::tool::{AnyTool, Catalog, Tool};

/// [`Agent`] builder.
pub struct AgentBuilder {
    pub(crate) model_client: ModelClient,
    pub(crate) catalog: Catalog,
    pub(crate) sampling: Sampling,
    pub(crate) max_iterations: usize,
    pub(crate) max_execution_time: Duration,
    pub(crate) on_event: Option<EventHandler>,
}

impl AgentBuilder {
    /// Creates a new builder with the specified model provider.
    ///
    /// Defaults: temperature 0.7, 1024 output tokens, 50 iterations and
    /// 90 seconds per turn.
    #[inline]
    pub fn with_model_provider<P: ModelProvider + 'static>(
        provider: P,
    ) -> Self {
        Self {
            model_client: ModelClient::new(provider),
            catalog: Catalog::default(),
            sampling: Sampling::default(),
            max_iterations: 50,
            max_execution_time: Duration::from_secs(90),
            on_event: None,
        }
    }

    /// Attaches a callback to be invoked with the progress of each turn.
    #[inline]
    pub fn on_event(
        mut self,
        on_event: impl Fn(AgentEvent) + Send + Sync + 'static,
    ) -> Self {
        self.on_event = Some(Arc::new(on_event));
        self
    }

    /// Registers a tool. A tool of the same kind registered earlier is
    /// replaced.
    #[inline]
    pub fn with_tool<T: Tool>(mut self, tool: T) -> Self {
        self.catalog.insert(Box::new(AnyTool(tool)));
        self
    }

    /// Overrides the sampling parameters.
    #[inline]
    pub fn with_sampling(mut self, sampling: Sampling) -> Self {
        self.sampling = sampling;
        self
    }

    /// Sets how many times the model may be asked within one turn.
    #[inline]
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Sets the wall-clock budget of one turn.
    #[inline]
    pub fn with_max_execution_time(mut self, duration: Duration) -> Self {
        self.max_execution_time = duration;
        self
    }

    /// Builds the agent.
    #[inline]
    pub fn build(self) -> Agent {
        Agent::from_builder(self)
    }
}
