mod builder;
mod prompt;

use std::fmt::{self, Display};
use std::sync::Arc;
use std::time::Duration;

use search_agent_model::{
    ErrorKind as ModelErrorKind, ModelMessage, ModelRequest, Observation,
    Sampling,
};
use tokio::time::{Instant, timeout_at};

use crate::conversation::{Message, Role};
use crate::model_client::ModelClient;
use crate::tool::{Catalog, Error as ToolError, ToolKind};
use crate::turn::{ModelTurn, OBSERVATION};
pub use builder::AgentBuilder;

pub(crate) type EventHandler = Arc<dyn Fn(AgentEvent) + Send + Sync>;

/// Why a turn failed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FailureReason {
    /// The model reply matched neither a tool call nor a final answer, or
    /// named a tool that doesn't exist.
    ParseFailure(String),
    /// A tool failed to run.
    ToolFailure {
        /// The tool that failed.
        tool: ToolKind,
        /// What went wrong.
        error: ToolError,
    },
    /// The model provider failed.
    ModelFailure {
        /// The coarse kind reported by the provider.
        kind: ModelErrorKind,
        /// The provider's message.
        message: String,
    },
    /// The model kept asking for tools.
    IterationLimitExceeded,
    /// The turn ran out of time.
    TimeoutExceeded,
}

impl Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::ParseFailure(reason) => {
                write!(f, "unparsable model output: {reason}")
            }
            FailureReason::ToolFailure { tool, error } => {
                write!(f, "tool `{tool}` failed: {error}")
            }
            FailureReason::ModelFailure { kind, message } => {
                write!(f, "model failed ({kind}): {message}")
            }
            FailureReason::IterationLimitExceeded => {
                write!(f, "iteration limit exceeded")
            }
            FailureReason::TimeoutExceeded => write!(f, "time limit exceeded"),
        }
    }
}

/// The terminal result of one turn.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AgentOutcome {
    /// The model produced an answer.
    FinalAnswer(String),
    /// The turn stopped without an answer.
    Failed(FailureReason),
}

/// What happened during a turn.
#[derive(Clone, Debug)]
pub struct TurnReport {
    /// How the turn ended.
    pub outcome: AgentOutcome,
    /// How many times the model was asked to think.
    pub iterations: usize,
    /// How many tools were run.
    pub tool_calls: usize,
    /// Wall-clock time spent on the turn.
    pub elapsed: Duration,
}

/// Progress of a running turn, for rendering.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AgentEvent {
    /// The model is being asked for the next step.
    Thinking {
        /// 1-based iteration number.
        iteration: usize,
    },
    /// A chunk of model output, as soon as it arrives.
    Delta(String),
    /// A tool is about to run.
    ToolStarted {
        /// The tool.
        tool: ToolKind,
        /// The query the model asked for.
        query: String,
    },
    /// A tool has finished.
    ToolFinished {
        /// The tool.
        tool: ToolKind,
        /// Whether it returned a result.
        ok: bool,
    },
}

/// An agent that answers one turn at a time by alternating between the
/// model and the tools.
///
/// The agent holds no conversation state of its own. Each call to
/// [`Agent::run`] builds a scratch transcript from the borrowed history,
/// which is dropped once the turn ends.
pub struct Agent {
    model_client: ModelClient,
    catalog: Catalog,
    system_prompt: String,
    sampling: Sampling,
    max_iterations: usize,
    max_execution_time: Duration,
    on_event: Option<EventHandler>,
}

impl Agent {
    fn from_builder(builder: AgentBuilder) -> Self {
        let AgentBuilder {
            model_client,
            catalog,
            sampling,
            max_iterations,
            max_execution_time,
            on_event,
        } = builder;

        if catalog.is_empty() {
            warn!("agent built without any tools");
        }
        let system_prompt = prompt::render_system_prompt(&catalog);

        Self {
            model_client,
            catalog,
            system_prompt,
            sampling,
            max_iterations,
            max_execution_time,
            on_event,
        }
    }

    /// Runs one turn against the given history, whose last message is
    /// normally the user's question.
    ///
    /// Every failure is folded into [`AgentOutcome::Failed`]; this method
    /// never returns an error.
    pub async fn run(&self, history: &[Message]) -> TurnReport {
        let started = Instant::now();
        let deadline = started + self.max_execution_time;
        let mut iterations = 0;
        let mut tool_calls = 0;

        let mut scratch = Vec::with_capacity(history.len() + 1);
        scratch.push(ModelMessage::System(self.system_prompt.clone()));
        scratch.extend(history.iter().map(|msg| match msg.role() {
            Role::User => ModelMessage::User(msg.content().to_owned()),
            Role::Assistant => ModelMessage::Assistant(msg.content().to_owned()),
        }));

        let outcome = loop {
            // Caps are checked between steps. Each call below is also bounded
            // by the remaining budget, so one slow call can't overrun it.
            if iterations >= self.max_iterations {
                break AgentOutcome::Failed(
                    FailureReason::IterationLimitExceeded,
                );
            }
            if Instant::now() >= deadline {
                break AgentOutcome::Failed(FailureReason::TimeoutExceeded);
            }

            iterations += 1;
            debug!("thinking (iteration {iterations})");
            self.emit(AgentEvent::Thinking {
                iteration: iterations,
            });

            let request = ModelRequest {
                messages: scratch.clone(),
                sampling: self.sampling,
                stop: vec![OBSERVATION.to_owned()],
            };
            let on_delta = {
                let on_event = self.on_event.clone();
                move |delta: String| {
                    if let Some(on_event) = &on_event {
                        on_event(AgentEvent::Delta(delta));
                    }
                }
            };
            let resp = match timeout_at(
                deadline,
                self.model_client.send_request(request, on_delta),
            )
            .await
            {
                Ok(Ok(resp)) => resp,
                Ok(Err(err)) => {
                    break AgentOutcome::Failed(FailureReason::ModelFailure {
                        kind: err.kind(),
                        message: err.to_string(),
                    });
                }
                Err(_) => {
                    break AgentOutcome::Failed(FailureReason::TimeoutExceeded);
                }
            };

            let (tool_name, query) = match resp.turn {
                ModelTurn::FinalAnswer(answer) => {
                    break AgentOutcome::FinalAnswer(answer);
                }
                ModelTurn::Unparsable(reason) => {
                    break AgentOutcome::Failed(FailureReason::ParseFailure(
                        reason,
                    ));
                }
                ModelTurn::ToolCall { tool_name, query } => (tool_name, query),
            };

            let Some(tool) = self.catalog.resolve(&tool_name) else {
                break AgentOutcome::Failed(FailureReason::ParseFailure(
                    format!("unknown tool `{tool_name}`"),
                ));
            };
            let kind = tool.kind();

            tool_calls += 1;
            debug!("running `{kind}` with query: {query:?}");
            self.emit(AgentEvent::ToolStarted {
                tool: kind,
                query: query.clone(),
            });
            let result = timeout_at(deadline, tool.execute(query)).await;
            self.emit(AgentEvent::ToolFinished {
                tool: kind,
                ok: matches!(result, Ok(Ok(_))),
            });
            let content = match result {
                Ok(Ok(content)) => content,
                Ok(Err(error)) => {
                    break AgentOutcome::Failed(FailureReason::ToolFailure {
                        tool: kind,
                        error,
                    });
                }
                Err(_) => {
                    break AgentOutcome::Failed(FailureReason::TimeoutExceeded);
                }
            };

            scratch.push(ModelMessage::Assistant(resp.transcript));
            scratch.push(ModelMessage::Observation(Observation {
                tool: kind.name().to_owned(),
                content,
            }));
        };

        let elapsed = started.elapsed();
        match &outcome {
            AgentOutcome::FinalAnswer(_) => {
                info!("turn answered after {iterations} iteration(s) in {elapsed:?}");
            }
            AgentOutcome::Failed(reason) => {
                warn!("turn failed after {iterations} iteration(s) in {elapsed:?}: {reason}");
            }
        }

        TurnReport {
            outcome,
            iterations,
            tool_calls,
            elapsed,
        }
    }

    #[inline]
    fn emit(&self, event: AgentEvent) {
        if let Some(on_event) = &self.on_event {
            on_event(event);
        }
    }
}
