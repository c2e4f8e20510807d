//! A local fake model for testing purpose.

mod preset;

use std::error::Error as StdError;
use std::fmt::{self, Debug, Display, Formatter};
use std::future::ready;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard};
use std::task::{Context, Poll, ready};
use std::time::Duration;

use search_agent_model::{
    ErrorKind, ModelFinishReason, ModelProvider, ModelProviderError,
    ModelRequest, ModelResponse, ModelResponseEvent,
};
use tokio::time::{Sleep, sleep};

pub use preset::*;

#[derive(Debug)]
pub struct Error {
    message: &'static str,
    kind: ErrorKind,
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.kind)
    }
}

impl StdError for Error {}

impl ModelProviderError for Error {
    #[inline]
    fn kind(&self) -> ErrorKind {
        self.kind
    }
}

pub struct TestModelResponse {
    events: Vec<PresetEvent>,
    event_idx: usize,
    delay: Duration,
    sleep: Option<Pin<Box<Sleep>>>,
}

impl ModelResponse for TestModelResponse {
    type Error = crate::Error;

    fn poll_next_event(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Result<Option<ModelResponseEvent>, Self::Error>> {
        let this = self.get_mut();

        if let Some(sleep) = &mut this.sleep {
            ready!(sleep.as_mut().poll(cx));
            this.sleep = None;

            let event_idx = this.event_idx;
            this.event_idx += 1;
            return match this.events.get(event_idx) {
                Some(PresetEvent::MessageDelta(msg)) => Poll::Ready(Ok(Some(
                    ModelResponseEvent::MessageDelta(msg.clone()),
                ))),
                Some(PresetEvent::StreamError) => Poll::Ready(Err(Error {
                    message: "stream broken",
                    kind: ErrorKind::Other,
                })),
                None if event_idx == this.events.len() => Poll::Ready(Ok(
                    Some(ModelResponseEvent::Completed(ModelFinishReason::Stop)),
                )),
                // In case this method is called after completion.
                None => Poll::Ready(Ok(None)),
            };
        }
        this.sleep = Some(Box::pin(sleep(this.delay)));
        Pin::new(this).poll_next_event(cx)
    }
}

#[derive(Default)]
struct ScriptState {
    next_step: usize,
    failed_attempts: u64,
    requests: Vec<ModelRequest>,
}

/// A local fake model for testing purpose.
///
/// Before sending requests, you need to setup the script, which is how the
/// model should respond to each request. Steps are consumed in the order
/// requests arrive; clones of the provider share the same cursor. If there
/// are no enough steps in the script, an error will be returned, unless the
/// last step is marked as repeating.
///
/// # Note
///
/// This type is not optimized for production use, there are heavy memory
/// copies involved. You should only use it for testing.
#[derive(Clone, Default)]
pub struct TestModelProvider {
    script: Vec<PresetResponse>,
    repeat_last: bool,
    delay: Option<Duration>,
    state: Arc<Mutex<ScriptState>>,
}

impl TestModelProvider {
    #[inline]
    pub fn add_response_step(&mut self, preset: PresetResponse) {
        self.script.push(preset);
    }

    /// Keeps answering with the last step once the script is exhausted.
    #[inline]
    pub fn repeat_last_step(&mut self) {
        self.repeat_last = true;
    }

    #[inline]
    pub fn set_delay(&mut self, duration: Duration) {
        self.delay = Some(duration);
    }

    /// Returns every request received so far.
    pub fn requests(&self) -> Vec<ModelRequest> {
        self.lock_state().requests.clone()
    }

    /// Returns how many requests have been received.
    pub fn request_count(&self) -> usize {
        self.lock_state().requests.len()
    }

    fn lock_state(&self) -> MutexGuard<'_, ScriptState> {
        self.state.lock().unwrap_or_else(|err| err.into_inner())
    }

    fn next_response(&self, req: &ModelRequest) -> Result<TestModelResponse, Error> {
        let mut state = self.lock_state();
        state.requests.push(req.clone());

        let step_idx = match (state.next_step, self.script.len()) {
            (_, 0) => None,
            (idx, len) if idx < len => Some(idx),
            (_, len) if self.repeat_last => Some(len - 1),
            _ => None,
        };
        let Some(step_idx) = step_idx else {
            return Err(Error {
                message: "no enough steps",
                kind: ErrorKind::RateLimitExceeded,
            });
        };

        let preset = &self.script[step_idx];
        if let Some(failures) = preset.failures {
            if failures == 0 || state.failed_attempts < failures {
                state.failed_attempts += 1;
                return Err(Error {
                    message: "preset failure",
                    kind: ErrorKind::Other,
                });
            }
        }

        state.failed_attempts = 0;
        state.next_step += 1;
        Ok(TestModelResponse {
            events: preset.events.clone(),
            event_idx: 0,
            delay: self.delay.unwrap_or(Duration::from_millis(1)),
            sleep: None,
        })
    }
}

impl ModelProvider for TestModelProvider {
    type Error = crate::Error;
    type Response = TestModelResponse;

    fn send_request(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<Self::Response, Self::Error>> + Send + 'static
    {
        ready(self.next_response(req))
    }
}
