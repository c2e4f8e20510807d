use std::collections::VecDeque;
use std::error::Error;
use std::fmt::{self, Display, Formatter};
use std::future::{poll_fn, ready};
use std::pin::Pin;
use std::task::{self, Poll, ready};
use std::time::Duration;

use search_agent_model::{
    ErrorKind, ModelFinishReason, ModelMessage, ModelProvider,
    ModelProviderError, ModelRequest, ModelResponse, ModelResponseEvent,
    Observation, Sampling,
};
use tokio::time::{Sleep, sleep};

#[derive(Debug)]
struct FakeModelProviderError(ErrorKind);

impl Display for FakeModelProviderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

impl Error for FakeModelProviderError {}

impl ModelProviderError for FakeModelProviderError {
    fn kind(&self) -> ErrorKind {
        self.0
    }
}

/// Echoes the last user message back, one word per event, and caps the
/// output at `max_tokens` words.
#[derive(Debug)]
struct FakeModelResponse {
    fake_items: VecDeque<String>,
    truncated: bool,
    finished: bool,
    sleep: Option<Pin<Box<Sleep>>>,
}

impl FakeModelResponse {
    fn new(input: &str, max_tokens: u32) -> Self {
        let mut fake_items: VecDeque<String> = format!("You said {input}")
            .split(' ')
            .map(ToString::to_string)
            .collect();
        let truncated = fake_items.len() > max_tokens as usize;
        fake_items.truncate(max_tokens as usize);
        Self {
            fake_items,
            truncated,
            finished: false,
            sleep: None,
        }
    }
}

impl ModelResponse for FakeModelResponse {
    type Error = FakeModelProviderError;

    fn poll_next_event(
        self: Pin<&mut Self>,
        cx: &mut task::Context<'_>,
    ) -> Poll<Result<Option<ModelResponseEvent>, Self::Error>> {
        // SAFETY: This type does not require to be pinned.
        let this = unsafe { self.get_unchecked_mut() };
        if let Some(sleep) = &mut this.sleep {
            ready!(sleep.as_mut().poll(cx));
            this.sleep = None;

            if let Some(mut this_item) = this.fake_items.pop_front() {
                if !this.fake_items.is_empty() {
                    this_item.push(' ');
                }
                return Poll::Ready(Ok(Some(
                    ModelResponseEvent::MessageDelta(this_item),
                )));
            }
            if !this.finished {
                this.finished = true;
                let reason = if this.truncated {
                    ModelFinishReason::Length
                } else {
                    ModelFinishReason::Stop
                };
                return Poll::Ready(Ok(Some(ModelResponseEvent::Completed(
                    reason,
                ))));
            }
            return Poll::Ready(Ok(None));
        }
        this.sleep = Some(Box::pin(sleep(Duration::from_millis(1))));
        Pin::new(this).poll_next_event(cx)
    }
}

struct FakeModelProvider;

impl ModelProvider for FakeModelProvider {
    type Error = FakeModelProviderError;
    type Response = FakeModelResponse;

    fn send_request(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<Self::Response, Self::Error>> + Send + 'static
    {
        let last_user_input = req.messages.iter().rev().find_map(|msg| match msg {
            ModelMessage::User(text) => Some(text.as_str()),
            _ => None,
        });
        let result = match last_user_input {
            Some(input) => {
                Ok(FakeModelResponse::new(input, req.sampling.max_tokens))
            }
            None => Err(FakeModelProviderError(ErrorKind::Other)),
        };
        ready(result)
    }
}

async fn collect(
    mut resp: FakeModelResponse,
) -> (String, Option<ModelFinishReason>) {
    let mut resp_message = String::new();
    let mut finish_reason = None;
    loop {
        let resp_fut = poll_fn(|cx| Pin::new(&mut resp).poll_next_event(cx));
        match resp_fut.await {
            Ok(Some(ModelResponseEvent::MessageDelta(delta))) => {
                resp_message.push_str(&delta);
            }
            Ok(Some(ModelResponseEvent::Completed(reason))) => {
                finish_reason = Some(reason);
            }
            Ok(None) => break,
            Err(err) => unreachable!("unexpected error: {err:?}"),
        }
    }
    (resp_message, finish_reason)
}

#[tokio::test]
async fn test_completion() {
    let provider = FakeModelProvider;
    let req = ModelRequest {
        messages: vec![
            ModelMessage::System("Be nice.".to_string()),
            ModelMessage::User("Good morning".to_string()),
        ],
        sampling: Sampling::default(),
        stop: vec!["Observation:".to_string()],
    };
    let resp = provider.send_request(&req).await.unwrap();
    let (message, reason) = collect(resp).await;

    assert_eq!(message, "You said Good morning");
    assert_eq!(reason, Some(ModelFinishReason::Stop));
}

#[tokio::test]
async fn test_length_limit() {
    let provider = FakeModelProvider;
    let req = ModelRequest {
        messages: vec![
            ModelMessage::User("What is deep learning".to_string()),
            ModelMessage::Observation(Observation {
                tool: "wikipedia".to_string(),
                content: "Page: Deep learning".to_string(),
            }),
        ],
        sampling: Sampling {
            temperature: 0.0,
            max_tokens: 3,
        },
        stop: vec![],
    };
    let resp = provider.send_request(&req).await.unwrap();
    let (message, reason) = collect(resp).await;

    assert_eq!(message, "You said What");
    assert_eq!(reason, Some(ModelFinishReason::Length));
}

#[tokio::test]
async fn test_error() {
    let provider = FakeModelProvider;
    let req = ModelRequest {
        messages: vec![],
        sampling: Sampling::default(),
        stop: vec![],
    };
    let result = provider.send_request(&req).await;
    let err = result.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Other);
}

#[test]
fn test_default_sampling() {
    let sampling = Sampling::default();
    assert_eq!(sampling.temperature, 0.7);
    assert_eq!(sampling.max_tokens, 1024);
}
