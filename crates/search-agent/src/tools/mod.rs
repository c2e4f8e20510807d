//! The lookup tools the agent can use.
//!
//! Every tool considers at most [`TOP_K_RESULTS`] hits and returns at most
//! [`MAX_RESULT_CHARS`] characters. A lookup with no hits is not an error,
//! the tool answers with a fixed sentence the model can reason about.

mod arxiv;
mod web_search;
mod wikipedia;

use std::time::Duration;

use reqwest::Client;
use search_agent_core::tool::{
    Error as ToolError, MAX_RESULT_CHARS, TOP_K_RESULTS, truncate_chars,
};

pub use arxiv::ArxivTool;
pub use web_search::WebSearchTool;
pub use wikipedia::WikipediaTool;

/// Lookup services reject longer queries.
const MAX_QUERY_CHARS: usize = 300;

const USER_AGENT: &str =
    concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Builds the HTTP client shared by the lookup tools.
pub fn build_http_client() -> reqwest::Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .connect_timeout(Duration::from_secs(10))
        .timeout(Duration::from_secs(30))
        .build()
}

#[inline]
fn top_k() -> String {
    TOP_K_RESULTS.to_string()
}

#[inline]
fn cap_query(query: &str) -> &str {
    truncate_chars(query.trim(), MAX_QUERY_CHARS)
}

fn request_failed(service: &str, err: reqwest::Error) -> ToolError {
    let reason = match err.status() {
        Some(status) => format!("{service} returned {status}"),
        None => format!("{service} request failed: {err}"),
    };
    ToolError::execution_error().with_reason(reason)
}

fn finish(text: String) -> String {
    let truncated = truncate_chars(&text, MAX_RESULT_CHARS);
    if truncated.len() == text.len() {
        text
    } else {
        truncated.to_owned()
    }
}
