//! Tool call supports.
//!
//! The set of tools is closed: the model names a tool by string, and the
//! name is resolved through [`ToolKind::from_name`]. Names that don't map to
//! a registered tool are never guessed at.

mod catalog;
mod error;

use std::fmt::{self, Display};
use std::pin::Pin;

use tracing::Instrument;

pub(crate) use catalog::Catalog;
pub use error::{Error, ErrorKind};

/// The result of a tool call.
pub type ToolResult = Result<String, Error>;

/// How many hits a lookup tool considers.
pub const TOP_K_RESULTS: usize = 3;

/// How many characters a lookup tool may return.
pub const MAX_RESULT_CHARS: usize = 512;

/// Every tool the agent knows about.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ToolKind {
    /// Encyclopedia lookup.
    Wikipedia,
    /// Academic paper lookup.
    Arxiv,
    /// General web search.
    WebSearch,
}

impl ToolKind {
    /// All kinds, in the order they are presented to the model.
    pub const ALL: [ToolKind; 3] =
        [ToolKind::Wikipedia, ToolKind::Arxiv, ToolKind::WebSearch];

    /// Returns the name the model uses to select this tool.
    #[inline]
    pub fn name(self) -> &'static str {
        match self {
            ToolKind::Wikipedia => "wikipedia",
            ToolKind::Arxiv => "arxiv",
            ToolKind::WebSearch => "web_search",
        }
    }

    /// Resolves a tool name written by the model.
    ///
    /// Surrounding whitespace and ASCII case are ignored, nothing else is.
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(name))
    }

    #[inline]
    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

impl Display for ToolKind {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A tool that can be called by the model.
///
/// Implementations of this trait should be stateless: calling a tool twice
/// with the same query must not change anything observable by the session.
/// Configuration (credentials, endpoints) is an immutable state of the tool,
/// set during initialization.
pub trait Tool: Send + Sync + 'static {
    /// Returns which tool this is.
    fn kind(&self) -> ToolKind;

    /// Returns the description shown to the model.
    fn description(&self) -> &str;

    /// Runs the tool with the given query.
    ///
    /// This method must return a future that is fully independent of `self`,
    /// and the future should be cancellation safe.
    fn execute(
        &self,
        query: String,
    ) -> impl Future<Output = ToolResult> + Send + 'static;
}

pub(crate) trait ToolObject: Send + Sync + 'static {
    fn kind(&self) -> ToolKind;

    fn description(&self) -> &str;

    fn execute(
        &self,
        query: String,
    ) -> Pin<Box<dyn Future<Output = ToolResult> + Send>>;
}

pub(crate) struct AnyTool<T: Tool>(pub T);

impl<T: Tool> ToolObject for AnyTool<T> {
    #[inline]
    fn kind(&self) -> ToolKind {
        self.0.kind()
    }

    #[inline]
    fn description(&self) -> &str {
        self.0.description()
    }

    fn execute(
        &self,
        query: String,
    ) -> Pin<Box<dyn Future<Output = ToolResult> + Send>> {
        let kind = self.0.kind();
        if query.trim().is_empty() {
            return Box::pin(std::future::ready(Err(
                Error::invalid_input().with_reason("query is empty"),
            )));
        }
        trace!("executing `{kind}` with query: {query:?}");
        Box::pin(
            self.0
                .execute(query)
                .instrument(debug_span!("tool execute", tool = kind.name())),
        )
    }
}

/// Cuts `text` down to at most `max_chars` characters.
///
/// Characters are counted as Unicode scalar values, so the result is always
/// valid UTF-8.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
