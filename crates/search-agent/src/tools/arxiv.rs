use feed_rs::model::{Entry, Text};
use reqwest::Client;
use search_agent_core::tool::{
    Error as ToolError, TOP_K_RESULTS, Tool, ToolKind, ToolResult,
};

use super::{cap_query, finish, request_failed, top_k};

const DEFAULT_BASE_URL: &str = "https://export.arxiv.org";
const NO_RESULT: &str = "No good Arxiv Result was found";

#[derive(Debug, PartialEq)]
struct Paper {
    id: String,
    /// Date of the latest version, `YYYY-MM-DD`.
    published: String,
    title: String,
    authors: Vec<String>,
    summary: String,
}

impl Paper {
    fn from_entry(entry: Entry) -> Self {
        let published = entry
            .updated
            .or(entry.published)
            .map(|date| date.date_naive().to_string())
            .unwrap_or_default();
        Self {
            id: entry.id,
            published,
            title: plain_text(entry.title),
            authors: entry
                .authors
                .into_iter()
                .map(|person| collapse_whitespace(&person.name))
                .collect(),
            summary: plain_text(entry.summary),
        }
    }

    fn is_api_error(&self) -> bool {
        self.id.contains("/api/errors")
    }

    fn render(&self) -> String {
        format!(
            "Published: {}\nTitle: {}\nAuthors: {}\nSummary: {}",
            self.published,
            self.title,
            self.authors.join(", "),
            self.summary,
        )
    }
}

fn plain_text(text: Option<Text>) -> String {
    text.map(|text| collapse_whitespace(&text.content))
        .unwrap_or_default()
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn parse_feed(feed: &[u8]) -> Result<Vec<Paper>, ToolError> {
    let feed = feed_rs::parser::parse(feed).map_err(|err| {
        ToolError::execution_error()
            .with_reason(format!("arxiv returned an unreadable feed: {err}"))
    })?;
    Ok(feed.entries.into_iter().map(Paper::from_entry).collect())
}

/// Looks up academic papers on arXiv.
pub struct ArxivTool {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl ArxivTool {
    /// Creates a tool that talks to the public export API.
    #[inline]
    pub fn new(client: Client) -> Self {
        Self {
            client,
            base_url: DEFAULT_BASE_URL.to_owned(),
            token: None,
        }
    }

    /// Points the tool at another endpoint.
    #[inline]
    pub fn with_base_url<S: Into<String>>(mut self, base_url: S) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_owned();
        self
    }

    /// Sends a bearer token with every lookup.
    #[inline]
    pub fn with_token<S: Into<String>>(mut self, token: S) -> Self {
        self.token = Some(token.into());
        self
    }
}

impl Tool for ArxivTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Arxiv
    }

    fn description(&self) -> &str {
        "Looks up scientific articles on arxiv.org. Useful for questions \
about physics, mathematics, computer science, quantitative biology, \
quantitative finance, statistics, electrical engineering and economics. \
The input should be a search query."
    }

    #[allow(clippy::manual_async_fn)]
    fn execute(
        &self,
        query: String,
    ) -> impl Future<Output = ToolResult> + Send + 'static {
        let client = self.client.clone();
        let url = format!("{}/api/query", self.base_url);
        let token = self.token.clone();
        async move {
            let max_results = top_k();
            let mut req = client.get(url).query(&[
                ("search_query", cap_query(&query)),
                ("start", "0"),
                ("max_results", max_results.as_str()),
            ]);
            if let Some(token) = &token {
                req = req.bearer_auth(token);
            }

            let feed = req
                .send()
                .await
                .and_then(|resp| resp.error_for_status())
                .map_err(|err| request_failed("arxiv", err))?
                .bytes()
                .await
                .map_err(|err| request_failed("arxiv", err))?;

            let papers = parse_feed(&feed)?;
            debug!("arxiv returned {} paper(s)", papers.len());
            if let Some(paper) = papers.iter().find(|p| p.is_api_error()) {
                let reason =
                    format!("arxiv rejected the query: {}", paper.summary);
                return Err(ToolError::execution_error().with_reason(reason));
            }
            if papers.is_empty() {
                return Ok(NO_RESULT.to_owned());
            }

            let rendered: Vec<_> = papers
                .iter()
                .take(TOP_K_RESULTS)
                .map(Paper::render)
                .collect();
            Ok(finish(rendered.join("\n\n")))
        }
    }
}
