use reqwest::Client;
use search_agent_core::tool::{
    Error as ToolError, TOP_K_RESULTS, Tool, ToolKind, ToolResult,
};
use serde::Deserialize;

use super::{cap_query, finish, request_failed, top_k};

const DEFAULT_BASE_URL: &str = "https://en.wikipedia.org";
const NO_RESULT: &str = "No good Wikipedia Search Result was found";

#[derive(Deserialize)]
struct SearchResponse {
    /// MediaWiki reports failures with a 200 status and this field set.
    error: Option<ApiError>,
    query: Option<SearchQuery>,
}

#[derive(Deserialize)]
struct ApiError {
    code: String,
    #[serde(default)]
    info: String,
}

#[derive(Deserialize)]
struct SearchQuery {
    #[serde(default)]
    pages: Vec<Page>,
}

#[derive(Deserialize)]
struct Page {
    title: String,
    /// Rank of the page in the search results.
    #[serde(default)]
    index: usize,
    #[serde(default)]
    extract: String,
}

/// Looks up encyclopedia pages and returns their introductions.
pub struct WikipediaTool {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl WikipediaTool {
    /// Creates a tool that talks to the English Wikipedia.
    #[inline]
    pub fn new(client: Client) -> Self {
        Self {
            client,
            base_url: DEFAULT_BASE_URL.to_owned(),
            token: None,
        }
    }

    /// Points the tool at another MediaWiki installation.
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

impl Tool for WikipediaTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Wikipedia
    }

    fn description(&self) -> &str {
        "Looks up Wikipedia. Useful for general questions about people, \
places, companies, facts, historical events, or other subjects. The input \
should be a search query."
    }

    #[allow(clippy::manual_async_fn)]
    fn execute(
        &self,
        query: String,
    ) -> impl Future<Output = ToolResult> + Send + 'static {
        let client = self.client.clone();
        let url = format!("{}/w/api.php", self.base_url);
        let token = self.token.clone();
        async move {
            let limit = top_k();
            let mut req = client.get(url).query(&[
                ("action", "query"),
                ("format", "json"),
                ("formatversion", "2"),
                ("generator", "search"),
                ("gsrsearch", cap_query(&query)),
                ("gsrlimit", limit.as_str()),
                ("prop", "extracts"),
                ("exintro", "1"),
                ("explaintext", "1"),
                ("exlimit", "max"),
                ("redirects", "1"),
            ]);
            if let Some(token) = &token {
                req = req.bearer_auth(token);
            }

            let resp = req
                .send()
                .await
                .and_then(|resp| resp.error_for_status())
                .map_err(|err| request_failed("wikipedia", err))?;
            let body: SearchResponse = resp
                .json()
                .await
                .map_err(|err| request_failed("wikipedia", err))?;
            if let Some(error) = body.error {
                let reason =
                    format!("wikipedia failed ({}): {}", error.code, error.info);
                return Err(ToolError::execution_error().with_reason(reason));
            }

            let mut pages =
                body.query.map(|query| query.pages).unwrap_or_default();
            pages.sort_by_key(|page| page.index);

            let summaries: Vec<_> = pages
                .into_iter()
                .filter(|page| !page.extract.trim().is_empty())
                .take(TOP_K_RESULTS)
                .map(|page| {
                    let summary = page.extract.trim();
                    format!("Page: {}\nSummary: {summary}", page.title)
                })
                .collect();
            debug!("wikipedia returned {} page(s)", summaries.len());

            if summaries.is_empty() {
                return Ok(NO_RESULT.to_owned());
            }
            Ok(finish(summaries.join("\n\n")))
        }
    }
}
