use reqwest::Client;
use search_agent_core::tool::{TOP_K_RESULTS, Tool, ToolKind, ToolResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{finish, request_failed};

const DEFAULT_BASE_URL: &str = "https://google.serper.dev";
const NO_RESULT: &str = "No good Google Search Result was found";

#[derive(Serialize)]
struct SearchRequest<'a> {
    q: &'a str,
    num: usize,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchResponse {
    answer_box: Option<AnswerBox>,
    knowledge_graph: Option<KnowledgeGraph>,
    #[serde(default)]
    organic: Vec<OrganicResult>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnswerBox {
    answer: Option<String>,
    snippet: Option<String>,
    #[serde(default)]
    snippet_highlighted: Vec<String>,
}

#[derive(Deserialize)]
struct KnowledgeGraph {
    title: Option<String>,
    #[serde(rename = "type")]
    entity_type: Option<String>,
    description: Option<String>,
    #[serde(default)]
    attributes: Map<String, Value>,
}

#[derive(Deserialize)]
struct OrganicResult {
    snippet: Option<String>,
    #[serde(default)]
    attributes: Map<String, Value>,
}

/// Renders an attribute value, strings without their quotes.
fn attribute_value(value: Value) -> String {
    match value {
        Value::String(value) => value,
        value => value.to_string(),
    }
}

impl SearchResponse {
    /// Collects the snippets worth showing to the model.
    ///
    /// A direct answer wins over everything else. Otherwise the knowledge
    /// graph comes first, followed by the snippets of the top results.
    fn snippets(self) -> Vec<String> {
        if let Some(answer_box) = self.answer_box {
            if let Some(answer) = answer_box.answer {
                return vec![answer];
            }
            if let Some(snippet) = answer_box.snippet {
                return vec![snippet.replace('\n', " ")];
            }
            if !answer_box.snippet_highlighted.is_empty() {
                return answer_box.snippet_highlighted;
            }
        }

        let mut snippets = Vec::new();
        if let Some(kg) = self.knowledge_graph {
            let title = kg.title.unwrap_or_default();
            if let Some(entity_type) = kg.entity_type {
                snippets.push(format!("{title}: {entity_type}."));
            }
            if let Some(description) = kg.description {
                snippets.push(description);
            }
            for (attribute, value) in kg.attributes {
                let value = attribute_value(value);
                snippets.push(format!("{title} {attribute}: {value}."));
            }
        }
        for result in self.organic.into_iter().take(TOP_K_RESULTS) {
            if let Some(snippet) = result.snippet {
                snippets.push(snippet);
            }
            for (attribute, value) in result.attributes {
                let value = attribute_value(value);
                snippets.push(format!("{attribute}: {value}."));
            }
        }
        snippets
    }
}

/// Searches the web through the Serper API.
pub struct WebSearchTool {
    client: Client,
    base_url: String,
    api_key: String,
}

impl WebSearchTool {
    /// Creates a tool with the given Serper API key.
    #[inline]
    pub fn new<S: Into<String>>(client: Client, api_key: S) -> Self {
        Self {
            client,
            base_url: DEFAULT_BASE_URL.to_owned(),
            api_key: api_key.into(),
        }
    }

    /// Points the tool at another endpoint.
    #[inline]
    pub fn with_base_url<S: Into<String>>(mut self, base_url: S) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_owned();
        self
    }
}

impl Tool for WebSearchTool {
    fn kind(&self) -> ToolKind {
        ToolKind::WebSearch
    }

    fn description(&self) -> &str {
        "Searches the web. Useful for questions about current events or \
anything the other tools don't cover. The input should be a search query."
    }

    #[allow(clippy::manual_async_fn)]
    fn execute(
        &self,
        query: String,
    ) -> impl Future<Output = ToolResult> + Send + 'static {
        let client = self.client.clone();
        let url = format!("{}/search", self.base_url);
        let api_key = self.api_key.clone();
        async move {
            let body = SearchRequest {
                q: &query,
                num: TOP_K_RESULTS,
            };
            let resp: SearchResponse = client
                .post(url)
                .header("X-API-KEY", api_key)
                .json(&body)
                .send()
                .await
                .and_then(|resp| resp.error_for_status())
                .map_err(|err| request_failed("web search", err))?
                .json()
                .await
                .map_err(|err| request_failed("web search", err))?;

            let snippets = resp.snippets();
            debug!("web search returned {} snippet(s)", snippets.len());
            if snippets.is_empty() {
                return Ok(NO_RESULT.to_owned());
            }
            Ok(finish(snippets.join(" ")))
        }
    }
}

#[cfg(test)]
mod tests {
    use search_agent_core::tool::{ErrorKind, MAX_RESULT_CHARS};
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::tools::build_http_client;

    fn tool(server: &MockServer) -> WebSearchTool {
        WebSearchTool::new(build_http_client().unwrap(), "serper-key")
            .with_base_url(server.uri())
    }

    async fn mock_results(server: &MockServer, results: serde_json::Value) {
        Mock::given(method("POST"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(results))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_request_shape() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/search"))
            .and(header("X-API-KEY", "serper-key"))
            .and(body_json(json!({"q": "rust 2024 edition", "num": 3})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "organic": [{"title": "Rust", "snippet": "Released in 2025."}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let result = tool(&server)
            .execute("rust 2024 edition".to_owned())
            .await
            .unwrap();
        assert_eq!(result, "Released in 2025.");
    }

    #[tokio::test]
    async fn test_answer_box_wins() {
        let server = MockServer::start().await;
        mock_results(
            &server,
            json!({
                "answerBox": {"answer": "8,849 m", "snippet": "Everest is tall."},
                "knowledgeGraph": {"title": "Mount Everest", "type": "Mountain"},
                "organic": [{"snippet": "Something else."}]
            }),
        )
        .await;

        let result = tool(&server)
            .execute("everest height".to_owned())
            .await
            .unwrap();
        assert_eq!(result, "8,849 m");
    }

    #[tokio::test]
    async fn test_knowledge_graph_and_top_three_snippets() {
        let server = MockServer::start().await;
        mock_results(
            &server,
            json!({
                "knowledgeGraph": {
                    "title": "Rust",
                    "type": "Programming language",
                    "description": "A systems language.",
                    "attributes": {"Designed by": "Graydon Hoare"}
                },
                "organic": [
                    {"snippet": "one"},
                    {"snippet": "two", "attributes": {"Stars": "100k"}},
                    {"snippet": "three"},
                    {"snippet": "four"}
                ]
            }),
        )
        .await;

        let result = tool(&server).execute("rust".to_owned()).await.unwrap();
        assert_eq!(
            result,
            "Rust: Programming language. A systems language. \
Rust Designed by: Graydon Hoare. one two Stars: 100k. three"
        );
    }

    #[tokio::test]
    async fn test_attributes_keep_response_order() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                r#"{
                    "knowledgeGraph": {
                        "title": "Rust",
                        "attributes": {
                            "Typing": "Static",
                            "First appeared": 2015,
                            "Designed by": "Graydon Hoare"
                        }
                    },
                    "organic": [
                        {"snippet": "one", "attributes": {"Stars": 100000, "License": "MIT"}}
                    ]
                }"#,
                "application/json",
            ))
            .mount(&server)
            .await;

        let result = tool(&server).execute("rust".to_owned()).await.unwrap();
        assert_eq!(
            result,
            "Rust Typing: Static. Rust First appeared: 2015. \
Rust Designed by: Graydon Hoare. one Stars: 100000. License: MIT."
        );
    }

    #[tokio::test]
    async fn test_truncated() {
        let server = MockServer::start().await;
        let organic: Vec<_> = (0..3)
            .map(|_| json!({"snippet": "y".repeat(400)}))
            .collect();
        mock_results(&server, json!({"organic": organic})).await;

        let result = tool(&server).execute("y".to_owned()).await.unwrap();
        assert_eq!(result.chars().count(), MAX_RESULT_CHARS);
    }

    #[tokio::test]
    async fn test_no_hits() {
        let server = MockServer::start().await;
        mock_results(&server, json!({"searchParameters": {"q": "qwzx"}})).await;

        let result = tool(&server).execute("qwzx".to_owned()).await.unwrap();
        assert_eq!(result, NO_RESULT);
    }

    #[tokio::test]
    async fn test_rejected_key() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(403)
                    .set_body_json(json!({"message": "Unauthorized."})),
            )
            .mount(&server)
            .await;

        let err = tool(&server).execute("rust".to_owned()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ExecutionError);
        assert!(err.reason().contains("403"));
    }
}
