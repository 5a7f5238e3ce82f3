//! Web search backed by the Exa search API.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use parley_core::tools::Tool;
use parley_core::tools::catalog::WEB_SEARCH;
use parley_types::error::ToolError;
use parley_types::llm::ToolDefinition;

const DEFAULT_NUM_RESULTS: u32 = 5;
const MAX_NUM_RESULTS: u32 = 10;
const MAX_CHARACTERS: u32 = 1000;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchArgs {
    query: String,
    #[serde(default)]
    num_results: Option<u32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchRequest<'a> {
    query: &'a str,
    num_results: u32,
    contents: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchHit {
    #[serde(default)]
    title: Option<String>,
    url: String,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    published_date: Option<String>,
}

pub struct WebSearchTool {
    client: reqwest::Client,
    base_url: String,
    api_key: SecretString,
    definition: ToolDefinition,
}

impl WebSearchTool {
    pub fn new(base_url: &str, api_key: SecretString) -> Result<Self, ToolError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| ToolError::Transport(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            definition: ToolDefinition {
                name: WEB_SEARCH.to_string(),
                description: "Search the web and return the most relevant pages with a short excerpt of each.".to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "query": {"type": "string", "description": "Search query"},
                        "numResults": {
                            "type": "integer",
                            "minimum": 1,
                            "maximum": MAX_NUM_RESULTS,
                            "description": "Number of results to return"
                        }
                    },
                    "required": ["query"]
                }),
            },
        })
    }
}

impl Tool for WebSearchTool {
    fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    async fn call(&self, arguments: serde_json::Value) -> Result<serde_json::Value, ToolError> {
        let args: SearchArgs = serde_json::from_value(arguments).map_err(|e| ToolError::Call {
            tool: WEB_SEARCH.to_string(),
            message: format!("invalid arguments: {e}"),
        })?;
        let num_results = args
            .num_results
            .unwrap_or(DEFAULT_NUM_RESULTS)
            .clamp(1, MAX_NUM_RESULTS);
        debug!(query = %args.query, num_results, "web search");

        let response = self
            .client
            .post(format!("{}/search", self.base_url))
            .header("x-api-key", self.api_key.expose_secret())
            .json(&SearchRequest {
                query: &args.query,
                num_results,
                contents: json!({"text": {"maxCharacters": MAX_CHARACTERS}}),
            })
            .send()
            .await
            .map_err(|e| ToolError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ToolError::Call {
                tool: WEB_SEARCH.to_string(),
                message: format!("HTTP {status}: {body}"),
            });
        }
        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| ToolError::Protocol(format!("invalid search response: {e}")))?;

        let results: Vec<serde_json::Value> = parsed
            .results
            .into_iter()
            .map(|hit| {
                json!({
                    "title": hit.title.unwrap_or_default(),
                    "url": hit.url,
                    "content": hit.text.unwrap_or_default(),
                    "publishedDate": hit.published_date,
                })
            })
            .collect();
        Ok(json!({ "results": results }))
    }
}
