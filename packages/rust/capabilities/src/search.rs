//! Web search over the Serper API.

use chrono::{Duration, Local, NaiveDate};
use postcrew_shared::{DateRange, PostcrewError, Result, SearchConfig, optional_key};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::build_client;

/// Maximum number of organic results included in the formatted block.
const MAX_RESULTS: usize = 5;

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    q: &'a str,
    gl: &'static str,
    hl: &'static str,
    num: usize,
    #[serde(rename = "timePeriod", skip_serializing_if = "Option::is_none")]
    time_period: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    organic: Vec<OrganicResult>,
}

#[derive(Debug, Deserialize)]
struct OrganicResult {
    title: Option<String>,
    snippet: Option<String>,
    link: Option<String>,
}

/// Serper `timePeriod` value for a date range, relative to `today`.
pub fn time_period(range: DateRange, today: NaiveDate) -> Option<String> {
    let custom = |days: i64| {
        let start = today - Duration::days(days);
        format!(
            "custom:{}:{}",
            start.format("%Y-%m-%d"),
            today.format("%Y-%m-%d")
        )
    };

    match range {
        DateRange::AllTime => None,
        DateRange::LastWeek => Some(custom(7)),
        DateRange::LastMonth => Some("m1".to_string()),
        DateRange::LastYear => Some("y1".to_string()),
        DateRange::Months(n) => Some(custom(30 * i64::from(n))),
    }
}

/// Web search shim. Never fails once constructed.
#[derive(Debug, Clone)]
pub struct WebSearch {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
}

impl WebSearch {
    pub fn new(config: &SearchConfig, api_key: Option<String>) -> Result<Self> {
        Ok(Self {
            client: build_client(config.timeout_secs)?,
            endpoint: config.endpoint.clone(),
            api_key,
        })
    }

    /// Build from config, reading the key from the configured env var.
    pub fn from_config(config: &SearchConfig) -> Result<Self> {
        let api_key = optional_key(&config.api_key_env);
        if api_key.is_none() {
            warn!(
                var = %config.api_key_env,
                "search API key not set, web search will return mock data"
            );
        }
        Self::new(config, api_key)
    }

    /// Search the web for `query`, restricted to `range`.
    ///
    /// Returns formatted results, the mock block when no key is configured,
    /// or a one-line explanation when nothing usable came back.
    #[instrument(skip_all, fields(query = %query, range = %range))]
    pub async fn search(&self, query: &str, range: DateRange) -> String {
        let Some(api_key) = self.api_key.as_deref() else {
            warn!("no search API key, returning mock data");
            return mock_results(query);
        };

        match self.request(query, range, api_key).await {
            Ok(results) if results.is_empty() => {
                info!("search returned no results");
                format!("No relevant search results were found for '{query}'.")
            }
            Ok(results) => {
                debug!(count = results.len(), "search results received");
                format_results(&results)
            }
            Err(e) => {
                warn!(error = %e, "search request failed");
                format!("The search for '{query}' failed due to a network or API error.")
            }
        }
    }

    async fn request(
        &self,
        query: &str,
        range: DateRange,
        api_key: &str,
    ) -> Result<Vec<OrganicResult>> {
        let body = SearchRequest {
            q: query,
            gl: "us",
            hl: "en",
            num: MAX_RESULTS,
            time_period: time_period(range, Local::now().date_naive()),
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header("X-API-KEY", api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| PostcrewError::Network(format!("{}: {e}", self.endpoint)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PostcrewError::Network(format!(
                "{}: HTTP {status}",
                self.endpoint
            )));
        }

        let parsed: SearchResponse = response.json().await.map_err(|e| {
            PostcrewError::Network(format!("{}: invalid response: {e}", self.endpoint))
        })?;

        let mut organic = parsed.organic;
        organic.truncate(MAX_RESULTS);
        Ok(organic)
    }
}

fn format_results(results: &[OrganicResult]) -> String {
    results
        .iter()
        .map(|item| {
            format!(
                "Title: {}\nSnippet: {}\nURL: {}\n\n",
                item.title.as_deref().unwrap_or("No title"),
                item.snippet.as_deref().unwrap_or("No snippet"),
                item.link.as_deref().unwrap_or("#"),
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn mock_results(query: &str) -> String {
    format!(
        "Mock search results for '{query}':\n\n\
         1. Title: {query} - An Overview\n\
         Snippet: This is a mock result since no API key was provided. In a real implementation, this would show actual search results.\n\
         URL: https://example.com\n\n\
         2. Title: Recent Developments in {query}\n\
         Snippet: Mock data showing how search results would appear with proper API configuration.\n\
         URL: https://example.com\n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer) -> SearchConfig {
        SearchConfig {
            endpoint: format!("{}/search", server.uri()),
            timeout_secs: 2,
            ..SearchConfig::default()
        }
    }

    #[test]
    fn time_periods() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 31).unwrap();
        assert_eq!(time_period(DateRange::AllTime, today), None);
        assert_eq!(
            time_period(DateRange::LastWeek, today).as_deref(),
            Some("custom:2024-03-24:2024-03-31")
        );
        assert_eq!(time_period(DateRange::LastMonth, today).as_deref(), Some("m1"));
        assert_eq!(time_period(DateRange::LastYear, today).as_deref(), Some("y1"));
        assert_eq!(
            time_period(DateRange::Months(2), today).as_deref(),
            Some("custom:2024-01-31:2024-03-31")
        );
    }

    #[tokio::test]
    async fn no_key_returns_mock_block() {
        let search = WebSearch::new(&SearchConfig::default(), None).unwrap();
        let text = search.search("Edge Computing", DateRange::AllTime).await;
        assert!(text.starts_with("Mock search results for 'Edge Computing':"));
        assert!(text.contains("Recent Developments in Edge Computing"));
    }

    #[tokio::test]
    async fn formats_organic_results() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("X-API-KEY", "test-key"))
            .and(body_partial_json(json!({
                "q": "rust async",
                "gl": "us",
                "hl": "en",
                "num": 5,
                "timePeriod": "m1"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "organic": [
                    {"title": "Tokio", "snippet": "A runtime", "link": "https://tokio.rs"},
                    {"title": "No link here"}
                ]
            })))
            .mount(&server)
            .await;

        let search = WebSearch::new(&config_for(&server), Some("test-key".into())).unwrap();
        let text = search.search("rust async", DateRange::LastMonth).await;

        assert_eq!(
            text,
            "Title: Tokio\nSnippet: A runtime\nURL: https://tokio.rs\n\n\n\
             Title: No link here\nSnippet: No snippet\nURL: #\n\n"
        );
    }

    #[tokio::test]
    async fn caps_results_at_five() {
        let server = MockServer::start().await;
        let organic: Vec<_> = (0..8)
            .map(|i| json!({"title": format!("r{i}"), "snippet": "s", "link": "l"}))
            .collect();
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "organic": organic })))
            .mount(&server)
            .await;

        let search = WebSearch::new(&config_for(&server), Some("k".into())).unwrap();
        let text = search.search("many", DateRange::AllTime).await;
        assert_eq!(text.matches("Title: ").count(), 5);
        assert!(!text.contains("r5"));
    }

    #[tokio::test]
    async fn empty_results_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"searchParameters": {}})))
            .mount(&server)
            .await;

        let search = WebSearch::new(&config_for(&server), Some("k".into())).unwrap();
        let text = search.search("nothing", DateRange::AllTime).await;
        assert_eq!(text, "No relevant search results were found for 'nothing'.");
    }

    #[tokio::test]
    async fn http_error_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let search = WebSearch::new(&config_for(&server), Some("bad".into())).unwrap();
        let text = search.search("denied", DateRange::AllTime).await;
        assert_eq!(
            text,
            "The search for 'denied' failed due to a network or API error."
        );
    }
}
