use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Url;
use serde_json::Value;

use super::{LookupError, LookupProvider, TextFetcher};

pub const WIKIPEDIA_API: &str = "https://en.wikipedia.org/w/api.php";
pub const DUCKDUCKGO_API: &str = "https://api.duckduckgo.com/";

/// Intro extract of the best Wikipedia search hit.
pub struct WikipediaProvider {
    fetcher: Arc<dyn TextFetcher>,
    endpoint: String,
}

impl WikipediaProvider {
    pub fn new(fetcher: Arc<dyn TextFetcher>) -> Self {
        Self {
            fetcher,
            endpoint: WIKIPEDIA_API.to_string(),
        }
    }

    fn url(&self, query: &str) -> Result<Url, LookupError> {
        Url::parse_with_params(
            &self.endpoint,
            &[
                ("action", "query"),
                ("format", "json"),
                ("prop", "extracts"),
                ("exintro", "1"),
                ("explaintext", "1"),
                ("redirects", "1"),
                ("generator", "search"),
                ("gsrsearch", query),
                ("gsrlimit", "1"),
            ],
        )
        .map_err(|e| LookupError::Url(e.to_string()))
    }
}

#[async_trait]
impl LookupProvider for WikipediaProvider {
    fn name(&self) -> &str {
        "wikipedia"
    }

    async fn lookup(&self, query: &str) -> Result<Option<String>, LookupError> {
        let url = self.url(query)?;
        let body = self.fetcher.fetch_text(url.as_str()).await?;
        let json: Value = serde_json::from_str(&body)?;
        Ok(wikipedia_extract(&json))
    }
}

/// `query.pages.*.extract`, first non-empty.
fn wikipedia_extract(json: &Value) -> Option<String> {
    json["query"]["pages"]
        .as_object()?
        .values()
        .filter_map(|page| page["extract"].as_str())
        .map(str::trim)
        .find(|text| !text.is_empty())
        .map(str::to_string)
}

/// DuckDuckGo instant answer: abstract, then definition, then the first
/// related topic.
pub struct DuckDuckGoProvider {
    fetcher: Arc<dyn TextFetcher>,
    endpoint: String,
}

impl DuckDuckGoProvider {
    pub fn new(fetcher: Arc<dyn TextFetcher>) -> Self {
        Self {
            fetcher,
            endpoint: DUCKDUCKGO_API.to_string(),
        }
    }

    fn url(&self, query: &str) -> Result<Url, LookupError> {
        Url::parse_with_params(
            &self.endpoint,
            &[
                ("q", query),
                ("format", "json"),
                ("no_html", "1"),
                ("skip_disambig", "1"),
            ],
        )
        .map_err(|e| LookupError::Url(e.to_string()))
    }
}

#[async_trait]
impl LookupProvider for DuckDuckGoProvider {
    fn name(&self) -> &str {
        "duckduckgo"
    }

    async fn lookup(&self, query: &str) -> Result<Option<String>, LookupError> {
        let url = self.url(query)?;
        let body = self.fetcher.fetch_text(url.as_str()).await?;
        let json: Value = serde_json::from_str(&body)?;
        Ok(duckduckgo_extract(&json))
    }
}

fn duckduckgo_extract(json: &Value) -> Option<String> {
    ["AbstractText", "Abstract", "Definition"]
        .iter()
        .filter_map(|field| json[*field].as_str())
        .chain(json["RelatedTopics"].get(0).and_then(|t| t["Text"].as_str()))
        .map(str::trim)
        .find(|text| !text.is_empty())
        .map(str::to_string)
}
