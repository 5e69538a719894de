pub mod http;
pub mod providers;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Leading words dropped from the query; encyclopedic sources index
/// declarative phrasing.
const INTERROGATIVES: &[&str] = &["what", "which", "who", "where", "when", "how", "why"];

/// Wrap width for html2text; large enough that snippets stay on one line.
const SNIPPET_WIDTH: usize = 10_000;

#[derive(Debug, Error)]
pub enum LookupError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected HTTP status {0}")]
    Status(u16),
    #[error("invalid response JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    #[error("invalid endpoint URL: {0}")]
    Url(String),
}

/// Network transport: fetch a URL and hand back the body as text.
#[async_trait]
pub trait TextFetcher: Send + Sync {
    async fn fetch_text(&self, url: &str) -> Result<String, LookupError>;
}

/// One best-effort snippet source.
#[async_trait]
pub trait LookupProvider: Send + Sync {
    fn name(&self) -> &str;

    /// `Ok(None)` means the source had nothing for this query.
    async fn lookup(&self, query: &str) -> Result<Option<String>, LookupError>;
}

/// Ordered provider chain. The first non-empty snippet wins; failures are
/// logged and the next provider is tried.
pub struct LookupChain {
    providers: Vec<Box<dyn LookupProvider>>,
    timeout: Duration,
}

impl LookupChain {
    pub fn new(timeout: Duration) -> Self {
        Self {
            providers: Vec::new(),
            timeout,
        }
    }

    #[must_use]
    pub fn with_provider(mut self, provider: Box<dyn LookupProvider>) -> Self {
        self.providers.push(provider);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Look up evidence for a question. Never fails: exhaustion is `None`.
    pub async fn lookup(&self, question: &str) -> Option<String> {
        let query = normalize_query(question);
        if query.is_empty() {
            return None;
        }
        debug!(query = %query, providers = self.providers.len(), "lookup started");

        for provider in &self.providers {
            let outcome = match tokio::time::timeout(self.timeout, provider.lookup(&query)).await {
                Ok(result) => result,
                Err(_) => Err(LookupError::Timeout(self.timeout)),
            };

            match outcome {
                Ok(Some(raw)) => {
                    let snippet = clean_snippet(&raw);
                    if snippet.is_empty() {
                        debug!(provider = provider.name(), "provider returned blank text");
                        continue;
                    }
                    info!(
                        provider = provider.name(),
                        snippet_len = snippet.len(),
                        "snippet found"
                    );
                    return Some(snippet);
                }
                Ok(None) => debug!(provider = provider.name(), "no snippet"),
                Err(e) => warn!(provider = provider.name(), error = %e, "lookup failed"),
            }
        }

        debug!(query = %query, "all providers exhausted");
        None
    }
}

/// Strip trailing punctuation and one leading interrogative word.
pub fn normalize_query(question: &str) -> String {
    let compact = question.split_whitespace().collect::<Vec<_>>().join(" ");
    let trimmed = compact.trim_end_matches(|c: char| matches!(c, '?' | '!' | '.' | ',' | ';' | ':'));

    let mut words = trimmed.split(' ').filter(|w| !w.is_empty());
    let Some(first) = words.next() else {
        return String::new();
    };
    let rest: Vec<&str> = words.collect();
    if INTERROGATIVES.contains(&first.to_lowercase().as_str()) && !rest.is_empty() {
        rest.join(" ")
    } else {
        trimmed.to_string()
    }
}

fn clean_snippet(raw: &str) -> String {
    let text = html2text::from_read(raw.as_bytes(), SNIPPET_WIDTH)
        .unwrap_or_else(|_| raw.to_string());
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    enum Behaviour {
        Fail,
        Empty,
        Blank,
        Slow,
        Text(&'static str),
    }

    struct StubProvider {
        name: &'static str,
        behaviour: Behaviour,
        calls: Arc<AtomicUsize>,
        last_query: Arc<std::sync::Mutex<Option<String>>>,
    }

    impl StubProvider {
        fn boxed(name: &'static str, behaviour: Behaviour, calls: &Arc<AtomicUsize>) -> Box<Self> {
            Box::new(Self {
                name,
                behaviour,
                calls: calls.clone(),
                last_query: Arc::new(std::sync::Mutex::new(None)),
            })
        }
    }

    #[async_trait]
    impl LookupProvider for StubProvider {
        fn name(&self) -> &str {
            self.name
        }

        async fn lookup(&self, query: &str) -> Result<Option<String>, LookupError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_query.lock().unwrap() = Some(query.to_string());
            match self.behaviour {
                Behaviour::Fail => Err(LookupError::Status(503)),
                Behaviour::Empty => Ok(None),
                Behaviour::Blank => Ok(Some("   ".to_string())),
                Behaviour::Slow => {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    Ok(Some("too late".to_string()))
                }
                Behaviour::Text(t) => Ok(Some(t.to_string())),
            }
        }
    }

    #[test]
    fn test_normalize_query() {
        assert_eq!(normalize_query("What is the capital of France?"), "is the capital of France");
        assert_eq!(normalize_query("  WHO   painted the Mona Lisa?!"), "painted the Mona Lisa");
        assert_eq!(normalize_query("Largest planet."), "Largest planet");
        assert_eq!(normalize_query("Why?"), "Why");
        assert_eq!(normalize_query("???"), "");
    }

    #[tokio::test]
    async fn test_first_usable_snippet_wins() {
        let calls = Arc::new(AtomicUsize::new(0));
        let last_calls = Arc::new(AtomicUsize::new(0));
        let chain = LookupChain::new(Duration::from_secs(1))
            .with_provider(StubProvider::boxed("broken", Behaviour::Fail, &calls))
            .with_provider(StubProvider::boxed("empty", Behaviour::Empty, &calls))
            .with_provider(StubProvider::boxed("blank", Behaviour::Blank, &calls))
            .with_provider(StubProvider::boxed(
                "good",
                Behaviour::Text("The capital of France is <b>Paris</b>."),
                &calls,
            ))
            .with_provider(StubProvider::boxed("unused", Behaviour::Text("nope"), &last_calls));

        let snippet = chain.lookup("What is the capital of France?").await.unwrap();
        assert!(snippet.contains("Paris"));
        assert!(!snippet.contains("<b>"));
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert_eq!(last_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_all_providers_fail() {
        let calls = Arc::new(AtomicUsize::new(0));
        let chain = LookupChain::new(Duration::from_secs(1))
            .with_provider(StubProvider::boxed("a", Behaviour::Fail, &calls))
            .with_provider(StubProvider::boxed("b", Behaviour::Empty, &calls));
        assert!(chain.lookup("Who wrote Hamlet?").await.is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_timeout_moves_to_next_provider() {
        let calls = Arc::new(AtomicUsize::new(0));
        let chain = LookupChain::new(Duration::from_millis(20))
            .with_provider(StubProvider::boxed("slow", Behaviour::Slow, &calls))
            .with_provider(StubProvider::boxed("fast", Behaviour::Text("Hamlet by Shakespeare"), &calls));
        let snippet = chain.lookup("Who wrote Hamlet?").await.unwrap();
        assert_eq!(snippet, "Hamlet by Shakespeare");
    }

    #[tokio::test]
    async fn test_provider_receives_normalized_query() {
        let calls = Arc::new(AtomicUsize::new(0));
        let provider = StubProvider::boxed("probe", Behaviour::Empty, &calls);
        let last_query = provider.last_query.clone();
        let chain = LookupChain::new(Duration::from_secs(1)).with_provider(provider);
        chain.lookup("Which element has symbol Au?").await;
        assert_eq!(
            last_query.lock().unwrap().as_deref(),
            Some("element has symbol Au")
        );
    }
}
