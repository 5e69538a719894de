mod action;
mod host;
mod knowledge;
mod lookup;
mod page;
mod resolve;
mod state;
mod watch;

use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use action::ActionExecutor;
use host::{LogReporter, SnapshotSelector};
use knowledge::KnowledgeBase;
use lookup::http::HttpFetcher;
use lookup::providers::{DuckDuckGoProvider, WikipediaProvider};
use lookup::LookupChain;
use resolve::Resolver;
use state::EngineConfig;
use watch::file::{FileDocument, FileMutations};
use watch::{ChangeDetector, DocumentSource, LoopTiming};

// One execution context: mutation handling and lookups interleave cooperatively.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Load env
    let _ = dotenv::dotenv();
    let config = EngineConfig::from_env()?;

    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .init();

    // Knowledge base
    let mut knowledge = KnowledgeBase::builtin(config.thresholds.min_similarity)?;
    if let Some(path) = &config.rules_path {
        knowledge.load_file(path)?;
    }
    info!(rules = knowledge.len(), "Knowledge base initialized");

    // External lookups, tried in order
    let fetcher = Arc::new(HttpFetcher::new(
        config.lookup_timeout,
        config.request_interval,
    )?);
    let lookup = LookupChain::new(config.lookup_timeout)
        .with_provider(Box::new(WikipediaProvider::new(fetcher.clone())))
        .with_provider(Box::new(DuckDuckGoProvider::new(fetcher)));
    info!(
        timeout_secs = config.lookup_timeout.as_secs(),
        "Lookup chain initialized"
    );

    let resolver = Arc::new(Resolver::new(knowledge, lookup, config.thresholds));

    let document: Arc<dyn DocumentSource> = Arc::new(FileDocument::new(&config.document));
    let executor = ActionExecutor::new(
        Arc::new(LogReporter),
        Arc::new(SnapshotSelector::new(document.clone())),
        config.action_delay,
    );

    let detector = ChangeDetector::new(
        document,
        Arc::new(FileMutations::new(&config.document)),
        resolver,
        executor,
        config.policy(),
        LoopTiming {
            debounce: config.debounce,
            settle_delay: config.settle_delay,
        },
        config.continuous,
    );

    info!(document = ?config.document, "Starting quiz watcher...");
    let mut handle = detector.start()?;

    let summary = tokio::select! {
        summary = handle.join() => summary?,
        _ = tokio::signal::ctrl_c() => {
            info!(state = ?handle.state(), "Interrupt received, stopping");
            handle.stop();
            handle.join().await?
        }
    };

    info!(
        questions = summary.questions_seen,
        resolutions = summary.resolutions,
        selections = summary.selections,
        "Quiz watcher finished"
    );
    Ok(())
}
