pub mod scoring;

use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use tracing::{debug, info, warn};

use crate::knowledge::KnowledgeBase;
use crate::lookup::LookupChain;
use crate::page::types::{AnswerOption, Question};
use crate::state::Thresholds;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionSource {
    Knowledge,
    Search,
    None,
}

/// Decision for one question. `answer`, when present, is always one of the
/// options the question was resolved against.
#[derive(Debug, Clone)]
pub struct ResolutionResult {
    pub answer: Option<AnswerOption>,
    pub confidence: f32,
    pub source: ResolutionSource,
}

impl ResolutionResult {
    pub fn none() -> Self {
        Self {
            answer: None,
            confidence: 0.0,
            source: ResolutionSource::None,
        }
    }
}

/// Combines the knowledge base with external lookups.
pub struct Resolver {
    knowledge: KnowledgeBase,
    lookup: LookupChain,
    thresholds: Thresholds,
}

impl Resolver {
    pub fn new(knowledge: KnowledgeBase, lookup: LookupChain, thresholds: Thresholds) -> Self {
        Self {
            knowledge,
            lookup,
            thresholds,
        }
    }

    /// Resolve a question against its options. Always completes.
    ///
    /// A knowledge match above `knowledge_trust` is returned without any
    /// lookup. Otherwise the search result is used when it reaches
    /// `search_floor`; failing that the knowledge result stands, whatever its
    /// confidence.
    pub async fn resolve(&self, question: &Question, candidates: &[AnswerOption]) -> ResolutionResult {
        if candidates.is_empty() {
            return ResolutionResult::none();
        }

        let local = self.knowledge.match_question(&question.text, candidates);
        if local.confidence > self.thresholds.knowledge_trust {
            info!(
                confidence = local.confidence,
                "knowledge match trusted, skipping lookup"
            );
            return local;
        }

        let search = AssertUnwindSafe(self.search(question, candidates))
            .catch_unwind()
            .await
            .unwrap_or_else(|_| {
                warn!("search track panicked, treating as no result");
                None
            });

        match search {
            Some(found) if found.confidence >= self.thresholds.search_floor => {
                info!(confidence = found.confidence, "search result accepted");
                return found;
            }
            Some(weak) => debug!(
                confidence = weak.confidence,
                "search result below floor, falling back to knowledge"
            ),
            None => debug!("no search result, falling back to knowledge"),
        }

        local
    }

    async fn search(&self, question: &Question, candidates: &[AnswerOption]) -> Option<ResolutionResult> {
        if self.lookup.is_empty() {
            return None;
        }
        let snippet = self.lookup.lookup(&question.text).await?;
        scoring::best_candidate(&snippet, candidates, &self.thresholds)
    }
}
