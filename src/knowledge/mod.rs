mod rules;
pub mod similarity;

use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use tracing::{debug, info};

use crate::page::types::AnswerOption;
use crate::resolve::{ResolutionResult, ResolutionSource};
use similarity::similarity;

/// Question substrings mapped to a curated answer.
#[derive(Debug, Clone, Deserialize)]
pub struct KnowledgeRule {
    pub patterns: Vec<String>,
    pub canonical_answer: String,
    pub confidence: f32,
}

impl KnowledgeRule {
    fn validate(&self) -> Result<()> {
        if self.patterns.iter().all(|p| p.trim().is_empty()) {
            bail!("rule for '{}' has no patterns", self.canonical_answer);
        }
        if self.canonical_answer.trim().is_empty() {
            bail!("rule has an empty canonical answer");
        }
        if !(self.confidence > 0.0 && self.confidence <= 1.0) {
            bail!(
                "rule for '{}' has confidence {} outside (0, 1]",
                self.canonical_answer,
                self.confidence
            );
        }
        Ok(())
    }

    fn matches(&self, question_lower: &str) -> bool {
        self.patterns
            .iter()
            .any(|p| !p.is_empty() && question_lower.contains(p.as_str()))
    }
}

/// Read-only rule table built once at startup.
pub struct KnowledgeBase {
    rules: Vec<KnowledgeRule>,
    min_similarity: f32,
}

impl KnowledgeBase {
    pub fn new(rules: Vec<KnowledgeRule>, min_similarity: f32) -> Result<Self> {
        let mut kb = Self {
            rules: Vec::with_capacity(rules.len()),
            min_similarity,
        };
        kb.extend(rules)?;
        Ok(kb)
    }

    /// The built-in table, validated like any loaded rule set.
    pub fn builtin(min_similarity: f32) -> Result<Self> {
        let rules = rules::BUILTIN_RULES
            .iter()
            .map(|(patterns, answer, confidence)| KnowledgeRule {
                patterns: patterns.iter().map(|p| p.to_string()).collect(),
                canonical_answer: answer.to_string(),
                confidence: *confidence,
            })
            .collect();
        Self::new(rules, min_similarity).context("built-in knowledge rules are invalid")
    }

    /// Append rules from a JSON array file.
    pub fn load_file(&mut self, path: &Path) -> Result<usize> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read rules file {:?}", path))?;
        let rules: Vec<KnowledgeRule> =
            serde_json::from_str(&raw).context("Failed to parse rules JSON")?;
        let count = rules.len();
        self.extend(rules)?;
        info!(count, path = ?path, "knowledge rules loaded");
        Ok(count)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    fn extend(&mut self, rules: Vec<KnowledgeRule>) -> Result<()> {
        for rule in &rules {
            rule.validate()?;
        }
        // Patterns are stored lowercased for case-insensitive containment.
        self.rules.extend(rules.into_iter().map(|mut rule| {
            for p in &mut rule.patterns {
                *p = p.trim().to_lowercase();
            }
            rule
        }));
        Ok(())
    }

    /// Match the question against every rule and map the winning canonical
    /// answer onto one of `candidates`.
    pub fn match_question(&self, question: &str, candidates: &[AnswerOption]) -> ResolutionResult {
        let question_lower = question.to_lowercase();
        let mut best: Option<(&AnswerOption, f32)> = None;

        for rule in self.rules.iter().filter(|r| r.matches(&question_lower)) {
            let Some((candidate, sim)) = best_candidate(&rule.canonical_answer, candidates) else {
                continue;
            };
            if sim <= self.min_similarity {
                debug!(
                    canonical = %rule.canonical_answer,
                    similarity = sim,
                    "rule matched but no candidate is close enough"
                );
                continue;
            }
            let confidence = rule.confidence * sim;
            if best.map_or(true, |(_, c)| confidence > c) {
                best = Some((candidate, confidence));
            }
        }

        match best {
            Some((answer, confidence)) => ResolutionResult {
                answer: Some(answer.clone()),
                confidence,
                source: ResolutionSource::Knowledge,
            },
            None => ResolutionResult::none(),
        }
    }
}

/// Highest-similarity candidate; ties keep the earlier one.
fn best_candidate<'a>(canonical: &str, candidates: &'a [AnswerOption]) -> Option<(&'a AnswerOption, f32)> {
    let mut best: Option<(&AnswerOption, f32)> = None;
    for candidate in candidates {
        let sim = similarity(canonical, &candidate.text);
        if best.map_or(true, |(_, s)| sim > s) {
            best = Some((candidate, sim));
        }
    }
    best
}
