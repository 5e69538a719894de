use crate::page::types::AnswerOption;
use crate::state::Thresholds;

use super::{ResolutionResult, ResolutionSource};

/// Score every candidate against a snippet, aligned with `candidates`.
///
/// Verbatim appearance of the whole option earns `verbatim_points`; each
/// token of at least `min_token_len` chars found in the snippet earns
/// `token_points`. Matching is case-insensitive.
pub fn score(snippet: &str, candidates: &[AnswerOption], thresholds: &Thresholds) -> Vec<u32> {
    let snippet = snippet.to_lowercase();
    candidates
        .iter()
        .map(|candidate| {
            let text = candidate.text.trim().to_lowercase();
            if text.is_empty() {
                return 0;
            }
            let mut points = 0;
            if snippet.contains(&text) {
                points += thresholds.verbatim_points;
            }
            for token in text.split_whitespace() {
                if token.chars().count() >= thresholds.min_token_len && snippet.contains(token) {
                    points += thresholds.token_points;
                }
            }
            points
        })
        .collect()
}

/// Highest-scoring candidate with confidence `min(score / scale, 1)`.
/// Ties go to the earlier option; no points at all is no result.
pub fn best_candidate(
    snippet: &str,
    candidates: &[AnswerOption],
    thresholds: &Thresholds,
) -> Option<ResolutionResult> {
    let scores = score(snippet, candidates, thresholds);
    let (index, best) = scores
        .iter()
        .copied()
        .enumerate()
        .fold(None, |best: Option<(usize, u32)>, (i, s)| match best {
            Some((_, b)) if s <= b => best,
            _ => Some((i, s)),
        })?;
    if best == 0 {
        return None;
    }

    Some(ResolutionResult {
        answer: Some(candidates[index].clone()),
        confidence: (best as f32 / thresholds.score_scale).min(1.0),
        source: ResolutionSource::Search,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::types::OptionHandle;

    fn options(texts: &[&str]) -> Vec<AnswerOption> {
        texts
            .iter()
            .enumerate()
            .map(|(index, t)| AnswerOption {
                text: t.to_string(),
                handle: OptionHandle {
                    selector: "button",
                    index,
                },
            })
            .collect()
    }

    #[test]
    fn test_verbatim_beats_absent() {
        let candidates = options(&["Paris", "Rome"]);
        let scores = score("the capital of France is Paris", &candidates, &Thresholds::default());
        assert!(scores[0] > scores[1]);
        assert_eq!(scores, vec![12, 0]);

        let result = best_candidate("the capital of France is Paris", &candidates, &Thresholds::default())
            .unwrap();
        assert_eq!(result.answer.unwrap().text, "Paris");
        assert!(result.confidence <= 1.0);
        assert_eq!(result.source, ResolutionSource::Search);
    }

    #[test]
    fn test_token_points_only() {
        let candidates = options(&["Pacific Ocean", "Indian Sea"]);
        // "pacific" found, "ocean" found, full phrase absent
        let scores = score("the pacific is the largest ocean", &candidates, &Thresholds::default());
        assert_eq!(scores, vec![4, 0]);
        let result = best_candidate("the pacific is the largest ocean", &candidates, &Thresholds::default())
            .unwrap();
        assert!((result.confidence - 0.4).abs() < 1e-6);
    }

    #[test]
    fn test_short_tokens_ignored() {
        let candidates = options(&["Au", "Ag"]);
        // verbatim hit only, two-letter tokens earn nothing extra
        let scores = score("gold has the symbol au", &candidates, &Thresholds::default());
        assert_eq!(scores, vec![10, 0]);
    }

    #[test]
    fn test_ties_keep_first_option() {
        let candidates = options(&["Mercury", "Venus"]);
        let result = best_candidate("mercury and venus are inner planets", &candidates, &Thresholds::default())
            .unwrap();
        assert_eq!(result.answer.unwrap().handle.index, 0);
    }

    #[test]
    fn test_no_points_no_result() {
        let candidates = options(&["Mercury", "Venus"]);
        assert!(best_candidate("nothing relevant here", &candidates, &Thresholds::default()).is_none());
        assert!(best_candidate("anything", &[], &Thresholds::default()).is_none());
    }
}
