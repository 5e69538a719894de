/// Score how well `candidate` matches `target`, case-insensitively.
///
/// First applicable rule wins:
/// 1. equal strings score 1.0
/// 2. one containing the other scores 0.8
/// 3. otherwise token overlap: a target token is covered when some candidate
///    token contains it or is contained by it; the covered count is divided by
///    the larger of the two token counts.
///
/// Substrings outrank loose overlap on purpose: short quiz answers ("Paris")
/// often sit inside longer phrasings ("the city of Paris").
pub fn similarity(target: &str, candidate: &str) -> f32 {
    let target = target.trim().to_lowercase();
    let candidate = candidate.trim().to_lowercase();
    if target.is_empty() || candidate.is_empty() {
        return 0.0;
    }

    if target == candidate {
        return 1.0;
    }
    if target.contains(&candidate) || candidate.contains(&target) {
        return 0.8;
    }

    let target_tokens: Vec<&str> = target.split_whitespace().collect();
    let candidate_tokens: Vec<&str> = candidate.split_whitespace().collect();
    let covered = target_tokens
        .iter()
        .filter(|t| {
            candidate_tokens
                .iter()
                .any(|c| c.contains(**t) || t.contains(*c))
        })
        .count();

    let denominator = target_tokens.len().max(candidate_tokens.len());
    (covered as f32 / denominator as f32).min(1.0)
}
