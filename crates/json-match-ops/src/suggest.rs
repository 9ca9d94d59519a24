use strsim::normalized_levenshtein;

/// Minimum similarity for a key to be offered as a "did you mean" hint.
pub const SUGGESTION_THRESHOLD: f64 = 0.75;

/// Closest candidate to `missing`, if any is similar enough.
pub fn closest_key<'a>(missing: &str, candidates: impl Iterator<Item = &'a String>) -> Option<String> {
    candidates
        .map(|candidate| (candidate.as_str(), normalized_levenshtein(missing, candidate)))
        .filter(|(_, score)| *score >= SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(key, _)| key.to_string())
}
