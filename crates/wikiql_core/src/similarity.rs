use std::collections::HashSet;

const MIN_WORD_LEN: usize = 4;

/// Jaccard index over the sets of lowercase words longer than three
/// characters. Two texts with no such words score 0.
pub fn compute_similarity(first: &str, second: &str) -> f64 {
    let left = word_set(first);
    let right = word_set(second);
    let union = left.union(&right).count();
    if union == 0 {
        return 0.0;
    }
    let shared = left.intersection(&right).count();
    shared as f64 / union as f64
}

fn word_set(text: &str) -> HashSet<String> {
    let cleaned = text
        .to_lowercase()
        .chars()
        .filter(|ch| ch.is_ascii_alphanumeric() || *ch == '_' || ch.is_whitespace())
        .collect::<String>();
    cleaned
        .split_whitespace()
        .filter(|word| word.chars().count() >= MIN_WORD_LEN)
        .map(str::to_string)
        .collect()
}

/// Score every candidate against `target`, keep those strictly above
/// `threshold` and order them best first. Ties keep their input order.
pub fn rank_similar<K, T, I>(target: &str, candidates: I, threshold: f64) -> Vec<(K, f64)>
where
    I: IntoIterator<Item = (K, T)>,
    T: AsRef<str>,
{
    let mut ranked = candidates
        .into_iter()
        .map(|(key, text)| {
            let score = compute_similarity(target, text.as_ref());
            (key, score)
        })
        .filter(|(_, score)| *score > threshold)
        .collect::<Vec<_>>();
    ranked.sort_by(|left, right| right.1.total_cmp(&left.1));
    ranked
}
