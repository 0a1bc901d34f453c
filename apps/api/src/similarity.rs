//! Brute-force cosine ranking over in-memory embeddings.

/// A candidate paired with its similarity to the query.
#[derive(Debug, Clone)]
pub struct Scored<T> {
    pub item: T,
    pub score: f32,
}

/// Cosine similarity in [-1, 1]. Returns 0.0 for empty, zero-magnitude,
/// or mismatched-length vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;

    for (x, y) in a.iter().zip(b) {
        let (x, y) = (*x as f64, *y as f64);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom == 0.0 {
        0.0
    } else {
        (dot / denom) as f32
    }
}

/// Scores every candidate with a non-empty embedding against `query`,
/// sorts descending and keeps the first `k`. Ties keep input order.
pub fn rank_top_k<T, F>(
    query: &[f32],
    candidates: Vec<T>,
    embedding_of: F,
    k: usize,
) -> Vec<Scored<T>>
where
    F: Fn(&T) -> &[f32],
{
    let mut scored: Vec<Scored<T>> = candidates
        .into_iter()
        .filter(|c| !embedding_of(c).is_empty())
        .map(|item| {
            let score = cosine_similarity(query, embedding_of(&item));
            Scored { item, score }
        })
        .collect();

    // sort_by is stable
    scored.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    scored.truncate(k);
    scored
}

/// Rounds a score for display.
pub fn round_score(score: f32, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (score as f64 * factor).round() / factor
}
