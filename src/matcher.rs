use strsim::levenshtein;

/// Levenshtein distance between two strings, ignoring case.
/// Counts Unicode scalar values, so accented characters cost a single edit.
pub fn edit_distance(a: &str, b: &str) -> usize {
    levenshtein(&a.to_lowercase(), &b.to_lowercase())
}

/// Normalized similarity in [0, 1]: 1.0 for strings equal up to case,
/// decreasing as the edit distance grows relative to the longer string.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a_len = a.chars().count();
    let b_len = b.chars().count();

    let (longer, shorter, longer_len) = if a_len > b_len {
        (a, b, a_len)
    } else {
        (b, a, b_len)
    };

    if longer_len == 0 {
        return 1.0;
    }

    let distance = edit_distance(longer, shorter);
    // Lowercasing can expand a few characters; keep the ratio non-negative.
    (longer_len as f64 - distance as f64).max(0.0) / longer_len as f64
}

/// Similarity between a title and an answer as a percentage, rounded to two
/// decimals (half away from zero).
pub fn title_match_percentage(title: &str, answer: &str) -> f64 {
    let percentage = similarity(&title.to_lowercase(), &answer.to_lowercase()) * 100.0;
    (percentage * 100.0).round() / 100.0
}

/// Check if an answer is close enough to the title
pub fn is_title_match(title: &str, answer: &str, threshold: f64) -> bool {
    title_match_percentage(title, answer) >= threshold
}

/// Check if an artist name appears inside the answer, ignoring case.
/// The answer must contain the whole name: "beatles" does not find "The Beatles".
/// An empty name is contained in every answer.
pub fn artist_in_answer(artist: &str, answer: &str) -> bool {
    answer.to_lowercase().contains(&artist.to_lowercase())
}
