//! Display helpers for ratios and rankings.

/// `0.4237` → `"42%"`. Non-finite input renders as `"n/a"`.
pub fn percent(ratio: f64) -> String {
    percent_with(ratio, 0)
}

/// Like [`percent`] with a fixed number of decimals.
pub fn percent_with(ratio: f64, decimals: usize) -> String {
    if !ratio.is_finite() {
        return "n/a".to_string();
    }
    format!("{:.*}%", decimals, ratio * 100.0)
}

/// `87` → `"87th"`, `1` → `"1st"`, `12` → `"12th"`.
pub fn percentile(rank: u32) -> String {
    let suffix = match (rank % 10, rank % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{rank}{suffix}")
}

/// Percentile rank of a 0..=1 score, rounded to the nearest whole percentile.
pub fn score_percentile(score: f64) -> String {
    let rank = (score.clamp(0.0, 1.0) * 100.0).round() as u32;
    percentile(rank)
}
