//! Token-set similarity on a 0-100 scale.
//!
//! Tokenizes both strings, splits them into the shared token set and each
//! side's remainder, and scores the three pairwise combinations with
//! normalized Levenshtein, keeping the best. Word order and duplicated
//! tokens don't count against a match, which is what team-name comparison
//! needs ("ny yankees" vs "yankees ny mlb").

use std::collections::BTreeSet;

fn tokens(s: &str) -> BTreeSet<&str> {
    s.split_whitespace().collect()
}

fn ratio(a: &str, b: &str) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    strsim::normalized_levenshtein(a, b)
}

/// Token-set ratio of two strings, 0-100.
pub fn token_set_ratio(a: &str, b: &str) -> u8 {
    let ta = tokens(a);
    let tb = tokens(b);
    if ta.is_empty() || tb.is_empty() {
        return 0;
    }

    let intersection: Vec<&str> = ta.intersection(&tb).copied().collect();
    let only_a: Vec<&str> = ta.difference(&tb).copied().collect();
    let only_b: Vec<&str> = tb.difference(&ta).copied().collect();

    let base = intersection.join(" ");
    let combined_a = join_sections(&base, &only_a);
    let combined_b = join_sections(&base, &only_b);

    let best = ratio(&base, &combined_a)
        .max(ratio(&base, &combined_b))
        .max(ratio(&combined_a, &combined_b));

    (best * 100.0).round().clamp(0.0, 100.0) as u8
}

fn join_sections(base: &str, rest: &[&str]) -> String {
    if rest.is_empty() {
        base.to_string()
    } else if base.is_empty() {
        rest.join(" ")
    } else {
        format!("{} {}", base, rest.join(" "))
    }
}
