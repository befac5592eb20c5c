// src/core/fuzzy.rs
//
// Approximate string matching, fuzzywuzzy-style.
//
// All five methods share one primitive: the LCS similarity
// 200 * lcs(a, b) / (|a| + |b|), which equals the indel-distance ratio
// ((|a|+|b|) - dist) / (|a|+|b|) scaled to [0, 100]. Inputs are normalized
// first (lowercase, non-alphanumeric folded to spaces, whitespace collapsed)
// so `respondent_age` and "Respondent age" compare equal.

/// Comparison method for keyword search. Scores are integers in [0, 100];
/// a candidate matches a keyword iff score >= the caller's threshold.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MatchMethod {
    /// Edit-distance similarity of the whole strings; order and length
    /// differences lower the score.
    ExactRatio,
    /// Best-aligned substring similarity; rewards the candidate containing
    /// the keyword.
    PartialRatio,
    /// Sorts tokens alphabetically before comparing; word order insensitive.
    TokenSortRatio,
    /// Compares token set intersection/differences; robust to extra or
    /// repeated words. Recommended default.
    TokenSetRatio,
    /// Composite heuristic over the other methods with length-based
    /// weighting.
    WeightedRatio,
}

impl MatchMethod {
    pub const ALL: [MatchMethod; 5] = [
        MatchMethod::ExactRatio,
        MatchMethod::PartialRatio,
        MatchMethod::TokenSortRatio,
        MatchMethod::TokenSetRatio,
        MatchMethod::WeightedRatio,
    ];

    pub fn name(self) -> &'static str {
        match self {
            MatchMethod::ExactRatio => "exact-ratio",
            MatchMethod::PartialRatio => "partial-ratio",
            MatchMethod::TokenSortRatio => "token-sort-ratio",
            MatchMethod::TokenSetRatio => "token-set-ratio",
            MatchMethod::WeightedRatio => "weighted-ratio",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "exact-ratio" | "exact" | "ratio" => Some(MatchMethod::ExactRatio),
            "partial-ratio" | "partial" => Some(MatchMethod::PartialRatio),
            "token-sort-ratio" | "token-sort" => Some(MatchMethod::TokenSortRatio),
            "token-set-ratio" | "token-set" => Some(MatchMethod::TokenSetRatio),
            "weighted-ratio" | "weighted" | "wratio" => Some(MatchMethod::WeightedRatio),
            _ => None,
        }
    }

    pub fn describe(self) -> &'static str {
        match self {
            MatchMethod::ExactRatio => "general similarity; order and exactness matter",
            MatchMethod::PartialRatio => "best matching substring; good for contained phrases",
            MatchMethod::TokenSortRatio => "sorts words before comparing; ignores word order",
            MatchMethod::TokenSetRatio => "compares unique word sets; robust to extra words",
            MatchMethod::WeightedRatio => "composite of the other methods, length-weighted",
        }
    }

    /// Score two strings under this method. Normalization is applied to both
    /// sides first; a string that normalizes to empty (punctuation-only
    /// input) scores 0 against everything, itself included.
    pub fn score(self, a: &str, b: &str) -> u8 {
        let a = full_process(a);
        let b = full_process(b);
        if a.is_empty() || b.is_empty() {
            return 0;
        }
        let raw = match self {
            MatchMethod::ExactRatio => ratio(&a, &b),
            MatchMethod::PartialRatio => partial_ratio(&a, &b),
            MatchMethod::TokenSortRatio => ratio(&sorted_tokens(&a), &sorted_tokens(&b)),
            MatchMethod::TokenSetRatio => token_set(&a, &b, false),
            MatchMethod::WeightedRatio => weighted(&a, &b),
        };
        raw.round().clamp(0.0, 100.0) as u8
    }
}

impl std::fmt::Display for MatchMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Lowercase, fold non-alphanumerics to spaces, collapse runs of whitespace.
fn full_process(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_space = true; // also trims leading spaces
    for ch in s.chars() {
        if ch.is_alphanumeric() {
            out.extend(ch.to_lowercase());
            prev_space = false;
        } else if !prev_space {
            out.push(' ');
            prev_space = true;
        }
    }
    while out.ends_with(' ') {
        out.pop();
    }
    out
}

/// Longest common subsequence length, O(|a|*|b|) with two rows.
fn lcs_len(a: &[char], b: &[char]) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    let mut prev = vec![0usize; b.len() + 1];
    let mut cur = vec![0usize; b.len() + 1];
    for &ca in a {
        for (j, &cb) in b.iter().enumerate() {
            cur[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                cur[j].max(prev[j + 1])
            };
        }
        std::mem::swap(&mut prev, &mut cur);
    }
    prev[b.len()]
}

fn ratio_chars(a: &[char], b: &[char]) -> f64 {
    let total = a.len() + b.len();
    if total == 0 {
        return 100.0;
    }
    200.0 * lcs_len(a, b) as f64 / total as f64
}

fn ratio(a: &str, b: &str) -> f64 {
    let ac: Vec<char> = a.chars().collect();
    let bc: Vec<char> = b.chars().collect();
    ratio_chars(&ac, &bc)
}

/// Best ratio of the shorter string against every same-length window of the
/// longer one.
fn partial_ratio(a: &str, b: &str) -> f64 {
    let ac: Vec<char> = a.chars().collect();
    let bc: Vec<char> = b.chars().collect();
    let (short, long) = if ac.len() <= bc.len() { (&ac, &bc) } else { (&bc, &ac) };
    // an empty side has no window to align (the token-set path can produce
    // an empty intersection string)
    if short.is_empty() {
        return 0.0;
    }
    if short.len() == long.len() {
        return ratio_chars(short, long);
    }
    let mut best: f64 = 0.0;
    for start in 0..=(long.len() - short.len()) {
        let window = &long[start..start + short.len()];
        best = best.max(ratio_chars(short, window));
        if best >= 100.0 {
            break;
        }
    }
    best
}

fn sorted_tokens(s: &str) -> String {
    let mut tokens: Vec<&str> = s.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

/// Token-set comparison: common tokens vs each side's leftovers. Symmetric
/// by construction. With `partial` the window scan replaces the plain ratio
/// (used by the weighted composite).
fn token_set(a: &str, b: &str, partial: bool) -> f64 {
    use std::collections::BTreeSet;
    let ta: BTreeSet<&str> = a.split_whitespace().collect();
    let tb: BTreeSet<&str> = b.split_whitespace().collect();

    let sect: Vec<&str> = ta.intersection(&tb).copied().collect();
    let diff_ab: Vec<&str> = ta.difference(&tb).copied().collect();
    let diff_ba: Vec<&str> = tb.difference(&ta).copied().collect();

    let sect_s = sect.join(" ");
    let combined_a = join_nonempty(&sect_s, &diff_ab.join(" "));
    let combined_b = join_nonempty(&sect_s, &diff_ba.join(" "));

    let cmp = if partial { partial_ratio } else { ratio };
    cmp(&sect_s, &combined_a)
        .max(cmp(&sect_s, &combined_b))
        .max(cmp(&combined_a, &combined_b))
}

fn join_nonempty(a: &str, b: &str) -> String {
    match (a.is_empty(), b.is_empty()) {
        (true, _) => b.to_string(),
        (_, true) => a.to_string(),
        _ => format!("{a} {b}"),
    }
}

/// fuzzywuzzy's WRatio: plain ratio, then token variants scaled by 0.95;
/// when lengths diverge by 1.5x or more, partial variants additionally
/// scaled by 0.9 (or 0.6 past 8x).
fn weighted(a: &str, b: &str) -> f64 {
    let base = ratio(a, b);
    let (la, lb) = (a.chars().count(), b.chars().count());
    let len_ratio = la.max(lb) as f64 / la.min(lb) as f64;
    const UNBASE: f64 = 0.95;

    if len_ratio < 1.5 {
        let tsort = ratio(&sorted_tokens(a), &sorted_tokens(b)) * UNBASE;
        let tset = token_set(a, b, false) * UNBASE;
        base.max(tsort).max(tset)
    } else {
        let pscale = if len_ratio < 8.0 { 0.90 } else { 0.60 };
        let part = partial_ratio(a, b) * pscale;
        let ptsort = partial_ratio(&sorted_tokens(a), &sorted_tokens(b)) * UNBASE * pscale;
        let ptset = token_set(a, b, true) * UNBASE * pscale;
        base.max(part).max(ptsort).max(ptset)
    }
}
