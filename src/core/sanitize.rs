// src/core/sanitize.rs

/// Collapse whitespace runs to single spaces and trim.
pub fn normalize_ws(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_space = false;
    for ch in s.chars() {
        if ch.is_whitespace() {
            if !prev_space {
                out.push(' ');
                prev_space = true;
            }
        } else {
            out.push(ch);
            prev_space = false;
        }
    }
    out.trim().to_string()
}

/// Filename-safe stem from a form name: alphanumerics kept, whitespace runs
/// become single underscores, everything else dropped. Falls back to the UID
/// when nothing survives.
pub fn sanitize_stem(name: &str, uid: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut last_us = false;
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch);
            last_us = false;
        } else if ch.is_whitespace() || ch == '-' || ch == '_' {
            if !last_us {
                out.push('_');
                last_us = true;
            }
        }
    }
    let out = out.trim_matches('_').to_string();
    if out.is_empty() {
        uid.to_string()
    } else {
        out
    }
}

/// Excel sheet names: strip the characters Excel forbids, cap the length.
/// Length is enforced by the caller (needs room for dedup suffixes).
pub fn sanitize_sheet_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '[' | ']' | ':' | '*' | '?' | '/' | '\\' | '\'' => ' ',
            c => c,
        })
        .collect();
    normalize_ws(&cleaned)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stem_keeps_alnum_and_collapses_separators() {
        assert_eq!(sanitize_stem("Water / WASH survey (v2)", "a1"), "Water_WASH_survey_v2");
        assert_eq!(sanitize_stem("  --  ", "aFx9"), "aFx9");
        assert_eq!(sanitize_stem("répondant âge", "u"), "rpondant_ge");
    }

    #[test]
    fn sheet_name_strips_forbidden_chars() {
        assert_eq!(sanitize_sheet_name("a[b]:c*d?e/f\\g"), "a b c d e f g");
    }
}
