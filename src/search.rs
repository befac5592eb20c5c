// src/search.rs
//
// Keyword search over extracted form schemas. One result per form, in input
// order; per-keyword the best-scoring hit is recorded (highest score, then
// earliest question, then field order within the record). A form whose
// extraction failed still yields a result, marked and with zero matches.

use crate::config::options::SearchOptions;
use crate::schema::FormSchema;

/// Which field of a question a keyword matched against.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeywordHit {
    pub keyword: String,
    /// Name of the matched question.
    pub question: String,
    /// The field text the score was computed against.
    pub field: String,
    pub score: u8,
}

/// Search outcome for one form.
#[derive(Clone, Debug)]
pub struct MatchResult {
    pub uid: String,
    pub name: String,
    /// Keywords with at least one hit, input order.
    pub hits: Vec<KeywordHit>,
    /// Extraction failure note carried through from the schema.
    pub failure: Option<String>,
}

impl MatchResult {
    /// Number of distinct keywords that matched this form.
    pub fn matched_keywords(&self) -> usize {
        self.hits.len()
    }
}

/// Run the matcher over every (uid, name, schema) triple. Forms come back in
/// input order; callers re-sort for display if they want a ranking.
pub fn search_forms<'a, I>(forms: I, opts: &SearchOptions) -> Vec<MatchResult>
where
    I: IntoIterator<Item = (&'a str, &'a str, &'a FormSchema)>,
{
    forms
        .into_iter()
        .map(|(uid, name, schema)| search_one(uid, name, schema, opts))
        .collect()
}

fn search_one(uid: &str, name: &str, schema: &FormSchema, opts: &SearchOptions) -> MatchResult {
    let mut hits = Vec::new();
    if schema.parse_error.is_none() {
        for keyword in &opts.keywords {
            if let Some(hit) = best_hit(keyword, schema, opts) {
                hits.push(hit);
            }
        }
    }
    MatchResult {
        uid: uid.to_string(),
        name: name.to_string(),
        hits,
        failure: schema.parse_error.clone(),
    }
}

/// Best field across all questions for one keyword, or None below threshold.
/// Strictly-greater comparison keeps the earliest question and the earliest
/// field on ties.
fn best_hit(keyword: &str, schema: &FormSchema, opts: &SearchOptions) -> Option<KeywordHit> {
    let mut best: Option<KeywordHit> = None;
    for q in &schema.questions {
        for field in q.fields() {
            let score = opts.method.score(keyword, field);
            if score < opts.threshold {
                continue;
            }
            if best.as_ref().map_or(true, |b| score > b.score) {
                best = Some(KeywordHit {
                    keyword: keyword.to_string(),
                    question: q.name.clone(),
                    field: field.to_string(),
                    score,
                });
            }
        }
    }
    best
}
