// src/schema/mod.rs
//
// Form-schema extraction: one form definition in, an ordered flat list of
// leaf questions out. The definition variant (JSON vs XML) is resolved once
// at fetch time; extraction itself never fails upward — malformed input
// degrades to an empty question list with a recorded parse failure.

pub mod json;
pub mod xml;

use std::collections::BTreeMap;

/// A form definition as fetched, resolved to one of the two source formats.
/// `Missing` means neither the JSON content nor the XML fallback was
/// available.
#[derive(Clone, Debug)]
pub enum FormDefinition {
    Json(serde_json::Value),
    Xml(String),
    Missing,
}

/// One leaf question. `name` is unique within its form; `labels` maps
/// language code to label text and may be empty; `qtype` falls back to the
/// `"unknown"` sentinel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuestionRecord {
    pub name: String,
    pub labels: BTreeMap<String, String>,
    pub qtype: String,
}

impl QuestionRecord {
    /// Every searchable field in a fixed order: name, labels (by language
    /// code), declared type.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str())
            .chain(self.labels.values().map(|s| s.as_str()))
            .chain(std::iter::once(self.qtype.as_str()))
    }
}

/// Extraction result for one form.
#[derive(Clone, Debug, Default)]
pub struct FormSchema {
    pub questions: Vec<QuestionRecord>,
    /// Set when the definition was malformed or absent; the question list is
    /// empty in that case.
    pub parse_error: Option<String>,
}

impl FormSchema {
    pub fn failure(msg: impl Into<String>) -> Self {
        Self {
            questions: Vec::new(),
            parse_error: Some(msg.into()),
        }
    }

    pub fn failed(&self) -> bool {
        self.parse_error.is_some()
    }
}

/// Extract the question list from a resolved form definition.
pub fn extract(def: &FormDefinition) -> FormSchema {
    let result = match def {
        FormDefinition::Json(content) => json::extract(content),
        FormDefinition::Xml(text) => xml::extract(text),
        FormDefinition::Missing => Err("no form definition available".to_string()),
    };
    match result {
        Ok(questions) => FormSchema {
            questions,
            parse_error: None,
        },
        Err(msg) => FormSchema::failure(msg),
    }
}
