// src/schema/json.rs
//
// JSON form content walk. Kobo asset `content` carries a `survey` element
// list, flat with begin_/end_ group markers; some exports nest children
// instead, so both shapes are walked. Labels pair positionally with the
// `translations` list (a null translation is the unnamed default language).

use std::collections::{BTreeMap, HashSet};

use serde_json::Value;

use crate::config::consts::{DEFAULT_LANG, UNKNOWN_TYPE};
use super::QuestionRecord;

/// Structural markers: open/close a group or repeat, no data of their own.
const STRUCTURAL_TYPES: [&str; 4] = ["begin_group", "end_group", "begin_repeat", "end_repeat"];

/// Element types that never collect data from a respondent: display notes,
/// platform metadata, and server-side calculations.
const NON_QUESTION_TYPES: [&str; 12] = [
    "note",
    "start",
    "end",
    "today",
    "deviceid",
    "simserial",
    "subscriberid",
    "phonenumber",
    "username",
    "email",
    "audit",
    "calculate",
];

pub fn extract(content: &Value) -> Result<Vec<QuestionRecord>, String> {
    let obj = content
        .as_object()
        .ok_or_else(|| "form content is not an object".to_string())?;
    let survey = obj
        .get("survey")
        .and_then(Value::as_array)
        .ok_or_else(|| "form content has no survey element list".to_string())?;

    let languages = translation_languages(obj.get("translations"));

    let mut questions = Vec::new();
    let mut seen = HashSet::new();
    walk(survey, &languages, &mut questions, &mut seen);
    Ok(questions)
}

/// Language names from `translations`; `null` entries become the default
/// language, extras get a positional placeholder.
fn translation_languages(translations: Option<&Value>) -> Vec<String> {
    match translations.and_then(Value::as_array) {
        Some(list) => list
            .iter()
            .enumerate()
            .map(|(i, t)| match t.as_str() {
                Some(name) if !name.is_empty() => name.to_string(),
                _ if i == 0 => DEFAULT_LANG.to_string(),
                _ => format!("lang{i}"),
            })
            .collect(),
        None => vec![DEFAULT_LANG.to_string()],
    }
}

fn walk(
    elements: &[Value],
    languages: &[String],
    out: &mut Vec<QuestionRecord>,
    seen: &mut HashSet<String>,
) {
    for el in elements {
        let Some(el) = el.as_object() else { continue };

        // Nested representation: recurse into a group's children.
        if let Some(children) = el.get("children").and_then(Value::as_array) {
            walk(children, languages, out, seen);
            continue;
        }

        let qtype = el
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or(UNKNOWN_TYPE);
        if STRUCTURAL_TYPES.contains(&qtype) || NON_QUESTION_TYPES.contains(&qtype) {
            continue;
        }

        let Some(name) = el
            .get("name")
            .and_then(Value::as_str)
            .or_else(|| el.get("$autoname").and_then(Value::as_str))
        else {
            continue;
        };
        // Uniqueness within the form: first occurrence wins.
        if !seen.insert(name.to_string()) {
            continue;
        }

        out.push(QuestionRecord {
            name: name.to_string(),
            labels: labels_for(el.get("label"), languages),
            qtype: qtype.to_string(),
        });
    }
}

/// A label may be a positional list (one entry per translation), a single
/// string, or absent. Nulls inside the list leave that language unlabeled.
fn labels_for(label: Option<&Value>, languages: &[String]) -> BTreeMap<String, String> {
    let mut out = BTreeMap::new();
    match label {
        Some(Value::Array(items)) => {
            for (i, item) in items.iter().enumerate() {
                if let Some(text) = item.as_str() {
                    let lang = languages
                        .get(i)
                        .cloned()
                        .unwrap_or_else(|| format!("lang{i}"));
                    out.insert(lang, text.to_string());
                }
            }
        }
        Some(Value::String(text)) => {
            out.insert(DEFAULT_LANG.to_string(), text.clone());
        }
        _ => {}
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn names(qs: &[QuestionRecord]) -> Vec<&str> {
        qs.iter().map(|q| q.name.as_str()).collect()
    }

    #[test]
    fn one_record_per_leaf_none_for_structure() {
        let content = json!({
            "translations": ["English (en)", "French (fr)"],
            "survey": [
                {"type": "start", "name": "start"},
                {"type": "begin_group", "name": "demographics"},
                {"type": "integer", "name": "age", "label": ["Your age", "Votre âge"]},
                {"type": "select_one yesno", "name": "consent", "label": ["Consent?", null]},
                {"type": "end_group"},
                {"type": "note", "name": "intro_note", "label": ["Welcome"]},
                {"type": "text", "name": "remarks"}
            ]
        });
        let qs = extract(&content).unwrap();
        assert_eq!(names(&qs), vec!["age", "consent", "remarks"]);

        assert_eq!(qs[0].labels.get("English (en)").unwrap(), "Your age");
        assert_eq!(qs[0].labels.get("French (fr)").unwrap(), "Votre âge");
        // null translation slot leaves that language unlabeled
        assert_eq!(qs[1].labels.len(), 1);
        // question without a label is kept with an empty label set
        assert!(qs[2].labels.is_empty());
    }

    #[test]
    fn missing_type_gets_unknown_sentinel() {
        let content = json!({"survey": [{"name": "mystery"}]});
        let qs = extract(&content).unwrap();
        assert_eq!(qs[0].qtype, "unknown");
    }

    #[test]
    fn autoname_fallback_and_duplicate_names() {
        let content = json!({
            "survey": [
                {"type": "text", "$autoname": "auto_q"},
                {"type": "text", "name": "dup", "label": "first"},
                {"type": "integer", "name": "dup", "label": "second"},
                {"type": "text"}
            ]
        });
        let qs = extract(&content).unwrap();
        assert_eq!(names(&qs), vec!["auto_q", "dup"]);
        assert_eq!(qs[1].qtype, "text");
        assert_eq!(qs[1].labels.get("default").unwrap(), "first");
    }

    #[test]
    fn nested_children_are_walked() {
        let content = json!({
            "survey": [
                {"type": "begin_group", "name": "g", "children": [
                    {"type": "text", "name": "inner"}
                ]},
                {"type": "text", "name": "outer"}
            ]
        });
        let qs = extract(&content).unwrap();
        assert_eq!(names(&qs), vec!["inner", "outer"]);
    }

    #[test]
    fn null_translation_maps_to_default_language() {
        let content = json!({
            "translations": [null],
            "survey": [{"type": "text", "name": "q", "label": ["hello"]}]
        });
        let qs = extract(&content).unwrap();
        assert_eq!(qs[0].labels.get("default").unwrap(), "hello");
    }

    #[test]
    fn survey_not_a_list_is_an_error() {
        assert!(extract(&json!({"survey": "nope"})).is_err());
        assert!(extract(&json!(null)).is_err());
        assert!(extract(&json!({})).is_err());
    }
}
