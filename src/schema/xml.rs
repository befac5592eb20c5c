// src/schema/xml.rs
//
// XForm fallback walk. The model's <itext> translation tables are read
// first (they precede the body in the document), then body controls are
// mapped to questions: the element tag gives the type, the last segment of
// ref/nodeset gives the name, and <label> resolves either through itext or
// to its own text content. group/repeat are structural; item/option labels
// belong to choices, not questions.

use std::collections::{BTreeMap, HashMap, HashSet};

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::config::consts::DEFAULT_LANG;
use super::QuestionRecord;

struct PendingControl {
    name: Option<String>,
    qtype: &'static str,
    labels: BTreeMap<String, String>,
    labeled: bool,
}

fn control_type(tag: &str) -> Option<&'static str> {
    match tag {
        "input" => Some("text"),
        "select1" => Some("select_one"),
        "select" => Some("select_multiple"),
        "upload" => Some("upload"),
        "trigger" => Some("acknowledge"),
        "range" => Some("range"),
        _ => None,
    }
}

fn attr(e: &BytesStart<'_>, key: &str) -> Option<String> {
    e.try_get_attribute(key)
        .ok()
        .flatten()
        .and_then(|a| a.unescape_value().ok())
        .map(|v| v.into_owned())
}

/// `/data/group/age` -> `age`
fn ref_leaf(path: &str) -> Option<String> {
    let leaf = path.trim_end_matches('/').rsplit('/').next()?.trim();
    if leaf.is_empty() {
        None
    } else {
        Some(leaf.to_string())
    }
}

/// Pull the id out of `jr:itext('some-id')`.
fn itext_id(label_ref: &str) -> Option<String> {
    let rest = label_ref.trim().strip_prefix("jr:itext(")?;
    let rest = rest.trim_end_matches(')').trim();
    let id = rest.trim_matches(|c| c == '\'' || c == '"');
    if id.is_empty() {
        None
    } else {
        Some(id.to_string())
    }
}

pub fn extract(text: &str) -> Result<Vec<QuestionRecord>, String> {
    if text.trim().is_empty() {
        return Err("empty XML document".to_string());
    }
    let mut reader = Reader::from_str(text);
    reader.trim_text(true);

    // itext id -> (lang -> value)
    let mut itext: HashMap<String, BTreeMap<String, String>> = HashMap::new();
    let mut cur_lang: Option<String> = None;
    let mut cur_text_id: Option<String> = None;
    let mut in_value = false;

    let mut in_body = false;
    let mut item_depth: usize = 0;
    let mut pending: Vec<PendingControl> = Vec::new();
    let mut awaiting_label_text = false;

    let mut questions: Vec<QuestionRecord> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    loop {
        match reader.read_event() {
            Err(e) => {
                return Err(format!(
                    "XML parse error at byte {}: {e}",
                    reader.buffer_position()
                ))
            }
            Ok(Event::Eof) => break,

            Ok(Event::Start(ref e)) => {
                let local = e.local_name();
                let tag = std::str::from_utf8(local.as_ref()).unwrap_or("");
                match tag {
                    "body" => in_body = true,
                    "translation" => {
                        cur_lang = Some(attr(e, "lang").unwrap_or_else(|| DEFAULT_LANG.to_string()))
                    }
                    "text" if cur_lang.is_some() => cur_text_id = attr(e, "id"),
                    "value" if cur_text_id.is_some() => in_value = true,
                    "item" | "option" if in_body => item_depth += 1,
                    "label" if in_body && item_depth == 0 && !pending.is_empty() => {
                        open_label(e, &itext, &mut pending, &mut awaiting_label_text);
                    }
                    _ if in_body && item_depth == 0 => {
                        if let Some(qtype) = control_type(tag) {
                            pending.push(open_control(e, qtype));
                        }
                    }
                    _ => {}
                }
            }

            Ok(Event::Empty(ref e)) => {
                let local = e.local_name();
                let tag = std::str::from_utf8(local.as_ref()).unwrap_or("");
                match tag {
                    "label" if in_body && item_depth == 0 && !pending.is_empty() => {
                        // self-closing label can only carry an itext ref
                        let mut ignore = false;
                        open_label(e, &itext, &mut pending, &mut ignore);
                    }
                    _ if in_body && item_depth == 0 => {
                        if let Some(qtype) = control_type(tag) {
                            let ctrl = open_control(e, qtype);
                            finalize(ctrl, &mut seen, &mut questions);
                        }
                    }
                    _ => {}
                }
            }

            Ok(Event::End(ref e)) => {
                let local = e.local_name();
                let tag = std::str::from_utf8(local.as_ref()).unwrap_or("");
                match tag {
                    "body" => in_body = false,
                    "translation" => cur_lang = None,
                    "text" => cur_text_id = None,
                    "value" => in_value = false,
                    "item" | "option" if in_body => item_depth = item_depth.saturating_sub(1),
                    "label" => awaiting_label_text = false,
                    _ if in_body && control_type(tag).is_some() => {
                        if let Some(ctrl) = pending.pop() {
                            finalize(ctrl, &mut seen, &mut questions);
                        }
                    }
                    _ => {}
                }
            }

            Ok(Event::Text(ref t)) => {
                let Ok(text) = t.unescape() else { continue };
                let text = text.trim();
                if text.is_empty() {
                    continue;
                }
                if in_value {
                    if let (Some(id), Some(lang)) = (&cur_text_id, &cur_lang) {
                        itext
                            .entry(id.clone())
                            .or_default()
                            .insert(lang.clone(), text.to_string());
                    }
                } else if awaiting_label_text {
                    if let Some(ctrl) = pending.last_mut() {
                        if !ctrl.labeled {
                            ctrl.labels
                                .insert(DEFAULT_LANG.to_string(), text.to_string());
                            ctrl.labeled = true;
                        }
                    }
                    awaiting_label_text = false;
                }
            }

            Ok(_) => {}
        }
    }

    Ok(questions)
}

fn open_control(e: &BytesStart<'_>, qtype: &'static str) -> PendingControl {
    let name = attr(e, "ref")
        .or_else(|| attr(e, "nodeset"))
        .and_then(|r| ref_leaf(&r));
    PendingControl {
        name,
        qtype,
        labels: BTreeMap::new(),
        labeled: false,
    }
}

fn open_label(
    e: &BytesStart<'_>,
    itext: &HashMap<String, BTreeMap<String, String>>,
    pending: &mut Vec<PendingControl>,
    awaiting_text: &mut bool,
) {
    let Some(ctrl) = pending.last_mut() else { return };
    if ctrl.labeled {
        return;
    }
    match attr(e, "ref").as_deref().and_then(itext_id) {
        Some(id) => {
            if let Some(table) = itext.get(&id) {
                ctrl.labels = table.clone();
            }
            // a dangling itext ref still counts as labeled (empty set)
            ctrl.labeled = true;
        }
        None => *awaiting_text = true,
    }
}

fn finalize(ctrl: PendingControl, seen: &mut HashSet<String>, out: &mut Vec<QuestionRecord>) {
    let Some(name) = ctrl.name else { return };
    if !seen.insert(name.clone()) {
        return;
    }
    out.push(QuestionRecord {
        name,
        labels: ctrl.labels,
        qtype: ctrl.qtype.to_string(),
    });
}
