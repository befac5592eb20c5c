// src/api/types.rs
//
// Wire models for the /api/v2 JSON payloads. Deserialization is tolerant:
// every field the server might omit defaults, and the loosely-shaped
// `settings` blob (country as list-or-dict, sector as dict-or-string) is
// kept as raw JSON and picked apart here, once, when the asset row is
// reshaped into a ProjectRecord.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use crate::store::{ProjectRecord, ProjectStatus, ViewRef};

/// One page of a paginated list endpoint.
#[derive(Clone, Debug, Deserialize)]
pub struct Page<T> {
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ProjectView {
    pub uid: String,
    #[serde(default)]
    pub name: String,
}

/// Asset row as listed by `/assets/` and `/project-views/{uid}/assets/`.
/// `content` is only populated by the detail endpoint.
#[derive(Clone, Debug, Deserialize)]
pub struct Asset {
    pub uid: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub asset_type: String,
    #[serde(default)]
    pub deployment_status: Option<String>,
    #[serde(default)]
    pub is_archived: bool,
    #[serde(default, rename = "deployment__submission_count")]
    pub submission_count: Option<u64>,
    #[serde(default)]
    pub date_created: Option<String>,
    #[serde(default)]
    pub date_modified: Option<String>,
    #[serde(default, rename = "owner__username")]
    pub owner: Option<String>,
    #[serde(default)]
    pub settings: Option<Value>,
    #[serde(default)]
    pub content: Option<Value>,
}

impl Asset {
    /// Reshape the wire row into a store record. `view` tags which project
    /// view the row came through, if any.
    pub fn into_record(self, view: Option<&ViewRef>) -> ProjectRecord {
        let archived =
            self.is_archived || self.deployment_status.as_deref() == Some("archived");
        let status = ProjectStatus::derive(self.deployment_status.as_deref(), archived);
        let (country_label, country_code) = country_of(self.settings.as_ref());
        ProjectRecord {
            uid: self.uid,
            name: self.name,
            status,
            submission_count: self.submission_count.unwrap_or(0),
            date_created: parse_date(self.date_created.as_deref()),
            date_modified: parse_date(self.date_modified.as_deref()),
            country_label,
            country_code,
            sector: sector_of(self.settings.as_ref()),
            owner: self.owner.unwrap_or_default(),
            source_view: view.cloned(),
        }
    }
}

fn parse_date(raw: Option<&str>) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw?)
        .ok()
        .map(|d| d.with_timezone(&Utc))
}

/// First country entry's label and code. The server stores country either as
/// a list of `{value, label}` pairs or a single such pair.
fn country_of(settings: Option<&Value>) -> (String, String) {
    let country = settings.and_then(|s| s.get("country"));
    let entry = match country {
        Some(Value::Array(list)) => list.first(),
        Some(v @ Value::Object(_)) => Some(v),
        _ => None,
    };
    let Some(entry) = entry else {
        return (String::new(), String::new());
    };
    let label = entry.get("label").and_then(Value::as_str).unwrap_or("");
    let code = entry.get("value").and_then(Value::as_str).unwrap_or("");
    (label.to_string(), code.to_string())
}

/// Sector arrives as `{value, label}` or as a bare string.
fn sector_of(settings: Option<&Value>) -> Option<String> {
    let sector = settings?.get("sector")?;
    let text = match sector {
        Value::Object(map) => map.get("label").or_else(|| map.get("value"))?.as_str()?,
        Value::String(s) => s.as_str(),
        _ => return None,
    };
    let text = text.trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}
