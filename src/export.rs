// src/export.rs
//
// Artifact builders. Everything here is pure: payloads are already fetched
// by the session, these functions only assemble bytes. Per-entry naming is
// `<sanitized form name>_<uid>` so two forms with the same display name can
// never collide inside an archive or workbook.

use std::io::{Cursor, Write};

use rust_xlsxwriter::Workbook;
use serde_json::Value;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::config::consts::SHEET_NAME_MAX;
use crate::core::sanitize::{sanitize_sheet_name, sanitize_stem};
use crate::error::Error;
use crate::store::ProjectRecord;

/// Result of one export run: the artifact plus the projects that could not
/// contribute (failed fetch, nothing to export). Skips are notes, not
/// errors.
#[derive(Debug)]
pub struct ExportOutcome {
    pub bytes: Vec<u8>,
    pub skipped: Vec<String>,
}

/// One file inside a ZIP artifact.
#[derive(Clone, Debug)]
pub struct ArchiveEntry {
    pub name: String,
    pub bytes: Vec<u8>,
}

/// Collision-free stem for archive entries and sheet titles.
pub fn entry_stem(name: &str, uid: &str) -> String {
    let stem = sanitize_stem(name, uid);
    if stem == uid {
        stem
    } else {
        format!("{stem}_{uid}")
    }
}

/* ---- metadata workbook ---- */

const METADATA_HEADERS: [&str; 11] = [
    "UID",
    "Name",
    "Status",
    "Submissions",
    "Date created",
    "Date modified",
    "Country",
    "Country code",
    "Sector",
    "Owner",
    "Source view",
];

/// One spreadsheet, one row per project.
pub fn metadata_workbook(projects: &[&ProjectRecord]) -> Result<Vec<u8>, Error> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name("Projects")?;

    for (col, h) in METADATA_HEADERS.iter().enumerate() {
        sheet.write_string(0, col as u16, *h)?;
    }
    for (i, p) in projects.iter().enumerate() {
        let row = (i + 1) as u32;
        sheet.write_string(row, 0, &p.uid)?;
        sheet.write_string(row, 1, &p.name)?;
        sheet.write_string(row, 2, p.status.label())?;
        sheet.write_number(row, 3, p.submission_count as f64)?;
        sheet.write_string(row, 4, &date_cell(p.date_created))?;
        sheet.write_string(row, 5, &date_cell(p.date_modified))?;
        sheet.write_string(row, 6, &p.country_label)?;
        sheet.write_string(row, 7, &p.country_code)?;
        sheet.write_string(row, 8, p.sector.as_deref().unwrap_or(""))?;
        sheet.write_string(row, 9, &p.owner)?;
        sheet.write_string(row, 10, p.source_view_name())?;
    }
    Ok(workbook.save_to_buffer()?)
}

fn date_cell(d: Option<chrono::DateTime<chrono::Utc>>) -> String {
    d.map(|d| d.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_default()
}

/* ---- ZIP archives ---- */

/// Deflated ZIP of the given entries, in order.
pub fn archive(entries: &[ArchiveEntry]) -> Result<Vec<u8>, Error> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    for entry in entries {
        zip.start_file(entry.name.as_str(), options)?;
        zip.write_all(&entry.bytes)?;
    }
    Ok(zip.finish()?.into_inner())
}

/* ---- submissions workbook ---- */

/// Submissions of one form, headed for one worksheet.
#[derive(Debug)]
pub struct FormSubmissions {
    pub name: String,
    pub uid: String,
    pub rows: Vec<Value>,
}

/// One workbook, one sheet per form. Sheet titles are sanitized, capped at
/// Excel's 31-character limit and deduplicated with a numeric suffix.
pub fn submissions_workbook(forms: &[FormSubmissions]) -> Result<Vec<u8>, Error> {
    let mut workbook = Workbook::new();
    let titles = sheet_titles(forms);
    for (form, title) in forms.iter().zip(&titles) {
        let sheet = workbook.add_worksheet();
        sheet.set_name(title)?;

        let (columns, rows) = tabulate(&form.rows);
        for (col, name) in columns.iter().enumerate() {
            sheet.write_string(0, col as u16, name)?;
        }
        for (i, row) in rows.iter().enumerate() {
            for (col, cell) in row.iter().enumerate() {
                sheet.write_string((i + 1) as u32, col as u16, cell)?;
            }
        }
    }
    Ok(workbook.save_to_buffer()?)
}

fn sheet_titles(forms: &[FormSubmissions]) -> Vec<String> {
    let mut used = std::collections::HashSet::new();
    forms
        .iter()
        .map(|f| {
            let base = sanitize_sheet_name(&f.name);
            let base = if base.is_empty() { f.uid.clone() } else { base };
            let mut title = truncate_chars(&base, SHEET_NAME_MAX);
            let mut n = 1;
            while !used.insert(title.clone()) {
                n += 1;
                let suffix = format!(" ({n})");
                title = format!(
                    "{}{suffix}",
                    truncate_chars(&base, SHEET_NAME_MAX - suffix.chars().count())
                );
            }
            title
        })
        .collect()
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect::<String>().trim_end().to_string()
}

/// Flatten submission objects to a table: nested objects join their key
/// paths with `/` (matching the platform's own group notation), columns in
/// first-seen order across rows.
fn tabulate(rows: &[Value]) -> (Vec<String>, Vec<Vec<String>>) {
    let mut columns: Vec<String> = Vec::new();
    let mut flat_rows: Vec<Vec<(String, String)>> = Vec::new();

    for row in rows {
        let mut cells = Vec::new();
        flatten("", row, &mut cells);
        for (key, _) in &cells {
            if !columns.contains(key) {
                columns.push(key.clone());
            }
        }
        flat_rows.push(cells);
    }

    let table = flat_rows
        .into_iter()
        .map(|cells| {
            columns
                .iter()
                .map(|col| {
                    cells
                        .iter()
                        .find(|(k, _)| k == col)
                        .map(|(_, v)| v.clone())
                        .unwrap_or_default()
                })
                .collect()
        })
        .collect();
    (columns, table)
}

fn flatten(prefix: &str, v: &Value, out: &mut Vec<(String, String)>) {
    match v {
        Value::Object(map) => {
            for (key, val) in map {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}/{key}")
                };
                flatten(&path, val, out);
            }
        }
        _ if prefix.is_empty() => out.push(("value".to_string(), cell_text(v))),
        _ => out.push((prefix.to_string(), cell_text(v))),
    }
}

fn cell_text(v: &Value) -> String {
    match v {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        // repeat groups and attachments stay as raw JSON
        other => other.to_string(),
    }
}
