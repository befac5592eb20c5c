// src/config/options.rs
//
// Option structs passed from the CLI into the session handlers.

use chrono::NaiveDate;
use std::path::PathBuf;

use crate::config::consts::DEFAULT_THRESHOLD;
use crate::core::fuzzy::MatchMethod;
use crate::store::ProjectStatus;

/// Where project metadata comes from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SourceSelect {
    /// `/assets/` directly.
    AllAssets,
    /// Through the listed project views.
    Views(Vec<String>),
}

impl Default for SourceSelect {
    fn default() -> Self {
        SourceSelect::AllAssets
    }
}

/// Project-table predicates. All combine with logical AND; an empty or unset
/// predicate matches everything (see `FilterOptions::matches` in store.rs).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FilterOptions {
    /// Case-insensitive substring match against the project name; a record
    /// matches when ANY keyword hits.
    pub name_keywords: Vec<String>,
    pub countries: Vec<String>,
    pub statuses: Vec<ProjectStatus>,
    pub sectors: Vec<String>,
    pub created_from: Option<NaiveDate>,
    pub created_to: Option<NaiveDate>,
    pub min_submissions: u64,
}

/// Keyword search over extracted form schemas.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchOptions {
    pub keywords: Vec<String>,
    pub method: MatchMethod,
    pub threshold: u8,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            keywords: Vec::new(),
            method: MatchMethod::TokenSetRatio,
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

impl SearchOptions {
    /// Parse a comma-separated keyword list, trimming and lowercasing,
    /// dropping empties.
    pub fn parse_keywords(s: &str) -> Vec<String> {
        s.split(',')
            .map(|kw| kw.trim().to_lowercase())
            .filter(|kw| !kw.is_empty())
            .collect()
    }
}

/// Which export artifact to produce.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportKind {
    /// One spreadsheet, one row per project.
    Metadata,
    /// ZIP with one XLSForm file per project.
    XlsForms,
    /// ZIP with one submissions JSON file per project.
    Submissions,
    /// One workbook, one sheet per form's submissions.
    Workbook,
}

impl ExportKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "metadata" => Some(ExportKind::Metadata),
            "xlsforms" => Some(ExportKind::XlsForms),
            "submissions" => Some(ExportKind::Submissions),
            "workbook" => Some(ExportKind::Workbook),
            _ => None,
        }
    }

    pub fn default_filename(self) -> &'static str {
        use crate::config::consts::*;
        match self {
            ExportKind::Metadata => DEFAULT_METADATA_FILE,
            ExportKind::XlsForms => DEFAULT_XLSFORMS_FILE,
            ExportKind::Submissions => DEFAULT_SUBMISSIONS_FILE,
            ExportKind::Workbook => DEFAULT_WORKBOOK_FILE,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ExportOptions {
    pub kind: ExportKind,
    pub out: Option<PathBuf>,
}

impl ExportOptions {
    /// Output path: explicit `-o`, or the kind's default filename. A `-o`
    /// ending in a separator is a directory hint and gets the default
    /// filename appended.
    pub fn out_path(&self) -> PathBuf {
        match &self.out {
            None => PathBuf::from(self.kind.default_filename()),
            Some(p) => {
                let text = p.to_string_lossy();
                if text.ends_with('/') || text.ends_with('\\') || p.is_dir() {
                    p.join(self.kind.default_filename())
                } else {
                    p.clone()
                }
            }
        }
    }
}
