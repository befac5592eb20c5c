// src/store.rs
//
// In-memory table of project metadata.
//
// The store is the authoritative copy of the most recent fetch. It is
// replaced wholesale by an explicit load (no partial updates are ever
// visible); everything downstream reads it through filters.

use chrono::{DateTime, NaiveDate, Utc};

use crate::config::options::FilterOptions;

/// Derived deployment state of a project.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ProjectStatus {
    Deployed,
    Archived,
    Draft,
}

impl ProjectStatus {
    pub fn label(self) -> &'static str {
        match self {
            ProjectStatus::Deployed => "Deployed",
            ProjectStatus::Archived => "Archived",
            ProjectStatus::Draft => "Draft",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "deployed" => Some(ProjectStatus::Deployed),
            "archived" => Some(ProjectStatus::Archived),
            "draft" => Some(ProjectStatus::Draft),
            _ => None,
        }
    }

    /// Archived wins over a stale deployment flag, matching the platform UI.
    pub fn derive(deployment_status: Option<&str>, is_archived: bool) -> Self {
        if deployment_status == Some("deployed") {
            ProjectStatus::Deployed
        } else if is_archived {
            ProjectStatus::Archived
        } else {
            ProjectStatus::Draft
        }
    }
}

impl std::fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// The project view a record was loaded through, when the view API was used.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ViewRef {
    pub uid: String,
    pub name: String,
}

/// One project (asset) row. Immutable once fetched; a re-fetch replaces the
/// whole store rather than patching records.
#[derive(Clone, Debug, PartialEq)]
pub struct ProjectRecord {
    pub uid: String,
    pub name: String,
    pub status: ProjectStatus,
    pub submission_count: u64,
    pub date_created: Option<DateTime<Utc>>,
    pub date_modified: Option<DateTime<Utc>>,
    pub country_label: String,
    pub country_code: String,
    pub sector: Option<String>,
    pub owner: String,
    pub source_view: Option<ViewRef>,
}

impl ProjectRecord {
    pub fn source_view_name(&self) -> &str {
        self.source_view
            .as_ref()
            .map(|v| v.name.as_str())
            .unwrap_or("Direct Assets API")
    }
}

#[derive(Debug, Default)]
pub struct ProjectStore {
    projects: Vec<ProjectRecord>,
}

impl ProjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the store contents atomically. Duplicate UIDs (the same asset
    /// reachable via several project views) keep their first occurrence.
    pub fn replace(&mut self, records: Vec<ProjectRecord>) {
        let mut seen = std::collections::HashSet::new();
        let mut deduped = Vec::with_capacity(records.len());
        for r in records {
            if seen.insert(r.uid.clone()) {
                deduped.push(r);
            }
        }
        self.projects = deduped;
    }

    pub fn all(&self) -> &[ProjectRecord] {
        &self.projects
    }

    pub fn len(&self) -> usize {
        self.projects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }

    pub fn get(&self, uid: &str) -> Option<&ProjectRecord> {
        self.projects.iter().find(|p| p.uid == uid)
    }

    /// Subset satisfying ALL supplied predicates; input order preserved.
    pub fn filtered(&self, f: &FilterOptions) -> Vec<&ProjectRecord> {
        self.projects.iter().filter(|p| f.matches(p)).collect()
    }

    pub fn total_submissions(&self, f: &FilterOptions) -> u64 {
        self.filtered(f).iter().map(|p| p.submission_count).sum()
    }
}

impl FilterOptions {
    /// Logical AND over all predicates; an empty/unset predicate matches
    /// everything. A record without a creation date fails a date-bound
    /// predicate (it cannot be shown to be inside the range).
    pub fn matches(&self, p: &ProjectRecord) -> bool {
        self.name_matches(&p.name)
            && (self.countries.is_empty() || self.countries.iter().any(|c| *c == p.country_label))
            && (self.statuses.is_empty() || self.statuses.contains(&p.status))
            && (self.sectors.is_empty()
                || p.sector
                    .as_deref()
                    .map(|s| self.sectors.iter().any(|want| want == s))
                    .unwrap_or(false))
            && self.created_in_range(p.date_created)
            && p.submission_count >= self.min_submissions
    }

    fn name_matches(&self, name: &str) -> bool {
        if self.name_keywords.is_empty() {
            return true;
        }
        let lower = name.to_lowercase();
        self.name_keywords
            .iter()
            .any(|kw| lower.contains(&kw.to_lowercase()))
    }

    fn created_in_range(&self, created: Option<DateTime<Utc>>) -> bool {
        if self.created_from.is_none() && self.created_to.is_none() {
            return true;
        }
        let Some(d) = created.map(|d| d.date_naive()) else {
            return false;
        };
        in_bound(self.created_from, |from| d >= from) && in_bound(self.created_to, |to| d <= to)
    }
}

fn in_bound(bound: Option<NaiveDate>, ok: impl FnOnce(NaiveDate) -> bool) -> bool {
    bound.map(ok).unwrap_or(true)
}
