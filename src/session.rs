// src/session.rs
//
// Explicit state ownership for one user session. The session holds the last
// fetch, the last schema extraction and the last search; each handler call
// replaces its slice of state wholesale, so a new load supersedes everything
// downstream of it. There is no background work: every handler runs to
// completion before the next can start.

use crate::api::types::ProjectView;
use crate::api::KoboClient;
use crate::config::options::{ExportKind, FilterOptions, SearchOptions, SourceSelect};
use crate::config::settings::Settings;
use crate::error::Error;
use crate::export::{self, ArchiveEntry, ExportOutcome, FormSubmissions};
use crate::progress::Progress;
use crate::schema::{self, FormSchema};
use crate::search::{self, MatchResult};
use crate::store::{ProjectRecord, ProjectStore, ViewRef};

/// Extraction output for one form, kept until the next analyze or load.
#[derive(Debug)]
pub struct FormAnalysis {
    pub uid: String,
    pub name: String,
    pub schema: FormSchema,
}

pub struct Session {
    client: KoboClient,
    store: ProjectStore,
    pub filters: FilterOptions,
    analyses: Vec<FormAnalysis>,
    search: SearchOptions,
    results: Vec<MatchResult>,
}

impl Session {
    pub fn new(settings: &Settings) -> Result<Self, Error> {
        Ok(Self {
            client: KoboClient::new(settings)?,
            store: ProjectStore::new(),
            filters: FilterOptions::default(),
            analyses: Vec::new(),
            search: SearchOptions::default(),
            results: Vec::new(),
        })
    }

    /* ---- accessors ---- */

    pub fn store(&self) -> &ProjectStore {
        &self.store
    }

    pub fn filtered(&self) -> Vec<&ProjectRecord> {
        self.store.filtered(&self.filters)
    }

    pub fn analyses(&self) -> &[FormAnalysis] {
        &self.analyses
    }

    pub fn results(&self) -> &[MatchResult] {
        &self.results
    }

    pub fn list_views(&self) -> Result<Vec<ProjectView>, Error> {
        self.client.list_project_views()
    }

    /* ---- handlers ---- */

    /// Fetch project metadata and replace the store. Schemas and search
    /// results from the previous load are discarded.
    pub fn load_projects(
        &mut self,
        source: &SourceSelect,
        progress: &mut dyn Progress,
    ) -> Result<usize, Error> {
        let records = match source {
            SourceSelect::AllAssets => self
                .client
                .list_assets()?
                .into_iter()
                .map(|a| a.into_record(None))
                .collect(),
            SourceSelect::Views(wanted) => self.load_from_views(wanted, progress)?,
        };
        self.store.replace(records);
        self.analyses.clear();
        self.results.clear();
        Ok(self.store.len())
    }

    /// One failing view is skipped with a note; the others still load.
    fn load_from_views(
        &self,
        wanted: &[String],
        progress: &mut dyn Progress,
    ) -> Result<Vec<ProjectRecord>, Error> {
        let views: Vec<ProjectView> = self
            .client
            .list_project_views()?
            .into_iter()
            .filter(|v| wanted.is_empty() || wanted.contains(&v.uid))
            .collect();

        progress.begin("loading project views", views.len());
        let mut records = Vec::new();
        for view in &views {
            let tag = ViewRef {
                uid: view.uid.clone(),
                name: view.name.clone(),
            };
            match self.client.list_view_assets(&view.uid) {
                Ok(assets) => {
                    records.extend(assets.into_iter().map(|a| a.into_record(Some(&tag))));
                    progress.item_done(&view.name);
                }
                Err(e) => {
                    log::warn!("skipping view {}: {e}", view.uid);
                    progress.item_failed(&view.name, &e.to_string());
                }
            }
        }
        progress.finish();
        Ok(records)
    }

    /// Fetch and extract form definitions for the currently filtered set.
    /// A form whose fetch fails degrades to a recorded failure; the batch
    /// continues. Search results are invalidated.
    pub fn analyze_forms(&mut self, progress: &mut dyn Progress) -> usize {
        let targets: Vec<(String, String)> = self
            .filtered()
            .iter()
            .map(|p| (p.uid.clone(), p.name.clone()))
            .collect();

        progress.begin("analyzing forms", targets.len());
        let mut analyses = Vec::with_capacity(targets.len());
        for (uid, name) in targets {
            let schema = match self.client.fetch_form_definition(&uid) {
                Ok(def) => schema::extract(&def),
                Err(e) => FormSchema::failure(e.to_string()),
            };
            match &schema.parse_error {
                None => progress.item_done(&name),
                Some(why) => progress.item_failed(&name, why),
            }
            analyses.push(FormAnalysis { uid, name, schema });
        }
        progress.finish();

        self.analyses = analyses;
        self.results.clear();
        self.analyses.len()
    }

    /// Replace the search parameters and recompute results over the current
    /// analyses.
    pub fn run_search(&mut self, options: SearchOptions) -> &[MatchResult] {
        self.results = search::search_forms(
            self.analyses
                .iter()
                .map(|a| (a.uid.as_str(), a.name.as_str(), &a.schema)),
            &options,
        );
        self.search = options;
        &self.results
    }

    /* ---- exports ---- */

    /// Build the requested artifact over the currently filtered projects.
    pub fn export(
        &self,
        kind: ExportKind,
        progress: &mut dyn Progress,
    ) -> Result<ExportOutcome, Error> {
        match kind {
            ExportKind::Metadata => Ok(ExportOutcome {
                bytes: export::metadata_workbook(&self.filtered())?,
                skipped: Vec::new(),
            }),
            ExportKind::XlsForms => self.export_xlsforms(progress),
            ExportKind::Submissions => self.export_submissions(progress),
            ExportKind::Workbook => self.export_workbook(progress),
        }
    }

    fn export_xlsforms(&self, progress: &mut dyn Progress) -> Result<ExportOutcome, Error> {
        let targets = self.filtered();
        progress.begin("fetching XLSForms", targets.len());
        let mut entries = Vec::new();
        let mut skipped = Vec::new();
        for p in targets {
            match self.client.fetch_xlsform(&p.uid) {
                Ok(bytes) => {
                    entries.push(ArchiveEntry {
                        name: format!("{}.xls", export::entry_stem(&p.name, &p.uid)),
                        bytes,
                    });
                    progress.item_done(&p.name);
                }
                Err(e) => {
                    progress.item_failed(&p.name, &e.to_string());
                    skipped.push(format!("{} ({}): {e}", p.name, p.uid));
                }
            }
        }
        progress.finish();
        Ok(ExportOutcome {
            bytes: export::archive(&entries)?,
            skipped,
        })
    }

    fn export_submissions(&self, progress: &mut dyn Progress) -> Result<ExportOutcome, Error> {
        let targets = self.filtered();
        progress.begin("fetching submissions", targets.len());
        let mut entries = Vec::new();
        let mut skipped = Vec::new();
        for p in targets {
            match self.client.fetch_submissions(&p.uid) {
                Ok(rows) if rows.is_empty() => {
                    progress.item_failed(&p.name, "no submissions");
                    skipped.push(format!("{} ({}): no submissions", p.name, p.uid));
                }
                Ok(rows) => {
                    let bytes = serde_json::to_vec_pretty(&rows)
                        .map_err(|e| Error::Export(e.to_string()))?;
                    entries.push(ArchiveEntry {
                        name: format!("{}.json", export::entry_stem(&p.name, &p.uid)),
                        bytes,
                    });
                    progress.item_done(&p.name);
                }
                Err(e) => {
                    progress.item_failed(&p.name, &e.to_string());
                    skipped.push(format!("{} ({}): {e}", p.name, p.uid));
                }
            }
        }
        progress.finish();
        Ok(ExportOutcome {
            bytes: export::archive(&entries)?,
            skipped,
        })
    }

    fn export_workbook(&self, progress: &mut dyn Progress) -> Result<ExportOutcome, Error> {
        let targets = self.filtered();
        progress.begin("fetching submissions", targets.len());
        let mut forms = Vec::new();
        let mut skipped = Vec::new();
        for p in targets {
            match self.client.fetch_submissions(&p.uid) {
                Ok(rows) if rows.is_empty() => {
                    progress.item_failed(&p.name, "no submissions");
                    skipped.push(format!("{} ({}): no submissions", p.name, p.uid));
                }
                Ok(rows) => {
                    forms.push(FormSubmissions {
                        name: p.name.clone(),
                        uid: p.uid.clone(),
                        rows,
                    });
                    progress.item_done(&p.name);
                }
                Err(e) => {
                    progress.item_failed(&p.name, &e.to_string());
                    skipped.push(format!("{} ({}): {e}", p.name, p.uid));
                }
            }
        }
        progress.finish();
        Ok(ExportOutcome {
            bytes: export::submissions_workbook(&forms)?,
            skipped,
        })
    }
}
