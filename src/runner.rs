// src/runner.rs
//
// Command dispatch: builds the session, runs the handlers the command
// needs, prints tables to stdout and writes export artifacts to disk.

use std::fs;

use anyhow::Result;

use crate::cli::{Command, Params};
use crate::core::csv::rows_to_string;
use crate::progress::ConsoleProgress;
use crate::session::Session;

pub fn run(params: &Params) -> Result<()> {
    let mut session = Session::new(&params.settings)?;
    session.filters = params.filters.clone();
    let mut progress = ConsoleProgress::default();

    match params.command {
        Command::Views => {
            let views = session.list_views()?;
            let rows: Vec<Vec<String>> = views
                .iter()
                .map(|v| vec![v.uid.clone(), v.name.clone()])
                .collect();
            print_table(&["uid", "name"], rows, params.sep);
        }

        Command::Projects => {
            session.load_projects(&params.source, &mut progress)?;
            let filtered = session.filtered();
            let rows: Vec<Vec<String>> = filtered
                .iter()
                .map(|p| {
                    vec![
                        p.uid.clone(),
                        p.name.clone(),
                        p.status.label().to_string(),
                        p.submission_count.to_string(),
                        p.country_label.clone(),
                        p.sector.clone().unwrap_or_default(),
                        p.owner.clone(),
                        p.source_view_name().to_string(),
                    ]
                })
                .collect();
            print_table(
                &["uid", "name", "status", "submissions", "country", "sector", "owner", "view"],
                rows,
                params.sep,
            );
            eprintln!(
                "{} of {} project(s), {} submission(s)",
                filtered.len(),
                session.store().len(),
                session.store().total_submissions(&params.filters)
            );
        }

        Command::Search => {
            session.load_projects(&params.source, &mut progress)?;
            session.analyze_forms(&mut progress);
            let results = session.run_search(params.search.clone());
            let rows: Vec<Vec<String>> = results
                .iter()
                .map(|r| {
                    let detail = match &r.failure {
                        Some(why) => format!("extraction failed: {why}"),
                        None => r
                            .hits
                            .iter()
                            .map(|h| format!("{}={} ({})", h.keyword, h.question, h.score))
                            .collect::<Vec<_>>()
                            .join("; "),
                    };
                    vec![
                        r.uid.clone(),
                        r.name.clone(),
                        r.matched_keywords().to_string(),
                        detail,
                    ]
                })
                .collect();
            print_table(&["uid", "name", "matches", "hits"], rows, params.sep);
        }

        Command::Export => {
            // parser guarantees export options exist for this command
            let export = params.export.as_ref().expect("export options");
            session.load_projects(&params.source, &mut progress)?;
            let outcome = session.export(export.kind, &mut progress)?;
            let path = export.out_path();
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent)?;
                }
            }
            fs::write(&path, &outcome.bytes)?;
            println!("Wrote {}", path.display());
            for note in &outcome.skipped {
                eprintln!("skipped: {note}");
            }
        }
    }
    Ok(())
}

fn print_table(headers: &[&str], rows: Vec<Vec<String>>, sep: char) {
    let headers: Vec<String> = headers.iter().map(|h| h.to_string()).collect();
    print!("{}", rows_to_string(Some(&headers), &rows, sep));
}
