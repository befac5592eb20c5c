// src/cli.rs

use std::env;
use std::path::PathBuf;

use anyhow::{anyhow, bail, Result};
use chrono::NaiveDate;

use crate::config::options::{
    ExportKind, ExportOptions, FilterOptions, SearchOptions, SourceSelect,
};
use crate::config::settings::Settings;
use crate::core::fuzzy::MatchMethod;
use crate::store::ProjectStatus;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    /// List the server's project views.
    Views,
    /// Load projects and print the filtered table.
    Projects,
    /// Load, analyze forms, run a keyword search.
    Search,
    /// Build an export artifact.
    Export,
}

pub struct Params {
    pub command: Command,
    pub settings: Settings,
    pub source: SourceSelect,
    pub filters: FilterOptions,
    pub search: SearchOptions,
    pub export: Option<ExportOptions>,
    pub sep: char,
}

pub fn parse() -> Result<Params> {
    parse_from(env::args().skip(1))
}

fn parse_from(mut args: impl Iterator<Item = String>) -> Result<Params> {
    let command = match args.next().as_deref() {
        Some("views") => Command::Views,
        Some("projects") => Command::Projects,
        Some("search") => Command::Search,
        Some("export") => Command::Export,
        Some("-h") | Some("--help") | None => {
            eprintln!("{}", include_str!("cli_help.txt"));
            std::process::exit(0);
        }
        Some(other) => bail!("Unknown command: {}", other),
    };

    let mut params = Params {
        command,
        settings: Settings::from_env(),
        source: SourceSelect::default(),
        filters: FilterOptions::default(),
        search: SearchOptions::default(),
        export: None,
        sep: '\t',
    };

    if command == Command::Export {
        let kind = args.next().ok_or_else(|| {
            anyhow!("Missing export kind (metadata | xlsforms | submissions | workbook)")
        })?;
        let kind = ExportKind::parse(&kind).ok_or_else(|| anyhow!("Unknown export kind: {}", kind))?;
        params.export = Some(ExportOptions { kind, out: None });
    }

    while let Some(a) = args.next() {
        match a.as_str() {
            "--server" => params.settings.server_url = need(&mut args, "--server")?,
            "--token" => params.settings.token = need(&mut args, "--token")?,
            "--timeout" => {
                let secs: u64 = need(&mut args, "--timeout")?.parse()?;
                params.settings.timeout = std::time::Duration::from_secs(secs);
            }
            "--views" => {
                params.source = SourceSelect::Views(list(&need(&mut args, "--views")?));
            }
            "--all-views" => params.source = SourceSelect::Views(Vec::new()),
            "--all-assets" => params.source = SourceSelect::AllAssets,
            "--name" => params.filters.name_keywords = list(&need(&mut args, "--name")?),
            "--country" => params.filters.countries = list(&need(&mut args, "--country")?),
            "--status" => {
                for s in list(&need(&mut args, "--status")?) {
                    let status = ProjectStatus::parse(&s)
                        .ok_or_else(|| anyhow!("Unknown status: {}", s))?;
                    params.filters.statuses.push(status);
                }
            }
            "--sector" => params.filters.sectors = list(&need(&mut args, "--sector")?),
            "--created-from" => {
                params.filters.created_from = Some(date(&need(&mut args, "--created-from")?)?)
            }
            "--created-to" => {
                params.filters.created_to = Some(date(&need(&mut args, "--created-to")?)?)
            }
            "--min-submissions" => {
                params.filters.min_submissions = need(&mut args, "--min-submissions")?.parse()?
            }
            "-k" | "--keywords" => {
                params.search.keywords = SearchOptions::parse_keywords(&need(&mut args, "--keywords")?)
            }
            "--method" => {
                let v = need(&mut args, "--method")?;
                params.search.method =
                    MatchMethod::parse(&v).ok_or_else(|| anyhow!("Unknown method: {}", v))?;
            }
            "--threshold" => {
                let v: u8 = need(&mut args, "--threshold")?.parse()?;
                if v > 100 {
                    bail!("Threshold out of range (0..100)");
                }
                params.search.threshold = v;
            }
            "-o" | "--out" => {
                let path = PathBuf::from(need(&mut args, "--out")?);
                match &mut params.export {
                    Some(e) => e.out = Some(path),
                    None => bail!("-o only applies to the export command"),
                }
            }
            "--format" => {
                params.sep = match need(&mut args, "--format")?.to_ascii_lowercase().as_str() {
                    "csv" => ',',
                    "tsv" => '\t',
                    other => bail!("Unknown format: {}", other),
                };
            }
            "-h" | "--help" => {
                eprintln!("{}", include_str!("cli_help.txt"));
                std::process::exit(0);
            }
            _ => bail!("Unknown arg: {}", a),
        }
    }

    if command == Command::Search && params.search.keywords.is_empty() {
        bail!("search requires --keywords");
    }
    Ok(params)
}

fn need(args: &mut impl Iterator<Item = String>, flag: &str) -> Result<String> {
    args.next().ok_or_else(|| anyhow!("Missing value for {}", flag))
}

fn list(s: &str) -> Vec<String> {
    s.split(',')
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect()
}

fn date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| anyhow!("Invalid date (expected YYYY-MM-DD): {}", s))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_args(args: &[&str]) -> Result<Params> {
        parse_from(args.iter().map(|s| s.to_string()))
    }

    #[test]
    fn search_command_with_filters_and_keywords() {
        let p = parse_args(&[
            "search",
            "--token", "t",
            "--keywords", "age, Water Source",
            "--method", "partial",
            "--threshold", "75",
            "--country", "Kenya,Nepal",
            "--status", "deployed",
        ])
        .unwrap();
        assert_eq!(p.command, Command::Search);
        assert_eq!(p.search.keywords, vec!["age", "water source"]);
        assert_eq!(p.search.method, MatchMethod::PartialRatio);
        assert_eq!(p.search.threshold, 75);
        assert_eq!(p.filters.countries, vec!["Kenya", "Nepal"]);
        assert_eq!(p.filters.statuses, vec![ProjectStatus::Deployed]);
    }

    #[test]
    fn search_without_keywords_is_rejected() {
        assert!(parse_args(&["search", "--token", "t"]).is_err());
    }

    #[test]
    fn export_takes_a_kind_and_output_path() {
        let p = parse_args(&["export", "workbook", "--token", "t", "-o", "out.xlsx"]).unwrap();
        let e = p.export.unwrap();
        assert_eq!(e.kind, ExportKind::Workbook);
        assert_eq!(e.out_path(), PathBuf::from("out.xlsx"));
    }

    #[test]
    fn export_without_kind_is_rejected() {
        assert!(parse_args(&["export", "--token", "t"]).is_err());
        assert!(parse_args(&["export", "nonsense", "--token", "t"]).is_err());
    }

    #[test]
    fn bad_values_are_rejected() {
        assert!(parse_args(&["projects", "--status", "launched"]).is_err());
        assert!(parse_args(&["projects", "--created-from", "15/03/2024"]).is_err());
        assert!(parse_args(&["search", "-k", "x", "--threshold", "101"]).is_err());
    }
}
