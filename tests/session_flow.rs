// tests/session_flow.rs
//
// End-to-end session pipeline against a mock server: load through project
// views (one view failing), analyze forms (one falling back to Missing),
// search, and export.

use std::io::Cursor;
use std::time::Duration;

use kobo_dash::config::options::{ExportKind, SearchOptions, SourceSelect};
use kobo_dash::config::settings::Settings;
use kobo_dash::core::fuzzy::MatchMethod;
use kobo_dash::progress::NullProgress;
use kobo_dash::session::Session;

fn mock_platform(server: &mut mockito::ServerGuard) {
    server
        .mock("GET", "/api/v2/project-views/?format=json")
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"count":2,"next":null,"results":[
                {"uid":"pv1","name":"East Africa"},
                {"uid":"pv2","name":"Broken view"}
            ]}"#,
        )
        .create();
    server
        .mock("GET", "/api/v2/project-views/pv1/assets/?format=json")
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"count":3,"next":null,"results":[
                {"uid":"aF1","name":"Age survey","asset_type":"survey",
                 "deployment_status":"deployed","deployment__submission_count":2},
                {"uid":"aF2","name":"Water survey","asset_type":"survey",
                 "deployment_status":"deployed","deployment__submission_count":0},
                {"uid":"aB1","name":"Question block","asset_type":"block"}
            ]}"#,
        )
        .create();
    server
        .mock("GET", "/api/v2/project-views/pv2/assets/?format=json")
        .with_status(500)
        .create();

    // aF1 has JSON content; aF2 has neither JSON nor XML
    server
        .mock("GET", "/api/v2/assets/aF1/?format=json")
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"uid":"aF1","content":{"survey":[
                {"type":"integer","name":"respondent_age","label":["Age of respondent"]},
                {"type":"begin_group","name":"g"},
                {"type":"text","name":"remarks"},
                {"type":"end_group"}
            ]}}"#,
        )
        .create();
    server
        .mock("GET", "/api/v2/assets/aF2/?format=json")
        .with_header("content-type", "application/json")
        .with_body(r#"{"uid":"aF2","content":null}"#)
        .create();
    server
        .mock("GET", "/api/v2/assets/aF2.xml")
        .with_status(404)
        .create();
}

fn session_for(server: &mockito::ServerGuard) -> Session {
    let settings = Settings {
        server_url: server.url(),
        token: "test-token".to_string(),
        timeout: Duration::from_secs(5),
    };
    Session::new(&settings).unwrap()
}

#[test]
fn load_analyze_search_with_partial_failures() {
    let mut server = mockito::Server::new();
    mock_platform(&mut server);
    let mut session = session_for(&server);
    let mut progress = NullProgress;

    // the broken view is skipped, the good one still loads
    let loaded = session
        .load_projects(&SourceSelect::Views(Vec::new()), &mut progress)
        .unwrap();
    assert_eq!(loaded, 2);
    assert_eq!(session.store().get("aF1").unwrap().source_view_name(), "East Africa");

    let analyzed = session.analyze_forms(&mut progress);
    assert_eq!(analyzed, 2);
    assert!(session.analyses()[0].schema.parse_error.is_none());
    assert!(session.analyses()[1].schema.failed());

    let results = session.run_search(SearchOptions {
        keywords: vec!["age".to_string()],
        method: MatchMethod::PartialRatio,
        threshold: 80,
    });
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].matched_keywords(), 1);
    assert_eq!(results[0].hits[0].question, "respondent_age");
    assert_eq!(results[1].matched_keywords(), 0);
    assert!(results[1].failure.is_some());
}

#[test]
fn a_new_load_supersedes_analyses_and_results() {
    let mut server = mockito::Server::new();
    mock_platform(&mut server);
    let mut session = session_for(&server);
    let mut progress = NullProgress;

    session
        .load_projects(&SourceSelect::Views(Vec::new()), &mut progress)
        .unwrap();
    session.analyze_forms(&mut progress);
    session.run_search(SearchOptions {
        keywords: vec!["age".to_string()],
        ..SearchOptions::default()
    });
    assert!(!session.results().is_empty());

    session
        .load_projects(&SourceSelect::Views(Vec::new()), &mut progress)
        .unwrap();
    assert!(session.analyses().is_empty());
    assert!(session.results().is_empty());
}

#[test]
fn metadata_export_is_a_workbook() {
    let mut server = mockito::Server::new();
    mock_platform(&mut server);
    let mut session = session_for(&server);
    let mut progress = NullProgress;

    session
        .load_projects(&SourceSelect::Views(Vec::new()), &mut progress)
        .unwrap();
    let outcome = session.export(ExportKind::Metadata, &mut progress).unwrap();
    assert_eq!(&outcome.bytes[..2], b"PK");
    assert!(outcome.skipped.is_empty());
}

#[test]
fn xlsform_export_skips_what_it_cannot_fetch() {
    let mut server = mockito::Server::new();
    mock_platform(&mut server);
    server
        .mock("GET", "/api/v2/assets/aF1.xls")
        .with_body("fake xls bytes")
        .create();
    server
        .mock("GET", "/api/v2/assets/aF2.xls")
        .with_status(404)
        .create();

    let mut session = session_for(&server);
    let mut progress = NullProgress;
    session
        .load_projects(&SourceSelect::Views(Vec::new()), &mut progress)
        .unwrap();
    let outcome = session.export(ExportKind::XlsForms, &mut progress).unwrap();

    assert_eq!(outcome.skipped.len(), 1);
    assert!(outcome.skipped[0].contains("aF2"));

    let mut zip = zip::ZipArchive::new(Cursor::new(outcome.bytes)).unwrap();
    let names: Vec<String> = (0..zip.len())
        .map(|i| zip.by_index(i).unwrap().name().to_string())
        .collect();
    assert_eq!(names, vec!["Age_survey_aF1.xls"]);
}

#[test]
fn submissions_export_skips_empty_forms() {
    let mut server = mockito::Server::new();
    mock_platform(&mut server);
    server
        .mock("GET", "/api/v2/assets/aF1/data/?format=json")
        .with_header("content-type", "application/json")
        .with_body(r#"{"count":1,"next":null,"results":[{"_id":1,"respondent_age":34}]}"#)
        .create();
    server
        .mock("GET", "/api/v2/assets/aF2/data/?format=json")
        .with_header("content-type", "application/json")
        .with_body(r#"{"count":0,"next":null,"results":[]}"#)
        .create();

    let mut session = session_for(&server);
    let mut progress = NullProgress;
    session
        .load_projects(&SourceSelect::Views(Vec::new()), &mut progress)
        .unwrap();
    let outcome = session
        .export(ExportKind::Submissions, &mut progress)
        .unwrap();

    assert_eq!(outcome.skipped.len(), 1);
    assert!(outcome.skipped[0].contains("no submissions"));

    let mut zip = zip::ZipArchive::new(Cursor::new(outcome.bytes)).unwrap();
    assert_eq!(zip.len(), 1);
    assert_eq!(zip.by_index(0).unwrap().name(), "Age_survey_aF1.json");
}
