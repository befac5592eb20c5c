// tests/client_api.rs
//
// HTTP behavior against a mock server: auth header, pagination, error
// mapping, timeout, and the JSON-to-XML form-definition fallback.

use std::time::Duration;

use kobo_dash::api::KoboClient;
use kobo_dash::config::settings::Settings;
use kobo_dash::schema::FormDefinition;
use kobo_dash::Error;

fn settings(server: &mockito::ServerGuard, timeout_secs: u64) -> Settings {
    Settings {
        server_url: server.url(),
        token: "test-token".to_string(),
        timeout: Duration::from_secs(timeout_secs),
    }
}

#[test]
fn pagination_follows_next_links_and_sends_the_token() {
    let mut server = mockito::Server::new();
    let next = format!("{}/api/v2/assets/?format=json&page=2", server.url());
    let page1 = server
        .mock("GET", "/api/v2/assets/?format=json")
        .match_header("authorization", "Token test-token")
        .with_header("content-type", "application/json")
        .with_body(format!(
            r#"{{"count":3,"next":"{next}","results":[
                {{"uid":"a1","name":"one","asset_type":"survey"}},
                {{"uid":"a2","name":"not a form","asset_type":"block"}}
            ]}}"#
        ))
        .create();
    let page2 = server
        .mock("GET", "/api/v2/assets/?format=json&page=2")
        .match_header("authorization", "Token test-token")
        .with_header("content-type", "application/json")
        .with_body(r#"{"count":3,"next":null,"results":[{"uid":"a3","name":"three","asset_type":"survey"}]}"#)
        .create();

    let client = KoboClient::new(&settings(&server, 5)).unwrap();
    let assets = client.list_assets().unwrap();
    let uids: Vec<&str> = assets.iter().map(|a| a.uid.as_str()).collect();

    // both pages drained, non-survey assets dropped
    assert_eq!(uids, vec!["a1", "a3"]);
    page1.assert();
    page2.assert();
}

#[test]
fn view_assets_are_narrowed_to_surveys() {
    let mut server = mockito::Server::new();
    server
        .mock("GET", "/api/v2/project-views/pv1/assets/?format=json")
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"count":3,"next":null,"results":[
                {"uid":"a1","name":"form","asset_type":"survey"},
                {"uid":"a2","name":"library block","asset_type":"block"},
                {"uid":"a3","name":"template","asset_type":"template"}
            ]}"#,
        )
        .create();

    let client = KoboClient::new(&settings(&server, 5)).unwrap();
    let assets = client.list_view_assets("pv1").unwrap();
    let uids: Vec<&str> = assets.iter().map(|a| a.uid.as_str()).collect();
    assert_eq!(uids, vec!["a1"]);
}

#[test]
fn http_error_names_the_failing_endpoint() {
    let mut server = mockito::Server::new();
    server
        .mock("GET", "/api/v2/project-views/?format=json")
        .with_status(500)
        .create();

    let client = KoboClient::new(&settings(&server, 5)).unwrap();
    let err = client.list_project_views().unwrap_err();
    match &err {
        Error::Http { endpoint, status } => {
            assert_eq!(*status, 500);
            assert!(endpoint.contains("/project-views/"), "endpoint: {endpoint}");
        }
        other => panic!("expected Http error, got {other:?}"),
    }
    assert!(err.is_recoverable());
}

#[test]
fn slow_server_is_a_single_recoverable_fetch_error() {
    let mut server = mockito::Server::new();
    server
        .mock("GET", "/api/v2/assets/aSlow/data/?format=json")
        .with_chunked_body(|w| {
            std::thread::sleep(Duration::from_millis(1500));
            w.write_all(b"{\"results\":[]}")
        })
        .create();

    let client = KoboClient::new(&settings(&server, 1)).unwrap();
    let err = client.fetch_submissions("aSlow").unwrap_err();
    match &err {
        Error::Fetch { endpoint, .. } => assert!(endpoint.contains("aSlow"), "endpoint: {endpoint}"),
        other => panic!("expected Fetch error, got {other:?}"),
    }
    assert!(err.is_recoverable());
}

#[test]
fn json_content_with_a_survey_wins() {
    let mut server = mockito::Server::new();
    server
        .mock("GET", "/api/v2/assets/aJson/?format=json")
        .with_header("content-type", "application/json")
        .with_body(r#"{"uid":"aJson","content":{"survey":[{"type":"text","name":"q1"}]}}"#)
        .create();

    let client = KoboClient::new(&settings(&server, 5)).unwrap();
    match client.fetch_form_definition("aJson").unwrap() {
        FormDefinition::Json(content) => assert!(content.get("survey").is_some()),
        other => panic!("expected Json definition, got {other:?}"),
    }
}

#[test]
fn null_json_content_falls_back_to_xml() {
    let mut server = mockito::Server::new();
    server
        .mock("GET", "/api/v2/assets/aXml/?format=json")
        .with_header("content-type", "application/json")
        .with_body(r#"{"uid":"aXml","content":null}"#)
        .create();
    server
        .mock("GET", "/api/v2/assets/aXml.xml")
        .with_body("<h:html><h:body><input ref=\"/data/q1\"/></h:body></h:html>")
        .create();

    let client = KoboClient::new(&settings(&server, 5)).unwrap();
    match client.fetch_form_definition("aXml").unwrap() {
        FormDefinition::Xml(text) => assert!(text.contains("input")),
        other => panic!("expected Xml definition, got {other:?}"),
    }
}

#[test]
fn both_sources_absent_resolves_to_missing() {
    let mut server = mockito::Server::new();
    server
        .mock("GET", "/api/v2/assets/aNone/?format=json")
        .with_header("content-type", "application/json")
        .with_body(r#"{"uid":"aNone"}"#)
        .create();
    server
        .mock("GET", "/api/v2/assets/aNone.xml")
        .with_status(404)
        .create();

    let client = KoboClient::new(&settings(&server, 5)).unwrap();
    assert!(matches!(
        client.fetch_form_definition("aNone").unwrap(),
        FormDefinition::Missing
    ));
}

#[test]
fn bad_settings_fail_before_any_request() {
    let no_token = Settings {
        token: String::new(),
        ..Settings::default()
    };
    match KoboClient::new(&no_token) {
        Err(Error::Config(_)) => {}
        Err(other) => panic!("expected Config error, got {other:?}"),
        Ok(_) => panic!("expected Config error, got a client"),
    }
}
