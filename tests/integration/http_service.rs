use super::common::{completion_body, serve_once, OK_STATUS};
use docrev::dispatch_revisions;
use docrev::extract::ParagraphUnit;
use docrev::revise::{
    ChatCompletionsBackend, RevisionBackend, RevisionClient, RevisionError, ServiceSettings,
    SilentProgress,
};
use std::time::Duration;

fn settings(endpoint: &str, timeout: Duration) -> ServiceSettings {
    ServiceSettings {
        endpoint: endpoint.to_string(),
        timeout,
        ..ServiceSettings::default()
    }
}

#[test]
fn test_successful_revision_replaces_text() {
    let (url, server) = serve_once(OK_STATUS, completion_body("  Hello world.\n"), Duration::ZERO);
    let units = [ParagraphUnit::new(0, "Helo wrld.")];

    let table = dispatch_revisions(&units, "sk-test", &url, 1, &SilentProgress);
    assert_eq!(table.len(), 1);
    assert_eq!(table.get(0), Some("Hello world."));

    let request = server.join().unwrap();
    let lower = request.to_ascii_lowercase();
    assert!(request.starts_with("POST /chat/completions"));
    assert!(lower.contains("authorization: bearer sk-test"));
    assert!(lower.contains("content-type: application/json"));
    assert!(request.contains(r#""model":"deepseek-chat""#));
    assert!(request.contains(r#""role":"user""#));
    assert!(request.contains("Helo wrld."));
}

#[test]
fn test_server_error_keeps_original() {
    let (url, server) = serve_once(
        "500 Internal Server Error",
        r#"{"error":"overloaded"}"#.to_string(),
        Duration::ZERO,
    );
    let units = [ParagraphUnit::new(0, "Keep me.")];

    let table = dispatch_revisions(&units, "sk-test", &url, 5, &SilentProgress);
    assert_eq!(table.get(0), Some("Keep me."));
    server.join().unwrap();
}

#[test]
fn test_server_error_is_reported_as_status() {
    let (url, server) = serve_once(
        "429 Too Many Requests",
        "slow down".to_string(),
        Duration::ZERO,
    );
    let backend =
        ChatCompletionsBackend::new("sk-test", settings(&url, Duration::from_secs(5))).unwrap();

    let err = backend
        .try_revise(&ParagraphUnit::new(0, "text"))
        .unwrap_err();
    match err {
        RevisionError::Status { status, body } => {
            assert_eq!(status, 429);
            assert_eq!(body, "slow down");
        }
        other => panic!("expected status error, got {other:?}"),
    }
    server.join().unwrap();
}

#[test]
fn test_malformed_body_keeps_original() {
    let (url, server) = serve_once(OK_STATUS, "<html>not json</html>".to_string(), Duration::ZERO);
    let backend =
        ChatCompletionsBackend::new("sk-test", settings(&url, Duration::from_secs(5))).unwrap();
    let client = RevisionClient::new(backend);

    let unit = ParagraphUnit::new(2, "Original paragraph.");
    assert_eq!(client.revise(&unit), "Original paragraph.");
    assert_eq!(client.failure_count(), 1);
    server.join().unwrap();
}

#[test]
fn test_blank_content_keeps_original() {
    let (url, server) = serve_once(OK_STATUS, completion_body("   "), Duration::ZERO);
    let backend =
        ChatCompletionsBackend::new("sk-test", settings(&url, Duration::from_secs(5))).unwrap();

    let unit = ParagraphUnit::new(0, "Original.");
    assert!(matches!(
        backend.try_revise(&unit),
        Err(RevisionError::EmptyContent)
    ));
    server.join().unwrap();
}

#[test]
fn test_timeout_keeps_original() {
    let (url, _server) = serve_once(
        OK_STATUS,
        completion_body("too late"),
        Duration::from_secs(3),
    );
    let backend =
        ChatCompletionsBackend::new("sk-test", settings(&url, Duration::from_millis(300))).unwrap();
    let client = RevisionClient::new(backend);

    let unit = ParagraphUnit::new(0, "Patience.");
    assert_eq!(client.revise(&unit), "Patience.");
    assert_eq!(client.failure_count(), 1);
}

#[test]
fn test_unreachable_endpoint_keeps_originals() {
    // Nothing listens on the discard port of the loopback interface.
    let units = [
        ParagraphUnit::new(0, "One."),
        ParagraphUnit::new(1, "Two."),
    ];
    let table = dispatch_revisions(
        &units,
        "sk-test",
        "http://127.0.0.1:9/chat/completions",
        2,
        &SilentProgress,
    );
    assert_eq!(table.as_slice(), ["One.", "Two."]);
}
