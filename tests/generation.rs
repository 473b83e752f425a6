use std::time::Duration;

use assert_matches::assert_matches;
use serde_json::json;

use clio_archive::domain::Task;
use clio_archive::error::{ClioError, ErrorKind};
use clio_archive::generation::{
    GeminiHttpClient, GenerationClient, GenerationSettings, extract_text, request_body,
};
use clio_archive::prompt::{build_project_request, build_source_search_request};
use clio_archive::validate::parse_response;

fn unreachable_settings(api_key: Option<&str>) -> GenerationSettings {
    GenerationSettings {
        base_url: "http://127.0.0.1:9/v1beta".to_string(),
        timeout: Duration::from_millis(200),
        api_key: api_key.map(str::to_string),
        ..GenerationSettings::default()
    }
}

#[test]
fn missing_credential_fails_before_any_request() {
    let client = GeminiHttpClient::new(unreachable_settings(None));
    assert!(!client.is_initialized());

    let err = client
        .generate(&build_source_search_request("Tratado de Tordesilhas"))
        .unwrap_err();
    assert_matches!(err, ClioError::Configuration(_));
    assert_eq!(err.kind(), ErrorKind::Configuration);
    assert!(!err.is_retryable());
    assert!(!client.is_initialized());
}

#[test]
fn blank_credential_counts_as_missing() {
    let client = GeminiHttpClient::new(unreachable_settings(Some("   ")));
    assert_matches!(
        client.generate(&build_project_request("Canudos")),
        Err(ClioError::Configuration(_))
    );
}

#[test]
fn body_enables_search_tool_only_when_requested() {
    let search = request_body(&build_source_search_request("Canudos"));
    assert_eq!(search["tools"], json!([{ "googleSearch": {} }]));
    assert_eq!(
        search["generationConfig"]["responseMimeType"],
        "application/json"
    );
    assert_eq!(search["contents"][0]["role"], "user");
    assert!(
        search["contents"][0]["parts"][0]["text"]
            .as_str()
            .unwrap()
            .contains("Canudos")
    );

    let project = request_body(&build_project_request("Canudos"));
    assert!(project.get("tools").is_none());
    assert_eq!(
        project["generationConfig"]["responseSchema"]["required"][0],
        "title"
    );
}

#[test]
fn text_parts_are_concatenated() {
    let envelope = json!({
        "candidates": [{
            "content": { "parts": [
                { "text": "{\"summary\":\"s\"," },
                { "text": "\"sources\":[]}" }
            ]},
            "finishReason": "STOP"
        }]
    });
    let text = extract_text(&envelope).unwrap();
    assert_eq!(text, r#"{"summary":"s","sources":[]}"#);
    assert!(parse_response(Task::Search, &text).is_ok());
}

#[test]
fn candidate_without_text_fails_validation() {
    let envelope = json!({
        "candidates": [{ "content": { "parts": [] }, "finishReason": "MAX_TOKENS" }]
    });
    let text = extract_text(&envelope).unwrap();
    assert_eq!(text, "");
    assert_matches!(
        parse_response(Task::Search, &text),
        Err(ClioError::MalformedResponse { .. })
    );
}

#[test]
fn empty_envelope_is_upstream_error() {
    let err = extract_text(&json!({})).unwrap_err();
    assert_matches!(err, ClioError::UpstreamResponse(_));
    assert_eq!(err.kind(), ErrorKind::Upstream);
}
