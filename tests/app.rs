use std::sync::{Arc, Barrier, Mutex};
use std::thread;

use assert_matches::assert_matches;

use clio_archive::app::{App, LatestResult, NoopSink, Phase, ProgressEvent, ProgressSink};
use clio_archive::domain::{SourceType, Task};
use clio_archive::error::ClioError;
use clio_archive::generation::{GeminiHttpClient, GenerationClient, GenerationSettings};
use clio_archive::prompt::GenerationRequest;

/// Replays a canned reply and records every request it was handed.
struct ScriptedGenerator {
    reply: Result<String, ClioError>,
    seen: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedGenerator {
    fn ok(raw: &str) -> Self {
        Self {
            reply: Ok(raw.to_string()),
            seen: Mutex::new(Vec::new()),
        }
    }

    fn failing(err: ClioError) -> Self {
        Self {
            reply: Err(err),
            seen: Mutex::new(Vec::new()),
        }
    }

    fn requests(&self) -> Vec<GenerationRequest> {
        self.seen.lock().unwrap().clone()
    }
}

impl GenerationClient for ScriptedGenerator {
    fn generate(&self, request: &GenerationRequest) -> Result<String, ClioError> {
        self.seen.lock().unwrap().push(request.clone());
        match &self.reply {
            Ok(raw) => Ok(raw.clone()),
            Err(ClioError::UpstreamStatus { status, message }) => Err(ClioError::UpstreamStatus {
                status: *status,
                message: message.clone(),
            }),
            Err(err) => Err(ClioError::UpstreamHttp(err.to_string())),
        }
    }
}

#[derive(Default)]
struct RecordingSink {
    events: Mutex<Vec<ProgressEvent>>,
}

impl ProgressSink for RecordingSink {
    fn event(&self, event: ProgressEvent) {
        self.events.lock().unwrap().push(event);
    }
}

const TORDESILHAS: &str = r#"{
    "summary": "O tratado dividiu as terras entre Portugal e Castela.",
    "sources": [{
        "title": "Tratado de Tordesilhas",
        "date": "1494",
        "institution": "Arquivo Nacional da Torre do Tombo",
        "url": "https://digitarq.arquivos.pt/details?id=3908228",
        "description": "Original português do tratado",
        "type": "document",
        "citation": "PORTUGAL. Tratado de Tordesilhas. 1494."
    }]
}"#;

#[test]
fn search_round_trip_for_tordesilhas() {
    let generator = ScriptedGenerator::ok(TORDESILHAS);
    let app = App::new(&generator);
    let sink = RecordingSink::default();

    let result = app.search("Tratado de Tordesilhas", &sink).unwrap();
    assert_eq!(result.sources.len(), 1);
    assert_eq!(result.sources[0].kind, SourceType::Document);
    assert!(result.sources[0].has_deep_url());

    let requests = generator.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].task, Task::Search);
    assert!(requests[0].use_web_search);
    assert!(requests[0].content.contains("Tratado de Tordesilhas"));

    let phases: Vec<Phase> = sink.events.lock().unwrap().iter().map(|e| e.phase).collect();
    assert_eq!(phases, vec![Phase::Prompt, Phase::Generate, Phase::Validate]);
}

#[test]
fn blank_query_never_reaches_generator() {
    let generator = ScriptedGenerator::ok(TORDESILHAS);
    let app = App::new(&generator);
    assert_matches!(app.search("   ", &NoopSink), Err(ClioError::EmptyQuery));
    assert!(generator.requests().is_empty());
}

#[test]
fn query_and_theme_are_sent_as_typed() {
    let generator = ScriptedGenerator::ok(TORDESILHAS);
    let app = App::new(&generator);
    app.search("  Tratado de Tordesilhas\t", &NoopSink).unwrap();
    let _ = app.generate_project(" Greve de 1917 ", &NoopSink);

    let requests = generator.requests();
    assert!(requests[0].content.ends_with("  Tratado de Tordesilhas\t"));
    assert!(requests[1].content.ends_with(" Greve de 1917 "));
}

#[test]
fn search_propagates_malformed_output() {
    let generator = ScriptedGenerator::ok("{not json");
    let app = App::new(&generator);
    assert_matches!(
        app.search("Canudos", &NoopSink),
        Err(ClioError::MalformedResponse { task: Task::Search, .. })
    );
}

#[test]
fn guide_failures_become_empty_list() {
    let malformed = ScriptedGenerator::ok("{\"unexpected\": true}");
    assert!(App::new(&malformed).load_guide(&NoopSink).is_empty());

    let upstream = ScriptedGenerator::failing(ClioError::UpstreamStatus {
        status: 503,
        message: "unavailable".to_string(),
    });
    assert!(App::new(&upstream).load_guide(&NoopSink).is_empty());
}

#[test]
fn guide_returns_sources() {
    let generator = ScriptedGenerator::ok(
        r#"[{"title":"Apologia da História","author":"Marc Bloch","url":"https://example.org/bloch","description":"d","type":"book"}]"#,
    );
    let sources = App::new(&generator).load_guide(&NoopSink);
    assert_eq!(sources.len(), 1);
    assert_eq!(generator.requests()[0].task, Task::GuideArticles);
}

#[test]
fn project_propagates_upstream_errors() {
    let generator = ScriptedGenerator::failing(ClioError::UpstreamStatus {
        status: 429,
        message: "quota".to_string(),
    });
    let err = App::new(&generator)
        .generate_project("Greve de 1917", &NoopSink)
        .unwrap_err();
    assert_matches!(err, ClioError::UpstreamStatus { status: 429, .. });
    assert!(err.is_retryable());
    assert!(!generator.requests()[0].use_web_search);
}

#[test]
fn project_decodes_full_record() {
    let generator = ScriptedGenerator::ok(
        r#"{"title":"t","theme":"Greve de 1917","problem":"p","objectives":{"general":"g","specifics":["a","b"]},"justification":"j","methodology":"m","theoreticalFramework":"tf","expectedResults":"er"}"#,
    );
    let project = App::new(&generator)
        .generate_project("Greve de 1917", &NoopSink)
        .unwrap();
    assert_eq!(project.objectives.specifics, vec!["a", "b"]);
}

#[test]
fn missing_credential_surfaces_through_app() {
    let client = GeminiHttpClient::new(GenerationSettings {
        base_url: "http://127.0.0.1:9/v1beta".to_string(),
        ..GenerationSettings::default()
    });
    let app = App::new(client);
    assert_matches!(
        app.search("Canudos", &NoopSink),
        Err(ClioError::Configuration(_))
    );
    assert!(!app.generator().is_initialized());
}

#[test]
fn stale_result_is_dropped() {
    let latest = LatestResult::new();
    let first = latest.begin();
    let second = latest.begin();

    assert!(latest.complete(second, "segunda"));
    assert!(!latest.complete(first, "primeira"));
    assert_eq!(latest.current(), Some("segunda"));
    assert!(!latest.is_current(first));
}

#[test]
fn latest_request_wins_across_threads() {
    let latest = Arc::new(LatestResult::new());
    let first = latest.begin();
    let second = latest.begin();
    let barrier = Arc::new(Barrier::new(2));

    let handles: Vec<_> = [(first, "A"), (second, "B")]
        .into_iter()
        .map(|(ticket, value)| {
            let latest = Arc::clone(&latest);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                latest.complete(ticket, value.to_string())
            })
        })
        .collect();
    let stored: Vec<bool> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert_eq!(stored, vec![false, true]);
    assert_eq!(latest.current().as_deref(), Some("B"));
}
