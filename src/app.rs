use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::domain::{ResearchProject, SearchResult, Source, Task};
use crate::error::ClioError;
use crate::generation::GenerationClient;
use crate::prompt::TaskRequest;
use crate::validate::{self, TaskOutput};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Prompt,
    Generate,
    Validate,
}

impl Phase {
    pub fn label(self) -> &'static str {
        match self {
            Phase::Prompt => "Prompt",
            Phase::Generate => "Generate",
            Phase::Validate => "Validate",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub task: Task,
    pub phase: Phase,
    pub message: String,
    pub elapsed: Option<Duration>,
}

pub trait ProgressSink {
    fn event(&self, event: ProgressEvent);
}

pub struct NoopSink;

impl ProgressSink for NoopSink {
    fn event(&self, _event: ProgressEvent) {}
}

/// Retrieval front door: builds the prompt, calls the injected generator and validates
/// what comes back. Holds no state between calls.
#[derive(Clone)]
pub struct App<G: GenerationClient> {
    generator: G,
}

impl<G: GenerationClient> App<G> {
    pub fn new(generator: G) -> Self {
        Self { generator }
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    pub fn search(
        &self,
        query: &str,
        sink: &dyn ProgressSink,
    ) -> Result<SearchResult, ClioError> {
        ensure_not_blank(query)?;
        match self.run(
            &TaskRequest::Search {
                query: query.to_string(),
            },
            sink,
        )? {
            TaskOutput::Search(result) => Ok(result),
            other => Err(unexpected_output(Task::Search, &other)),
        }
    }

    /// Never fails: any error is logged and reported as an empty guide.
    pub fn load_guide(&self, sink: &dyn ProgressSink) -> Vec<Source> {
        match self.run(&TaskRequest::GuideArticles, sink) {
            Ok(TaskOutput::GuideArticles(sources)) => sources,
            Ok(other) => {
                let err = unexpected_output(Task::GuideArticles, &other);
                warn!(error = %err, "guide unavailable");
                Vec::new()
            }
            Err(err) => {
                warn!(error = %err, "guide unavailable");
                Vec::new()
            }
        }
    }

    pub fn generate_project(
        &self,
        theme: &str,
        sink: &dyn ProgressSink,
    ) -> Result<ResearchProject, ClioError> {
        ensure_not_blank(theme)?;
        match self.run(
            &TaskRequest::Project {
                theme: theme.to_string(),
            },
            sink,
        )? {
            TaskOutput::Project(project) => Ok(project),
            other => Err(unexpected_output(Task::Project, &other)),
        }
    }

    pub fn run(
        &self,
        request: &TaskRequest,
        sink: &dyn ProgressSink,
    ) -> Result<TaskOutput, ClioError> {
        let task = request.task();
        sink.event(ProgressEvent {
            task,
            phase: Phase::Prompt,
            message: format!("building {task} request"),
            elapsed: None,
        });
        let built = request.build();

        sink.event(ProgressEvent {
            task,
            phase: Phase::Generate,
            message: format!("web_search={}", built.use_web_search),
            elapsed: None,
        });
        let start = Instant::now();
        let raw = self.generator.generate(&built)?;
        let elapsed = start.elapsed();
        debug!(%task, bytes = raw.len(), "raw generation received");

        sink.event(ProgressEvent {
            task,
            phase: Phase::Validate,
            message: format!("validating {} bytes", raw.len()),
            elapsed: Some(elapsed),
        });
        validate::parse_response(task, &raw).inspect_err(|err| {
            warn!(error = %err, "generation output rejected");
        })
    }
}

/// Whitespace only counts for the blank check; the input itself is sent as typed.
fn ensure_not_blank(input: &str) -> Result<(), ClioError> {
    if input.trim().is_empty() {
        return Err(ClioError::EmptyQuery);
    }
    Ok(())
}

fn unexpected_output(task: Task, output: &TaskOutput) -> ClioError {
    ClioError::MalformedResponse {
        task,
        reason: format!("validator produced {} output", output.task()),
        excerpt: String::new(),
    }
}

/// Identifies one initiated request in a [`LatestResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ticket(u64);

/// Last-request-wins slot: only the result of the most recently *initiated* request is
/// kept, whatever order requests complete in. Nothing is cancelled; stale results are
/// dropped on arrival.
#[derive(Debug)]
pub struct LatestResult<T> {
    issued: AtomicU64,
    value: Mutex<Option<(Ticket, T)>>,
}

impl<T: Clone> Default for LatestResult<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> LatestResult<T> {
    pub fn new() -> Self {
        Self {
            issued: AtomicU64::new(0),
            value: Mutex::new(None),
        }
    }

    pub fn begin(&self) -> Ticket {
        Ticket(self.issued.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.issued.load(Ordering::SeqCst) == ticket.0
    }

    /// Stores `value` if `ticket` is still the newest one; returns whether it was stored.
    pub fn complete(&self, ticket: Ticket, value: T) -> bool {
        let mut slot = self
            .value
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if !self.is_current(ticket) {
            debug!(ticket = ticket.0, "dropping stale result");
            return false;
        }
        *slot = Some((ticket, value));
        true
    }

    pub fn current(&self) -> Option<T> {
        self.value
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .as_ref()
            .map(|(_, value)| value.clone())
    }
}
