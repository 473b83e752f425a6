use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::error::Category;
use tracing::warn;

use crate::domain::{ResearchProject, SearchResult, Source, Task};
use crate::error::ClioError;

/// Upper bound, in characters, on raw model text carried inside an error.
pub const EXCERPT_LIMIT: usize = 200;

static CODE_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\A```[A-Za-z0-9_-]*[ \t]*\r?\n(.*?)\r?\n?```\z").unwrap());

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "task", content = "result", rename_all = "kebab-case")]
pub enum TaskOutput {
    Search(SearchResult),
    GuideArticles(Vec<Source>),
    Project(ResearchProject),
}

impl TaskOutput {
    pub fn task(&self) -> Task {
        match self {
            TaskOutput::Search(_) => Task::Search,
            TaskOutput::GuideArticles(_) => Task::GuideArticles,
            TaskOutput::Project(_) => Task::Project,
        }
    }
}

pub fn parse_response(task: Task, raw: &str) -> Result<TaskOutput, ClioError> {
    match task {
        Task::Search => parse_search_result(raw).map(TaskOutput::Search),
        Task::GuideArticles => Ok(TaskOutput::GuideArticles(parse_guide_articles(raw))),
        Task::Project => parse_research_project(raw).map(TaskOutput::Project),
    }
}

pub fn parse_search_result(raw: &str) -> Result<SearchResult, ClioError> {
    let result: SearchResult = decode(Task::Search, raw)?;
    warn_shallow_urls(Task::Search, &result.sources);
    Ok(result)
}

/// Guide articles are a secondary feature: a response that does not decode yields an
/// empty list instead of an error.
pub fn parse_guide_articles(raw: &str) -> Vec<Source> {
    match decode::<Vec<Source>>(Task::GuideArticles, raw) {
        Ok(sources) => {
            warn_shallow_urls(Task::GuideArticles, &sources);
            sources
        }
        Err(err) => {
            warn!(error = %err, "discarding undecodable guide articles");
            Vec::new()
        }
    }
}

pub fn parse_research_project(raw: &str) -> Result<ResearchProject, ClioError> {
    decode(Task::Project, raw)
}

fn decode<T: DeserializeOwned>(task: Task, raw: &str) -> Result<T, ClioError> {
    let body = strip_code_fence(raw);
    serde_json::from_str(body).map_err(|err| {
        let reason = match err.classify() {
            Category::Data => format!("unexpected shape: {err}"),
            Category::Syntax | Category::Eof => format!("invalid JSON: {err}"),
            Category::Io => format!("read failure: {err}"),
        };
        ClioError::MalformedResponse {
            task,
            reason,
            excerpt: excerpt(raw),
        }
    })
}

fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    match CODE_FENCE.captures(trimmed).and_then(|caps| caps.get(1)) {
        Some(inner) => inner.as_str(),
        None => trimmed,
    }
}

fn warn_shallow_urls(task: Task, sources: &[Source]) {
    for source in sources.iter().filter(|source| !source.has_deep_url()) {
        warn!(%task, url = source.url.as_str(), "source URL does not point below the site root");
    }
}

/// First [`EXCERPT_LIMIT`] characters of `raw`, with an ellipsis when cut.
pub fn excerpt(raw: &str) -> String {
    let trimmed = raw.trim();
    match trimmed.char_indices().nth(EXCERPT_LIMIT) {
        Some((cut, _)) => format!("{}…", &trimmed[..cut]),
        None => trimmed.to_string(),
    }
}
