use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Task {
    Search,
    GuideArticles,
    Project,
}

impl Task {
    pub fn as_str(self) -> &'static str {
        match self {
            Task::Search => "search",
            Task::GuideArticles => "guide-articles",
            Task::Project => "project",
        }
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of historiographical source. Labels the model invents outside the known set
/// land in `Other` with the raw label kept, so they render instead of failing decode.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SourceType {
    Document,
    Image,
    Book,
    Article,
    Archive,
    Newspaper,
    Literature,
    Letter,
    OralHistory,
    Other(String),
}

impl SourceType {
    pub const KNOWN: [SourceType; 9] = [
        SourceType::Document,
        SourceType::Image,
        SourceType::Book,
        SourceType::Article,
        SourceType::Archive,
        SourceType::Newspaper,
        SourceType::Literature,
        SourceType::Letter,
        SourceType::OralHistory,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            SourceType::Document => "document",
            SourceType::Image => "image",
            SourceType::Book => "book",
            SourceType::Article => "article",
            SourceType::Archive => "archive",
            SourceType::Newspaper => "newspaper",
            SourceType::Literature => "literature",
            SourceType::Letter => "letter",
            SourceType::OralHistory => "oral_history",
            SourceType::Other(label) => label,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, SourceType::Other(_))
    }

    /// Label used by front ends; unknown kinds fall back to the generic document label.
    pub fn display_label(&self) -> &str {
        match self {
            SourceType::Other(_) => SourceType::Document.as_str(),
            known => known.as_str(),
        }
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceType {
    type Err = std::convert::Infallible;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_lowercase();
        let kind = match normalized.as_str() {
            "document" => SourceType::Document,
            "image" => SourceType::Image,
            "book" => SourceType::Book,
            "article" => SourceType::Article,
            "archive" => SourceType::Archive,
            "newspaper" => SourceType::Newspaper,
            "literature" => SourceType::Literature,
            "letter" => SourceType::Letter,
            "oral_history" | "oral-history" => SourceType::OralHistory,
            _ => SourceType::Other(value.to_string()),
        };
        Ok(kind)
    }
}

impl From<String> for SourceType {
    fn from(value: String) -> Self {
        match value.parse() {
            Ok(kind) => kind,
            Err(never) => match never {},
        }
    }
}

impl From<SourceType> for String {
    fn from(value: SourceType) -> Self {
        value.as_str().to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Source {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub institution: Option<String>,
    pub url: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub social_context: Option<String>,
    #[serde(rename = "type")]
    pub kind: SourceType,
    #[serde(default, alias = "abntCitation", skip_serializing_if = "Option::is_none")]
    pub citation: Option<String>,
}

static DEEP_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?i)https?://[^/?#\s]+(?:/[^?#\s]*[^/?#\s][^?#\s]*|/?[?#]\S+)").unwrap()
});

impl Source {
    /// True when the URL addresses content below the site root (a path segment, a
    /// query or a fragment), not just a domain.
    pub fn has_deep_url(&self) -> bool {
        DEEP_URL.is_match(self.url.trim())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub summary: String,
    pub sources: Vec<Source>,
}

impl SearchResult {
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Objectives {
    pub general: String,
    pub specifics: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResearchProject {
    pub title: String,
    pub theme: String,
    pub problem: String,
    pub objectives: Objectives,
    pub justification: String,
    pub methodology: String,
    pub theoretical_framework: String,
    pub expected_results: String,
}
