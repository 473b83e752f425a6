use std::io::{self, Write};

use serde::Serialize;

use crate::app::{ProgressEvent, ProgressSink};
use crate::domain::{ResearchProject, SearchResult, Source};
use crate::works::AcademicWorkType;

#[derive(Debug, Clone, Copy)]
pub enum OutputMode {
    Interactive,
    NonInteractive,
}

pub struct JsonOutput;

impl JsonOutput {
    pub fn print<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}

impl ProgressSink for JsonOutput {
    fn event(&self, _event: ProgressEvent) {}
}

/// Plain-text rendering for a terminal. `is_saved` marks sources already in the
/// collection.
pub struct TextOutput;

impl TextOutput {
    pub fn render_search(result: &SearchResult, is_saved: impl Fn(&str) -> bool) -> String {
        let mut out = String::new();
        out.push_str(&format!("\"{}\"\n", result.summary.trim()));
        if result.sources.is_empty() {
            out.push_str("\nNo sources found.\n");
            return out;
        }
        for (idx, source) in result.sources.iter().enumerate() {
            out.push('\n');
            out.push_str(&render_source(idx + 1, source, is_saved(&source.url)));
        }
        out
    }

    pub fn render_sources(sources: &[Source], is_saved: impl Fn(&str) -> bool) -> String {
        if sources.is_empty() {
            return "No sources.\n".to_string();
        }
        sources
            .iter()
            .enumerate()
            .map(|(idx, source)| render_source(idx + 1, source, is_saved(&source.url)))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn render_project(project: &ResearchProject) -> String {
        let mut out = String::new();
        out.push_str(&format!("{}\n", project.title));
        out.push_str(&format!("Tema: {}\n\n", project.theme));
        out.push_str(&format!("Problema\n{}\n\n", project.problem));
        out.push_str(&format!("Objetivo geral\n{}\n", project.objectives.general));
        if !project.objectives.specifics.is_empty() {
            out.push_str("\nObjetivos específicos\n");
            for specific in &project.objectives.specifics {
                out.push_str(&format!("- {specific}\n"));
            }
        }
        out.push_str(&format!("\nJustificativa\n{}\n", project.justification));
        out.push_str(&format!("\nMetodologia\n{}\n", project.methodology));
        out.push_str(&format!(
            "\nReferencial teórico\n{}\n",
            project.theoretical_framework
        ));
        out.push_str(&format!(
            "\nResultados esperados\n{}\n",
            project.expected_results
        ));
        out
    }

    pub fn render_works(works: &[AcademicWorkType]) -> String {
        works
            .iter()
            .map(|work| format!("{}\n  {}\n  {}\n", work.title, work.description, work.link))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn print(text: &str) -> io::Result<()> {
        let mut stdout = io::stdout();
        stdout.write_all(text.as_bytes())?;
        if !text.ends_with('\n') {
            stdout.write_all(b"\n")?;
        }
        Ok(())
    }
}

fn render_source(position: usize, source: &Source, saved: bool) -> String {
    let mut out = format!(
        "[{position}] {}{} ({})\n",
        if saved { "* " } else { "" },
        source.title,
        source.kind.display_label()
    );
    let byline = [
        source.author.as_deref(),
        source.date.as_deref(),
        source.institution.as_deref(),
    ]
    .into_iter()
    .flatten()
    .collect::<Vec<_>>()
    .join(" · ");
    if !byline.is_empty() {
        out.push_str(&format!("    {byline}\n"));
    }
    out.push_str(&format!("    {}\n", source.url));
    out.push_str(&format!("    {}\n", source.description));
    if let Some(context) = &source.social_context {
        out.push_str(&format!("    Contexto social: {context}\n"));
    }
    if let Some(citation) = &source.citation {
        out.push_str(&format!("    {citation}\n"));
    }
    out
}
