use std::process::ExitCode;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use clio_archive::app::{App, ProgressEvent, ProgressSink};
use clio_archive::citation::citation_text;
use clio_archive::clipboard::{CitationCopier, CopyStatus, RETAINED_AFTER_EXIT, SystemClipboard};
use clio_archive::collection::{FileStorage, SaveOutcome, SaveReport, SavedCollection};
use clio_archive::config::{ConfigLoader, ResolvedConfig};
use clio_archive::domain::{SearchResult, Source};
use clio_archive::error::{ClioError, ErrorKind};
use clio_archive::generation::GeminiHttpClient;
use clio_archive::output::{JsonOutput, OutputMode, TextOutput};
use clio_archive::works::{ACADEMIC_WORK_TYPES, find_work_type};

#[derive(Parser)]
#[command(name = "clio")]
#[command(about = "Historiographical sources with ABNT citations, methodology guides and research-project drafts")]
#[command(version, author)]
struct Cli {
    #[arg(long, global = true)]
    non_interactive: bool,

    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Search historical sources for a query")]
    Search(SearchArgs),
    #[command(about = "List curated methodology references")]
    Guide,
    #[command(about = "Draft a research project for a theme")]
    Project(ProjectArgs),
    #[command(about = "Manage saved sources")]
    Saved(SavedArgs),
    #[command(about = "Describe academic work types")]
    Works(WorksArgs),
}

#[derive(Args)]
struct SearchArgs {
    #[arg(required = true)]
    query: Vec<String>,

    /// Toggle the N-th result (1-based) in the saved collection; repeatable.
    #[arg(long = "save", value_name = "N")]
    save: Vec<usize>,
}

#[derive(Args)]
struct ProjectArgs {
    #[arg(required = true)]
    theme: Vec<String>,
}

#[derive(Args)]
struct SavedArgs {
    #[command(subcommand)]
    command: Option<SavedCommand>,
}

#[derive(Subcommand)]
enum SavedCommand {
    #[command(about = "List saved sources")]
    List,
    #[command(about = "Remove a saved source by URL")]
    Remove { url: String },
    #[command(about = "Copy the citation of a saved source to the clipboard")]
    Cite {
        url: String,

        /// Seconds to keep serving the clipboard before exiting (Linux only; other
        /// platforms keep the text after exit).
        #[arg(long, value_name = "SECS", default_value_t = 10)]
        hold: u64,
    },
}

#[derive(Args)]
struct WorksArgs {
    filter: Option<String>,
}

#[derive(Serialize)]
struct SearchReport<'a> {
    result: &'a SearchResult,
    toggled: &'a [SaveReport],
}

#[derive(Serialize)]
struct CiteReport<'a> {
    url: &'a str,
    citation: &'a str,
    status: &'static str,
    retained: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    held_secs: Option<u64>,
}

struct LogSink;

impl ProgressSink for LogSink {
    fn event(&self, event: ProgressEvent) {
        match event.elapsed {
            Some(elapsed) => info!(
                task = %event.task,
                phase = event.phase.label(),
                elapsed_ms = elapsed.as_millis() as u64,
                "{}",
                event.message
            ),
            None => info!(task = %event.task, phase = event.phase.label(), "{}", event.message),
        }
    }
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(clio) = report.downcast_ref::<ClioError>() {
            eprintln!("{}", clio.user_message());
            return ExitCode::from(map_exit_code(clio));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &ClioError) -> u8 {
    match error.kind() {
        ErrorKind::Configuration | ErrorKind::Input => 2,
        ErrorKind::Upstream => 3,
        ErrorKind::MalformedResponse => 4,
        ErrorKind::Persistence => 5,
        ErrorKind::Local => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = dotenvy::dotenv()
        && !err.not_found()
    {
        warn!(error = %err, "ignoring unreadable .env file");
    }

    let cli = Cli::parse();
    let output_mode = if cli.non_interactive {
        OutputMode::NonInteractive
    } else {
        OutputMode::Interactive
    };
    let config = ConfigLoader::resolve(cli.config.as_deref())?;

    match cli.command {
        Commands::Search(args) => run_search(args, &config, output_mode),
        Commands::Guide => run_guide(&config, output_mode),
        Commands::Project(args) => run_project(args, &config, output_mode),
        Commands::Saved(args) => run_saved(args, &config, output_mode),
        Commands::Works(args) => run_works(args, output_mode),
    }
}

fn build_app(config: &ResolvedConfig) -> App<GeminiHttpClient> {
    App::new(GeminiHttpClient::new(config.generation.clone()))
}

fn open_collection(config: &ResolvedConfig) -> Result<SavedCollection<FileStorage>, ClioError> {
    let storage = match &config.data_dir {
        Some(dir) => FileStorage::in_dir(dir),
        None => FileStorage::new()?,
    };
    Ok(SavedCollection::load(storage))
}

fn run_search(
    args: SearchArgs,
    config: &ResolvedConfig,
    output_mode: OutputMode,
) -> miette::Result<()> {
    let query = args.query.join(" ");
    let app = build_app(config);
    let result = match output_mode {
        OutputMode::NonInteractive => app.search(&query, &JsonOutput)?,
        OutputMode::Interactive => app.search(&query, &LogSink)?,
    };

    // Saving is secondary: the results are printed whatever happens to the collection,
    // and a storage failure only decides the exit code afterwards.
    let mut deferred = None;
    let mut toggled = Vec::new();
    let collection = match open_collection(config) {
        Ok(mut collection) => {
            if !args.save.is_empty() {
                let (reports, error) = collection.toggle_positions(&result.sources, &args.save);
                toggled = reports;
                deferred = error;
            }
            Some(collection)
        }
        Err(err) => {
            warn!(error = %err, "saved collection unavailable");
            if !args.save.is_empty() {
                deferred = Some(err);
            }
            None
        }
    };

    match output_mode {
        OutputMode::NonInteractive => JsonOutput::print(&SearchReport {
            result: &result,
            toggled: &toggled,
        })
        .into_diagnostic()?,
        OutputMode::Interactive => {
            let mut text = TextOutput::render_search(&result, |url| {
                collection
                    .as_ref()
                    .is_some_and(|collection| collection.is_saved(url))
            });
            for report in &toggled {
                let target = report.url.as_deref().unwrap_or("-");
                text.push_str(&format!(
                    "\n#{} {}: {}",
                    report.position,
                    outcome_label(report.outcome),
                    target
                ));
            }
            TextOutput::print(&text).into_diagnostic()?
        }
    }

    match deferred {
        Some(err) => Err(err.into()),
        None => Ok(()),
    }
}

fn outcome_label(outcome: SaveOutcome) -> &'static str {
    match outcome {
        SaveOutcome::Added => "saved",
        SaveOutcome::Removed => "unsaved",
        SaveOutcome::Replaced => "replaced",
        SaveOutcome::NotPersisted => "changed for this session only",
        SaveOutcome::NoSuchResult => "no such result",
    }
}

fn run_guide(config: &ResolvedConfig, output_mode: OutputMode) -> miette::Result<()> {
    let app = build_app(config);
    match output_mode {
        OutputMode::NonInteractive => {
            let sources = app.load_guide(&JsonOutput);
            JsonOutput::print(&sources).into_diagnostic()
        }
        OutputMode::Interactive => {
            let sources = app.load_guide(&LogSink);
            if sources.is_empty() {
                return TextOutput::print("No methodology guide available right now.")
                    .into_diagnostic();
            }
            let collection = open_collection(config)?;
            TextOutput::print(&TextOutput::render_sources(&sources, |url| {
                collection.is_saved(url)
            }))
            .into_diagnostic()
        }
    }
}

fn run_project(
    args: ProjectArgs,
    config: &ResolvedConfig,
    output_mode: OutputMode,
) -> miette::Result<()> {
    let theme = args.theme.join(" ");
    let app = build_app(config);
    match output_mode {
        OutputMode::NonInteractive => {
            let project = app.generate_project(&theme, &JsonOutput)?;
            JsonOutput::print(&project).into_diagnostic()
        }
        OutputMode::Interactive => {
            let project = app.generate_project(&theme, &LogSink)?;
            TextOutput::print(&TextOutput::render_project(&project)).into_diagnostic()
        }
    }
}

fn run_saved(
    args: SavedArgs,
    config: &ResolvedConfig,
    output_mode: OutputMode,
) -> miette::Result<()> {
    let mut collection = open_collection(config)?;
    match args.command.unwrap_or(SavedCommand::List) {
        SavedCommand::List => match output_mode {
            OutputMode::NonInteractive => {
                JsonOutput::print(&collection.sources()).into_diagnostic()
            }
            OutputMode::Interactive => {
                let text = format!(
                    "Saved ({})\n\n{}",
                    collection.len(),
                    TextOutput::render_sources(collection.sources(), |_| true)
                );
                TextOutput::print(&text).into_diagnostic()
            }
        },
        SavedCommand::Remove { url } => {
            let removed = collection.remove(&url)?;
            match output_mode {
                OutputMode::NonInteractive => JsonOutput::print(&removed).into_diagnostic(),
                OutputMode::Interactive => {
                    TextOutput::print(&format!("removed: {}", removed.title)).into_diagnostic()
                }
            }
        }
        SavedCommand::Cite { url, hold } => {
            let source = collection
                .get(&url)
                .ok_or_else(|| ClioError::SourceNotFound(url.clone()))?;
            run_cite(source, Duration::from_secs(hold), output_mode)
        }
    }
}

fn run_cite(source: &Source, hold: Duration, output_mode: OutputMode) -> miette::Result<()> {
    let citation = citation_text(source, chrono::Local::now().date_naive());
    let hold = if RETAINED_AFTER_EXIT { Duration::ZERO } else { hold };
    if matches!(output_mode, OutputMode::Interactive) {
        TextOutput::print(&citation).into_diagnostic()?;
        if !hold.is_zero() {
            TextOutput::print(&format!(
                "[on the clipboard for {}s, paste it now]",
                hold.as_secs()
            ))
            .into_diagnostic()?;
        }
    }

    let copied = match SystemClipboard::with_hold(hold) {
        Ok(clipboard) => {
            let mut copier = CitationCopier::new(clipboard);
            match copier.copy_citation(&citation, &source.url) {
                Ok(()) => true,
                Err(err) => {
                    warn!(error = %err, "citation not copied");
                    false
                }
            }
        }
        Err(err) => {
            warn!(error = %err, "clipboard unavailable");
            false
        }
    };
    let status = CopyStatus::resolve(copied, hold);

    match output_mode {
        OutputMode::NonInteractive => JsonOutput::print(&CiteReport {
            url: &source.url,
            citation: &citation,
            status: status.label(),
            retained: status.is_retained(),
            held_secs: match status {
                CopyStatus::Held(held) => Some(held.as_secs()),
                _ => None,
            },
        })
        .into_diagnostic(),
        OutputMode::Interactive => {
            let line = match status {
                CopyStatus::Copied => "[COPIED]".to_string(),
                CopyStatus::Held(_) => "[clipboard released]".to_string(),
                CopyStatus::NotRetained => {
                    "[NOT COPIED: the clipboard is cleared when clio exits]".to_string()
                }
                CopyStatus::NotCopied => "[NOT COPIED]".to_string(),
            };
            TextOutput::print(&line).into_diagnostic()
        }
    }
}

fn run_works(args: WorksArgs, output_mode: OutputMode) -> miette::Result<()> {
    let works = match args.filter.as_deref() {
        Some(filter) => {
            let work = find_work_type(filter)
                .ok_or_else(|| miette::miette!("no academic work type matches {filter:?}"))?;
            std::slice::from_ref(work)
        }
        None => ACADEMIC_WORK_TYPES,
    };
    match output_mode {
        OutputMode::NonInteractive => JsonOutput::print(&works).into_diagnostic(),
        OutputMode::Interactive => {
            TextOutput::print(&TextOutput::render_works(works)).into_diagnostic()
        }
    }
}
