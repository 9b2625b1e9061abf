//! Console presentation: tables, progress and interactive prompts

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use inquire::{Confirm, InquireError, Select};
use lexgraph_core::{GraphTriplet, LegalDocument, LegalEntity};
use lexgraph_extractor::{PipelineObserver, PipelineState, Stage, TracingObserver};
use lexgraph_graph::{ArticleRecord, GraphStatistics, RelationRecord, SaveReport};

const CELL_WIDTH: usize = 40;

/// Cut `text` to `width` characters, marking the cut with `...`
pub fn truncate(text: &str, width: usize) -> String {
    let single_line = text.replace('\n', " ");
    if single_line.chars().count() <= width {
        return single_line;
    }
    let kept: String = single_line.chars().take(width.saturating_sub(3)).collect();
    format!("{kept}...")
}

/// Render rows as a left-aligned text table
pub fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(w) = widths.get_mut(i) {
                *w = (*w).max(cell.chars().count());
            }
        }
    }

    let line = |cells: Vec<&str>| -> String {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, w)| {
                let pad = w.saturating_sub(cell.chars().count());
                format!("{cell}{}", " ".repeat(pad))
            })
            .collect::<Vec<_>>()
            .join(" | ")
            .trim_end()
            .to_string()
    };

    let mut out = String::new();
    out.push_str(&line(headers.to_vec()));
    out.push('\n');
    out.push_str(
        &widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("-+-"),
    );
    out.push('\n');
    for row in rows {
        out.push_str(&line(row.iter().map(String::as_str).collect()));
        out.push('\n');
    }
    out
}

fn optional(value: &Option<String>) -> String {
    value.as_deref().map_or_else(|| "-".to_string(), |v| truncate(v, CELL_WIDTH))
}

pub fn entity_table(entities: &[LegalEntity], max_rows: usize) -> String {
    let rows: Vec<Vec<String>> = entities
        .iter()
        .take(max_rows)
        .map(|e| {
            vec![
                e.article_number.clone(),
                truncate(&e.concept, CELL_WIDTH),
                optional(&e.subject),
                optional(&e.action),
                optional(&e.object),
            ]
        })
        .collect();

    let mut table = render_table(&["Article", "Concept", "Subject", "Action", "Object"], &rows);
    if entities.len() > max_rows {
        table.push_str(&format!("... {} more\n", entities.len() - max_rows));
    }
    table
}

pub fn triplet_table(triplets: &[GraphTriplet], max_rows: usize) -> String {
    let rows: Vec<Vec<String>> = triplets
        .iter()
        .take(max_rows)
        .map(|t| {
            vec![
                truncate(&t.subject, CELL_WIDTH),
                t.relation.clone(),
                truncate(&t.object, CELL_WIDTH),
                t.article_number.clone(),
                format!("{:.2}", t.confidence),
            ]
        })
        .collect();

    let mut table = render_table(&["Subject", "Relation", "Object", "Article", "Conf."], &rows);
    if triplets.len() > max_rows {
        table.push_str(&format!("... {} more\n", triplets.len() - max_rows));
    }
    table
}

pub fn relation_table(relations: &[RelationRecord]) -> String {
    let rows: Vec<Vec<String>> = relations
        .iter()
        .map(|r| {
            vec![
                truncate(&r.subject, CELL_WIDTH),
                r.relation.clone(),
                truncate(&r.object, CELL_WIDTH),
                format!("{:.2}", r.confidence),
            ]
        })
        .collect();
    render_table(&["Subject", "Relation", "Object", "Conf."], &rows)
}

pub fn print_summary(document: &LegalDocument, errors: &[String], max_rows: usize) {
    println!("\n{} ({})", document.title, document.law_number);
    println!("\nEntities: {}", document.entities.len());
    print!("{}", entity_table(&document.entities, max_rows));
    println!("\nTriplets: {}", document.triplets.len());
    print!("{}", triplet_table(&document.triplets, max_rows));

    if !errors.is_empty() {
        println!("\n{} errors:", errors.len());
        for error in errors {
            println!("  - {error}");
        }
    }
}

pub fn print_save_report(report: &SaveReport) {
    println!(
        "\nSaved document {}: {} articles, {} new entities, {} relations",
        report.document_key, report.articles, report.entities_created, report.relations
    );
}

pub fn print_statistics(stats: &GraphStatistics) {
    let rows = vec![
        vec!["documents".to_string(), stats.documents.to_string()],
        vec!["articles".to_string(), stats.articles.to_string()],
        vec!["entities".to_string(), stats.entities.to_string()],
        vec!["relations".to_string(), stats.relations.to_string()],
    ];
    print!("{}", render_table(&["Node/Edge", "Count"], &rows));
}

pub fn print_article(article: &ArticleRecord, relations: &[RelationRecord]) {
    println!("{} {}", article.number, article.concept);
    println!("  subject: {}", optional(&article.subject));
    println!("  action:  {}", optional(&article.action));
    println!("  object:  {}", optional(&article.object));
    println!("\n{}\n", article.full_text);
    print!("{}", relation_table(relations));
}

/// Ask a yes/no question; the default answer is no
pub fn confirm(question: &str) -> anyhow::Result<bool> {
    answered(Confirm::new(question).with_default(false).prompt())
}

/// Escape and Ctrl-C count as a no
fn answered(result: Result<bool, InquireError>) -> anyhow::Result<bool> {
    match result {
        Ok(answer) => Ok(answer),
        Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => Ok(false),
        Err(e) => Err(e.into()),
    }
}

/// A source file offered for selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceChoice {
    pub path: PathBuf,
    pub pages: Option<u32>,
}

impl fmt::Display for SourceChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        match self.pages {
            Some(pages) => write!(f, "{name} ({pages} pages)"),
            None => write!(f, "{name}"),
        }
    }
}

pub fn source_table(choices: &[SourceChoice]) -> String {
    let rows: Vec<Vec<String>> = choices
        .iter()
        .enumerate()
        .map(|(i, c)| {
            vec![
                (i + 1).to_string(),
                c.path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default(),
                c.pages.map_or_else(|| "?".to_string(), |p| p.to_string()),
            ]
        })
        .collect();
    render_table(&["No.", "File", "Pages"], &rows)
}

/// List the sources in `dir` and let the user pick one
///
/// Returns `None` when the user backs out.
pub fn select_source(dir: &Path, choices: Vec<SourceChoice>) -> anyhow::Result<Option<PathBuf>> {
    println!("\nFound {} source files in {}:", choices.len(), dir.display());
    print!("{}", source_table(&choices));

    match Select::new("Source to process:", choices).prompt() {
        Ok(choice) => Ok(Some(choice.path)),
        Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// One-line summary of a finished stage
fn stage_detail(stage: Stage, state: &PipelineState) -> String {
    match stage {
        Stage::Segment => format!("{} articles", state.articles.len()),
        Stage::ExtractEntities => format!("{} entities", state.entities.len()),
        Stage::ExtractRelations => format!("{} candidate triplets", state.triplets.len()),
        Stage::Validate => format!("{} triplets after deduplication", state.triplets.len()),
        Stage::Done => String::new(),
    }
}

/// Shows stage progress on a spinner and forwards every event to the log
pub struct CliObserver {
    progress: ProgressBar,
    log: TracingObserver,
}

impl CliObserver {
    pub fn new() -> Self {
        Self::with_progress(ProgressBar::new_spinner())
    }

    fn with_progress(progress: ProgressBar) -> Self {
        let style = ProgressStyle::with_template("{spinner} {msg} [{elapsed}]")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        progress.set_style(style);
        Self {
            progress,
            log: TracingObserver,
        }
    }
}

impl Default for CliObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineObserver for CliObserver {
    fn stage_started(&self, stage: Stage) {
        self.progress.set_message(stage.to_string());
        self.progress.enable_steady_tick(Duration::from_millis(100));
        self.log.stage_started(stage);
    }

    fn stage_finished(&self, stage: Stage, state: &PipelineState) {
        self.progress
            .println(format!("{stage}: {}", stage_detail(stage, state)));
        self.log.stage_finished(stage, state);
    }

    fn entity_failed(&self, article_text: &str, reason: &str) {
        self.progress.suspend(|| self.log.entity_failed(article_text, reason));
    }

    fn entity_recovered(&self, candidates: usize) {
        self.progress.suspend(|| self.log.entity_recovered(candidates));
    }

    fn candidate_rejected(&self, article_number: &str, reason: &str) {
        self.progress
            .suspend(|| self.log.candidate_rejected(article_number, reason));
    }

    fn relations_failed(&self, article_number: &str, reason: &str) {
        self.progress
            .suspend(|| self.log.relations_failed(article_number, reason));
    }

    fn error_recorded(&self, error: &str) {
        self.log.error_recorded(error);
    }

    fn completed(&self, document: &LegalDocument, errors: &[String]) {
        self.progress.finish_and_clear();
        self.log.completed(document, errors);
    }
}
