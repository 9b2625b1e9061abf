//! Pipeline observers
//!
//! Progress and absorbed failures are reported through [`PipelineObserver`]
//! so presentation (logs, console output) stays out of the extraction code.

use lexgraph_core::LegalDocument;

use crate::pipeline::{PipelineState, Stage};

/// Receives pipeline progress and absorbed failures
///
/// Every method has a no-op default.
pub trait PipelineObserver: Send + Sync {
    fn stage_started(&self, _stage: Stage) {}

    fn stage_finished(&self, _stage: Stage, _state: &PipelineState) {}

    /// Entity extraction fell back to the sentinel entity
    fn entity_failed(&self, _article_text: &str, _reason: &str) {}

    /// A list reply was recovered by taking its first candidate
    fn entity_recovered(&self, _candidates: usize) {}

    /// One relation candidate failed validation and was dropped
    fn candidate_rejected(&self, _article_number: &str, _reason: &str) {}

    /// Relation extraction for an entity yielded nothing due to a failure
    fn relations_failed(&self, _article_number: &str, _reason: &str) {}

    /// A line was appended to the pipeline's error list
    fn error_recorded(&self, _error: &str) {}

    fn completed(&self, _document: &LegalDocument, _errors: &[String]) {}
}

/// Observer that ignores everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl PipelineObserver for NoopObserver {}

/// Observer that forwards events to `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

fn snippet(text: &str) -> String {
    text.chars().take(30).collect()
}

impl PipelineObserver for TracingObserver {
    fn stage_started(&self, stage: Stage) {
        tracing::debug!(stage = %stage, "Stage started");
    }

    fn stage_finished(&self, stage: Stage, state: &PipelineState) {
        tracing::info!(
            stage = %stage,
            articles = state.articles.len(),
            entities = state.entities.len(),
            triplets = state.triplets.len(),
            "Stage finished"
        );
    }

    fn entity_failed(&self, article_text: &str, reason: &str) {
        tracing::warn!(article = %snippet(article_text), "Entity extraction failed: {reason}");
    }

    fn entity_recovered(&self, candidates: usize) {
        tracing::debug!(candidates, "Recovered entity from first list candidate");
    }

    fn candidate_rejected(&self, article_number: &str, reason: &str) {
        tracing::debug!(article = article_number, "Relation candidate dropped: {reason}");
    }

    fn relations_failed(&self, article_number: &str, reason: &str) {
        tracing::warn!(article = article_number, "Relation extraction failed: {reason}");
    }

    fn completed(&self, document: &LegalDocument, errors: &[String]) {
        tracing::info!(
            title = %document.title,
            entities = document.entities.len(),
            triplets = document.triplets.len(),
            errors = errors.len(),
            "Knowledge graph extraction completed"
        );
    }
}
