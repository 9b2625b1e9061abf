//! Knowledge graph extraction pipeline
//!
//! A fixed, linear sequence of stages over one mutable [`PipelineState`]:
//!
//! ```text
//! Segment -> ExtractEntities -> ExtractRelations -> Validate -> Done
//! ```
//!
//! Failures never escape [`LegalGraphPipeline::process`]; they are collected
//! in the returned error list and the pipeline carries on with whatever data
//! it has.

use std::sync::Arc;

use lexgraph_core::{GraphTriplet, LegalDocument, LegalEntity, LexError, LlmClient, Result};

use crate::entity::EntityExtractor;
use crate::observer::{PipelineObserver, TracingObserver};
use crate::relation::{context_window, RelationExtractor};
use crate::text::split_articles;
use crate::validate::{deduplicate_triplets, out_of_vocabulary};

/// Pipeline stages in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Segment,
    ExtractEntities,
    ExtractRelations,
    Validate,
    Done,
}

impl Stage {
    /// Stages that do work, in order; `Done` follows the last one
    pub const SEQUENCE: [Stage; 4] = [
        Stage::Segment,
        Stage::ExtractEntities,
        Stage::ExtractRelations,
        Stage::Validate,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Segment => "segment",
            Self::ExtractEntities => "extract_entities",
            Self::ExtractRelations => "extract_relations",
            Self::Validate => "validate",
            Self::Done => "done",
        }
    }

    /// The stage that follows this one
    pub fn next(self) -> Stage {
        match self {
            Self::Segment => Self::ExtractEntities,
            Self::ExtractEntities => Self::ExtractRelations,
            Self::ExtractRelations => Self::Validate,
            Self::Validate | Self::Done => Self::Done,
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// State threaded through every stage of one `process` call
#[derive(Debug, Clone, Default)]
pub struct PipelineState {
    pub document: LegalDocument,
    pub articles: Vec<String>,
    pub entities: Vec<LegalEntity>,
    pub triplets: Vec<GraphTriplet>,
    pub errors: Vec<String>,
}

impl PipelineState {
    pub fn new(document: LegalDocument) -> Self {
        Self {
            document,
            ..Self::default()
        }
    }
}

/// Final output of a pipeline run
#[derive(Debug, Clone)]
pub struct ProcessOutcome {
    /// The input document with `entities` and `triplets` populated
    pub document: LegalDocument,
    /// Human-readable descriptions of absorbed failures
    pub errors: Vec<String>,
}

impl ProcessOutcome {
    /// Whether any failure was absorbed during the run
    pub fn is_degraded(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Statute knowledge graph extraction pipeline
pub struct LegalGraphPipeline {
    entity_extractor: EntityExtractor,
    relation_extractor: RelationExtractor,
    observer: Arc<dyn PipelineObserver>,
}

impl LegalGraphPipeline {
    /// Create a pipeline from two extractors
    pub fn new(entity_extractor: EntityExtractor, relation_extractor: RelationExtractor) -> Self {
        Self {
            entity_extractor,
            relation_extractor,
            observer: Arc::new(TracingObserver),
        }
    }

    /// Create a pipeline that uses one backend for both extraction steps
    pub fn from_client(client: Arc<dyn LlmClient>) -> Self {
        Self::new(
            EntityExtractor::new(client.clone()),
            RelationExtractor::new(client),
        )
    }

    /// Report progress and failures to `observer`, including from the extractors
    pub fn with_observer(self, observer: Arc<dyn PipelineObserver>) -> Self {
        Self {
            entity_extractor: self.entity_extractor.with_observer(observer.clone()),
            relation_extractor: self.relation_extractor.with_observer(observer.clone()),
            observer,
        }
    }

    /// Run every stage over `document`
    pub async fn process(&self, document: LegalDocument) -> ProcessOutcome {
        tracing::info!(title = %document.title, chars = document.content.chars().count(), "Pipeline started");

        let mut state = PipelineState::new(document);
        let mut stage = Stage::Segment;

        for step in Stage::SEQUENCE {
            debug_assert_eq!(step, stage);
            self.observer.stage_started(step);

            let result = self.run_stage(step, &mut state).await;
            self.settle(step, result, &mut state);

            self.observer.stage_finished(step, &state);
            stage = step.next();
        }

        debug_assert_eq!(stage, Stage::Done);
        self.finish(state)
    }

    async fn run_stage(&self, stage: Stage, state: &mut PipelineState) -> Result<()> {
        match stage {
            Stage::Segment => self.segment(state),
            Stage::ExtractEntities => self.extract_entities(state).await,
            Stage::ExtractRelations => self.extract_relations(state).await,
            Stage::Validate => self.validate(state),
            Stage::Done => Ok(()),
        }
    }

    fn segment(&self, state: &mut PipelineState) -> Result<()> {
        state.articles = split_articles(&state.document.content);
        tracing::debug!(articles = state.articles.len(), "Segmented statute text");
        Ok(())
    }

    async fn extract_entities(&self, state: &mut PipelineState) -> Result<()> {
        let outcomes = self
            .entity_extractor
            .batch_extract_reported(&state.articles)
            .await;

        let mut entities = Vec::with_capacity(outcomes.len());
        for (i, outcome) in outcomes.into_iter().enumerate() {
            if let Some(failure) = outcome.failure {
                self.record_error(
                    state,
                    format!("Entity extraction error for article {}: {failure}", i + 1),
                );
            }
            entities.push(outcome.entity);
        }

        state.entities = entities;
        state.document.entities = state.entities.clone();

        self.check_entity_count(state)
    }

    /// One entity per article
    fn check_entity_count(&self, state: &PipelineState) -> Result<()> {
        if state.entities.len() != state.articles.len() {
            return Err(LexError::ValidationError(format!(
                "{} entities for {} articles",
                state.entities.len(),
                state.articles.len()
            )));
        }
        Ok(())
    }

    async fn extract_relations(&self, state: &mut PipelineState) -> Result<()> {
        let mut triplets = Vec::new();

        for (i, entity) in state.entities.iter().enumerate() {
            let context = context_window(&state.entities, i);
            let outcome = self.relation_extractor.extract_reported(entity, context).await;

            if let Some(failure) = outcome.failure {
                let error = format!(
                    "Relation extraction error for {}: {failure}",
                    entity.article_number
                );
                self.observer.error_recorded(&error);
                state.errors.push(error);
            }

            triplets.extend(outcome.triplets);
        }

        state.triplets = triplets;
        Ok(())
    }

    fn validate(&self, state: &mut PipelineState) -> Result<()> {
        let before = state.triplets.len();
        state.triplets = deduplicate_triplets(std::mem::take(&mut state.triplets));
        state.document.triplets = state.triplets.clone();

        let unknown = out_of_vocabulary(&state.triplets).len();
        tracing::debug!(
            before,
            after = state.triplets.len(),
            out_of_vocabulary = unknown,
            "Triplets deduplicated"
        );
        Ok(())
    }

    /// Turn a stage-level failure into an `errors` line
    fn settle(&self, stage: Stage, result: Result<()>, state: &mut PipelineState) {
        if let Err(e) = result {
            self.record_error(state, format!("{stage} stage failed: {e}"));
        }
    }

    fn record_error(&self, state: &mut PipelineState, error: String) {
        self.observer.error_recorded(&error);
        state.errors.push(error);
    }

    fn finish(&self, state: PipelineState) -> ProcessOutcome {
        if !state.errors.is_empty() {
            tracing::warn!("{} errors occurred", state.errors.len());
            for error in &state.errors {
                tracing::warn!("  - {error}");
            }
        }

        self.observer.completed(&state.document, &state.errors);

        ProcessOutcome {
            document: state.document,
            errors: state.errors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct SilentLlm;

    #[async_trait]
    impl LlmClient for SilentLlm {
        async fn generate(&self, _prompt: &str) -> Result<String> {
            Ok("[]".to_string())
        }

        fn name(&self) -> &str {
            "silent"
        }
    }

    #[derive(Default)]
    struct ErrorLog(Mutex<Vec<String>>);

    impl PipelineObserver for ErrorLog {
        fn error_recorded(&self, error: &str) {
            self.0.lock().unwrap().push(error.to_string());
        }
    }

    fn pipeline() -> LegalGraphPipeline {
        LegalGraphPipeline::from_client(Arc::new(SilentLlm))
    }

    #[test]
    fn test_failed_stage_becomes_error_line() {
        let log = Arc::new(ErrorLog::default());
        let pipeline = pipeline().with_observer(log.clone());
        let mut state = PipelineState::new(LegalDocument::new("t", "n", "c"));

        pipeline.settle(
            Stage::ExtractEntities,
            Err(LexError::ValidationError("2 entities for 3 articles".to_string())),
            &mut state,
        );
        pipeline.settle(Stage::Validate, Ok(()), &mut state);

        assert_eq!(
            state.errors,
            vec!["extract_entities stage failed: Validation error: 2 entities for 3 articles"]
        );
        assert_eq!(*log.0.lock().unwrap(), state.errors);
    }

    #[tokio::test]
    async fn test_entity_count_mismatch_is_reported() {
        let pipeline = pipeline();
        let mut state = PipelineState::new(LegalDocument::default());
        state.articles = vec!["제1조 가".to_string(), "제2조 나".to_string()];

        pipeline
            .run_stage(Stage::ExtractEntities, &mut state)
            .await
            .unwrap();
        state.articles.push("제3조 다".to_string());

        let err = pipeline.check_entity_count(&state).unwrap_err();
        assert!(err.to_string().contains("2 entities for 3 articles"));
    }

    #[test]
    fn test_stage_sequence_is_linear() {
        let mut stage = Stage::Segment;
        for expected in Stage::SEQUENCE {
            assert_eq!(stage, expected);
            stage = stage.next();
        }
        assert_eq!(stage, Stage::Done);
        assert_eq!(Stage::Done.next(), Stage::Done);
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(Stage::ExtractRelations.to_string(), "extract_relations");
    }

    #[test]
    fn test_state_starts_empty() {
        let state = PipelineState::new(LegalDocument::new("t", "n", "c"));
        assert!(state.articles.is_empty());
        assert!(state.errors.is_empty());
        assert_eq!(state.document.content, "c");
    }
}
