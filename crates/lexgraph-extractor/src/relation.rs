//! Relation Extraction (RE) module
//!
//! Derives [`GraphTriplet`]s for one entity, giving the model the few
//! preceding articles as context so cross-references can be resolved.

use std::sync::Arc;

use lexgraph_core::schema::GRAPH_TRIPLET;
use lexgraph_core::{GraphTriplet, LegalEntity, LlmClient, RelationType};

use crate::observer::{PipelineObserver, TracingObserver};
use crate::structured::{parse_candidate, StructuredLlm};

/// Number of preceding entities supplied as context
pub const CONTEXT_WINDOW: usize = 3;

/// Context text used when there are no preceding entities
pub const NO_CONTEXT: &str = "none";

/// Placeholder for absent optional entity fields
const NOT_AVAILABLE: &str = "N/A";

/// The up-to-[`CONTEXT_WINDOW`] entities immediately before `index`
pub fn context_window(entities: &[LegalEntity], index: usize) -> &[LegalEntity] {
    let end = index.min(entities.len());
    &entities[end.saturating_sub(CONTEXT_WINDOW)..end]
}

/// Render context entities as `- number: concept` lines
pub fn format_context(context: &[LegalEntity]) -> String {
    if context.is_empty() {
        return NO_CONTEXT.to_string();
    }

    context
        .iter()
        .map(|e| format!("- {}: {}", e.article_number, e.concept))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Configuration for LLM-based RE
#[derive(Debug, Clone)]
pub struct RelationExtractorConfig {
    /// System prompt
    pub system_prompt: String,
    /// Relation labels listed in the prompt
    pub relation_types: Vec<RelationType>,
}

impl Default for RelationExtractorConfig {
    fn default() -> Self {
        Self {
            system_prompt: include_str!("prompts/relation_system.txt").to_string(),
            relation_types: RelationType::ALL.to_vec(),
        }
    }
}

/// Triplets for one entity plus what was absorbed along the way
#[derive(Debug, Clone, Default)]
pub struct RelationOutcome {
    pub triplets: Vec<GraphTriplet>,
    /// Candidates dropped for not fitting the triplet shape
    pub rejected: usize,
    /// Set when the whole call failed and no triplets were produced
    pub failure: Option<String>,
}

/// LLM-based relation extractor
pub struct RelationExtractor {
    llm: StructuredLlm,
    config: RelationExtractorConfig,
    observer: Arc<dyn PipelineObserver>,
}

impl RelationExtractor {
    /// Create a new extractor with default config
    pub fn new(client: Arc<dyn LlmClient>) -> Self {
        Self::with_config(client, RelationExtractorConfig::default())
    }

    /// Create with custom config
    pub fn with_config(client: Arc<dyn LlmClient>, config: RelationExtractorConfig) -> Self {
        Self {
            llm: StructuredLlm::new(client),
            config,
            observer: Arc::new(TracingObserver),
        }
    }

    /// Report failures to `observer`
    pub fn with_observer(mut self, observer: Arc<dyn PipelineObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Build the extraction prompt
    pub fn build_prompt(&self, entity: &LegalEntity, context: &[LegalEntity]) -> String {
        let relation_types: Vec<String> = self
            .config
            .relation_types
            .iter()
            .map(|r| format!("- {} ({})", r.as_str(), r.korean_label()))
            .collect();

        format!(
            "{}\n\nRelation types:\n{}\n\nExtract relations from this article:\n\nArticle number: {}\nConcept: {}\nSubject: {}\nAction: {}\nObject: {}\nText: {}\n\nPreceding articles:\n{}",
            self.config.system_prompt.trim_end(),
            relation_types.join("\n"),
            entity.article_number,
            entity.concept,
            entity.subject.as_deref().unwrap_or(NOT_AVAILABLE),
            entity.action.as_deref().unwrap_or(NOT_AVAILABLE),
            entity.object.as_deref().unwrap_or(NOT_AVAILABLE),
            entity.full_text,
            format_context(context),
        )
    }

    /// Extract triplets for `entity`; empty on failure
    pub async fn extract(&self, entity: &LegalEntity, context: &[LegalEntity]) -> Vec<GraphTriplet> {
        self.extract_reported(entity, context).await.triplets
    }

    /// Extract triplets for `entity`, reporting absorbed failures
    pub async fn extract_reported(
        &self,
        entity: &LegalEntity,
        context: &[LegalEntity],
    ) -> RelationOutcome {
        let prompt = self.build_prompt(entity, context);

        let candidates = match self.llm.submit_many(&prompt, &GRAPH_TRIPLET).await {
            Ok(candidates) => candidates,
            Err(e) => {
                let reason = e.to_string();
                self.observer.relations_failed(&entity.article_number, &reason);
                return RelationOutcome {
                    failure: Some(reason),
                    ..RelationOutcome::default()
                };
            }
        };

        let mut outcome = RelationOutcome::default();
        for candidate in candidates {
            match parse_candidate::<GraphTriplet>(candidate, &GRAPH_TRIPLET) {
                Ok(triplet) => outcome.triplets.push(triplet),
                Err(e) => {
                    outcome.rejected += 1;
                    self.observer
                        .candidate_rejected(&entity.article_number, &e.to_string());
                }
            }
        }

        tracing::debug!(
            article = %entity.article_number,
            accepted = outcome.triplets.len(),
            rejected = outcome.rejected,
            "Relation candidates validated"
        );

        outcome
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use lexgraph_core::{LexError, Result};
    use std::sync::Mutex;

    struct RecordingLlm {
        reply: Result<&'static str>,
        prompts: Mutex<Vec<String>>,
    }

    impl RecordingLlm {
        fn replying(reply: &'static str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(reply),
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                reply: Err(LexError::LlmError("503 Service Unavailable".to_string())),
                prompts: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait::async_trait]
    impl LlmClient for RecordingLlm {
        async fn generate(&self, prompt: &str) -> Result<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            match &self.reply {
                Ok(reply) => Ok(reply.to_string()),
                Err(e) => Err(LexError::LlmError(e.to_string())),
            }
        }

        fn name(&self) -> &str {
            "recording"
        }
    }

    fn entity(number: &str, concept: &str) -> LegalEntity {
        LegalEntity::new(number, concept, format!("{number}({concept}) 본문"))
    }

    #[test]
    fn test_context_window_clamps() {
        let entities: Vec<LegalEntity> = (1..=6).map(|i| entity(&format!("제{i}조"), "c")).collect();

        assert!(context_window(&entities, 0).is_empty());
        assert_eq!(context_window(&entities, 2).len(), 2);

        let window = context_window(&entities, 5);
        assert_eq!(window.len(), 3);
        assert_eq!(window[0].article_number, "제3조");
        assert_eq!(window[2].article_number, "제5조");

        assert_eq!(context_window(&entities, 100).len(), 3);
    }

    #[test]
    fn test_format_context() {
        assert_eq!(format_context(&[]), "none");
        assert_eq!(
            format_context(&[entity("제1조", "목적"), entity("제2조", "정의")]),
            "- 제1조: 목적\n- 제2조: 정의"
        );
    }

    #[test]
    fn test_prompt_contents() {
        let re = RelationExtractor::new(RecordingLlm::replying("[]"));
        let target = entity("제3조", "보호 원칙").with_subject("개인정보처리자");

        let prompt = re.build_prompt(&target, &[entity("제2조", "정의")]);

        assert!(prompt.contains("Relation types:"));
        assert!(prompt.contains("refers-to (참조함)"));
        assert!(prompt.contains("Subject: 개인정보처리자"));
        assert!(prompt.contains("Action: N/A"));
        assert!(prompt.contains("- 제2조: 정의"));
    }

    #[tokio::test]
    async fn test_extract_array_reply() {
        let llm = RecordingLlm::replying(
            r#"[
                {"subject":"개인정보처리자","relation":"requires","object":"목적 명확화","article_number":"제3조","confidence":0.9},
                {"subject":"제3조","relation":"refers-to","object":"제2조","article_number":"제3조"}
            ]"#,
        );
        let re = RelationExtractor::new(llm.clone());

        let triplets = re.extract(&entity("제3조", "보호 원칙"), &[]).await;

        assert_eq!(triplets.len(), 2);
        assert_eq!(triplets[0].confidence, 0.9);
        assert_eq!(triplets[1].confidence, 1.0);
        assert!(llm.prompts.lock().unwrap()[0].contains("Preceding articles:\nnone"));
    }

    #[tokio::test]
    async fn test_extract_single_object_reply() {
        let re = RelationExtractor::new(RecordingLlm::replying(
            r#"```json
{"subject":"이 법","relation":"defines","object":"개인정보","article_number":"제2조"}
```"#,
        ));

        let triplets = re.extract(&entity("제2조", "정의"), &[]).await;

        assert_eq!(triplets.len(), 1);
        assert_eq!(triplets[0].object, "개인정보");
    }

    #[tokio::test]
    async fn test_invalid_candidates_dropped_individually() {
        let re = RelationExtractor::new(RecordingLlm::replying(
            r#"[
                {"subject":"a","relation":"prohibits","object":"b","article_number":"제4조"},
                {"subject":"a","relation":"prohibits"},
                "garbage",
                {"subject":"c","relation":"allows","object":"d","article_number":"제4조","confidence":"high"},
                {"subject":"e","relation":"exception-to","object":"f","article_number":"제4조"}
            ]"#,
        ));

        let outcome = re.extract_reported(&entity("제4조", "금지"), &[]).await;

        assert_eq!(outcome.triplets.len(), 2);
        assert_eq!(outcome.rejected, 3);
        assert!(outcome.failure.is_none());
        assert_eq!(outcome.triplets[1].subject, "e");
    }

    #[tokio::test]
    async fn test_capability_failure_yields_empty() {
        let re = RelationExtractor::new(RecordingLlm::failing());

        let outcome = re.extract_reported(&entity("제1조", "목적"), &[]).await;

        assert!(outcome.triplets.is_empty());
        assert!(outcome.failure.unwrap().contains("503"));
    }

    #[tokio::test]
    async fn test_unparseable_reply_yields_empty() {
        let re = RelationExtractor::new(RecordingLlm::replying("관계를 찾을 수 없습니다."));

        let outcome = re.extract_reported(&entity("제1조", "목적"), &[]).await;

        assert!(outcome.triplets.is_empty());
        assert!(outcome.failure.is_some());
    }

    #[tokio::test]
    async fn test_empty_array_is_not_a_failure() {
        let re = RelationExtractor::new(RecordingLlm::replying("[]"));

        let outcome = re.extract_reported(&entity("제1조", "목적"), &[]).await;

        assert!(outcome.triplets.is_empty());
        assert!(outcome.failure.is_none());
    }
}
