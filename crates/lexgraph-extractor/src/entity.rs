//! Entity extraction
//!
//! Derives one [`LegalEntity`] per article through a language model. Never
//! fails: unusable replies fall back to the sentinel entity that echoes the
//! article text.

use std::sync::Arc;

use lexgraph_core::schema::LEGAL_ENTITY;
use lexgraph_core::{LegalEntity, LlmClient};
use serde_json::Value;

use crate::observer::{PipelineObserver, TracingObserver};
use crate::structured::{parse_candidate, StructuredError, StructuredLlm};

/// Configuration for entity extraction
#[derive(Debug, Clone)]
pub struct EntityExtractorConfig {
    /// System prompt
    pub system_prompt: String,
}

impl Default for EntityExtractorConfig {
    fn default() -> Self {
        Self {
            system_prompt: include_str!("prompts/entity_system.txt").to_string(),
        }
    }
}

/// Result of one extraction, with the absorbed failure if any
#[derive(Debug, Clone)]
pub struct EntityOutcome {
    pub entity: LegalEntity,
    pub failure: Option<String>,
}

/// LLM-based entity extractor
pub struct EntityExtractor {
    llm: StructuredLlm,
    config: EntityExtractorConfig,
    observer: Arc<dyn PipelineObserver>,
}

impl EntityExtractor {
    /// Create a new extractor with default config
    pub fn new(client: Arc<dyn LlmClient>) -> Self {
        Self::with_config(client, EntityExtractorConfig::default())
    }

    /// Create with custom config
    pub fn with_config(client: Arc<dyn LlmClient>, config: EntityExtractorConfig) -> Self {
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
    pub fn build_prompt(&self, text: &str) -> String {
        format!(
            "{}\n\nAnalyse the following statute article:\n\n{}",
            self.config.system_prompt.trim_end(),
            text
        )
    }

    /// Extract the entity for one article
    pub async fn extract(&self, text: &str) -> LegalEntity {
        self.extract_reported(text).await.entity
    }

    /// Extract the entity for one article, reporting any absorbed failure
    pub async fn extract_reported(&self, text: &str) -> EntityOutcome {
        let prompt = self.build_prompt(text);

        let failure = match self.llm.submit_object::<LegalEntity>(&prompt, &LEGAL_ENTITY).await {
            Ok(entity) => return EntityOutcome::extracted(entity, text),
            Err(StructuredError::CandidateList { candidates, .. }) => {
                let count = candidates.len();
                match recover_first(candidates) {
                    Ok(entity) => {
                        self.observer.entity_recovered(count);
                        return EntityOutcome::extracted(entity, text);
                    }
                    Err(e) => format!("list output could not be recovered: {e}"),
                }
            }
            Err(e) => e.to_string(),
        };

        self.observer.entity_failed(text, &failure);
        EntityOutcome {
            entity: LegalEntity::fallback(text),
            failure: Some(failure),
        }
    }

    /// Extract one entity per input, in input order
    pub async fn batch_extract(&self, texts: &[String]) -> Vec<LegalEntity> {
        self.batch_extract_reported(texts)
            .await
            .into_iter()
            .map(|outcome| outcome.entity)
            .collect()
    }

    /// Extract one outcome per input, in input order
    pub async fn batch_extract_reported(&self, texts: &[String]) -> Vec<EntityOutcome> {
        let mut outcomes = Vec::with_capacity(texts.len());
        for (i, text) in texts.iter().enumerate() {
            tracing::debug!(index = i, total = texts.len(), "Extracting entity");
            outcomes.push(self.extract_reported(text).await);
        }
        outcomes
    }
}

impl EntityOutcome {
    fn extracted(mut entity: LegalEntity, source: &str) -> Self {
        // full_text must always carry the source span
        if entity.full_text.trim().is_empty() {
            entity.full_text = source.to_string();
        }
        Self {
            entity,
            failure: None,
        }
    }
}

fn recover_first(candidates: Vec<Value>) -> Result<LegalEntity, StructuredError> {
    let first = candidates
        .into_iter()
        .next()
        .ok_or_else(|| StructuredError::Schema {
            schema: LEGAL_ENTITY.name,
            message: "empty candidate list".to_string(),
        })?;
    parse_candidate(first, &LEGAL_ENTITY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lexgraph_core::{LexError, Result};
    use std::sync::Mutex;

    /// Replies with scripted outputs in order, then errors
    struct ScriptedLlm {
        replies: Mutex<Vec<Result<String>>>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedLlm {
        fn new(replies: Vec<Result<String>>) -> Arc<Self> {
            let mut replies = replies;
            replies.reverse();
            Arc::new(Self {
                replies: Mutex::new(replies),
                prompts: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait::async_trait]
    impl LlmClient for ScriptedLlm {
        async fn generate(&self, prompt: &str) -> Result<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.replies
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| Err(LexError::LlmError("script exhausted".to_string())))
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    fn entity_json(number: &str, concept: &str, text: &str) -> String {
        serde_json::json!({
            "article_number": number,
            "concept": concept,
            "subject": "개인정보처리자",
            "action": null,
            "full_text": text
        })
        .to_string()
    }

    #[tokio::test]
    async fn test_extract_success() {
        let llm = ScriptedLlm::new(vec![Ok(entity_json("제3조", "보호 원칙", "제3조 ..."))]);
        let extractor = EntityExtractor::new(llm.clone());

        let entity = extractor.extract("제3조 ...").await;

        assert_eq!(entity.article_number, "제3조");
        assert_eq!(entity.subject.as_deref(), Some("개인정보처리자"));
        assert!(entity.action.is_none());

        let prompts = llm.prompts.lock().unwrap();
        assert!(prompts[0].contains("제3조 ..."));
        assert!(prompts[0].contains("LegalEntity"));
    }

    #[tokio::test]
    async fn test_extract_recovers_first_list_candidate() {
        let reply = format!(
            "[{}, {}]",
            entity_json("제1조", "목적", "제1조(목적)"),
            entity_json("제2조", "정의", "제2조(정의)")
        );
        let extractor = EntityExtractor::new(ScriptedLlm::new(vec![Ok(reply)]));

        let outcome = extractor.extract_reported("제1조(목적)").await;

        assert!(outcome.failure.is_none());
        assert_eq!(outcome.entity.article_number, "제1조");
    }

    #[tokio::test]
    async fn test_extract_unrecoverable_list_falls_back() {
        let extractor = EntityExtractor::new(ScriptedLlm::new(vec![Ok(
            r#"[{"concept": "목적"}]"#.to_string()
        )]));

        let outcome = extractor.extract_reported("제1조(목적)").await;

        assert!(outcome.entity.is_fallback());
        assert_eq!(outcome.entity.full_text, "제1조(목적)");
        assert!(outcome.failure.unwrap().contains("could not be recovered"));
    }

    #[tokio::test]
    async fn test_extract_capability_failure_falls_back() {
        let extractor = EntityExtractor::new(ScriptedLlm::new(vec![Err(LexError::LlmError(
            "timeout".to_string(),
        ))]));

        let outcome = extractor.extract_reported("제5조 본문").await;

        assert_eq!(outcome.entity, LegalEntity::fallback("제5조 본문"));
        assert!(outcome.failure.unwrap().contains("timeout"));
    }

    #[tokio::test]
    async fn test_extract_blank_full_text_replaced_with_source() {
        let extractor = EntityExtractor::new(ScriptedLlm::new(vec![Ok(entity_json(
            "제1조", "목적", "",
        ))]));

        let entity = extractor.extract("제1조(목적) 이 법은").await;

        assert!(!entity.is_fallback());
        assert_eq!(entity.full_text, "제1조(목적) 이 법은");
    }

    #[tokio::test]
    async fn test_batch_extract_keeps_length_and_order() {
        let llm = ScriptedLlm::new(vec![
            Ok(entity_json("제1조", "목적", "a")),
            Ok("not json".to_string()),
            Ok(entity_json("제3조", "원칙", "c")),
        ]);
        let extractor = EntityExtractor::new(llm);
        let texts = vec!["a".to_string(), "b".to_string(), "c".to_string()];

        let entities = extractor.batch_extract(&texts).await;

        assert_eq!(entities.len(), 3);
        assert_eq!(entities[0].article_number, "제1조");
        assert!(entities[1].is_fallback());
        assert_eq!(entities[1].full_text, "b");
        assert_eq!(entities[2].article_number, "제3조");
    }

    #[tokio::test]
    async fn test_batch_extract_all_failures() {
        let extractor = EntityExtractor::new(ScriptedLlm::new(Vec::new()));
        let texts: Vec<String> = (1..=4).map(|i| format!("제{i}조")).collect();

        let outcomes = extractor.batch_extract_reported(&texts).await;

        assert_eq!(outcomes.len(), 4);
        for (outcome, text) in outcomes.iter().zip(&texts) {
            assert!(outcome.entity.is_fallback());
            assert_eq!(&outcome.entity.full_text, text);
            assert!(outcome.failure.is_some());
        }
    }
}
