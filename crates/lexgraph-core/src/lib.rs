//! LexGraph Core - Domain models, traits, and shared types
//!
//! This crate defines the core abstractions used throughout LexGraph:
//! - Statute models (entities, triplets, documents)
//! - The relation taxonomy and structured output schemas
//! - Common error types
//! - Capability traits for language models and graph stores
//! - Configuration management

pub mod config;
pub mod schema;
pub mod taxonomy;

pub use config::{AppConfig, ConfigError, DatabaseConfig, LlmConfig, LlmProvider, LoggingConfig};
pub use schema::{FieldSpec, FieldType, OutputSchema};
pub use taxonomy::{RelationCategory, RelationType};

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Core error types for LexGraph operations
#[derive(Error, Debug)]
pub enum LexError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("LLM error: {0}")]
    LlmError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, LexError>;

// ============================================================================
// Statute Models
// ============================================================================

/// Sentinel used for fields the model could not determine
pub const UNKNOWN: &str = "Unknown";

/// Structured view of a single statute article
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegalEntity {
    /// Article number as written in the source (e.g. "제2조의2", "Article 3")
    pub article_number: String,

    /// Core concept the article is about
    pub concept: String,

    /// Who the obligation or right applies to
    #[serde(default)]
    pub subject: Option<String>,

    /// What the subject does or must do
    #[serde(default)]
    pub action: Option<String>,

    /// What the action is about
    #[serde(default)]
    pub object: Option<String>,

    /// Source span the entity was derived from
    pub full_text: String,
}

impl LegalEntity {
    /// Create an entity with only the required fields
    pub fn new(
        article_number: impl Into<String>,
        concept: impl Into<String>,
        full_text: impl Into<String>,
    ) -> Self {
        Self {
            article_number: article_number.into(),
            concept: concept.into(),
            subject: None,
            action: None,
            object: None,
            full_text: full_text.into(),
        }
    }

    /// Entity returned when extraction fails; echoes the input span
    pub fn fallback(full_text: impl Into<String>) -> Self {
        Self::new(UNKNOWN, UNKNOWN, full_text)
    }

    /// Whether this entity is the extraction-failure sentinel
    pub fn is_fallback(&self) -> bool {
        self.article_number == UNKNOWN && self.concept == UNKNOWN
    }

    /// Set the subject
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Set the action
    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    /// Set the object
    pub fn with_object(mut self, object: impl Into<String>) -> Self {
        self.object = Some(object.into());
        self
    }
}

fn default_confidence() -> f32 {
    1.0
}

/// A directed, labeled candidate edge between two named concepts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphTriplet {
    pub subject: String,

    /// Relation label, expected (not required) to come from [`RelationType`]
    pub relation: String,

    pub object: String,

    /// Article the triplet was extracted from
    pub article_number: String,

    /// Extraction certainty, nominally 0.0 - 1.0
    #[serde(default = "default_confidence")]
    pub confidence: f32,
}

impl GraphTriplet {
    /// Create a triplet with full confidence
    pub fn new(
        subject: impl Into<String>,
        relation: impl Into<String>,
        object: impl Into<String>,
        article_number: impl Into<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            relation: relation.into(),
            object: object.into(),
            article_number: article_number.into(),
            confidence: default_confidence(),
        }
    }

    /// Set confidence score
    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = confidence;
        self
    }

    /// Composite deduplication key
    pub fn key(&self) -> (&str, &str, &str) {
        (&self.subject, &self.relation, &self.object)
    }

    /// The taxonomy entry for the relation label, if it has one
    pub fn relation_type(&self) -> Option<RelationType> {
        RelationType::parse(&self.relation)
    }
}

/// A statute and the knowledge extracted from it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LegalDocument {
    /// Statute title (e.g. "개인정보 보호법")
    pub title: String,

    /// Promulgation number (e.g. "법률 제18583호")
    pub law_number: String,

    /// Raw statute text
    pub content: String,

    #[serde(default)]
    pub entities: Vec<LegalEntity>,

    #[serde(default)]
    pub triplets: Vec<GraphTriplet>,
}

impl LegalDocument {
    /// Create a document with no extraction results yet
    pub fn new(
        title: impl Into<String>,
        law_number: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            law_number: law_number.into(),
            content: content.into(),
            entities: Vec::new(),
            triplets: Vec::new(),
        }
    }
}

// ============================================================================
// Traits
// ============================================================================

/// Trait for LLM clients
///
/// Implementations are chosen once from configuration; callers never
/// inspect which backend they hold.
#[async_trait::async_trait]
pub trait LlmClient: Send + Sync {
    /// Generate a completion for the prompt
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Backend name for logging
    fn name(&self) -> &str;
}

/// Named query parameters
pub type QueryParams = serde_json::Map<String, serde_json::Value>;

/// A scoped connection to a graph store
///
/// Dropping the session releases it.
#[async_trait::async_trait]
pub trait GraphSession: Send + Sync {
    /// Execute a query and return the rows of its last statement
    async fn run(&self, query: &str, params: QueryParams) -> Result<Vec<serde_json::Value>>;
}

/// Trait for graph database backends
#[async_trait::async_trait]
pub trait GraphStore: Send + Sync {
    /// Open a session for a unit of work
    async fn session(&self) -> Result<Box<dyn GraphSession>>;
}

// ============================================================================
// Tests
// ============================================================================
