//! LexGraph Extractor - Statute knowledge graph extraction
//!
//! Turns raw statute text into a [`LegalDocument`] with one
//! [`LegalEntity`] per article and a deduplicated set of
//! [`GraphTriplet`]s:
//!
//! 1. [`text`]: article segmentation
//! 2. [`entity`]: per-article entity extraction with fallback
//! 3. [`relation`]: relation extraction with a look-back context window
//! 4. [`validate`]: triplet deduplication
//!
//! [`pipeline::LegalGraphPipeline`] runs the steps in order and absorbs
//! failures into an error list instead of returning them.
//!
//! Author: hephaex@gmail.com
//!
//! [`LegalDocument`]: lexgraph_core::LegalDocument
//! [`LegalEntity`]: lexgraph_core::LegalEntity
//! [`GraphTriplet`]: lexgraph_core::GraphTriplet

pub mod entity;
pub mod observer;
pub mod pipeline;
pub mod relation;
pub mod structured;
pub mod text;
pub mod validate;

pub use entity::{EntityExtractor, EntityExtractorConfig, EntityOutcome};
pub use observer::{NoopObserver, PipelineObserver, TracingObserver};
pub use pipeline::{LegalGraphPipeline, PipelineState, ProcessOutcome, Stage};
pub use relation::{RelationExtractor, RelationExtractorConfig, RelationOutcome, CONTEXT_WINDOW};
pub use structured::{StructuredError, StructuredLlm};
pub use text::{clean_text, split_articles};
pub use validate::deduplicate_triplets;
