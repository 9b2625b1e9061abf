//! LexGraph Graph - Statute graph persistence
//!
//! Maps extracted statute documents onto a property graph and reads them
//! back. The schema mapping lives in [`persist`]; [`surrealdb_store`]
//! provides the SurrealDB backend for the [`GraphStore`] contract.
//!
//! [`GraphStore`]: lexgraph_core::GraphStore

pub mod persist;
pub mod surrealdb_store;

pub use persist::{ArticleRecord, GraphPersister, GraphStatistics, RelationRecord, SavePhase, SaveReport};
pub use surrealdb_store::{SurrealDbStore, SurrealSession};
