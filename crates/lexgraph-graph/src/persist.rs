//! Statute graph persistence
//!
//! Maps a finished [`LegalDocument`] onto the property-graph schema:
//!
//! ```text
//! document --contains--> article          (one per entity)
//! entity   --relates---> entity           (one per triplet)
//! ```
//!
//! Entity nodes are unique by `name`. Stores have no merge primitive, so
//! each name is looked up first and created only when missing.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use lexgraph_core::{
    GraphSession, GraphStore, GraphTriplet, LegalDocument, LegalEntity, LexError, QueryParams,
    Result,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

const CLEAR_ALL: &str = "DELETE relates; DELETE contains; DELETE article; DELETE entity; DELETE document;";

const INDEXES: [(&str, &str); 3] = [
    ("idx_document_title", "DEFINE INDEX idx_document_title ON TABLE document FIELDS title"),
    ("idx_article_number", "DEFINE INDEX idx_article_number ON TABLE article FIELDS number"),
    ("idx_entity_name", "DEFINE INDEX idx_entity_name ON TABLE entity FIELDS name"),
];

const CREATE_DOCUMENT: &str = "CREATE type::thing('document', $key) SET title = $title, law_number = $law_number, created_at = time::now() RETURN NONE;";

const CREATE_ARTICLE: &str = "CREATE type::thing('article', $key) SET number = $number, concept = $concept, subject = $subject, action = $action, object = $object, full_text = $full_text RETURN NONE;
LET $doc = type::thing('document', $document);
LET $art = type::thing('article', $key);
RELATE $doc->contains->$art RETURN NONE;";

const FIND_ENTITY: &str = "SELECT VALUE meta::id(id) FROM entity WHERE name = $name LIMIT 1;";

const CREATE_ENTITY: &str = "CREATE type::thing('entity', $key) SET name = $name RETURN NONE;";

const RELATE_ENTITIES: &str = "LET $s = type::thing('entity', $subject);
LET $o = type::thing('entity', $object);
RELATE $s->relates->$o SET `type` = $type, confidence = $confidence, article_number = $article_number RETURN NONE;";

const SELECT_ARTICLE: &str = "SELECT number, concept, subject, action, object, full_text FROM article WHERE number = $number LIMIT 1;";

const SELECT_RELATIONS: &str = "SELECT in.name AS subject, `type` AS relation, out.name AS object, article_number, confidence FROM relates WHERE article_number = $article_number;";

/// Save phases, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SavePhase {
    Document,
    Articles,
    Triplets,
}

impl SavePhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Document => "document",
            Self::Articles => "articles",
            Self::Triplets => "triplets",
        }
    }
}

impl std::fmt::Display for SavePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Summary of one `save_document` call
#[derive(Debug, Clone, Serialize)]
pub struct SaveReport {
    /// Key of the created document node
    pub document_key: String,
    pub articles: usize,
    /// Entity nodes created (existing ones are reused)
    pub entities_created: usize,
    pub relations: usize,
    pub saved_at: DateTime<Utc>,
}

/// Article node as stored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleRecord {
    pub number: String,
    pub concept: String,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub object: Option<String>,
    pub full_text: String,
}

/// Relation edge with its endpoint names resolved
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationRecord {
    pub subject: String,
    pub relation: String,
    pub object: String,
    pub article_number: String,
    pub confidence: f32,
}

/// Node and edge counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GraphStatistics {
    pub documents: u64,
    pub articles: u64,
    pub entities: u64,
    pub relations: u64,
}

/// Writes statute documents to a graph store and reads them back
pub struct GraphPersister<S: GraphStore> {
    store: S,
}

impl<S: GraphStore> GraphPersister<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Underlying store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Delete every node and edge
    pub async fn clear_database(&self) -> Result<()> {
        let session = self.store.session().await?;
        session.run(CLEAR_ALL, QueryParams::new()).await?;
        tracing::info!("Graph database cleared");
        Ok(())
    }

    /// Create lookup indexes; an index that cannot be created is skipped
    pub async fn create_indexes(&self) -> Result<()> {
        let session = self.store.session().await?;
        for (name, query) in INDEXES {
            if let Err(e) = session.run(query, QueryParams::new()).await {
                tracing::debug!(index = name, "Index not created: {e}");
            }
        }
        Ok(())
    }

    /// Persist `document` in three phases: document, articles, triplets
    ///
    /// Phases are not transactional. A failing phase is reported as a
    /// database error naming the phase; nodes written by earlier phases stay.
    pub async fn save_document(&self, document: &LegalDocument) -> Result<SaveReport> {
        let session = self.store.session().await?;
        let document_key = Uuid::new_v4().to_string();

        save_document_node(session.as_ref(), &document_key, document)
            .await
            .map_err(|e| phase_error(SavePhase::Document, e))?;

        save_articles(session.as_ref(), &document_key, &document.entities)
            .await
            .map_err(|e| phase_error(SavePhase::Articles, e))?;

        let entities_created = save_triplets(session.as_ref(), &document.triplets)
            .await
            .map_err(|e| phase_error(SavePhase::Triplets, e))?;

        let report = SaveReport {
            document_key,
            articles: document.entities.len(),
            entities_created,
            relations: document.triplets.len(),
            saved_at: Utc::now(),
        };

        tracing::info!(
            title = %document.title,
            articles = report.articles,
            entities = report.entities_created,
            relations = report.relations,
            "Document saved to graph"
        );

        Ok(report)
    }

    /// Look up an article node by its number
    pub async fn query_article(&self, number: &str) -> Result<Option<ArticleRecord>> {
        let session = self.store.session().await?;
        let rows = session
            .run(SELECT_ARTICLE, params([("number", json!(number))]))
            .await?;

        rows.into_iter().next().map(decode_row).transpose()
    }

    /// Relation edges extracted from one article
    pub async fn query_relations(&self, article_number: &str) -> Result<Vec<RelationRecord>> {
        let session = self.store.session().await?;
        let rows = session
            .run(
                SELECT_RELATIONS,
                params([("article_number", json!(article_number))]),
            )
            .await?;

        rows.into_iter().map(decode_row).collect()
    }

    /// Count nodes and edges
    pub async fn statistics(&self) -> Result<GraphStatistics> {
        let session = self.store.session().await?;
        let session = session.as_ref();

        Ok(GraphStatistics {
            documents: count(session, "document").await?,
            articles: count(session, "article").await?,
            entities: count(session, "entity").await?,
            relations: count(session, "relates").await?,
        })
    }
}

fn params<const N: usize>(pairs: [(&str, Value); N]) -> QueryParams {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}

fn phase_error(phase: SavePhase, e: LexError) -> LexError {
    let cause = match e {
        LexError::DatabaseError(message) => message,
        other => other.to_string(),
    };
    LexError::DatabaseError(format!("save {phase} phase failed: {cause}"))
}

fn decode_row<T: serde::de::DeserializeOwned>(row: Value) -> Result<T> {
    serde_json::from_value(row)
        .map_err(|e| LexError::DatabaseError(format!("Unexpected row shape: {e}")))
}

async fn count(session: &dyn GraphSession, table: &str) -> Result<u64> {
    let query = format!("SELECT count() AS count FROM {table} GROUP ALL;");
    let rows = session.run(&query, QueryParams::new()).await?;

    Ok(rows
        .first()
        .and_then(|row| row.get("count"))
        .and_then(Value::as_u64)
        .unwrap_or(0))
}

async fn save_document_node(
    session: &dyn GraphSession,
    key: &str,
    document: &LegalDocument,
) -> Result<()> {
    session
        .run(
            CREATE_DOCUMENT,
            params([
                ("key", json!(key)),
                ("title", json!(document.title)),
                ("law_number", json!(document.law_number)),
            ]),
        )
        .await?;
    Ok(())
}

async fn save_articles(
    session: &dyn GraphSession,
    document_key: &str,
    entities: &[LegalEntity],
) -> Result<()> {
    for entity in entities {
        session
            .run(
                CREATE_ARTICLE,
                params([
                    ("key", json!(Uuid::new_v4().to_string())),
                    ("document", json!(document_key)),
                    ("number", json!(entity.article_number)),
                    ("concept", json!(entity.concept)),
                    ("subject", json!(entity.subject)),
                    ("action", json!(entity.action)),
                    ("object", json!(entity.object)),
                    ("full_text", json!(entity.full_text)),
                ]),
            )
            .await?;
    }
    Ok(())
}

/// Returns the number of entity nodes created
async fn save_triplets(session: &dyn GraphSession, triplets: &[GraphTriplet]) -> Result<usize> {
    let mut resolver = EntityResolver::default();

    for triplet in triplets {
        let subject = resolver.resolve(session, &triplet.subject).await?;
        let object = resolver.resolve(session, &triplet.object).await?;

        session
            .run(
                RELATE_ENTITIES,
                params([
                    ("subject", json!(subject)),
                    ("object", json!(object)),
                    ("type", json!(triplet.relation)),
                    ("confidence", json!(triplet.confidence)),
                    ("article_number", json!(triplet.article_number)),
                ]),
            )
            .await?;
    }

    Ok(resolver.created)
}

/// Find-or-create for entity nodes, cached per save
#[derive(Default)]
struct EntityResolver {
    keys: HashMap<String, String>,
    created: usize,
}

impl EntityResolver {
    async fn resolve(&mut self, session: &dyn GraphSession, name: &str) -> Result<String> {
        if let Some(key) = self.keys.get(name) {
            return Ok(key.clone());
        }

        let found = session
            .run(FIND_ENTITY, params([("name", json!(name))]))
            .await?;

        let key = match found.first().and_then(Value::as_str) {
            Some(existing) => existing.to_string(),
            None => {
                let key = Uuid::new_v4().to_string();
                session
                    .run(
                        CREATE_ENTITY,
                        params([("key", json!(key)), ("name", json!(name))]),
                    )
                    .await?;
                self.created += 1;
                key
            }
        };

        self.keys.insert(name.to_string(), key.clone());
        Ok(key)
    }
}

// ============================================================================
// Tests
// ============================================================================
