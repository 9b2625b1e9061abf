//! SurrealDB implementation for graph storage
//!
//! Provides connection management and session-scoped query execution
//! against SurrealDB.

use async_trait::async_trait;
use lexgraph_core::{DatabaseConfig, GraphSession, GraphStore, LexError, QueryParams, Result};
use surrealdb::engine::remote::ws::{Client, Ws};
use surrealdb::opt::auth::Root;
use surrealdb::Surreal;

/// SurrealDB graph store implementation
pub struct SurrealDbStore {
    client: Surreal<Client>,
}

impl SurrealDbStore {
    /// Create a new SurrealDB connection
    pub async fn new(config: &DatabaseConfig) -> Result<Self> {
        // The ws engine adds the scheme itself
        let url = config
            .surrealdb_url
            .strip_prefix("ws://")
            .or_else(|| config.surrealdb_url.strip_prefix("wss://"))
            .unwrap_or(&config.surrealdb_url);

        let client = Surreal::new::<Ws>(url)
            .await
            .map_err(|e| LexError::DatabaseError(format!("SurrealDB connection failed: {e}")))?;

        client
            .signin(Root {
                username: &config.surrealdb_user,
                password: &config.surrealdb_pass,
            })
            .await
            .map_err(|e| LexError::DatabaseError(format!("SurrealDB auth failed: {e}")))?;

        client
            .use_ns(&config.surrealdb_namespace)
            .use_db(&config.surrealdb_database)
            .await
            .map_err(|e| LexError::DatabaseError(format!("SurrealDB namespace error: {e}")))?;

        tracing::debug!(
            url = %config.surrealdb_url,
            namespace = %config.surrealdb_namespace,
            database = %config.surrealdb_database,
            "Connected to SurrealDB"
        );

        Ok(Self { client })
    }

    /// Check the connection is alive
    pub async fn health(&self) -> Result<()> {
        self.client
            .health()
            .await
            .map_err(|e| LexError::DatabaseError(format!("SurrealDB health check failed: {e}")))
    }
}

#[async_trait]
impl GraphStore for SurrealDbStore {
    async fn session(&self) -> Result<Box<dyn GraphSession>> {
        Ok(Box::new(SurrealSession {
            client: self.client.clone(),
        }))
    }
}

/// One unit of work against SurrealDB
pub struct SurrealSession {
    client: Surreal<Client>,
}

#[async_trait]
impl GraphSession for SurrealSession {
    async fn run(&self, query: &str, params: QueryParams) -> Result<Vec<serde_json::Value>> {
        let mut request = self.client.query(query.to_string());
        for (name, value) in params {
            request = request.bind((name, value));
        }

        let mut response = request
            .await
            .map_err(|e| LexError::DatabaseError(format!("Query failed: {e}")))?
            .check()
            .map_err(|e| LexError::DatabaseError(format!("Query failed: {e}")))?;

        let statements = response.num_statements();
        if statements == 0 {
            return Ok(Vec::new());
        }

        response
            .take::<Vec<serde_json::Value>>(statements - 1)
            .map_err(|e| LexError::DatabaseError(format!("Result extraction failed: {e}")))
    }
}
