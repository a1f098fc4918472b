/// Qdrant-backed vector store
///
/// Calls the Qdrant Query API using reqwest. The client is constructed
/// explicitly from config and owned by the caller — no lazily-initialized
/// global handle. reqwest::Client pools connections internally, so one
/// QdrantStore can serve concurrent queries.

use async_trait::async_trait;
use serde_json::Value;

use super::{CandidateRecord, VectorStore};
use crate::config::QdrantConfig;
use crate::errors::CasetwinError;

/// Request body for POST /collections/{collection}/points/query
#[derive(serde::Serialize)]
struct QueryRequest<'a> {
    query: &'a [f32],
    limit: usize,
    with_payload: bool,
}

/// Response envelope from the Qdrant Query API
#[derive(serde::Deserialize)]
struct QueryResponse {
    result: QueryResult,
}

#[derive(serde::Deserialize)]
struct QueryResult {
    points: Vec<ScoredPoint>,
}

/// Single scored point from Qdrant
#[derive(serde::Deserialize)]
struct ScoredPoint {
    /// Numeric or UUID point id
    id: Value,
    score: f64,
    payload: Option<Value>,
}

pub struct QdrantStore {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    collection: String,
}

impl QdrantStore {
    /// Create a new QdrantStore from connection config.
    ///
    /// # Errors
    /// Returns `CasetwinError::Config` if the URL is empty.
    pub fn new(config: &QdrantConfig) -> Result<Self, CasetwinError> {
        if config.url.trim().is_empty() {
            return Err(CasetwinError::Config(
                "Qdrant URL is required. Set CASETWIN_QDRANT__URL or qdrant.url in casetwin.toml"
                    .to_string(),
            ));
        }

        Ok(QdrantStore {
            client: reqwest::Client::new(),
            base_url: config.url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            collection: config.collection.clone(),
        })
    }
}

#[async_trait]
impl VectorStore for QdrantStore {
    async fn query_nearest(
        &self,
        embedding: &[f32],
        limit: usize,
    ) -> Result<Vec<CandidateRecord>, CasetwinError> {
        let url = format!(
            "{}/collections/{}/points/query",
            self.base_url, self.collection
        );
        let request = QueryRequest {
            query: embedding,
            limit,
            with_payload: true,
        };

        let mut builder = self.client.post(&url).json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.header("api-key", key);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| CasetwinError::Retrieval(format!("Qdrant request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            if status.as_u16() == 404 {
                return Err(CasetwinError::Retrieval(format!(
                    "Collection '{}' not found: {}",
                    self.collection, body
                )));
            }
            return Err(CasetwinError::Retrieval(format!(
                "Qdrant returned status {}: {}",
                status.as_u16(),
                body
            )));
        }

        let query_response: QueryResponse = response.json().await.map_err(|e| {
            CasetwinError::Retrieval(format!("Failed to parse Qdrant response: {}", e))
        })?;

        let candidates = query_response
            .result
            .points
            .into_iter()
            .map(|p| CandidateRecord {
                id: point_id_to_string(&p.id),
                score: p.score,
                payload: p.payload.unwrap_or(Value::Null),
            })
            .collect();

        Ok(candidates)
    }
}

/// Qdrant point ids are either unsigned integers or UUID strings.
fn point_id_to_string(id: &Value) -> String {
    match id {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
