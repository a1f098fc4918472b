/// Vector store abstraction layer
///
/// Provides the VectorStore trait and the candidate record shape the ranking
/// pipeline consumes. The trait abstraction enables multiple backends —
/// currently Qdrant over its REST API — and lets tests inject an in-memory
/// fake instead of a live store.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::CasetwinError;

pub mod qdrant;

/// One retrieved item, before ranking and mapping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateRecord {
    /// Opaque point identifier (Qdrant numeric ids are stringified)
    pub id: String,
    /// Raw visual similarity from the store. Range is store-defined;
    /// descending-ordered within a single retrieval batch.
    pub score: f64,
    /// Semi-structured case payload: diagnosis fields, free-text summary,
    /// demographics, provenance, outcome. Shape varies across dataset
    /// generations, so it stays loosely typed here and the result mapper
    /// resolves fields through fallback chains.
    pub payload: serde_json::Value,
}

/// Nearest-neighbor retrieval against the case index.
///
/// Implementations must be Send + Sync; one instance is shared across
/// concurrent queries behind an Arc. Read-only — no implementation may
/// mutate the store.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Return the `limit` nearest neighbors of `embedding`, ordered by
    /// descending raw similarity. The caller trusts the ordering guarantee
    /// and does not re-verify it.
    ///
    /// An empty result is valid (empty collection, limit 0). Unreachable
    /// store or absent collection is a `CasetwinError::Retrieval` and is
    /// never retried here.
    async fn query_nearest(
        &self,
        embedding: &[f32],
        limit: usize,
    ) -> Result<Vec<CandidateRecord>, CasetwinError>;
}
