/// Retrieval-and-fusion ranking pipeline
///
/// Ties the pieces together: pull a visual candidate pool from the vector
/// store, re-rank it against the clinical profile, map the survivors to the
/// external match schema. Strictly sequential per query — context scoring
/// and fusion need the completed retrieval batch. A query either completes
/// fully or fails; there is no partial ranking.

pub mod context;
pub mod fusion;
pub mod results;

// Re-export key types for convenience
pub use fusion::ScoredCandidate;
pub use results::MatchItem;

use std::sync::Arc;

use crate::config::SearchConfig;
use crate::errors::CasetwinError;
use crate::profile::CaseProfile;
use crate::store::VectorStore;

/// Case matcher owning a shared store handle and the ranking parameters.
///
/// Holds no cross-query mutable state; one instance serves concurrent
/// queries.
pub struct CaseMatcher {
    store: Arc<dyn VectorStore>,
    config: SearchConfig,
}

impl CaseMatcher {
    pub fn new(store: Arc<dyn VectorStore>, config: SearchConfig) -> Self {
        CaseMatcher { store, config }
    }

    /// Find the `limit` cases most similar to the query embedding.
    ///
    /// With a profile, a wider pool (config.rerank_pool, design value 30)
    /// is retrieved so the fusion step has headroom beyond the display
    /// limit; without one, exactly `limit` candidates are pulled and the
    /// ranking order equals the store's visual order.
    ///
    /// An empty retrieval result is a successful empty match list.
    pub async fn search_similar(
        &self,
        embedding: &[f32],
        profile: Option<&CaseProfile>,
        limit: usize,
    ) -> Result<Vec<MatchItem>, CasetwinError> {
        let pool = if profile.is_some() {
            self.config.rerank_pool
        } else {
            limit
        };

        let candidates = self.store.query_nearest(embedding, pool).await?;
        tracing::debug!(
            retrieved = candidates.len(),
            pool = pool,
            reranking = profile.is_some(),
            "Retrieved candidate batch"
        );

        let ranked = fusion::rank(
            candidates,
            profile,
            limit,
            self.config.visual_weight,
            self.config.context_weight,
        );

        let matches: Vec<MatchItem> = ranked.iter().map(results::to_match).collect();
        tracing::info!(count = matches.len(), limit = limit, "Ranked case matches");
        Ok(matches)
    }
}
