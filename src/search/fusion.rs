/// Fusion ranking of retrieved candidates
///
/// Normalizes the batch's raw visual scores, scores clinical context per
/// candidate, fuses the two dimensions with fixed weights, then performs a
/// stable descending sort and truncates to the display limit.
///
/// Deterministic by construction: identical inputs always produce identical
/// output, including tie order — `sort_by` is a stable sort and ties keep
/// the store's retrieval order.

use serde_json::Value;

use super::context::score_context;
use crate::profile::CaseProfile;
use crate::store::CandidateRecord;

/// A candidate with its transient per-query scores. The fused score is a
/// ranking key only and is never shown to the caller.
#[derive(Debug, Clone)]
pub struct ScoredCandidate {
    pub candidate: CandidateRecord,
    /// Raw score scaled relative to the best raw score in this batch, in [0, 1]
    pub visual_score: f64,
    /// Additive clinical-context heuristic, 0.0 without a profile
    pub context_score: f64,
    /// Ranking key: weighted fusion when a profile is present, otherwise
    /// the normalized visual score alone
    pub fused_score: f64,
}

impl ScoredCandidate {
    /// Raw visual similarity as returned by the store.
    pub fn raw_score(&self) -> f64 {
        self.candidate.score
    }

    pub fn payload(&self) -> &Value {
        &self.candidate.payload
    }
}

/// Rank a retrieval batch: normalize, context-score, fuse, sort, truncate.
///
/// Output length is min(limit, candidates.len()).
pub fn rank(
    candidates: Vec<CandidateRecord>,
    profile: Option<&CaseProfile>,
    limit: usize,
    visual_weight: f64,
    context_weight: f64,
) -> Vec<ScoredCandidate> {
    if candidates.is_empty() {
        return Vec::new();
    }

    // Guard the zero-maximum case so an all-zero batch divides by 1.0
    let max_raw = candidates
        .iter()
        .map(|c| c.score)
        .fold(f64::NEG_INFINITY, f64::max);
    let divisor = if max_raw == 0.0 { 1.0 } else { max_raw };

    let mut scored: Vec<ScoredCandidate> = candidates
        .into_iter()
        .map(|candidate| {
            let visual_score = candidate.score / divisor;
            let context_score = score_context(&candidate.payload, profile);
            let fused_score = if profile.is_some() {
                visual_weight * visual_score + context_weight * context_score
            } else {
                visual_score
            };
            ScoredCandidate {
                candidate,
                visual_score,
                context_score,
                fused_score,
            }
        })
        .collect();

    // Stable descending sort: ties preserve retrieval order
    scored.sort_by(|a, b| {
        b.fused_score
            .partial_cmp(&a.fused_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    scored.truncate(limit);
    scored
}
