// Refresh pipeline: per-candidate metrics in parallel, visibility filter,
// then one scoring pass over the visible batch.

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use std::cmp::Ordering;
use tracing::info;

use crate::candidate::{evaluate, CandidateInput, CandidateMetrics, EvaluationContext};
use crate::config::{FilterConfig, ScoringConfig};
use crate::scoring::{score_batch, ScoredCandidate};

/// Phase one: compute every candidate's metrics bundle. Output keeps input
/// order.
pub fn evaluate_batch(inputs: &[CandidateInput], ctx: &EvaluationContext) -> Vec<CandidateMetrics> {
    inputs.par_iter().map(|input| evaluate(input, ctx)).collect()
}

/// Whether a candidate stays visible under the configured filters.
///
/// A rating floor of 0 is treated as unset.
pub fn passes_filter(m: &CandidateMetrics, filter: &FilterConfig) -> bool {
    if let Some(min_rating) = filter.min_rating.filter(|r| *r > 0.0) {
        if !m.ratings.iter().any(|r| r.rating >= min_rating) {
            return false;
        }
    }
    if let Some(min_ti) = filter.min_ti {
        if !m.ti_eff.is_some_and(|t| t >= min_ti) {
            return false;
        }
    }
    true
}

/// Run one full refresh at `now`.
///
/// Every visible bundle exists before scoring starts; nothing is carried
/// over from earlier refreshes.
pub fn refresh(
    inputs: &[CandidateInput],
    config: &ScoringConfig,
    now: DateTime<Utc>,
) -> Vec<ScoredCandidate> {
    let ctx = EvaluationContext {
        now,
        position_override: config.filter.position_override(),
    };

    let metrics = evaluate_batch(inputs, &ctx);
    let total = metrics.len();
    let visible: Vec<CandidateMetrics> = metrics
        .into_iter()
        .filter(|m| passes_filter(m, &config.filter))
        .collect();
    info!("refresh: {} of {} candidates visible", visible.len(), total);

    score_batch(visible, config)
}

/// Sort by value, highest first; candidates without a value go last.
/// Equal values keep their order.
pub fn sort_by_value(scored: &mut [ScoredCandidate]) {
    scored.sort_by(|a, b| match (a.value, b.value) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
