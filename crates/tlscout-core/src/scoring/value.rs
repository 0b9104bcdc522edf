// Composite quality and Value from per-metric percentiles.

use serde::{Deserialize, Serialize};

use super::BatchDistributions;
use crate::candidate::CandidateMetrics;
use crate::config::{ValueConfig, ValueMode, ValueWeights};

/// Age at which the "young" end of every age multiplier applies.
pub const YOUNG_AGE: f64 = 19.0;

/// Age at which the "old" end of every age multiplier applies.
pub const OLD_AGE: f64 = 27.0;

/// Percentile assumed for a missing rating or price.
const NEUTRAL_PERCENTILE: f64 = 0.5;

pub(crate) fn clamp01(x: f64) -> f64 {
    x.clamp(0.0, 1.0)
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Position of `age` between the young and old anchors, in [0, 1].
pub fn age_bias(age: f64) -> f64 {
    clamp01((age - YOUNG_AGE) / (OLD_AGE - YOUNG_AGE))
}

// ---------------------------------------------------------------------------
// Quality metrics
// ---------------------------------------------------------------------------

/// Metrics blended into the non-rating quality score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QualityMetric {
    Si11,
    TiEff,
    SeasonTi,
    Rec,
    SiNow,
    Age,
    Conditioning,
}

pub const QUALITY_METRICS: [QualityMetric; 7] = [
    QualityMetric::Si11,
    QualityMetric::TiEff,
    QualityMetric::SeasonTi,
    QualityMetric::Rec,
    QualityMetric::SiNow,
    QualityMetric::Age,
    QualityMetric::Conditioning,
];

impl QualityMetric {
    pub fn base_weight(&self, weights: &ValueWeights) -> f64 {
        match self {
            QualityMetric::Si11 => weights.si11,
            QualityMetric::TiEff => weights.ti_eff,
            QualityMetric::SeasonTi => weights.season_ti,
            QualityMetric::Rec => weights.rec,
            QualityMetric::SiNow => weights.si_now,
            QualityMetric::Age => weights.age,
            QualityMetric::Conditioning => weights.conditioning,
        }
    }

    /// Weight multiplier at age bias `t` (0 = young, 1 = old).
    pub fn age_multiplier(&self, t: f64) -> f64 {
        let (young, old) = match self {
            QualityMetric::Si11 => (1.35, 0.75),
            QualityMetric::TiEff => (1.25, 0.85),
            QualityMetric::SeasonTi => (1.15, 0.85),
            QualityMetric::Rec => (0.95, 1.20),
            QualityMetric::SiNow => (0.95, 1.05),
            QualityMetric::Age => (1.10, 1.45),
            QualityMetric::Conditioning => (0.90, 1.15),
        };
        lerp(young, old, t)
    }

    pub fn lower_is_better(&self) -> bool {
        matches!(self, QualityMetric::Age)
    }

    /// The candidate's value for this metric. SI@.11 falls back to the
    /// current SI.
    fn value_of(&self, m: &CandidateMetrics) -> Option<f64> {
        match self {
            QualityMetric::Si11 => m.si11.or(m.si_now),
            QualityMetric::TiEff => m.ti_eff,
            QualityMetric::SeasonTi => m.season_ti,
            QualityMetric::Rec => m.rec,
            QualityMetric::SiNow => m.si_now,
            QualityMetric::Age => m.age,
            QualityMetric::Conditioning => m.conditioning,
        }
    }
}

/// Age-weighted mean of normalized metric percentiles, in [0, 1].
///
/// Metrics with a non-positive base weight or no value are left out of both
/// numerator and denominator. `None` when nothing is left.
pub fn quality(
    m: &CandidateMetrics,
    dists: &BatchDistributions,
    weights: &ValueWeights,
) -> Option<f64> {
    let t = m.age.map(age_bias);

    let mut sum = 0.0;
    let mut sum_w = 0.0;
    for metric in QUALITY_METRICS {
        let base = metric.base_weight(weights);
        if base <= 0.0 {
            continue;
        }
        let Some(p) = dists.quality(metric).percentile_of(metric.value_of(m)) else {
            continue;
        };
        let normalized = if metric.lower_is_better() { 1.0 - p } else { p };
        let w = base * t.map_or(1.0, |t| metric.age_multiplier(t));
        sum += w * normalized;
        sum_w += w;
    }

    (sum_w > 0.0).then(|| sum / sum_w)
}

// ---------------------------------------------------------------------------
// Value
// ---------------------------------------------------------------------------

/// Price penalty divisor at a given price percentile.
pub fn price_penalty(price_percentile: f64, config: &ValueConfig) -> f64 {
    lerp(
        config.price_penalty_min,
        config.price_penalty_max,
        clamp01(price_percentile),
    )
    .powf(config.price_penalty_power)
}

/// Composite Value for one candidate given its quality.
///
/// Absent whenever quality is absent. Goalkeepers are scaled by the
/// configured multiplier.
pub fn value_score(
    m: &CandidateMetrics,
    quality: Option<f64>,
    dists: &BatchDistributions,
    config: &ValueConfig,
) -> Option<f64> {
    let quality = quality?;

    let value = match config.mode {
        ValueMode::Moneyball => {
            let rating_p = dists
                .rating
                .percentile_of(m.rating)
                .map_or(NEUTRAL_PERCENTILE, clamp01);
            let price_p = dists
                .price
                .percentile_of(m.price)
                .map_or(NEUTRAL_PERCENTILE, clamp01);

            let non_rating = clamp01(quality.powf(config.quality_power));
            let rating = clamp01(rating_p.powf(config.rating_power));
            let mix = clamp01(
                (1.0 - config.rating_share) * non_rating + config.rating_share * rating,
            );
            config.value_scale * mix / price_penalty(price_p, config)
        }
        ValueMode::Balanced => 100.0 * quality,
    };

    let value = if m.is_goalkeeper {
        value * config.gk_value_multiplier
    } else {
        value
    };
    value.is_finite().then_some(value)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
