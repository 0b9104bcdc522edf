// Batch scoring: percentile distributions, composite Value, elite selection,
// outlier cells. Runs once over a fully materialized batch.

pub mod distribution;
pub mod elite;
pub mod value;

pub use distribution::Distribution;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::candidate::CandidateMetrics;
use crate::config::ScoringConfig;
use elite::{find_outliers, select_elite, OutlierCell, OutlierMetric, VALUE_CELL_INTENSITY};
use value::{quality, value_score, QualityMetric};

// ---------------------------------------------------------------------------
// Batch distributions
// ---------------------------------------------------------------------------

/// One sorted distribution per metric, rebuilt for every batch.
#[derive(Debug, Clone, Default)]
pub struct BatchDistributions {
    pub age: Distribution,
    pub si_now: Distribution,
    pub ti: Distribution,
    pub season_ti: Distribution,
    pub ti_eff: Distribution,
    pub price: Distribution,
    pub conditioning: Distribution,
    pub rating: Distribution,
    pub rec: Distribution,
    pub si11: Distribution,
}

impl BatchDistributions {
    pub fn from_metrics(batch: &[CandidateMetrics]) -> Self {
        let collect = |f: fn(&CandidateMetrics) -> Option<f64>| {
            Distribution::from_values(batch.iter().map(f))
        };
        BatchDistributions {
            age: collect(|m| m.age),
            si_now: collect(|m| m.si_now),
            ti: collect(|m| m.ti),
            season_ti: collect(|m| m.season_ti),
            ti_eff: collect(|m| m.ti_eff),
            price: collect(|m| m.price),
            conditioning: collect(|m| m.conditioning),
            rating: collect(|m| m.rating),
            rec: collect(|m| m.rec),
            si11: collect(|m| m.si11),
        }
    }

    /// Distribution a quality metric is ranked against.
    pub fn quality(&self, metric: QualityMetric) -> &Distribution {
        match metric {
            QualityMetric::Si11 => &self.si11,
            QualityMetric::TiEff => &self.ti_eff,
            QualityMetric::SeasonTi => &self.season_ti,
            QualityMetric::Rec => &self.rec,
            QualityMetric::SiNow => &self.si_now,
            QualityMetric::Age => &self.age,
            QualityMetric::Conditioning => &self.conditioning,
        }
    }

    /// Distribution an outlier cell is ranked against.
    pub fn outlier(&self, metric: OutlierMetric) -> &Distribution {
        match metric {
            OutlierMetric::SiNow => &self.si_now,
            OutlierMetric::Age => &self.age,
            OutlierMetric::Ti => &self.ti,
            OutlierMetric::SeasonTi => &self.season_ti,
            OutlierMetric::Price => &self.price,
            OutlierMetric::Conditioning => &self.conditioning,
            OutlierMetric::Rating => &self.rating,
            OutlierMetric::Rec => &self.rec,
            OutlierMetric::Si11 => &self.si11,
        }
    }
}

// ---------------------------------------------------------------------------
// Scored output
// ---------------------------------------------------------------------------

/// Phase-two result for one candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredCandidate {
    pub metrics: CandidateMetrics,
    pub quality: Option<f64>,
    pub value: Option<f64>,
    pub elite: bool,
    /// Highlighted cells; empty unless the candidate is elite and clears
    /// the minimum cell count.
    pub outliers: Vec<OutlierCell>,
    /// Highlight of the Value cell itself, set with the outlier cells.
    pub value_highlight: Option<f64>,
}

impl ScoredCandidate {
    pub fn is_flagged(&self) -> bool {
        !self.outliers.is_empty()
    }
}

/// Score a whole batch. Output keeps batch order.
pub fn score_batch(batch: Vec<CandidateMetrics>, config: &ScoringConfig) -> Vec<ScoredCandidate> {
    let dists = BatchDistributions::from_metrics(&batch);

    let qualities: Vec<Option<f64>> = batch
        .iter()
        .map(|m| quality(m, &dists, &config.value.weights))
        .collect();
    let values: Vec<Option<f64>> = batch
        .iter()
        .zip(&qualities)
        .map(|(m, q)| value_score(m, *q, &dists, &config.value))
        .collect();

    let value_dist = Distribution::from_values(values.iter().copied());
    let elite = select_elite(&values, &value_dist, &config.elite);
    debug!(
        "scored {} of {} candidates, {} elite",
        value_dist.len(),
        batch.len(),
        elite.iter().filter(|e| **e).count()
    );

    let scored: Vec<ScoredCandidate> = batch
        .into_iter()
        .zip(qualities)
        .zip(values)
        .zip(elite)
        .map(|(((metrics, quality), value), elite)| {
            let outliers = if elite {
                find_outliers(&metrics, &dists, &config.outliers)
            } else {
                Vec::new()
            };
            let value_highlight = (!outliers.is_empty()).then_some(VALUE_CELL_INTENSITY);
            ScoredCandidate {
                metrics,
                quality,
                value,
                elite,
                outliers,
                value_highlight,
            }
        })
        .collect();

    let flagged = scored.iter().filter(|s| s.is_flagged()).count();
    if flagged > 0 {
        info!("{} elite candidates flagged with outlier cells", flagged);
    }
    scored
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
