// Elite selection and per-cell outlier flags.

use serde::{Deserialize, Serialize};

use super::value::clamp01;
use super::{BatchDistributions, Distribution};
use crate::candidate::CandidateMetrics;
use crate::config::{EliteConfig, EliteMode, OutlierConfig};

/// Intensity carried by a flagged candidate's Value cell.
pub const VALUE_CELL_INTENSITY: f64 = 0.25;

// ---------------------------------------------------------------------------
// Elite selection
// ---------------------------------------------------------------------------

/// Mark which candidates are elite, in batch order.
///
/// Top-N mode takes the `top_n` highest values; equal values keep batch
/// order. Percentile mode takes every value whose percentile reaches
/// `top_pct`. Candidates without a value are never elite.
pub fn select_elite(
    values: &[Option<f64>],
    value_dist: &Distribution,
    config: &EliteConfig,
) -> Vec<bool> {
    let mut elite = vec![false; values.len()];
    match config.mode {
        EliteMode::TopN => {
            let mut ranked: Vec<(usize, f64)> = values
                .iter()
                .enumerate()
                .filter_map(|(i, v)| v.filter(|x| x.is_finite()).map(|x| (i, x)))
                .collect();
            // Stable: ties keep batch order.
            ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
            for (i, _) in ranked.into_iter().take(config.top_n) {
                elite[i] = true;
            }
        }
        EliteMode::Percentile => {
            for (flag, v) in elite.iter_mut().zip(values) {
                *flag = value_dist
                    .percentile_of(*v)
                    .is_some_and(|p| p >= config.top_pct);
            }
        }
    }
    elite
}

// ---------------------------------------------------------------------------
// Outlier cells
// ---------------------------------------------------------------------------

/// Displayable metrics checked for outliers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutlierMetric {
    SiNow,
    Age,
    Ti,
    SeasonTi,
    Price,
    Conditioning,
    Rating,
    Rec,
    Si11,
}

/// One highlighted cell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OutlierCell {
    pub metric: OutlierMetric,
    /// Distance past the threshold, scaled to [0, 1].
    pub intensity: f64,
}

/// Intensity of a cell at percentile `p`, or `None` when it misses the
/// threshold.
pub fn cell_intensity(p: f64, higher_is_better: bool, good_cell_pct: f64) -> Option<f64> {
    let span = 1.0 - good_cell_pct;
    let distance = if higher_is_better {
        p - good_cell_pct
    } else {
        span - p
    };
    (distance >= 0.0).then(|| clamp01(distance / span))
}

/// Outlier cells of an elite candidate.
///
/// Empty unless at least `min_outlier_cells` cells qualify. TI is checked
/// when positive, otherwise season TI takes its place.
pub fn find_outliers(
    m: &CandidateMetrics,
    dists: &BatchDistributions,
    config: &OutlierConfig,
) -> Vec<OutlierCell> {
    let training = match m.ti {
        Some(ti) if ti > 0.0 => (OutlierMetric::Ti, Some(ti)),
        _ => (OutlierMetric::SeasonTi, m.season_ti),
    };
    let candidates = [
        (OutlierMetric::SiNow, m.si_now, true),
        (OutlierMetric::Age, m.age, false),
        (training.0, training.1, true),
        (OutlierMetric::Price, m.price, false),
        (
            OutlierMetric::Conditioning,
            m.conditioning,
            config.conditioning_higher_is_better,
        ),
        (OutlierMetric::Rating, m.rating, true),
        (OutlierMetric::Rec, m.rec, true),
        (OutlierMetric::Si11, m.si11, true),
    ];

    let cells: Vec<OutlierCell> = candidates
        .into_iter()
        .filter_map(|(metric, value, higher_is_better)| {
            let p = dists.outlier(metric).percentile_of(value)?;
            let intensity = cell_intensity(p, higher_is_better, config.good_cell_pct)?;
            Some(OutlierCell { metric, intensity })
        })
        .collect();

    if cells.len() >= config.min_outlier_cells {
        cells
    } else {
        Vec::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
