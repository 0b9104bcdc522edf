// R5 positional rating and REC from a skill vector.
//
// The skill-index capacity left over after summing the visible grades (the
// "remainder") is spread across the non-maxed skills, a conditioning boost
// is applied, and set-piece bonuses plus positional gain/keep terms are
// added on top of the weighted skill sum.

use serde::{Deserialize, Serialize};

use super::weights::{capacity_constant, gain_keep_multiplier, rating_weights, rec_weights};
use super::{round1, round2};
use crate::position::{PositionCategory, GOALKEEPER_SKILL_COUNT};

/// Grade of a maxed ("goldstar") skill.
pub const MAX_GRADE: u8 = 20;

/// Slot that never receives the conditioning boost.
const FITNESS_SLOT: usize = 1;

/// Remainder-per-slot above which the full-table fallback kicks in.
const REMAINDER_SPREAD_LIMIT: f64 = 0.9;

const FALLBACK_REC_WEIGHT_TOTAL: f64 = 1.0;
const FALLBACK_RATING_WEIGHT_TOTAL: f64 = 5.0;

/// Normaliser of the gain/keep quadratic bases (22.9^2).
const GAIN_KEEP_NORM: f64 = 22.9 * 22.9;

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// Rating and REC for one position, both rounded to two decimals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionRating {
    pub position: PositionCategory,
    pub rating: f64,
    pub rec: f64,
}

/// Intermediate sums shared by the rating and REC formulas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Remainders {
    /// Capacity implied by the skill index minus the visible skill sum, to one decimal.
    pub remainder: f64,
    /// Rating-weight total over the non-maxed slots, rounded to an integer.
    pub rating_weight_total: f64,
    /// REC-weight total over the non-maxed slots.
    pub rec_weight_total: f64,
    /// Number of non-maxed slots (or the full-table count on fallback).
    pub not_maxed: usize,
    /// Whether the full-table fallback replaced the not-maxed totals.
    pub used_fallback: bool,
    /// Sum of grade * rating weight.
    pub rating_raw: f64,
    pub rec: f64,
}

/// The four set-piece bonuses, each rounded to two decimals.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SetPieceBonuses {
    pub heading: f64,
    pub free_kick: f64,
    pub corner_kick: f64,
    pub penalty: f64,
}

impl SetPieceBonuses {
    pub fn total(&self) -> f64 {
        self.heading + self.free_kick + self.corner_kick + self.penalty
    }
}

// ---------------------------------------------------------------------------
// Building blocks
// ---------------------------------------------------------------------------

/// Conditioning boost added to every skill but the fitness slot:
/// `3/100 * (100 - 100 * e^(-conditioning * 0.035))`.
pub fn conditioning_boost(conditioning: f64) -> f64 {
    (3.0 / 100.0) * (100.0 - 100.0 * (-conditioning * 0.035).exp())
}

/// Compute the remainder and the weighted sums for a position.
///
/// Returns `None` when the skill vector is shorter than the position's
/// weight row or the skill index is not a positive finite number.
pub fn compute_remainders(
    position: PositionCategory,
    skills: &[u8],
    current_si: f64,
) -> Option<Remainders> {
    let weights_a = rating_weights(position);
    let weights_b = rec_weights(position);
    if skills.len() < weights_a.len() || !current_si.is_finite() || current_si <= 0.0 {
        return None;
    }

    let skill_sum: f64 = skills.iter().map(|&g| g as f64).sum();
    let capacity = (capacity_constant(position) * current_si).powf(1.0 / 7.0);
    let remainder = round1(capacity - skill_sum);

    let mut rating_raw = 0.0;
    let mut rec_raw = 0.0;
    let mut rating_weight_total = 0.0;
    let mut rec_weight_total = 0.0;
    let mut not_maxed = 0usize;

    for (i, (&wa, &wb)) in weights_a.iter().zip(weights_b).enumerate() {
        let grade = skills[i] as f64;
        rating_raw += grade * wa;
        rec_raw += grade * wb;
        if skills[i] != MAX_GRADE {
            rating_weight_total += wa;
            rec_weight_total += wb;
            not_maxed += 1;
        }
    }

    let used_fallback =
        not_maxed == 0 || remainder / not_maxed as f64 > REMAINDER_SPREAD_LIMIT;
    if used_fallback {
        not_maxed = position.skill_count();
        rec_weight_total = FALLBACK_REC_WEIGHT_TOTAL;
        rating_weight_total = FALLBACK_RATING_WEIGHT_TOTAL;
    }

    let rec = round2((rec_raw + remainder * rec_weight_total / not_maxed as f64 - 2.0) / 3.0);

    Some(Remainders {
        remainder,
        rating_weight_total: rating_weight_total.round(),
        rec_weight_total,
        not_maxed,
        used_fallback,
        rating_raw,
        rec,
    })
}

/// Spread `remainder` evenly over the non-maxed skills, then add the
/// conditioning boost to every slot except the fitness slot.
pub fn adjusted_skills(skills: &[u8], remainder: f64, boost: f64) -> Vec<f64> {
    let goldstars = skills.iter().filter(|&&g| g == MAX_GRADE).count();
    let open_slots = skills.len() - goldstars;

    skills
        .iter()
        .enumerate()
        .map(|(i, &g)| {
            let spread = if g == MAX_GRADE {
                g as f64
            } else {
                g as f64 + remainder / open_slots as f64
            };
            if i == FITNESS_SLOT {
                spread
            } else {
                spread + boost
            }
        })
        .collect()
}

/// Heading, free-kick, corner and penalty bonuses from an adjusted vector.
///
/// Needs the 14 outfield slots; returns `None` for shorter vectors.
pub fn set_piece_bonuses(a: &[f64]) -> Option<SetPieceBonuses> {
    if a.len() < 14 {
        return None;
    }

    let heading = if a[10] > 12.0 {
        round2(
            (((a[10] - 10.0).powi(3) / 1584.77).exp() - 1.0) * 0.8
                + (a[0] * a[0] * 0.007 / 8.73021).exp() * 0.15
                + (a[6] * a[6] * 0.007 / 8.73021).exp() * 0.05,
        )
    } else {
        0.0
    };

    let set_piece = |other: f64, divisor: f64| {
        round2(((a[13] + other + a[9] * 0.5).powi(2) * 0.002).exp() / divisor)
    };

    Some(SetPieceBonuses {
        heading,
        free_kick: set_piece(a[12], 327.92526),
        corner_kick: set_piece(a[8], 983.65770),
        penalty: set_piece(a[11], 1967.31409),
    })
}

/// Quadratic gain and keep bases over the first seven adjusted slots.
pub fn gain_keep_bases(a: &[f64]) -> (f64, f64) {
    let sq = |i: usize| a[i] * a[i];
    let tail: f64 = (3..7).map(sq).sum();
    let gain = (sq(0) + sq(1) * 0.5 + sq(2) * 0.5 + tail) / 6.0 / GAIN_KEEP_NORM;
    let keep = (sq(0) * 0.5 + sq(1) * 0.5 + sq(2) + tail) / 6.0 / GAIN_KEEP_NORM;
    (round2(gain), round2(keep))
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// R5 rating and REC for one position.
///
/// Returns `None` if the skill vector is empty or too short for the
/// position, or if the skill index or conditioning is not finite.
pub fn compute_rating(
    position: PositionCategory,
    skills: &[u8],
    current_si: f64,
    conditioning: f64,
) -> Option<PositionRating> {
    if skills.is_empty() || !conditioning.is_finite() {
        return None;
    }
    let rem = compute_remainders(position, skills, current_si)?;
    let boost = conditioning_boost(conditioning);
    let adjusted = adjusted_skills(skills, rem.remainder, boost);

    // An 11-slot vector carries no set-piece skills.
    let bonuses = if adjusted.len() == GOALKEEPER_SKILL_COUNT {
        0.0
    } else {
        set_piece_bonuses(&adjusted)?.total()
    };

    let base = round2(
        rem.rating_raw + rem.remainder * rem.rating_weight_total / rem.not_maxed as f64 + boost * 5.0,
    );

    let rating = match gain_keep_multiplier(position) {
        Some(multiplier) => {
            let (gain, keep) = gain_keep_bases(&adjusted);
            round2(base + bonuses + gain * multiplier + keep * multiplier)
        }
        None => round2(base + bonuses),
    };

    Some(PositionRating {
        position,
        rating,
        rec: rem.rec,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
