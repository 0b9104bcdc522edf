// Per-candidate inputs and the metrics bundle computed from them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::engine::projection::{project_si, sessions_remaining};
use crate::engine::rating::{compute_rating, PositionRating};
use crate::engine::training::{compute_sti, compute_ti, effective_ti, SeasonTrainingInput};
use crate::position::PositionCategory;
use crate::records::map_tooltip_skills;

// ---------------------------------------------------------------------------
// Age
// ---------------------------------------------------------------------------

/// Age as whole years plus a month offset normalized to 0..=11.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgeFraction {
    pub years: u32,
    pub months: u32,
}

impl AgeFraction {
    /// Build from raw years and months; months outside 0..=11 are clamped.
    pub fn new(years: u32, months: i64) -> Self {
        AgeFraction {
            years,
            months: months.clamp(0, 11) as u32,
        }
    }

    /// Years plus months / 12.
    pub fn as_years(&self) -> f64 {
        self.years as f64 + self.months as f64 / 12.0
    }
}

impl fmt::Display for AgeFraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.years, self.months)
    }
}

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// Everything known about one listed candidate, already resolved from the
/// tooltip payload and the listing row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateInput {
    pub player_id: u64,
    pub name: String,
    pub age: Option<AgeFraction>,
    /// Primary position. Only its goalkeeper-ness matters for TI, STI, and
    /// the projection.
    pub primary: PositionCategory,
    /// Favourite positions in listed order; one rating is computed per entry.
    pub positions: Vec<PositionCategory>,
    /// Skill grades in tooltip order, before per-position mapping.
    pub tooltip_skills: Vec<u8>,
    pub wage: Option<u64>,
    pub conditioning: Option<f64>,
    pub price: Option<f64>,
    pub current_si: Option<f64>,
    pub prior_si: Option<f64>,
}

impl CandidateInput {
    pub fn is_goalkeeper(&self) -> bool {
        self.primary.is_goalkeeper()
    }
}

/// Per-refresh settings shared by every candidate evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvaluationContext {
    /// Clock used for the training calendar.
    pub now: DateTime<Utc>,
    /// Rate every candidate on this weight row instead of their own.
    pub position_override: Option<PositionCategory>,
}

impl EvaluationContext {
    pub fn at(now: DateTime<Utc>) -> Self {
        EvaluationContext {
            now,
            position_override: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Metrics bundle
// ---------------------------------------------------------------------------

/// Phase-one output for one candidate. Every numeric field is independently
/// present or absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateMetrics {
    pub player_id: u64,
    pub name: String,
    pub is_goalkeeper: bool,
    pub age_display: Option<AgeFraction>,
    pub age: Option<f64>,
    pub si_now: Option<f64>,
    pub ti: Option<f64>,
    pub season_ti: Option<f64>,
    pub ti_eff: Option<f64>,
    pub price: Option<f64>,
    pub conditioning: Option<f64>,
    /// Highest rating across `ratings`.
    pub rating: Option<f64>,
    /// Highest REC across `ratings`.
    pub rec: Option<f64>,
    pub si11: Option<f64>,
    pub ratings: Vec<PositionRating>,
}

fn finite(x: Option<f64>) -> Option<f64> {
    x.filter(|v| v.is_finite())
}

fn finite_max(values: impl Iterator<Item = f64>) -> Option<f64> {
    values
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| Some(acc.map_or(v, |m: f64| m.max(v))))
}

/// One rating per favourite position, in listed order.
///
/// Skills are mapped by the candidate's own position even when the weight
/// row comes from an override.
pub fn position_ratings(
    input: &CandidateInput,
    position_override: Option<PositionCategory>,
) -> Vec<PositionRating> {
    let (Some(si), Some(conditioning)) = (finite(input.current_si), finite(input.conditioning))
    else {
        return Vec::new();
    };

    let default_positions = [PositionCategory::CentreBack];
    let positions: &[PositionCategory] = if input.positions.is_empty() {
        &default_positions
    } else {
        &input.positions
    };

    positions
        .iter()
        .filter_map(|&base| {
            let skills = map_tooltip_skills(&input.tooltip_skills, base);
            if skills.is_empty() {
                return None;
            }
            let rated_as = position_override.unwrap_or(base);
            compute_rating(rated_as, &skills, si, conditioning)
        })
        .collect()
}

/// Compute the full metrics bundle for one candidate.
pub fn evaluate(input: &CandidateInput, ctx: &EvaluationContext) -> CandidateMetrics {
    let si_now = finite(input.current_si);
    let age = input.age.map(|a| a.as_years());

    let ti = match (si_now, finite(input.prior_si)) {
        (Some(after), Some(before)) => compute_ti(after, before, input.primary),
        _ => None,
    };

    let season_ti = match (si_now, input.wage, age) {
        (Some(current_si), Some(wage), Some(age)) => compute_sti(
            &SeasonTrainingInput {
                current_si,
                wage,
                age,
                player_id: input.player_id,
                position: input.primary,
            },
            ctx.now,
        ),
        _ => None,
    };

    let ti_eff = effective_ti(ti, season_ti);

    let months = input.age.map_or(0, |a| a.months);
    let si11 = si_now.and_then(|si| {
        project_si(si, ti_eff, sessions_remaining(months as f64), input.primary)
    });

    let ratings = position_ratings(input, ctx.position_override);
    let rating = finite_max(ratings.iter().map(|r| r.rating));
    let rec = finite_max(ratings.iter().map(|r| r.rec));

    CandidateMetrics {
        player_id: input.player_id,
        name: input.name.clone(),
        is_goalkeeper: input.is_goalkeeper(),
        age_display: input.age,
        age,
        si_now,
        ti,
        season_ti,
        ti_eff,
        price: finite(input.price),
        conditioning: finite(input.conditioning),
        rating,
        rec,
        si11,
        ratings,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
        (a - b).abs() < epsilon
    }

    fn march_2024() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    /// Tooltip order for an outfielder whose mapped vector is
    /// [14,15,13,16,17,12,15,11,10,13,12,9,14,11].
    fn midfielder_tooltip() -> Vec<u8> {
        vec![14, 11, 15, 10, 13, 13, 16, 12, 17, 9, 12, 14, 15, 11]
    }

    fn midfielder() -> CandidateInput {
        CandidateInput {
            player_id: 100,
            name: "Test Midfielder".into(),
            age: Some(AgeFraction::new(24, 6)),
            primary: PositionCategory::CentralMidfield,
            positions: vec![PositionCategory::CentralMidfield, PositionCategory::Forward],
            tooltip_skills: midfielder_tooltip(),
            wage: Some(12_000),
            conditioning: Some(35.2),
            price: Some(2_500_000.0),
            current_si: Some(14_500.0),
            prior_si: Some(14_000.0),
        }
    }

    #[test]
    fn age_fraction_normalizes_months() {
        assert_eq!(AgeFraction::new(23, 14).months, 11);
        assert_eq!(AgeFraction::new(23, -2).months, 0);
        let a = AgeFraction::new(23, 6);
        assert!(approx_eq(a.as_years(), 23.5, 1e-12));
        assert_eq!(a.to_string(), "23.6");
    }

    #[test]
    fn ratings_follow_position_order_and_max_is_taken() {
        let m = evaluate(&midfielder(), &EvaluationContext::at(march_2024()));
        assert_eq!(m.ratings.len(), 2);
        assert_eq!(m.ratings[0].position, PositionCategory::CentralMidfield);
        assert!(approx_eq(m.ratings[0].rating, 70.98, 0.011));
        assert_eq!(m.ratings[1].position, PositionCategory::Forward);
        assert!(approx_eq(m.ratings[1].rating, 67.48, 0.011));
        assert_eq!(m.rating, Some(m.ratings[0].rating));
        assert_eq!(m.rec, Some(m.ratings[0].rec));
    }

    #[test]
    fn override_changes_weight_row_only() {
        let ctx = EvaluationContext {
            now: march_2024(),
            position_override: Some(PositionCategory::Forward),
        };
        let m = evaluate(&midfielder(), &ctx);
        assert_eq!(m.ratings.len(), 2);
        for r in &m.ratings {
            assert_eq!(r.position, PositionCategory::Forward);
            assert!(approx_eq(r.rating, 67.48, 0.011));
        }
    }

    #[test]
    fn empty_position_list_defaults_to_centre_back() {
        let mut input = midfielder();
        input.positions.clear();
        let ratings = position_ratings(&input, None);
        assert_eq!(ratings.len(), 1);
        assert_eq!(ratings[0].position, PositionCategory::CentreBack);
    }

    #[test]
    fn missing_conditioning_leaves_rating_absent() {
        let mut input = midfielder();
        input.conditioning = None;
        let m = evaluate(&input, &EvaluationContext::at(march_2024()));
        assert!(m.ratings.is_empty());
        assert_eq!(m.rating, None);
        assert_eq!(m.rec, None);
        assert!(m.ti.is_some());
    }

    #[test]
    fn training_and_projection_flow_into_bundle() {
        let m = evaluate(&midfielder(), &EvaluationContext::at(march_2024()));
        let ti = m.ti.unwrap();
        assert!(ti > 0.0);
        assert_eq!(m.season_ti, Some(52.64));
        // Positive TI wins over STI.
        assert_eq!(m.ti_eff, Some(ti));
        let expected = project_si(14_500.0, Some(ti), 5, PositionCategory::CentralMidfield);
        assert_eq!(m.si11, expected);
        assert!(approx_eq(m.age.unwrap(), 24.5, 1e-12));
    }

    #[test]
    fn without_prior_si_sti_drives_projection() {
        let mut input = midfielder();
        input.prior_si = None;
        let m = evaluate(&input, &EvaluationContext::at(march_2024()));
        assert_eq!(m.ti, None);
        assert_eq!(m.ti_eff, Some(52.64));
    }

    #[test]
    fn missing_si_degrades_only_dependent_fields() {
        let mut input = midfielder();
        input.current_si = None;
        let m = evaluate(&input, &EvaluationContext::at(march_2024()));
        assert_eq!(m.si_now, None);
        assert_eq!(m.ti, None);
        assert_eq!(m.season_ti, None);
        assert_eq!(m.si11, None);
        assert_eq!(m.rating, None);
        assert_eq!(m.price, Some(2_500_000.0));
        assert!(approx_eq(m.age.unwrap(), 24.5, 1e-12));
    }
}
