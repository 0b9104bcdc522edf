// Forward projection of the skill index to the month-11 checkpoint.

use super::{si_from_root, si_root};
use crate::position::PositionCategory;

/// Month offset at which a projection is taken.
pub const CHECKPOINT_MONTH: u32 = 11;

/// Training sessions left before the checkpoint.
///
/// `month_fraction` is clamped into [0, 11] and floored. A NaN month counts
/// as month 0.
pub fn sessions_remaining(month_fraction: f64) -> u32 {
    let month_fraction = if month_fraction.is_nan() { 0.0 } else { month_fraction };
    let month = month_fraction.floor().clamp(0.0, CHECKPOINT_MONTH as f64) as u32;
    CHECKPOINT_MONTH - month
}

/// Root-axis step per session for a given training index.
fn root_step(effective_ti: f64, position: PositionCategory) -> f64 {
    if position.is_goalkeeper() {
        effective_ti * 14.0 / 110.0
    } else {
        effective_ti / 10.0
    }
}

/// Project `current_si` forward by `sessions` at `effective_ti` per session.
///
/// Growth happens on the 7th-root axis. Without a rate, or with no sessions
/// left, the current SI is returned rounded. `None` only when `current_si`
/// is not finite.
pub fn project_si(
    current_si: f64,
    effective_ti: Option<f64>,
    sessions: u32,
    position: PositionCategory,
) -> Option<f64> {
    if !current_si.is_finite() {
        return None;
    }
    let rate = match effective_ti {
        Some(t) if t.is_finite() && sessions > 0 => t,
        _ => return Some(current_si.round()),
    };
    let root = si_root(current_si) + root_step(rate, position) * sessions as f64;
    Some(si_from_root(root).round())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
