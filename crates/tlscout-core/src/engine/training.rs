// Training index: observed growth between two SI snapshots (TI), and the
// wage/calendar-modelled season growth (STI).

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::weights::capacity_constant;
use super::{round2, si_root};
use crate::position::PositionCategory;

// ---------------------------------------------------------------------------
// Training calendar
// ---------------------------------------------------------------------------

const MS_PER_HOUR: i64 = 3_600_000;
const MS_PER_DAY: i64 = 24 * MS_PER_HOUR;

/// Length of one season in days.
pub const SEASON_DAYS: i64 = 84;

/// Days per training session.
pub const SESSION_DAYS: i64 = 7;

/// The day-of-season is folded into a window that ends 16 hours short of
/// a full season.
const SEASON_FOLD_LIMIT_MS: i64 = SEASON_DAYS * MS_PER_DAY - 16 * MS_PER_HOUR;

/// Start of the anchor season: 2017-07-10 08:00 UTC.
pub fn season_anchor() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2017, 7, 10, 8, 0, 0)
        .single()
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

/// First training run of the anchor season: 2017-07-10 23:00 UTC.
pub fn first_training() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2017, 7, 10, 23, 0, 0)
        .single()
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

/// Where `now` falls on the training calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarPosition {
    /// Training session within the current season, starting at 1.
    pub session: u32,
    /// Whole seasons completed since the anchor season started.
    pub seasons_elapsed: u32,
}

impl CalendarPosition {
    /// Locate `now` on the training calendar.
    ///
    /// `None` before the first training run, and in the hours between a
    /// season rollover and that season's first training run, where no
    /// session has been played yet.
    pub fn at(now: DateTime<Utc>) -> Option<Self> {
        let season_ms = SEASON_DAYS * MS_PER_DAY;

        let mut day_ms = (now - first_training()).num_milliseconds();
        if day_ms < 0 {
            return None;
        }
        if day_ms > SEASON_FOLD_LIMIT_MS {
            let folds = (day_ms - SEASON_FOLD_LIMIT_MS + season_ms - 1) / season_ms;
            day_ms -= folds * season_ms;
        }
        // Folded into the hours before a new season's first training.
        if day_ms < 0 {
            return None;
        }
        let session = day_ms / (SESSION_DAYS * MS_PER_DAY) + 1;

        let since_anchor = (now - season_anchor()).num_milliseconds();
        let seasons_elapsed = if since_anchor > season_ms {
            (since_anchor - 1) / season_ms
        } else {
            0
        };

        Some(CalendarPosition {
            session: u32::try_from(session).ok()?,
            seasons_elapsed: u32::try_from(seasons_elapsed).ok()?,
        })
    }

    /// Age below which the youth wage rate applies this session.
    pub fn youth_age_ceiling(&self) -> f64 {
        20.1 + self.session as f64 / 12.0
    }
}

// ---------------------------------------------------------------------------
// Observed TI
// ---------------------------------------------------------------------------

/// Observed training index between two SI snapshots.
///
/// Outfield: `(root(after) - root(before)) * 10`.
/// Goalkeeper: `(root(after) - root(before)) * 110 / 14`.
pub fn compute_ti(asi_after: f64, asi_before: f64, position: PositionCategory) -> Option<f64> {
    let valid = |si: f64| si.is_finite() && si > 0.0;
    if !valid(asi_after) || !valid(asi_before) {
        return None;
    }
    let delta = si_root(asi_after) - si_root(asi_before);
    if position.is_goalkeeper() {
        Some(delta * 110.0 / 14.0)
    } else {
        Some(delta * 10.0)
    }
}

// ---------------------------------------------------------------------------
// Season TI (wage model)
// ---------------------------------------------------------------------------

/// Wage rate of the general model.
pub const GENERAL_WAGE_RATE: f64 = 15.808;

/// Wage rate of recently generated youth players.
pub const YOUTH_WAGE_RATE: f64 = 23.75;

/// Wage of a player the general model cannot describe.
const FLAT_WAGE: u64 = 30_000;

/// Players above this id are excluded from the general model during the
/// anchor season.
const FIRST_SEASON_ID_THRESHOLD: u64 = 120_359_295;

/// Players above this id can be on the youth wage rate.
const YOUTH_ID_THRESHOLD: u64 = 124_048_574;

/// Inputs of the season training model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeasonTrainingInput {
    pub current_si: f64,
    pub wage: u64,
    /// Age as years plus months / 12.
    pub age: f64,
    pub player_id: u64,
    pub position: PositionCategory,
}

/// Which wage model produced a season TI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WageModel {
    General,
    Youth,
}

impl WageModel {
    pub fn rate(&self) -> f64 {
        match self {
            WageModel::General => GENERAL_WAGE_RATE,
            WageModel::Youth => YOUTH_WAGE_RATE,
        }
    }
}

/// Pick the wage model for a player, or `None` when neither applies.
pub fn wage_model(input: &SeasonTrainingInput, calendar: &CalendarPosition) -> Option<WageModel> {
    let excluded = input.wage == FLAT_WAGE
        || (input.player_id > FIRST_SEASON_ID_THRESHOLD && calendar.seasons_elapsed == 0);
    if !excluded {
        return Some(WageModel::General);
    }
    if input.player_id > YOUTH_ID_THRESHOLD && input.age < calendar.youth_age_ceiling() {
        return Some(WageModel::Youth);
    }
    None
}

/// Season training index modelled from wage and calendar position.
///
/// The SI a player's wage implies is compared with the actual SI on the root
/// axis, and the gap is spread over the sessions played so far this season.
/// Returns `None` when no wage model applies, when `now` precedes the
/// training calendar, or when SI/age are not usable.
pub fn compute_sti(input: &SeasonTrainingInput, now: DateTime<Utc>) -> Option<f64> {
    if !input.current_si.is_finite() || input.current_si <= 0.0 || !input.age.is_finite() {
        return None;
    }
    let Some(calendar) = CalendarPosition::at(now) else {
        debug!(player_id = input.player_id, %now, "no training session yet, season TI absent");
        return None;
    };
    let Some(model) = wage_model(input, &calendar) else {
        debug!(
            player_id = input.player_id,
            wage = input.wage,
            "no wage model applies, season TI absent"
        );
        return None;
    };

    let k = capacity_constant(input.position);
    let actual = (k * input.current_si).powf(1.0 / 7.0);
    let implied = (k * input.wage as f64 / model.rate()).powf(1.0 / 7.0);
    let diff = actual - implied;
    let session = calendar.session as f64;

    let sti = match model {
        WageModel::General => round2((diff * 10.0).round() / session),
        WageModel::Youth => round2(diff / session),
    };
    Some(sti)
}

// ---------------------------------------------------------------------------
// Effective TI
// ---------------------------------------------------------------------------

/// Observed TI when it is finite and positive, otherwise the season TI.
pub fn effective_ti(ti: Option<f64>, sti: Option<f64>) -> Option<f64> {
    match ti {
        Some(t) if t.is_finite() && t > 0.0 => Some(t),
        _ => sti.filter(|s| s.is_finite()),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
